//! GIF block rewriting.
//!
//! Image descriptors, colour tables and LZW data are copied byte-for-byte.
//! Comment extensions and application extensions other than the looping
//! ones are dropped.

use super::{ImageFormat, OptimizeError};

const EXTENSION: u8 = 0x21;
const IMAGE: u8 = 0x2C;
const TRAILER: u8 = 0x3B;

const LABEL_COMMENT: u8 = 0xFE;
const LABEL_APPLICATION: u8 = 0xFF;

/// Application identifiers that control animation looping.
const LOOP_APPS: [&[u8]; 2] = [b"NETSCAPE2.0", b"ANIMEXTS1.0"];

/// Byte cursor over the input that turns overruns into errors.
struct Blocks<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Blocks<'a> {
    fn take(&mut self, n: usize) -> Result<&'a [u8], OptimizeError> {
        let end = self.pos + n;
        let bytes = self.data.get(self.pos..end).ok_or_else(|| {
            OptimizeError::malformed(ImageFormat::Gif, format!("truncated at offset {}", self.pos))
        })?;
        self.pos = end;
        Ok(bytes)
    }

    fn byte(&mut self) -> Result<u8, OptimizeError> {
        Ok(self.take(1)?[0])
    }

    /// Data sub-blocks up to and including the zero terminator.
    fn sub_blocks(&mut self) -> Result<&'a [u8], OptimizeError> {
        let start = self.pos;
        loop {
            let size = self.byte()?;
            if size == 0 {
                return Ok(&self.data[start..self.pos]);
            }
            self.take(usize::from(size))?;
        }
    }
}

/// Size in bytes of the colour table announced by a packed field.
fn color_table_len(packed: u8) -> usize {
    if packed & 0x80 == 0 {
        0
    } else {
        3 << ((packed & 0x07) + 1)
    }
}

pub fn optimize(data: &[u8]) -> Result<Vec<u8>, OptimizeError> {
    let mut blocks = Blocks { data, pos: 0 };
    let mut out = Vec::with_capacity(data.len());

    let header = blocks.take(6)?;
    if header != b"GIF87a" && header != b"GIF89a" {
        return Err(OptimizeError::malformed(ImageFormat::Gif, "bad signature"));
    }
    out.extend_from_slice(header);

    let screen = blocks.take(7)?;
    out.extend_from_slice(screen);
    out.extend_from_slice(blocks.take(color_table_len(screen[4]))?);

    loop {
        let start = blocks.pos;
        match blocks.byte()? {
            IMAGE => {
                let descriptor = blocks.take(9)?;
                blocks.take(color_table_len(descriptor[8]))?;
                // LZW minimum code size
                blocks.byte()?;
                blocks.sub_blocks()?;
                out.extend_from_slice(&data[start..blocks.pos]);
            }
            EXTENSION => {
                let label = blocks.byte()?;
                let body = blocks.sub_blocks()?;
                if keep_extension(label, body) {
                    out.extend_from_slice(&data[start..blocks.pos]);
                }
            }
            TRAILER => {
                out.push(TRAILER);
                return Ok(out);
            }
            other => {
                return Err(OptimizeError::malformed(
                    ImageFormat::Gif,
                    format!("unknown block 0x{other:02X} at offset {start}"),
                ));
            }
        }
    }
}

/// Graphic control, plain text and unknown extensions stay. A graphic
/// control block binds to the next rendering block, so dropping a plain
/// text block would retarget its delay and transparency.
fn keep_extension(label: u8, body: &[u8]) -> bool {
    match label {
        LABEL_COMMENT => false,
        LABEL_APPLICATION => {
            // first sub-block: size 11, then the 8+3 byte identifier
            body.get(1..12)
                .is_some_and(|id| LOOP_APPS.contains(&id))
        }
        _ => true,
    }
}
