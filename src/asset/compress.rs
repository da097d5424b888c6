//! Precompressed `.gz` / `.br` siblings.
//!
//! Output is deterministic: gzip headers carry no filename and mtime 0,
//! so rebuilding an unchanged file produces identical bytes.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use flate2::{Compression, GzBuilder};

use crate::{config::CompressConfig, utils::path::write_replace};

/// Brotli encoder buffer size.
const BROTLI_BUFFER: usize = 4096;

/// Sibling encoding written next to the original file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Encoding {
    Gzip,
    Brotli,
}

impl Encoding {
    /// Every suffix an encoded sibling can carry. Files with these
    /// extensions are never compression inputs.
    pub const ALL_SUFFIXES: &'static [&'static str] = &["gz", "br"];

    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Gzip => "gz",
            Self::Brotli => "br",
        }
    }

    /// `<path>.<suffix>`
    pub fn sibling(self, path: &Path) -> PathBuf {
        let mut name = path.as_os_str().to_owned();
        name.push(".");
        name.push(self.suffix());
        PathBuf::from(name)
    }
}

/// What happened to one input file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressOutcome {
    Written { before: u64, after: u64 },
    /// Under `threshold`, or not smaller with `skip_growing` on.
    Skipped { before: u64 },
}

/// Encode `bytes` with the levels from `config`.
pub fn encode(bytes: &[u8], encoding: Encoding, config: &CompressConfig) -> Result<Vec<u8>> {
    match encoding {
        Encoding::Gzip => {
            let mut encoder = GzBuilder::new()
                .mtime(0)
                .write(Vec::new(), Compression::new(config.gzip.level));
            encoder.write_all(bytes)?;
            Ok(encoder.finish()?)
        }
        Encoding::Brotli => {
            let mut encoder = brotli::CompressorWriter::new(
                Vec::new(),
                BROTLI_BUFFER,
                config.brotli.quality,
                config.brotli.window,
            );
            encoder.write_all(bytes)?;
            Ok(encoder.into_inner())
        }
    }
}

/// Write the `encoding` sibling of `path`, overwriting a stale one.
pub fn compress_file(
    path: &Path,
    encoding: Encoding,
    config: &CompressConfig,
) -> Result<CompressOutcome> {
    let bytes = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let before = bytes.len() as u64;

    if before < config.threshold_bytes() {
        return Ok(CompressOutcome::Skipped { before });
    }

    let encoded = encode(&bytes, encoding, config)
        .with_context(|| format!("failed to {} {}", encoding.suffix(), path.display()))?;
    let after = encoded.len() as u64;

    if config.skip_growing && after >= before {
        return Ok(CompressOutcome::Skipped { before });
    }

    let target = encoding.sibling(path);
    write_replace(&target, &encoded, path)
        .with_context(|| format!("failed to write {}", target.display()))?;

    Ok(CompressOutcome::Written { before, after })
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use std::io::Read;
    use tempfile::TempDir;

    fn sample() -> Vec<u8> {
        b"function hello() { return 'hello world'; }\n".repeat(40)
    }

    fn gunzip(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        GzDecoder::new(bytes).read_to_end(&mut out).unwrap();
        out
    }

    fn unbrotli(bytes: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        brotli::Decompressor::new(bytes, BROTLI_BUFFER)
            .read_to_end(&mut out)
            .unwrap();
        out
    }

    #[test]
    fn test_sibling_path() {
        let path = Path::new("/dist/app.js");
        assert_eq!(Encoding::Gzip.sibling(path), PathBuf::from("/dist/app.js.gz"));
        assert_eq!(Encoding::Brotli.sibling(path), PathBuf::from("/dist/app.js.br"));
    }

    #[test]
    fn test_gzip_roundtrip_and_deterministic() {
        let config = CompressConfig::default();
        let data = sample();
        let a = encode(&data, Encoding::Gzip, &config).unwrap();
        let b = encode(&data, Encoding::Gzip, &config).unwrap();
        assert_eq!(a, b);
        assert!(a.len() < data.len());
        assert_eq!(gunzip(&a), data);
        // mtime field in the header is zero
        assert_eq!(&a[4..8], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_brotli_roundtrip() {
        let config = CompressConfig::default();
        let data = sample();
        let encoded = encode(&data, Encoding::Brotli, &config).unwrap();
        assert!(encoded.len() < data.len());
        assert_eq!(unbrotli(&encoded), data);
    }

    #[test]
    fn test_empty_input() {
        let config = CompressConfig::default();
        assert!(gunzip(&encode(b"", Encoding::Gzip, &config).unwrap()).is_empty());
        assert!(unbrotli(&encode(b"", Encoding::Brotli, &config).unwrap()).is_empty());
    }

    #[test]
    fn test_compress_file_writes_sibling() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("app.js");
        fs::write(&path, sample()).unwrap();
        fs::write(dir.path().join("app.js.gz"), b"stale").unwrap();

        let config = CompressConfig::default();
        let outcome = compress_file(&path, Encoding::Gzip, &config).unwrap();

        let written = fs::read(dir.path().join("app.js.gz")).unwrap();
        assert_eq!(gunzip(&written), sample());
        assert_eq!(
            outcome,
            CompressOutcome::Written {
                before: sample().len() as u64,
                after: written.len() as u64,
            }
        );
    }

    #[test]
    fn test_threshold_skips_small_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("tiny.js");
        fs::write(&path, b"x").unwrap();

        let config = CompressConfig {
            threshold: "1KB".into(),
            ..CompressConfig::default()
        };
        let outcome = compress_file(&path, Encoding::Brotli, &config).unwrap();
        assert_eq!(outcome, CompressOutcome::Skipped { before: 1 });
        assert!(!dir.path().join("tiny.js.br").exists());
    }

    #[test]
    fn test_growing_output_written_by_default() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("a.html");
        fs::write(&path, b"a").unwrap();

        let config = CompressConfig::default();
        compress_file(&path, Encoding::Gzip, &config).unwrap();
        assert!(dir.path().join("a.html.gz").exists());

        let config = CompressConfig {
            skip_growing: true,
            ..CompressConfig::default()
        };
        let outcome = compress_file(&path, Encoding::Brotli, &config).unwrap();
        assert_eq!(outcome, CompressOutcome::Skipped { before: 1 });
        assert!(!dir.path().join("a.html.br").exists());
    }

    #[test]
    fn test_missing_file_names_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("gone.js");
        let err = compress_file(&path, Encoding::Gzip, &CompressConfig::default()).unwrap_err();
        assert!(format!("{err:#}").contains("gone.js"));
    }
}
