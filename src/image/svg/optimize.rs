//! Event-level SVG minifier.
//!
//! Reads quick-xml events straight from the input slice and writes a
//! compact serialization:
//!
//! - comments and a `<!DOCTYPE>` without entities are dropped
//! - the XML declaration is dropped unless it names a non-UTF-8 encoding
//! - `<metadata>` and `sodipodi:` / `inkscape:` / `sketch:` data are dropped
//! - whitespace-only text is dropped outside text-bearing elements
//! - start tags are rebuilt with single spaces and double quotes
//!
//! Everything else (ids, `<defs>`, `<symbol>`, styles, scripts, entity
//! references) is copied as written. The output is a fixed point: running
//! the minifier over it again returns the same bytes.

use quick_xml::{
    Reader,
    events::{BytesDecl, BytesStart, BytesText, Event},
};
use rustc_hash::FxHashSet;

use super::refs;
use crate::config::SvgConfig;
use crate::image::{ImageFormat, OptimizeError};

/// Elements whose whitespace is rendered or otherwise significant.
const PRESERVE_WHITESPACE: [&[u8]; 7] = [
    b"text",
    b"tspan",
    b"textPath",
    b"style",
    b"script",
    b"title",
    b"desc",
];

/// Namespace prefixes written by editors and ignored by renderers.
const EDITOR_PREFIXES: [&[u8]; 3] = [b"sodipodi", b"inkscape", b"sketch"];

/// Minify `data`.
///
/// With `cleanup_ids`, references are collected from the minified document
/// and a second pass drops the ids nothing points at. Ids referenced only
/// from removed comments or metadata therefore go as well.
pub fn optimize(data: &[u8], config: &SvgConfig) -> Result<Vec<u8>, OptimizeError> {
    let minified = Minifier::new(config, None).run(data)?;
    if !config.cleanup_ids {
        return Ok(minified);
    }

    let referenced = refs::collect(&minified);
    Minifier::new(config, Some(&referenced)).run(&minified)
}

/// One open element.
struct Frame {
    /// Whitespace-only text is kept.
    preserve: bool,
    /// Element and its subtree are omitted.
    dropped: bool,
    /// For `<defs>` under `remove_useless_defs`: output length before and
    /// after the start tag, to take back an empty one.
    defs: Option<(usize, usize)>,
}

struct Minifier<'a> {
    config: &'a SvgConfig,
    /// Referenced ids; `None` keeps every id.
    referenced: Option<&'a FxHashSet<Vec<u8>>>,
    out: Vec<u8>,
    stack: Vec<Frame>,
    seen_root: bool,
}

impl<'a> Minifier<'a> {
    fn new(config: &'a SvgConfig, referenced: Option<&'a FxHashSet<Vec<u8>>>) -> Self {
        Self {
            config,
            referenced,
            out: Vec::new(),
            stack: Vec::new(),
            seen_root: false,
        }
    }

    fn run(mut self, data: &[u8]) -> Result<Vec<u8>, OptimizeError> {
        self.out.reserve(data.len());
        let mut reader = Reader::from_reader(data);

        loop {
            match reader.read_event()? {
                Event::Start(e) => self.open(&e, false)?,
                Event::Empty(e) => self.open(&e, true)?,
                Event::End(e) => self.close(e.name().as_ref()),
                Event::Text(t) => self.text(&t),
                Event::GeneralRef(r) => {
                    if !self.dropped() {
                        self.write(&[b"&", &r, b";"]);
                    }
                }
                Event::CData(c) => {
                    if !self.dropped() {
                        self.write(&[b"<![CDATA[", &c, b"]]>"]);
                    }
                }
                Event::Comment(c) => self.comment(&c),
                Event::Decl(d) => self.declaration(&d)?,
                Event::PI(pi) => {
                    if !self.dropped() {
                        self.write(&[b"<?", &pi, b"?>"]);
                    }
                }
                Event::DocType(d) => {
                    // entity declarations are needed by references in the body
                    if contains(&d, b"<!ENTITY") {
                        self.write(&[b"<!DOCTYPE ", &d, b">"]);
                    }
                }
                Event::Eof => break,
            }
        }

        if !self.stack.is_empty() {
            return Err(OptimizeError::malformed(
                ImageFormat::Svg,
                format!("{} unclosed element(s) at end of file", self.stack.len()),
            ));
        }
        if !self.seen_root {
            return Err(OptimizeError::malformed(ImageFormat::Svg, "no <svg> root element"));
        }
        Ok(self.out)
    }

    fn open(&mut self, e: &BytesStart<'_>, empty: bool) -> Result<(), OptimizeError> {
        let name = e.name();
        let qname = name.as_ref();
        let local_name = e.local_name();
        let local = local_name.as_ref();

        if !self.seen_root {
            if local != b"svg" {
                return Err(OptimizeError::malformed(
                    ImageFormat::Svg,
                    format!("root element is <{}>", String::from_utf8_lossy(qname)),
                ));
            }
            self.seen_root = true;
        }

        if self.should_drop(e, qname, local, empty)? {
            if !empty {
                self.stack.push(Frame {
                    preserve: false,
                    dropped: true,
                    defs: None,
                });
            }
            return Ok(());
        }

        let mark = self.out.len();
        let mut preserve = self.preserving() || PRESERVE_WHITESPACE.contains(&local);

        self.write(&[b"<", qname]);
        for attr in e.attributes() {
            let attr = attr?;
            let key = attr.key.as_ref();
            if self.config.remove_editor_data && is_editor_attr(key) {
                continue;
            }
            if key == b"id" && !self.keeps_id(&attr.value) {
                continue;
            }
            if key == b"xml:space" {
                preserve = attr.value.as_ref() == b"preserve";
            }
            self.write(&[b" ", key, b"=\""]);
            write_attr_value(&mut self.out, &attr.value);
            self.out.push(b'"');
        }

        if empty {
            self.write(&[b"/>"]);
            return Ok(());
        }
        self.out.push(b'>');

        let defs = (self.config.remove_useless_defs && local == b"defs")
            .then_some((mark, self.out.len()));
        self.stack.push(Frame {
            preserve,
            dropped: false,
            defs,
        });
        Ok(())
    }

    fn should_drop(
        &self,
        e: &BytesStart<'_>,
        qname: &[u8],
        local: &[u8],
        empty: bool,
    ) -> Result<bool, OptimizeError> {
        if self.dropped() {
            return Ok(true);
        }
        if self.config.remove_metadata && qname == b"metadata" {
            return Ok(true);
        }
        if self.config.remove_editor_data && has_editor_prefix(qname) {
            return Ok(true);
        }
        if !self.config.remove_useless_defs {
            return Ok(false);
        }
        if empty && local == b"defs" {
            return Ok(true);
        }
        // direct <defs> children are only reachable through their id
        let in_defs = self.stack.last().is_some_and(|f| f.defs.is_some());
        if in_defs && local != b"style" {
            return Ok(!self.has_kept_id(e)?);
        }
        Ok(false)
    }

    fn has_kept_id(&self, e: &BytesStart<'_>) -> Result<bool, OptimizeError> {
        for attr in e.attributes() {
            let attr = attr?;
            if attr.key.as_ref() == b"id" {
                return Ok(self.keeps_id(&attr.value));
            }
        }
        Ok(false)
    }

    fn keeps_id(&self, id: &[u8]) -> bool {
        self.referenced.is_none_or(|refs| refs.contains(id))
    }

    fn close(&mut self, qname: &[u8]) {
        // quick-xml rejects unmatched end tags before they get here
        let Some(frame) = self.stack.pop() else {
            return;
        };
        if frame.dropped {
            return;
        }
        if let Some((mark, content)) = frame.defs
            && self.out.len() == content
        {
            self.out.truncate(mark);
            return;
        }
        self.write(&[b"</", qname, b">"]);
    }

    fn text(&mut self, text: &BytesText<'_>) {
        if self.dropped() {
            return;
        }
        if !self.preserving() && text.iter().all(u8::is_ascii_whitespace) {
            return;
        }
        self.out.extend_from_slice(text);
    }

    /// Text and attribute bytes are copied undecoded, so a document in
    /// another encoding keeps a minimal declaration naming it.
    fn declaration(&mut self, decl: &BytesDecl<'_>) -> Result<(), OptimizeError> {
        let Some(encoding) = decl.encoding() else {
            return Ok(());
        };
        let encoding = encoding?;
        if encoding.eq_ignore_ascii_case(b"utf-8") || encoding.eq_ignore_ascii_case(b"utf8") {
            return Ok(());
        }
        let version = decl.version()?;
        self.write(&[
            b"<?xml version=\"",
            &version,
            b"\" encoding=\"",
            &encoding,
            b"\"?>",
        ]);
        Ok(())
    }

    fn comment(&mut self, comment: &BytesText<'_>) {
        if self.dropped() {
            return;
        }
        // <!--! ... --> marks a comment that must survive (licenses)
        if self.config.remove_comments && !comment.starts_with(b"!") {
            return;
        }
        self.write(&[b"<!--", comment, b"-->"]);
    }

    fn dropped(&self) -> bool {
        self.stack.last().is_some_and(|f| f.dropped)
    }

    fn preserving(&self) -> bool {
        self.stack.last().is_some_and(|f| f.preserve)
    }

    fn write(&mut self, parts: &[&[u8]]) {
        for part in parts {
            self.out.extend_from_slice(part);
        }
    }
}

/// Attribute values are kept escaped as written; only a bare `"` (legal
/// inside single quotes) needs escaping for the double-quoted output.
fn write_attr_value(out: &mut Vec<u8>, value: &[u8]) {
    for &b in value {
        if b == b'"' {
            out.extend_from_slice(b"&quot;");
        } else {
            out.push(b);
        }
    }
}

fn has_editor_prefix(qname: &[u8]) -> bool {
    qname
        .iter()
        .position(|&b| b == b':')
        .is_some_and(|i| EDITOR_PREFIXES.contains(&&qname[..i]))
}

/// `inkscape:label`, or the `xmlns:inkscape` declaration itself.
fn is_editor_attr(key: &[u8]) -> bool {
    match key.strip_prefix(b"xmlns:") {
        Some(prefix) => EDITOR_PREFIXES.contains(&prefix),
        None => has_editor_prefix(key),
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
