//! Fragment references inside an SVG document.

use std::sync::LazyLock;

use regex::bytes::Regex;
use rustc_hash::FxHashSet;

/// `#name` as it appears in `href="#a"`, `url(#a)` or `url(&quot;#a&quot;)`.
///
/// Byte-oriented with whitespace spelled out: `regex` is built without `unicode-perl`.
static FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"(?-u)#([^ \t\r\n\x0C"'()#;,&<>]+)"#).unwrap());

/// Every id referenced with a `#` anywhere in `data`.
///
/// Over-approximates: `#fff` in a colour keeps an element with id `fff`.
pub fn collect(data: &[u8]) -> FxHashSet<Vec<u8>> {
    FRAGMENT
        .captures_iter(data)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_bytes().to_vec())
        .collect()
}
