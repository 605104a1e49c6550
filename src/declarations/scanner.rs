//! Ambient module header scanning.

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

/// `declare module "<identifier>"`, either quote style, any whitespace between tokens.
static MODULE_HEADER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"\bdeclare\s+module\s+(?:"(?P<dq>(?:[^"\\\r\n]|\\.)*)"|'(?P<sq>(?:[^'\\\r\n]|\\.)*)')"#,
    )
    .expect("module header pattern is valid")
});

/// An ambient module header found in a declaration bundle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModuleHeader {
    /// Identifier as written between the quotes
    pub identifier: String,
    /// Byte range of the identifier within the scanned text
    pub range: Range<usize>,
}

/// Find every `declare module "..."` header, in order of appearance.
pub fn scan_module_headers(text: &str) -> Vec<ModuleHeader> {
    MODULE_HEADER
        .captures_iter(text)
        .filter_map(|caps| caps.name("dq").or_else(|| caps.name("sq")))
        .map(|m| ModuleHeader {
            identifier: m.as_str().to_string(),
            range: m.range(),
        })
        .collect()
}

/// Identifiers of `headers` without repeats, keeping first-appearance order.
///
/// Augmentations declare the same module more than once; they share one entry.
pub fn distinct_identifiers(headers: &[ModuleHeader]) -> Vec<&str> {
    let mut seen: Vec<&str> = Vec::with_capacity(headers.len());
    for header in headers {
        if !seen.contains(&header.identifier.as_str()) {
            seen.push(&header.identifier);
        }
    }
    seen
}
