//! Markdown input detection and decoding.

use crate::error::{Error, Result};
use std::fs;
use std::path::Path;
use unicode_normalization::UnicodeNormalization;

/// File extensions accepted as Markdown.
pub const MARKDOWN_EXTENSIONS: &[&str] = &["md", "markdown"];

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Check if a path has a Markdown extension (case-insensitive).
///
/// # Example
/// ```
/// use mdpress::detect::is_markdown_path;
///
/// assert!(is_markdown_path("notes/README.md"));
/// assert!(!is_markdown_path("notes.txt"));
/// ```
pub fn is_markdown_path<P: AsRef<Path>>(path: P) -> bool {
    path.as_ref()
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            MARKDOWN_EXTENSIONS
                .iter()
                .any(|m| ext.eq_ignore_ascii_case(m))
        })
        .unwrap_or(false)
}

/// Decode Markdown bytes.
///
/// Strips a UTF-8 byte order mark and normalizes to NFC.
///
/// # Returns
/// * `Err(Error::UnknownFormat)` if the data is not UTF-8 text or contains
///   NUL bytes
pub fn decode_markdown(data: &[u8]) -> Result<String> {
    let data = data.strip_prefix(UTF8_BOM).unwrap_or(data);
    if data.contains(&0) {
        return Err(Error::UnknownFormat);
    }
    let text = std::str::from_utf8(data).map_err(|_| Error::UnknownFormat)?;
    Ok(normalize(text))
}

/// Normalize Markdown text to NFC, dropping a leading BOM.
pub fn normalize(text: &str) -> String {
    text.strip_prefix('\u{FEFF}').unwrap_or(text).nfc().collect()
}

/// Read and decode a Markdown file.
///
/// The extension is not checked here; callers that require it use
/// [`is_markdown_path`].
pub fn read_markdown<P: AsRef<Path>>(path: P) -> Result<String> {
    let data = fs::read(path)?;
    decode_markdown(&data)
}
