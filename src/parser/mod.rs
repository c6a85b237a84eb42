//! Markdown parsing module.

mod markdown;
mod options;

pub use markdown::{info_language, parse_markdown, MarkdownParser};
pub use options::{HtmlMode, ParseOptions};
