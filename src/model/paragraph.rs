//! Inline text types shared by headings, paragraphs, list items and cells.

use serde::{Deserialize, Serialize};

/// A run of inline content inside a text-bearing element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Inline {
    /// A styled text run
    Text(TextRun),

    /// A hard line break
    LineBreak,

    /// An inline image, shown by its alternative text
    Image {
        /// Image source as written in the Markdown
        src: String,
        /// Alternative text
        alt: String,
    },
}

impl Inline {
    /// Create an unstyled text run.
    pub fn text(text: impl Into<String>) -> Self {
        Inline::Text(TextRun::plain(text))
    }

    /// Get plain text of this inline.
    pub fn plain_text(&self) -> &str {
        match self {
            Inline::Text(run) => &run.text,
            Inline::LineBreak => "\n",
            Inline::Image { alt, .. } => alt,
        }
    }
}

/// A run of text with uniform styling.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextRun {
    /// The text content
    pub text: String,

    /// Text styling
    pub style: TextStyle,
}

impl TextRun {
    /// Create a run without styling.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: TextStyle::default(),
        }
    }

    /// Create a run with the given style.
    pub fn styled(text: impl Into<String>, style: TextStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

/// Inline text styling.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextStyle {
    /// Bold text
    pub bold: bool,

    /// Italic text
    pub italic: bool,

    /// Strikethrough text
    pub strikethrough: bool,

    /// Inline code span
    pub code: bool,

    /// Hyperlink target, if the run is inside a link
    pub link: Option<String>,
}

impl TextStyle {
    /// Check if any styling is applied.
    pub fn is_plain(&self) -> bool {
        !self.bold && !self.italic && !self.strikethrough && !self.code && self.link.is_none()
    }
}

/// Concatenate the plain text of a run sequence.
pub fn plain_text(inlines: &[Inline]) -> String {
    inlines.iter().map(Inline::plain_text).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_joins_runs() {
        let bold = TextStyle {
            bold: true,
            ..Default::default()
        };
        let inlines = vec![
            Inline::text("Hello "),
            Inline::Text(TextRun::styled("World", bold)),
            Inline::LineBreak,
            Inline::Image {
                src: "a.png".into(),
                alt: "pic".into(),
            },
        ];
        assert_eq!(plain_text(&inlines), "Hello World\npic");
    }

    #[test]
    fn test_text_style_is_plain() {
        assert!(TextStyle::default().is_plain());
        let code = TextStyle {
            code: true,
            ..Default::default()
        };
        assert!(!code.is_plain());
    }
}
