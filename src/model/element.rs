//! Block-level Markdown content.

use super::paragraph::{plain_text, Inline};
use super::table::Table;
use serde::{Deserialize, Serialize};

/// A top-level (or nested) block of Markdown content.
///
/// Elements are the source of every [`VisualBlock`](super::VisualBlock):
/// each top-level element is laid out into exactly one block.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Element {
    /// ATX or setext heading
    Heading {
        /// Heading level (1-6)
        level: u8,
        /// Heading content
        content: Vec<Inline>,
    },

    /// Paragraph of inline content
    Paragraph {
        /// Paragraph content
        content: Vec<Inline>,
    },

    /// Ordered or unordered list
    List(List),

    /// Fenced or indented code block
    CodeBlock {
        /// Info string language, if any
        language: Option<String>,
        /// Code text (trailing newline removed)
        code: String,
    },

    /// Fenced block in a diagram language
    Diagram {
        /// Diagram language (e.g. "mermaid", "svg")
        language: String,
        /// Diagram source
        source: String,
    },

    /// GFM table
    Table(Table),

    /// Block quote
    BlockQuote {
        /// Quoted elements
        children: Vec<Element>,
    },

    /// Standalone image (a paragraph holding only an image)
    Image {
        /// Image source path or URL
        src: String,
        /// Alternative text
        alt: String,
    },

    /// Thematic break
    Rule,

    /// Raw HTML block, shown verbatim
    Html {
        /// Raw markup
        raw: String,
    },
}

impl Element {
    /// Create a heading.
    pub fn heading(text: impl Into<String>, level: u8) -> Self {
        Element::Heading {
            level: level.clamp(1, 6),
            content: vec![Inline::text(text)],
        }
    }

    /// Create a paragraph holding plain text.
    pub fn paragraph(text: impl Into<String>) -> Self {
        Element::Paragraph {
            content: vec![Inline::text(text)],
        }
    }

    /// Short name of the element kind.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Element::Heading { .. } => "heading",
            Element::Paragraph { .. } => "paragraph",
            Element::List(_) => "list",
            Element::CodeBlock { .. } => "code_block",
            Element::Diagram { .. } => "diagram",
            Element::Table(_) => "table",
            Element::BlockQuote { .. } => "block_quote",
            Element::Image { .. } => "image",
            Element::Rule => "rule",
            Element::Html { .. } => "html",
        }
    }

    /// Get plain text content of the element.
    pub fn plain_text(&self) -> String {
        match self {
            Element::Heading { content, .. } | Element::Paragraph { content } => {
                plain_text(content)
            }
            Element::List(list) => list.plain_text(),
            Element::CodeBlock { code, .. } => code.clone(),
            Element::Diagram { source, .. } => source.clone(),
            Element::Table(table) => table.plain_text(),
            Element::BlockQuote { children } => children
                .iter()
                .map(Element::plain_text)
                .collect::<Vec<_>>()
                .join("\n"),
            Element::Image { alt, .. } => alt.clone(),
            Element::Rule => String::new(),
            Element::Html { raw } => raw.clone(),
        }
    }

    /// Check if this element is a heading.
    pub fn is_heading(&self) -> bool {
        matches!(self, Element::Heading { .. })
    }

    /// Check if this element is a diagram.
    pub fn is_diagram(&self) -> bool {
        matches!(self, Element::Diagram { .. })
    }
}

/// A list and its items.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct List {
    /// Start number for ordered lists, `None` for bullet lists
    pub start: Option<u64>,

    /// List items
    pub items: Vec<ListItem>,
}

impl List {
    /// Create an empty bullet list.
    pub fn bullet() -> Self {
        Self::default()
    }

    /// Create an empty ordered list starting at `start`.
    pub fn ordered(start: u64) -> Self {
        Self {
            start: Some(start),
            items: Vec::new(),
        }
    }

    /// Check if the list is numbered.
    pub fn is_ordered(&self) -> bool {
        self.start.is_some()
    }

    /// Get plain text, one line per item.
    pub fn plain_text(&self) -> String {
        self.items
            .iter()
            .map(|item| {
                item.children
                    .iter()
                    .map(Element::plain_text)
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// A single list item.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ListItem {
    /// Task list state (`Some(true)` for `[x]`)
    pub checked: Option<bool>,

    /// Item content; tight items hold a single paragraph
    pub children: Vec<Element>,
}

impl ListItem {
    /// Create an item holding one paragraph of text.
    pub fn with_text(text: impl Into<String>) -> Self {
        Self {
            checked: None,
            children: vec![Element::paragraph(text)],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_level_clamped() {
        match Element::heading("Title", 9) {
            Element::Heading { level, .. } => assert_eq!(level, 6),
            other => panic!("unexpected element {other:?}"),
        }
    }

    #[test]
    fn test_list_plain_text() {
        let mut list = List::ordered(1);
        list.items.push(ListItem::with_text("one"));
        list.items.push(ListItem::with_text("two"));
        assert!(list.is_ordered());
        assert_eq!(Element::List(list).plain_text(), "one\ntwo");
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(Element::Rule.kind_name(), "rule");
        assert_eq!(Element::paragraph("x").kind_name(), "paragraph");
        assert!(Element::Diagram {
            language: "mermaid".into(),
            source: "graph TD".into()
        }
        .is_diagram());
    }
}
