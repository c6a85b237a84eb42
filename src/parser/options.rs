//! Parsing options and configuration.

/// Options for parsing Markdown documents.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Enable GFM tables
    pub tables: bool,

    /// Enable `~~strikethrough~~`
    pub strikethrough: bool,

    /// Enable `- [x]` task list items
    pub task_lists: bool,

    /// Enable footnote definitions and references
    pub footnotes: bool,

    /// How raw HTML blocks are handled
    pub html_mode: HtmlMode,

    /// Fenced code languages rendered as diagrams
    pub diagram_languages: Vec<String>,
}

impl ParseOptions {
    /// Create new parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable GFM tables.
    pub fn with_tables(mut self, enabled: bool) -> Self {
        self.tables = enabled;
        self
    }

    /// Enable or disable strikethrough.
    pub fn with_strikethrough(mut self, enabled: bool) -> Self {
        self.strikethrough = enabled;
        self
    }

    /// Enable or disable task lists.
    pub fn with_task_lists(mut self, enabled: bool) -> Self {
        self.task_lists = enabled;
        self
    }

    /// Enable or disable footnotes.
    pub fn with_footnotes(mut self, enabled: bool) -> Self {
        self.footnotes = enabled;
        self
    }

    /// Set raw HTML handling.
    pub fn with_html_mode(mut self, mode: HtmlMode) -> Self {
        self.html_mode = mode;
        self
    }

    /// Drop raw HTML blocks.
    pub fn strip_html(mut self) -> Self {
        self.html_mode = HtmlMode::Strip;
        self
    }

    /// Register an additional diagram language.
    pub fn with_diagram_language(mut self, language: impl Into<String>) -> Self {
        let language = language.into().to_ascii_lowercase();
        if !self.diagram_languages.contains(&language) {
            self.diagram_languages.push(language);
        }
        self
    }

    /// Plain CommonMark: all extensions disabled.
    pub fn commonmark() -> Self {
        Self {
            tables: false,
            strikethrough: false,
            task_lists: false,
            footnotes: false,
            ..Self::default()
        }
    }

    /// Check if fenced code in `language` is a diagram.
    pub fn is_diagram_language(&self, language: &str) -> bool {
        self.diagram_languages
            .iter()
            .any(|l| l.eq_ignore_ascii_case(language))
    }
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            tables: true,
            strikethrough: true,
            task_lists: true,
            footnotes: true,
            html_mode: HtmlMode::Literal,
            diagram_languages: vec!["mermaid".to_string(), "svg".to_string()],
        }
    }
}

/// How raw HTML blocks are handled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HtmlMode {
    /// Show the markup as literal text
    #[default]
    Literal,
    /// Drop the block
    Strip,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_options_builder() {
        let options = ParseOptions::new()
            .with_tables(false)
            .strip_html()
            .with_diagram_language("Graphviz");

        assert!(!options.tables);
        assert_eq!(options.html_mode, HtmlMode::Strip);
        assert!(options.is_diagram_language("graphviz"));
        assert!(options.is_diagram_language("MERMAID"));
    }

    #[test]
    fn test_default_options() {
        let options = ParseOptions::default();
        assert!(options.tables);
        assert!(options.task_lists);
        assert_eq!(options.html_mode, HtmlMode::Literal);
        assert!(!ParseOptions::commonmark().tables);
    }
}
