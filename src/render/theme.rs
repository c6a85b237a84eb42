//! Visual theme for block layout.

use crate::model::Color;

/// Colors, font sizes and spacing used by the block renderer.
///
/// The default theme is a high-contrast black-on-white style: headings with
/// ornaments, inverted code blocks and table headers, heavy block quote rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    /// Page and block background
    pub background: Color,
    /// Body text color
    pub text: Color,
    /// Secondary text (h4, captions)
    pub muted: Color,
    /// Rules and light borders
    pub rule: Color,
    /// Block quote background
    pub quote_background: Color,
    /// Inline code background
    pub code_span_background: Color,
    /// Link color
    pub link: Color,
    /// Diagram failure panel accent
    pub error: Color,

    /// Body font size in pixels
    pub body_size: f32,
    /// Body line height multiplier
    pub body_leading: f32,
    /// Heading font sizes for levels 1-6
    pub heading_sizes: [f32; 6],
    /// Code block font size
    pub code_size: f32,
    /// Table font size
    pub table_size: f32,
    /// Block quote font size
    pub quote_size: f32,

    /// Bottom margin added to every block
    pub block_gap: f32,
    /// Vertical gap between list items
    pub list_gap: f32,
    /// Indentation of list content
    pub list_indent: f32,
    /// Padding inside code blocks
    pub code_padding: f32,
    /// Horizontal cell padding
    pub cell_padding_x: f32,
    /// Vertical cell padding
    pub cell_padding_y: f32,
    /// Block quote left border width
    pub quote_border: f32,
    /// Block quote left padding
    pub quote_indent: f32,
}

impl Theme {
    /// Font size for a heading level (clamped to 1-6).
    pub fn heading_size(&self, level: u8) -> f32 {
        let index = usize::from(level.clamp(1, 6)) - 1;
        self.heading_sizes[index]
    }

    /// Set the body font size, scaling nothing else.
    pub fn with_body_size(mut self, size: f32) -> Self {
        self.body_size = size;
        self
    }

    /// Set the bottom margin between blocks.
    pub fn with_block_gap(mut self, gap: f32) -> Self {
        self.block_gap = gap;
        self
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: Color::WHITE,
            text: Color::BLACK,
            muted: Color::BLACK.with_alpha(153),
            rule: Color::BLACK.with_alpha(51),
            quote_background: Color::hex(0xf9fafb),
            code_span_background: Color::hex(0xf3f4f6),
            link: Color::hex(0x1d4ed8),
            error: Color::hex(0xdc2626),

            body_size: 17.0,
            body_leading: 1.625,
            heading_sizes: [36.0, 24.0, 18.0, 14.0, 14.0, 14.0],
            code_size: 15.0,
            table_size: 14.0,
            quote_size: 20.0,

            block_gap: 16.0,
            list_gap: 12.0,
            list_indent: 32.0,
            code_padding: 24.0,
            cell_padding_x: 24.0,
            cell_padding_y: 16.0,
            quote_border: 12.0,
            quote_indent: 32.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_sizes() {
        let theme = Theme::default();
        assert_eq!(theme.heading_size(1), 36.0);
        assert_eq!(theme.heading_size(2), 24.0);
        assert_eq!(theme.heading_size(0), 36.0);
        assert_eq!(theme.heading_size(9), 14.0);
    }
}
