//! Text measurement and line wrapping.

use crate::model::{Color, DrawOp, FontFamily, FontSpec, Fragment, Rect};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use usvg::fontdb::{self, Database};

/// Measures the advance width of a text run.
pub trait TextMeasurer: Send + Sync {
    /// Advance width of `text` in pixels when set in `font`.
    fn measure(&self, text: &str, font: &FontSpec) -> f32;
}

/// Font family names, most preferred first, ending in a generic family.
pub fn family_names(family: FontFamily) -> &'static [&'static str] {
    match family {
        FontFamily::Sans => &[
            "Inter",
            "Helvetica",
            "Arial",
            "DejaVu Sans",
            "Liberation Sans",
            "sans-serif",
        ],
        FontFamily::Mono => &[
            "JetBrains Mono",
            "Menlo",
            "Consolas",
            "DejaVu Sans Mono",
            "Liberation Mono",
            "monospace",
        ],
    }
}

/// Glyph-class width model that needs no font files.
///
/// Results are deterministic, which makes it the measurer of choice for
/// tests and for hosts without system fonts.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicMeasurer;

impl HeuristicMeasurer {
    /// Approximate advance of `ch` in em units.
    pub fn glyph_em(ch: char, family: FontFamily) -> f32 {
        if is_wide(ch) {
            return 1.0;
        }
        match family {
            FontFamily::Mono => 0.6,
            FontFamily::Sans => match ch {
                ' ' | '\u{00A0}' => 0.32,
                '\t' => 1.28,
                'i' | 'l' | 'I' | '|' | '!' => 0.24,
                '.' | ',' | ':' | ';' | '\'' | '"' | '`' => 0.23,
                '-' | '\u{2010}'..='\u{2014}' => 0.34,
                '(' | ')' | '[' | ']' | '{' | '}' => 0.30,
                'f' | 't' | 'j' | 'r' => 0.34,
                'm' | 'w' | 'M' | 'W' | '@' | '%' | '&' | '#' => 0.74,
                c if c.is_ascii_digit() => 0.52,
                c if c.is_ascii_uppercase() => 0.64,
                c if c.is_ascii_lowercase() => 0.52,
                c if c.is_whitespace() => 0.32,
                c if c.is_ascii_punctuation() => 0.42,
                _ => 0.56,
            },
        }
    }
}

impl TextMeasurer for HeuristicMeasurer {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        let em: f32 = text.chars().map(|c| Self::glyph_em(c, font.family)).sum();
        let mut scale = 1.0;
        if font.bold {
            scale += 0.03;
        }
        if font.italic {
            scale += 0.01;
        }
        em * font.size * scale
    }
}

fn is_wide(ch: char) -> bool {
    matches!(ch,
        '\u{1100}'..='\u{115F}'
        | '\u{2E80}'..='\u{A4CF}'
        | '\u{AC00}'..='\u{D7A3}'
        | '\u{F900}'..='\u{FAFF}'
        | '\u{FE30}'..='\u{FE4F}'
        | '\u{FF00}'..='\u{FF60}'
        | '\u{FFE0}'..='\u{FFE6}'
        | '\u{1F300}'..='\u{1FAFF}')
}

type FaceKey = (FontFamily, bool, bool);

/// Measures text with real font advances from a font database.
///
/// Advances for the Latin and general punctuation ranges are read once per
/// face; other characters and missing faces use [`HeuristicMeasurer`].
pub struct FontMeasurer {
    db: Arc<Database>,
    faces: RwLock<HashMap<FaceKey, Option<Arc<AdvanceTable>>>>,
}

struct AdvanceTable {
    advances: HashMap<char, f32>,
}

impl FontMeasurer {
    /// Create a measurer over a font database.
    pub fn new(db: Arc<Database>) -> Self {
        Self {
            db,
            faces: RwLock::new(HashMap::new()),
        }
    }

    /// Check if a face resolves for the given font.
    pub fn has_face(&self, font: &FontSpec) -> bool {
        self.table(font).is_some()
    }

    fn table(&self, font: &FontSpec) -> Option<Arc<AdvanceTable>> {
        let key = (font.family, font.bold, font.italic);
        if let Ok(faces) = self.faces.read() {
            if let Some(entry) = faces.get(&key) {
                return entry.clone();
            }
        }

        let table = self.load_table(font).map(Arc::new);
        if let Ok(mut faces) = self.faces.write() {
            faces.insert(key, table.clone());
        }
        table
    }

    fn load_table(&self, font: &FontSpec) -> Option<AdvanceTable> {
        let families: Vec<fontdb::Family<'_>> = family_names(font.family)
            .iter()
            .map(|name| match *name {
                "sans-serif" => fontdb::Family::SansSerif,
                "monospace" => fontdb::Family::Monospace,
                other => fontdb::Family::Name(other),
            })
            .collect();
        let query = fontdb::Query {
            families: &families,
            weight: if font.bold {
                fontdb::Weight::BOLD
            } else {
                fontdb::Weight::NORMAL
            },
            stretch: fontdb::Stretch::Normal,
            style: if font.italic {
                fontdb::Style::Italic
            } else {
                fontdb::Style::Normal
            },
        };
        let id = self.db.query(&query)?;

        self.db
            .with_face_data(id, |data, index| {
                let face = ttf_parser::Face::parse(data, index).ok()?;
                let upem = f32::from(face.units_per_em());
                if upem <= 0.0 {
                    return None;
                }
                let advances = ('\u{20}'..='\u{24F}')
                    .chain('\u{2000}'..='\u{206F}')
                    .filter_map(|ch| {
                        let glyph = face.glyph_index(ch)?;
                        let advance = face.glyph_hor_advance(glyph)?;
                        Some((ch, f32::from(advance) / upem))
                    })
                    .collect();
                Some(AdvanceTable { advances })
            })
            .flatten()
    }
}

impl TextMeasurer for FontMeasurer {
    fn measure(&self, text: &str, font: &FontSpec) -> f32 {
        match self.table(font) {
            Some(table) => {
                let em: f32 = text
                    .chars()
                    .map(|c| {
                        table
                            .advances
                            .get(&c)
                            .copied()
                            .unwrap_or_else(|| HeuristicMeasurer::glyph_em(c, font.family))
                    })
                    .sum();
                em * font.size
            }
            None => HeuristicMeasurer.measure(text, font),
        }
    }
}

impl std::fmt::Debug for FontMeasurer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FontMeasurer")
            .field("faces", &self.db.len())
            .finish()
    }
}

/// A run of text with resolved paint.
#[derive(Debug, Clone, PartialEq)]
pub struct StyledSpan {
    /// Text content
    pub text: String,
    /// Font
    pub font: FontSpec,
    /// Text color
    pub color: Color,
    /// Underline decoration
    pub underline: bool,
    /// Strikethrough decoration
    pub strikethrough: bool,
    /// Background highlight (inline code)
    pub highlight: Option<Color>,
}

impl StyledSpan {
    /// Plain span in the given font and color.
    pub fn new(text: impl Into<String>, font: FontSpec, color: Color) -> Self {
        Self {
            text: text.into(),
            font,
            color,
            underline: false,
            strikethrough: false,
            highlight: None,
        }
    }

    fn same_style(&self, other: &StyledSpan) -> bool {
        self.font == other.font
            && self.color == other.color
            && self.underline == other.underline
            && self.strikethrough == other.strikethrough
            && self.highlight == other.highlight
    }
}

/// Input to the line wrapper.
#[derive(Debug, Clone, PartialEq)]
pub enum Piece {
    /// Styled text
    Span(StyledSpan),
    /// Forced line break
    Break,
}

/// A positioned span on a line.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSpan {
    /// Offset from the line start
    pub x: f32,
    /// Advance width
    pub width: f32,
    /// Span content and style
    pub span: StyledSpan,
}

/// One wrapped line.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TextLine {
    /// Spans in visual order
    pub spans: Vec<LineSpan>,
    /// Total advance width
    pub width: f32,
    /// Largest font size on the line
    pub size: f32,
}

impl TextLine {
    fn is_empty(&self) -> bool {
        self.spans.is_empty()
    }

    fn push(&mut self, text: &str, width: f32, span: &StyledSpan) {
        self.size = self.size.max(span.font.size);
        if let Some(last) = self.spans.last_mut() {
            if last.span.same_style(span) {
                last.span.text.push_str(text);
                last.width += width;
                self.width += width;
                return;
            }
        }
        self.spans.push(LineSpan {
            x: self.width,
            width,
            span: StyledSpan {
                text: text.to_string(),
                ..span.clone()
            },
        });
        self.width += width;
    }

    fn trim_end(&mut self, measurer: &dyn TextMeasurer) {
        while let Some(last) = self.spans.last_mut() {
            let trimmed = last.span.text.trim_end().len();
            if trimmed == last.span.text.len() {
                break;
            }
            last.span.text.truncate(trimmed);
            let width = measurer.measure(&last.span.text, &last.span.font);
            self.width -= last.width - width;
            last.width = width;
            if last.span.text.is_empty() {
                self.spans.pop();
            } else {
                break;
            }
        }
    }
}

/// Horizontal alignment of wrapped lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    /// Flush left
    #[default]
    Left,
    /// Centered
    Center,
    /// Flush right
    Right,
}

/// Greedy line breaker.
pub struct LineWrapper<'a> {
    measurer: &'a dyn TextMeasurer,
    max_width: f32,
    preserve_whitespace: bool,
}

impl<'a> LineWrapper<'a> {
    /// Wrap at `max_width`, collapsing leading and trailing whitespace.
    pub fn new(measurer: &'a dyn TextMeasurer, max_width: f32) -> Self {
        Self {
            measurer,
            max_width: max_width.max(1.0),
            preserve_whitespace: false,
        }
    }

    /// Keep whitespace as written (code blocks).
    pub fn preserving_whitespace(mut self) -> Self {
        self.preserve_whitespace = true;
        self
    }

    /// Break pieces into lines. `default_size` sizes empty lines.
    pub fn wrap(&self, pieces: &[Piece], default_size: f32) -> Vec<TextLine> {
        let mut lines = Vec::new();
        let mut line = TextLine::default();

        for piece in pieces {
            let span = match piece {
                Piece::Break => {
                    self.close(&mut lines, &mut line, default_size);
                    continue;
                }
                Piece::Span(span) => span,
            };

            for token in tokens(&span.text) {
                let is_space = token.chars().all(char::is_whitespace);
                if is_space && line.is_empty() && !self.preserve_whitespace {
                    continue;
                }
                let width = self.measurer.measure(token, &span.font);

                if line.width + width <= self.max_width {
                    line.push(token, width, span);
                } else if is_space {
                    self.close(&mut lines, &mut line, default_size);
                } else if !line.is_empty() && width <= self.max_width {
                    self.close(&mut lines, &mut line, default_size);
                    line.push(token, width, span);
                } else {
                    self.break_word(token, span, &mut lines, &mut line, default_size);
                }
            }
        }

        if !line.is_empty() || lines.is_empty() {
            self.close(&mut lines, &mut line, default_size);
        }
        lines
    }

    fn break_word(
        &self,
        token: &str,
        span: &StyledSpan,
        lines: &mut Vec<TextLine>,
        line: &mut TextLine,
        default_size: f32,
    ) {
        let mut buf = [0u8; 4];
        for ch in token.chars() {
            let s = ch.encode_utf8(&mut buf);
            let width = self.measurer.measure(s, &span.font);
            if line.width + width > self.max_width && !line.is_empty() {
                self.close(lines, line, default_size);
            }
            line.push(s, width, span);
        }
    }

    fn close(&self, lines: &mut Vec<TextLine>, line: &mut TextLine, default_size: f32) {
        let mut done = std::mem::take(line);
        if !self.preserve_whitespace {
            done.trim_end(self.measurer);
        }
        if done.size <= 0.0 {
            done.size = default_size;
        }
        lines.push(done);
    }
}

fn tokens(text: &str) -> impl Iterator<Item = &str> {
    let mut rest = text;
    std::iter::from_fn(move || {
        let first = rest.chars().next()?;
        let space = first.is_whitespace();
        let end = rest
            .char_indices()
            .find(|(_, c)| c.is_whitespace() != space)
            .map(|(i, _)| i)
            .unwrap_or(rest.len());
        let (token, tail) = rest.split_at(end);
        rest = tail;
        Some(token)
    })
}

/// Wrapped text ready to draw.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBlock {
    /// Wrapped lines
    pub lines: Vec<TextLine>,
    /// Line height multiplier
    pub leading: f32,
}

impl TextBlock {
    /// Wrap `pieces` into a block.
    pub fn layout(
        pieces: &[Piece],
        max_width: f32,
        default_size: f32,
        leading: f32,
        measurer: &dyn TextMeasurer,
    ) -> Self {
        Self {
            lines: LineWrapper::new(measurer, max_width).wrap(pieces, default_size),
            leading,
        }
    }

    /// Total height of all lines.
    pub fn height(&self) -> f32 {
        self.lines.iter().map(|l| l.size * self.leading).sum()
    }

    /// Widest line.
    pub fn width(&self) -> f32 {
        self.lines.iter().map(|l| l.width).fold(0.0, f32::max)
    }

    /// Draw the lines into `fragment` with the top-left corner at `(x, y)`.
    pub fn draw(&self, fragment: &mut Fragment, x: f32, y: f32, width: f32, align: TextAlign) {
        let mut top = y;
        for line in &self.lines {
            let line_height = line.size * self.leading;
            let half_leading = (line_height - line.size) / 2.0;
            let baseline = top + half_leading + line.size * 0.8;
            let offset = match align {
                TextAlign::Left => 0.0,
                TextAlign::Center => ((width - line.width) / 2.0).max(0.0),
                TextAlign::Right => (width - line.width).max(0.0),
            };

            for placed in &line.spans {
                let span = &placed.span;
                if let Some(bg) = span.highlight {
                    fragment.push(DrawOp::Rect {
                        rect: Rect::new(
                            x + offset + placed.x - 2.0,
                            top + half_leading - 1.0,
                            placed.width + 4.0,
                            line.size + 2.0,
                        ),
                        fill: Some(bg),
                        stroke: None,
                    });
                }
                fragment.push(DrawOp::Text {
                    x: x + offset + placed.x,
                    baseline,
                    text: span.text.clone(),
                    font: span.font,
                    color: span.color,
                    underline: span.underline,
                    strikethrough: span.strikethrough,
                });
            }
            top += line_height;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(text: &str) -> Piece {
        Piece::Span(StyledSpan::new(text, FontSpec::mono(10.0), Color::BLACK))
    }

    #[test]
    fn test_heuristic_mono_width() {
        let width = HeuristicMeasurer.measure("abcd", &FontSpec::mono(10.0));
        assert!((width - 24.0).abs() < 1e-4);
    }

    #[test]
    fn test_heuristic_wide_chars() {
        let width = HeuristicMeasurer.measure("漢字", &FontSpec::sans(10.0));
        assert!((width - 20.0).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_breaks_on_spaces() {
        // 6px per glyph in 10px mono
        let lines = LineWrapper::new(&HeuristicMeasurer, 40.0)
            .wrap(&[span("aaaa bbbb cccc")], 10.0);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].spans[0].span.text, "aaaa");
        assert!((lines[0].width - 24.0).abs() < 1e-4);
    }

    #[test]
    fn test_wrap_splits_long_word() {
        let lines = LineWrapper::new(&HeuristicMeasurer, 30.0).wrap(&[span("abcdefghij")], 10.0);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans[0].span.text, "abcde");
    }

    #[test]
    fn test_wrap_forced_break_and_empty() {
        let lines =
            LineWrapper::new(&HeuristicMeasurer, 500.0).wrap(&[span("a"), Piece::Break, span("b")], 10.0);
        assert_eq!(lines.len(), 2);

        let lines = LineWrapper::new(&HeuristicMeasurer, 500.0).wrap(&[], 12.0);
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].size, 12.0);
    }

    #[test]
    fn test_text_block_height() {
        let block = TextBlock::layout(&[span("one two")], 500.0, 10.0, 1.5, &HeuristicMeasurer);
        assert_eq!(block.lines.len(), 1);
        assert_eq!(block.height(), 15.0);

        let mut fragment = Fragment::new();
        block.draw(&mut fragment, 0.0, 0.0, 500.0, TextAlign::Left);
        assert_eq!(fragment.text_run_count(), 1);
    }

    #[test]
    fn test_preserve_whitespace() {
        let lines = LineWrapper::new(&HeuristicMeasurer, 500.0)
            .preserving_whitespace()
            .wrap(&[span("    indented")], 10.0);
        assert_eq!(lines[0].spans[0].span.text, "    indented");
    }
}
