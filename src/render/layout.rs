//! Block layout: turns one [`Element`] into a display list at a fixed width.

use super::diagram::{self, DiagramRegistry};
use super::text::{LineWrapper, Piece, StyledSpan, TextAlign, TextBlock, TextMeasurer};
use super::theme::Theme;
use crate::error::{Error, Result};
use crate::model::{
    Alignment, Color, DrawOp, Element, Embedded, FontFamily, FontSpec, Fragment, Inline, List,
    Rect, Stroke, Table, TextRun,
};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use image::ImageFormat;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Label drawn in place of a diagram that could not be rendered.
pub const DIAGRAM_FAILURE_LABEL: &str = "DIAGRAM_RENDER_FAILURE";

const STACK_GAP: f32 = 8.0;
const PANEL_OUTER_PADDING: f32 = 16.0;
const PANEL_INNER_PADDING: f32 = 32.0;
const PLACEHOLDER_HEIGHT: f32 = 120.0;

#[derive(Debug, Clone, Copy)]
struct TextContext {
    font: FontSpec,
    color: Color,
    leading: f32,
}

/// Lays out elements with a theme, a text measurer and diagram renderers.
pub struct BlockLayout<'a> {
    theme: &'a Theme,
    measurer: &'a dyn TextMeasurer,
    diagrams: &'a DiagramRegistry,
    base_dir: Option<&'a Path>,
}

impl<'a> BlockLayout<'a> {
    /// Create a layout engine.
    pub fn new(
        theme: &'a Theme,
        measurer: &'a dyn TextMeasurer,
        diagrams: &'a DiagramRegistry,
        base_dir: Option<&'a Path>,
    ) -> Self {
        Self {
            theme,
            measurer,
            diagrams,
            base_dir,
        }
    }

    /// Lay out `element` at `width`.
    ///
    /// Returns the display list and the content height, without the
    /// block's bottom margin. Diagram and image failures render as visible
    /// panels and never fail the layout.
    pub fn layout(&self, element: &Element, width: f32) -> (Fragment, f32) {
        self.element(element, width.max(1.0), self.body())
    }

    fn body(&self) -> TextContext {
        TextContext {
            font: FontSpec::sans(self.theme.body_size),
            color: self.theme.text,
            leading: self.theme.body_leading,
        }
    }

    fn element(&self, element: &Element, width: f32, ctx: TextContext) -> (Fragment, f32) {
        match element {
            Element::Heading { level, content } => self.heading(*level, content, width),
            Element::Paragraph { content } => self.paragraph(content, width, ctx),
            Element::List(list) => self.list(list, width, ctx),
            Element::CodeBlock { language, code } => self.code_block(language.as_deref(), code, width),
            Element::Diagram { language, source } => self.diagram(language, source, width),
            Element::Table(table) => self.table(table, width),
            Element::BlockQuote { children } => self.block_quote(children, width),
            Element::Image { src, alt } => self.image(src, alt, width),
            Element::Rule => self.rule(width),
            Element::Html { raw } => self.html(raw, width),
        }
    }

    fn stack(&self, children: &[Element], width: f32, ctx: TextContext, gap: f32) -> (Fragment, f32) {
        let mut fragment = Fragment::new();
        let mut y = 0.0;
        for (i, child) in children.iter().enumerate() {
            if i > 0 {
                y += gap;
            }
            let (child_fragment, height) = self.element(child, width, ctx);
            fragment.append_translated(child_fragment, 0.0, y);
            y += height;
        }
        (fragment, y)
    }

    fn span(&self, run: &TextRun, ctx: TextContext) -> StyledSpan {
        let style = &run.style;
        let mut font = ctx.font;
        if style.code {
            font = FontSpec {
                family: FontFamily::Mono,
                size: ctx.font.size * 0.9,
                ..font
            };
        }
        font.bold |= style.bold;
        font.italic |= style.italic;

        let is_link = style.link.is_some();
        StyledSpan {
            text: run.text.clone(),
            font,
            color: if is_link { self.theme.link } else { ctx.color },
            underline: is_link,
            strikethrough: style.strikethrough,
            highlight: style.code.then_some(self.theme.code_span_background),
        }
    }

    fn pieces(&self, inlines: &[Inline], ctx: TextContext) -> Vec<Piece> {
        inlines
            .iter()
            .map(|inline| match inline {
                Inline::Text(run) => Piece::Span(self.span(run, ctx)),
                Inline::LineBreak => Piece::Break,
                Inline::Image { alt, .. } => Piece::Span(StyledSpan::new(
                    format!("[{alt}]"),
                    ctx.font.italic(),
                    self.theme.muted,
                )),
            })
            .collect()
    }

    fn text_block(&self, inlines: &[Inline], width: f32, ctx: TextContext) -> TextBlock {
        TextBlock::layout(
            &self.pieces(inlines, ctx),
            width,
            ctx.font.size,
            ctx.leading,
            self.measurer,
        )
    }

    fn heading(&self, level: u8, content: &[Inline], width: f32) -> (Fragment, f32) {
        let theme = self.theme;
        let size = theme.heading_size(level);
        let (color, leading, indent) = match level {
            1 => (theme.text, 1.2, 24.0),
            2 => (theme.text, 1.3, 0.0),
            3 => (theme.text, 1.4, 20.0),
            _ => (theme.muted, 1.5, 0.0),
        };
        let ctx = TextContext {
            font: FontSpec::sans(size).bold(),
            color,
            leading,
        };
        let text = self.text_block(content, width - indent, ctx);
        let text_height = text.height();

        let mut fragment = Fragment::new();
        let mut height = text_height;
        match level {
            1 => fragment.push(DrawOp::Rect {
                rect: Rect::new(0.0, 0.0, 6.0, text_height),
                fill: Some(theme.text),
                stroke: None,
            }),
            2 => {
                let y = text_height + 8.0;
                fragment.push(DrawOp::Line {
                    from: (0.0, y),
                    to: (width, y),
                    stroke: Stroke::new(theme.rule, 2.0),
                });
                height = y + 1.0;
            }
            3 => {
                let first_line = text.lines.first().map(|l| l.size).unwrap_or(size);
                let cy = first_line * leading / 2.0;
                let r = 5.0;
                fragment.push(DrawOp::Polygon {
                    points: vec![(r, cy - r), (2.0 * r, cy), (r, cy + r), (0.0, cy)],
                    fill: theme.text,
                });
            }
            _ => {}
        }
        text.draw(&mut fragment, indent, 0.0, width - indent, TextAlign::Left);
        (fragment, height)
    }

    fn paragraph(&self, content: &[Inline], width: f32, ctx: TextContext) -> (Fragment, f32) {
        let text = self.text_block(content, width, ctx);
        let mut fragment = Fragment::new();
        text.draw(&mut fragment, 0.0, 0.0, width, TextAlign::Left);
        (fragment, text.height())
    }

    fn list(&self, list: &List, width: f32, ctx: TextContext) -> (Fragment, f32) {
        let theme = self.theme;
        let indent = theme.list_indent;
        let line_height = ctx.font.size * ctx.leading;

        let mut fragment = Fragment::new();
        let mut y = 0.0;
        for (i, item) in list.items.iter().enumerate() {
            if i > 0 {
                y += theme.list_gap;
            }
            let center = y + line_height / 2.0;

            match (item.checked, list.start) {
                (Some(checked), _) => {
                    fragment.push(DrawOp::Rect {
                        rect: Rect::new(8.0, center - 6.0, 12.0, 12.0),
                        fill: None,
                        stroke: Some(Stroke::new(ctx.color, 1.5)),
                    });
                    if checked {
                        fragment.push(DrawOp::Rect {
                            rect: Rect::new(11.0, center - 3.0, 6.0, 6.0),
                            fill: Some(ctx.color),
                            stroke: None,
                        });
                    }
                }
                (None, Some(start)) => {
                    let label = format!("{}.", start.saturating_add(i as u64));
                    let font = ctx.font.bold();
                    let label_width = self.measurer.measure(&label, &font);
                    let baseline = y + (line_height - font.size) / 2.0 + font.size * 0.8;
                    fragment.push(DrawOp::Text {
                        x: (indent - 8.0 - label_width).max(0.0),
                        baseline,
                        text: label,
                        font,
                        color: ctx.color,
                        underline: false,
                        strikethrough: false,
                    });
                }
                (None, None) => fragment.push(DrawOp::Rect {
                    rect: Rect::new(10.0, center - 3.0, 6.0, 6.0),
                    fill: Some(ctx.color),
                    stroke: None,
                }),
            }

            let (content, content_height) =
                self.stack(&item.children, width - indent, ctx, STACK_GAP);
            fragment.append_translated(content, indent, y);
            y += content_height.max(line_height);
        }
        (fragment, y)
    }

    fn code_block(&self, language: Option<&str>, code: &str, width: f32) -> (Fragment, f32) {
        let theme = self.theme;
        let pad = theme.code_padding;
        let font = FontSpec::mono(theme.code_size);

        let mut pieces = Vec::new();
        for (i, line) in code.split('\n').enumerate() {
            if i > 0 {
                pieces.push(Piece::Break);
            }
            if !line.is_empty() {
                pieces.push(Piece::Span(StyledSpan::new(
                    line.replace('\t', "    "),
                    font,
                    theme.background,
                )));
            }
        }
        let text = TextBlock {
            lines: LineWrapper::new(self.measurer, width - 2.0 * pad)
                .preserving_whitespace()
                .wrap(&pieces, font.size),
            leading: 1.6,
        };
        let height = text.height() + 2.0 * pad;

        let mut fragment = Fragment::new();
        fragment.push(DrawOp::Rect {
            rect: Rect::new(0.0, 0.0, width, height),
            fill: Some(theme.text),
            stroke: None,
        });
        if let Some(language) = language {
            let label_font = FontSpec::mono(11.0);
            let label = language.to_ascii_uppercase();
            let label_width = self.measurer.measure(&label, &label_font);
            fragment.push(DrawOp::Text {
                x: width - pad - label_width,
                baseline: pad * 0.7,
                text: label,
                font: label_font,
                color: theme.background.with_alpha(128),
                underline: false,
                strikethrough: false,
            });
        }
        text.draw(&mut fragment, pad, pad, width - 2.0 * pad, TextAlign::Left);
        (fragment, height)
    }

    fn table(&self, table: &Table, width: f32) -> (Fragment, f32) {
        let theme = self.theme;
        let columns = table.column_count().max(1);
        let column_width = width / columns as f32;
        let cell_width = (column_width - 2.0 * theme.cell_padding_x).max(1.0);
        let font = FontSpec::sans(theme.table_size);

        let rows = std::iter::once((&table.header, true))
            .filter(|(row, _)| !row.cells.is_empty())
            .chain(table.rows.iter().map(|row| (row, false)));

        let mut fragment = Fragment::new();
        let mut y = 0.0;
        for (row, is_header) in rows {
            let ctx = if is_header {
                TextContext {
                    font: font.bold(),
                    color: theme.background,
                    leading: 1.5,
                }
            } else {
                TextContext {
                    font,
                    color: theme.text,
                    leading: 1.5,
                }
            };
            let blocks: Vec<TextBlock> = (0..columns)
                .map(|c| {
                    let content = row.cells.get(c).map(|cell| cell.content.as_slice());
                    self.text_block(content.unwrap_or(&[]), cell_width, ctx)
                })
                .collect();
            let row_height = blocks.iter().map(TextBlock::height).fold(0.0, f32::max)
                + 2.0 * theme.cell_padding_y;

            if is_header {
                fragment.push(DrawOp::Rect {
                    rect: Rect::new(0.0, y, width, row_height),
                    fill: Some(theme.text),
                    stroke: None,
                });
            } else if y > 0.0 {
                fragment.push(DrawOp::Line {
                    from: (0.0, y),
                    to: (width, y),
                    stroke: Stroke::new(theme.rule, 1.0),
                });
            }
            for (c, block) in blocks.iter().enumerate() {
                let align = match table.alignment(c) {
                    Alignment::Center => TextAlign::Center,
                    Alignment::Right => TextAlign::Right,
                    Alignment::None | Alignment::Left => TextAlign::Left,
                };
                block.draw(
                    &mut fragment,
                    c as f32 * column_width + theme.cell_padding_x,
                    y + theme.cell_padding_y,
                    cell_width,
                    align,
                );
            }
            y += row_height;
        }

        fragment.push(DrawOp::Rect {
            rect: Rect::new(0.0, 0.0, width, y),
            fill: None,
            stroke: Some(Stroke::new(theme.text, 2.0)),
        });
        (fragment, y)
    }

    fn block_quote(&self, children: &[Element], width: f32) -> (Fragment, f32) {
        let theme = self.theme;
        let pad_y = 16.0;
        let inner_x = theme.quote_border + theme.quote_indent;
        let ctx = TextContext {
            font: FontSpec::sans(theme.quote_size).bold().italic(),
            color: theme.text,
            leading: 1.5,
        };
        let (inner, inner_height) = self.stack(children, width - inner_x - pad_y, ctx, 12.0);
        let height = inner_height + 2.0 * pad_y;

        let mut fragment = Fragment::new();
        fragment.push(DrawOp::Rect {
            rect: Rect::new(0.0, 0.0, width, height),
            fill: Some(theme.quote_background),
            stroke: None,
        });
        fragment.push(DrawOp::Rect {
            rect: Rect::new(0.0, 0.0, theme.quote_border, height),
            fill: Some(theme.text),
            stroke: None,
        });
        fragment.append_translated(inner, inner_x, pad_y);
        (fragment, height)
    }

    fn rule(&self, width: f32) -> (Fragment, f32) {
        let theme = self.theme;
        let cy = 16.0;
        let cx = width / 2.0;

        let mut fragment = Fragment::new();
        fragment.push(DrawOp::Line {
            from: (0.0, cy),
            to: (width, cy),
            stroke: Stroke::new(theme.rule, 1.0),
        });
        fragment.push(DrawOp::Rect {
            rect: Rect::new(cx - 28.0, cy - 8.0, 56.0, 16.0),
            fill: Some(theme.background),
            stroke: None,
        });
        for dx in [-12.0, 0.0, 12.0] {
            fragment.push(DrawOp::Circle {
                center: (cx + dx, cy),
                radius: 3.0,
                fill: theme.text,
            });
        }
        (fragment, 2.0 * cy)
    }

    fn diagram(&self, language: &str, source: &str, width: f32) -> (Fragment, f32) {
        let rendered = match self.diagrams.render(language, source) {
            Ok(rendered) => rendered,
            Err(err) => {
                log::warn!("{language} diagram failed to render: {err}");
                return self.failure_panel(&err.to_string(), width);
            }
        };

        let theme = self.theme;
        let inset = PANEL_OUTER_PADDING + PANEL_INNER_PADDING;
        let available = (width - 2.0 * inset).max(1.0);
        let scale = (available / rendered.width).min(1.0);
        let (w, h) = (rendered.width * scale, rendered.height * scale);
        let inner_height = h + 2.0 * PANEL_INNER_PADDING;
        let height = inner_height + 2.0 * PANEL_OUTER_PADDING;

        let mut fragment = Fragment::new();
        fragment.push(DrawOp::Rect {
            rect: Rect::new(0.0, 0.0, width, height),
            fill: None,
            stroke: Some(Stroke::new(theme.text, 2.0)),
        });
        fragment.push(DrawOp::Rect {
            rect: Rect::new(
                PANEL_OUTER_PADDING,
                PANEL_OUTER_PADDING,
                width - 2.0 * PANEL_OUTER_PADDING,
                inner_height,
            ),
            fill: None,
            stroke: Some(Stroke::new(theme.rule, 1.0)),
        });
        fragment.push(DrawOp::Embed {
            rect: Rect::new(inset + (available - w) / 2.0, inset, w, h),
            payload: rendered.payload,
        });
        (fragment, height)
    }

    fn failure_panel(&self, message: &str, width: f32) -> (Fragment, f32) {
        let theme = self.theme;
        let pad = 16.0;
        let title = TextBlock::layout(
            &[Piece::Span(StyledSpan::new(
                DIAGRAM_FAILURE_LABEL,
                FontSpec::mono(12.0).bold(),
                theme.error,
            ))],
            width - 2.0 * pad,
            12.0,
            1.5,
            self.measurer,
        );
        let detail = TextBlock::layout(
            &[Piece::Span(StyledSpan::new(
                message,
                FontSpec::mono(12.0),
                theme.muted,
            ))],
            width - 2.0 * pad,
            12.0,
            1.5,
            self.measurer,
        );
        let height = title.height() + 8.0 + detail.height() + 2.0 * pad;

        let mut fragment = Fragment::new();
        fragment.push(DrawOp::Rect {
            rect: Rect::new(0.0, 0.0, width, height),
            fill: Some(theme.error.with_alpha(13)),
            stroke: Some(Stroke::new(theme.error, 2.0)),
        });
        title.draw(&mut fragment, pad, pad, width - 2.0 * pad, TextAlign::Left);
        detail.draw(
            &mut fragment,
            pad,
            pad + title.height() + 8.0,
            width - 2.0 * pad,
            TextAlign::Left,
        );
        (fragment, height)
    }

    fn image(&self, src: &str, alt: &str, width: f32) -> (Fragment, f32) {
        match self.load_image(src) {
            Ok((payload, w, h)) => {
                let scale = (width / w).min(1.0);
                let (w, h) = (w * scale, h * scale);
                let mut fragment = Fragment::new();
                fragment.push(DrawOp::Embed {
                    rect: Rect::new(0.0, 0.0, w, h),
                    payload,
                });
                (fragment, h)
            }
            Err(err) => {
                log::warn!("image '{src}' could not be embedded: {err}");
                self.placeholder(alt, width)
            }
        }
    }

    fn placeholder(&self, alt: &str, width: f32) -> (Fragment, f32) {
        let theme = self.theme;
        let label = if alt.is_empty() { "image" } else { alt };
        let text = TextBlock::layout(
            &[Piece::Span(StyledSpan::new(
                label,
                FontSpec::sans(14.0).italic(),
                theme.muted,
            ))],
            width - 32.0,
            14.0,
            1.5,
            self.measurer,
        );
        let height = PLACEHOLDER_HEIGHT.max(text.height() + 32.0);

        let mut fragment = Fragment::new();
        fragment.push(DrawOp::Rect {
            rect: Rect::new(0.0, 0.0, width, height),
            fill: Some(theme.quote_background),
            stroke: Some(Stroke::new(theme.rule, 1.0)),
        });
        text.draw(
            &mut fragment,
            16.0,
            (height - text.height()) / 2.0,
            width - 32.0,
            TextAlign::Center,
        );
        (fragment, height)
    }

    fn read_source(&self, src: &str) -> Result<Vec<u8>> {
        if let Some(uri) = src.strip_prefix("data:") {
            let (meta, payload) = uri
                .split_once(',')
                .ok_or_else(|| Error::Image("malformed data URI".into()))?;
            return if meta.ends_with(";base64") {
                STANDARD
                    .decode(payload.trim())
                    .map_err(|e| Error::Image(e.to_string()))
            } else {
                Ok(payload.as_bytes().to_vec())
            };
        }
        if src.starts_with("http://") || src.starts_with("https://") {
            return Err(Error::Image("remote images are not fetched".into()));
        }
        let path = match self.base_dir {
            Some(dir) => dir.join(src),
            None => PathBuf::from(src),
        };
        std::fs::read(&path).map_err(|e| Error::Image(format!("{}: {e}", path.display())))
    }

    fn load_image(&self, src: &str) -> Result<(Embedded, f32, f32)> {
        let bytes = self.read_source(src)?;

        let head = String::from_utf8_lossy(&bytes[..bytes.len().min(256)]).to_string();
        if head.trim_start().starts_with("<svg") || head.trim_start().starts_with("<?xml") {
            let svg = String::from_utf8(bytes).map_err(|e| Error::Image(e.to_string()))?;
            let rendered = diagram::probe_svg(&svg)?;
            return Ok((rendered.payload, rendered.width, rendered.height));
        }

        let reader = image::io::Reader::new(Cursor::new(&bytes)).with_guessed_format()?;
        let format = reader
            .format()
            .ok_or_else(|| Error::Image("unrecognized image format".into()))?;
        let (w, h) = reader.into_dimensions()?;
        if w == 0 || h == 0 {
            return Err(Error::Image("image has no pixels".into()));
        }

        let (mime, data) = match format {
            ImageFormat::Png => ("image/png", bytes),
            ImageFormat::Jpeg => ("image/jpeg", bytes),
            ImageFormat::Gif => ("image/gif", bytes),
            _ => {
                let decoded = image::load_from_memory(&bytes)?;
                let mut png = Vec::new();
                decoded.write_to(&mut Cursor::new(&mut png), ImageFormat::Png)?;
                ("image/png", png)
            }
        };
        Ok((
            Embedded {
                mime: mime.to_string(),
                data: Arc::new(data),
            },
            w as f32,
            h as f32,
        ))
    }

    fn html(&self, raw: &str, width: f32) -> (Fragment, f32) {
        let theme = self.theme;
        let pad = 12.0;
        let font = FontSpec::mono(13.0);
        let pieces: Vec<Piece> = raw
            .split('\n')
            .enumerate()
            .flat_map(|(i, line)| {
                let brk = (i > 0).then_some(Piece::Break);
                brk.into_iter()
                    .chain(std::iter::once(Piece::Span(StyledSpan::new(line, font, theme.muted))))
            })
            .collect();
        let text = TextBlock {
            lines: LineWrapper::new(self.measurer, width - 2.0 * pad)
                .preserving_whitespace()
                .wrap(&pieces, font.size),
            leading: 1.5,
        };
        let height = text.height() + 2.0 * pad;

        let mut fragment = Fragment::new();
        fragment.push(DrawOp::Rect {
            rect: Rect::new(0.0, 0.0, width, height),
            fill: None,
            stroke: Some(Stroke::new(theme.rule, 1.0)),
        });
        text.draw(&mut fragment, pad, pad, width - 2.0 * pad, TextAlign::Left);
        (fragment, height)
    }
}
