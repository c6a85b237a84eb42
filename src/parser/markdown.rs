//! Markdown parser built on pulldown-cmark's event stream.
//!
//! Events are folded into a stack of open frames. Every `End` event closes
//! the innermost frame and hands its result to the enclosing one, so the
//! parser never needs to match individual end tags.

use super::options::{HtmlMode, ParseOptions};
use crate::model::{
    Alignment, Element, Inline, List, ListItem, Table, TableCell, TableRow, TextRun, TextStyle,
};
use pulldown_cmark::{CodeBlockKind, Event, HeadingLevel, Options, Parser, Tag};
use regex::Regex;
use std::sync::OnceLock;

/// Markdown to [`Element`] parser.
#[derive(Debug, Clone, Default)]
pub struct MarkdownParser {
    options: ParseOptions,
}

impl MarkdownParser {
    /// Create a parser with the given options.
    pub fn new(options: ParseOptions) -> Self {
        Self { options }
    }

    /// Parser options.
    pub fn options(&self) -> &ParseOptions {
        &self.options
    }

    /// Parse Markdown text into top-level elements.
    ///
    /// Footnote definitions are collected and appended after a rule at the
    /// end of the document.
    pub fn parse(&self, text: &str) -> Vec<Element> {
        let parser = Parser::new_ext(text, self.cmark_options());
        let mut builder = TreeBuilder::new(&self.options);
        for event in parser {
            builder.event(event);
        }
        let elements = builder.finish();
        log::debug!("parsed {} top-level elements", elements.len());
        elements
    }

    fn cmark_options(&self) -> Options {
        let mut options = Options::empty();
        if self.options.tables {
            options.insert(Options::ENABLE_TABLES);
        }
        if self.options.strikethrough {
            options.insert(Options::ENABLE_STRIKETHROUGH);
        }
        if self.options.task_lists {
            options.insert(Options::ENABLE_TASKLISTS);
        }
        if self.options.footnotes {
            options.insert(Options::ENABLE_FOOTNOTES);
        }
        options
    }
}

/// Parse Markdown with default options.
pub fn parse_markdown(text: &str) -> Vec<Element> {
    MarkdownParser::default().parse(text)
}

/// Extract the language name from a fenced code info string.
///
/// Accepts `mermaid`, `rust,ignore`, `{.mermaid}` and similar forms.
pub fn info_language(info: &str) -> Option<String> {
    static PATTERN: OnceLock<Option<Regex>> = OnceLock::new();
    let pattern = PATTERN.get_or_init(|| Regex::new(r"^\s*\{?\s*\.?([A-Za-z0-9_+#.-]+)").ok());

    match pattern {
        Some(re) => re
            .captures(info)
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str().trim_end_matches('.').to_string()),
        None => info.split_whitespace().next().map(str::to_string),
    }
    .filter(|lang| !lang.is_empty())
}

#[derive(Debug, Clone)]
enum StyleChange {
    Emphasis,
    Strong,
    Strikethrough,
    Link(String),
}

#[derive(Debug)]
enum Frame {
    Root(Vec<Element>),
    BlockQuote(Vec<Element>),
    Footnote {
        label: String,
        children: Vec<Element>,
    },
    List(List),
    Item {
        item: ListItem,
        inlines: Vec<Inline>,
    },
    Paragraph(Vec<Inline>),
    Heading(u8, Vec<Inline>),
    CodeBlock(Option<String>, String),
    Html(String),
    Table(Table),
    Row {
        cells: Vec<TableCell>,
        head: bool,
    },
    Cell(Vec<Inline>),
    Style(StyleChange),
    Image {
        src: String,
        alt: String,
    },
    Skip,
}

struct TreeBuilder<'a> {
    options: &'a ParseOptions,
    frames: Vec<Frame>,
    footnotes: Vec<Element>,
}

impl<'a> TreeBuilder<'a> {
    fn new(options: &'a ParseOptions) -> Self {
        Self {
            options,
            frames: vec![Frame::Root(Vec::new())],
            footnotes: Vec::new(),
        }
    }

    fn event(&mut self, event: Event<'_>) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(_) => self.end(),
            Event::Text(text) => self.text(&text),
            Event::Code(code) => {
                let style = TextStyle {
                    code: true,
                    ..self.current_style()
                };
                self.push_inline(Inline::Text(TextRun::styled(code.to_string(), style)));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                if self.options.html_mode == HtmlMode::Literal {
                    self.text(&html);
                }
            }
            Event::FootnoteReference(label) => {
                let style = TextStyle {
                    bold: true,
                    ..self.current_style()
                };
                self.push_inline(Inline::Text(TextRun::styled(format!("[{label}]"), style)));
            }
            Event::SoftBreak => self.text(" "),
            Event::HardBreak => self.push_inline(Inline::LineBreak),
            Event::Rule => self.push_element(Element::Rule),
            Event::TaskListMarker(checked) => {
                let item = self.frames.iter_mut().rev().find_map(|frame| match frame {
                    Frame::Item { item, .. } => Some(item),
                    _ => None,
                });
                if let Some(item) = item {
                    item.checked = Some(checked);
                }
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag<'_>) {
        let frame = match tag {
            Tag::Paragraph => Frame::Paragraph(Vec::new()),
            Tag::Heading { level, .. } => Frame::Heading(heading_level(level), Vec::new()),
            Tag::BlockQuote(_) => Frame::BlockQuote(Vec::new()),
            Tag::CodeBlock(kind) => {
                let language = match kind {
                    CodeBlockKind::Fenced(info) => info_language(&info),
                    CodeBlockKind::Indented => None,
                };
                Frame::CodeBlock(language, String::new())
            }
            Tag::HtmlBlock => Frame::Html(String::new()),
            Tag::List(start) => Frame::List(List {
                start,
                items: Vec::new(),
            }),
            Tag::Item => Frame::Item {
                item: ListItem::default(),
                inlines: Vec::new(),
            },
            Tag::FootnoteDefinition(label) => Frame::Footnote {
                label: label.to_string(),
                children: Vec::new(),
            },
            Tag::Table(alignments) => Frame::Table(Table {
                alignments: alignments.into_iter().map(convert_alignment).collect(),
                ..Table::default()
            }),
            Tag::TableHead => Frame::Row {
                cells: Vec::new(),
                head: true,
            },
            Tag::TableRow => Frame::Row {
                cells: Vec::new(),
                head: false,
            },
            Tag::TableCell => Frame::Cell(Vec::new()),
            Tag::Emphasis => Frame::Style(StyleChange::Emphasis),
            Tag::Strong => Frame::Style(StyleChange::Strong),
            Tag::Strikethrough => Frame::Style(StyleChange::Strikethrough),
            Tag::Link { dest_url, .. } => Frame::Style(StyleChange::Link(dest_url.to_string())),
            Tag::Image { dest_url, .. } => Frame::Image {
                src: dest_url.to_string(),
                alt: String::new(),
            },
            _ => Frame::Skip,
        };
        self.frames.push(frame);
    }

    fn end(&mut self) {
        if self.frames.len() <= 1 {
            return;
        }
        let Some(frame) = self.frames.pop() else {
            return;
        };

        match frame {
            Frame::Root(_) | Frame::Style(_) | Frame::Skip => {}
            Frame::BlockQuote(children) => self.push_element(Element::BlockQuote { children }),
            Frame::Footnote {
                label,
                mut children,
            } => {
                let marker = Inline::Text(TextRun::styled(
                    format!("[{label}] "),
                    TextStyle {
                        bold: true,
                        ..Default::default()
                    },
                ));
                match children.first_mut() {
                    Some(Element::Paragraph { content }) => content.insert(0, marker),
                    _ => children.insert(
                        0,
                        Element::Paragraph {
                            content: vec![marker],
                        },
                    ),
                }
                self.footnotes.extend(children);
            }
            Frame::List(list) => self.push_element(Element::List(list)),
            Frame::Item { mut item, inlines } => {
                if !inlines.is_empty() {
                    item.children.push(Element::Paragraph { content: inlines });
                }
                if let Some(Frame::List(list)) = self.frames.last_mut() {
                    list.items.push(item);
                }
            }
            Frame::Paragraph(content) => {
                let element = match standalone_image(&content) {
                    Some((src, alt)) => Element::Image { src, alt },
                    None => Element::Paragraph { content },
                };
                self.push_element(element);
            }
            Frame::Heading(level, content) => {
                self.push_element(Element::Heading { level, content })
            }
            Frame::CodeBlock(language, mut code) => {
                if code.ends_with('\n') {
                    code.pop();
                }
                let element = match language {
                    Some(lang) if self.options.is_diagram_language(&lang) => Element::Diagram {
                        language: lang.to_ascii_lowercase(),
                        source: code,
                    },
                    language => Element::CodeBlock { language, code },
                };
                self.push_element(element);
            }
            Frame::Html(raw) => {
                if self.options.html_mode == HtmlMode::Literal {
                    let raw = raw.trim_end_matches('\n').to_string();
                    self.push_element(Element::Html { raw });
                }
            }
            Frame::Table(table) => self.push_element(Element::Table(table)),
            Frame::Row { cells, head } => {
                if let Some(Frame::Table(table)) = self.frames.last_mut() {
                    if head {
                        table.header = TableRow::new(cells);
                    } else {
                        table.add_row(TableRow::new(cells));
                    }
                }
            }
            Frame::Cell(content) => {
                if let Some(Frame::Row { cells, .. }) = self.frames.last_mut() {
                    cells.push(TableCell { content });
                }
            }
            Frame::Image { src, alt } => self.push_inline(Inline::Image { src, alt }),
        }
    }

    fn text(&mut self, text: &str) {
        match self.frames.last_mut() {
            Some(Frame::CodeBlock(_, code)) | Some(Frame::Html(code)) => code.push_str(text),
            _ => {
                let style = self.current_style();
                self.push_inline(Inline::Text(TextRun::styled(text, style)));
            }
        }
    }

    fn current_style(&self) -> TextStyle {
        let mut style = TextStyle::default();
        for frame in &self.frames {
            if let Frame::Style(change) = frame {
                match change {
                    StyleChange::Emphasis => style.italic = true,
                    StyleChange::Strong => style.bold = true,
                    StyleChange::Strikethrough => style.strikethrough = true,
                    StyleChange::Link(url) => style.link = Some(url.clone()),
                }
            }
        }
        style
    }

    fn push_inline(&mut self, inline: Inline) {
        for frame in self.frames.iter_mut().rev() {
            let target = match frame {
                Frame::Style(_) => continue,
                Frame::Image { alt, .. } => {
                    alt.push_str(inline.plain_text());
                    return;
                }
                Frame::Paragraph(content)
                | Frame::Heading(_, content)
                | Frame::Cell(content)
                | Frame::Item {
                    inlines: content, ..
                } => content,
                _ => return,
            };
            merge_inline(target, inline);
            return;
        }
    }

    fn push_element(&mut self, element: Element) {
        for frame in self.frames.iter_mut().rev() {
            match frame {
                Frame::Root(children)
                | Frame::BlockQuote(children)
                | Frame::Footnote { children, .. } => {
                    children.push(element);
                    return;
                }
                Frame::Item { item, inlines } => {
                    if !inlines.is_empty() {
                        item.children.push(Element::Paragraph {
                            content: std::mem::take(inlines),
                        });
                    }
                    item.children.push(element);
                    return;
                }
                _ => {}
            }
        }
    }

    fn finish(mut self) -> Vec<Element> {
        while self.frames.len() > 1 {
            self.end();
        }
        let mut elements = match self.frames.pop() {
            Some(Frame::Root(children)) => children,
            _ => Vec::new(),
        };
        if !self.footnotes.is_empty() {
            elements.push(Element::Rule);
            elements.append(&mut self.footnotes);
        }
        elements
    }
}

fn merge_inline(target: &mut Vec<Inline>, inline: Inline) {
    if let (Some(Inline::Text(last)), Inline::Text(run)) = (target.last_mut(), &inline) {
        if last.style == run.style {
            last.text.push_str(&run.text);
            return;
        }
    }
    target.push(inline);
}

fn standalone_image(content: &[Inline]) -> Option<(String, String)> {
    let mut found = None;
    for inline in content {
        match inline {
            Inline::Image { src, alt } if found.is_none() => {
                found = Some((src.clone(), alt.clone()));
            }
            Inline::Text(run) if run.text.trim().is_empty() => {}
            _ => return None,
        }
    }
    found
}

fn heading_level(level: HeadingLevel) -> u8 {
    match level {
        HeadingLevel::H1 => 1,
        HeadingLevel::H2 => 2,
        HeadingLevel::H3 => 3,
        HeadingLevel::H4 => 4,
        HeadingLevel::H5 => 5,
        HeadingLevel::H6 => 6,
    }
}

fn convert_alignment(alignment: pulldown_cmark::Alignment) -> Alignment {
    match alignment {
        pulldown_cmark::Alignment::None => Alignment::None,
        pulldown_cmark::Alignment::Left => Alignment::Left,
        pulldown_cmark::Alignment::Center => Alignment::Center,
        pulldown_cmark::Alignment::Right => Alignment::Right,
    }
}
