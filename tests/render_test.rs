//! Integration tests for Markdown rendering into visual blocks.

use mdpress::model::{BlockKind, DrawOp};
use mdpress::render::{RenderOptions, Renderer, DIAGRAM_FAILURE_LABEL};
use mdpress::{Error, ParseOptions, Result};
use std::fs;
use tempfile::tempdir;

fn has_text(block: &mdpress::VisualBlock, needle: &str) -> bool {
    block.fragment.ops.iter().any(|op| match op {
        DrawOp::Text { text, .. } => text.contains(needle),
        _ => false,
    })
}

fn embeds(block: &mdpress::VisualBlock) -> usize {
    block
        .fragment
        .ops
        .iter()
        .filter(|op| matches!(op, DrawOp::Embed { .. }))
        .count()
}

#[test]
fn test_render_file_resolves_relative_images() {
    let dir = tempdir().unwrap();
    image::RgbImage::new(64, 32)
        .save(dir.path().join("chart.png"))
        .unwrap();
    let md = dir.path().join("notes.md");
    fs::write(&md, "# Chart\n\n![chart](chart.png)\n").unwrap();

    let renderer = Renderer::new(RenderOptions::new().with_base_dir(dir.path()));
    let tree = renderer.render_file(&md).unwrap();

    assert_eq!(tree.len(), 2);
    let image = &tree.blocks()[1];
    assert_eq!(image.kind, BlockKind::Image);
    assert_eq!(embeds(image), 1);
}

#[test]
fn test_render_file_rejects_binary() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bad.md");
    fs::write(&path, [0x89, b'P', b'N', b'G', 0, 0, 0]).unwrap();

    let err = Renderer::default().render_file(&path).unwrap_err();
    assert!(matches!(err, Error::UnknownFormat));
}

#[test]
fn test_bom_is_ignored() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("bom.md");
    fs::write(&path, b"\xEF\xBB\xBF# Title\n").unwrap();

    let tree = Renderer::default().render_file(&path).unwrap();
    assert_eq!(tree.blocks()[0].kind, BlockKind::Heading);
    assert!(has_text(&tree.blocks()[0], "Title"));
}

#[test]
fn test_svg_diagram_embedded() {
    let md = "```svg\n<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"200\" height=\"100\"><rect width=\"200\" height=\"100\"/></svg>\n```";
    let tree = Renderer::default().render(md);
    let block = &tree.blocks()[0];
    assert_eq!(block.kind, BlockKind::Diagram);
    assert_eq!(embeds(block), 1);
}

#[test]
fn test_custom_diagram_renderer() {
    let options = RenderOptions::new().with_diagram_renderer("dot", |src: &str| -> Result<String> {
        Ok(format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"300\" height=\"{}\"></svg>",
            src.lines().count() * 50
        ))
    });
    let tree = Renderer::new(options).render("```dot\na -> b\nb -> c\n```");
    let block = &tree.blocks()[0];
    assert_eq!(block.kind, BlockKind::Diagram);
    assert!(!has_text(block, DIAGRAM_FAILURE_LABEL));
    assert!(block.height > 100.0);
}

#[test]
fn test_mermaid_without_renderer_shows_failure() {
    let tree = Renderer::default().render("```mermaid\ngraph TD; A-->B\n```\n\nafter");
    assert_eq!(tree.len(), 2);
    assert!(has_text(&tree.blocks()[0], DIAGRAM_FAILURE_LABEL));
    assert_eq!(tree.blocks()[1].kind, BlockKind::Paragraph);
}

#[test]
fn test_failing_renderer_does_not_abort() {
    let options = RenderOptions::new().with_diagram_renderer("mermaid", |_: &str| -> Result<String> {
        Err(Error::Diagram("parse error on line 1".into()))
    });
    let tree = Renderer::new(options).render("```mermaid\n???\n```");
    assert!(has_text(&tree.blocks()[0], DIAGRAM_FAILURE_LABEL));
    assert!(has_text(&tree.blocks()[0], "parse error"));
}

#[test]
fn test_gfm_elements() {
    let md = "\
- [x] done
- [ ] todo

| name | value |
|------|------:|
| a    | 1     |

~~old~~ new

<div>raw</div>
";
    let tree = Renderer::default().render(md);
    let kinds: Vec<BlockKind> = tree.blocks().iter().map(|b| b.kind).collect();
    assert_eq!(
        kinds,
        vec![
            BlockKind::List,
            BlockKind::Table,
            BlockKind::Paragraph,
            BlockKind::Html
        ]
    );
    assert!(has_text(&tree.blocks()[3], "<div>raw</div>"));
}

#[test]
fn test_strip_html_drops_raw_blocks() {
    let options = RenderOptions::new().with_parse_options(ParseOptions::new().strip_html());
    let tree = Renderer::new(options).render("before\n\n<div>raw</div>\n\nafter");
    assert_eq!(tree.len(), 2);
}

#[test]
fn test_layout_is_deterministic() {
    let md = "# A\n\nsome text that wraps around a few times when laid out narrowly\n\n> quote";
    let renderer = Renderer::new(RenderOptions::new().with_width(240.0));
    let a = renderer.render(md);
    let b = renderer.render(md);
    let heights = |t: &mdpress::RenderedTree| t.blocks().iter().map(|b| b.height).collect::<Vec<_>>();
    assert_eq!(heights(&a), heights(&b));
    assert_eq!(a.width(), 240.0);
}
