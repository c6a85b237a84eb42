//! SVG serialization of display lists.

use super::text::family_names;
use crate::model::{Color, DrawOp, Fragment, Stroke};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use std::fmt::Write;

/// Escape text for use in XML character data and attribute values.
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Control characters are not allowed in XML 1.0
            c if c.is_control() && c != '\t' && c != '\n' => {}
            c => out.push(c),
        }
    }
    out
}

/// Format a coordinate with at most three decimals.
pub fn num(value: f32) -> String {
    let rounded = (value * 1000.0).round() / 1000.0;
    if rounded == 0.0 {
        "0".to_string()
    } else {
        format!("{rounded}")
    }
}

fn paint(attr: &str, color: Color) -> String {
    if color.is_opaque() {
        format!(r#" {attr}="{}""#, color.to_hex())
    } else {
        format!(
            r#" {attr}="{}" {attr}-opacity="{}""#,
            color.to_hex(),
            num(color.opacity())
        )
    }
}

fn stroke_attrs(stroke: Option<&Stroke>) -> String {
    match stroke {
        Some(s) => format!(
            r#"{} stroke-width="{}""#,
            paint("stroke", s.color),
            num(s.width)
        ),
        None => String::new(),
    }
}

/// Append SVG elements for every operation of `fragment` to `out`.
pub fn write_fragment(out: &mut String, fragment: &Fragment) {
    for op in &fragment.ops {
        write_op(out, op);
    }
}

fn write_op(out: &mut String, op: &DrawOp) {
    // Writing into a String cannot fail
    let _ = match op {
        DrawOp::Rect { rect, fill, stroke } => {
            let fill = match fill {
                Some(c) => paint("fill", *c),
                None => r#" fill="none""#.to_string(),
            };
            writeln!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}"{}{}/>"#,
                num(rect.x),
                num(rect.y),
                num(rect.width.max(0.0)),
                num(rect.height.max(0.0)),
                fill,
                stroke_attrs(stroke.as_ref())
            )
        }
        DrawOp::Line { from, to, stroke } => writeln!(
            out,
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}"{}/>"#,
            num(from.0),
            num(from.1),
            num(to.0),
            num(to.1),
            stroke_attrs(Some(stroke))
        ),
        DrawOp::Circle {
            center,
            radius,
            fill,
        } => writeln!(
            out,
            r#"<circle cx="{}" cy="{}" r="{}"{}/>"#,
            num(center.0),
            num(center.1),
            num(*radius),
            paint("fill", *fill)
        ),
        DrawOp::Polygon { points, fill } => {
            let points = points
                .iter()
                .map(|(x, y)| format!("{},{}", num(*x), num(*y)))
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(
                out,
                r#"<polygon points="{}"{}/>"#,
                points,
                paint("fill", *fill)
            )
        }
        DrawOp::Text {
            x,
            baseline,
            text,
            font,
            color,
            underline,
            strikethrough,
        } => {
            let mut decoration = Vec::new();
            if *underline {
                decoration.push("underline");
            }
            if *strikethrough {
                decoration.push("line-through");
            }
            let decoration = if decoration.is_empty() {
                String::new()
            } else {
                format!(r#" text-decoration="{}""#, decoration.join(" "))
            };
            writeln!(
                out,
                r#"<text x="{}" y="{}" font-family="{}" font-size="{}" font-weight="{}" font-style="{}"{}{} xml:space="preserve">{}</text>"#,
                num(*x),
                num(*baseline),
                family_names(font.family).join(", "),
                num(font.size),
                if font.bold { "bold" } else { "normal" },
                if font.italic { "italic" } else { "normal" },
                paint("fill", *color),
                decoration,
                escape_xml(text)
            )
        }
        DrawOp::Embed { rect, payload } => writeln!(
            out,
            r#"<image x="{}" y="{}" width="{}" height="{}" preserveAspectRatio="xMidYMid meet" xlink:href="data:{};base64,{}"/>"#,
            num(rect.x),
            num(rect.y),
            num(rect.width),
            num(rect.height),
            payload.mime,
            STANDARD.encode(payload.data.as_slice())
        ),
    };
}

/// Open an SVG document of the given size.
pub fn open_document(out: &mut String, width: f32, height: f32) {
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">"#,
        w = num(width),
        h = num(height)
    );
}

/// Close an SVG document.
pub fn close_document(out: &mut String) {
    out.push_str("</svg>\n");
}

/// Serialize a fragment as a standalone SVG document.
pub fn fragment_to_svg(fragment: &Fragment, width: f32, height: f32) -> String {
    let mut out = String::new();
    open_document(&mut out, width, height);
    write_fragment(&mut out, fragment);
    close_document(&mut out);
    out
}
