//! SVG export of a primitive scene.

use crate::id::PrimitiveId;
use crate::path_data::format_num;
use crate::scene::{PrimitiveKind, Scene};
use crate::transform::format_transform;
use kurbo::Affine;
use std::fmt::Write;

/// Render every visible primitive as a standalone SVG document.
///
/// The view box is the union of the visible bounding boxes, padded by one
/// unit so hairline strokes on the boundary stay visible.
pub fn render_svg(scene: &Scene) -> String {
    let bounds = scene
        .children(scene.root_id())
        .into_iter()
        .filter(|id| scene.is_visible(*id))
        .filter_map(|id| scene.bounding_box(id))
        .reduce(|a, b| a.union(b))
        .map(|r| r.inflate(1.0, 1.0));

    let mut out = String::new();
    match bounds {
        Some(r) => {
            let _ = writeln!(
                out,
                r#"<svg xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}">"#,
                format_num(r.x0),
                format_num(r.y0),
                format_num(r.width()),
                format_num(r.height())
            );
        }
        None => out.push_str("<svg xmlns=\"http://www.w3.org/2000/svg\">\n"),
    }
    for child in scene.children(scene.root_id()) {
        write_primitive(scene, child, 1, &mut out);
    }
    out.push_str("</svg>\n");
    out
}

fn write_primitive(scene: &Scene, id: PrimitiveId, depth: usize, out: &mut String) {
    let Some(primitive) = scene.get(id) else {
        return;
    };
    if !primitive.style.visible {
        return;
    }
    let indent = "  ".repeat(depth);

    let mut attrs = format!(r#" id="{}""#, primitive.id);
    if primitive.transform != Affine::IDENTITY {
        let _ = write!(
            attrs,
            r#" transform="{}""#,
            format_transform(primitive.transform)
        );
    }
    let style = &primitive.style;
    let _ = write!(
        attrs,
        r#" fill="{}""#,
        style.fill.as_deref().unwrap_or("none")
    );
    if let Some(stroke) = &style.stroke {
        let _ = write!(
            attrs,
            r#" stroke="{stroke}" stroke-width="{}""#,
            format_num(style.stroke_width)
        );
    }

    match &primitive.kind {
        PrimitiveKind::Root | PrimitiveKind::Group => {
            let _ = writeln!(out, "{indent}<g{attrs}>");
            for child in scene.children(id) {
                write_primitive(scene, child, depth + 1, out);
            }
            let _ = writeln!(out, "{indent}</g>");
        }
        PrimitiveKind::Path { d } => {
            let _ = writeln!(out, r#"{indent}<path{attrs} d="{d}"/>"#);
        }
        PrimitiveKind::Circle { center, r } => {
            let _ = writeln!(
                out,
                r#"{indent}<circle{attrs} cx="{}" cy="{}" r="{}"/>"#,
                format_num(center.x),
                format_num(center.y),
                format_num(*r)
            );
        }
        PrimitiveKind::Rect {
            origin,
            width,
            height,
            corner,
        } => {
            let _ = writeln!(
                out,
                r#"{indent}<rect{attrs} x="{}" y="{}" width="{}" height="{}" rx="{}"/>"#,
                format_num(origin.x),
                format_num(origin.y),
                format_num(*width),
                format_num(*height),
                format_num(*corner)
            );
        }
        PrimitiveKind::Line { from, to } => {
            let _ = writeln!(
                out,
                r#"{indent}<line{attrs} x1="{}" y1="{}" x2="{}" y2="{}"/>"#,
                format_num(from.x),
                format_num(from.y),
                format_num(to.x),
                format_num(to.y)
            );
        }
    }
}
