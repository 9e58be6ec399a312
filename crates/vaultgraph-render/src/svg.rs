//! Static SVG preview of a planned model.

use crate::drawio::role_style;
use crate::model::{LayeredLayout, NodeBox};
use crate::util::{escape_xml_into, fmt_display};
use std::fmt::Write as _;
use vaultgraph_core::Model;

#[derive(Debug, Clone)]
pub struct SvgRenderOptions {
    pub diagram_id: String,
    /// Space around the drawing, in model units.
    pub padding: f64,
    pub font_size: f64,
}

impl Default for SvgRenderOptions {
    fn default() -> Self {
        Self {
            diagram_id: "vaultgraph".to_string(),
            padding: 20.0,
            font_size: 12.0,
        }
    }
}

pub fn render_svg(model: &Model, layout: &LayeredLayout, options: &SvgRenderOptions) -> String {
    let pad = options.padding.max(0.0);
    let (min_x, min_y, w, h) = match layout.bounds {
        Some(b) => (
            b.min_x - pad,
            b.min_y - pad,
            b.width() + 2.0 * pad,
            b.height() + 2.0 * pad,
        ),
        None => (0.0, 0.0, 2.0 * pad, 2.0 * pad),
    };

    let mut id = String::new();
    escape_xml_into(&mut id, &options.diagram_id);

    let mut out = String::new();
    let _ = write!(
        out,
        r#"<svg id="{id}" xmlns="http://www.w3.org/2000/svg" viewBox="{} {} {} {}" width="{}" height="{}">"#,
        fmt_display(min_x),
        fmt_display(min_y),
        fmt_display(w),
        fmt_display(h),
        fmt_display(w),
        fmt_display(h),
    );
    let _ = write!(
        out,
        r##"<defs><marker id="{id}-arrow" viewBox="0 0 10 10" refX="10" refY="5" markerWidth="8" markerHeight="8" orient="auto-start-reverse"><path d="M 0 0 L 10 5 L 0 10 z" fill="#999"/></marker></defs>"##
    );

    out.push_str(r#"<g class="edges">"#);
    for edge in &model.edges {
        let (Some(a), Some(b)) = (layout.get(&edge.from), layout.get(&edge.to)) else {
            continue;
        };
        let (x2, y2) = boundary_point(b, a.x, a.y);
        let _ = write!(
            out,
            r##"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="#999" stroke-width="2" marker-end="url(#{id}-arrow)"/>"##,
            fmt_display(a.x),
            fmt_display(a.y),
            fmt_display(x2),
            fmt_display(y2),
        );
    }
    out.push_str("</g>");

    out.push_str(r#"<g class="nodes">"#);
    for node in &model.nodes {
        let Some(b) = layout.get(&node.id) else {
            continue;
        };
        let style = role_style(node.kind);
        let _ = write!(out, r#"<g class="node {}" data-id=""#, node.kind);
        escape_xml_into(&mut out, &node.id);
        out.push_str(r#"">"#);
        if style.diamond {
            let _ = write!(
                out,
                r#"<polygon points="{},{} {},{} {},{} {},{}" fill="{}" stroke="{}" stroke-width="3"/>"#,
                fmt_display(b.x),
                fmt_display(b.top()),
                fmt_display(b.right()),
                fmt_display(b.y),
                fmt_display(b.x),
                fmt_display(b.bottom()),
                fmt_display(b.left()),
                fmt_display(b.y),
                style.fill,
                style.stroke,
            );
        } else {
            let _ = write!(
                out,
                r#"<rect x="{}" y="{}" width="{}" height="{}" rx="8" ry="8" fill="{}" stroke="{}" stroke-width="3"/>"#,
                fmt_display(b.left()),
                fmt_display(b.top()),
                fmt_display(b.width),
                fmt_display(b.height),
                style.fill,
                style.stroke,
            );
        }
        let _ = write!(
            out,
            r#"<text x="{}" y="{}" text-anchor="middle" dominant-baseline="central" fill="white" font-size="{}" font-weight="600">"#,
            fmt_display(b.x),
            fmt_display(b.y),
            fmt_display(options.font_size),
        );
        escape_xml_into(&mut out, node.label());
        out.push_str("</text></g>");
    }
    out.push_str("</g></svg>");
    out
}

/// Point where the segment from `(fx, fy)` to the center of `target` enters its shape.
fn boundary_point(target: &NodeBox, fx: f64, fy: f64) -> (f64, f64) {
    let dx = fx - target.x;
    let dy = fy - target.y;
    if dx == 0.0 && dy == 0.0 {
        return (target.x, target.y);
    }
    let hw = target.width / 2.0;
    let hh = target.height / 2.0;
    let t = if role_style(target.kind).diamond {
        1.0 / (dx.abs() / hw + dy.abs() / hh)
    } else {
        1.0 / (dx.abs() / hw).max(dy.abs() / hh)
    };
    let t = t.min(1.0);
    (target.x + dx * t, target.y + dy * t)
}
