//! draw.io (`mxfile`) export.
//!
//! Geometry comes from [`plan_layers`] with [`PlannerOptions::interchange`] on a fixed page width,
//! so the export never depends on on-screen canvas state.

use crate::layout::{PlannerOptions, plan_layers};
use crate::util::{escape_xml_into, fmt_display};
use std::collections::HashMap;
use std::fmt::Write as _;
use vaultgraph_core::{Model, NodeKind};

pub const PAGE_WIDTH: f64 = 1169.0;
pub const PAGE_HEIGHT: f64 = 827.0;

/// Fill, stroke and shape per role, shared with the SVG preview.
pub(crate) struct RoleStyle {
    pub fill: &'static str,
    pub stroke: &'static str,
    pub diamond: bool,
}

pub(crate) fn role_style(kind: NodeKind) -> RoleStyle {
    match kind {
        NodeKind::Hub => RoleStyle {
            fill: "#4a90e2",
            stroke: "#2c5aa0",
            diamond: false,
        },
        NodeKind::Link => RoleStyle {
            fill: "#66bb6a",
            stroke: "#43a047",
            diamond: true,
        },
        NodeKind::Satellite => RoleStyle {
            fill: "#ffa726",
            stroke: "#f57c00",
            diamond: false,
        },
    }
}

fn vertex_style(kind: NodeKind) -> String {
    let s = role_style(kind);
    let shape = if s.diamond { "rhombus;" } else { "rounded=1;" };
    format!(
        "{shape}whiteSpace=wrap;html=1;fillColor={};strokeColor={};fontColor=#ffffff;fontStyle=1;",
        s.fill, s.stroke
    )
}

const EDGE_STYLE: &str =
    "edgeStyle=orthogonalEdgeStyle;rounded=0;orthogonalLoop=1;jettySize=auto;html=1;endArrow=block;";

pub fn to_drawio(model: &Model) -> String {
    let layout = plan_layers(model, PAGE_WIDTH, &PlannerOptions::interchange());

    let mut out = String::new();
    out.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    out.push_str("<mxfile host=\"app.diagrams.net\" agent=\"vaultgraph\" version=\"21.0.0\">\n");
    out.push_str("  <diagram name=\"Data Vault Model\" id=\"dv-model\">\n");
    let _ = writeln!(
        out,
        "    <mxGraphModel grid=\"1\" gridSize=\"10\" guides=\"1\" tooltips=\"1\" connect=\"1\" arrows=\"1\" fold=\"1\" page=\"1\" pageScale=\"1\" pageWidth=\"{}\" pageHeight=\"{}\">",
        fmt_display(PAGE_WIDTH),
        fmt_display(PAGE_HEIGHT)
    );
    out.push_str("      <root>\n");
    out.push_str("        <mxCell id=\"0\"/>\n");
    out.push_str("        <mxCell id=\"1\" parent=\"0\"/>\n");

    let mut next_id = 2usize;
    let mut cell_ids: HashMap<&str, usize> = HashMap::new();

    for node in &model.nodes {
        let Some(b) = layout.get(&node.id) else {
            continue;
        };
        cell_ids.insert(node.id.as_str(), next_id);

        out.push_str("        <mxCell id=\"");
        let _ = write!(out, "{next_id}");
        out.push_str("\" value=\"");
        escape_xml_into(&mut out, &node.id);
        out.push_str("\" style=\"");
        out.push_str(&vertex_style(node.kind));
        out.push_str("\" vertex=\"1\" parent=\"1\">\n");
        let _ = writeln!(
            out,
            "          <mxGeometry x=\"{}\" y=\"{}\" width=\"{}\" height=\"{}\" as=\"geometry\"/>",
            fmt_display(b.left()),
            fmt_display(b.top()),
            fmt_display(b.width),
            fmt_display(b.height)
        );
        out.push_str("        </mxCell>\n");
        next_id += 1;
    }

    for edge in &model.edges {
        let (Some(source), Some(target)) = (
            cell_ids.get(edge.from.as_str()),
            cell_ids.get(edge.to.as_str()),
        ) else {
            tracing::debug!(%edge, "skipping edge without both endpoints in export");
            continue;
        };
        let _ = writeln!(
            out,
            "        <mxCell id=\"{next_id}\" style=\"{EDGE_STYLE}\" edge=\"1\" parent=\"1\" source=\"{source}\" target=\"{target}\">"
        );
        out.push_str("          <mxGeometry relative=\"1\" as=\"geometry\"/>\n");
        out.push_str("        </mxCell>\n");
        next_id += 1;
    }

    out.push_str("      </root>\n");
    out.push_str("    </mxGraphModel>\n");
    out.push_str("  </diagram>\n");
    out.push_str("</mxfile>\n");
    out
}
