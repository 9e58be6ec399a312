//! Layered position planning.
//!
//! Nodes are split into three bands by role (hubs, links, satellites, top to bottom). Each band is
//! a grid with a per-role column cap; every row is centered on the same vertical center line, and
//! each band starts `band_gap` below the bottom of the previous non-empty band.

use crate::model::{BandLayout, Bounds, LayeredLayout, NodeBox};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use vaultgraph_core::{Model, Node, NodeKind};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BandOptions {
    pub columns: usize,
    pub node_width: f64,
    pub node_height: f64,
    pub column_gap: f64,
    pub row_gap: f64,
}

impl Default for BandOptions {
    fn default() -> Self {
        Self {
            columns: 5,
            node_width: 120.0,
            node_height: 60.0,
            column_gap: 60.0,
            row_gap: 50.0,
        }
    }
}

impl BandOptions {
    fn normalized(self) -> Self {
        Self {
            columns: self.columns.max(1),
            node_width: self.node_width.max(1.0),
            node_height: self.node_height.max(1.0),
            column_gap: self.column_gap.max(0.0),
            row_gap: self.row_gap.max(0.0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlannerOptions {
    pub hub: BandOptions,
    pub link: BandOptions,
    pub satellite: BandOptions,
    pub band_gap: f64,
    pub top_margin: f64,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            hub: BandOptions::default(),
            // Links render as 100x100 diamonds; their corners need more horizontal room.
            link: BandOptions {
                columns: 4,
                node_width: 100.0,
                node_height: 100.0,
                column_gap: 80.0,
                row_gap: 50.0,
            },
            satellite: BandOptions {
                columns: 6,
                ..BandOptions::default()
            },
            band_gap: 160.0,
            top_margin: 50.0,
        }
    }
}

impl PlannerOptions {
    /// Constants for the static diagram-interchange export.
    pub fn interchange() -> Self {
        Self {
            hub: BandOptions {
                columns: 5,
                node_width: 120.0,
                node_height: 60.0,
                column_gap: 80.0,
                row_gap: 90.0,
            },
            link: BandOptions {
                columns: 4,
                node_width: 100.0,
                node_height: 100.0,
                column_gap: 100.0,
                row_gap: 60.0,
            },
            satellite: BandOptions {
                columns: 6,
                node_width: 120.0,
                node_height: 60.0,
                column_gap: 40.0,
                row_gap: 60.0,
            },
            band_gap: 160.0,
            top_margin: 100.0,
        }
    }

    pub fn band(&self, kind: NodeKind) -> &BandOptions {
        match kind {
            NodeKind::Hub => &self.hub,
            NodeKind::Link => &self.link,
            NodeKind::Satellite => &self.satellite,
        }
    }

    /// Clamps every constant into a range that keeps boxes from overlapping.
    pub fn normalized(&self) -> Self {
        let hub = self.hub.normalized();
        let link = self.link.normalized();
        let satellite = self.satellite.normalized();
        let tallest = hub
            .node_height
            .max(link.node_height)
            .max(satellite.node_height);
        Self {
            hub,
            link,
            satellite,
            band_gap: self.band_gap.max(tallest * 2.0),
            top_margin: self.top_margin.max(0.0),
        }
    }
}

/// Assigns every node of `model` a center-anchored box.
///
/// The result depends only on the arguments; calling it twice with the same input yields the
/// same layout. A non-positive or non-finite `viewport_width` puts the center line at `x = 0`.
pub fn plan_layers(model: &Model, viewport_width: f64, options: &PlannerOptions) -> LayeredLayout {
    let opts = options.normalized();
    let center_x = if viewport_width.is_finite() && viewport_width > 0.0 {
        viewport_width / 2.0
    } else {
        0.0
    };

    let mut positions: IndexMap<String, NodeBox> = IndexMap::new();
    let mut bands: Vec<BandLayout> = Vec::new();
    let mut y = opts.top_margin;

    for kind in NodeKind::ALL {
        let members: Vec<&Node> = model.nodes_of(kind).collect();
        if members.is_empty() {
            continue;
        }
        if !bands.is_empty() {
            y += opts.band_gap;
        }

        let band = opts.band(kind);
        let top = y;
        let pitch_x = band.node_width + band.column_gap;
        let pitch_y = band.node_height + band.row_gap;

        let mut rows = 0usize;
        for (row, chunk) in members.chunks(band.columns).enumerate() {
            rows += 1;
            let cy = top + band.node_height / 2.0 + row as f64 * pitch_y;
            let half_span = (chunk.len() as f64 - 1.0) / 2.0;
            for (col, node) in chunk.iter().enumerate() {
                let cx = center_x + (col as f64 - half_span) * pitch_x;
                positions.insert(
                    node.id.clone(),
                    NodeBox {
                        kind,
                        x: cx,
                        y: cy,
                        width: band.node_width,
                        height: band.node_height,
                    },
                );
            }
        }

        let bottom = top + rows as f64 * band.node_height + (rows - 1) as f64 * band.row_gap;
        tracing::trace!(kind = %kind, rows, top, bottom, "planned band");
        bands.push(BandLayout {
            kind,
            top,
            bottom,
            rows,
            count: members.len(),
        });
        y = bottom;
    }

    let bounds = Bounds::of_boxes(positions.values());
    LayeredLayout {
        positions,
        bands,
        bounds,
    }
}
