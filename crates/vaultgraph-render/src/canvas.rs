//! Rendering-surface contract and a headless implementation.
//!
//! A [`Canvas`] is whatever draws the graph: a browser graph library behind a bridge, a native
//! widget, or [`HeadlessCanvas`] for the CLI and tests. Positions are model coordinates; the
//! viewport maps them to screen space as `screen = model * zoom + pan`.

use crate::model::{Bounds, LayeredLayout, NodeBox, Point};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use vaultgraph_core::{Edge, Model, Node};

pub const MIN_ZOOM: f64 = 0.05;
pub const MAX_ZOOM: f64 = 20.0;

pub trait Canvas {
    /// Removes every element.
    fn clear(&mut self);
    fn add_node(&mut self, node: &Node, at: &NodeBox);
    fn add_edge(&mut self, edge: &Edge);
    /// Removes a node and its incident edges. Returns `false` if the node was not present.
    fn remove(&mut self, id: &str) -> bool;
    fn node_ids(&self) -> Vec<String>;
    fn position(&self, id: &str) -> Option<Point>;
    /// Moves a node. Returns `false` if the node was not present.
    fn set_position(&mut self, id: &str, at: Point) -> bool;
    /// Zooms and pans so every element is visible with `padding` screen pixels around it.
    fn fit(&mut self, padding: f64);
    fn zoom(&self) -> f64;
    fn set_zoom(&mut self, level: f64);
    /// Pans so the elements' bounding box is centered, keeping the zoom level.
    fn center(&mut self);
}

/// Replaces the canvas contents with `model` placed at `layout`.
///
/// Nodes without a planned position are skipped, and so are edges touching them.
pub fn mount(canvas: &mut dyn Canvas, model: &Model, layout: &LayeredLayout) {
    canvas.clear();
    for node in &model.nodes {
        match layout.get(&node.id) {
            Some(b) => canvas.add_node(node, b),
            None => tracing::warn!(id = %node.id, "node has no planned position"),
        }
    }
    for edge in &model.edges {
        if layout.get(&edge.from).is_some() && layout.get(&edge.to).is_some() {
            canvas.add_edge(edge);
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1200.0,
            height: 800.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasNode {
    pub label: String,
    pub rect: NodeBox,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HeadlessCanvas {
    pub viewport: Viewport,
    nodes: IndexMap<String, CanvasNode>,
    edges: Vec<Edge>,
    zoom: f64,
    pan: Point,
}

impl Default for HeadlessCanvas {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

impl HeadlessCanvas {
    pub fn new(viewport: Viewport) -> Self {
        Self {
            viewport,
            nodes: IndexMap::new(),
            edges: Vec::new(),
            zoom: 1.0,
            pan: Point::default(),
        }
    }

    pub fn pan(&self) -> Point {
        self.pan
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node(&self, id: &str) -> Option<&CanvasNode> {
        self.nodes.get(id)
    }

    pub fn bounds(&self) -> Option<Bounds> {
        Bounds::of_boxes(self.nodes.values().map(|n| &n.rect))
    }

    /// Maps a model coordinate to screen space.
    pub fn to_screen(&self, p: Point) -> Point {
        Point::new(p.x * self.zoom + self.pan.x, p.y * self.zoom + self.pan.y)
    }

    fn center_on(&mut self, target: Point) {
        self.pan = Point::new(
            self.viewport.width / 2.0 - target.x * self.zoom,
            self.viewport.height / 2.0 - target.y * self.zoom,
        );
    }
}

impl Canvas for HeadlessCanvas {
    fn clear(&mut self) {
        self.nodes.clear();
        self.edges.clear();
    }

    fn add_node(&mut self, node: &Node, at: &NodeBox) {
        self.nodes.insert(
            node.id.clone(),
            CanvasNode {
                label: node.label().to_string(),
                rect: *at,
            },
        );
    }

    fn add_edge(&mut self, edge: &Edge) {
        self.edges.push(edge.clone());
    }

    fn remove(&mut self, id: &str) -> bool {
        if self.nodes.shift_remove(id).is_none() {
            return false;
        }
        self.edges.retain(|e| e.from != id && e.to != id);
        true
    }

    fn node_ids(&self) -> Vec<String> {
        self.nodes.keys().cloned().collect()
    }

    fn position(&self, id: &str) -> Option<Point> {
        self.nodes.get(id).map(|n| n.rect.center())
    }

    fn set_position(&mut self, id: &str, at: Point) -> bool {
        let Some(n) = self.nodes.get_mut(id) else {
            return false;
        };
        n.rect.x = at.x;
        n.rect.y = at.y;
        true
    }

    fn fit(&mut self, padding: f64) {
        let Some(b) = self.bounds() else {
            return;
        };
        let padding = padding.max(0.0);
        let avail_w = (self.viewport.width - 2.0 * padding).max(1.0);
        let avail_h = (self.viewport.height - 2.0 * padding).max(1.0);
        let zx = avail_w / b.width().max(1.0);
        let zy = avail_h / b.height().max(1.0);
        self.zoom = zx.min(zy).clamp(MIN_ZOOM, MAX_ZOOM);
        self.center_on(b.center());
    }

    fn zoom(&self) -> f64 {
        self.zoom
    }

    fn set_zoom(&mut self, level: f64) {
        if level.is_finite() {
            self.zoom = level.clamp(MIN_ZOOM, MAX_ZOOM);
        }
    }

    fn center(&mut self) {
        if let Some(b) = self.bounds() {
            self.center_on(b.center());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{PlannerOptions, plan_layers};
    use vaultgraph_core::sanitize;

    fn mounted() -> (HeadlessCanvas, Model) {
        let model = sanitize(&serde_json::json!({
            "nodes": [
                {"id": "Hub_A"},
                {"id": "Hub_B"},
                {"id": "Link_AB", "type": "link", "connects": ["Hub_A", "Hub_B"]},
                {"id": "Sat_A", "type": "satellite", "parent": "Hub_A"}
            ]
        }))
        .into_model();
        let layout = plan_layers(&model, 1200.0, &PlannerOptions::default());
        let mut canvas = HeadlessCanvas::default();
        mount(&mut canvas, &model, &layout);
        (canvas, model)
    }

    #[test]
    fn mount_adds_every_element() {
        let (canvas, model) = mounted();
        assert_eq!(canvas.node_ids().len(), model.nodes.len());
        assert_eq!(canvas.edges().len(), model.edges.len());
        assert_eq!(canvas.node("Hub_A").unwrap().label, "A");
    }

    #[test]
    fn remove_drops_incident_edges() {
        let (mut canvas, _) = mounted();
        assert!(canvas.remove("Hub_A"));
        assert!(!canvas.remove("Hub_A"));
        assert!(canvas.edges().iter().all(|e| e.from != "Hub_A"));
        assert_eq!(canvas.edges().len(), 1);
    }

    #[test]
    fn fit_brings_bounds_into_viewport() {
        let (mut canvas, _) = mounted();
        canvas.fit(50.0);
        let b = canvas.bounds().unwrap();
        let tl = canvas.to_screen(Point::new(b.min_x, b.min_y));
        let br = canvas.to_screen(Point::new(b.max_x, b.max_y));
        assert!(tl.x >= 49.999 && tl.y >= 49.999);
        assert!(br.x <= canvas.viewport.width - 49.999);
        assert!(br.y <= canvas.viewport.height - 49.999);
    }

    #[test]
    fn zoom_is_clamped() {
        let mut canvas = HeadlessCanvas::default();
        canvas.set_zoom(1000.0);
        assert_eq!(canvas.zoom(), MAX_ZOOM);
        canvas.set_zoom(0.0);
        assert_eq!(canvas.zoom(), MIN_ZOOM);
        canvas.set_zoom(f64::NAN);
        assert_eq!(canvas.zoom(), MIN_ZOOM);
    }

    #[test]
    fn set_position_moves_known_nodes_only() {
        let (mut canvas, _) = mounted();
        assert!(canvas.set_position("Sat_A", Point::new(1.0, 2.0)));
        assert_eq!(canvas.position("Sat_A"), Some(Point::new(1.0, 2.0)));
        assert!(!canvas.set_position("Nope", Point::new(0.0, 0.0)));
    }

    #[test]
    fn center_keeps_zoom() {
        let (mut canvas, _) = mounted();
        canvas.set_zoom(2.0);
        canvas.center();
        assert_eq!(canvas.zoom(), 2.0);
        let c = canvas.bounds().unwrap().center();
        let s = canvas.to_screen(c);
        assert!((s.x - 600.0).abs() < 1e-9 && (s.y - 400.0).abs() < 1e-9);
    }
}
