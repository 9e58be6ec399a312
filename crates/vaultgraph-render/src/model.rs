use serde::{Deserialize, Serialize};
use vaultgraph_core::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub max_x: f64,
    pub max_y: f64,
}

impl Bounds {
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Self> {
        let mut it = points.into_iter();
        let (x0, y0) = it.next()?;
        let mut b = Self {
            min_x: x0,
            min_y: y0,
            max_x: x0,
            max_y: y0,
        };
        for (x, y) in it {
            b.min_x = b.min_x.min(x);
            b.min_y = b.min_y.min(y);
            b.max_x = b.max_x.max(x);
            b.max_y = b.max_y.max(y);
        }
        Some(b)
    }

    pub fn of_boxes<'a>(boxes: impl IntoIterator<Item = &'a NodeBox>) -> Option<Self> {
        Self::from_points(
            boxes
                .into_iter()
                .flat_map(|b| [(b.left(), b.top()), (b.right(), b.bottom())]),
        )
    }

    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    pub fn center(&self) -> Point {
        Point::new(
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
        )
    }
}

/// A center-anchored node box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NodeBox {
    pub kind: NodeKind,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl NodeBox {
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn left(&self) -> f64 {
        self.x - self.width / 2.0
    }

    pub fn right(&self) -> f64 {
        self.x + self.width / 2.0
    }

    pub fn top(&self) -> f64 {
        self.y - self.height / 2.0
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height / 2.0
    }

    /// Strict intersection: boxes that only share an edge do not overlap.
    pub fn overlaps(&self, other: &NodeBox) -> bool {
        self.left() < other.right()
            && other.left() < self.right()
            && self.top() < other.bottom()
            && other.top() < self.bottom()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandLayout {
    pub kind: NodeKind,
    pub top: f64,
    pub bottom: f64,
    pub rows: usize,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayeredLayout {
    /// Node boxes keyed by node identity, in model order.
    pub positions: indexmap::IndexMap<String, NodeBox>,
    /// Non-empty bands, top to bottom.
    pub bands: Vec<BandLayout>,
    pub bounds: Option<Bounds>,
}

impl LayeredLayout {
    pub fn get(&self, id: &str) -> Option<&NodeBox> {
        self.positions.get(id)
    }

    pub fn band(&self, kind: NodeKind) -> Option<&BandLayout> {
        self.bands.iter().find(|b| b.kind == kind)
    }
}
