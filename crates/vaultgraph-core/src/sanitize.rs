//! Validation of raw generation payloads into a [`Model`].
//!
//! The generation service returns loosely-shaped JSON. Sanitizing turns it into a model whose node
//! identities are unique and whose edges only reference known nodes. Nothing here fails: bad
//! records are dropped, logged, and reported through per-record verdicts so callers can assert on
//! what was discarded and why.
//!
//! Edge order is fixed: explicit edges in input order first, then implicit edges in node order.
//! A satellite contributes `parent -> satellite`; a link contributes `hub -> link` for every hub
//! it lists, in list order. Explicit and implicit edges share one dedup set keyed by the ordered
//! pair, so `A -> B` and `B -> A` are distinct edges.

use crate::model::{Edge, Model, Node, NodeKind};
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Disposition {
    Accepted,
    /// The node record has no usable identity.
    DroppedMissingId,
    /// A node with the same identity, or an edge with the same ordered pair, was seen earlier.
    DroppedDuplicate,
    /// At least one edge endpoint does not name an accepted node.
    DroppedDangling,
    /// The record is not an object, or an edge lacks an endpoint under both naming conventions.
    DroppedMalformed,
}

impl Disposition {
    pub fn is_accepted(self) -> bool {
        self == Disposition::Accepted
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EdgeOrigin {
    Explicit { index: usize },
    SatelliteParent { satellite: String },
    LinkConnection { link: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeVerdict {
    /// Position of the record in the raw `nodes` array.
    pub index: usize,
    pub id: Option<String>,
    pub disposition: Disposition,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EdgeVerdict {
    pub origin: EdgeOrigin,
    pub from: Option<String>,
    pub to: Option<String>,
    pub disposition: Disposition,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SanitizeStats {
    pub nodes_accepted: usize,
    pub nodes_missing_id: usize,
    pub nodes_duplicate: usize,
    pub nodes_malformed: usize,
    pub edges_accepted: usize,
    pub edges_implicit: usize,
    pub edges_duplicate: usize,
    pub edges_dangling: usize,
    pub edges_malformed: usize,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct SanitizeReport {
    pub model: Model,
    pub nodes: Vec<NodeVerdict>,
    pub edges: Vec<EdgeVerdict>,
}

impl SanitizeReport {
    pub fn stats(&self) -> SanitizeStats {
        let mut s = SanitizeStats::default();
        for v in &self.nodes {
            match v.disposition {
                Disposition::Accepted => s.nodes_accepted += 1,
                Disposition::DroppedMissingId => s.nodes_missing_id += 1,
                Disposition::DroppedDuplicate => s.nodes_duplicate += 1,
                Disposition::DroppedMalformed => s.nodes_malformed += 1,
                Disposition::DroppedDangling => {}
            }
        }
        for v in &self.edges {
            match v.disposition {
                Disposition::Accepted => {
                    s.edges_accepted += 1;
                    if !matches!(v.origin, EdgeOrigin::Explicit { .. }) {
                        s.edges_implicit += 1;
                    }
                }
                Disposition::DroppedDuplicate => s.edges_duplicate += 1,
                Disposition::DroppedDangling => s.edges_dangling += 1,
                Disposition::DroppedMalformed => s.edges_malformed += 1,
                Disposition::DroppedMissingId => {}
            }
        }
        s
    }

    pub fn into_model(self) -> Model {
        self.model
    }
}

/// Sanitizes a raw generation payload (`{"nodes": [...], "edges": [...]}`).
///
/// A payload that is not an object, or has no `nodes` array, produces an empty model.
pub fn sanitize(payload: &Value) -> SanitizeReport {
    let raw_nodes = payload
        .get("nodes")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    let raw_edges = payload
        .get("edges")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or_default();
    sanitize_parts(raw_nodes, raw_edges)
}

/// Sanitizes raw node and edge records. The inputs are never mutated.
pub fn sanitize_parts(raw_nodes: &[Value], raw_edges: &[Value]) -> SanitizeReport {
    let mut b = Builder::default();

    for (index, raw) in raw_nodes.iter().enumerate() {
        b.push_node(index, raw);
    }
    for (index, raw) in raw_edges.iter().enumerate() {
        b.push_explicit_edge(index, raw);
    }

    let implicit: Vec<(EdgeOrigin, String, String)> = b
        .report
        .model
        .nodes
        .iter()
        .flat_map(implicit_edges)
        .collect();
    for (origin, from, to) in implicit {
        b.push_edge(origin, Some(from), Some(to));
    }

    let report = b.report;
    let stats = report.stats();
    tracing::debug!(
        nodes = stats.nodes_accepted,
        edges = stats.edges_accepted,
        dropped_nodes = stats.nodes_missing_id + stats.nodes_duplicate + stats.nodes_malformed,
        dropped_edges = stats.edges_duplicate + stats.edges_dangling + stats.edges_malformed,
        "sanitized model"
    );
    report
}

/// Re-runs sanitization over an already typed model.
pub fn sanitize_model(model: &Model) -> SanitizeReport {
    let payload = serde_json::to_value(model).unwrap_or_default();
    sanitize(&payload)
}

fn implicit_edges(node: &Node) -> Vec<(EdgeOrigin, String, String)> {
    match node.kind {
        NodeKind::Satellite => node
            .parent
            .iter()
            .map(|parent| {
                (
                    EdgeOrigin::SatelliteParent {
                        satellite: node.id.clone(),
                    },
                    parent.clone(),
                    node.id.clone(),
                )
            })
            .collect(),
        NodeKind::Link => node
            .connects
            .iter()
            .map(|hub| {
                (
                    EdgeOrigin::LinkConnection {
                        link: node.id.clone(),
                    },
                    hub.clone(),
                    node.id.clone(),
                )
            })
            .collect(),
        NodeKind::Hub => Vec::new(),
    }
}

#[derive(Default)]
struct Builder {
    report: SanitizeReport,
    node_ids: HashSet<String>,
    edge_keys: HashSet<(String, String)>,
}

impl Builder {
    fn push_node(&mut self, index: usize, raw: &Value) {
        let Some(obj) = raw.as_object() else {
            tracing::warn!(index, "dropping node record that is not an object");
            self.node_verdict(index, None, Disposition::DroppedMalformed);
            return;
        };
        let Some(id) = obj.get("id").and_then(coerce_text) else {
            tracing::warn!(index, "dropping node without an identity");
            self.node_verdict(index, None, Disposition::DroppedMissingId);
            return;
        };
        if !self.node_ids.insert(id.clone()) {
            tracing::warn!(index, id = %id, "dropping duplicate node");
            self.node_verdict(index, Some(id), Disposition::DroppedDuplicate);
            return;
        }

        let node = node_from_object(id.clone(), obj);
        self.report.model.nodes.push(node);
        self.node_verdict(index, Some(id), Disposition::Accepted);
    }

    fn push_explicit_edge(&mut self, index: usize, raw: &Value) {
        let origin = EdgeOrigin::Explicit { index };
        let Some(obj) = raw.as_object() else {
            tracing::warn!(index, "dropping edge record that is not an object");
            self.edge_verdict(origin, None, None, Disposition::DroppedMalformed);
            return;
        };
        let from = endpoint(obj, "from", "source");
        let to = endpoint(obj, "to", "target");
        self.push_edge(origin, from, to);
    }

    fn push_edge(&mut self, origin: EdgeOrigin, from: Option<String>, to: Option<String>) {
        let (Some(from), Some(to)) = (from, to) else {
            tracing::warn!(?origin, "dropping edge with a missing endpoint");
            self.edge_verdict(origin, None, None, Disposition::DroppedMalformed);
            return;
        };
        if !self.node_ids.contains(&from) || !self.node_ids.contains(&to) {
            tracing::warn!(%from, %to, ?origin, "dropping edge with an unknown endpoint");
            self.edge_verdict(origin, Some(from), Some(to), Disposition::DroppedDangling);
            return;
        }
        if !self.edge_keys.insert((from.clone(), to.clone())) {
            tracing::debug!(%from, %to, ?origin, "collapsing duplicate edge");
            self.edge_verdict(origin, Some(from), Some(to), Disposition::DroppedDuplicate);
            return;
        }

        self.report.model.edges.push(Edge::new(from.clone(), to.clone()));
        self.edge_verdict(origin, Some(from), Some(to), Disposition::Accepted);
    }

    fn node_verdict(&mut self, index: usize, id: Option<String>, disposition: Disposition) {
        self.report.nodes.push(NodeVerdict {
            index,
            id,
            disposition,
        });
    }

    fn edge_verdict(
        &mut self,
        origin: EdgeOrigin,
        from: Option<String>,
        to: Option<String>,
        disposition: Disposition,
    ) {
        self.report.edges.push(EdgeVerdict {
            origin,
            from,
            to,
            disposition,
        });
    }
}

fn node_from_object(id: String, obj: &Map<String, Value>) -> Node {
    let kind = obj
        .get("type")
        .and_then(Value::as_str)
        .map(NodeKind::parse_lenient)
        .unwrap_or_default();
    Node {
        id,
        kind,
        business_key: obj.get("businessKey").and_then(coerce_text),
        attributes: text_list(obj.get("attributes")),
        connects: text_list(obj.get("connects")),
        parent: obj.get("parent").and_then(coerce_text),
        source_table: obj.get("sourceTable").and_then(coerce_text),
        rationale: obj.get("rationale").and_then(coerce_text),
    }
}

/// Identity coercion: trimmed strings, numbers and booleans as text; anything else is missing.
pub fn coerce_text(v: &Value) -> Option<String> {
    let s = match v {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        _ => return None,
    };
    if s.is_empty() { None } else { Some(s) }
}

fn text_list(v: Option<&Value>) -> Vec<String> {
    match v {
        Some(Value::Array(items)) => items.iter().filter_map(coerce_text).collect(),
        Some(other) => coerce_text(other).into_iter().collect(),
        None => Vec::new(),
    }
}

fn endpoint(obj: &Map<String, Value>, primary: &str, alias: &str) -> Option<String> {
    obj.get(primary)
        .and_then(coerce_text)
        .or_else(|| obj.get(alias).and_then(coerce_text))
}
