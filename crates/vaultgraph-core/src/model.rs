use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Role of a node in a Data Vault 2.1 model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    #[default]
    Hub,
    Link,
    Satellite,
}

impl NodeKind {
    /// Band order used by layout and exports: hubs, then links, then satellites.
    pub const ALL: [NodeKind; 3] = [NodeKind::Hub, NodeKind::Link, NodeKind::Satellite];

    pub fn as_str(self) -> &'static str {
        match self {
            NodeKind::Hub => "hub",
            NodeKind::Link => "link",
            NodeKind::Satellite => "satellite",
        }
    }

    /// Lenient role parsing: case-insensitive, anything unrecognized is a hub.
    pub fn parse_lenient(raw: &str) -> Self {
        raw.parse().unwrap_or_default()
    }

    fn label_prefix(self) -> &'static str {
        match self {
            NodeKind::Hub => "Hub_",
            NodeKind::Link => "Link_",
            NodeKind::Satellite => "Sat_",
        }
    }
}

impl FromStr for NodeKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "hub" => Ok(Self::Hub),
            "link" => Ok(Self::Link),
            "satellite" => Ok(Self::Satellite),
            _ => Err(()),
        }
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: NodeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_key: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attributes: Vec<String>,
    /// Hub identities a link connects.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub connects: Vec<String>,
    /// Owning hub or link of a satellite.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_table: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rationale: Option<String>,
}

impl Node {
    pub fn new(id: impl Into<String>, kind: NodeKind) -> Self {
        Self {
            id: id.into(),
            kind,
            ..Default::default()
        }
    }

    /// Display label: the identity without its conventional role prefix.
    ///
    /// Any of `Hub_`, `Link_` or `Sat_` is stripped regardless of the node's own role, since
    /// generated models are not always consistent about naming. If stripping would leave an
    /// empty label the full identity is returned.
    pub fn label(&self) -> &str {
        for kind in NodeKind::ALL {
            if let Some(rest) = self.id.strip_prefix(kind.label_prefix()) {
                if !rest.is_empty() {
                    return rest;
                }
            }
        }
        &self.id
    }
}

/// Directed edge keyed by the ordered pair `(from, to)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Edge {
    pub from: String,
    pub to: String,
}

impl Edge {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.from, self.to)
    }
}

/// A validated Data Vault model.
///
/// Instances produced by [`crate::sanitize::sanitize`] uphold two invariants: node identities are
/// unique, and every edge endpoint names a node in `nodes`.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Model {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl Model {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn node(&self, id: &str) -> Option<&Node> {
        self.nodes.iter().find(|n| n.id == id)
    }

    pub fn nodes_of(&self, kind: NodeKind) -> impl Iterator<Item = &Node> {
        self.nodes.iter().filter(move |n| n.kind == kind)
    }

    pub fn stats(&self) -> ModelStats {
        let mut stats = ModelStats {
            edges: self.edges.len(),
            ..Default::default()
        };
        for n in &self.nodes {
            match n.kind {
                NodeKind::Hub => stats.hubs += 1,
                NodeKind::Link => stats.links += 1,
                NodeKind::Satellite => stats.satellites += 1,
            }
        }
        stats
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ModelStats {
    pub hubs: usize,
    pub links: usize,
    pub satellites: usize,
    pub edges: usize,
}

impl fmt::Display for ModelStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "hubs: {}, links: {}, satellites: {}, edges: {}",
            self.hubs, self.links, self.satellites, self.edges
        )
    }
}
