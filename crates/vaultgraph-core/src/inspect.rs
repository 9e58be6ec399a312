use crate::model::Node;
use serde::Serialize;
use std::fmt;

/// Human-readable view of one node, as shown when the node is selected.
///
/// Only populated fields appear in `fields`; absent optional data is skipped rather than rendered
/// as blanks.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeDetails {
    pub id: String,
    pub label: String,
    pub fields: Vec<(&'static str, String)>,
}

impl NodeDetails {
    pub fn of(node: &Node) -> Self {
        let mut fields = vec![("Type", node.kind.as_str().to_string())];
        if let Some(key) = &node.business_key {
            fields.push(("Business Key", key.clone()));
        }
        if let Some(parent) = &node.parent {
            fields.push(("Parent", parent.clone()));
        }
        if !node.connects.is_empty() {
            fields.push(("Connects", node.connects.join(", ")));
        }
        if !node.attributes.is_empty() {
            fields.push(("Attributes", node.attributes.join(", ")));
        }
        if let Some(table) = &node.source_table {
            fields.push(("Source", table.clone()));
        }
        if let Some(rationale) = &node.rationale {
            fields.push(("Rationale", rationale.clone()));
        }
        Self {
            id: node.id.clone(),
            label: node.label().to_string(),
            fields,
        }
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| *k == name)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for NodeDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.label)?;
        writeln!(f)?;
        for (name, value) in &self.fields {
            writeln!(f, "{name}: {value}")?;
        }
        Ok(())
    }
}
