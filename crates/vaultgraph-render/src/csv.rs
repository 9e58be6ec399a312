//! Flat tabular export: one row per node.

use vaultgraph_core::{Model, Node};

pub const HEADER: [&str; 8] = [
    "Entity",
    "Type",
    "Parent",
    "BusinessKey",
    "Connects",
    "Attributes",
    "SourceTable",
    "Rationale",
];

/// Delimiter used inside list-valued cells.
pub const LIST_DELIMITER: &str = "; ";

pub fn to_csv(model: &Model) -> String {
    let mut out = String::new();
    push_row(&mut out, HEADER.iter().copied());
    for node in &model.nodes {
        let cells = row(node);
        push_row(&mut out, cells.iter().map(String::as_str));
    }
    out
}

fn row(node: &Node) -> [String; 8] {
    [
        node.id.clone(),
        node.kind.as_str().to_string(),
        node.parent.clone().unwrap_or_default(),
        node.business_key.clone().unwrap_or_default(),
        node.connects.join(LIST_DELIMITER),
        node.attributes.join(LIST_DELIMITER),
        node.source_table.clone().unwrap_or_default(),
        node.rationale.clone().unwrap_or_default(),
    ]
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_cell(out, cell);
    }
    out.push('\n');
}

/// Quotes a cell only when it contains a delimiter, a quote or a line break; inner quotes are
/// doubled.
pub fn push_cell(out: &mut String, cell: &str) {
    if !cell.contains([',', '"', '\n', '\r']) {
        out.push_str(cell);
        return;
    }
    out.push('"');
    for ch in cell.chars() {
        if ch == '"' {
            out.push('"');
        }
        out.push(ch);
    }
    out.push('"');
}

#[cfg(test)]
mod tests {
    use super::*;
    use vaultgraph_core::NodeKind;

    fn cell(s: &str) -> String {
        let mut out = String::new();
        push_cell(&mut out, s);
        out
    }

    #[test]
    fn cells_are_quoted_only_when_needed() {
        assert_eq!(cell("Hub_Customer"), "Hub_Customer");
        assert_eq!(cell("a,b"), "\"a,b\"");
        assert_eq!(cell("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(cell("two\nlines"), "\"two\nlines\"");
        assert_eq!(cell(""), "");
    }

    #[test]
    fn attributes_are_joined_with_semicolons() {
        let mut node = Node::new("Sat_Customer", NodeKind::Satellite);
        node.parent = Some("Hub_Customer".to_string());
        node.attributes = vec!["Name".to_string(), "Email".to_string()];
        let csv = to_csv(&Model {
            nodes: vec![node],
            edges: vec![],
        });
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Entity,Type,Parent,BusinessKey,Connects,Attributes,SourceTable,Rationale")
        );
        assert_eq!(
            lines.next(),
            Some("Sat_Customer,satellite,Hub_Customer,,,Name; Email,,")
        );
        assert_eq!(lines.next(), None);
    }

    #[test]
    fn identities_with_commas_are_quoted() {
        let mut node = Node::new("Hub_\"Odd\",Name", NodeKind::Hub);
        node.rationale = Some("keys: id, code".to_string());
        let csv = to_csv(&Model {
            nodes: vec![node],
            edges: vec![],
        });
        assert!(csv.ends_with("\"Hub_\"\"Odd\"\",Name\",hub,,,,,,\"keys: id, code\"\n"));
    }
}
