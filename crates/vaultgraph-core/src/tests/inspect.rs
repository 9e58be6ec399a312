use crate::*;

#[test]
fn details_list_only_populated_fields() {
    let mut node = Node::new("Sat_Customer_Details", NodeKind::Satellite);
    node.parent = Some("Hub_Customer".to_string());
    node.attributes = vec!["first_name".to_string(), "email".to_string()];

    let details = NodeDetails::of(&node);
    assert_eq!(details.label, "Customer_Details");
    assert_eq!(details.field("Type"), Some("satellite"));
    assert_eq!(details.field("Parent"), Some("Hub_Customer"));
    assert_eq!(details.field("Attributes"), Some("first_name, email"));
    assert_eq!(details.field("Business Key"), None);
    assert_eq!(details.field("Rationale"), None);
}

#[test]
fn details_render_for_bare_node() {
    let details = NodeDetails::of(&Node::new("Hub_X", NodeKind::Hub));
    assert_eq!(details.to_string(), "X\n\nType: hub\n");
}

#[test]
fn details_include_connections_and_rationale() {
    let mut node = Node::new("Link_A_B", NodeKind::Link);
    node.connects = vec!["Hub_A".to_string(), "Hub_B".to_string()];
    node.rationale = Some("orders reference customers".to_string());
    let text = NodeDetails::of(&node).to_string();
    assert!(text.contains("Connects: Hub_A, Hub_B\n"));
    assert!(text.contains("Rationale: orders reference customers\n"));
}
