use crate::*;
use serde_json::json;

#[test]
fn label_strips_role_prefix() {
    assert_eq!(Node::new("Hub_Customer", NodeKind::Hub).label(), "Customer");
    assert_eq!(
        Node::new("Link_Customer_Order", NodeKind::Link).label(),
        "Customer_Order"
    );
    assert_eq!(
        Node::new("Sat_Customer_Details", NodeKind::Satellite).label(),
        "Customer_Details"
    );
    assert_eq!(Node::new("Hub_", NodeKind::Hub).label(), "Hub_");
    assert_eq!(Node::new("Customer", NodeKind::Hub).label(), "Customer");
}

#[test]
fn stats_count_roles_and_edges() {
    let report = sanitize(&json!({
        "nodes": [
            {"id": "H1"}, {"id": "H2"},
            {"id": "L", "type": "link", "connects": ["H1", "H2"]},
            {"id": "S", "type": "satellite", "parent": "H1"}
        ]
    }));
    let stats = report.model.stats();
    assert_eq!(
        stats,
        ModelStats {
            hubs: 2,
            links: 1,
            satellites: 1,
            edges: 3
        }
    );
    assert_eq!(stats.to_string(), "hubs: 2, links: 1, satellites: 1, edges: 3");
}

#[test]
fn model_serializes_with_camel_case_fields() {
    let mut node = Node::new("Hub_Customer", NodeKind::Hub);
    node.business_key = Some("customer_id".to_string());
    node.source_table = Some("customer".to_string());
    let model = Model {
        nodes: vec![node],
        edges: vec![],
    };
    let value = serde_json::to_value(&model).unwrap();
    assert_eq!(
        value,
        json!({
            "nodes": [{
                "id": "Hub_Customer",
                "type": "hub",
                "businessKey": "customer_id",
                "sourceTable": "customer"
            }],
            "edges": []
        })
    );
}

#[test]
fn node_kind_parsing_is_lenient() {
    assert_eq!(NodeKind::parse_lenient("LINK"), NodeKind::Link);
    assert_eq!(NodeKind::parse_lenient("pit"), NodeKind::Hub);
    assert!("bridge".parse::<NodeKind>().is_err());
}
