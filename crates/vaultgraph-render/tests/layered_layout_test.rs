use std::path::PathBuf;
use vaultgraph_core::{Model, Node, NodeKind, sanitize_str};
use vaultgraph_render::{PlannerOptions, plan_layers};

fn workspace_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

fn fixture_model(name: &str) -> Model {
    let path = workspace_root().join("fixtures").join(name);
    let text = std::fs::read_to_string(&path).expect("fixture");
    sanitize_str(&text).expect("valid json").into_model()
}

fn synthetic(hubs: usize, links: usize, satellites: usize) -> Model {
    // Interleave roles so band grouping cannot rely on input order.
    let mut nodes = Vec::new();
    for i in 0..hubs.max(links).max(satellites) {
        if i < satellites {
            nodes.push(Node::new(format!("Sat_{i}"), NodeKind::Satellite));
        }
        if i < hubs {
            nodes.push(Node::new(format!("Hub_{i}"), NodeKind::Hub));
        }
        if i < links {
            nodes.push(Node::new(format!("Link_{i}"), NodeKind::Link));
        }
    }
    Model {
        nodes,
        edges: Vec::new(),
    }
}

#[test]
fn same_role_boxes_never_overlap() {
    for (h, l, s) in [(1, 1, 1), (7, 3, 13), (12, 9, 25), (0, 5, 0), (40, 0, 1)] {
        let model = synthetic(h, l, s);
        for width in [320.0, 1200.0, 4000.0] {
            let layout = plan_layers(&model, width, &PlannerOptions::default());
            let boxes: Vec<_> = layout.positions.values().collect();
            for (i, a) in boxes.iter().enumerate() {
                for b in &boxes[i + 1..] {
                    if a.kind == b.kind {
                        assert!(!a.overlaps(b), "{a:?} overlaps {b:?} ({h},{l},{s})");
                    }
                }
            }
        }
    }
}

#[test]
fn bands_are_strictly_ordered_hub_link_satellite() {
    let model = synthetic(11, 6, 19);
    let layout = plan_layers(&model, 1000.0, &PlannerOptions::default());

    let extent = |kind: NodeKind| {
        let boxes: Vec<_> = layout
            .positions
            .values()
            .filter(|b| b.kind == kind)
            .collect();
        let top = boxes.iter().map(|b| b.top()).fold(f64::INFINITY, f64::min);
        let bottom = boxes
            .iter()
            .map(|b| b.bottom())
            .fold(f64::NEG_INFINITY, f64::max);
        (top, bottom)
    };

    let (_, hub_bottom) = extent(NodeKind::Hub);
    let (link_top, link_bottom) = extent(NodeKind::Link);
    let (sat_top, _) = extent(NodeKind::Satellite);
    assert!(link_top > hub_bottom);
    assert!(sat_top > link_bottom);

    let gap = PlannerOptions::default().band_gap;
    assert_eq!(link_top - hub_bottom, gap);
    assert_eq!(sat_top - link_bottom, gap);
}

#[test]
fn every_band_shares_one_center_line() {
    let model = synthetic(4, 3, 6);
    let layout = plan_layers(&model, 900.0, &PlannerOptions::default());
    for kind in NodeKind::ALL {
        let xs: Vec<f64> = layout
            .positions
            .values()
            .filter(|b| b.kind == kind)
            .map(|b| b.x)
            .collect();
        let mid = (xs.iter().copied().fold(f64::INFINITY, f64::min)
            + xs.iter().copied().fold(f64::NEG_INFINITY, f64::max))
            / 2.0;
        assert!((mid - 450.0).abs() < 1e-9, "{kind} band centered at {mid}");
    }
}

#[test]
fn planning_is_deterministic() {
    let model = fixture_model("customer_order.json");
    let opts = PlannerOptions::default();
    let a = plan_layers(&model, 1280.0, &opts);
    let b = plan_layers(&model, 1280.0, &opts);
    assert_eq!(a, b);
    assert_eq!(a.positions.len(), model.nodes.len());
    let keys: Vec<&str> = a.positions.keys().map(String::as_str).collect();
    let ids: Vec<&str> = model.nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(keys, ids);
}

#[test]
fn links_get_wider_spacing_than_hubs() {
    let model = synthetic(2, 2, 0);
    let layout = plan_layers(&model, 1000.0, &PlannerOptions::default());
    let dx = |a: &str, b: &str| (layout.get(a).unwrap().x - layout.get(b).unwrap().x).abs();
    let hub_gap = dx("Hub_0", "Hub_1") - 120.0;
    let link_gap = dx("Link_0", "Link_1") - 100.0;
    assert!(link_gap > hub_gap);
}
