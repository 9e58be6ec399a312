use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

fn repo_root() -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    manifest_dir
        .parent()
        .and_then(|p| p.parent())
        .expect("expected crates/<name> layout")
        .to_path_buf()
}

fn fixture(name: &str) -> String {
    let path = repo_root().join("fixtures").join(name);
    assert!(path.exists(), "fixture missing: {}", path.display());
    path.to_string_lossy().into_owned()
}

fn cli() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo_bin!("vaultgraph-cli"));
    cmd.env_remove("VAULTGRAPH_SERVER")
        .env_remove("VAULTGRAPH_TIMEOUT_SECS")
        .env_remove("VAULTGRAPH_VIEWPORT_WIDTH")
        .env_remove("RUST_LOG");
    cmd
}

fn stdout_json(cmd: &mut Command) -> Value {
    let output = cmd.output().expect("run cli");
    assert!(output.status.success(), "cli failed: {output:?}");
    serde_json::from_slice(&output.stdout).expect("stdout is JSON")
}

#[test]
fn sanitize_reports_drops() {
    let report = stdout_json(cli().args(["sanitize", "--report", fixture("messy.json").as_str()]));
    assert_eq!(report["model"]["nodes"].as_array().unwrap().len(), 5);
    assert_eq!(report["stats"]["edges_dangling"], 3);
    assert_eq!(report["stats"]["nodes_duplicate"], 1);
    assert_eq!(report["stats"]["nodes_missing_id"], 1);
}

#[test]
fn layout_prints_positions_in_model_order() {
    let layout = stdout_json(cli().args(["layout", fixture("customer_order.json").as_str()]));
    let positions = layout["positions"].as_object().unwrap();
    assert_eq!(positions.len(), 9);
    assert_eq!(positions.keys().next().map(String::as_str), Some("Hub_Customer"));
}

#[test]
fn export_writes_standard_file_name_into_directory() {
    let tmp = tempfile::tempdir().expect("tempdir");
    cli()
        .args([
            "export",
            "--format",
            "csv",
            "--out",
            tmp.path().to_string_lossy().as_ref(),
            fixture("messy.json").as_str(),
        ])
        .assert()
        .success();

    let csv = fs::read_to_string(tmp.path().join("data_vault_model.csv")).expect("read csv");
    let mut lines = csv.lines();
    assert_eq!(
        lines.next(),
        Some("Entity,Type,Parent,BusinessKey,Connects,Attributes,SourceTable,Rationale")
    );
    assert!(csv.contains("\"Sat_Customer, \"\"Main\"\"\""));
    assert!(csv.contains("Name; Email"));
}

#[test]
fn export_drawio_and_svg_to_stdout() {
    let output = cli()
        .args(["export", "--format", "drawio", fixture("customer_order.json").as_str()])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let xml = String::from_utf8(output.stdout).unwrap();
    assert!(xml.contains("<mxfile"));
    assert!(xml.contains("rhombus"));

    let output = cli()
        .args(["export", "--format", "svg", fixture("customer_order.json").as_str()])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    assert!(String::from_utf8(output.stdout).unwrap().starts_with("<svg"));
}

#[test]
fn inspect_prints_node_details() {
    let output = cli()
        .args([
            "inspect",
            "--node",
            "Hub_Customer",
            fixture("customer_order.json").as_str(),
        ])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let text = String::from_utf8(output.stdout).unwrap();
    assert!(text.starts_with("Customer\n"));
    assert!(text.contains("Business Key: customer_id"));

    cli()
        .args(["inspect", "--node", "Hub_Ghost", fixture("customer_order.json").as_str()])
        .assert()
        .code(1);
}

#[test]
fn stats_reads_stdin() {
    let payload = fs::read_to_string(fixture("customer_order.json")).unwrap();
    let output = cli()
        .args(["stats", "-"])
        .write_stdin(payload)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stats: Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(stats["stats"]["hubs"], 3);
    assert_eq!(stats["stats"]["edges"], 8);
}

#[test]
fn empty_model_exits_with_3() {
    for command in ["sanitize", "export", "stats"] {
        cli()
            .args([command, fixture("empty.json").as_str()])
            .assert()
            .code(3);
    }
}

#[test]
fn usage_errors_exit_with_2() {
    cli().args(["export", "--format", "xlsx"]).assert().code(2);
    cli().args(["inspect", fixture("customer_order.json").as_str()]).assert().code(2);
    cli().args(["upload", "-"]).assert().code(2);
}

#[test]
fn malformed_payload_is_a_runtime_error() {
    cli()
        .args(["stats", "-"])
        .write_stdin("{ not json")
        .assert()
        .code(1);
}
