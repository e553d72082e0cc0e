//! CLI tests for the txscope binary
//!
//! Spawns `txscope explore` with commands piped on stdin and checks the JSON
//! lines it writes to stdout.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

fn bin_path() -> String {
    std::env::var("CARGO_BIN_EXE_txscope").unwrap_or_else(|_| {
        let mut path = std::env::current_exe().unwrap();
        path.pop();
        path.pop();
        path.push("txscope");
        path.to_str().unwrap().to_string()
    })
}

fn fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/transfers.json")
}

fn addr(c: char) -> String {
    format!("0x{}", c.to_string().repeat(40))
}

fn run_with_stdin(args: &[&str], stdin: &str) -> Output {
    let mut child = Command::new(bin_path())
        .args(args)
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to start txscope binary");
    // The process may exit before reading stdin
    let _ = child.stdin.take().unwrap().write_all(stdin.as_bytes());
    child.wait_with_output().unwrap()
}

fn json_lines(output: &Output) -> Vec<serde_json::Value> {
    String::from_utf8_lossy(&output.stdout)
        .lines()
        .map(|line| serde_json::from_str(line).unwrap_or_else(|e| panic!("{}: {}", e, line)))
        .collect()
}

fn explore_json(source_flag: &str, source: &Path, commands: &str) -> Vec<serde_json::Value> {
    let output = run_with_stdin(
        &["explore", source_flag, source.to_str().unwrap(), "--output", "json"],
        commands,
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    json_lines(&output)
}

#[test]
fn test_explore_seed_expand_select() {
    let commands = format!(
        "# session\nseed\nexpand {b}\nexpand {a}\nselect {a}\nshow\nquit\nseed\n",
        a = addr('a'),
        b = addr('b')
    );
    let lines = explore_json("--data", &fixture(), &commands);
    assert_eq!(lines.len(), 5);

    for line in &lines {
        assert_eq!(line["tool"], "txscope");
        assert_eq!(line["schema_version"], "1.0.0");
    }
    assert_eq!(lines[0]["execution_id"], lines[4]["execution_id"]);

    assert_eq!(lines[0]["data"]["outcome"], "merged");
    assert_eq!(lines[0]["data"]["mode"], "replace");

    assert_eq!(lines[1]["data"]["mode"], "expand");
    assert_eq!(lines[1]["data"]["added_nodes"], serde_json::json!([addr('d')]));

    assert_eq!(lines[2]["data"]["outcome"], "notice");
    assert_eq!(lines[2]["data"]["code"], "TXS-N-002");

    let detail = &lines[3]["data"];
    assert_eq!(detail["outcome"], "detail");
    assert_eq!(detail["kind_label"], "Abnormal Address");
    assert_eq!(detail["detail"]["num_sent"], 3);
    assert_eq!(detail["detail"]["num_received"], 2);

    let snapshot = &lines[4]["data"];
    assert_eq!(snapshot["node_count"], 4);
    assert_eq!(snapshot["edge_count"], 3);
    assert_eq!(snapshot["selected"], addr('a'));
}

#[test]
fn test_explore_reports_errors_and_continues() {
    let commands = format!("search 0xnothex\nexpand {}\nsearch {}\n", addr('a'), addr('e'));
    let lines = explore_json("--data", &fixture(), &commands);
    assert_eq!(lines.len(), 3);

    assert_eq!(lines[0]["data"]["code"], "TXS-ADR-001");
    assert_eq!(lines[0]["data"]["error"], "invalid_address");
    assert_eq!(lines[1]["data"]["code"], "TXS-ADR-002");
    assert_eq!(lines[2]["data"]["outcome"], "notice");
    assert_eq!(lines[2]["data"]["code"], "TXS-N-001");
}

#[test]
fn test_import_then_explore_database() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("transfers.db");

    let output = run_with_stdin(
        &[
            "import",
            "--data",
            fixture().to_str().unwrap(),
            "--db",
            db_path.to_str().unwrap(),
        ],
        "",
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    assert!(String::from_utf8_lossy(&output.stdout).contains("Imported 5 addresses and 3 transfers"));

    let lines = explore_json("--db", &db_path, "seed\nshow\n");
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[1]["data"]["node_count"], 3);
    assert_eq!(lines[1]["data"]["nodes"][0]["id"], addr('a'));
    assert_eq!(lines[1]["data"]["nodes"][0]["kind"], "abnormal");
}

#[test]
fn test_import_transactions_aggregates_pairs() {
    let temp_dir = TempDir::new().unwrap();
    let db_path = temp_dir.path().join("crawl.db");
    let log = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/transactions.json");

    let output = run_with_stdin(
        &[
            "import",
            "--transactions",
            log.to_str().unwrap(),
            "--db",
            db_path.to_str().unwrap(),
            "--output",
            "json",
        ],
        "",
    );
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));
    let response = &json_lines(&output)[0]["data"];
    assert_eq!(response["addresses"], 3);
    assert_eq!(response["transfers"], 2);
    assert_eq!(response["collected"]["transactions"], 6);
    assert_eq!(response["collected"]["skipped_duplicate"], 1);
    assert_eq!(response["collected"]["skipped_zero_value"], 1);
    assert_eq!(response["collected"]["skipped_contract_creation"], 1);

    let lines = explore_json("--db", &db_path, &format!("seed\nselect {}\n", addr('a')));
    assert_eq!(lines.len(), 2);
    let detail = &lines[1]["data"];
    assert_eq!(detail["kind_label"], "Abnormal Address");
    assert_eq!(detail["detail"]["num_sent"], 2);
    assert_eq!(detail["detail"]["total_sent"], 1.5);
    assert_eq!(detail["detail"]["num_received"], 1);
    assert_eq!(detail["detail"]["total_received"], 0.5);
}

#[test]
fn test_export_dot_to_file() {
    let temp_dir = TempDir::new().unwrap();
    let dot_path = temp_dir.path().join("session.dot");
    let commands = format!("seed\nselect {}\nexport dot {}\n", addr('a'), dot_path.display());

    let output = run_with_stdin(&["explore", "--data", fixture().to_str().unwrap()], &commands);
    assert!(output.status.success());

    let dot = std::fs::read_to_string(&dot_path).unwrap();
    assert!(dot.starts_with("digraph txscope {"));
    assert!(dot.contains(&format!("\"{}\" [fillcolor=\"red\"];", addr('a'))));
    assert!(dot.contains("[label=\"# TXs: 3, Amt: 1.5ETH\"]"));
}

#[test]
fn test_explore_rejects_missing_database() {
    let temp_dir = TempDir::new().unwrap();
    let output = run_with_stdin(
        &["explore", "--db", temp_dir.path().join("missing.db").to_str().unwrap()],
        "seed\n",
    );
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("Database not found"));
}

#[test]
fn test_unknown_command_prints_usage() {
    let output = run_with_stdin(&["frobnicate"], "");
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown command: frobnicate"));
    assert!(stderr.contains("Usage:"));
}
