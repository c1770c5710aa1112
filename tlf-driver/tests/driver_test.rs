// SPDX-License-Identifier: Apache-2.0

use std::process::{Command, Output};

use pretty_assertions::assert_eq;
use test_case::test_case;

fn run_driver(args: &[&str]) -> Output {
    let driver = env!("CARGO_BIN_EXE_tlf-driver");
    Command::new(driver)
        .args(args)
        .output()
        .expect("tlf-driver invocation should run")
}

fn stdout_of(output: &Output) -> String {
    assert!(
        output.status.success(),
        "tlf-driver failed: status={:?}\nstdout={}\nstderr={}",
        output.status,
        String::from_utf8_lossy(&output.stdout),
        String::from_utf8_lossy(&output.stderr),
    );
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test_case(&["identify", "e8", "--num-vars", "3"], "0xe8: threshold [1, 1, 1; 2]"; "majority hex")]
#[test_case(&["identify", "0111", "-n", "2", "--format", "binary"], "0x7: threshold [-1, -1; -1]"; "nand binary")]
#[test_case(&["identify", "6", "--num-vars", "2"], "0x6: not threshold (binate in variable 0)"; "xor")]
#[test_case(&["identify", "f888", "--num-vars", "4"], "0xf888: not threshold (no separating linear form)"; "two products")]
fn test_identify_text(args: &[&str], expected: &str) {
    let output = run_driver(args);
    assert_eq!(stdout_of(&output).trim(), expected);
}

#[test_case(&["--no-check", "identify", "e8", "-n", "3"]; "before subcommand")]
#[test_case(&["identify", "e8", "-n", "3", "--no-check"]; "after subcommand")]
fn test_no_check_is_global(args: &[&str]) {
    let output = run_driver(args);
    assert_eq!(stdout_of(&output).trim(), "0xe8: threshold [1, 1, 1; 2]");
}

#[test]
fn test_identify_json() {
    let output = run_driver(&["identify", "e", "--num-vars", "2", "--json"]);
    let value: serde_json::Value =
        serde_json::from_str(stdout_of(&output).trim()).expect("valid json");
    assert_eq!(value["is_threshold"], serde_json::json!(true));
    assert_eq!(
        value["linear_form"],
        serde_json::json!({"weights": [1, 1], "threshold": 1})
    );
}

#[test]
fn test_identify_malformed_table_exits_nonzero() {
    let output = run_driver(&["identify", "e8", "--num-vars", "2"]);
    assert_eq!(output.status.code(), Some(1));
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("identify"), "stderr: {}", stderr);
    assert!(stderr.contains("needs 1 digits, got 2"), "stderr: {}", stderr);
}

#[test]
fn test_batch_with_config_file() {
    let temp_dir = tempfile::tempdir().expect("create tempdir");
    let tables_path = temp_dir.path().join("tables.txt");
    std::fs::write(&tables_path, "# 3-input functions\ne8\n96\n\n80\n").expect("write tables");
    let config_path = temp_dir.path().join("tlf-driver.toml");
    std::fs::write(
        &config_path,
        "[oracle]\ntimeout_ms = 60000\n\n[oracle.simplex]\nmax_branch_nodes = 500\n",
    )
    .expect("write config");

    let output = run_driver(&[
        "--config",
        config_path.to_str().unwrap(),
        "batch",
        tables_path.to_str().unwrap(),
        "--num-vars",
        "3",
    ]);
    let stdout = stdout_of(&output);
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(
        lines,
        vec![
            "0xe8: threshold [1, 1, 1; 2]",
            "0x96: not threshold (binate in variable 0)",
            "0x80: threshold [1, 1, 1; 3]",
            "2 of 3 tables are threshold functions",
        ]
    );
}

#[test]
fn test_missing_config_file_exits_nonzero() {
    let output = run_driver(&[
        "--config",
        "/nonexistent/tlf-driver.toml",
        "identify",
        "e",
        "-n",
        "2",
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("config file does not exist"));
}

#[test]
fn test_enumerate_counts() {
    let output = run_driver(&["enumerate", "--num-vars", "2", "--json"]);
    let value: serde_json::Value =
        serde_json::from_str(stdout_of(&output).trim()).expect("valid json");
    assert_eq!(value["functions"], serde_json::json!(16));
    assert_eq!(value["threshold"], serde_json::json!(14));
}

#[test]
fn test_enumerate_rejects_large_counts() {
    let output = run_driver(&["enumerate", "--num-vars", "5"]);
    assert_eq!(output.status.code(), Some(1));
}
