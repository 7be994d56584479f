use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "tradewars-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_tradewars-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("end-to-end"));
}

#[test]
fn cli_runs_catalog_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_tradewars-tester");
    let output_path = temp_path("json");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "smoke,deal-threshold,end-to-end",
            "--iterations",
            "2",
            "--seeds",
            "1,2",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Trade Wars Automated Tester"));

    let content = std::fs::read_to_string(output_path).expect("read output");
    let parsed: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let results = parsed.as_array().expect("result array");
    // 3 scenarios x 2 roles x 2 seeds
    assert_eq!(results.len(), 12);
    assert!(results.iter().all(|r| r["passed"] == true));
}

#[test]
fn cli_csv_report_lists_every_path() {
    let exe = env!("CARGO_BIN_EXE_tradewars-tester");
    let output_path = temp_path("csv");
    let status = Command::new(exe)
        .args([
            "--report",
            "csv",
            "--iterations",
            "1",
            "--output",
        ])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let all_paths = content
        .lines()
        .filter(|line| line.contains(",All Paths,"))
        .count();
    assert_eq!(all_paths, 2 * 324);
}

#[test]
fn cli_replay_prints_transcript() {
    let exe = env!("CARGO_BIN_EXE_tradewars-tester");
    let output_path = temp_path("replay");
    let status = Command::new(exe)
        .args(["--replay", "PR-HARVEST50", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Negotiations Failed"));
    assert!(content.contains("Replay: PR-HARVEST50"));
}

#[test]
fn cli_rejects_invalid_replay_code() {
    let exe = env!("CARGO_BIN_EXE_tradewars-tester");
    let output = Command::new(exe)
        .args(["--replay", "ZZ-BOGUS99"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid replay code"));
}

#[test]
fn cli_rejects_unknown_role() {
    let exe = env!("CARGO_BIN_EXE_tradewars-tester");
    let output = Command::new(exe)
        .args(["--roles", "king", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unrecognized role"));
}
