use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "guild-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_guild-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("warrior-selection"));
}

#[test]
fn cli_simulated_run_writes_a_json_report() {
    let exe = env!("CARGO_BIN_EXE_guild-tester");
    let output_path = temp_path("simulated");
    let output = Command::new(exe)
        .args([
            "--mode",
            "simulated",
            "--scenarios",
            "rewards,custom-actions",
            "--report",
            "json",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );

    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let results = report.as_array().expect("array of results");
    assert_eq!(results.len(), 2);
    assert_eq!(results[0]["scenario_key"], "rewards");
    assert!(results.iter().all(|r| r["outcome"] == "passed"));
}

#[test]
fn cli_failing_simulated_run_exits_nonzero() {
    let exe = env!("CARGO_BIN_EXE_guild-tester");
    let output_path = temp_path("failing");
    let output = Command::new(exe)
        .args([
            "--scenarios",
            "action-buttons",
            "--latency-ms",
            "5000",
            "--timeout-ms",
            "1000",
            "--report",
            "markdown",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    assert!(content.contains("| Action Buttons | simulated | FAIL |"));
}

#[test]
fn cli_fails_when_no_known_browser_is_requested() {
    let exe = env!("CARGO_BIN_EXE_guild-tester");
    let output_path = temp_path("browser");
    let output = Command::new(exe)
        .args([
            "--mode",
            "browser",
            "--browsers",
            "unknown",
            "--report",
            "json",
            "--scenarios",
            "landing",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown browser"));
    assert!(stderr.contains("no known browser"));
    assert!(!output_path.exists());
}

#[test]
fn cli_fails_when_no_known_scenario_is_requested() {
    let exe = env!("CARGO_BIN_EXE_guild-tester");
    let output_path = temp_path("typo");
    let output = Command::new(exe)
        .args(["--scenarios", "rewardz", "--report", "json", "--output"])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown scenario"));
    assert!(stderr.contains("no known scenario"));
    assert!(!output_path.exists());
}
