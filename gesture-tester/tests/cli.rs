use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "gesture-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_list_scenarios_writes_output() {
    let exe = env!("CARGO_BIN_EXE_gesture-tester");
    let output_path = temp_path("list");
    let status = Command::new(exe)
        .args(["--list-scenarios", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    assert!(content.contains("Available scenarios"));
    assert!(content.contains("smoke"));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_runs_smoke_with_json_report() {
    let exe = env!("CARGO_BIN_EXE_gesture-tester");
    let output_path = temp_path("run");
    let output = Command::new(exe)
        .args([
            "--report",
            "json",
            "--scenarios",
            "smoke,timeout",
            "--iterations",
            "1",
            "--seeds",
            "1,2",
            "--output",
        ])
        .arg(&output_path)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let content = std::fs::read_to_string(&output_path).expect("read output");
    let results: serde_json::Value = serde_json::from_str(&content).expect("json report");
    let results = results.as_array().expect("array");
    assert_eq!(results.len(), 4);
    assert!(results.iter().all(|r| r["passed"] == true));
    let _ = std::fs::remove_file(output_path);
}

#[test]
fn cli_persists_to_data_dir() {
    let exe = env!("CARGO_BIN_EXE_gesture-tester");
    let data_dir = temp_path("data");
    let output = Command::new(exe)
        .args(["--report", "markdown", "--iterations", "1", "--data-dir"])
        .arg(&data_dir)
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Gesture Quest Logic Test Results"));
    let seed_dir = data_dir.join("smoke").join("seed-1337-iter-0");
    assert!(seed_dir.join("PlayerStats.json").exists());
    assert!(seed_dir.join("RecentSessions.json").exists());
    let _ = std::fs::remove_dir_all(data_dir);
}

#[test]
fn cli_rejects_unknown_scenario() {
    let exe = env!("CARGO_BIN_EXE_gesture-tester");
    let output = Command::new(exe)
        .args(["--scenarios", "nope", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Unknown scenario"));
}

#[test]
fn cli_rejects_invalid_config() {
    let exe = env!("CARGO_BIN_EXE_gesture-tester");
    let config_path = temp_path("config.json");
    std::fs::write(&config_path, r#"{"tick_interval": 0.0}"#).expect("write config");
    let output = Command::new(exe)
        .args(["--iterations", "1", "--config"])
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let _ = std::fs::remove_file(config_path);
}
