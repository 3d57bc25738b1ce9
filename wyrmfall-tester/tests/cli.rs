use std::process::Command;

fn temp_path(label: &str) -> std::path::PathBuf {
    std::env::temp_dir().join(format!(
        "wyrmfall-cli-{label}-{}",
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos()
    ))
}

#[test]
fn cli_writes_json_report_to_file() {
    let exe = env!("CARGO_BIN_EXE_wyrmfall-tester");
    let output_path = temp_path("json");
    let status = Command::new(exe)
        .args(["--report", "json", "--seeds", "1,2", "--iterations", "2", "--output"])
        .arg(&output_path)
        .status()
        .expect("run cli");
    assert!(status.success());
    let content = std::fs::read_to_string(output_path).expect("read output");
    let report: serde_json::Value = serde_json::from_str(&content).expect("json report");
    assert_eq!(report["summary"]["runs"], 4);
    assert_eq!(report["summary"]["violations"], 0);
}

#[test]
fn cli_markdown_report_lists_runs() {
    let exe = env!("CARGO_BIN_EXE_wyrmfall-tester");
    let output = Command::new(exe)
        .args(["--report", "markdown", "--seeds", "7", "--iterations", "1"])
        .output()
        .expect("run cli");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("# Wyrmfall Encounter Simulation"));
    assert!(stdout.contains("| 7 |"));
}

#[test]
fn cli_rejects_bad_seed() {
    let exe = env!("CARGO_BIN_EXE_wyrmfall-tester");
    let output = Command::new(exe)
        .args(["--seeds", "dragon", "--report", "json"])
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("dragon"));
}

#[test]
fn cli_rejects_invalid_tuning_file() {
    let exe = env!("CARGO_BIN_EXE_wyrmfall-tester");
    let config_path = temp_path("config");
    std::fs::write(&config_path, r#"{ "tick_interval_ms": 0 }"#).expect("write config");
    let output = Command::new(exe)
        .args(["--report", "json", "--config"])
        .arg(&config_path)
        .output()
        .expect("run cli");
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("invalid tuning"));
}
