use assert_cmd::Command;

fn fingertap() -> Command {
    Command::cargo_bin("fingertap").unwrap()
}

#[test]
fn score_prints_fields() {
    let output = fingertap()
        .args(["score", "--target", "12345", "1234512"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<&str> = stdout.lines().collect();
    assert_eq!(lines.len(), 3);
    assert!(lines[0].starts_with("speed: 1.4"));
    assert_eq!(lines[1], "errors: 0");
    assert_eq!(lines[2], "accuracy: 1");
}

#[test]
fn score_accepts_bracketed_stream() {
    let output = fingertap()
        .args(["score", "-t", "41324", "[4, 1, 3, 2, 4, 9, 9]"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert!(stdout.contains("speed: 1\n"));
    assert!(stdout.contains("errors: 1\n"));
}

#[test]
fn score_json_reports_nan_as_null() {
    let output = fingertap()
        .args(["score", "--target", "41324", "--json"])
        .output()
        .unwrap();
    assert!(output.status.success());
    let value: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(value["speed"], 0.0);
    assert_eq!(value["errors"], 0);
    assert!(value["accuracy"].is_null());

    // Zero speed is flagged on stderr, not treated as a failure
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("speed is zero"));
}

#[test]
fn score_rejects_empty_target() {
    fingertap()
        .args(["score", "--target", "", "12345"])
        .assert()
        .failure();
}

#[test]
fn score_rejects_malformed_target() {
    let output = fingertap()
        .args(["score", "--target", "41x24", "41324"])
        .output()
        .unwrap();
    assert!(!output.status.success());
    let stderr = String::from_utf8(output.stderr).unwrap();
    assert!(stderr.contains("invalid target"));
}
