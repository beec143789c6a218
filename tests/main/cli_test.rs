//! CLI smoke tests via `assert_cmd`.

use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let mut cmd = Command::cargo_bin("leadscout").expect("binary should exist");
    let assert = cmd.arg("--help").assert().success();

    let output = assert.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("start"));
    assert!(stdout.contains("usage-report"));
    assert!(stdout.contains("--config"));
}

#[test]
fn version_flag_succeeds() {
    let mut cmd = Command::cargo_bin("leadscout").expect("binary should exist");
    cmd.arg("--version").assert().success();
}

#[test]
fn start_without_credentials_fails() {
    let mut cmd = Command::cargo_bin("leadscout").expect("binary should exist");
    // Point at an empty config dir and clear inherited credentials so the
    // startup validation has nothing to find.
    let dir = tempfile::tempdir().expect("temp dir");
    cmd.current_dir(dir.path())
        .env("LEADSCOUT_CONFIG_PATH", dir.path().join("config.toml"))
        .env_remove("LEADSCOUT_BOT_TOKEN")
        .env_remove("LEADSCOUT_OPENAI_API_KEY")
        .env_remove("LEADSCOUT_BRAVE_API_KEY")
        .arg("start")
        .assert()
        .failure();
}
