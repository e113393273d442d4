use assert_cmd::Command;

#[test]
fn history_flag_prints_and_exits_without_tty() {
    let home = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("typerush")
        .unwrap()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .arg("--history")
        .output()
        .unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8_lossy(&output.stdout).trim(), "no games yet");
}

#[test]
fn refuses_to_play_without_tty() {
    let home = tempfile::tempdir().unwrap();
    let output = Command::cargo_bin("typerush")
        .unwrap()
        .env("HOME", home.path())
        .env("XDG_CONFIG_HOME", home.path().join(".config"))
        .write_stdin("")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("stdin must be a tty"));
}
