use std::path::PathBuf;

use assert_cmd::Command;

fn scribe_path() -> PathBuf {
    let profile = if cfg!(debug_assertions) { "debug" } else { "release" };
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push(format!("../../target/{profile}/scribe"));
    path
}

#[test]
fn execute_flag_runs_one_statement_and_exits() {
    let mut cmd = Command::new(scribe_path());
    cmd.arg("-e").arg(
        "CREATE TABLE users (id INTEGER, name TEXT, PRIMARY KEY (id));",
    );

    let assert = cmd.assert().success();
    let output = assert.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Table 'users' created"));
}

#[test]
fn script_file_runs_statements_in_order() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let script_path = temp_dir.path().join("setup.sql");
    std::fs::write(
        &script_path,
        "CREATE TABLE users (id INTEGER, name TEXT, PRIMARY KEY (id));\n\
         INSERT INTO users (id, name) VALUES (1, 'Alice');\n\
         SELECT * FROM users;\n",
    )
    .unwrap();

    let mut cmd = Command::new(scribe_path());
    cmd.arg(&script_path);

    let assert = cmd.assert().success();
    let output = assert.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Table 'users' created"));
    assert!(stdout.contains("Row inserted"));
    assert!(stdout.contains("Alice"));
}

#[test]
fn parse_error_is_reported_on_stdout_without_aborting_the_script() {
    let temp_dir = tempfile::TempDir::new().unwrap();
    let script_path = temp_dir.path().join("setup.sql");
    std::fs::write(
        &script_path,
        "SELECT FROM;\n\
         CREATE TABLE users (id INTEGER, PRIMARY KEY (id));\n",
    )
    .unwrap();

    let mut cmd = Command::new(scribe_path());
    cmd.arg(&script_path);

    let assert = cmd.assert().success();
    let output = assert.get_output();
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("Error:"));
    assert!(stdout.contains("Table 'users' created"));
}

#[test]
fn scribe_log_env_var_is_respected_when_set() {
    let mut cmd = Command::new(scribe_path());
    cmd.env("SCRIBE_LOG", "debug");
    cmd.arg("-e").arg("SELECT * FROM nowhere;");

    cmd.assert().success();
}
