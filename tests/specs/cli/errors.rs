//! CLI error specs
//!
//! Verify invalid input fails with a useful message.

use crate::prelude::*;

#[test]
fn missing_subcommand_fails() {
    let temp = Project::empty();
    temp.kiln().args(&[]).fails();
}

#[test]
fn malformed_param_fails() {
    let temp = Project::fast();
    temp.kiln()
        .args(&["submit", "--user", "alice", "--prompt", "teapot", "-p", "style"])
        .fails()
        .stderr_has("no `=` found");
}

#[test]
fn prompt_owned_by_someone_else_is_rejected() {
    let temp = Project::fast();
    temp.kiln()
        .args(&["submit", "--user", "mallory", "--prompt", "teapot"])
        .fails()
        .stderr_has("does not exist or is not owned by mallory");

    temp.kiln().args(&["runs", "list"]).passes().stdout_eq("No runs\n");
}

#[test]
fn invalid_config_fails() {
    let temp = Project::empty();
    temp.file("kiln.toml", "[engine]\ncapacity = 0\n");
    temp.kiln()
        .args(&["runs", "list"])
        .fails()
        .stderr_has("invalid config");
}

#[test]
fn unknown_status_filter_fails() {
    let temp = Project::fast();
    temp.kiln()
        .args(&["runs", "list", "--status", "melting"])
        .fails()
        .stderr_has("melting");
}
