//! Run inspection and cancellation specs
//!
//! Verify list, show, cancel and stats against stored runs.

use crate::prelude::*;

fn queue(temp: &Project) -> String {
    temp.kiln()
        .args(&["submit", "--user", "alice", "--prompt", "teapot", "--detach"])
        .passes()
        .id_after("Submitted: ")
}

#[test]
fn list_is_empty_without_runs() {
    let temp = Project::fast();
    temp.kiln().args(&["runs", "list"]).passes().stdout_eq("No runs\n");
}

#[test]
fn list_shows_runs_and_filters_by_status() {
    let temp = Project::fast();
    let id = queue(&temp);

    temp.kiln()
        .args(&["runs", "list"])
        .passes()
        .stdout_has("STATUS")
        .stdout_has(&id[..12])
        .stdout_has("teapot");

    temp.kiln()
        .args(&["runs", "list", "--status", "failed"])
        .passes()
        .stdout_eq("No runs\n");
}

#[test]
fn show_unknown_run() {
    let temp = Project::fast();
    temp.kiln()
        .args(&["runs", "show", "nonexistent-id"])
        .passes()
        .stdout_eq("Run not found: nonexistent-id\n");
}

#[test]
fn cancel_twice_reports_already_finished() {
    let temp = Project::fast();
    let id = queue(&temp);

    temp.kiln()
        .args(&["cancel", &id])
        .passes()
        .stdout_has("Cancelled run");
    temp.kiln()
        .args(&["cancel", &id])
        .passes()
        .stdout_has("already finished (cancelled)");

    temp.kiln()
        .args(&["stats", "--user", "alice"])
        .passes()
        .stdout_has("Cancelled: 1");
}

#[test]
fn stats_json_output() {
    let temp = Project::fast();
    queue(&temp);

    let out = temp
        .kiln()
        .args(&["-o", "json", "stats", "--user", "alice"])
        .passes();
    let stats: serde_json::Value = serde_json::from_str(&out.stdout()).unwrap();
    assert_eq!(stats["total"], 1);
    assert_eq!(stats["pending"], 1);
}
