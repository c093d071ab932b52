//! Submit and retry specs
//!
//! Verify runs are created, driven through every stage and retried.

use crate::prelude::*;

#[test]
fn submit_follows_run_to_completion() {
    let temp = Project::fast();
    temp.kiln()
        .args(&["submit", "--user", "alice", "--prompt", "teapot"])
        .passes()
        .stdout_has("Started: ")
        .stdout_has("publish")
        .stdout_has(" completed");
}

#[test]
fn submit_json_output_streams_updates() {
    let temp = Project::fast();
    let out = temp
        .kiln()
        .args(&["-o", "json", "submit", "--user", "alice", "--prompt", "teapot"])
        .passes();
    let stdout = out.stdout();
    let updates: Vec<serde_json::Value> = stdout
        .lines()
        .filter(|l| l.starts_with('{'))
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(updates[0]["type"], "snapshot");
    assert_eq!(updates.last().unwrap()["event"]["status"], "completed");
}

#[test]
fn detached_submit_records_without_running() {
    let temp = Project::fast();
    let id = temp
        .kiln()
        .args(&["submit", "--user", "alice", "--prompt", "teapot", "--detach"])
        .passes()
        .stdout_has("Admitted, waiting for an executing kiln command")
        .id_after("Submitted: ");

    temp.kiln()
        .args(&["runs", "show", &id])
        .passes()
        .stdout_has("Status: pending (0%)");
}

#[test]
fn detached_submit_past_capacity_reports_queued() {
    let temp = Project::empty();
    temp.file("kiln.toml", &format!("[engine]\ncapacity = 1\n{}", FAST_CONFIG));
    let submit = ["submit", "--user", "alice", "--prompt", "teapot", "--detach"];

    temp.kiln()
        .args(&submit)
        .passes()
        .stdout_has("Admitted, waiting for an executing kiln command");
    temp.kiln()
        .args(&submit)
        .passes()
        .stdout_has("Queued, waiting for a free slot")
        .stdout_lacks("Admitted");
}

#[test]
fn detached_run_is_picked_up_by_next_invocation() {
    let temp = Project::fast();
    let id = temp
        .kiln()
        .args(&["submit", "--user", "alice", "--prompt", "teapot", "--detach"])
        .passes()
        .id_after("Submitted: ");

    temp.kiln()
        .args(&["submit", "--user", "alice", "--prompt", "teapot"])
        .passes();
    // The resumed run finishes alongside or just after the followed one
    temp.kiln()
        .args(&["submit", "--user", "alice", "--prompt", "teapot"])
        .passes();

    temp.kiln()
        .args(&["runs", "show", &id])
        .passes()
        .stdout_lacks("Status: pending");
}

#[test]
fn failed_run_can_be_retried() {
    let temp = Project::empty();
    temp.file(
        "kiln.toml",
        &FAST_CONFIG.replace("ticks_per_stage = 1", "ticks_per_stage = 1\nfail_stage = \"uv_unwrap\""),
    );
    let failed = temp
        .kiln()
        .args(&["submit", "--user", "alice", "--prompt", "teapot", "-p", "seed=1"])
        .passes()
        .stdout_has("simulated failure in uv_unwrap")
        .id_after("Started: ");

    temp.kiln()
        .args(&["runs", "show", &failed[..8]])
        .passes()
        .stdout_has("Status: failed");

    temp.file("kiln.toml", FAST_CONFIG);
    let retried = temp
        .kiln()
        .args(&["retry", &failed])
        .passes()
        .stdout_has(" completed")
        .id_after("Started: ");

    temp.kiln()
        .args(&["runs", "show", &retried])
        .passes()
        .stdout_has(&format!("Retry of: {failed}"));
}

#[test]
fn retry_of_completed_run_is_rejected() {
    let temp = Project::fast();
    let id = temp
        .kiln()
        .args(&["submit", "--user", "alice", "--prompt", "teapot"])
        .passes()
        .id_after("Started: ");

    temp.kiln()
        .args(&["retry", &id])
        .fails()
        .stderr_has("cannot retry run");
}
