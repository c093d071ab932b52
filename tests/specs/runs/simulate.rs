//! Simulation specs
//!
//! Verify several runs share the admission capacity and all finish.

use crate::prelude::*;

#[test]
fn simulate_completes_every_run() {
    let temp = Project::fast();
    temp.kiln()
        .args(&["simulate", "--runs", "3", "--capacity", "1"])
        .passes()
        .stdout_has("Simulated 3 run(s): 3 completed, 0 failed, 0 cancelled");

    temp.kiln()
        .args(&["stats", "--user", "alice"])
        .passes()
        .stdout_has("Runs: 3")
        .stdout_has("Completed: 3")
        .stdout_has("Success rate: 100.0%");
}

#[test]
fn simulate_uses_demo_prompt_without_config() {
    let temp = Project::empty();
    temp.file("kiln.toml", "[executor]\ntick = \"1ms\"\nticks_per_stage = 1\n");
    temp.kiln()
        .args(&["simulate", "--runs", "1"])
        .passes()
        .stdout_has("1 completed");

    temp.kiln()
        .args(&["runs", "list", "--user", "demo-user"])
        .passes()
        .stdout_has("demo-prompt");
}

#[test]
fn zero_capacity_override_fails() {
    let temp = Project::fast();
    temp.kiln()
        .args(&["simulate", "--capacity", "0"])
        .fails()
        .stderr_has("capacity must be at least 1");
}
