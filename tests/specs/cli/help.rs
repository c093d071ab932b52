//! Help output specs
//!
//! Verify the command surface is documented.

use crate::prelude::*;

#[test]
fn help_lists_commands() {
    let temp = Project::empty();
    let help = temp.kiln().args(&["--help"]).passes();
    for command in ["submit", "simulate", "runs", "cancel", "retry", "stats"] {
        assert!(help.stdout().contains(command), "missing {command}");
    }
}

#[test]
fn runs_help_lists_subcommands() {
    let temp = Project::empty();
    temp.kiln()
        .args(&["runs", "--help"])
        .passes()
        .stdout_has("list")
        .stdout_has("show");
}

#[test]
fn version_flag_prints_version() {
    let temp = Project::empty();
    temp.kiln().args(&["--version"]).passes().stdout_has("kiln ");
}
