//! Behavioral specifications for the kiln CLI.
//!
//! These tests are black-box: they invoke the CLI binary and verify
//! stdout, stderr, and exit codes.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

#[path = "specs/prelude.rs"]
mod prelude;

// cli/
#[path = "specs/cli/errors.rs"]
mod cli_errors;
#[path = "specs/cli/help.rs"]
mod cli_help;

// runs/
#[path = "specs/runs/inspect.rs"]
mod runs_inspect;
#[path = "specs/runs/simulate.rs"]
mod runs_simulate;
#[path = "specs/runs/submit.rs"]
mod runs_submit;
