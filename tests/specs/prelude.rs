//! Shared helpers for CLI specs.

#![allow(dead_code)]

use assert_cmd::Command;
use std::path::Path;
use std::process::Output;
use tempfile::TempDir;

/// Config that finishes every stage in a single quick report
pub const FAST_CONFIG: &str = r#"
[executor]
tick = "1ms"
ticks_per_stage = 1

[[prompts]]
id = "teapot"
owner = "alice"
"#;

/// A scratch working directory with its own state directory
pub struct Project {
    dir: TempDir,
}

impl Project {
    pub fn empty() -> Self {
        Self {
            dir: TempDir::new().unwrap(),
        }
    }

    /// A project whose kiln.toml is [`FAST_CONFIG`]
    pub fn fast() -> Self {
        let project = Self::empty();
        project.file("kiln.toml", FAST_CONFIG);
        project
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn file(&self, rel: &str, content: &str) {
        let path = self.dir.path().join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    pub fn kiln(&self) -> CliBuilder {
        let mut cmd = Command::cargo_bin("kiln").unwrap();
        cmd.current_dir(self.path())
            .env("KILN_STATE_DIR", self.path().join("state"))
            .env_remove("RUST_LOG");
        CliBuilder { cmd }
    }
}

pub struct CliBuilder {
    cmd: Command,
}

impl CliBuilder {
    pub fn args(mut self, args: &[&str]) -> Self {
        self.cmd.args(args);
        self
    }

    /// Run and require a zero exit status
    pub fn passes(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert { output };
        assert!(
            run.output.status.success(),
            "expected success\nstdout:\n{}\nstderr:\n{}",
            run.stdout(),
            run.stderr()
        );
        run
    }

    /// Run and require a non-zero exit status
    pub fn fails(mut self) -> RunAssert {
        let output = self.cmd.output().unwrap();
        let run = RunAssert { output };
        assert!(
            !run.output.status.success(),
            "expected failure\nstdout:\n{}",
            run.stdout()
        );
        run
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_eq(self, expected: &str) -> Self {
        assert_eq!(self.stdout(), expected);
        self
    }

    pub fn stdout_has(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(needle), "stdout missing {needle:?}:\n{stdout}");
        self
    }

    pub fn stdout_lacks(self, needle: &str) -> Self {
        let stdout = self.stdout();
        assert!(!stdout.contains(needle), "stdout has {needle:?}:\n{stdout}");
        self
    }

    pub fn stderr_has(self, needle: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(needle), "stderr missing {needle:?}:\n{stderr}");
        self
    }

    /// The id printed after `label` (e.g. "Started: ")
    pub fn id_after(&self, label: &str) -> String {
        self.stdout()
            .lines()
            .find_map(|l| l.strip_prefix(label))
            .map(|id| id.trim().to_string())
            .unwrap()
    }
}
