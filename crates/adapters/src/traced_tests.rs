// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::dispatch::{DispatchCall, FakeDispatcher};
use crate::prompt::FakePromptDirectory;
use kiln_core::FakeClock;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// A writer that captures log output for testing
#[derive(Clone, Default)]
struct CapturedLogs {
    logs: Arc<Mutex<Vec<u8>>>,
}

impl CapturedLogs {
    fn new() -> Self {
        Self::default()
    }

    fn contents(&self) -> String {
        let logs = self.logs.lock().unwrap();
        String::from_utf8_lossy(&logs).to_string()
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.logs.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Run a test with captured tracing output
fn with_tracing<F, Fut>(f: F) -> (String, Fut::Output)
where
    F: FnOnce() -> Fut,
    Fut: std::future::Future,
{
    let logs = CapturedLogs::new();
    let logs_clone = logs.clone();

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_writer(logs_clone)
        .with_ansi(false)
        .without_time()
        .finish();

    let result = tracing::subscriber::with_default(subscriber, || {
        tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .unwrap()
            .block_on(f())
    });

    (logs.contents(), result)
}

fn run(id: &str) -> Run {
    Run::new(
        id,
        UserId::from("alice"),
        PromptId::from("p1"),
        serde_json::Value::Null,
        &FakeClock::new(),
    )
}

#[test]
fn traced_dispatch_logs_entry_and_completion() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedDispatcher::new(FakeDispatcher::new());
        traced.dispatch(&run("run-42")).await
    });

    assert!(result.is_ok(), "dispatch should succeed: {:?}", result);
    assert!(
        logs.contains("dispatch.start"),
        "Should log span name. Logs:\n{}",
        logs
    );
    assert!(logs.contains("run-42"), "Should log run id. Logs:\n{}", logs);
    assert!(
        logs.contains("dispatching"),
        "Should log entry message. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("elapsed_ms"),
        "Should log timing. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_dispatch_logs_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakeDispatcher::new();
        fake.set_fail_dispatch(true);
        TracedDispatcher::new(fake).dispatch(&run("run-7")).await
    });

    assert!(result.is_err());
    assert!(
        logs.contains("dispatch failed"),
        "Should log failure. Logs:\n{}",
        logs
    );
    assert!(
        logs.contains("fake executor offline"),
        "Should log error. Logs:\n{}",
        logs
    );
}

#[test]
fn traced_cancel_logs_operation() {
    let (logs, result) = with_tracing(|| async {
        let traced = TracedDispatcher::new(FakeDispatcher::new());
        traced.cancel(&RunId::from("run-3")).await
    });

    assert!(result.is_ok());
    assert!(logs.contains("dispatch.cancel"), "Logs:\n{}", logs);
    assert!(logs.contains("cancel signalled"), "Logs:\n{}", logs);
}

#[test]
fn traced_prompt_lookup_logs_failure() {
    let (logs, result) = with_tracing(|| async {
        let fake = FakePromptDirectory::new();
        fake.set_unavailable(true);
        TracedPromptDirectory::new(fake)
            .prompt_exists(&PromptId::from("p1"), &UserId::from("alice"))
            .await
    });

    assert!(result.is_err());
    assert!(logs.contains("prompt.exists"), "Logs:\n{}", logs);
    assert!(logs.contains("lookup failed"), "Logs:\n{}", logs);
}

#[tokio::test]
async fn traced_dispatcher_delegates_to_inner() {
    let fake = FakeDispatcher::new();
    let traced = TracedDispatcher::new(fake.clone());

    traced.dispatch(&run("run-1")).await.unwrap();
    traced.cancel(&RunId::from("run-1")).await.unwrap();

    assert_eq!(
        fake.calls(),
        vec![
            DispatchCall::Dispatch {
                run_id: RunId::from("run-1")
            },
            DispatchCall::Cancel {
                run_id: RunId::from("run-1")
            },
        ]
    );
}

#[tokio::test]
async fn traced_prompt_directory_delegates_to_inner() {
    let fake = FakePromptDirectory::new();
    fake.add("p1", "alice");
    let traced = TracedPromptDirectory::new(fake.clone());

    let exists = traced
        .prompt_exists(&PromptId::from("p1"), &UserId::from("alice"))
        .await
        .unwrap();

    assert!(exists);
    assert_eq!(fake.calls().len(), 1);
}
