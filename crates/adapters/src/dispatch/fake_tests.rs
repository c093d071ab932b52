// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use kiln_core::{FakeClock, PromptId, UserId};

fn run(id: &str) -> Run {
    Run::new(
        id,
        UserId::from("u"),
        PromptId::from("p"),
        serde_json::Value::Null,
        &FakeClock::new(),
    )
}

#[tokio::test]
async fn fake_dispatcher_records_calls() {
    let dispatcher = FakeDispatcher::new();
    dispatcher.dispatch(&run("run-1")).await.unwrap();
    dispatcher.dispatch(&run("run-2")).await.unwrap();
    dispatcher.cancel(&RunId::from("run-1")).await.unwrap();

    assert_eq!(
        dispatcher.dispatched(),
        vec![RunId::from("run-1"), RunId::from("run-2")]
    );
    assert_eq!(dispatcher.cancelled(), vec![RunId::from("run-1")]);
    assert_eq!(dispatcher.calls().len(), 3);
}

#[tokio::test]
async fn fake_dispatcher_can_fail() {
    let dispatcher = FakeDispatcher::new();
    dispatcher.set_fail_dispatch(true);

    let result = dispatcher.dispatch(&run("run-1")).await;
    assert!(matches!(result, Err(DispatchError::Rejected(_))));
    assert_eq!(dispatcher.dispatched(), vec![RunId::from("run-1")]);
}
