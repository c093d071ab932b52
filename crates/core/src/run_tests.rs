// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::clock::FakeClock;
use std::time::Duration;
use yare::parameterized;

fn new_run(clock: &FakeClock) -> Run {
    Run::new(
        "run-1",
        UserId::from("user-1"),
        PromptId::from("prompt-1"),
        serde_json::json!({"style": "low-poly"}),
        clock,
    )
}

fn applied(result: Result<Transition, TransitionError>) -> (Run, Vec<Effect>) {
    match result {
        Ok(Transition::Applied { run, effects }) => (*run, effects),
        other => panic!("expected applied transition, got {:?}", other),
    }
}

fn admitted(clock: &FakeClock) -> Run {
    applied(new_run(clock).transition(RunInput::Admit, clock)).0
}

fn report(run: &Run, report: StageReport, clock: &FakeClock) -> Run {
    applied(run.transition(RunInput::Report(report), clock)).0
}

#[test]
fn new_run_is_pending_with_catalog_stages() {
    let clock = FakeClock::new();
    let run = new_run(&clock);

    assert_eq!(run.status, RunStatus::Pending);
    assert_eq!(run.progress, 0.0);
    assert_eq!(run.version, 1);
    assert_eq!(run.current_stage, None);
    assert_eq!(run.stages.len(), CATALOG.len());
    assert!(run.admitted_at.is_none());
    assert!(run.estimated_time_remaining_secs.unwrap() > 0.0);
}

#[test]
fn admit_records_admission_and_emits() {
    let clock = FakeClock::new();
    let (run, effects) = applied(new_run(&clock).transition(RunInput::Admit, &clock));

    assert_eq!(run.admitted_at, Some(clock.now()));
    assert_eq!(run.status, RunStatus::Pending);
    assert_eq!(run.version, 2);
    assert!(matches!(
        &effects[..],
        [Effect::Emit(RunEvent { previous: RunStatus::Pending, status: RunStatus::Pending, version: 2, .. })]
    ));
}

#[test]
fn admit_twice_is_ignored() {
    let clock = FakeClock::new();
    let run = admitted(&clock);
    assert_eq!(
        run.transition(RunInput::Admit, &clock),
        Ok(Transition::Ignored)
    );
}

#[test]
fn report_before_admission_is_stale() {
    let clock = FakeClock::new();
    let run = new_run(&clock);
    let err = run
        .transition(
            RunInput::Report(StageReport::running(StageId::Planning, 0.1)),
            &clock,
        )
        .unwrap_err();
    assert_eq!(
        err,
        TransitionError::StaleUpdate {
            run_id: run.id.clone(),
            reason: StaleReason::NotAdmitted,
        }
    );
}

#[test]
fn first_report_starts_the_first_stage() {
    let clock = FakeClock::new();
    let run = admitted(&clock);
    clock.advance(Duration::from_secs(5));

    let run = report(&run, StageReport::running(StageId::Planning, 0.4), &clock);

    let planning = run.stage(StageId::Planning).unwrap();
    assert_eq!(planning.status, StageStatus::Running);
    assert_eq!(planning.started_at, Some(clock.now()));
    assert_eq!(run.status, RunStatus::Planning);
    assert_eq!(run.current_stage, Some(StageId::Planning));
    assert!((run.progress - 0.4 / 9.0).abs() < 1e-9);
}

#[test]
fn completing_first_stage_matches_worked_example() {
    let clock = FakeClock::new();
    let run = admitted(&clock);

    let run = report(&run, StageReport::completed(StageId::Planning, None), &clock);
    assert!((run.progress - 0.111).abs() < 1e-3);
    assert_eq!(run.status, RunStatus::CoarseGen);
    assert_eq!(run.current_stage, Some(StageId::CoarseGen));

    let (run, effects) = applied(run.transition(
        RunInput::Report(StageReport::failed(StageId::CoarseGen, 0.2, "out of memory")),
        &clock,
    ));
    assert_eq!(run.status, RunStatus::Failed);
    assert_eq!(run.error.as_deref(), Some("out of memory"));
    assert_eq!(run.completed_at, Some(clock.now()));
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::ReleaseSlot { run_id } if run_id == &run.id)));

    let err = run
        .transition(
            RunInput::Report(StageReport::running(StageId::MeshRecon, 0.1)),
            &clock,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        TransitionError::StaleUpdate {
            reason: StaleReason::Terminal(RunStatus::Failed),
            ..
        }
    ));
}

#[test]
fn report_for_wrong_stage_is_stale_and_changes_nothing() {
    let clock = FakeClock::new();
    let run = admitted(&clock);
    let run = report(&run, StageReport::running(StageId::Planning, 0.5), &clock);

    let err = run
        .transition(
            RunInput::Report(StageReport::running(StageId::UvUnwrap, 0.5)),
            &clock,
        )
        .unwrap_err();
    assert_eq!(
        err,
        TransitionError::StaleUpdate {
            run_id: run.id.clone(),
            reason: StaleReason::WrongStage {
                expected: StageId::Planning,
                got: StageId::UvUnwrap,
            },
        }
    );
}

#[parameterized(
    lower = { 0.3, StageStatus::Running },
    lower_completion = { 0.3, StageStatus::Completed },
    duplicate = { 0.5, StageStatus::Running },
)]
fn regressed_or_duplicate_reports_are_stale(progress: f64, status: StageStatus) {
    let clock = FakeClock::new();
    let run = admitted(&clock);
    let run = report(&run, StageReport::running(StageId::Planning, 0.5), &clock);

    let result = run.transition(
        RunInput::Report(StageReport {
            stage: StageId::Planning,
            progress,
            status,
            output: None,
            error: None,
        }),
        &clock,
    );
    assert!(matches!(
        result,
        Err(TransitionError::StaleUpdate { .. })
    ));
}

#[test]
fn nan_and_pending_reports_are_stale() {
    let clock = FakeClock::new();
    let run = admitted(&clock);

    let nan = run.transition(
        RunInput::Report(StageReport::running(StageId::Planning, f64::NAN)),
        &clock,
    );
    assert!(matches!(
        nan,
        Err(TransitionError::StaleUpdate { reason: StaleReason::InvalidProgress, .. })
    ));

    let pending = run.transition(
        RunInput::Report(StageReport {
            stage: StageId::Planning,
            progress: 0.0,
            status: StageStatus::Pending,
            output: None,
            error: None,
        }),
        &clock,
    );
    assert!(matches!(
        pending,
        Err(TransitionError::StaleUpdate { reason: StaleReason::PendingStatus, .. })
    ));
}

#[test]
fn out_of_range_progress_is_clamped() {
    let clock = FakeClock::new();
    let run = admitted(&clock);
    let run = report(&run, StageReport::running(StageId::Planning, 7.0), &clock);
    assert_eq!(run.stage(StageId::Planning).unwrap().progress, 1.0);
    assert!(run.progress <= 1.0);
}

#[test]
fn full_pipeline_completes_with_last_stage_output() {
    let clock = FakeClock::new();
    let mut run = admitted(&clock);

    for def in &CATALOG {
        run = report(&run, StageReport::running(def.id, 0.5), &clock);
        let output = serde_json::json!({ "stage": def.id.as_str() });
        run = report(&run, StageReport::completed(def.id, Some(output)), &clock);
    }

    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.progress, 1.0);
    assert_eq!(run.current_stage, None);
    assert_eq!(run.result, Some(serde_json::json!({ "stage": "publish" })));
    assert_eq!(run.estimated_time_remaining_secs, Some(0.0));
    assert!(run.completed_at.is_some());
    assert_eq!(run.stages.len(), CATALOG.len());
}

#[test]
fn progress_never_decreases_while_running() {
    let clock = FakeClock::new();
    let mut run = admitted(&clock);
    let mut last = run.progress;

    for def in CATALOG.iter().take(4) {
        for step in [0.25, 0.5, 0.75] {
            run = report(&run, StageReport::running(def.id, step), &clock);
            assert!(run.progress >= last);
            last = run.progress;
        }
        run = report(&run, StageReport::completed(def.id, None), &clock);
        assert!(run.progress >= last);
        last = run.progress;
    }
}

#[test]
fn cancel_keeps_partial_stage_progress() {
    let clock = FakeClock::new();
    let run = admitted(&clock);
    let run = report(&run, StageReport::running(StageId::Planning, 0.6), &clock);

    let (cancelled, effects) = applied(run.transition(RunInput::Cancel, &clock));

    assert_eq!(cancelled.status, RunStatus::Cancelled);
    assert_eq!(cancelled.completed_at, Some(clock.now()));
    assert_eq!(cancelled.progress, run.progress);
    let planning = cancelled.stage(StageId::Planning).unwrap();
    assert_eq!(planning.status, StageStatus::Running);
    assert_eq!(planning.progress, 0.6);
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::SignalCancel { .. })));
    assert!(effects
        .iter()
        .any(|e| matches!(e, Effect::ReleaseSlot { .. })));
}

#[test]
fn cancel_of_queued_run_requests_no_slot_release() {
    let clock = FakeClock::new();
    let (_, effects) = applied(new_run(&clock).transition(RunInput::Cancel, &clock));
    assert_eq!(effects.len(), 1);
    assert!(matches!(effects[0], Effect::Emit(_)));
}

#[test]
fn second_cancel_is_already_terminal() {
    let clock = FakeClock::new();
    let (cancelled, _) = applied(admitted(&clock).transition(RunInput::Cancel, &clock));

    let err = cancelled.transition(RunInput::Cancel, &clock).unwrap_err();
    assert_eq!(
        err,
        TransitionError::AlreadyTerminal {
            run_id: cancelled.id.clone(),
            status: RunStatus::Cancelled,
        }
    );
}

#[test]
fn reports_after_cancel_are_ignored() {
    let clock = FakeClock::new();
    let (cancelled, _) = applied(admitted(&clock).transition(RunInput::Cancel, &clock));

    let result = cancelled.transition(
        RunInput::Report(StageReport::completed(StageId::Planning, None)),
        &clock,
    );
    assert_eq!(result, Ok(Transition::Ignored));
}

#[test]
fn completed_at_is_set_only_once() {
    let clock = FakeClock::new();
    let run = admitted(&clock);
    let (failed, _) = applied(run.transition(
        RunInput::Fail {
            reason: "dispatch failed".to_string(),
        },
        &clock,
    ));
    let first = failed.completed_at;
    clock.advance(Duration::from_secs(10));

    assert!(failed.transition(RunInput::Cancel, &clock).is_err());
    assert_eq!(failed.completed_at, first);
}

#[test]
fn engine_failure_is_attributed_to_the_next_stage() {
    let clock = FakeClock::new();
    let run = admitted(&clock);
    let run = report(&run, StageReport::completed(StageId::Planning, None), &clock);

    let (failed, _) = applied(run.transition(
        RunInput::Fail {
            reason: "worker lost".to_string(),
        },
        &clock,
    ));

    assert_eq!(failed.status, RunStatus::Failed);
    assert_eq!(failed.error.as_deref(), Some("worker lost"));
    let coarse = failed.stage(StageId::CoarseGen).unwrap();
    assert_eq!(coarse.status, StageStatus::Failed);
    let later = failed.stage(StageId::MeshRecon).unwrap();
    assert_eq!(later.status, StageStatus::Pending);
}

#[test]
fn stage_failure_without_message_gets_default_error() {
    let clock = FakeClock::new();
    let run = admitted(&clock);
    let run = report(
        &run,
        StageReport {
            stage: StageId::Planning,
            progress: 0.1,
            status: StageStatus::Failed,
            output: None,
            error: None,
        },
        &clock,
    );
    assert_eq!(run.error.as_deref(), Some("stage planning failed"));
}

#[test]
fn run_round_trips_through_json() {
    let clock = FakeClock::new();
    let run = report(
        &admitted(&clock),
        StageReport::running(StageId::Planning, 0.5),
        &clock,
    );
    let json = serde_json::to_string(&run).unwrap();
    let back: Run = serde_json::from_str(&json).unwrap();
    assert_eq!(back, run);
}
