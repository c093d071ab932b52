// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::stage::materialize;
use proptest::prelude::*;

fn with_statuses(statuses: &[(StageStatus, f64)]) -> Vec<StageRecord> {
    let mut stages = materialize();
    for (stage, (status, progress)) in stages.iter_mut().zip(statuses) {
        stage.status = *status;
        stage.progress = *progress;
    }
    stages
}

#[test]
fn all_pending_is_pending_with_zero_progress() {
    let agg = aggregate(&materialize());
    assert_eq!(agg.status, RunStatus::Pending);
    assert_eq!(agg.progress, 0.0);
    assert_eq!(agg.failed_stage, None);
}

#[test]
fn first_stage_complete_reads_as_second_stage() {
    let stages = with_statuses(&[(StageStatus::Completed, 1.0)]);
    let agg = aggregate(&stages);
    assert_eq!(agg.status, RunStatus::CoarseGen);
    assert!((agg.progress - 1.0 / 9.0).abs() < 1e-9);
}

#[test]
fn running_stage_contributes_partial_progress() {
    let stages = with_statuses(&[
        (StageStatus::Completed, 1.0),
        (StageStatus::Completed, 1.0),
        (StageStatus::Running, 0.5),
    ]);
    let agg = aggregate(&stages);
    assert_eq!(agg.status, RunStatus::MeshRecon);
    assert!((agg.progress - 2.5 / 9.0).abs() < 1e-9);
}

#[test]
fn any_failed_stage_fails_the_run() {
    let stages = with_statuses(&[
        (StageStatus::Completed, 1.0),
        (StageStatus::Failed, 0.3),
    ]);
    let agg = aggregate(&stages);
    assert_eq!(agg.status, RunStatus::Failed);
    assert_eq!(agg.failed_stage, Some(StageId::CoarseGen));
}

#[test]
fn all_completed_is_completed() {
    let stages = with_statuses(&[(StageStatus::Completed, 1.0); 9]);
    let agg = aggregate(&stages);
    assert_eq!(agg.status, RunStatus::Completed);
    assert_eq!(agg.progress, 1.0);
}

#[test]
fn empty_stage_array_is_pending() {
    let agg = aggregate(&[]);
    assert_eq!(agg.status, RunStatus::Pending);
    assert_eq!(agg.progress, 0.0);
}

#[test]
fn estimate_counts_remaining_nominal_time() {
    let fresh = estimate_remaining(&materialize());
    let total: u32 = crate::stage::CATALOG.iter().map(|d| d.nominal_secs).sum();
    assert_eq!(fresh, f64::from(total));

    let stages = with_statuses(&[(StageStatus::Completed, 1.0), (StageStatus::Running, 0.5)]);
    assert_eq!(estimate_remaining(&stages), f64::from(total) - 10.0 - 30.0);
}

fn stage_status() -> impl Strategy<Value = StageStatus> {
    prop_oneof![
        Just(StageStatus::Pending),
        Just(StageStatus::Running),
        Just(StageStatus::Completed),
        Just(StageStatus::Failed),
    ]
}

proptest! {
    #[test]
    fn aggregate_is_bounded_and_consistent(
        reports in proptest::collection::vec((stage_status(), 0.0..=1.0f64), 9)
    ) {
        let stages = with_statuses(&reports);
        let agg = aggregate(&stages);

        prop_assert!((0.0..=1.0).contains(&agg.progress));

        let all_completed = stages.iter().all(|s| s.status == StageStatus::Completed);
        let any_failed = stages.iter().any(|s| s.status == StageStatus::Failed);
        prop_assert_eq!(agg.status == RunStatus::Completed, all_completed);
        prop_assert_eq!(agg.status == RunStatus::Failed, any_failed);

        if any_failed {
            let earliest = stages.iter().find(|s| s.status == StageStatus::Failed).map(|s| s.id);
            prop_assert_eq!(agg.failed_stage, earliest);
        } else if !all_completed && agg.status != RunStatus::Pending {
            let first_open = stages.iter().find(|s| s.status != StageStatus::Completed);
            prop_assert_eq!(Some(agg.status), first_open.map(|s| RunStatus::for_stage(s.id)));
        }
    }
}
