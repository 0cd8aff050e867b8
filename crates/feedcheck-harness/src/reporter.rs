//! Streaming progress reporting.

use crate::report::{CaseOutcome, CaseReport, GroupReport};

/// Observer notified while a run progresses.
///
/// The final [`Report`](crate::Report) is always produced; reporters only add
/// incremental output on top of it.
pub trait Reporter: Send {
    /// A group is about to run its setup-once hook.
    fn group_started(&mut self, _name: &str) {}

    /// A case reached its terminal outcome.
    fn case_finished(&mut self, _case: &CaseReport) {}

    /// A group ran its teardown-once hook.
    fn group_finished(&mut self, _group: &GroupReport) {}
}

/// Reporter that logs progress through `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn group_started(&mut self, name: &str) {
        tracing::info!("{name}");
    }

    fn case_finished(&mut self, case: &CaseReport) {
        match &case.outcome {
            CaseOutcome::Passed => {
                tracing::info!("  ok   {} ({}ms)", case.name, case.elapsed_ms);
            }
            CaseOutcome::Failed { failures } => {
                tracing::warn!("  FAIL {} ({} failed expectations)", case.name, failures.len());
            }
            CaseOutcome::Errored { fault } => {
                tracing::warn!("  ERR  {}: {fault}", case.name);
            }
            CaseOutcome::TimedOut { after_ms } => {
                tracing::warn!("  TIME {} after {after_ms}ms", case.name);
            }
        }
    }

    fn group_finished(&mut self, group: &GroupReport) {
        if let Some(fault) = &group.teardown_fault {
            tracing::warn!("{}: afterAll hook failed: {fault}", group.name);
        }
    }
}
