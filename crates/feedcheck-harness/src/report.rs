//! Run results and the final summary.

use crate::expect::AssertionFailure;
use core::fmt::{self, Display, Formatter};
use core::time::Duration;
use serde::{Deserialize, Serialize};

/// Terminal outcome of one case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum CaseOutcome {
    /// Every expectation held
    Passed,
    /// At least one expectation failed
    Failed {
        /// Failures in the order they were recorded
        failures: Vec<AssertionFailure>,
    },
    /// The body or one of its per-case hooks faulted
    Errored {
        /// Captured fault message
        fault: String,
    },
    /// The async body did not complete within its bound
    TimedOut {
        /// The bound that elapsed, in milliseconds
        after_ms: u64,
    },
}

impl CaseOutcome {
    /// Outcome for a body that resolved with the given failures.
    pub fn from_failures(failures: Vec<AssertionFailure>) -> Self {
        if failures.is_empty() {
            Self::Passed
        } else {
            Self::Failed { failures }
        }
    }

    /// Outcome for an async body that exceeded `bound`.
    pub fn timed_out(bound: Duration) -> Self {
        Self::TimedOut {
            after_ms: millis(bound),
        }
    }

    /// Whether the case passed.
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }

    /// Short status label.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Passed => "passed",
            Self::Failed { .. } => "failed",
            Self::Errored { .. } => "errored",
            Self::TimedOut { .. } => "timed out",
        }
    }
}

/// Result of one case.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CaseReport {
    /// Full name of the owning group
    pub group: String,
    /// Case name
    pub name: String,
    /// Terminal outcome
    pub outcome: CaseOutcome,
    /// Wall time spent on the case, hooks included
    pub elapsed_ms: u64,
    /// Position in execution order across the whole run
    pub index: usize,
}

impl CaseReport {
    /// `Group > Case`
    pub fn full_name(&self) -> String {
        full_name(&self.group, &self.name)
    }
}

/// Result of one group. Nested groups get their own report.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GroupReport {
    /// Full group name (`Outer > Inner`)
    pub name: String,
    /// Cases registered directly in this group, in execution order
    pub cases: Vec<CaseReport>,
    /// Fault raised by the setup-once hook
    pub setup_fault: Option<String>,
    /// Fault raised by the teardown-once hook
    pub teardown_fault: Option<String>,
}

/// Totals over a whole run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    /// Number of executed cases
    pub total: usize,
    /// Cases that passed
    pub passed: usize,
    /// Cases with assertion failures
    pub failed: usize,
    /// Cases that faulted
    pub errored: usize,
    /// Cases that exceeded their bound
    pub timed_out: usize,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Report {
    /// Group reports in execution order
    pub groups: Vec<GroupReport>,
    /// Wall time of the run
    pub elapsed_ms: u64,
}

impl Report {
    /// Iterate over all case reports in execution order.
    pub fn cases(&self) -> impl Iterator<Item = &CaseReport> {
        self.groups.iter().flat_map(|group| group.cases.iter())
    }

    /// Look up a case by group and case name.
    pub fn case(&self, group: &str, name: &str) -> Option<&CaseReport> {
        self.cases()
            .find(|case| case.group == group && case.name == name)
    }

    /// Full case names in the order the cases finished.
    ///
    /// Differs from [`cases`](Self::cases) when a group interleaves cases
    /// with nested groups.
    pub fn completion_order(&self) -> Vec<String> {
        let mut cases: Vec<&CaseReport> = self.cases().collect();
        cases.sort_by_key(|case| case.index);
        cases.into_iter().map(CaseReport::full_name).collect()
    }

    /// Count outcomes.
    pub fn summary(&self) -> Summary {
        self.cases().fold(Summary::default(), |mut summary, case| {
            summary.total += 1;
            match case.outcome {
                CaseOutcome::Passed => summary.passed += 1,
                CaseOutcome::Failed { .. } => summary.failed += 1,
                CaseOutcome::Errored { .. } => summary.errored += 1,
                CaseOutcome::TimedOut { .. } => summary.timed_out += 1,
            }
            summary
        })
    }

    /// True when every case passed and no group hook faulted.
    pub fn is_success(&self) -> bool {
        self.cases().all(|case| case.outcome.is_passed())
            && self
                .groups
                .iter()
                .all(|group| group.setup_fault.is_none() && group.teardown_fault.is_none())
    }

    /// Serialize the report as pretty JSON.
    ///
    /// # Errors
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

impl Display for Report {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> fmt::Result {
        let summary = self.summary();

        for group in &self.groups {
            if let Some(fault) = &group.setup_fault {
                writeln!(formatter, "{}: beforeAll hook failed: {fault}", group.name)?;
            }
            for case in group.cases.iter().filter(|case| !case.outcome.is_passed()) {
                writeln!(formatter, "{} ({})", case.full_name(), case.outcome.label())?;
                match &case.outcome {
                    CaseOutcome::Failed { failures } => {
                        for failure in failures {
                            writeln!(formatter, "    {} [{}]", failure.message, failure.location)?;
                        }
                    }
                    CaseOutcome::Errored { fault } => writeln!(formatter, "    {fault}")?,
                    CaseOutcome::TimedOut { after_ms } => {
                        writeln!(formatter, "    completion not signalled within {after_ms}ms")?;
                    }
                    CaseOutcome::Passed => {}
                }
            }
            if let Some(fault) = &group.teardown_fault {
                writeln!(formatter, "{}: afterAll hook failed: {fault}", group.name)?;
            }
        }

        write!(
            formatter,
            "{} cases, {} passed, {} failed, {} errored, {} timed out ({}ms)",
            summary.total,
            summary.passed,
            summary.failed,
            summary.errored,
            summary.timed_out,
            self.elapsed_ms
        )
    }
}

/// `Group > Case` naming shared by reports and the run filter.
pub(crate) fn full_name(group: &str, name: &str) -> String {
    format!("{group} > {name}")
}

/// Duration in whole milliseconds, saturating.
pub(crate) fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
