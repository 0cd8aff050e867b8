//! Asynchronous assertion harness.
//!
//! Organises named groups of named cases, runs them strictly in registration
//! order with sync or async completion, and reports a terminal outcome per
//! case:
//! - registration through [`Suite::describe`] and [`GroupBuilder`]
//! - accumulated expectations through [`Expect`]
//! - single-resolution async completion through [`Done`]
//! - settle polling for interaction checks through [`wait_until`]
//! - execution and reporting through [`Runner`] and [`Report`]

#![cfg_attr(
    test,
    allow(
        dead_code,
        clippy::expect_used,
        clippy::unwrap_used,
        clippy::panic,
        clippy::missing_panics_doc,
        clippy::missing_errors_doc,
        clippy::print_stdout,
        clippy::print_stderr,
        reason = "Allow for tests"
    )
)]

/// Single-resolution completion signal.
pub mod completion;
/// Run configuration.
pub mod config;
/// Harness errors.
pub mod error;
/// Assertion primitives.
pub mod expect;
/// Run results.
pub mod report;
/// Streaming progress observers.
pub mod reporter;
/// Suite execution.
pub mod runner;
/// Settle polling.
pub mod settle;
/// Group and case registration.
pub mod suite;

pub use completion::{Completion, Done, Signal};
pub use config::{RunConfig, SettleConfig};
pub use error::{HarnessError, Result};
pub use expect::{AssertionFailure, Expect};
pub use report::{CaseOutcome, CaseReport, GroupReport, Report, Summary};
pub use reporter::{Reporter, TracingReporter};
pub use runner::Runner;
pub use settle::{settle, wait_until};
pub use suite::{BodyResult, GroupBuilder, Suite};
