//! Assertion primitives used inside case bodies.
//!
//! Every primitive either passes silently or appends an [`AssertionFailure`]
//! to the case's accumulator. Failures never abort the body; a case is only
//! cut short by returning an error, panicking, or timing out.

use core::cmp::Ordering;
use core::fmt::Debug;
use core::mem;
use core::panic::Location;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

/// A single failed expectation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssertionFailure {
    /// Rendering of the expected value or condition
    pub expected: String,
    /// Rendering of the observed value
    pub actual: String,
    /// Human-readable description
    pub message: String,
    /// `file:line:column` of the assertion call
    pub location: String,
}

/// Shared failure list for one case.
#[derive(Debug, Default)]
struct Accumulator {
    /// Failures in the order they were recorded
    failures: Vec<AssertionFailure>,
    /// Set once the case outcome has been decided
    sealed: bool,
}

/// Failure accumulator handed to case bodies.
///
/// Cloning is cheap and all clones feed the same case. Once the runner has
/// decided the case outcome the accumulator is sealed, and assertions made
/// afterwards (for example by a task that outlived its timeout) are dropped.
#[derive(Debug, Clone, Default)]
pub struct Expect {
    /// Shared state behind all clones
    inner: Arc<Mutex<Accumulator>>,
}

impl Expect {
    /// Create an empty accumulator.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails when `value` is `None`, the "undefined" sentinel.
    #[track_caller]
    pub fn defined<T>(&self, value: Option<&T>) -> bool {
        if value.is_some() {
            return true;
        }
        self.record("defined", "undefined", "Expected undefined to be defined.");
        false
    }

    /// Fails unless `actual == expected`.
    #[track_caller]
    pub fn equal<T: PartialEq + Debug>(&self, actual: &T, expected: &T) -> bool {
        if actual == expected {
            return true;
        }
        self.record(
            format!("{expected:?}"),
            format!("{actual:?}"),
            format!("Expected {actual:?} to be {expected:?}."),
        );
        false
    }

    /// Fails when `actual == unexpected`.
    #[track_caller]
    pub fn not_equal<T: PartialEq + Debug>(&self, actual: &T, unexpected: &T) -> bool {
        if actual != unexpected {
            return true;
        }
        self.record(
            format!("not {unexpected:?}"),
            format!("{actual:?}"),
            format!("Expected {actual:?} not to be {unexpected:?}."),
        );
        false
    }

    /// Fails unless `condition` holds.
    #[track_caller]
    pub fn is_true(&self, condition: bool) -> bool {
        if condition {
            return true;
        }
        self.record("true", "false", "Expected false to be true.");
        false
    }

    /// Fails when `condition` holds.
    #[track_caller]
    pub fn is_false(&self, condition: bool) -> bool {
        if !condition {
            return true;
        }
        self.record("false", "true", "Expected true to be false.");
        false
    }

    /// Fails unless `value` matches `pattern`.
    #[track_caller]
    pub fn matches(&self, value: &str, pattern: &Regex) -> bool {
        if pattern.is_match(value) {
            return true;
        }
        self.record(
            format!("match of /{}/", pattern.as_str()),
            format!("{value:?}"),
            format!("Expected {value:?} to match /{}/.", pattern.as_str()),
        );
        false
    }

    /// Fails unless `actual > bound`.
    #[track_caller]
    pub fn greater_than<T: PartialOrd + Debug>(&self, actual: &T, bound: &T) -> bool {
        if actual > bound {
            return true;
        }
        self.record(
            format!("> {bound:?}"),
            format!("{actual:?}"),
            format!("Expected {actual:?} to be greater than {bound:?}."),
        );
        false
    }

    /// Fails unless `actual < bound`.
    #[track_caller]
    pub fn less_than<T: PartialOrd + Debug>(&self, actual: &T, bound: &T) -> bool {
        if actual < bound {
            return true;
        }
        self.record(
            format!("< {bound:?}"),
            format!("{actual:?}"),
            format!("Expected {actual:?} to be less than {bound:?}."),
        );
        false
    }

    /// Fails when `actual > bound`.
    #[track_caller]
    pub fn not_greater_than<T: PartialOrd + Debug>(&self, actual: &T, bound: &T) -> bool {
        if actual.partial_cmp(bound) != Some(Ordering::Greater) {
            return true;
        }
        self.record(
            format!("<= {bound:?}"),
            format!("{actual:?}"),
            format!("Expected {actual:?} not to be greater than {bound:?}."),
        );
        false
    }

    /// Fails when `actual < bound`.
    #[track_caller]
    pub fn not_less_than<T: PartialOrd + Debug>(&self, actual: &T, bound: &T) -> bool {
        if actual.partial_cmp(bound) != Some(Ordering::Less) {
            return true;
        }
        self.record(
            format!(">= {bound:?}"),
            format!("{actual:?}"),
            format!("Expected {actual:?} not to be less than {bound:?}."),
        );
        false
    }

    /// Records an unconditional failure.
    #[track_caller]
    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.record("no failure", message.clone(), message);
    }

    /// Snapshot of the failures recorded so far.
    pub fn failures(&self) -> Vec<AssertionFailure> {
        let Ok(state) = self.inner.lock() else {
            return Vec::new();
        };
        state.failures.clone()
    }

    /// Whether the owning case has already been resolved.
    pub fn is_sealed(&self) -> bool {
        self.inner.lock().is_ok_and(|state| state.sealed)
    }

    /// Seal the accumulator and take its failures.
    ///
    /// Only the first call returns failures; later assertions are ignored.
    pub(crate) fn seal(&self) -> Vec<AssertionFailure> {
        let Ok(mut state) = self.inner.lock() else {
            return Vec::new();
        };
        if state.sealed {
            return Vec::new();
        }
        state.sealed = true;
        mem::take(&mut state.failures)
    }

    #[track_caller]
    fn record(
        &self,
        expected: impl Into<String>,
        actual: impl Into<String>,
        message: impl Into<String>,
    ) {
        let caller = Location::caller();
        let failure = AssertionFailure {
            expected: expected.into(),
            actual: actual.into(),
            message: message.into(),
            location: format!("{}:{}:{}", caller.file(), caller.line(), caller.column()),
        };

        let Ok(mut state) = self.inner.lock() else {
            return;
        };
        if state.sealed {
            tracing::debug!("Ignoring assertion after case resolved: {}", failure.message);
            return;
        }
        state.failures.push(failure);
    }
}
