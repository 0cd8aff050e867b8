use core::result::Result as CoreResult;
use core::time::Duration;

use thiserror::Error;

/// Result type for harness operations.
pub type Result<T> = CoreResult<T, HarnessError>;

/// Errors raised while registering or driving a suite.
///
/// Assertion failures and faults inside case bodies are not errors at this
/// level; they end up in the [`Report`](crate::Report).
#[derive(Debug, Error)]
pub enum HarnessError {
    /// A group was registered with an empty name.
    #[error("Group name must not be empty")]
    EmptyGroupName,

    /// A case was registered with an empty name.
    #[error("Case name must not be empty (group '{group}')")]
    EmptyCaseName {
        /// Full name of the group the case was registered in
        group: String,
    },

    /// A settle predicate did not hold before its ceiling elapsed.
    #[error("Condition not met within {}ms", .0.as_millis())]
    SettleTimeout(Duration),
}
