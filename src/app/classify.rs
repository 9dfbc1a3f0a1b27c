//! Failure classification for lifecycle operations
//!
//! Every operation returns an explicit [`Result`], so a caller can always tell
//! "no matches" from "the service could not be reached". Callers that prefer
//! the lenient policy (log the failure and carry on with an empty or absent
//! result) opt in per call through [`Recover`]. Caller misuse is never
//! swallowed: usage and value errors propagate through both adapters.

use tracing::{error, warn};

use crate::errors::{AppError, Result};

/// What the client does with a failed operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// The caller broke a precondition; surface the error
    Raise,
    /// The service or network failed; may be reported as an empty result
    Report,
}

/// Decides how a failure should be handled
pub fn classify(err: &AppError) -> Disposition {
    if err.is_recoverable() {
        Disposition::Report
    } else {
        Disposition::Raise
    }
}

/// Converts recoverable failures into empty or absent results
pub trait Recover<T> {
    /// Recoverable failures become `T::default()` (an empty list for searches)
    fn or_empty(self, operation: &str) -> Result<T>
    where
        T: Default;

    /// Recoverable failures become `None` (an absent handle or status)
    fn or_absent(self, operation: &str) -> Result<Option<T>>;
}

impl<T> Recover<T> for Result<T> {
    fn or_empty(self, operation: &str) -> Result<T>
    where
        T: Default,
    {
        self.or_absent(operation).map(Option::unwrap_or_default)
    }

    fn or_absent(self, operation: &str) -> Result<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(err) => match classify(&err) {
                Disposition::Report => {
                    report(operation, &err);
                    Ok(None)
                }
                Disposition::Raise => Err(err),
            },
        }
    }
}

fn report(operation: &str, err: &AppError) {
    match err.status_code() {
        Some(status) => error!(
            operation,
            status,
            category = err.category(),
            "{operation} failed, reporting empty result: {err}"
        ),
        None => warn!(
            operation,
            category = err.category(),
            "{operation} failed, reporting empty result: {err}"
        ),
    }
}
