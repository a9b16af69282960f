use callguard_core::{BreakerName, CallCause, SharedError};
use thiserror::Error;

/// A fallback could not produce a substitute value.
///
/// This is the only failure the gateway lets escape to callers.
#[derive(Debug, Clone, Error)]
#[error("fallback for '{name}' failed ({cause}): {source}")]
pub struct FallbackFailed {
    name: BreakerName,
    cause: CallCause,
    source: SharedError,
}

impl FallbackFailed {
    pub(crate) fn new(name: BreakerName, cause: CallCause, source: SharedError) -> Self {
        Self {
            name,
            cause,
            source,
        }
    }

    /// Dependency whose call was being replaced.
    pub fn name(&self) -> &BreakerName {
        &self.name
    }

    /// Why the fallback was invoked in the first place.
    pub fn cause(&self) -> &CallCause {
        &self.cause
    }

    /// The error raised by the fallback.
    pub fn fallback_error(&self) -> &SharedError {
        &self.source
    }
}
