use crate::error::SharedError;
use std::borrow::Borrow;
use std::fmt;
use std::sync::Arc;

/// The classified result of one guarded call attempt.
///
/// Produced exactly once per attempt by the call executor and fed to the
/// circuit breaker. Retries are not modelled: an attempt succeeds, fails, or
/// times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Outcome {
    /// The operation completed within its deadline without an error.
    Success,
    /// The operation completed within its deadline with an error.
    Failure,
    /// The deadline elapsed before the operation completed.
    Timeout,
}

impl Outcome {
    /// Returns `true` for [`Outcome::Success`].
    pub fn is_success(self) -> bool {
        matches!(self, Outcome::Success)
    }

    /// Returns `true` for outcomes counted against the failure ratio
    /// (`Failure` and `Timeout`).
    pub fn is_failure(self) -> bool {
        !self.is_success()
    }

    /// Lower-case label used in events, logs and metric labels.
    pub fn as_str(self) -> &'static str {
        match self {
            Outcome::Success => "success",
            Outcome::Failure => "failure",
            Outcome::Timeout => "timeout",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a fallback value was substituted for the real result.
#[derive(Debug, Clone)]
pub enum CallCause {
    /// The circuit breaker refused the call; the operation never ran.
    Rejected,
    /// The operation returned an error.
    Failure(SharedError),
    /// The operation did not finish before the call timeout.
    Timeout,
}

impl CallCause {
    /// Returns `true` if the breaker rejected the call.
    pub fn is_rejected(&self) -> bool {
        matches!(self, CallCause::Rejected)
    }

    /// Returns `true` if the operation itself failed.
    pub fn is_failure(&self) -> bool {
        matches!(self, CallCause::Failure(_))
    }

    /// Returns `true` if the call timed out.
    pub fn is_timeout(&self) -> bool {
        matches!(self, CallCause::Timeout)
    }

    /// The operation error, if this cause is a failure.
    pub fn error(&self) -> Option<&SharedError> {
        match self {
            CallCause::Failure(err) => Some(err),
            _ => None,
        }
    }

    /// The recorded outcome that led here; `None` when no attempt was made.
    pub fn outcome(&self) -> Option<Outcome> {
        match self {
            CallCause::Rejected => None,
            CallCause::Failure(_) => Some(Outcome::Failure),
            CallCause::Timeout => Some(Outcome::Timeout),
        }
    }

    /// Lower-case label used in events, logs and metric labels.
    pub fn as_str(&self) -> &'static str {
        match self {
            CallCause::Rejected => "rejected",
            CallCause::Failure(_) => "failure",
            CallCause::Timeout => "timeout",
        }
    }
}

impl fmt::Display for CallCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallCause::Rejected => write!(f, "call rejected by open circuit"),
            CallCause::Failure(err) => write!(f, "call failed: {}", err),
            CallCause::Timeout => write!(f, "call timed out"),
        }
    }
}

/// Stable identifier of one guarded dependency, e.g. a logical service name.
///
/// Cheap to clone. Lookups can borrow it as `&str`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BreakerName(Arc<str>);

impl BreakerName {
    /// Creates a breaker name.
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self(name.into())
    }

    /// Returns the name as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BreakerName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl Borrow<str> for BreakerName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for BreakerName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for BreakerName {
    fn from(name: &str) -> Self {
        Self(Arc::from(name))
    }
}

impl From<String> for BreakerName {
    fn from(name: String) -> Self {
        Self(Arc::from(name))
    }
}

impl From<&BreakerName> for BreakerName {
    fn from(name: &BreakerName) -> Self {
        name.clone()
    }
}
