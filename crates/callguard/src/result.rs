use callguard_core::CallCause;

/// Result of a guarded call that did not need to fail.
///
/// Either the operation's own value, or a substitute produced by the
/// fallback together with the reason the real value was unavailable.
#[derive(Debug, Clone)]
pub enum CallResult<T> {
    /// The operation succeeded within the deadline.
    Ok(T),
    /// The call was rejected, failed or timed out; `value` came from the fallback.
    Fallback { value: T, cause: CallCause },
}

impl<T> CallResult<T> {
    /// Returns true if the value is a substitute.
    pub fn is_fallback(&self) -> bool {
        matches!(self, CallResult::Fallback { .. })
    }

    /// The value, real or substituted.
    pub fn value(&self) -> &T {
        match self {
            CallResult::Ok(value) | CallResult::Fallback { value, .. } => value,
        }
    }

    /// Consumes the result, returning the value whatever its origin.
    pub fn into_value(self) -> T {
        match self {
            CallResult::Ok(value) | CallResult::Fallback { value, .. } => value,
        }
    }

    /// Why the fallback was used, if it was.
    pub fn cause(&self) -> Option<&CallCause> {
        match self {
            CallResult::Ok(_) => None,
            CallResult::Fallback { cause, .. } => Some(cause),
        }
    }

    /// Maps the value, keeping the cause.
    pub fn map<U, F>(self, f: F) -> CallResult<U>
    where
        F: FnOnce(T) -> U,
    {
        match self {
            CallResult::Ok(value) => CallResult::Ok(f(value)),
            CallResult::Fallback { value, cause } => CallResult::Fallback {
                value: f(value),
                cause,
            },
        }
    }
}
