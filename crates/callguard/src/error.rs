use callguard_fallback::FallbackFailed;
use thiserror::Error;

/// Errors that escape [`Gateway::invoke`](crate::Gateway::invoke).
///
/// Rejections, operation failures and timeouts are all resolved into a
/// [`CallResult::Fallback`](crate::CallResult::Fallback); only a failing
/// fallback reaches the caller.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum GatewayError {
    /// The fallback could not produce a value.
    #[error(transparent)]
    FallbackFailed(#[from] FallbackFailed),
}

impl GatewayError {
    /// Returns the fallback failure, if that is what this is.
    pub fn as_fallback_failed(&self) -> Option<&FallbackFailed> {
        match self {
            GatewayError::FallbackFailed(err) => Some(err),
        }
    }
}
