//! Error types shared across callguard crates.
//!
//! Guarded operations may fail with any error type. The gateway erases those
//! into a [`SharedError`] so the failure can travel inside a
//! [`CallCause`](crate::CallCause), be cloned into events, and still be
//! inspected by a fallback.

use std::any::Any;
use std::sync::Arc;
use thiserror::Error;

/// Boxed, thread-safe error, compatible with tower's `BoxError`.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Reference-counted, thread-safe error.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync>;

/// A guarded operation or a fallback panicked.
///
/// Panics are caught at the gateway boundary and converted into this error
/// so that a misbehaving operation is recorded as a failure instead of
/// unwinding into the caller.
#[derive(Debug, Clone, Error)]
#[error("{context} panicked: {message}")]
pub struct Panicked {
    context: &'static str,
    message: String,
}

impl Panicked {
    /// Builds the error from a payload returned by `catch_unwind`.
    pub fn from_payload(context: &'static str, payload: Box<dyn Any + Send>) -> Self {
        let message = if let Some(s) = payload.downcast_ref::<&'static str>() {
            (*s).to_string()
        } else if let Some(s) = payload.downcast_ref::<String>() {
            s.clone()
        } else {
            "non-string panic payload".to_string()
        };
        Self { context, message }
    }

    /// What was running when the panic happened ("operation", "fallback").
    pub fn context(&self) -> &'static str {
        self.context
    }

    /// The panic message, if it was a string.
    pub fn message(&self) -> &str {
        &self.message
    }
}
