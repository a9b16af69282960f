//! Core infrastructure for callguard.
//!
//! This crate holds the vocabulary shared by every callguard component:
//! - [`Outcome`] of a single guarded call attempt
//! - [`CallCause`], the reason a fallback value was substituted
//! - [`BreakerName`], the key identifying one guarded dependency
//! - The event system used for observability

pub mod error;
pub mod events;
mod outcome;

pub use error::{BoxError, Panicked, SharedError};
pub use events::{EventListener, EventListeners, FnListener, GatewayEvent};
pub use outcome::{BreakerName, CallCause, Outcome};
