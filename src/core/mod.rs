//! Core types: the structured error taxonomy and its user-facing wrapper.

pub mod error;

pub use error::{ErrorContext, RepofetchError, user_friendly_error};
