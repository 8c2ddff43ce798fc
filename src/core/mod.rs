//! Core types shared across tfvercheck.
//!
//! Currently this is the error system: [`VercheckError`] for typed failures
//! inside the library, and [`ErrorContext`] / [`user_friendly_error`] for
//! turning whatever reached `main` into a message with a suggestion.

pub mod error;

pub use error::{ErrorContext, VercheckError, user_friendly_error};
