//! Shared primitives for tiergate feature crates

mod error;

pub use error::{HttpError, error_envelope};
