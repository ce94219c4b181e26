//! Shared types and error definitions used across the greeter client.
//!
//! ## Submodules
//!
//! - [`error`] - Error type separating fatal and per-attempt failures.
//! - [`types`] - Default constants for the request loop.

pub mod error;
pub mod types;

pub use error::{Error, Result};
