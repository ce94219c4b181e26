//! Client-side building blocks of the `greeter-client` binary.
//!
//! ## Structure
//!
//! - [`config`] - CLI/environment configuration and validation.
//! - [`greeter`] - The `SayHello` capability and its tonic implementation.
//! - [`driver`] - The paced request loop.
//! - [`telemetry`] - Log output and optional OpenTelemetry export.

pub mod config;
pub mod driver;
pub mod greeter;
pub mod telemetry;
