//! Error types for the greeter client.
//!
//! This module defines the central `Error` enum. Two kinds of failure exist:
//!
//! - **Fatal**: the client could not be set up. The process reports the cause
//!   once and exits non-zero.
//!   - `InvalidEndpoint`: the configured address is not a valid URI.
//!   - `Connect`: the initial channel connect failed.
//! - **Per-attempt**: a single `SayHello` call failed. The request loop logs it
//!   and carries on with the next attempt.
//!   - `Timeout`: no reply arrived within the per-attempt deadline.
//!   - `Call`: the transport or the remote side returned an error status.

use core::time::Duration;
use tonic::{Code, Status};

pub type Result<T> = core::result::Result<T, Error>;

/// Unified error type for the greeter client.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The configured server address could not be parsed into a URI.
    #[error("Invalid endpoint `{endpoint}`: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },

    /// The initial connection to the server could not be established.
    #[error("Failed to connect to {endpoint}: {source}")]
    Connect {
        endpoint: String,
        #[source]
        source: tonic::transport::Error,
    },

    /// The call did not complete before its deadline.
    #[error("Request timed out after {0:?}")]
    Timeout(Duration),

    /// The call failed with a gRPC status (transport or remote error).
    #[error("Call failed: {code:?}: {message}", code = .0.code(), message = .0.message())]
    Call(Status),
}

impl Error {
    /// Returns `true` for errors that prevent the client from running at all.
    ///
    /// Per-attempt errors return `false`: the request loop survives them.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Error::InvalidEndpoint { .. } | Error::Connect { .. })
    }

    /// Returns `true` when the attempt failed because its deadline elapsed,
    /// whether the local timer or the server's `DEADLINE_EXCEEDED` fired first.
    pub fn is_timeout(&self) -> bool {
        match self {
            Error::Timeout(_) => true,
            Error::Call(status) => status.code() == Code::DeadlineExceeded,
            _ => false,
        }
    }

    /// Maps a gRPC status returned by a call, classifying deadline failures as
    /// [`Error::Timeout`].
    pub fn from_status(status: Status, timeout: Duration) -> Self {
        if status.code() == Code::DeadlineExceeded {
            Error::Timeout(timeout)
        } else {
            Error::Call(status)
        }
    }
}

impl From<Status> for Error {
    fn from(status: Status) -> Self {
        Error::Call(status)
    }
}
