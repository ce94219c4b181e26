//! # Default request-loop settings
//!
//! These constants are the values the client uses when nothing else is
//! configured. They describe a client that greets `World` on
//! `server-service:50051` every ten seconds, forever, giving each call one
//! second to answer.

use core::time::Duration;

/// Address of the greeter server, resolved through the environment's DNS
/// (e.g. a container network service name).
pub const DEFAULT_SERVER_ADDR: &str = "server-service:50051";

/// Name sent in every `HelloRequest`.
pub const DEFAULT_NAME: &str = "World";

/// Deadline applied to each `SayHello` call.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// Deadline applied to establishing the initial connection.
pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Delay between consecutive attempts.
pub const DEFAULT_PACING: Duration = Duration::from_secs(10);
