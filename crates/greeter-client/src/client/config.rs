use crate::client::driver::LoopPolicy;
use anyhow::bail;
use clap::{Parser, ValueEnum};
use core::{fmt, time::Duration};
use greeter_core::types::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_NAME, DEFAULT_PACING, DEFAULT_REQUEST_TIMEOUT,
    DEFAULT_SERVER_ADDR,
};
use tonic::codec::CompressionEncoding;

/// Runtime configuration for the `greeter-client` binary.
///
/// All values are parsed from CLI arguments or environment variables. The
/// defaults reproduce a client that greets `World` on `server-service:50051`
/// every ten seconds until it is stopped.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "greeter-client",
    version,
    about = "Calls Greeter.SayHello in a paced loop and logs every attempt"
)]
pub struct CliArgs {
    /// Address of the greeter server.
    ///
    /// Either a full URI (`http://host:port`) or a bare `host:port`, in which
    /// case the scheme is derived from `--tls`.
    ///
    /// Environment variable: `SERVER_ADDR`
    #[arg(long, env = "SERVER_ADDR", default_value_t = String::from(DEFAULT_SERVER_ADDR))]
    pub server_addr: String,

    /// Name sent in every `HelloRequest`.
    ///
    /// Environment variable: `GREETER_NAME`
    #[arg(long, env = "GREETER_NAME", default_value_t = String::from(DEFAULT_NAME))]
    pub name: String,

    /// Deadline for each `SayHello` call, in milliseconds.
    ///
    /// The deadline is sent to the server as `grpc-timeout` and also enforced
    /// locally, so an unresponsive server fails the attempt on time.
    ///
    /// Environment variable: `REQUEST_TIMEOUT_MS`
    #[arg(long, env = "REQUEST_TIMEOUT_MS", default_value_t = DEFAULT_REQUEST_TIMEOUT.as_millis() as u64)]
    pub timeout_ms: u64,

    /// Deadline for establishing the initial connection, in milliseconds.
    ///
    /// Environment variable: `CONNECT_TIMEOUT_MS`
    #[arg(long, env = "CONNECT_TIMEOUT_MS", default_value_t = DEFAULT_CONNECT_TIMEOUT.as_millis() as u64)]
    pub connect_timeout_ms: u64,

    /// Delay between consecutive attempts, in milliseconds.
    ///
    /// Applied after every attempt except the last one of a bounded run,
    /// whether the attempt succeeded or not.
    ///
    /// Environment variable: `PACING_MS`
    #[arg(long, env = "PACING_MS", default_value_t = DEFAULT_PACING.as_millis() as u64)]
    pub pacing_ms: u64,

    /// Stop after this many attempts. Runs forever when unset.
    ///
    /// Environment variable: `MAX_ATTEMPTS`
    #[arg(long, env = "MAX_ATTEMPTS")]
    pub max_attempts: Option<u64>,

    /// Compression applied to requests and accepted on responses.
    ///
    /// Environment variable: `GREETER_COMPRESSION`
    #[arg(long, env = "GREETER_COMPRESSION", value_enum, default_value_t = Compression::None)]
    pub compression: Compression,

    /// Connect over TLS using the platform's native root certificates.
    ///
    /// Requires the `tls` feature.
    ///
    /// Environment variable: `GREETER_TLS`
    #[arg(long, env = "GREETER_TLS", default_value_t = false)]
    pub tls: bool,
}

/// gRPC message compression.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Compression {
    #[default]
    None,
    Deflate,
    Gzip,
    Zstd,
}

impl Compression {
    /// The tonic encoding to negotiate, or `None` for uncompressed messages.
    pub fn encoding(self) -> Option<CompressionEncoding> {
        match self {
            Compression::None => None,
            Compression::Deflate => Some(CompressionEncoding::Deflate),
            Compression::Gzip => Some(CompressionEncoding::Gzip),
            Compression::Zstd => Some(CompressionEncoding::Zstd),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::None => write!(f, "none"),
            Compression::Deflate => write!(f, "deflate"),
            Compression::Gzip => write!(f, "gzip"),
            Compression::Zstd => write!(f, "zstd"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server URI, always carrying a scheme.
    pub endpoint: String,
    pub name: String,
    pub request_timeout: Duration,
    pub connect_timeout: Duration,
    pub pacing: Duration,
    pub policy: LoopPolicy,
    pub compression: Compression,
    pub tls: bool,
}

impl TryFrom<CliArgs> for ClientConfig {
    type Error = anyhow::Error;

    fn try_from(args: CliArgs) -> Result<Self, Self::Error> {
        let server_addr = args.server_addr.trim();
        if server_addr.is_empty() {
            bail!("SERVER_ADDR must not be empty");
        }

        if args.name.is_empty() {
            bail!("GREETER_NAME must not be empty");
        }

        if args.timeout_ms == 0 {
            bail!("REQUEST_TIMEOUT_MS must be greater than 0");
        }

        if args.connect_timeout_ms == 0 {
            bail!("CONNECT_TIMEOUT_MS must be greater than 0");
        }

        #[cfg(not(feature = "tls"))]
        if args.tls {
            bail!("GREETER_TLS requires the client to be built with the `tls` feature");
        }

        let policy = match args.max_attempts {
            None => LoopPolicy::Unbounded,
            Some(0) => bail!("MAX_ATTEMPTS must be greater than 0 when set"),
            Some(n) => LoopPolicy::Bounded(n),
        };

        Ok(Self {
            endpoint: normalize_endpoint(server_addr, args.tls),
            name: args.name,
            request_timeout: Duration::from_millis(args.timeout_ms),
            connect_timeout: Duration::from_millis(args.connect_timeout_ms),
            pacing: Duration::from_millis(args.pacing_ms),
            policy,
            compression: args.compression,
            tls: args.tls,
        })
    }
}

/// Prefixes a bare `host:port` with the scheme matching the transport.
fn normalize_endpoint(addr: &str, tls: bool) -> String {
    if addr.contains("://") {
        addr.to_owned()
    } else if tls {
        format!("https://{addr}")
    } else {
        format!("http://{addr}")
    }
}
