//! The `SayHello` capability the request loop depends on.
//!
//! [`Greeter`] is deliberately narrow: one call, one name, one deadline. The
//! production implementation, [`GrpcGreeter`], drives the tonic-generated
//! client over a single long-lived [`Channel`]. Tests substitute in-memory
//! fakes.

use crate::client::config::{ClientConfig, Compression};
use core::time::Duration;
use greeter_core::{
    Error, Result,
    proto::{HelloRequest, greeter_client::GreeterClient},
};
use tonic::{
    Request,
    transport::{Channel, Endpoint},
};

/// A remote that can be greeted.
pub trait Greeter {
    /// Sends `name` and returns the greeting message.
    ///
    /// `timeout` is the deadline for this single call. Implementations should
    /// propagate it to the remote where the transport supports it.
    fn say_hello(
        &mut self,
        name: &str,
        timeout: Duration,
    ) -> impl Future<Output = Result<String>> + Send;
}

/// [`Greeter`] backed by the generated tonic client.
///
/// Holds the only connection the process opens. Cloning the inner client is
/// cheap, but the request loop never needs to: the same channel serves every
/// attempt, including those that follow a timeout.
#[derive(Debug, Clone)]
pub struct GrpcGreeter {
    client: GreeterClient<Channel>,
}

impl GrpcGreeter {
    /// Eagerly connects to the configured endpoint.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidEndpoint`] if the address is not a valid URI.
    /// - [`Error::Connect`] if the connection cannot be established within the
    ///   connect timeout.
    ///
    /// Both are fatal.
    pub async fn connect(config: &ClientConfig) -> Result<Self> {
        let endpoint = Endpoint::from_shared(config.endpoint.clone())
            .map_err(|e| Error::InvalidEndpoint {
                endpoint: config.endpoint.clone(),
                reason: e.to_string(),
            })?
            .connect_timeout(config.connect_timeout);

        #[cfg(feature = "tls")]
        let endpoint = if config.tls {
            endpoint
                .tls_config(tonic::transport::ClientTlsConfig::new().with_native_roots())
                .map_err(|source| Error::Connect {
                    endpoint: config.endpoint.clone(),
                    source,
                })?
        } else {
            endpoint
        };

        let channel = endpoint.connect().await.map_err(|source| Error::Connect {
            endpoint: config.endpoint.clone(),
            source,
        })?;

        Ok(Self::new(channel, config.compression))
    }

    /// Wraps an already connected channel.
    pub fn new(channel: Channel, compression: Compression) -> Self {
        let client = GreeterClient::new(channel);
        let client = match compression.encoding() {
            Some(encoding) => client
                .send_compressed(encoding)
                .accept_compressed(encoding),
            None => client,
        };
        Self { client }
    }
}

impl Greeter for GrpcGreeter {
    async fn say_hello(&mut self, name: &str, timeout: Duration) -> Result<String> {
        let mut request = Request::new(HelloRequest {
            name: name.to_owned(),
        });
        // Sent as `grpc-timeout` so the server can give up too; the local
        // timer covers servers that ignore it.
        request.set_timeout(timeout);

        let reply = tokio::time::timeout(timeout, self.client.say_hello(request))
            .await
            .map_err(|_| Error::Timeout(timeout))?
            .map_err(|status| Error::from_status(status, timeout))?;

        Ok(reply.into_inner().message)
    }
}
