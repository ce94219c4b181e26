#![doc = include_str!("../README.md")]

mod common;
pub use common::*;

/// gRPC service and message definitions generated from
/// `proto/helloworld.proto`.
///
/// - [`greeter_client::GreeterClient`](proto::greeter_client::GreeterClient) -
///   typed client stub used by the request loop.
/// - [`greeter_server::Greeter`](proto::greeter_server::Greeter) - service
///   trait, used by in-process test servers.
pub mod proto {
    tonic::include_proto!("helloworld");
}
