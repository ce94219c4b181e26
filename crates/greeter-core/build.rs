/// Builds the gRPC client and server code for the `helloworld.proto`
/// definition using `tonic-prost-build`.
///
/// The client stub is what the request loop drives. The server half is
/// generated as well so tests can stand up an in-process `Greeter` without a
/// separate binary.
///
/// # Files and Paths
///
/// - Proto file: `proto/helloworld.proto`
/// - Includes: `proto/`
///
/// # Panics
///
/// This function will `panic!` if code generation fails.
///
/// # Output
///
/// Generated code is exposed as [`greeter_core::proto`]:
///
/// ```rust
/// pub mod proto {
///     tonic::include_proto!("helloworld");
/// }
/// ```
fn main() {
    println!("cargo:rerun-if-changed=proto/helloworld.proto");

    tonic_prost_build::configure()
        .build_client(true)
        .build_server(true)
        .compile_protos(&["proto/helloworld.proto"], &["proto"])
        .unwrap();
}
