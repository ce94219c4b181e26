#![doc = include_str!("../README.md")]

mod client;

use clap::Parser;
use client::config::{CliArgs, ClientConfig};
use client::driver::{LoopPolicy, RequestLoop};
use client::greeter::GrpcGreeter;
use client::telemetry::init_telemetry;

#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = ClientConfig::try_from(args)?;

    let providers = init_telemetry()?;
    log_startup_info(&config);

    // The only fatal failure once configured: report it once and exit non-zero
    // before any attempt is made.
    let greeter = GrpcGreeter::connect(&config).await?;

    let mut request_loop = RequestLoop::from_config(greeter, &config);
    request_loop.run().await;

    providers.shutdown();
    Ok(())
}

fn log_startup_info(config: &ClientConfig) {
    if cfg!(debug_assertions) {
        tracing::debug!("Starting greeter client with full config: {:#?}", config);
    }

    let attempts = match config.policy {
        LoopPolicy::Unbounded => String::from("unbounded"),
        LoopPolicy::Bounded(n) => n.to_string(),
    };
    tracing::info!(
        "Greeting {} as {:?} every {:?} (timeout {:?}, attempts {}, compression {}, tls {})",
        config.endpoint,
        config.name,
        config.pacing,
        config.request_timeout,
        attempts,
        config.compression,
        config.tls,
    );
}
