/*!
CLI bootstrap for the data-plane service: parses arguments,
installs structured logging, builds the tenant registry and reference
plugins, then waits for a shutdown signal. Serving requests over an
actual transport (gRPC/HTTP) is out of scope for this crate; a
transport binding would hold onto the [`bootstrap::Components`] this
binary builds and drive the adapters in `data-core::adapters` from its
own request loop.
*/

mod bootstrap;
mod cli;
mod error;

use clap::Parser;
use cli::Cli;
use error::Error;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), Error> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(cli.log_level.clone()))
        .init();

    let config = bootstrap::load_config(&cli.config)?;
    let components = bootstrap::build(config).await?;

    tracing::info!(
        tenants = components.registry.tenant_count().await,
        codecs = components.codecs.len(),
        "data-service ready; no transport attached in this build"
    );

    tokio::signal::ctrl_c()
        .await
        .expect("failed to install ctrl-c handler");
    tracing::info!("shutdown signal received");
    components.registry.shutdown().await;

    Ok(())
}
