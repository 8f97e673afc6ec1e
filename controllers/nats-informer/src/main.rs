//! NATS Informer
//!
//! Watches Kubernetes resources on request and republishes every add,
//! update and delete onto a NATS topic.
//!
//! `POST /watch` with `{"group", "version", "resource", "namespace"}` returns
//! the topic (`k8s[.<group>].<version>.<resource>[.<namespace>]`) to
//! subscribe to; the watch itself starts in the background.

mod config;
mod controller;
mod error;

use crate::config::Config;
use crate::error::InformerError;
use controller::Controller;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), InformerError> {
    let config = Config::from_env()?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        debug!("rustls crypto provider already installed");
    }

    info!("Starting NATS informer");
    info!("Configuration:");
    info!("  In-cluster: {}", config.in_cluster);
    info!("  Server address: {}", config.server_address);
    info!("  NATS URL: {}", config.nats_url);
    info!("  Log level: {}", config.log_level);

    let controller = Controller::new(&config).await?;
    controller.run().await?;

    Ok(())
}
