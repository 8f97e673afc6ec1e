//! Main controller implementation.
//!
//! This module contains the `Controller` struct that wires the Kubernetes
//! client, the NATS publisher and the watch gateway together.

use crate::config::Config;
use crate::error::InformerError;
use bus_client::{NatsPublisher, Publisher};
use kube::config::KubeConfigOptions;
use kube::Client;
use std::sync::Arc;
use tracing::{error, info, warn};
use watch_bridge::{KubeDiscovery, KubeWatchSource, Orchestrator, Resolver, Server};

/// Owns every long-lived handle of the process.
#[derive(Debug)]
pub struct Controller {
    server: Server,
    publisher: Arc<NatsPublisher>,
}

impl Controller {
    /// Connects to the cluster and the bus, failing fast on either.
    pub async fn new(config: &Config) -> Result<Self, InformerError> {
        info!("Initializing NATS informer");

        let kube_config = if config.in_cluster {
            let kube_config = kube::Config::incluster().map_err(|e| {
                InformerError::KubeConfig(format!("error building in-cluster config: {e}"))
            })?;
            info!("Using in-cluster Kubernetes config");
            kube_config
        } else {
            let kube_config = kube::Config::from_kubeconfig(&KubeConfigOptions::default())
                .await
                .map_err(|e| InformerError::KubeConfig(format!("error loading kubeconfig: {e}")))?;
            info!("Using kubeconfig from default location");
            kube_config
        };
        let kube_client = connect_kube(kube_config).await?;

        let publisher = Arc::new(NatsPublisher::connect(&config.nats_url).await.map_err(|e| {
            error!("Failed to connect to NATS at {}: {}", config.nats_url, e);
            InformerError::Bus(e)
        })?);

        let orchestrator = Orchestrator::new(
            Resolver::new(Arc::new(KubeDiscovery::new(kube_client.clone()))),
            Arc::new(KubeWatchSource::new(kube_client)),
            Arc::clone(&publisher) as Arc<dyn Publisher>,
        );

        let server = Server::new(config.server_address, Arc::new(orchestrator));

        Ok(Self { server, publisher })
    }

    /// Serves watch requests until SIGINT or SIGTERM.
    pub async fn run(self) -> Result<(), InformerError> {
        info!("NATS informer running");

        self.server.run(shutdown_signal()).await?;

        // Messages published just before shutdown may still be buffered
        if let Err(e) = self.publisher.flush().await {
            warn!("Failed to flush NATS connection on shutdown: {}", e);
        }

        info!("NATS informer stopped");
        Ok(())
    }
}

/// Build a client and prove the API server accepts its credentials.
async fn connect_kube(kube_config: kube::Config) -> Result<Client, InformerError> {
    let cluster_url = kube_config.cluster_url.clone();
    let client = Client::try_from(kube_config)?;

    let version = client.apiserver_version().await.map_err(|e| {
        error!("Failed to reach Kubernetes API server at {}: {}", cluster_url, e);
        InformerError::Kube(e)
    })?;
    info!("Connected to Kubernetes API server {}", version.git_version);

    Ok(client)
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => info!("Received ctrl-c, shutting down"),
        () = terminate => info!("Received SIGTERM, shutting down"),
    }
}
