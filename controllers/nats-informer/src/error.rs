//! Startup error types.
//!
//! Everything here is fatal: the process exits nonzero rather than running
//! without a cluster connection or a bus.

use bus_client::BusError;
use kube::Error as KubeError;
use thiserror::Error;

/// Errors that can occur while bootstrapping the informer.
#[derive(Debug, Error)]
pub enum InformerError {
    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// Cluster credentials could not be loaded
    #[error("Kubernetes config error: {0}")]
    KubeConfig(String),

    /// Kubernetes client error
    #[error("Kubernetes error: {0}")]
    Kube(#[from] KubeError),

    /// Message bus error
    #[error("NATS error: {0}")]
    Bus(#[from] BusError),

    /// Listener error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
