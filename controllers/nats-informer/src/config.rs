//! Process configuration from environment variables.
//!
//! | Variable         | Default                 |
//! |------------------|-------------------------|
//! | `IN_CLUSTER`     | `true`                  |
//! | `SERVER_ADDRESS` | `:8080`                 |
//! | `NATS_URL`       | `nats://localhost:4222` |
//! | `LOG_LEVEL`      | `info`                  |

use std::net::SocketAddr;

use crate::error::InformerError;

const DEFAULT_SERVER_ADDRESS: &str = ":8080";
const DEFAULT_NATS_URL: &str = "nats://localhost:4222";
const DEFAULT_LOG_LEVEL: &str = "info";
const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Settings read once at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Use the pod's service account instead of a kubeconfig file
    pub in_cluster: bool,
    /// Gateway listen address
    pub server_address: SocketAddr,
    /// NATS server URL
    pub nats_url: String,
    /// Default log level when `RUST_LOG` is unset
    pub log_level: String,
}

impl Config {
    /// Load from the process environment.
    pub fn from_env() -> Result<Self, InformerError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load using `lookup` to read variables.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, InformerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let in_cluster = match lookup("IN_CLUSTER") {
            Some(value) => parse_bool("IN_CLUSTER", &value)?,
            None => true,
        };

        let address = lookup("SERVER_ADDRESS").unwrap_or_else(|| DEFAULT_SERVER_ADDRESS.to_string());
        let server_address = parse_address(&address)?;

        let nats_url = lookup("NATS_URL").unwrap_or_else(|| DEFAULT_NATS_URL.to_string());
        if nats_url.trim().is_empty() {
            return Err(InformerError::InvalidConfig("NATS_URL must not be empty".to_string()));
        }

        let log_level = lookup("LOG_LEVEL")
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string())
            .to_lowercase();
        if !LOG_LEVELS.contains(&log_level.as_str()) {
            return Err(InformerError::InvalidConfig(format!(
                "LOG_LEVEL must be one of {}, got {:?}",
                LOG_LEVELS.join(", "),
                log_level
            )));
        }

        Ok(Self {
            in_cluster,
            server_address,
            nats_url,
            log_level,
        })
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool, InformerError> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        other => Err(InformerError::InvalidConfig(format!(
            "{key} must be a boolean, got {other:?}"
        ))),
    }
}

/// Parse a listen address; `:port` listens on all interfaces.
fn parse_address(value: &str) -> Result<SocketAddr, InformerError> {
    let value = value.trim();
    let full = if value.starts_with(':') {
        format!("0.0.0.0{value}")
    } else {
        value.to_string()
    };
    full.parse()
        .map_err(|e| InformerError::InvalidConfig(format!("SERVER_ADDRESS {value:?}: {e}")))
}
