//! Configuration schema definitions.
//!
//! This module defines the configuration structure for the submission
//! client. All types derive Serde traits for deserialization from TOML.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SubmitConfig {
    /// Channel every transaction is submitted on.
    pub channel: String,

    /// Contract invoked by `invoke` and `query`.
    pub contract: ContractConfig,

    /// Endorsing peers, in priority order.
    pub peers: Vec<NodeConfig>,

    /// Orderers, tried in order until one accepts.
    pub orderers: Vec<NodeConfig>,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Signing identity.
    pub identity: IdentityConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Contract identification.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ContractConfig {
    pub name: String,
    pub version: String,
    /// Runtime name: golang, node, java or car.
    pub kind: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            version: "1.0".to_string(),
            kind: "golang".to_string(),
        }
    }
}

/// Address and TLS settings for one node.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NodeConfig {
    /// host:port, optionally with a scheme.
    pub address: String,

    /// PEM file with trust anchors for this node.
    #[serde(default)]
    pub tls_ca_path: Option<String>,

    /// Inline PEM trust anchors.
    #[serde(default)]
    pub tls_ca_pem: Option<String>,

    /// Certificate name to verify instead of the host in `address`.
    #[serde(default)]
    pub server_name_override: Option<String>,
}

impl NodeConfig {
    pub fn plaintext(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            tls_ca_path: None,
            tls_ca_pem: None,
            server_name_override: None,
        }
    }

    pub fn has_tls(&self) -> bool {
        self.tls_ca_path.is_some() || self.tls_ca_pem.is_some()
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on dialing a node, in seconds.
    pub connect_secs: u64,

    /// Bound on waiting for the commit event, in seconds.
    pub event_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 10,
            event_secs: 30,
        }
    }
}

impl TimeoutConfig {
    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs)
    }

    pub fn event(&self) -> Duration {
        Duration::from_secs(self.event_secs)
    }
}

/// X.509 signing identity.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct IdentityConfig {
    /// Membership service provider id.
    pub msp_id: String,

    /// PEM certificate path.
    pub cert_path: String,

    /// PKCS#8 PEM private key path. Falls back to the
    /// `LEDGER_SUBMIT_PRIVATE_KEY` environment variable when unset.
    pub key_path: Option<String>,
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Json,
    #[default]
    Pretty,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Output format.
    pub log_format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
        }
    }
}
