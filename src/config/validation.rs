//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Every node address must parse as a URI authority
//! - Timeouts must be non-zero
//! - A server name override needs trust anchors to apply to
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SubmitConfig → Result<(), Vec<ValidationError>>

use std::fmt;

use crate::config::schema::{NodeConfig, SubmitConfig};

/// One semantic problem, located by a dotted field path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: String,
    pub message: String,
}

impl ValidationError {
    fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a parsed configuration.
pub fn validate_config(config: &SubmitConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.channel.trim().is_empty() {
        errors.push(ValidationError::new("channel", "must not be empty"));
    }
    if config.contract.name.trim().is_empty() {
        errors.push(ValidationError::new("contract.name", "must not be empty"));
    }

    if config.peers.is_empty() {
        errors.push(ValidationError::new("peers", "at least one peer is required"));
    }
    if config.orderers.is_empty() {
        errors.push(ValidationError::new("orderers", "at least one orderer is required"));
    }
    for (i, node) in config.peers.iter().enumerate() {
        validate_node(&format!("peers[{}]", i), node, &mut errors);
    }
    for (i, node) in config.orderers.iter().enumerate() {
        validate_node(&format!("orderers[{}]", i), node, &mut errors);
    }

    if config.timeouts.connect_secs == 0 {
        errors.push(ValidationError::new("timeouts.connect_secs", "must be greater than 0"));
    }
    if config.timeouts.event_secs == 0 {
        errors.push(ValidationError::new("timeouts.event_secs", "must be greater than 0"));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn validate_node(path: &str, node: &NodeConfig, errors: &mut Vec<ValidationError>) {
    let candidate = if node.address.contains("://") {
        node.address.clone()
    } else {
        format!("http://{}", node.address)
    };
    match url::Url::parse(&candidate) {
        Ok(url) if url.host_str().map_or(false, |h| !h.is_empty()) => {}
        Ok(_) => errors.push(ValidationError::new(
            format!("{}.address", path),
            format!("'{}' has no host", node.address),
        )),
        Err(e) => errors.push(ValidationError::new(
            format!("{}.address", path),
            format!("'{}' is not a valid address: {}", node.address, e),
        )),
    }

    if node.server_name_override.is_some() && !node.has_tls() {
        errors.push(ValidationError::new(
            format!("{}.server_name_override", path),
            "requires tls_ca_path or tls_ca_pem",
        ));
    }
}
