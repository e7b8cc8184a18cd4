//! Error types for cloud-init-sysconfig

use thiserror::Error;

/// Main error type for sysconfig rendering
///
/// Every variant is fatal to the render that raised it; no files are
/// written once one of these has been returned.
#[derive(Error, Debug)]
pub enum SysconfigError {
    #[error("Unknown subnet type '{subnet_type}' found for interface '{interface}'")]
    UnknownSubnetType {
        subnet_type: String,
        interface: String,
    },

    #[error("Duplicate declaration of default route found for interface '{interface}'")]
    DuplicateDefaultRoute { interface: String },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Interface '{name}' referenced by '{referenced_by}' does not exist")]
    UnknownInterface { name: String, referenced_by: String },

    #[error("resolv.conf error: {0}")]
    ResolvConf(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parsing error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
}

impl SysconfigError {
    /// Create an unknown subnet type error
    pub fn unknown_subnet(subnet_type: impl Into<String>, interface: impl Into<String>) -> Self {
        Self::UnknownSubnetType {
            subnet_type: subnet_type.into(),
            interface: interface.into(),
        }
    }

    /// Create a dangling interface reference error
    pub fn unknown_interface(name: impl Into<String>, referenced_by: impl Into<String>) -> Self {
        Self::UnknownInterface {
            name: name.into(),
            referenced_by: referenced_by.into(),
        }
    }
}
