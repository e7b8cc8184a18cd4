//! Renderer configuration
//!
//! Where the sysconfig renderer places its output, relative to the target
//! root it is handed.

pub mod loader;
pub mod paths;

pub use loader::load_config;
pub use paths::SysconfigPaths;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default sysconfig directory (relative to the target root)
pub const DEFAULT_SYSCONF_DIR: &str = "etc/sysconfig";

/// Default persistent net naming rules path
pub const DEFAULT_NETRULES_PATH: &str = "etc/udev/rules.d/70-persistent-net.rules";

/// Default resolv.conf path
pub const DEFAULT_DNS_PATH: &str = "etc/resolv.conf";

/// Sysconfig renderer settings
///
/// Missing keys fall back to the defaults; an explicit `null` for
/// `netrules_path` or `dns_path` disables that output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    pub sysconf_dir: PathBuf,
    pub netrules_path: Option<PathBuf>,
    pub dns_path: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            sysconf_dir: PathBuf::from(DEFAULT_SYSCONF_DIR),
            netrules_path: Some(PathBuf::from(DEFAULT_NETRULES_PATH)),
            dns_path: Some(PathBuf::from(DEFAULT_DNS_PATH)),
        }
    }
}

impl RendererConfig {
    /// Parse renderer config from YAML
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml)
    }
}
