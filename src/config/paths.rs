//! Output paths for the sysconfig renderer
//!
//! Every path is placed under the target root, even when the configured
//! value is absolute.

use super::RendererConfig;
use crate::network::render::sysconfig::AddressFamily;
use std::path::{Path, PathBuf};

/// <scripts_dir>/ifcfg-<name>
pub fn ifcfg_path(scripts_dir: &Path, name: &str) -> PathBuf {
    scripts_dir.join(format!("ifcfg-{}", name))
}

/// <scripts_dir>/route-<name> or <scripts_dir>/route6-<name>
pub fn route_path(scripts_dir: &Path, name: &str, family: AddressFamily) -> PathBuf {
    match family {
        AddressFamily::Ipv4 => scripts_dir.join(format!("route-{}", name)),
        AddressFamily::Ipv6 => scripts_dir.join(format!("route6-{}", name)),
    }
}

/// Resolved output locations for one render
#[derive(Debug, Clone)]
pub struct SysconfigPaths {
    /// Target root directory
    pub target: PathBuf,
    config: RendererConfig,
}

impl SysconfigPaths {
    pub fn new(target: impl AsRef<Path>, config: &RendererConfig) -> Self {
        Self {
            target: target.as_ref().to_path_buf(),
            config: config.clone(),
        }
    }

    fn under_target(&self, path: &Path) -> PathBuf {
        self.target.join(path.strip_prefix("/").unwrap_or(path))
    }

    /// <target>/etc/sysconfig
    pub fn sysconf_dir(&self) -> PathBuf {
        self.under_target(&self.config.sysconf_dir)
    }

    /// <target>/etc/sysconfig/network-scripts
    pub fn network_scripts_dir(&self) -> PathBuf {
        self.sysconf_dir().join("network-scripts")
    }

    pub fn ifcfg(&self, name: &str) -> PathBuf {
        ifcfg_path(&self.network_scripts_dir(), name)
    }

    pub fn route(&self, name: &str) -> PathBuf {
        route_path(&self.network_scripts_dir(), name, AddressFamily::Ipv4)
    }

    pub fn route6(&self, name: &str) -> PathBuf {
        route_path(&self.network_scripts_dir(), name, AddressFamily::Ipv6)
    }

    /// resolv.conf, unless disabled
    pub fn dns(&self) -> Option<PathBuf> {
        self.config.dns_path.as_deref().map(|p| self.under_target(p))
    }

    /// Persistent net naming rules, unless disabled
    pub fn netrules(&self) -> Option<PathBuf> {
        self.config
            .netrules_path
            .as_deref()
            .map(|p| self.under_target(p))
    }
}
