//! Network configuration renderers
//!
//! Converts [`NetworkState`] to distribution configuration files.
//!
//! Supported renderers:
//! - `sysconfig` - RHEL-family `/etc/sysconfig/network-scripts`

pub mod sysconfig;

use crate::SysconfigError;
use crate::network::NetworkState;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub use sysconfig::SysconfigRenderer;

/// Default permissions of rendered files
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Trait for network configuration renderers
pub trait Renderer {
    /// Render network state to files rooted at `target`
    fn render(
        &self,
        state: &NetworkState,
        target: &Path,
    ) -> Result<Vec<RenderedFile>, SysconfigError>;

    /// Short renderer name, for logging
    fn name(&self) -> &'static str;
}

/// A rendered configuration file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedFile {
    /// Full path, already under the target root
    pub path: PathBuf,
    /// File contents
    pub content: String,
    /// File permissions (octal)
    pub mode: u32,
}

impl RenderedFile {
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
            mode: DEFAULT_FILE_MODE,
        }
    }
}

/// Render `state` with `renderer` and write the result under `target`
///
/// Every file is rendered before the first one is written, so a rendering
/// error leaves the target untouched.
pub async fn apply_network_config(
    renderer: &dyn Renderer,
    state: &NetworkState,
    target: &Path,
) -> Result<Vec<PathBuf>, SysconfigError> {
    info!("Using network renderer: {}", renderer.name());

    let files = renderer.render(state, target)?;

    let mut written = Vec::with_capacity(files.len());
    for file in &files {
        debug!("Writing network config: {}", file.path.display());

        if let Some(parent) = file.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        tokio::fs::write(&file.path, &file.content).await?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&file.path, std::fs::Permissions::from_mode(file.mode))
                .await?;
        }

        written.push(file.path.clone());
    }

    info!("Wrote {} network configuration files", written.len());
    Ok(written)
}
