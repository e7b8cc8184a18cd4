//! Renderer config loader

use super::RendererConfig;
use crate::SysconfigError;
use std::path::Path;
use tokio::fs;
use tracing::debug;

/// Load renderer config from `path`
///
/// A missing file yields the defaults; an unparsable one is an error.
pub async fn load_config(path: impl AsRef<Path>) -> Result<RendererConfig, SysconfigError> {
    let path = path.as_ref();

    if !path.exists() {
        debug!("No renderer config at {}, using defaults", path.display());
        return Ok(RendererConfig::default());
    }

    let content = fs::read_to_string(path).await?;
    let config = RendererConfig::from_yaml(&content).map_err(|e| {
        SysconfigError::Config(format!("failed to parse {}: {}", path.display(), e))
    })?;

    debug!("Loaded renderer config from {}", path.display());
    Ok(config)
}
