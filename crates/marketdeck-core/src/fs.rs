use anyhow::Result;
use std::path::Path;
use tracing::debug;

/// Reads a `.json` file from `path`.
///
/// ```rust,ignore
/// let output: DesiredType = marketdeck_core::fs::read_json(path).await?;
/// ```
pub async fn read_json<T: serde::de::DeserializeOwned>(path: impl AsRef<Path>) -> Result<T> {
    let file = tokio::fs::read(path.as_ref()).await?;
    let data: T = serde_json::from_slice(&file)?;
    Ok(data)
}

/// Writes `data` as pretty JSON to `path`, creating parent directories as necessary.
pub async fn write_json<T: serde::Serialize>(path: impl AsRef<Path>, data: &T) -> Result<()> {
    let path = path.as_ref();
    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await?;
    }

    let bytes = serde_json::to_vec_pretty(data)?;
    tokio::fs::write(path, &bytes).await?;
    debug!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}
