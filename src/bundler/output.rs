//! Persisting the packaged payload.

use crate::bundler::error::{ErrorExt, Result};
use std::path::Path;
use tokio::fs;

/// Writes `contents` to `path`, creating parent directories as needed.
///
/// Any existing file is truncated first, so a shorter payload never leaves
/// trailing bytes from an earlier, longer one.
pub async fn write_output(path: &Path, contents: &[u8]) -> Result<()> {
    if path.is_dir() {
        crate::bail!("output path {} is a directory", path.display());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .await
            .fs_context("creating output directory", parent)?;
    }
    fs::write(path, contents)
        .await
        .fs_context("writing output", path)?;
    log::info!("Wrote {} bytes to {}", contents.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn overwrites_longer_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("_worker.bundle");

        write_output(&path, b"a much longer first payload").await.unwrap();
        write_output(&path, b"short").await.unwrap();

        assert_eq!(std::fs::read(&path).unwrap(), b"short");
    }

    #[tokio::test]
    async fn refuses_to_replace_a_directory() {
        let dir = tempfile::tempdir().unwrap();
        assert!(write_output(dir.path(), b"payload").await.is_err());
    }
}
