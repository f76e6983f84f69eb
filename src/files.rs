//! Filesystem probes and workspace file helpers

use crate::error::Result;
use std::path::Path;

/// True when `path` exists and is a regular file. Access errors read as `false`.
pub async fn is_existing_file(path: impl AsRef<Path>) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_file())
        .unwrap_or(false)
}

/// True when `path` exists and is a directory. Access errors read as `false`.
pub async fn is_existing_directory(path: impl AsRef<Path>) -> bool {
    tokio::fs::metadata(path)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false)
}

/// Create `path` unless it is already a directory.
///
/// Fails if `path` exists as something other than a directory.
pub async fn ensure_directory(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if is_existing_directory(path).await {
        return Ok(());
    }

    tokio::fs::create_dir(path).await?;
    Ok(())
}

/// Unlink every entry directly inside `dir`.
///
/// Only plain unlink is attempted, so a subdirectory makes this fail.
/// Entries removed before the failure stay removed.
pub async fn clear_directory(dir: &Path) -> Result<()> {
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        tracing::debug!(path = %entry.path().display(), "removing");
        tokio::fs::remove_file(entry.path()).await?;
    }
    Ok(())
}

/// Restrict a file to the given Unix mode (e.g. `0o400`).
///
/// On other platforms only the read-only flag is set.
pub async fn set_mode(path: &Path, mode: u32) -> Result<()> {
    #[cfg(unix)]
    let permissions = {
        use std::os::unix::fs::PermissionsExt;
        std::fs::Permissions::from_mode(mode)
    };

    #[cfg(not(unix))]
    let permissions = {
        let mut permissions = tokio::fs::metadata(path).await?.permissions();
        permissions.set_readonly(mode & 0o222 == 0);
        permissions
    };

    tokio::fs::set_permissions(path, permissions).await?;
    Ok(())
}
