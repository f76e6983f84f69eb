//! The `~/.selfcertbot` marker file.
//!
//! Its presence means setup has completed; its content is the absolute path
//! of the CA workspace. It is written once at the end of a successful setup
//! and never modified afterwards. Removing it is left to the user.

use crate::config::MARKER_FILE_NAME;
use crate::error::{Result, SetupError};
use crate::files::is_existing_file;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct MarkerFile {
    path: PathBuf,
}

impl MarkerFile {
    /// Marker file inside `home`
    pub fn in_home(home: &Path) -> Self {
        Self {
            path: home.join(MARKER_FILE_NAME),
        }
    }

    /// Marker file in the current user's home directory
    pub fn locate() -> Result<Self> {
        let home = dirs::home_dir().ok_or(SetupError::HomeDirectory)?;
        Ok(Self::in_home(&home))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub async fn exists(&self) -> bool {
        is_existing_file(&self.path).await
    }

    /// Read the recorded CA workspace path.
    ///
    /// The returned path is not checked: the directory may have been removed
    /// since setup ran.
    pub async fn read_ca_workspace(&self) -> Result<PathBuf> {
        if !self.exists().await {
            return Err(SetupError::NotConfigured(self.path.clone()));
        }

        let content = tokio::fs::read_to_string(&self.path).await?;
        Ok(PathBuf::from(content))
    }

    /// Record `workspace` as the CA workspace. The path is the whole content.
    pub async fn write(&self, workspace: &Path) -> Result<()> {
        tokio::fs::write(&self.path, workspace.as_os_str().as_encoded_bytes()).await?;
        Ok(())
    }
}
