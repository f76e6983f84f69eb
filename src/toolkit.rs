//! OpenSSL invocations used during setup
//!
//! All key generation, certificate requests and signing are delegated to the
//! `openssl` command line. Every step except the version probe is run
//! interactively so OpenSSL can ask for passphrases and subject fields.

use crate::config::{
    INTERMEDIATE_EXTENSIONS, INTERMEDIATE_VALIDITY_DAYS, KEY_BITS, KEY_CIPHER, ROOT_EXTENSIONS,
    SIGNING_DIGEST,
};
use crate::error::{Result, SetupError};
use crate::process::Executor;
use std::path::{Path, PathBuf};

/// Installation instructions for a missing toolkit
const OPENSSL_INSTALL_INSTRUCTIONS: &str = "\
OpenSSL not found. Install with your package manager:

Ubuntu/Debian:  sudo apt-get install openssl
Fedora/RHEL:    sudo dnf install openssl
Arch Linux:     sudo pacman -S openssl
macOS:          brew install openssl

Or point selfcertbot at an existing binary with --openssl <PATH>.";

#[derive(Debug, Clone)]
pub struct Toolkit {
    program: PathBuf,
}

impl Toolkit {
    /// Resolve `program` on `PATH` (or as a path).
    ///
    /// # Returns
    /// * `Err(SetupError::MissingDependency)` - No such executable
    pub fn locate(program: &Path) -> Result<Self> {
        let program = which::which(program)
            .map_err(|_| SetupError::MissingDependency(OPENSSL_INSTALL_INSTRUCTIONS.to_string()))?;
        tracing::debug!(program = %program.display(), "resolved toolkit");
        Ok(Self { program })
    }

    /// First line of `openssl version`, for display
    pub async fn version(&self, executor: &Executor) -> Result<String> {
        let out = executor.command(&self.program, &["version"]).await?;
        Ok(out.lines().next().unwrap_or("OpenSSL").trim().to_string())
    }

    /// Generate a passphrase-protected RSA key at `out`
    pub async fn generate_key(&self, executor: &Executor, out: &str) -> Result<()> {
        executor
            .process(&self.program, &["genrsa", KEY_CIPHER, "-out", out, KEY_BITS])
            .await
    }

    /// Create the self-signed root certificate
    pub async fn self_signed_certificate(&self, executor: &Executor, key: &str, out: &str) -> Result<()> {
        executor
            .process(
                &self.program,
                &["req", "-new", "-x509", "-extensions", ROOT_EXTENSIONS, "-key", key, "-out", out],
            )
            .await
    }

    /// Create a certificate signing request for `key`
    pub async fn signing_request(&self, executor: &Executor, key: &str, out: &str) -> Result<()> {
        executor
            .process(&self.program, &["req", "-new", "-key", key, "-out", out])
            .await
    }

    /// Sign the intermediary request with the root CA described by `config`
    pub async fn sign_intermediate(
        &self,
        executor: &Executor,
        config: &str,
        csr: &str,
        out: &str,
    ) -> Result<()> {
        executor
            .process(
                &self.program,
                &[
                    "ca",
                    "-config",
                    config,
                    "-extensions",
                    INTERMEDIATE_EXTENSIONS,
                    "-days",
                    INTERMEDIATE_VALIDITY_DAYS,
                    "-md",
                    SIGNING_DIGEST,
                    "-in",
                    csr,
                    "-out",
                    out,
                ],
            )
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_toolkit_reports_install_instructions() {
        let err = Toolkit::locate(Path::new("selfcertbot-no-such-openssl")).unwrap_err();
        match err {
            SetupError::MissingDependency(msg) => assert!(msg.contains("--openssl")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn version_reads_first_line() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = dir.path().join("fake-openssl");
        std::fs::write(&script, "#!/bin/sh\necho 'OpenSSL 3.0.13 30 Jan 2024'\necho extra\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let toolkit = Toolkit::locate(&script).unwrap();
        let version = toolkit.version(&Executor::new(dir.path())).await.unwrap();
        assert_eq!(version, "OpenSSL 3.0.13 30 Jan 2024");
    }
}
