//! Configuration and fixed parameters for CA workspace setup.

use crate::error::{Result, SetupError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Marker file, relative to the user's home directory
pub const MARKER_FILE_NAME: &str = ".selfcertbot";

/// Default external toolkit binary
pub const DEFAULT_TOOLKIT: &str = "openssl";

/// Starting value written to `serial` and `crlnumber`
pub const SERIAL_START: &str = "1000";

/// RSA key size for both CA keys
pub const KEY_BITS: &str = "4096";

/// Cipher protecting generated private keys
pub const KEY_CIPHER: &str = "-aes256";

/// Extension profile for the self-signed root certificate
pub const ROOT_EXTENSIONS: &str = "v3_ca";

/// Extension profile applied when signing the intermediary
pub const INTERMEDIATE_EXTENSIONS: &str = "v3_intermediate_ca";

/// Validity of the intermediary certificate, in days
pub const INTERMEDIATE_VALIDITY_DAYS: &str = "3600";

/// Digest used when signing the intermediary
pub const SIGNING_DIGEST: &str = "sha512";

/// Optional TOML configuration file.
///
/// ```toml
/// openssl = "/usr/local/opt/openssl@3/bin/openssl"
/// verbose = true
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SelfCertBotConfig {
    /// External toolkit binary (name on `PATH` or absolute path)
    #[serde(default = "default_toolkit")]
    pub openssl: PathBuf,

    /// Verbose diagnostics
    #[serde(default)]
    pub verbose: bool,
}

impl Default for SelfCertBotConfig {
    fn default() -> Self {
        Self {
            openssl: default_toolkit(),
            verbose: false,
        }
    }
}

impl SelfCertBotConfig {
    /// Load configuration from a TOML file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = tokio::fs::read_to_string(path).await?;
        let config: Self = toml::from_str(&content)?;

        if config.openssl.as_os_str().is_empty() {
            return Err(SetupError::InvalidConfig(format!(
                "`openssl` must not be empty in {}",
                path.display()
            )));
        }

        Ok(config)
    }
}

fn default_toolkit() -> PathBuf {
    PathBuf::from(DEFAULT_TOOLKIT)
}
