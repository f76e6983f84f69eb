//! Bootstrap a local two-tier certificate authority (root + intermediary)
//!
//! All cryptography is delegated to the `openssl` command line. This crate
//! sequences the OpenSSL invocations, lays out the CA directory
//! (`int.cnf`, `serial`, `crlnumber`, `index.txt`, `crl/`, `newcerts/`) and
//! records its location in `~/.selfcertbot` once setup succeeds.

#[macro_use]
pub mod prompts;

pub mod config;
pub mod error;
pub mod files;
pub mod marker;
pub mod process;
pub mod setup;
pub mod templates;
pub mod toolkit;

// Re-export common types
pub use config::SelfCertBotConfig;
pub use error::SetupError;
pub use marker::MarkerFile;
pub use setup::Setup;
