//! Root + intermediary CA setup workflow
//!
//! The run is strictly sequential and stops at the first failing step. Nothing
//! is rolled back: a failed run leaves a partially provisioned workspace that
//! the user clears before retrying. The marker file is written last, so it
//! only exists after every step succeeded.

use crate::config::SERIAL_START;
use crate::error::{Result, SetupError};
use crate::files::{clear_directory, ensure_directory, set_mode};
use crate::marker::MarkerFile;
use crate::process::Executor;
use crate::prompts::{prompt_for_ca_directory, step};
use crate::templates::{intermediate_config, INTERMEDIATE_CONFIG_FILE};
use crate::toolkit::Toolkit;
use std::io::Read;
use std::path::{Path, PathBuf};

pub const ROOT_KEY: &str = "ca.key";
pub const ROOT_CERT: &str = "ca.pem";
pub const INTERMEDIATE_KEY: &str = "int.key";
pub const INTERMEDIATE_CSR: &str = "int.csr";
pub const INTERMEDIATE_CERT: &str = "int.pem";
pub const CHAIN_CERT: &str = "chain.pem";
pub const SERIAL_FILE: &str = "serial";
pub const CRL_NUMBER_FILE: &str = "crlnumber";
pub const INDEX_FILE: &str = "index.txt";
pub const CRL_DIR: &str = "crl";
pub const NEW_CERTS_DIR: &str = "newcerts";

/// Private keys end up owner-read-only
const KEY_MODE: u32 = 0o400;

/// The chain is world-readable, writable by nobody
const CHAIN_MODE: u32 = 0o444;

/// One-shot CA setup for a user profile
#[derive(Debug, Clone)]
pub struct Setup {
    home: PathBuf,
    marker: MarkerFile,
    toolkit: PathBuf,
}

impl Setup {
    /// Setup rooted at `home`, driving the toolkit binary `toolkit`
    pub fn new(home: impl Into<PathBuf>, toolkit: impl Into<PathBuf>) -> Self {
        let home = home.into();
        Self {
            marker: MarkerFile::in_home(&home),
            home,
            toolkit: toolkit.into(),
        }
    }

    /// Setup for the current user's home directory
    pub fn for_current_user(toolkit: impl Into<PathBuf>) -> Result<Self> {
        let home = dirs::home_dir().ok_or(SetupError::HomeDirectory)?;
        Ok(Self::new(home, toolkit))
    }

    pub fn marker(&self) -> &MarkerFile {
        &self.marker
    }

    /// Run the full setup, reading the directory answer from `input`.
    ///
    /// Only the answer line is consumed from `input`, and `input` is dropped
    /// before the first OpenSSL step so the child process owns the terminal.
    /// Pass [`crate::prompts::terminal_input`] for the real terminal.
    ///
    /// # Returns
    /// * `Ok(PathBuf)` - Canonical CA workspace path, now recorded in the marker
    /// * `Err(SetupError::AlreadyConfigured)` - Marker exists; nothing touched
    pub async fn run<R: Read + Send + 'static>(&self, mut input: R) -> Result<PathBuf> {
        if self.marker.exists().await {
            return Err(SetupError::AlreadyConfigured(self.marker.path().to_path_buf()));
        }

        let toolkit = Toolkit::locate(&self.toolkit)?;
        let version = toolkit.version(&Executor::new(&self.home)).await?;
        success!("Found: {version}");

        let home = self.home.clone();
        let workspace = tokio::task::spawn_blocking(move || {
            let answer = prompt_for_ca_directory(&mut input, &home);
            drop(input);
            answer
        })
        .await
        .map_err(|e| SetupError::Other(e.into()))??;
        tracing::debug!(workspace = %workspace.display(), "selected CA workspace");

        println!("Please wait, checking directory...");
        clear_directory(&workspace).await?;
        success!("Let's begin!");

        provision(&toolkit, &workspace).await?;

        self.marker.write(&workspace).await?;
        tracing::debug!(marker = %self.marker.path().display(), "setup recorded");

        Ok(workspace)
    }
}

/// Generate keys and certificates and lay out CA state in `workspace`.
async fn provision(toolkit: &Toolkit, workspace: &Path) -> Result<()> {
    let executor = Executor::new(workspace);

    step(&[
        "First, we need to generate an RSA private key for the Root CA Certificate.",
        "The next prompt is to enter a password for this key. Pick a good one and remember it!",
    ]);
    toolkit.generate_key(&executor, ROOT_KEY).await?;

    step(&[
        "Next up, we need to generate an RSA private key for the Intermediary CA Certificate.",
        "The next prompt is to enter a password for this key. Pick a good one and remember it!",
    ]);
    toolkit.generate_key(&executor, INTERMEDIATE_KEY).await?;

    step(&[
        "Now for the Root CA Certificate itself.",
        "You will be asked for the root key's password, then for the certificate's subject.",
    ]);
    toolkit
        .self_signed_certificate(&executor, ROOT_KEY, ROOT_CERT)
        .await?;

    step(&[
        "Next, a signing request for the Intermediary CA Certificate.",
        "You will be asked for the intermediary key's password, then for its subject.",
    ]);
    toolkit
        .signing_request(&executor, INTERMEDIATE_KEY, INTERMEDIATE_CSR)
        .await?;

    write_state_files(workspace).await?;

    tokio::fs::write(
        workspace.join(INTERMEDIATE_CONFIG_FILE),
        intermediate_config(workspace),
    )
    .await?;

    step(&[
        "Finally, the Root CA signs the Intermediary CA Certificate.",
        "You will be asked for the root key's password and to confirm signing.",
    ]);
    toolkit
        .sign_intermediate(&executor, INTERMEDIATE_CONFIG_FILE, INTERMEDIATE_CSR, INTERMEDIATE_CERT)
        .await?;

    assemble_chain(workspace).await?;
    tighten_permissions(workspace).await?;

    success!("CA created in {}", workspace.display());
    Ok(())
}

/// Serial and CRL counters, the certificate database and its directories
async fn write_state_files(workspace: &Path) -> Result<()> {
    tokio::fs::write(workspace.join(SERIAL_FILE), SERIAL_START).await?;
    tokio::fs::write(workspace.join(CRL_NUMBER_FILE), SERIAL_START).await?;
    ensure_directory(workspace.join(CRL_DIR)).await?;
    ensure_directory(workspace.join(NEW_CERTS_DIR)).await?;
    tokio::fs::write(workspace.join(INDEX_FILE), "").await?;
    Ok(())
}

/// `chain.pem` = intermediary certificate followed by the root certificate
async fn assemble_chain(workspace: &Path) -> Result<()> {
    let mut chain = tokio::fs::read(workspace.join(INTERMEDIATE_CERT)).await?;
    chain.extend(tokio::fs::read(workspace.join(ROOT_CERT)).await?);
    tokio::fs::write(workspace.join(CHAIN_CERT), chain).await?;
    Ok(())
}

async fn tighten_permissions(workspace: &Path) -> Result<()> {
    let mut entries = tokio::fs::read_dir(workspace).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if entry.file_type().await?.is_file() && path.extension().is_some_and(|ext| ext == "key") {
            set_mode(&path, KEY_MODE).await?;
        }
    }

    set_mode(&workspace.join(CHAIN_CERT), CHAIN_MODE).await
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use std::collections::BTreeSet;
    use std::io::Cursor;
    use std::os::unix::fs::PermissionsExt;

    /// Input that must never be read
    struct Untouched;

    impl Read for Untouched {
        fn read(&mut self, _buf: &mut [u8]) -> std::io::Result<usize> {
            panic!("setup read input before its preconditions passed");
        }
    }

    /// Stand-in for openssl: writes "<subcommand> <file>" to every `-out`
    /// target, and exits 1 instead when the target is `fail_on`.
    fn fake_toolkit(dir: &Path, fail_on: Option<&str>) -> PathBuf {
        let fail = fail_on
            .map(|f| format!("if [ \"$out\" = \"{f}\" ]; then echo 'simulated failure' >&2; exit 1; fi\n"))
            .unwrap_or_default();
        let script = format!(
            "#!/bin/sh\n\
             sub=\"$1\"\n\
             out=\"\"\n\
             while [ $# -gt 0 ]; do\n\
               if [ \"$1\" = \"-out\" ]; then out=\"$2\"; fi\n\
               shift\n\
             done\n\
             if [ \"$sub\" = \"version\" ]; then echo 'OpenSSL 3.0.0 (fake)'; exit 0; fi\n\
             {fail}\
             if [ -n \"$out\" ]; then printf '%s %s\\n' \"$sub\" \"$out\" > \"$out\"; fi\n\
             exit 0\n"
        );
        let path = dir.join("fake-openssl");
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn entries(dir: &Path) -> BTreeSet<String> {
        std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect()
    }

    fn mode(path: &Path) -> u32 {
        std::fs::metadata(path).unwrap().permissions().mode() & 0o777
    }

    struct Fixture {
        home: tempfile::TempDir,
        tools: tempfile::TempDir,
        workspace: PathBuf,
    }

    fn fixture() -> Fixture {
        let home = tempfile::tempdir().unwrap();
        let tools = tempfile::tempdir().unwrap();
        let workspace = home.path().join("ca");
        std::fs::create_dir(&workspace).unwrap();
        Fixture {
            home,
            tools,
            workspace,
        }
    }

    #[tokio::test]
    async fn full_run_lays_out_workspace() {
        let fx = fixture();
        let setup = Setup::new(fx.home.path(), fake_toolkit(fx.tools.path(), None));
        let input = Cursor::new(format!("{}\n", fx.workspace.display()));

        let workspace = setup.run(input).await.unwrap();
        let canonical = fx.workspace.canonicalize().unwrap();
        assert_eq!(workspace, canonical);

        let expected: BTreeSet<String> = [
            "ca.key", "int.key", "ca.pem", "int.pem", "int.csr", "chain.pem", "serial",
            "crlnumber", "index.txt", "int.cnf", "crl", "newcerts",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        assert_eq!(entries(&canonical), expected);

        assert_eq!(std::fs::read_to_string(canonical.join("serial")).unwrap(), "1000");
        assert_eq!(std::fs::read_to_string(canonical.join("crlnumber")).unwrap(), "1000");
        assert_eq!(std::fs::read_to_string(canonical.join("index.txt")).unwrap(), "");
        assert!(entries(&canonical.join("crl")).is_empty());
        assert!(entries(&canonical.join("newcerts")).is_empty());

        let int_pem = std::fs::read_to_string(canonical.join("int.pem")).unwrap();
        let ca_pem = std::fs::read_to_string(canonical.join("ca.pem")).unwrap();
        assert_eq!(int_pem, "ca int.pem\n");
        assert_eq!(
            std::fs::read_to_string(canonical.join("chain.pem")).unwrap(),
            format!("{int_pem}{ca_pem}")
        );

        assert_eq!(mode(&canonical.join("ca.key")), 0o400);
        assert_eq!(mode(&canonical.join("int.key")), 0o400);
        assert_eq!(mode(&canonical.join("chain.pem")), 0o444);

        let marker = std::fs::read_to_string(fx.home.path().join(".selfcertbot")).unwrap();
        assert_eq!(marker, canonical.to_string_lossy());
    }

    #[tokio::test]
    async fn existing_marker_fails_before_prompting() {
        let fx = fixture();
        std::fs::write(fx.home.path().join(".selfcertbot"), "/elsewhere").unwrap();
        std::fs::write(fx.workspace.join("keep.txt"), "keep").unwrap();
        let setup = Setup::new(fx.home.path(), fake_toolkit(fx.tools.path(), None));

        let err = setup.run(Untouched).await.unwrap_err();

        assert!(matches!(err, SetupError::AlreadyConfigured(_)));
        assert_eq!(entries(&fx.workspace), BTreeSet::from(["keep.txt".to_string()]));
        assert_eq!(
            std::fs::read_to_string(fx.home.path().join(".selfcertbot")).unwrap(),
            "/elsewhere"
        );
    }

    #[tokio::test]
    async fn preexisting_files_are_cleared() {
        let fx = fixture();
        std::fs::write(fx.workspace.join("stale.pem"), "old").unwrap();
        std::fs::write(fx.workspace.join("notes.txt"), "old").unwrap();
        let setup = Setup::new(fx.home.path(), fake_toolkit(fx.tools.path(), None));

        let workspace = setup
            .run(Cursor::new(format!("{}\n", fx.workspace.display())))
            .await
            .unwrap();

        let names = entries(&workspace);
        assert!(!names.contains("stale.pem"));
        assert!(!names.contains("notes.txt"));
    }

    #[tokio::test]
    async fn subdirectory_in_workspace_aborts_before_generation() {
        let fx = fixture();
        std::fs::create_dir(fx.workspace.join("nested")).unwrap();
        let setup = Setup::new(fx.home.path(), fake_toolkit(fx.tools.path(), None));

        let err = setup
            .run(Cursor::new(format!("{}\n", fx.workspace.display())))
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::Io(_)));
        assert!(!fx.workspace.join("ca.key").exists());
        assert!(!fx.home.path().join(".selfcertbot").exists());
    }

    #[tokio::test]
    async fn toolkit_failure_aborts_without_rollback() {
        let fx = fixture();
        let setup = Setup::new(fx.home.path(), fake_toolkit(fx.tools.path(), Some("int.pem")));

        let err = setup
            .run(Cursor::new(format!("{}\n", fx.workspace.display())))
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::CommandExecution(_)));
        assert!(!fx.home.path().join(".selfcertbot").exists());

        let names = entries(&fx.workspace);
        for kept in ["ca.key", "int.key", "ca.pem", "int.csr", "serial", "int.cnf"] {
            assert!(names.contains(kept), "{kept} should remain");
        }
        assert!(!names.contains("int.pem"));
        assert!(!names.contains("chain.pem"));
    }

    #[tokio::test]
    async fn first_step_failure_leaves_only_cleared_workspace() {
        let fx = fixture();
        let setup = Setup::new(fx.home.path(), fake_toolkit(fx.tools.path(), Some("ca.key")));

        let err = setup
            .run(Cursor::new(format!("{}\n", fx.workspace.display())))
            .await
            .unwrap_err();

        assert!(matches!(err, SetupError::CommandExecution(_)));
        assert!(entries(&fx.workspace).is_empty());
        assert!(!fx.home.path().join(".selfcertbot").exists());
    }

    #[tokio::test]
    async fn config_dir_is_canonical_for_tilde_answer() {
        let fx = fixture();
        let link = fx.home.path().join("ca-link");
        std::os::unix::fs::symlink(&fx.workspace, &link).unwrap();
        let setup = Setup::new(fx.home.path(), fake_toolkit(fx.tools.path(), None));

        let workspace = setup.run(Cursor::new("~/ca-link\n")).await.unwrap();

        let canonical = fx.workspace.canonicalize().unwrap();
        assert_eq!(workspace, canonical);
        let cnf = std::fs::read_to_string(canonical.join("int.cnf")).unwrap();
        assert!(cnf.contains(&format!("dir                         = {}\n", canonical.display())));
    }

    #[tokio::test]
    async fn missing_toolkit_fails_before_prompting() {
        let fx = fixture();
        let setup = Setup::new(fx.home.path(), "selfcertbot-no-such-openssl");

        let err = setup.run(Untouched).await.unwrap_err();

        assert!(matches!(err, SetupError::MissingDependency(_)));
    }
}
