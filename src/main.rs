use anyhow::Result;
use clap::{Parser, Subcommand};
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};
use tracing_subscriber::EnvFilter;

use selfcertbot::files::is_existing_directory;
use selfcertbot::prompts::terminal_input;
use selfcertbot::{error, warn};
use selfcertbot::{MarkerFile, SelfCertBotConfig, Setup, SetupError};

// ============================================================================
// ERROR HANDLING STRATEGY
// ============================================================================
//
// CRITICAL I/O - Errors propagated with `?` operator:
//   • File operations inside the CA directory and on ~/.selfcertbot
//   • User input: the directory prompt
//   • External processes: every openssl invocation
//
// DECORATIVE I/O - Errors ignored with `let _ =`:
//   • Terminal coloring: buffer.set_color(), writeln!(), bufwtr.print()
//
// Any propagated error is printed in red and the process exits with 1.
// ============================================================================

#[derive(Parser)]
#[command(name = "selfcertbot")]
#[command(version, about = "Create and manage a local root + intermediary certificate authority")]
struct Cli {
    /// Verbose diagnostics (overrides RUST_LOG)
    #[arg(long, short = 'v', global = true)]
    verbose: bool,

    /// Path to config file (TOML)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    /// OpenSSL binary to use (defaults to `openssl` on PATH)
    #[arg(long, global = true)]
    openssl: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Perform initial set-up (create the root and intermediary CA certificates)
    Setup,

    /// Show the configured CA directory
    Show,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<SetupError>() {
                Some(SetupError::Cancelled) => println!("Setup cancelled by user."),
                _ => error!("{e}"),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let mut config = match &cli.config {
        Some(path) => SelfCertBotConfig::load(path).await?,
        None => SelfCertBotConfig::default(),
    };
    if let Some(openssl) = cli.openssl {
        config.openssl = openssl;
    }
    config.verbose |= cli.verbose;

    init_tracing(config.verbose);
    tracing::debug!(?config, "configuration loaded");

    match cli.command {
        Some(Command::Setup) => run_setup(&config).await,
        Some(Command::Show) => show_config().await,
        None => {
            let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
            let mut buffer = bufwtr.buffer();
            // Informational output - errors ignored (see module-level docs)
            let _ = writeln!(&mut buffer, "No command specified. Running setup...\n");
            let _ = bufwtr.print(&buffer);
            run_setup(&config).await
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("selfcertbot=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

async fn run_setup(config: &SelfCertBotConfig) -> Result<()> {
    let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    // Welcome banner - errors ignored (see module-level docs)
    let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true));
    let _ = writeln!(&mut buffer, "Welcome to SelfCertBot!");
    let _ = buffer.reset();
    let _ = writeln!(&mut buffer, "{}", "=".repeat(60));
    let _ = writeln!(&mut buffer);
    let _ = bufwtr.print(&buffer);

    let setup = Setup::for_current_user(&config.openssl)?;
    let workspace = setup.run(terminal_input()?).await?;

    let mut buffer = bufwtr.buffer();
    let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Green)));
    let _ = writeln!(&mut buffer, "\n✅ Setup complete!");
    let _ = buffer.reset();
    let _ = writeln!(&mut buffer, "   CA directory: {}", workspace.display());
    let _ = writeln!(&mut buffer, "   Recorded in:  {}", setup.marker().path().display());
    let _ = bufwtr.print(&buffer);

    Ok(())
}

async fn show_config() -> Result<()> {
    let marker = MarkerFile::locate()?;
    let workspace = marker.read_ca_workspace().await?;

    println!("{}", workspace.display());

    if !is_existing_directory(&workspace).await {
        warn!(
            "{} no longer exists. Remove {} and run `selfcertbot setup` again.",
            workspace.display(),
            marker.path().display()
        );
    }

    Ok(())
}
