//! User interaction prompts and colored output macros
//!
//! ERROR HANDLING STRATEGY FOR DECORATIVE I/O:
//! All termcolor operations use `let _ =` to deliberately ignore errors.
//! Colored output is decorative and non-essential. If stderr/stdout is unavailable
//! (broken pipe, no TTY, etc.), the program continues without colors.

use crate::error::{Result, SetupError};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use termcolor::{BufferWriter, Color, ColorChoice, ColorSpec, WriteColor};

/// Print a warning in yellow on stderr
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {{
        use std::io::Write as _;
        use termcolor::WriteColor as _;
        let bufwtr = termcolor::BufferWriter::stderr(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Yellow)));
        let _ = write!(&mut buffer, "⚠️  ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print an error in red on stderr
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {{
        use std::io::Write as _;
        use termcolor::WriteColor as _;
        let bufwtr = termcolor::BufferWriter::stderr(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Red)));
        let _ = write!(&mut buffer, "❌ ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print a success message in green on stdout
#[macro_export]
macro_rules! success {
    ($($arg:tt)*) => {{
        use std::io::Write as _;
        use termcolor::WriteColor as _;
        let bufwtr = termcolor::BufferWriter::stdout(termcolor::ColorChoice::Auto);
        let mut buffer = bufwtr.buffer();
        let _ = buffer.set_color(termcolor::ColorSpec::new().set_fg(Some(termcolor::Color::Green)));
        let _ = write!(&mut buffer, "✓ ");
        let _ = buffer.reset();
        let _ = writeln!(&mut buffer, $($arg)*);
        let _ = bufwtr.print(&buffer);
    }};
}

/// Print bold blue instructions ahead of an interactive OpenSSL step
pub fn step(lines: &[&str]) {
    let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Blue)).set_bold(true));
    for line in lines {
        let _ = writeln!(&mut buffer, "{line}");
    }
    let _ = buffer.reset();
    let _ = bufwtr.print(&buffer);
}

/// Expand a leading `~` to `home`.
///
/// `~user` forms are left untouched; they fail later as nonexistent paths.
pub fn expand_tilde_path(input: &str, home: &Path) -> String {
    shellexpand::tilde_with_context(input, || Some(home.to_string_lossy())).into_owned()
}

/// Unbuffered handle on this process's standard input.
///
/// `std::io::stdin()` reads ahead into a process-wide buffer, which would
/// swallow input meant for the OpenSSL prompts that follow. Reading through a
/// duplicate of the descriptor leaves everything past the answer in place for
/// the child.
pub fn terminal_input() -> Result<std::fs::File> {
    #[cfg(unix)]
    let handle = {
        use std::os::fd::AsFd;
        io::stdin().as_fd().try_clone_to_owned()?
    };

    #[cfg(windows)]
    let handle = {
        use std::os::windows::io::AsHandle;
        io::stdin().as_handle().try_clone_to_owned()?
    };

    Ok(std::fs::File::from(handle))
}

/// Read one line a byte at a time, so nothing past the newline is consumed.
///
/// Returns `None` on EOF before any byte was read.
fn read_answer<R: Read>(input: &mut R) -> Result<Option<String>> {
    let mut bytes = Vec::new();
    let mut byte = [0u8; 1];

    loop {
        match input.read(&mut byte) {
            Ok(0) if bytes.is_empty() => return Ok(None),
            Ok(0) => break,
            Ok(_) if byte[0] == b'\n' => break,
            Ok(_) => bytes.push(byte[0]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(Some(String::from_utf8_lossy(&bytes).into_owned()))
}

/// Prompt for the CA directory until an existing directory is given.
///
/// Features:
/// - Warns that everything inside the directory will be removed
/// - Expands `~` to `home` and shows the expanded path if it changed
/// - Resolves the answer to a canonical absolute path (symlinks followed)
/// - Re-prompts on empty input, unresolvable paths and non-directories
/// - "q", "quit" or EOF cancel with [`SetupError::Cancelled`]
///
/// Blocks on `input`; async callers run it on a blocking thread.
pub fn prompt_for_ca_directory<R: Read>(input: &mut R, home: &Path) -> Result<PathBuf> {
    let bufwtr = BufferWriter::stdout(ColorChoice::Auto);
    let mut buffer = bufwtr.buffer();
    let _ = writeln!(
        &mut buffer,
        "What directory would you like to use to store the CA certificate and keys?"
    );
    let _ = write!(&mut buffer, "The directory should exist ");
    let _ = buffer.set_color(ColorSpec::new().set_fg(Some(Color::Red)).set_bold(true));
    let _ = write!(&mut buffer, "and any files in it will be removed");
    let _ = buffer.reset();
    let _ = writeln!(&mut buffer, ".");
    let _ = bufwtr.print(&buffer);

    loop {
        print!("> ");
        io::stdout().flush()?;

        // EOF (Ctrl+D)
        let Some(line) = read_answer(input)? else {
            println!();
            return Err(SetupError::Cancelled);
        };

        let answer = line.trim();

        if answer.eq_ignore_ascii_case("q") || answer.eq_ignore_ascii_case("quit") {
            return Err(SetupError::Cancelled);
        }

        if answer.is_empty() {
            error!("You must specify an existing directory.");
            println!("   Enter 'q' to cancel setup");
            continue;
        }

        let expanded = expand_tilde_path(answer, home);
        if expanded != answer {
            println!("   → {expanded}");
        }

        let resolved = match std::fs::canonicalize(&expanded) {
            Ok(path) => path,
            Err(e) => {
                tracing::debug!(path = %expanded, error = %e, "could not resolve directory");
                error!("You must specify an existing directory.");
                continue;
            }
        };

        if !resolved.is_dir() {
            error!("You must specify an existing directory.");
            continue;
        }

        return Ok(resolved);
    }
}
