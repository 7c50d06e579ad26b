//! Common utility functions for the command line application.

use anyhow::{Context, Result, bail};
use std::path::{Path, PathBuf};

/// Initialize the logger with the specified configuration.
///
/// # Arguments
/// * `log_level` - Log level string (off, error, warn, info, debug, trace)
/// * `log_file` - Optional path to log file (logs to stderr if None)
///
/// # Errors
/// Returns an error if the log file cannot be opened or logger initialization fails.
pub fn init_logger(log_level: &str, log_file: Option<&PathBuf>) -> Result<()> {
    use std::io::Write;

    let level = log_level.parse::<log::LevelFilter>().unwrap_or_else(|_| {
        eprintln!("Invalid log level '{}', defaulting to 'info'", log_level);
        log::LevelFilter::Info
    });

    let mut builder = env_logger::Builder::new();
    builder.filter_level(level);
    builder.format(|buf, record| {
        writeln!(
            buf,
            "{} [{}] - {}",
            chrono::Local::now().format("%Y-%m-%d %H:%M:%S%.3f"),
            record.level(),
            record.args()
        )
    });

    if let Some(log_path) = log_file {
        ensure_parent_dir(log_path)?;
        let target = Box::new(
            std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(log_path)
                .with_context(|| format!("opening log file '{}'", log_path.display()))?,
        );
        builder.target(env_logger::Target::Pipe(target));
    }

    builder.try_init()?;
    Ok(())
}

/// Validate that an input log exists and is a regular file.
pub fn validate_input_file(input: &Path) -> Result<()> {
    if !input.exists() {
        bail!("Input path '{}' does not exist.", input.display());
    }
    if !input.is_file() {
        bail!("Input path '{}' is not a file.", input.display());
    }
    Ok(())
}

/// Create the parent directory of `path` if it has one and it is missing.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    Ok(())
}
