//! Process-wide logging: `env_logger` writing to stderr and an append-only
//! log file that is rotated once at startup when it grows too large.

use crate::config::LogConfig;
use env_logger::{Builder, Target, WriteStyle};
use log::{debug, warn};
use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Flushes the logger when dropped. Keep it alive for the whole of `main`.
#[must_use = "dropping the guard flushes and ends file logging early"]
pub struct LogGuard {
    file: Option<PathBuf>,
}

impl LogGuard {
    /// Log file in use, if any
    pub fn file(&self) -> Option<&Path> {
        self.file.as_deref()
    }
}

impl Drop for LogGuard {
    fn drop(&mut self) {
        log::logger().flush();
    }
}

/// `<name>.1` next to `path`.
pub fn rotated_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".1");
    PathBuf::from(name)
}

/// Move `path` to [`rotated_path`] if it is larger than `max_bytes`.
///
/// Returns whether a rotation happened. A missing file is not an error.
pub fn rotate_if_needed(path: &Path, max_bytes: u64) -> io::Result<bool> {
    let len = match fs::metadata(path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };
    if len <= max_bytes {
        return Ok(false);
    }
    let target = rotated_path(path);
    if target.exists() {
        fs::remove_file(&target)?;
    }
    fs::rename(path, &target)?;
    Ok(true)
}

/// Copies every log line to stderr and, when open, the log file.
struct TeeWriter {
    file: Option<File>,
}

impl Write for TeeWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        io::stderr().write_all(buf)?;
        if let Some(file) = self.file.as_mut() {
            file.write_all(buf)?;
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        io::stderr().flush()?;
        if let Some(file) = self.file.as_mut() {
            file.flush()?;
        }
        Ok(())
    }
}

fn open_log_file(path: &Path, max_bytes: u64) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    rotate_if_needed(path, max_bytes)?;
    OpenOptions::new().create(true).append(true).open(path)
}

/// Install the global logger.
///
/// `RUST_LOG` overrides `config.level`. If the log file cannot be opened the
/// logger falls back to stderr alone and says so. Calling this twice keeps the
/// first logger.
pub fn init(config: &LogConfig) -> LogGuard {
    let (file, open_error) = match &config.path {
        Some(path) => match open_log_file(path, config.max_bytes) {
            Ok(file) => (Some(file), None),
            Err(err) => (None, Some((path.clone(), err))),
        },
        None => (None, None),
    };
    let logging_to = file.as_ref().and(config.path.clone());

    let installed = Builder::new()
        .filter_level(config.level)
        .parse_default_env()
        .format_timestamp_millis()
        .write_style(WriteStyle::Never)
        .target(Target::Pipe(Box::new(TeeWriter { file })))
        .try_init();

    match installed {
        Ok(()) => {
            if let Some((path, err)) = open_error {
                warn!("cannot open log file {}: {err}", path.display());
            }
            debug!("logging initialised");
            LogGuard { file: logging_to }
        }
        Err(_) => {
            debug!("logger already installed");
            LogGuard { file: None }
        }
    }
}
