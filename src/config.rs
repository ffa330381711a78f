//! Scan configuration.
//!
//! Every knob has a built-in default, can be set through a `QR_*` environment
//! variable, and is finally overridden by command-line flags in the binary.

use crate::decoder::InvokerOptions;
use crate::models::SourceKind;
use log::LevelFilter;
use std::path::PathBuf;
use std::time::Duration;

/// Default rolling log file, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "qr_scanner.log";
/// Log size that triggers rotation at startup.
pub const DEFAULT_LOG_MAX_BYTES: u64 = 5 * 1024 * 1024;
/// Default webcam scan length in seconds.
pub const DEFAULT_WEBCAM_DURATION_SECS: u64 = 30;

/// Parse a boolean flag the way the env helpers accept them.
pub fn parse_flag(value: &str) -> Option<bool> {
    match value.trim() {
        "1" | "true" | "TRUE" | "True" | "yes" | "YES" | "on" | "ON" => Some(true),
        "0" | "false" | "FALSE" | "False" | "no" | "NO" | "off" | "OFF" => Some(false),
        _ => None,
    }
}

fn parse_u64<F>(lookup: &F, name: &str) -> Option<u64>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| v.trim().parse::<u64>().ok())
}

fn parse_bool<F>(lookup: &F, name: &str) -> Option<bool>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(name).and_then(|v| parse_flag(&v))
}

/// Logging destination and verbosity.
#[derive(Debug, Clone, PartialEq)]
pub struct LogConfig {
    /// Append-only log file; `None` logs to stderr only.
    pub path: Option<PathBuf>,
    /// Rotate the file at startup once it grows past this many bytes.
    pub max_bytes: u64,
    /// Default level when `RUST_LOG` is unset.
    pub level: LevelFilter,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            path: Some(PathBuf::from(DEFAULT_LOG_FILE)),
            max_bytes: DEFAULT_LOG_MAX_BYTES,
            level: LevelFilter::Info,
        }
    }
}

/// Settings shared by both front ends.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanConfig {
    /// Dedup override. `None` picks the per-mode default (see [`ScanConfig::dedup_for`]).
    pub dedup: Option<bool>,
    /// Keep located symbols that could not be decoded, with empty data.
    pub keep_undecoded: bool,
    /// Decode directory images on the rayon pool.
    pub parallel: bool,
    /// Downscale frames whose longer side exceeds this many pixels.
    pub max_dimension: Option<u32>,
    /// Webcam scan length. `Duration::ZERO` means run until cancelled.
    pub webcam_duration: Duration,
    /// Logging setup.
    pub log: LogConfig,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            dedup: None,
            keep_undecoded: false,
            parallel: false,
            max_dimension: None,
            webcam_duration: Duration::from_secs(DEFAULT_WEBCAM_DURATION_SECS),
            log: LogConfig::default(),
        }
    }
}

impl ScanConfig {
    /// Build a config from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let max_dimension = match parse_u64(&lookup, "QR_MAX_DIM") {
            Some(0) | None => None,
            Some(v) => Some(v.min(u32::MAX as u64) as u32),
        };
        let log_path = match lookup("QR_SCAN_LOG_FILE") {
            Some(v) if v.trim().is_empty() || v.trim() == "-" => None,
            Some(v) => Some(PathBuf::from(v.trim())),
            None => defaults.log.path.clone(),
        };

        Self {
            dedup: parse_bool(&lookup, "QR_SCAN_DEDUP"),
            keep_undecoded: parse_bool(&lookup, "QR_SCAN_KEEP_UNDECODED")
                .unwrap_or(defaults.keep_undecoded),
            parallel: parse_bool(&lookup, "QR_SCAN_PARALLEL").unwrap_or(defaults.parallel),
            max_dimension,
            webcam_duration: parse_u64(&lookup, "QR_SCAN_DURATION")
                .map(Duration::from_secs)
                .unwrap_or(defaults.webcam_duration),
            log: LogConfig {
                path: log_path,
                max_bytes: parse_u64(&lookup, "QR_SCAN_LOG_MAX_BYTES")
                    .unwrap_or(defaults.log.max_bytes),
                level: defaults.log.level,
            },
        }
    }

    /// Whether duplicates are suppressed for a scan from `kind`.
    ///
    /// Webcam scans see the same code on every frame, so they dedup unless
    /// told otherwise. File scans keep every detection by default.
    pub fn dedup_for(&self, kind: SourceKind) -> bool {
        self.dedup.unwrap_or(kind == SourceKind::Webcam)
    }

    /// Options handed to the decode invoker.
    pub fn invoker_options(&self) -> InvokerOptions {
        InvokerOptions {
            keep_undecoded: self.keep_undecoded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = ScanConfig::from_lookup(lookup_from(&[]));
        assert_eq!(config, ScanConfig::default());
    }

    #[test]
    fn environment_overrides_are_parsed() {
        let config = ScanConfig::from_lookup(lookup_from(&[
            ("QR_MAX_DIM", "1200"),
            ("QR_SCAN_DEDUP", "no"),
            ("QR_SCAN_KEEP_UNDECODED", "1"),
            ("QR_SCAN_PARALLEL", "true"),
            ("QR_SCAN_DURATION", "0"),
            ("QR_SCAN_LOG_FILE", "-"),
            ("QR_SCAN_LOG_MAX_BYTES", "1024"),
        ]));
        assert_eq!(config.max_dimension, Some(1200));
        assert_eq!(config.dedup, Some(false));
        assert!(config.keep_undecoded);
        assert!(config.parallel);
        assert_eq!(config.webcam_duration, Duration::ZERO);
        assert_eq!(config.log.path, None);
        assert_eq!(config.log.max_bytes, 1024);
    }

    #[test]
    fn malformed_values_fall_back() {
        let config = ScanConfig::from_lookup(lookup_from(&[
            ("QR_MAX_DIM", "0"),
            ("QR_SCAN_DEDUP", "sometimes"),
            ("QR_SCAN_DURATION", "soon"),
        ]));
        assert_eq!(config.max_dimension, None);
        assert_eq!(config.dedup, None);
        assert_eq!(
            config.webcam_duration,
            Duration::from_secs(DEFAULT_WEBCAM_DURATION_SECS)
        );
    }

    #[test]
    fn dedup_defaults_depend_on_the_source() {
        let mut config = ScanConfig::default();
        assert!(config.dedup_for(SourceKind::Webcam));
        assert!(!config.dedup_for(SourceKind::Image));
        assert!(!config.dedup_for(SourceKind::Directory));

        config.dedup = Some(true);
        assert!(config.dedup_for(SourceKind::Directory));
        config.dedup = Some(false);
        assert!(!config.dedup_for(SourceKind::Webcam));
    }
}
