//! Runtime configuration loading.
//!
//! Values come from built-in defaults, then an optional TOML file named by
//! `YOUVI_CONFIG`, then `YOUVI_*` environment variables. Invalid values fall
//! back to the previous layer without crashing.
//!
//! # Environment Variables
//!
//! | Variable | Default | Description |
//! |---|---|---|
//! | `YOUVI_CONFIG` | unset | Path to a TOML config file |
//! | `YOUVI_PREVIEW_MAX_CONCURRENT` | 1 | Preview tasks running at once |
//! | `YOUVI_LOADER_BATCH_DELAY_MS` | 50 | Debounce window (ms) |
//! | `YOUVI_LOADER_PARALLEL_LIMIT` | 5 | Fetches in flight per chunk |
//! | `YOUVI_LOG_LEVEL` | info | Tracing filter directive |
//! | `YOUVI_LOG_FORMAT` | json | `json` or `pretty` |

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::loader::BatchConfig;
use crate::scheduler::PreviewQueueConfig;
use crate::telemetry::{LogConfig, LogFormat};

pub const CONFIG_PATH_VAR: &str = "YOUVI_CONFIG";

/// Effective configuration summary (serializable).
#[derive(Debug, Clone, Serialize)]
pub struct EffectiveConfig {
    pub preview_max_concurrent: usize,
    pub loader_batch_delay_ms: u64,
    pub loader_parallel_limit: usize,
    pub log_level: String,
    pub log_format: &'static str,
    pub config_file: Option<PathBuf>,
}

/// All runtime configuration.
#[derive(Debug, Clone, Default)]
pub struct EnvConfig {
    pub preview_queue: PreviewQueueConfig,
    pub batch: BatchConfig,
    pub log: LogConfig,
    /// File the values were layered from, if any.
    pub config_file: Option<PathBuf>,
}

/// TOML file layout. Every field is optional.
///
/// ```toml
/// [preview]
/// max_concurrent = 1
///
/// [loader]
/// batch_delay_ms = 50
/// parallel_limit = 5
///
/// [log]
/// level = "info"
/// format = "json"
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub preview: PreviewSection,
    #[serde(default)]
    pub loader: LoaderSection,
    #[serde(default)]
    pub log: LogSection,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PreviewSection {
    pub max_concurrent: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoaderSection {
    pub batch_delay_ms: Option<u64>,
    pub parallel_limit: Option<usize>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LogSection {
    pub level: Option<String>,
    pub format: Option<LogFormat>,
    pub output_path: Option<PathBuf>,
}

/// Parse a `usize` env var, returning `default` on missing or invalid.
fn parse_usize(key: &str, default: usize) -> usize {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<usize>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a `u64` env var, returning `default` on missing or invalid.
fn parse_u64(key: &str, default: u64) -> u64 {
    match std::env::var(key) {
        Ok(val) => val.trim().parse::<u64>().unwrap_or(default),
        Err(_) => default,
    }
}

/// Parse a TOML config document.
pub fn parse_file(contents: &str) -> Result<FileConfig, ConfigError> {
    Ok(toml::from_str(contents)?)
}

/// Read and parse a TOML config file.
pub fn load_file(path: &Path) -> Result<FileConfig, ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_file(&contents)
}

impl EnvConfig {
    /// Layer file values over the current ones.
    pub fn apply_file(&mut self, file: FileConfig) {
        if let Some(n) = file.preview.max_concurrent {
            self.preview_queue.max_concurrent = n;
        }
        if let Some(ms) = file.loader.batch_delay_ms {
            self.batch.batch_delay = Duration::from_millis(ms);
        }
        if let Some(n) = file.loader.parallel_limit {
            self.batch.parallel_limit = n;
        }
        if let Some(level) = file.log.level {
            self.log.level = level;
        }
        if let Some(format) = file.log.format {
            self.log.format = format;
        }
        if file.log.output_path.is_some() {
            self.log.output_path = file.log.output_path;
        }
    }

    /// Layer `YOUVI_*` environment variables over the current values.
    pub fn apply_env(&mut self) {
        self.preview_queue.max_concurrent =
            parse_usize("YOUVI_PREVIEW_MAX_CONCURRENT", self.preview_queue.max_concurrent);

        let delay_ms = parse_u64(
            "YOUVI_LOADER_BATCH_DELAY_MS",
            self.batch.batch_delay.as_millis() as u64,
        );
        self.batch.batch_delay = Duration::from_millis(delay_ms);
        self.batch.parallel_limit =
            parse_usize("YOUVI_LOADER_PARALLEL_LIMIT", self.batch.parallel_limit);

        if let Ok(level) = std::env::var("YOUVI_LOG_LEVEL") {
            if !level.trim().is_empty() {
                self.log.level = level.trim().to_string();
            }
        }
        if let Ok(format) = std::env::var("YOUVI_LOG_FORMAT") {
            match format.parse::<LogFormat>() {
                Ok(format) => self.log.format = format,
                Err(e) => tracing::warn!(error = %e, "ignoring YOUVI_LOG_FORMAT"),
            }
        }
    }

    /// Apply floors so no limit can stall the subsystems.
    fn normalize(&mut self) {
        self.preview_queue.max_concurrent = self.preview_queue.max_concurrent.max(1);
        self.batch.parallel_limit = self.batch.parallel_limit.max(1);
    }

    /// Return a serializable summary of all effective values.
    pub fn effective_config(&self) -> EffectiveConfig {
        EffectiveConfig {
            preview_max_concurrent: self.preview_queue.max_concurrent,
            loader_batch_delay_ms: self.batch.batch_delay.as_millis() as u64,
            loader_parallel_limit: self.batch.parallel_limit,
            log_level: self.log.level.clone(),
            log_format: self.log.format.as_str(),
            config_file: self.config_file.clone(),
        }
    }
}

/// Load all configuration: defaults, then the config file, then env vars.
///
/// A missing or malformed config file is logged and skipped.
pub fn load() -> EnvConfig {
    let mut config = EnvConfig::default();

    if let Some(path) = std::env::var_os(CONFIG_PATH_VAR).map(PathBuf::from) {
        match load_file(&path) {
            Ok(file) => {
                config.apply_file(file);
                config.config_file = Some(path);
            }
            Err(e) => tracing::warn!(error = %e, "ignoring config file"),
        }
    }

    config.apply_env();
    config.normalize();
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::sync::Mutex;

    // Serialize env-mutating tests to avoid cross-test pollution.
    static ENV_LOCK: Mutex<()> = Mutex::new(());

    const ENV_KEYS: &[&str] = &[
        "YOUVI_CONFIG",
        "YOUVI_PREVIEW_MAX_CONCURRENT",
        "YOUVI_LOADER_BATCH_DELAY_MS",
        "YOUVI_LOADER_PARALLEL_LIMIT",
        "YOUVI_LOG_LEVEL",
        "YOUVI_LOG_FORMAT",
    ];

    fn clear_env_vars() {
        for k in ENV_KEYS {
            std::env::remove_var(k);
        }
    }

    #[test]
    fn test_defaults_are_sensible() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let cfg = load();
        assert_eq!(cfg.preview_queue.max_concurrent, 1);
        assert_eq!(cfg.batch.batch_delay, Duration::from_millis(50));
        assert_eq!(cfg.batch.parallel_limit, 5);
        assert_eq!(cfg.log.level, "info");
        assert_eq!(cfg.log.format, LogFormat::Json);
        assert!(cfg.config_file.is_none());
    }

    #[test]
    fn test_env_vars_override_defaults() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("YOUVI_PREVIEW_MAX_CONCURRENT", "2");
        std::env::set_var("YOUVI_LOADER_BATCH_DELAY_MS", "120");
        std::env::set_var("YOUVI_LOADER_PARALLEL_LIMIT", "8");
        std::env::set_var("YOUVI_LOG_FORMAT", "pretty");
        let cfg = load();
        assert_eq!(cfg.preview_queue.max_concurrent, 2);
        assert_eq!(cfg.batch.batch_delay, Duration::from_millis(120));
        assert_eq!(cfg.batch.parallel_limit, 8);
        assert_eq!(cfg.log.format, LogFormat::Pretty);
        clear_env_vars();
    }

    #[test]
    fn test_invalid_env_falls_back_to_default() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("YOUVI_PREVIEW_MAX_CONCURRENT", "many");
        std::env::set_var("YOUVI_LOADER_BATCH_DELAY_MS", "-5");
        std::env::set_var("YOUVI_LOG_FORMAT", "xml");
        let cfg = load();
        assert_eq!(cfg.preview_queue.max_concurrent, 1);
        assert_eq!(cfg.batch.batch_delay, Duration::from_millis(50));
        assert_eq!(cfg.log.format, LogFormat::Json);
        clear_env_vars();
    }

    #[test]
    fn test_zero_limits_are_floored() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("YOUVI_PREVIEW_MAX_CONCURRENT", "0");
        std::env::set_var("YOUVI_LOADER_PARALLEL_LIMIT", "0");
        let cfg = load();
        assert_eq!(cfg.preview_queue.max_concurrent, 1);
        assert_eq!(cfg.batch.parallel_limit, 1);
        clear_env_vars();
    }

    #[test]
    fn test_file_layer_under_env() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[preview]\nmax_concurrent = 3\n\n[loader]\nbatch_delay_ms = 10\nparallel_limit = 2\n"
        )
        .unwrap();

        std::env::set_var("YOUVI_CONFIG", file.path());
        std::env::set_var("YOUVI_LOADER_PARALLEL_LIMIT", "7");
        let cfg = load();
        assert_eq!(cfg.preview_queue.max_concurrent, 3);
        assert_eq!(cfg.batch.batch_delay, Duration::from_millis(10));
        assert_eq!(cfg.batch.parallel_limit, 7);
        assert_eq!(cfg.config_file.as_deref(), Some(file.path()));
        clear_env_vars();
    }

    #[test]
    fn test_bad_file_is_skipped() {
        let _lock = ENV_LOCK.lock().unwrap();
        clear_env_vars();
        std::env::set_var("YOUVI_CONFIG", "/nonexistent/youvi.toml");
        let cfg = load();
        assert_eq!(cfg.preview_queue.max_concurrent, 1);
        assert!(cfg.config_file.is_none());
        clear_env_vars();
    }

    #[test]
    fn test_unknown_file_keys_rejected() {
        let err = parse_file("[preview]\nmax_concurent = 2\n").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn test_effective_config_serializes() {
        let eff = EnvConfig::default().effective_config();
        let json = serde_json::to_value(&eff).unwrap();
        assert_eq!(json["preview_max_concurrent"], 1);
        assert_eq!(json["loader_batch_delay_ms"], 50);
        assert_eq!(json["log_format"], "json");
    }
}
