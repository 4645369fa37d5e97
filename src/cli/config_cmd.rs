//! Config CLI subcommands: show, defaults, validate.
//!
//! These read configuration from the environment and the optional
//! `YOUVI_CONFIG` file; nothing is started.

use crate::config::{self, EffectiveConfig, EnvConfig};

/// Print effective config to stdout, as `KEY=value` lines or JSON.
pub fn run_show(json: bool) {
    let cfg = config::load().effective_config();
    print_config(&cfg, json);
}

/// Print default config values (no file or env overrides) to stdout.
pub fn run_defaults(json: bool) {
    let cfg = EnvConfig::default().effective_config();
    print_config(&cfg, json);
}

/// Validate the configuration file named by `YOUVI_CONFIG`, if any.
///
/// Returns 0 if valid (or no file is configured), 2 on a config error.
pub fn run_validate() -> i32 {
    let Some(path) = std::env::var_os(config::CONFIG_PATH_VAR) else {
        println!("No config file set; using defaults and environment.");
        return 0;
    };
    match config::load_file(std::path::Path::new(&path)) {
        Ok(_) => {
            println!("Configuration is valid.");
            0
        }
        Err(e) => {
            eprintln!("ERROR: {e}");
            2
        }
    }
}

/// Render the summary. JSON output is a single object.
pub fn render_config(cfg: &EffectiveConfig, json: bool) -> String {
    if json {
        return serde_json::to_string_pretty(cfg).unwrap_or_else(|_| "{}".to_string());
    }
    let mut out = String::new();
    out.push_str(&format!("YOUVI_PREVIEW_MAX_CONCURRENT={}\n", cfg.preview_max_concurrent));
    out.push_str(&format!("YOUVI_LOADER_BATCH_DELAY_MS={}\n", cfg.loader_batch_delay_ms));
    out.push_str(&format!("YOUVI_LOADER_PARALLEL_LIMIT={}\n", cfg.loader_parallel_limit));
    out.push_str(&format!("YOUVI_LOG_LEVEL={}\n", cfg.log_level));
    out.push_str(&format!("YOUVI_LOG_FORMAT={}\n", cfg.log_format));
    if let Some(path) = &cfg.config_file {
        out.push_str(&format!("YOUVI_CONFIG={}\n", path.display()));
    }
    out
}

fn print_config(cfg: &EffectiveConfig, json: bool) {
    print!("{}", render_config(cfg, json));
    if json {
        println!();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_defaults_as_lines() {
        let cfg = EnvConfig::default().effective_config();
        let text = render_config(&cfg, false);
        assert!(text.contains("YOUVI_PREVIEW_MAX_CONCURRENT=1\n"));
        assert!(text.contains("YOUVI_LOADER_BATCH_DELAY_MS=50\n"));
        assert!(text.contains("YOUVI_LOADER_PARALLEL_LIMIT=5\n"));
        assert!(!text.contains("YOUVI_CONFIG="));
    }

    #[test]
    fn test_render_json_round_trips() {
        let cfg = EnvConfig::default().effective_config();
        let value: serde_json::Value = serde_json::from_str(&render_config(&cfg, true)).unwrap();
        assert_eq!(value["loader_parallel_limit"], 5);
    }
}
