//! youvi-core entry point.
//!
//! ## CLI Subcommands
//!
//! - `youvi-core demo [CARDS]` - Simulated hover sweep and avatar burst
//! - `youvi-core config show|defaults|validate [--json]` - Configuration
//! - `youvi-core version` - Version information

use std::process::ExitCode;

use youvi_core::cli::{config_cmd, run_demo};
use youvi_core::config as youvi_config;
use youvi_core::telemetry::{init_logging, init_metrics};
use youvi_core::RuntimeConfig;

#[tokio::main]
async fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");
    let json_output = args.iter().any(|a| a == "--json");

    match command {
        "demo" => {
            let env = youvi_config::load();
            if let Err(e) = init_logging(&env.log) {
                eprintln!("Logging disabled: {}", e);
            }
            init_metrics();

            let cards = args
                .get(2)
                .and_then(|s| s.parse::<usize>().ok())
                .unwrap_or(12);
            let report = run_demo(RuntimeConfig::from(&env), cards).await;
            match serde_json::to_string_pretty(&report) {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    eprintln!("Failed to render report: {}", e);
                    return ExitCode::FAILURE;
                }
            }
            ExitCode::SUCCESS
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show(json_output);
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults(json_output);
                    ExitCode::SUCCESS
                }
                "validate" => {
                    let code = config_cmd::run_validate();
                    ExitCode::from(code as u8)
                }
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_usage();
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            print_usage();
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("youvi-core {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            print_usage();
            ExitCode::FAILURE
        }
    }
}

fn print_usage() {
    let version = env!("CARGO_PKG_VERSION");
    eprintln!(
        "youvi-core v{}

USAGE:
    youvi-core [COMMAND] [OPTIONS]

COMMANDS:
    demo [CARDS]   Simulate a hover sweep and an avatar burst (default 12 cards)
    config         Show, print defaults, or validate configuration
    version        Show version information
    help           Show this help message

OPTIONS:
    --json         JSON output for config commands

ENVIRONMENT:
    YOUVI_CONFIG                   Path to a TOML config file
    YOUVI_PREVIEW_MAX_CONCURRENT   Preview tasks running at once (default: 1)
    YOUVI_LOADER_BATCH_DELAY_MS    Debounce window in ms (default: 50)
    YOUVI_LOADER_PARALLEL_LIMIT    Fetches per chunk (default: 5)
    YOUVI_LOG_LEVEL                Tracing filter (default: info)
    YOUVI_LOG_FORMAT               json or pretty (default: json)

EXIT CODES:
    0  Success
    1  Failure
    2  Configuration error
",
        version
    );
}
