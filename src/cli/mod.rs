//! CLI module for youvi-core commands.
//!
//! ## Usage
//!
//! ```bash
//! youvi-core demo              # Simulated hover and avatar bursts
//! youvi-core config show       # Effective configuration
//! youvi-core config defaults   # Built-in defaults
//! ```

pub mod config_cmd;
pub mod demo_cmd;

pub use demo_cmd::{run_demo, DemoReport};
