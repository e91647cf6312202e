//! Command-line interface for Portal Fetcher
//!
//! Argument parsing, command handlers, and progress rendering.

pub mod args;
pub mod commands;
pub mod progress;

pub use args::{CacheAction, CacheArgs, Cli, Commands, ConfigAction, ConfigArgs, FetchArgs, GlobalArgs};
pub use commands::{handle_cache, handle_config, handle_fetch};
pub use progress::{download_progress_bar, render_progress};
