//! # dbot-cli
//!
//! CLI foundation: argument parsing, config loading, persistence files and the demo handler chain.

pub mod cli;
pub mod demo;
pub mod snapshot_files;

pub use cli::{load_config, persistence_dir_or_default, Cli, Commands};
pub use demo::build_chain;
pub use snapshot_files::{
    checkpoint, load_persistence, load_snapshot, save_periodically, save_persistence, save_snapshot,
};
