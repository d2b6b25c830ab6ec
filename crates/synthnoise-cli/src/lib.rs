//! Synthnoise CLI library
//!
//! This library provides the components behind the `synthnoise` binary:
//! argument parsing, configuration loading, JSON Lines record files and
//! the command handlers that drive the noising engine.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod records;

pub use cli::{Cli, Commands};
pub use commands::CommandDispatcher;
pub use error::{CliError, Result};
