//! Command-line interface definitions and parsing

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,

    /// Noise configuration override file (JSON or TOML)
    #[arg(short, long)]
    pub config: Option<String>,

    /// Set every noise probability to zero
    #[arg(long, conflicts_with = "config")]
    pub no_noise: bool,

    /// Nickname, OCR, phonetic or keyboard reference data (JSON or TOML)
    #[arg(long)]
    pub reference_data: Option<String>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Noise one dataset read from JSON Lines shards
    Noise {
        /// Dataset name, e.g. decennial_census
        #[arg(short, long)]
        dataset: String,

        /// Input shards, one JSON object per line
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output file; standard output when omitted
        #[arg(short, long)]
        output: Option<String>,

        /// Seed for every random draw
        #[arg(short, long, default_value = "0")]
        seed: String,
    },
    /// List the built-in datasets and their columns
    Datasets {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the resolved noise configuration
    Config {
        /// Restrict output to one dataset
        #[arg(short, long)]
        dataset: Option<String>,
    },
}
