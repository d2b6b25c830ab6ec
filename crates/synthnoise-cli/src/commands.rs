//! Command handlers for the synthnoise CLI

use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};

use serde::Serialize;
use synthnoise_core::{DType, DatasetSchema, NoiseConfiguration, NoiseEngine, Seed, Table, DATASETS};
use tracing::info;

use crate::cli::{Cli, Commands};
use crate::config::{load_configuration, load_engine};
use crate::error::{CliError, Result};
use crate::records::{read_records, write_records};

/// Command dispatcher for handling CLI commands
pub struct CommandDispatcher;

impl CommandDispatcher {
    /// Execute a CLI command
    pub fn execute(cli: Cli) -> Result<()> {
        let engine = load_engine(cli.reference_data.as_deref())?;
        match cli.command {
            Commands::Noise {
                dataset,
                inputs,
                output,
                seed,
            } => {
                let schema = Self::dataset(&dataset)?;
                let configuration =
                    load_configuration(&engine, cli.config.as_deref(), cli.no_noise)?;
                Self::handle_noise_command(
                    &engine,
                    schema,
                    &inputs,
                    output.as_deref(),
                    &seed,
                    &configuration,
                )
            }
            Commands::Datasets { json } => Self::handle_datasets_command(json),
            Commands::Config { dataset } => {
                let configuration =
                    load_configuration(&engine, cli.config.as_deref(), cli.no_noise)?;
                Self::handle_config_command(&configuration, dataset.as_deref())
            }
        }
    }

    fn dataset(name: &str) -> Result<&'static DatasetSchema> {
        DatasetSchema::named(name).ok_or_else(|| CliError::UnknownDataset(name.to_string()))
    }

    /// Handle the noise command
    fn handle_noise_command(
        engine: &NoiseEngine,
        schema: &DatasetSchema,
        inputs: &[String],
        output: Option<&str>,
        seed: &str,
        configuration: &NoiseConfiguration,
    ) -> Result<()> {
        let shards = inputs
            .iter()
            .map(|path| {
                let reader = BufReader::new(File::open(path)?);
                read_records(reader, path, schema)
            })
            .collect::<Result<Vec<Table>>>()?;

        let noised = engine.generate(schema, shards, configuration, &Seed::new(seed))?;
        info!(dataset = schema.name, rows = noised.len(), "Writing noised records");
        match output {
            Some(path) => write_records(&noised, BufWriter::new(File::create(path)?)),
            None => write_records(&noised, io::stdout().lock()),
        }
    }

    /// Handle the datasets command
    fn handle_datasets_command(json: bool) -> Result<()> {
        let summaries: Vec<DatasetSummary> = DATASETS.iter().map(DatasetSummary::from).collect();
        let mut out = io::stdout().lock();
        if json {
            serde_json::to_writer_pretty(&mut out, &summaries)?;
            writeln!(out)?;
            return Ok(());
        }
        for summary in summaries {
            writeln!(out, "{}", summary.name)?;
            writeln!(out, "  row noise: {}", summary.row_noise.join(", "))?;
            for column in summary.columns {
                if column.noise_types.is_empty() {
                    writeln!(out, "  {} ({:?})", column.name, column.dtype)?;
                } else {
                    writeln!(
                        out,
                        "  {} ({:?}): {}",
                        column.name,
                        column.dtype,
                        column.noise_types.join(", ")
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Handle the config command
    fn handle_config_command(
        configuration: &NoiseConfiguration,
        dataset: Option<&str>,
    ) -> Result<()> {
        let mut out = io::stdout().lock();
        match dataset {
            Some(name) => {
                let schema = Self::dataset(name)?;
                let node = configuration
                    .dataset(schema.name)
                    .ok_or_else(|| CliError::UnknownDataset(name.to_string()))?;
                serde_json::to_writer_pretty(&mut out, node)?;
            }
            None => serde_json::to_writer_pretty(&mut out, configuration)?,
        }
        writeln!(out)?;
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Dataset Listing
// ----------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct ColumnSummary {
    name: &'static str,
    dtype: DType,
    noise_types: Vec<&'static str>,
}

#[derive(Debug, Serialize)]
struct DatasetSummary {
    name: &'static str,
    row_noise: Vec<&'static str>,
    columns: Vec<ColumnSummary>,
}

impl From<&DatasetSchema> for DatasetSummary {
    fn from(dataset: &DatasetSchema) -> Self {
        Self {
            name: dataset.name,
            row_noise: dataset.row_noise_types.iter().map(|k| k.name()).collect(),
            columns: dataset
                .columns
                .iter()
                .map(|column| ColumnSummary {
                    name: column.name,
                    dtype: column.dtype,
                    noise_types: column.noise_types.iter().map(|k| k.name()).collect(),
                })
                .collect(),
        }
    }
}
