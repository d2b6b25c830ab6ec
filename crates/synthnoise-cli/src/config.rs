//! Noise configuration loading for the CLI
//!
//! Override and reference data documents may be JSON or TOML; the format is
//! chosen by file extension. Overrides are merged onto the engine's defaults.

use std::fs;
use std::path::Path;

use serde_json::Value;
use synthnoise_core::{LookupTables, NoiseConfiguration, NoiseEngine, ReferenceData, UserConfiguration};
use tracing::info;

use crate::error::Result;

fn is_toml(path: &str) -> bool {
    Path::new(path)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"))
}

fn parse_document(text: &str, is_toml: bool) -> Result<Value> {
    Ok(if is_toml {
        toml::from_str(text)?
    } else {
        serde_json::from_str(text)?
    })
}

/// Parse an override document
pub fn parse_overrides(text: &str, is_toml: bool) -> Result<UserConfiguration> {
    Ok(UserConfiguration::from_value(&parse_document(text, is_toml)?)?)
}

/// Parse a reference data document
pub fn parse_reference_data(text: &str, is_toml: bool) -> Result<ReferenceData> {
    Ok(serde_json::from_value(parse_document(text, is_toml)?)?)
}

/// Build the engine, replacing built-in reference data from `path` if given
pub fn load_engine(reference_data: Option<&str>) -> Result<NoiseEngine> {
    let Some(path) = reference_data else {
        return Ok(NoiseEngine::new());
    };
    info!("Loading reference data from: {}", path);
    let data = parse_reference_data(&fs::read_to_string(path)?, is_toml(path))?;
    Ok(NoiseEngine::new().with_lookups(LookupTables::builtin().with_reference_data(data)))
}

/// Resolve the configuration the engine will run with
pub fn load_configuration(
    engine: &NoiseEngine,
    path: Option<&str>,
    no_noise: bool,
) -> Result<NoiseConfiguration> {
    if no_noise {
        info!("Using configuration with all noise disabled");
        return Ok(engine.no_noise_configuration());
    }
    let Some(path) = path else {
        info!("Using default configuration");
        return Ok(engine.default_configuration());
    };

    info!("Loading configuration from: {}", path);
    let text = fs::read_to_string(path)?;
    let overrides = parse_overrides(&text, is_toml(path))?;
    Ok(engine.default_configuration().with_user_overrides(&overrides)?)
}
