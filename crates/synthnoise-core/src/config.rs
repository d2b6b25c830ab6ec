//! Layered noise configuration
//!
//! The configuration tree is built in three passes, each consuming the
//! previous tree and returning a new one:
//!
//! 1. [`NoiseConfiguration::baseline`] declares every noise type each dataset
//!    and column opts into, at the noise type's default parameters.
//! 2. [`NoiseConfiguration::with_dataset_defaults`] applies the per-dataset
//!    calibrations.
//! 3. [`NoiseConfiguration::with_user_overrides`] validates and merges a
//!    [`UserConfiguration`].

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::noise::{ColumnNoiseKind, NoiseCatalog, RowNoiseKind};
use crate::schema::{DatasetSchema, DATASETS, SSA, TAX_W2_1099};
use crate::{NoiseError, Result};

// ----------------------------------------------------------------------------
// Configuration Keys
// ----------------------------------------------------------------------------

pub mod keys {
    pub const ROW_NOISE: &str = "row_noise";
    pub const COLUMN_NOISE: &str = "column_noise";
    pub const ROW_PROBABILITY: &str = "row_probability";
    pub const CELL_PROBABILITY: &str = "cell_probability";
    pub const TOKEN_PROBABILITY: &str = "token_probability";
    pub const ZIPCODE_DIGIT_PROBABILITIES: &str = "zipcode_digit_probabilities";
    pub const POSSIBLE_AGE_DIFFERENCES: &str = "possible_age_differences";
}

const ZIPCODE_DIGITS: usize = 5;

/// `numpy.isclose(total, 1.0)` with its default tolerances
fn sums_to_one(total: f64) -> bool {
    (total - 1.0).abs() <= 1e-8 + 1e-5
}

fn check_probability(value: f64, context: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(NoiseError::config_error(format!(
            "{} must be between 0.0 and 1.0, got {}",
            context, value
        )));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Parameter Nodes
// ----------------------------------------------------------------------------

/// Parameters of a row-noise type
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RowNoiseParameters {
    pub row_probability: f64,
}

/// Parameters of a column-noise type on one column
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ColumnNoiseParameters {
    pub cell_probability: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token_probability: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zipcode_digit_probabilities: Option<Vec<f64>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub possible_age_differences: Option<BTreeMap<i64, f64>>,
}

impl ColumnNoiseParameters {
    pub fn with_cell_probability(cell_probability: f64) -> Self {
        Self {
            cell_probability,
            ..Self::default()
        }
    }

    pub fn token_probability(&self) -> Result<f64> {
        self.token_probability
            .ok_or_else(|| NoiseError::config_error("token_probability is not configured"))
    }

    pub fn zipcode_digit_probabilities(&self) -> Result<&[f64]> {
        self.zipcode_digit_probabilities
            .as_deref()
            .ok_or_else(|| NoiseError::config_error("zipcode_digit_probabilities is not configured"))
    }

    pub fn possible_age_differences(&self) -> Result<&BTreeMap<i64, f64>> {
        self.possible_age_differences
            .as_ref()
            .ok_or_else(|| NoiseError::config_error("possible_age_differences is not configured"))
    }

    /// Names of the parameters present on this node
    pub fn parameter_names(&self) -> Vec<&'static str> {
        let mut names = vec![keys::CELL_PROBABILITY];
        if self.token_probability.is_some() {
            names.push(keys::TOKEN_PROBABILITY);
        }
        if self.zipcode_digit_probabilities.is_some() {
            names.push(keys::ZIPCODE_DIGIT_PROBABILITIES);
        }
        if self.possible_age_differences.is_some() {
            names.push(keys::POSSIBLE_AGE_DIFFERENCES);
        }
        names
    }

    fn validate(&self, context: &str) -> Result<()> {
        check_probability(self.cell_probability, &format!("{} cell_probability", context))?;
        if let Some(token) = self.token_probability {
            check_probability(token, &format!("{} token_probability", context))?;
        }
        if let Some(digits) = &self.zipcode_digit_probabilities {
            validate_zipcode_digit_probabilities(digits, context)?;
        }
        if let Some(differences) = &self.possible_age_differences {
            validate_age_differences(differences, context)?;
        }
        Ok(())
    }
}

fn validate_zipcode_digit_probabilities(digits: &[f64], context: &str) -> Result<()> {
    if digits.len() != ZIPCODE_DIGITS {
        return Err(NoiseError::config_error(format!(
            "{} zipcode_digit_probabilities must be 5 values, got {}",
            context,
            digits.len()
        )));
    }
    for value in digits {
        check_probability(*value, &format!("{} zipcode_digit_probabilities", context))?;
    }
    Ok(())
}

fn validate_age_differences(differences: &BTreeMap<i64, f64>, context: &str) -> Result<()> {
    if differences.contains_key(&0) {
        return Err(NoiseError::config_error(format!(
            "{} possible_age_differences: Cannot include 0",
            context
        )));
    }
    for value in differences.values() {
        check_probability(*value, &format!("{} possible_age_differences", context))?;
    }
    let total: f64 = differences.values().sum();
    if !sums_to_one(total) {
        return Err(NoiseError::config_error(format!(
            "{} possible_age_differences probabilities must sum to 1, got {}",
            context, total
        )));
    }
    Ok(())
}

// ----------------------------------------------------------------------------
// Configuration Tree
// ----------------------------------------------------------------------------

/// Noise configuration of one dataset
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DatasetNoiseConfig {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub row_noise: BTreeMap<String, RowNoiseParameters>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub column_noise: BTreeMap<String, BTreeMap<String, ColumnNoiseParameters>>,
}

impl DatasetNoiseConfig {
    pub fn row(&self, kind: RowNoiseKind) -> Option<&RowNoiseParameters> {
        self.row_noise.get(kind.name())
    }

    pub fn column(&self, column: &str, kind: ColumnNoiseKind) -> Option<&ColumnNoiseParameters> {
        self.column_noise.get(column)?.get(kind.name())
    }

    /// Configured columns that enable `kind`, in column-name order
    pub fn columns_with(
        &self,
        kind: ColumnNoiseKind,
    ) -> impl Iterator<Item = (&str, &ColumnNoiseParameters)> {
        self.column_noise.iter().filter_map(move |(column, types)| {
            types.get(kind.name()).map(|params| (column.as_str(), params))
        })
    }

    fn row_mut(&mut self, kind: RowNoiseKind) -> Option<&mut RowNoiseParameters> {
        self.row_noise.get_mut(kind.name())
    }

    fn for_each_column_node<F>(&mut self, mut f: F)
    where
        F: FnMut(&mut ColumnNoiseParameters),
    {
        for types in self.column_noise.values_mut() {
            types.values_mut().for_each(&mut f);
        }
    }
}

/// Complete noise configuration, keyed by dataset name
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoiseConfiguration {
    datasets: BTreeMap<String, DatasetNoiseConfig>,
}

impl NoiseConfiguration {
    /// First pass: every dataset at the noise types' declared defaults
    pub fn baseline(catalog: &NoiseCatalog) -> Self {
        let datasets = DATASETS
            .iter()
            .map(|dataset| (dataset.name.to_string(), baseline_for(catalog, dataset)))
            .collect();
        Self { datasets }
    }

    /// Second pass: per-dataset calibrations
    pub fn with_dataset_defaults(mut self) -> Self {
        for dataset in DATASETS {
            let Some(profile) = dataset.do_not_respond else {
                continue;
            };
            if let Some(params) = self
                .datasets
                .get_mut(dataset.name)
                .and_then(|d| d.row_mut(RowNoiseKind::DoNotRespond))
            {
                params.row_probability = profile.default_row_probability;
            }
        }

        if let Some(tax) = self.datasets.get_mut(TAX_W2_1099.name) {
            if let Some(omit) = tax.row_mut(RowNoiseKind::OmitRow) {
                omit.row_probability = 0.005;
            }
            if let Some(copy) = tax
                .column_noise
                .get_mut("ssn")
                .and_then(|types| types.get_mut(ColumnNoiseKind::CopyFromHouseholdMember.name()))
            {
                copy.cell_probability = 0.0;
            }
        }

        // No noise of any kind on the social security number in SSA records
        if let Some(ssn) = self
            .datasets
            .get_mut(SSA.name)
            .and_then(|ssa| ssa.column_noise.get_mut("ssn"))
        {
            for params in ssn.values_mut() {
                params.cell_probability = 0.0;
            }
        }
        self
    }

    /// Third pass: merge validated user overrides
    pub fn with_user_overrides(mut self, user: &UserConfiguration) -> Result<Self> {
        for (dataset_name, overrides) in &user.datasets {
            let dataset = self.datasets.get_mut(dataset_name).ok_or_else(|| {
                NoiseError::config_error(format!(
                    "Invalid dataset '{}' provided. Valid datasets are {:?}",
                    dataset_name,
                    DATASETS.iter().map(|d| d.name).collect::<Vec<_>>()
                ))
            })?;
            overrides.merge_into(dataset_name, dataset)?;
        }
        self.validate()?;
        Ok(self)
    }

    /// Baseline plus dataset calibrations
    pub fn default_for(catalog: &NoiseCatalog) -> Self {
        Self::baseline(catalog).with_dataset_defaults()
    }

    /// Every probability set to zero; additional parameters keep their defaults
    pub fn no_noise(catalog: &NoiseCatalog) -> Self {
        let mut configuration = Self::baseline(catalog);
        for dataset in configuration.datasets.values_mut() {
            for params in dataset.row_noise.values_mut() {
                params.row_probability = 0.0;
            }
            dataset.for_each_column_node(|params| params.cell_probability = 0.0);
        }
        configuration
    }

    /// Defaults overridden by a user document
    pub fn from_user_value(catalog: &NoiseCatalog, value: &Value) -> Result<Self> {
        let user = UserConfiguration::from_value(value)?;
        Self::default_for(catalog).with_user_overrides(&user)
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetNoiseConfig> {
        self.datasets.get(name)
    }

    pub fn dataset_names(&self) -> impl Iterator<Item = &str> {
        self.datasets.keys().map(String::as_str)
    }

    /// Check every probability leaf of the tree
    pub fn validate(&self) -> Result<()> {
        for (dataset_name, dataset) in &self.datasets {
            for (noise, params) in &dataset.row_noise {
                check_probability(
                    params.row_probability,
                    &format!("{} {} row_probability", dataset_name, noise),
                )?;
            }
            for (column, types) in &dataset.column_noise {
                for (noise, params) in types {
                    params.validate(&format!("{} {} {}", dataset_name, column, noise))?;
                }
            }
        }
        Ok(())
    }
}

fn baseline_for(catalog: &NoiseCatalog, dataset: &DatasetSchema) -> DatasetNoiseConfig {
    let row_noise = dataset
        .row_noise_types
        .iter()
        .map(|kind| {
            let row_probability = catalog.row_noise_type(*kind).default_row_probability;
            (kind.name().to_string(), RowNoiseParameters { row_probability })
        })
        .collect();
    let column_noise = dataset
        .columns
        .iter()
        .filter(|column| !column.noise_types.is_empty())
        .map(|column| {
            let types = column
                .noise_types
                .iter()
                .map(|kind| {
                    let defaults = catalog.column_noise_type(*kind).default_parameters.clone();
                    (kind.name().to_string(), defaults)
                })
                .collect();
            (column.name.to_string(), types)
        })
        .collect();
    DatasetNoiseConfig {
        row_noise,
        column_noise,
    }
}

// ----------------------------------------------------------------------------
// User Overrides
// ----------------------------------------------------------------------------

/// User-supplied age perturbations
#[derive(Debug, Clone, PartialEq)]
pub enum AgeDifferences {
    /// Listed offsets, equally likely
    Uniform(Vec<i64>),
    /// Offsets with explicit probabilities
    Weighted(BTreeMap<i64, f64>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RowNoiseOverride {
    pub row_probability: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ColumnNoiseOverride {
    pub cell_probability: Option<f64>,
    pub token_probability: Option<f64>,
    pub zipcode_digit_probabilities: Option<Vec<f64>>,
    pub possible_age_differences: Option<AgeDifferences>,
}

impl ColumnNoiseOverride {
    fn parameter_names(&self) -> Vec<&'static str> {
        let mut names = Vec::new();
        if self.cell_probability.is_some() {
            names.push(keys::CELL_PROBABILITY);
        }
        if self.token_probability.is_some() {
            names.push(keys::TOKEN_PROBABILITY);
        }
        if self.zipcode_digit_probabilities.is_some() {
            names.push(keys::ZIPCODE_DIGIT_PROBABILITIES);
        }
        if self.possible_age_differences.is_some() {
            names.push(keys::POSSIBLE_AGE_DIFFERENCES);
        }
        names
    }

    fn apply(&self, params: &mut ColumnNoiseParameters) {
        if let Some(p) = self.cell_probability {
            params.cell_probability = p;
        }
        if let Some(p) = self.token_probability {
            params.token_probability = Some(p);
        }
        if let Some(digits) = &self.zipcode_digit_probabilities {
            params.zipcode_digit_probabilities = Some(digits.clone());
        }
        if let Some(differences) = &self.possible_age_differences {
            // Default offsets the user left out stay declared at zero
            let mut formatted: BTreeMap<i64, f64> = params
                .possible_age_differences
                .iter()
                .flat_map(|d| d.keys())
                .map(|k| (*k, 0.0))
                .collect();
            match differences {
                AgeDifferences::Uniform(offsets) => {
                    let share = 1.0 / offsets.len() as f64;
                    formatted.extend(offsets.iter().map(|k| (*k, share)));
                }
                AgeDifferences::Weighted(weights) => formatted.extend(weights.clone()),
            }
            params.possible_age_differences = Some(formatted);
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DatasetOverrides {
    pub row_noise: BTreeMap<String, RowNoiseOverride>,
    pub column_noise: BTreeMap<String, BTreeMap<String, ColumnNoiseOverride>>,
}

impl DatasetOverrides {
    fn merge_into(&self, dataset_name: &str, dataset: &mut DatasetNoiseConfig) -> Result<()> {
        for (noise, row_override) in &self.row_noise {
            let params = dataset.row_noise.get_mut(noise).ok_or_else(|| {
                NoiseError::config_error(format!(
                    "Invalid noise type '{}' provided for dataset '{}'",
                    noise, dataset_name
                ))
            })?;
            if let Some(p) = row_override.row_probability {
                params.row_probability = p;
            }
        }

        for (column, types) in &self.column_noise {
            let configured = dataset.column_noise.get_mut(column).ok_or_else(|| {
                NoiseError::config_error(format!(
                    "Invalid column '{}' provided for dataset '{}'",
                    column, dataset_name
                ))
            })?;
            for (noise, column_override) in types {
                let params = configured.get_mut(noise).ok_or_else(|| {
                    NoiseError::config_error(format!(
                        "Invalid noise type '{}' provided for dataset '{}' for column '{}'",
                        noise, dataset_name, column
                    ))
                })?;
                let allowed = params.parameter_names();
                if let Some(unknown) = column_override
                    .parameter_names()
                    .into_iter()
                    .find(|name| !allowed.contains(name))
                {
                    return Err(NoiseError::config_error(format!(
                        "Invalid parameter '{}' provided for dataset '{}' for column '{}' and noise type '{}'",
                        unknown, dataset_name, column, noise
                    )));
                }
                column_override.apply(params);
            }
        }
        Ok(())
    }
}

/// Decoded user override document
///
/// Decoding checks the shape and ranges of every value; membership of
/// datasets, columns and noise types is checked when merging onto defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UserConfiguration {
    datasets: BTreeMap<String, DatasetOverrides>,
}

impl UserConfiguration {
    /// Decode an override document from a JSON value
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut datasets = BTreeMap::new();
        for (dataset_name, dataset_value) in as_mapping(value, "the configuration")? {
            if DatasetSchema::named(dataset_name).is_none() {
                return Err(NoiseError::config_error(format!(
                    "Invalid dataset '{}' provided. Valid datasets are {:?}",
                    dataset_name,
                    DATASETS.iter().map(|d| d.name).collect::<Vec<_>>()
                )));
            }
            datasets.insert(
                dataset_name.clone(),
                decode_dataset(dataset_name, dataset_value)?,
            );
        }
        Ok(Self { datasets })
    }

    /// Decode an override document from JSON text
    pub fn from_json_str(text: &str) -> Result<Self> {
        let value: Value = serde_json::from_str(text)?;
        Self::from_value(&value)
    }

    pub fn dataset(&self, name: &str) -> Option<&DatasetOverrides> {
        self.datasets.get(name)
    }

    pub fn is_empty(&self) -> bool {
        self.datasets.is_empty()
    }
}

impl TryFrom<Value> for UserConfiguration {
    type Error = NoiseError;

    fn try_from(value: Value) -> Result<Self> {
        Self::from_value(&value)
    }
}

fn as_mapping<'a>(value: &'a Value, context: &str) -> Result<&'a Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        NoiseError::config_error(format!(
            "Invalid configuration type for {}: expected a mapping",
            context
        ))
    })
}

fn decode_probability(value: &Value, context: &str) -> Result<f64> {
    let p = value.as_f64().ok_or_else(|| {
        NoiseError::config_error(format!("{} must be a float, got {}", context, value))
    })?;
    check_probability(p, context)?;
    Ok(p)
}

fn decode_dataset(dataset_name: &str, value: &Value) -> Result<DatasetOverrides> {
    let mut overrides = DatasetOverrides::default();
    for (key, section) in as_mapping(value, dataset_name)? {
        match key.as_str() {
            keys::ROW_NOISE => {
                for (noise, node) in as_mapping(section, key)? {
                    overrides
                        .row_noise
                        .insert(noise.clone(), decode_row_override(dataset_name, noise, node)?);
                }
            }
            keys::COLUMN_NOISE => {
                for (column, types) in as_mapping(section, key)? {
                    let mut decoded = BTreeMap::new();
                    for (noise, node) in as_mapping(types, column)? {
                        let context = format!("{} {} {}", dataset_name, column, noise);
                        decoded.insert(noise.clone(), decode_column_override(&context, node)?);
                    }
                    overrides.column_noise.insert(column.clone(), decoded);
                }
            }
            other => {
                return Err(NoiseError::config_error(format!(
                    "Invalid configuration key '{}' provided for dataset '{}'. Valid keys are {:?}",
                    other,
                    dataset_name,
                    [keys::ROW_NOISE, keys::COLUMN_NOISE]
                )))
            }
        }
    }
    Ok(overrides)
}

fn decode_row_override(dataset_name: &str, noise: &str, value: &Value) -> Result<RowNoiseOverride> {
    let mut decoded = RowNoiseOverride::default();
    for (parameter, node) in as_mapping(value, noise)? {
        let context = format!("{} {} {}", dataset_name, noise, parameter);
        match parameter.as_str() {
            keys::ROW_PROBABILITY => decoded.row_probability = Some(decode_probability(node, &context)?),
            other => {
                return Err(NoiseError::config_error(format!(
                    "Invalid parameter '{}' provided for dataset '{}' and noise type '{}'",
                    other, dataset_name, noise
                )))
            }
        }
    }
    Ok(decoded)
}

fn decode_column_override(context: &str, value: &Value) -> Result<ColumnNoiseOverride> {
    let mut decoded = ColumnNoiseOverride::default();
    for (parameter, node) in as_mapping(value, context)? {
        let parameter_context = format!("{} {}", context, parameter);
        match parameter.as_str() {
            keys::CELL_PROBABILITY => {
                decoded.cell_probability = Some(decode_probability(node, &parameter_context)?)
            }
            keys::TOKEN_PROBABILITY => {
                decoded.token_probability = Some(decode_probability(node, &parameter_context)?)
            }
            keys::ZIPCODE_DIGIT_PROBABILITIES => {
                decoded.zipcode_digit_probabilities =
                    Some(decode_zipcode_digits(node, &parameter_context)?)
            }
            keys::POSSIBLE_AGE_DIFFERENCES => {
                decoded.possible_age_differences =
                    Some(decode_age_differences(node, &parameter_context)?)
            }
            other => {
                return Err(NoiseError::config_error(format!(
                    "Invalid parameter '{}' provided for {}",
                    other, context
                )))
            }
        }
    }
    Ok(decoded)
}

fn decode_zipcode_digits(value: &Value, context: &str) -> Result<Vec<f64>> {
    let items = value.as_array().ok_or_else(|| {
        NoiseError::config_error(format!(
            "Invalid configuration type for {}: expected a list",
            context
        ))
    })?;
    if items.len() != ZIPCODE_DIGITS {
        return Err(NoiseError::config_error(format!(
            "{} must be 5 values, got {}",
            context,
            items.len()
        )));
    }
    items.iter().map(|item| decode_probability(item, context)).collect()
}

fn decode_age_offset(value: &Value, context: &str) -> Result<i64> {
    let offset = value.as_i64().ok_or_else(|| {
        NoiseError::config_error(format!("{} offsets must be ints, got {}", context, value))
    })?;
    if offset == 0 {
        return Err(NoiseError::config_error(format!("{}: Cannot include 0", context)));
    }
    Ok(offset)
}

fn decode_age_differences(value: &Value, context: &str) -> Result<AgeDifferences> {
    match value {
        Value::Array(items) => {
            if items.is_empty() {
                return Err(NoiseError::config_error(format!(
                    "{} must list at least one offset",
                    context
                )));
            }
            let offsets: BTreeSet<i64> = items
                .iter()
                .map(|item| decode_age_offset(item, context))
                .collect::<Result<_>>()?;
            Ok(AgeDifferences::Uniform(offsets.into_iter().collect()))
        }
        Value::Object(map) => {
            let mut weights = BTreeMap::new();
            for (key, weight) in map {
                let offset = key.trim().parse::<i64>().map_err(|_| {
                    NoiseError::config_error(format!("{} offsets must be ints, got '{}'", context, key))
                })?;
                if offset == 0 {
                    return Err(NoiseError::config_error(format!("{}: Cannot include 0", context)));
                }
                weights.insert(offset, decode_probability(weight, context)?);
            }
            let total: f64 = weights.values().sum();
            if !sums_to_one(total) {
                return Err(NoiseError::config_error(format!(
                    "{} probabilities must sum to 1, got {}",
                    context, total
                )));
            }
            Ok(AgeDifferences::Weighted(weights))
        }
        _ => Err(NoiseError::config_error(format!(
            "Invalid configuration type for {}: expected a list or mapping",
            context
        ))),
    }
}
