//! Noise orchestrator
//!
//! Walks the catalog in order. A row-noise type replaces the working table
//! whenever the dataset's configuration lists it, even at probability zero; a column-noise type is
//! applied to every present column whose configuration names it, each time
//! against the table as left by the previous step.

use tracing::{debug, info};

use crate::config::{DatasetNoiseConfig, NoiseConfiguration};
use crate::data::LookupTables;
use crate::noise::{
    ColumnNoiseKind, HouseholdMemberSource, NoiseCatalog, NoiseContext, NoiseType, ShadowColumns,
};
use crate::randomness::{RandomnessStream, Seed};
use crate::schema::DatasetSchema;
use crate::table::Table;
use crate::{NoiseError, Result};

/// Applies configured noise to dataset tables
#[derive(Debug)]
pub struct NoiseEngine {
    catalog: NoiseCatalog,
    lookups: LookupTables,
    household: Box<dyn HouseholdMemberSource>,
}

impl NoiseEngine {
    /// Engine with the built-in catalog, reference data and `copy_<column>`
    /// household member values
    pub fn new() -> Self {
        Self {
            catalog: NoiseCatalog::new(),
            lookups: LookupTables::builtin(),
            household: Box::new(ShadowColumns),
        }
    }

    /// Replace the household member linkage
    pub fn with_household_source<H>(mut self, source: H) -> Self
    where
        H: HouseholdMemberSource + 'static,
    {
        self.household = Box::new(source);
        self
    }

    /// Replace the reference data
    pub fn with_lookups(mut self, lookups: LookupTables) -> Self {
        self.lookups = lookups;
        self
    }

    pub fn catalog(&self) -> &NoiseCatalog {
        &self.catalog
    }

    pub fn lookups(&self) -> &LookupTables {
        &self.lookups
    }

    /// Default configuration for every built-in dataset
    pub fn default_configuration(&self) -> NoiseConfiguration {
        NoiseConfiguration::default_for(&self.catalog)
    }

    /// Configuration with every probability at zero
    pub fn no_noise_configuration(&self) -> NoiseConfiguration {
        NoiseConfiguration::no_noise(&self.catalog)
    }

    /// Checks that can fail before any row is touched
    pub fn preflight<'c>(
        &self,
        dataset: &DatasetSchema,
        configuration: &'c NoiseConfiguration,
    ) -> Result<&'c DatasetNoiseConfig> {
        configuration.validate()?;
        let dataset_config = configuration
            .dataset(dataset.name)
            .ok_or_else(|| NoiseError::unknown_dataset(dataset.name))?;
        for (column, _) in dataset_config.columns_with(ColumnNoiseKind::SwapMonthAndDay) {
            let declared = dataset.column(column).and_then(|c| c.date_format);
            if declared.is_none() {
                return Err(NoiseError::config_error(format!(
                    "column '{}' of dataset '{}' enables swap_month_and_day but declares no date format",
                    column, dataset.name
                )));
            }
        }
        Ok(dataset_config)
    }

    /// Noise one table of `dataset`
    pub fn noise_dataset(
        &self,
        dataset: &DatasetSchema,
        table: Table,
        configuration: &NoiseConfiguration,
        seed: &Seed,
    ) -> Result<Table> {
        let dataset_config = self.preflight(dataset, configuration)?;
        let randomness = RandomnessStream::new(dataset.name, seed.clone());
        let ctx = NoiseContext {
            dataset,
            randomness: &randomness,
            lookups: &self.lookups,
            household: self.household.as_ref(),
        };

        info!(dataset = dataset.name, seed = %seed, rows = table.len(), "Noising dataset");
        let mut table = table;
        for noise_type in self.catalog.iter() {
            match noise_type {
                NoiseType::Row(noise) => {
                    let Some(params) = dataset_config.row(noise.kind) else {
                        debug!(
                            dataset = dataset.name,
                            noise_type = noise.name(),
                            "Row noise not configured"
                        );
                        continue;
                    };
                    table = noise
                        .apply(&ctx, table, params)
                        .map_err(|e| e.while_applying(dataset.name, noise.name(), "rows"))?;
                }
                NoiseType::Column(noise) => {
                    let targets: Vec<_> = dataset_config
                        .columns_with(noise.kind)
                        .filter(|(column, _)| table.has_column(column))
                        .collect();
                    for (column, params) in targets {
                        noise.apply(&ctx, &mut table, column, params).map_err(|e| {
                            e.while_applying(
                                dataset.name,
                                noise.name(),
                                format!("column '{}'", column),
                            )
                        })?;
                    }
                }
            }
        }
        info!(dataset = dataset.name, rows = table.len(), "Finished noising dataset");
        Ok(table)
    }

    /// Noise every shard of a dataset and combine them
    ///
    /// Shard `i` is noised with seed `"{seed}_{i}"`. Empty shards are skipped,
    /// and the result holds exactly the dataset's columns in schema order.
    pub fn generate<I>(
        &self,
        dataset: &DatasetSchema,
        shards: I,
        configuration: &NoiseConfiguration,
        seed: &Seed,
    ) -> Result<Table>
    where
        I: IntoIterator<Item = Table>,
    {
        self.preflight(dataset, configuration)?;
        let schema_types = || dataset.columns.iter().map(|c| (c.name, c.dtype));

        let mut noised = Vec::new();
        for (index, mut shard) in shards.into_iter().enumerate() {
            if shard.is_empty() {
                debug!(dataset = dataset.name, shard = index, "Skipping empty shard");
                continue;
            }
            let missing: Vec<String> = dataset
                .column_names()
                .filter(|name| !shard.has_column(name))
                .map(String::from)
                .collect();
            if !missing.is_empty() {
                return Err(NoiseError::missing_columns(dataset.name, missing));
            }
            shard.coerce_dtypes(schema_types());
            info!(dataset = dataset.name, shard = index, "Noising shard");
            noised.push(self.noise_dataset(dataset, shard, configuration, &seed.for_shard(index))?);
        }
        if noised.is_empty() {
            return Err(NoiseError::no_data(dataset.name));
        }

        let mut combined = Table::concat(noised)?;
        combined.coerce_dtypes(schema_types());
        Ok(combined.select_columns(dataset.column_names()))
    }
}

impl Default for NoiseEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::UserConfiguration;
    use crate::schema::{CENSUS, CPS, SSA};
    use crate::table::Column;
    use serde_json::json;

    fn column(name: &str, values: Vec<String>) -> Column {
        Column::new(name, crate::table::DType::String, values.into_iter().map(Some).collect())
    }

    fn repeated(name: &str, rows: usize, value: &str) -> Column {
        column(name, vec![value.to_string(); rows])
    }

    fn ssa_table(rows: usize) -> Table {
        Table::new(vec![
            column("simulant_id", (0..rows).map(|i| format!("0_{}", i)).collect()),
            repeated("first_name", rows, "Robert"),
            repeated("middle_initial", rows, "Q"),
            repeated("last_name", rows, "Smith"),
            repeated("date_of_birth", rows, "19800704"),
            column("ssn", (0..rows).map(|i| format!("123-45-{:04}", i)).collect()),
            repeated("event_type", rows, "creation"),
            repeated("event_date", rows, "19800704"),
        ])
        .unwrap()
    }

    #[test]
    fn test_no_noise_is_identity() {
        let engine = NoiseEngine::new();
        let table = ssa_table(200);
        let noised = engine
            .noise_dataset(&SSA, table.clone(), &engine.no_noise_configuration(), &Seed::from(1u64))
            .unwrap();
        assert_eq!(noised, table);
    }

    #[test]
    fn test_survey_oversampling_applies_without_noise() {
        let engine = NoiseEngine::new();
        let rows = 4_000;
        let table = Table::new(vec![
            column("simulant_id", (0..rows).map(|i| format!("0_{}", i)).collect()),
            repeated("age", rows, "35"),
            repeated("sex", rows, "Male"),
            repeated("race_ethnicity", rows, "White"),
        ])
        .unwrap();
        let noised = engine
            .noise_dataset(&CPS, table, &engine.no_noise_configuration(), &Seed::from(5u64))
            .unwrap();
        let kept = noised.len() as f64 / rows as f64;
        assert!((kept - 0.5).abs() < 0.03, "kept {}", kept);
    }

    #[test]
    fn test_census_without_demographics_is_rejected() {
        let engine = NoiseEngine::new();
        let table = Table::new(vec![Column::from_strs("zipcode", &["12345"])]).unwrap();
        let err = engine
            .noise_dataset(&CENSUS, table, &engine.no_noise_configuration(), &Seed::from(0u64))
            .unwrap_err();
        assert!(err.to_string().contains("do_not_respond"), "{}", err);
    }

    #[test]
    fn test_unknown_dataset_configuration() {
        let engine = NoiseEngine::new();
        let err = engine
            .noise_dataset(&SSA, ssa_table(3), &NoiseConfiguration::default(), &Seed::from(1u64))
            .unwrap_err();
        assert!(matches!(err, NoiseError::UnknownDataset { .. }));
    }

    #[test]
    fn test_generate_skips_empty_shards_and_orders_columns() {
        let engine = NoiseEngine::new();
        let shards = vec![ssa_table(5), ssa_table(0), ssa_table(4)];
        let noised = engine
            .generate(&SSA, shards, &engine.no_noise_configuration(), &Seed::from(3u64))
            .unwrap();
        assert_eq!(noised.len(), 9);
        assert_eq!(noised.index(), &[0, 1, 2, 3, 4, 5, 6, 7, 8]);
        assert_eq!(
            noised.column_names().collect::<Vec<_>>(),
            SSA.column_names().collect::<Vec<_>>()
        );
    }

    #[test]
    fn test_generate_rejects_all_empty_input() {
        let engine = NoiseEngine::new();
        let err = engine
            .generate(&SSA, vec![ssa_table(0)], &engine.default_configuration(), &Seed::from(3u64))
            .unwrap_err();
        assert!(matches!(err, NoiseError::NoData { .. }));
    }

    #[test]
    fn test_generate_requires_schema_columns() {
        let engine = NoiseEngine::new();
        let shard = Table::new(vec![Column::from_strs("first_name", &["Ann"])]).unwrap();
        let err = engine
            .generate(&SSA, vec![shard], &engine.default_configuration(), &Seed::from(3u64))
            .unwrap_err();
        assert!(matches!(err, NoiseError::MissingColumns { .. }));
    }

    #[test]
    fn test_errors_name_noise_type_and_column() {
        let engine = NoiseEngine::new();
        let user = UserConfiguration::from_value(&json!({"decennial_census": {"column_noise": {
            "zipcode": {"write_wrong_zipcode_digits": {"cell_probability": 1.0}}
        }}}))
        .unwrap();
        let configuration = engine
            .no_noise_configuration()
            .with_user_overrides(&user)
            .unwrap();
        let table = Table::new(vec![
            Column::from_strs("zipcode", &["1234"]),
            Column::from_strs("age", &["40"]),
            Column::from_strs("sex", &["Female"]),
            Column::from_strs("race_ethnicity", &["White"]),
        ])
        .unwrap();
        let err = engine
            .noise_dataset(&CENSUS, table, &configuration, &Seed::from(0u64))
            .unwrap_err();
        let message = err.to_string();
        assert!(message.contains("write_wrong_zipcode_digits"), "{}", message);
        assert!(message.contains("zipcode"), "{}", message);
        assert!(message.contains("decennial_census"), "{}", message);
    }
}
