//! Noise-type descriptors and the ordered catalog
//!
//! A descriptor pairs a noise type's name with its algorithm and defaults.
//! The catalog lists every descriptor once; its order is the order noise is
//! applied in, for every dataset.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::{column, row, NoiseContext};
use crate::config::{ColumnNoiseParameters, RowNoiseParameters};
use crate::selection::{get_index_to_noise, NoiseLevel};
use crate::table::Table;
use crate::{NoiseError, Result};

// ----------------------------------------------------------------------------
// Noise Kinds
// ----------------------------------------------------------------------------

/// Row-noise types, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowNoiseKind {
    OmitRow,
    DoNotRespond,
    DuplicateRow,
}

impl RowNoiseKind {
    pub const ALL: [RowNoiseKind; 3] = [Self::OmitRow, Self::DoNotRespond, Self::DuplicateRow];

    /// Configuration key and random-draw key of this noise type
    pub fn name(self) -> &'static str {
        match self {
            Self::OmitRow => "omit_row",
            Self::DoNotRespond => "do_not_respond",
            Self::DuplicateRow => "duplicate_row",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

/// Column-noise types, in catalog order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColumnNoiseKind {
    LeaveBlank,
    ChooseWrongOption,
    CopyFromHouseholdMember,
    SwapMonthAndDay,
    WriteWrongZipcodeDigits,
    MisreportAge,
    WriteWrongDigits,
    UseNickname,
    UseFakeName,
    MakePhoneticErrors,
    MakeOcrErrors,
    MakeTypos,
}

impl ColumnNoiseKind {
    pub const ALL: [ColumnNoiseKind; 12] = [
        Self::LeaveBlank,
        Self::ChooseWrongOption,
        Self::CopyFromHouseholdMember,
        Self::SwapMonthAndDay,
        Self::WriteWrongZipcodeDigits,
        Self::MisreportAge,
        Self::WriteWrongDigits,
        Self::UseNickname,
        Self::UseFakeName,
        Self::MakePhoneticErrors,
        Self::MakeOcrErrors,
        Self::MakeTypos,
    ];

    /// Configuration key and random-draw key of this noise type
    pub fn name(self) -> &'static str {
        match self {
            Self::LeaveBlank => "leave_blank",
            Self::ChooseWrongOption => "choose_wrong_option",
            Self::CopyFromHouseholdMember => "copy_from_household_member",
            Self::SwapMonthAndDay => "swap_month_and_day",
            Self::WriteWrongZipcodeDigits => "write_wrong_zipcode_digits",
            Self::MisreportAge => "misreport_age",
            Self::WriteWrongDigits => "write_wrong_digits",
            Self::UseNickname => "use_nickname",
            Self::UseFakeName => "use_fake_name",
            Self::MakePhoneticErrors => "make_phonetic_errors",
            Self::MakeOcrErrors => "make_ocr_errors",
            Self::MakeTypos => "make_typos",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.name() == name)
    }
}

impl fmt::Display for RowNoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl fmt::Display for ColumnNoiseKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ----------------------------------------------------------------------------
// Descriptors
// ----------------------------------------------------------------------------

/// Whole-table transform
pub type RowNoiseFn = fn(&NoiseContext<'_>, Table, &RowNoiseParameters) -> Result<Table>;

/// Replacement values for the selected positions of one column, in order
pub type ColumnNoiseFn = fn(
    &NoiseContext<'_>,
    &Table,
    &[usize],
    &str,
    &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>>;

/// Multiplier applied to the configured cell probability
pub type ScalingFn = fn(&NoiseContext<'_>, &Table, &str) -> f64;

/// Columns that must be non-missing for a row to be eligible
pub type RequiredColumnsFn = fn(&NoiseContext<'_>, &str) -> Vec<String>;

#[derive(Clone)]
pub struct RowNoiseType {
    pub kind: RowNoiseKind,
    pub default_row_probability: f64,
    noise_fn: RowNoiseFn,
}

impl fmt::Debug for RowNoiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RowNoiseType")
            .field("kind", &self.kind)
            .field("default_row_probability", &self.default_row_probability)
            .finish()
    }
}

impl RowNoiseType {
    fn for_kind(kind: RowNoiseKind) -> Self {
        let noise_fn: RowNoiseFn = match kind {
            RowNoiseKind::OmitRow => row::omit_rows,
            RowNoiseKind::DoNotRespond => row::apply_do_not_respond,
            RowNoiseKind::DuplicateRow => row::duplicate_rows,
        };
        Self {
            kind,
            default_row_probability: 0.0,
            noise_fn,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Apply to the whole table
    pub fn apply(
        &self,
        ctx: &NoiseContext<'_>,
        table: Table,
        params: &RowNoiseParameters,
    ) -> Result<Table> {
        let before = table.len();
        let noised = (self.noise_fn)(ctx, table, params)?;
        debug!(
            dataset = ctx.dataset.name,
            noise_type = self.name(),
            rows_before = before,
            rows_after = noised.len(),
            "Applied row noise"
        );
        Ok(noised)
    }
}

#[derive(Clone)]
pub struct ColumnNoiseType {
    pub kind: ColumnNoiseKind,
    pub default_parameters: ColumnNoiseParameters,
    noise_fn: ColumnNoiseFn,
    scaling_fn: Option<ScalingFn>,
    required_columns_fn: Option<RequiredColumnsFn>,
}

impl fmt::Debug for ColumnNoiseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnNoiseType")
            .field("kind", &self.kind)
            .field("default_parameters", &self.default_parameters)
            .field("scaled", &self.scaling_fn.is_some())
            .finish()
    }
}

const DEFAULT_CELL_PROBABILITY: f64 = 0.01;
const DEFAULT_TOKEN_PROBABILITY: f64 = 0.1;
const DEFAULT_ZIPCODE_DIGIT_PROBABILITIES: [f64; 5] = [0.04, 0.04, 0.20, 0.36, 0.36];
const DEFAULT_AGE_DIFFERENCES: [i64; 4] = [-2, -1, 1, 2];

impl ColumnNoiseType {
    fn for_kind(kind: ColumnNoiseKind) -> Self {
        use ColumnNoiseKind::*;

        let mut default_parameters = ColumnNoiseParameters::with_cell_probability(DEFAULT_CELL_PROBABILITY);
        let mut scaling_fn: Option<ScalingFn> = None;
        let mut required_columns_fn: Option<RequiredColumnsFn> = None;
        let noise_fn: ColumnNoiseFn = match kind {
            LeaveBlank => column::leave_blanks,
            ChooseWrongOption => column::choose_wrong_options,
            CopyFromHouseholdMember => {
                scaling_fn = Some(column::copy_from_household_member_scaling);
                required_columns_fn = Some(column::copy_from_household_member_required_columns);
                column::copy_from_household_members
            }
            SwapMonthAndDay => column::swap_months_and_days,
            WriteWrongZipcodeDigits => {
                default_parameters.zipcode_digit_probabilities =
                    Some(DEFAULT_ZIPCODE_DIGIT_PROBABILITIES.to_vec());
                column::write_wrong_zipcode_digits
            }
            MisreportAge => {
                let share = 1.0 / DEFAULT_AGE_DIFFERENCES.len() as f64;
                default_parameters.possible_age_differences = Some(
                    DEFAULT_AGE_DIFFERENCES
                        .iter()
                        .map(|d| (*d, share))
                        .collect::<BTreeMap<_, _>>(),
                );
                column::misreport_ages
            }
            WriteWrongDigits => {
                default_parameters.token_probability = Some(DEFAULT_TOKEN_PROBABILITY);
                column::write_wrong_digits
            }
            UseNickname => {
                scaling_fn = Some(column::nickname_scaling);
                column::use_nicknames
            }
            UseFakeName => column::use_fake_names,
            MakePhoneticErrors => {
                default_parameters.token_probability = Some(DEFAULT_TOKEN_PROBABILITY);
                column::make_phonetic_errors
            }
            MakeOcrErrors => {
                default_parameters.token_probability = Some(DEFAULT_TOKEN_PROBABILITY);
                column::make_ocr_errors
            }
            MakeTypos => {
                default_parameters.token_probability = Some(DEFAULT_TOKEN_PROBABILITY);
                column::make_typos
            }
        };
        Self {
            kind,
            default_parameters,
            noise_fn,
            scaling_fn,
            required_columns_fn,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Columns whose cells must all be non-missing for a row to be eligible
    pub fn required_columns(&self, ctx: &NoiseContext<'_>, column: &str) -> Vec<String> {
        match self.required_columns_fn {
            Some(required) => required(ctx, column),
            None => vec![column.to_string()],
        }
    }

    /// Effective cell probability before clamping
    pub fn noise_level(
        &self,
        ctx: &NoiseContext<'_>,
        table: &Table,
        column: &str,
        params: &ColumnNoiseParameters,
    ) -> f64 {
        let scaling = self.scaling_fn.map_or(1.0, |scale| scale(ctx, table, column));
        params.cell_probability * scaling
    }

    /// Apply to one column of the table in place
    pub fn apply(
        &self,
        ctx: &NoiseContext<'_>,
        table: &mut Table,
        column: &str,
        params: &ColumnNoiseParameters,
    ) -> Result<()> {
        let target = table.require_column(column)?;
        if target.is_entirely_missing() {
            debug!(
                dataset = ctx.dataset.name,
                noise_type = self.name(),
                column,
                "Column is empty, skipping"
            );
            return Ok(());
        }
        let mut level = self.noise_level(ctx, table, column, params);
        if level > 1.0 {
            warn!(
                dataset = ctx.dataset.name,
                noise_type = self.name(),
                column,
                level,
                "Noise level exceeds 1.0, clamping"
            );
            level = 1.0;
        }

        let required = self.required_columns(ctx, column);
        let positions = get_index_to_noise(
            table,
            &NoiseLevel::Uniform(level),
            ctx.randomness,
            &format!("{}_{}", self.name(), column),
            Some(&required),
        );
        if positions.is_empty() {
            debug!(
                dataset = ctx.dataset.name,
                noise_type = self.name(),
                column,
                "No cells chosen to noise"
            );
            return Ok(());
        }

        let noised = (self.noise_fn)(ctx, table, &positions, column, params)?;
        if noised.len() != positions.len() {
            return Err(NoiseError::invalid_data(
                column,
                format!(
                    "{} returned {} values for {} selected cells",
                    self.name(),
                    noised.len(),
                    positions.len()
                ),
            ));
        }
        let target = table
            .column_mut(column)
            .ok_or_else(|| NoiseError::invalid_data(column, "column is not present in the table"))?;
        for (position, value) in positions.iter().zip(noised) {
            target.values[*position] = value;
        }
        debug!(
            dataset = ctx.dataset.name,
            noise_type = self.name(),
            column,
            cells = positions.len(),
            "Applied column noise"
        );
        Ok(())
    }
}

// ----------------------------------------------------------------------------
// Catalog
// ----------------------------------------------------------------------------

/// Catalog entry: a row-noise or column-noise descriptor
#[derive(Debug, Clone, Copy)]
pub enum NoiseType<'a> {
    Row(&'a RowNoiseType),
    Column(&'a ColumnNoiseType),
}

impl NoiseType<'_> {
    pub fn name(&self) -> &'static str {
        match self {
            NoiseType::Row(noise) => noise.name(),
            NoiseType::Column(noise) => noise.name(),
        }
    }
}

/// Every noise type, in application order
#[derive(Debug, Clone)]
pub struct NoiseCatalog {
    rows: Vec<RowNoiseType>,
    columns: Vec<ColumnNoiseType>,
}

impl NoiseCatalog {
    pub fn new() -> Self {
        Self {
            rows: RowNoiseKind::ALL.into_iter().map(RowNoiseType::for_kind).collect(),
            columns: ColumnNoiseKind::ALL
                .into_iter()
                .map(ColumnNoiseType::for_kind)
                .collect(),
        }
    }

    /// Row-noise types first, then column-noise types
    pub fn iter(&self) -> impl Iterator<Item = NoiseType<'_>> {
        self.rows
            .iter()
            .map(NoiseType::Row)
            .chain(self.columns.iter().map(NoiseType::Column))
    }

    pub fn row_noise_type(&self, kind: RowNoiseKind) -> &RowNoiseType {
        &self.rows[kind as usize]
    }

    pub fn column_noise_type(&self, kind: ColumnNoiseKind) -> &ColumnNoiseType {
        &self.columns[kind as usize]
    }

    pub fn len(&self) -> usize {
        self.rows.len() + self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for NoiseCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order() {
        let names: Vec<&str> = NoiseCatalog::new().iter().map(|n| n.name()).collect();
        assert_eq!(
            names,
            vec![
                "omit_row",
                "do_not_respond",
                "duplicate_row",
                "leave_blank",
                "choose_wrong_option",
                "copy_from_household_member",
                "swap_month_and_day",
                "write_wrong_zipcode_digits",
                "misreport_age",
                "write_wrong_digits",
                "use_nickname",
                "use_fake_name",
                "make_phonetic_errors",
                "make_ocr_errors",
                "make_typos",
            ]
        );
    }

    #[test]
    fn test_lookup_by_kind() {
        let catalog = NoiseCatalog::new();
        for kind in ColumnNoiseKind::ALL {
            assert_eq!(catalog.column_noise_type(kind).kind, kind);
        }
        for kind in RowNoiseKind::ALL {
            assert_eq!(catalog.row_noise_type(kind).kind, kind);
        }
    }

    #[test]
    fn test_names_round_trip() {
        for kind in ColumnNoiseKind::ALL {
            assert_eq!(ColumnNoiseKind::from_name(kind.name()), Some(kind));
        }
        assert_eq!(RowNoiseKind::from_name("omit_row"), Some(RowNoiseKind::OmitRow));
        assert!(ColumnNoiseKind::from_name("omit_row").is_none());
    }

    #[test]
    fn test_kind_serde_names_match() {
        let value = serde_json::to_value(ColumnNoiseKind::WriteWrongZipcodeDigits).unwrap();
        assert_eq!(value, serde_json::json!("write_wrong_zipcode_digits"));
    }

    #[test]
    fn test_column_noise_keeps_declared_dtype() {
        use crate::data::LookupTables;
        use crate::noise::ShadowColumns;
        use crate::randomness::{RandomnessStream, Seed};
        use crate::schema::CENSUS;
        use crate::table::{Column, DType};

        let randomness = RandomnessStream::new(CENSUS.name, Seed::from(4u64));
        let lookups = LookupTables::builtin();
        let ctx = NoiseContext {
            dataset: &CENSUS,
            randomness: &randomness,
            lookups: &lookups,
            household: &ShadowColumns,
        };
        let states = vec![Some("WA".to_string()); 50];
        let mut table = Table::new(vec![Column::new("state", DType::Categorical, states)]).unwrap();

        let catalog = NoiseCatalog::new();
        catalog
            .column_noise_type(ColumnNoiseKind::ChooseWrongOption)
            .apply(&ctx, &mut table, "state", &ColumnNoiseParameters::with_cell_probability(1.0))
            .unwrap();

        let state = table.column("state").unwrap();
        assert_eq!(state.dtype, DType::Categorical);
        assert!(state.values.iter().any(|v| v.as_deref() != Some("WA")));
    }

    #[test]
    fn test_token_defaults() {
        let catalog = NoiseCatalog::new();
        let typos = catalog.column_noise_type(ColumnNoiseKind::MakeTypos);
        assert_eq!(typos.default_parameters.token_probability, Some(0.1));
        let blank = catalog.column_noise_type(ColumnNoiseKind::LeaveBlank);
        assert_eq!(blank.default_parameters.parameter_names(), vec!["cell_probability"]);
    }
}
