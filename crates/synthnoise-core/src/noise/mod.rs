//! Noise library
//!
//! - [`types`]: noise kinds, descriptors and the ordered catalog
//! - [`row`]: whole-table transforms that remove rows
//! - [`column`]: per-column corruption algorithms
//! - [`scan`]: greedy token scanners behind the string corruptors

pub mod column;
pub mod row;
pub mod scan;
pub mod types;

pub use types::{
    ColumnNoiseFn, ColumnNoiseKind, ColumnNoiseType, NoiseCatalog, NoiseType, RowNoiseFn,
    RowNoiseKind, RowNoiseType,
};

use std::fmt;

use crate::data::LookupTables;
use crate::randomness::RandomnessStream;
use crate::schema::DatasetSchema;
use crate::table::Table;
use crate::{NoiseError, Result};

// ----------------------------------------------------------------------------
// Household Member Linkage
// ----------------------------------------------------------------------------

/// Source of another household member's value for a field
///
/// Linkage policy is supplied by the caller; the engine only asks which
/// columns a row needs to be eligible and what value to copy into it.
pub trait HouseholdMemberSource: fmt::Debug + Send + Sync {
    /// Columns that must be non-missing for `column` to be copied into a row
    fn required_columns(&self, column: &str) -> Vec<String>;

    /// Household member values for the given table positions, in order
    fn member_values(
        &self,
        table: &Table,
        column: &str,
        positions: &[usize],
    ) -> Result<Vec<Option<String>>>;
}

/// Household member values carried alongside each record in `copy_<column>`
#[derive(Debug, Clone, Copy, Default)]
pub struct ShadowColumns;

impl ShadowColumns {
    pub fn shadow_column(column: &str) -> String {
        format!("copy_{}", column)
    }
}

impl HouseholdMemberSource for ShadowColumns {
    fn required_columns(&self, column: &str) -> Vec<String> {
        vec![column.to_string(), Self::shadow_column(column)]
    }

    fn member_values(
        &self,
        table: &Table,
        column: &str,
        positions: &[usize],
    ) -> Result<Vec<Option<String>>> {
        let shadow_name = Self::shadow_column(column);
        let shadow = table.column(&shadow_name).ok_or_else(|| {
            NoiseError::invalid_data(
                column,
                format!("household member values require column '{}'", shadow_name),
            )
        })?;
        Ok(positions
            .iter()
            .map(|&pos| shadow.get(pos).map(str::to_string))
            .collect())
    }
}

// ----------------------------------------------------------------------------
// Noise Context
// ----------------------------------------------------------------------------

/// Everything a noise function may consult besides the table itself
#[derive(Debug, Clone, Copy)]
pub struct NoiseContext<'a> {
    pub dataset: &'a DatasetSchema,
    pub randomness: &'a RandomnessStream,
    pub lookups: &'a LookupTables,
    pub household: &'a dyn HouseholdMemberSource,
}
