//! In-memory working table
//!
//! A [`Table`] is a set of equally long string columns sharing a stable
//! integer row index. Row keys survive row removal, so random draws keyed on
//! them stay attached to the same record for the whole noising pass.

use serde::{Deserialize, Serialize};

use crate::{NoiseError, Result};

/// Stable identifier of a row, used as the per-row key for random draws
pub type RowKey = u64;

// ----------------------------------------------------------------------------
// Storage Types
// ----------------------------------------------------------------------------

/// Declared storage type of a column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DType {
    /// Free-form text
    String,
    /// Value drawn from a closed set of categories
    Categorical,
    /// Calendar value held in its formatted string encoding
    Datetime,
}

/// Whether a cell counts as missing
pub fn is_missing(value: Option<&str>) -> bool {
    matches!(value, None | Some(""))
}

// ----------------------------------------------------------------------------
// Column
// ----------------------------------------------------------------------------

/// A named, typed column of optional string cells
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Column {
    pub name: String,
    pub dtype: DType,
    pub values: Vec<Option<String>>,
}

impl Column {
    /// Create a column from its cells
    pub fn new<N: Into<String>>(name: N, dtype: DType, values: Vec<Option<String>>) -> Self {
        Self {
            name: name.into(),
            dtype,
            values,
        }
    }

    /// Create a string column where every cell is present
    pub fn from_strs<N: Into<String>>(name: N, values: &[&str]) -> Self {
        Self::new(
            name,
            DType::String,
            values.iter().map(|v| Some((*v).into())).collect(),
        )
    }

    /// Borrow a cell
    pub fn get(&self, position: usize) -> Option<&str> {
        self.values.get(position).and_then(|v| v.as_deref())
    }

    /// Whether the cell at `position` is missing
    pub fn is_missing_at(&self, position: usize) -> bool {
        is_missing(self.get(position))
    }

    /// Whether every cell is missing
    pub fn is_entirely_missing(&self) -> bool {
        self.values.iter().all(|v| is_missing(v.as_deref()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

// ----------------------------------------------------------------------------
// Table
// ----------------------------------------------------------------------------

/// A working dataset: row keys plus ordered columns of equal length
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Table {
    index: Vec<RowKey>,
    columns: Vec<Column>,
}

impl Table {
    /// Create a table with index `0..n` from columns of equal length
    pub fn new(columns: Vec<Column>) -> Result<Self> {
        let rows = columns.first().map(Column::len).unwrap_or(0);
        Self::with_index((0..rows as RowKey).collect(), columns)
    }

    /// Create a table with an explicit row index
    pub fn with_index(index: Vec<RowKey>, columns: Vec<Column>) -> Result<Self> {
        for column in &columns {
            if column.len() != index.len() {
                return Err(NoiseError::invalid_data(
                    column.name.clone(),
                    format!(
                        "column has {} rows but the table index has {}",
                        column.len(),
                        index.len()
                    ),
                ));
            }
        }
        for (i, column) in columns.iter().enumerate() {
            if columns[..i].iter().any(|c| c.name == column.name) {
                return Err(NoiseError::invalid_data(
                    column.name.clone(),
                    "column name appears more than once",
                ));
            }
        }
        Ok(Self { index, columns })
    }

    /// Row keys in row order
    pub fn index(&self) -> &[RowKey] {
        &self.index
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn column_names(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|c| c.name.as_str())
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.name == name)
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_mut(&mut self, name: &str) -> Option<&mut Column> {
        self.columns.iter_mut().find(|c| c.name == name)
    }

    /// Look up a column, failing with a data-shape error naming it
    pub fn require_column(&self, name: &str) -> Result<&Column> {
        self.column(name)
            .ok_or_else(|| NoiseError::invalid_data(name, "column is not present in the table"))
    }

    /// Cell at `position` of column `name`
    pub fn value(&self, name: &str, position: usize) -> Option<&str> {
        self.column(name).and_then(|c| c.get(position))
    }

    /// Positions whose cells are non-missing in every one of `required`
    ///
    /// An absent required column makes every row ineligible.
    pub fn non_missing_positions(&self, required: &[String]) -> Vec<usize> {
        let columns: Option<Vec<&Column>> = required.iter().map(|n| self.column(n)).collect();
        let Some(columns) = columns else {
            return Vec::new();
        };
        (0..self.len())
            .filter(|&pos| columns.iter().all(|c| !c.is_missing_at(pos)))
            .collect()
    }

    /// Keep only rows whose position has `keep[position] == true`
    pub fn retain_rows(&mut self, keep: &[bool]) {
        let mut flags = keep.iter();
        self.index.retain(|_| *flags.next().unwrap_or(&false));
        for column in &mut self.columns {
            let mut flags = keep.iter();
            column.values.retain(|_| *flags.next().unwrap_or(&false));
        }
    }

    /// Drop the rows at the given positions
    pub fn drop_positions(&mut self, positions: &[usize]) {
        let mut keep = vec![true; self.len()];
        for &pos in positions {
            if let Some(flag) = keep.get_mut(pos) {
                *flag = false;
            }
        }
        self.retain_rows(&keep);
    }

    /// Add a column or replace one with the same name
    pub fn insert_column(&mut self, column: Column) -> Result<()> {
        if column.len() != self.len() {
            return Err(NoiseError::invalid_data(
                column.name.clone(),
                "column length does not match the table",
            ));
        }
        match self.columns.iter_mut().find(|c| c.name == column.name) {
            Some(existing) => *existing = column,
            None => self.columns.push(column),
        }
        Ok(())
    }

    /// Reduce and reorder columns to `names`, skipping names the table lacks
    pub fn select_columns<'a, I>(self, names: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let Table { index, mut columns } = self;
        let mut selected = Vec::new();
        for name in names {
            if let Some(pos) = columns.iter().position(|c| c.name == name) {
                selected.push(columns.swap_remove(pos));
            }
        }
        Table {
            index,
            columns: selected,
        }
    }

    /// Restore declared storage types after noising
    pub fn coerce_dtypes<'a, I>(&mut self, dtypes: I)
    where
        I: IntoIterator<Item = (&'a str, DType)>,
    {
        for (name, dtype) in dtypes {
            if let Some(column) = self.column_mut(name) {
                column.dtype = dtype;
            }
        }
    }

    /// Stack tables with identical column sets into one, renumbering rows
    pub fn concat(tables: Vec<Table>) -> Result<Self> {
        let mut tables = tables.into_iter();
        let Some(mut combined) = tables.next() else {
            return Ok(Table::default());
        };
        for table in tables {
            for column in &mut combined.columns {
                let other = table.column(&column.name).ok_or_else(|| {
                    NoiseError::invalid_data(
                        column.name.clone(),
                        "column is missing from a shard being concatenated",
                    )
                })?;
                column.values.extend(other.values.iter().cloned());
            }
            combined.index.extend_from_slice(&table.index);
        }
        combined.index = (0..combined.index.len() as RowKey).collect();
        Ok(combined)
    }
}
