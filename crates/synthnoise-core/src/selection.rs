//! Selection of the rows a noise type will touch
//!
//! One independent Bernoulli trial per eligible row: a row is selected when
//! its keyed draw falls below the noise level.

use crate::randomness::RandomnessStream;
use crate::table::{RowKey, Table};

/// Probability of selecting a row
#[derive(Debug, Clone, PartialEq)]
pub enum NoiseLevel {
    /// Same probability for every row
    Uniform(f64),
    /// One probability per table position
    PerRow(Vec<f64>),
}

impl NoiseLevel {
    fn at(&self, position: usize) -> f64 {
        match self {
            NoiseLevel::Uniform(level) => *level,
            NoiseLevel::PerRow(levels) => levels.get(position).copied().unwrap_or(0.0),
        }
    }
}

/// Table positions selected for noising
///
/// With `required` set, only rows non-missing in every listed column are
/// eligible; with `None` every current row is. Draws are keyed on row keys,
/// so a row's outcome does not depend on which other rows are eligible.
pub fn get_index_to_noise(
    table: &Table,
    noise_level: &NoiseLevel,
    randomness: &RandomnessStream,
    additional_key: &str,
    required: Option<&[String]>,
) -> Vec<usize> {
    let eligible: Vec<usize> = match required {
        Some(columns) => table.non_missing_positions(columns),
        None => (0..table.len()).collect(),
    };
    if eligible.is_empty() {
        return eligible;
    }
    let keys: Vec<RowKey> = eligible.iter().map(|&pos| table.index()[pos]).collect();
    let draws = randomness.get_draw(&keys, additional_key);
    eligible
        .into_iter()
        .zip(draws)
        .filter(|(pos, draw)| *draw < noise_level.at(*pos))
        .map(|(pos, _)| pos)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::randomness::Seed;
    use crate::table::{Column, DType};

    fn table(rows: usize) -> Table {
        let values = (0..rows)
            .map(|i| if i % 4 == 0 { None } else { Some(format!("v{}", i)) })
            .collect();
        Table::new(vec![Column::new("city", DType::String, values)]).unwrap()
    }

    fn stream() -> RandomnessStream {
        RandomnessStream::new("decennial_census", Seed::from(0u64))
    }

    #[test]
    fn test_zero_and_full_levels() {
        let table = table(100);
        let none = get_index_to_noise(&table, &NoiseLevel::Uniform(0.0), &stream(), "k", None);
        assert!(none.is_empty());
        let all = get_index_to_noise(&table, &NoiseLevel::Uniform(1.0), &stream(), "k", None);
        assert_eq!(all.len(), 100);
    }

    #[test]
    fn test_missing_cells_are_ineligible() {
        let table = table(100);
        let required = vec![String::from("city")];
        let selected = get_index_to_noise(
            &table,
            &NoiseLevel::Uniform(1.0),
            &stream(),
            "k",
            Some(&required),
        );
        assert_eq!(selected.len(), 75);
        assert!(selected.iter().all(|pos| pos % 4 != 0));
    }

    #[test]
    fn test_per_row_levels() {
        let table = table(10);
        let levels = (0..10).map(|i| if i < 5 { 1.0 } else { 0.0 }).collect();
        let selected =
            get_index_to_noise(&table, &NoiseLevel::PerRow(levels), &stream(), "k", None);
        assert_eq!(selected, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_selection_rate() {
        let table = table(40_000);
        let selected = get_index_to_noise(&table, &NoiseLevel::Uniform(0.25), &stream(), "k", None);
        let rate = selected.len() as f64 / 40_000.0;
        assert!((rate - 0.25).abs() < 0.01);
    }
}
