//! Column noise algorithms
//!
//! Each function receives the table positions already selected for noising
//! and returns one replacement value per position, in the same order. Missing
//! cells never reach these functions.

use super::scan::{corrupt_tokens, TokenDictionary};
use super::NoiseContext;
use crate::config::ColumnNoiseParameters;
use crate::data::{wrong_option_universe, FAKE_FIRST_NAMES, FAKE_LAST_NAMES};
use crate::schema::DateFormat;
use crate::table::{Column, RowKey, Table};
use crate::{NoiseError, Result};

const DIGITS: [char; 10] = ['0', '1', '2', '3', '4', '5', '6', '7', '8', '9'];

/// Redrawing a digit uniformly reproduces the original one time in ten
const SAME_DIGIT_SCALEUP: f64 = 1.0 / (1.0 - 1.0 / DIGITS.len() as f64);

const KEEP_ORIGINAL_TYPO_PROBABILITY: f64 = 0.1;

fn row_keys(table: &Table, positions: &[usize]) -> Vec<RowKey> {
    positions.iter().map(|&pos| table.index()[pos]).collect()
}

/// Present values of the selected cells
fn selected_values<'t>(table: &'t Table, positions: &[usize], column: &str) -> Result<Vec<&'t str>> {
    let target = table.require_column(column)?;
    Ok(positions
        .iter()
        .map(|&pos| target.get(pos).unwrap_or_default())
        .collect())
}

fn digit_for(draw: f64) -> char {
    DIGITS[((draw * DIGITS.len() as f64) as usize).min(DIGITS.len() - 1)]
}

// ----------------------------------------------------------------------------
// Blanking and Substitution
// ----------------------------------------------------------------------------

pub fn leave_blanks(
    _ctx: &NoiseContext<'_>,
    _table: &Table,
    positions: &[usize],
    _column: &str,
    _params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    Ok(vec![None; positions.len()])
}

/// Uniform draw from the column's option universe, original value included
pub fn choose_wrong_options(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    _params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    let options = wrong_option_universe(column).ok_or_else(|| {
        NoiseError::config_error(format!("column '{}' has no list of options to choose from", column))
    })?;
    let chosen = ctx.randomness.choice(
        &row_keys(table, positions),
        options,
        None,
        &format!("{}_incorrect_select_choice", column),
    )?;
    Ok(chosen.into_iter().map(|o| Some(o.to_string())).collect())
}

pub fn copy_from_household_members(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    _params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    ctx.household.member_values(table, column, positions)
}

pub fn copy_from_household_member_required_columns(
    ctx: &NoiseContext<'_>,
    column: &str,
) -> Vec<String> {
    ctx.household.required_columns(column)
}

/// Inverse share of present values that have a household member value
pub fn copy_from_household_member_scaling(
    ctx: &NoiseContext<'_>,
    table: &Table,
    column: &str,
) -> f64 {
    let present = table.non_missing_positions(&[column.to_string()]).len();
    let copyable = table
        .non_missing_positions(&ctx.household.required_columns(column))
        .len();
    if copyable == 0 {
        0.0
    } else {
        present as f64 / copyable as f64
    }
}

pub fn use_fake_names(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    _params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    let options = match column {
        "first_name" => FAKE_FIRST_NAMES,
        "last_name" => FAKE_LAST_NAMES,
        other => {
            return Err(NoiseError::config_error(format!(
                "no fake names are defined for column '{}'",
                other
            )))
        }
    };
    let chosen = ctx.randomness.choice(
        &row_keys(table, positions),
        options,
        None,
        &format!("{}_fake_names", column),
    )?;
    Ok(chosen.into_iter().map(|o| Some(o.to_string())).collect())
}

/// Replace names that have nicknames; other selected names are unchanged
pub fn use_nicknames(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    _params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    let values = selected_values(table, positions, column)?;
    let draws = ctx
        .randomness
        .get_draw(&row_keys(table, positions), &format!("{}_nickname_choice", column));
    Ok(values
        .into_iter()
        .zip(draws)
        .map(|(name, draw)| match ctx.lookups.nicknames(name) {
            Some(nicknames) if !nicknames.is_empty() => {
                let pick = ((draw * nicknames.len() as f64) as usize).min(nicknames.len() - 1);
                Some(nicknames[pick].clone())
            }
            _ => Some(name.to_string()),
        })
        .collect())
}

/// Inverse share of present names that have a nickname
pub fn nickname_scaling(ctx: &NoiseContext<'_>, table: &Table, column: &str) -> f64 {
    let Some(target) = table.column(column) else {
        return 0.0;
    };
    let (present, with_nickname) = present_values(target).fold((0usize, 0usize), |(p, n), name| {
        (p + 1, n + usize::from(ctx.lookups.has_nickname(name)))
    });
    if with_nickname == 0 {
        0.0
    } else {
        present as f64 / with_nickname as f64
    }
}

fn present_values(column: &Column) -> impl Iterator<Item = &str> {
    column
        .values
        .iter()
        .filter_map(|v| v.as_deref())
        .filter(|v| !v.is_empty())
}

// ----------------------------------------------------------------------------
// Dates
// ----------------------------------------------------------------------------

/// Swap the month and day substrings of a formatted date
pub fn swap_months_and_days(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    _params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    let format = ctx
        .dataset
        .column(column)
        .and_then(|c| c.date_format)
        .ok_or_else(|| {
            NoiseError::config_error(format!(
                "Error while running noise function 'swap_month_and_day' on column '{}'. \
                 '{}' does not have attribute date format.",
                column, column
            ))
        })?;
    selected_values(table, positions, column)?
        .into_iter()
        .map(|date| swap_month_and_day(date, format).map(Some).ok_or_else(|| {
            NoiseError::invalid_data(column, format!("'{}' does not match the date format", date))
        }))
        .collect()
}

fn swap_month_and_day(date: &str, format: DateFormat) -> Option<String> {
    let (year, month, day, separator) = match format {
        DateFormat::YyyyMmDd if date.len() == 8 => (date.get(..4)?, date.get(4..6)?, date.get(6..8)?, ""),
        DateFormat::MmDdYyyy if date.len() == 10 => {
            (date.get(6..)?, date.get(..2)?, date.get(3..5)?, "/")
        }
        DateFormat::MmDdYyyyCompact if date.len() == 8 => {
            (date.get(4..)?, date.get(..2)?, date.get(2..4)?, "")
        }
        _ => return None,
    };
    Some(match format {
        DateFormat::YyyyMmDd => format!("{}{}{}", year, day, month),
        DateFormat::MmDdYyyy | DateFormat::MmDdYyyyCompact => {
            format!("{day}{separator}{month}{separator}{year}")
        }
    })
}

// ----------------------------------------------------------------------------
// Digits and Ages
// ----------------------------------------------------------------------------

/// Redraw each zipcode digit independently at its position's probability
pub fn write_wrong_zipcode_digits(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    let digit_probabilities = params.zipcode_digit_probabilities()?;
    let values = selected_values(table, positions, column)?;
    let mut zipcodes: Vec<Vec<char>> = Vec::with_capacity(values.len());
    for value in values {
        let chars: Vec<char> = value.chars().collect();
        if chars.len() != digit_probabilities.len() {
            return Err(NoiseError::invalid_data(
                column,
                format!(
                    "Zipcode data contains zipcodes that are not 5 digits long: '{}'",
                    value
                ),
            ));
        }
        zipcodes.push(chars);
    }

    let keys = row_keys(table, positions);
    for (digit, probability) in digit_probabilities.iter().enumerate() {
        let threshold = probability * SAME_DIGIT_SCALEUP;
        let replace = ctx
            .randomness
            .get_draw(&keys, &format!("{}_zipcode_digit_{}", column, digit));
        let replacements = ctx
            .randomness
            .get_draw(&keys, &format!("{}_zipcode_replacement_{}", column, digit));
        for ((zipcode, draw), replacement) in zipcodes.iter_mut().zip(replace).zip(replacements) {
            if draw < threshold {
                zipcode[digit] = digit_for(replacement);
            }
        }
    }
    Ok(zipcodes
        .into_iter()
        .map(|zipcode| Some(zipcode.into_iter().collect()))
        .collect())
}

/// Redraw individual digits, leaving every other character and the length
/// unchanged
pub fn write_wrong_digits(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    let threshold = params.token_probability()? * SAME_DIGIT_SCALEUP;
    let mut values: Vec<Vec<char>> = selected_values(table, positions, column)?
        .into_iter()
        .map(|v| v.chars().collect())
        .collect();
    let longest = values.iter().map(Vec::len).max().unwrap_or(0);
    let keys = row_keys(table, positions);

    for offset in 0..longest {
        let replace = ctx
            .randomness
            .get_draw(&keys, &format!("{}_wrong_digit_{}", column, offset));
        let replacements = ctx
            .randomness
            .get_draw(&keys, &format!("{}_wrong_digit_choice_{}", column, offset));
        for ((value, draw), replacement) in values.iter_mut().zip(replace).zip(replacements) {
            if let Some(c) = value.get_mut(offset) {
                if c.is_ascii_digit() && draw < threshold {
                    *c = digit_for(replacement);
                }
            }
        }
    }
    Ok(values
        .into_iter()
        .map(|value| Some(value.into_iter().collect()))
        .collect())
}

fn parse_age(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    trimmed
        .parse::<i64>()
        .ok()
        .or_else(|| trimmed.parse::<f64>().ok().filter(|a| a.is_finite()).map(|a| a as i64))
}

/// Perturb an age, reflecting negatives and forcing a change
pub fn misreport_age(age: i64, delta: i64) -> i64 {
    let mut reported = age + delta;
    if reported < 0 {
        reported = -reported;
    }
    if reported == age {
        reported -= 1;
    }
    reported
}

pub fn misreport_ages(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    let differences = params.possible_age_differences()?;
    let offsets: Vec<i64> = differences.keys().copied().collect();
    let weights: Vec<f64> = differences.values().copied().collect();
    let deltas = ctx.randomness.choice(
        &row_keys(table, positions),
        &offsets,
        Some(&weights),
        &format!("{}_miswrite_ages", column),
    )?;
    selected_values(table, positions, column)?
        .into_iter()
        .zip(deltas)
        .map(|(value, delta)| {
            let age = parse_age(value).ok_or_else(|| {
                NoiseError::invalid_data(column, format!("'{}' is not an age", value))
            })?;
            Ok(Some(misreport_age(age, *delta).to_string()))
        })
        .collect()
}

// ----------------------------------------------------------------------------
// Token Scanners
// ----------------------------------------------------------------------------

#[allow(clippy::too_many_arguments)]
fn scan_column(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    noise_name: &str,
    dictionary: &TokenDictionary,
    token_probability: f64,
    keep_original_probability: f64,
) -> Result<Vec<Option<String>>> {
    let additional_key = format!("{}_{}", noise_name, column);
    let values = selected_values(table, positions, column)?;
    Ok(values
        .into_iter()
        .zip(row_keys(table, positions))
        .map(|(value, key)| {
            let mut draws = ctx.randomness.row_draws(key, &additional_key);
            Some(corrupt_tokens(
                value,
                dictionary,
                token_probability,
                keep_original_probability,
                &mut draws,
            ))
        })
        .collect())
}

pub fn make_phonetic_errors(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    scan_column(
        ctx,
        table,
        positions,
        column,
        "make_phonetic_errors",
        &ctx.lookups.phonetic,
        params.token_probability()?,
        0.0,
    )
}

pub fn make_ocr_errors(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    scan_column(
        ctx,
        table,
        positions,
        column,
        "make_ocr_errors",
        &ctx.lookups.ocr,
        params.token_probability()?,
        0.0,
    )
}

pub fn make_typos(
    ctx: &NoiseContext<'_>,
    table: &Table,
    positions: &[usize],
    column: &str,
    params: &ColumnNoiseParameters,
) -> Result<Vec<Option<String>>> {
    scan_column(
        ctx,
        table,
        positions,
        column,
        "make_typos",
        &ctx.lookups.qwerty,
        params.token_probability()?,
        KEEP_ORIGINAL_TYPO_PROBABILITY,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{LookupTables, STATES};
    use crate::noise::ShadowColumns;
    use crate::randomness::{RandomnessStream, Seed};
    use crate::schema::{DatasetSchema, CENSUS, SSA, WIC};
    use crate::table::DType;
    use std::collections::BTreeMap;

    struct Fixture {
        randomness: RandomnessStream,
        lookups: LookupTables,
    }

    impl Fixture {
        fn new(dataset: &DatasetSchema) -> Self {
            Self {
                randomness: RandomnessStream::new(dataset.name, Seed::from(42u64)),
                lookups: LookupTables::builtin(),
            }
        }

        fn ctx<'a>(&'a self, dataset: &'a DatasetSchema) -> NoiseContext<'a> {
            NoiseContext {
                dataset,
                randomness: &self.randomness,
                lookups: &self.lookups,
                household: &ShadowColumns,
            }
        }
    }

    fn single_column(name: &str, values: &[&str]) -> (Table, Vec<usize>) {
        let table = Table::new(vec![Column::from_strs(name, values)]).unwrap();
        let positions = (0..values.len()).collect();
        (table, positions)
    }

    fn params() -> ColumnNoiseParameters {
        ColumnNoiseParameters::with_cell_probability(1.0)
    }

    #[test]
    fn test_swap_month_and_day_formats() {
        assert_eq!(
            swap_month_and_day("19991231", DateFormat::YyyyMmDd).as_deref(),
            Some("19993112")
        );
        assert_eq!(
            swap_month_and_day("12/31/1999", DateFormat::MmDdYyyy).as_deref(),
            Some("31/12/1999")
        );
        assert_eq!(
            swap_month_and_day("12311999", DateFormat::MmDdYyyyCompact).as_deref(),
            Some("31121999")
        );
        assert!(swap_month_and_day("1999-12-31", DateFormat::YyyyMmDd).is_none());
    }

    #[test]
    fn test_swap_requires_declared_format() {
        let fixture = Fixture::new(&CENSUS);
        let (table, positions) = single_column("first_name", &["Ann"]);
        let err = swap_months_and_days(&fixture.ctx(&CENSUS), &table, &positions, "first_name", &params())
            .unwrap_err();
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_swap_uses_column_format() {
        let fixture = Fixture::new(&WIC);
        let (table, positions) = single_column("date_of_birth", &["01022003"]);
        let noised =
            swap_months_and_days(&fixture.ctx(&WIC), &table, &positions, "date_of_birth", &params())
                .unwrap();
        assert_eq!(noised, vec![Some("02012003".to_string())]);

        let fixture = Fixture::new(&SSA);
        let (table, positions) = single_column("event_date", &["20030102"]);
        let noised =
            swap_months_and_days(&fixture.ctx(&SSA), &table, &positions, "event_date", &params())
                .unwrap();
        assert_eq!(noised, vec![Some("20030201".to_string())]);
    }

    #[test]
    fn test_zipcode_length_checked() {
        let fixture = Fixture::new(&CENSUS);
        let (table, positions) = single_column("zipcode", &["12345", "1234"]);
        let mut params = params();
        params.zipcode_digit_probabilities = Some(vec![0.5; 5]);
        let err = write_wrong_zipcode_digits(&fixture.ctx(&CENSUS), &table, &positions, "zipcode", &params)
            .unwrap_err();
        assert!(matches!(err, NoiseError::InvalidData { .. }));
    }

    #[test]
    fn test_zipcode_zero_probability_positions_untouched() {
        let fixture = Fixture::new(&CENSUS);
        let values: Vec<String> = (0..500).map(|i| format!("{:05}", 10_000 + i)).collect();
        let refs: Vec<&str> = values.iter().map(String::as_str).collect();
        let (table, positions) = single_column("zipcode", &refs);
        let mut params = params();
        params.zipcode_digit_probabilities = Some(vec![0.0, 0.0, 0.0, 0.9, 0.9]);
        let noised = write_wrong_zipcode_digits(&fixture.ctx(&CENSUS), &table, &positions, "zipcode", &params)
            .unwrap();
        for (before, after) in refs.iter().zip(&noised) {
            let after = after.as_deref().unwrap();
            assert_eq!(after.len(), 5);
            assert_eq!(&after[..3], &before[..3]);
            assert!(after.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn test_wrong_digits_preserve_non_digits() {
        let fixture = Fixture::new(&CENSUS);
        let (table, positions) = single_column("street_number", &["12B-4 ", "A", "9999999999"]);
        let mut params = params();
        params.token_probability = Some(0.9);
        let noised = write_wrong_digits(&fixture.ctx(&CENSUS), &table, &positions, "street_number", &params)
            .unwrap();
        let first = noised[0].as_deref().unwrap();
        assert_eq!(first.len(), 6);
        assert_eq!(&first[2..3], "B");
        assert_eq!(&first[3..4], "-");
        assert_eq!(&first[5..], " ");
        assert_eq!(noised[1].as_deref(), Some("A"));
        assert_ne!(noised[2].as_deref(), Some("9999999999"));
    }

    #[test]
    fn test_misreport_age_rules() {
        assert_eq!(misreport_age(40, 2), 42);
        assert_eq!(misreport_age(1, -2), 1 - 1);
        assert_eq!(misreport_age(0, -1), 1);
        assert_eq!(misreport_age(3, -5), 2);
        assert_eq!(misreport_age(2, -4), 1);
    }

    #[test]
    fn test_misreport_ages_parses_floats() {
        let fixture = Fixture::new(&CENSUS);
        let (table, positions) = single_column("age", &["30.0", "7"]);
        let mut params = params();
        params.possible_age_differences = Some(BTreeMap::from([(5, 1.0)]));
        let noised = misreport_ages(&fixture.ctx(&CENSUS), &table, &positions, "age", &params).unwrap();
        assert_eq!(noised, vec![Some("35".to_string()), Some("12".to_string())]);

        let (table, positions) = single_column("age", &["thirty"]);
        assert!(misreport_ages(&fixture.ctx(&CENSUS), &table, &positions, "age", &params).is_err());
    }

    #[test]
    fn test_choose_wrong_option_universe() {
        let fixture = Fixture::new(&CENSUS);
        let (table, positions) = single_column("state", &["WA"; 200]);
        let noised = choose_wrong_options(&fixture.ctx(&CENSUS), &table, &positions, "state", &params())
            .unwrap();
        assert!(noised.iter().all(|v| STATES.contains(&v.as_deref().unwrap())));
        assert!(noised.iter().any(|v| v.as_deref() != Some("WA")));

        let (table, positions) = single_column("city", &["Seattle"]);
        assert!(choose_wrong_options(&fixture.ctx(&CENSUS), &table, &positions, "city", &params())
            .unwrap_err()
            .is_configuration_error());
    }

    #[test]
    fn test_nicknames_only_for_known_names() {
        let fixture = Fixture::new(&CENSUS);
        let (table, positions) = single_column("first_name", &["Robert", "Zelda"]);
        let noised = use_nicknames(&fixture.ctx(&CENSUS), &table, &positions, "first_name", &params())
            .unwrap();
        let robert = noised[0].as_deref().unwrap();
        assert!(["Bob", "Rob", "Bobby"].contains(&robert));
        assert_eq!(noised[1].as_deref(), Some("Zelda"));
    }

    #[test]
    fn test_nickname_scaling() {
        let fixture = Fixture::new(&CENSUS);
        let table = Table::new(vec![Column::new(
            "first_name",
            DType::String,
            vec![Some("Robert".into()), Some("Zelda".into()), None, Some("Ann".into())],
        )])
        .unwrap();
        assert_eq!(nickname_scaling(&fixture.ctx(&CENSUS), &table, "first_name"), 3.0);
        let (table, _) = single_column("first_name", &["Zelda"]);
        assert_eq!(nickname_scaling(&fixture.ctx(&CENSUS), &table, "first_name"), 0.0);
    }

    #[test]
    fn test_copy_from_household_member() {
        let fixture = Fixture::new(&CENSUS);
        let table = Table::new(vec![
            Column::from_strs("age", &["30", "31", "32", "33"]),
            Column::new(
                "copy_age",
                DType::String,
                vec![Some("60".into()), None, Some("62".into()), None],
            ),
        ])
        .unwrap();
        let ctx = fixture.ctx(&CENSUS);
        assert_eq!(copy_from_household_member_scaling(&ctx, &table, "age"), 2.0);
        assert_eq!(
            copy_from_household_members(&ctx, &table, &[0, 2], "age", &params()).unwrap(),
            vec![Some("60".to_string()), Some("62".to_string())]
        );
    }

    #[test]
    fn test_fake_names_need_name_column() {
        let fixture = Fixture::new(&CENSUS);
        let (table, positions) = single_column("last_name", &["Smith"]);
        let noised = use_fake_names(&fixture.ctx(&CENSUS), &table, &positions, "last_name", &params())
            .unwrap();
        assert!(FAKE_LAST_NAMES.contains(&noised[0].as_deref().unwrap()));
        let (table, positions) = single_column("city", &["Seattle"]);
        assert!(use_fake_names(&fixture.ctx(&CENSUS), &table, &positions, "city", &params()).is_err());
    }

    #[test]
    fn test_typos_only_touch_keyboard_characters() {
        let fixture = Fixture::new(&CENSUS);
        let (table, positions) = single_column("city", &["...", "seattle"]);
        let mut params = params();
        params.token_probability = Some(1.0);
        let noised = make_typos(&fixture.ctx(&CENSUS), &table, &positions, "city", &params).unwrap();
        assert_eq!(noised[0].as_deref(), Some("..."));
        assert_ne!(noised[1].as_deref(), Some("seattle"));
        assert!(noised[1].as_deref().unwrap().chars().count() >= 7);
    }
}
