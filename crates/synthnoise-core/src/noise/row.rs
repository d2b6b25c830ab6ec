//! Row noise: transforms that remove whole records

use tracing::debug;

use super::NoiseContext;
use crate::config::RowNoiseParameters;
use crate::data::{
    DO_NOT_RESPOND_AGE_BREAKS, DO_NOT_RESPOND_BASE_PROBABILITY, DO_NOT_RESPOND_BY_RACE,
    DO_NOT_RESPOND_FEMALE_BY_AGE, DO_NOT_RESPOND_MALE_BY_AGE,
};
use crate::selection::{get_index_to_noise, NoiseLevel};
use crate::table::Table;
use crate::{NoiseError, Result};

const DO_NOT_RESPOND_COLUMNS: [&str; 3] = ["age", "race_ethnicity", "sex"];

/// Drop a uniformly random subset of rows
pub fn omit_rows(
    ctx: &NoiseContext<'_>,
    mut table: Table,
    params: &RowNoiseParameters,
) -> Result<Table> {
    let to_noise = get_index_to_noise(
        &table,
        &NoiseLevel::Uniform(params.row_probability),
        ctx.randomness,
        &format!("{}_omit_choice", ctx.dataset.name),
        None,
    );
    table.drop_positions(&to_noise);
    Ok(table)
}

/// Drop rows by the demographic non-response model
pub fn apply_do_not_respond(
    ctx: &NoiseContext<'_>,
    mut table: Table,
    params: &RowNoiseParameters,
) -> Result<Table> {
    let missing: Vec<String> = DO_NOT_RESPOND_COLUMNS
        .iter()
        .filter(|c| !table.has_column(c))
        .map(|c| c.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(NoiseError::missing_columns(ctx.dataset.name, missing));
    }

    let profile = ctx.dataset.do_not_respond.ok_or_else(|| {
        NoiseError::config_error(format!(
            "dataset '{}' has no non-response profile",
            ctx.dataset.name
        ))
    })?;
    if profile.default_row_probability <= 0.0 {
        return Err(NoiseError::config_error(format!(
            "dataset '{}' declares a zero default non-response probability",
            ctx.dataset.name
        )));
    }

    let ratio = params.row_probability / profile.default_row_probability;
    let levels = census_omission_levels(&table)
        .into_iter()
        .map(|level| match level {
            Some(level) => {
                let mut p = (level + profile.additive_probability) * ratio;
                if profile.oversampled {
                    p = 0.5 + p / 2.0;
                }
                p
            }
            None => 0.0,
        })
        .collect();

    let to_noise = get_index_to_noise(
        &table,
        &NoiseLevel::PerRow(levels),
        ctx.randomness,
        &format!("do_not_respond_{}", ctx.dataset.name),
        None,
    );
    table.drop_positions(&to_noise);
    Ok(table)
}

/// Cataloged but not implemented; leaves the table unchanged
pub fn duplicate_rows(
    ctx: &NoiseContext<'_>,
    table: Table,
    _params: &RowNoiseParameters,
) -> Result<Table> {
    debug!(dataset = ctx.dataset.name, "Row duplication is not implemented, skipping");
    Ok(table)
}

/// Per-row non-response probability, clipped to `[0, 1]`
///
/// `None` marks rows outside the model (unknown race or an age outside every
/// bin); these are never dropped.
fn census_omission_levels(table: &Table) -> Vec<Option<f64>> {
    (0..table.len())
        .map(|pos| {
            let race = table.value("race_ethnicity", pos).unwrap_or_default();
            let race_adjustment = DO_NOT_RESPOND_BY_RACE
                .iter()
                .find(|(name, _)| *name == race)
                .map(|(_, p)| *p)?;

            let by_age = match table.value("sex", pos) {
                Some("Female") => Some(&DO_NOT_RESPOND_FEMALE_BY_AGE),
                Some("Male") => Some(&DO_NOT_RESPOND_MALE_BY_AGE),
                _ => None,
            };
            let age_adjustment = match by_age {
                Some(by_age) => {
                    let age = table.value("age", pos)?.trim().parse::<f64>().ok()?;
                    by_age[age_bin(age)?]
                }
                None => 0.0,
            };

            let level = DO_NOT_RESPOND_BASE_PROBABILITY + race_adjustment + age_adjustment;
            Some(level.clamp(0.0, 1.0))
        })
        .collect()
}

/// Index of the right-closed age bin containing `age`
fn age_bin(age: f64) -> Option<usize> {
    DO_NOT_RESPOND_AGE_BREAKS
        .windows(2)
        .position(|edges| age > edges[0] && age <= edges[1])
}
