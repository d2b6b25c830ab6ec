//! Synthnoise Core Noising Engine
//!
//! This crate applies realistic data-collection errors to synthetic census,
//! survey and tax records. A fixed, ordered catalog of row-noise types
//! (omission, non-response) and column-noise types (blanking, wrong options,
//! typos, OCR and phonetic errors, digit and date corruption, age
//! misreporting, nickname and fake-name substitution) is applied to an
//! in-memory table according to a layered configuration tree. All randomness
//! is drawn from keyed hashes of the seed, so identical inputs always yield
//! identical output.

// ----------------------------------------------------------------------------
// Module Declarations
// ----------------------------------------------------------------------------

pub mod config;
pub mod data;
pub mod engine;
pub mod errors;
pub mod noise;
pub mod randomness;
pub mod schema;
pub mod selection;
pub mod table;

// ----------------------------------------------------------------------------
// Public API
// ----------------------------------------------------------------------------

pub use config::{
    ColumnNoiseParameters, DatasetNoiseConfig, NoiseConfiguration, RowNoiseParameters,
    UserConfiguration,
};
pub use data::{LookupTables, ReferenceData};
pub use engine::NoiseEngine;
pub use noise::{
    ColumnNoiseKind, HouseholdMemberSource, NoiseCatalog, NoiseContext, NoiseType, RowNoiseKind,
    ShadowColumns,
};
pub use randomness::{RandomnessStream, Seed};
pub use schema::{ColumnSchema, DatasetSchema, DateFormat, DATASETS};
pub use selection::{get_index_to_noise, NoiseLevel};
pub use table::{Column, DType, RowKey, Table};

// ----------------------------------------------------------------------------
// Error Types
// ----------------------------------------------------------------------------

pub use errors::{NoiseError, Result};
