//! Error types for the noising engine
//!
//! This module contains the error type shared by every stage of the engine:
//! configuration building and validation, schema lookups, and the row and
//! column noise functions themselves.

// ----------------------------------------------------------------------------
// Core Error Type
// ----------------------------------------------------------------------------

/// Core error type for the noising engine
#[derive(Debug, thiserror::Error)]
pub enum NoiseError {
    /// Malformed or out-of-range configuration, or a noise type applied to a
    /// column lacking a required declared attribute
    #[error("Configuration error: {reason}")]
    Configuration { reason: String },

    /// Columns required by a noise function are absent from the table
    #[error("Dataset {dataset} is missing required columns: {columns:?}")]
    MissingColumns { dataset: String, columns: Vec<String> },

    /// A value violates the precondition of a noise function
    #[error("Invalid data in column '{column}': {reason}")]
    InvalidData { column: String, reason: String },

    /// No dataset schema or configuration exists under this name
    #[error("Unknown dataset '{name}'")]
    UnknownDataset { name: String },

    /// Every shard handed to the engine was empty
    #[error("No data found for dataset '{dataset}'")]
    NoData { dataset: String },

    /// A noise type failed while being applied
    #[error("Failed to apply '{noise_type}' to {target} of dataset '{dataset}': {source}")]
    Application {
        dataset: String,
        noise_type: String,
        target: String,
        #[source]
        source: Box<NoiseError>,
    },

    /// User configuration document could not be decoded
    #[error("Configuration document error: {0}")]
    Json(#[from] serde_json::Error),
}

// ----------------------------------------------------------------------------
// Convenience Error Constructors
// ----------------------------------------------------------------------------

impl NoiseError {
    /// Create a configuration error with a reason
    pub fn config_error<T: Into<String>>(reason: T) -> Self {
        NoiseError::Configuration {
            reason: reason.into(),
        }
    }

    /// Create an invalid data error for a column
    pub fn invalid_data<C: Into<String>, R: Into<String>>(column: C, reason: R) -> Self {
        NoiseError::InvalidData {
            column: column.into(),
            reason: reason.into(),
        }
    }

    /// Create a missing columns error
    pub fn missing_columns<D: Into<String>>(dataset: D, columns: Vec<String>) -> Self {
        NoiseError::MissingColumns {
            dataset: dataset.into(),
            columns,
        }
    }

    /// Create an unknown dataset error
    pub fn unknown_dataset<T: Into<String>>(name: T) -> Self {
        NoiseError::UnknownDataset { name: name.into() }
    }

    pub fn no_data<T: Into<String>>(dataset: T) -> Self {
        NoiseError::NoData {
            dataset: dataset.into(),
        }
    }

    /// Wrap a failure raised while applying a noise type
    pub fn while_applying<D, N, T>(self, dataset: D, noise_type: N, target: T) -> Self
    where
        D: Into<String>,
        N: Into<String>,
        T: Into<String>,
    {
        NoiseError::Application {
            dataset: dataset.into(),
            noise_type: noise_type.into(),
            target: target.into(),
            source: Box::new(self),
        }
    }

    /// Whether this error (or the failure it wraps) is a configuration error
    pub fn is_configuration_error(&self) -> bool {
        match self {
            NoiseError::Configuration { .. } => true,
            NoiseError::Application { source, .. } => source.is_configuration_error(),
            _ => false,
        }
    }
}

// ----------------------------------------------------------------------------
// Type Aliases
// ----------------------------------------------------------------------------

pub type Result<T> = std::result::Result<T, NoiseError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_application_error_names_context() {
        let err = NoiseError::invalid_data("zipcode", "not 5 digits").while_applying(
            "decennial_census",
            "write_wrong_zipcode_digits",
            "column 'zipcode'",
        );
        let message = err.to_string();
        assert!(message.contains("decennial_census"));
        assert!(message.contains("write_wrong_zipcode_digits"));
        assert!(message.contains("zipcode"));
        assert!(!err.is_configuration_error());
    }

    #[test]
    fn test_configuration_error_detected_through_wrapper() {
        let err = NoiseError::config_error("no date format").while_applying(
            "social_security",
            "swap_month_and_day",
            "column 'event_date'",
        );
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_missing_columns_message() {
        let err = NoiseError::missing_columns("decennial_census", vec!["age".into()]);
        assert!(err.to_string().contains("age"));
    }
}
