//! Dataset and column declarations
//!
//! Column and dataset descriptors are process-wide constants. A column lists
//! the column-noise types it may receive, in application order; a dataset
//! lists its output columns, in output order, and the row-noise types it
//! opts into.

use crate::noise::{ColumnNoiseKind, RowNoiseKind};
use crate::table::DType;

use ColumnNoiseKind::*;
use RowNoiseKind::*;

// ----------------------------------------------------------------------------
// Descriptor Types
// ----------------------------------------------------------------------------

/// Fixed string encodings of dates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DateFormat {
    /// `YYYYMMDD`
    YyyyMmDd,
    /// `MM/DD/YYYY`
    MmDdYyyy,
    /// `MMDDYYYY`
    MmDdYyyyCompact,
}

/// Demographic non-response parameters for a survey instrument
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DoNotRespondProfile {
    /// Row probability the demographic curve is calibrated against
    pub default_row_probability: f64,
    /// Flat non-response rate added on top of the demographic curve
    pub additive_probability: f64,
    /// Whether the population generator oversamples this survey
    pub oversampled: bool,
}

/// Declared column of a dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ColumnSchema {
    pub name: &'static str,
    /// Applicable noise types, in application order
    pub noise_types: &'static [ColumnNoiseKind],
    pub dtype: DType,
    pub date_format: Option<DateFormat>,
}

impl ColumnSchema {
    const fn string(name: &'static str, noise_types: &'static [ColumnNoiseKind]) -> Self {
        Self {
            name,
            noise_types,
            dtype: DType::String,
            date_format: None,
        }
    }

    const fn categorical(name: &'static str) -> Self {
        Self {
            name,
            noise_types: &[LeaveBlank, ChooseWrongOption],
            dtype: DType::Categorical,
            date_format: None,
        }
    }

    const fn date(
        name: &'static str,
        noise_types: &'static [ColumnNoiseKind],
        format: DateFormat,
    ) -> Self {
        Self {
            name,
            noise_types,
            dtype: DType::String,
            date_format: Some(format),
        }
    }

    const fn unnoised(name: &'static str) -> Self {
        Self::string(name, &[])
    }
}

/// Declared dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatasetSchema {
    pub name: &'static str,
    /// Output columns, in output order
    pub columns: &'static [ColumnSchema],
    pub date_column: &'static str,
    pub state_column: Option<&'static str>,
    pub row_noise_types: &'static [RowNoiseKind],
    pub date_format: DateFormat,
    pub do_not_respond: Option<DoNotRespondProfile>,
}

impl DatasetSchema {
    pub fn column(&self, name: &str) -> Option<&'static ColumnSchema> {
        self.columns.iter().find(|c| c.name == name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> {
        self.columns.iter().map(|c| c.name)
    }

    /// Look up one of the built-in datasets by name
    pub fn named(name: &str) -> Option<&'static DatasetSchema> {
        DATASETS.iter().find(|d| d.name == name)
    }
}

// ----------------------------------------------------------------------------
// Columns
// ----------------------------------------------------------------------------

const ADDRESS_TEXT: &[ColumnNoiseKind] = &[LeaveBlank, MakePhoneticErrors, MakeOcrErrors, MakeTypos];
const ADDRESS_NUMBER: &[ColumnNoiseKind] = &[LeaveBlank, WriteWrongDigits, MakeOcrErrors, MakeTypos];
const ZIPCODE_NOISE: &[ColumnNoiseKind] = &[LeaveBlank, WriteWrongZipcodeDigits, MakeOcrErrors, MakeTypos];
const DATE_OF_BIRTH_NOISE: &[ColumnNoiseKind] = &[
    LeaveBlank,
    CopyFromHouseholdMember,
    SwapMonthAndDay,
    WriteWrongDigits,
    MakeOcrErrors,
    MakeTypos,
];

pub mod columns {
    use super::*;

    pub const AGE: ColumnSchema = ColumnSchema::string(
        "age",
        &[LeaveBlank, CopyFromHouseholdMember, MisreportAge, MakeOcrErrors, MakeTypos],
    );
    pub const CITY: ColumnSchema = ColumnSchema::string("city", ADDRESS_TEXT);
    pub const DATE_OF_BIRTH: ColumnSchema =
        ColumnSchema::date("date_of_birth", DATE_OF_BIRTH_NOISE, DateFormat::MmDdYyyy);
    pub const DATE_OF_BIRTH_COMPACT: ColumnSchema =
        ColumnSchema::date("date_of_birth", DATE_OF_BIRTH_NOISE, DateFormat::MmDdYyyyCompact);
    pub const DATE_OF_BIRTH_YYYYMMDD: ColumnSchema =
        ColumnSchema::date("date_of_birth", DATE_OF_BIRTH_NOISE, DateFormat::YyyyMmDd);
    pub const EMPLOYER_CITY: ColumnSchema = ColumnSchema::string("employer_city", ADDRESS_TEXT);
    pub const EMPLOYER_ID: ColumnSchema = ColumnSchema::unnoised("employer_id");
    pub const EMPLOYER_NAME: ColumnSchema =
        ColumnSchema::string("employer_name", &[LeaveBlank, MakeOcrErrors, MakeTypos]);
    pub const EMPLOYER_STATE: ColumnSchema = ColumnSchema::categorical("employer_state");
    pub const EMPLOYER_STREET_NAME: ColumnSchema =
        ColumnSchema::string("employer_street_name", ADDRESS_TEXT);
    pub const EMPLOYER_STREET_NUMBER: ColumnSchema =
        ColumnSchema::string("employer_street_number", ADDRESS_NUMBER);
    pub const EMPLOYER_UNIT_NUMBER: ColumnSchema =
        ColumnSchema::string("employer_unit_number", ADDRESS_NUMBER);
    pub const EMPLOYER_ZIPCODE: ColumnSchema = ColumnSchema::string("employer_zipcode", ZIPCODE_NOISE);
    pub const FIRST_NAME: ColumnSchema = ColumnSchema::string(
        "first_name",
        &[LeaveBlank, UseNickname, UseFakeName, MakePhoneticErrors, MakeOcrErrors, MakeTypos],
    );
    pub const HOUSEHOLD_ID: ColumnSchema = ColumnSchema::unnoised("household_id");
    pub const INCOME: ColumnSchema = ColumnSchema::string("income", ADDRESS_NUMBER);
    pub const LAST_NAME: ColumnSchema = ColumnSchema::string(
        "last_name",
        &[LeaveBlank, UseFakeName, MakePhoneticErrors, MakeOcrErrors, MakeTypos],
    );
    pub const MAILING_CITY: ColumnSchema = ColumnSchema::string("mailing_address_city", ADDRESS_TEXT);
    pub const MAILING_PO_BOX: ColumnSchema =
        ColumnSchema::string("mailing_address_po_box", ADDRESS_NUMBER);
    pub const MAILING_STATE: ColumnSchema = ColumnSchema::categorical("mailing_address_state");
    pub const MAILING_STREET_NAME: ColumnSchema =
        ColumnSchema::string("mailing_address_street_name", ADDRESS_TEXT);
    pub const MAILING_STREET_NUMBER: ColumnSchema =
        ColumnSchema::string("mailing_address_street_number", ADDRESS_NUMBER);
    pub const MAILING_UNIT_NUMBER: ColumnSchema =
        ColumnSchema::string("mailing_address_unit_number", ADDRESS_NUMBER);
    pub const MAILING_ZIPCODE: ColumnSchema =
        ColumnSchema::string("mailing_address_zipcode", ZIPCODE_NOISE);
    pub const MIDDLE_INITIAL: ColumnSchema = ColumnSchema::string("middle_initial", ADDRESS_TEXT);
    pub const RACE_ETHNICITY: ColumnSchema = ColumnSchema::categorical("race_ethnicity");
    pub const RELATION_TO_REFERENCE_PERSON: ColumnSchema =
        ColumnSchema::categorical("relation_to_reference_person");
    pub const SEX: ColumnSchema = ColumnSchema::categorical("sex");
    pub const SIMULANT_ID: ColumnSchema = ColumnSchema::unnoised("simulant_id");
    pub const SSA_EVENT_DATE: ColumnSchema = ColumnSchema::date(
        "event_date",
        &[LeaveBlank, SwapMonthAndDay, WriteWrongDigits, MakeOcrErrors, MakeTypos],
        DateFormat::YyyyMmDd,
    );
    pub const SSA_EVENT_TYPE: ColumnSchema = ColumnSchema::categorical("event_type");
    pub const SSN: ColumnSchema = ColumnSchema::string(
        "ssn",
        &[LeaveBlank, CopyFromHouseholdMember, WriteWrongDigits, MakeOcrErrors, MakeTypos],
    );
    pub const ITIN: ColumnSchema = ColumnSchema::string("itin", ADDRESS_NUMBER);
    pub const STATE: ColumnSchema = ColumnSchema::categorical("state");
    pub const STREET_NAME: ColumnSchema = ColumnSchema::string("street_name", ADDRESS_TEXT);
    pub const STREET_NUMBER: ColumnSchema = ColumnSchema::string("street_number", ADDRESS_NUMBER);
    pub const SURVEY_DATE: ColumnSchema = ColumnSchema {
        name: "survey_date",
        noise_types: &[],
        dtype: DType::Datetime,
        date_format: None,
    };
    pub const TAX_FORM: ColumnSchema = ColumnSchema::categorical("tax_form");
    pub const TAX_YEAR: ColumnSchema = ColumnSchema::unnoised("tax_year");
    pub const UNIT_NUMBER: ColumnSchema = ColumnSchema::string("unit_number", ADDRESS_NUMBER);
    pub const YEAR: ColumnSchema = ColumnSchema::unnoised("year");
    pub const ZIPCODE: ColumnSchema = ColumnSchema::string("zipcode", ZIPCODE_NOISE);
}

use columns::*;

// ----------------------------------------------------------------------------
// Datasets
// ----------------------------------------------------------------------------

pub const CENSUS: DatasetSchema = DatasetSchema {
    name: "decennial_census",
    columns: &[
        SIMULANT_ID,
        FIRST_NAME,
        MIDDLE_INITIAL,
        LAST_NAME,
        AGE,
        DATE_OF_BIRTH,
        STREET_NUMBER,
        STREET_NAME,
        UNIT_NUMBER,
        CITY,
        STATE,
        ZIPCODE,
        RELATION_TO_REFERENCE_PERSON,
        SEX,
        RACE_ETHNICITY,
        YEAR,
    ],
    date_column: "year",
    state_column: Some("state"),
    row_noise_types: &[DoNotRespond, DuplicateRow],
    date_format: DateFormat::MmDdYyyy,
    do_not_respond: Some(DoNotRespondProfile {
        default_row_probability: 0.0145,
        additive_probability: 0.0,
        oversampled: false,
    }),
};

const HOUSEHOLD_SURVEY_COLUMNS: &[ColumnSchema] = &[
    HOUSEHOLD_ID,
    SIMULANT_ID,
    SURVEY_DATE,
    FIRST_NAME,
    MIDDLE_INITIAL,
    LAST_NAME,
    AGE,
    DATE_OF_BIRTH,
    STREET_NUMBER,
    STREET_NAME,
    UNIT_NUMBER,
    CITY,
    STATE,
    ZIPCODE,
    SEX,
    RACE_ETHNICITY,
];

pub const ACS: DatasetSchema = DatasetSchema {
    name: "american_community_survey",
    columns: HOUSEHOLD_SURVEY_COLUMNS,
    date_column: "survey_date",
    state_column: Some("state"),
    row_noise_types: &[OmitRow, DoNotRespond],
    date_format: DateFormat::MmDdYyyy,
    do_not_respond: Some(DoNotRespondProfile {
        default_row_probability: 0.0145,
        additive_probability: 0.0,
        oversampled: true,
    }),
};

pub const CPS: DatasetSchema = DatasetSchema {
    name: "current_population_survey",
    columns: HOUSEHOLD_SURVEY_COLUMNS,
    date_column: "survey_date",
    state_column: Some("state"),
    row_noise_types: &[OmitRow, DoNotRespond],
    date_format: DateFormat::MmDdYyyy,
    do_not_respond: Some(DoNotRespondProfile {
        default_row_probability: 0.2905,
        additive_probability: 0.276,
        oversampled: true,
    }),
};

pub const WIC: DatasetSchema = DatasetSchema {
    name: "women_infants_and_children",
    columns: &[
        HOUSEHOLD_ID,
        SIMULANT_ID,
        FIRST_NAME,
        MIDDLE_INITIAL,
        LAST_NAME,
        DATE_OF_BIRTH_COMPACT,
        STREET_NUMBER,
        STREET_NAME,
        UNIT_NUMBER,
        CITY,
        STATE,
        ZIPCODE,
        SEX,
        RACE_ETHNICITY,
        YEAR,
    ],
    date_column: "year",
    state_column: Some("state"),
    row_noise_types: &[OmitRow],
    date_format: DateFormat::MmDdYyyyCompact,
    do_not_respond: None,
};

pub const SSA: DatasetSchema = DatasetSchema {
    name: "social_security",
    columns: &[
        SIMULANT_ID,
        FIRST_NAME,
        MIDDLE_INITIAL,
        LAST_NAME,
        DATE_OF_BIRTH_YYYYMMDD,
        SSN,
        SSA_EVENT_TYPE,
        SSA_EVENT_DATE,
    ],
    date_column: "event_date",
    state_column: None,
    row_noise_types: &[OmitRow],
    date_format: DateFormat::YyyyMmDd,
    do_not_respond: None,
};

pub const TAX_W2_1099: DatasetSchema = DatasetSchema {
    name: "taxes_w2_and_1099",
    columns: &[
        SIMULANT_ID,
        FIRST_NAME,
        MIDDLE_INITIAL,
        LAST_NAME,
        AGE,
        DATE_OF_BIRTH,
        MAILING_STREET_NUMBER,
        MAILING_STREET_NAME,
        MAILING_UNIT_NUMBER,
        MAILING_PO_BOX,
        MAILING_CITY,
        MAILING_STATE,
        MAILING_ZIPCODE,
        SSN,
        INCOME,
        EMPLOYER_ID,
        EMPLOYER_NAME,
        EMPLOYER_STREET_NUMBER,
        EMPLOYER_STREET_NAME,
        EMPLOYER_UNIT_NUMBER,
        EMPLOYER_CITY,
        EMPLOYER_STATE,
        EMPLOYER_ZIPCODE,
        TAX_FORM,
        TAX_YEAR,
    ],
    date_column: "tax_year",
    state_column: Some("mailing_address_state"),
    row_noise_types: &[OmitRow],
    date_format: DateFormat::MmDdYyyy,
    do_not_respond: None,
};

/// Every built-in dataset
pub const DATASETS: &[DatasetSchema] = &[CENSUS, ACS, CPS, WIC, SSA, TAX_W2_1099];
