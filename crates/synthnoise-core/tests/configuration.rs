//! Configuration documents and preflight checks seen through the engine

use test_utils::census_table;

use serde_json::{json, Value};
use synthnoise_core::schema::{CENSUS, SSA, TAX_W2_1099};
use synthnoise_core::{
    ColumnNoiseKind, NoiseConfiguration, NoiseEngine, NoiseError, NoiseType, RowNoiseKind, Seed,
    UserConfiguration,
};

#[test]
fn test_catalog_order() {
    let engine = NoiseEngine::new();
    let names: Vec<&str> = engine.catalog().iter().map(|n| n.name()).collect();
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
    let row_types = engine
        .catalog()
        .iter()
        .take_while(|n| matches!(n, NoiseType::Row(_)))
        .count();
    assert_eq!(row_types, RowNoiseKind::ALL.len());
}

#[test]
fn test_default_configuration_calibrations() {
    let engine = NoiseEngine::new();
    let configuration = engine.default_configuration();

    let census = configuration.dataset(CENSUS.name).unwrap();
    assert_eq!(census.row(RowNoiseKind::DoNotRespond).unwrap().row_probability, 0.0145);
    assert!(census.row(RowNoiseKind::OmitRow).is_none());

    let tax = configuration.dataset(TAX_W2_1099.name).unwrap();
    assert_eq!(tax.row(RowNoiseKind::OmitRow).unwrap().row_probability, 0.005);
    assert_eq!(
        tax.column("ssn", ColumnNoiseKind::CopyFromHouseholdMember)
            .unwrap()
            .cell_probability,
        0.0
    );

    let ssa = configuration.dataset(SSA.name).unwrap();
    for params in ssa.column_noise["ssn"].values() {
        assert_eq!(params.cell_probability, 0.0);
    }
}

#[test]
fn test_json_document_overrides_defaults() {
    let engine = NoiseEngine::new();
    let document = r#"{
        "decennial_census": {
            "row_noise": {"do_not_respond": {"row_probability": 0.02}},
            "column_noise": {
                "first_name": {"make_typos": {"cell_probability": 0.3, "token_probability": 0.2}}
            }
        }
    }"#;
    let user = UserConfiguration::from_json_str(document).unwrap();
    let configuration = engine
        .default_configuration()
        .with_user_overrides(&user)
        .unwrap();

    let census = configuration.dataset(CENSUS.name).unwrap();
    assert_eq!(census.row(RowNoiseKind::DoNotRespond).unwrap().row_probability, 0.02);
    let typos = census.column("first_name", ColumnNoiseKind::MakeTypos).unwrap();
    assert_eq!(typos.cell_probability, 0.3);
    assert_eq!(typos.token_probability, Some(0.2));

    // Untouched nodes keep their defaults
    let blank = census.column("first_name", ColumnNoiseKind::LeaveBlank).unwrap();
    assert_eq!(blank.cell_probability, 0.01);
}

#[test]
fn test_toml_document_overrides_defaults() {
    let engine = NoiseEngine::new();
    let document = r#"
        [social_security.row_noise.omit_row]
        row_probability = 0.1

        [social_security.column_noise.event_date.swap_month_and_day]
        cell_probability = 0.5
    "#;
    let value: Value = toml::from_str(document).unwrap();
    let configuration =
        NoiseConfiguration::from_user_value(engine.catalog(), &value).unwrap();

    let ssa = configuration.dataset(SSA.name).unwrap();
    assert_eq!(ssa.row(RowNoiseKind::OmitRow).unwrap().row_probability, 0.1);
    assert_eq!(
        ssa.column("event_date", ColumnNoiseKind::SwapMonthAndDay)
            .unwrap()
            .cell_probability,
        0.5
    );
}

#[test]
fn test_rejected_documents_are_configuration_errors() {
    let engine = NoiseEngine::new();
    let documents = [
        json!({"decennial_census": {"row_noise": {"omit_row": {"row_probability": 0.1}}}}),
        json!({"decennial_census": {"column_noise": {"year": {"leave_blank": {"cell_probability": 0.1}}}}}),
        json!({"social_security": {"column_noise": {"ssn": {"make_phonetic_errors": {}}}}}),
        json!({"decennial_census": {"column_noise": {"first_name": {"make_typos": {"token_probability": 1.5}}}}}),
        json!(["decennial_census"]),
    ];
    for document in documents {
        let err = NoiseConfiguration::from_user_value(engine.catalog(), &document).unwrap_err();
        assert!(err.is_configuration_error(), "{:?} gave {}", document, err);
    }
}

#[test]
fn test_malformed_json_text() {
    let err = UserConfiguration::from_json_str("{\"decennial_census\": ").unwrap_err();
    assert!(matches!(err, NoiseError::Json(_)));
}

#[test]
fn test_out_of_range_tree_fails_before_noising() {
    let engine = NoiseEngine::new();
    let mut tree = serde_json::to_value(engine.no_noise_configuration()).unwrap();
    tree["decennial_census"]["column_noise"]["first_name"]["leave_blank"]["cell_probability"] =
        json!(1.5);
    let configuration: NoiseConfiguration = serde_json::from_value(tree).unwrap();

    let err = engine
        .noise_dataset(&CENSUS, census_table(10, 1), &configuration, &Seed::from(0u64))
        .unwrap_err();
    assert!(err.is_configuration_error(), "{}", err);
}

#[test]
fn test_swap_without_date_format_fails_before_noising() {
    let engine = NoiseEngine::new();
    let mut tree = serde_json::to_value(engine.no_noise_configuration()).unwrap();
    tree["decennial_census"]["column_noise"]["first_name"]["swap_month_and_day"] =
        json!({"cell_probability": 0.1});
    let configuration: NoiseConfiguration = serde_json::from_value(tree).unwrap();

    let err = engine
        .noise_dataset(&CENSUS, census_table(10, 1), &configuration, &Seed::from(0u64))
        .unwrap_err();
    assert!(err.is_configuration_error());
    assert!(err.to_string().contains("first_name"), "{}", err);
}

#[test]
fn test_configuration_round_trips_through_json() {
    let engine = NoiseEngine::new();
    let configuration = engine.default_configuration();
    let text = serde_json::to_string(&configuration).unwrap();
    let decoded: NoiseConfiguration = serde_json::from_str(&text).unwrap();
    assert_eq!(decoded, configuration);
    assert_eq!(
        decoded.dataset_names().collect::<Vec<_>>().len(),
        synthnoise_core::DATASETS.len()
    );
}
