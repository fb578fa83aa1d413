use std::fs;
use std::path::Path;

use rental_etl::EtlError;
use rental_etl::ingestion::csv::{extract_csv_from_path, extract_csv_from_reader};
use rental_etl::ingestion::{Extractor, SourceFormat};
use rental_etl::types::{EntityKind, RawValue};

#[test]
fn extract_csv_from_path_normalizes_headers() {
    let rows = extract_csv_from_path("tests/fixtures/users_batch1.csv").unwrap();
    assert_eq!(rows.len(), 4);
    let columns: Vec<&str> = rows[0].columns().collect();
    assert_eq!(
        columns,
        vec!["email", "full_name", "phone", "registration_date", "user_id"]
    );
    assert_eq!(rows[0].text("full_name").as_deref(), Some("Анна Иванова"));
    assert_eq!(rows[2].get("user_id"), Some(&RawValue::Null));
}

#[test]
fn blank_rows_are_dropped() {
    let input = " Ride ID ,End\tTs\nabc,\n,\n  ,  \nxyz,2024-01-01\n";
    let mut rdr = csv::ReaderBuilder::new().has_headers(true).from_reader(input.as_bytes());
    let rows = extract_csv_from_reader(&mut rdr).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].text("ride_id").as_deref(), Some("abc"));
    assert_eq!(rows[1].text("end_ts").as_deref(), Some("2024-01-01"));
}

#[test]
fn short_records_read_missing_cells_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("users.csv");
    fs::write(&path, "email,phone,rating\na@example.com\nb@example.com,+79990000002\n").unwrap();

    let rows = extract_csv_from_path(&path).unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].text("email").as_deref(), Some("a@example.com"));
    assert_eq!(rows[0].get("phone"), Some(&RawValue::Null));
    assert_eq!(rows[0].get("rating"), Some(&RawValue::Null));
    assert_eq!(rows[1].text("phone").as_deref(), Some("+79990000002"));
}

#[test]
fn long_record_is_a_file_level_error() {
    let input = "email,phone\na@example.com,+79990000001\nb@example.com,+79990000002,extra\n";
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(input.as_bytes());
    let err = extract_csv_from_reader(&mut rdr).unwrap_err();
    match err {
        EtlError::UnsupportedFormat { message } => {
            assert_eq!(message, "line 3: expected 2 fields, saw 3");
        }
        other => panic!("expected a format error, got {other:?}"),
    }
}

#[test]
fn invalid_utf8_is_a_file_level_error() {
    let err = extract_csv_from_path("tests/fixtures/users_corrupt.csv").unwrap_err();
    assert!(matches!(err, EtlError::Csv(_)), "{err:?}");
}

#[test]
fn format_is_inferred_from_extension() {
    assert_eq!(SourceFormat::from_path(Path::new("a/Users.CSV")).unwrap(), SourceFormat::Csv);
    assert_eq!(SourceFormat::from_path(Path::new("rides.xls")).unwrap(), SourceFormat::Excel);
    assert!(matches!(
        SourceFormat::from_path(Path::new("rides.json")),
        Err(EtlError::UnsupportedFormat { .. })
    ));
    assert!(SourceFormat::from_path(Path::new("README")).is_err());
}

#[test]
fn lists_only_supported_top_level_files() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["users.csv", "Rides.XLSX", "legacy.xls", "notes.md", "payments.json"] {
        fs::write(dir.path().join(name), "x").unwrap();
    }
    fs::create_dir(dir.path().join("nested")).unwrap();
    fs::write(dir.path().join("nested/scooters.csv"), "x").unwrap();

    let extractor = Extractor::new(dir.path());
    let mut names: Vec<String> = extractor
        .list_available_files()
        .unwrap()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    names.sort();
    assert_eq!(names, vec!["Rides.XLSX", "legacy.xls", "users.csv"]);
}

#[test]
fn extract_entity_classifies_by_name() {
    let extractor = Extractor::new("tests/fixtures");
    let (kind, rows) = extractor
        .extract_entity(Path::new("tests/fixtures/inventory_export.csv"), None)
        .unwrap();
    assert_eq!(kind, EntityKind::Unknown);
    assert_eq!(rows.len(), 2);

    let (kind, _) = extractor
        .extract_entity(Path::new("tests/fixtures/maintenance.csv"), Some("ignored for csv"))
        .unwrap();
    assert_eq!(kind, EntityKind::Maintenance);
}

#[test]
fn classification_priority() {
    assert_eq!(EntityKind::from_path(Path::new("in/USER_rides.csv")), EntityKind::User);
    assert_eq!(EntityKind::from_path(Path::new("scooter_tariffs.xlsx")), EntityKind::Scooter);
    assert_eq!(EntityKind::from_path(Path::new("ride_payments.csv")), EntityKind::Ride);
    assert_eq!(EntityKind::from_path(Path::new("Payments-2024.csv")), EntityKind::Payment);
    // Directory names do not count.
    assert_eq!(EntityKind::from_path(Path::new("users/stock.csv")), EntityKind::Unknown);
}
