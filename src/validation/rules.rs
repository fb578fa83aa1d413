//! Rule sets, one function per entity kind.
//!
//! Each function checks its rules in order and returns on the first failure. Where the target
//! schema and the export columns disagree on naming, both spellings are accepted and the export
//! spelling is checked first.

use chrono::NaiveDateTime;

use crate::types::{RawRow, ValidationOutcome};

use super::{first_present, is_date, is_email, is_non_negative, is_phone, is_uuid, parse_iso};

const SCOOTER_STATUSES: [&str; 5] = ["available", "in_use", "maintenance", "reserved", "offline"];
const PAYMENT_STATUSES: [&str; 4] = ["paid", "pending", "failed", "refunded"];

/// Reject with `$reason` when `$cond` holds.
macro_rules! ensure {
    ($cond:expr, $($reason:tt)+) => {
        if $cond {
            return ValidationOutcome::reject(format!($($reason)+));
        }
    };
}

/// Required UUID column: missing and malformed ids get distinct reasons.
fn required_uuid(row: &RawRow, column: &str, missing: String, invalid: impl FnOnce(String) -> String) -> Option<String> {
    match row.present(column) {
        None => Some(missing),
        Some(v) if !is_uuid(v) => Some(invalid(v.to_string())),
        Some(_) => None,
    }
}

pub fn validate_user(row: &RawRow) -> ValidationOutcome {
    let email = row.present("email");
    let user_id = row.present("user_id");
    ensure!(email.is_none() && user_id.is_none(), "User missing both email and user_id");

    if let Some(email) = email {
        ensure!(!is_email(email), "Invalid email format: {email}");
    }
    if let Some(id) = user_id {
        ensure!(!is_uuid(id), "Invalid UUID for user_id: {id}");
    }
    if let Some((_, phone)) = first_present(row, &["phone", "phone_number"]) {
        ensure!(!is_phone(phone), "Invalid phone number: {phone}");
    }
    if let Some(date) = row.present("registration_date") {
        ensure!(!is_date(date), "Invalid registration_date: {date}");
    }
    ValidationOutcome::Accepted
}

pub fn validate_scooter(row: &RawRow, now: NaiveDateTime) -> ValidationOutcome {
    if let Some(reason) = required_uuid(row, "scooter_id", "Missing scooter_id".into(), |v| {
        format!("Invalid scooter_id UUID: {v}")
    }) {
        return ValidationOutcome::Rejected(reason);
    }
    ensure!(row.present("model").is_none(), "Missing model for scooter");

    if let Some((_, battery)) = first_present(row, &["battery_level", "current_battery"]) {
        match battery.to_f64() {
            None => return ValidationOutcome::reject(format!("Invalid battery_level value: {battery}")),
            Some(b) => ensure!(!(0.0..=100.0).contains(&b), "Battery level out of range (0-100): {b}"),
        }
    }

    if let Some(date) = row.present("last_service_date") {
        match parse_iso(date) {
            None => return ValidationOutcome::reject(format!("Invalid last_service_date: {date}")),
            Some(d) => ensure!(d > now, "Future last_service_date not allowed: {date}"),
        }
    }

    let Some((_, status)) = first_present(row, &["status", "status_code"]) else {
        return ValidationOutcome::reject("Missing status");
    };
    let normalized = status.to_string().to_lowercase();
    ensure!(!SCOOTER_STATUSES.contains(&normalized.as_str()), "Invalid scooter status: {status}");

    ValidationOutcome::Accepted
}

pub fn validate_tariff(row: &RawRow) -> ValidationOutcome {
    if let Some(reason) = required_uuid(row, "tariff_id", "Missing tariff_id".into(), |v| {
        format!("Invalid UUID for tariff_id: {v}")
    }) {
        return ValidationOutcome::Rejected(reason);
    }
    ensure!(first_present(row, &["name", "tariff_name"]).is_none(), "Missing tariff name");

    if let Some((column, price)) = first_present(row, &["price_per_minute", "rate_per_minute"]) {
        ensure!(!is_non_negative(price), "Invalid {column}: {price}");
    }
    ValidationOutcome::Accepted
}

pub fn validate_ride(row: &RawRow) -> ValidationOutcome {
    for field in ["ride_id", "user_id", "scooter_id"] {
        if let Some(reason) = required_uuid(row, field, format!("Missing required field {field}"), |v| {
            format!("Invalid UUID for {field}: {v}")
        }) {
            return ValidationOutcome::Rejected(reason);
        }
    }

    let start = first_present(row, &["start_ts", "start_time"]);
    let Some(start_at) = start.and_then(|(_, v)| parse_iso(v)) else {
        let shown = start.map_or_else(|| "None".to_string(), |(_, v)| v.to_string());
        return ValidationOutcome::reject(format!("Invalid start_ts: {shown}"));
    };
    let end = first_present(row, &["end_ts", "end_time"]);
    let Some(end_at) = end.and_then(|(_, v)| parse_iso(v)) else {
        let shown = end.map_or_else(|| "None".to_string(), |(_, v)| v.to_string());
        return ValidationOutcome::reject(format!("Invalid end_ts: {shown}"));
    };
    ensure!(end_at < start_at, "end_ts is before start_ts");

    if let Some(duration) = row.present("duration_seconds") {
        ensure!(!is_non_negative(duration), "Negative duration_seconds: {duration}");
    }
    if let Some((column, distance)) = first_present(row, &["distance_meters", "distance"]) {
        ensure!(!is_non_negative(distance), "Negative {column}: {distance}");
    }
    ValidationOutcome::Accepted
}

pub fn validate_payment(row: &RawRow) -> ValidationOutcome {
    if let Some(reason) = required_uuid(row, "payment_id", "Missing payment_id".into(), |v| {
        format!("Invalid UUID for payment_id: {v}")
    }) {
        return ValidationOutcome::Rejected(reason);
    }

    let Some(amount) = row.present("amount") else {
        return ValidationOutcome::reject("Missing amount");
    };
    ensure!(!amount.to_f64().is_some_and(|a| a > 0.0), "Invalid payment amount: {amount}");

    if let Some((_, status)) = first_present(row, &["status", "status_code"]) {
        let normalized = status.to_string().to_lowercase();
        ensure!(!PAYMENT_STATUSES.contains(&normalized.as_str()), "Invalid payment status: {status}");
    }
    if let Some(date) = row.present("payment_date") {
        ensure!(!is_date(date), "Invalid payment_date: {date}");
    }
    ValidationOutcome::Accepted
}

pub fn validate_maintenance(row: &RawRow) -> ValidationOutcome {
    for field in ["maintenance_id", "scooter_id"] {
        let missing = format!("Missing {field}");
        if let Some(reason) = required_uuid(row, field, missing, |v| format!("Invalid UUID for {field}: {v}")) {
            return ValidationOutcome::Rejected(reason);
        }
    }
    ensure!(
        first_present(row, &["service_type", "maintenance_type"]).is_none(),
        "Missing service_type"
    );
    if let Some((_, date)) = first_present(row, &["service_date", "scheduled_date"]) {
        ensure!(!is_date(date), "Invalid service_date: {date}");
    }
    ValidationOutcome::Accepted
}

#[cfg(test)]
mod tests {
    use chrono::NaiveDate;

    use super::*;

    const ID_A: &str = "3f2b8c1e-9d4a-4b6e-8f1a-2c3d4e5f6a7b";
    const ID_B: &str = "6a1c0f7e-52d3-4c8b-9e21-7b4d9a0c3e15";
    const ID_C: &str = "c9e5d2a4-1b7f-4e3a-a6d8-0f2e4b6c8a1d";

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn reason(outcome: ValidationOutcome) -> String {
        outcome.reason().map(str::to_string).unwrap_or_default()
    }

    fn scooter() -> RawRow {
        RawRow::new()
            .with("scooter_id", ID_A)
            .with("model", "Ninebot Max G30")
            .with("battery_level", "50")
            .with("last_service_date", "2024-05-20")
            .with("status", "Available")
    }

    fn ride() -> RawRow {
        RawRow::new()
            .with("ride_id", ID_A)
            .with("user_id", ID_B)
            .with("scooter_id", ID_C)
            .with("start_ts", "2024-05-01 10:00:00")
            .with("end_ts", "2024-05-01 10:25:00")
            .with("duration_seconds", "1500")
            .with("distance_meters", "3200")
    }

    #[test]
    fn user_requires_email_or_id() {
        assert_eq!(reason(validate_user(&RawRow::new().with("phone", "+79991234567"))), "User missing both email and user_id");
        assert!(validate_user(&RawRow::new().with("email", "a@b.co")).is_accepted());
        assert!(validate_user(&RawRow::new().with("user_id", ID_A)).is_accepted());
    }

    #[test]
    fn user_rules_run_in_order() {
        let row = RawRow::new()
            .with("email", "broken")
            .with("user_id", "nope")
            .with("phone", "12");
        assert_eq!(reason(validate_user(&row)), "Invalid email format: broken");

        let row = RawRow::new().with("email", "a@b.co").with("user_id", "nope").with("phone", "12");
        assert_eq!(reason(validate_user(&row)), "Invalid UUID for user_id: nope");

        let row = RawRow::new().with("email", "a@b.co").with("phone", "12");
        assert_eq!(reason(validate_user(&row)), "Invalid phone number: 12");

        let row = RawRow::new().with("email", "a@b.co").with("registration_date", "31/12/2023");
        assert_eq!(reason(validate_user(&row)), "Invalid registration_date: 31/12/2023");
    }

    #[test]
    fn scooter_battery_range() {
        assert!(validate_scooter(&scooter(), now()).is_accepted());

        let row = scooter().with("battery_level", "150");
        assert_eq!(reason(validate_scooter(&row, now())), "Battery level out of range (0-100): 150");

        let row = scooter().with("battery_level", "full");
        assert_eq!(reason(validate_scooter(&row, now())), "Invalid battery_level value: full");
    }

    #[test]
    fn scooter_service_date_must_not_be_in_the_future() {
        let row = scooter().with("last_service_date", "2024-06-02");
        assert_eq!(
            reason(validate_scooter(&row, now())),
            "Future last_service_date not allowed: 2024-06-02"
        );
        let row = scooter().with("last_service_date", "02.06.2024");
        assert_eq!(reason(validate_scooter(&row, now())), "Invalid last_service_date: 02.06.2024");
    }

    #[test]
    fn scooter_status_is_required_and_closed() {
        let mut row = scooter();
        row.insert("status", crate::types::RawValue::Null);
        assert_eq!(reason(validate_scooter(&row, now())), "Missing status");

        let row = scooter().with("status", "broken");
        assert_eq!(reason(validate_scooter(&row, now())), "Invalid scooter status: broken");

        let row = scooter().with("status", "IN_USE");
        assert!(validate_scooter(&row, now()).is_accepted());
    }

    #[test]
    fn scooter_id_checked_before_model() {
        let row = RawRow::new().with("scooter_id", "123");
        assert_eq!(reason(validate_scooter(&row, now())), "Invalid scooter_id UUID: 123");
        assert_eq!(reason(validate_scooter(&RawRow::new(), now())), "Missing scooter_id");
    }

    #[test]
    fn tariff_rules() {
        let ok = RawRow::new().with("tariff_id", ID_A).with("name", "Базовый").with("price_per_minute", "7.5");
        assert!(validate_tariff(&ok).is_accepted());

        let row = RawRow::new().with("tariff_id", ID_A);
        assert_eq!(reason(validate_tariff(&row)), "Missing tariff name");

        let row = ok.clone().with("price_per_minute", "-1");
        assert_eq!(reason(validate_tariff(&row)), "Invalid price_per_minute: -1");
    }

    #[test]
    fn ride_end_before_start_is_rejected() {
        assert!(validate_ride(&ride()).is_accepted());
        let row = ride().with("end_ts", "2024-05-01 09:59:59");
        assert_eq!(reason(validate_ride(&row)), "end_ts is before start_ts");
    }

    #[test]
    fn ride_ids_and_timestamps() {
        let row = ride().with("scooter_id", "xyz");
        assert_eq!(reason(validate_ride(&row)), "Invalid UUID for scooter_id: xyz");

        let mut row = ride();
        row.insert("user_id", crate::types::RawValue::Null);
        assert_eq!(reason(validate_ride(&row)), "Missing required field user_id");

        let mut row = ride();
        row.insert("start_ts", crate::types::RawValue::Null);
        assert_eq!(reason(validate_ride(&row)), "Invalid start_ts: None");

        let row = ride().with("end_ts", "soon");
        assert_eq!(reason(validate_ride(&row)), "Invalid end_ts: soon");
    }

    #[test]
    fn ride_measurements_must_be_non_negative() {
        let row = ride().with("duration_seconds", "-5");
        assert_eq!(reason(validate_ride(&row)), "Negative duration_seconds: -5");
        let row = ride().with("distance_meters", "-1");
        assert_eq!(reason(validate_ride(&row)), "Negative distance_meters: -1");
    }

    #[test]
    fn payment_rules() {
        let ok = RawRow::new()
            .with("payment_id", ID_A)
            .with("amount", "250.00")
            .with("status", "PAID")
            .with("payment_date", "2024-05-01T10:30:00");
        assert!(validate_payment(&ok).is_accepted());

        assert_eq!(
            reason(validate_payment(&RawRow::new().with("payment_id", ID_A))),
            "Missing amount"
        );
        assert_eq!(reason(validate_payment(&ok.clone().with("amount", "0"))), "Invalid payment amount: 0");
        assert_eq!(
            reason(validate_payment(&ok.clone().with("status", "chargeback"))),
            "Invalid payment status: chargeback"
        );
        assert_eq!(
            reason(validate_payment(&ok.with("payment_date", "someday"))),
            "Invalid payment_date: someday"
        );
    }

    #[test]
    fn maintenance_rules() {
        let ok = RawRow::new()
            .with("maintenance_id", ID_A)
            .with("scooter_id", ID_B)
            .with("service_type", "brake check")
            .with("service_date", "2024-05-10");
        assert!(validate_maintenance(&ok).is_accepted());

        let row = RawRow::new().with("maintenance_id", ID_A);
        assert_eq!(reason(validate_maintenance(&row)), "Missing scooter_id");

        let row = ok.clone().with("scooter_id", "bad");
        assert_eq!(reason(validate_maintenance(&row)), "Invalid UUID for scooter_id: bad");

        let mut row = ok.clone();
        row.insert("service_type", crate::types::RawValue::Null);
        assert_eq!(reason(validate_maintenance(&row)), "Missing service_type");

        let row = ok.with("service_date", "10.05.2024");
        assert_eq!(reason(validate_maintenance(&row)), "Invalid service_date: 10.05.2024");
    }

    #[test]
    fn malformed_uuid_always_rejected() {
        let cases = [
            validate_user(&RawRow::new().with("user_id", "bad-id")),
            validate_scooter(&scooter().with("scooter_id", "bad-id"), now()),
            validate_tariff(&RawRow::new().with("tariff_id", "bad-id").with("name", "x")),
            validate_ride(&ride().with("ride_id", "bad-id")),
            validate_payment(&RawRow::new().with("payment_id", "bad-id").with("amount", "1")),
            validate_maintenance(&RawRow::new().with("maintenance_id", "bad-id")),
        ];
        for outcome in cases {
            assert!(!outcome.is_accepted());
            assert!(outcome.reason().unwrap().contains("bad-id"));
        }
    }
}
