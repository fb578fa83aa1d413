//! Per-entity business-rule validation.
//!
//! Every [`EntityKind`] except [`EntityKind::Unknown`] has one rule set (see [`rules`]). Rules run
//! in a fixed order and the first failing rule decides the rejection reason. Validators are pure:
//! the only outside input is the processing time used for "not in the future" checks.
//!
//! ```rust
//! use chrono::NaiveDate;
//! use rental_etl::types::{EntityKind, RawRow};
//! use rental_etl::validation::validate;
//!
//! let now = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap().and_hms_opt(12, 0, 0).unwrap();
//! let row = RawRow::new().with("email", "not-an-email");
//! let outcome = validate(EntityKind::User, &row, now).unwrap();
//! assert_eq!(outcome.reason(), Some("Invalid email format: not-an-email"));
//! ```

pub mod rules;

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::{EntityKind, RawRow, RawValue, ValidationOutcome};

pub use rules::{
    validate_maintenance, validate_payment, validate_ride, validate_scooter, validate_tariff, validate_user,
};

static UUID_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[1-5][0-9a-fA-F]{3}-[89abAB][0-9a-fA-F]{3}-[0-9a-fA-F]{12}$")
        .expect("valid uuid regex")
});
static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("valid email regex"));
static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?\d{7,15}$").expect("valid phone regex"));

/// Validate `row` with the rule set bound to `kind`.
///
/// Returns `None` for [`EntityKind::Unknown`], which has no validator.
pub fn validate(kind: EntityKind, row: &RawRow, now: NaiveDateTime) -> Option<ValidationOutcome> {
    let outcome = match kind {
        EntityKind::User => validate_user(row),
        EntityKind::Scooter => validate_scooter(row, now),
        EntityKind::Tariff => validate_tariff(row),
        EntityKind::Ride => validate_ride(row),
        EntityKind::Payment => validate_payment(row),
        EntityKind::Maintenance => validate_maintenance(row),
        EntityKind::Unknown => return None,
    };
    Some(outcome)
}

/// Well-formed UUID text with version (1-5) and RFC 4122 variant bits.
pub fn is_uuid(value: &RawValue) -> bool {
    value.to_text().is_some_and(|s| UUID_PATTERN.is_match(&s))
}

pub fn is_email(value: &RawValue) -> bool {
    value.to_text().is_some_and(|s| EMAIL_PATTERN.is_match(&s))
}

/// 7 to 15 digits with an optional leading `+`.
pub fn is_phone(value: &RawValue) -> bool {
    value.to_text().is_some_and(|s| PHONE_PATTERN.is_match(&s))
}

pub fn is_date(value: &RawValue) -> bool {
    parse_iso(value).is_some()
}

/// Numeric and `>= 0`.
pub fn is_non_negative(value: &RawValue) -> bool {
    value.to_f64().is_some_and(|f| f >= 0.0)
}

/// Parse an ISO-8601 style date or datetime.
///
/// Accepts `YYYY-MM-DD`, `YYYY-MM-DD[T ]HH:MM[:SS[.fff]]` and RFC 3339 timestamps with an offset
/// (the offset is dropped, keeping local wall-clock time). Dates map to midnight.
pub fn parse_iso(value: &RawValue) -> Option<NaiveDateTime> {
    let text = value.to_text()?;
    if let Ok(dt) = DateTime::parse_from_rfc3339(&text) {
        return Some(dt.naive_local());
    }
    const DATETIME_FORMATS: [&str; 4] = [
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%d %H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M",
    ];
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&text, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(&text, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })
}

/// First non-blank column among `columns`, returned with the name it was found under.
pub(crate) fn first_present<'a>(row: &'a RawRow, columns: &[&'static str]) -> Option<(&'static str, &'a RawValue)> {
    columns.iter().find_map(|c| row.present(c).map(|v| (*c, v)))
}
