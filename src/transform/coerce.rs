//! Field coercions shared by the transformers.
//!
//! Each helper is total except where a value cannot be represented at all; blank input yields the
//! field's default rather than an error.

use chrono::{NaiveDate, NaiveDateTime};
use uuid::Uuid;

use crate::error::TransformError;
use crate::types::{RawRow, RawValue};

/// Date formats tried in order; the first match wins.
pub const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%d.%m.%Y", "%Y/%m/%d"];

/// Datetime formats tried in order; the first match wins.
pub const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%d.%m.%Y %H:%M"];

/// Tokens (case-insensitive) that coerce to `true`. Anything else is `false`.
pub const TRUTHY_TOKENS: [&str; 3] = ["true", "1", "yes"];

/// Placeholder stored when a name part is missing.
pub const NAME_PLACEHOLDER: &str = "—";

/// Coerce the first non-blank of `columns` to a UUID.
///
/// Blank or absent yields `Ok(None)`. A present value that is not a UUID is an error.
pub fn uuid_column(row: &RawRow, columns: &[&str]) -> Result<Option<Uuid>, TransformError> {
    let Some((column, raw)) = columns.iter().find_map(|c| row.text(c).map(|t| (*c, t))) else {
        return Ok(None);
    };
    Uuid::parse_str(&raw)
        .map(Some)
        .map_err(|_| TransformError::InvalidIdentifier {
            column: column.to_string(),
            raw,
        })
}

pub fn to_date(value: Option<&RawValue>) -> Option<NaiveDate> {
    let text = value?.to_text()?;
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(&text, fmt).ok())
}

pub fn to_datetime(value: Option<&RawValue>) -> Option<NaiveDateTime> {
    let text = value?.to_text()?;
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(&text, fmt).ok())
}

/// Keep digits and `+`, force a leading `+`; anything shorter than 10 characters is dropped.
pub fn normalize_phone(raw: Option<String>) -> Option<String> {
    let raw = raw?;
    let mut phone: String = raw.chars().filter(|c| c.is_ascii_digit() || *c == '+').collect();
    if !phone.starts_with('+') {
        phone.insert(0, '+');
    }
    (phone.chars().count() >= 10).then_some(phone)
}

/// Number from `value`, `0.0` when absent or non-numeric.
pub fn to_f64_or_zero(value: Option<&RawValue>) -> f64 {
    value.and_then(RawValue::to_f64).unwrap_or(0.0)
}

/// Small integer from `value`, `0` when absent or non-numeric. Fractions are truncated.
pub fn to_i16_or_zero(column: &str, value: Option<&RawValue>) -> Result<i16, TransformError> {
    let Some(f) = value.and_then(RawValue::to_f64) else {
        return Ok(0);
    };
    let truncated = f.trunc();
    if truncated < f64::from(i16::MIN) || truncated > f64::from(i16::MAX) {
        return Err(TransformError::OutOfRange {
            column: column.to_string(),
            raw: value.map(ToString::to_string).unwrap_or_default(),
        });
    }
    Ok(truncated as i16)
}

pub fn to_bool(value: Option<&RawValue>) -> bool {
    value
        .and_then(RawValue::to_text)
        .is_some_and(|t| TRUTHY_TOKENS.contains(&t.to_lowercase().as_str()))
}

/// Split a full name into (first, last). Missing parts become [`NAME_PLACEHOLDER`].
pub fn split_full_name(full_name: Option<String>) -> (String, String) {
    let full_name = full_name.unwrap_or_default();
    let mut parts = full_name.split_whitespace();
    match parts.next() {
        None => (NAME_PLACEHOLDER.to_string(), NAME_PLACEHOLDER.to_string()),
        Some(first) => {
            let rest: Vec<&str> = parts.collect();
            let last = if rest.is_empty() {
                NAME_PLACEHOLDER.to_string()
            } else {
                rest.join(" ")
            };
            (first.to_string(), last)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(s: &str) -> RawValue {
        RawValue::Text(s.to_string())
    }

    #[test]
    fn date_formats_in_order() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9);
        assert_eq!(to_date(Some(&text("2024-03-09"))), expected);
        assert_eq!(to_date(Some(&text(" 09.03.2024 "))), expected);
        assert_eq!(to_date(Some(&text("2024/03/09"))), expected);
        assert_eq!(to_date(Some(&text("03/09/2024"))), None);
        assert_eq!(to_date(None), None);
    }

    #[test]
    fn datetime_formats_in_order() {
        let expected = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap().and_hms_opt(8, 30, 0);
        assert_eq!(to_datetime(Some(&text("2024-03-09 08:30:00"))), expected);
        assert_eq!(to_datetime(Some(&text("2024-03-09T08:30:00"))), expected);
        assert_eq!(to_datetime(Some(&text("09.03.2024 08:30"))), expected);
        // Date-only text is not a datetime.
        assert_eq!(to_datetime(Some(&text("2024-03-09"))), None);
    }

    #[test]
    fn phone_normalization() {
        assert_eq!(normalize_phone(Some("8 (999) 123-45-67".into())).as_deref(), Some("+89991234567"));
        assert_eq!(normalize_phone(Some("+7 999 123 45 67".into())).as_deref(), Some("+79991234567"));
        assert_eq!(normalize_phone(Some("12345".into())), None);
        assert_eq!(normalize_phone(None), None);
    }

    #[test]
    fn numeric_defaults() {
        assert_eq!(to_f64_or_zero(Some(&text("4.75"))), 4.75);
        assert_eq!(to_f64_or_zero(Some(&text("n/a"))), 0.0);
        assert_eq!(to_f64_or_zero(None), 0.0);
        assert_eq!(to_f64_or_zero(Some(&text("1e400"))), 0.0);
        assert_eq!(to_i16_or_zero("current_battery", Some(&text("87.9"))), Ok(87));
        assert_eq!(to_i16_or_zero("current_battery", Some(&text("x"))), Ok(0));
        assert!(to_i16_or_zero("current_battery", Some(&text("1e9"))).is_err());
    }

    #[test]
    fn truthy_tokens() {
        assert!(to_bool(Some(&text("YES"))));
        assert!(to_bool(Some(&text("1"))));
        assert!(to_bool(Some(&RawValue::Bool(true))));
        assert!(!to_bool(Some(&text("y"))));
        assert!(!to_bool(None));
    }

    #[test]
    fn full_name_split() {
        assert_eq!(split_full_name(Some("Анна Мария Иванова".into())), ("Анна".into(), "Мария Иванова".into()));
        assert_eq!(split_full_name(Some("Cher".into())), ("Cher".into(), NAME_PLACEHOLDER.into()));
        assert_eq!(
            split_full_name(None),
            (NAME_PLACEHOLDER.into(), NAME_PLACEHOLDER.into())
        );
    }

    #[test]
    fn uuid_fallback_column() {
        let id = "3f2b8c1e-9d4a-4b6e-8f1a-2c3d4e5f6a7b";
        let row = RawRow::new().with("id", id);
        assert_eq!(
            uuid_column(&row, &["user_id", "id"]).unwrap().map(|u| u.to_string()).as_deref(),
            Some(id)
        );
        let row = RawRow::new().with("id", "42");
        assert!(matches!(
            uuid_column(&row, &["user_id", "id"]),
            Err(TransformError::InvalidIdentifier { .. })
        ));
        assert_eq!(uuid_column(&RawRow::new(), &["user_id", "id"]), Ok(None));
    }
}
