//! Transformers: raw rows to canonical records.
//!
//! One pure function per entity kind. The only time dependency is the explicit `now` argument,
//! used for fields that default to the processing time. Recognized columns per kind are listed on
//! each function; all other columns are ignored.

pub mod coerce;
pub mod entities;

use chrono::NaiveDateTime;

use crate::error::TransformError;
use crate::types::{EntityKind, RawRow};

use coerce::{
    normalize_phone, split_full_name, to_bool, to_date, to_datetime, to_f64_or_zero, to_i16_or_zero,
    uuid_column,
};
pub use entities::{CanonicalRow, Maintenance, Payment, Ride, Scooter, Tariff, User};

/// Transform `row` with the transformer bound to `kind`.
pub fn transform(kind: EntityKind, row: &RawRow, now: NaiveDateTime) -> Result<CanonicalRow, TransformError> {
    Ok(match kind {
        EntityKind::User => CanonicalRow::User(transform_user(row, now)?),
        EntityKind::Scooter => CanonicalRow::Scooter(transform_scooter(row, now)?),
        EntityKind::Tariff => CanonicalRow::Tariff(transform_tariff(row, now)?),
        EntityKind::Ride => CanonicalRow::Ride(transform_ride(row, now)?),
        EntityKind::Payment => CanonicalRow::Payment(transform_payment(row, now)?),
        EntityKind::Maintenance => CanonicalRow::Maintenance(transform_maintenance(row, now)?),
        EntityKind::Unknown => return Err(TransformError::NoTransformer(kind)),
    })
}

/// Columns: `user_id`|`id`, `full_name`|`name`, `email`, `phone`|`phone_number`, `date_of_birth`,
/// `registration_date`, `rating`.
pub fn transform_user(row: &RawRow, now: NaiveDateTime) -> Result<User, TransformError> {
    let (first_name, last_name) = split_full_name(row.text_any(&["full_name", "name"]));
    Ok(User {
        user_id: uuid_column(row, &["user_id", "id"])?,
        first_name,
        last_name,
        email: row.text("email"),
        phone_number: normalize_phone(row.text_any(&["phone", "phone_number"])),
        date_of_birth: to_date(row.get("date_of_birth")),
        registration_date: to_datetime(row.get("registration_date")).unwrap_or(now),
        rating: to_f64_or_zero(row.get("rating")),
    })
}

/// Columns: `scooter_id`|`id`, `model`, `manufacture_date`, `current_battery`|`battery_level`,
/// `gps_latitude`, `gps_longitude`, `status_code`|`status`, `qr_code`.
pub fn transform_scooter(row: &RawRow, now: NaiveDateTime) -> Result<Scooter, TransformError> {
    let battery = ["current_battery", "battery_level"]
        .into_iter()
        .find_map(|c| row.present(c).map(|v| (c, v)));
    Ok(Scooter {
        scooter_id: uuid_column(row, &["scooter_id", "id"])?,
        model: row.text("model"),
        manufacture_date: to_date(row.get("manufacture_date")),
        current_battery: match battery {
            Some((column, value)) => to_i16_or_zero(column, Some(value))?,
            None => 0,
        },
        gps_latitude: to_f64_or_zero(row.get("gps_latitude")),
        gps_longitude: to_f64_or_zero(row.get("gps_longitude")),
        status_code: row.text_any(&["status_code", "status"]).map(|s| s.to_lowercase()),
        qr_code: row.text("qr_code").unwrap_or_default(),
        created_datetime: now,
    })
}

/// Columns: `tariff_id`|`id`, `tariff_name`|`name`, `unlock_fee`, `rate_per_minute`|`price_per_minute`,
/// `rate_per_km`, `is_active`, `created_datetime`.
pub fn transform_tariff(row: &RawRow, now: NaiveDateTime) -> Result<Tariff, TransformError> {
    Ok(Tariff {
        tariff_id: uuid_column(row, &["tariff_id", "id"])?,
        tariff_name: row.text_any(&["tariff_name", "name"]),
        unlock_fee: to_f64_or_zero(row.get("unlock_fee")),
        rate_per_minute: to_f64_or_zero(row.present("rate_per_minute").or(row.get("price_per_minute"))),
        rate_per_km: to_f64_or_zero(row.get("rate_per_km")),
        is_active: to_bool(row.get("is_active")),
        created_datetime: to_datetime(row.get("created_datetime")).unwrap_or(now),
    })
}

/// Columns: `ride_id`|`id`, `user_id`, `scooter_id`, `tariff_id`, `start_latitude`, `start_longitude`,
/// `end_latitude`, `end_longitude`, `distance`|`distance_meters`, `ride_cost`,
/// `start_time`|`start_ts`, `end_time`|`end_ts`, `created_datetime`.
pub fn transform_ride(row: &RawRow, now: NaiveDateTime) -> Result<Ride, TransformError> {
    Ok(Ride {
        ride_id: uuid_column(row, &["ride_id", "id"])?,
        user_id: uuid_column(row, &["user_id"])?,
        scooter_id: uuid_column(row, &["scooter_id"])?,
        tariff_id: uuid_column(row, &["tariff_id"])?,
        start_latitude: to_f64_or_zero(row.get("start_latitude")),
        start_longitude: to_f64_or_zero(row.get("start_longitude")),
        end_latitude: to_f64_or_zero(row.get("end_latitude")),
        end_longitude: to_f64_or_zero(row.get("end_longitude")),
        distance: to_f64_or_zero(row.present("distance").or(row.get("distance_meters"))),
        ride_cost: to_f64_or_zero(row.get("ride_cost")),
        start_time: to_datetime(row.present("start_time").or(row.get("start_ts"))).unwrap_or(now),
        end_time: to_datetime(row.present("end_time").or(row.get("end_ts"))),
        created_datetime: to_datetime(row.get("created_datetime")).unwrap_or(now),
    })
}

/// Columns: `payment_id`|`id`, `amount`, `payment_date`, `payment_method`, `status_code`|`status`,
/// `ride_id`. A missing status defaults to `pending`.
pub fn transform_payment(row: &RawRow, now: NaiveDateTime) -> Result<Payment, TransformError> {
    Ok(Payment {
        payment_id: uuid_column(row, &["payment_id", "id"])?,
        amount: to_f64_or_zero(row.get("amount")),
        payment_date: to_datetime(row.get("payment_date")).unwrap_or(now),
        payment_method: row.text("payment_method"),
        status_code: row
            .text_any(&["status_code", "status"])
            .map_or_else(|| "pending".to_string(), |s| s.to_lowercase()),
        ride_id: uuid_column(row, &["ride_id"])?,
        created_datetime: now,
    })
}

/// Columns: `maintenance_id`|`id`, `maintenance_type`|`service_type`, `scheduled_date`|`service_date`,
/// `completed_date`, `description`, `status`, `scooter_id`, `staff_id`. A missing status defaults
/// to `scheduled`.
pub fn transform_maintenance(row: &RawRow, now: NaiveDateTime) -> Result<Maintenance, TransformError> {
    Ok(Maintenance {
        maintenance_id: uuid_column(row, &["maintenance_id", "id"])?,
        maintenance_type: row.text_any(&["maintenance_type", "service_type"]),
        scheduled_date: to_date(row.present("scheduled_date").or(row.get("service_date"))),
        completed_date: to_date(row.get("completed_date")),
        description: row.text("description"),
        status: row.text("status").map_or_else(|| "scheduled".to_string(), |s| s.to_lowercase()),
        scooter_id: uuid_column(row, &["scooter_id"])?,
        staff_id: uuid_column(row, &["staff_id"])?,
        created_datetime: now,
    })
}
