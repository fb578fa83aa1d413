//! Canonical records: the typed field set handed to the persistence collaborator.
//!
//! Identifiers are optional where the target store assigns one when absent; the store is also
//! where NOT NULL and foreign-key constraints are enforced, so nullable-looking fields here can
//! still be rejected at load time.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::EntityKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub user_id: Option<Uuid>,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub registration_date: NaiveDateTime,
    pub rating: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scooter {
    pub scooter_id: Option<Uuid>,
    pub model: Option<String>,
    pub manufacture_date: Option<NaiveDate>,
    pub current_battery: i16,
    pub gps_latitude: f64,
    pub gps_longitude: f64,
    pub status_code: Option<String>,
    pub qr_code: String,
    pub created_datetime: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tariff {
    pub tariff_id: Option<Uuid>,
    pub tariff_name: Option<String>,
    pub unlock_fee: f64,
    pub rate_per_minute: f64,
    pub rate_per_km: f64,
    pub is_active: bool,
    pub created_datetime: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ride {
    pub ride_id: Option<Uuid>,
    pub user_id: Option<Uuid>,
    pub scooter_id: Option<Uuid>,
    pub tariff_id: Option<Uuid>,
    pub start_latitude: f64,
    pub start_longitude: f64,
    pub end_latitude: f64,
    pub end_longitude: f64,
    pub distance: f64,
    pub ride_cost: f64,
    pub start_time: NaiveDateTime,
    pub end_time: Option<NaiveDateTime>,
    pub created_datetime: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Payment {
    pub payment_id: Option<Uuid>,
    pub amount: f64,
    pub payment_date: NaiveDateTime,
    pub payment_method: Option<String>,
    pub status_code: String,
    pub ride_id: Option<Uuid>,
    pub created_datetime: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Maintenance {
    pub maintenance_id: Option<Uuid>,
    pub maintenance_type: Option<String>,
    pub scheduled_date: Option<NaiveDate>,
    pub completed_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub status: String,
    pub scooter_id: Option<Uuid>,
    pub staff_id: Option<Uuid>,
    pub created_datetime: NaiveDateTime,
}

/// A transformed row of any kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "entity", rename_all = "lowercase")]
pub enum CanonicalRow {
    User(User),
    Scooter(Scooter),
    Tariff(Tariff),
    Ride(Ride),
    Payment(Payment),
    Maintenance(Maintenance),
}

impl CanonicalRow {
    pub fn kind(&self) -> EntityKind {
        match self {
            CanonicalRow::User(_) => EntityKind::User,
            CanonicalRow::Scooter(_) => EntityKind::Scooter,
            CanonicalRow::Tariff(_) => EntityKind::Tariff,
            CanonicalRow::Ride(_) => EntityKind::Ride,
            CanonicalRow::Payment(_) => EntityKind::Payment,
            CanonicalRow::Maintenance(_) => EntityKind::Maintenance,
        }
    }

    /// Primary identifier, if the row carries one.
    pub fn id(&self) -> Option<Uuid> {
        match self {
            CanonicalRow::User(r) => r.user_id,
            CanonicalRow::Scooter(r) => r.scooter_id,
            CanonicalRow::Tariff(r) => r.tariff_id,
            CanonicalRow::Ride(r) => r.ride_id,
            CanonicalRow::Payment(r) => r.payment_id,
            CanonicalRow::Maintenance(r) => r.maintenance_id,
        }
    }
}
