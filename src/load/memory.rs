//! In-memory store enforcing the target data model's constraints.

use std::collections::{HashMap, HashSet};

use uuid::Uuid;

use crate::error::{StoreError, StoreResult};
use crate::transform::{CanonicalRow, Maintenance, Payment, Ride, Scooter, Tariff, User};

use super::Store;

pub const SCOOTER_STATUS_CODES: [&str; 5] = ["available", "in_use", "maintenance", "reserved", "offline"];
pub const PAYMENT_STATUS_CODES: [&str; 4] = ["paid", "pending", "failed", "refunded"];

const PHONE_MAX_LEN: usize = 15;
const NAME_MAX_LEN: usize = 50;
const EMAIL_MAX_LEN: usize = 100;

fn check(ok: bool, constraint: &'static str, message: impl FnOnce() -> String) -> StoreResult<()> {
    if ok {
        Ok(())
    } else {
        Err(StoreError::Check {
            constraint,
            message: message(),
        })
    }
}

fn not_null<T>(value: Option<T>, entity: &'static str, field: &'static str) -> StoreResult<T> {
    value.ok_or(StoreError::NotNull { entity, field })
}

fn exists<V>(table: &HashMap<Uuid, V>, id: Uuid, entity: &'static str, target: &'static str) -> StoreResult<()> {
    if table.contains_key(&id) {
        Ok(())
    } else {
        Err(StoreError::ForeignKey {
            entity,
            target,
            value: id.to_string(),
        })
    }
}

fn assign_id<V>(
    table: &HashMap<Uuid, V>,
    id: Option<Uuid>,
    entity: &'static str,
    field: &'static str,
) -> StoreResult<Uuid> {
    let id = id.unwrap_or_else(Uuid::new_v4);
    if table.contains_key(&id) {
        return Err(StoreError::Duplicate {
            entity,
            field,
            value: id.to_string(),
        });
    }
    Ok(id)
}

/// Keeps every created record in memory.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: HashMap<Uuid, User>,
    scooters: HashMap<Uuid, Scooter>,
    tariffs: HashMap<Uuid, Tariff>,
    rides: HashMap<Uuid, Ride>,
    payments: HashMap<Uuid, Payment>,
    maintenance: HashMap<Uuid, Maintenance>,
    user_phones: HashSet<String>,
    scooter_qr_codes: HashSet<String>,
    paid_rides: HashSet<Uuid>,
    closed: bool,
    close_calls: usize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn user(&self, id: &Uuid) -> Option<&User> {
        self.users.get(id)
    }

    pub fn scooter(&self, id: &Uuid) -> Option<&Scooter> {
        self.scooters.get(id)
    }

    pub fn ride(&self, id: &Uuid) -> Option<&Ride> {
        self.rides.get(id)
    }

    pub fn user_count(&self) -> usize {
        self.users.len()
    }

    pub fn scooter_count(&self) -> usize {
        self.scooters.len()
    }

    pub fn tariff_count(&self) -> usize {
        self.tariffs.len()
    }

    pub fn ride_count(&self) -> usize {
        self.rides.len()
    }

    pub fn payment_count(&self) -> usize {
        self.payments.len()
    }

    pub fn maintenance_count(&self) -> usize {
        self.maintenance.len()
    }

    /// Number of times [`Store::close`] was called.
    pub fn close_calls(&self) -> usize {
        self.close_calls
    }

    /// Drop a record created earlier, releasing its unique keys.
    pub(crate) fn forget(&mut self, row: &CanonicalRow) {
        let Some(id) = row.id() else {
            return;
        };
        match row {
            CanonicalRow::User(user) => {
                if self.users.remove(&id).is_some() {
                    if let Some(phone) = &user.phone_number {
                        self.user_phones.remove(phone);
                    }
                }
            }
            CanonicalRow::Scooter(scooter) => {
                if self.scooters.remove(&id).is_some() {
                    self.scooter_qr_codes.remove(&scooter.qr_code);
                }
            }
            CanonicalRow::Tariff(_) => {
                self.tariffs.remove(&id);
            }
            CanonicalRow::Ride(_) => {
                self.rides.remove(&id);
            }
            CanonicalRow::Payment(payment) => {
                if self.payments.remove(&id).is_some() {
                    if let Some(ride_id) = payment.ride_id {
                        self.paid_rides.remove(&ride_id);
                    }
                }
            }
            CanonicalRow::Maintenance(_) => {
                self.maintenance.remove(&id);
            }
        }
    }

    fn ensure_open(&self) -> StoreResult<()> {
        if self.closed { Err(StoreError::Closed) } else { Ok(()) }
    }
}

impl Store for MemoryStore {
    fn create_user(&mut self, mut user: User) -> StoreResult<User> {
        self.ensure_open()?;
        let phone = not_null(user.phone_number.clone(), "user", "phone_number")?;
        check(phone.starts_with('+'), "CHK_User_Phone", || {
            format!("phone number must start with +: {phone}")
        })?;
        check(phone.chars().count() <= PHONE_MAX_LEN, "CHK_User_Phone", || {
            format!("phone number longer than {PHONE_MAX_LEN}: {phone}")
        })?;
        for name in [&user.first_name, &user.last_name] {
            check(name.chars().count() <= NAME_MAX_LEN, "CHK_User_Name", || {
                format!("name longer than {NAME_MAX_LEN}: {name}")
            })?;
        }
        if let Some(email) = &user.email {
            check(email.chars().count() <= EMAIL_MAX_LEN, "CHK_User_Email", || {
                format!("email longer than {EMAIL_MAX_LEN}: {email}")
            })?;
        }
        check((0.0..=5.0).contains(&user.rating), "CHK_User_Rating", || {
            format!("rating must be within 0..5: {}", user.rating)
        })?;

        let id = assign_id(&self.users, user.user_id, "user", "user_id")?;
        if self.user_phones.contains(&phone) {
            return Err(StoreError::Duplicate {
                entity: "user",
                field: "phone_number",
                value: phone,
            });
        }

        user.user_id = Some(id);
        self.user_phones.insert(phone);
        self.users.insert(id, user.clone());
        Ok(user)
    }

    fn create_scooter(&mut self, mut scooter: Scooter) -> StoreResult<Scooter> {
        self.ensure_open()?;
        not_null(scooter.model.as_ref(), "scooter", "model")?;
        not_null(scooter.manufacture_date, "scooter", "manufacture_date")?;
        check((0..=100).contains(&scooter.current_battery), "CHK_Scooter_Battery", || {
            format!("battery must be within 0..100: {}", scooter.current_battery)
        })?;
        let status = not_null(scooter.status_code.as_deref(), "scooter", "status_code")?;
        if !SCOOTER_STATUS_CODES.contains(&status) {
            return Err(StoreError::ForeignKey {
                entity: "scooter",
                target: "scooter status",
                value: status.to_string(),
            });
        }

        let id = assign_id(&self.scooters, scooter.scooter_id, "scooter", "scooter_id")?;
        if self.scooter_qr_codes.contains(&scooter.qr_code) {
            return Err(StoreError::Duplicate {
                entity: "scooter",
                field: "qr_code",
                value: scooter.qr_code.clone(),
            });
        }

        scooter.scooter_id = Some(id);
        self.scooter_qr_codes.insert(scooter.qr_code.clone());
        self.scooters.insert(id, scooter.clone());
        Ok(scooter)
    }

    fn create_tariff(&mut self, mut tariff: Tariff) -> StoreResult<Tariff> {
        self.ensure_open()?;
        not_null(tariff.tariff_name.as_ref(), "tariff", "tariff_name")?;
        check(tariff.unlock_fee >= 0.0, "CHK_Tariff_UnlockFee", || {
            format!("unlock fee cannot be negative: {}", tariff.unlock_fee)
        })?;
        check(tariff.rate_per_minute >= 0.0, "CHK_Tariff_RatePerMinute", || {
            format!("rate per minute cannot be negative: {}", tariff.rate_per_minute)
        })?;

        let id = assign_id(&self.tariffs, tariff.tariff_id, "tariff", "tariff_id")?;
        tariff.tariff_id = Some(id);
        self.tariffs.insert(id, tariff.clone());
        Ok(tariff)
    }

    fn create_ride(&mut self, mut ride: Ride) -> StoreResult<Ride> {
        self.ensure_open()?;
        let user_id = not_null(ride.user_id, "ride", "user_id")?;
        let scooter_id = not_null(ride.scooter_id, "ride", "scooter_id")?;
        let tariff_id = not_null(ride.tariff_id, "ride", "tariff_id")?;
        check(ride.distance >= 0.0, "CHK_Ride_Distance", || {
            format!("distance cannot be negative: {}", ride.distance)
        })?;
        check(ride.ride_cost >= 0.0, "CHK_Ride_Cost", || {
            format!("ride cost cannot be negative: {}", ride.ride_cost)
        })?;
        check(ride.end_time.is_none_or(|end| end > ride.start_time), "CHK_Ride_Dates", || {
            "end_time must be after start_time".to_string()
        })?;
        exists(&self.users, user_id, "ride", "user")?;
        exists(&self.scooters, scooter_id, "ride", "scooter")?;
        exists(&self.tariffs, tariff_id, "ride", "tariff")?;

        let id = assign_id(&self.rides, ride.ride_id, "ride", "ride_id")?;
        ride.ride_id = Some(id);
        self.rides.insert(id, ride.clone());
        Ok(ride)
    }

    fn create_payment(&mut self, mut payment: Payment) -> StoreResult<Payment> {
        self.ensure_open()?;
        check(payment.amount > 0.0, "CHK_Payment_Amount", || {
            format!("payment amount must be positive: {}", payment.amount)
        })?;
        not_null(payment.payment_method.as_ref(), "payment", "payment_method")?;
        if !PAYMENT_STATUS_CODES.contains(&payment.status_code.as_str()) {
            return Err(StoreError::ForeignKey {
                entity: "payment",
                target: "payment status",
                value: payment.status_code.clone(),
            });
        }
        let ride_id = not_null(payment.ride_id, "payment", "ride_id")?;
        exists(&self.rides, ride_id, "payment", "ride")?;

        let id = assign_id(&self.payments, payment.payment_id, "payment", "payment_id")?;
        if self.paid_rides.contains(&ride_id) {
            return Err(StoreError::Duplicate {
                entity: "payment",
                field: "ride_id",
                value: ride_id.to_string(),
            });
        }

        payment.payment_id = Some(id);
        self.paid_rides.insert(ride_id);
        self.payments.insert(id, payment.clone());
        Ok(payment)
    }

    fn create_maintenance(&mut self, mut maintenance: Maintenance) -> StoreResult<Maintenance> {
        self.ensure_open()?;
        not_null(maintenance.maintenance_type.as_ref(), "maintenance", "maintenance_type")?;
        let scheduled = not_null(maintenance.scheduled_date, "maintenance", "scheduled_date")?;
        check(
            maintenance.completed_date.is_none_or(|done| done >= scheduled),
            "CHK_Maintenance_Dates",
            || "completed_date must not precede scheduled_date".to_string(),
        )?;
        let scooter_id = not_null(maintenance.scooter_id, "maintenance", "scooter_id")?;
        not_null(maintenance.staff_id, "maintenance", "staff_id")?;
        exists(&self.scooters, scooter_id, "maintenance", "scooter")?;

        let id = assign_id(&self.maintenance, maintenance.maintenance_id, "maintenance", "maintenance_id")?;
        maintenance.maintenance_id = Some(id);
        self.maintenance.insert(id, maintenance.clone());
        Ok(maintenance)
    }

    fn close(&mut self) -> StoreResult<()> {
        self.closed = true;
        self.close_calls += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::{NaiveDate, NaiveDateTime};

    use super::*;

    fn ts(h: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 1).unwrap().and_hms_opt(h, 0, 0).unwrap()
    }

    fn user(phone: &str) -> User {
        User {
            user_id: None,
            first_name: "Олег".into(),
            last_name: "—".into(),
            email: None,
            phone_number: Some(phone.into()),
            date_of_birth: None,
            registration_date: ts(0),
            rating: 0.0,
        }
    }

    fn scooter(qr: &str) -> Scooter {
        Scooter {
            scooter_id: None,
            model: Some("M365".into()),
            manufacture_date: NaiveDate::from_ymd_opt(2023, 1, 1),
            current_battery: 80,
            gps_latitude: 55.75,
            gps_longitude: 37.61,
            status_code: Some("available".into()),
            qr_code: qr.into(),
            created_datetime: ts(0),
        }
    }

    fn tariff() -> Tariff {
        Tariff {
            tariff_id: None,
            tariff_name: Some("Base".into()),
            unlock_fee: 50.0,
            rate_per_minute: 7.0,
            rate_per_km: 0.0,
            is_active: true,
            created_datetime: ts(0),
        }
    }

    fn ride(user_id: Uuid, scooter_id: Uuid, tariff_id: Uuid) -> Ride {
        Ride {
            ride_id: None,
            user_id: Some(user_id),
            scooter_id: Some(scooter_id),
            tariff_id: Some(tariff_id),
            start_latitude: 0.0,
            start_longitude: 0.0,
            end_latitude: 0.0,
            end_longitude: 0.0,
            distance: 1200.0,
            ride_cost: 150.0,
            start_time: ts(10),
            end_time: Some(ts(11)),
            created_datetime: ts(11),
        }
    }

    #[test]
    fn assigns_ids_and_enforces_unique_phone() {
        let mut store = MemoryStore::new();
        let created = store.create_user(user("+79991112233")).unwrap();
        assert!(created.user_id.is_some());
        let err = store.create_user(user("+79991112233")).unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { field: "phone_number", .. }));
        assert!(matches!(
            store.create_user(User { phone_number: None, ..user("+1") }),
            Err(StoreError::NotNull { field: "phone_number", .. })
        ));
    }

    #[test]
    fn forget_releases_unique_keys() {
        let mut store = MemoryStore::new();
        let created = store.create_user(user("+79991112233")).unwrap();
        let id = created.user_id.unwrap();
        store.forget(&CanonicalRow::User(created));
        assert!(store.user(&id).is_none());
        assert_eq!(store.user_count(), 0);
        store.create_user(user("+79991112233")).unwrap();

        let created = store.create_scooter(scooter("QR-1")).unwrap();
        store.forget(&CanonicalRow::Scooter(created));
        store.create_scooter(scooter("QR-1")).unwrap();
        assert_eq!(store.scooter_count(), 1);
    }

    #[test]
    fn duplicate_primary_key() {
        let mut store = MemoryStore::new();
        let id = Uuid::new_v4();
        store.create_tariff(Tariff { tariff_id: Some(id), ..tariff() }).unwrap();
        let err = store.create_tariff(Tariff { tariff_id: Some(id), ..tariff() }).unwrap_err();
        assert_eq!(err.to_string(), format!("duplicate tariff tariff_id: {id}"));
    }

    #[test]
    fn scooter_constraints() {
        let mut store = MemoryStore::new();
        store.create_scooter(scooter("QR-1")).unwrap();
        assert!(matches!(
            store.create_scooter(scooter("QR-1")),
            Err(StoreError::Duplicate { field: "qr_code", .. })
        ));
        assert!(matches!(
            store.create_scooter(Scooter { status_code: Some("lost".into()), ..scooter("QR-2") }),
            Err(StoreError::ForeignKey { .. })
        ));
        assert!(matches!(
            store.create_scooter(Scooter { manufacture_date: None, ..scooter("QR-3") }),
            Err(StoreError::NotNull { field: "manufacture_date", .. })
        ));
    }

    #[test]
    fn ride_requires_existing_references_and_ordered_times() {
        let mut store = MemoryStore::new();
        let u = store.create_user(user("+79991112233")).unwrap().user_id.unwrap();
        let s = store.create_scooter(scooter("QR-1")).unwrap().scooter_id.unwrap();
        let t = store.create_tariff(tariff()).unwrap().tariff_id.unwrap();

        assert!(matches!(
            store.create_ride(ride(Uuid::new_v4(), s, t)),
            Err(StoreError::ForeignKey { target: "user", .. })
        ));
        assert!(matches!(
            store.create_ride(Ride { end_time: Some(ts(10)), ..ride(u, s, t) }),
            Err(StoreError::Check { constraint: "CHK_Ride_Dates", .. })
        ));
        let created = store.create_ride(ride(u, s, t)).unwrap();
        assert_eq!(store.ride(&created.ride_id.unwrap()).unwrap().ride_cost, 150.0);
    }

    #[test]
    fn one_payment_per_ride() {
        let mut store = MemoryStore::new();
        let u = store.create_user(user("+79991112233")).unwrap().user_id.unwrap();
        let s = store.create_scooter(scooter("QR-1")).unwrap().scooter_id.unwrap();
        let t = store.create_tariff(tariff()).unwrap().tariff_id.unwrap();
        let r = store.create_ride(ride(u, s, t)).unwrap().ride_id.unwrap();

        let payment = Payment {
            payment_id: None,
            amount: 150.0,
            payment_date: ts(11),
            payment_method: Some("card".into()),
            status_code: "paid".into(),
            ride_id: Some(r),
            created_datetime: ts(11),
        };
        store.create_payment(payment.clone()).unwrap();
        assert!(matches!(
            store.create_payment(payment.clone()),
            Err(StoreError::Duplicate { field: "ride_id", .. })
        ));
        assert!(matches!(
            store.create_payment(Payment { amount: 0.0, ..payment }),
            Err(StoreError::Check { constraint: "CHK_Payment_Amount", .. })
        ));
        assert_eq!(store.payment_count(), 1);
    }

    #[test]
    fn maintenance_needs_staff_and_scooter() {
        let mut store = MemoryStore::new();
        let s = store.create_scooter(scooter("QR-1")).unwrap().scooter_id.unwrap();
        let m = Maintenance {
            maintenance_id: None,
            maintenance_type: Some("brakes".into()),
            scheduled_date: NaiveDate::from_ymd_opt(2024, 5, 2),
            completed_date: NaiveDate::from_ymd_opt(2024, 5, 1),
            description: None,
            status: "scheduled".into(),
            scooter_id: Some(s),
            staff_id: Some(Uuid::new_v4()),
            created_datetime: ts(0),
        };
        assert!(matches!(
            store.create_maintenance(m.clone()),
            Err(StoreError::Check { constraint: "CHK_Maintenance_Dates", .. })
        ));
        assert!(matches!(
            store.create_maintenance(Maintenance { completed_date: None, staff_id: None, ..m.clone() }),
            Err(StoreError::NotNull { field: "staff_id", .. })
        ));
        store.create_maintenance(Maintenance { completed_date: None, ..m }).unwrap();
        assert_eq!(store.maintenance_count(), 1);
    }
}
