//! Processing-time source.
//!
//! Validators compare dates against "now" and transformers default some timestamps to it; both
//! read it through a [`Clock`] so tests can pin it.

use chrono::{Local, NaiveDateTime};

pub trait Clock: Send + Sync {
    /// Current local wall-clock time, without zone.
    fn now(&self) -> NaiveDateTime;
}

/// Reads the system clock.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// Always returns the same instant.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}
