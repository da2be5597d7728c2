//! Wall clock sources.
use chrono::{DateTime, Datelike, Utc};
use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// Source of the current time in Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> f64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> f64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_or(0.0, |elapsed| elapsed.as_secs_f64())
    }
}

/// Manually advanced clock for tests and simulations.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<f64>,
}

impl ManualClock {
    #[must_use]
    pub const fn new(start: f64) -> Self {
        Self {
            now: Mutex::new(start),
        }
    }

    pub fn set(&self, now: f64) {
        if let Ok(mut guard) = self.now.lock() {
            *guard = now;
        }
    }

    pub fn advance(&self, seconds: f64) {
        if let Ok(mut guard) = self.now.lock() {
            *guard += seconds;
        }
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.now.lock().map_or(0.0, |guard| *guard)
    }
}

impl<C: Clock + ?Sized> Clock for std::sync::Arc<C> {
    fn now(&self) -> f64 {
        (**self).now()
    }
}

fn utc(ts: f64) -> DateTime<Utc> {
    let secs = ts.floor();
    let whole = num_traits::cast::<f64, i64>(secs).unwrap_or(0);
    let nanos = num_traits::cast::<f64, u32>(((ts - secs) * 1e9).round()).unwrap_or(0);
    DateTime::from_timestamp(whole, nanos.min(999_999_999)).unwrap_or_default()
}

/// `YYYY-MM-DD` key of the UTC day containing `ts`.
#[must_use]
pub fn utc_day_key(ts: f64) -> String {
    utc(ts).format("%Y-%m-%d").to_string()
}

/// UTC weekday of `ts`, Monday = 0.
#[must_use]
pub fn utc_weekday(ts: f64) -> u32 {
    utc(ts).weekday().num_days_from_monday()
}
