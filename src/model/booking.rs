use chrono::{DateTime, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

use crate::store::Record;

pub const MAX_PROJECT_NUMBER_LEN: usize = 6;
pub const MAX_USE_LOCATION_LEN: usize = 100;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Booking {
    pub id: u64,
    pub equipment_id: u64,
    pub user_id: u64,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub reason: String,
    pub project_number: String,
    pub use_location: String,
}

impl Booking {
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_time >= now
    }

    pub fn is_previous(&self, now: DateTime<Utc>) -> bool {
        self.end_time < now
    }
}

impl Record for Booking {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Today at 07:30 UTC.
pub fn default_start_time(now: DateTime<Utc>) -> DateTime<Utc> {
    at_time_of_day(now, 7, 30)
}

/// Today at 17:00 UTC.
pub fn default_end_time(now: DateTime<Utc>) -> DateTime<Utc> {
    at_time_of_day(now, 17, 0)
}

fn at_time_of_day(now: DateTime<Utc>, hour: u32, minute: u32) -> DateTime<Utc> {
    let time = NaiveTime::from_hms_opt(hour, minute, 0).unwrap_or_default();
    now.date_naive().and_time(time).and_utc()
}
