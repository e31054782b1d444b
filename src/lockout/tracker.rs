use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::schedule::LockoutSchedule;
use crate::store::{Record, Table};

/// Failed-login bookkeeping for one user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginAttemptRecord {
    pub id: u64,
    pub user_id: u64,
    pub failed_attempts: u32,
    pub lockout_until: Option<DateTime<Utc>>,
}

impl LoginAttemptRecord {
    fn empty(user_id: u64) -> Self {
        LoginAttemptRecord {
            id: 0,
            user_id,
            failed_attempts: 0,
            lockout_until: None,
        }
    }
}

impl Record for LoginAttemptRecord {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockState {
    NotLocked,
    LockedUntil(DateTime<Utc>),
}

impl LockState {
    pub fn is_locked(&self) -> bool {
        matches!(self, LockState::LockedUntil(_))
    }

    /// Whole minutes left on the lock, rounded down but never below 1.
    pub fn remaining_minutes(&self, now: DateTime<Utc>) -> Option<i64> {
        match self {
            LockState::NotLocked => None,
            LockState::LockedUntil(until) => Some((*until - now).num_minutes().max(1)),
        }
    }
}

/// Per-user failed-login counters and lockout deadlines.
///
/// An expired `lockout_until` is never cleared here; it stays in the record
/// until the next failure overwrites it or a success resets it.
pub struct LoginAttemptTracker {
    records: Table<LoginAttemptRecord>,
    schedule: LockoutSchedule,
}

impl LoginAttemptTracker {
    pub fn load_or_create(path: &Path, schedule: LockoutSchedule) -> anyhow::Result<Self> {
        Ok(LoginAttemptTracker {
            records: Table::load_or_create(path)?,
            schedule,
        })
    }

    pub fn check_lockout(&self, user_id: u64, now: DateTime<Utc>) -> LockState {
        match self.get(user_id).and_then(|r| r.lockout_until) {
            Some(until) if until > now => LockState::LockedUntil(until),
            _ => LockState::NotLocked,
        }
    }

    pub fn record_success(&mut self, user_id: u64) -> anyhow::Result<()> {
        if let Some(record) = self.get(user_id) {
            if record.failed_attempts == 0 && record.lockout_until.is_none() {
                return Ok(());
            }
        }

        self.records.upsert(
            |r| r.user_id == user_id,
            || LoginAttemptRecord::empty(user_id),
            |r| {
                r.failed_attempts = 0;
                r.lockout_until = None;
            },
        )?;
        Ok(())
    }

    pub fn record_failure(
        &mut self,
        user_id: u64,
        now: DateTime<Utc>,
    ) -> anyhow::Result<LoginAttemptRecord> {
        let schedule = &self.schedule;
        let record = self.records.upsert(
            |r| r.user_id == user_id,
            || LoginAttemptRecord::empty(user_id),
            |r| {
                r.failed_attempts = r.failed_attempts.saturating_add(1);
                if let Some(lockout) = schedule.lockout_for(r.failed_attempts) {
                    r.lockout_until = Some(now + lockout);
                }
            },
        )?;

        if let Some(until) = record.lockout_until.filter(|until| *until > now) {
            tracing::warn!(
                user_id,
                failed_attempts = record.failed_attempts,
                lockout_until = %until,
                "Account locked after failed login"
            );
        }

        Ok(record)
    }

    pub fn get(&self, user_id: u64) -> Option<&LoginAttemptRecord> {
        self.records.find(|r| r.user_id == user_id)
    }

    pub fn list(&self) -> Vec<LoginAttemptRecord> {
        self.records.iter().cloned().collect()
    }
}
