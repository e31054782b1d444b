use chrono::TimeDelta;

/// Lockout length in seconds, keyed by the cumulative failure count that
/// triggers it. Counts past the last threshold reuse the last entry.
const DEFAULT_STEPS: [(u32, i64); 4] = [
    (3, 5 * 60),
    (4, 30 * 60),
    (5, 60 * 60),
    (6, 24 * 60 * 60),
];

/// Escalation schedule mapping a failed-attempt count to a lockout duration.
#[derive(Debug, Clone)]
pub struct LockoutSchedule {
    // Sorted by threshold, ascending.
    steps: Vec<(u32, TimeDelta)>,
}

impl LockoutSchedule {
    pub fn new(mut steps: Vec<(u32, TimeDelta)>) -> Self {
        steps.sort_by_key(|(threshold, _)| *threshold);
        LockoutSchedule { steps }
    }

    /// Lockout to apply after the `failed_attempts`-th consecutive failure, or
    /// `None` while the count is still below the first threshold.
    pub fn lockout_for(&self, failed_attempts: u32) -> Option<TimeDelta> {
        self.steps
            .iter()
            .rev()
            .find(|(threshold, _)| failed_attempts >= *threshold)
            .map(|(_, duration)| *duration)
    }
}

impl Default for LockoutSchedule {
    fn default() -> Self {
        LockoutSchedule::new(
            DEFAULT_STEPS
                .iter()
                .map(|&(threshold, secs)| (threshold, TimeDelta::seconds(secs)))
                .collect(),
        )
    }
}
