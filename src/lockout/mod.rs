pub mod schedule;
pub mod tracker;

pub use schedule::LockoutSchedule;
pub use tracker::{LockState, LoginAttemptRecord, LoginAttemptTracker};
