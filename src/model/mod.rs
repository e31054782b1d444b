pub mod booking;
pub mod equipment;
pub mod message;
pub mod notice;
pub mod profile;
