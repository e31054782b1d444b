pub mod accounts;
pub mod bookings;
pub mod equipment;
pub mod login;
pub mod messages;
pub mod notices;
