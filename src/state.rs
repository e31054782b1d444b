use tokio::sync::{Mutex, RwLock};

use crate::auth::session::SessionStore;
use crate::auth::users::UserStore;
use crate::config::Config;
use crate::lockout::{LockoutSchedule, LoginAttemptTracker};
use crate::mail::Mailer;
use crate::model::booking::Booking;
use crate::model::equipment::Equipment;
use crate::model::message::Message;
use crate::model::notice::Notice;
use crate::model::profile::Profile;
use crate::store::Table;

pub struct AppState {
    pub users: RwLock<UserStore>,
    pub login_tracker: Mutex<LoginAttemptTracker>,
    pub sessions: Mutex<SessionStore>,
    pub equipment: RwLock<Table<Equipment>>,
    pub bookings: RwLock<Table<Booking>>,
    pub profiles: RwLock<Table<Profile>>,
    pub messages: RwLock<Table<Message>>,
    pub notices: RwLock<Table<Notice>>,
    pub mailer: Mailer,
    pub company: String,
}

impl AppState {
    /// Loads every table from the data directory, creating missing ones, and
    /// bootstraps the configured superuser.
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let dir = &config.data_dir;

        let mut users = UserStore::load_or_create(&dir.join("users.json"))?;
        if let Some(admin) = &config.admin {
            users.ensure_superuser(&admin.username, &admin.password)?;
        }

        Ok(AppState {
            users: RwLock::new(users),
            login_tracker: Mutex::new(LoginAttemptTracker::load_or_create(
                &dir.join("login_attempts.json"),
                LockoutSchedule::default(),
            )?),
            sessions: Mutex::new(SessionStore::new()),
            equipment: RwLock::new(Table::load_or_create(&dir.join("equipment.json"))?),
            bookings: RwLock::new(Table::load_or_create(&dir.join("bookings.json"))?),
            profiles: RwLock::new(Table::load_or_create(&dir.join("profiles.json"))?),
            messages: RwLock::new(Table::load_or_create(&dir.join("messages.json"))?),
            notices: RwLock::new(Table::load_or_create(&dir.join("notices.json"))?),
            mailer: Mailer::new(config.mail_from.clone()),
            company: config.company.clone(),
        })
    }
}
