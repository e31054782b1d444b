use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::password::{hash_password, verify_password};
use crate::error::AppError;
use crate::store::{Record, Table};

const MAX_USERNAME_LEN: usize = 150;
const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub password_hash: String,
    pub email: Option<String>,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    pub fn info(&self) -> UserInfo {
        UserInfo {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            is_superuser: self.is_superuser,
        }
    }

    pub fn require_superuser(&self, message: &str) -> Result<(), AppError> {
        if self.is_superuser {
            Ok(())
        } else {
            Err(AppError::Forbidden(message.to_string()))
        }
    }
}

impl Record for User {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// User as exposed over the API (no password hash).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: u64,
    pub username: String,
    pub email: Option<String>,
    pub is_superuser: bool,
}

pub struct UserStore {
    users: Table<User>,
}

impl UserStore {
    pub fn load_or_create(path: &Path) -> anyhow::Result<Self> {
        Ok(UserStore {
            users: Table::load_or_create(path)?,
        })
    }

    pub fn lookup(&self, username: &str) -> Option<User> {
        self.users.find(|u| u.username == username).cloned()
    }

    pub fn get(&self, id: u64) -> Option<&User> {
        self.users.get(id)
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    /// Superuser with the lowest id, used as the recipient of contact messages.
    pub fn first_superuser(&self) -> Option<&User> {
        self.users
            .iter()
            .filter(|u| u.is_superuser)
            .min_by_key(|u| u.id)
    }

    pub fn create_user(
        &mut self,
        username: &str,
        password_hash: String,
        is_superuser: bool,
    ) -> Result<User, AppError> {
        validate_username(username)?;
        if self.lookup(username).is_some() {
            return Err(AppError::BadRequest(
                "A user with that username already exists.".to_string(),
            ));
        }

        let user = self.users.insert(User {
            id: 0,
            username: username.to_string(),
            password_hash,
            email: None,
            is_superuser,
            date_joined: Utc::now(),
        })?;
        tracing::info!(user_id = user.id, username = %user.username, is_superuser, "User created");
        Ok(user)
    }

    /// Creates the bootstrap superuser unless the username is already taken.
    pub fn ensure_superuser(&mut self, username: &str, password: &str) -> anyhow::Result<()> {
        if self.lookup(username).is_some() {
            return Ok(());
        }
        let password_hash = hash_password(password)?;
        self.create_user(username, password_hash, true)
            .map_err(|e| anyhow::anyhow!("Failed to create admin user: {:?}", e))?;
        Ok(())
    }

    pub fn set_email(&mut self, user_id: u64, email: Option<String>) -> anyhow::Result<Option<User>> {
        self.users.update(user_id, |u| u.email = email)
    }
}

pub fn verify_credentials(user: &User, password: &str) -> anyhow::Result<bool> {
    verify_password(password, &user.password_hash)
}

pub fn validate_username(username: &str) -> Result<(), AppError> {
    if username.is_empty() || username.chars().count() > MAX_USERNAME_LEN {
        return Err(AppError::BadRequest(format!(
            "Username must be between 1 and {} characters.",
            MAX_USERNAME_LEN
        )));
    }
    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !username.chars().all(allowed) {
        return Err(AppError::BadRequest(
            "Username may contain only letters, numbers, and @/./+/-/_ characters.".to_string(),
        ));
    }
    Ok(())
}

pub fn validate_new_password(username: &str, password1: &str, password2: &str) -> Result<(), AppError> {
    if password1 != password2 {
        return Err(AppError::BadRequest(
            "The two password fields didn't match.".to_string(),
        ));
    }
    if password1.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::BadRequest(format!(
            "This password is too short. It must contain at least {} characters.",
            MIN_PASSWORD_LEN
        )));
    }
    if password1.chars().all(|c| c.is_ascii_digit()) {
        return Err(AppError::BadRequest(
            "This password is entirely numeric.".to_string(),
        ));
    }
    if password1.eq_ignore_ascii_case(username) {
        return Err(AppError::BadRequest(
            "The password is too similar to the username.".to_string(),
        ));
    }
    Ok(())
}
