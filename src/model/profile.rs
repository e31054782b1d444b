use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::store::Record;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Profile {
    pub id: u64,
    pub user_id: u64,
    pub phone_number: Option<String>,
    pub work_address: Option<String>,
    pub company: Option<String>,
    pub work_division: Option<String>,
    pub job_role: Option<String>,
}

impl Profile {
    pub fn for_user(user_id: u64) -> Self {
        Profile {
            user_id,
            ..Default::default()
        }
    }
}

impl Record for Profile {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }
}

/// Trims an optional form field, mapping blank input to `None` and rejecting
/// values longer than `max_len` characters.
pub fn clean_optional(field: &str, value: Option<String>, max_len: usize) -> Result<Option<String>, AppError> {
    let Some(value) = value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()) else {
        return Ok(None);
    };
    if value.chars().count() > max_len {
        return Err(AppError::BadRequest(format!(
            "Ensure {} has at most {} characters.",
            field, max_len
        )));
    }
    Ok(Some(value))
}

pub fn validate_email(email: &str) -> Result<(), AppError> {
    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !email.chars().any(char::is_whitespace)
        }
        None => false,
    };
    if valid {
        Ok(())
    } else {
        Err(AppError::BadRequest("Enter a valid email address.".to_string()))
    }
}
