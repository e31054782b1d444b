use std::path::PathBuf;

#[derive(Clone)]
pub struct Config {
    pub bind_addr: String,
    pub data_dir: PathBuf,
    pub admin: Option<AdminConfig>,
    pub mail_from: String,
    pub company: String,
}

/// Superuser created at startup if it does not exist yet.
#[derive(Clone)]
pub struct AdminConfig {
    pub username: String,
    pub password: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let admin = match (
            std::env::var("EQUIPBOOK_ADMIN_ID").ok(),
            std::env::var("EQUIPBOOK_ADMIN_PASSWORD").ok(),
        ) {
            (Some(username), Some(password)) => Some(AdminConfig { username, password }),
            (None, None) => None,
            _ => anyhow::bail!(
                "EQUIPBOOK_ADMIN_ID and EQUIPBOOK_ADMIN_PASSWORD must be set together"
            ),
        };

        Ok(Config {
            bind_addr: {
                let port = std::env::var("EQUIPBOOK_PORT").unwrap_or_else(|_| "8080".to_string());
                std::env::var("EQUIPBOOK_BIND_ADDR")
                    .unwrap_or_else(|_| format!("0.0.0.0:{}", port))
            },
            data_dir: PathBuf::from(
                std::env::var("EQUIPBOOK_DATA_DIR").unwrap_or_else(|_| "./data".to_string()),
            ),
            admin,
            mail_from: std::env::var("EQUIPBOOK_MAIL_FROM")
                .unwrap_or_else(|_| "no-reply@yourdomain.com".to_string()),
            company: std::env::var("EQUIPBOOK_COMPANY")
                .unwrap_or_else(|_| "AtkinsRéalis".to_string()),
        })
    }
}
