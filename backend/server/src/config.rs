use std::{env, fmt::Display, fs::read_to_string, str::FromStr};

use chrono::FixedOffset;
use tracing::{info, warn};

use crate::error::AppError;

const SECRETS_DIR: &str = "/run/secrets";

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub redis_url: String,
    pub db_name: String,
    pub jwt_secret: String,
    pub token_ttl_minutes: i64,
    pub utc_offset_hours: i32,
    pub clinic_name: String,
    pub clinic_city: String,
    pub admin_email: String,
    pub admin_password: String,
    pub bcrypt_cost: u32,
}

impl Config {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key lookup, environment or otherwise.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let config = Self {
            port: try_load(&lookup, "RUST_PORT", "8001")?,
            redis_url: try_load(&lookup, "REDIS_URL", "redis://127.0.0.1:6379")?,
            db_name: try_load(&lookup, "CLINIC_DB_NAME", "dental_clinic")?,
            jwt_secret: read_secret(&lookup, "CLINIC_JWT_SECRET", "dental-clinic-secret-key-2024"),
            token_ttl_minutes: try_load(&lookup, "CLINIC_TOKEN_TTL_MINUTES", "10080")?,
            utc_offset_hours: try_load(&lookup, "CLINIC_UTC_OFFSET_HOURS", "-3")?,
            clinic_name: try_load(&lookup, "CLINIC_NAME", "Odonto Sinditur")?,
            clinic_city: try_load(&lookup, "CLINIC_CITY", "Manaus - AM")?,
            admin_email: try_load(&lookup, "CLINIC_ADMIN_EMAIL", "admin@odonto.com")?,
            admin_password: read_secret(&lookup, "CLINIC_ADMIN_PASSWORD", "admin123"),
            bcrypt_cost: try_load(&lookup, "CLINIC_BCRYPT_COST", "12")?,
        };

        config.offset()?;

        if !(4..=31).contains(&config.bcrypt_cost) {
            return Err(AppError::Config(format!(
                "CLINIC_BCRYPT_COST must be between 4 and 31, got {}",
                config.bcrypt_cost
            )));
        }

        Ok(config)
    }

    /// Clinic local time zone.
    pub fn offset(&self) -> Result<FixedOffset, AppError> {
        FixedOffset::east_opt(self.utc_offset_hours * 3600).ok_or_else(|| {
            AppError::Config(format!(
                "CLINIC_UTC_OFFSET_HOURS out of range: {}",
                self.utc_offset_hours
            ))
        })
    }
}

fn try_load<F, T>(lookup: &F, key: &str, default: &str) -> Result<T, AppError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key)
        .unwrap_or_else(|| {
            info!("{key} not set, using default: {default}");
            default.to_string()
        })
        .parse()
        .map_err(|e| {
            warn!("Invalid {key} value: {e}");
            AppError::Config(format!("{key}: {e}"))
        })
}

/// Docker secret file first, then the plain variable, then the default.
fn read_secret<F>(lookup: &F, secret_name: &str, default: &str) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let path = format!("{SECRETS_DIR}/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .ok()
        .or_else(|| lookup(secret_name))
        .unwrap_or_else(|| {
            warn!("Secret {secret_name} not provided, using the built-in default");
            default.to_string()
        })
}
