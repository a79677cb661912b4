use std::{env, fmt::Display, path::PathBuf, str::FromStr};

use thiserror::Error;
use tracing::{info, warn};

/// The single configured administrator. Not stored in the users table.
#[derive(Debug, Clone)]
pub struct AdminAccount {
    pub id: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Storage {
    File(PathBuf),
    Memory,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub storage: Storage,
    pub admin: AdminAccount,
    /// Load the demo user and default menu on startup.
    pub seed_demo: bool,
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: String,
        value: String,
        reason: String,
    },
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let admin_password = lookup("CANTEEN_ADMIN_PASSWORD").unwrap_or_else(|| {
            warn!("CANTEEN_ADMIN_PASSWORD not set, using the built-in admin password");
            "admin123".to_string()
        });

        Ok(Self {
            port: try_load(&lookup, "CANTEEN_PORT", "5000")?,
            storage: Storage::File(try_load(&lookup, "CANTEEN_DATABASE", "canteen.db")?),
            admin: AdminAccount {
                id: try_load(&lookup, "CANTEEN_ADMIN_ID", "admin")?,
                password: admin_password,
            },
            seed_demo: try_load(&lookup, "CANTEEN_SEED_DEMO", "false")?,
        })
    }
}

fn try_load<T: FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: &str,
) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = lookup(key).unwrap_or_else(|| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    match value.parse::<T>() {
        Ok(parsed) => Ok(parsed),
        Err(e) => {
            warn!("Invalid {key} value: {e}");
            Err(ConfigError::Invalid {
                key: key.to_string(),
                reason: e.to_string(),
                value,
            })
        }
    }
}
