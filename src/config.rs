use anyhow::{Context, Result};

pub const DEFAULT_DATABASE_URL: &str = "sqlite://meter_tracker.db?mode=rwc";

#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite connection string for the key-value store.
    pub database_url: String,
    pub server_host: String,
    pub server_port: u16,
    /// How often due reminders are checked, in seconds.
    pub reminder_interval_secs: u64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the config from an arbitrary variable source.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_owned());

        let reminder_interval_secs: u64 = get("REMINDER_INTERVAL_SECS", "60")
            .parse()
            .context("REMINDER_INTERVAL_SECS must be a positive integer")?;
        if reminder_interval_secs == 0 {
            anyhow::bail!("REMINDER_INTERVAL_SECS must be a positive integer");
        }

        Ok(Self {
            database_url: get("DATABASE_URL", DEFAULT_DATABASE_URL),
            server_host: get("SERVER_HOST", "0.0.0.0"),
            server_port: get("SERVER_PORT", "8080")
                .parse()
                .context("SERVER_PORT must be a valid port number")?,
            reminder_interval_secs,
        })
    }
}
