use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result, bail};

/// Process settings, read from the environment after `.env` is loaded.
#[derive(Debug, Clone)]
pub struct Config {
    pub token: String,
    pub base_url: String,
    pub bot_name: String,
    pub db_path: PathBuf,
    pub host: String,
    pub port: u16,
    pub locales_dir: Option<PathBuf>,
    pub health_check_url: Option<String>,
    pub catalog_timeout: Duration,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(var: impl Fn(&str) -> Option<String>) -> Result<Self> {
        // Unset and empty are the same thing.
        let get = |key: &str| var(key).filter(|v| !v.trim().is_empty());

        let Some(token) = get("TOKEN") else {
            bail!("TOKEN is not set: the bot cannot start without a Telegram token");
        };

        let port = match get("GAMENIGHT_PORT") {
            Some(port) => port.parse().context("GAMENIGHT_PORT must be a port number")?,
            None => 8080,
        };
        let catalog_timeout = match get("CATALOG_TIMEOUT_SECS") {
            Some(secs) => secs.parse().context("CATALOG_TIMEOUT_SECS must be a number of seconds")?,
            None => 10,
        };

        Ok(Self {
            token,
            base_url: get("BASE_URL").unwrap_or_default(),
            bot_name: get("BOT_NAME").unwrap_or_default(),
            db_path: get("GAMENIGHT_DB_PATH")
                .unwrap_or_else(|| "bot_data.sqlite".into())
                .into(),
            host: get("GAMENIGHT_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port,
            locales_dir: get("GAMENIGHT_LOCALES_DIR").map(PathBuf::from),
            health_check_url: get("HEALTH_CHECK_URL"),
            catalog_timeout: Duration::from_secs(catalog_timeout),
        })
    }
}
