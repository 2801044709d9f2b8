use std::{env, fmt::Display, str::FromStr, time::Duration};

use crate::llm::openai::{DEFAULT_BASE_URL, DEFAULT_MODEL};

/// Runtime settings, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: String,
    pub database_url: String,
    pub data_dir: String,
    /// Generation is refused with a 500 while this is unset.
    pub openai_api_key: Option<String>,
    pub openai_base_url: String,
    pub openai_model: String,
    pub openai_timeout: Duration,
}

impl Config {
    pub fn load() -> Self {
        if dotenvy::dotenv().is_ok() {
            log::info!("Loaded environment from .env");
        }
        Self {
            bind_addr: try_load("BIND_ADDR", "127.0.0.1:8080"),
            database_url: try_load("DATABASE_URL", "postgres://localhost/deckstudy"),
            data_dir: try_load("DATA_DIR", "data"),
            openai_api_key: env::var("OPENAI_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            openai_base_url: try_load("OPENAI_BASE_URL", DEFAULT_BASE_URL),
            openai_model: try_load("OPENAI_MODEL", DEFAULT_MODEL),
            openai_timeout: Duration::from_secs(try_load("OPENAI_TIMEOUT_SECS", "120")),
        }
    }
}

fn try_load<T: FromStr>(key: &str, default: &str) -> T
where
    T::Err: Display,
{
    let raw = env::var(key).unwrap_or_else(|_| {
        log::info!("{key} not set, using default: {default}");
        default.to_string()
    });
    match raw.parse() {
        Ok(value) => value,
        Err(e) => {
            log::warn!("Invalid {key} value ({e}), using default: {default}");
            default
                .parse()
                .unwrap_or_else(|_| panic!("default for {key} must parse"))
        }
    }
}
