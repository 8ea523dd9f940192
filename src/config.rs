//! Runtime configuration from environment variables.

use std::env;
use std::fmt::Display;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("invalid value for {key}: {message}")]
pub struct ConfigError {
    pub key: &'static str,
    pub message: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub db_path: PathBuf,
    pub media_root: PathBuf,
    pub media_url: String,
    /// Origin used for recipe short links; the request Host when unset.
    pub frontend_url: Option<String>,
}

fn app_data_dir() -> PathBuf {
    let base = dirs::data_dir().unwrap_or_else(|| PathBuf::from("."));
    base.join("foodgram")
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        let data_dir = app_data_dir();
        Ok(Self {
            addr: try_load("FOODGRAM_ADDR", "0.0.0.0:8000")?,
            db_path: var("FOODGRAM_DB_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("foodgram.db")),
            media_root: var("FOODGRAM_MEDIA_ROOT")
                .map(PathBuf::from)
                .unwrap_or_else(|| data_dir.join("media")),
            media_url: var("FOODGRAM_MEDIA_URL").unwrap_or_else(|| "/media/".to_string()),
            frontend_url: var("FOODGRAM_FRONTEND_URL").filter(|s| !s.trim().is_empty()),
        })
    }
}

fn var(key: &str) -> Option<String> {
    match env::var(key) {
        Ok(value) => Some(value),
        Err(_) => {
            log::info!("{} not set, using default", key);
            None
        }
    }
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    var(key)
        .unwrap_or_else(|| default.to_string())
        .parse()
        .map_err(|e: T::Err| ConfigError {
            key,
            message: e.to_string(),
        })
}
