// src/config.rs
use std::env;
use std::str::FromStr;

use anyhow::{Context, Result};
use log::warn;

use crate::services::calculations::{DEFAULT_EMA_SPAN, DEFAULT_SMA_WINDOW};

pub const DEFAULT_PORT: u16 = 3030;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub port: u16,
    pub alpha_vantage_api_key: Option<String>,
    pub google_api_key: Option<String>,
    pub gemini_model: String,
    pub sma_window: usize,
    pub ema_span: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            port: DEFAULT_PORT,
            alpha_vantage_api_key: None,
            google_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            sma_window: DEFAULT_SMA_WINDOW,
            ema_span: DEFAULT_EMA_SPAN,
        }
    }
}

fn optional_var(name: &str) -> Option<String> {
    env::var(name).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parsed_var<T>(name: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match optional_var(name) {
        Some(raw) => raw.parse::<T>().with_context(|| format!("{} must be a number, got {:?}", name, raw)),
        None => Ok(default),
    }
}

impl AppConfig {
    /// Reads the environment. Call `dotenv().ok()` first to pick up `.env`.
    pub fn from_env() -> Result<Self> {
        let port = match optional_var("PORT") {
            Some(_) => parsed_var("PORT", DEFAULT_PORT)?,
            None => {
                warn!("$PORT not set, defaulting to {}", DEFAULT_PORT);
                DEFAULT_PORT
            }
        };

        let alpha_vantage_api_key = optional_var("ALPHA_VANTAGE_API_KEY");
        if alpha_vantage_api_key.is_none() {
            warn!("ALPHA_VANTAGE_API_KEY not set, fundamentals will be unavailable");
        }
        let google_api_key = optional_var("GOOGLE_API_KEY");
        if google_api_key.is_none() {
            warn!("GOOGLE_API_KEY not set, chat will be unavailable");
        }

        let sma_window = parsed_var("SMA_WINDOW", DEFAULT_SMA_WINDOW)?;
        let ema_span = parsed_var("EMA_SPAN", DEFAULT_EMA_SPAN)?;
        anyhow::ensure!(sma_window >= 1, "SMA_WINDOW must be at least 1");
        anyhow::ensure!(ema_span >= 1, "EMA_SPAN must be at least 1");

        Ok(AppConfig {
            port,
            alpha_vantage_api_key,
            google_api_key,
            gemini_model: optional_var("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            sma_window,
            ema_span,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_dashboard_conventions() {
        let config = AppConfig::default();
        assert_eq!(config.port, 3030);
        assert_eq!(config.sma_window, 20);
        assert_eq!(config.ema_span, 20);
        assert_eq!(config.gemini_model, "gemini-pro");
    }

    #[test]
    fn parsed_var_reports_bad_numbers() {
        env::set_var("STOCK_VISION_TEST_WINDOW", "twenty");
        let err = parsed_var::<usize>("STOCK_VISION_TEST_WINDOW", 20).unwrap_err();
        assert!(err.to_string().contains("STOCK_VISION_TEST_WINDOW"));
        env::remove_var("STOCK_VISION_TEST_WINDOW");

        assert_eq!(parsed_var::<usize>("STOCK_VISION_TEST_UNSET", 7).unwrap(), 7);
    }
}
