// src/state.rs
use std::sync::Arc;

use reqwest::Client;

use crate::config::AppConfig;
use crate::services::chat::ChatClient;
use crate::services::fundamentals::AlphaVantageClient;
use crate::services::news::NewsClient;
use crate::services::portfolio::Portfolio;
use crate::services::yahoo::{PriceSource, YahooClient};

/// Everything a request handler needs. The portfolio and chat history live
/// as long as the process.
pub struct AppState {
    pub config: AppConfig,
    pub prices: Arc<dyn PriceSource>,
    pub fundamentals: AlphaVantageClient,
    pub news: NewsClient,
    pub portfolio: Portfolio,
    pub chat: ChatClient,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let client = Client::new();
        let prices = Arc::new(YahooClient::new(client.clone()));
        Self::with_price_source(config, client, prices)
    }

    pub fn with_price_source(config: AppConfig, client: Client, prices: Arc<dyn PriceSource>) -> Self {
        AppState {
            fundamentals: AlphaVantageClient::new(client.clone(), config.alpha_vantage_api_key.clone()),
            news: NewsClient::new(client.clone()),
            chat: ChatClient::new(client, config.google_api_key.clone(), config.gemini_model.clone()),
            portfolio: Portfolio::new(),
            prices,
            config,
        }
    }
}
