// src/bin/export_prices.rs
use std::env;
use std::path::PathBuf;

use chrono::{NaiveDate, Utc};
use dotenv::dotenv;
use log::info;
use reqwest::Client;

use stock_vision::config::AppConfig;
use stock_vision::models::PriceSeries;
use stock_vision::services::calculations::compute_smoothed;
use stock_vision::services::export::export_to_dir;
use stock_vision::services::yahoo::{normalize_ticker, PriceSource, YahooClient};

/// Usage: export_prices TICKER [OUT_DIR]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env()?;

    let mut args = env::args().skip(1);
    let ticker = normalize_ticker(&args.next().unwrap_or_else(|| "AAPL".to_string()))?;
    let out_dir = args.next().map(PathBuf::from).unwrap_or_else(|| PathBuf::from("."));

    let start = NaiveDate::from_ymd_opt(2022, 1, 1).ok_or_else(|| anyhow::anyhow!("invalid start date"))?;
    let end = Utc::now().date_naive();

    let bars = YahooClient::new(Client::new()).price_history(&ticker, start, end).await?;
    let series = PriceSeries::from_bars(&bars)?;
    let smoothed = compute_smoothed(&series, config.sma_window, config.ema_span)?;

    let path = export_to_dir(&out_dir, &ticker, &bars, &smoothed)?;
    info!("Exported {} rows for {}", bars.len(), ticker);
    println!("{}", path.display());
    Ok(())
}
