// src/bin/analyze_ticker.rs
use std::env;

use anyhow::Context;
use chrono::{NaiveDate, Utc};
use dotenv::dotenv;
use log::{error, info};
use reqwest::Client;

use stock_vision::config::AppConfig;
use stock_vision::models::PriceSeries;
use stock_vision::services::calculations::analyze;
use stock_vision::services::yahoo::{PriceSource, YahooClient};

fn date_arg(arg: Option<String>, default: NaiveDate) -> anyhow::Result<NaiveDate> {
    match arg {
        Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").with_context(|| format!("bad date {:?}", raw)),
        None => Ok(default),
    }
}

/// Usage: analyze_ticker [TICKER] [START] [END]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    let config = AppConfig::from_env()?;

    let mut args = env::args().skip(1);
    let ticker = args.next().unwrap_or_else(|| "AAPL".to_string());
    let start = date_arg(args.next(), NaiveDate::from_ymd_opt(2022, 1, 1).context("invalid default date")?)?;
    let end = date_arg(args.next(), Utc::now().date_naive())?;

    info!("Analyzing {} from {} to {}", ticker, start, end);
    let bars = YahooClient::new(Client::new()).price_history(&ticker, start, end).await?;
    let series = PriceSeries::from_bars(&bars)?;

    match analyze(&series, config.sma_window, config.ema_span) {
        Ok(analysis) => {
            let last = series.len() - 1;
            println!("{} ({} bars)", ticker, series.len());
            println!("Last close:       {:.2}", series.points()[last].price);
            match analysis.smoothed.sma[last] {
                Some(sma) => println!("SMA({}):          {:.2}", config.sma_window, sma),
                None => println!("SMA({}):          n/a", config.sma_window),
            }
            println!("EMA({}):          {:.2}", config.ema_span, analysis.smoothed.ema[last]);
            println!("Annual Return is {} %", analysis.summary.annualized_return);
            println!("Standard Deviation is {} %", analysis.summary.annualized_std_dev);
            println!("Risk Adj. Return is {}", analysis.summary.risk_adjusted_return);
        }
        Err(e) => {
            error!("Could not analyze {}: {}", ticker, e);
            return Err(e.into());
        }
    }

    Ok(())
}
