// src/services/yahoo.rs
use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;
use log::{debug, info, warn};
use once_cell::sync::Lazy;
use percent_encoding::percent_decode_str;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;

use super::error::{FetchError, Result};
use crate::models::PriceBar;

const CHART_URL: &str = "https://query1.finance.yahoo.com/v8/finance/chart";
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

/// Anything that can produce a daily price table for a ticker.
#[async_trait]
pub trait PriceSource: Send + Sync {
    /// Bars for `[start, end)`. An empty result is reported as `FetchError::NoData`.
    async fn price_history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>>;
}

static TICKER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[A-Z0-9.^=\-]{1,15}$").unwrap());

/// Percent-decodes, upper-cases and checks a user supplied ticker symbol.
/// Path segments arrive still encoded, so `%5EGSPC` becomes `^GSPC`.
pub fn normalize_ticker(raw: &str) -> Result<String> {
    let decoded = percent_decode_str(raw)
        .decode_utf8()
        .map_err(|_| FetchError::InvalidInput(format!("invalid ticker {:?}", raw)))?;
    let ticker = decoded.trim().to_uppercase();
    if !TICKER_RE.is_match(&ticker) {
        return Err(FetchError::InvalidInput(format!("invalid ticker {:?}", raw)));
    }
    Ok(ticker)
}

/// Keeps the bars dated in `[start, end)`. Bar dates are exchange-local,
/// which can differ by a day from the UTC bounds sent to the provider.
pub fn within_range(bars: Vec<PriceBar>, start: NaiveDate, end: NaiveDate) -> Vec<PriceBar> {
    bars.into_iter()
        .filter(|bar| bar.date >= start && bar.date < end)
        .collect()
}

#[derive(Debug, Deserialize)]
struct ChartEnvelope {
    chart: Chart,
}

#[derive(Debug, Deserialize)]
struct Chart {
    result: Option<Vec<ChartResult>>,
    error: Option<ChartError>,
}

#[derive(Debug, Deserialize)]
struct ChartError {
    code: String,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ChartMeta {
    exchange_timezone_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChartResult {
    meta: Option<ChartMeta>,
    #[serde(default)]
    timestamp: Vec<i64>,
    indicators: Indicators,
}

#[derive(Debug, Deserialize)]
struct Indicators {
    #[serde(default)]
    quote: Vec<QuoteColumns>,
    #[serde(default)]
    adjclose: Vec<AdjCloseColumn>,
}

#[derive(Debug, Default, Deserialize)]
struct QuoteColumns {
    #[serde(default)]
    open: Vec<Option<f64>>,
    #[serde(default)]
    high: Vec<Option<f64>>,
    #[serde(default)]
    low: Vec<Option<f64>>,
    #[serde(default)]
    close: Vec<Option<f64>>,
    #[serde(default)]
    volume: Vec<Option<u64>>,
}

#[derive(Debug, Deserialize)]
struct AdjCloseColumn {
    #[serde(default)]
    adjclose: Vec<Option<f64>>,
}

fn column<T: Copy>(values: &[Option<T>], i: usize) -> Option<T> {
    values.get(i).copied().flatten()
}

/// Turns a chart API body into bars. Rows without an adjusted close are
/// skipped, as are rows that fall on an already seen trading date.
pub fn parse_chart_response(ticker: &str, body: &str) -> Result<Vec<PriceBar>> {
    let envelope: ChartEnvelope = serde_json::from_str(body)?;

    if let Some(err) = envelope.chart.error {
        let description = err.description.unwrap_or_default();
        if err.code.eq_ignore_ascii_case("Not Found") {
            return Err(FetchError::NoData(ticker.to_string()));
        }
        return Err(FetchError::Api(format!("{}: {}", err.code, description)));
    }

    let result = envelope.chart.result
        .and_then(|results| results.into_iter().next())
        .ok_or_else(|| FetchError::NoData(ticker.to_string()))?;

    let tz: Tz = result.meta
        .and_then(|m| m.exchange_timezone_name)
        .and_then(|name| name.parse().ok())
        .unwrap_or(chrono_tz::US::Eastern);

    let quote = result.indicators.quote.into_iter().next().unwrap_or_default();
    // Fall back to the raw close when the adjusted column is absent.
    let adjclose = match result.indicators.adjclose.into_iter().next() {
        Some(col) => col.adjclose,
        None => quote.close.clone(),
    };

    let mut bars: Vec<PriceBar> = Vec::with_capacity(result.timestamp.len());
    for (i, ts) in result.timestamp.iter().enumerate() {
        let Some(adj_close) = column(&adjclose, i) else {
            debug!("Skipping {} bar {} without adjusted close", ticker, ts);
            continue;
        };
        let Some(utc) = DateTime::<Utc>::from_timestamp(*ts, 0) else {
            warn!("Skipping {} bar with out of range timestamp {}", ticker, ts);
            continue;
        };
        let date = tz.from_utc_datetime(&utc.naive_utc()).date_naive();
        if bars.last().map_or(false, |prev| prev.date >= date) {
            debug!("Skipping {} bar for {}, date already covered", ticker, date);
            continue;
        }
        bars.push(PriceBar {
            date,
            open: column(&quote.open, i),
            high: column(&quote.high, i),
            low: column(&quote.low, i),
            close: column(&quote.close, i),
            adj_close,
            volume: column(&quote.volume, i),
        });
    }

    if bars.is_empty() {
        return Err(FetchError::NoData(ticker.to_string()));
    }
    Ok(bars)
}

#[derive(Clone)]
pub struct YahooClient {
    client: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(client: Client) -> Self {
        YahooClient {
            client,
            base_url: CHART_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

#[async_trait]
impl PriceSource for YahooClient {
    async fn price_history(&self, ticker: &str, start: NaiveDate, end: NaiveDate) -> Result<Vec<PriceBar>> {
        let ticker = normalize_ticker(ticker)?;
        if start >= end {
            return Err(FetchError::InvalidInput(format!("start {} must be before end {}", start, end)));
        }

        // Padded by a day each side so exchanges ahead of or behind UTC are
        // fully covered; the bars are trimmed to [start, end) afterwards.
        let utc_midnight = |d: NaiveDate| d.and_hms_opt(0, 0, 0).map(|d| d.and_utc().timestamp()).unwrap_or_default();
        let period1 = utc_midnight(start - Duration::days(1));
        let period2 = utc_midnight(end + Duration::days(1));
        let url = format!("{}/{}", self.base_url, ticker);
        info!("Fetching {} prices {} to {} from {}", ticker, start, end, url);

        let response = self.client
            .get(&url)
            .header("User-Agent", USER_AGENT)
            .query(&[
                ("period1", period1.to_string()),
                ("period2", period2.to_string()),
                ("interval", "1d".to_string()),
                ("events", "div,splits".to_string()),
                ("includeAdjustedClose", "true".to_string()),
            ])
            .send()
            .await?;
        let status = response.status();
        let body = response.text().await?;

        match parse_chart_response(&ticker, &body) {
            Ok(bars) => {
                let bars = within_range(bars, start, end);
                if bars.is_empty() {
                    return Err(FetchError::NoData(ticker));
                }
                info!("Fetched {} bars for {}", bars.len(), ticker);
                Ok(bars)
            }
            Err(FetchError::Parse(e)) if !status.is_success() => {
                Err(FetchError::Api(format!("HTTP {} ({})", status, e)))
            }
            Err(e) => Err(e),
        }
    }
}
