// src/handlers/prices.rs
use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use log::{error, info, warn};
use serde::{Deserialize, Serialize};
use warp::http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use warp::{Rejection, Reply};

use super::error::ApiError;
use crate::models::{PeriodReturn, PriceBar, PriceSeries, RiskReturnSummary, SmoothedSeries};
use crate::services::calculations::{compute_period_returns, compute_risk_return_summary, compute_smoothed};
use crate::services::export::{export_file_name, price_csv_bytes};
use crate::services::yahoo::normalize_ticker;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct RangeQuery {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl RangeQuery {
    /// Defaults to 2022-01-01 up to (not including) today.
    pub fn resolve(&self) -> (NaiveDate, NaiveDate) {
        let start = self.start
            .or_else(|| NaiveDate::from_ymd_opt(2022, 1, 1))
            .unwrap_or_default();
        let end = self.end.unwrap_or_else(|| Utc::now().date_naive());
        (start, end)
    }
}

#[derive(Debug, Serialize)]
struct PriceResponse {
    ticker: String,
    start: NaiveDate,
    end: NaiveDate,
    bars: Vec<PriceBar>,
    smoothed: SmoothedSeries,
    returns: Vec<PeriodReturn>,
    summary: Option<RiskReturnSummary>,
    summary_error: Option<String>,
}

/// A fetched price table together with the exact range it was fetched for.
struct Loaded {
    ticker: String,
    start: NaiveDate,
    end: NaiveDate,
    bars: Vec<PriceBar>,
    series: PriceSeries,
}

async fn load(state: &AppState, ticker: &str, query: &RangeQuery) -> Result<Loaded, ApiError> {
    let ticker = normalize_ticker(ticker)?;
    let (start, end) = query.resolve();
    if start >= end {
        return Err(ApiError::bad_request(format!("start {} must be before end {}", start, end)));
    }

    let bars = state.prices.price_history(&ticker, start, end).await.map_err(|e| {
        error!("Failed to fetch prices for {}: {}", ticker, e);
        ApiError::from(e)
    })?;
    let series = PriceSeries::from_bars(&bars)?;
    Ok(Loaded { ticker, start, end, bars, series })
}

pub async fn get_prices(ticker: String, query: RangeQuery, state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    info!("Handling request for price analysis of {}", ticker);
    let Loaded { ticker, start, end, bars, series } = load(&state, &ticker, &query).await.map_err(warp::reject::custom)?;

    let smoothed = compute_smoothed(&series, state.config.sma_window, state.config.ema_span)
        .map_err(|e| warp::reject::custom(ApiError::from(e)))?;

    // The chart is still useful when the statistics are undefined, so the
    // reason is reported next to the series instead of failing the request.
    let (returns, summary) = match compute_period_returns(&series) {
        Ok(returns) => {
            let summary = compute_risk_return_summary(&returns);
            (returns, summary)
        }
        Err(e) => (Vec::new(), Err(e)),
    };
    let (summary, summary_error) = match summary {
        Ok(summary) => (Some(summary), None),
        Err(e) => {
            warn!("No risk/return summary for {}: {}", ticker, e);
            (None, Some(e.to_string()))
        }
    };

    Ok(warp::reply::json(&PriceResponse {
        ticker,
        start,
        end,
        bars,
        smoothed,
        returns,
        summary,
        summary_error,
    }))
}

pub async fn get_prices_csv(ticker: String, query: RangeQuery, state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    info!("Handling CSV export for {}", ticker);
    let Loaded { ticker, bars, series, .. } = load(&state, &ticker, &query).await.map_err(warp::reject::custom)?;

    let smoothed = compute_smoothed(&series, state.config.sma_window, state.config.ema_span)
        .map_err(|e| warp::reject::custom(ApiError::from(e)))?;
    let body = price_csv_bytes(&bars, &smoothed).map_err(|e| {
        error!("Failed to build CSV for {}: {}", ticker, e);
        warp::reject::custom(ApiError::new(warp::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
    })?;

    let disposition = format!("attachment; filename=\"{}\"", export_file_name(&ticker));
    Ok(warp::reply::with_header(
        warp::reply::with_header(body, CONTENT_TYPE, "text/csv"),
        CONTENT_DISPOSITION,
        disposition,
    ))
}
