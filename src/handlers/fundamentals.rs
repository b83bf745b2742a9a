// src/handlers/fundamentals.rs
use std::sync::Arc;

use log::{error, info};
use serde::Serialize;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::models::{FinancialStatement, StatementKind};
use crate::services::error::FetchError;
use crate::services::yahoo::normalize_ticker;
use crate::state::AppState;

#[derive(Debug, Serialize)]
struct StatementResult {
    kind: StatementKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    statement: Option<FinancialStatement>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub async fn get_fundamentals(ticker: String, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for fundamentals of {}", ticker);
    let ticker = normalize_ticker(&ticker).map_err(|e| warp::reject::custom(ApiError::from(e)))?;

    let results = state.fundamentals.fetch_all(&ticker).await;
    if results.iter().all(|(_, r)| matches!(r, Err(FetchError::MissingApiKey(_)))) {
        error!("Fundamentals requested but no Alpha Vantage key is configured");
        return Err(warp::reject::custom(ApiError::from(FetchError::MissingApiKey("ALPHA_VANTAGE_API_KEY"))));
    }

    let statements: Vec<StatementResult> = results
        .into_iter()
        .map(|(kind, result)| match result {
            Ok(statement) => StatementResult { kind, statement: Some(statement), error: None },
            Err(e) => {
                error!("Error fetching {:?} for {}: {}", kind, ticker, e);
                StatementResult { kind, statement: None, error: Some(e.to_string()) }
            }
        })
        .collect();

    Ok(warp::reply::json(&serde_json::json!({
        "ticker": ticker,
        "statements": statements,
    })))
}
