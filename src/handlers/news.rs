// src/handlers/news.rs
use std::sync::Arc;

use log::{error, info};
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::services::yahoo::normalize_ticker;
use crate::state::AppState;

pub async fn get_news(ticker: String, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling request for news of {}", ticker);
    let ticker = normalize_ticker(&ticker).map_err(|e| warp::reject::custom(ApiError::from(e)))?;

    match state.news.top_news(&ticker).await {
        Ok(items) => Ok(warp::reply::json(&serde_json::json!({
            "ticker": ticker,
            "items": items,
        }))),
        Err(e) => {
            error!("Error fetching news for {}: {}", ticker, e);
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}
