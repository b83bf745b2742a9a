// src/handlers/portfolio.rs
use std::sync::Arc;

use log::{info, warn};
use warp::http::StatusCode;
use warp::{Rejection, Reply};

use super::error::ApiError;
use crate::services::portfolio::NewPosition;
use crate::state::AppState;

pub async fn get_portfolio(state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    info!("Handling request to list portfolio");
    Ok(warp::reply::json(&state.portfolio.view().await))
}

pub async fn add_position(position: NewPosition, state: Arc<AppState>) -> Result<impl Reply, Rejection> {
    info!("Handling request to add {} to portfolio", position.ticker);
    match state.portfolio.add(position).await {
        Ok(entry) => Ok(warp::reply::with_status(warp::reply::json(&entry), StatusCode::CREATED)),
        Err(e) => {
            warn!("Rejected portfolio entry: {}", e);
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}
