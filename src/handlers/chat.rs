// src/handlers/chat.rs
use std::sync::Arc;

use log::{error, info};
use serde::Deserialize;
use warp::reply::Json;
use warp::Rejection;

use super::error::ApiError;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

pub async fn ask(request: AskRequest, state: Arc<AppState>) -> Result<Json, Rejection> {
    info!("Handling chat question");
    match state.chat.ask(&request.question).await {
        Ok(answer) => Ok(warp::reply::json(&answer)),
        Err(e) => {
            error!("Error generating response: {}", e);
            Err(warp::reject::custom(ApiError::from(e)))
        }
    }
}

pub async fn get_history(state: Arc<AppState>) -> Result<Json, Rejection> {
    Ok(warp::reply::json(&state.chat.history().await))
}
