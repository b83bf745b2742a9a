// src/handlers/error.rs
use std::fmt;
use warp::http::StatusCode;
use warp::reject::Reject;

use crate::services::calculations::CalcError;
use crate::services::error::FetchError;
use crate::services::portfolio::PortfolioError;

#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        ApiError {
            status,
            message: message.into(),
        }
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn external_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_GATEWAY, message)
    }
}

impl From<FetchError> for ApiError {
    fn from(e: FetchError) -> Self {
        match e {
            FetchError::NoData(_) => ApiError::not_found(e.to_string()),
            FetchError::InvalidInput(_) => ApiError::bad_request(e.to_string()),
            FetchError::MissingApiKey(_) => ApiError::new(StatusCode::SERVICE_UNAVAILABLE, e.to_string()),
            FetchError::Api(_) | FetchError::Http(_) | FetchError::Parse(_) => ApiError::external_error(e.to_string()),
        }
    }
}

impl From<CalcError> for ApiError {
    fn from(e: CalcError) -> Self {
        ApiError::new(StatusCode::UNPROCESSABLE_ENTITY, e.to_string())
    }
}

impl From<PortfolioError> for ApiError {
    fn from(e: PortfolioError) -> Self {
        ApiError::bad_request(e.to_string())
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ApiError {}
impl Reject for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_errors_to_status_codes() {
        assert_eq!(ApiError::from(FetchError::NoData("AAPL".into())).status, StatusCode::NOT_FOUND);
        assert_eq!(ApiError::from(FetchError::MissingApiKey("X")).status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(ApiError::from(FetchError::Api("boom".into())).status, StatusCode::BAD_GATEWAY);
        assert_eq!(ApiError::from(CalcError::DivisionByZero).status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(ApiError::from(PortfolioError::NoShares).status, StatusCode::BAD_REQUEST);
    }
}
