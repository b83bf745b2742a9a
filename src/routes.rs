// src/routes.rs
use std::convert::Infallible;
use std::sync::Arc;

use log::{debug, info};
use warp::filters::body::BodyDeserializeError;
use warp::http::StatusCode;
use warp::reject::{InvalidQuery, MethodNotAllowed, Rejection};
use warp::{Filter, Reply};

use crate::handlers::error::ApiError;
use crate::handlers::{chat, fundamentals, news, portfolio, prices};
use crate::state::AppState;

async fn handle_rejection(err: Rejection) -> Result<impl Reply, Infallible> {
    let (code, message) = if err.is_not_found() {
        (StatusCode::NOT_FOUND, "Not Found".to_string())
    } else if let Some(api_error) = err.find::<ApiError>() {
        (api_error.status, api_error.message.clone())
    } else if let Some(e) = err.find::<BodyDeserializeError>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if let Some(e) = err.find::<InvalidQuery>() {
        (StatusCode::BAD_REQUEST, e.to_string())
    } else if err.find::<MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed".to_string())
    } else {
        debug!("Unhandled rejection: {:?}", err);
        (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
    };

    Ok(warp::reply::with_status(
        warp::reply::json(&serde_json::json!({
            "error": message,
        })),
        code,
    ))
}

pub fn routes(state: Arc<AppState>) -> impl Filter<Extract = impl Reply, Error = Infallible> + Clone {
    info!("Configuring routes...");

    let state_filter = warp::any().map(move || state.clone());

    let prices_route = warp::path!("api" / "v1" / "prices" / String)
        .and(warp::get())
        .and(warp::query::<prices::RangeQuery>())
        .and(state_filter.clone())
        .and_then(prices::get_prices);

    let prices_csv_route = warp::path!("api" / "v1" / "prices" / String / "csv")
        .and(warp::get())
        .and(warp::query::<prices::RangeQuery>())
        .and(state_filter.clone())
        .and_then(prices::get_prices_csv);

    let fundamentals_route = warp::path!("api" / "v1" / "fundamentals" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(fundamentals::get_fundamentals);

    let news_route = warp::path!("api" / "v1" / "news" / String)
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(news::get_news);

    let portfolio_list_route = warp::path!("api" / "v1" / "portfolio")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(portfolio::get_portfolio);

    let portfolio_add_route = warp::path!("api" / "v1" / "portfolio")
        .and(warp::post())
        .and(warp::body::content_length_limit(4 * 1024))
        .and(warp::body::json())
        .and(state_filter.clone())
        .and_then(portfolio::add_position);

    let chat_history_route = warp::path!("api" / "v1" / "chat")
        .and(warp::get())
        .and(state_filter.clone())
        .and_then(chat::get_history);

    let chat_ask_route = warp::path!("api" / "v1" / "chat")
        .and(warp::post())
        .and(warp::body::content_length_limit(16 * 1024))
        .and(warp::body::json())
        .and(state_filter.clone())
        .and_then(chat::ask);

    info!("All routes configured successfully.");

    prices_route
        .or(prices_csv_route)
        .or(fundamentals_route)
        .or(news_route)
        .or(portfolio_list_route)
        .or(portfolio_add_route)
        .or(chat_history_route)
        .or(chat_ask_route)
        .recover(handle_rejection)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;
    use crate::models::PriceBar;
    use crate::services::error::{FetchError, Result as FetchResult};
    use crate::services::yahoo::PriceSource;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use serde_json::Value;

    /// Serves a fixed table for "TEST" and "^GSPC", a flat one for "FLAT" and nothing otherwise.
    struct FixturePrices;

    fn bar(day: u32, adj_close: f64) -> PriceBar {
        PriceBar {
            date: NaiveDate::from_ymd_opt(2024, 1, day).unwrap(),
            open: Some(adj_close),
            high: Some(adj_close),
            low: Some(adj_close),
            close: Some(adj_close),
            adj_close,
            volume: Some(100),
        }
    }

    #[async_trait]
    impl PriceSource for FixturePrices {
        async fn price_history(&self, ticker: &str, _start: NaiveDate, _end: NaiveDate) -> FetchResult<Vec<PriceBar>> {
            match ticker {
                "TEST" | "^GSPC" => Ok(vec![bar(2, 100.0), bar(3, 102.0), bar(4, 101.0), bar(5, 103.0), bar(8, 105.0)]),
                "FLAT" => Ok(vec![bar(2, 50.0), bar(3, 50.0), bar(4, 50.0)]),
                _ => Err(FetchError::NoData(ticker.to_string())),
            }
        }
    }

    fn state() -> Arc<AppState> {
        let config = AppConfig { sma_window: 3, ema_span: 3, ..AppConfig::default() };
        Arc::new(AppState::with_price_source(config, reqwest::Client::new(), Arc::new(FixturePrices)))
    }

    fn json(body: &[u8]) -> Value {
        serde_json::from_slice(body).unwrap()
    }

    #[tokio::test]
    async fn prices_include_smoothing_and_summary() {
        let res = warp::test::request()
            .path("/api/v1/prices/test?start=2024-01-01&end=2024-02-01")
            .reply(&routes(state()))
            .await;
        assert_eq!(res.status(), StatusCode::OK);

        let body = json(res.body());
        assert_eq!(body["ticker"], "TEST");
        assert_eq!(body["start"], "2024-01-01");
        assert_eq!(body["end"], "2024-02-01");
        assert_eq!(body["bars"].as_array().unwrap().len(), 5);
        assert_eq!(body["smoothed"]["sma"][1], Value::Null);
        assert_eq!(body["smoothed"]["ema"][0], 100.0);
        assert_eq!(body["returns"].as_array().unwrap().len(), 4);
        let annual = body["summary"]["annualized_return"].as_f64().unwrap();
        assert!((annual - 311.3179).abs() < 1e-3);
        assert_eq!(body["summary_error"], Value::Null);
    }

    #[tokio::test]
    async fn index_tickers_are_percent_decoded() {
        let res = warp::test::request()
            .path("/api/v1/prices/%5EGSPC?start=2024-01-01&end=2024-02-01")
            .reply(&routes(state()))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json(res.body());
        assert_eq!(body["ticker"], "^GSPC");
        assert_eq!(body["bars"].as_array().unwrap().len(), 5);

        let res = warp::test::request()
            .path("/api/v1/prices/%5EGSPC/csv")
            .reply(&routes(state()))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn flat_prices_report_undefined_summary() {
        let res = warp::test::request()
            .path("/api/v1/prices/FLAT")
            .reply(&routes(state()))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        let body = json(res.body());
        assert_eq!(body["summary"], Value::Null);
        assert!(body["summary_error"].as_str().unwrap().contains("zero"));
    }

    #[tokio::test]
    async fn unknown_ticker_is_not_found() {
        let res = warp::test::request()
            .path("/api/v1/prices/NOPE")
            .reply(&routes(state()))
            .await;
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert!(json(res.body())["error"].as_str().unwrap().contains("NOPE"));
    }

    #[tokio::test]
    async fn inverted_range_is_bad_request() {
        let res = warp::test::request()
            .path("/api/v1/prices/TEST?start=2024-02-01&end=2024-01-01")
            .reply(&routes(state()))
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn csv_export_is_an_attachment() {
        let res = warp::test::request()
            .path("/api/v1/prices/TEST/csv")
            .reply(&routes(state()))
            .await;
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "text/csv");
        assert_eq!(res.headers()["content-disposition"], "attachment; filename=\"TEST_data.csv\"");
        let text = String::from_utf8(res.body().to_vec()).unwrap();
        assert!(text.starts_with("Date,Open,High,Low,Close,Adj Close,Volume,SMA,EMA"));
        assert_eq!(text.lines().count(), 6);
    }

    #[tokio::test]
    async fn portfolio_accepts_valid_and_rejects_invalid() {
        let filter = routes(state());

        let res = warp::test::request()
            .method("POST")
            .path("/api/v1/portfolio")
            .json(&serde_json::json!({"ticker": "aapl", "shares": 3, "purchase_price": 10.5}))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::CREATED);

        let res = warp::test::request()
            .method("POST")
            .path("/api/v1/portfolio")
            .json(&serde_json::json!({"ticker": "MSFT", "shares": 0, "purchase_price": 10.0}))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = warp::test::request()
            .path("/api/v1/portfolio")
            .reply(&filter)
            .await;
        let body = json(res.body());
        assert_eq!(body["entries"].as_array().unwrap().len(), 1);
        assert_eq!(body["entries"][0]["ticker"], "AAPL");
        assert_eq!(body["total_cost"], 31.5);
    }

    #[tokio::test]
    async fn chat_without_key_is_unavailable() {
        let filter = routes(state());
        let res = warp::test::request()
            .method("POST")
            .path("/api/v1/chat")
            .json(&serde_json::json!({"question": "What is a moving average?"}))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

        let res = warp::test::request()
            .method("POST")
            .path("/api/v1/chat")
            .json(&serde_json::json!({"question": "   "}))
            .reply(&filter)
            .await;
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = warp::test::request().path("/api/v1/chat").reply(&filter).await;
        assert_eq!(json(res.body()), serde_json::json!([]));
    }

    #[tokio::test]
    async fn fundamentals_without_key_is_unavailable() {
        let res = warp::test::request()
            .path("/api/v1/fundamentals/IBM")
            .reply(&routes(state()))
            .await;
        assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    }
}
