use std::net::SocketAddr;
use std::sync::Arc;

use dotenv::dotenv;
use log::info;
use warp::Filter;

use stock_vision::config::AppConfig;
use stock_vision::routes;
use stock_vision::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    env_logger::init();
    info!("Logger initialized. Starting the application...");

    let config = AppConfig::from_env()?;
    info!(
        "Using PORT: {}, SMA window: {}, EMA span: {}",
        config.port, config.sma_window, config.ema_span
    );

    let addr: SocketAddr = ([0, 0, 0, 0], config.port).into();
    info!("Will bind to: {}", addr);

    let cors = warp::cors()
        .allow_any_origin()
        .allow_header("content-type")
        .allow_methods(vec!["GET", "POST"]);

    let state = Arc::new(AppState::new(config));
    let api = routes::routes(state).with(cors);
    info!("Routes configured successfully with CORS.");

    info!("Starting server on {}", addr);
    warp::serve(api)
        .run(addr)
        .await;
    Ok(())
}
