use std::{net::SocketAddr, sync::Arc};

use axum::{
    Server,
    http::{HeaderValue, Method, header},
    middleware::from_fn,
};
use pmis_backend::{
    AppState,
    billing::RateSyncScheduler,
    config::Config,
    db, init_tracing, middleware, routes,
    websocket::{self, pubsub},
};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE, header::ACCEPT]);

    if origins.iter().any(|origin| origin == "*") {
        return layer.allow_origin(Any);
    }
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| HeaderValue::from_str(origin).ok())
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::from_env()?;
    init_tracing(&config);

    let db = db::create_pool(&config.database())?;
    let redis = redis::Client::open(config.redis().url)?;
    let addr: SocketAddr = config.server_address().parse()?;
    let cors = cors_layer(&config.cors_origins);

    let state = Arc::new(AppState::new(db, redis, config));

    let rates = state.config.exchange_rates();
    if rates.sync_enabled {
        RateSyncScheduler::new(state.db.clone(), state.rate_provider.clone(), rates).spawn();
    }

    tokio::spawn(websocket::start_connection_cleanup_task(state.ws_manager.clone()));
    tokio::spawn(pubsub::run_subscriber(
        state.redis.clone(),
        pubsub::chat_channel(&state.config.redis_channel_prefix),
        state.ws_manager.clone(),
    ));

    let app = routes::create_router(state)
        .layer(cors)
        .layer(from_fn(middleware::security_headers))
        .layer(from_fn(middleware::request_tracking_middleware))
        .layer(from_fn(middleware::logger::logger));

    tracing::info!(address = %addr, "Server listening");
    tracing::info!("WebSocket endpoint available at ws://{}/ws", addr);
    Server::bind(&addr).serve(app.into_make_service()).await?;
    Ok(())
}
