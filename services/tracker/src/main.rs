use std::sync::Arc;

use sea_orm::Database;
use tracing::info;
use url::Url;
use webauthn_rs::prelude::WebauthnBuilder;

use tracker_api::config::TrackerConfig;
use tracker_api::crypto::derive_key;
use tracker_api::router::build_router;
use tracker_api::state::AppState;
use tracker_core::config::Config;
use tracker_core::tracing::init_tracing;

#[tokio::main]
async fn main() {
    init_tracing();

    let config = TrackerConfig::from_env().expect("failed to load configuration");

    let db = Database::connect(&config.database_url)
        .await
        .expect("failed to connect to database");

    let redis_cfg = deadpool_redis::Config::from_url(&config.redis_url);
    let redis = redis_cfg
        .create_pool(Some(deadpool_redis::Runtime::Tokio1))
        .expect("failed to create Redis pool");

    let rp_origin = Url::parse(&config.webauthn_origin).expect("invalid WEBAUTHN_ORIGIN");
    let webauthn = WebauthnBuilder::new(&config.webauthn_rp_id, &rp_origin)
        .expect("invalid WebAuthn configuration")
        .rp_name(&config.app_name)
        .build()
        .expect("failed to build Webauthn");

    let state = AppState {
        db,
        redis,
        webauthn: Arc::new(webauthn),
        encryption_key: derive_key(&config.auth_secret),
        auth_secret: config.auth_secret,
        cookie_domain: config.cookie_domain,
        app_name: config.app_name,
    };

    let router = build_router(state);
    let addr = format!("0.0.0.0:{}", config.tracker_port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("failed to bind");

    info!("tracker listening on {addr}");
    axum::serve(listener, router).await.expect("server error");
}
