use authgate::{
    app_router,
    auth::token::TokenIssuer,
    config::AppConfig,
    db,
    middleware::RateLimiter,
    repositories::SqliteUserRepository,
    services::{AuthService, UserService},
    AppState,
};

use axum::http::{HeaderValue, Method};
use std::{net::SocketAddr, sync::Arc};
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load environment variables
    dotenvy::dotenv().ok();

    let config = AppConfig::from_env()?;

    // Initialize tracing; production defaults to info, development to debug
    let default_filter = if config.is_production() {
        "authgate=info,tower_http=warn"
    } else {
        "authgate=debug,tower_http=debug"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let pool = db::create_pool(&config.database_url).await?;

    // Run migrations
    sqlx::migrate!("./migrations").run(&pool).await?;

    // Token issuer from the configured RSA key pair
    let token_issuer = Arc::new(TokenIssuer::from_key_files(
        &config.jwt_private_key_path,
        &config.jwt_public_key_path,
    )?);

    // Explicit construction: repository -> directory service -> auth service
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let user_service = Arc::new(UserService::new(user_repository));
    let auth_service = Arc::new(AuthService::new(
        user_service.clone(),
        token_issuer.clone(),
    ));

    let app_state = AppState {
        user_service,
        auth_service,
        token_issuer,
        pool: pool.clone(),
    };

    let cors_layer = build_cors_layer(&config.allowed_origins)?;

    let app = app_router(app_state, RateLimiter::default())
        .layer(cors_layer)
        .layer(TraceLayer::new_for_http());

    let addr = SocketAddr::from((config.host.parse::<std::net::IpAddr>()?, config.port));

    tracing::info!(environment = %config.environment, "Server running on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Connections drain before the pool goes away.
    pool.close().await;
    tracing::info!("Shutdown complete");

    Ok(())
}

fn build_cors_layer(origins: &[String]) -> Result<CorsLayer, Box<dyn std::error::Error>> {
    let mut allowed = Vec::with_capacity(origins.len());
    for origin in origins {
        allowed.push(origin.parse::<HeaderValue>()?);
    }

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(allowed))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::AUTHORIZATION,
        ]))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
