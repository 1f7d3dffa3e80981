use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::PgPool;
use std::sync::Arc;
use std::time::Duration;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use shared::jwt::JwtConfig;

use crate::config::Config;
use crate::middleware::{
    metrics_handler, metrics_middleware, rate_limit_middleware, require_admin, require_auth,
    security_headers_middleware, trace_id, RateLimiterState,
};
use crate::routes::{
    auth, health, players, products, promocodes, rewards, server_actions, shop, transfers,
};
use crate::services::{FulfillmentService, RconExecutor};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub config: Arc<Config>,
    pub jwt: Arc<JwtConfig>,
    pub rate_limiter: Option<Arc<RateLimiterState>>,
    pub executor: Arc<RconExecutor>,
    pub fulfillment: Arc<FulfillmentService>,
}

pub fn create_app(
    config: Config,
    pool: PgPool,
    jwt: Arc<JwtConfig>,
    executor: Arc<RconExecutor>,
    fulfillment: Arc<FulfillmentService>,
) -> Router {
    let config = Arc::new(config);

    // Rate limiter only when enabled (rate_limit_per_minute > 0)
    let rate_limiter = if config.security.rate_limit_per_minute > 0 {
        Some(Arc::new(RateLimiterState::new(
            config.security.rate_limit_per_minute,
        )))
    } else {
        None
    };

    let state = AppState {
        pool,
        config: config.clone(),
        jwt,
        rate_limiter,
        executor,
        fulfillment,
    };

    // Build CORS layer based on configuration
    let cors = if config.security.cors_origins.is_empty() {
        // Default: allow any origin (for development)
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        use tower_http::cors::AllowOrigin;
        let origins: Vec<_> = config
            .security
            .cors_origins
            .iter()
            .filter_map(|o| o.parse().ok())
            .collect();
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    // Public routes (no authentication required)
    let public_routes = Router::new()
        .route("/api/health", get(health::health_check))
        .route("/api/health/ready", get(health::ready))
        .route("/api/health/live", get(health::live))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/auth/register", post(auth::register))
        .route("/api/v1/auth/login", post(auth::login))
        .route("/api/v1/auth/refresh", post(auth::refresh))
        .route("/api/v1/products", get(products::list_products))
        .route("/api/v1/products/:id", get(products::get_product))
        .route(
            "/api/v1/shop/promocode/validate",
            get(promocodes::validate_promocode),
        )
        .route(
            "/api/v1/transfers/commission",
            get(transfers::transfer_commission),
        );

    // Player routes (require a valid access token)
    // Middleware order: auth runs first, then rate limiting (which needs
    // the player id from auth).
    let player_routes = Router::new()
        .route("/api/v1/players/me", get(players::me))
        .route("/api/v1/shop/purchase", post(shop::purchase))
        .route("/api/v1/shop/history", get(shop::purchase_history))
        .route("/api/v1/shop/purchases/:id", get(shop::purchase_details))
        .route("/api/v1/transfers", post(transfers::create_transfer))
        .route("/api/v1/transfers/history", get(transfers::transfer_history))
        .route("/api/v1/transfers/stats", get(transfers::transfer_stats))
        .route(
            "/api/v1/server/:server_id/players",
            get(server_actions::online_players),
        )
        .route("/api/v1/rewards/playtime", get(rewards::playtime_status))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            rate_limit_middleware,
        ))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Admin routes (require the admin flag)
    let admin_routes = Router::new()
        .route("/api/v1/admin/products", post(products::create_product))
        .route("/api/v1/admin/products/:id", put(products::update_product))
        .route(
            "/api/v1/admin/products/:id",
            delete(products::delete_product),
        )
        .route("/api/v1/admin/promocodes", post(promocodes::create_promocode))
        .route("/api/v1/admin/promocodes", get(promocodes::list_promocodes))
        .route(
            "/api/v1/admin/promocodes/:id/deactivate",
            post(promocodes::deactivate_promocode),
        )
        .route("/api/v1/admin/shop/stats", get(shop::shop_stats))
        .route(
            "/api/v1/admin/server/status",
            get(server_actions::server_status),
        )
        .route("/api/v1/admin/server/tell", post(server_actions::tell_player))
        .route(
            "/api/v1/admin/server/broadcast",
            post(server_actions::broadcast),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), require_admin));

    // Merge all routes
    Router::new()
        .merge(public_routes)
        .merge(player_routes)
        .merge(admin_routes)
        // Global middleware (order matters: bottom layers run first)
        .layer(middleware::from_fn(security_headers_middleware))
        .layer(CompressionLayer::new())
        .layer(TimeoutLayer::new(Duration::from_secs(
            config.server.request_timeout_secs,
        )))
        .layer(middleware::from_fn(metrics_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(trace_id))
        .layer(cors)
        .with_state(state)
}
