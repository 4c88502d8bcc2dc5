pub mod aggregation;
pub mod config;
pub mod db;
pub mod demo;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod plaid;
pub mod supabase;

use std::sync::Arc;

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post, put},
};
use tower_http::cors::{AllowOrigin, CorsLayer};

use crate::config::Config;
use crate::demo::DemoDataService;
use crate::middleware::auth::AuthContext;
use crate::middleware::rate_limit::{self, RateLimits};
use crate::middleware::{request_logger, security_headers};
use crate::plaid::PlaidClient;
use crate::supabase::SupabaseAuthClient;

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub plaid: PlaidClient,
    pub supabase: SupabaseAuthClient,
    pub demo: DemoDataService,
    pub config: Arc<Config>,
}

pub fn create_app(state: AppState) -> Router {
    let limits = RateLimits::from_config(&state.config);
    let auth_ctx = AuthContext {
        supabase: state.supabase.clone(),
        test_mode: state.config.test_mode,
        test_user_id: state.config.test_user_id.clone(),
    };

    // Provider routes that issue credentials get the stricter auth
    // quota on top of the provider quota.
    let link_routes = Router::new()
        .route("/plaid/create-link-token", post(handlers::plaid::create_link_token))
        .route("/plaid/exchange-token", post(handlers::plaid::exchange_token))
        .layer(from_fn_with_state(limits.auth.clone(), rate_limit::enforce))
        .layer(from_fn_with_state(limits.plaid.clone(), rate_limit::enforce));

    let sync_routes = Router::new()
        .route("/plaid/sync-transactions", post(handlers::plaid::sync_transactions))
        .route("/plaid/accounts", post(handlers::plaid::accounts))
        .layer(from_fn_with_state(limits.plaid.clone(), rate_limit::enforce));

    let save_routes = Router::new()
        .route("/plaid/save-transactions", post(handlers::plaid::save_transactions))
        .layer(from_fn_with_state(limits.db_write.clone(), rate_limit::enforce));

    let data_routes = Router::new()
        .route(
            "/transactions",
            get(handlers::transactions::list).post(handlers::transactions::create),
        )
        .route(
            "/transactions/:id",
            put(handlers::transactions::update).delete(handlers::transactions::remove),
        )
        .route("/reports/summary", get(handlers::reports::summary))
        .route("/reports/categories", get(handlers::reports::categories))
        .route("/reports/monthly", get(handlers::reports::monthly));

    let protected = Router::new()
        .merge(link_routes)
        .merge(sync_routes)
        .merge(save_routes)
        .merge(data_routes)
        .layer(from_fn_with_state(auth_ctx, middleware::auth::require_user));

    let public = Router::new()
        .route("/health", get(handlers::health))
        .route("/demo/transactions", get(handlers::demo::transactions))
        .route("/demo/accounts", get(handlers::demo::accounts));

    Router::new()
        .nest("/api", public.merge(protected))
        .layer(from_fn_with_state(limits.global.clone(), rate_limit::enforce))
        .layer(from_fn(security_headers::set_security_headers))
        .layer(from_fn(request_logger::request_logger_middleware))
        .layer(cors_layer(&state.config))
        .with_state(state)
}

fn cors_layer(config: &Config) -> CorsLayer {
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| origin.parse().ok())
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
