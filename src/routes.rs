//! HTTP routing.
//!
//! All routes are public: the service sits behind the frontend and the only
//! unauthenticated caller with special standing, the payment gateway, is
//! checked by signature in the notification service.

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{HeaderValue, header::InvalidHeaderValue},
    routing::{get, post},
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::Config, handlers, state::AppState};

/// Transport-level settings applied around the routes.
#[derive(Debug, Clone)]
pub struct HttpOptions {
    /// Upper bound on request bodies, sized for image uploads
    pub max_upload_bytes: usize,

    /// Frontend origin allowed by CORS; any origin when `None`
    pub cors_allowed_origin: Option<String>,
}

impl HttpOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            max_upload_bytes: config.max_upload_bytes,
            cors_allowed_origin: config.cors_allowed_origin.clone(),
        }
    }
}

impl Default for HttpOptions {
    fn default() -> Self {
        Self {
            max_upload_bytes: 5 * 1024 * 1024,
            cors_allowed_origin: None,
        }
    }
}

/// Build the application router.
///
/// # Errors
///
/// Fails if the configured CORS origin is not a valid header value.
pub fn router(state: AppState, options: &HttpOptions) -> Result<Router, InvalidHeaderValue> {
    let cors = match &options.cors_allowed_origin {
        Some(origin) => CorsLayer::new()
            .allow_origin(origin.parse::<HeaderValue>()?)
            .allow_methods(Any)
            .allow_headers(Any),
        None => CorsLayer::permissive(),
    };

    let app = Router::new()
        .route("/health", get(handlers::health::health_check))
        // Houses
        .route("/houses", get(handlers::houses::list_houses))
        .route("/house", post(handlers::houses::create_house))
        .route(
            "/house/{id}",
            get(handlers::houses::get_house)
                .put(handlers::houses::update_house)
                .delete(handlers::houses::delete_house),
        )
        // Transactions
        .route("/transactions", get(handlers::transactions::list_transactions))
        .route("/transaction", post(handlers::transactions::create_transaction))
        .route(
            "/transaction/{id}",
            get(handlers::transactions::get_transaction)
                .delete(handlers::transactions::delete_transaction),
        )
        // Payment gateway webhook
        .route(
            "/notification",
            post(handlers::notifications::payment_notification),
        )
        .layer(DefaultBodyLimit::max(options.max_upload_bytes))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    Ok(app)
}
