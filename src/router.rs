use axum::{
    routing::{get, post},
    Router,
};
use tower_http::trace::TraceLayer;

use crate::{
    api::{self, cors::cors_headers},
    app::App,
};

pub const RESET_PASSWORD_PATH: &str = "/reset-password";

pub fn router(app: App) -> Router {
    Router::new()
        .route("/liveness", get(api::health_checks::ok))
        .route("/readiness", get(api::health_checks::readiness))
        .route(
            RESET_PASSWORD_PATH,
            post(api::reset_password::reset_password).options(api::cors::preflight),
        )
        .with_state(app)
        .layer(cors_headers())
        .layer(TraceLayer::new_for_http())
}
