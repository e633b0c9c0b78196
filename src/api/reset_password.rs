use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::debug;

use crate::{
    app::App,
    reset::{reset_credential, ResetOutcome, ResetRequest, EMAIL_REQUIRED},
};

/// `POST /reset-password`
///
/// Thin adapter over [`reset_credential`]: a body that is not a JSON object
/// with a string `email` is answered exactly like a blank email.
pub async fn reset_password(
    State(app): State<App>,
    payload: Result<Json<ResetRequest>, JsonRejection>,
) -> ResetOutcome {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(%rejection, "rejecting malformed reset request");
            return ResetOutcome::ValidationFailed(EMAIL_REQUIRED);
        }
    };

    reset_credential(request, &app.config.reset, &app.clients).await
}

impl IntoResponse for ResetOutcome {
    fn into_response(self) -> Response {
        let message = self.message();
        match self {
            Self::GenericSuccess(_) => (
                StatusCode::OK,
                Json(json!({ "success": true, "message": message })),
            )
                .into_response(),
            Self::ValidationFailed(_) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": message }))).into_response()
            }
            Self::ServerError(_) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": message })),
            )
                .into_response(),
        }
    }
}
