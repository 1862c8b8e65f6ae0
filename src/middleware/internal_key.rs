use crate::{
    app_state::AppState,
    error::{ApiError, Result},
};
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

pub const INTERNAL_KEY_HEADER: &str = "x-internal-key";

/// Guards service-to-service routes (payment capture, catalog admin) with
/// the shared key from `internal.api_key`.
pub async fn internal_key_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response> {
    let provided = request
        .headers()
        .get(INTERNAL_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::Unauthorized(format!("Missing {} header", INTERNAL_KEY_HEADER)))?;

    if state.config.internal.api_key.is_empty() || provided != state.config.internal.api_key {
        return Err(ApiError::Unauthorized("Invalid internal key".to_string()));
    }

    Ok(next.run(request).await)
}
