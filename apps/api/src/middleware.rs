use axum::extract::{Request, State};
use axum::http::header;
use axum::middleware::Next;
use axum::response::Response;
use fleetbridge_core::AppError;

use crate::error::ApiResult;
use crate::state::AppState;

/// Resolves the bearer token into a principal and attaches it to the request.
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> ApiResult<Response> {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| AppError::Unauthorized("authentication required".to_owned()))?;

    let principal = state.identity_service.resolve(token).await?;

    request.extensions_mut().insert(principal);
    Ok(next.run(request).await)
}
