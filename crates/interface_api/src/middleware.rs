//! API middleware

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};

use core_kernel::UserId;

use crate::auth::validate_token;
use crate::error::ApiError;
use crate::AppState;

/// The authenticated wallet user, inserted by [`auth_middleware`]
#[derive(Debug, Clone, Copy)]
pub struct CurrentUser(pub UserId);

/// Resolves the bearer token to a wallet user
///
/// Every protected route sees a `CurrentUser` extension afterwards; the
/// identity provider's token is trusted completely once its signature
/// checks out.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthorized)?;

    let claims =
        validate_token(token, &state.config.jwt_secret).map_err(|_| ApiError::Unauthorized)?;
    let user = claims.user_id().map_err(|_| ApiError::Unauthorized)?;

    request.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(request).await)
}
