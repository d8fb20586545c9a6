use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use secrecy::ExposeSecret;
use subtle::ConstantTimeEq;
use tracing::warn;

use crate::{app_error::AppError, app_state::AppState};

/// Guards `/admin` routes: requires `Authorization: Bearer <ADMIN_API_TOKEN>`.
pub async fn admin_authorization(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let authorized = req
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .is_some_and(|token| {
            token_matches(token.trim(), state.config.auth.admin_token.expose_secret())
        });

    if !authorized {
        warn!(
            method = %req.method(),
            path = %req.uri().path(),
            "Rejected unauthorized admin request"
        );
        return Err(AppError::Unauthorized);
    }

    Ok(next.run(req).await)
}

/// Compares without short-circuiting on the first differing byte.
fn token_matches(presented: &str, expected: &str) -> bool {
    bool::from(presented.as_bytes().ct_eq(expected.as_bytes()))
}
