use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

use crate::domain::{checkout::CheckoutError, payment::TransitionError};

/// Envelope for every JSON response: `{"data": ..., "message": ...}`.
#[derive(Serialize, Deserialize, Debug, ToSchema)]
pub struct StdResponse<T, M> {
    pub data: Option<T>,
    pub message: Option<M>,
}

impl<T, M> IntoResponse for StdResponse<T, M>
where
    T: Serialize,
    M: Serialize,
{
    fn into_response(self) -> Response {
        Json(self).into_response()
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found")]
    NotFound,

    #[error("Unauthorized")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Conflict(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl AppError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<DieselError> for AppError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(
                DatabaseErrorKind::UniqueViolation | DatabaseErrorKind::ForeignKeyViolation,
                ref info,
            ) => Self::Conflict(info.message().to_string()),
            other => Self::Other(other.into()),
        }
    }
}

impl From<CheckoutError> for AppError {
    fn from(err: CheckoutError) -> Self {
        Self::BadRequest(err.to_string())
    }
}

impl From<TransitionError> for AppError {
    fn from(err: TransitionError) -> Self {
        match err {
            TransitionError::AlreadyPaid => Self::Conflict(err.to_string()),
            TransitionError::NotPermitted(_) => Self::BadRequest(err.to_string()),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        let message = match &self {
            Self::Other(err) => {
                tracing::error!(error = ?err, "Request failed");
                "Internal server error".to_string()
            }
            other => other.to_string(),
        };

        (
            status,
            StdResponse::<(), String> {
                data: None,
                message: Some(message),
            },
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::payment::PaymentStatus;

    #[test]
    fn test_app_error_status_codes() {
        assert_eq!(AppError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Unauthorized.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            AppError::BadRequest("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::Other(anyhow::anyhow!("boom")).into_response().status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_diesel_not_found_maps_to_404() {
        assert!(matches!(
            AppError::from(DieselError::NotFound),
            AppError::NotFound
        ));
    }

    #[test]
    fn test_transition_errors_map_to_client_errors() {
        assert_eq!(
            AppError::from(TransitionError::AlreadyPaid).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            AppError::from(TransitionError::NotPermitted(PaymentStatus::Paid)).status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn test_checkout_error_message_is_kept() {
        let err = AppError::from(CheckoutError {
            problems: vec!["Order must contain at least one item".into()],
        });
        assert_eq!(err.to_string(), "Order must contain at least one item");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }
}
