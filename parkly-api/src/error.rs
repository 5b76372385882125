use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use parkly_booking::LifecycleError;
use parkly_ledger::LedgerError;
use serde_json::json;

/// Error surface of the booking/payment API. Every variant renders as
/// `{"success": false, "message": ...}` so clients can branch on a stable
/// shape.
#[derive(Debug)]
pub enum ApiError {
    AuthenticationError(String),
    Forbidden(String),
    Validation(String),
    NotFound(String),
    SlotUnavailable,
    PaymentGatewayUnavailable,
    SignatureVerificationFailed,
    SpotNoLongerExists,
    AlreadyProcessed,
    AlreadyCancelled,
    CannotCancelCompleted,
    Internal(String),
    Anyhow(anyhow::Error),
}

impl ApiError {
    pub fn from_lifecycle(err: LifecycleError) -> Self {
        match err {
            LifecycleError::AlreadyCancelled => ApiError::AlreadyCancelled,
            LifecycleError::CannotCancelCompleted => ApiError::CannotCancelCompleted,
            LifecycleError::AlreadyProcessed => ApiError::AlreadyProcessed,
            LifecycleError::InvalidTransition { .. } => ApiError::Validation(err.to_string()),
        }
    }

    /// Ledger failures in user-facing paths. InsufficientBalance is a
    /// legitimate 400 for withdrawals; in the refund path callers handle it
    /// before reaching here.
    pub fn from_ledger(err: LedgerError) -> Self {
        match err {
            LedgerError::InsufficientBalance { .. } | LedgerError::InvalidAmount(_) => {
                ApiError::Validation(err.to_string())
            }
            LedgerError::UserNotFound(id) => ApiError::NotFound(format!("User not found: {id}")),
            LedgerError::Storage(msg) => ApiError::Internal(msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::AuthenticationError(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::Validation(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::SlotUnavailable => (
                StatusCode::BAD_REQUEST,
                "No slots available for this parking spot".to_string(),
            ),
            ApiError::PaymentGatewayUnavailable => (
                StatusCode::SERVICE_UNAVAILABLE,
                "Payment system is currently unavailable, please try again".to_string(),
            ),
            ApiError::SignatureVerificationFailed => (
                StatusCode::BAD_REQUEST,
                "Payment signature verification failed".to_string(),
            ),
            ApiError::SpotNoLongerExists => (
                StatusCode::BAD_REQUEST,
                "Parking spot no longer exists".to_string(),
            ),
            ApiError::AlreadyProcessed => (
                StatusCode::BAD_REQUEST,
                "Payment has already been processed for this booking".to_string(),
            ),
            ApiError::AlreadyCancelled => (
                StatusCode::BAD_REQUEST,
                "Booking is already cancelled".to_string(),
            ),
            ApiError::CannotCancelCompleted => (
                StatusCode::BAD_REQUEST,
                "Completed bookings cannot be cancelled".to_string(),
            ),
            ApiError::Internal(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
            ApiError::Anyhow(err) => {
                tracing::error!("Internal Server Error: {}", err);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal Server Error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "message": message,
        }));

        (status, body).into_response()
    }
}

impl<E> From<E> for ApiError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Anyhow(err.into())
    }
}
