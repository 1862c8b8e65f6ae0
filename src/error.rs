use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Insufficient funds: need {required}, have {available}")]
    InsufficientFunds { required: i32, available: i32 },

    #[error("Invalid product: {0}")]
    InvalidProduct(String),

    #[error("Days out of range: requested {requested:?}, allowed {min}..={max}")]
    DaysOutOfRange {
        requested: Option<i32>,
        min: i32,
        max: i32,
    },

    #[error("No bump available for this listing")]
    NoBumpAvailable,

    #[error("Purchase not active: {0}")]
    PurchaseNotActive(String),

    #[error("Listing update failed: {0}")]
    ListingUpdateFailed(String),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl ApiError {
    /// Stable machine-readable reason code
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Database(_) => "DATABASE_ERROR",
            ApiError::InsufficientFunds { .. } => "INSUFFICIENT_FUNDS",
            ApiError::InvalidProduct(_) => "INVALID_PRODUCT",
            ApiError::DaysOutOfRange { .. } => "DAYS_OUT_OF_RANGE",
            ApiError::NoBumpAvailable => "NO_BUMP_AVAILABLE",
            ApiError::PurchaseNotActive(_) => "PURCHASE_NOT_ACTIVE",
            ApiError::ListingUpdateFailed(_) => "LISTING_UPDATE_FAILED",
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Database(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::InsufficientFunds { .. } => StatusCode::PAYMENT_REQUIRED,
            ApiError::InvalidProduct(_) | ApiError::DaysOutOfRange { .. } => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::NoBumpAvailable
            | ApiError::PurchaseNotActive(_)
            | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::ListingUpdateFailed(_) => StatusCode::BAD_GATEWAY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let message = match self {
            ApiError::Database(ref e) => {
                tracing::error!("Database error: {:?}", e);
                "An internal database error occurred".to_string()
            }
            ApiError::Internal(ref e) => {
                tracing::error!("Internal error: {:?}", e);
                "An internal error occurred".to_string()
            }
            ApiError::ListingUpdateFailed(ref msg) => {
                tracing::warn!("Listing update failed: {}", msg);
                self.to_string()
            }
            _ => self.to_string(),
        };

        let body = json!({
            "success": false,
            "error": {
                "code": self.code(),
                "message": message,
            }
        });

        (self.status(), Json(body)).into_response()
    }
}

// Helper type for results
pub type Result<T> = std::result::Result<T, ApiError>;
