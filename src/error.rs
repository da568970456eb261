use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::{
    inventory::InventoryError,
    response::{ApiResponse, Meta},
    services::reconciliation::SyncReport,
};

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not Found")]
    NotFound,

    #[error("Bad Request {0}")]
    BadRequest(String),

    #[error("Unauthorized {0}")]
    Unauthorized(String),

    #[error("Forbidden")]
    Forbidden,

    #[error("Conflict {0}")]
    Conflict(String),

    #[error("Bad Gateway {message}")]
    Gateway { status: Option<u16>, message: String },

    #[error("Inventory provider error: {0}")]
    Inventory(#[from] InventoryError),

    #[error("Order {order_id} updated but inventory sync failed")]
    InventorySync { order_id: i64, report: SyncReport },

    #[error("Database error")]
    DbError(#[from] sqlx::Error),

    #[error("ORM error")]
    OrmError(#[from] sea_orm::DbErr),

    #[error("Internal Server Error")]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn gateway(status: Option<u16>, message: impl Into<String>) -> Self {
        AppError::Gateway {
            status,
            message: message.into(),
        }
    }
}

#[derive(Serialize)]
struct ErrorData {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    upstream_status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inventory_sync: Option<SyncReport>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Gateway { .. } => StatusCode::BAD_GATEWAY,
            AppError::Inventory(InventoryError::InvalidQuantity(_)) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            AppError::Inventory(_) => StatusCode::BAD_GATEWAY,
            AppError::InventorySync { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::DbError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::OrmError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, "request failed");
        }

        let message = self.to_string();
        let upstream_status = match &self {
            AppError::Gateway { status, .. } => *status,
            AppError::Inventory(err) => err.upstream_status(),
            _ => None,
        };
        let error = message.clone();
        let inventory_sync = match self {
            AppError::InventorySync { report, .. } => Some(report),
            _ => None,
        };

        let body = ApiResponse {
            message,
            data: Some(ErrorData {
                error,
                upstream_status,
                inventory_sync,
            }),
            meta: Some(Meta::empty()),
        };

        (status, axum::Json(body)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;
