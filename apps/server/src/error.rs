use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use quotehub_market_data::{MarketDataError, ProviderAttempt};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    MarketData(#[from] MarketDataError),
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotImplemented(String),
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    attempts: Option<Vec<ProviderAttempt>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self {
            ApiError::MarketData(e) => match e {
                MarketDataError::InvalidInterval(_) => StatusCode::BAD_REQUEST,
                MarketDataError::UnknownProvider(_) => StatusCode::NOT_FOUND,
                MarketDataError::UnsupportedOperation { .. } => StatusCode::NOT_IMPLEMENTED,
                MarketDataError::Configuration { .. } => StatusCode::INTERNAL_SERVER_ERROR,
                MarketDataError::ProviderRequest { .. }
                | MarketDataError::Normalization { .. }
                | MarketDataError::AllProvidersFailed { .. } => StatusCode::BAD_GATEWAY,
            },
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NotImplemented(_) => StatusCode::NOT_IMPLEMENTED,
        };
        let attempts = match &self {
            ApiError::MarketData(e) => e.diagnostics().map(|d| d.attempts.clone()),
            _ => None,
        };
        if status.is_server_error() {
            tracing::warn!(status = status.as_u16(), error = %self, "Request failed");
        }
        let body = Json(ErrorBody {
            code: status.as_u16(),
            message: self.to_string(),
            attempts,
        });
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
