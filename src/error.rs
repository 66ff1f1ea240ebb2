use axum::{http::StatusCode, Json};

use crate::models::dashboard::ErrorResponse;

/// Everything that can go wrong in the dashboard. None of it is fatal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DashboardError {
    /// List fetch failed: transport error, non-2xx, or a body that isn't JSON
    #[error("{0}")]
    Fetch(String),
    #[error("failed to fetch details for '{id}': {reason}")]
    DetailFetch { id: String, reason: String },
    #[error("state storage error: {0}")]
    Persistence(String),
    #[error("edit dialog is not open")]
    DialogClosed,
    /// A newer row selection replaced this one before its detail fetch resolved
    #[error("selection of '{id}' was superseded")]
    SelectionSuperseded { id: String },
}

impl DashboardError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            DashboardError::Fetch(_) | DashboardError::DetailFetch { .. } => StatusCode::BAD_GATEWAY,
            DashboardError::Persistence(_) => StatusCode::INTERNAL_SERVER_ERROR,
            DashboardError::DialogClosed | DashboardError::SelectionSuperseded { .. } => {
                StatusCode::CONFLICT
            }
        }
    }
}

impl From<DashboardError> for (StatusCode, Json<ErrorResponse>) {
    fn from(e: DashboardError) -> Self {
        (
            e.status_code(),
            Json(ErrorResponse {
                error: e.to_string(),
            }),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            DashboardError::Fetch("timeout".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(DashboardError::DialogClosed.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            DashboardError::Persistence("disk full".to_string()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_error_messages() {
        let err = DashboardError::DetailFetch {
            id: "bitcoin".to_string(),
            reason: "CoinCap API error 404".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to fetch details for 'bitcoin': CoinCap API error 404"
        );
    }
}
