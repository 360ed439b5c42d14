use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use derive_more::Display;
use serde_json::json;

/// Wire-level error taxonomy. Every handler in the API surface funnels its
/// failures through this enum so the `{"error": {code, message, details}}`
/// shape stays uniform across JSON, CSV and PDF paths.
#[derive(Debug, Display)]
pub enum ApiError {
    /// Malformed, missing or contradictory input. Rejected before any
    /// database access; `details` carries one complaint per offending field.
    #[display(fmt = "{}", message)]
    Validation {
        message: String,
        details: Vec<String>,
    },

    /// Employee resolution failed where the contract demands a hit
    /// (range-apply by id/code).
    #[display(fmt = "{}", _0)]
    NotFound(String),

    /// PDF-only: the employee filter matched nobody. A summary document with
    /// zero rows is treated as a caller error, unlike the CSV/JSON paths.
    #[display(fmt = "{}", _0)]
    NoMatch(String),

    /// Anything unexpected. The cause is logged at the call site; the wire
    /// message stays opaque.
    #[display(fmt = "Internal Server Error")]
    Internal,
}

impl ApiError {
    pub fn validation(message: impl Into<String>, details: Vec<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            details,
        }
    }

    fn code(&self) -> &'static str {
        match self {
            ApiError::Validation { .. } => "VALIDATION_ERROR",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::NoMatch(_) => "NO_MATCH",
            ApiError::Internal => "INTERNAL_SERVER_ERROR",
        }
    }
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } | ApiError::NoMatch(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let mut body = json!({
            "error": {
                "code": self.code(),
                "message": self.to_string(),
            }
        });
        if let ApiError::Validation { details, .. } = self {
            if !details.is_empty() {
                body["error"]["details"] = json!(details);
            }
        }
        HttpResponse::build(self.status_code()).json(body)
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        tracing::error!(error = %e, "database error");
        ApiError::Internal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_maps_to_400_with_code() {
        let err = ApiError::validation("bad input", vec!["date_from is required".into()]);
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "VALIDATION_ERROR");
    }

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError::NotFound("employee not found".into());
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn no_match_is_a_400_not_a_404() {
        let err = ApiError::NoMatch("no employees matched filters".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(err.code(), "NO_MATCH");
    }
}
