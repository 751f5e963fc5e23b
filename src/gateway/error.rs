use crate::error::{AnalysisError, AuthError, EsignError, SigningError, StoreError};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};

/// Error rendered as `{"error": "..."}` at the HTTP boundary.
#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    NotFound(String),
    BadRequest {
        message: String,
        code: Option<&'static str>,
    },
    Conflict(String),
    Upstream(String),
    /// Logged in full, rendered as a generic message.
    Internal(anyhow::Error),
}

impl ApiError {
    pub fn unauthorized() -> Self {
        Self::Unauthorized("Unauthorized".into())
    }

    pub fn not_found(what: &str) -> Self {
        Self::NotFound(format!("{what} not found"))
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::BadRequest {
            message: message.into(),
            code: None,
        }
    }

    pub fn no_organization() -> Self {
        Self::BadRequest {
            message: "User has no organization".into(),
            code: Some("NO_ORGANIZATION"),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::Upstream(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

fn from_auth(err: &AuthError) -> Option<ApiError> {
    Some(match err {
        AuthError::InvalidCredentials => ApiError::Unauthorized("Invalid credentials".into()),
        AuthError::UserExists => ApiError::Conflict("User already exists".into()),
        AuthError::MissingFields => ApiError::bad_request(err.to_string()),
        AuthError::Hash(_) => return None,
    })
}

fn from_esign(err: &EsignError) -> Option<ApiError> {
    Some(match err {
        EsignError::NotAuthorized { .. } | EsignError::TokenExpired { .. } => {
            ApiError::Unauthorized(err.to_string())
        }
        EsignError::UnknownState => ApiError::bad_request(err.to_string()),
        EsignError::Request { .. } => ApiError::Upstream("E-signature provider request failed".into()),
        EsignError::NotConfigured { .. } => return None,
    })
}

fn from_analysis(err: &AnalysisError) -> Option<ApiError> {
    Some(match err {
        AnalysisError::EmptyContent => ApiError::bad_request(err.to_string()),
        AnalysisError::Request { .. } | AnalysisError::Parse(_) | AnalysisError::Invalid(_) => {
            ApiError::Upstream("Failed to analyze agreement".into())
        }
        AnalysisError::NotConfigured { .. } => return None,
    })
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        let mapped = if let Some(auth) = err.downcast_ref::<AuthError>() {
            from_auth(auth)
        } else if let Some(esign) = err.downcast_ref::<EsignError>() {
            from_esign(esign)
        } else if let Some(analysis) = err.downcast_ref::<AnalysisError>() {
            from_analysis(analysis)
        } else if let Some(signing) = err.downcast_ref::<SigningError>() {
            Some(Self::bad_request(signing.to_string()))
        } else if let Some(StoreError::NotFound { entity, .. }) = err.downcast_ref::<StoreError>() {
            Some(Self::not_found(entity))
        } else {
            None
        };

        match mapped {
            Some(api) => {
                if matches!(api, Self::Upstream(_)) {
                    tracing::warn!(error = %format!("{err:#}"), "upstream call failed");
                }
                api
            }
            None => Self::Internal(err),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            Self::Unauthorized(message)
            | Self::NotFound(message)
            | Self::Conflict(message)
            | Self::Upstream(message) => serde_json::json!({ "error": message }),
            Self::BadRequest { message, code } => match code {
                Some(code) => serde_json::json!({ "error": message, "code": code }),
                None => serde_json::json!({ "error": message }),
            },
            Self::Internal(err) => {
                tracing::error!(error = %format!("{err:#}"), "request failed");
                serde_json::json!({ "error": "Internal server error" })
            }
        };
        (status, Json(body)).into_response()
    }
}
