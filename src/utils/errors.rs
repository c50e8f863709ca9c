use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use std::fmt;

use crate::board::transition::TransitionError;
use crate::gateway::GatewayError;
use crate::models::auth::ErrorResponse;
use crate::utils::validation::{field_errors, FieldErrors};

/// Where the client is sent when its session is missing or expired.
pub const SIGN_IN_ROUTE: &str = "/login";

#[derive(Debug)]
pub enum ServiceError {
    Unauthorized(String),
    NotFound(String),
    InternalError(String),
    ValidationError(String),
    InvalidForm(FieldErrors),
    AuthenticationError(String),
    Conflict(String),
    /// The remote service failed or rejected the call.
    GatewayError { title: String, message: String },
}

impl ServiceError {
    pub fn gateway(title: impl Into<String>, message: impl Into<String>) -> Self {
        ServiceError::GatewayError {
            title: title.into(),
            message: message.into(),
        }
    }

    fn title(&self) -> &str {
        match self {
            ServiceError::Unauthorized(_) => "Not signed in",
            ServiceError::NotFound(_) => "Not found",
            ServiceError::InternalError(_) => "Something went wrong",
            ServiceError::ValidationError(_) | ServiceError::InvalidForm(_) => "Invalid input",
            ServiceError::AuthenticationError(_) => "Sign-in failed",
            ServiceError::Conflict(_) => "Already exists",
            ServiceError::GatewayError { title, .. } => title,
        }
    }

    fn body(&self) -> ErrorResponse {
        let message = match self {
            ServiceError::Unauthorized(msg)
            | ServiceError::NotFound(msg)
            | ServiceError::ValidationError(msg)
            | ServiceError::AuthenticationError(msg)
            | ServiceError::Conflict(msg) => msg.clone(),
            ServiceError::GatewayError { message, .. } => message.clone(),
            ServiceError::InvalidForm(_) => "Please correct the highlighted fields".to_string(),
            // Don't expose internal details
            ServiceError::InternalError(_) => "Something went wrong".to_string(),
        };
        ErrorResponse {
            status: "error".to_string(),
            title: self.title().to_string(),
            message,
            fields: match self {
                ServiceError::InvalidForm(fields) => Some(fields.clone()),
                _ => None,
            },
            redirect_to: matches!(self, ServiceError::Unauthorized(_))
                .then(|| SIGN_IN_ROUTE.to_string()),
        }
    }
}

impl fmt::Display for ServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ServiceError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ServiceError::NotFound(msg) => write!(f, "Not Found: {}", msg),
            ServiceError::InternalError(msg) => write!(f, "Internal Error: {}", msg),
            ServiceError::ValidationError(msg) => write!(f, "Validation Error: {}", msg),
            ServiceError::InvalidForm(fields) => {
                write!(f, "Invalid Form: {}", fields.keys().cloned().collect::<Vec<_>>().join(", "))
            }
            ServiceError::AuthenticationError(msg) => write!(f, "Authentication Error: {}", msg),
            ServiceError::Conflict(msg) => write!(f, "Conflict: {}", msg),
            ServiceError::GatewayError { title, message } => {
                write!(f, "Gateway Error: {}: {}", title, message)
            }
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Unauthorized(_) | ServiceError::AuthenticationError(_) => {
                StatusCode::UNAUTHORIZED
            }
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::ValidationError(_) | ServiceError::InvalidForm(_) => {
                StatusCode::BAD_REQUEST
            }
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::GatewayError { .. } => StatusCode::BAD_GATEWAY,
            ServiceError::InternalError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if status.is_server_error() {
            log::error!("{}", self);
        } else {
            log::warn!("{}", self);
        }
        HttpResponse::build(status).json(self.body())
    }
}

impl From<GatewayError> for ServiceError {
    fn from(err: GatewayError) -> Self {
        match err {
            GatewayError::NotFound(what) => ServiceError::NotFound(format!("{} not found", what)),
            GatewayError::Unauthorized(msg) => ServiceError::Unauthorized(msg),
            GatewayError::Rejected { status: 409, message } => ServiceError::Conflict(message),
            GatewayError::Rejected { status, message } if (400..500).contains(&status) => {
                ServiceError::ValidationError(message)
            }
            other => ServiceError::gateway("Request failed", other.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ServiceError::InvalidForm(field_errors(&errors))
    }
}

impl From<TransitionError> for ServiceError {
    fn from(err: TransitionError) -> Self {
        ServiceError::NotFound(err.to_string())
    }
}
