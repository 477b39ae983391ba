// src/application/error_handling.rs
//
// Error shaping for external callers
//
// ARCHITECTURE:
// - Maps internal errors → responses the API transport can serialize
// - Consistent error format for every route
// - Internal details stay in the log, not in the response

use serde::{Deserialize, Serialize};

use crate::error::AppError;

/// Standard error response for API clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error_type: ErrorType,
    pub message: String,
    pub details: Option<String>,
}

/// Error categories for API clients
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorType {
    /// Unknown route (404)
    NotFound,

    /// Invalid input or track state invariant violation (400)
    Validation,

    /// A provider the route depends on is missing (503)
    Wiring,

    /// Page probe, HTTP or OS integration failure (502)
    ExternalService,

    /// Settings file error (500)
    Persistence,

    /// Other/unknown error (500)
    Internal,
}

impl ErrorResponse {
    fn new(error_type: ErrorType, message: impl Into<String>, details: Option<String>) -> Self {
        Self {
            success: false,
            error_type,
            message: message.into(),
            details,
        }
    }

    /// Create error response from AppError
    pub fn from_app_error(error: AppError) -> Self {
        match error {
            AppError::RouteNotFound(route) => {
                Self::new(ErrorType::NotFound, format!("{} not found", route), None)
            }

            AppError::ProviderNotFound(_)
            | AppError::ProviderTypeMismatch(_)
            | AppError::RegistryUnavailable => {
                log::error!("[API] wiring error: {}", error);
                Self::new(
                    ErrorType::Wiring,
                    "Required provider is unavailable",
                    Some(error.to_string()),
                )
            }

            AppError::InvalidArgument(message) => Self::new(ErrorType::Validation, message, None),

            AppError::Domain(domain_error) => Self::new(
                ErrorType::Validation,
                "Track state validation failed",
                Some(domain_error.to_string()),
            ),

            AppError::Probe(_) | AppError::Http(_) | AppError::Integration(_) => {
                log::warn!("[API] external failure: {}", error);
                Self::new(
                    ErrorType::ExternalService,
                    "External service error",
                    Some(error.to_string()),
                )
            }

            AppError::Io(io_error) => {
                log::error!("[API] IO error: {:?}", io_error);
                Self::new(
                    ErrorType::Persistence,
                    "File system operation failed",
                    Some(io_error.to_string()),
                )
            }

            AppError::Serialization(serde_error) => {
                log::error!("[API] serialization error: {:?}", serde_error);
                Self::new(ErrorType::Internal, "Data serialization failed", None)
            }

            other => {
                log::error!("[API] internal error: {}", other);
                Self::new(ErrorType::Internal, other.to_string(), None)
            }
        }
    }

    /// Create validation error
    pub fn validation(message: String) -> Self {
        Self::new(ErrorType::Validation, message, None)
    }

    /// Create not found error
    pub fn not_found(resource: &str) -> Self {
        Self::new(ErrorType::NotFound, format!("{} not found", resource), None)
    }
}

/// Helper trait to convert Results into a serialized ErrorResponse
pub trait ToErrorResponse<T> {
    fn to_error_response(self) -> Result<T, String>;
}

impl<T> ToErrorResponse<T> for Result<T, AppError> {
    fn to_error_response(self) -> Result<T, String> {
        self.map_err(|e| {
            let error_response = ErrorResponse::from_app_error(e);
            serde_json::to_string(&error_response)
                .unwrap_or_else(|_| "Internal error".to_string())
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DomainError;
    use crate::error::ProbeError;

    #[test]
    fn test_route_not_found() {
        let error = ErrorResponse::from_app_error(AppError::RouteNotFound("api/x".into()));
        assert_eq!(error.error_type, ErrorType::NotFound);
        assert_eq!(error.message, "api/x not found");
    }

    #[test]
    fn test_missing_provider_is_wiring() {
        let error = ErrorResponse::from_app_error(AppError::ProviderNotFound("track".into()));
        assert_eq!(error.error_type, ErrorType::Wiring);
        assert!(error.details.unwrap().contains("track"));
    }

    #[test]
    fn test_domain_and_argument_errors_are_validation() {
        let domain = ErrorResponse::from_app_error(AppError::Domain(
            DomainError::InvariantViolation("bad".into()),
        ));
        assert_eq!(domain.error_type, ErrorType::Validation);

        let argument = ErrorResponse::from_app_error(AppError::InvalidArgument("seek".into()));
        assert_eq!(argument.error_type, ErrorType::Validation);
        assert_eq!(argument.message, "seek");
    }

    #[test]
    fn test_probe_failure_is_external() {
        let error = ErrorResponse::from_app_error(AppError::Probe(ProbeError::Timeout(1000)));
        assert_eq!(error.error_type, ErrorType::ExternalService);
    }

    #[test]
    fn test_serialization() {
        let error = ErrorResponse::not_found("Track");
        let json = serde_json::to_string(&error).unwrap();
        assert!(json.contains("not_found"));
        assert!(json.contains("Track not found"));
    }

    #[test]
    fn test_to_error_response() {
        let result: Result<(), AppError> = Err(AppError::Integration("tray".into()));
        let message = result.to_error_response().unwrap_err();
        assert!(message.contains("external_service"));
    }
}
