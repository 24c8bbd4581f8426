use serde::Deserialize;
use thiserror::Error;

/// Banner text used when the service gave no message of its own.
pub const FALLBACK_MESSAGE: &str = "Failed to calculate locations";

// Helper struct to parse the JSON error body of the locus service
#[derive(Deserialize, Debug, Clone, PartialEq)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(default)]
    pub details: Vec<String>,
}

#[derive(Error, Debug)]
pub enum LocusError {
    #[error("Address must not be empty")]
    EmptyAddress,

    #[error("Invalid {field} value: {value:?} is not a whole number of minutes")]
    InvalidNumber { field: &'static str, value: String },

    // The service answered with an explicit error payload
    #[error("Service error: {message}")]
    Service {
        message: String,
        details: Vec<String>,
    },

    // A fallback for when the error body isn't in the expected JSON format
    #[error("Unstructured API Error: {0}")]
    RawApiError(String),

    #[error("Underlying request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("Failed to parse JSON response: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl LocusError {
    /// The text shown in the error banner for this failure.
    pub fn user_message(&self) -> String {
        match self {
            LocusError::Service { message, .. } => message.clone(),
            _ => FALLBACK_MESSAGE.to_string(),
        }
    }

    pub fn details(&self) -> &[String] {
        match self {
            LocusError::Service { details, .. } => details,
            _ => &[],
        }
    }
}

impl From<ErrorPayload> for LocusError {
    fn from(payload: ErrorPayload) -> Self {
        LocusError::Service {
            message: payload.error,
            details: payload.details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_error_surfaces_server_message() {
        let payload: ErrorPayload =
            serde_json::from_str(r#"{"error": "No constraints provided"}"#).unwrap();
        let err = LocusError::from(payload);
        assert_eq!(err.user_message(), "No constraints provided");
        assert!(err.details().is_empty());
    }

    #[test]
    fn test_transport_errors_use_fallback_message() {
        let err = LocusError::RawApiError("502 Bad Gateway".to_string());
        assert_eq!(err.user_message(), FALLBACK_MESSAGE);
    }
}
