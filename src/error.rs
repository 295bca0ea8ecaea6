//! Backend Error Types
//!
//! Every call to the trading backend resolves to either a typed value or
//! an `ApiError`. HTTP status failures and transport failures are kept
//! apart so the terminal can report them differently. Nothing here is
//! retried: the user re-runs the command.

use thiserror::Error;

/// Result alias used across the backend port.
pub type ApiResult<T> = Result<T, ApiError>;

/// Failure of a single backend request.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ApiError {
    /// The backend answered with a non-2xx status.
    #[error("API Error: {status} - {body}")]
    Http {
        /// HTTP status code.
        status: u16,
        /// Raw response body text.
        body: String,
    },

    /// Connection refused, DNS failure, TLS failure or timeout.
    #[error("Network Error: {0}")]
    Network(String),

    /// 2xx response whose body is not the JSON we expected.
    #[error("Invalid response from {endpoint}: {reason}")]
    Decode {
        /// Request path.
        endpoint: String,
        /// Parser message.
        reason: String,
    },

    /// No authenticated session.
    #[error("Please enter a valid access token.")]
    MissingToken,
}

impl ApiError {
    /// Stable label for metrics and structured logs.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Http { .. } => "http",
            Self::Network(_) => "network",
            Self::Decode { .. } => "decode",
            Self::MissingToken => "auth",
        }
    }

    /// HTTP status if the backend answered at all.
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub(crate) fn decode(endpoint: &str, err: impl std::fmt::Display) -> Self {
        Self::Decode {
            endpoint: endpoint.to_string(),
            reason: err.to_string(),
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        // The URL carries the access token as a query parameter.
        let err = err.without_url();
        if err.is_timeout() {
            Self::Network(format!("request timed out ({err})"))
        } else {
            Self::Network(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_error_display_carries_status_and_body() {
        let err = ApiError::Http {
            status: 401,
            body: "{\"detail\":\"Invalid token\"}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "API Error: 401 - {\"detail\":\"Invalid token\"}"
        );
        assert_eq!(err.kind(), "http");
        assert_eq!(err.status(), Some(401));
    }

    #[test]
    fn test_network_error_is_distinct_from_http() {
        let err = ApiError::Network("connection refused".to_string());
        assert_eq!(err.to_string(), "Network Error: connection refused");
        assert_eq!(err.kind(), "network");
        assert_eq!(err.status(), None);
    }

    #[test]
    fn test_missing_token_message() {
        assert_eq!(
            ApiError::MissingToken.to_string(),
            "Please enter a valid access token."
        );
    }
}
