// SPDX-FileCopyrightText: 2025 Semiotic Labs
//
// SPDX-License-Identifier: Apache-2.0

//! Shared HTTP transport and failure taxonomy for upstream analytics APIs
//!
//! This crate provides the leaf layer every upstream client is built on.
//!
//! # Core Abstractions
//!
//! - **[`HttpTransport`]**: timeout-bounded POST/GET execution over one lazily created,
//!   reusable connection pool
//! - **[`FetchError`]**: the four ways an upstream call can fail, so callers can branch on
//!   the failure kind instead of on absence alone

use std::fmt;

use thiserror::Error;

pub mod transport;

pub use transport::{HttpTransport, TransportConfig};

/// Result type alias for upstream fetch operations
pub type FetchResult<T> = Result<T, FetchError>;

/// Failures an upstream call can produce
///
/// Every variant is recoverable: clients log it and hand it to the caller, which
/// decides whether a fallback source exists.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[allow(missing_docs)]
pub enum FetchError {
    /// Timeout or connection error
    #[error("network failure: {message}")]
    Network { message: String },

    /// Credentials missing, or token request/refresh rejected
    #[error("authentication failure: {message}")]
    Auth { message: String },

    /// Non-success envelope code or non-200 status
    #[error("upstream rejected request: code={code} message={message}")]
    UpstreamRejected { code: i64, message: String },

    /// Body is not JSON or lacks the expected fields
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

/// Discriminant of a [`FetchError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// See [`FetchError::Network`]
    Network,
    /// See [`FetchError::Auth`]
    Auth,
    /// See [`FetchError::UpstreamRejected`]
    UpstreamRejected,
    /// See [`FetchError::MalformedResponse`]
    MalformedResponse,
}

impl FetchError {
    /// Create a network failure
    pub fn network<T: ToString>(message: T) -> Self {
        Self::Network {
            message: message.to_string(),
        }
    }

    /// Create an authentication failure
    pub fn auth<T: ToString>(message: T) -> Self {
        Self::Auth {
            message: message.to_string(),
        }
    }

    /// Create an upstream rejection
    pub fn rejected<T: ToString>(code: i64, message: T) -> Self {
        Self::UpstreamRejected {
            code,
            message: message.to_string(),
        }
    }

    /// Create a malformed response failure
    pub fn malformed<T: ToString>(message: T) -> Self {
        Self::MalformedResponse {
            message: message.to_string(),
        }
    }

    /// The kind of failure
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::Network { .. } => FailureKind::Network,
            Self::Auth { .. } => FailureKind::Auth,
            Self::UpstreamRejected { .. } => FailureKind::UpstreamRejected,
            Self::MalformedResponse { .. } => FailureKind::MalformedResponse,
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Auth => write!(f, "auth"),
            Self::UpstreamRejected => write!(f, "upstream_rejected"),
            Self::MalformedResponse => write!(f, "malformed_response"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_error_display() {
        let error = FetchError::rejected(40001, "sign error");
        assert_eq!(
            error.to_string(),
            "upstream rejected request: code=40001 message=sign error"
        );

        let error = FetchError::network("connection refused");
        assert_eq!(error.to_string(), "network failure: connection refused");
    }

    #[test]
    fn fetch_error_kind() {
        assert_eq!(FetchError::network("x").kind(), FailureKind::Network);
        assert_eq!(FetchError::auth("x").kind(), FailureKind::Auth);
        assert_eq!(
            FetchError::rejected(500, "x").kind(),
            FailureKind::UpstreamRejected
        );
        assert_eq!(
            FetchError::malformed("x").kind(),
            FailureKind::MalformedResponse
        );
        assert_eq!(FailureKind::UpstreamRejected.to_string(), "upstream_rejected");
    }
}
