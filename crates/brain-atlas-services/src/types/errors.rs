// Copyright 2025 Neuraville Inc.
// SPDX-License-Identifier: Apache-2.0

/*!
Service layer error types.

Errors are classified so callers can decide between retrying, recording
an error entry, or dropping a single dataset.
*/

use thiserror::Error;

/// Service layer errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ServiceError {
    /// Non-success HTTP response
    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    /// Connection-level failure (DNS, refused, reset)
    #[error("Transport error: {0}")]
    Transport(String),

    /// A single call exceeded its timeout
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The content extractor failed on an asset
    #[error("Extraction failed: {0}")]
    Extraction(String),

    /// Resource not found
    #[error("Not found: {resource} with id '{id}'")]
    NotFound { resource: String, id: String },
}

impl ServiceError {
    /// Rate limiting, server errors, and connection failures are worth retrying
    pub fn is_transient(&self) -> bool {
        match self {
            ServiceError::Http { status, .. } => *status == 429 || *status >= 500,
            ServiceError::Transport(_) | ServiceError::Timeout(_) => true,
            _ => false,
        }
    }

    pub(crate) fn from_reqwest(err: reqwest::Error, url: &str) -> Self {
        if err.is_timeout() {
            ServiceError::Timeout(url.to_string())
        } else if err.is_decode() {
            ServiceError::InvalidResponse(format!("{}: {}", url, err))
        } else {
            ServiceError::Transport(format!("{}: {}", url, err))
        }
    }
}

/// Result type for service operations
pub type ServiceResult<T> = Result<T, ServiceError>;
