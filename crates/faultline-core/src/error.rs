//! Unified error type for the fault-injection core.
//!
//! One enum covers every failure the control plane or data plane can
//! surface. Control-API handlers map variants to HTTP statuses; the data
//! plane treats `Decode` as non-fatal and everything else as fail-open.

use serde::{Deserialize, Serialize};

/// Unified error type for all Faultline operations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum FaultlineError {
    /// Unknown scenario name.
    #[error("Not found: {message}")]
    NotFound {
        /// Error message describing what was not found
        message: String,
    },

    /// Malformed or incomplete verification / enable request.
    #[error("Invalid argument: {message}")]
    InvalidArgument {
        /// Error message describing the invalid input
        message: String,
    },

    /// Payload was not valid wire format. Non-fatal: logged and excluded
    /// from history, never an error on the proxy path.
    #[error("Decode error: {message}")]
    Decode {
        /// Error message describing the decode failure
        message: String,
    },

    /// Unexpected internal fault.
    #[error("Internal error: {message}")]
    Internal {
        /// Error message describing the internal error
        message: String,
    },
}

impl FaultlineError {
    /// Create a not found error
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::NotFound {
            message: message.into(),
        }
    }

    /// Create an invalid argument error
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: message.into(),
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

/// Result alias used throughout the crate.
pub type FaultlineResult<T> = Result<T, FaultlineError>;
