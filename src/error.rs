// SPDX-License-Identifier: AGPL-3.0-or-later
//! Error taxonomy for the query engine.
//!
//! Every public engine operation returns a [`Result`]. Callers building an
//! HTTP layer on top of this crate map [`EngineError::status_code`] onto the
//! wire status and [`EngineError::to_error_envelope`] onto the response
//! body; the crate itself never touches HTTP.

use thiserror::Error;

/// The three error kinds the engine can surface.
///
/// `BadRequest` is caller fault (out-of-range lineno, unknown axis,
/// malformed fence point, ...). `Runtime` is a backing-store failure.
/// `NullPtr` is an invariant breach at the engine boundary and should only
/// ever be reachable by a programming error, never by user input.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Runtime(String),

    #[error("invariant breach: {0}")]
    NullPtr(String),
}

impl EngineError {
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::BadRequest(msg.into())
    }

    pub fn runtime(msg: impl Into<String>) -> Self {
        Self::Runtime(msg.into())
    }

    pub fn nullptr(msg: impl Into<String>) -> Self {
        Self::NullPtr(msg.into())
    }

    /// HTTP status a caller should map this error onto.
    pub fn status_code(&self) -> u16 {
        match self {
            EngineError::BadRequest(_) => 400,
            EngineError::Runtime(_) | EngineError::NullPtr(_) => 500,
        }
    }

    /// The `{"error": "<message>"}` envelope described in the wire contract.
    pub fn to_error_envelope(&self) -> serde_json::Value {
        serde_json::json!({ "error": self.to_string() })
    }
}

/// Failure from a [`crate::datasource::VolumeDataSource`] implementation.
///
/// Kept distinct from [`EngineError`] so a backing-store implementor isn't
/// coupled to the engine's error taxonomy; the engine converts these at the
/// trait seam.
#[derive(Debug, Error)]
pub enum DataSourceError {
    #[error("{0}")]
    Io(String),

    #[error("unsupported volume format: {0}")]
    UnsupportedFormat(String),
}

impl From<DataSourceError> for EngineError {
    fn from(err: DataSourceError) -> Self {
        match err {
            DataSourceError::Io(msg) => {
                EngineError::runtime(format!("Failed to read from VDS: {msg}"))
            }
            DataSourceError::UnsupportedFormat(msg) => {
                EngineError::runtime(format!("Failed to read from VDS: {msg}"))
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, EngineError>;
