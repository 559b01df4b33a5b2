//! Error types for the parameter injector

use axum::http::StatusCode;
use thiserror::Error;

use crate::resolver::ParameterStoreError;

#[derive(Error, Debug)]
pub enum Error {
    /// The webhook is registered for a kind that has no handler
    #[error("unsupported Kind: {0}")]
    UnsupportedKind(String),

    /// The admission request carried no object to mutate
    #[error("admission request contains no object")]
    MissingObject,

    /// The object does not match the schema of its declared kind
    #[error("unable to decode {kind}: {source}")]
    Decode {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// A parameter could not be fetched from the store
    #[error("failed to retrieve SSM parameter {name:?}: {source}")]
    Resolution {
        name: String,
        #[source]
        source: ParameterStoreError,
    },

    /// The mutated object could not be re-encoded
    #[error("unable to marshal modified {kind} to JSON: {source}")]
    Serialization {
        kind: String,
        #[source]
        source: serde_json::Error,
    },

    /// The patch could not be attached to the admission response
    #[error("failed to serialize patch: {0}")]
    Patch(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("TLS error: {0}")]
    TlsError(String),

    #[error("Server error: {0}")]
    ServerError(String),
}

impl Error {
    /// HTTP-style status reported in the denied AdmissionResponse.
    ///
    /// Problems with the request itself are client errors; everything that
    /// goes wrong while resolving or re-encoding is a server error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::UnsupportedKind(_) | Error::MissingObject | Error::Decode { .. } => {
                StatusCode::BAD_REQUEST
            }
            Error::Resolution { .. }
            | Error::Serialization { .. }
            | Error::Patch(_)
            | Error::ConfigError(_)
            | Error::TlsError(_)
            | Error::ServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    fn decode_error() -> serde_json::Error {
        serde_json::from_str::<u32>("not a number").unwrap_err()
    }

    #[test]
    fn client_errors_map_to_bad_request() {
        assert_eq!(
            Error::UnsupportedKind("Deployment".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(Error::MissingObject.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            Error::Decode {
                kind: "Pod".to_string(),
                source: decode_error(),
            }
            .status_code(),
            StatusCode::BAD_REQUEST
        );
    }

    #[test]
    fn resolution_and_serialization_map_to_internal_error() {
        let resolution = Error::Resolution {
            name: "app/db/pass".to_string(),
            source: ParameterStoreError::NotFound,
        };
        assert_eq!(
            resolution.status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            Error::Serialization {
                kind: "Pod".to_string(),
                source: decode_error(),
            }
            .status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn resolution_error_names_the_parameter() {
        let err = Error::Resolution {
            name: "app/db/pass".to_string(),
            source: ParameterStoreError::Backend("AccessDeniedException".to_string()),
        };
        let message = err.to_string();
        assert!(message.contains("app/db/pass"), "got: {message}");
        assert!(message.contains("AccessDeniedException"), "got: {message}");
    }

    #[test]
    fn unsupported_kind_names_the_kind() {
        assert_eq!(
            Error::UnsupportedKind("Deployment".to_string()).to_string(),
            "unsupported Kind: Deployment"
        );
    }
}
