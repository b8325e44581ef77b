use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One failed entry of a batched call.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct BatchFailure {
    pub url: String,
    pub code: i64,
    pub message: String,
}

#[derive(Clone, Debug, Error, PartialEq)]
#[non_exhaustive]
pub enum ClientError {
    #[error("http error: status {code}")]
    Http { code: u16, body: String },
    #[error("malformed rpc response")]
    MalformedResponse { raw_body: String },
    #[error("rpc error [{code}]: {message}")]
    Rpc { code: i64, message: String },
    #[error("rpc batch error: {} of the submitted calls failed", failures.len())]
    RpcBatch { failures: Vec<BatchFailure> },
    #[error("missing credentials: username and password must both be set")]
    MissingCredentials,
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("transport error: {0}")]
    Transport(String),
}

impl ClientError {
    pub fn malformed(raw_body: impl Into<String>) -> Self {
        Self::MalformedResponse { raw_body: raw_body.into() }
    }

    pub fn invalid_argument(reason: impl Into<String>) -> Self {
        Self::InvalidArgument(reason.into())
    }

    /// Vendor status code carried by a single-call failure.
    pub fn rpc_code(&self) -> Option<i64> {
        match self {
            Self::Rpc { code, .. } => Some(*code),
            _ => None,
        }
    }

    pub fn batch_failures(&self) -> &[BatchFailure] {
        match self {
            Self::RpcBatch { failures } => failures.as_slice(),
            _ => &[],
        }
    }

    pub fn is_http(&self) -> bool {
        matches!(self, Self::Http { .. })
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rpc_error_formats_code_and_message() {
        let err = ClientError::Rpc { code: -11, message: "No permission".into() };
        assert_eq!(err.to_string(), "rpc error [-11]: No permission");
        assert_eq!(err.rpc_code(), Some(-11));
        assert!(err.batch_failures().is_empty());
    }

    #[test]
    fn batch_error_reports_failure_count() {
        let err = ClientError::RpcBatch {
            failures: vec![
                BatchFailure { url: "/a".into(), code: -2, message: "exists".into() },
                BatchFailure { url: "/b".into(), code: -3, message: "missing".into() },
            ],
        };
        assert!(err.to_string().contains("2 of the submitted calls failed"));
        assert_eq!(err.batch_failures()[1].url, "/b");
        assert_eq!(err.rpc_code(), None);
    }

    #[test]
    fn http_error_keeps_body_out_of_display() {
        let err = ClientError::Http { code: 502, body: "<html>gateway</html>".into() };
        assert!(err.is_http());
        assert_eq!(err.to_string(), "http error: status 502");
    }
}
