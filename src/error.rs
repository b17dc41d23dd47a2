//! Error type shared by every certificate operation.

use std::path::PathBuf;

use openssl::error::ErrorStack;

/// The certificate subsystem error type.
#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("File operation failed for '{}': {reason}", .path.display())]
    FileOperation { path: PathBuf, reason: String },

    #[error("Output directory '{}' does not exist", .0.display())]
    DirectoryNotFound(PathBuf),

    #[error("Failed to parse certificate or key: {0}")]
    Parse(#[source] ErrorStack),

    #[error("Failed to decode certificate extensions: {0}")]
    Decode(String),

    #[error("Cryptographic operation failed: {0}")]
    Crypto(#[from] ErrorStack),

    #[error("Failed to write '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CertError {
    pub(crate) fn missing_file(path: impl Into<PathBuf>) -> Self {
        CertError::FileOperation {
            path: path.into(),
            reason: "file does not exist".to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_names_path() {
        let err = CertError::missing_file("/nowhere/device-cert.pem");
        let msg = err.to_string();
        assert!(msg.contains("/nowhere/device-cert.pem"));
        assert!(msg.contains("does not exist"));
    }

    #[test]
    fn test_directory_not_found_message() {
        let err = CertError::DirectoryNotFound(PathBuf::from("/tmp/missing-out"));
        assert_eq!(
            err.to_string(),
            "Output directory '/tmp/missing-out' does not exist"
        );
    }
}
