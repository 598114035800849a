//! Error types for camnode.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CamnodeError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Process supervision errors
    #[error("Failed to launch {program}: {message}")]
    Launch { program: String, message: String },

    // Streaming errors
    #[error("File not found: {}", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read {}: {message}", path.display())]
    StreamRead { path: PathBuf, message: String },

    // Transport errors
    #[error("Transport unavailable: {message}")]
    TransportUnavailable { message: String },

    #[error("Protocol error: {message}")]
    Protocol { message: String },

    // Cleanup errors
    #[error("Failed to remove {}: {message}", path.display())]
    Cleanup { path: PathBuf, message: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Other(String),
}

impl CamnodeError {
    /// Convenience constructor used wherever the outbound connection is gone.
    pub fn transport_unavailable(message: impl Into<String>) -> Self {
        CamnodeError::TransportUnavailable {
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, CamnodeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_config_file_not_found_display() {
        let error = CamnodeError::ConfigFileNotFound {
            path: "/etc/camnode.toml".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Configuration file not found at /etc/camnode.toml"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = CamnodeError::ConfigInvalidValue {
            key: "CAMNODE_PORT".to_string(),
            message: "not a port number".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for CAMNODE_PORT: not a port number"
        );
    }

    #[test]
    fn test_launch_display() {
        let error = CamnodeError::Launch {
            program: "raspivid".to_string(),
            message: "No such file or directory".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to launch raspivid: No such file or directory"
        );
    }

    #[test]
    fn test_file_not_found_display() {
        let error = CamnodeError::FileNotFound {
            path: PathBuf::from("./output.mp4"),
        };
        assert_eq!(error.to_string(), "File not found: ./output.mp4");
    }

    #[test]
    fn test_stream_read_display() {
        let error = CamnodeError::StreamRead {
            path: PathBuf::from("output.mp4"),
            message: "input/output error".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to read output.mp4: input/output error"
        );
    }

    #[test]
    fn test_transport_unavailable_display() {
        let error = CamnodeError::transport_unavailable("not connected");
        assert_eq!(error.to_string(), "Transport unavailable: not connected");
    }

    #[test]
    fn test_cleanup_display() {
        let error = CamnodeError::Cleanup {
            path: PathBuf::from("output.h264"),
            message: "permission denied".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Failed to remove output.h264: permission denied"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: CamnodeError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: CamnodeError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_source_chain_io() {
        let io_error = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let error: CamnodeError = io_error.into();

        let error_trait: &dyn std::error::Error = &error;
        assert!(error_trait.source().is_some());
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<CamnodeError>();
        assert_sync::<CamnodeError>();
    }
}
