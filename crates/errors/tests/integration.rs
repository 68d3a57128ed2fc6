//! Integration tests for error types

#[cfg(test)]
mod tests {
    use otadex_errors::*;

    #[test]
    fn test_error_conversion() {
        let backend_err = BackendError::CommandFailed {
            command: "dexopt /data/app/a/base.apk".into(),
            status: 2,
        };
        let err: Error = backend_err.into();
        assert!(matches!(err, Error::Backend(_)));
    }

    #[test]
    fn test_error_display() {
        let err = SessionError::NotPrepared {
            operation: "next_dexopt_command()".into(),
        };
        assert_eq!(
            err.to_string(),
            "next_dexopt_command() called before prepare()"
        );

        let err = ConfigError::InvalidThreshold {
            volume: "/data".into(),
        };
        assert_eq!(err.to_string(), "invalid low space threshold for /data");
    }

    #[test]
    fn test_error_clone() {
        let err = StorageError::VolumeQueryFailed {
            path: "/data".into(),
            message: "no such device".into(),
        };
        let cloned = err.clone();
        assert_eq!(err.to_string(), cloned.to_string());
    }

    #[test]
    fn test_retryable_classification() {
        let err: Error = BackendError::ConnectionFailed {
            message: "socket closed".into(),
        }
        .into();
        assert!(err.is_retryable());
        assert_eq!(err.user_hint(), Some("Check that the execution backend is running."));

        let err: Error = BackendError::UnsupportedOperation {
            backend: "recording".into(),
            operation: "merge_profiles".into(),
        }
        .into();
        assert!(!err.is_retryable());
        assert_eq!(err.user_code(), Some("backend.unsupported_operation"));

        let err: Error = SessionError::RelocationDuringSession.into();
        assert!(!err.is_retryable());
        assert!(!err.is_protocol_misuse());
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err: Error = io.into();
        assert!(matches!(
            err,
            Error::Io {
                kind: std::io::ErrorKind::PermissionDenied,
                path: None,
                ..
            }
        ));
        assert_eq!(err.user_code(), Some("error.io"));
    }
}
