use thiserror::Error;

/// Top-level error type for Folio.
///
/// The chat crate defines its own `ChatError` and converts from this type so
/// that `?` works across the crate boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum FolioError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },
}

impl From<toml::de::Error> for FolioError {
    fn from(err: toml::de::Error) -> Self {
        FolioError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for FolioError {
    fn from(err: toml::ser::Error) -> Self {
        FolioError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for FolioError {
    fn from(err: serde_json::Error) -> Self {
        FolioError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Folio operations.
pub type Result<T> = std::result::Result<T, FolioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = FolioError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");

        let err = FolioError::InvalidValue {
            field: "theme".into(),
            value: "sepia".into(),
        };
        assert_eq!(err.to_string(), "Invalid value for theme: sepia");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let folio_err: FolioError = io_err.into();
        assert!(matches!(folio_err, FolioError::Io(_)));
        assert!(folio_err.to_string().contains("file not found"));
    }

    #[test]
    fn test_toml_error_conversion() {
        let err = toml::from_str::<toml::Value>("= broken").unwrap_err();
        let folio_err: FolioError = err.into();
        assert!(matches!(folio_err, FolioError::Config(_)));
    }

    #[test]
    fn test_json_error_conversion() {
        let err = serde_json::from_str::<Vec<i64>>("[1, 2").unwrap_err();
        let folio_err: FolioError = err.into();
        assert!(matches!(folio_err, FolioError::Serialization(_)));
        assert!(folio_err.to_string().starts_with("Serialization error:"));
    }
}
