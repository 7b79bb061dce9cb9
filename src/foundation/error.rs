pub type BoothResult<T> = Result<T, BoothError>;

/// Coarse classification used at the request boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    InvalidInput,
    AssetMissing,
    EncodingFailure,
    IoFailure,
    Validation,
    Internal,
}

#[derive(thiserror::Error, Debug)]
pub enum BoothError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("asset missing: {0}")]
    AssetMissing(String),

    #[error("encoding failure: {0}")]
    Encoding(String),

    #[error("io failure: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("validation error: {0}")]
    Validation(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl BoothError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn asset_missing(msg: impl Into<String>) -> Self {
        Self::AssetMissing(msg.into())
    }

    pub fn encoding(msg: impl Into<String>) -> Self {
        Self::Encoding(msg.into())
    }

    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::AssetMissing(_) => ErrorKind::AssetMissing,
            Self::Encoding(_) => ErrorKind::EncodingFailure,
            Self::Io { .. } => ErrorKind::IoFailure,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Other(_) => ErrorKind::Internal,
        }
    }
}

/// Structured failure payload handed back to the caller of a compose request.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub kind: ErrorKind,
    pub details: String,
}

impl From<&BoothError> for ErrorResponse {
    fn from(err: &BoothError) -> Self {
        let error = match err.kind() {
            ErrorKind::InvalidInput | ErrorKind::Validation => "request rejected",
            _ => "failed to process photos",
        };
        Self {
            error: error.to_string(),
            kind: err.kind(),
            details: format!("{err:#}"),
        }
    }
}
