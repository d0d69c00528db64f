/// Broad failure categories.
///
/// The kind decides the process exit code and whether a failed submission is
/// worth retrying as-is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad command-line or environment configuration.
    Config,
    /// Reference dataset missing or malformed. Fatal at startup.
    DataLoad,
    /// User-correctable input (storey range, out-of-range numbers, log of <= 0).
    InvalidInput,
    /// The geocoder returned zero matches for the query address.
    GeocodingNotFound,
    /// Network failure, timeout or garbled geocoder response.
    GeocodingUnavailable,
    /// Model/scaler artifact missing, undecodable or the wrong shape.
    ModelArtifact,
    /// Terminal and filesystem failures outside the pipeline.
    Runtime,
}

impl ErrorKind {
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Config | ErrorKind::DataLoad => 2,
            ErrorKind::InvalidInput | ErrorKind::GeocodingNotFound => 3,
            ErrorKind::GeocodingUnavailable | ErrorKind::Runtime => 4,
            ErrorKind::ModelArtifact => 5,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ErrorKind::Config => "configuration error",
            ErrorKind::DataLoad => "data load error",
            ErrorKind::InvalidInput => "invalid input",
            ErrorKind::GeocodingNotFound => "address not found",
            ErrorKind::GeocodingUnavailable => "geocoder unavailable",
            ErrorKind::ModelArtifact => "model artifact error",
            ErrorKind::Runtime => "runtime error",
        }
    }
}

#[derive(Clone)]
pub struct AppError {
    kind: ErrorKind,
    message: String,
}

impl AppError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Config, message)
    }

    pub fn data_load(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::DataLoad, message)
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidInput, message)
    }

    pub fn geocoding_not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeocodingNotFound, message)
    }

    pub fn geocoding_unavailable(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::GeocodingUnavailable, message)
    }

    pub fn model_artifact(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ModelArtifact, message)
    }

    pub fn runtime(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Runtime, message)
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn exit_code(&self) -> u8 {
        self.kind.exit_code()
    }

    /// Only transient geocoder failures may succeed when resubmitted unchanged.
    pub fn is_retryable(&self) -> bool {
        self.kind == ErrorKind::GeocodingUnavailable
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind.label(), self.message)
    }
}

impl std::fmt::Debug for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .finish()
    }
}

impl std::error::Error for AppError {}
