use thiserror::Error;

/// Feil fra kjernen. Avvisning av en økt er IKKE en feil (se `VerificationStatus`).
#[derive(Debug, Error)]
pub enum CoreError {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    /// JSON-feil med sti til feltet som feilet (serde_path_to_error)
    #[error("json parse at {path}: {message}")]
    Json { path: String, message: String },

    #[error("commitment not found: {0}")]
    CommitmentNotFound(String),

    #[error("commitment {0} is closed")]
    CommitmentClosed(String),

    #[error("session already in progress: {0}")]
    SessionInProgress(String),

    #[error("no session in progress")]
    NoSessionInProgress,

    #[error("store lock poisoned")]
    LockPoisoned,
}

impl CoreError {
    pub fn json(err: serde_path_to_error::Error<serde_json::Error>) -> Self {
        CoreError::Json {
            path: err.path().to_string(),
            message: err.inner().to_string(),
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Json {
            path: ".".into(),
            message: err.to_string(),
        }
    }
}

/// Verifikasjonstjenesten kunne ikke nås / svarte ubrukelig.
/// Holdes adskilt fra "avvist" slik at kaller aldri blander de to.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("verification unavailable: {reason}")]
pub struct VerificationUnavailable {
    pub reason: String,
}

impl VerificationUnavailable {
    pub fn new(reason: impl Into<String>) -> Self {
        Self { reason: reason.into() }
    }
}

/// Parse JSON med sti-info i feilmeldingen.
pub fn parse_json<T: serde::de::DeserializeOwned>(txt: &str) -> Result<T, CoreError> {
    let mut de = serde_json::Deserializer::from_str(txt);
    serde_path_to_error::deserialize(&mut de).map_err(CoreError::json)
}
