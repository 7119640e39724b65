use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid locus {value:?}: {reason}")]
    InvalidLocus { value: String, reason: String },

    #[error("invalid marker on line {line}: {reason}")]
    InvalidMarker { line: u64, reason: String },

    #[error("schema mismatch in {}: {reason}", .path.display())]
    SchemaMismatch { path: PathBuf, reason: String },

    #[error("{}, line {line}: {source}", .path.display())]
    AtRecord {
        path: PathBuf,
        line: u64,
        #[source]
        source: Box<Error>,
    },

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),

    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Short machine-readable name for the error category
    pub fn error_type(&self) -> &'static str {
        match self {
            Error::Config(_) => "ConfigurationError",
            Error::NotFound(_) => "NotFound",
            Error::InvalidLocus { .. }
            | Error::InvalidMarker { .. }
            | Error::SchemaMismatch { .. }
            | Error::Csv(_) => "ParseError",
            Error::AtRecord { source, .. } => source.error_type(),
            Error::Io(_) | Error::Database(_) | Error::Internal(_) => "InternalError",
        }
    }

    /// Process exit status for a run that failed with this error.
    ///
    /// Configuration problems use 2, matching clap's usage errors.
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) => 2,
            Error::AtRecord { source, .. } => source.exit_code(),
            _ => 1,
        }
    }

    /// Attach the source file and line to a per-record error
    pub fn at_record(self, path: impl Into<PathBuf>, line: u64) -> Self {
        Error::AtRecord {
            path: path.into(),
            line,
            source: Box::new(self),
        }
    }
}
