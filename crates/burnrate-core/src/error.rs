use thiserror::Error;

#[derive(Error, Debug)]
pub enum BurnRateError {
    #[error("stream error: {0}")]
    Stream(String),

    #[error("failed to list models: {0}")]
    Catalog(String),

    #[error("no models available")]
    NoModels,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Config error: {0}")]
    Config(String),
}

/// Coarse classification callers use to decide whether a failure aborts a
/// run, aborts the whole benchmark, or only skips a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Stream,
    Catalog,
    Persistence,
    Config,
}

impl BurnRateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Stream(_) => ErrorKind::Stream,
            Self::Catalog(_) | Self::NoModels => ErrorKind::Catalog,
            Self::Io(_) | Self::Json(_) => ErrorKind::Persistence,
            Self::Config(_) => ErrorKind::Config,
        }
    }
}

pub type Result<T> = std::result::Result<T, BurnRateError>;
