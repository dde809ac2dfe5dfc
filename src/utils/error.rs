// src/utils/error.rs
use std::fmt;
use thiserror::Error;

/// A lookup that legitimately came back empty. Never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotFound {
    #[error("Ticker {0} is not in the issuer directory")]
    Ticker(String),

    #[error("No 10-K in the recent filings of CIK {0}")]
    AnnualReport(String),

    #[error("No 10-K document row in filing index {0}")]
    PrimaryDocument(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RetrievalError {
    #[error("Network request to {url} failed: {message}")]
    Network { url: String, message: String },

    #[error("HTTP error {status} for URL: {url}")]
    Http { status: u16, url: String }, // e.g., 404 Not Found, 403 Forbidden

    #[error("Failed to decode response from {url}: {message}")]
    Decode { url: String, message: String },
}

impl RetrievalError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractError {
    #[error("Conversion service returned HTTP {status}: {message}")]
    Service { status: u16, message: String },

    #[error("Conversion service request failed: {0}")]
    Transport(String),

    #[error("Section {0} missing from conversion response")]
    MissingSection(String),

    #[error("Malformed conversion response: {0}")]
    Malformed(String),
}

impl ExtractError {
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Service { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Failures worth another attempt: transport errors, 429 and 5xx.
pub trait Transient {
    fn is_transient(&self) -> bool;
}

fn is_transient_status(status: u16) -> bool {
    status == 429 || (500..600).contains(&status)
}

impl Transient for RetrievalError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Network { .. } => true,
            Self::Http { status, .. } => is_transient_status(*status),
            Self::Decode { .. } => false,
        }
    }
}

impl Transient for ExtractError {
    fn is_transient(&self) -> bool {
        match self {
            Self::Transport(_) => true,
            Self::Service { status, .. } => is_transient_status(*status),
            Self::MissingSection(_) | Self::Malformed(_) => false,
        }
    }
}

// Everything a single pipeline stage can fail with
#[derive(Error, Debug)]
pub enum EdgarError {
    #[error(transparent)]
    NotFound(#[from] NotFound),

    #[error(transparent)]
    Retrieval(#[from] RetrievalError),

    #[error(transparent)]
    Extraction(#[from] ExtractError),

    #[error("Issuer directory unavailable: {0}")]
    DirectoryUnavailable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    Retrieval,
    Extraction,
    DirectoryUnavailable,
}

impl ErrorKind {
    /// Process exit code reported when a run fails with this kind of error.
    pub fn exit_code(self) -> u8 {
        match self {
            Self::NotFound => 3,
            Self::Retrieval => 4,
            Self::Extraction => 5,
            Self::DirectoryUnavailable => 6,
        }
    }
}

impl EdgarError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Retrieval(_) => ErrorKind::Retrieval,
            Self::Extraction(_) => ErrorKind::Extraction,
            Self::DirectoryUnavailable(_) => ErrorKind::DirectoryUnavailable,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Retrieval(e) => e.status(),
            Self::Extraction(e) => e.status(),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    TickerResolver,
    FilingLocator,
    DocumentResolver,
    StatementExtractor,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::TickerResolver => "Ticker resolver",
            Self::FilingLocator => "Filing locator",
            Self::DocumentResolver => "Document resolver",
            Self::StatementExtractor => "Statement extractor",
        };
        f.write_str(name)
    }
}

/// A stage failure, tagged with the stage that produced it.
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: EdgarError,
}

impl PipelineError {
    pub fn new(stage: Stage, source: impl Into<EdgarError>) -> Self {
        Self { stage, source: source.into() }
    }

    pub fn kind(&self) -> ErrorKind {
        self.source.kind()
    }

    pub fn status(&self) -> Option<u16> {
        self.source.status()
    }
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error), // Automatically convert IO errors

    #[error("HTTP client setup failed: {0}")]
    Client(#[from] reqwest::Error),

    #[error("EDGAR interaction failed: {0}")]
    Edgar(#[from] EdgarError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Failed to render output: {0}")]
    Output(#[from] serde_json::Error),
}

impl AppError {
    /// 2 for bad configuration, the error kind's code for EDGAR failures, 1 otherwise.
    pub fn exit_code(&self) -> u8 {
        match self {
            Self::Config(_) => 2,
            Self::Edgar(e) => e.kind().exit_code(),
            Self::Pipeline(e) => e.kind().exit_code(),
            _ => 1,
        }
    }
}
