use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to start stream source `{program}`: {source}")]
    SourceSpawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("stream source `{program}` exited with {status}: {stderr}")]
    SourceExit {
        program: String,
        status: ExitStatus,
        stderr: String,
    },

    #[error("failed to read input {}: {source}", .path.display())]
    InputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed leaf record on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to read leaf record on line {line}: {source}")]
    ReadLine {
        line: usize,
        #[source]
        source: io::Error,
    },

    #[error("input document is not valid JSON: {0}")]
    Document(#[source] serde_json::Error),

    #[error("failed to open output {}: {source}", .path.display())]
    OutputOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV write failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("row field `{0}` is not in the header")]
    UnknownField(String),

    #[error("row cache: {0}")]
    Cache(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    pub fn cache(message: impl Into<String>) -> Self {
        Self::Cache(message.into())
    }
}
