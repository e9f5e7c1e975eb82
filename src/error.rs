//! Error types for the minitree crate

use thiserror::Error;

/// Main error type for the minitree crate
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum Error {
    #[error("no legal moves available from terminal position {position}")]
    NoLegalMoves { position: String },

    #[error("invalid transition from {parent}: {reason}")]
    InvalidTransition { parent: String, reason: String },

    #[error("illegal move {mv} from position {position}")]
    IllegalMove { mv: String, position: String },

    #[error("outcome path has no positions")]
    EmptyPath,

    #[error("position {position} has no node in the game tree")]
    UnknownPosition { position: String },

    #[error("position {target} is not one move away from {from}")]
    UnreachablePosition { from: String, target: String },

    #[error("invalid configuration: {message}")]
    InvalidConfiguration { message: String },

    #[error("cannot parse move '{value}' in record {record}")]
    ParseMove { value: String, record: usize },

    #[error("node {position} has {visits} visits but {tallied} tallied outcomes")]
    CorruptTally {
        position: String,
        visits: u64,
        tallied: u64,
    },

    #[error("progress bar template error: {message}")]
    ProgressBarTemplate { message: String },

    #[error("shared game tree lock was poisoned by a panicking game")]
    TreePoisoned,

    #[error("failed to build worker pool: {0}")]
    ThreadPool(#[from] rayon::ThreadPoolBuildError),

    #[error("failed to {operation}: {source}")]
    Io {
        operation: String,
        #[source]
        source: std::io::Error,
    },

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("config error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Convenience type alias for Results using the crate's Error type
pub type Result<T> = std::result::Result<T, Error>;

impl From<std::io::Error> for Error {
    fn from(source: std::io::Error) -> Self {
        Error::Io {
            operation: "IO operation".to_string(),
            source,
        }
    }
}

impl Error {
    pub(crate) fn no_legal_moves(position: &impl std::fmt::Debug) -> Self {
        Error::NoLegalMoves {
            position: format!("{position:?}"),
        }
    }

    pub(crate) fn unknown_position(position: &impl std::fmt::Debug) -> Self {
        Error::UnknownPosition {
            position: format!("{position:?}"),
        }
    }

    pub(crate) fn illegal_move(mv: &impl std::fmt::Debug, position: &impl std::fmt::Debug) -> Self {
        Error::IllegalMove {
            mv: format!("{mv:?}"),
            position: format!("{position:?}"),
        }
    }
}
