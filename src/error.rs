//! This module defines all error types used throughout the crate.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Main error type for the crate
#[derive(Error, Debug)]
pub enum Error {
    /// IO errors (file not found, permission denied, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Machine definition parsing errors
    #[error("Definition parsing error in {file:?}: {message}")]
    DefinitionParse { file: PathBuf, message: String },

    /// Machine definition validation errors
    #[error("Invalid machine definition: {0}")]
    Definition(String),

    /// Two states in the state set share a name
    #[error("Duplicate state name: {0}")]
    DuplicateState(String),

    /// A symbol appears more than once in the alphabet
    #[error("Duplicate alphabet symbol: {0}")]
    DuplicateSymbol(String),

    /// The initial state is not part of the state set
    #[error("Initial state {0:?} is not a member of the state set")]
    UnknownInitialState(String),

    /// A (state, symbol) pair was mapped to two different destinations
    #[error("Conflicting transition for ({state}, {symbol}): already mapped to {existing}")]
    ConflictingTransition {
        state: String,
        symbol: String,
        existing: String,
    },

    /// A state's output action failed
    #[error("Output action for state {state} failed: {source}")]
    Action {
        state: String,
        #[source]
        source: Box<Error>,
    },

    /// Output or report sink errors
    #[error("Sink error: {0}")]
    Sink(String),

    /// Generic error with custom message
    #[error("{0}")]
    Custom(String),

    /// Wrapped anyhow errors
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Create a custom error with a message
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a definition validation error
    pub fn definition(msg: impl Into<String>) -> Self {
        Self::Definition(msg.into())
    }

    /// Create a sink error
    pub fn sink(msg: impl Into<String>) -> Self {
        Self::Sink(msg.into())
    }

    /// Wrap an action failure with the name of the state that raised it
    pub fn action(state: impl Into<String>, source: Error) -> Self {
        Self::Action {
            state: state.into(),
            source: Box::new(source),
        }
    }

    /// Check if error was detected while configuring a machine
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Error::Config(_)
                | Error::DefinitionParse { .. }
                | Error::Definition(_)
                | Error::DuplicateState(_)
                | Error::DuplicateSymbol(_)
                | Error::UnknownInitialState(_)
                | Error::ConflictingTransition { .. }
        )
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::DefinitionParse {
            file: PathBuf::from("unknown"),
            message: err.to_string(),
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Sink(format!("JSON error: {}", err))
    }
}

// Helper macros for creating errors

/// Create a custom error with formatting
#[macro_export]
macro_rules! custom_error {
    ($($arg:tt)*) => {
        $crate::error::Error::Custom(format!($($arg)*))
    };
}

/// Bail with a custom error message
#[macro_export]
macro_rules! bail {
    ($($arg:tt)*) => {
        return Err($crate::custom_error!($($arg)*))
    };
}

/// Ensure a condition is true or return error
#[macro_export]
macro_rules! ensure {
    ($cond:expr, $($arg:tt)*) => {
        if !($cond) {
            $crate::bail!($($arg)*);
        }
    };
}
