//! Error types for the core library

use thiserror::Error;

/// The core error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Error {
    /// Keyed table error
    #[error("Table error: {0}")]
    Table(#[from] TableError),

    /// Singleton registry error
    #[error("Singleton registry error: {0}")]
    Registry(#[from] RegistryError),

    /// Command dispatch error
    #[error("Command error: {0}")]
    Command(#[from] CommandError),

    /// Generic error with message
    #[error("{0}")]
    Message(Box<str>),
}

/// Result type alias
pub type Result<T> = core::result::Result<T, Error>;

/// Keyed table errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    /// Key absent from the derived lookup map
    #[error("Key not found: {0}")]
    KeyNotFound(String),

    /// Entry index outside `[0, len)`
    #[error("Index out of range: 0 <= {index} < {len}")]
    IndexOutOfRange { index: isize, len: usize },

    /// Duplicate key rejected by strict construction
    #[error("Duplicate key: {0}")]
    DuplicateKey(String),
}

/// Singleton registry errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// A different live instance already owns the slot
    #[error("Singleton already registered: {0}")]
    AlreadyRegistered(Box<str>),

    /// Nothing registered for the type
    #[error("Singleton not found: {0}")]
    NotFound(Box<str>),
}

/// Command dispatch errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// No handler registered under the name
    #[error("Command not found: {0}")]
    NotFound(Box<str>),

    /// Name already taken by another handler
    #[error("Command already registered: {0}")]
    AlreadyRegistered(Box<str>),
}

impl From<&str> for Error {
    fn from(s: &str) -> Self {
        Error::Message(s.into())
    }
}

impl From<String> for Error {
    fn from(s: String) -> Self {
        Error::Message(s.into_boxed_str())
    }
}
