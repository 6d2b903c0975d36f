use thiserror::Error;

#[derive(Error, Debug)]
pub enum DbotError {
    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Bot error: {0}")]
    Bot(String),

    #[error("Handler error: {0}")]
    Handler(#[from] HandlerError),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Unknown error: {0}")]
    Unknown(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HandlerError {
    /// Command token outside `[a-z0-9_]{1,32}` after lowercasing.
    #[error("Command is not a valid bot command: {0:?}")]
    InvalidCommand(String),

    #[error("Invalid deep link: {0}")]
    InvalidDeepLink(String),

    #[error("Unauthorized access")]
    Unauthorized,
}

pub type Result<T> = std::result::Result<T, DbotError>;
