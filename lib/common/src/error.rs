use std::error::Error;
use std::io;

/// An error raised by the body of an iterator or binding function.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum FunctionError {
    /// The function was called with arguments it cannot handle.
    #[error("Invalid arguments for function <{function}>: {message}")]
    InvalidArguments { function: String, message: String },
    /// Error from the OS I/O layer.
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}

impl FunctionError {
    /// Builds an [FunctionError::InvalidArguments] error.
    pub fn invalid_arguments(function: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            function: function.into(),
            message: message.into(),
        }
    }
}

/// An error raised by the external graph-pattern engine while evaluating a select query.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum EngineError {
    /// The engine cannot evaluate the given query.
    #[error("The graph pattern engine does not support {0}")]
    Unsupported(String),
    /// The evaluation of the query failed.
    #[error("Evaluation of the select query failed: {0}")]
    Evaluation(String),
    #[error("{0}")]
    Other(#[source] Box<dyn Error + Send + Sync + 'static>),
}
