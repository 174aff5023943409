use thiserror::Error;

#[derive(Error, Debug)]
pub enum SiftError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid document: {0}")]
    Document(String),

    #[error("line {line}: {message}")]
    Line { line: usize, message: String },
}

pub type Result<T> = std::result::Result<T, SiftError>;
