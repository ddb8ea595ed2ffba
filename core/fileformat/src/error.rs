use std::io;

#[derive(Debug, thiserror::Error)]
pub enum FileFormatError {
    #[error("io error: {0}")]
    Io(io::Error),

    #[error("malformed file-format json: {0}")]
    Schema(String),

    #[error("format registry error: {0}")]
    Format(#[from] format::FormatError),
}
