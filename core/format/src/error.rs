use std::io;

/// Errors produced anywhere along a format stack.
///
/// A read failure never tears down the stack: callers may retry the next
/// chunk to resynchronize over a corrupted container.
#[derive(Debug, thiserror::Error)]
pub enum FormatError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("format mismatch: {0}")]
    Mismatch(String),

    #[error("format is read-only")]
    WriteOnReadFormat,

    #[error("format is write-only")]
    ReadOnWriteFormat,

    #[error("fixed-size buffer is full")]
    BufferFull,

    #[error("capacity overflow")]
    CapacityOverflow,

    #[error("overwrite out of bounds: offset {offset} + len {len} > written {written}")]
    OverwriteOutOfBounds {
        offset: u64,
        len: usize,
        written: u64,
    },

    #[error("operation not supported by this format")]
    Unsupported,

    #[error("no handler registered for type {0:?}")]
    UnknownType(String),

    #[error("type name too long (max 20 bytes): {0:?}")]
    TypeNameTooLong(String),

    #[error("type {0:?} already registered")]
    DuplicateType(String),

    #[error("end of stream")]
    EndOfStream,
}

pub type Result<T> = std::result::Result<T, FormatError>;
