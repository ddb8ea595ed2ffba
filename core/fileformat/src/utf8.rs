use std::path::Path;

use crate::error::FileFormatError;

/// Reads `path` fully and checks whether its bytes form valid UTF-8.
pub fn utf8_validate<P: AsRef<Path>>(path: P) -> Result<bool, FileFormatError> {
    let bytes = std::fs::read(path).map_err(FileFormatError::Io)?;
    Ok(std::str::from_utf8(&bytes).is_ok())
}
