use std::fs::{File as StdFile, OpenOptions};
use std::io::{Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{FormatError, Result};
use crate::format::Format;
use crate::mode::Mode;

/// On-disk byte source.
///
/// READ mode loads the file fully into an owned buffer up front; no lower
/// layer in this stack provides mmap-style zero-copy access, so `next_chunk`
/// simply slices the owned buffer and advances a read position.
pub struct File {
    mode: Mode,
    handle: Option<StdFile>,
    read_buf: Vec<u8>,
    read_pos: usize,
    written: u64,
}

impl File {
    pub fn open_read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        Ok(File {
            mode: Mode::Read,
            handle: None,
            read_buf: bytes,
            read_pos: 0,
            written: 0,
        })
    }

    pub fn open_write<P: AsRef<Path>>(path: P) -> Result<Self> {
        let handle = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)?;
        Ok(File {
            mode: Mode::Write,
            handle: Some(handle),
            read_buf: Vec::new(),
            read_pos: 0,
            written: 0,
        })
    }
}

impl Format for File {
    fn type_name(&self) -> &'static str {
        "file"
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn next_chunk(&mut self, requested: usize) -> Result<Vec<u8>> {
        if self.mode != Mode::Read {
            return Err(FormatError::ReadOnWriteFormat);
        }
        let available = self.read_buf.len() - self.read_pos;
        let take = if requested == 0 {
            available
        } else {
            requested.min(available)
        };
        let chunk = self.read_buf[self.read_pos..self.read_pos + take].to_vec();
        self.read_pos += take;
        Ok(chunk)
    }

    fn has_more_data(&self) -> bool {
        match self.mode {
            Mode::Read => self.read_pos < self.read_buf.len(),
            Mode::Write => false,
        }
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize> {
        if self.mode != Mode::Write {
            return Err(FormatError::WriteOnReadFormat);
        }
        let handle = self.handle.as_mut().expect("write mode always has a handle");
        handle.write_all(chunk)?;
        self.written += chunk.len() as u64;
        Ok(chunk.len())
    }

    fn overwrite(&mut self, offset: u64, chunk: &[u8]) -> Result<usize> {
        if self.mode != Mode::Write {
            return Err(FormatError::WriteOnReadFormat);
        }
        if offset + chunk.len() as u64 > self.written {
            return Err(FormatError::OverwriteOutOfBounds {
                offset,
                len: chunk.len(),
                written: self.written,
            });
        }
        let handle = self.handle.as_mut().expect("write mode always has a handle");
        let restore = handle.stream_position()?;
        handle.seek(SeekFrom::Start(offset))?;
        handle.write_all(chunk)?;
        handle.seek(SeekFrom::Start(restore))?;
        Ok(chunk.len())
    }
}
