use crate::end_ptr::EndPtrTracker;
use crate::error::{FormatError, Result};
use crate::format::Format;
use crate::mode::Mode;

/// Growth policy for a WRITE memory source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriteCapacity {
    /// Backing buffer never grows past its initial size; writes past the
    /// end are truncated.
    Fixed,
    /// Backing buffer doubles whenever a write would overrun it.
    AutoExtend,
}

/// In-memory byte source, used both standalone and as the leaf of most
/// format stacks in this workspace.
pub struct Mem {
    mode: Mode,
    buf: Vec<u8>,
    read_pos: usize,
    written: usize,
    capacity_policy: WriteCapacity,
    end_ptr_tracker: Option<EndPtrTracker>,
}

impl Mem {
    /// READ view over an existing buffer.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        Mem {
            mode: Mode::Read,
            buf: bytes,
            read_pos: 0,
            written: 0,
            capacity_policy: WriteCapacity::Fixed,
            end_ptr_tracker: None,
        }
    }

    /// WRITE sink with a fixed capacity; writes past `capacity` are
    /// truncated rather than growing the buffer.
    pub fn write_fixed(capacity: usize) -> Self {
        Mem {
            mode: Mode::Write,
            buf: vec![0u8; capacity],
            read_pos: 0,
            written: 0,
            capacity_policy: WriteCapacity::Fixed,
            end_ptr_tracker: None,
        }
    }

    /// WRITE sink that doubles its backing buffer on overflow. `capacity`
    /// must be nonzero.
    pub fn write_auto_extend(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(FormatError::Mismatch(
                "auto-extend memory source needs a nonzero initial capacity".into(),
            ));
        }
        Ok(Mem {
            mode: Mode::Write,
            buf: vec![0u8; capacity],
            read_pos: 0,
            written: 0,
            capacity_policy: WriteCapacity::AutoExtend,
            end_ptr_tracker: None,
        })
    }

    pub fn bytes_written(&self) -> u64 {
        self.written as u64
    }

    fn ensure_capacity(&mut self, needed: usize) -> Result<()> {
        if needed <= self.buf.len() {
            return Ok(());
        }
        match self.capacity_policy {
            WriteCapacity::Fixed => Ok(()),
            WriteCapacity::AutoExtend => {
                let mut new_cap = self.buf.len().max(1);
                while new_cap < needed {
                    new_cap = new_cap.checked_mul(2).ok_or(FormatError::CapacityOverflow)?;
                }
                self.buf.resize(new_cap, 0);
                self.sync_end_ptr_tracker();
                Ok(())
            }
        }
    }

    /// Pushes the buffer's current address/length to an attached tracker,
    /// if any. Called after every write, overwrite, and reallocation.
    fn sync_end_ptr_tracker(&self) {
        if let Some(tracker) = &self.end_ptr_tracker {
            tracker.update(self.buf.as_ptr() as usize, self.written);
        }
    }
}

impl Format for Mem {
    fn type_name(&self) -> &'static str {
        "mem"
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn next_chunk(&mut self, requested: usize) -> Result<Vec<u8>> {
        if self.mode != Mode::Read {
            return Err(FormatError::ReadOnWriteFormat);
        }
        let available = self.buf.len() - self.read_pos;
        let take = if requested == 0 {
            available
        } else {
            requested.min(available)
        };
        let chunk = self.buf[self.read_pos..self.read_pos + take].to_vec();
        self.read_pos += take;
        Ok(chunk)
    }

    fn has_more_data(&self) -> bool {
        match self.mode {
            Mode::Read => self.read_pos < self.buf.len(),
            Mode::Write => false,
        }
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize> {
        if self.mode != Mode::Write {
            return Err(FormatError::WriteOnReadFormat);
        }
        let end = self.written + chunk.len();
        self.ensure_capacity(end)?;

        let writable = chunk.len().min(self.buf.len().saturating_sub(self.written));
        if writable == 0 && !chunk.is_empty() {
            return Err(FormatError::BufferFull);
        }
        self.buf[self.written..self.written + writable].copy_from_slice(&chunk[..writable]);
        self.written += writable;
        self.sync_end_ptr_tracker();
        Ok(writable)
    }

    fn overwrite(&mut self, offset: u64, chunk: &[u8]) -> Result<usize> {
        if self.mode != Mode::Write {
            return Err(FormatError::WriteOnReadFormat);
        }
        let offset = offset as usize;
        if offset.checked_add(chunk.len()).map(|e| e as u64) > Some(self.written as u64) {
            return Err(FormatError::OverwriteOutOfBounds {
                offset: offset as u64,
                len: chunk.len(),
                written: self.written as u64,
            });
        }
        self.buf[offset..offset + chunk.len()].copy_from_slice(chunk);
        self.sync_end_ptr_tracker();
        Ok(chunk.len())
    }

    fn get_memory(&mut self) -> Result<&[u8]> {
        if self.mode != Mode::Write {
            return Err(FormatError::Unsupported);
        }
        Ok(&self.buf[..self.written])
    }

    fn attach_end_ptr_tracker(&mut self, tracker: EndPtrTracker) -> Result<()> {
        if self.mode != Mode::Write {
            return Err(FormatError::Unsupported);
        }
        tracker.update(self.buf.as_ptr() as usize, self.written);
        self.end_ptr_tracker = Some(tracker);
        Ok(())
    }

    fn detach_end_ptr_tracker(&mut self) {
        self.end_ptr_tracker = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_round_trip() {
        let data = b"the quick brown fox".to_vec();
        let mut mem = Mem::from_bytes(data.clone());
        let mut out = Vec::new();
        loop {
            let chunk = mem.next_chunk(3).unwrap();
            if chunk.is_empty() {
                break;
            }
            out.extend_from_slice(&chunk);
        }
        assert_eq!(out, data);
        assert!(!mem.has_more_data());
    }

    #[test]
    fn fixed_write_truncates() {
        let mut mem = Mem::write_fixed(4);
        let written = mem.write_chunk(b"hello").unwrap();
        assert_eq!(written, 4);
        assert_eq!(mem.get_memory().unwrap(), b"hell");
    }

    #[test]
    fn auto_extend_doubles_and_preserves_content() {
        let mut mem = Mem::write_auto_extend(2).unwrap();
        mem.write_chunk(b"ab").unwrap();
        mem.write_chunk(b"cdef").unwrap();
        assert_eq!(mem.get_memory().unwrap(), b"abcdef");
    }

    #[test]
    fn overwrite_within_bounds() {
        let mut mem = Mem::write_auto_extend(8).unwrap();
        mem.write_chunk(b"abcdef").unwrap();
        mem.overwrite(1, b"XY").unwrap();
        assert_eq!(mem.get_memory().unwrap(), b"aXYdef");
    }

    #[test]
    fn overwrite_past_written_fails() {
        let mut mem = Mem::write_auto_extend(8).unwrap();
        mem.write_chunk(b"abc").unwrap();
        assert!(mem.overwrite(2, b"XYZ").is_err());
    }

    #[test]
    fn end_ptr_tracker_observes_address_after_reallocation() {
        let mut mem = Mem::write_auto_extend(2).unwrap();
        let tracker = EndPtrTracker::new();
        mem.attach_end_ptr_tracker(tracker.clone()).unwrap();

        let before = tracker.get();
        assert_eq!(before.len, 0);

        // Forces `ensure_capacity` to double the backing buffer, moving it.
        mem.write_chunk(b"abcdef").unwrap();

        let after = tracker.get();
        assert_eq!(after.len, 6);
        assert_eq!(after.addr, mem.buf.as_ptr() as usize);

        mem.detach_end_ptr_tracker();
        mem.write_chunk(b"gh").unwrap();
        assert_eq!(tracker.get(), after, "detached tracker must stop updating");
    }
}
