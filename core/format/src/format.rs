use crate::end_ptr::EndPtrTracker;
use crate::error::{FormatError, Result};
use crate::mode::Mode;

/// A node in a format stack.
///
/// Every decoder/encoder in this workspace (pcap, ethernet, ipv4/6, udp,
/// rtp, wav, ogg, opus, the codec adapter, and the byte sources themselves)
/// implements this trait. A stack is a chain of `Box<dyn Format>`, each node
/// exclusively owning the one below it; a leaf simply never calls through to
/// a lower layer. Per-layer state lives in ordinary struct fields, and the
/// trait's own vtable handles dynamic dispatch between layers.
pub trait Format {
    /// Short, human-readable tag for this layer (`"pcap"`, `"rtp"`, ...).
    fn type_name(&self) -> &'static str;

    fn mode(&self) -> Mode;

    /// Read up to `requested` bytes (all remaining data if `requested == 0`).
    /// Returns an empty vector at end of stream.
    fn next_chunk(&mut self, requested: usize) -> Result<Vec<u8>> {
        let _ = requested;
        Err(FormatError::Unsupported)
    }

    /// Append `buf` to the stream, returning the number of bytes actually
    /// written (may be less than `buf.len()` for a fixed-capacity sink).
    fn write_chunk(&mut self, buf: &[u8]) -> Result<usize> {
        let _ = buf;
        Err(FormatError::Unsupported)
    }

    /// Overwrite `buf.len()` bytes at `offset` within already-written data.
    fn overwrite(&mut self, offset: u64, buf: &[u8]) -> Result<usize> {
        let _ = (offset, buf);
        Err(FormatError::Unsupported)
    }

    /// Whether a subsequent `next_chunk` could return more data.
    fn has_more_data(&self) -> bool {
        false
    }

    /// Finalize any deferred header fields (WAV sizes, Ogg trailing page).
    /// Safe to call more than once; each call re-derives the same bytes.
    fn ready_format(&mut self) -> Result<()> {
        Ok(())
    }

    /// Borrow the backing buffer of a WRITE memory leaf, after running
    /// `ready_format` on every layer above it. Only meaningful at the base
    /// of a stack built on `Mem`/`File`.
    fn get_memory(&mut self) -> Result<&[u8]> {
        Err(FormatError::Unsupported)
    }

    /// Used by dispatcher layers (ethernet-IP) to expose a child decoder
    /// selected per-chunk under a type name other than their own.
    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        let _ = type_name;
        None
    }

    /// Binds `tracker` to a WRITE memory leaf's live backing buffer:
    /// `tracker` is updated on every `write_chunk`/`overwrite` and on every
    /// auto-extend reallocation, so it keeps observing the buffer's current
    /// address and length even after it moves. Only a WRITE `Mem` leaf
    /// supports this; every other layer returns `Unsupported`.
    fn attach_end_ptr_tracker(&mut self, tracker: EndPtrTracker) -> Result<()> {
        let _ = tracker;
        Err(FormatError::Unsupported)
    }

    /// Detaches a previously attached tracker, if any. Call this before
    /// closing an auto-extend leaf that still has a tracker attached, so
    /// the tracker's last snapshot isn't mistaken for a still-live buffer.
    fn detach_end_ptr_tracker(&mut self) {}
}

/// Looks up `type_name` through `responsible_for`, falling back to an exact
/// `type_name()` match on `top` itself.
pub fn get<'a>(top: &'a mut dyn Format, type_name: &str) -> Option<&'a mut dyn Format> {
    if top.type_name() == type_name {
        return Some(top);
    }
    top.responsible_for(type_name)
}

/// Helper for a layer's `responsible_for` to transparently pass a lookup
/// down to whatever it owns: match the immediate lower layer by tag, else
/// keep recursing through its own `responsible_for`.
pub fn chain_lookup<'a>(lower: &'a mut dyn Format, type_name: &str) -> Option<&'a mut dyn Format> {
    if lower.type_name() == type_name {
        Some(lower)
    } else {
        lower.responsible_for(type_name)
    }
}
