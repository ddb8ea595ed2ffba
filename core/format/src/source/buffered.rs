use crate::error::Result;
use crate::format::Format;
use crate::mode::Mode;

/// A read-only window that always hands back its entire current buffer
/// without advancing a read position. Used to splice externally-decoded
/// bytes (e.g. one ethernet frame's payload) into a higher decoder that
/// expects its own `Format` leaf; replace the window with
/// [`Buffered::update`] between frames.
pub struct Buffered {
    buf: Vec<u8>,
}

impl Buffered {
    pub fn new(bytes: Vec<u8>) -> Self {
        Buffered { buf: bytes }
    }

    pub fn update(&mut self, bytes: Vec<u8>) {
        self.buf = bytes;
    }
}

impl Format for Buffered {
    fn type_name(&self) -> &'static str {
        "buffered"
    }

    fn mode(&self) -> Mode {
        Mode::Read
    }

    fn next_chunk(&mut self, requested: usize) -> Result<Vec<u8>> {
        if requested == 0 || requested >= self.buf.len() {
            Ok(self.buf.clone())
        } else {
            Ok(self.buf[..requested].to_vec())
        }
    }

    fn has_more_data(&self) -> bool {
        !self.buf.is_empty()
    }
}

impl std::fmt::Debug for Buffered {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Buffered").field("len", &self.buf.len()).finish()
    }
}
