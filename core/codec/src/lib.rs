//! Per-chunk codec adapter: encodes on write, decodes on read, through any
//! type implementing [`Codec`].

use format::{Format, FormatError, Mode, Result};

/// A pluggable encode/decode pair, standing in for the function-pointer
/// vtable a codec node would otherwise need. `wem` takes the same approach
/// with its codec-specific `AdpcmParams`/`PcmParams` structs.
pub trait Codec {
    /// Encodes `input`, appending the encoded bytes to `output`.
    fn encode(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()>;

    /// Decodes the `seq`-th chunk read through this adapter, appending
    /// decoded bytes to `output`. `seq` is the adapter's own monotonically
    /// increasing counter, not anything carried on the wire.
    fn decode(&mut self, seq: u64, input: &[u8], output: &mut Vec<u8>) -> Result<()>;
}

const GROWTH_FACTOR: usize = 20;

/// Format node that runs chunks through a [`Codec`] on the way to or from
/// the lower layer.
pub struct CodecAdapter<C> {
    lower: Box<dyn Format>,
    codec: C,
    mode: Mode,
    sequence: u64,
    out_buf: Vec<u8>,
}

impl<C: Codec> CodecAdapter<C> {
    pub fn new(lower: Box<dyn Format>, codec: C) -> Self {
        let mode = lower.mode();
        CodecAdapter {
            lower,
            codec,
            mode,
            sequence: 0,
            out_buf: Vec::new(),
        }
    }

    fn ensure_capacity(&mut self, requested: usize) {
        let needed = requested.saturating_mul(GROWTH_FACTOR);
        if needed > self.out_buf.capacity() {
            self.out_buf.reserve(needed - self.out_buf.capacity());
        }
    }
}

impl<C: Codec> Format for CodecAdapter<C> {
    fn type_name(&self) -> &'static str {
        "codec"
    }

    fn mode(&self) -> Mode {
        self.mode
    }

    fn has_more_data(&self) -> bool {
        self.lower.has_more_data()
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize> {
        if self.mode != Mode::Write {
            return Err(FormatError::ReadOnWriteFormat);
        }
        let mut encoded = Vec::new();
        self.codec.encode(chunk, &mut encoded)?;
        self.lower.write_chunk(&encoded)?;
        Ok(chunk.len())
    }

    fn next_chunk(&mut self, requested: usize) -> Result<Vec<u8>> {
        if self.mode != Mode::Read {
            return Err(FormatError::WriteOnReadFormat);
        }
        let raw = self.lower.next_chunk(requested)?;
        if raw.is_empty() {
            return Ok(Vec::new());
        }
        self.out_buf.clear();
        self.ensure_capacity(requested.max(raw.len()));
        self.codec.decode(self.sequence, &raw, &mut self.out_buf)?;
        self.sequence += 1;
        Ok(self.out_buf.clone())
    }

    fn ready_format(&mut self) -> Result<()> {
        self.lower.ready_format()
    }

    fn get_memory(&mut self) -> Result<&[u8]> {
        self.lower.get_memory()
    }

    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        format::chain_lookup(self.lower.as_mut(), type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use format::source::Mem;

    /// Byte-rotation cipher keyed on the adapter's sequence number, just
    /// involved enough to prove `seq` actually reaches `decode`.
    struct RotatingXor {
        key: u8,
    }

    impl Codec for RotatingXor {
        fn encode(&mut self, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
            output.extend(input.iter().map(|b| b ^ self.key));
            Ok(())
        }

        fn decode(&mut self, seq: u64, input: &[u8], output: &mut Vec<u8>) -> Result<()> {
            let key = self.key.wrapping_add(seq as u8);
            output.extend(input.iter().map(|b| b ^ key));
            Ok(())
        }
    }

    #[test]
    fn write_then_read_round_trips_with_matching_sequence() {
        let mem = Mem::write_auto_extend(64).unwrap();
        let mut writer = CodecAdapter::new(Box::new(mem), RotatingXor { key: 0x5a });
        writer.write_chunk(b"alpha").unwrap();
        let bytes = writer.get_memory().unwrap().to_vec();

        let mem = Mem::from_bytes(bytes);
        let mut reader = CodecAdapter::new(Box::new(mem), RotatingXor { key: 0x5a });
        assert_eq!(reader.next_chunk(5).unwrap(), b"alpha");
    }

    #[test]
    fn sequence_number_advances_across_chunks() {
        let mut raw = Vec::new();
        let mut enc = RotatingXor { key: 0x11 };
        let mut buf = Vec::new();
        enc.encode(b"one", &mut buf).unwrap();
        raw.extend_from_slice(&buf);
        buf.clear();
        enc.encode(b"two", &mut buf).unwrap();
        raw.extend_from_slice(&buf);

        let mem = Mem::from_bytes(raw);
        let mut reader = CodecAdapter::new(Box::new(mem), RotatingXor { key: 0x11 });
        assert_eq!(reader.next_chunk(3).unwrap(), b"one");
        assert_eq!(reader.next_chunk(3).unwrap(), b"two");
    }
}
