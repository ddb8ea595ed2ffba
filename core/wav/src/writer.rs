use byteorder::{ByteOrder, LittleEndian};
use format::{Format, FormatError, Mode, Result};

use crate::options::WavOptions;

const RIFF_SIZE_OFFSET: u64 = 4;
const DATA_SIZE_OFFSET: u64 = 12 + 24 + 4; // = 40
const HEADER_LEN: usize = 44;

/// Two-phase WAV writer: the master/`fmt `/`data` headers are emitted
/// immediately with placeholder sizes; the placeholders are back-patched
/// in [`Format::ready_format`], which is safe to call repeatedly since the
/// patched values are pure functions of `bytes_written`.
pub struct WavWriter {
    lower: Box<dyn Format>,
    bytes_written: u64,
}

impl WavWriter {
    pub fn create(mut lower: Box<dyn Format>, options: WavOptions) -> Result<Self> {
        if lower.mode() != Mode::Write {
            return Err(FormatError::ReadOnWriteFormat);
        }

        let mut header = [0u8; HEADER_LEN];
        header[0..4].copy_from_slice(b"RIFF");
        // riff_size patched on ready_format
        header[8..12].copy_from_slice(b"WAVE");
        header[12..16].copy_from_slice(b"fmt ");
        LittleEndian::write_u32(&mut header[16..20], 16);
        LittleEndian::write_u16(&mut header[20..22], options.format_tag);
        LittleEndian::write_u16(&mut header[22..24], options.channels);
        LittleEndian::write_u32(&mut header[24..28], options.sample_rate);
        LittleEndian::write_u32(&mut header[28..32], options.byte_rate());
        LittleEndian::write_u16(&mut header[32..34], options.block_align());
        LittleEndian::write_u16(&mut header[34..36], options.bits_per_sample);
        header[36..40].copy_from_slice(b"data");
        // data_size patched on ready_format

        let written = lower.write_chunk(&header)?;
        if written != HEADER_LEN {
            return Err(FormatError::BufferFull);
        }

        Ok(WavWriter { lower, bytes_written: 0 })
    }

    fn patch_sizes(&mut self) -> Result<()> {
        let data_size = self.bytes_written as u32;
        let riff_size = 36u32.wrapping_add(data_size);

        let mut buf = [0u8; 4];
        LittleEndian::write_u32(&mut buf, riff_size);
        self.lower.overwrite(RIFF_SIZE_OFFSET, &buf)?;

        LittleEndian::write_u32(&mut buf, data_size);
        self.lower.overwrite(DATA_SIZE_OFFSET, &buf)?;
        Ok(())
    }
}

impl Format for WavWriter {
    fn type_name(&self) -> &'static str {
        "wav"
    }

    fn mode(&self) -> Mode {
        Mode::Write
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize> {
        let written = self.lower.write_chunk(chunk)?;
        self.bytes_written += written as u64;
        Ok(written)
    }

    fn overwrite(&mut self, offset: u64, chunk: &[u8]) -> Result<usize> {
        self.lower.overwrite(offset + HEADER_LEN as u64, chunk)
    }

    fn ready_format(&mut self) -> Result<()> {
        self.patch_sizes()
    }

    fn get_memory(&mut self) -> Result<&[u8]> {
        self.lower.get_memory()
    }
}
