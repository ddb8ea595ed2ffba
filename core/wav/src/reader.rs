use byteorder::{ByteOrder, LittleEndian};
use format::{Format, FormatError, Mode, Result};

use crate::options::WavOptions;

/// RIFF/WAVE reader. Requires `"RIFF"..."WAVE"` and a `"fmt "` chunk before
/// `"data"`; any other chunk encountered in between is skipped.
pub struct WavReader {
    lower: Box<dyn Format>,
    options: WavOptions,
    data_remaining: u64,
}

fn read_exact(lower: &mut dyn Format, len: usize) -> Result<Vec<u8>> {
    let bytes = lower.next_chunk(len)?;
    if bytes.len() != len {
        return Err(FormatError::Mismatch("wav stream truncated".into()));
    }
    Ok(bytes)
}

impl WavReader {
    pub fn open(mut lower: Box<dyn Format>) -> Result<Self> {
        if lower.mode() != Mode::Read {
            return Err(FormatError::WriteOnReadFormat);
        }

        let master = read_exact(lower.as_mut(), 12)?;
        if &master[0..4] != b"RIFF" || &master[8..12] != b"WAVE" {
            return Err(FormatError::Mismatch("not a RIFF/WAVE stream".into()));
        }

        let mut options: Option<WavOptions> = None;
        loop {
            let chunk_header = read_exact(lower.as_mut(), 8)?;
            let chunk_id = &chunk_header[0..4];
            let chunk_size = LittleEndian::read_u32(&chunk_header[4..8]) as usize;

            if chunk_id == b"fmt " {
                let fmt_bytes = read_exact(lower.as_mut(), chunk_size)?;
                let format_tag = LittleEndian::read_u16(&fmt_bytes[0..2]);
                let channels = LittleEndian::read_u16(&fmt_bytes[2..4]);
                let sample_rate = LittleEndian::read_u32(&fmt_bytes[4..8]);
                let byte_rate = LittleEndian::read_u32(&fmt_bytes[8..12]);
                let block_align = LittleEndian::read_u16(&fmt_bytes[12..14]);
                let bits_per_sample = LittleEndian::read_u16(&fmt_bytes[14..16]);

                let parsed = WavOptions {
                    format_tag,
                    channels,
                    sample_rate,
                    bits_per_sample,
                };
                if byte_rate != parsed.byte_rate() {
                    return Err(FormatError::Mismatch("wav byte_rate disagrees with derived value".into()));
                }
                if block_align < parsed.block_align() {
                    return Err(FormatError::Mismatch("wav block_align too small for bits/channels".into()));
                }
                options = Some(parsed);
            } else if chunk_id == b"data" {
                let options = options
                    .ok_or_else(|| FormatError::Mismatch("wav data chunk before fmt chunk".into()))?;
                return Ok(WavReader {
                    lower,
                    options,
                    data_remaining: chunk_size as u64,
                });
            } else {
                read_exact(lower.as_mut(), chunk_size)?;
            }
        }
    }

    pub fn options(&self) -> WavOptions {
        self.options
    }
}

impl Format for WavReader {
    fn type_name(&self) -> &'static str {
        "wav"
    }

    fn mode(&self) -> Mode {
        Mode::Read
    }

    fn has_more_data(&self) -> bool {
        self.data_remaining > 0
    }

    fn next_chunk(&mut self, requested: usize) -> Result<Vec<u8>> {
        if self.data_remaining == 0 {
            return Ok(Vec::new());
        }
        let want = if requested == 0 {
            self.data_remaining
        } else {
            (requested as u64).min(self.data_remaining)
        };
        let chunk = self.lower.next_chunk(want as usize)?;
        self.data_remaining -= chunk.len() as u64;
        Ok(chunk)
    }
}
