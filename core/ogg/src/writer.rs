use format::{Format, FormatError, Mode, Result};

use crate::page::{Page, PageFlags};

const MAX_SEGMENTS: usize = 255;
const MAX_SEGMENT_LEN: usize = 255;

struct PendingPage {
    segments: Vec<u8>,
    payload: Vec<u8>,
    continuation: bool,
}

impl PendingPage {
    fn fresh(continuation: bool) -> Self {
        PendingPage {
            segments: Vec::new(),
            payload: Vec::new(),
            continuation,
        }
    }

    fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }
}

/// Ogg container encoder. Write is single-stream-at-a-time: `new_stream`
/// closes the current stream (setting `end_of_stream`) before opening the
/// next; there is no write-side interleaving.
pub struct OggWriter {
    lower: Box<dyn Format>,
    stream_serial: u32,
    sequence: u32,
    granule_position: u64,
    pending: PendingPage,
    /// True if the most recently appended segment had length 255, meaning
    /// the logical packet it belongs to is not yet terminated.
    mid_packet: bool,
    wrote_first_page: bool,
    finished: bool,
}

impl OggWriter {
    pub fn create(lower: Box<dyn Format>, stream_serial: u32) -> Result<Self> {
        if lower.mode() != Mode::Write {
            return Err(FormatError::ReadOnWriteFormat);
        }
        Ok(OggWriter {
            lower,
            stream_serial,
            sequence: 0,
            granule_position: 0,
            pending: PendingPage::fresh(false),
            mid_packet: false,
            wrote_first_page: false,
            finished: false,
        })
    }

    fn append_segment(&mut self, seg: &[u8]) -> Result<()> {
        if self.pending.segments.len() == MAX_SEGMENTS {
            self.flush(false)?;
            self.pending = PendingPage::fresh(self.mid_packet);
        }
        self.pending.segments.push(seg.len() as u8);
        self.pending.payload.extend_from_slice(seg);
        self.mid_packet = seg.len() == MAX_SEGMENT_LEN;
        Ok(())
    }

    fn flush(&mut self, end_of_stream: bool) -> Result<()> {
        if self.pending.is_empty() && !end_of_stream && self.wrote_first_page {
            return Ok(());
        }
        let page = Page {
            flags: PageFlags {
                continuation: self.pending.continuation,
                begin_of_stream: !self.wrote_first_page,
                end_of_stream,
            },
            granule_position: self.granule_position,
            stream_serial: self.stream_serial,
            sequence: self.sequence,
            segments: std::mem::take(&mut self.pending.segments),
            payload: std::mem::take(&mut self.pending.payload),
        };
        self.lower.write_chunk(&page.serialize())?;
        self.sequence += 1;
        self.wrote_first_page = true;
        Ok(())
    }

    /// Force-flushes the current page with the given granule (sample)
    /// position and begins a new page in the same stream.
    pub fn new_page(&mut self, sample_position: u64) -> Result<()> {
        self.flush(false)?;
        self.granule_position = sample_position;
        self.pending = PendingPage::fresh(self.mid_packet);
        Ok(())
    }

    /// Finishes the current stream (`end_of_stream`) and begins a new one
    /// under `stream_serial`, resetting the page sequence counter.
    pub fn new_stream(&mut self, stream_serial: u32) -> Result<()> {
        self.flush(true)?;
        self.stream_serial = stream_serial;
        self.sequence = 0;
        self.granule_position = 0;
        self.wrote_first_page = false;
        self.mid_packet = false;
        self.pending = PendingPage::fresh(false);
        Ok(())
    }

    fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        self.flush(true)?;
        self.finished = true;
        Ok(())
    }
}

impl Format for OggWriter {
    fn type_name(&self) -> &'static str {
        "ogg"
    }

    fn mode(&self) -> Mode {
        Mode::Write
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize> {
        if chunk.is_empty() {
            self.append_segment(&[])?;
            return Ok(0);
        }
        let mut offset = 0;
        while offset < chunk.len() {
            let end = (offset + MAX_SEGMENT_LEN).min(chunk.len());
            self.append_segment(&chunk[offset..end])?;
            offset = end;
        }
        if chunk.len() % MAX_SEGMENT_LEN == 0 {
            self.append_segment(&[])?;
        }
        Ok(chunk.len())
    }

    fn ready_format(&mut self) -> Result<()> {
        self.finish()
    }

    fn get_memory(&mut self) -> Result<&[u8]> {
        self.lower.get_memory()
    }
}
