use byteorder::{ByteOrder, LittleEndian};
use format::{Format, FormatError, Mode, Result};

use crate::page::{Page, CAPTURE_PATTERN};

const FIXED_HEADER_LEN: usize = 27;

struct PageCursor {
    page: Page,
    segment_idx: usize,
    payload_offset: usize,
}

/// Ogg container decoder. Reads are reassembled across page boundaries;
/// by default the first page's serial fixes the stream that gets read,
/// [`OggReader::select_stream`] overrides that choice.
pub struct OggReader {
    lower: Box<dyn Format>,
    primary_serial: Option<u32>,
    forced_serial: Option<u32>,
    current: Option<PageCursor>,
    primary_ended: bool,
}

impl OggReader {
    pub fn open(lower: Box<dyn Format>) -> Result<Self> {
        if lower.mode() != Mode::Read {
            return Err(FormatError::WriteOnReadFormat);
        }
        Ok(OggReader {
            lower,
            primary_serial: None,
            forced_serial: None,
            current: None,
            primary_ended: false,
        })
    }

    /// Forces the stream with `serial` as primary. Pages of other serials
    /// are skipped until a `begin_of_stream` page with this serial is seen.
    pub fn select_stream(&mut self, serial: u32) {
        self.forced_serial = Some(serial);
        self.primary_serial = None;
        self.current = None;
        self.primary_ended = false;
    }

    fn read_raw_page(&mut self) -> Result<Option<Page>> {
        loop {
            if !self.lower.has_more_data() {
                return Ok(None);
            }
            let header = self.lower.next_chunk(FIXED_HEADER_LEN)?;
            if header.is_empty() {
                return Ok(None);
            }
            if header.len() != FIXED_HEADER_LEN || &header[0..4] != CAPTURE_PATTERN {
                return Err(FormatError::Mismatch("expected ogg page capture pattern".into()));
            }
            let segment_count = header[26] as usize;
            let segments = self.lower.next_chunk(segment_count)?;
            if segments.len() != segment_count {
                return Err(FormatError::Mismatch("ogg segment table truncated".into()));
            }
            let payload_len: usize = segments.iter().map(|&b| b as usize).sum();
            let payload = self.lower.next_chunk(payload_len)?;
            if payload.len() != payload_len {
                return Err(FormatError::Mismatch("ogg page payload truncated".into()));
            }
            return Ok(Some(Page::parse(&header, segments, payload)?));
        }
    }

    fn next_matching_page(&mut self) -> Result<Option<Page>> {
        loop {
            let Some(page) = self.read_raw_page()? else {
                return Ok(None);
            };
            match (self.forced_serial, self.primary_serial) {
                (Some(forced), None) => {
                    if page.flags.begin_of_stream && page.stream_serial == forced {
                        self.primary_serial = Some(forced);
                        return Ok(Some(page));
                    }
                    // not yet the requested stream's start: skip
                }
                (_, Some(serial)) => {
                    if page.stream_serial == serial {
                        return Ok(Some(page));
                    }
                    // interleaved page of another stream: skip
                }
                (None, None) => {
                    self.primary_serial = Some(page.stream_serial);
                    return Ok(Some(page));
                }
            }
        }
    }
}

impl Format for OggReader {
    fn type_name(&self) -> &'static str {
        "ogg"
    }

    fn mode(&self) -> Mode {
        Mode::Read
    }

    fn has_more_data(&self) -> bool {
        !self.primary_ended && (self.current.is_some() || self.lower.has_more_data())
    }

    fn next_chunk(&mut self, _requested: usize) -> Result<Vec<u8>> {
        if self.primary_ended {
            return Ok(Vec::new());
        }
        let mut out = Vec::new();
        loop {
            if self.current.is_none() {
                match self.next_matching_page()? {
                    Some(page) => {
                        self.current = Some(PageCursor {
                            page,
                            segment_idx: 0,
                            payload_offset: 0,
                        });
                    }
                    None => return Ok(out),
                }
            }

            let cursor = self.current.as_mut().unwrap();
            if cursor.segment_idx >= cursor.page.segments.len() {
                let ended = cursor.page.flags.end_of_stream;
                self.current = None;
                if ended {
                    return Ok(out);
                }
                continue;
            }

            let len = cursor.page.segments[cursor.segment_idx] as usize;
            let start = cursor.payload_offset;
            out.extend_from_slice(&cursor.page.payload[start..start + len]);
            cursor.segment_idx += 1;
            cursor.payload_offset += len;

            if len < 255 {
                if cursor.segment_idx >= cursor.page.segments.len() {
                    let ended = cursor.page.flags.end_of_stream;
                    self.current = None;
                    if ended {
                        self.primary_ended = true;
                    }
                }
                return Ok(out);
            }
            // length-255 segment: packet continues, keep gathering (maybe
            // crossing into the next page once this one's segments run out).
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::writer::OggWriter;
    use format::source::Mem;

    #[test]
    fn multi_stream_select_reads_only_the_chosen_stream() {
        let mem = Mem::write_auto_extend(1024).unwrap();
        let mut writer = OggWriter::create(Box::new(mem), 0).unwrap();
        writer.write_chunk(b"stream0 chunk a").unwrap();
        writer.write_chunk(b"stream0 chunk b").unwrap();
        writer.new_stream(132).unwrap();
        writer.write_chunk(b"stream132 chunk").unwrap();
        writer.new_stream(256).unwrap();
        writer.write_chunk(b"stream256 chunk").unwrap();
        writer.ready_format().unwrap();
        let bytes = writer.get_memory().unwrap().to_vec();

        let mem = Mem::from_bytes(bytes.clone());
        let mut reader = OggReader::open(Box::new(mem)).unwrap();
        reader.select_stream(132);
        assert_eq!(reader.next_chunk(0).unwrap(), b"stream132 chunk");

        let mem = Mem::from_bytes(bytes.clone());
        let mut reader = OggReader::open(Box::new(mem)).unwrap();
        reader.select_stream(256);
        assert_eq!(reader.next_chunk(0).unwrap(), b"stream256 chunk");

        let mem = Mem::from_bytes(bytes);
        let mut reader = OggReader::open(Box::new(mem)).unwrap();
        assert_eq!(reader.next_chunk(0).unwrap(), b"stream0 chunk a");
        assert_eq!(reader.next_chunk(0).unwrap(), b"stream0 chunk b");
    }

    #[test]
    fn first_and_last_page_carry_stream_framing_flags() {
        let mem = Mem::write_auto_extend(256).unwrap();
        let mut writer = OggWriter::create(Box::new(mem), 9).unwrap();
        writer.write_chunk(b"only packet").unwrap();
        writer.ready_format().unwrap();
        let bytes = writer.get_memory().unwrap().to_vec();

        let mem = Mem::from_bytes(bytes);
        let mut reader = OggReader::open(Box::new(mem)).unwrap();
        let page = reader.read_raw_page().unwrap().unwrap();
        assert!(page.flags.begin_of_stream);
        assert!(page.flags.end_of_stream);
    }
}
