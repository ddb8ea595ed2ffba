use byteorder::{ByteOrder, LittleEndian};
use format::{FormatError, Result};

use crate::crc::crc32_ogg;

pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageFlags {
    pub continuation: bool,
    pub begin_of_stream: bool,
    pub end_of_stream: bool,
}

impl PageFlags {
    fn to_byte(self) -> u8 {
        (self.continuation as u8) | ((self.begin_of_stream as u8) << 1) | ((self.end_of_stream as u8) << 2)
    }

    fn from_byte(b: u8) -> Self {
        PageFlags {
            continuation: b & 0x01 != 0,
            begin_of_stream: b & 0x02 != 0,
            end_of_stream: b & 0x04 != 0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Page {
    pub flags: PageFlags,
    pub granule_position: u64,
    pub stream_serial: u32,
    pub sequence: u32,
    pub segments: Vec<u8>,
    pub payload: Vec<u8>,
}

const FIXED_HEADER_LEN: usize = 27;

impl Page {
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(FIXED_HEADER_LEN + self.segments.len() + self.payload.len());
        out.extend_from_slice(CAPTURE_PATTERN);
        out.push(0); // version
        out.push(self.flags.to_byte());

        let mut buf8 = [0u8; 8];
        LittleEndian::write_u64(&mut buf8, self.granule_position);
        out.extend_from_slice(&buf8);

        let mut buf4 = [0u8; 4];
        LittleEndian::write_u32(&mut buf4, self.stream_serial);
        out.extend_from_slice(&buf4);
        LittleEndian::write_u32(&mut buf4, self.sequence);
        out.extend_from_slice(&buf4);

        // CRC field, zeroed for the purpose of computing the checksum.
        out.extend_from_slice(&[0u8; 4]);

        out.push(self.segments.len() as u8);
        out.extend_from_slice(&self.segments);
        out.extend_from_slice(&self.payload);

        let crc = crc32_ogg(&out);
        LittleEndian::write_u32(&mut buf4, crc);
        out[22..26].copy_from_slice(&buf4);

        out
    }

    pub fn parse(raw_header: &[u8], segments: Vec<u8>, payload: Vec<u8>) -> Result<Self> {
        if &raw_header[0..4] != CAPTURE_PATTERN {
            return Err(FormatError::Mismatch("ogg page missing capture pattern".into()));
        }
        let version = raw_header[4];
        if version != 0 {
            return Err(FormatError::Mismatch(format!("unsupported ogg page version {version}")));
        }
        let flags = PageFlags::from_byte(raw_header[5]);
        let granule_position = LittleEndian::read_u64(&raw_header[6..14]);
        let stream_serial = LittleEndian::read_u32(&raw_header[14..18]);
        let sequence = LittleEndian::read_u32(&raw_header[18..22]);
        let stored_crc = LittleEndian::read_u32(&raw_header[22..26]);

        let page = Page {
            flags,
            granule_position,
            stream_serial,
            sequence,
            segments,
            payload,
        };

        let mut check = page.serialize();
        LittleEndian::write_u32(&mut check[22..26], 0);
        let computed = crc32_ogg(&check);
        if computed != stored_crc {
            return Err(FormatError::Mismatch("ogg page crc mismatch".into()));
        }

        Ok(page)
    }
}
