use byteorder::{BigEndian, ByteOrder};
use format::{Format, FormatError, Mode, Result};

const HEADER_LEN: usize = 14;
const TYPE_LENGTH_THRESHOLD: u16 = 1536;
const CRC_LEN: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum EtherField {
    Type(u16),
    Length(u16),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct EthernetHeader {
    pub dst_mac: [u8; 6],
    pub src_mac: [u8; 6],
    pub field: EtherField,
}

impl EthernetHeader {
    pub fn ethertype(&self) -> Option<u16> {
        match self.field {
            EtherField::Type(t) => Some(t),
            EtherField::Length(_) => None,
        }
    }
}

/// Ethernet frame decoder. `crc_present` controls whether a trailing
/// 4-byte big-endian frame check sequence is stripped from each frame.
pub struct Ethernet {
    lower: Box<dyn Format>,
    crc_present: bool,
    current: Option<EthernetHeader>,
    current_crc: Option<u32>,
}

impl Ethernet {
    pub fn open(lower: Box<dyn Format>, crc_present: bool) -> Result<Self> {
        if lower.mode() != Mode::Read {
            return Err(FormatError::WriteOnReadFormat);
        }
        Ok(Ethernet {
            lower,
            crc_present,
            current: None,
            current_crc: None,
        })
    }

    pub fn current_header(&self) -> Option<EthernetHeader> {
        self.current
    }

    pub fn current_crc(&self) -> Option<u32> {
        self.current_crc
    }
}

/// Ethernet (IEEE 802.3 / zlib) CRC-32, distinct from the Ogg page CRC-32
/// in the `ogg` crate, which uses a different init/xor convention.
pub fn calculate_crc32(data: &[u8]) -> u32 {
    const POLY: u32 = 0xEDB8_8320;
    let mut crc = 0xFFFF_FFFFu32;
    for &byte in data {
        crc ^= byte as u32;
        for _ in 0..8 {
            if crc & 1 != 0 {
                crc = (crc >> 1) ^ POLY;
            } else {
                crc >>= 1;
            }
        }
    }
    !crc
}

impl Format for Ethernet {
    fn type_name(&self) -> &'static str {
        "ethernet"
    }

    fn mode(&self) -> Mode {
        Mode::Read
    }

    fn has_more_data(&self) -> bool {
        self.lower.has_more_data()
    }

    fn next_chunk(&mut self, _requested: usize) -> Result<Vec<u8>> {
        if !self.lower.has_more_data() {
            return Ok(Vec::new());
        }
        // `lower` hands back one self-contained frame per call (whether
        // that's a raw byte source or another packet-framing decoder), so
        // the whole frame is read in a single call and sliced in place
        // rather than issuing a second advancing read.
        let frame = self.lower.next_chunk(0)?;
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        if frame.len() < HEADER_LEN {
            return Err(FormatError::Mismatch("ethernet header truncated".into()));
        }
        let raw_field = BigEndian::read_u16(&frame[12..14]);
        let field = if raw_field >= TYPE_LENGTH_THRESHOLD {
            EtherField::Type(raw_field)
        } else {
            EtherField::Length(raw_field)
        };
        let header = EthernetHeader {
            dst_mac: frame[0..6].try_into().unwrap(),
            src_mac: frame[6..12].try_into().unwrap(),
            field,
        };

        let mut body = frame[HEADER_LEN..].to_vec();
        let crc = if self.crc_present {
            if body.len() < CRC_LEN {
                return Err(FormatError::Mismatch("ethernet frame too short for trailing crc".into()));
            }
            let split_at = body.len() - CRC_LEN;
            let crc_bytes = body.split_off(split_at);
            Some(BigEndian::read_u32(&crc_bytes))
        } else {
            None
        };

        self.current = Some(header);
        self.current_crc = crc;
        Ok(body)
    }

    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        format::chain_lookup(self.lower.as_mut(), type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use format::source::Mem;

    fn sample(ethertype: u16, payload: &[u8], with_crc: bool) -> Vec<u8> {
        let mut buf = vec![0u8; 14];
        buf[0..6].copy_from_slice(&[0xaa; 6]);
        buf[6..12].copy_from_slice(&[0xbb; 6]);
        BigEndian::write_u16(&mut buf[12..14], ethertype);
        buf.extend_from_slice(payload);
        if with_crc {
            let crc = calculate_crc32(&buf);
            buf.extend_from_slice(&crc.to_be_bytes());
        }
        buf
    }

    #[test]
    fn parses_ip_ethertype_frame() {
        let mem = Mem::from_bytes(sample(0x0800, b"ip-packet", false));
        let mut eth = Ethernet::open(Box::new(mem), false).unwrap();
        let out = eth.next_chunk(0).unwrap();
        assert_eq!(out, b"ip-packet");
        assert_eq!(eth.current_header().unwrap().ethertype(), Some(0x0800));
    }

    #[test]
    fn strips_trailing_crc_when_enabled() {
        let mem = Mem::from_bytes(sample(0x0800, b"data", true));
        let mut eth = Ethernet::open(Box::new(mem), true).unwrap();
        let out = eth.next_chunk(0).unwrap();
        assert_eq!(out, b"data");
        assert!(eth.current_crc().is_some());
    }

    #[test]
    fn length_field_below_threshold_is_not_a_type() {
        let mem = Mem::from_bytes(sample(42, b"x", false));
        let mut eth = Ethernet::open(Box::new(mem), false).unwrap();
        eth.next_chunk(0).unwrap();
        assert_eq!(eth.current_header().unwrap().ethertype(), None);
    }
}
