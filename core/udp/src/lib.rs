//! UDP header decoder.

use byteorder::{BigEndian, ByteOrder};
use format::{Format, FormatError, Mode, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct UdpHeader {
    pub src_port: u16,
    pub dst_port: u16,
    pub length_octets: u16,
    pub checksum: u16,
}

const HEADER_LEN: usize = 8;

pub struct Udp {
    lower: Box<dyn Format>,
    current: Option<UdpHeader>,
}

impl Udp {
    pub fn open(lower: Box<dyn Format>) -> Result<Self> {
        if lower.mode() != Mode::Read {
            return Err(FormatError::WriteOnReadFormat);
        }
        Ok(Udp { lower, current: None })
    }

    pub fn current_header(&self) -> Option<UdpHeader> {
        self.current
    }
}

impl Format for Udp {
    fn type_name(&self) -> &'static str {
        "udp"
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
        let datagram = self.lower.next_chunk(0)?;
        if datagram.is_empty() {
            return Ok(Vec::new());
        }
        if datagram.len() < HEADER_LEN {
            return Err(FormatError::Mismatch("udp header truncated".into()));
        }
        let header = UdpHeader {
            src_port: BigEndian::read_u16(&datagram[0..2]),
            dst_port: BigEndian::read_u16(&datagram[2..4]),
            length_octets: BigEndian::read_u16(&datagram[4..6]),
            checksum: BigEndian::read_u16(&datagram[6..8]),
        };
        let payload_len = (header.length_octets as usize)
            .checked_sub(HEADER_LEN)
            .ok_or_else(|| FormatError::Mismatch("udp length field shorter than header".into()))?;
        if datagram.len() < HEADER_LEN + payload_len {
            return Err(FormatError::Mismatch(
                "udp length field disagrees with available payload".into(),
            ));
        }
        let payload = datagram[HEADER_LEN..HEADER_LEN + payload_len].to_vec();
        self.current = Some(header);
        Ok(payload)
    }

    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        format::chain_lookup(self.lower.as_mut(), type_name)
    }
}
