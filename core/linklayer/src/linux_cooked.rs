use byteorder::{BigEndian, ByteOrder};
use format::{Format, FormatError, Mode, Result};

const HEADER_LEN: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct LinuxCookedHeader {
    pub packet_type: u16,
    pub arphrd_type: u16,
    pub link_addr_len: u16,
    pub link_addr: [u8; 8],
    pub protocol: u16,
}

/// Linux "cooked capture" (SLL) link-layer decoder, used by PCAP files
/// with `data_link_type == 113`.
pub struct LinuxCooked {
    lower: Box<dyn Format>,
    current: Option<LinuxCookedHeader>,
}

impl LinuxCooked {
    pub fn open(lower: Box<dyn Format>) -> Result<Self> {
        if lower.mode() != Mode::Read {
            return Err(FormatError::WriteOnReadFormat);
        }
        Ok(LinuxCooked { lower, current: None })
    }

    pub fn current_header(&self) -> Option<LinuxCookedHeader> {
        self.current
    }
}

impl Format for LinuxCooked {
    fn type_name(&self) -> &'static str {
        "linux_sll"
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
        let frame = self.lower.next_chunk(0)?;
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        if frame.len() < HEADER_LEN {
            return Err(FormatError::Mismatch("linux cooked header truncated".into()));
        }
        let header = LinuxCookedHeader {
            packet_type: BigEndian::read_u16(&frame[0..2]),
            arphrd_type: BigEndian::read_u16(&frame[2..4]),
            link_addr_len: BigEndian::read_u16(&frame[4..6]),
            link_addr: frame[6..14].try_into().unwrap(),
            protocol: BigEndian::read_u16(&frame[14..16]),
        };
        self.current = Some(header);
        Ok(frame[HEADER_LEN..].to_vec())
    }

    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        format::chain_lookup(self.lower.as_mut(), type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use format::source::Mem;

    #[test]
    fn parses_header_fields() {
        let mut buf = vec![0u8; 16];
        BigEndian::write_u16(&mut buf[0..2], 0);
        BigEndian::write_u16(&mut buf[2..4], 1);
        BigEndian::write_u16(&mut buf[4..6], 6);
        buf[6..12].copy_from_slice(&[1, 2, 3, 4, 5, 6]);
        BigEndian::write_u16(&mut buf[14..16], 0x0800);
        buf.extend_from_slice(b"payload");

        let mem = Mem::from_bytes(buf);
        let mut sll = LinuxCooked::open(Box::new(mem)).unwrap();
        let out = sll.next_chunk(0).unwrap();
        assert_eq!(out, b"payload");
        assert_eq!(sll.current_header().unwrap().protocol, 0x0800);
    }
}
