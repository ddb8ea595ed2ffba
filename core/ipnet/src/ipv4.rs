use byteorder::{BigEndian, ByteOrder};
use format::{Format, FormatError, Mode, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Ipv4Header {
    pub header_length_octets: u8,
    pub total_length_octets: u16,
    pub protocol: u8,
    pub time_to_live: u8,
    pub header_checksum: u16,
    pub src_ip: [u8; 4],
    pub dst_ip: [u8; 4],
}

pub struct Ipv4 {
    lower: Box<dyn Format>,
    current: Option<Ipv4Header>,
}

const MIN_HEADER_LEN: usize = 20;

impl Ipv4 {
    pub fn open(lower: Box<dyn Format>) -> Result<Self> {
        if lower.mode() != Mode::Read {
            return Err(FormatError::WriteOnReadFormat);
        }
        Ok(Ipv4 { lower, current: None })
    }

    pub fn current_header(&self) -> Option<Ipv4Header> {
        self.current
    }
}

impl Format for Ipv4 {
    fn type_name(&self) -> &'static str {
        "ipv4"
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
        // One call to `lower` returns the whole available packet, whether
        // `lower` is a raw byte source or another framing decoder; the
        // header, options and payload are all sliced out of that one read.
        let packet = self.lower.next_chunk(0)?;
        if packet.is_empty() {
            return Ok(Vec::new());
        }
        if packet.len() < MIN_HEADER_LEN {
            return Err(FormatError::Mismatch("ipv4 header truncated".into()));
        }
        let version = packet[0] >> 4;
        if version != 4 {
            return Err(FormatError::Mismatch(format!("unexpected ip version {version}")));
        }
        let ihl = packet[0] & 0x0f;
        if ihl < 5 {
            return Err(FormatError::Mismatch("ipv4 IHL below minimum of 5".into()));
        }
        let header_length_octets = ihl * 4;
        if packet.len() < header_length_octets as usize {
            return Err(FormatError::Mismatch("ipv4 options truncated".into()));
        }
        let total_length_octets = BigEndian::read_u16(&packet[2..4]);
        if (total_length_octets as usize) < header_length_octets as usize {
            return Err(FormatError::Mismatch(
                "ipv4 total_length shorter than header_length".into(),
            ));
        }

        let header = Ipv4Header {
            header_length_octets,
            total_length_octets,
            protocol: packet[9],
            time_to_live: packet[8],
            header_checksum: BigEndian::read_u16(&packet[10..12]),
            src_ip: packet[12..16].try_into().unwrap(),
            dst_ip: packet[16..20].try_into().unwrap(),
        };

        let payload_len = total_length_octets as usize - header_length_octets as usize;
        let payload_start = header_length_octets as usize;
        if packet.len() < payload_start + payload_len {
            return Err(FormatError::Mismatch("ipv4 payload truncated".into()));
        }
        let payload = packet[payload_start..payload_start + payload_len].to_vec();

        self.current = Some(header);
        Ok(payload)
    }

    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        format::chain_lookup(self.lower.as_mut(), type_name)
    }
}
