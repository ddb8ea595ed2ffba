use byteorder::{BigEndian, ByteOrder};
use format::{Format, FormatError, Mode, Result};

/// Next-header values this decoder accepts. IPv6 extension header chains
/// are out of scope: any other next-header value fails the decode.
pub mod next_header {
    pub const TCP: u8 = 6;
    pub const UDP: u8 = 17;
    pub const ICMPV6: u8 = 58;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct Ipv6Header {
    pub traffic_class: u8,
    pub flow_label: u32,
    pub payload_length: u16,
    pub next_header: u8,
    pub hop_limit: u8,
    pub src_ip: [u8; 16],
    pub dst_ip: [u8; 16],
}

pub struct Ipv6 {
    lower: Box<dyn Format>,
    current: Option<Ipv6Header>,
}

const HEADER_LEN: usize = 40;

fn accepted_next_header(value: u8) -> bool {
    matches!(value, next_header::TCP | next_header::UDP | next_header::ICMPV6)
}

impl Ipv6 {
    pub fn open(lower: Box<dyn Format>) -> Result<Self> {
        if lower.mode() != Mode::Read {
            return Err(FormatError::WriteOnReadFormat);
        }
        Ok(Ipv6 { lower, current: None })
    }

    pub fn current_header(&self) -> Option<Ipv6Header> {
        self.current
    }
}

impl Format for Ipv6 {
    fn type_name(&self) -> &'static str {
        "ipv6"
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
        let packet = self.lower.next_chunk(0)?;
        if packet.is_empty() {
            return Ok(Vec::new());
        }
        if packet.len() < HEADER_LEN {
            return Err(FormatError::Mismatch("ipv6 header truncated".into()));
        }
        let version = packet[0] >> 4;
        if version != 6 {
            return Err(FormatError::Mismatch(format!("unexpected ip version {version}")));
        }
        let next_hdr = packet[6];
        if !accepted_next_header(next_hdr) {
            return Err(FormatError::Mismatch(format!(
                "ipv6 extension headers unsupported (next_header={next_hdr})"
            )));
        }

        let word0 = BigEndian::read_u32(&packet[0..4]);
        let header = Ipv6Header {
            traffic_class: ((word0 >> 20) & 0xff) as u8,
            flow_label: word0 & 0x000f_ffff,
            payload_length: BigEndian::read_u16(&packet[4..6]),
            next_header: next_hdr,
            hop_limit: packet[7],
            src_ip: packet[8..24].try_into().unwrap(),
            dst_ip: packet[24..40].try_into().unwrap(),
        };

        let payload_len = header.payload_length as usize;
        if packet.len() < HEADER_LEN + payload_len {
            return Err(FormatError::Mismatch("ipv6 payload truncated".into()));
        }
        let payload = packet[HEADER_LEN..HEADER_LEN + payload_len].to_vec();

        self.current = Some(header);
        Ok(payload)
    }

    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        format::chain_lookup(self.lower.as_mut(), type_name)
    }
}
