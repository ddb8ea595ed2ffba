//! PCAP container decoder: byte-order autodetection, global header, and
//! per-packet framing.

use byteorder::{BigEndian, ByteOrder, LittleEndian};
use format::{Format, FormatError, Mode, Result};

/// Well-known `data_link_type` values this workspace cares about.
pub mod link_type {
    pub const ETHERNET: u32 = 1;
    pub const LINUX_COOKED: u32 = 113;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Endian {
    Little,
    Big,
}

impl Endian {
    fn u16(self, b: &[u8]) -> u16 {
        match self {
            Endian::Little => LittleEndian::read_u16(b),
            Endian::Big => BigEndian::read_u16(b),
        }
    }
    fn u32(self, b: &[u8]) -> u32 {
        match self {
            Endian::Little => LittleEndian::read_u32(b),
            Endian::Big => BigEndian::read_u32(b),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct GlobalHeader {
    pub bytes_swapped: bool,
    pub version_major: u16,
    pub version_minor: u16,
    pub thiszone: i32,
    pub sigfigs: u32,
    pub snaplen: u32,
    pub data_link_type: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct PacketHeader {
    pub ts_sec: u32,
    pub ts_usec: u32,
    pub length_stored_bytes: u32,
    pub length_origin_bytes: u32,
}

pub struct Pcap {
    lower: Box<dyn Format>,
    endian: Endian,
    global: GlobalHeader,
    current_packet: Option<PacketHeader>,
}

const GLOBAL_HEADER_LEN: usize = 24;
const PACKET_HEADER_LEN: usize = 16;

fn endian_from_magic(magic: &[u8; 4]) -> Option<(Endian, bool)> {
    match magic {
        [0xa1, 0xb2, 0xc3, 0xd4] => Some((Endian::Big, false)),
        [0xa1, 0xb2, 0x3c, 0x4d] => Some((Endian::Big, false)),
        [0xd4, 0xc3, 0xb2, 0xa1] => Some((Endian::Little, true)),
        [0x4d, 0x3c, 0xb2, 0xa1] => Some((Endian::Little, true)),
        _ => None,
    }
}

impl Pcap {
    pub fn open(mut lower: Box<dyn Format>) -> Result<Self> {
        if lower.mode() != Mode::Read {
            return Err(FormatError::WriteOnReadFormat);
        }
        let header_bytes = lower.next_chunk(GLOBAL_HEADER_LEN)?;
        if header_bytes.len() != GLOBAL_HEADER_LEN {
            return Err(FormatError::Mismatch("pcap global header truncated".into()));
        }
        let magic: [u8; 4] = header_bytes[0..4].try_into().unwrap();
        let (endian, bytes_swapped) = endian_from_magic(&magic)
            .ok_or_else(|| FormatError::Mismatch("unrecognized pcap magic number".into()))?;

        let global = GlobalHeader {
            bytes_swapped,
            version_major: endian.u16(&header_bytes[4..6]),
            version_minor: endian.u16(&header_bytes[6..8]),
            thiszone: endian.u32(&header_bytes[8..12]) as i32,
            sigfigs: endian.u32(&header_bytes[12..16]),
            snaplen: endian.u32(&header_bytes[16..20]),
            data_link_type: endian.u32(&header_bytes[20..24]),
        };

        Ok(Pcap {
            lower,
            endian,
            global,
            current_packet: None,
        })
    }

    pub fn global_header(&self) -> GlobalHeader {
        self.global
    }

    pub fn current_packet_header(&self) -> Option<PacketHeader> {
        self.current_packet
    }
}

impl Format for Pcap {
    fn type_name(&self) -> &'static str {
        "pcap"
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
        let header_bytes = self.lower.next_chunk(PACKET_HEADER_LEN)?;
        if header_bytes.is_empty() {
            return Ok(Vec::new());
        }
        if header_bytes.len() != PACKET_HEADER_LEN {
            return Err(FormatError::Mismatch("pcap packet header truncated".into()));
        }
        let header = PacketHeader {
            ts_sec: self.endian.u32(&header_bytes[0..4]),
            ts_usec: self.endian.u32(&header_bytes[4..8]),
            length_stored_bytes: self.endian.u32(&header_bytes[8..12]),
            length_origin_bytes: self.endian.u32(&header_bytes[12..16]),
        };
        let payload = self.lower.next_chunk(header.length_stored_bytes as usize)?;
        if payload.len() != header.length_stored_bytes as usize {
            return Err(FormatError::Mismatch("pcap packet payload truncated".into()));
        }
        self.current_packet = Some(header);
        Ok(payload)
    }

    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        format::chain_lookup(self.lower.as_mut(), type_name)
    }
}

/// Stacks the network-layer decoder appropriate for `pcap`'s link type:
/// Ethernet plus the IPv4/IPv6 dispatcher for `link_type::ETHERNET`, or
/// Linux cooked capture plus IPv4 for `link_type::LINUX_COOKED`.
pub fn create_network_layer_format(pcap: Pcap) -> Result<Box<dyn Format>> {
    let data_link_type = pcap.global_header().data_link_type;
    let lower: Box<dyn Format> = Box::new(pcap);
    match data_link_type {
        link_type::ETHERNET => Ok(Box::new(linklayer::EthernetIpDispatcher::open(lower, false)?)),
        link_type::LINUX_COOKED => {
            let sll = linklayer::LinuxCooked::open(lower)?;
            Ok(Box::new(ipnet::Ipv4::open(Box::new(sll))?))
        }
        other => Err(FormatError::Mismatch(format!("unsupported pcap link type {other}"))),
    }
}
