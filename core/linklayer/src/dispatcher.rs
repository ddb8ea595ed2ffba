use byteorder::{BigEndian, ByteOrder};
use format::source::Buffered;
use format::{chain_lookup, Format, FormatError, Mode, Result};
use ipnet::{Ipv4, Ipv6};

use crate::ethernet::{EtherField, Ethernet};

const ETHERTYPE_IPV4: u16 = 0x0800;
const ETHERTYPE_IPV6: u16 = 0x86dd;

/// Reads one ethernet frame per chunk and switches to an IPv4 or IPv6 child
/// decoder based on the frame's ethertype, presenting a single uniform
/// chunk API (the IP payload) to whatever sits above it. `responsible_for`
/// exposes the currently active child so upper layers can inspect its
/// decoded header via [`format::get`].
pub struct EthernetIpDispatcher {
    ethernet: Ethernet,
    child: Option<Box<dyn Format>>,
}

impl EthernetIpDispatcher {
    pub fn open(lower: Box<dyn Format>, crc_present: bool) -> Result<Self> {
        let ethernet = Ethernet::open(lower, crc_present)?;
        Ok(EthernetIpDispatcher { ethernet, child: None })
    }
}

impl Format for EthernetIpDispatcher {
    fn type_name(&self) -> &'static str {
        "ethernet_ip"
    }

    fn mode(&self) -> Mode {
        Mode::Read
    }

    fn has_more_data(&self) -> bool {
        self.ethernet.has_more_data()
    }

    fn next_chunk(&mut self, _requested: usize) -> Result<Vec<u8>> {
        if !self.ethernet.has_more_data() {
            return Ok(Vec::new());
        }
        let frame_payload = self.ethernet.next_chunk(0)?;
        if frame_payload.is_empty() && !self.ethernet.has_more_data() {
            return Ok(Vec::new());
        }
        let ethertype = self
            .ethernet
            .current_header()
            .and_then(|h| match h.field {
                EtherField::Type(t) => Some(t),
                EtherField::Length(_) => None,
            })
            .ok_or_else(|| FormatError::Mismatch("ethernet frame has no ethertype".into()))?;

        let buffered: Box<dyn Format> = Box::new(Buffered::new(frame_payload));
        let mut child: Box<dyn Format> = match ethertype {
            ETHERTYPE_IPV4 => Box::new(Ipv4::open(buffered)?),
            ETHERTYPE_IPV6 => Box::new(Ipv6::open(buffered)?),
            other => {
                return Err(FormatError::Mismatch(format!(
                    "unsupported ethertype 0x{other:04x}"
                )))
            }
        };
        let ip_payload = child.next_chunk(0)?;
        self.child = Some(child);
        Ok(ip_payload)
    }

    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        self.child
            .as_deref_mut()
            .and_then(|child| chain_lookup(child, type_name))
    }
}

/// Raw 16-bit ethertype helper used by tests and callers that want to peek
/// at a frame before deciding whether to hand it to this dispatcher.
pub fn read_ethertype(frame: &[u8]) -> Option<u16> {
    if frame.len() < 14 {
        return None;
    }
    Some(BigEndian::read_u16(&frame[12..14]))
}
