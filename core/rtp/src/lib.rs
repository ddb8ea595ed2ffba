//! RTP header decoder.
//!
//! Padding length is subtracted from the payload exactly once: the
//! trailing length octet and the `pad_len - 1` padding bytes before it are
//! split off the tail of the payload in a single `split_off`.

use byteorder::{BigEndian, ByteOrder};
use format::{Format, FormatError, Mode, Result};

const FIXED_HEADER_LEN: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
pub struct RtpHeader {
    pub version: u8,
    pub marker: bool,
    pub payload_type: u8,
    pub sequence_number: u16,
    pub timestamp: u32,
    pub ssrc: u32,
    pub csrc_count: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Extension {
    pub id: u16,
    pub payload: Vec<u8>,
}

pub struct Rtp {
    lower: Box<dyn Format>,
    current_header: Option<RtpHeader>,
    current_csrcs: Vec<u32>,
    current_extension: Option<Extension>,
    /// `None` means the current frame had no padding.
    current_padding: Option<Vec<u8>>,
}

impl Rtp {
    pub fn open(lower: Box<dyn Format>) -> Result<Self> {
        if lower.mode() != Mode::Read {
            return Err(FormatError::WriteOnReadFormat);
        }
        Ok(Rtp {
            lower,
            current_header: None,
            current_csrcs: Vec::new(),
            current_extension: None,
            current_padding: None,
        })
    }

    pub fn current_header(&self) -> Option<RtpHeader> {
        self.current_header
    }

    pub fn current_csrcs(&self) -> &[u32] {
        &self.current_csrcs
    }

    pub fn current_extension(&self) -> Option<&Extension> {
        self.current_extension.as_ref()
    }

    /// Padding bytes (excluding the trailing length octet) of the current
    /// frame, or `None` if the frame carried no padding.
    pub fn current_padding(&self) -> Option<&[u8]> {
        self.current_padding.as_deref()
    }
}

impl Format for Rtp {
    fn type_name(&self) -> &'static str {
        "rtp"
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

        // `lower` hands back one whole frame per call, so the fixed
        // header, csrc list, extension and payload are all sliced out of
        // a single read rather than issuing several advancing reads.
        let frame = self.lower.next_chunk(0)?;
        if frame.is_empty() {
            return Ok(Vec::new());
        }
        if frame.len() < FIXED_HEADER_LEN {
            return Err(FormatError::Mismatch("rtp header truncated".into()));
        }

        let version = frame[0] >> 6;
        if version != 2 {
            return Err(FormatError::Mismatch(format!("unsupported rtp version {version}")));
        }
        let has_padding = (frame[0] & 0x20) != 0;
        let has_extension = (frame[0] & 0x10) != 0;
        let csrc_count = frame[0] & 0x0f;
        let marker = (frame[1] & 0x80) != 0;
        let payload_type = frame[1] & 0x7f;
        let sequence_number = BigEndian::read_u16(&frame[2..4]);
        let timestamp = BigEndian::read_u32(&frame[4..8]);
        let ssrc = BigEndian::read_u32(&frame[8..12]);

        let mut pos = FIXED_HEADER_LEN;
        let mut csrcs = Vec::with_capacity(csrc_count as usize);
        if csrc_count > 0 {
            let csrc_len = csrc_count as usize * 4;
            if frame.len() < pos + csrc_len {
                return Err(FormatError::Mismatch("rtp csrc list truncated".into()));
            }
            for chunk in frame[pos..pos + csrc_len].chunks_exact(4) {
                csrcs.push(BigEndian::read_u32(chunk));
            }
            pos += csrc_len;
        }

        let extension = if has_extension {
            if frame.len() < pos + 4 {
                return Err(FormatError::Mismatch("rtp extension header truncated".into()));
            }
            let id = BigEndian::read_u16(&frame[pos..pos + 2]);
            let word_len = BigEndian::read_u16(&frame[pos + 2..pos + 4]) as usize;
            pos += 4;
            let ext_len = word_len * 4;
            if frame.len() < pos + ext_len {
                return Err(FormatError::Mismatch("rtp extension payload truncated".into()));
            }
            let ext_payload = frame[pos..pos + ext_len].to_vec();
            pos += ext_len;
            Some(Extension { id, payload: ext_payload })
        } else {
            None
        };

        let mut rest = frame[pos..].to_vec();

        let padding = if has_padding {
            let pad_len = *rest.last().ok_or_else(|| {
                FormatError::Mismatch("rtp padding flag set but payload empty".into())
            })? as usize;
            if pad_len == 0 || pad_len > rest.len() {
                return Err(FormatError::Mismatch("rtp padding length out of range".into()));
            }
            // Subtract the padding length from the payload exactly once.
            let split_at = rest.len() - pad_len;
            let pad = rest.split_off(split_at);
            Some(pad)
        } else {
            None
        };

        self.current_header = Some(RtpHeader {
            version,
            marker,
            payload_type,
            sequence_number,
            timestamp,
            ssrc,
            csrc_count,
        });
        self.current_csrcs = csrcs;
        self.current_extension = extension;
        self.current_padding = padding;

        Ok(rest)
    }

    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        format::chain_lookup(self.lower.as_mut(), type_name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use format::source::Mem;

    fn sample_frame(payload: &[u8], padding: Option<u8>) -> Vec<u8> {
        let mut buf = vec![0u8; 12];
        buf[0] = 0b1000_0000; // version 2, no padding/extension/csrc yet
        if padding.is_some() {
            buf[0] |= 0x20;
        }
        buf[1] = 0x80 | 96; // marker + PT 96
        BigEndian::write_u16(&mut buf[2..4], 12345);
        BigEndian::write_u32(&mut buf[4..8], 0x1234_5678);
        BigEndian::write_u32(&mut buf[8..12], 0x8765_4321);
        buf.extend_from_slice(payload);
        if let Some(pad_len) = padding {
            for _ in 1..pad_len {
                buf.push(0);
            }
            buf.push(pad_len);
        }
        buf
    }

    #[test]
    fn decodes_header_and_payload_without_padding() {
        let payload = vec![9u8, 1, 8, 2, 7, 3, 6, 4, 5];
        let mem = Mem::from_bytes(sample_frame(&payload, None));
        let mut rtp = Rtp::open(Box::new(mem)).unwrap();
        let out = rtp.next_chunk(0).unwrap();
        assert_eq!(out, payload);
        let hdr = rtp.current_header().unwrap();
        assert_eq!(hdr.sequence_number, 12345);
        assert_eq!(hdr.timestamp, 0x1234_5678);
        assert_eq!(hdr.ssrc, 0x8765_4321);
        assert!(rtp.current_padding().is_none());
    }

    #[test]
    fn padding_is_subtracted_exactly_once() {
        let payload = vec![1u8, 2, 3, 4];
        let pad_len = 4u8;
        let mem = Mem::from_bytes(sample_frame(&payload, Some(pad_len)));
        let mut rtp = Rtp::open(Box::new(mem)).unwrap();
        let out = rtp.next_chunk(0).unwrap();
        // Subtracting the padding length once leaves the full original payload.
        assert_eq!(out, payload);
        assert_eq!(rtp.current_padding().unwrap().len(), pad_len as usize);
    }
}
