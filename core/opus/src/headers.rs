use byteorder::{ByteOrder, LittleEndian};
use format::{FormatError, Result};

use crate::gain::{from_q7_8, to_q7_8};

pub const ID_MAGIC: &[u8; 8] = b"OpusHead";
pub const COMMENT_MAGIC: &[u8; 8] = b"OpusTags";
const ID_HEADER_LEN: usize = 19;
const CHANNEL_MAPPING_FAMILY_SINGLE_STREAM: u8 = 0;

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct IdHeader {
    pub pre_skip: u16,
    pub sample_rate: u32,
    pub output_gain_db: f32,
}

impl IdHeader {
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(ID_HEADER_LEN);
        out.extend_from_slice(ID_MAGIC);
        out.push(1); // version
        out.push(1); // channel count: single channel only
        let mut buf2 = [0u8; 2];
        LittleEndian::write_u16(&mut buf2, self.pre_skip);
        out.extend_from_slice(&buf2);
        let mut buf4 = [0u8; 4];
        LittleEndian::write_u32(&mut buf4, self.sample_rate);
        out.extend_from_slice(&buf4);
        LittleEndian::write_u16(&mut buf2, to_q7_8(self.output_gain_db) as u16);
        out.extend_from_slice(&buf2);
        out.push(CHANNEL_MAPPING_FAMILY_SINGLE_STREAM);
        out
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != ID_HEADER_LEN || &bytes[0..8] != ID_MAGIC {
            return Err(FormatError::Mismatch("not an OpusHead id header".into()));
        }
        let channel_count = bytes[9];
        if channel_count != 1 {
            return Err(FormatError::Mismatch("only single-channel opus streams are supported".into()));
        }
        if bytes[18] != CHANNEL_MAPPING_FAMILY_SINGLE_STREAM {
            return Err(FormatError::Mismatch("unsupported opus channel mapping family".into()));
        }
        Ok(IdHeader {
            pre_skip: LittleEndian::read_u16(&bytes[10..12]),
            sample_rate: LittleEndian::read_u32(&bytes[12..16]),
            output_gain_db: from_q7_8(LittleEndian::read_u16(&bytes[16..18])),
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CommentHeader {
    pub vendor: String,
    pub comments: Vec<(String, String)>,
}

impl CommentHeader {
    pub fn get(&self, key: &str) -> Option<&str> {
        self.comments
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(COMMENT_MAGIC);
        let mut buf4 = [0u8; 4];
        LittleEndian::write_u32(&mut buf4, self.vendor.len() as u32);
        out.extend_from_slice(&buf4);
        out.extend_from_slice(self.vendor.as_bytes());
        LittleEndian::write_u32(&mut buf4, self.comments.len() as u32);
        out.extend_from_slice(&buf4);
        for (key, value) in &self.comments {
            let entry = format!("{key}={value}");
            LittleEndian::write_u32(&mut buf4, entry.len() as u32);
            out.extend_from_slice(&buf4);
            out.extend_from_slice(entry.as_bytes());
        }
        out
    }

    pub fn parse(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < 8 || &bytes[0..8] != COMMENT_MAGIC {
            return Err(FormatError::Mismatch("not an OpusTags comment header".into()));
        }
        let mut pos = 8;
        let vendor_len = read_u32_at(bytes, pos)? as usize;
        pos += 4;
        let vendor = read_string(bytes, pos, vendor_len)?;
        pos += vendor_len;

        let num_comments = read_u32_at(bytes, pos)? as usize;
        pos += 4;

        let mut comments = Vec::with_capacity(num_comments);
        for _ in 0..num_comments {
            let len = read_u32_at(bytes, pos)? as usize;
            pos += 4;
            let entry = read_string(bytes, pos, len)?;
            pos += len;
            let (key, value) = entry
                .split_once('=')
                .ok_or_else(|| FormatError::Mismatch("opus comment missing '='".into()))?;
            comments.push((key.to_string(), value.to_string()));
        }

        Ok(CommentHeader { vendor, comments })
    }
}

fn read_u32_at(bytes: &[u8], pos: usize) -> Result<u32> {
    if pos + 4 > bytes.len() {
        return Err(FormatError::Mismatch("opus comment header truncated".into()));
    }
    Ok(LittleEndian::read_u32(&bytes[pos..pos + 4]))
}

fn read_string(bytes: &[u8], pos: usize, len: usize) -> Result<String> {
    if pos + len > bytes.len() {
        return Err(FormatError::Mismatch("opus comment header truncated".into()));
    }
    String::from_utf8(bytes[pos..pos + len].to_vec())
        .map_err(|_| FormatError::Mismatch("opus comment is not valid utf-8".into()))
}
