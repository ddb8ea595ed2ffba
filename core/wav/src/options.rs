/// Format tag values recognized in the `fmt ` chunk. Only PCM payload
/// bytes are actually interpreted; mu-law and A-law are recorded and
/// round-tripped as a tag but not decoded to linear PCM.
pub mod format_tag {
    pub const PCM: u16 = 1;
    pub const IEEE_FLOAT: u16 = 3;
    pub const ALAW: u16 = 6;
    pub const MULAW: u16 = 7;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct WavOptions {
    pub format_tag: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub bits_per_sample: u16,
}

impl WavOptions {
    pub fn block_align(&self) -> u16 {
        (self.channels as u32 * self.bits_per_sample as u32).div_ceil(8) as u16
    }

    pub fn byte_rate(&self) -> u32 {
        self.sample_rate * self.block_align() as u32
    }
}
