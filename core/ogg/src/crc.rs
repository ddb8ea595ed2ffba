use std::sync::OnceLock;

/// Ogg's page CRC-32: polynomial `0x04c11db7`, computed MSB-first with no
/// input/output reflection and a zero initial value. This is a stream
/// integrity checksum, not a cryptographic primitive, so it is hand-rolled
/// here the way the rest of this workspace's corpus treats Ogg CRCs,
/// rather than pulled in as an external collaborator.
///
/// Distinct from the Ethernet frame-check-sequence CRC-32 in the
/// `linklayer` crate, which uses the reflected zlib/IEEE convention.
static TABLE: OnceLock<[u32; 256]> = OnceLock::new();

fn table() -> &'static [u32; 256] {
    TABLE.get_or_init(|| {
        let mut table = [0u32; 256];
        let mut i = 0usize;
        while i < 256 {
            let mut crc = (i as u32) << 24;
            let mut bit = 0;
            while bit < 8 {
                crc = if crc & 0x8000_0000 != 0 {
                    (crc << 1) ^ 0x04c1_1db7
                } else {
                    crc << 1
                };
                bit += 1;
            }
            table[i] = crc;
            i += 1;
        }
        table
    })
}

pub fn crc32_ogg(data: &[u8]) -> u32 {
    let table = table();
    let mut crc = 0u32;
    for &byte in data {
        crc = (crc << 8) ^ table[(((crc >> 24) ^ byte as u32) & 0xff) as usize];
    }
    crc
}
