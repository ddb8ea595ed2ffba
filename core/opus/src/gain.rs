/// Converts an output gain in decibels to the Q7.8 fixed-point
/// representation carried in the Opus ID header.
pub fn to_q7_8(gain_db: f32) -> i16 {
    (gain_db * 256.0).round() as i16
}

pub fn from_q7_8(raw: u16) -> f32 {
    (raw as i16) as f32 / 256.0
}
