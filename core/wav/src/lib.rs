//! WAV (RIFF/WAVE) reader and writer.

mod options;
mod reader;
mod writer;

pub use options::{format_tag, WavOptions};
pub use reader::WavReader;
pub use writer::WavWriter;
