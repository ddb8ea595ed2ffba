//! Opus audio profile layered over the Ogg container: a single-channel
//! ID header, a vendor/comment header, then one Ogg packet per audio frame.

mod gain;
mod headers;
mod reader;
mod writer;

pub use gain::{from_q7_8, to_q7_8};
pub use headers::{CommentHeader, IdHeader};
pub use reader::OpusReader;
pub use writer::OpusWriter;
