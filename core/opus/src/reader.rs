use format::{Format, Mode, Result};
use ogg::OggReader;

use crate::headers::{CommentHeader, IdHeader};

/// Opus audio profile decoder: unwraps the ID and comment header pages on
/// open, then hands out one audio packet per [`Format::next_chunk`] call.
pub struct OpusReader {
    inner: OggReader,
    id_header: IdHeader,
    comments: CommentHeader,
}

impl OpusReader {
    pub fn open(lower: Box<dyn Format>) -> Result<Self> {
        let mut inner = OggReader::open(lower)?;
        let id_bytes = inner.next_chunk(0)?;
        let id_header = IdHeader::parse(&id_bytes)?;

        let comment_bytes = inner.next_chunk(0)?;
        let comments = CommentHeader::parse(&comment_bytes)?;

        Ok(OpusReader {
            inner,
            id_header,
            comments,
        })
    }

    pub fn id_header(&self) -> &IdHeader {
        &self.id_header
    }

    pub fn comment(&self, key: &str) -> Option<&str> {
        self.comments.get(key)
    }
}

impl Format for OpusReader {
    fn type_name(&self) -> &'static str {
        "opus"
    }

    fn mode(&self) -> Mode {
        Mode::Read
    }

    fn has_more_data(&self) -> bool {
        self.inner.has_more_data()
    }

    fn next_chunk(&mut self, requested: usize) -> Result<Vec<u8>> {
        self.inner.next_chunk(requested)
    }

    fn responsible_for(&mut self, type_name: &str) -> Option<&mut dyn Format> {
        format::chain_lookup(&mut self.inner, type_name)
    }
}
