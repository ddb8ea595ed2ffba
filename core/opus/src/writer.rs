use format::{Format, FormatError, Mode, Result};
use ogg::OggWriter;

use crate::headers::{CommentHeader, IdHeader};

enum State {
    /// Comment tags may still be changed; no audio payload written yet.
    Preparing { comments: CommentHeader },
    Streaming,
}

/// Opus audio profile over an Ogg container: an ID header page written
/// immediately at construction, a comment header page deferred until the
/// first audio packet, then one Ogg packet per audio frame.
pub struct OpusWriter {
    inner: OggWriter,
    id_header: IdHeader,
    state: State,
}

impl OpusWriter {
    pub fn create(
        lower: Box<dyn Format>,
        stream_serial: u32,
        id_header: IdHeader,
        vendor: impl Into<String>,
    ) -> Result<Self> {
        let mut inner = OggWriter::create(lower, stream_serial)?;
        inner.write_chunk(&id_header.serialize())?;
        inner.new_page(0)?;
        Ok(OpusWriter {
            inner,
            id_header,
            state: State::Preparing {
                comments: CommentHeader {
                    vendor: vendor.into(),
                    comments: Vec::new(),
                },
            },
        })
    }

    pub fn id_header(&self) -> &IdHeader {
        &self.id_header
    }

    /// Sets (or replaces) a `KEY=VALUE` comment. Fails once any audio data
    /// has already been written, since the comment header page has by then
    /// already been flushed.
    pub fn comment_set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        match &mut self.state {
            State::Preparing { comments } => {
                let key = key.into();
                if let Some(existing) = comments.comments.iter_mut().find(|(k, _)| *k == key) {
                    existing.1 = value.into();
                } else {
                    comments.comments.push((key, value.into()));
                }
                Ok(())
            }
            State::Streaming => Err(FormatError::Mismatch(
                "opus comments are locked once audio data has been written".into(),
            )),
        }
    }

    fn ensure_streaming(&mut self) -> Result<()> {
        if let State::Preparing { comments } = &self.state {
            let bytes = comments.serialize();
            self.inner.write_chunk(&bytes)?;
            self.inner.new_page(0)?;
            self.state = State::Streaming;
        }
        Ok(())
    }
}

impl Format for OpusWriter {
    fn type_name(&self) -> &'static str {
        "opus"
    }

    fn mode(&self) -> Mode {
        Mode::Write
    }

    fn write_chunk(&mut self, chunk: &[u8]) -> Result<usize> {
        self.ensure_streaming()?;
        self.inner.write_chunk(chunk)
    }

    fn ready_format(&mut self) -> Result<()> {
        self.ensure_streaming()?;
        self.inner.ready_format()
    }

    fn get_memory(&mut self) -> Result<&[u8]> {
        self.inner.get_memory()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::OpusReader;
    use format::source::Mem;

    fn sample_id_header() -> IdHeader {
        IdHeader {
            pre_skip: 312,
            sample_rate: 48000,
            output_gain_db: -1.5,
        }
    }

    #[test]
    fn comment_is_rejected_after_first_audio_packet() {
        let mem = Mem::write_auto_extend(1024).unwrap();
        let mut writer = OpusWriter::create(Box::new(mem), 1, sample_id_header(), "test").unwrap();
        writer.write_chunk(b"frame0").unwrap();
        assert!(writer.comment_set("TITLE", "too late").is_err());
    }

    #[test]
    fn writer_output_round_trips_through_reader() {
        let mem = Mem::write_auto_extend(1024).unwrap();
        let mut writer = OpusWriter::create(Box::new(mem), 7, sample_id_header(), "test-vendor").unwrap();
        writer.comment_set("TITLE", "sample track").unwrap();
        writer.write_chunk(b"frame0").unwrap();
        writer.write_chunk(b"frame1").unwrap();
        writer.ready_format().unwrap();
        let bytes = writer.get_memory().unwrap().to_vec();

        let mem = Mem::from_bytes(bytes);
        let mut reader = OpusReader::open(Box::new(mem)).unwrap();
        assert_eq!(reader.id_header().sample_rate, 48000);
        assert_eq!(reader.comment("TITLE"), Some("sample track"));
        assert_eq!(reader.next_chunk(0).unwrap(), b"frame0");
        assert_eq!(reader.next_chunk(0).unwrap(), b"frame1");
    }
}
