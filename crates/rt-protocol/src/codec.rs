//! Tokio codecs for agent pipes

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::ProtocolError;
use crate::message::Transcript;

/// Codec for transcripts written to an agent's stdin.
///
/// Each transcript is one JSON array followed by `\n`. JSON string escaping
/// guarantees that newlines inside a message never split the line.
#[derive(Debug, Default, Clone, Copy)]
pub struct TranscriptCodec;

impl TranscriptCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self
    }
}

impl Encoder<Transcript> for TranscriptCodec {
    type Error = ProtocolError;

    fn encode(&mut self, transcript: Transcript, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let json = serde_json::to_vec(&transcript)?;
        dst.reserve(json.len() + 1);
        dst.extend_from_slice(&json);
        dst.put_u8(b'\n');
        Ok(())
    }
}

impl Decoder for TranscriptCodec {
    type Item = Transcript;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        loop {
            let Some(pos) = src.iter().position(|b| *b == b'\n') else {
                return Ok(None);
            };
            let line = src.split_to(pos + 1);
            let body = trim_line_ending(&line);
            if body.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            return Ok(Some(serde_json::from_slice(body)?));
        }
    }
}

/// Line decoder for agent stdout/stderr.
///
/// Invalid UTF-8 is replaced rather than rejected so one bad byte cannot
/// end an agent's output stream. A trailing line without `\n` is still
/// yielded when the stream closes.
#[derive(Debug, Default)]
pub struct ChildLineCodec {
    /// Bytes already scanned for a newline
    next_index: usize,
}

impl ChildLineCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self { next_index: 0 }
    }
}

impl Decoder for ChildLineCodec {
    type Item = String;
    type Error = ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let scan_from = self.next_index.min(src.len());
        match src[scan_from..].iter().position(|b| *b == b'\n') {
            Some(offset) => {
                let line = src.split_to(scan_from + offset + 1);
                self.next_index = 0;
                Ok(Some(String::from_utf8_lossy(trim_line_ending(&line)).into_owned()))
            }
            None => {
                self.next_index = src.len();
                Ok(None)
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }
        let rest = src.split_to(src.len());
        self.next_index = 0;
        Ok(Some(String::from_utf8_lossy(trim_line_ending(&rest)).into_owned()))
    }
}

/// Strip a trailing `\n` or `\r\n`
fn trim_line_ending(line: &[u8]) -> &[u8] {
    let line = line.strip_suffix(b"\n").unwrap_or(line);
    line.strip_suffix(b"\r").unwrap_or(line)
}
