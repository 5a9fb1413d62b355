use serde::{Deserialize, Serialize};

use crate::error::ChatError;

/// Wire frame as emitted by the chat endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamFrame {
    pub text: String,
    #[serde(rename = "isLast", default)]
    pub is_last: bool,
}

/// One decoded piece of the assistant's answer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Increment {
    pub text: String,
    pub is_final: bool,
}

impl From<StreamFrame> for Increment {
    fn from(frame: StreamFrame) -> Self {
        Self {
            text: frame.text,
            is_final: frame.is_last,
        }
    }
}

/// Incremental decoder for the frame stream.
///
/// The transport hands over bytes in arbitrary chunks: one frame may be
/// split across several chunks (including in the middle of a UTF-8
/// sequence) and several frames may arrive glued together in one chunk.
/// Partial trailing bytes are buffered until the bytes that complete the
/// frame arrive; they are never discarded.
#[derive(Debug, Default)]
pub struct FrameDecoder {
    buf: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk and collect every frame it completes, in order
    pub fn push(&mut self, chunk: &[u8]) -> Result<Vec<StreamFrame>, ChatError> {
        self.buf.extend_from_slice(chunk);

        let mut frames = Vec::new();
        loop {
            let (frame, consumed) = {
                let mut values =
                    serde_json::Deserializer::from_slice(&self.buf).into_iter::<StreamFrame>();
                match values.next() {
                    Some(Ok(frame)) => (Some(frame), values.byte_offset()),
                    // An EOF here only means the frame is incomplete;
                    // keep the bytes and wait for the next chunk.
                    Some(Err(e)) if e.is_eof() => (None, 0),
                    Some(Err(e)) => return Err(ChatError::Decode(e.to_string())),
                    None => (None, 0),
                }
            };

            match frame {
                Some(frame) => {
                    self.buf.drain(..consumed);
                    frames.push(frame);
                }
                None => break,
            }
        }
        Ok(frames)
    }

    /// Signal that the transport closed. Leftover bytes that never formed
    /// a complete frame are a decode error, not silence.
    pub fn finish(self) -> Result<(), ChatError> {
        if self.buf.iter().all(|b| b.is_ascii_whitespace()) {
            Ok(())
        } else {
            Err(ChatError::Decode(format!(
                "stream closed mid-frame ({} bytes left undecoded)",
                self.buf.len()
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whole_frame_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder
            .push(br#"{"text":"Hel","isLast":false}"#)
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].text, "Hel");
        assert!(!frames[0].is_last);
    }

    #[test]
    fn test_frame_split_across_chunks() {
        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(br#"{"text":"Hel"#).unwrap().is_empty());
        assert!(decoder.push(br#"lo","is"#).unwrap().is_empty());
        let frames = decoder.push(br#"Last":true}"#).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].text, "Hello");
        assert!(frames[0].is_last);
    }

    #[test]
    fn test_split_inside_multibyte_character() {
        let payload = r#"{"text":"café ☕","isLast":false}"#.as_bytes();
        // Cut inside the 3-byte encoding of the cup character.
        let cut = payload.iter().position(|&b| b == 0xe2).unwrap() + 1;

        let mut decoder = FrameDecoder::new();
        assert!(decoder.push(&payload[..cut]).unwrap().is_empty());
        let frames = decoder.push(&payload[cut..]).unwrap();
        assert_eq!(frames[0].text, "café ☕");
    }

    #[test]
    fn test_merged_frames_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder
            .push(br#"{"text":"Hel","isLast":false}{"text":"lo","isLast":false}{"text":" world","isLast":true}"#)
            .unwrap();
        let texts: Vec<&str> = frames.iter().map(|f| f.text.as_str()).collect();
        assert_eq!(texts, ["Hel", "lo", " world"]);
        assert!(frames[2].is_last);
    }

    #[test]
    fn test_merged_chunk_with_partial_tail() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder
            .push(br#"{"text":"a","isLast":false}{"text":"b""#)
            .unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].text, "a");

        let frames = decoder.push(br#","isLast":true}"#).unwrap();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].text, "b");
    }

    #[test]
    fn test_missing_is_last_defaults_to_false() {
        let mut decoder = FrameDecoder::new();
        let frames = decoder.push(br#"{"text":"hi"}"#).unwrap();
        assert!(!frames[0].is_last);
    }

    #[test]
    fn test_malformed_frame_is_a_decode_error() {
        let mut decoder = FrameDecoder::new();
        let result = decoder.push(br#"{"text":42,"isLast":false}"#);
        assert!(matches!(result, Err(ChatError::Decode(_))));
    }

    #[test]
    fn test_garbage_between_frames_is_a_decode_error() {
        let mut decoder = FrameDecoder::new();
        decoder.push(br#"{"text":"ok","isLast":false}"#).unwrap();
        let result = decoder.push(b"not json at all");
        assert!(matches!(result, Err(ChatError::Decode(_))));
    }

    #[test]
    fn test_finish_rejects_truncated_tail() {
        let mut decoder = FrameDecoder::new();
        decoder.push(br#"{"text":"partial"#).unwrap();
        assert!(matches!(decoder.finish(), Err(ChatError::Decode(_))));
    }

    #[test]
    fn test_finish_accepts_trailing_whitespace() {
        let mut decoder = FrameDecoder::new();
        decoder.push(br#"{"text":"done","isLast":true}"#).unwrap();
        decoder.push(b"  \n").unwrap();
        assert!(decoder.finish().is_ok());
    }
}
