//! Line-based codec for tokio.
//!
//! Frames a byte stream into newline-terminated lines. The terminator is not
//! part of the yielded frame, and a `\r` immediately before it is stripped.

use bytes::{BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};
use tracing::{debug, warn};

use crate::error;

/// Longest frame, in bytes and excluding the terminator, that is delivered.
pub const DEFAULT_MAX_LINE_LEN: usize = 2048;

/// Line-based codec that handles newline-terminated messages.
///
/// Decoding never fails on content: overlong lines are discarded up to the
/// next newline, empty lines are skipped and lines that are not valid UTF-8
/// are dropped. Only transport errors reach the caller.
#[derive(Debug, Clone)]
pub struct LineCodec {
    /// Index of next byte to check for newline
    next_index: usize,
    /// Maximum line length
    max_len: usize,
    /// Set while skipping the tail of an overlong line
    discarding: bool,
}

impl LineCodec {
    /// Create a codec with the default maximum line length.
    pub fn new() -> Self {
        Self::with_max_len(DEFAULT_MAX_LINE_LEN)
    }

    /// Create a new codec with custom max line length.
    pub fn with_max_len(max_len: usize) -> Self {
        Self {
            next_index: 0,
            max_len,
            discarding: false,
        }
    }

    /// Maximum line length this codec delivers.
    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Turn one raw line (terminator included) into a frame, if it is usable.
    fn finish_line(&self, mut line: BytesMut) -> Option<String> {
        line.truncate(line.len() - 1);
        if line.last() == Some(&b'\r') {
            line.truncate(line.len() - 1);
        }
        if line.is_empty() {
            return None;
        }
        if line.len() > self.max_len {
            warn!(len = line.len(), limit = self.max_len, "discarding overlong line");
            return None;
        }
        match String::from_utf8(line.to_vec()) {
            Ok(data) => Some(data),
            Err(e) => {
                debug!(
                    byte_pos = e.utf8_error().valid_up_to(),
                    "dropping line with invalid utf-8"
                );
                None
            }
        }
    }
}

impl Default for LineCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for LineCodec {
    type Item = String;
    type Error = error::ProtocolError;

    fn decode(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        loop {
            // Look for newline starting from where we left off
            let Some(offset) = src[self.next_index..].iter().position(|b| *b == b'\n') else {
                if src.len() > self.max_len + 1 {
                    // No terminator within reach; drop what we have and
                    // keep dropping until the next newline.
                    if !self.discarding {
                        warn!(limit = self.max_len, "discarding overlong line");
                    }
                    src.clear();
                    self.next_index = 0;
                    self.discarding = true;
                } else {
                    self.next_index = src.len();
                }
                return Ok(None);
            };

            let line = src.split_to(self.next_index + offset + 1);
            self.next_index = 0;

            if self.discarding {
                self.discarding = false;
                continue;
            }

            if let Some(data) = self.finish_line(line) {
                return Ok(Some(data));
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> error::Result<Option<String>> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if !src.is_empty() {
            debug!(len = src.len(), "dropping unterminated data at end of stream");
            src.clear();
        }
        self.next_index = 0;
        self.discarding = false;
        Ok(None)
    }
}

impl Encoder<String> for LineCodec {
    type Error = error::ProtocolError;

    fn encode(&mut self, msg: String, dst: &mut BytesMut) -> error::Result<()> {
        // A line never carries its own terminator.
        let end = msg.find(['\r', '\n']).unwrap_or(msg.len());
        dst.reserve(end + 1);
        dst.put_slice(&msg.as_bytes()[..end]);
        dst.put_u8(b'\n');
        Ok(())
    }
}
