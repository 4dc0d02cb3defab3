//! Tokio codec for the central's line-oriented console.
//!
//! `ConsoleCodec` turns the raw serial byte stream into clean text lines and
//! console commands into CRLF-terminated bytes, so the serial transport can be
//! driven through Tokio's `Framed`.
//!
//! # Architecture
//!
//! ```text
//! Serial bytes -> split on LF -> lossy UTF-8 -> strip ANSI -> trim CR -> String
//! ConsoleCommand -> "<command>\r\n" -> Serial bytes
//! ```
//!
//! # Robustness
//!
//! The central is a microcontroller that may reset mid-line, so the decoder
//! never fails on content:
//! - invalid UTF-8 is replaced, not rejected
//! - a line longer than the configured maximum is emitted in pieces instead
//!   of growing the buffer
//! - a trailing partial line is emitted at end of stream
//!
//! # Usage with Tokio Framed
//!
//! ```rust,no_run
//! use futures::{SinkExt, StreamExt};
//! use keykeeper_protocol::{ConsoleCodec, ConsoleCommand};
//! use tokio_util::codec::Framed;
//!
//! # async fn example<T>(port: T) -> std::io::Result<()>
//! # where T: tokio::io::AsyncRead + tokio::io::AsyncWrite + Unpin {
//! let mut framed = Framed::new(port, ConsoleCodec::new());
//! framed.send(ConsoleCommand::BleStart).await?;
//!
//! while let Some(line) = framed.next().await {
//!     println!("{}", line?);
//! }
//! # Ok(())
//! # }
//! ```

use bytes::BytesMut;
use std::io;
use tokio_util::codec::{Decoder, Encoder};

use crate::{ConsoleCommand, strip_ansi};
use keykeeper_core::constants::MAX_LINE_LENGTH;

/// Codec splitting the console stream into lines.
#[derive(Debug, Clone)]
pub struct ConsoleCodec {
    /// Index up to which the buffer is known not to contain a newline.
    next_index: usize,

    /// Maximum line length before a forced split.
    max_line_length: usize,
}

impl ConsoleCodec {
    /// Create a codec with the default maximum line length.
    ///
    /// ```
    /// use keykeeper_protocol::ConsoleCodec;
    ///
    /// let codec = ConsoleCodec::new();
    /// assert_eq!(codec.max_line_length(), 4096);
    /// ```
    pub fn new() -> Self {
        Self::with_max_line_length(MAX_LINE_LENGTH)
    }

    /// Create a codec with a custom maximum line length.
    pub fn with_max_line_length(max_line_length: usize) -> Self {
        Self {
            next_index: 0,
            max_line_length: max_line_length.max(1),
        }
    }

    pub fn max_line_length(&self) -> usize {
        self.max_line_length
    }

    fn finish_line(raw: &[u8]) -> String {
        let text = String::from_utf8_lossy(raw);
        strip_ansi(&text).trim_matches('\r').to_string()
    }
}

impl Default for ConsoleCodec {
    fn default() -> Self {
        Self::new()
    }
}

impl Decoder for ConsoleCodec {
    type Item = String;
    type Error = io::Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        let search_from = self.next_index.min(src.len());

        if let Some(offset) = src[search_from..].iter().position(|b| *b == b'\n') {
            let newline = search_from + offset;
            let line = src.split_to(newline + 1);
            self.next_index = 0;
            return Ok(Some(Self::finish_line(&line[..newline])));
        }

        if src.len() >= self.max_line_length {
            let line = src.split_to(self.max_line_length);
            self.next_index = 0;
            return Ok(Some(Self::finish_line(&line)));
        }

        self.next_index = src.len();
        Ok(None)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<String>, io::Error> {
        if let Some(line) = self.decode(src)? {
            return Ok(Some(line));
        }
        if src.is_empty() {
            return Ok(None);
        }

        let rest = src.split_to(src.len());
        self.next_index = 0;
        Ok(Some(Self::finish_line(&rest)))
    }
}

impl Encoder<ConsoleCommand> for ConsoleCodec {
    type Error = io::Error;

    fn encode(&mut self, item: ConsoleCommand, dst: &mut BytesMut) -> Result<(), io::Error> {
        dst.extend_from_slice(&item.to_wire());
        Ok(())
    }
}
