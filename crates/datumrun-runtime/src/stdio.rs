//! Interactive backend speaking the line protocol over stdio.
//!
//! Both sides share one stream pair with arbitrary log noise, so every
//! protocol line is prefixed with a direction marker. Lines without the
//! inbound marker are skipped.

use std::io::{BufRead, BufReader, Stdin, Stdout, Write};

use tracing::trace;

use crate::protocol::{CommunicationBackend, Message, ProtocolError};

/// Marker prefixing lines the runtime emits.
pub const OUT_MARKER: &str = "<--RUNTIME-->";

/// Marker prefixing lines the controller emits.
pub const IN_MARKER: &str = "<--CONTROLLER-->";

/// Line-based backend over a buffered reader/writer pair.
pub struct StdioBackend<R: BufRead, W: Write> {
    reader: R,
    writer: W,
}

impl StdioBackend<BufReader<Stdin>, Stdout> {
    /// Bind the process's own stdio streams.
    pub fn stdio() -> Self {
        Self {
            reader: BufReader::new(std::io::stdin()),
            writer: std::io::stdout(),
        }
    }
}

impl<R: BufRead, W: Write> StdioBackend<R, W> {
    /// Bind arbitrary streams; used by tests.
    pub fn with_streams(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    fn read_response(&mut self) -> Result<Message, ProtocolError> {
        let mut line = String::new();
        loop {
            line.clear();
            let read = self.reader.read_line(&mut line)?;
            if read == 0 {
                return Err(ProtocolError::ChannelClosed);
            }
            let Some(payload) = line.trim_end().strip_prefix(IN_MARKER) else {
                trace!(line = line.trim_end(), "skipping non-protocol line");
                continue;
            };
            return serde_json::from_str(payload)
                .map_err(|_| ProtocolError::MalformedMessage(payload.to_owned()));
        }
    }
}

impl<R: BufRead, W: Write> CommunicationBackend for StdioBackend<R, W> {
    fn send_message(&mut self, message: Message) -> Result<Message, ProtocolError> {
        let encoded = serde_json::to_string(&message)?;
        writeln!(self.writer, "{OUT_MARKER}{encoded}")?;
        self.writer.flush()?;
        self.read_response()
    }
}
