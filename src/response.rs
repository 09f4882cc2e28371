//! TL1 response framing and parsing
//!
//! Responses arrive on the socket as `\r\n`-framed text with no length
//! prefix. Each block opens with a two-line header frame (an empty line and
//! the system identification line), carries zero or more data lines, may
//! interleave autonomous messages at any point, and closes with a completion
//! line plus a lone `;` terminator. Success and failure terminate
//! differently: a non-`COMPLD` completion status is followed by two extra
//! framed lines holding the error code and the delimited error message.

use std::io::Read;

use tracing::trace;

use crate::commands::COMPLD;
use crate::error::{Result, Tl1Error};
use crate::policy::ErrorPolicy;

/// Line terminator used in both directions.
pub const LINE_SEP: &str = "\r\n";

/// Completion-line prefix for the fixed correlation tag. The switch pads the
/// tag with two spaces.
pub(crate) const COMPLETION_PREFIX: &str = "M  123 ";

const TERMINATOR: &str = ";";
const AUTONOMOUS_PREFIX: &str = "A ";
const READ_CHUNK: usize = 4096;

/// Classification of a single framed response line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    /// Payload line, yielded to the caller
    Data,
    /// Completion line; `status` is the token after the ctag
    Completion {
        /// Status token, `COMPLD` on success
        status: &'a str,
    },
    /// Start of an unsolicited autonomous message
    Autonomous,
    /// Lone `;` closing a block or an autonomous sub-message
    Terminator,
}

/// Classify one complete line.
pub fn classify(line: &str) -> LineKind<'_> {
    if line == TERMINATOR {
        LineKind::Terminator
    } else if let Some(status) = line.strip_prefix(COMPLETION_PREFIX) {
        LineKind::Completion { status }
    } else if line.starts_with(AUTONOMOUS_PREFIX) {
        LineKind::Autonomous
    } else {
        LineKind::Data
    }
}

/// A fully drained response block: the ordered data lines of one successful
/// command exchange. Failed exchanges never produce a block; they surface as
/// a classified [`Tl1Error`] instead.
#[derive(Debug, Clone, Default)]
pub struct ResponseBlock {
    /// Data lines in arrival order, autonomous traffic filtered out
    pub lines: Vec<String>,
}

impl ResponseBlock {
    /// Number of data lines
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// True when the block carried no data lines
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Iterate over the data lines
    pub fn iter(&self) -> std::slice::Iter<'_, String> {
        self.lines.iter()
    }
}

impl IntoIterator for ResponseBlock {
    type Item = String;
    type IntoIter = std::vec::IntoIter<String>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.into_iter()
    }
}

/// Strip the `"   /* message */"` framing from an error-message line: trim,
/// then drop the outer three characters from each side.
fn strip_error_framing(line: &str) -> &str {
    let trimmed = line.trim();
    if trimmed.len() >= 6 && trimmed.is_char_boundary(3) && trimmed.is_char_boundary(trimmed.len() - 3)
    {
        &trimmed[3..trimmed.len() - 3]
    } else {
        trimmed
    }
}

/// Strip whitespace and the surrounding double quotes from a data line
/// payload (`   "1,49"` becomes `1,49`).
pub fn strip_quoted(line: &str) -> &str {
    let trimmed = line.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
}

/// Incremental reader that turns the raw byte stream into one classified
/// [`ResponseBlock`].
///
/// The reader owns an append-only receive buffer; when no complete line is
/// buffered it performs a blocking read on the underlying stream. Reading a
/// block is non-restartable and always drains through to the terminal
/// outcome, so a finished call leaves the stream positioned at the start of
/// the next block.
pub struct ResponseReader<'a, R: Read> {
    stream: &'a mut R,
    policy: ErrorPolicy,
    buf: Vec<u8>,
}

impl<'a, R: Read> ResponseReader<'a, R> {
    /// Create a reader over `stream` classifying errors under `policy`.
    pub fn new(stream: &'a mut R, policy: ErrorPolicy) -> Self {
        Self {
            stream,
            policy,
            buf: Vec::with_capacity(READ_CHUNK),
        }
    }

    /// Append one blocking read's worth of bytes to the receive buffer.
    fn fill(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK];
        match self.stream.read(&mut chunk) {
            Ok(0) => Err(Tl1Error::ConnectionClosed),
            Ok(n) => {
                self.buf.extend_from_slice(&chunk[..n]);
                Ok(())
            }
            Err(e)
                if e.kind() == std::io::ErrorKind::WouldBlock
                    || e.kind() == std::io::ErrorKind::TimedOut =>
            {
                Err(Tl1Error::TimedOut)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Extract the next complete `\r\n`-framed line, reading as needed.
    fn next_line(&mut self) -> Result<String> {
        loop {
            if let Some(pos) = self
                .buf
                .windows(LINE_SEP.len())
                .position(|w| w == LINE_SEP.as_bytes())
            {
                let line = String::from_utf8_lossy(&self.buf[..pos]).into_owned();
                self.buf.drain(..pos + LINE_SEP.len());
                trace!("received: {}", line);
                return Ok(line);
            }
            self.fill()?;
        }
    }

    /// Drain one complete response block.
    ///
    /// Data lines are collected in order; autonomous messages and their own
    /// terminators are consumed silently; a non-`COMPLD` completion reads the
    /// two error lines, classifies them under the policy and fails the block
    /// without reading further.
    pub fn read_block(mut self) -> Result<ResponseBlock> {
        // Header frame: empty line + system identification line, present on
        // every block.
        self.next_line()?;
        self.next_line()?;

        let mut lines = Vec::new();
        let mut in_autonomous = false;
        loop {
            let line = self.next_line()?;
            match classify(&line) {
                LineKind::Terminator => {
                    // A terminator inside an autonomous message only ends
                    // that sub-message, not the block.
                    if in_autonomous {
                        in_autonomous = false;
                    } else {
                        return Ok(ResponseBlock { lines });
                    }
                }
                LineKind::Completion { status } => {
                    in_autonomous = false;
                    if status != COMPLD {
                        let code = self.next_line()?;
                        let message = self.next_line()?;
                        return Err(self
                            .policy
                            .classify(code.trim(), strip_error_framing(&message)));
                    }
                }
                LineKind::Autonomous => in_autonomous = true,
                LineKind::Data => lines.push(line),
            }
        }
    }
}
