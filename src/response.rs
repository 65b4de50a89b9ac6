//! Writing the error response.
//!
//! This is the one place where bytes leave the crate. A response channel
//! accepts a single error; a second attempt is a caller bug and is reported
//! as [`EmitError::AlreadyCommitted`] rather than retried. Write failures
//! (client gone, socket closed) are fatal and propagate to the dispatcher.

use crate::status::HttpStatus;
use std::fmt;
use std::io::{self, Write};

/// Outbound side of one HTTP exchange.
pub trait ResponseChannel {
    /// True once a status line has been written (or attempted).
    fn is_committed(&self) -> bool;

    /// Write `status` and a plain-text body holding `message`.
    fn send_error(&mut self, status: HttpStatus, message: &str) -> io::Result<()>;
}

/// Failure to emit an error response.
#[derive(Debug)]
pub enum EmitError {
    /// The channel already carries a response.
    AlreadyCommitted,
    /// Writing to the channel failed.
    Io(io::Error),
}

impl fmt::Display for EmitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AlreadyCommitted => f.write_str("response already committed"),
            Self::Io(e) => write!(f, "failed to write error response: {}", e),
        }
    }
}

impl std::error::Error for EmitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AlreadyCommitted => None,
            Self::Io(e) => Some(e),
        }
    }
}

impl From<io::Error> for EmitError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Write `status` and `message` to `channel` exactly once.
pub fn emit(
    status: HttpStatus,
    message: &str,
    channel: &mut dyn ResponseChannel,
) -> Result<(), EmitError> {
    if channel.is_committed() {
        return Err(EmitError::AlreadyCommitted);
    }
    channel.send_error(status, message)?;
    Ok(())
}

/// HTTP/1.1 response written straight to a byte sink.
///
/// ```rust
/// use palisade_http_errors::{HttpStatus, ResponseChannel, WireResponse};
///
/// let mut response = WireResponse::new(Vec::new());
/// response.send_error(HttpStatus::NOT_FOUND, "no such pipeline").unwrap();
/// let wire = String::from_utf8(response.into_inner()).unwrap();
/// assert!(wire.starts_with("HTTP/1.1 404 Not Found\r\n"));
/// assert!(wire.ends_with("\r\n\r\nno such pipeline"));
/// ```
#[derive(Debug)]
pub struct WireResponse<W: Write> {
    writer: W,
    committed: bool,
}

impl<W: Write> WireResponse<W> {
    /// Uncommitted response over `writer`.
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            committed: false,
        }
    }

    /// Underlying writer.
    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Unwrap the writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResponseChannel for WireResponse<W> {
    #[inline]
    fn is_committed(&self) -> bool {
        self.committed
    }

    fn send_error(&mut self, status: HttpStatus, message: &str) -> io::Result<()> {
        if self.committed {
            return Err(io::Error::other("response already committed"));
        }
        // Committed even if the write below fails; the stream state is unknown.
        self.committed = true;

        write!(
            self.writer,
            "HTTP/1.1 {} {}\r\nContent-Type: text/plain; charset=utf-8\r\nContent-Length: {}\r\n\r\n",
            status.as_u16(),
            status.reason_phrase(),
            message.len()
        )?;
        self.writer.write_all(message.as_bytes())?;
        self.writer.flush()
    }
}
