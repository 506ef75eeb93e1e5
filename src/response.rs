//! Terminal dispatch of a rendered artifact.
//!
//! Dispatching is the last thing a request does: headers and body are written
//! once and the caller is expected to stop processing afterwards. The host
//! application decides how the request ends; nothing here exits the process.

use std::io::{self, Write};

/// Destination for a dispatched artifact.
pub trait ResponseSink {
    /// Write the extra headers, then the content type, then the body.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying stream cannot be written.
    fn dispatch(&mut self, headers: &[String], content_type: &str, body: &[u8]) -> io::Result<()>;
}

/// CGI-style response: header lines, a blank line, then the raw body.
#[derive(Debug)]
pub struct CgiResponse<W: Write> {
    writer: W,
}

impl<W: Write> CgiResponse<W> {
    /// Wrap a writer, typically locked stdout.
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Recover the wrapped writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ResponseSink for CgiResponse<W> {
    fn dispatch(&mut self, headers: &[String], content_type: &str, body: &[u8]) -> io::Result<()> {
        for header in headers {
            write!(self.writer, "{}\r\n", header.trim_end())?;
        }
        write!(self.writer, "Content-Type: {content_type}\r\n\r\n")?;
        self.writer.write_all(body)?;
        self.writer.flush()
    }
}
