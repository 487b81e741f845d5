// src/supervisor/output.rs

//! Combined output pipe of the supervised process.
//!
//! stdout and stderr of the child are both attached to the write end of one
//! OS pipe, so the kernel keeps the order the process wrote in. The parent
//! reads the other end line by line.

use std::io;
use std::os::fd::OwnedFd;
use std::process::Stdio;

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::net::unix::pipe;

/// Parent-side halves of the combined pipe, before the child is spawned.
pub struct CombinedPipe {
    /// Read end kept by the parent.
    pub reader: OwnedFd,
    /// Goes to the child's stdout.
    pub stdout: Stdio,
    /// Goes to the child's stderr.
    pub stderr: Stdio,
}

impl CombinedPipe {
    /// Open a pipe whose write end is shared by stdout and stderr.
    ///
    /// Both `Stdio` values must be handed to the command and the command
    /// dropped after spawning, otherwise the reader never sees EOF.
    pub fn open() -> io::Result<Self> {
        let (reader, writer) = io::pipe()?;
        let stdout = Stdio::from(writer.try_clone()?);
        let stderr = Stdio::from(writer);
        Ok(Self {
            reader: OwnedFd::from(reader),
            stdout,
            stderr,
        })
    }
}

/// Register the read end with the tokio reactor. Needs a runtime context.
pub fn async_reader(fd: OwnedFd) -> io::Result<pipe::Receiver> {
    pipe::Receiver::from_owned_fd(fd)
}

/// Newline-delimited reader over the combined output.
pub struct LineReader<R> {
    inner: BufReader<R>,
    buf: Vec<u8>,
}

impl<R: AsyncRead + Unpin> LineReader<R> {
    pub fn new(reader: R) -> Self {
        Self {
            inner: BufReader::new(reader),
            buf: Vec::new(),
        }
    }

    /// Next decoded line, or `None` at EOF. An unterminated tail counts as a
    /// line.
    pub async fn next_line(&mut self) -> io::Result<Option<String>> {
        self.buf.clear();
        match self.inner.read_until(b'\n', &mut self.buf).await? {
            0 => Ok(None),
            _ => Ok(Some(decode_line(&self.buf))),
        }
    }
}

/// Lossy UTF-8 decode with surrounding whitespace (and the newline) trimmed.
pub fn decode_line(raw: &[u8]) -> String {
    String::from_utf8_lossy(raw).trim().to_string()
}
