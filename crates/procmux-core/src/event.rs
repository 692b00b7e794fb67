use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;

/// Identifies one of the child's three standard streams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    Stdout,
    Stderr,
    Stdin,
}

impl StreamKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StreamKind::Stdout => "stdout",
            StreamKind::Stderr => "stderr",
            StreamKind::Stdin => "stdin",
        }
    }
}

impl fmt::Display for StreamKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The set of streams the caller wants surfaced through the callback.
///
/// Defaults to empty. Subscribing has no effect on what is recorded in the
/// final result, only on which events the callback receives.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotifySet {
    #[serde(default)]
    stdout: bool,
    #[serde(default)]
    stderr: bool,
    #[serde(default)]
    stdin: bool,
}

impl NotifySet {
    /// Empty subscription set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscription set covering all three streams.
    pub fn all() -> Self {
        Self {
            stdout: true,
            stderr: true,
            stdin: true,
        }
    }

    pub fn stdout(mut self) -> Self {
        self.stdout = true;
        self
    }

    pub fn stderr(mut self) -> Self {
        self.stderr = true;
        self
    }

    pub fn stdin(mut self) -> Self {
        self.stdin = true;
        self
    }

    pub fn contains(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Stdout => self.stdout,
            StreamKind::Stderr => self.stderr,
            StreamKind::Stdin => self.stdin,
        }
    }

    pub fn is_empty(&self) -> bool {
        !(self.stdout || self.stderr || self.stdin)
    }
}

/// A single observation surfaced to the caller's callback.
///
/// Output chunks carry the exact bytes drained from the pipe in arrival
/// order; `StdinReady` carries a writable handle the callback can use to
/// feed the child synchronously.
pub enum ExecEvent<'a> {
    /// Bytes just drained from the child's stdout.
    Stdout(&'a [u8]),
    /// Bytes just drained from the child's stderr.
    Stderr(&'a [u8]),
    /// The child's stdin can accept a write.
    StdinReady(&'a mut StdinWriter),
}

impl ExecEvent<'_> {
    pub fn stream(&self) -> StreamKind {
        match self {
            ExecEvent::Stdout(_) => StreamKind::Stdout,
            ExecEvent::Stderr(_) => StreamKind::Stderr,
            ExecEvent::StdinReady(_) => StreamKind::Stdin,
        }
    }
}

impl fmt::Debug for ExecEvent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecEvent::Stdout(chunk) => f.debug_tuple("Stdout").field(&chunk.len()).finish(),
            ExecEvent::Stderr(chunk) => f.debug_tuple("Stderr").field(&chunk.len()).finish(),
            ExecEvent::StdinReady(_) => f.write_str("StdinReady"),
        }
    }
}

/// Writable handle handed to the callback on `StdinReady`.
///
/// Writes accumulate in a pending buffer; after the callback returns, the
/// engine flushes the buffer to the child's stdin pipe immediately. Calling
/// [`close`](StdinWriter::close) ends the child's stdin after the flush.
#[derive(Debug, Default)]
pub struct StdinWriter {
    pending: Vec<u8>,
    closed: bool,
}

impl StdinWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Signal end-of-input: the child's stdin is shut down once the pending
    /// bytes have been flushed.
    pub fn close(&mut self) {
        self.closed = true;
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Take the bytes buffered so far. Used by the execution loop after the
    /// callback returns.
    pub fn take_pending(&mut self) -> Vec<u8> {
        std::mem::take(&mut self.pending)
    }
}

impl io::Write for StdinWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.pending.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}
