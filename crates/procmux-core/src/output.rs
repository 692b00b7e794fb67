use std::time::Duration;

/// Append-only byte buffer for one output stream.
///
/// Every byte the child writes to the stream lands here in arrival order,
/// whether or not the stream is subscribed.
#[derive(Debug, Default)]
pub struct OutputAccumulator {
    bytes: Vec<u8>,
}

impl OutputAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, chunk: &[u8]) {
        self.bytes.extend_from_slice(chunk);
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the accumulator into the snapshot text (lossy UTF-8).
    pub fn into_string(self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

/// Immutable snapshot of a completed execution.
///
/// Produced exactly once per successful run; a fault never yields a partial
/// snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecResult {
    /// The child's exit code (`-1` when terminated by a signal).
    pub exit_code: i32,
    /// Everything the child wrote to stdout.
    pub stdout: String,
    /// Everything the child wrote to stderr.
    pub stderr: String,
    /// Total wall time from launch to reap.
    pub duration: Duration,
}

impl ExecResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}
