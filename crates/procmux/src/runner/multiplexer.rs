use std::time::{Duration, Instant};

use futures::FutureExt;
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWriteExt};
use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout};
use tracing::{debug, trace, warn};

use crate::runner::launcher::SpawnedChild;
use procmux_core::{
    ExecError, ExecEvent, ExecResult, NotifySet, OutputAccumulator, StdinWriter, StreamKind,
};

/// Upper bound on one readiness wait, so deadline and exit checks happen
/// promptly even when nothing becomes ready.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Bound on the post-loop exit-status wait when no deadline is configured.
const EXIT_WAIT_DEFAULT: Duration = Duration::from_secs(60);

const READ_CHUNK: usize = 8 * 1024;

/// Which select branch fired in one loop iteration.
enum Fired {
    Stdout(std::io::Result<usize>),
    Stderr(std::io::Result<usize>),
    Tick,
}

/// The readiness loop over one child's three pipes.
///
/// Owns the child and its endpoints exclusively; endpoints are `None` once
/// closed, and everything still open is dropped when the multiplexer ends,
/// on the fault paths included.
pub(crate) struct Multiplexer<'cb> {
    child: Child,
    pid: u32,
    stdin: Option<ChildStdin>,
    stdout: Option<ChildStdout>,
    stderr: Option<ChildStderr>,
    started: Instant,
    deadline: Option<Instant>,
    notify: NotifySet,
    callback: Option<&'cb mut dyn FnMut(ExecEvent<'_>)>,
    stdout_acc: OutputAccumulator,
    stderr_acc: OutputAccumulator,
    scratch_out: Vec<u8>,
    scratch_err: Vec<u8>,
}

impl<'cb> Multiplexer<'cb> {
    pub(crate) fn new(
        spawned: SpawnedChild,
        started: Instant,
        deadline: Option<Instant>,
        notify: NotifySet,
        callback: Option<&'cb mut dyn FnMut(ExecEvent<'_>)>,
    ) -> Self {
        Self {
            child: spawned.child,
            pid: spawned.pid,
            stdin: spawned.stdin,
            stdout: spawned.stdout,
            stderr: spawned.stderr,
            started,
            deadline,
            notify,
            callback,
            stdout_acc: OutputAccumulator::new(),
            stderr_acc: OutputAccumulator::new(),
            scratch_out: Vec::with_capacity(READ_CHUNK),
            scratch_err: Vec::with_capacity(READ_CHUNK),
        }
    }

    pub(crate) async fn run(mut self) -> Result<ExecResult, ExecError> {
        self.pump().await?;
        self.reap().await
    }

    /// One readiness wait per iteration until the child exits or the
    /// deadline fires.
    async fn pump(&mut self) -> Result<(), ExecError> {
        loop {
            self.scratch_out.clear();
            self.scratch_err.clear();

            let wait = self.wait_slice();
            let stdout_open = self.stdout.is_some();
            let stderr_open = self.stderr.is_some();

            let fired = tokio::select! {
                first = read_some(self.stdout.as_mut(), &mut self.scratch_out), if stdout_open => {
                    Fired::Stdout(first)
                }
                first = read_some(self.stderr.as_mut(), &mut self.scratch_err), if stderr_open => {
                    Fired::Stderr(first)
                }
                _ = tokio::time::sleep(wait) => Fired::Tick,
            };

            // Deadline check comes straight after the wait; bytes read this
            // iteration die with the loop state.
            self.check_deadline()?;

            match fired {
                Fired::Stdout(first) => {
                    let arrived =
                        drain_ready(&mut self.stdout, first, &mut self.scratch_out, &mut self.stdout_acc)?;
                    if arrived && self.notify.contains(StreamKind::Stdout) {
                        if let Some(cb) = self.callback.as_mut() {
                            cb(ExecEvent::Stdout(&self.scratch_out));
                        }
                    }
                }
                Fired::Stderr(first) => {
                    let arrived =
                        drain_ready(&mut self.stderr, first, &mut self.scratch_err, &mut self.stderr_acc)?;
                    if arrived && self.notify.contains(StreamKind::Stderr) {
                        if let Some(cb) = self.callback.as_mut() {
                            cb(ExecEvent::Stderr(&self.scratch_err));
                        }
                    }
                }
                Fired::Tick => {}
            }

            // Exit check before the stdin offer, so nothing is written into
            // a closed pipe.
            if let Some(status) = self.child.try_wait()? {
                debug!("Child {} exited with {}", self.pid, status);
                break;
            }

            self.offer_stdin().await?;
        }
        Ok(())
    }

    /// Final drain, bounded exit-status wait, snapshot.
    async fn reap(mut self) -> Result<ExecResult, ExecError> {
        // Output can land between the last readiness check and the exit
        // check; pick it up exactly like an in-loop drain.
        self.scratch_out.clear();
        let arrived = drain_remaining(&mut self.stdout, &mut self.scratch_out, &mut self.stdout_acc)?;
        if arrived && self.notify.contains(StreamKind::Stdout) {
            if let Some(cb) = self.callback.as_mut() {
                cb(ExecEvent::Stdout(&self.scratch_out));
            }
        }

        self.scratch_err.clear();
        let arrived = drain_remaining(&mut self.stderr, &mut self.scratch_err, &mut self.stderr_acc)?;
        if arrived && self.notify.contains(StreamKind::Stderr) {
            if let Some(cb) = self.callback.as_mut() {
                cb(ExecEvent::Stderr(&self.scratch_err));
            }
        }

        let bound = match self.deadline {
            Some(deadline) => deadline.saturating_duration_since(Instant::now()),
            None => EXIT_WAIT_DEFAULT,
        };
        let status = match tokio::time::timeout(bound, self.child.wait()).await {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => return Err(ExecError::Io(e)),
            Err(_) => {
                warn!("Child {} did not report exit status in time", self.pid);
                return Err(ExecError::TimeoutExceeded { pid: self.pid });
            }
        };

        // Close whatever is still open before building the snapshot.
        self.stdin = None;
        self.stdout = None;
        self.stderr = None;

        let exit_code = status.code().unwrap_or(-1);
        debug!(
            "Child {} reaped: exit_code={} stdout={}B stderr={}B",
            self.pid,
            exit_code,
            self.stdout_acc.len(),
            self.stderr_acc.len()
        );

        Ok(ExecResult {
            exit_code,
            stdout: self.stdout_acc.into_string(),
            stderr: self.stderr_acc.into_string(),
            duration: self.started.elapsed(),
        })
    }

    /// Wait timeout for this iteration: the lesser of the remaining time to
    /// the deadline and the poll interval.
    fn wait_slice(&self) -> Duration {
        match self.deadline {
            Some(deadline) => deadline
                .saturating_duration_since(Instant::now())
                .min(POLL_INTERVAL),
            None => POLL_INTERVAL,
        }
    }

    fn check_deadline(&self) -> Result<(), ExecError> {
        if let Some(deadline) = self.deadline {
            if Instant::now() >= deadline {
                warn!("Deadline exceeded for child {}", self.pid);
                return Err(ExecError::TimeoutExceeded { pid: self.pid });
            }
        }
        Ok(())
    }

    /// Offer the callback a write opportunity on stdin, then flush what it
    /// buffered. The flush may block on pipe backpressure; that is the
    /// caller's accepted risk.
    async fn offer_stdin(&mut self) -> Result<(), ExecError> {
        if !self.notify.contains(StreamKind::Stdin) {
            return Ok(());
        }
        let Some(cb) = self.callback.as_mut() else {
            return Ok(());
        };
        let Some(stdin) = self.stdin.as_mut() else {
            return Ok(());
        };

        let mut writer = StdinWriter::new();
        cb(ExecEvent::StdinReady(&mut writer));

        let pending = writer.take_pending();
        if !pending.is_empty() {
            trace!("Writing {} bytes to child {} stdin", pending.len(), self.pid);
            match stdin.write_all(&pending).await {
                Ok(()) => {
                    if let Err(e) = stdin.flush().await {
                        if !is_disconnect(&e) {
                            return Err(ExecError::Io(e));
                        }
                        self.stdin = None;
                        return Ok(());
                    }
                }
                Err(e) if is_disconnect(&e) => {
                    // The child closed its end; exit detection follows.
                    self.stdin = None;
                    return Ok(());
                }
                Err(e) => return Err(ExecError::Io(e)),
            }
        }

        if writer.is_closed() {
            debug!("Callback closed stdin of child {}", self.pid);
            if let Some(mut stdin) = self.stdin.take() {
                let _ = stdin.shutdown().await;
            }
        }
        Ok(())
    }
}

/// First read of an open stream. Disabled branches never poll this.
async fn read_some<R: AsyncRead + Unpin>(
    reader: Option<&mut R>,
    buf: &mut Vec<u8>,
) -> std::io::Result<usize> {
    match reader {
        Some(reader) => reader.read_buf(buf).await,
        None => std::future::pending().await,
    }
}

/// Fold the first read result in, then keep pulling whatever is already
/// buffered without awaiting. Returns whether any bytes arrived; EOF and
/// peer-closed errors close the endpoint.
fn drain_ready<R: AsyncRead + Unpin>(
    slot: &mut Option<R>,
    first: std::io::Result<usize>,
    scratch: &mut Vec<u8>,
    acc: &mut OutputAccumulator,
) -> Result<bool, ExecError> {
    match first {
        Ok(0) => *slot = None,
        Ok(_) => return drain_remaining(slot, scratch, acc),
        Err(e) if is_disconnect(&e) => *slot = None,
        Err(e) => return Err(ExecError::Io(e)),
    }
    let arrived = !scratch.is_empty();
    acc.append(scratch);
    Ok(arrived)
}

/// One non-blocking drain pass: read until would-block or EOF.
fn drain_remaining<R: AsyncRead + Unpin>(
    slot: &mut Option<R>,
    scratch: &mut Vec<u8>,
    acc: &mut OutputAccumulator,
) -> Result<bool, ExecError> {
    while let Some(reader) = slot.as_mut() {
        match reader.read_buf(scratch).now_or_never() {
            None => break,
            Some(Ok(0)) => *slot = None,
            Some(Ok(_)) => {}
            Some(Err(e)) if is_disconnect(&e) => *slot = None,
            Some(Err(e)) => return Err(ExecError::Io(e)),
        }
    }
    let arrived = !scratch.is_empty();
    acc.append(scratch);
    Ok(arrived)
}

fn is_disconnect(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::BrokenPipe | std::io::ErrorKind::ConnectionReset
    )
}
