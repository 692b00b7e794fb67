//! Run a child process, stream its output while it runs, and enforce a
//! wall-clock deadline.
//!
//! The engine spawns the child with piped stdio, then drives a single
//! readiness loop that interleaves draining stdout and stderr, offering a
//! write opportunity on stdin, detecting process exit, and checking the
//! deadline. Everything the child writes is recorded; subscribed streams are
//! additionally surfaced to a synchronous callback as the bytes arrive.
//!
//! A timeout fault carries the child's pid and leaves the child running —
//! termination is the caller's decision.
//!
//! # Example
//!
//! ```no_run
//! use procmux::{CommandSpec, ExecEvent, Executor, NotifySet};
//! use std::time::Duration;
//!
//! # async fn demo() -> Result<(), Box<dyn std::error::Error>> {
//! let spec = CommandSpec::builder()
//!     .program("sh")
//!     .args(["-c", "echo hello; echo oops >&2"])
//!     .timeout(Duration::from_secs(5))
//!     .notify(NotifySet::new().stdout())
//!     .build()?;
//!
//! let result = Executor::new(spec)
//!     .run_with(|event| {
//!         if let ExecEvent::Stdout(chunk) = event {
//!             print!("{}", String::from_utf8_lossy(chunk));
//!         }
//!     })
//!     .await?;
//!
//! assert_eq!(result.exit_code, 0);
//! assert_eq!(result.stderr, "oops\n");
//! # Ok(())
//! # }
//! ```

mod factory;
mod runner;

pub use factory::PlatformEnvFactory;
pub use runner::Executor;

// Re-export core functionality
pub use procmux_core::*;
