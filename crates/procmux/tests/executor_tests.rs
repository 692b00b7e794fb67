//! End-to-end tests driving real child processes.
//!
//! Unix-only where a shell is involved; the properties under test are the
//! capture/notification invariants, deadline behavior, and the stdin
//! round-trip.

use procmux::{CommandSpec, ExecError, ExecEvent, Executor, NotifySet};
use std::time::{Duration, Instant};

fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_test_writer()
        .try_init()
        .ok();
}

#[cfg(unix)]
fn sh(script: &str) -> CommandSpec {
    CommandSpec::builder()
        .program("sh")
        .args(["-c", script])
        .build()
        .unwrap()
}

#[cfg(unix)]
#[tokio::test]
async fn captures_stdout_and_exit_code() {
    init_tracing();
    let result = Executor::new(sh("printf 'Hello'")).run().await.unwrap();
    assert_eq!(result.stdout, "Hello");
    assert_eq!(result.stderr, "");
    assert_eq!(result.exit_code, 0);
    assert!(result.success());
}

#[cfg(unix)]
#[tokio::test]
async fn no_output_yields_empty_strings() {
    init_tracing();
    let result = Executor::new(sh("exit 0")).run().await.unwrap();
    assert_eq!(result.stdout, "");
    assert_eq!(result.stderr, "");
}

#[cfg(unix)]
#[tokio::test]
async fn exit_code_propagates_exactly() {
    init_tracing();
    let result = Executor::new(sh("exit 3")).run().await.unwrap();
    assert_eq!(result.exit_code, 3);
    assert!(!result.success());
}

#[cfg(unix)]
#[tokio::test]
async fn stderr_is_captured_separately() {
    init_tracing();
    let result = Executor::new(sh("printf out; printf err >&2"))
        .run()
        .await
        .unwrap();
    assert_eq!(result.stdout, "out");
    assert_eq!(result.stderr, "err");
}

#[cfg(unix)]
#[tokio::test]
async fn timeout_faults_with_pid_and_no_result() {
    init_tracing();
    let mut spec = sh("sleep 5");
    spec.timeout_ms = Some(200);

    let started = Instant::now();
    let err = Executor::new(spec).run().await.unwrap_err();
    let elapsed = started.elapsed();

    assert!(err.is_timeout(), "expected timeout, got {err:?}");
    let pid = err.timed_out_pid().expect("timeout carries the pid");
    assert!(pid > 0);
    assert!(
        elapsed < Duration::from_secs(2),
        "fault should fire near the deadline, took {elapsed:?}"
    );

    // The engine leaves the child running; this caller terminates it.
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;
    let _ = kill(Pid::from_raw(pid as i32), Signal::SIGKILL);
}

#[cfg(unix)]
#[tokio::test]
async fn callback_chunks_concatenate_to_result() {
    init_tracing();
    let mut spec = sh("i=0; while [ $i -lt 50 ]; do echo line $i; echo err $i >&2; i=$((i+1)); done");
    spec.notify = NotifySet::new().stdout().stderr();

    let mut seen_out: Vec<u8> = Vec::new();
    let mut seen_err: Vec<u8> = Vec::new();
    let result = Executor::new(spec)
        .run_with(|event| match event {
            ExecEvent::Stdout(chunk) => seen_out.extend_from_slice(chunk),
            ExecEvent::Stderr(chunk) => seen_err.extend_from_slice(chunk),
            ExecEvent::StdinReady(_) => panic!("stdin was not subscribed"),
        })
        .await
        .unwrap();

    assert_eq!(result.exit_code, 0);
    assert_eq!(String::from_utf8(seen_out).unwrap(), result.stdout);
    assert_eq!(String::from_utf8(seen_err).unwrap(), result.stderr);
    assert_eq!(result.stdout.lines().count(), 50);
    assert_eq!(result.stderr.lines().count(), 50);
}

#[tokio::test]
async fn callback_without_subscription_is_rejected_before_spawn() {
    init_tracing();
    // Deliberately unresolvable: if the engine tried to resolve or spawn,
    // the error would be CommandUnavailable instead of Configuration.
    let spec = CommandSpec::builder()
        .program("procmux-no-such-binary")
        .build()
        .unwrap();

    let err = Executor::new(spec)
        .run_with(|_event| {})
        .await
        .unwrap_err();
    assert!(
        err.is_configuration(),
        "expected Configuration, got {err:?}"
    );
}

#[tokio::test]
async fn unresolvable_program_is_command_unavailable() {
    init_tracing();
    let spec = CommandSpec::builder()
        .program("procmux-no-such-binary")
        .build()
        .unwrap();

    let err = Executor::new(spec).run().await.unwrap_err();
    match err {
        ExecError::CommandUnavailable { os, program } => {
            assert_eq!(os, std::env::consts::OS);
            assert_eq!(program, "procmux-no-such-binary");
        }
        other => panic!("expected CommandUnavailable, got {other:?}"),
    }
}

#[cfg(unix)]
#[tokio::test]
async fn stdin_written_in_callback_reaches_the_child() {
    init_tracing();
    let spec = CommandSpec::builder()
        .program("cat")
        .notify(NotifySet::new().stdin().stdout())
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    let mut fed = false;
    let result = Executor::new(spec)
        .run_with(|event| {
            if let ExecEvent::StdinReady(stdin) = event {
                if !fed {
                    use std::io::Write;
                    stdin.write_all(b"ping\n").unwrap();
                    fed = true;
                }
                stdin.close();
            }
        })
        .await
        .unwrap();

    assert_eq!(result.stdout, "ping\n");
    assert_eq!(result.exit_code, 0);
}

#[cfg(unix)]
#[tokio::test]
async fn heavy_output_on_both_streams_does_not_deadlock() {
    init_tracing();
    // 256 * 256 bytes = 64 KiB per stream, interleaved writes. A
    // sequential-read implementation deadlocks here once the unread pipe
    // fills up.
    let mut spec = sh(
        "i=0; while [ $i -lt 256 ]; do printf '%0256d' $i; printf '%0256d' $i >&2; i=$((i+1)); done",
    );
    spec.timeout_ms = Some(30_000);

    let result = Executor::new(spec).run().await.unwrap();
    assert_eq!(result.exit_code, 0);
    assert_eq!(result.stdout.len(), 256 * 256);
    assert_eq!(result.stderr.len(), 256 * 256);
}

#[cfg(unix)]
#[tokio::test]
async fn recording_is_independent_of_subscription() {
    init_tracing();
    let mut spec = sh("printf visible; printf hidden >&2");
    spec.notify = NotifySet::new().stdout();

    let mut stderr_events = 0u32;
    let result = Executor::new(spec)
        .run_with(|event| {
            if matches!(event, ExecEvent::Stderr(_)) {
                stderr_events += 1;
            }
        })
        .await
        .unwrap();

    assert_eq!(stderr_events, 0, "unsubscribed stream must not notify");
    assert_eq!(result.stderr, "hidden", "but it is still recorded in full");
    assert_eq!(result.stdout, "visible");
}

#[cfg(unix)]
#[tokio::test]
async fn env_override_wins_over_ambient() {
    init_tracing();
    let mut spec = sh("printf '%s' \"$PROCMUX_TEST_VALUE\"");
    spec.env
        .insert("PROCMUX_TEST_VALUE".to_string(), "overridden".to_string());

    let result = Executor::new(spec).run().await.unwrap();
    assert_eq!(result.stdout, "overridden");
}

#[cfg(unix)]
#[tokio::test]
async fn ambient_environment_is_inherited() {
    init_tracing();
    let result = Executor::new(sh("printf '%s' \"$PATH\"")).run().await.unwrap();
    assert!(!result.stdout.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn working_directory_is_respected() {
    init_tracing();
    let dir = tempfile::tempdir().unwrap();
    let mut spec = sh("pwd");
    spec.working_directory = Some(dir.path().to_path_buf());

    let result = Executor::new(spec).run().await.unwrap();
    let reported = std::path::Path::new(result.stdout.trim())
        .canonicalize()
        .unwrap();
    assert_eq!(reported, dir.path().canonicalize().unwrap());
}

#[cfg(unix)]
#[tokio::test]
async fn duration_reflects_wall_time() {
    init_tracing();
    let result = Executor::new(sh("sleep 0.2")).run().await.unwrap();
    assert!(result.duration >= Duration::from_millis(200));
    assert!(result.duration < Duration::from_secs(5));
}
