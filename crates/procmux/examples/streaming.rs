//! Stream a shell command's output as it is produced.
//!
//! Run with: `cargo run --example streaming`

use procmux::{CommandSpec, ExecEvent, Executor, NotifySet};
use std::time::Duration;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let spec = CommandSpec::builder()
        .program("sh")
        .args(["-c", "for i in 1 2 3; do echo line $i; sleep 0.2; done; echo done >&2"])
        .timeout(Duration::from_secs(10))
        .notify(NotifySet::new().stdout().stderr())
        .build()?;

    let result = Executor::new(spec)
        .run_with(|event| match event {
            ExecEvent::Stdout(chunk) => print!("{}", String::from_utf8_lossy(chunk)),
            ExecEvent::Stderr(chunk) => eprint!("{}", String::from_utf8_lossy(chunk)),
            ExecEvent::StdinReady(_) => {}
        })
        .await?;

    println!("exit code: {} ({:?})", result.exit_code, result.duration);
    Ok(())
}
