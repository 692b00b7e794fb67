use std::time::Instant;

use tracing::{debug, info};

use crate::factory::PlatformEnvFactory;
use crate::runner::multiplexer::Multiplexer;
use procmux_core::{CommandSpec, ExecError, ExecEvent, ExecResult, InstallContext};

mod launcher;
mod multiplexer;

/// One-shot executor for a [`CommandSpec`].
///
/// Owns exactly one child process for the duration of the call; `run` and
/// `run_with` consume the executor so a spec is executed at most once per
/// instance.
pub struct Executor {
    spec: CommandSpec,
    install: InstallContext,
}

impl Executor {
    /// Create an executor for the given spec, detecting the ambient
    /// installer context.
    pub fn new(spec: CommandSpec) -> Self {
        Self {
            spec,
            install: InstallContext::detect(),
        }
    }

    /// Replace the installer context (embedders, tests).
    pub fn with_install_context(mut self, install: InstallContext) -> Self {
        self.install = install;
        self
    }

    /// Execute without a callback. Output is still recorded in full.
    pub async fn run(self) -> Result<ExecResult, ExecError> {
        self.execute(None).await
    }

    /// Execute with a synchronous callback for the subscribed streams.
    ///
    /// The callback is invoked inline from the readiness loop and must
    /// return before the loop continues; invocations never overlap.
    pub async fn run_with<F>(self, mut callback: F) -> Result<ExecResult, ExecError>
    where
        F: FnMut(ExecEvent<'_>),
    {
        // A callback with nothing subscribed would never fire; almost
        // certainly a caller mistake, so reject before anything is spawned.
        if self.spec.notify.is_empty() {
            return Err(ExecError::Configuration(
                "a callback was supplied but the notify set is empty".to_string(),
            ));
        }
        self.execute(Some(&mut callback)).await
    }

    async fn execute(
        self,
        callback: Option<&mut dyn FnMut(ExecEvent<'_>)>,
    ) -> Result<ExecResult, ExecError> {
        let platform = PlatformEnvFactory::create();
        debug!(
            "Executing {} on platform {}",
            self.spec.program,
            PlatformEnvFactory::platform_name()
        );

        let started = Instant::now();
        let deadline = self.spec.timeout().map(|t| started + t);

        let child = launcher::spawn_child(&self.spec, &platform, &self.install)?;
        info!("Spawned {} (PID: {})", self.spec.program, child.pid);

        Multiplexer::new(child, started, deadline, self.spec.notify, callback)
            .run()
            .await
    }
}
