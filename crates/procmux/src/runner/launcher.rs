use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;

use tokio::process::{Child, ChildStderr, ChildStdin, ChildStdout, Command};
use tracing::debug;

use procmux_core::{CommandSpec, ExecError, InstallContext, PlatformEnv};

/// A freshly spawned child with its pid and pipe endpoints taken.
///
/// Owned by exactly one multiplexer run; an endpoint set to `None` is
/// closed.
pub(crate) struct SpawnedChild {
    pub child: Child,
    pub pid: u32,
    pub stdin: Option<ChildStdin>,
    pub stdout: Option<ChildStdout>,
    pub stderr: Option<ChildStderr>,
}

/// Resolve argv[0] to an absolute executable path.
fn resolve_program(program: &str) -> Result<PathBuf, ExecError> {
    which::which(program).map_err(|_| ExecError::CommandUnavailable {
        os: std::env::consts::OS,
        program: program.to_string(),
    })
}

/// Spawn the child described by `spec` with all three stdio pipes wired.
pub(crate) fn spawn_child(
    spec: &CommandSpec,
    platform: &dyn PlatformEnv,
    install: &InstallContext,
) -> Result<SpawnedChild, ExecError> {
    let resolved = resolve_program(&spec.program)?;
    debug!("Resolved {} to {}", spec.program, resolved.display());

    let mut cmd = Command::new(&resolved);
    cmd.args(&spec.args);

    if let Some(dir) = &spec.working_directory {
        cmd.current_dir(dir);
    }

    // Overrides merge onto the inherited ambient environment; override wins.
    for (key, value) in &spec.env {
        cmd.env(key, value);
    }

    apply_install_env(&mut cmd, &resolved, spec, platform, install);

    cmd.stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // A timeout fault must leave the child running; the caller owns
    // termination via the pid in the fault.
    cmd.kill_on_drop(false);

    let mut child = cmd.spawn().map_err(|e| ExecError::Launch(e.to_string()))?;

    let pid = child
        .id()
        .ok_or_else(|| ExecError::Launch("child exited before its pid was observed".to_string()))?;

    let stdin = child.stdin.take();
    let stdout = child.stdout.take();
    let stderr = child.stderr.take();

    Ok(SpawnedChild {
        child,
        pid,
        stdin,
        stdout,
        stderr,
    })
}

/// The one platform-conditioned environment adjustment.
///
/// When running from a self-contained installation and the resolved
/// executable lives inside it, the installation's library directory is
/// prepended to the platform's dynamic-library search-path variable so the
/// child finds the bundled libraries. A setuid/setgid executable instead
/// gets the variable cleared: it must not inherit a caller-controlled
/// library path.
fn apply_install_env(
    cmd: &mut Command,
    resolved: &Path,
    spec: &CommandSpec,
    platform: &dyn PlatformEnv,
    install: &InstallContext,
) {
    if !install.is_self_contained() {
        return;
    }
    let (Some(root), Some(library_dir)) = (install.install_root(), install.library_dir()) else {
        return;
    };
    if !resolved.starts_with(root) {
        return;
    }
    let Some(var) = platform.library_path_var() else {
        return;
    };

    if platform.is_privilege_elevated(resolved) {
        debug!("Clearing {} for privilege-elevated {}", var, resolved.display());
        cmd.env_remove(var);
        return;
    }

    let mut paths = vec![library_dir.to_path_buf()];
    let existing = spec
        .env
        .get(var)
        .map(OsString::from)
        .or_else(|| std::env::var_os(var));
    if let Some(existing) = existing {
        paths.extend(std::env::split_paths(&existing));
    }
    if let Ok(joined) = std::env::join_paths(paths) {
        debug!("Prepending {} to {}", library_dir.display(), var);
        cmd.env(var, joined);
    }
}
