use std::ffi::OsStr;
use std::path::{Path, PathBuf};

/// Platform facts the launcher needs for its one environment adjustment.
///
/// Implemented per platform (`procmux-unix`, `procmux-windows`) and selected
/// at compile time by the engine's factory.
pub trait PlatformEnv {
    /// Name of the dynamic-library search-path variable, if the platform
    /// resolves shared libraries through one.
    fn library_path_var(&self) -> Option<&'static str>;

    /// Whether the executable runs with elevated privileges (setuid/setgid).
    /// Such binaries must not inherit a caller-controlled library path.
    fn is_privilege_elevated(&self, executable: &Path) -> bool;
}

/// Installer-context query: whether this process runs from a self-contained
/// installation, and where that installation keeps its pieces.
///
/// A self-contained layout is `<root>/bin/<executable>` with a sibling
/// `<root>/lib` holding the bundled shared libraries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallContext {
    self_contained: bool,
    install_root: Option<PathBuf>,
    library_dir: Option<PathBuf>,
}

impl InstallContext {
    /// Detect the ambient context from the current executable's location.
    pub fn detect() -> Self {
        match std::env::current_exe() {
            Ok(exe) => Self::from_executable(&exe),
            Err(_) => Self::disabled(),
        }
    }

    /// Context for a process not running from a self-contained installation.
    pub fn disabled() -> Self {
        Self {
            self_contained: false,
            install_root: None,
            library_dir: None,
        }
    }

    /// Explicit context for embedders and tests.
    pub fn self_contained(install_root: impl Into<PathBuf>, library_dir: impl Into<PathBuf>) -> Self {
        Self {
            self_contained: true,
            install_root: Some(install_root.into()),
            library_dir: Some(library_dir.into()),
        }
    }

    fn from_executable(exe: &Path) -> Self {
        let Some(bin_dir) = exe.parent() else {
            return Self::disabled();
        };
        if bin_dir.file_name() != Some(OsStr::new("bin")) {
            return Self::disabled();
        }
        let Some(root) = bin_dir.parent() else {
            return Self::disabled();
        };
        let library_dir = root.join("lib");
        if !library_dir.is_dir() {
            return Self::disabled();
        }
        Self {
            self_contained: true,
            install_root: Some(root.to_path_buf()),
            library_dir: Some(library_dir),
        }
    }

    pub fn is_self_contained(&self) -> bool {
        self.self_contained
    }

    pub fn install_root(&self) -> Option<&Path> {
        self.install_root.as_deref()
    }

    pub fn library_dir(&self) -> Option<&Path> {
        self.library_dir.as_deref()
    }
}
