//! Windows implementation of the platform facts used by the launcher.

use procmux_core::PlatformEnv;
use std::path::Path;

/// Windows platform facts.
///
/// DLL resolution goes through the application directory and `PATH`; there
/// is no dedicated library search-path variable to adjust, and no
/// setuid-style privilege bit on executables.
#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPlatformEnv;

impl WindowsPlatformEnv {
    pub fn new() -> Self {
        Self
    }
}

impl PlatformEnv for WindowsPlatformEnv {
    fn library_path_var(&self) -> Option<&'static str> {
        None
    }

    fn is_privilege_elevated(&self, _executable: &Path) -> bool {
        false
    }
}
