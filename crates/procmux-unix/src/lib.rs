//! Unix implementation of the platform facts used by the launcher.

#[cfg(unix)]
mod unix_impl {
    use procmux_core::PlatformEnv;
    use std::path::Path;
    use tracing::debug;

    /// Unix platform facts: library search-path variable name and
    /// setuid/setgid detection.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct UnixPlatformEnv;

    impl UnixPlatformEnv {
        pub fn new() -> Self {
            Self
        }
    }

    impl PlatformEnv for UnixPlatformEnv {
        fn library_path_var(&self) -> Option<&'static str> {
            if cfg!(target_os = "macos") {
                Some("DYLD_LIBRARY_PATH")
            } else {
                Some("LD_LIBRARY_PATH")
            }
        }

        fn is_privilege_elevated(&self, executable: &Path) -> bool {
            use nix::sys::stat::{Mode, stat};

            match stat(executable) {
                Ok(st) => {
                    let mode = Mode::from_bits_truncate(st.st_mode);
                    let elevated =
                        mode.contains(Mode::S_ISUID) || mode.contains(Mode::S_ISGID);
                    if elevated {
                        debug!("Executable {} is setuid/setgid", executable.display());
                    }
                    elevated
                }
                Err(_) => false,
            }
        }
    }

}

// Re-export the Unix implementation when on Unix systems
#[cfg(unix)]
pub use unix_impl::UnixPlatformEnv;

// Provide a stub for non-Unix targets so the crate always compiles
#[cfg(not(unix))]
#[derive(Debug, Default, Clone, Copy)]
pub struct UnixPlatformEnv;

#[cfg(not(unix))]
impl UnixPlatformEnv {
    pub fn new() -> Self {
        Self
    }
}
