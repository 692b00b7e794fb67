use procmux_core::PlatformEnv;

/// Platform-agnostic factory that selects the appropriate implementation at
/// compile time.
pub struct PlatformEnvFactory;

impl PlatformEnvFactory {
    pub fn create() -> impl PlatformEnv {
        #[cfg(unix)]
        return procmux_unix::UnixPlatformEnv::new();

        #[cfg(windows)]
        return procmux_windows::WindowsPlatformEnv::new();

        #[cfg(not(any(unix, windows)))]
        compile_error!("Unsupported platform: only Unix and Windows are currently supported");
    }

    pub fn platform_name() -> &'static str {
        #[cfg(unix)]
        return "unix";

        #[cfg(windows)]
        return "windows";
    }
}
