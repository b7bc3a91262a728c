use std::time::Duration;

/// Knobs for building a [`crate::RenderContext`].
#[derive(Clone, Debug, PartialEq)]
pub struct GfxConfig {
    /// Use the software (WARP) adapter instead of hardware. Only ever
    /// honored when asked for explicitly.
    pub use_warp_device: bool,
    /// Enable the API validation layer when the backend has one.
    pub debug_layer: bool,
    /// Passed to present. 1 waits for vertical blank, 0 does not.
    pub sync_interval: u32,
    /// Upper bound for any single fence wait. `None` waits forever.
    pub fence_timeout: Option<Duration>,
}

impl Default for GfxConfig {
    fn default() -> Self {
        Self {
            use_warp_device: false,
            debug_layer: cfg!(debug_assertions),
            sync_interval: 1,
            fence_timeout: None,
        }
    }
}

impl GfxConfig {
    /// Builds a config from process-style arguments.
    ///
    /// Recognized: `-warp`/`/warp`, `-nodebug`, `-novsync`,
    /// `-fence-timeout-ms=N`. Unknown arguments are ignored.
    pub fn from_args<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut config = Self::default();
        for arg in args {
            let arg = arg.as_ref();
            let flag = arg.trim_start_matches(['-', '/']);
            if flag.eq_ignore_ascii_case("warp") {
                config.use_warp_device = true;
            } else if flag.eq_ignore_ascii_case("nodebug") {
                config.debug_layer = false;
            } else if flag.eq_ignore_ascii_case("novsync") {
                config.sync_interval = 0;
            } else if let Some(ms) = flag.strip_prefix("fence-timeout-ms=") {
                match ms.parse::<u64>() {
                    Ok(ms) => config.fence_timeout = Some(Duration::from_millis(ms)),
                    Err(_) => tracing::warn!("Ignoring malformed fence timeout {:?}", arg),
                }
            }
        }
        config
    }

    pub fn from_env() -> Self {
        Self::from_args(std::env::args().skip(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_flags_case_insensitively() {
        let config = GfxConfig::from_args(["/WARP", "-nodebug", "-novsync", "-fence-timeout-ms=250"]);
        assert!(config.use_warp_device);
        assert!(!config.debug_layer);
        assert_eq!(config.sync_interval, 0);
        assert_eq!(config.fence_timeout, Some(Duration::from_millis(250)));
    }

    #[test]
    fn malformed_timeout_is_ignored() {
        let config = GfxConfig::from_args(["-fence-timeout-ms=soon", "terrain.raw"]);
        assert_eq!(config.fence_timeout, None);
        assert!(!config.use_warp_device);
        assert_eq!(config.sync_interval, 1);
    }
}
