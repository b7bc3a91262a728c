pub type GfxResult<T, E = GfxError> = core::result::Result<T, E>;

/// What went wrong, so callers can dispatch on the failure class
/// without string matching.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GfxErrorKind {
    AdapterNotFound,
    DeviceCreationFailed,
    SwapChainFailed,
    ResourceCreationFailed,
    ShaderCompileFailed,
    SyncFailed,
    /// A frame call arrived out of order (see [`crate::frame_recorder::RecordingState`]).
    ContractViolation,
    /// The device was removed or reset. Never recovered from.
    DeviceLost,
}

impl std::fmt::Display for GfxErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GfxErrorKind::AdapterNotFound => "adapter not found",
            GfxErrorKind::DeviceCreationFailed => "device creation failed",
            GfxErrorKind::SwapChainFailed => "swap chain failed",
            GfxErrorKind::ResourceCreationFailed => "resource creation failed",
            GfxErrorKind::ShaderCompileFailed => "shader compile failed",
            GfxErrorKind::SyncFailed => "synchronization failed",
            GfxErrorKind::ContractViolation => "frame contract violation",
            GfxErrorKind::DeviceLost => "device lost",
        };
        f.write_str(name)
    }
}

pub struct GfxError {
    kind: GfxErrorKind,
    message: String,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl GfxError {
    pub fn new(kind: GfxErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        kind: GfxErrorKind,
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            kind,
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    pub fn kind(&self) -> GfxErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is(&self, kind: GfxErrorKind) -> bool {
        self.kind == kind
    }
}

impl std::error::Error for GfxError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_deref()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}

impl std::fmt::Display for GfxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)?;
        if let Some(source) = &self.source {
            write!(f, " ({})", source)?;
        }
        Ok(())
    }
}

impl std::fmt::Debug for GfxError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GfxError")
            .field("kind", &self.kind)
            .field("message", &self.message)
            .field("source", &self.source.as_ref().map(|s| s.to_string()))
            .finish()
    }
}

/// Attaches a [`GfxErrorKind`] and a message to a foreign error, keeping the
/// original as the error source. Modeled on `eyre::WrapErr`.
pub trait GfxResultExt<T> {
    fn gfx_context<M>(self, kind: GfxErrorKind, message: M) -> GfxResult<T>
    where
        M: FnOnce() -> String;
}

impl<T, E> GfxResultExt<T> for core::result::Result<T, E>
where
    E: std::error::Error + Send + Sync + 'static,
{
    fn gfx_context<M>(self, kind: GfxErrorKind, message: M) -> GfxResult<T>
    where
        M: FnOnce() -> String,
    {
        self.map_err(|e| GfxError::with_source(kind, message(), e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug)]
    struct Inner;
    impl std::fmt::Display for Inner {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("E_OUTOFMEMORY")
        }
    }
    impl std::error::Error for Inner {}

    #[test]
    fn display_includes_kind_message_and_source() {
        let result: Result<(), Inner> = Err(Inner);
        let err = result
            .gfx_context(GfxErrorKind::ResourceCreationFailed, || {
                "upload buffer \"vertices\"".to_string()
            })
            .unwrap_err();
        assert!(err.is(GfxErrorKind::ResourceCreationFailed));
        let text = err.to_string();
        assert!(text.starts_with("resource creation failed: upload buffer"));
        assert!(text.ends_with("(E_OUTOFMEMORY)"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync + 'static>() {}
        assert_send_sync::<GfxError>();
    }
}
