//! Shader files to bytecode, one entry point per stage.

use std::path::Path;

use crate::backend::Backend;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;

/// Every shader compiled through the context uses this entry point.
pub const ENTRY_POINT: &str = "main";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ShaderStage {
    Pixel,
    Vertex,
    Geometry,
    Hull,
    Domain,
}

impl ShaderStage {
    /// Shader model 5.0 target profile.
    pub fn target_profile(self) -> &'static str {
        match self {
            ShaderStage::Pixel => "ps_5_0",
            ShaderStage::Vertex => "vs_5_0",
            ShaderStage::Geometry => "gs_5_0",
            ShaderStage::Hull => "hs_5_0",
            ShaderStage::Domain => "ds_5_0",
        }
    }
}

/// Compiled shader code.
#[derive(Clone, PartialEq, Eq)]
pub struct ShaderBytecode {
    stage: ShaderStage,
    bytes: Vec<u8>,
}

impl ShaderBytecode {
    pub fn new(stage: ShaderStage, bytes: Vec<u8>) -> Self {
        Self { stage, bytes }
    }

    pub fn stage(&self) -> ShaderStage {
        self.stage
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

impl std::fmt::Debug for ShaderBytecode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShaderBytecode")
            .field("stage", &self.stage)
            .field("len", &self.bytes.len())
            .finish()
    }
}

/// Compiles the `main` entry point of the file at `path` for `stage`.
///
/// With `debug` set the code is compiled with debug info and no optimization.
/// A missing file and a rejected source are both `ShaderCompileFailed`; the
/// latter carries the compiler output unchanged.
pub fn compile_shader<B: Backend>(path: &Path, stage: ShaderStage, debug: bool) -> GfxResult<ShaderBytecode> {
    if !path.is_file() {
        return Err(GfxError::new(
            GfxErrorKind::ShaderCompileFailed,
            format!("shader file not found: {}", path.display()),
        ));
    }
    let target = stage.target_profile();
    tracing::debug!("Compiling {} ({}) with {}", path.display(), target, B::NAME);
    let bytes = B::compile_shader_file(path, ENTRY_POINT, target, debug)?;
    if bytes.is_empty() {
        return Err(GfxError::new(
            GfxErrorKind::ShaderCompileFailed,
            format!("compiler returned no bytecode for {}", path.display()),
        ));
    }
    Ok(ShaderBytecode::new(stage, bytes))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::Headless;

    #[test]
    fn stages_map_to_shader_model_5_profiles() {
        let profiles: Vec<_> = [
            ShaderStage::Pixel,
            ShaderStage::Vertex,
            ShaderStage::Geometry,
            ShaderStage::Hull,
            ShaderStage::Domain,
        ]
        .iter()
        .map(|s| s.target_profile())
        .collect();
        assert_eq!(profiles, ["ps_5_0", "vs_5_0", "gs_5_0", "hs_5_0", "ds_5_0"]);
    }

    #[test]
    fn missing_file_names_the_path() {
        let path = Path::new("does/not/exist/terrain_ps.hlsl");
        let err = compile_shader::<Headless>(path, ShaderStage::Pixel, false).unwrap_err();
        assert!(err.is(GfxErrorKind::ShaderCompileFailed));
        assert!(err.message().contains("terrain_ps.hlsl"), "{err}");
    }
}
