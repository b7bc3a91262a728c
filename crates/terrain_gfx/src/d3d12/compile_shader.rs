use std::ffi::CString;
use std::path::Path;

use windows::core::*;
use windows::Win32::Graphics::Direct3D::Fxc::*;
use windows::Win32::Graphics::Direct3D::*;

use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;

/// Copies a blob's contents out.
pub fn blob_bytes(blob: &ID3DBlob) -> Vec<u8> {
    unsafe { std::slice::from_raw_parts(blob.GetBufferPointer() as *const u8, blob.GetBufferSize()) }.to_vec()
}

pub fn blob_text(blob: &ID3DBlob) -> String {
    String::from_utf8_lossy(&blob_bytes(blob)).trim_end_matches('\0').trim_end().to_string()
}

/// Runs FXC on one entry point of a file. Compiler diagnostics become the
/// error message as is; the HRESULT stays attached as the source.
pub fn compile_shader(path: &Path, entry_point: &str, target: &str, debug: bool) -> GfxResult<Vec<u8>> {
    let flags = if debug {
        D3DCOMPILE_DEBUG | D3DCOMPILE_SKIP_OPTIMIZATION
    } else {
        D3DCOMPILE_OPTIMIZATION_LEVEL3
    };
    let entry = CString::new(entry_point).map_err(|e| {
        GfxError::with_source(GfxErrorKind::ShaderCompileFailed, "entry point contains a NUL byte", e)
    })?;
    let target = CString::new(target).map_err(|e| {
        GfxError::with_source(GfxErrorKind::ShaderCompileFailed, "target profile contains a NUL byte", e)
    })?;
    let hlsl_path = HSTRING::from(path);

    let mut shader_blob = None;
    let mut error_blob = None;
    let result = unsafe {
        D3DCompileFromFile(
            &hlsl_path,
            None,
            None,
            PCSTR(entry.as_ptr() as *const u8),
            PCSTR(target.as_ptr() as *const u8),
            flags,
            0,
            &mut shader_blob,
            Some(&mut error_blob),
        )
    };

    if let Err(e) = result {
        let message = match error_blob {
            Some(error) => blob_text(&error),
            None => format!("{}: {}", path.display(), e.message()),
        };
        return Err(GfxError::with_source(GfxErrorKind::ShaderCompileFailed, message, e));
    }
    if let Some(warnings) = error_blob {
        tracing::warn!("{}", blob_text(&warnings));
    }
    match shader_blob {
        Some(blob) => Ok(blob_bytes(&blob)),
        None => Err(GfxError::new(
            GfxErrorKind::ShaderCompileFailed,
            format!("{}: compiler returned no bytecode", path.display()),
        )),
    }
}
