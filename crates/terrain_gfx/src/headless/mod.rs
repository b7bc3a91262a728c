//! A backend with no GPU behind it.
//!
//! Objects keep just enough state to behave like their Direct3D 12
//! counterparts where the rendering core depends on it: fences only advance
//! when the queue reaches their signal, allocators refuse to reset while
//! their commands are queued, copies move bytes on execution, and presents
//! rotate the back buffer index. Tests reach the timeline through
//! [`HeadlessInstance::gpu`].

mod gpu;
mod objects;

use std::path::Path;

pub use gpu::HeadlessGpu;
pub use gpu::RecordedCommand;
pub use objects::*;

use crate::backend::Backend;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::gfx_error::GfxResultExt;
use crate::window_target::WindowHandle;
use crate::window_target::WindowTarget;

pub struct Headless;

impl Backend for Headless {
    type Instance = HeadlessInstance;
    type Adapter = HeadlessAdapter;
    type Device = HeadlessDevice;
    type Queue = HeadlessQueue;
    type CommandAllocator = HeadlessCommandAllocator;
    type CommandList = HeadlessCommandList;
    type Fence = HeadlessFence;
    type SwapChain = HeadlessSwapChain;
    type Resource = HeadlessResource;
    type DescriptorHeap = HeadlessDescriptorHeap;
    type RootSignature = HeadlessRootSignature;
    type PipelineState = HeadlessPipelineState;

    const NAME: &'static str = "headless";

    /// Checks that the source parses far enough to find the entry point and
    /// returns a tagged copy of it as bytecode.
    fn compile_shader_file(path: &Path, entry_point: &str, target: &str, debug: bool) -> GfxResult<Vec<u8>> {
        let source = std::fs::read_to_string(path).gfx_context(GfxErrorKind::ShaderCompileFailed, || {
            format!("failed to read {}", path.display())
        })?;

        if let Some(line) = unbalanced_brace_line(&source) {
            return Err(GfxError::new(
                GfxErrorKind::ShaderCompileFailed,
                format!(
                    "{}({},1): error X3000: syntax error: unbalanced braces",
                    path.display(),
                    line
                ),
            ));
        }
        if !declares_function(&source, entry_point) {
            return Err(GfxError::new(
                GfxErrorKind::ShaderCompileFailed,
                format!(
                    "{}: error X3501: '{}': entrypoint not found",
                    path.display(),
                    entry_point
                ),
            ));
        }

        let mut bytecode = b"DXBC".to_vec();
        bytecode.extend_from_slice(target.as_bytes());
        bytecode.push(debug as u8);
        bytecode.extend_from_slice(source.as_bytes());
        Ok(bytecode)
    }
}

/// The line where brace nesting first goes negative, or the last line when
/// braces are left open.
fn unbalanced_brace_line(source: &str) -> Option<usize> {
    let mut depth = 0i64;
    let mut line_count = 0;
    for (number, line) in source.lines().enumerate() {
        line_count = number + 1;
        let code = line.split("//").next().unwrap_or_default();
        for c in code.chars() {
            match c {
                '{' => depth += 1,
                '}' => depth -= 1,
                _ => {}
            }
            if depth < 0 {
                return Some(number + 1);
            }
        }
    }
    (depth != 0).then_some(line_count)
}

fn declares_function(source: &str, name: &str) -> bool {
    let is_ident = |c: char| c.is_ascii_alphanumeric() || c == '_';
    source.match_indices(name).any(|(start, _)| {
        let before = source[..start].chars().next_back();
        let after = source[start + name.len()..].trim_start();
        !before.is_some_and(is_ident) && after.starts_with('(')
    })
}

/// A stand-in window with a fixed client area.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HeadlessWindow {
    pub handle: WindowHandle,
    pub width: u32,
    pub height: u32,
}

impl HeadlessWindow {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            handle: WindowHandle(1),
            width,
            height,
        }
    }
}

impl WindowTarget for HeadlessWindow {
    fn native_handle(&self) -> WindowHandle {
        self.handle
    }

    fn client_width(&self) -> u32 {
        self.width
    }

    fn client_height(&self) -> u32 {
        self.height
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_entry_point_declarations() {
        assert!(declares_function("float4 main(float4 p : POSITION) : SV_POSITION { return p; }", "main"));
        assert!(declares_function("void main ()\n{\n}", "main"));
        assert!(!declares_function("float4 domain_main(float4 p) { return p; }", "main"));
        assert!(!declares_function("// main is elsewhere", "main"));
    }

    #[test]
    fn reports_unbalanced_braces() {
        assert_eq!(unbalanced_brace_line("void main() {\n}\n"), None);
        assert_eq!(unbalanced_brace_line("void main() {\n"), Some(1));
        assert_eq!(unbalanced_brace_line("}\n"), Some(1));
    }
}
