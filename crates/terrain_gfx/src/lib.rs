//! Triple-buffered Direct3D 12 rendering core for the terrain renderer.
//!
//! [`RenderContext`] owns the device, command queue, swap chain and the
//! per-frame slots. It is generic over a [`Backend`]: [`d3d12`] on Windows,
//! and [`headless`] everywhere, which runs the same frame logic against an
//! in-memory GPU timeline.

pub mod backend;
pub mod command_subsystem;
pub mod config;
pub mod constants;
#[cfg(windows)]
pub mod d3d12;
pub mod desc;
pub mod device_context;
pub mod frame_recorder;
pub mod frame_slot;
pub mod frame_synchronizer;
pub mod gfx_error;
pub mod headless;
pub mod pipeline_factory;
pub mod projection;
pub mod render_context;
pub mod resource_factory;
pub mod shader_compiler;
pub mod swap_chain_manager;
pub mod window_target;

pub use backend::Backend;
pub use config::GfxConfig;
pub use frame_recorder::RecordingState;
pub use gfx_error::GfxError;
pub use gfx_error::GfxErrorKind;
pub use gfx_error::GfxResult;
pub use gfx_error::GfxResultExt;
pub use render_context::InitializedBuffer;
pub use render_context::RenderContext;
pub use resource_factory::CommittedResource;
pub use resource_factory::DescriptorHeap;
pub use shader_compiler::ShaderBytecode;
pub use shader_compiler::ShaderStage;
pub use window_target::WindowHandle;
pub use window_target::WindowTarget;
