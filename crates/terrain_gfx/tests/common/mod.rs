#![allow(dead_code)]

use std::path::PathBuf;

use terrain_gfx::headless::Headless;
use terrain_gfx::headless::HeadlessInstance;
use terrain_gfx::headless::HeadlessWindow;
use terrain_gfx::GfxConfig;
use terrain_gfx::RenderContext;

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.2, 0.4, 1.0];

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .try_init();
}

pub fn test_config() -> GfxConfig {
    GfxConfig {
        debug_layer: false,
        ..Default::default()
    }
}

pub fn context(instance: &HeadlessInstance) -> RenderContext<Headless> {
    context_with(instance, test_config())
}

pub fn context_with(instance: &HeadlessInstance, config: GfxConfig) -> RenderContext<Headless> {
    init_tracing();
    RenderContext::new(instance, &HeadlessWindow::new(1280, 720), false, config).unwrap()
}

/// One full frame with nothing drawn.
pub fn run_frame(ctx: &mut RenderContext<Headless>) {
    ctx.reset_pipeline().unwrap();
    ctx.set_back_buffer_render(CLEAR_COLOR).unwrap();
    ctx.set_back_buffer_present().unwrap();
    ctx.render().unwrap();
}

pub fn shader_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests").join("shaders").join(name)
}
