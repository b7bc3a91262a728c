pub mod triangle;
#[cfg(windows)]
pub mod window;

use terrain_gfx::GfxConfig;
use tracing::info;

const WINDOW_SIZE: (u32, u32) = (1280, 720);

pub fn main() -> eyre::Result<()> {
    color_eyre::install()?;
    tracing_subscriber::fmt::SubscriberBuilder::default()
        .with_file(true)
        .with_line_number(true)
        .with_level(true)
        .with_target(false)
        .init();

    let config = GfxConfig::from_env();
    info!("Starting with {:?}", config);
    run(config)
}

#[cfg(windows)]
fn run(config: GfxConfig) -> eyre::Result<()> {
    use terrain_gfx::d3d12::D3d12;
    use terrain_gfx::d3d12::D3d12Instance;
    use terrain_gfx::RenderContext;
    use triangle::Triangle;
    use window::Win32Window;

    let title = match config.use_warp_device {
        true => "Terrain (WARP)",
        false => "Terrain",
    };
    let window = Win32Window::create(title, WINDOW_SIZE.0, WINDOW_SIZE.1)?;
    let instance = D3d12Instance::new(&config)?;
    let fullscreen = std::env::args().any(|arg| arg.eq_ignore_ascii_case("-fullscreen"));
    let mut ctx = RenderContext::<D3d12>::new(&instance, &window, fullscreen, config)?;
    let mut triangle = Triangle::new(&mut ctx)?;
    window.show();

    let mut result = Ok(());
    while window.pump_messages() {
        if let Err(e) = triangle.frame(&mut ctx) {
            result = Err(e);
            break;
        }
    }
    // Drain even after a failed frame; the first error wins.
    let drained = ctx.clear_all_frames();
    result?;
    drained?;
    Ok(())
}

/// Without a window system, renders a fixed number of frames on the
/// headless backend.
#[cfg(not(windows))]
fn run(config: GfxConfig) -> eyre::Result<()> {
    use terrain_gfx::headless::Headless;
    use terrain_gfx::headless::HeadlessInstance;
    use terrain_gfx::headless::HeadlessWindow;
    use terrain_gfx::RenderContext;
    use triangle::Triangle;

    const FRAMES: u32 = 120;

    let instance = HeadlessInstance::new();
    let window = HeadlessWindow::new(WINDOW_SIZE.0, WINDOW_SIZE.1);
    let mut ctx = RenderContext::<Headless>::new(&instance, &window, false, config)?;
    let mut triangle = Triangle::new(&mut ctx)?;
    for _ in 0..FRAMES {
        triangle.frame(&mut ctx)?;
    }
    ctx.clear_all_frames()?;
    info!("Rendered {} frames, {} presents", FRAMES, instance.gpu().present_count());
    Ok(())
}
