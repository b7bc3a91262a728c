mod common;

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use common::*;
use terrain_gfx::desc::*;
use terrain_gfx::headless::Headless;
use terrain_gfx::headless::HeadlessAdapter;
use terrain_gfx::headless::HeadlessInstance;
use terrain_gfx::headless::HeadlessWindow;
use terrain_gfx::headless::RecordedCommand;
use terrain_gfx::GfxErrorKind;
use terrain_gfx::RecordingState;
use terrain_gfx::RenderContext;
use terrain_gfx::WindowHandle;

const BLOCKED: Duration = Duration::from_millis(200);
const RELEASED: Duration = Duration::from_secs(5);

#[test]
fn builds_three_back_buffers_and_both_view_heaps() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    assert_eq!(ctx.slots().len(), 3);
    assert_eq!(ctx.swap_chain().rtv_heap().capacity(), 3);
    assert_eq!(ctx.swap_chain().rtv_heap().heap_type(), DescriptorHeapType::RTV);
    assert_eq!(ctx.swap_chain().dsv_heap().capacity(), 1);
    assert_eq!(ctx.swap_chain().depth_buffer().desc().format, Format::D32_FLOAT);
    assert!(ctx.feature_level() >= FeatureLevel::LEVEL_11_0);
    assert_eq!(ctx.buffer_index(), 0);
    assert_eq!(ctx.last_fence_value(), 0);
    assert_eq!(ctx.recording_state(), RecordingState::Idle);

    let viewport = ctx.viewport();
    assert_eq!((viewport.width, viewport.height), (1280.0, 720.0));
    assert_eq!((viewport.min_depth, viewport.max_depth), (0.0, 1.0));
    assert_eq!(ctx.scissor_rect().right, 1280);
    assert_eq!(ctx.scissor_rect().bottom, 720);

    ctx.clear_all_frames().unwrap();
}

#[test]
fn no_adapter_is_adapter_not_found() {
    init_tracing();
    let instance = HeadlessInstance::with_adapters(vec![
        HeadlessAdapter::software("Microsoft Basic Render Driver"),
        HeadlessAdapter::hardware("Old GPU", FeatureLevel::LEVEL_10_0),
    ]);
    let err = RenderContext::<Headless>::new(&instance, &HeadlessWindow::new(1280, 720), false, test_config())
        .err()
        .unwrap();
    assert_eq!(err.kind(), GfxErrorKind::AdapterNotFound);
}

#[test]
fn warp_is_used_only_when_asked_for() {
    let instance = HeadlessInstance::with_adapters(vec![HeadlessAdapter::software("Software")]);
    let config = terrain_gfx::GfxConfig {
        use_warp_device: true,
        ..test_config()
    };
    let mut ctx = context_with(&instance, config);
    assert!(ctx.adapter_info().is_software);
    assert_eq!(ctx.adapter_info().name, "Microsoft Basic Render Driver");
    ctx.clear_all_frames().unwrap();
}

#[test]
fn null_window_is_swap_chain_failed() {
    init_tracing();
    let instance = HeadlessInstance::new();
    let window = HeadlessWindow {
        handle: WindowHandle(0),
        width: 1280,
        height: 720,
    };
    let err = RenderContext::<Headless>::new(&instance, &window, false, test_config())
        .err()
        .unwrap();
    assert_eq!(err.kind(), GfxErrorKind::SwapChainFailed);
}

#[test]
fn zero_sized_window_is_swap_chain_failed() {
    init_tracing();
    let instance = HeadlessInstance::new();
    let err = RenderContext::<Headless>::new(&instance, &HeadlessWindow::new(0, 720), false, test_config())
        .err()
        .unwrap();
    assert_eq!(err.kind(), GfxErrorKind::SwapChainFailed);
}

#[test]
fn fullscreen_request_reaches_the_swap_chain() {
    init_tracing();
    let instance = HeadlessInstance::new();
    let mut ctx =
        RenderContext::<Headless>::new(&instance, &HeadlessWindow::new(1920, 1080), true, test_config()).unwrap();
    assert!(ctx.swap_chain().is_fullscreen());
    assert!(ctx.swap_chain().swap_chain().is_fullscreen());
    ctx.clear_all_frames().unwrap();
}

#[test]
fn buffer_index_cycles_and_fence_values_increase() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    let mut indices = vec![ctx.buffer_index()];
    let mut fence_values = Vec::new();
    for _ in 0..3 {
        run_frame(&mut ctx);
        indices.push(ctx.buffer_index());
        fence_values.push(ctx.last_fence_value());
    }

    assert_eq!(indices, [0, 1, 2, 0]);
    assert_eq!(fence_values, [1, 2, 3]);
    let slot_values: Vec<u64> = ctx.slots().iter().map(|slot| slot.fence_value()).collect();
    assert_eq!(slot_values, [1, 2, 3]);
    assert_eq!(instance.gpu().present_count(), 3);
    assert_eq!(instance.gpu().executed_lists(), 3);

    ctx.clear_all_frames().unwrap();
}

#[test]
fn buffer_index_keeps_wrapping_past_the_first_cycle() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    for frame in 1..=7u32 {
        run_frame(&mut ctx);
        assert_eq!(ctx.buffer_index(), frame % 3);
    }
    assert_eq!(instance.gpu().present_count(), 7);
    ctx.clear_all_frames().unwrap();
}

#[test]
fn back_buffer_render_records_transition_bind_and_clears() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    ctx.reset_pipeline().unwrap();
    ctx.set_back_buffer_render(CLEAR_COLOR).unwrap();
    let rtv = ctx.swap_chain().rtv_handle(0).unwrap();
    let dsv = ctx.swap_chain().dsv_handle().unwrap();
    let back_buffer = ctx.slots()[0].back_buffer().id();

    let commands = ctx.command_list().unwrap().commands();
    assert!(matches!(
        commands[0],
        RecordedCommand::Transition { resource, before, after }
            if resource == back_buffer
                && before == ResourceStates::PRESENT
                && after == ResourceStates::RENDER_TARGET
    ));
    assert!(matches!(
        commands[1],
        RecordedCommand::SetRenderTargets { rtv: bound, dsv: Some(depth) } if bound == rtv && depth == dsv
    ));
    assert!(matches!(
        commands[2],
        RecordedCommand::ClearRenderTarget { color, .. } if color == CLEAR_COLOR
    ));
    assert!(matches!(
        commands[3],
        RecordedCommand::ClearDepthStencil { depth, stencil: 0, .. } if depth == 1000.0
    ));

    ctx.set_back_buffer_present().unwrap();
    let commands = ctx.command_list().unwrap().commands();
    assert!(matches!(
        commands.last(),
        Some(RecordedCommand::Transition { before, after, .. })
            if *before == ResourceStates::RENDER_TARGET && *after == ResourceStates::PRESENT
    ));
    ctx.render().unwrap();
    ctx.clear_all_frames().unwrap();
}

#[test]
fn host_draws_land_between_the_transitions() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    ctx.reset_pipeline().unwrap();
    ctx.set_back_buffer_render(CLEAR_COLOR).unwrap();
    {
        use terrain_gfx::backend::CommandList;
        let list = ctx.command_list().unwrap();
        list.set_viewport(&ctx.viewport());
        list.set_scissor_rect(&ctx.scissor_rect());
        list.set_primitive_topology(PrimitiveTopology::TRIANGLELIST);
        list.draw_instanced(3, 1, 0, 0);
    }
    ctx.set_back_buffer_present().unwrap();

    let commands = ctx.command_list().unwrap().commands();
    let draw = commands
        .iter()
        .position(|c| matches!(c, RecordedCommand::DrawInstanced { vertex_count: 3, .. }))
        .unwrap();
    assert_eq!(draw, commands.len() - 2);
    ctx.render().unwrap();
    ctx.clear_all_frames().unwrap();
}

#[test]
fn out_of_order_calls_are_contract_violations() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    assert!(ctx.render().unwrap_err().is(GfxErrorKind::ContractViolation));
    assert!(ctx.set_back_buffer_render(CLEAR_COLOR).unwrap_err().is(GfxErrorKind::ContractViolation));
    assert!(ctx.command_list().unwrap_err().is(GfxErrorKind::ContractViolation));
    assert!(ctx.flush().unwrap_err().is(GfxErrorKind::ContractViolation));

    ctx.reset_pipeline().unwrap();
    assert!(ctx.reset_pipeline().unwrap_err().is(GfxErrorKind::ContractViolation));
    assert!(ctx.next_frame().unwrap_err().is(GfxErrorKind::ContractViolation));
    assert!(ctx.set_back_buffer_present().unwrap_err().is(GfxErrorKind::ContractViolation));
    assert!(ctx.render().unwrap_err().is(GfxErrorKind::ContractViolation));
    assert_eq!(ctx.recording_state(), RecordingState::Recording);

    ctx.set_back_buffer_render(CLEAR_COLOR).unwrap();
    assert!(ctx.render().unwrap_err().is(GfxErrorKind::ContractViolation));
    assert!(ctx.flush().unwrap_err().is(GfxErrorKind::ContractViolation));
    ctx.set_back_buffer_present().unwrap();
    ctx.render().unwrap();

    // Nothing the violations touched reached the GPU.
    assert_eq!(instance.gpu().executed_lists(), 1);
    assert_eq!(ctx.last_fence_value(), 1);
    ctx.clear_all_frames().unwrap();
}

#[test]
fn flush_submits_without_presenting() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    ctx.reset_pipeline().unwrap();
    ctx.flush().unwrap();

    assert_eq!(ctx.recording_state(), RecordingState::Idle);
    assert_eq!(ctx.buffer_index(), 0);
    assert_eq!(ctx.last_fence_value(), 1);
    assert_eq!(instance.gpu().present_count(), 0);
    assert!(ctx.slots()[0].is_complete());

    run_frame(&mut ctx);
    assert_eq!(ctx.last_fence_value(), 2);
    ctx.clear_all_frames().unwrap();
}

#[test]
fn next_frame_waits_only_from_idle() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);
    ctx.next_frame().unwrap();
    run_frame(&mut ctx);
    ctx.next_frame().unwrap();
    ctx.clear_all_frames().unwrap();
}

#[test]
fn drain_signals_every_slot_and_is_idempotent() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);
    run_frame(&mut ctx);
    run_frame(&mut ctx);

    ctx.clear_all_frames().unwrap();
    assert_eq!(ctx.last_fence_value(), 5);
    assert!(ctx.slots().iter().all(|slot| slot.is_complete()));

    ctx.clear_all_frames().unwrap();
    assert_eq!(ctx.last_fence_value(), 5);
}

#[test]
fn frame_calls_after_drain_fail() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);
    ctx.clear_all_frames().unwrap();

    for err in [
        ctx.reset_pipeline().unwrap_err(),
        ctx.next_frame().unwrap_err(),
        ctx.render().unwrap_err(),
        ctx.flush().unwrap_err(),
    ] {
        assert!(err.is(GfxErrorKind::ContractViolation));
        assert!(err.message().contains("after clear_all_frames"), "{err}");
    }
}

#[test]
fn drop_without_drain_still_waits_for_the_gpu() {
    let instance = HeadlessInstance::new();
    let gpu = instance.gpu();
    let mut ctx = context(&instance);
    gpu.set_auto_complete(false);
    run_frame(&mut ctx);
    assert!(gpu.pending_len() > 0);

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        drop(ctx);
        tx.send(()).unwrap();
    });

    assert!(rx.recv_timeout(BLOCKED).is_err(), "drop returned before the GPU finished");
    assert!(gpu.pending_len() > 0);
    gpu.set_auto_complete(true);
    rx.recv_timeout(RELEASED).unwrap();
    worker.join().unwrap();
    assert_eq!(gpu.pending_len(), 0);
}

#[test]
fn failed_signal_after_submit_stops_frames_until_drained() {
    let instance = HeadlessInstance::new();
    let gpu = instance.gpu();
    let mut ctx = context(&instance);
    run_frame(&mut ctx);
    let signaled = ctx.last_fence_value();

    ctx.reset_pipeline().unwrap();
    ctx.set_back_buffer_render(CLEAR_COLOR).unwrap();
    ctx.set_back_buffer_present().unwrap();
    gpu.reject_next_signal();
    let err = ctx.render().unwrap_err();
    assert_eq!(err.kind(), GfxErrorKind::SyncFailed);
    // The list went out but nothing was presented or signaled for it.
    assert_eq!(gpu.executed_lists(), 2);
    assert_eq!(gpu.present_count(), 1);
    assert_eq!(ctx.last_fence_value(), signaled);

    for err in [ctx.reset_pipeline().unwrap_err(), ctx.next_frame().unwrap_err()] {
        assert_eq!(err.kind(), GfxErrorKind::ContractViolation);
        assert!(err.message().contains("failed fence signal"), "{err}");
    }

    ctx.clear_all_frames().unwrap();
    assert_eq!(gpu.pending_len(), 0);
    assert!(ctx.slots().iter().all(|slot| slot.is_complete()));
}
