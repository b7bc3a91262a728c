mod common;

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use common::*;
use terrain_gfx::headless::HeadlessInstance;
use terrain_gfx::GfxConfig;
use terrain_gfx::GfxErrorKind;
use terrain_gfx::RecordingState;

const BLOCKED: Duration = Duration::from_millis(200);
const RELEASED: Duration = Duration::from_secs(5);

#[test]
fn fourth_frame_waits_for_the_first() {
    let instance = HeadlessInstance::new();
    let gpu = instance.gpu();
    let mut ctx = context(&instance);
    gpu.set_auto_complete(false);

    // Three frames fit in flight without any GPU progress.
    for _ in 0..3 {
        run_frame(&mut ctx);
    }
    assert_eq!(ctx.buffer_index(), 0);
    assert!(!ctx.slots()[0].is_complete());

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let result = ctx.reset_pipeline();
        tx.send(result.is_ok()).unwrap();
        ctx
    });

    assert!(rx.recv_timeout(BLOCKED).is_err(), "reset_pipeline returned before the GPU finished frame 1");
    gpu.complete_all();
    assert!(rx.recv_timeout(RELEASED).unwrap());

    let mut ctx = worker.join().unwrap();
    gpu.set_auto_complete(true);
    assert_eq!(ctx.recording_state(), RecordingState::Recording);
    ctx.flush().unwrap();
    ctx.clear_all_frames().unwrap();
}

#[test]
fn completing_only_the_oldest_frame_is_enough() {
    let instance = HeadlessInstance::new();
    let gpu = instance.gpu();
    let mut ctx = context(&instance);
    gpu.set_auto_complete(false);

    for _ in 0..3 {
        run_frame(&mut ctx);
    }
    // Frame 1 is an execute followed by its signal.
    assert!(gpu.complete_next());
    assert!(gpu.complete_next());
    assert!(ctx.slots()[0].is_complete());
    assert!(!ctx.slots()[1].is_complete());

    ctx.reset_pipeline().unwrap();
    gpu.set_auto_complete(true);
    ctx.flush().unwrap();
    ctx.clear_all_frames().unwrap();
}

#[test]
fn drain_blocks_until_all_work_completes() {
    let instance = HeadlessInstance::new();
    let gpu = instance.gpu();
    let mut ctx = context(&instance);
    gpu.set_auto_complete(false);
    run_frame(&mut ctx);
    run_frame(&mut ctx);

    let (tx, rx) = mpsc::channel();
    let worker = thread::spawn(move || {
        let result = ctx.clear_all_frames();
        tx.send(result.is_ok()).unwrap();
        ctx
    });

    assert!(rx.recv_timeout(BLOCKED).is_err(), "drain returned with frames in flight");
    gpu.set_auto_complete(true);
    assert!(rx.recv_timeout(RELEASED).unwrap());

    let ctx = worker.join().unwrap();
    assert_eq!(gpu.pending_len(), 0);
    assert!(ctx.slots().iter().all(|slot| slot.is_complete()));
}

#[test]
fn bounded_wait_times_out_and_can_be_retried() {
    let instance = HeadlessInstance::new();
    let gpu = instance.gpu();
    let config = GfxConfig {
        fence_timeout: Some(Duration::from_millis(50)),
        ..test_config()
    };
    let mut ctx = context_with(&instance, config);
    gpu.set_auto_complete(false);

    for _ in 0..3 {
        run_frame(&mut ctx);
    }
    let err = ctx.reset_pipeline().unwrap_err();
    assert_eq!(err.kind(), GfxErrorKind::SyncFailed);
    assert!(err.message().contains("timed out"), "{err}");
    assert_eq!(ctx.recording_state(), RecordingState::Idle);

    gpu.set_auto_complete(true);
    ctx.reset_pipeline().unwrap();
    ctx.flush().unwrap();
    ctx.clear_all_frames().unwrap();
}

#[test]
fn device_removal_surfaces_as_device_lost() {
    let instance = HeadlessInstance::new();
    let gpu = instance.gpu();
    let mut ctx = context(&instance);
    run_frame(&mut ctx);

    gpu.remove_device("DXGI_ERROR_DEVICE_HUNG");

    ctx.reset_pipeline().unwrap();
    ctx.set_back_buffer_render(CLEAR_COLOR).unwrap();
    ctx.set_back_buffer_present().unwrap();
    let err = ctx.render().unwrap_err();
    assert_eq!(err.kind(), GfxErrorKind::DeviceLost);
    assert!(err.to_string().contains("DXGI_ERROR_DEVICE_HUNG"), "{err}");
    assert_eq!(ctx.device_context().removed_reason().as_deref(), Some("DXGI_ERROR_DEVICE_HUNG"));

    let err = ctx.clear_all_frames().unwrap_err();
    assert_eq!(err.kind(), GfxErrorKind::DeviceLost);
}

#[test]
fn frames_in_flight_never_exceed_the_slot_count() {
    let instance = HeadlessInstance::new();
    let gpu = instance.gpu();
    let mut ctx = context(&instance);
    gpu.set_auto_complete(false);

    for frame in 0..9 {
        if frame >= 3 {
            // Let exactly the frame the next reset waits on finish.
            assert!(gpu.complete_next());
            assert!(gpu.complete_next());
        }
        run_frame(&mut ctx);
        let in_flight = ctx.slots().iter().filter(|slot| !slot.is_complete()).count();
        assert!(in_flight <= 3);
    }
    assert_eq!(ctx.last_fence_value(), 9);

    gpu.set_auto_complete(true);
    ctx.clear_all_frames().unwrap();
}
