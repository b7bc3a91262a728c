use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;

/// Where the current frame is in its recording.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordingState {
    /// The command list is closed.
    Idle,
    /// The list is open against the current slot's allocator.
    Recording,
    /// The back buffer is a bound render target.
    RenderTargetBound,
    /// The back buffer is back in the present state.
    ReadyToPresent,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FrameCall {
    ResetPipeline,
    CommandList,
    SetBackBufferRender,
    SetBackBufferPresent,
    Render,
    Flush,
    NextFrame,
    CreateInitializedBuffer,
}

impl FrameCall {
    fn name(self) -> &'static str {
        match self {
            FrameCall::ResetPipeline => "reset_pipeline",
            FrameCall::CommandList => "command_list",
            FrameCall::SetBackBufferRender => "set_back_buffer_render",
            FrameCall::SetBackBufferPresent => "set_back_buffer_present",
            FrameCall::Render => "render",
            FrameCall::Flush => "flush",
            FrameCall::NextFrame => "next_frame",
            FrameCall::CreateInitializedBuffer => "create_initialized_buffer",
        }
    }
}

/// Enforces the order of the per-frame calls.
///
/// A call is first [`check`](FrameRecorder::check)ed, which touches nothing,
/// and the state only moves on [`complete`](FrameRecorder::complete) after
/// the GPU-side work succeeded.
#[derive(Debug)]
pub struct FrameRecorder {
    state: RecordingState,
    drained: bool,
    faulted: bool,
}

impl Default for FrameRecorder {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameRecorder {
    pub fn new() -> Self {
        Self {
            state: RecordingState::Idle,
            drained: false,
            faulted: false,
        }
    }

    pub fn state(&self) -> RecordingState {
        self.state
    }

    pub fn is_drained(&self) -> bool {
        self.drained
    }

    pub fn is_faulted(&self) -> bool {
        self.faulted
    }

    /// Work was submitted but its fence was never signaled. Only a drain
    /// brings the slots back to a known state.
    pub fn mark_faulted(&mut self) {
        self.faulted = true;
        self.state = RecordingState::Idle;
    }

    /// No frame call is accepted after this.
    pub fn mark_drained(&mut self) {
        self.drained = true;
        self.state = RecordingState::Idle;
    }

    pub fn check(&self, call: FrameCall) -> GfxResult<()> {
        if self.drained {
            return Err(GfxError::new(
                GfxErrorKind::ContractViolation,
                format!("{} called after clear_all_frames", call.name()),
            ));
        }
        if self.faulted {
            return Err(GfxError::new(
                GfxErrorKind::ContractViolation,
                format!("{} called after a failed fence signal, clear_all_frames is required", call.name()),
            ));
        }
        let allowed = match call {
            FrameCall::ResetPipeline | FrameCall::NextFrame => self.state == RecordingState::Idle,
            FrameCall::CommandList => self.state != RecordingState::Idle,
            FrameCall::SetBackBufferRender | FrameCall::Flush | FrameCall::CreateInitializedBuffer => {
                self.state == RecordingState::Recording
            }
            FrameCall::SetBackBufferPresent => self.state == RecordingState::RenderTargetBound,
            FrameCall::Render => self.state == RecordingState::ReadyToPresent,
        };
        if allowed {
            Ok(())
        } else {
            Err(GfxError::new(
                GfxErrorKind::ContractViolation,
                format!("{} called while {:?}", call.name(), self.state),
            ))
        }
    }

    pub fn complete(&mut self, call: FrameCall) {
        self.state = match call {
            FrameCall::ResetPipeline => RecordingState::Recording,
            FrameCall::SetBackBufferRender => RecordingState::RenderTargetBound,
            FrameCall::SetBackBufferPresent => RecordingState::ReadyToPresent,
            FrameCall::Render | FrameCall::Flush => RecordingState::Idle,
            FrameCall::CommandList | FrameCall::NextFrame | FrameCall::CreateInitializedBuffer => self.state,
        };
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(recorder: &mut FrameRecorder, call: FrameCall) -> GfxResult<()> {
        recorder.check(call)?;
        recorder.complete(call);
        Ok(())
    }

    #[test]
    fn full_frame_returns_to_idle() {
        let mut recorder = FrameRecorder::new();
        for call in [
            FrameCall::ResetPipeline,
            FrameCall::CommandList,
            FrameCall::SetBackBufferRender,
            FrameCall::CommandList,
            FrameCall::SetBackBufferPresent,
            FrameCall::Render,
        ] {
            run(&mut recorder, call).unwrap();
        }
        assert_eq!(recorder.state(), RecordingState::Idle);
    }

    #[test]
    fn present_before_render_target_is_rejected() {
        let mut recorder = FrameRecorder::new();
        run(&mut recorder, FrameCall::ResetPipeline).unwrap();
        let err = run(&mut recorder, FrameCall::SetBackBufferPresent).unwrap_err();
        assert!(err.is(GfxErrorKind::ContractViolation));
        assert_eq!(recorder.state(), RecordingState::Recording);
    }

    #[test]
    fn command_list_needs_an_open_frame() {
        let recorder = FrameRecorder::new();
        assert!(recorder.check(FrameCall::CommandList).is_err());
    }

    #[test]
    fn flush_only_from_recording() {
        let mut recorder = FrameRecorder::new();
        assert!(run(&mut recorder, FrameCall::Flush).is_err());
        run(&mut recorder, FrameCall::ResetPipeline).unwrap();
        run(&mut recorder, FrameCall::SetBackBufferRender).unwrap();
        assert!(run(&mut recorder, FrameCall::Flush).is_err());
    }

    #[test]
    fn everything_is_rejected_after_drain() {
        let mut recorder = FrameRecorder::new();
        recorder.mark_drained();
        let err = recorder.check(FrameCall::ResetPipeline).unwrap_err();
        assert!(err.message().contains("after clear_all_frames"));
        assert!(recorder.check(FrameCall::NextFrame).is_err());
    }

    #[test]
    fn failed_signal_blocks_frames_until_drain() {
        let mut recorder = FrameRecorder::new();
        run(&mut recorder, FrameCall::ResetPipeline).unwrap();
        recorder.mark_faulted();
        assert!(recorder.is_faulted());
        assert_eq!(recorder.state(), RecordingState::Idle);
        for call in [FrameCall::ResetPipeline, FrameCall::NextFrame, FrameCall::CommandList] {
            let err = recorder.check(call).unwrap_err();
            assert!(err.is(GfxErrorKind::ContractViolation));
            assert!(err.message().contains("failed fence signal"), "{err}");
        }
        recorder.mark_drained();
        let err = recorder.check(FrameCall::ResetPipeline).unwrap_err();
        assert!(err.message().contains("after clear_all_frames"));
    }
}
