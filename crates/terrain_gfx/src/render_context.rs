//! The rendering context: one value owning the device, queue, swap chain and
//! frame slots, and exposing the per-frame calls.
//!
//! A frame is driven as
//!
//! ```text
//! reset_pipeline -> command_list (record) -> set_back_buffer_render
//!     -> (draw) -> set_back_buffer_present -> render
//! ```
//!
//! and shutdown calls [`RenderContext::clear_all_frames`] before dropping.
//! Calls made out of that order fail with `ContractViolation` without
//! touching any GPU object.

use std::path::Path;

use tracing::error;
use tracing::info;
use tracing::warn;

use crate::backend::AdapterInfo;
use crate::backend::Backend;
use crate::backend::CommandList;
use crate::command_subsystem::CommandSubsystem;
use crate::config::GfxConfig;
use crate::constants::FRAME_BUFFER_COUNT;
use crate::desc::*;
use crate::device_context::DeviceContext;
use crate::frame_recorder::FrameCall;
use crate::frame_recorder::FrameRecorder;
use crate::frame_recorder::RecordingState;
use crate::frame_slot::FrameSlot;
use crate::frame_synchronizer::FrameSynchronizer;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::pipeline_factory;
use crate::projection::ScissorRect;
use crate::projection::Viewport;
use crate::resource_factory;
use crate::resource_factory::CommittedResource;
use crate::resource_factory::DescriptorHeap;
use crate::shader_compiler;
use crate::shader_compiler::ShaderBytecode;
use crate::shader_compiler::ShaderStage;
use crate::swap_chain_manager::SwapChainManager;
use crate::window_target::WindowTarget;

/// A default buffer filled through a staging upload buffer.
///
/// The copy only happens when the recorded commands execute, so `upload`
/// must outlive the next [`RenderContext::flush`] or frame completion.
pub struct InitializedBuffer<B: Backend> {
    pub buffer: CommittedResource<B>,
    pub upload: CommittedResource<B>,
}

pub struct RenderContext<B: Backend> {
    config: GfxConfig,
    recorder: FrameRecorder,
    sync: FrameSynchronizer,
    swap_chain: SwapChainManager<B>,
    commands: CommandSubsystem<B>,
    slots: [FrameSlot<B>; FRAME_BUFFER_COUNT],
    device: DeviceContext<B>,
}

impl<B: Backend> RenderContext<B> {
    /// Selects an adapter, creates the device, queue, swap chain sized to the
    /// window's client area, and one slot per back buffer. Either everything
    /// is created or nothing is.
    pub fn new<W: WindowTarget + ?Sized>(
        instance: &B::Instance,
        window: &W,
        fullscreen: bool,
        config: GfxConfig,
    ) -> GfxResult<Self> {
        let device = DeviceContext::<B>::new(instance, &config)?;
        let queue = CommandSubsystem::<B>::create_queue(device.device())?;
        let swap_chain = SwapChainManager::new(instance, &device, &queue, window, fullscreen)?;
        let slots: [FrameSlot<B>; FRAME_BUFFER_COUNT] = array_init::try_array_init(|index| {
            let back_buffer = swap_chain.back_buffer(index as u32)?;
            FrameSlot::new(index, device.device(), back_buffer)
        })?;
        let commands = CommandSubsystem::new(device.device(), queue, &slots[0])?;

        info!(
            "Render context ready on {} ({} frames in flight, sync interval {})",
            device.adapter_info().name,
            FRAME_BUFFER_COUNT,
            config.sync_interval
        );

        Ok(Self {
            sync: FrameSynchronizer::new(config.fence_timeout),
            config,
            recorder: FrameRecorder::new(),
            swap_chain,
            commands,
            slots,
            device,
        })
    }

    fn slot_index(&self) -> usize {
        self.swap_chain.buffer_index() as usize
    }

    /// Replaces a failure with `DeviceLost` when the device is gone, keeping
    /// the original as its source.
    fn check_device(&self, err: GfxError) -> GfxError {
        if err.is(GfxErrorKind::DeviceLost) {
            return err;
        }
        match self.device.removed_reason() {
            Some(reason) => GfxError::with_source(GfxErrorKind::DeviceLost, reason, err),
            None => err,
        }
    }

    /// Signals the slot the just-submitted list belongs to. On failure that
    /// list has no fence value, so frame calls stop until a drain.
    fn signal_current_slot(&mut self) -> GfxResult<()> {
        let index = self.slot_index();
        let signaled = self.sync.signal(self.commands.queue(), &mut self.slots[index]);
        if let Err(e) = signaled {
            self.recorder.mark_faulted();
            error!("Fence signal failed after submit: {}", e);
            return Err(self.check_device(e));
        }
        Ok(())
    }

    fn wait_for_current_slot(&mut self) -> GfxResult<()> {
        let index = self.slot_index();
        let result = self.sync.wait_for_slot(&mut self.slots[index]);
        result.map_err(|e| self.check_device(e))
    }

    /// Blocks until the GPU is done with the current slot.
    pub fn next_frame(&mut self) -> GfxResult<()> {
        self.recorder.check(FrameCall::NextFrame)?;
        self.wait_for_current_slot()
    }

    /// Starts a frame: waits for the current slot, then resets its allocator
    /// and reopens the command list on it.
    pub fn reset_pipeline(&mut self) -> GfxResult<()> {
        self.recorder.check(FrameCall::ResetPipeline)?;
        self.wait_for_current_slot()?;
        let result = self.commands.reset(&self.slots[self.slot_index()]);
        result.map_err(|e| self.check_device(e))?;
        self.recorder.complete(FrameCall::ResetPipeline);
        Ok(())
    }

    /// The open command list for host recording.
    pub fn command_list(&self) -> GfxResult<&B::CommandList> {
        self.recorder.check(FrameCall::CommandList)?;
        Ok(self.commands.list())
    }

    /// Binds the current back buffer and the depth buffer, clearing the
    /// former to `clear_color`.
    pub fn set_back_buffer_render(&mut self, clear_color: [f32; 4]) -> GfxResult<()> {
        self.recorder.check(FrameCall::SetBackBufferRender)?;
        let slot = &self.slots[self.slot_index()];
        self.swap_chain
            .set_back_buffer_render(self.commands.list(), &slot.back_buffer, clear_color)?;
        self.recorder.complete(FrameCall::SetBackBufferRender);
        Ok(())
    }

    pub fn set_back_buffer_present(&mut self) -> GfxResult<()> {
        self.recorder.check(FrameCall::SetBackBufferPresent)?;
        let slot = &self.slots[self.slot_index()];
        self.swap_chain
            .set_back_buffer_present(self.commands.list(), &slot.back_buffer);
        self.recorder.complete(FrameCall::SetBackBufferPresent);
        Ok(())
    }

    /// Submits the frame, signals its slot, presents and moves to the next
    /// back buffer.
    pub fn render(&mut self) -> GfxResult<()> {
        self.recorder.check(FrameCall::Render)?;
        let submitted = self.commands.submit();
        submitted.map_err(|e| self.check_device(e))?;
        self.recorder.complete(FrameCall::Render);
        self.signal_current_slot()?;

        let presented = self.swap_chain.present(self.config.sync_interval);
        presented.map_err(|e| self.check_device(e))?;
        Ok(())
    }

    /// Submits what was recorded since [`reset_pipeline`](Self::reset_pipeline)
    /// without presenting and waits for it to finish. Used for uploads
    /// before the first frame.
    pub fn flush(&mut self) -> GfxResult<()> {
        self.recorder.check(FrameCall::Flush)?;
        let submitted = self.commands.submit();
        submitted.map_err(|e| self.check_device(e))?;
        self.recorder.complete(FrameCall::Flush);
        self.signal_current_slot()?;
        self.wait_for_current_slot()
    }

    /// Waits for all GPU work of every slot. Call before dropping the context.
    /// Afterwards every frame call fails; a second drain does nothing.
    pub fn clear_all_frames(&mut self) -> GfxResult<()> {
        if self.recorder.is_drained() {
            return Ok(());
        }
        if self.recorder.state() != RecordingState::Idle {
            warn!(
                "Draining with an unsubmitted frame ({:?}), its commands are discarded",
                self.recorder.state()
            );
        }
        let drained = self.sync.drain(self.commands.queue(), &mut self.slots);
        drained.map_err(|e| self.check_device(e))?;
        self.recorder.mark_drained();
        info!("All frames drained at fence value {}", self.sync.last_signaled());
        Ok(())
    }

    pub fn config(&self) -> &GfxConfig {
        &self.config
    }

    pub fn device_context(&self) -> &DeviceContext<B> {
        &self.device
    }

    pub fn device(&self) -> &B::Device {
        self.device.device()
    }

    pub fn adapter_info(&self) -> &AdapterInfo {
        self.device.adapter_info()
    }

    pub fn feature_level(&self) -> FeatureLevel {
        self.device.feature_level()
    }

    pub fn queue(&self) -> &B::Queue {
        self.commands.queue()
    }

    pub fn swap_chain(&self) -> &SwapChainManager<B> {
        &self.swap_chain
    }

    pub fn buffer_index(&self) -> u32 {
        self.swap_chain.buffer_index()
    }

    pub fn recording_state(&self) -> RecordingState {
        self.recorder.state()
    }

    pub fn slots(&self) -> &[FrameSlot<B>] {
        &self.slots
    }

    /// The value of the most recent queue signal, 0 before the first frame.
    pub fn last_fence_value(&self) -> u64 {
        self.sync.last_signaled()
    }

    pub fn viewport(&self) -> Viewport {
        Viewport::new(self.swap_chain.width(), self.swap_chain.height())
    }

    pub fn scissor_rect(&self) -> ScissorRect {
        ScissorRect::new(self.swap_chain.width(), self.swap_chain.height())
    }

    pub fn create_upload_buffer(&self, size: u64, name: &str) -> GfxResult<CommittedResource<B>> {
        resource_factory::create_upload_buffer(&self.device, size, name)
    }

    pub fn create_default_buffer(&self, size: u64, name: &str) -> GfxResult<CommittedResource<B>> {
        resource_factory::create_default_buffer(&self.device, size, name)
    }

    pub fn create_committed_resource(
        &self,
        heap: &HeapProperties,
        flags: HeapFlags,
        desc: &ResourceDesc,
        initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
        name: &str,
    ) -> GfxResult<CommittedResource<B>> {
        resource_factory::create_committed_resource(&self.device, heap, flags, desc, initial_state, clear_value, name)
    }

    /// Creates a default buffer holding `data` and records the staging copy
    /// plus a transition to `final_state` on the open command list.
    pub fn create_initialized_buffer(
        &self,
        data: &[u8],
        final_state: ResourceStates,
        name: &str,
    ) -> GfxResult<InitializedBuffer<B>> {
        self.recorder.check(FrameCall::CreateInitializedBuffer)?;
        if data.is_empty() {
            return Err(GfxError::new(
                GfxErrorKind::ResourceCreationFailed,
                format!("{} has no initial data", name),
            ));
        }
        let size = data.len() as u64;
        let upload = self.create_upload_buffer(size, &format!("{} (upload)", name))?;
        upload.write(0, data)?;
        let buffer = self.create_default_buffer(size, name)?;

        let list = self.commands.list();
        list.copy_buffer_region(buffer.raw(), 0, upload.raw(), 0, size);
        if final_state != ResourceStates::COPY_DEST {
            list.transition(buffer.raw(), ResourceStates::COPY_DEST, final_state);
        }
        Ok(InitializedBuffer { buffer, upload })
    }

    pub fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> GfxResult<DescriptorHeap<B>> {
        resource_factory::create_descriptor_heap(&self.device, desc)
    }

    pub fn create_render_target_view(
        &self,
        resource: &CommittedResource<B>,
        handle: CpuDescriptorHandle,
    ) -> GfxResult<()> {
        resource_factory::create_render_target_view(&self.device, resource, handle)
    }

    pub fn create_shader_resource_view(
        &self,
        resource: Option<&CommittedResource<B>>,
        desc: Option<&ShaderResourceViewDesc>,
        handle: CpuDescriptorHandle,
    ) -> GfxResult<()> {
        resource_factory::create_shader_resource_view(&self.device, resource, desc, handle)
    }

    pub fn create_constant_buffer_view(
        &self,
        desc: &ConstantBufferViewDesc,
        handle: CpuDescriptorHandle,
    ) -> GfxResult<()> {
        resource_factory::create_constant_buffer_view(&self.device, desc, handle)
    }

    pub fn create_depth_stencil_view(
        &self,
        resource: &CommittedResource<B>,
        desc: Option<&DepthStencilViewDesc>,
        handle: CpuDescriptorHandle,
    ) -> GfxResult<()> {
        resource_factory::create_depth_stencil_view(&self.device, resource, desc, handle)
    }

    /// Compiles the `main` entry point of `path` for `stage`. Debug builds
    /// keep debug info and skip optimization.
    pub fn compile_shader(&self, path: impl AsRef<Path>, stage: ShaderStage) -> GfxResult<ShaderBytecode> {
        shader_compiler::compile_shader::<B>(path.as_ref(), stage, cfg!(debug_assertions))
    }

    pub fn create_root_signature(&self, desc: &RootSignatureDesc) -> GfxResult<B::RootSignature> {
        pipeline_factory::create_root_signature(&self.device, desc)
    }

    pub fn create_pipeline_state(&self, desc: &GraphicsPipelineDesc<'_, B>) -> GfxResult<B::PipelineState> {
        pipeline_factory::create_pipeline_state(&self.device, desc)
    }
}

impl<B: Backend> Drop for RenderContext<B> {
    fn drop(&mut self) {
        if self.recorder.is_drained() {
            return;
        }
        warn!("Render context dropped without clear_all_frames, draining now");
        if let Err(e) = self.clear_all_frames() {
            warn!("Drain on drop failed: {}", e);
        }
    }
}
