use crate::backend::Backend;
use crate::backend::Device;
use crate::backend::Fence;
use crate::gfx_error::GfxResult;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SlotState {
    /// No GPU work recorded through this slot is outstanding.
    Idle,
    /// Work was submitted and its fence value may not have been reached yet.
    Submitted,
}

/// Everything that belongs to one in-flight frame.
pub struct FrameSlot<B: Backend> {
    pub(crate) index: usize,
    pub(crate) allocator: B::CommandAllocator,
    pub(crate) fence: B::Fence,
    pub(crate) fence_value: u64,
    pub(crate) back_buffer: B::Resource,
    pub(crate) state: SlotState,
}

impl<B: Backend> FrameSlot<B> {
    pub fn new(index: usize, device: &B::Device, back_buffer: B::Resource) -> GfxResult<Self> {
        Ok(Self {
            index,
            allocator: device.create_command_allocator()?,
            fence: device.create_fence(0)?,
            fence_value: 0,
            back_buffer,
            state: SlotState::Idle,
        })
    }

    pub fn index(&self) -> usize {
        self.index
    }

    /// The last value signaled for this slot, 0 before the first submission.
    pub fn fence_value(&self) -> u64 {
        self.fence_value
    }

    pub fn state(&self) -> SlotState {
        self.state
    }

    pub fn back_buffer(&self) -> &B::Resource {
        &self.back_buffer
    }

    pub fn fence(&self) -> &B::Fence {
        &self.fence
    }

    /// True once the GPU has passed the last value signaled for this slot.
    pub fn is_complete(&self) -> bool {
        self.fence.completed_value() >= self.fence_value
    }
}
