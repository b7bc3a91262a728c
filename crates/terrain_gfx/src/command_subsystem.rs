use tracing::debug;

use crate::backend::Backend;
use crate::backend::CommandAllocator;
use crate::backend::CommandList;
use crate::backend::Device;
use crate::backend::Queue;
use crate::frame_slot::FrameSlot;
use crate::gfx_error::GfxResult;

/// The queue and the one command list every frame records into. The
/// per-frame allocators live in the frame slots.
pub struct CommandSubsystem<B: Backend> {
    queue: B::Queue,
    list: B::CommandList,
}

impl<B: Backend> CommandSubsystem<B> {
    pub fn create_queue(device: &B::Device) -> GfxResult<B::Queue> {
        device.create_command_queue()
    }

    /// Creates the shared list against the first slot's allocator. The list
    /// starts closed.
    pub fn new(device: &B::Device, queue: B::Queue, first_slot: &FrameSlot<B>) -> GfxResult<Self> {
        let list = device.create_command_list(&first_slot.allocator)?;
        Ok(Self { queue, list })
    }

    pub fn queue(&self) -> &B::Queue {
        &self.queue
    }

    pub fn list(&self) -> &B::CommandList {
        &self.list
    }

    /// Resets the slot's allocator, then reopens the list on it. Only valid
    /// once the slot's fence shows the GPU is done with the allocator.
    pub fn reset(&self, slot: &FrameSlot<B>) -> GfxResult<()> {
        slot.allocator.reset()?;
        self.list.reset(&slot.allocator, None)?;
        debug!("Command list reset on slot {}", slot.index);
        Ok(())
    }

    /// Closes the list and hands it to the queue.
    pub fn submit(&self) -> GfxResult<()> {
        self.list.close()?;
        self.queue.execute(&self.list)
    }
}
