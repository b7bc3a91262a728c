//! CPU/GPU pacing across the frame slots.
//!
//! Every submission is followed by a queue signal with a value drawn from a
//! single counter, so values grow strictly both per slot and across slots.
//! Waiting on a slot's value therefore also covers everything submitted
//! before it.

use std::time::Duration;

use tracing::debug;

use crate::backend::Backend;
use crate::backend::Fence;
use crate::backend::Queue;
use crate::frame_slot::FrameSlot;
use crate::frame_slot::SlotState;
use crate::gfx_error::GfxResult;

/// Millisecond argument for a Win32 wait, where `u32::MAX` means forever.
///
/// Finite timeouts round up so a sub-millisecond wait still blocks, and stop
/// one below the infinite value.
pub fn wait_millis(timeout: Option<Duration>) -> u32 {
    match timeout {
        Some(timeout) => timeout.as_nanos().div_ceil(1_000_000).min(u128::from(u32::MAX - 1)) as u32,
        None => u32::MAX,
    }
}

pub struct FrameSynchronizer {
    next_fence_value: u64,
    timeout: Option<Duration>,
}

impl FrameSynchronizer {
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            // Fences start at 0, so the first signal must be above it.
            next_fence_value: 1,
            timeout,
        }
    }

    /// The most recent value handed out, 0 before the first signal.
    pub fn last_signaled(&self) -> u64 {
        self.next_fence_value - 1
    }

    /// Enqueues a signal for `slot` after everything submitted so far and
    /// marks it [`SlotState::Submitted`].
    pub fn signal<B: Backend>(&mut self, queue: &B::Queue, slot: &mut FrameSlot<B>) -> GfxResult<u64> {
        let value = self.next_fence_value;
        queue.signal(&slot.fence, value)?;
        self.next_fence_value += 1;
        slot.fence_value = value;
        slot.state = SlotState::Submitted;
        debug!("Slot {} signaled with fence value {}", slot.index, value);
        Ok(value)
    }

    /// Blocks until the GPU has finished the work last signaled for `slot`.
    ///
    /// On timeout the slot stays [`SlotState::Submitted`] and the error is
    /// `SyncFailed`.
    pub fn wait_for_slot<B: Backend>(&self, slot: &mut FrameSlot<B>) -> GfxResult<()> {
        if slot.state == SlotState::Idle {
            return Ok(());
        }
        if !slot.is_complete() {
            debug!(
                "Slot {} waiting for fence value {} (completed {})",
                slot.index,
                slot.fence_value,
                slot.fence.completed_value()
            );
            slot.fence.wait_for(slot.fence_value, self.timeout)?;
        }
        slot.state = SlotState::Idle;
        Ok(())
    }

    /// Signals every slot with a fresh value, then waits on every slot.
    pub fn drain<B: Backend>(&mut self, queue: &B::Queue, slots: &mut [FrameSlot<B>]) -> GfxResult<()> {
        for slot in slots.iter_mut() {
            self.signal(queue, slot)?;
        }
        for slot in slots.iter_mut() {
            self.wait_for_slot(slot)?;
        }
        debug!("Drained {} slots at fence value {}", slots.len(), self.last_signaled());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Device;
    use crate::backend::Instance;
    use crate::constants::MIN_FEATURE_LEVEL;
    use crate::desc::*;
    use crate::gfx_error::GfxErrorKind;
    use crate::headless::Headless;
    use crate::headless::HeadlessDevice;
    use crate::headless::HeadlessInstance;
    use crate::headless::HeadlessQueue;

    fn slots(instance: &HeadlessInstance, count: usize) -> (HeadlessDevice, HeadlessQueue, Vec<FrameSlot<Headless>>) {
        let adapter = instance.adapters().unwrap().remove(0);
        let device = instance.create_device(&adapter.raw, MIN_FEATURE_LEVEL).unwrap();
        let queue = device.create_command_queue().unwrap();
        let buffer = device
            .create_committed_resource(
                &HeapProperties::new(HeapType::DEFAULT),
                HeapFlags::NONE,
                &ResourceDesc::buffer(16),
                ResourceStates::COMMON,
                None,
            )
            .unwrap();
        let slots = (0..count)
            .map(|i| FrameSlot::new(i, &device, buffer.clone()).unwrap())
            .collect();
        (device, queue, slots)
    }

    #[test]
    fn values_increase_across_slots() {
        let instance = HeadlessInstance::new();
        let (_device, queue, mut slots) = slots(&instance, 3);
        let mut sync = FrameSynchronizer::new(None);
        let values: Vec<u64> = slots
            .iter_mut()
            .map(|slot| sync.signal(&queue, slot).unwrap())
            .collect();
        assert_eq!(values, [1, 2, 3]);
        let again = sync.signal(&queue, &mut slots[0]).unwrap();
        assert!(again > values[0]);
        assert_eq!(slots[0].fence_value(), 4);
    }

    #[test]
    fn timeout_leaves_slot_submitted() {
        let instance = HeadlessInstance::new();
        let gpu = instance.gpu();
        gpu.set_auto_complete(false);
        let (_device, queue, mut slots) = slots(&instance, 1);
        let mut sync = FrameSynchronizer::new(Some(Duration::from_millis(20)));
        sync.signal(&queue, &mut slots[0]).unwrap();

        let err = sync.wait_for_slot(&mut slots[0]).unwrap_err();
        assert!(err.is(GfxErrorKind::SyncFailed));
        assert_eq!(slots[0].state(), SlotState::Submitted);

        gpu.complete_all();
        sync.wait_for_slot(&mut slots[0]).unwrap();
        assert_eq!(slots[0].state(), SlotState::Idle);
    }

    #[test]
    fn wait_millis_rounds_up_and_caps_below_infinite() {
        assert_eq!(wait_millis(None), u32::MAX);
        assert_eq!(wait_millis(Some(Duration::ZERO)), 0);
        assert_eq!(wait_millis(Some(Duration::from_micros(500))), 1);
        assert_eq!(wait_millis(Some(Duration::from_micros(2500))), 3);
        assert_eq!(wait_millis(Some(Duration::from_millis(250))), 250);
        assert_eq!(wait_millis(Some(Duration::from_secs(u64::MAX))), u32::MAX - 1);
    }
}
