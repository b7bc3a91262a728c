//! The in-memory GPU timeline behind every headless object.
//!
//! Submissions queue up in order. With auto-complete on (the default) each
//! one executes as soon as it is submitted; with it off nothing executes
//! until a test calls [`HeadlessGpu::complete_next`] or
//! [`HeadlessGpu::complete_all`], which lets tests hold fences unreached.

use std::collections::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Condvar;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;
use std::time::Instant;

use tracing::warn;

use super::objects::HeadlessResource;
use crate::desc::*;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::projection::ScissorRect;
use crate::projection::Viewport;

/// A command as recorded on a headless command list.
#[derive(Clone, Debug)]
pub enum RecordedCommand {
    Transition {
        resource: u64,
        before: ResourceStates,
        after: ResourceStates,
    },
    SetRenderTargets {
        rtv: CpuDescriptorHandle,
        dsv: Option<CpuDescriptorHandle>,
    },
    ClearRenderTarget {
        rtv: CpuDescriptorHandle,
        color: [f32; 4],
    },
    ClearDepthStencil {
        dsv: CpuDescriptorHandle,
        depth: f32,
        stencil: u8,
    },
    SetViewport(Viewport),
    SetScissorRect(ScissorRect),
    SetPipelineState(u64),
    SetGraphicsRootSignature(u64),
    SetDescriptorHeaps(Vec<CpuDescriptorHandle>),
    SetGraphicsRootDescriptorTable {
        parameter: u32,
        base: GpuDescriptorHandle,
    },
    SetGraphicsRootConstantBufferView {
        parameter: u32,
        buffer_location: u64,
    },
    SetPrimitiveTopology(PrimitiveTopology),
    SetVertexBuffers {
        start_slot: u32,
        views: Vec<VertexBufferView>,
    },
    SetIndexBuffer(IndexBufferView),
    CopyBufferRegion {
        dst: HeadlessResource,
        dst_offset: u64,
        src: HeadlessResource,
        src_offset: u64,
        num_bytes: u64,
    },
    DrawInstanced {
        vertex_count: u32,
        instance_count: u32,
    },
    DrawIndexedInstanced {
        index_count: u32,
        instance_count: u32,
    },
}

pub(crate) enum QueueItem {
    Execute {
        allocator: u64,
        commands: Vec<RecordedCommand>,
    },
    Signal {
        fence: u64,
        value: u64,
    },
}

struct GpuState {
    auto_complete: bool,
    pending: VecDeque<QueueItem>,
    fences: HashMap<u64, u64>,
    busy_allocators: HashMap<u64, usize>,
    removed: Option<String>,
    reject_next_signal: bool,
    next_id: u64,
    next_virtual_address: u64,
    executed_lists: u64,
    presents: u64,
}

struct Shared {
    state: Mutex<GpuState>,
    progressed: Condvar,
}

/// Handle to the shared timeline. Cloning shares it.
#[derive(Clone)]
pub struct HeadlessGpu {
    shared: Arc<Shared>,
}

impl Default for HeadlessGpu {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for HeadlessGpu {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.lock();
        f.debug_struct("HeadlessGpu")
            .field("auto_complete", &state.auto_complete)
            .field("pending", &state.pending.len())
            .field("removed", &state.removed)
            .finish()
    }
}

/// Buffer virtual addresses are handed out on 64 KiB boundaries.
const VIRTUAL_ADDRESS_ALIGNMENT: u64 = 64 * 1024;

impl HeadlessGpu {
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                state: Mutex::new(GpuState {
                    auto_complete: true,
                    pending: VecDeque::new(),
                    fences: HashMap::new(),
                    busy_allocators: HashMap::new(),
                    removed: None,
                    reject_next_signal: false,
                    next_id: 1,
                    next_virtual_address: VIRTUAL_ADDRESS_ALIGNMENT,
                    executed_lists: 0,
                    presents: 0,
                }),
                progressed: Condvar::new(),
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, GpuState> {
        self.shared.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Turning auto-complete on also runs everything already queued.
    pub fn set_auto_complete(&self, auto_complete: bool) {
        let mut state = self.lock();
        state.auto_complete = auto_complete;
        if auto_complete {
            while state.complete_next() {}
            self.shared.progressed.notify_all();
        }
    }

    pub fn is_auto_complete(&self) -> bool {
        self.lock().auto_complete
    }

    /// Executes the oldest queued item. False when nothing was queued.
    pub fn complete_next(&self) -> bool {
        let done = self.lock().complete_next();
        self.shared.progressed.notify_all();
        done
    }

    /// Executes everything queued and returns how many items ran.
    pub fn complete_all(&self) -> usize {
        let mut state = self.lock();
        let mut count = 0;
        while state.complete_next() {
            count += 1;
        }
        self.shared.progressed.notify_all();
        count
    }

    /// The next fence signal fails without being queued. Work already
    /// executed is unaffected.
    pub fn reject_next_signal(&self) {
        self.lock().reject_next_signal = true;
    }

    pub fn pending_len(&self) -> usize {
        self.lock().pending.len()
    }

    /// Simulates device removal: queued work is dropped, every fence reads
    /// as complete and later submissions and presents fail.
    pub fn remove_device(&self, reason: &str) {
        let mut state = self.lock();
        warn!("Headless device removed: {}", reason);
        state.removed = Some(reason.to_string());
        state.pending.clear();
        state.busy_allocators.clear();
        for value in state.fences.values_mut() {
            *value = u64::MAX;
        }
        self.shared.progressed.notify_all();
    }

    pub fn removed_reason(&self) -> Option<String> {
        self.lock().removed.clone()
    }

    /// Command lists executed so far.
    pub fn executed_lists(&self) -> u64 {
        self.lock().executed_lists
    }

    pub fn present_count(&self) -> u64 {
        self.lock().presents
    }

    pub(crate) fn next_id(&self) -> u64 {
        let mut state = self.lock();
        let id = state.next_id;
        state.next_id += 1;
        id
    }

    pub(crate) fn allocate_virtual_address(&self, size: u64) -> u64 {
        let mut state = self.lock();
        let address = state.next_virtual_address;
        let span = size.div_ceil(VIRTUAL_ADDRESS_ALIGNMENT).max(1) * VIRTUAL_ADDRESS_ALIGNMENT;
        state.next_virtual_address += span;
        address
    }

    pub(crate) fn register_fence(&self, fence: u64, initial_value: u64) {
        let mut state = self.lock();
        let value = if state.removed.is_some() { u64::MAX } else { initial_value };
        state.fences.insert(fence, value);
    }

    pub(crate) fn fence_value(&self, fence: u64) -> u64 {
        self.lock().fences.get(&fence).copied().unwrap_or(0)
    }

    pub(crate) fn allocator_in_flight(&self, allocator: u64) -> bool {
        self.lock()
            .busy_allocators
            .get(&allocator)
            .is_some_and(|count| *count > 0)
    }

    pub(crate) fn submit(&self, item: QueueItem) -> GfxResult<()> {
        let mut state = self.lock();
        if let Some(reason) = &state.removed {
            return Err(GfxError::new(GfxErrorKind::DeviceLost, reason.clone()));
        }
        if let QueueItem::Signal { value, .. } = &item {
            if std::mem::take(&mut state.reject_next_signal) {
                return Err(GfxError::new(
                    GfxErrorKind::SyncFailed,
                    format!("signal of fence value {} rejected", value),
                ));
            }
        }
        if let QueueItem::Execute { allocator, .. } = &item {
            *state.busy_allocators.entry(*allocator).or_insert(0) += 1;
            state.executed_lists += 1;
        }
        state.pending.push_back(item);
        if state.auto_complete {
            while state.complete_next() {}
            self.shared.progressed.notify_all();
        }
        Ok(())
    }

    pub(crate) fn present(&self) -> GfxResult<()> {
        let mut state = self.lock();
        if let Some(reason) = &state.removed {
            return Err(GfxError::new(
                GfxErrorKind::DeviceLost,
                format!("present failed, device removed: {}", reason),
            ));
        }
        state.presents += 1;
        Ok(())
    }

    pub(crate) fn wait_for_fence(&self, fence: u64, value: u64, timeout: Option<Duration>) -> GfxResult<()> {
        let deadline = timeout.map(|timeout| Instant::now() + timeout);
        let mut state = self.lock();
        loop {
            let completed = state.fences.get(&fence).copied().unwrap_or(0);
            if completed >= value {
                return Ok(());
            }
            state = match deadline {
                None => self
                    .shared
                    .progressed
                    .wait(state)
                    .unwrap_or_else(PoisonError::into_inner),
                Some(deadline) => {
                    let now = Instant::now();
                    if now >= deadline {
                        return Err(GfxError::new(
                            GfxErrorKind::SyncFailed,
                            format!(
                                "timed out after {:?} waiting for fence value {} (completed {})",
                                timeout.unwrap_or_default(),
                                value,
                                completed
                            ),
                        ));
                    }
                    let (state, _) = self
                        .shared
                        .progressed
                        .wait_timeout(state, deadline - now)
                        .unwrap_or_else(PoisonError::into_inner);
                    state
                }
            };
        }
    }
}

impl GpuState {
    fn complete_next(&mut self) -> bool {
        let Some(item) = self.pending.pop_front() else {
            return false;
        };
        match item {
            QueueItem::Execute { allocator, commands } => {
                for command in &commands {
                    if let RecordedCommand::CopyBufferRegion {
                        dst,
                        dst_offset,
                        src,
                        src_offset,
                        num_bytes,
                    } = command
                    {
                        if let Err(e) = dst.copy_from(*dst_offset, src, *src_offset, *num_bytes) {
                            warn!("Headless copy dropped: {}", e);
                        }
                    }
                }
                if let Some(count) = self.busy_allocators.get_mut(&allocator) {
                    *count = count.saturating_sub(1);
                }
            }
            QueueItem::Signal { fence, value } => {
                self.fences.insert(fence, value);
            }
        }
        true
    }
}
