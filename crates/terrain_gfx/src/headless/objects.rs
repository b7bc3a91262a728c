use std::collections::HashMap;
use std::sync::atomic::AtomicBool;
use std::sync::atomic::AtomicU32;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::sync::Mutex;
use std::sync::MutexGuard;
use std::sync::PoisonError;
use std::time::Duration;

use super::gpu::HeadlessGpu;
use super::gpu::QueueItem;
use super::gpu::RecordedCommand;
use super::Headless;
use crate::backend;
use crate::backend::Adapter;
use crate::backend::AdapterInfo;
use crate::backend::SwapChainDesc;
use crate::desc::*;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::projection::ScissorRect;
use crate::projection::Viewport;
use crate::window_target::WindowHandle;

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// A fake adapter as the headless instance enumerates it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HeadlessAdapter {
    pub name: String,
    pub is_software: bool,
    pub max_feature_level: FeatureLevel,
    pub dedicated_video_memory: u64,
}

impl HeadlessAdapter {
    pub fn hardware(name: &str, max_feature_level: FeatureLevel) -> Self {
        Self {
            name: name.to_string(),
            is_software: false,
            max_feature_level,
            dedicated_video_memory: 4 * 1024 * 1024 * 1024,
        }
    }

    pub fn software(name: &str) -> Self {
        Self {
            name: name.to_string(),
            is_software: true,
            max_feature_level: FeatureLevel::LEVEL_12_1,
            dedicated_video_memory: 0,
        }
    }
}

pub struct HeadlessInstance {
    adapters: Vec<HeadlessAdapter>,
    gpu: HeadlessGpu,
}

impl Default for HeadlessInstance {
    fn default() -> Self {
        Self::new()
    }
}

impl HeadlessInstance {
    /// One hardware adapter at feature level 12.0.
    pub fn new() -> Self {
        Self::with_adapters(vec![HeadlessAdapter::hardware(
            "Headless Adapter",
            FeatureLevel::LEVEL_12_0,
        )])
    }

    pub fn with_adapters(adapters: Vec<HeadlessAdapter>) -> Self {
        Self {
            adapters,
            gpu: HeadlessGpu::new(),
        }
    }

    /// The timeline every device created from this instance runs on.
    pub fn gpu(&self) -> HeadlessGpu {
        self.gpu.clone()
    }
}

fn adapter_info(index: u32, adapter: &HeadlessAdapter) -> AdapterInfo {
    AdapterInfo {
        index,
        name: adapter.name.clone(),
        is_software: adapter.is_software,
        dedicated_video_memory: adapter.dedicated_video_memory,
    }
}

impl backend::Instance<Headless> for HeadlessInstance {
    fn adapters(&self) -> GfxResult<Vec<Adapter<Headless>>> {
        Ok(self
            .adapters
            .iter()
            .enumerate()
            .map(|(index, adapter)| Adapter {
                info: adapter_info(index as u32, adapter),
                raw: adapter.clone(),
            })
            .collect())
    }

    fn warp_adapter(&self) -> GfxResult<Adapter<Headless>> {
        let raw = HeadlessAdapter::software("Microsoft Basic Render Driver");
        Ok(Adapter {
            info: adapter_info(self.adapters.len() as u32, &raw),
            raw,
        })
    }

    fn supports_feature_level(&self, adapter: &HeadlessAdapter, level: FeatureLevel) -> bool {
        adapter.max_feature_level >= level
    }

    fn create_device(&self, adapter: &HeadlessAdapter, level: FeatureLevel) -> GfxResult<HeadlessDevice> {
        if adapter.max_feature_level < level {
            return Err(GfxError::new(
                GfxErrorKind::DeviceCreationFailed,
                format!("{} does not support feature level {}", adapter.name, level),
            ));
        }
        Ok(HeadlessDevice {
            gpu: self.gpu.clone(),
            feature_level: adapter.max_feature_level,
            views: Mutex::new(HashMap::new()),
        })
    }

    fn create_swap_chain(
        &self,
        queue: &HeadlessQueue,
        window: WindowHandle,
        desc: &SwapChainDesc,
    ) -> GfxResult<HeadlessSwapChain> {
        if window.is_null() {
            return Err(GfxError::new(GfxErrorKind::SwapChainFailed, "no window to present into"));
        }
        let buffers = (0..desc.buffer_count)
            .map(|_| {
                HeadlessResource::new(
                    &queue.gpu,
                    ResourceDesc::texture2d(desc.width, desc.height, desc.format, 1)
                        .with_flags(ResourceFlags::ALLOW_RENDER_TARGET),
                    HeapType::DEFAULT,
                )
            })
            .collect();
        Ok(HeadlessSwapChain {
            gpu: queue.gpu.clone(),
            window,
            buffers,
            current: AtomicU32::new(0),
            fullscreen: AtomicBool::new(false),
        })
    }
}

/// What a descriptor slot was last written with.
#[derive(Clone, Debug, PartialEq)]
pub enum HeadlessView {
    RenderTarget { resource: u64 },
    ShaderResource { resource: Option<u64>, desc: Option<ShaderResourceViewDesc> },
    ConstantBuffer(ConstantBufferViewDesc),
    DepthStencil { resource: u64, desc: Option<DepthStencilViewDesc> },
}

pub struct HeadlessDevice {
    gpu: HeadlessGpu,
    feature_level: FeatureLevel,
    views: Mutex<HashMap<usize, HeadlessView>>,
}

impl HeadlessDevice {
    pub fn gpu(&self) -> &HeadlessGpu {
        &self.gpu
    }

    /// The view written at `handle`, if any.
    pub fn view(&self, handle: CpuDescriptorHandle) -> Option<HeadlessView> {
        lock(&self.views).get(&handle.ptr).cloned()
    }

    fn write_view(&self, handle: CpuDescriptorHandle, view: HeadlessView) {
        lock(&self.views).insert(handle.ptr, view);
    }
}

/// Descriptor sizes of a typical desktop GPU.
fn increment_for(heap_type: DescriptorHeapType) -> u32 {
    match heap_type {
        DescriptorHeapType::RTV | DescriptorHeapType::DSV => 32,
        _ => 64,
    }
}

impl backend::Device<Headless> for HeadlessDevice {
    fn feature_level(&self) -> FeatureLevel {
        self.feature_level
    }

    fn create_command_queue(&self) -> GfxResult<HeadlessQueue> {
        Ok(HeadlessQueue { gpu: self.gpu.clone() })
    }

    fn create_command_allocator(&self) -> GfxResult<HeadlessCommandAllocator> {
        Ok(HeadlessCommandAllocator {
            id: self.gpu.next_id(),
            gpu: self.gpu.clone(),
        })
    }

    fn create_command_list(&self, allocator: &HeadlessCommandAllocator) -> GfxResult<HeadlessCommandList> {
        Ok(HeadlessCommandList {
            id: self.gpu.next_id(),
            recording: Mutex::new(ListRecording {
                open: false,
                allocator: allocator.id,
                commands: Vec::new(),
            }),
        })
    }

    fn create_fence(&self, initial_value: u64) -> GfxResult<HeadlessFence> {
        let id = self.gpu.next_id();
        self.gpu.register_fence(id, initial_value);
        Ok(HeadlessFence {
            id,
            gpu: self.gpu.clone(),
        })
    }

    fn create_descriptor_heap(&self, desc: &DescriptorHeapDesc) -> GfxResult<HeadlessDescriptorHeap> {
        let id = self.gpu.next_id();
        let cpu_start = CpuDescriptorHandle {
            ptr: 0x1000_0000 + (id as usize) * 0x10_0000,
        };
        let gpu_start = if desc.is_shader_visible() {
            GpuDescriptorHandle {
                ptr: 0x2_0000_0000 + id * 0x10_0000,
            }
        } else {
            GpuDescriptorHandle::default()
        };
        Ok(HeadlessDescriptorHeap {
            desc: *desc,
            cpu_start,
            gpu_start,
        })
    }

    fn descriptor_increment(&self, heap_type: DescriptorHeapType) -> u32 {
        increment_for(heap_type)
    }

    fn create_committed_resource(
        &self,
        heap: &HeapProperties,
        _flags: HeapFlags,
        desc: &ResourceDesc,
        _initial_state: ResourceStates,
        clear_value: Option<&ClearValue>,
    ) -> GfxResult<HeadlessResource> {
        if desc.flags.contains(ResourceFlags::ALLOW_DEPTH_STENCIL) && !desc.format.is_depth() {
            return Err(GfxError::new(
                GfxErrorKind::ResourceCreationFailed,
                format!("E_INVALIDARG: depth stencil resource with format {:?}", desc.format),
            ));
        }
        if let Some(clear) = clear_value {
            if clear.format != desc.format {
                return Err(GfxError::new(
                    GfxErrorKind::ResourceCreationFailed,
                    "E_INVALIDARG: clear value format differs from the resource format",
                ));
            }
        }
        if desc.is_buffer() && desc.width > u32::MAX as u64 {
            return Err(GfxError::new(GfxErrorKind::ResourceCreationFailed, "E_OUTOFMEMORY"));
        }
        Ok(HeadlessResource::new(&self.gpu, *desc, heap.heap_type))
    }

    fn create_render_target_view(&self, resource: &HeadlessResource, handle: CpuDescriptorHandle) {
        self.write_view(handle, HeadlessView::RenderTarget { resource: resource.id() });
    }

    fn create_shader_resource_view(
        &self,
        resource: Option<&HeadlessResource>,
        desc: Option<&ShaderResourceViewDesc>,
        handle: CpuDescriptorHandle,
    ) {
        self.write_view(
            handle,
            HeadlessView::ShaderResource {
                resource: resource.map(HeadlessResource::id),
                desc: desc.copied(),
            },
        );
    }

    fn create_constant_buffer_view(&self, desc: &ConstantBufferViewDesc, handle: CpuDescriptorHandle) {
        self.write_view(handle, HeadlessView::ConstantBuffer(*desc));
    }

    fn create_depth_stencil_view(
        &self,
        resource: &HeadlessResource,
        desc: Option<&DepthStencilViewDesc>,
        handle: CpuDescriptorHandle,
    ) {
        self.write_view(
            handle,
            HeadlessView::DepthStencil {
                resource: resource.id(),
                desc: desc.copied(),
            },
        );
    }

    fn create_root_signature(&self, desc: &RootSignatureDesc) -> GfxResult<HeadlessRootSignature> {
        Ok(HeadlessRootSignature {
            id: self.gpu.next_id(),
            desc: desc.clone(),
        })
    }

    fn create_graphics_pipeline(&self, desc: &GraphicsPipelineDesc<'_, Headless>) -> GfxResult<HeadlessPipelineState> {
        Ok(HeadlessPipelineState {
            id: self.gpu.next_id(),
            root_signature: desc.root_signature.id,
            stage_count: desc.stages().count(),
            primitive_topology_type: desc.primitive_topology_type,
        })
    }

    fn removed_reason(&self) -> Option<String> {
        self.gpu.removed_reason()
    }
}

pub struct HeadlessQueue {
    gpu: HeadlessGpu,
}

impl backend::Queue<Headless> for HeadlessQueue {
    fn execute(&self, list: &HeadlessCommandList) -> GfxResult<()> {
        let recording = lock(&list.recording);
        if recording.open {
            return Err(GfxError::new(
                GfxErrorKind::ContractViolation,
                "executed a command list that is still open",
            ));
        }
        self.gpu.submit(QueueItem::Execute {
            allocator: recording.allocator,
            commands: recording.commands.clone(),
        })
    }

    fn signal(&self, fence: &HeadlessFence, value: u64) -> GfxResult<()> {
        self.gpu.submit(QueueItem::Signal { fence: fence.id, value })
    }
}

pub struct HeadlessCommandAllocator {
    id: u64,
    gpu: HeadlessGpu,
}

impl backend::CommandAllocator for HeadlessCommandAllocator {
    fn reset(&self) -> GfxResult<()> {
        if self.gpu.allocator_in_flight(self.id) {
            return Err(GfxError::new(
                GfxErrorKind::SyncFailed,
                format!("command allocator {} reset while the GPU still executes its commands", self.id),
            ));
        }
        Ok(())
    }
}

#[derive(Debug)]
struct ListRecording {
    open: bool,
    allocator: u64,
    commands: Vec<RecordedCommand>,
}

#[derive(Debug)]
pub struct HeadlessCommandList {
    id: u64,
    recording: Mutex<ListRecording>,
}

impl HeadlessCommandList {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_open(&self) -> bool {
        lock(&self.recording).open
    }

    /// Everything recorded since the last reset.
    pub fn commands(&self) -> Vec<RecordedCommand> {
        lock(&self.recording).commands.clone()
    }

    fn record(&self, command: RecordedCommand) {
        let mut recording = lock(&self.recording);
        if !recording.open {
            tracing::warn!("Recording {:?} on a closed command list", command);
        }
        recording.commands.push(command);
    }
}

impl backend::CommandList<Headless> for HeadlessCommandList {
    fn reset(&self, allocator: &HeadlessCommandAllocator, _initial_state: Option<&HeadlessPipelineState>) -> GfxResult<()> {
        let mut recording = lock(&self.recording);
        if recording.open {
            return Err(GfxError::new(
                GfxErrorKind::ContractViolation,
                "command list reset while still recording",
            ));
        }
        recording.open = true;
        recording.allocator = allocator.id;
        recording.commands.clear();
        Ok(())
    }

    fn close(&self) -> GfxResult<()> {
        let mut recording = lock(&self.recording);
        if !recording.open {
            return Err(GfxError::new(
                GfxErrorKind::ContractViolation,
                "command list closed twice",
            ));
        }
        recording.open = false;
        Ok(())
    }

    fn transition(&self, resource: &HeadlessResource, before: ResourceStates, after: ResourceStates) {
        self.record(RecordedCommand::Transition {
            resource: resource.id(),
            before,
            after,
        });
    }

    fn set_render_targets(&self, rtv: CpuDescriptorHandle, dsv: Option<CpuDescriptorHandle>) {
        self.record(RecordedCommand::SetRenderTargets { rtv, dsv });
    }

    fn clear_render_target(&self, rtv: CpuDescriptorHandle, color: [f32; 4]) {
        self.record(RecordedCommand::ClearRenderTarget { rtv, color });
    }

    fn clear_depth_stencil(&self, dsv: CpuDescriptorHandle, depth: f32, stencil: u8) {
        self.record(RecordedCommand::ClearDepthStencil { dsv, depth, stencil });
    }

    fn set_viewport(&self, viewport: &Viewport) {
        self.record(RecordedCommand::SetViewport(*viewport));
    }

    fn set_scissor_rect(&self, rect: &ScissorRect) {
        self.record(RecordedCommand::SetScissorRect(*rect));
    }

    fn set_pipeline_state(&self, pipeline: &HeadlessPipelineState) {
        self.record(RecordedCommand::SetPipelineState(pipeline.id));
    }

    fn set_graphics_root_signature(&self, root_signature: &HeadlessRootSignature) {
        self.record(RecordedCommand::SetGraphicsRootSignature(root_signature.id));
    }

    fn set_descriptor_heaps(&self, heaps: &[&HeadlessDescriptorHeap]) {
        self.record(RecordedCommand::SetDescriptorHeaps(
            heaps.iter().map(|heap| heap.cpu_start).collect(),
        ));
    }

    fn set_graphics_root_descriptor_table(&self, parameter: u32, base: GpuDescriptorHandle) {
        self.record(RecordedCommand::SetGraphicsRootDescriptorTable { parameter, base });
    }

    fn set_graphics_root_constant_buffer_view(&self, parameter: u32, buffer_location: u64) {
        self.record(RecordedCommand::SetGraphicsRootConstantBufferView {
            parameter,
            buffer_location,
        });
    }

    fn set_primitive_topology(&self, topology: PrimitiveTopology) {
        self.record(RecordedCommand::SetPrimitiveTopology(topology));
    }

    fn set_vertex_buffers(&self, start_slot: u32, views: &[VertexBufferView]) {
        self.record(RecordedCommand::SetVertexBuffers {
            start_slot,
            views: views.to_vec(),
        });
    }

    fn set_index_buffer(&self, view: &IndexBufferView) {
        self.record(RecordedCommand::SetIndexBuffer(*view));
    }

    fn copy_buffer_region(
        &self,
        dst: &HeadlessResource,
        dst_offset: u64,
        src: &HeadlessResource,
        src_offset: u64,
        num_bytes: u64,
    ) {
        self.record(RecordedCommand::CopyBufferRegion {
            dst: dst.clone(),
            dst_offset,
            src: src.clone(),
            src_offset,
            num_bytes,
        });
    }

    fn draw_instanced(&self, vertex_count: u32, instance_count: u32, _start_vertex: u32, _start_instance: u32) {
        self.record(RecordedCommand::DrawInstanced {
            vertex_count,
            instance_count,
        });
    }

    fn draw_indexed_instanced(
        &self,
        index_count: u32,
        instance_count: u32,
        _start_index: u32,
        _base_vertex: i32,
        _start_instance: u32,
    ) {
        self.record(RecordedCommand::DrawIndexedInstanced {
            index_count,
            instance_count,
        });
    }
}

pub struct HeadlessFence {
    id: u64,
    gpu: HeadlessGpu,
}

impl backend::Fence for HeadlessFence {
    fn completed_value(&self) -> u64 {
        self.gpu.fence_value(self.id)
    }

    fn wait_for(&self, value: u64, timeout: Option<Duration>) -> GfxResult<()> {
        self.gpu.wait_for_fence(self.id, value, timeout)
    }
}

pub struct HeadlessSwapChain {
    gpu: HeadlessGpu,
    window: WindowHandle,
    buffers: Vec<HeadlessResource>,
    current: AtomicU32,
    fullscreen: AtomicBool,
}

impl HeadlessSwapChain {
    pub fn window(&self) -> WindowHandle {
        self.window
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen.load(Ordering::SeqCst)
    }
}

impl backend::SwapChain<Headless> for HeadlessSwapChain {
    fn back_buffer(&self, index: u32) -> GfxResult<HeadlessResource> {
        self.buffers.get(index as usize).cloned().ok_or_else(|| {
            GfxError::new(
                GfxErrorKind::SwapChainFailed,
                format!("no back buffer {} in a chain of {}", index, self.buffers.len()),
            )
        })
    }

    fn current_back_buffer_index(&self) -> u32 {
        self.current.load(Ordering::SeqCst)
    }

    fn present(&self, _sync_interval: u32) -> GfxResult<()> {
        self.gpu.present()?;
        let count = self.buffers.len() as u32;
        let next = (self.current.load(Ordering::SeqCst) + 1) % count;
        self.current.store(next, Ordering::SeqCst);
        Ok(())
    }

    fn set_fullscreen(&self, fullscreen: bool) -> GfxResult<()> {
        self.fullscreen.store(fullscreen, Ordering::SeqCst);
        Ok(())
    }
}

struct ResourceInner {
    id: u64,
    desc: ResourceDesc,
    heap_type: HeapType,
    gpu_virtual_address: u64,
    data: Mutex<Vec<u8>>,
    name: Mutex<String>,
}

/// A resource backed by host memory. Buffers hold their bytes; textures
/// hold none.
#[derive(Clone)]
pub struct HeadlessResource {
    inner: Arc<ResourceInner>,
}

impl std::fmt::Debug for HeadlessResource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HeadlessResource")
            .field("id", &self.inner.id)
            .field("name", &*lock(&self.inner.name))
            .finish()
    }
}

impl HeadlessResource {
    fn new(gpu: &HeadlessGpu, desc: ResourceDesc, heap_type: HeapType) -> Self {
        let (data, gpu_virtual_address) = if desc.is_buffer() {
            (vec![0; desc.width as usize], gpu.allocate_virtual_address(desc.width))
        } else {
            (Vec::new(), 0)
        };
        Self {
            inner: Arc::new(ResourceInner {
                id: gpu.next_id(),
                desc,
                heap_type,
                gpu_virtual_address,
                data: Mutex::new(data),
                name: Mutex::new(String::new()),
            }),
        }
    }

    pub fn id(&self) -> u64 {
        self.inner.id
    }

    pub fn name(&self) -> String {
        lock(&self.inner.name).clone()
    }

    pub fn desc(&self) -> &ResourceDesc {
        &self.inner.desc
    }

    /// A copy of a buffer's bytes as the GPU sees them.
    pub fn contents(&self) -> Vec<u8> {
        lock(&self.inner.data).clone()
    }

    pub(crate) fn copy_from(&self, dst_offset: u64, src: &HeadlessResource, src_offset: u64, num_bytes: u64) -> GfxResult<()> {
        let bytes = {
            let src_data = lock(&src.inner.data);
            let range = byte_range(src_offset, num_bytes, src_data.len())?;
            src_data[range].to_vec()
        };
        let mut dst_data = lock(&self.inner.data);
        let range = byte_range(dst_offset, num_bytes, dst_data.len())?;
        dst_data[range].copy_from_slice(&bytes);
        Ok(())
    }
}

fn byte_range(offset: u64, len: u64, size: usize) -> GfxResult<std::ops::Range<usize>> {
    let start = offset as usize;
    match start.checked_add(len as usize) {
        Some(end) if end <= size => Ok(start..end),
        _ => Err(GfxError::new(
            GfxErrorKind::ResourceCreationFailed,
            format!("range {}+{} outside a {} byte buffer", offset, len, size),
        )),
    }
}

impl backend::Resource for HeadlessResource {
    fn gpu_virtual_address(&self) -> u64 {
        self.inner.gpu_virtual_address
    }

    fn write(&self, offset: u64, data: &[u8]) -> GfxResult<()> {
        if !self.inner.heap_type.is_cpu_mappable() {
            return Err(GfxError::new(
                GfxErrorKind::ResourceCreationFailed,
                "E_INVALIDARG: resource is not in a CPU visible heap",
            ));
        }
        let mut bytes = lock(&self.inner.data);
        let range = byte_range(offset, data.len() as u64, bytes.len())?;
        bytes[range].copy_from_slice(data);
        Ok(())
    }

    fn set_name(&self, name: &str) {
        *lock(&self.inner.name) = name.to_string();
    }
}

pub struct HeadlessDescriptorHeap {
    desc: DescriptorHeapDesc,
    cpu_start: CpuDescriptorHandle,
    gpu_start: GpuDescriptorHandle,
}

impl HeadlessDescriptorHeap {
    pub fn desc(&self) -> &DescriptorHeapDesc {
        &self.desc
    }
}

impl backend::DescriptorHeap for HeadlessDescriptorHeap {
    fn cpu_start(&self) -> CpuDescriptorHandle {
        self.cpu_start
    }

    fn gpu_start(&self) -> GpuDescriptorHandle {
        self.gpu_start
    }
}

#[derive(Debug)]
pub struct HeadlessRootSignature {
    id: u64,
    desc: RootSignatureDesc,
}

impl HeadlessRootSignature {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn desc(&self) -> &RootSignatureDesc {
        &self.desc
    }
}

#[derive(Debug)]
pub struct HeadlessPipelineState {
    id: u64,
    root_signature: u64,
    stage_count: usize,
    primitive_topology_type: PrimitiveTopologyType,
}

impl HeadlessPipelineState {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn stage_count(&self) -> usize {
        self.stage_count
    }

    pub fn root_signature(&self) -> u64 {
        self.root_signature
    }

    pub fn primitive_topology_type(&self) -> PrimitiveTopologyType {
        self.primitive_topology_type
    }
}
