//! Committed resources, descriptor heaps and the views written into them.
//!
//! Everything here validates what the driver would otherwise reject with an
//! opaque failure (or accept and later misbehave on) and reports it as
//! `ResourceCreationFailed` with the resource's name in the message.

use tracing::debug;

use crate::backend::Backend;
use crate::backend::DescriptorHeap as _;
use crate::backend::Device;
use crate::backend::Resource;
use crate::constants::CONSTANT_BUFFER_ALIGNMENT;
use crate::desc::*;
use crate::device_context::DeviceContext;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;

fn creation_failed(message: String) -> GfxError {
    GfxError::new(GfxErrorKind::ResourceCreationFailed, message)
}

/// A GPU allocation with its own implicit heap, plus what it was created with.
pub struct CommittedResource<B: Backend> {
    raw: B::Resource,
    name: String,
    desc: ResourceDesc,
    heap: HeapProperties,
    initial_state: ResourceStates,
}

impl<B: Backend> Clone for CommittedResource<B> {
    fn clone(&self) -> Self {
        Self {
            raw: self.raw.clone(),
            name: self.name.clone(),
            desc: self.desc,
            heap: self.heap,
            initial_state: self.initial_state,
        }
    }
}

impl<B: Backend> std::fmt::Debug for CommittedResource<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommittedResource")
            .field("name", &self.name)
            .field("heap_type", &self.heap.heap_type)
            .field("initial_state", &self.initial_state)
            .field("width", &self.desc.width)
            .finish()
    }
}

impl<B: Backend> CommittedResource<B> {
    pub fn raw(&self) -> &B::Resource {
        &self.raw
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn desc(&self) -> &ResourceDesc {
        &self.desc
    }

    pub fn heap_type(&self) -> HeapType {
        self.heap.heap_type
    }

    pub fn initial_state(&self) -> ResourceStates {
        self.initial_state
    }

    pub fn is_cpu_mappable(&self) -> bool {
        self.heap.heap_type.is_cpu_mappable()
    }

    /// Size in bytes for buffers.
    pub fn size(&self) -> u64 {
        self.desc.width
    }

    pub fn gpu_virtual_address(&self) -> u64 {
        self.raw.gpu_virtual_address()
    }

    /// Copies `data` into the resource at `offset` through a CPU mapping.
    pub fn write(&self, offset: u64, data: &[u8]) -> GfxResult<()> {
        if !self.is_cpu_mappable() {
            return Err(creation_failed(format!(
                "{} lives in a {:?} heap and cannot be mapped",
                self.name, self.heap.heap_type
            )));
        }
        let end = offset.checked_add(data.len() as u64);
        if !self.desc.is_buffer() || end.map_or(true, |end| end > self.desc.width) {
            return Err(creation_failed(format!(
                "write of {} bytes at offset {} exceeds {} ({} bytes)",
                data.len(),
                offset,
                self.name,
                self.desc.width
            )));
        }
        self.raw.write(offset, data)
    }
}

/// A typed descriptor heap with bounds-checked handles.
pub struct DescriptorHeap<B: Backend> {
    raw: B::DescriptorHeap,
    desc: DescriptorHeapDesc,
    increment: u32,
}

impl<B: Backend> DescriptorHeap<B> {
    pub fn raw(&self) -> &B::DescriptorHeap {
        &self.raw
    }

    pub fn heap_type(&self) -> DescriptorHeapType {
        self.desc.heap_type
    }

    pub fn capacity(&self) -> u32 {
        self.desc.num_descriptors
    }

    pub fn increment(&self) -> u32 {
        self.increment
    }

    pub fn is_shader_visible(&self) -> bool {
        self.desc.is_shader_visible()
    }

    pub fn cpu_start(&self) -> CpuDescriptorHandle {
        self.raw.cpu_start()
    }

    pub fn cpu_handle(&self, index: u32) -> GfxResult<CpuDescriptorHandle> {
        self.check_index(index)?;
        Ok(self.raw.cpu_start().offset(index, self.increment))
    }

    pub fn gpu_handle(&self, index: u32) -> GfxResult<GpuDescriptorHandle> {
        self.check_index(index)?;
        if !self.is_shader_visible() {
            return Err(creation_failed(format!(
                "{:?} heap is not shader visible and has no GPU handles",
                self.desc.heap_type
            )));
        }
        Ok(self.raw.gpu_start().offset(index, self.increment))
    }

    fn check_index(&self, index: u32) -> GfxResult<()> {
        if index >= self.desc.num_descriptors {
            return Err(creation_failed(format!(
                "descriptor index {} out of range for {:?} heap of {}",
                index, self.desc.heap_type, self.desc.num_descriptors
            )));
        }
        Ok(())
    }
}

/// A CPU-writable buffer the GPU reads from, in `GENERIC_READ`.
pub fn create_upload_buffer<B: Backend>(
    device: &DeviceContext<B>,
    size: u64,
    name: &str,
) -> GfxResult<CommittedResource<B>> {
    create_committed_resource(
        device,
        &HeapProperties::new(HeapType::UPLOAD),
        HeapFlags::NONE,
        &ResourceDesc::buffer(size),
        ResourceStates::GENERIC_READ,
        None,
        name,
    )
}

/// A GPU-local buffer, in `COPY_DEST` ready to be filled by a copy.
pub fn create_default_buffer<B: Backend>(
    device: &DeviceContext<B>,
    size: u64,
    name: &str,
) -> GfxResult<CommittedResource<B>> {
    create_committed_resource(
        device,
        &HeapProperties::new(HeapType::DEFAULT),
        HeapFlags::NONE,
        &ResourceDesc::buffer(size),
        ResourceStates::COPY_DEST,
        None,
        name,
    )
}

pub fn create_committed_resource<B: Backend>(
    device: &DeviceContext<B>,
    heap: &HeapProperties,
    flags: HeapFlags,
    desc: &ResourceDesc,
    initial_state: ResourceStates,
    clear_value: Option<&ClearValue>,
    name: &str,
) -> GfxResult<CommittedResource<B>> {
    if desc.width == 0 || desc.height == 0 {
        return Err(creation_failed(format!("{} has a zero dimension", name)));
    }
    if desc.is_buffer() && clear_value.is_some() {
        return Err(creation_failed(format!("{} is a buffer and cannot have a clear value", name)));
    }
    let raw = device
        .device()
        .create_committed_resource(heap, flags, desc, initial_state, clear_value)
        .map_err(|e| GfxError::with_source(GfxErrorKind::ResourceCreationFailed, name, e))?;
    raw.set_name(name);
    debug!(
        "Created {} ({} bytes wide, {:?}, {:?})",
        name, desc.width, heap.heap_type, initial_state
    );
    Ok(CommittedResource {
        raw,
        name: name.to_string(),
        desc: *desc,
        heap: *heap,
        initial_state,
    })
}

/// Wraps a resource the backend created on its own, such as a back buffer.
pub(crate) fn adopt_resource<B: Backend>(
    raw: B::Resource,
    name: &str,
    desc: ResourceDesc,
    initial_state: ResourceStates,
) -> CommittedResource<B> {
    raw.set_name(name);
    CommittedResource {
        raw,
        name: name.to_string(),
        desc,
        heap: HeapProperties::new(HeapType::DEFAULT),
        initial_state,
    }
}

pub fn create_descriptor_heap<B: Backend>(
    device: &DeviceContext<B>,
    desc: &DescriptorHeapDesc,
) -> GfxResult<DescriptorHeap<B>> {
    if !desc.heap_type.is_known() {
        return Err(creation_failed(format!("unknown descriptor heap type {}", desc.heap_type.0)));
    }
    if desc.num_descriptors == 0 {
        return Err(creation_failed(format!("{:?} heap needs at least one descriptor", desc.heap_type)));
    }
    if desc.is_shader_visible() && !desc.heap_type.can_be_shader_visible() {
        return Err(creation_failed(format!(
            "{:?} heaps cannot be shader visible",
            desc.heap_type
        )));
    }
    let increment = device.descriptor_increment(desc.heap_type)?;
    let raw = device.device().create_descriptor_heap(desc)?;
    debug!(
        "Created {:?} descriptor heap with {} descriptors",
        desc.heap_type, desc.num_descriptors
    );
    Ok(DescriptorHeap {
        raw,
        desc: *desc,
        increment,
    })
}

fn check_handle(handle: CpuDescriptorHandle, view: &str) -> GfxResult<()> {
    if handle.is_null() {
        return Err(creation_failed(format!("{} target descriptor handle is null", view)));
    }
    Ok(())
}

pub fn create_render_target_view<B: Backend>(
    device: &DeviceContext<B>,
    resource: &CommittedResource<B>,
    handle: CpuDescriptorHandle,
) -> GfxResult<()> {
    check_handle(handle, "render target view")?;
    device.device().create_render_target_view(&resource.raw, handle);
    Ok(())
}

/// With no resource, writes a null descriptor (requires `desc`).
pub fn create_shader_resource_view<B: Backend>(
    device: &DeviceContext<B>,
    resource: Option<&CommittedResource<B>>,
    desc: Option<&ShaderResourceViewDesc>,
    handle: CpuDescriptorHandle,
) -> GfxResult<()> {
    check_handle(handle, "shader resource view")?;
    if resource.is_none() && desc.is_none() {
        return Err(creation_failed(
            "null shader resource view needs a description".to_string(),
        ));
    }
    if let (Some(resource), Some(desc)) = (resource, desc) {
        let is_buffer_view = matches!(desc.dimension, SrvDimension::Buffer { .. });
        if is_buffer_view != resource.desc.is_buffer() {
            return Err(creation_failed(format!(
                "shader resource view dimension does not match {}",
                resource.name
            )));
        }
    }
    device
        .device()
        .create_shader_resource_view(resource.map(|r| &r.raw), desc, handle);
    Ok(())
}

pub fn create_constant_buffer_view<B: Backend>(
    device: &DeviceContext<B>,
    desc: &ConstantBufferViewDesc,
    handle: CpuDescriptorHandle,
) -> GfxResult<()> {
    check_handle(handle, "constant buffer view")?;
    let size = desc.size_in_bytes as u64;
    if size == 0 || size % CONSTANT_BUFFER_ALIGNMENT != 0 {
        return Err(creation_failed(format!(
            "constant buffer view size {} is not a non-zero multiple of {}",
            size, CONSTANT_BUFFER_ALIGNMENT
        )));
    }
    if desc.buffer_location % CONSTANT_BUFFER_ALIGNMENT != 0 {
        return Err(creation_failed(format!(
            "constant buffer view location {:#x} is not {}-byte aligned",
            desc.buffer_location, CONSTANT_BUFFER_ALIGNMENT
        )));
    }
    device.device().create_constant_buffer_view(desc, handle);
    Ok(())
}

pub fn create_depth_stencil_view<B: Backend>(
    device: &DeviceContext<B>,
    resource: &CommittedResource<B>,
    desc: Option<&DepthStencilViewDesc>,
    handle: CpuDescriptorHandle,
) -> GfxResult<()> {
    check_handle(handle, "depth stencil view")?;
    let format = desc.map_or(resource.desc.format, |d| d.format);
    if !format.is_depth() {
        return Err(creation_failed(format!(
            "depth stencil view of {} needs a depth format, got {:?}",
            resource.name, format
        )));
    }
    device
        .device()
        .create_depth_stencil_view(&resource.raw, desc, handle);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GfxConfig;
    use crate::headless::Headless;
    use crate::headless::HeadlessInstance;

    fn device() -> DeviceContext<Headless> {
        DeviceContext::new(&HeadlessInstance::new(), &GfxConfig::default()).unwrap()
    }

    #[test]
    fn upload_buffer_is_generic_read_and_mappable() {
        let device = device();
        let buffer = create_upload_buffer(&device, 256, "constants").unwrap();
        assert_eq!(buffer.initial_state(), ResourceStates::GENERIC_READ);
        assert_eq!(buffer.heap_type(), HeapType::UPLOAD);
        assert!(buffer.is_cpu_mappable());
        buffer.write(0, &[7u8; 256]).unwrap();
    }

    #[test]
    fn default_buffer_rejects_cpu_writes() {
        let device = device();
        let buffer = create_default_buffer(&device, 256, "heightmap").unwrap();
        assert_eq!(buffer.initial_state(), ResourceStates::COPY_DEST);
        assert!(!buffer.is_cpu_mappable());
        let err = buffer.write(0, &[1, 2, 3]).unwrap_err();
        assert!(err.message().contains("heightmap"), "{err}");
    }

    #[test]
    fn write_past_the_end_is_rejected() {
        let device = device();
        let buffer = create_upload_buffer(&device, 16, "small").unwrap();
        assert!(buffer.write(8, &[0u8; 9]).is_err());
        assert!(buffer.write(u64::MAX, &[0u8; 1]).is_err());
        buffer.write(8, &[0u8; 8]).unwrap();
    }

    #[test]
    fn constant_buffer_views_must_be_256_aligned() {
        let device = device();
        let heap = create_descriptor_heap(
            &device,
            &DescriptorHeapDesc::new(DescriptorHeapType::CBV_SRV_UAV, 4).shader_visible(),
        )
        .unwrap();
        let buffer = create_upload_buffer(&device, 512, "matrices").unwrap();
        let handle = heap.cpu_handle(0).unwrap();

        for size in [0, 100, 257] {
            let desc = ConstantBufferViewDesc {
                buffer_location: buffer.gpu_virtual_address(),
                size_in_bytes: size,
            };
            let err = create_constant_buffer_view(&device, &desc, handle).unwrap_err();
            assert!(err.is(GfxErrorKind::ResourceCreationFailed));
        }

        let desc = ConstantBufferViewDesc {
            buffer_location: buffer.gpu_virtual_address(),
            size_in_bytes: 256,
        };
        create_constant_buffer_view(&device, &desc, handle).unwrap();
        assert!(create_constant_buffer_view(&device, &desc, CpuDescriptorHandle::default()).is_err());
    }

    #[test]
    fn descriptor_heap_handles_are_bounds_checked() {
        let device = device();
        let heap = create_descriptor_heap(&device, &DescriptorHeapDesc::new(DescriptorHeapType::RTV, 3)).unwrap();
        let base = heap.cpu_start();
        assert_eq!(heap.cpu_handle(2).unwrap(), base.offset(2, heap.increment()));
        assert!(heap.cpu_handle(3).is_err());
        assert!(heap.gpu_handle(0).is_err());
    }

    #[test]
    fn rtv_heaps_cannot_be_shader_visible() {
        let device = device();
        let desc = DescriptorHeapDesc::new(DescriptorHeapType::RTV, 3).shader_visible();
        assert!(create_descriptor_heap(&device, &desc).is_err());
        let empty = DescriptorHeapDesc::new(DescriptorHeapType::DSV, 0);
        assert!(create_descriptor_heap(&device, &empty).is_err());
    }

    #[test]
    fn unknown_heap_type_is_an_error() {
        let device = device();
        let desc = DescriptorHeapDesc::new(DescriptorHeapType(4), 8);
        let err = create_descriptor_heap(&device, &desc).err().unwrap();
        assert!(err.is(GfxErrorKind::ResourceCreationFailed));
        assert!(err.message().contains("unknown descriptor heap type 4"), "{err}");
    }

    #[test]
    fn depth_view_needs_depth_format() {
        let device = device();
        let heap = create_descriptor_heap(&device, &DescriptorHeapDesc::new(DescriptorHeapType::DSV, 1)).unwrap();
        let color = create_committed_resource(
            &device,
            &HeapProperties::new(HeapType::DEFAULT),
            HeapFlags::NONE,
            &ResourceDesc::texture2d(64, 64, Format::R8G8B8A8_UNORM, 1),
            ResourceStates::COMMON,
            None,
            "albedo",
        )
        .unwrap();
        let err = create_depth_stencil_view(&device, &color, None, heap.cpu_handle(0).unwrap()).unwrap_err();
        assert!(err.message().contains("albedo"));
    }
}
