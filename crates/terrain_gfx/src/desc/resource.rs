use super::format::Format;

/// Mirrors `D3D12_RESOURCE_STATES`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ResourceStates(pub i32);

impl ResourceStates {
    pub const COMMON: ResourceStates = ResourceStates(0);
    pub const PRESENT: ResourceStates = ResourceStates(0);
    pub const VERTEX_AND_CONSTANT_BUFFER: ResourceStates = ResourceStates(0x1);
    pub const INDEX_BUFFER: ResourceStates = ResourceStates(0x2);
    pub const RENDER_TARGET: ResourceStates = ResourceStates(0x4);
    pub const UNORDERED_ACCESS: ResourceStates = ResourceStates(0x8);
    pub const DEPTH_WRITE: ResourceStates = ResourceStates(0x10);
    pub const DEPTH_READ: ResourceStates = ResourceStates(0x20);
    pub const NON_PIXEL_SHADER_RESOURCE: ResourceStates = ResourceStates(0x40);
    pub const PIXEL_SHADER_RESOURCE: ResourceStates = ResourceStates(0x80);
    pub const INDIRECT_ARGUMENT: ResourceStates = ResourceStates(0x200);
    pub const COPY_DEST: ResourceStates = ResourceStates(0x400);
    pub const COPY_SOURCE: ResourceStates = ResourceStates(0x800);
    pub const GENERIC_READ: ResourceStates = ResourceStates(0xac3);

    pub fn contains(self, other: ResourceStates) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ResourceStates {
    type Output = ResourceStates;
    fn bitor(self, rhs: Self) -> Self {
        ResourceStates(self.0 | rhs.0)
    }
}

/// Mirrors `D3D12_HEAP_TYPE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct HeapType(pub i32);

impl HeapType {
    pub const DEFAULT: HeapType = HeapType(1);
    pub const UPLOAD: HeapType = HeapType(2);
    pub const READBACK: HeapType = HeapType(3);
    pub const CUSTOM: HeapType = HeapType(4);

    /// Upload and readback heaps can be mapped by the CPU.
    pub fn is_cpu_mappable(self) -> bool {
        self == HeapType::UPLOAD || self == HeapType::READBACK
    }
}

/// Mirrors `D3D12_CPU_PAGE_PROPERTY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CpuPageProperty(pub i32);

impl CpuPageProperty {
    pub const UNKNOWN: CpuPageProperty = CpuPageProperty(0);
    pub const NOT_AVAILABLE: CpuPageProperty = CpuPageProperty(1);
    pub const WRITE_COMBINE: CpuPageProperty = CpuPageProperty(2);
    pub const WRITE_BACK: CpuPageProperty = CpuPageProperty(3);
}

/// Mirrors `D3D12_MEMORY_POOL`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MemoryPool(pub i32);

impl MemoryPool {
    pub const UNKNOWN: MemoryPool = MemoryPool(0);
    pub const L0: MemoryPool = MemoryPool(1);
    pub const L1: MemoryPool = MemoryPool(2);
}

/// Mirrors `D3D12_HEAP_PROPERTIES`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct HeapProperties {
    pub heap_type: HeapType,
    pub cpu_page_property: CpuPageProperty,
    pub memory_pool_preference: MemoryPool,
    pub creation_node_mask: u32,
    pub visible_node_mask: u32,
}

impl HeapProperties {
    pub fn new(heap_type: HeapType) -> Self {
        Self {
            heap_type,
            creation_node_mask: 1,
            visible_node_mask: 1,
            ..Default::default()
        }
    }
}

/// Mirrors `D3D12_HEAP_FLAGS`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct HeapFlags(pub i32);

impl HeapFlags {
    pub const NONE: HeapFlags = HeapFlags(0);
    pub const SHARED: HeapFlags = HeapFlags(0x1);
    pub const DENY_BUFFERS: HeapFlags = HeapFlags(0x4);
    pub const ALLOW_DISPLAY: HeapFlags = HeapFlags(0x8);
    pub const DENY_RT_DS_TEXTURES: HeapFlags = HeapFlags(0x40);
    pub const DENY_NON_RT_DS_TEXTURES: HeapFlags = HeapFlags(0x80);
}

/// Mirrors `D3D12_RESOURCE_DIMENSION`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ResourceDimension(pub i32);

impl ResourceDimension {
    pub const UNKNOWN: ResourceDimension = ResourceDimension(0);
    pub const BUFFER: ResourceDimension = ResourceDimension(1);
    pub const TEXTURE1D: ResourceDimension = ResourceDimension(2);
    pub const TEXTURE2D: ResourceDimension = ResourceDimension(3);
    pub const TEXTURE3D: ResourceDimension = ResourceDimension(4);
}

/// Mirrors `D3D12_TEXTURE_LAYOUT`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TextureLayout(pub i32);

impl TextureLayout {
    pub const UNKNOWN: TextureLayout = TextureLayout(0);
    pub const ROW_MAJOR: TextureLayout = TextureLayout(1);
}

/// Mirrors `D3D12_RESOURCE_FLAGS`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ResourceFlags(pub i32);

impl ResourceFlags {
    pub const NONE: ResourceFlags = ResourceFlags(0);
    pub const ALLOW_RENDER_TARGET: ResourceFlags = ResourceFlags(0x1);
    pub const ALLOW_DEPTH_STENCIL: ResourceFlags = ResourceFlags(0x2);
    pub const ALLOW_UNORDERED_ACCESS: ResourceFlags = ResourceFlags(0x4);
    pub const DENY_SHADER_RESOURCE: ResourceFlags = ResourceFlags(0x8);

    pub fn contains(self, other: ResourceFlags) -> bool {
        self.0 & other.0 == other.0
    }
}

impl std::ops::BitOr for ResourceFlags {
    type Output = ResourceFlags;
    fn bitor(self, rhs: Self) -> Self {
        ResourceFlags(self.0 | rhs.0)
    }
}

/// Mirrors `DXGI_SAMPLE_DESC`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct SampleDesc {
    pub count: u32,
    pub quality: u32,
}

impl Default for SampleDesc {
    fn default() -> Self {
        Self {
            count: 1,
            quality: 0,
        }
    }
}

/// Mirrors `D3D12_RESOURCE_DESC`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct ResourceDesc {
    pub dimension: ResourceDimension,
    pub alignment: u64,
    pub width: u64,
    pub height: u32,
    pub depth_or_array_size: u16,
    pub mip_levels: u16,
    pub format: Format,
    pub sample_desc: SampleDesc,
    pub layout: TextureLayout,
    pub flags: ResourceFlags,
}

impl ResourceDesc {
    /// A linear buffer of `size` bytes. Buffers need height, depth and mip
    /// count of one, an unknown format and row-major layout.
    pub fn buffer(size: u64) -> Self {
        Self {
            dimension: ResourceDimension::BUFFER,
            alignment: 0,
            width: size,
            height: 1,
            depth_or_array_size: 1,
            mip_levels: 1,
            format: Format::UNKNOWN,
            sample_desc: SampleDesc::default(),
            layout: TextureLayout::ROW_MAJOR,
            flags: ResourceFlags::NONE,
        }
    }

    pub fn texture2d(width: u32, height: u32, format: Format, mip_levels: u16) -> Self {
        Self {
            dimension: ResourceDimension::TEXTURE2D,
            alignment: 0,
            width: width as u64,
            height,
            depth_or_array_size: 1,
            mip_levels,
            format,
            sample_desc: SampleDesc::default(),
            layout: TextureLayout::UNKNOWN,
            flags: ResourceFlags::NONE,
        }
    }

    pub fn with_flags(mut self, flags: ResourceFlags) -> Self {
        self.flags = flags;
        self
    }

    pub fn is_buffer(&self) -> bool {
        self.dimension == ResourceDimension::BUFFER
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClearValueKind {
    Color([f32; 4]),
    DepthStencil { depth: f32, stencil: u8 },
}

/// Mirrors `D3D12_CLEAR_VALUE`. The native union becomes an enum.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClearValue {
    pub format: Format,
    pub value: ClearValueKind,
}

impl ClearValue {
    pub fn color(format: Format, rgba: [f32; 4]) -> Self {
        Self {
            format,
            value: ClearValueKind::Color(rgba),
        }
    }

    pub fn depth_stencil(format: Format, depth: f32, stencil: u8) -> Self {
        Self {
            format,
            value: ClearValueKind::DepthStencil { depth, stencil },
        }
    }
}

/// Mirrors `D3D12_VERTEX_BUFFER_VIEW`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct VertexBufferView {
    pub buffer_location: u64,
    pub size_in_bytes: u32,
    pub stride_in_bytes: u32,
}

/// Mirrors `D3D12_INDEX_BUFFER_VIEW`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct IndexBufferView {
    pub buffer_location: u64,
    pub size_in_bytes: u32,
    pub format: Format,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generic_read_covers_the_read_states() {
        let read = ResourceStates::VERTEX_AND_CONSTANT_BUFFER
            | ResourceStates::INDEX_BUFFER
            | ResourceStates::NON_PIXEL_SHADER_RESOURCE
            | ResourceStates::PIXEL_SHADER_RESOURCE
            | ResourceStates::INDIRECT_ARGUMENT
            | ResourceStates::COPY_SOURCE;
        assert_eq!(read, ResourceStates::GENERIC_READ);
        assert!(!ResourceStates::GENERIC_READ.contains(ResourceStates::COPY_DEST));
    }

    #[test]
    fn buffer_desc_uses_buffer_layout_rules() {
        let desc = ResourceDesc::buffer(256);
        assert!(desc.is_buffer());
        assert_eq!(desc.width, 256);
        assert_eq!((desc.height, desc.depth_or_array_size, desc.mip_levels), (1, 1, 1));
        assert_eq!(desc.layout, TextureLayout::ROW_MAJOR);
        assert_eq!(desc.format, Format::UNKNOWN);
    }
}
