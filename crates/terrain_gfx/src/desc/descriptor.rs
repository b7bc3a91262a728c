use super::format::Format;

/// Mirrors `D3D12_DESCRIPTOR_HEAP_TYPE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct DescriptorHeapType(pub i32);

impl DescriptorHeapType {
    pub const CBV_SRV_UAV: DescriptorHeapType = DescriptorHeapType(0);
    pub const SAMPLER: DescriptorHeapType = DescriptorHeapType(1);
    pub const RTV: DescriptorHeapType = DescriptorHeapType(2);
    pub const DSV: DescriptorHeapType = DescriptorHeapType(3);

    pub const ALL: [DescriptorHeapType; 4] = [
        DescriptorHeapType::CBV_SRV_UAV,
        DescriptorHeapType::SAMPLER,
        DescriptorHeapType::RTV,
        DescriptorHeapType::DSV,
    ];

    /// One of the four heap types Direct3D 12 defines.
    pub fn is_known(self) -> bool {
        DescriptorHeapType::ALL.contains(&self)
    }

    /// Only view and sampler heaps may be bound to shaders.
    pub fn can_be_shader_visible(self) -> bool {
        self == DescriptorHeapType::CBV_SRV_UAV || self == DescriptorHeapType::SAMPLER
    }
}

/// Mirrors `D3D12_DESCRIPTOR_HEAP_FLAGS`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct DescriptorHeapFlags(pub i32);

impl DescriptorHeapFlags {
    pub const NONE: DescriptorHeapFlags = DescriptorHeapFlags(0);
    pub const SHADER_VISIBLE: DescriptorHeapFlags = DescriptorHeapFlags(0x1);
}

/// Mirrors `D3D12_DESCRIPTOR_HEAP_DESC`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct DescriptorHeapDesc {
    pub heap_type: DescriptorHeapType,
    pub num_descriptors: u32,
    pub flags: DescriptorHeapFlags,
    pub node_mask: u32,
}

impl DescriptorHeapDesc {
    pub fn new(heap_type: DescriptorHeapType, num_descriptors: u32) -> Self {
        Self {
            heap_type,
            num_descriptors,
            flags: DescriptorHeapFlags::NONE,
            node_mask: 0,
        }
    }

    pub fn shader_visible(mut self) -> Self {
        self.flags = DescriptorHeapFlags::SHADER_VISIBLE;
        self
    }

    pub fn is_shader_visible(&self) -> bool {
        self.flags == DescriptorHeapFlags::SHADER_VISIBLE
    }
}

/// Mirrors `D3D12_CPU_DESCRIPTOR_HANDLE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct CpuDescriptorHandle {
    pub ptr: usize,
}

impl CpuDescriptorHandle {
    /// `base + index * increment`.
    pub fn offset(self, index: u32, increment: u32) -> Self {
        Self {
            ptr: self.ptr + (index as usize) * (increment as usize),
        }
    }

    pub fn is_null(self) -> bool {
        self.ptr == 0
    }
}

/// Mirrors `D3D12_GPU_DESCRIPTOR_HANDLE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct GpuDescriptorHandle {
    pub ptr: u64,
}

impl GpuDescriptorHandle {
    pub fn offset(self, index: u32, increment: u32) -> Self {
        Self {
            ptr: self.ptr + (index as u64) * (increment as u64),
        }
    }
}

/// `D3D12_DEFAULT_SHADER_4_COMPONENT_MAPPING`: sample RGBA as RGBA.
pub const DEFAULT_SHADER_4_COMPONENT_MAPPING: u32 = 0x1688;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SrvDimension {
    Buffer {
        first_element: u64,
        num_elements: u32,
        structure_byte_stride: u32,
        raw: bool,
    },
    Texture2D {
        most_detailed_mip: u32,
        mip_levels: u32,
        plane_slice: u32,
        resource_min_lod_clamp: f32,
    },
    Texture2DArray {
        most_detailed_mip: u32,
        mip_levels: u32,
        first_array_slice: u32,
        array_size: u32,
        plane_slice: u32,
        resource_min_lod_clamp: f32,
    },
    TextureCube {
        most_detailed_mip: u32,
        mip_levels: u32,
        resource_min_lod_clamp: f32,
    },
}

/// Mirrors `D3D12_SHADER_RESOURCE_VIEW_DESC`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShaderResourceViewDesc {
    pub format: Format,
    pub shader_4_component_mapping: u32,
    pub dimension: SrvDimension,
}

impl ShaderResourceViewDesc {
    pub fn texture2d(format: Format, mip_levels: u32) -> Self {
        Self {
            format,
            shader_4_component_mapping: DEFAULT_SHADER_4_COMPONENT_MAPPING,
            dimension: SrvDimension::Texture2D {
                most_detailed_mip: 0,
                mip_levels,
                plane_slice: 0,
                resource_min_lod_clamp: 0.0,
            },
        }
    }

    pub fn structured_buffer(num_elements: u32, structure_byte_stride: u32) -> Self {
        Self {
            format: Format::UNKNOWN,
            shader_4_component_mapping: DEFAULT_SHADER_4_COMPONENT_MAPPING,
            dimension: SrvDimension::Buffer {
                first_element: 0,
                num_elements,
                structure_byte_stride,
                raw: false,
            },
        }
    }
}

/// Mirrors `D3D12_CONSTANT_BUFFER_VIEW_DESC`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct ConstantBufferViewDesc {
    pub buffer_location: u64,
    pub size_in_bytes: u32,
}

/// Mirrors `D3D12_DSV_FLAGS`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct DsvFlags(pub i32);

impl DsvFlags {
    pub const NONE: DsvFlags = DsvFlags(0);
    pub const READ_ONLY_DEPTH: DsvFlags = DsvFlags(0x1);
    pub const READ_ONLY_STENCIL: DsvFlags = DsvFlags(0x2);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum DsvDimension {
    Texture2D {
        mip_slice: u32,
    },
    Texture2DArray {
        mip_slice: u32,
        first_array_slice: u32,
        array_size: u32,
    },
}

/// Mirrors `D3D12_DEPTH_STENCIL_VIEW_DESC`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DepthStencilViewDesc {
    pub format: Format,
    pub flags: DsvFlags,
    pub dimension: DsvDimension,
}

impl DepthStencilViewDesc {
    pub fn texture2d(format: Format) -> Self {
        Self {
            format,
            flags: DsvFlags::NONE,
            dimension: DsvDimension::Texture2D { mip_slice: 0 },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn handle_offset_is_base_plus_index_times_increment() {
        let base = CpuDescriptorHandle { ptr: 0x1000 };
        assert_eq!(base.offset(0, 32).ptr, 0x1000);
        assert_eq!(base.offset(2, 32).ptr, 0x1040);
        let gpu = GpuDescriptorHandle { ptr: 0x8000 };
        assert_eq!(gpu.offset(3, 64).ptr, 0x80c0);
    }

    #[test]
    fn only_view_and_sampler_heaps_are_shader_visible() {
        assert!(DescriptorHeapType::CBV_SRV_UAV.can_be_shader_visible());
        assert!(DescriptorHeapType::SAMPLER.can_be_shader_visible());
        assert!(!DescriptorHeapType::RTV.can_be_shader_visible());
        assert!(!DescriptorHeapType::DSV.can_be_shader_visible());
    }
}
