use windows::Win32::Foundation::RECT;
use windows::Win32::Graphics::Direct3D::*;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::*;

use crate::desc::*;
use crate::projection::ScissorRect;
use crate::projection::Viewport;

pub fn format(format: Format) -> DXGI_FORMAT {
    DXGI_FORMAT(format.0)
}

pub fn feature_level(level: FeatureLevel) -> D3D_FEATURE_LEVEL {
    D3D_FEATURE_LEVEL(level.0)
}

pub fn resource_states(states: ResourceStates) -> D3D12_RESOURCE_STATES {
    D3D12_RESOURCE_STATES(states.0)
}

pub fn heap_properties(heap: &HeapProperties) -> D3D12_HEAP_PROPERTIES {
    D3D12_HEAP_PROPERTIES {
        Type: D3D12_HEAP_TYPE(heap.heap_type.0),
        CPUPageProperty: D3D12_CPU_PAGE_PROPERTY(heap.cpu_page_property.0),
        MemoryPoolPreference: D3D12_MEMORY_POOL(heap.memory_pool_preference.0),
        CreationNodeMask: heap.creation_node_mask,
        VisibleNodeMask: heap.visible_node_mask,
    }
}

pub fn resource_desc(desc: &ResourceDesc) -> D3D12_RESOURCE_DESC {
    D3D12_RESOURCE_DESC {
        Dimension: D3D12_RESOURCE_DIMENSION(desc.dimension.0),
        Alignment: desc.alignment,
        Width: desc.width,
        Height: desc.height,
        DepthOrArraySize: desc.depth_or_array_size,
        MipLevels: desc.mip_levels,
        Format: format(desc.format),
        SampleDesc: DXGI_SAMPLE_DESC {
            Count: desc.sample_desc.count,
            Quality: desc.sample_desc.quality,
        },
        Layout: D3D12_TEXTURE_LAYOUT(desc.layout.0),
        Flags: D3D12_RESOURCE_FLAGS(desc.flags.0),
    }
}

pub fn clear_value(value: &ClearValue) -> D3D12_CLEAR_VALUE {
    let anonymous = match value.value {
        ClearValueKind::Color(rgba) => D3D12_CLEAR_VALUE_0 { Color: rgba },
        ClearValueKind::DepthStencil { depth, stencil } => D3D12_CLEAR_VALUE_0 {
            DepthStencil: D3D12_DEPTH_STENCIL_VALUE {
                Depth: depth,
                Stencil: stencil,
            },
        },
    };
    D3D12_CLEAR_VALUE {
        Format: format(value.format),
        Anonymous: anonymous,
    }
}

pub fn descriptor_heap_type(heap_type: DescriptorHeapType) -> D3D12_DESCRIPTOR_HEAP_TYPE {
    D3D12_DESCRIPTOR_HEAP_TYPE(heap_type.0)
}

pub fn descriptor_heap_desc(desc: &DescriptorHeapDesc) -> D3D12_DESCRIPTOR_HEAP_DESC {
    D3D12_DESCRIPTOR_HEAP_DESC {
        Type: descriptor_heap_type(desc.heap_type),
        NumDescriptors: desc.num_descriptors,
        Flags: D3D12_DESCRIPTOR_HEAP_FLAGS(desc.flags.0),
        NodeMask: desc.node_mask,
    }
}

pub fn cpu_handle(handle: CpuDescriptorHandle) -> D3D12_CPU_DESCRIPTOR_HANDLE {
    D3D12_CPU_DESCRIPTOR_HANDLE { ptr: handle.ptr }
}

pub fn gpu_handle(handle: GpuDescriptorHandle) -> D3D12_GPU_DESCRIPTOR_HANDLE {
    D3D12_GPU_DESCRIPTOR_HANDLE { ptr: handle.ptr }
}

pub fn shader_resource_view_desc(desc: &ShaderResourceViewDesc) -> D3D12_SHADER_RESOURCE_VIEW_DESC {
    let (view_dimension, anonymous) = match desc.dimension {
        SrvDimension::Buffer {
            first_element,
            num_elements,
            structure_byte_stride,
            raw,
        } => (
            D3D12_SRV_DIMENSION_BUFFER,
            D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Buffer: D3D12_BUFFER_SRV {
                    FirstElement: first_element,
                    NumElements: num_elements,
                    StructureByteStride: structure_byte_stride,
                    Flags: if raw {
                        D3D12_BUFFER_SRV_FLAG_RAW
                    } else {
                        D3D12_BUFFER_SRV_FLAG_NONE
                    },
                },
            },
        ),
        SrvDimension::Texture2D {
            most_detailed_mip,
            mip_levels,
            plane_slice,
            resource_min_lod_clamp,
        } => (
            D3D12_SRV_DIMENSION_TEXTURE2D,
            D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_SRV {
                    MostDetailedMip: most_detailed_mip,
                    MipLevels: mip_levels,
                    PlaneSlice: plane_slice,
                    ResourceMinLODClamp: resource_min_lod_clamp,
                },
            },
        ),
        SrvDimension::Texture2DArray {
            most_detailed_mip,
            mip_levels,
            first_array_slice,
            array_size,
            plane_slice,
            resource_min_lod_clamp,
        } => (
            D3D12_SRV_DIMENSION_TEXTURE2DARRAY,
            D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                Texture2DArray: D3D12_TEX2D_ARRAY_SRV {
                    MostDetailedMip: most_detailed_mip,
                    MipLevels: mip_levels,
                    FirstArraySlice: first_array_slice,
                    ArraySize: array_size,
                    PlaneSlice: plane_slice,
                    ResourceMinLODClamp: resource_min_lod_clamp,
                },
            },
        ),
        SrvDimension::TextureCube {
            most_detailed_mip,
            mip_levels,
            resource_min_lod_clamp,
        } => (
            D3D12_SRV_DIMENSION_TEXTURECUBE,
            D3D12_SHADER_RESOURCE_VIEW_DESC_0 {
                TextureCube: D3D12_TEXCUBE_SRV {
                    MostDetailedMip: most_detailed_mip,
                    MipLevels: mip_levels,
                    ResourceMinLODClamp: resource_min_lod_clamp,
                },
            },
        ),
    };
    D3D12_SHADER_RESOURCE_VIEW_DESC {
        Format: format(desc.format),
        ViewDimension: view_dimension,
        Shader4ComponentMapping: desc.shader_4_component_mapping,
        Anonymous: anonymous,
    }
}

pub fn constant_buffer_view_desc(desc: &ConstantBufferViewDesc) -> D3D12_CONSTANT_BUFFER_VIEW_DESC {
    D3D12_CONSTANT_BUFFER_VIEW_DESC {
        BufferLocation: desc.buffer_location,
        SizeInBytes: desc.size_in_bytes,
    }
}

pub fn depth_stencil_view_desc(desc: &DepthStencilViewDesc) -> D3D12_DEPTH_STENCIL_VIEW_DESC {
    let (view_dimension, anonymous) = match desc.dimension {
        DsvDimension::Texture2D { mip_slice } => (
            D3D12_DSV_DIMENSION_TEXTURE2D,
            D3D12_DEPTH_STENCIL_VIEW_DESC_0 {
                Texture2D: D3D12_TEX2D_DSV { MipSlice: mip_slice },
            },
        ),
        DsvDimension::Texture2DArray {
            mip_slice,
            first_array_slice,
            array_size,
        } => (
            D3D12_DSV_DIMENSION_TEXTURE2DARRAY,
            D3D12_DEPTH_STENCIL_VIEW_DESC_0 {
                Texture2DArray: D3D12_TEX2D_ARRAY_DSV {
                    MipSlice: mip_slice,
                    FirstArraySlice: first_array_slice,
                    ArraySize: array_size,
                },
            },
        ),
    };
    D3D12_DEPTH_STENCIL_VIEW_DESC {
        Format: format(desc.format),
        ViewDimension: view_dimension,
        Flags: D3D12_DSV_FLAGS(desc.flags.0),
        Anonymous: anonymous,
    }
}

pub fn descriptor_range(range: &DescriptorRange) -> D3D12_DESCRIPTOR_RANGE {
    D3D12_DESCRIPTOR_RANGE {
        RangeType: D3D12_DESCRIPTOR_RANGE_TYPE(range.range_type.0),
        NumDescriptors: range.num_descriptors,
        BaseShaderRegister: range.base_shader_register,
        RegisterSpace: range.register_space,
        OffsetInDescriptorsFromTableStart: range.offset_in_descriptors_from_table_start,
    }
}

pub fn shader_visibility(visibility: ShaderVisibility) -> D3D12_SHADER_VISIBILITY {
    D3D12_SHADER_VISIBILITY(visibility.0)
}

pub fn static_sampler(sampler: &StaticSampler) -> D3D12_STATIC_SAMPLER_DESC {
    D3D12_STATIC_SAMPLER_DESC {
        Filter: D3D12_FILTER(sampler.filter.0),
        AddressU: D3D12_TEXTURE_ADDRESS_MODE(sampler.address_u.0),
        AddressV: D3D12_TEXTURE_ADDRESS_MODE(sampler.address_v.0),
        AddressW: D3D12_TEXTURE_ADDRESS_MODE(sampler.address_w.0),
        MipLODBias: sampler.mip_lod_bias,
        MaxAnisotropy: sampler.max_anisotropy,
        ComparisonFunc: D3D12_COMPARISON_FUNC_ALWAYS,
        BorderColor: D3D12_STATIC_BORDER_COLOR_TRANSPARENT_BLACK,
        MinLOD: 0.0,
        MaxLOD: D3D12_FLOAT32_MAX,
        ShaderRegister: sampler.shader_register,
        RegisterSpace: sampler.register_space,
        ShaderVisibility: shader_visibility(sampler.visibility),
    }
}

pub fn primitive_topology(topology: PrimitiveTopology) -> D3D_PRIMITIVE_TOPOLOGY {
    D3D_PRIMITIVE_TOPOLOGY(topology.0)
}

pub fn viewport(viewport: &Viewport) -> D3D12_VIEWPORT {
    D3D12_VIEWPORT {
        TopLeftX: viewport.top_left_x,
        TopLeftY: viewport.top_left_y,
        Width: viewport.width,
        Height: viewport.height,
        MinDepth: viewport.min_depth,
        MaxDepth: viewport.max_depth,
    }
}

pub fn scissor_rect(rect: &ScissorRect) -> RECT {
    RECT {
        left: rect.left,
        top: rect.top,
        right: rect.right,
        bottom: rect.bottom,
    }
}

pub fn vertex_buffer_view(view: &VertexBufferView) -> D3D12_VERTEX_BUFFER_VIEW {
    D3D12_VERTEX_BUFFER_VIEW {
        BufferLocation: view.buffer_location,
        SizeInBytes: view.size_in_bytes,
        StrideInBytes: view.stride_in_bytes,
    }
}

pub fn index_buffer_view(view: &IndexBufferView) -> D3D12_INDEX_BUFFER_VIEW {
    D3D12_INDEX_BUFFER_VIEW {
        BufferLocation: view.buffer_location,
        SizeInBytes: view.size_in_bytes,
        Format: format(view.format),
    }
}
