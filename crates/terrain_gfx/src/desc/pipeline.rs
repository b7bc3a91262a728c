use super::format::Format;
use crate::backend::Backend;
use crate::shader_compiler::ShaderBytecode;

/// Mirrors `D3D12_SHADER_VISIBILITY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct ShaderVisibility(pub i32);

impl ShaderVisibility {
    pub const ALL: ShaderVisibility = ShaderVisibility(0);
    pub const VERTEX: ShaderVisibility = ShaderVisibility(1);
    pub const HULL: ShaderVisibility = ShaderVisibility(2);
    pub const DOMAIN: ShaderVisibility = ShaderVisibility(3);
    pub const GEOMETRY: ShaderVisibility = ShaderVisibility(4);
    pub const PIXEL: ShaderVisibility = ShaderVisibility(5);
}

/// Mirrors `D3D12_DESCRIPTOR_RANGE_TYPE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct DescriptorRangeType(pub i32);

impl DescriptorRangeType {
    pub const SRV: DescriptorRangeType = DescriptorRangeType(0);
    pub const UAV: DescriptorRangeType = DescriptorRangeType(1);
    pub const CBV: DescriptorRangeType = DescriptorRangeType(2);
    pub const SAMPLER: DescriptorRangeType = DescriptorRangeType(3);
}

/// `D3D12_DESCRIPTOR_RANGE_OFFSET_APPEND`.
pub const DESCRIPTOR_RANGE_OFFSET_APPEND: u32 = 0xffff_ffff;

/// Mirrors `D3D12_DESCRIPTOR_RANGE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(C)]
pub struct DescriptorRange {
    pub range_type: DescriptorRangeType,
    pub num_descriptors: u32,
    pub base_shader_register: u32,
    pub register_space: u32,
    pub offset_in_descriptors_from_table_start: u32,
}

impl DescriptorRange {
    pub fn new(range_type: DescriptorRangeType, num_descriptors: u32, base_shader_register: u32) -> Self {
        Self {
            range_type,
            num_descriptors,
            base_shader_register,
            register_space: 0,
            offset_in_descriptors_from_table_start: DESCRIPTOR_RANGE_OFFSET_APPEND,
        }
    }
}

/// Mirrors `D3D12_ROOT_PARAMETER`. The native union becomes an enum.
#[derive(Clone, Debug, PartialEq)]
pub enum RootParameter {
    Constants {
        shader_register: u32,
        register_space: u32,
        num_32bit_values: u32,
        visibility: ShaderVisibility,
    },
    ConstantBufferView {
        shader_register: u32,
        register_space: u32,
        visibility: ShaderVisibility,
    },
    ShaderResourceView {
        shader_register: u32,
        register_space: u32,
        visibility: ShaderVisibility,
    },
    DescriptorTable {
        ranges: Vec<DescriptorRange>,
        visibility: ShaderVisibility,
    },
}

/// Mirrors `D3D12_FILTER` (the common subset).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct Filter(pub i32);

impl Filter {
    pub const MIN_MAG_MIP_POINT: Filter = Filter(0);
    pub const MIN_MAG_MIP_LINEAR: Filter = Filter(0x15);
    pub const ANISOTROPIC: Filter = Filter(0x55);
}

/// Mirrors `D3D12_TEXTURE_ADDRESS_MODE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct TextureAddressMode(pub i32);

impl TextureAddressMode {
    pub const WRAP: TextureAddressMode = TextureAddressMode(1);
    pub const MIRROR: TextureAddressMode = TextureAddressMode(2);
    pub const CLAMP: TextureAddressMode = TextureAddressMode(3);
    pub const BORDER: TextureAddressMode = TextureAddressMode(4);
}

impl Default for TextureAddressMode {
    fn default() -> Self {
        TextureAddressMode::WRAP
    }
}

/// Mirrors the fields of `D3D12_STATIC_SAMPLER_DESC` that vary in practice.
/// The rest (comparison, border color, LOD range) take the API defaults.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StaticSampler {
    pub filter: Filter,
    pub address_u: TextureAddressMode,
    pub address_v: TextureAddressMode,
    pub address_w: TextureAddressMode,
    pub mip_lod_bias: f32,
    pub max_anisotropy: u32,
    pub shader_register: u32,
    pub register_space: u32,
    pub visibility: ShaderVisibility,
}

impl StaticSampler {
    pub fn new(filter: Filter, address_mode: TextureAddressMode, shader_register: u32) -> Self {
        Self {
            filter,
            address_u: address_mode,
            address_v: address_mode,
            address_w: address_mode,
            mip_lod_bias: 0.0,
            max_anisotropy: if filter == Filter::ANISOTROPIC { 16 } else { 1 },
            shader_register,
            register_space: 0,
            visibility: ShaderVisibility::PIXEL,
        }
    }
}

/// Mirrors `D3D12_ROOT_SIGNATURE_FLAGS`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct RootSignatureFlags(pub i32);

impl RootSignatureFlags {
    pub const NONE: RootSignatureFlags = RootSignatureFlags(0);
    pub const ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT: RootSignatureFlags = RootSignatureFlags(0x1);
    pub const DENY_VERTEX_SHADER_ROOT_ACCESS: RootSignatureFlags = RootSignatureFlags(0x2);
    pub const DENY_HULL_SHADER_ROOT_ACCESS: RootSignatureFlags = RootSignatureFlags(0x4);
    pub const DENY_DOMAIN_SHADER_ROOT_ACCESS: RootSignatureFlags = RootSignatureFlags(0x8);
    pub const DENY_GEOMETRY_SHADER_ROOT_ACCESS: RootSignatureFlags = RootSignatureFlags(0x10);
    pub const DENY_PIXEL_SHADER_ROOT_ACCESS: RootSignatureFlags = RootSignatureFlags(0x20);
}

impl std::ops::BitOr for RootSignatureFlags {
    type Output = RootSignatureFlags;
    fn bitor(self, rhs: Self) -> Self {
        RootSignatureFlags(self.0 | rhs.0)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct RootSignatureDesc {
    pub parameters: Vec<RootParameter>,
    pub static_samplers: Vec<StaticSampler>,
    pub flags: RootSignatureFlags,
}

/// Mirrors `D3D12_INPUT_CLASSIFICATION`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct InputClassification(pub i32);

impl InputClassification {
    pub const PER_VERTEX_DATA: InputClassification = InputClassification(0);
    pub const PER_INSTANCE_DATA: InputClassification = InputClassification(1);
}

/// `D3D12_APPEND_ALIGNED_ELEMENT`.
pub const APPEND_ALIGNED_ELEMENT: u32 = 0xffff_ffff;

/// Mirrors `D3D12_INPUT_ELEMENT_DESC`, with an owned semantic name.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct InputElement {
    pub semantic_name: String,
    pub semantic_index: u32,
    pub format: Format,
    pub input_slot: u32,
    pub aligned_byte_offset: u32,
    pub classification: InputClassification,
    pub instance_data_step_rate: u32,
}

impl InputElement {
    pub fn per_vertex(semantic_name: &str, format: Format, aligned_byte_offset: u32) -> Self {
        Self {
            semantic_name: semantic_name.to_string(),
            semantic_index: 0,
            format,
            input_slot: 0,
            aligned_byte_offset,
            classification: InputClassification::PER_VERTEX_DATA,
            instance_data_step_rate: 0,
        }
    }
}

/// Mirrors `D3D12_PRIMITIVE_TOPOLOGY_TYPE`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PrimitiveTopologyType(pub i32);

impl PrimitiveTopologyType {
    pub const UNDEFINED: PrimitiveTopologyType = PrimitiveTopologyType(0);
    pub const POINT: PrimitiveTopologyType = PrimitiveTopologyType(1);
    pub const LINE: PrimitiveTopologyType = PrimitiveTopologyType(2);
    pub const TRIANGLE: PrimitiveTopologyType = PrimitiveTopologyType(3);
    pub const PATCH: PrimitiveTopologyType = PrimitiveTopologyType(4);
}

/// Mirrors `D3D_PRIMITIVE_TOPOLOGY`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct PrimitiveTopology(pub i32);

impl PrimitiveTopology {
    pub const POINTLIST: PrimitiveTopology = PrimitiveTopology(1);
    pub const LINELIST: PrimitiveTopology = PrimitiveTopology(2);
    pub const TRIANGLELIST: PrimitiveTopology = PrimitiveTopology(4);
    pub const TRIANGLESTRIP: PrimitiveTopology = PrimitiveTopology(5);
    pub const CONTROL_POINT_3_PATCHLIST: PrimitiveTopology = PrimitiveTopology(35);
    pub const CONTROL_POINT_4_PATCHLIST: PrimitiveTopology = PrimitiveTopology(36);
}

/// Mirrors `D3D12_FILL_MODE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct FillMode(pub i32);

impl FillMode {
    pub const WIREFRAME: FillMode = FillMode(2);
    pub const SOLID: FillMode = FillMode(3);
}

/// Mirrors `D3D12_CULL_MODE`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct CullMode(pub i32);

impl CullMode {
    pub const NONE: CullMode = CullMode(1);
    pub const FRONT: CullMode = CullMode(2);
    pub const BACK: CullMode = CullMode(3);
}

/// The parts of `D3D12_GRAPHICS_PIPELINE_STATE_DESC` a caller chooses. Blend
/// state is opaque write-all, one render target, sample mask all ones.
pub struct GraphicsPipelineDesc<'a, B: Backend> {
    pub root_signature: &'a B::RootSignature,
    pub vertex_shader: &'a ShaderBytecode,
    pub pixel_shader: Option<&'a ShaderBytecode>,
    pub geometry_shader: Option<&'a ShaderBytecode>,
    pub hull_shader: Option<&'a ShaderBytecode>,
    pub domain_shader: Option<&'a ShaderBytecode>,
    pub input_layout: &'a [InputElement],
    pub primitive_topology_type: PrimitiveTopologyType,
    pub fill_mode: FillMode,
    pub cull_mode: CullMode,
    pub depth_enable: bool,
    pub render_target_format: Format,
    pub depth_stencil_format: Format,
    pub sample_desc: super::resource::SampleDesc,
}

impl<'a, B: Backend> GraphicsPipelineDesc<'a, B> {
    /// Solid, back-face culled triangles with depth testing against the
    /// context's back buffer and depth formats.
    pub fn new(
        root_signature: &'a B::RootSignature,
        vertex_shader: &'a ShaderBytecode,
        input_layout: &'a [InputElement],
    ) -> Self {
        Self {
            root_signature,
            vertex_shader,
            pixel_shader: None,
            geometry_shader: None,
            hull_shader: None,
            domain_shader: None,
            input_layout,
            primitive_topology_type: PrimitiveTopologyType::TRIANGLE,
            fill_mode: FillMode::SOLID,
            cull_mode: CullMode::BACK,
            depth_enable: true,
            render_target_format: crate::constants::DESIRED_FORMAT,
            depth_stencil_format: crate::constants::DEPTH_FORMAT,
            sample_desc: Default::default(),
        }
    }

    pub fn with_pixel_shader(mut self, shader: &'a ShaderBytecode) -> Self {
        self.pixel_shader = Some(shader);
        self
    }

    /// Every stage present, in pipeline order.
    pub fn stages(&self) -> impl Iterator<Item = &'a ShaderBytecode> {
        std::iter::once(self.vertex_shader)
            .chain(self.hull_shader)
            .chain(self.domain_shader)
            .chain(self.geometry_shader)
            .chain(self.pixel_shader)
    }
}
