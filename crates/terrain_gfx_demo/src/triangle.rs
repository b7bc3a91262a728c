use std::path::PathBuf;

use bevy_math::Mat4;
use bevy_math::Vec3;
use terrain_gfx::backend::CommandList;
use terrain_gfx::constants::CONSTANT_BUFFER_ALIGNMENT;
use terrain_gfx::constants::FRAME_BUFFER_COUNT;
use terrain_gfx::desc::*;
use terrain_gfx::projection;
use terrain_gfx::Backend;
use terrain_gfx::CommittedResource;
use terrain_gfx::InitializedBuffer;
use terrain_gfx::RenderContext;
use terrain_gfx::ShaderStage;
use tracing::info;

pub const CLEAR_COLOR: [f32; 4] = [0.0, 0.2, 0.4, 1.0];

struct Vertex {
    position: [f32; 3],
    color: [f32; 4],
}

const VERTEX_STRIDE: u32 = 7 * 4;

const VERTICES: [Vertex; 3] = [
    Vertex {
        position: [0.0, 0.5, 0.0],
        color: [1.0, 0.0, 0.0, 1.0],
    },
    Vertex {
        position: [0.5, -0.5, 0.0],
        color: [0.0, 1.0, 0.0, 1.0],
    },
    Vertex {
        position: [-0.5, -0.5, 0.0],
        color: [0.0, 0.0, 1.0, 1.0],
    },
];

fn vertex_bytes() -> Vec<u8> {
    VERTICES
        .iter()
        .flat_map(|v| v.position.iter().chain(v.color.iter()))
        .flat_map(|f| f.to_ne_bytes())
        .collect()
}

fn shader_path(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("shaders").join(name)
}

/// A spinning triangle: one vertex buffer, one matrix per frame slot.
pub struct Triangle<B: Backend> {
    root_signature: B::RootSignature,
    pipeline: B::PipelineState,
    vertices: InitializedBuffer<B>,
    matrices: CommittedResource<B>,
    angle: f32,
}

impl<B: Backend> Triangle<B> {
    /// Builds the pipeline and uploads the vertices. The upload is flushed
    /// before returning, so the context is Idle afterwards.
    pub fn new(ctx: &mut RenderContext<B>) -> eyre::Result<Self> {
        let vs = ctx.compile_shader(shader_path("triangle_vs.hlsl"), ShaderStage::Vertex)?;
        let ps = ctx.compile_shader(shader_path("triangle_ps.hlsl"), ShaderStage::Pixel)?;

        let root_signature = ctx.create_root_signature(&RootSignatureDesc {
            parameters: vec![RootParameter::ConstantBufferView {
                shader_register: 0,
                register_space: 0,
                visibility: ShaderVisibility::VERTEX,
            }],
            static_samplers: Vec::new(),
            flags: RootSignatureFlags::ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
        })?;
        let layout = [
            InputElement::per_vertex("POSITION", Format::R32G32B32_FLOAT, 0),
            InputElement::per_vertex("COLOR", Format::R32G32B32A32_FLOAT, 12),
        ];
        let mut pipeline_desc = GraphicsPipelineDesc::new(&root_signature, &vs, &layout).with_pixel_shader(&ps);
        pipeline_desc.cull_mode = CullMode::NONE;
        let pipeline = ctx.create_pipeline_state(&pipeline_desc)?;

        let matrices = ctx.create_upload_buffer(
            CONSTANT_BUFFER_ALIGNMENT * FRAME_BUFFER_COUNT as u64,
            "triangle matrices",
        )?;

        ctx.reset_pipeline()?;
        let vertices = ctx.create_initialized_buffer(
            &vertex_bytes(),
            ResourceStates::VERTEX_AND_CONSTANT_BUFFER,
            "triangle vertices",
        )?;
        ctx.flush()?;
        info!("Triangle ready on {}", ctx.adapter_info().name);

        Ok(Self {
            root_signature,
            pipeline,
            vertices,
            matrices,
            angle: 0.0,
        })
    }

    /// Records and presents one frame.
    pub fn frame(&mut self, ctx: &mut RenderContext<B>) -> eyre::Result<()> {
        ctx.reset_pipeline()?;

        // The slot's previous frame is finished, so its matrix is free to overwrite.
        let slot = ctx.buffer_index() as u64;
        let offset = slot * CONSTANT_BUFFER_ALIGNMENT;
        self.angle = (self.angle + 0.01) % std::f32::consts::TAU;
        let view = Mat4::look_at_lh(Vec3::new(0.0, 0.0, -2.0), Vec3::ZERO, Vec3::Y);
        let projection = projection::perspective(std::f32::consts::FRAC_PI_4, ctx.viewport().aspect_ratio());
        let world_view_projection = projection * view * Mat4::from_rotation_y(self.angle);
        let matrix: Vec<u8> = world_view_projection
            .to_cols_array()
            .iter()
            .flat_map(|f| f.to_ne_bytes())
            .collect();
        self.matrices.write(offset, &matrix)?;

        ctx.set_back_buffer_render(CLEAR_COLOR)?;
        {
            let list = ctx.command_list()?;
            list.set_graphics_root_signature(&self.root_signature);
            list.set_pipeline_state(&self.pipeline);
            list.set_graphics_root_constant_buffer_view(0, self.matrices.gpu_virtual_address() + offset);
            list.set_viewport(&ctx.viewport());
            list.set_scissor_rect(&ctx.scissor_rect());
            list.set_primitive_topology(PrimitiveTopology::TRIANGLELIST);
            list.set_vertex_buffers(
                0,
                &[VertexBufferView {
                    buffer_location: self.vertices.buffer.gpu_virtual_address(),
                    size_in_bytes: self.vertices.buffer.size() as u32,
                    stride_in_bytes: VERTEX_STRIDE,
                }],
            );
            list.draw_instanced(VERTICES.len() as u32, 1, 0, 0);
        }
        ctx.set_back_buffer_present()?;
        ctx.render()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrain_gfx::headless::Headless;
    use terrain_gfx::headless::HeadlessInstance;
    use terrain_gfx::headless::HeadlessWindow;
    use terrain_gfx::GfxConfig;

    #[test]
    fn vertex_bytes_match_the_stride() {
        assert_eq!(vertex_bytes().len(), VERTICES.len() * VERTEX_STRIDE as usize);
    }

    #[test]
    fn spins_headless_for_a_few_frames() {
        let instance = HeadlessInstance::new();
        let config = GfxConfig {
            debug_layer: false,
            ..Default::default()
        };
        let mut ctx = RenderContext::<Headless>::new(&instance, &HeadlessWindow::new(800, 600), false, config).unwrap();
        let mut triangle = Triangle::new(&mut ctx).unwrap();
        assert_eq!(triangle.vertices.buffer.raw().contents(), vertex_bytes());

        for _ in 0..5 {
            triangle.frame(&mut ctx).unwrap();
        }
        assert_eq!(instance.gpu().present_count(), 5);
        ctx.clear_all_frames().unwrap();
    }
}
