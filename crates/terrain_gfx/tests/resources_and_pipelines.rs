mod common;

use common::*;
use terrain_gfx::desc::*;
use terrain_gfx::headless::HeadlessInstance;
use terrain_gfx::headless::HeadlessView;
use terrain_gfx::headless::RecordedCommand;
use terrain_gfx::GfxErrorKind;
use terrain_gfx::ShaderStage;

#[test]
fn initialized_buffer_holds_its_data_after_flush() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);
    let vertices: Vec<u8> = (0..36u8).collect();

    ctx.reset_pipeline().unwrap();
    let initialized = ctx
        .create_initialized_buffer(&vertices, ResourceStates::VERTEX_AND_CONSTANT_BUFFER, "terrain vertices")
        .unwrap();
    assert_eq!(initialized.buffer.heap_type(), HeapType::DEFAULT);
    assert_eq!(initialized.buffer.initial_state(), ResourceStates::COPY_DEST);
    assert_eq!(initialized.upload.heap_type(), HeapType::UPLOAD);
    // Nothing moves until the recorded copy executes.
    assert!(initialized.buffer.raw().contents().iter().all(|&b| b == 0));

    ctx.flush().unwrap();
    assert_eq!(initialized.buffer.raw().contents(), vertices);
    assert_eq!(initialized.buffer.raw().name(), "terrain vertices");
    ctx.clear_all_frames().unwrap();
}

#[test]
fn initialized_buffer_needs_an_open_list_and_data() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    let err = ctx
        .create_initialized_buffer(&[1, 2, 3], ResourceStates::INDEX_BUFFER, "indices")
        .err()
        .unwrap();
    assert_eq!(err.kind(), GfxErrorKind::ContractViolation);

    ctx.reset_pipeline().unwrap();
    let err = ctx
        .create_initialized_buffer(&[], ResourceStates::INDEX_BUFFER, "indices")
        .err()
        .unwrap();
    assert_eq!(err.kind(), GfxErrorKind::ResourceCreationFailed);
    ctx.flush().unwrap();
    ctx.clear_all_frames().unwrap();
}

#[test]
fn constant_buffer_view_over_an_upload_buffer() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    let constants = ctx.create_upload_buffer(512, "matrix buffer").unwrap();
    let heap = ctx
        .create_descriptor_heap(&DescriptorHeapDesc::new(DescriptorHeapType::CBV_SRV_UAV, 4).shader_visible())
        .unwrap();
    let handle = heap.cpu_handle(1).unwrap();
    let desc = ConstantBufferViewDesc {
        buffer_location: constants.gpu_virtual_address(),
        size_in_bytes: 256,
    };
    ctx.create_constant_buffer_view(&desc, handle).unwrap();
    assert_eq!(ctx.device().view(handle), Some(HeadlessView::ConstantBuffer(desc)));
    assert_eq!(
        heap.gpu_handle(1).unwrap().ptr,
        heap.gpu_handle(0).unwrap().ptr + heap.increment() as u64
    );

    let unaligned = ConstantBufferViewDesc {
        size_in_bytes: 192,
        ..desc
    };
    let err = ctx.create_constant_buffer_view(&unaligned, handle).unwrap_err();
    assert_eq!(err.kind(), GfxErrorKind::ResourceCreationFailed);
    ctx.clear_all_frames().unwrap();
}

#[test]
fn texture_with_shader_resource_view() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    let texture = ctx
        .create_committed_resource(
            &HeapProperties::new(HeapType::DEFAULT),
            HeapFlags::NONE,
            &ResourceDesc::texture2d(256, 256, Format::R8G8B8A8_UNORM, 1),
            ResourceStates::PIXEL_SHADER_RESOURCE,
            None,
            "grass texture",
        )
        .unwrap();
    let heap = ctx
        .create_descriptor_heap(&DescriptorHeapDesc::new(DescriptorHeapType::CBV_SRV_UAV, 2).shader_visible())
        .unwrap();
    let srv = ShaderResourceViewDesc::texture2d(Format::R8G8B8A8_UNORM, 1);
    ctx.create_shader_resource_view(Some(&texture), Some(&srv), heap.cpu_handle(0).unwrap())
        .unwrap();
    // A null descriptor keeps the second slot valid to bind.
    ctx.create_shader_resource_view(None, Some(&srv), heap.cpu_handle(1).unwrap())
        .unwrap();
    assert!(matches!(
        ctx.device().view(heap.cpu_handle(1).unwrap()),
        Some(HeadlessView::ShaderResource { resource: None, .. })
    ));

    let buffer_view = ShaderResourceViewDesc::structured_buffer(16, 16);
    let err = ctx
        .create_shader_resource_view(Some(&texture), Some(&buffer_view), heap.cpu_handle(0).unwrap())
        .unwrap_err();
    assert_eq!(err.kind(), GfxErrorKind::ResourceCreationFailed);
    ctx.clear_all_frames().unwrap();
}

#[test]
fn missing_shader_file_fails_and_context_stays_usable() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    let err = ctx
        .compile_shader(shader_path("does_not_exist_ps.hlsl"), ShaderStage::Pixel)
        .unwrap_err();
    assert_eq!(err.kind(), GfxErrorKind::ShaderCompileFailed);
    assert!(err.message().contains("does_not_exist_ps.hlsl"), "{err}");

    run_frame(&mut ctx);
    ctx.clear_all_frames().unwrap();
}

#[test]
fn compiler_diagnostics_are_reported() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    let err = ctx
        .compile_shader(shader_path("wrong_entry_ps.hlsl"), ShaderStage::Pixel)
        .unwrap_err();
    assert_eq!(err.kind(), GfxErrorKind::ShaderCompileFailed);
    assert!(err.message().contains("X3501"), "{err}");
    assert!(err.message().contains("'main'"), "{err}");

    let err = ctx
        .compile_shader(shader_path("syntax_error_ps.hlsl"), ShaderStage::Pixel)
        .unwrap_err();
    assert_eq!(err.kind(), GfxErrorKind::ShaderCompileFailed);
    assert!(err.message().contains("syntax_error_ps.hlsl"), "{err}");
    ctx.clear_all_frames().unwrap();
}

fn color_layout() -> Vec<InputElement> {
    vec![
        InputElement::per_vertex("POSITION", Format::R32G32B32_FLOAT, 0),
        InputElement::per_vertex("COLOR", Format::R32G32B32A32_FLOAT, 12),
    ]
}

#[test]
fn pipeline_from_compiled_shaders_draws_a_frame() {
    use terrain_gfx::backend::CommandList;

    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    let vs = ctx.compile_shader(shader_path("color_vs.hlsl"), ShaderStage::Vertex).unwrap();
    let ps = ctx.compile_shader(shader_path("color_ps.hlsl"), ShaderStage::Pixel).unwrap();
    assert_eq!(vs.stage(), ShaderStage::Vertex);
    assert!(!ps.is_empty());

    let root_signature = ctx
        .create_root_signature(&RootSignatureDesc {
            parameters: vec![RootParameter::ConstantBufferView {
                shader_register: 0,
                register_space: 0,
                visibility: ShaderVisibility::VERTEX,
            }],
            static_samplers: Vec::new(),
            flags: RootSignatureFlags::ALLOW_INPUT_ASSEMBLER_INPUT_LAYOUT,
        })
        .unwrap();
    let layout = color_layout();
    let pipeline = ctx
        .create_pipeline_state(&GraphicsPipelineDesc::new(&root_signature, &vs, &layout).with_pixel_shader(&ps))
        .unwrap();
    assert_eq!(pipeline.stage_count(), 2);
    assert_eq!(pipeline.root_signature(), root_signature.id());

    ctx.reset_pipeline().unwrap();
    let vertices = ctx
        .create_initialized_buffer(&[0u8; 84], ResourceStates::VERTEX_AND_CONSTANT_BUFFER, "triangle")
        .unwrap();
    ctx.set_back_buffer_render(CLEAR_COLOR).unwrap();
    {
        let list = ctx.command_list().unwrap();
        list.set_graphics_root_signature(&root_signature);
        list.set_pipeline_state(&pipeline);
        list.set_viewport(&ctx.viewport());
        list.set_scissor_rect(&ctx.scissor_rect());
        list.set_primitive_topology(PrimitiveTopology::TRIANGLELIST);
        list.set_vertex_buffers(
            0,
            &[VertexBufferView {
                buffer_location: vertices.buffer.gpu_virtual_address(),
                size_in_bytes: 84,
                stride_in_bytes: 28,
            }],
        );
        list.draw_instanced(3, 1, 0, 0);
    }
    ctx.set_back_buffer_present().unwrap();
    let commands = ctx.command_list().unwrap().commands();
    assert!(commands
        .iter()
        .any(|c| matches!(c, RecordedCommand::SetPipelineState(id) if *id == pipeline.id())));
    assert!(commands
        .iter()
        .any(|c| matches!(c, RecordedCommand::SetGraphicsRootSignature(id) if *id == root_signature.id())));
    ctx.render().unwrap();
    assert_eq!(vertices.buffer.raw().contents().len(), 84);
    ctx.clear_all_frames().unwrap();
}

#[test]
fn pipeline_stage_mismatch_is_rejected() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);

    let vs = ctx.compile_shader(shader_path("color_vs.hlsl"), ShaderStage::Vertex).unwrap();
    let ps = ctx.compile_shader(shader_path("color_ps.hlsl"), ShaderStage::Pixel).unwrap();
    let root_signature = ctx.create_root_signature(&RootSignatureDesc::default()).unwrap();
    let layout = color_layout();

    // Pixel bytecode in the vertex slot.
    let err = ctx
        .create_pipeline_state(&GraphicsPipelineDesc::new(&root_signature, &ps, &layout))
        .err()
        .unwrap();
    assert_eq!(err.kind(), GfxErrorKind::ResourceCreationFailed);

    let mut patch = GraphicsPipelineDesc::new(&root_signature, &vs, &layout).with_pixel_shader(&ps);
    patch.primitive_topology_type = PrimitiveTopologyType::PATCH;
    let err = ctx.create_pipeline_state(&patch).err().unwrap();
    assert_eq!(err.kind(), GfxErrorKind::ResourceCreationFailed);

    let mut no_depth_format = GraphicsPipelineDesc::new(&root_signature, &vs, &layout).with_pixel_shader(&ps);
    no_depth_format.depth_stencil_format = Format::UNKNOWN;
    let err = ctx.create_pipeline_state(&no_depth_format).err().unwrap();
    assert_eq!(err.kind(), GfxErrorKind::ResourceCreationFailed);
    ctx.clear_all_frames().unwrap();
}

#[test]
fn empty_descriptor_table_is_rejected() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);
    let err = ctx
        .create_root_signature(&RootSignatureDesc {
            parameters: vec![RootParameter::DescriptorTable {
                ranges: Vec::new(),
                visibility: ShaderVisibility::PIXEL,
            }],
            ..Default::default()
        })
        .err()
        .unwrap();
    assert_eq!(err.kind(), GfxErrorKind::ResourceCreationFailed);
    ctx.clear_all_frames().unwrap();
}

#[test]
fn unknown_descriptor_heap_type_is_rejected() {
    let instance = HeadlessInstance::new();
    let mut ctx = context(&instance);
    for heap_type in [DescriptorHeapType(4), DescriptorHeapType(-1)] {
        let err = ctx
            .create_descriptor_heap(&DescriptorHeapDesc::new(heap_type, 8))
            .err()
            .unwrap();
        assert_eq!(err.kind(), GfxErrorKind::ResourceCreationFailed);
        assert!(err.message().contains(&heap_type.0.to_string()), "{err}");
    }
    run_frame(&mut ctx);
    ctx.clear_all_frames().unwrap();
}
