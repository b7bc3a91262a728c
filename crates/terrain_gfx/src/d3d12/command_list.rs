use windows::Win32::Graphics::Direct3D12::*;

use super::convert;
use super::transition_barrier;
use super::D3d12;
use super::D3d12CommandAllocator;
use super::D3d12CommandList;
use super::D3d12DescriptorHeap;
use super::D3d12PipelineState;
use super::D3d12Resource;
use super::D3d12RootSignature;
use crate::backend;
use crate::desc::*;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::gfx_error::GfxResultExt;
use crate::projection::ScissorRect;
use crate::projection::Viewport;

impl backend::CommandList<D3d12> for D3d12CommandList {
    fn reset(&self, allocator: &D3d12CommandAllocator, initial_state: Option<&D3d12PipelineState>) -> GfxResult<()> {
        unsafe { self.0.Reset(&allocator.0, initial_state.map(|pipeline| &pipeline.0)) }
            .gfx_context(GfxErrorKind::SyncFailed, || "ID3D12GraphicsCommandList::Reset".to_string())
    }

    fn close(&self) -> GfxResult<()> {
        unsafe { self.0.Close() }
            .gfx_context(GfxErrorKind::ContractViolation, || "ID3D12GraphicsCommandList::Close".to_string())
    }

    fn transition(&self, resource: &D3d12Resource, before: ResourceStates, after: ResourceStates) {
        let barrier = transition_barrier(
            &resource.0,
            convert::resource_states(before),
            convert::resource_states(after),
        );
        unsafe { self.0.ResourceBarrier(&[barrier]) };
    }

    fn set_render_targets(&self, rtv: CpuDescriptorHandle, dsv: Option<CpuDescriptorHandle>) {
        let rtv = convert::cpu_handle(rtv);
        let dsv = dsv.map(convert::cpu_handle);
        unsafe {
            self.0.OMSetRenderTargets(
                1,
                Some(&rtv as *const _),
                false,
                dsv.as_ref().map(|dsv| dsv as *const _),
            )
        };
    }

    fn clear_render_target(&self, rtv: CpuDescriptorHandle, color: [f32; 4]) {
        unsafe {
            self.0
                .ClearRenderTargetView(convert::cpu_handle(rtv), &color, None)
        };
    }

    fn clear_depth_stencil(&self, dsv: CpuDescriptorHandle, depth: f32, stencil: u8) {
        unsafe {
            self.0.ClearDepthStencilView(
                convert::cpu_handle(dsv),
                D3D12_CLEAR_FLAG_DEPTH,
                depth,
                stencil,
                None,
            )
        };
    }

    fn set_viewport(&self, viewport: &Viewport) {
        unsafe { self.0.RSSetViewports(&[convert::viewport(viewport)]) };
    }

    fn set_scissor_rect(&self, rect: &ScissorRect) {
        unsafe { self.0.RSSetScissorRects(&[convert::scissor_rect(rect)]) };
    }

    fn set_pipeline_state(&self, pipeline: &D3d12PipelineState) {
        unsafe { self.0.SetPipelineState(&pipeline.0) };
    }

    fn set_graphics_root_signature(&self, root_signature: &D3d12RootSignature) {
        unsafe { self.0.SetGraphicsRootSignature(&root_signature.0) };
    }

    fn set_descriptor_heaps(&self, heaps: &[&D3d12DescriptorHeap]) {
        let heaps: Vec<Option<ID3D12DescriptorHeap>> = heaps.iter().map(|heap| Some(heap.0.clone())).collect();
        unsafe { self.0.SetDescriptorHeaps(&heaps) };
    }

    fn set_graphics_root_descriptor_table(&self, parameter: u32, base: GpuDescriptorHandle) {
        unsafe {
            self.0
                .SetGraphicsRootDescriptorTable(parameter, convert::gpu_handle(base))
        };
    }

    fn set_graphics_root_constant_buffer_view(&self, parameter: u32, buffer_location: u64) {
        unsafe {
            self.0
                .SetGraphicsRootConstantBufferView(parameter, buffer_location)
        };
    }

    fn set_primitive_topology(&self, topology: PrimitiveTopology) {
        unsafe {
            self.0
                .IASetPrimitiveTopology(convert::primitive_topology(topology))
        };
    }

    fn set_vertex_buffers(&self, start_slot: u32, views: &[VertexBufferView]) {
        let views: Vec<D3D12_VERTEX_BUFFER_VIEW> = views.iter().map(convert::vertex_buffer_view).collect();
        unsafe { self.0.IASetVertexBuffers(start_slot, Some(&views)) };
    }

    fn set_index_buffer(&self, view: &IndexBufferView) {
        let view = convert::index_buffer_view(view);
        unsafe { self.0.IASetIndexBuffer(Some(&view as *const _)) };
    }

    fn copy_buffer_region(&self, dst: &D3d12Resource, dst_offset: u64, src: &D3d12Resource, src_offset: u64, num_bytes: u64) {
        unsafe {
            self.0
                .CopyBufferRegion(&dst.0, dst_offset, &src.0, src_offset, num_bytes)
        };
    }

    fn draw_instanced(&self, vertex_count: u32, instance_count: u32, start_vertex: u32, start_instance: u32) {
        unsafe {
            self.0
                .DrawInstanced(vertex_count, instance_count, start_vertex, start_instance)
        };
    }

    fn draw_indexed_instanced(
        &self,
        index_count: u32,
        instance_count: u32,
        start_index: u32,
        base_vertex: i32,
        start_instance: u32,
    ) {
        unsafe {
            self.0.DrawIndexedInstanced(
                index_count,
                instance_count,
                start_index,
                base_vertex,
                start_instance,
            )
        };
    }
}
