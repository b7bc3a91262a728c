use tracing::debug;
use tracing::info;
use tracing::warn;

use crate::backend::Backend;
use crate::backend::CommandList;
use crate::backend::Instance;
use crate::backend::SwapChain;
use crate::backend::SwapChainDesc;
use crate::constants::DEPTH_FORMAT;
use crate::constants::DESIRED_FORMAT;
use crate::constants::FRAME_BUFFER_COUNT;
use crate::constants::SCREEN_DEPTH;
use crate::desc::*;
use crate::device_context::DeviceContext;
use crate::gfx_error::GfxError;
use crate::gfx_error::GfxErrorKind;
use crate::gfx_error::GfxResult;
use crate::resource_factory;
use crate::resource_factory::CommittedResource;
use crate::resource_factory::DescriptorHeap;
use crate::window_target::WindowTarget;

fn swap_chain_failed(message: impl Into<String>) -> GfxError {
    GfxError::new(GfxErrorKind::SwapChainFailed, message)
}

/// The presentation chain, its render target views and the shared depth buffer.
pub struct SwapChainManager<B: Backend> {
    swap_chain: B::SwapChain,
    rtv_heap: DescriptorHeap<B>,
    dsv_heap: DescriptorHeap<B>,
    depth_buffer: CommittedResource<B>,
    width: u32,
    height: u32,
    fullscreen: bool,
    buffer_index: u32,
}

impl<B: Backend> SwapChainManager<B> {
    pub fn new<W: WindowTarget + ?Sized>(
        instance: &B::Instance,
        device: &DeviceContext<B>,
        queue: &B::Queue,
        window: &W,
        fullscreen: bool,
    ) -> GfxResult<Self> {
        let handle = window.native_handle();
        let (width, height) = (window.client_width(), window.client_height());
        if handle.is_null() {
            return Err(swap_chain_failed("window handle is null"));
        }
        if width == 0 || height == 0 {
            return Err(swap_chain_failed(format!(
                "window client area is {}x{}",
                width, height
            )));
        }

        let desc = SwapChainDesc {
            width,
            height,
            format: DESIRED_FORMAT,
            buffer_count: FRAME_BUFFER_COUNT as u32,
            fullscreen,
        };
        let swap_chain = instance.create_swap_chain(queue, handle, &desc)?;
        if fullscreen {
            swap_chain.set_fullscreen(true)?;
        }

        let rtv_heap = resource_factory::create_descriptor_heap(
            device,
            &DescriptorHeapDesc::new(DescriptorHeapType::RTV, FRAME_BUFFER_COUNT as u32),
        )
        .map_err(|e| GfxError::with_source(GfxErrorKind::SwapChainFailed, "render target view heap", e))?;
        for index in 0..FRAME_BUFFER_COUNT as u32 {
            let back_buffer = resource_factory::adopt_resource::<B>(
                swap_chain.back_buffer(index)?,
                &format!("back buffer {}", index),
                ResourceDesc::texture2d(width, height, DESIRED_FORMAT, 1)
                    .with_flags(ResourceFlags::ALLOW_RENDER_TARGET),
                ResourceStates::PRESENT,
            );
            resource_factory::create_render_target_view(device, &back_buffer, rtv_heap.cpu_handle(index)?)?;
        }

        let dsv_heap = resource_factory::create_descriptor_heap(device, &DescriptorHeapDesc::new(DescriptorHeapType::DSV, 1))
            .map_err(|e| GfxError::with_source(GfxErrorKind::SwapChainFailed, "depth stencil view heap", e))?;
        let depth_buffer = resource_factory::create_committed_resource(
            device,
            &HeapProperties::new(HeapType::DEFAULT),
            HeapFlags::NONE,
            &ResourceDesc::texture2d(width, height, DEPTH_FORMAT, 1).with_flags(ResourceFlags::ALLOW_DEPTH_STENCIL),
            ResourceStates::DEPTH_WRITE,
            Some(&ClearValue::depth_stencil(DEPTH_FORMAT, SCREEN_DEPTH, 0)),
            "depth stencil buffer",
        )
        .map_err(|e| GfxError::with_source(GfxErrorKind::SwapChainFailed, "depth stencil buffer", e))?;
        resource_factory::create_depth_stencil_view(
            device,
            &depth_buffer,
            Some(&DepthStencilViewDesc::texture2d(DEPTH_FORMAT)),
            dsv_heap.cpu_handle(0)?,
        )?;

        let buffer_index = swap_chain.current_back_buffer_index();
        info!(
            "Swap chain ready: {}x{}, {} buffers, fullscreen {}",
            width, height, FRAME_BUFFER_COUNT, fullscreen
        );

        Ok(Self {
            swap_chain,
            rtv_heap,
            dsv_heap,
            depth_buffer,
            width,
            height,
            fullscreen,
            buffer_index,
        })
    }

    pub fn swap_chain(&self) -> &B::SwapChain {
        &self.swap_chain
    }

    pub fn back_buffer(&self, index: u32) -> GfxResult<B::Resource> {
        self.swap_chain.back_buffer(index)
    }

    /// The mirrored index of the buffer the next frame renders into.
    pub fn buffer_index(&self) -> u32 {
        self.buffer_index
    }

    pub fn rtv_heap(&self) -> &DescriptorHeap<B> {
        &self.rtv_heap
    }

    pub fn dsv_heap(&self) -> &DescriptorHeap<B> {
        &self.dsv_heap
    }

    pub fn depth_buffer(&self) -> &CommittedResource<B> {
        &self.depth_buffer
    }

    pub fn rtv_handle(&self, index: u32) -> GfxResult<CpuDescriptorHandle> {
        self.rtv_heap.cpu_handle(index)
    }

    pub fn dsv_handle(&self) -> GfxResult<CpuDescriptorHandle> {
        self.dsv_heap.cpu_handle(0)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_fullscreen(&self) -> bool {
        self.fullscreen
    }

    /// Moves `back_buffer` into the render target state, binds it with the
    /// depth buffer and clears both.
    pub fn set_back_buffer_render(
        &self,
        list: &B::CommandList,
        back_buffer: &B::Resource,
        clear_color: [f32; 4],
    ) -> GfxResult<()> {
        let rtv = self.rtv_handle(self.buffer_index)?;
        let dsv = self.dsv_handle()?;
        list.transition(back_buffer, ResourceStates::PRESENT, ResourceStates::RENDER_TARGET);
        list.set_render_targets(rtv, Some(dsv));
        list.clear_render_target(rtv, clear_color);
        list.clear_depth_stencil(dsv, SCREEN_DEPTH, 0);
        Ok(())
    }

    pub fn set_back_buffer_present(&self, list: &B::CommandList, back_buffer: &B::Resource) {
        list.transition(back_buffer, ResourceStates::RENDER_TARGET, ResourceStates::PRESENT);
    }

    /// Presents and advances the mirrored index.
    pub fn present(&mut self, sync_interval: u32) -> GfxResult<u32> {
        self.swap_chain.present(sync_interval)?;
        self.buffer_index = (self.buffer_index + 1) % FRAME_BUFFER_COUNT as u32;
        let actual = self.swap_chain.current_back_buffer_index();
        if actual != self.buffer_index {
            warn!(
                "Swap chain reports back buffer {} but the mirrored index is {}",
                actual, self.buffer_index
            );
        }
        debug!("Presented, next back buffer {}", self.buffer_index);
        Ok(self.buffer_index)
    }
}

impl<B: Backend> Drop for SwapChainManager<B> {
    fn drop(&mut self) {
        if self.fullscreen {
            if let Err(e) = self.swap_chain.set_fullscreen(false) {
                warn!("Failed to leave fullscreen on shutdown: {}", e);
            }
        }
    }
}
