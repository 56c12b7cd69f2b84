//! D3D12 device wrapper.
//!
//! There is no immediate context: copies are recorded into lists from a
//! [`CommandListPool`] and submitted to the wrapped direct queue.

use std::any::Any;
use std::ffi::c_void;

use tracing::{debug, warn};
use windows::core::Interface;
use windows::Win32::Foundation::HANDLE;
use windows::Win32::Graphics::Direct3D::D3D_FEATURE_LEVEL_11_0;
use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT, DXGI_SAMPLE_DESC};

use xr_interop_core::usage::d3d12 as usage;
use xr_interop_core::{
    ensure_copy_compatible, AdapterLuid, Api, DeviceOptions, InteropError, NativeResultExt,
    Result, ShareableHandle, TextureDescriptor,
};

use super::commands::D3D12CommandBackend;
use super::{D3D12Fence, D3D12Texture, D3D12TimestampQueries};
use crate::adapter;
use crate::device::{downcast_texture, GraphicsDevice, GraphicsFence, GraphicsTexture, GraphicsTimer};
use crate::pool::{CommandListPool, PoolStats};
use crate::timer::GpuTimer;

pub struct D3D12Device {
    device: ID3D12Device,
    queue: ID3D12CommandQueue,
    pool: CommandListPool<D3D12CommandBackend>,
    luid: AdapterLuid,
}

// SAFETY: D3D12 devices and queues are free-threaded, and the pool state is
// behind a mutex.
unsafe impl Send for D3D12Device {}
unsafe impl Sync for D3D12Device {}

impl D3D12Device {
    /// Create a composition device with one direct queue on the adapter
    /// carrying `luid`.
    pub fn create(luid: AdapterLuid, options: &DeviceOptions) -> Result<Self> {
        let adapter = adapter::find_adapter(luid)?;

        if options.debug_layer {
            enable_debug_layer();
        }

        let mut device: Option<ID3D12Device> = None;
        unsafe { D3D12CreateDevice(&adapter, D3D_FEATURE_LEVEL_11_0, &mut device) }
            .native("D3D12CreateDevice")?;
        let device = device.ok_or(InteropError::NullNativePointer)?;

        let queue_desc = D3D12_COMMAND_QUEUE_DESC {
            Type: D3D12_COMMAND_LIST_TYPE_DIRECT,
            ..Default::default()
        };
        let queue: ID3D12CommandQueue = unsafe { device.CreateCommandQueue(&queue_desc) }
            .native("ID3D12Device::CreateCommandQueue")?;

        debug!("D3D12 device created on adapter {luid}");
        Self::new(device, queue)
    }

    /// Wrap an application-owned device and direct queue. New references
    /// are taken on both.
    ///
    /// # Safety
    /// `device` and `queue` must each be null or a live `ID3D12Device` /
    /// `ID3D12CommandQueue`.
    pub unsafe fn wrap(device: *mut c_void, queue: *mut c_void) -> Result<Self> {
        let device = unsafe { ID3D12Device::from_raw_borrowed(&device) }
            .cloned()
            .ok_or(InteropError::NullNativePointer)?;
        let queue = unsafe { ID3D12CommandQueue::from_raw_borrowed(&queue) }
            .cloned()
            .ok_or(InteropError::NullNativePointer)?;
        Self::new(device, queue)
    }

    fn new(device: ID3D12Device, queue: ID3D12CommandQueue) -> Result<Self> {
        let luid = AdapterLuid::from(unsafe { device.GetAdapterLuid() });
        let backend = D3D12CommandBackend::new(device.clone(), queue.clone())?;

        debug!("D3D12 device ready on adapter {luid}");
        Ok(Self {
            device,
            queue,
            pool: CommandListPool::new(backend),
            luid,
        })
    }

    pub fn device(&self) -> &ID3D12Device {
        &self.device
    }

    pub fn queue(&self) -> &ID3D12CommandQueue {
        &self.queue
    }

    /// Counts of pooled copy command lists.
    pub fn command_list_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    fn wrap_resource(
        &self,
        resource: Option<ID3D12Resource>,
        descriptor: Option<TextureDescriptor>,
    ) -> Result<Box<dyn GraphicsTexture>> {
        let resource = resource.ok_or(InteropError::NullNativePointer)?;
        Ok(Box::new(D3D12Texture::new(
            resource,
            self.device.clone(),
            descriptor,
        )))
    }

    fn require_nt(handle: &ShareableHandle) -> Result<HANDLE> {
        if !handle.is_nt_handle() {
            return Err(InteropError::InvalidHandleKind {
                api: Api::D3D12,
                kind: handle.kind(),
            });
        }
        Ok(HANDLE(handle.raw() as *mut c_void))
    }
}

fn enable_debug_layer() {
    let mut debug: Option<ID3D12Debug> = None;
    match unsafe { D3D12GetDebugInterface(&mut debug) } {
        Ok(()) => {
            if let Some(debug) = debug {
                unsafe { debug.EnableDebugLayer() };
                debug!("D3D12 debug layer enabled");
            }
        }
        Err(e) => warn!("D3D12 debug layer unavailable: {e}"),
    }
}

impl Drop for D3D12Device {
    fn drop(&mut self) {
        // Pooled lists may still be referenced by the queue.
        if let Err(e) = self.pool.flush() {
            warn!("Failed to drain D3D12 copy command lists: {e}");
        }
    }
}

impl GraphicsDevice for D3D12Device {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn api(&self) -> Api {
        Api::D3D12
    }

    fn native_device_ptr(&self) -> *mut c_void {
        self.device.as_raw()
    }

    fn native_context_ptr(&self) -> *mut c_void {
        self.queue.as_raw()
    }

    fn adapter_luid(&self) -> AdapterLuid {
        self.luid
    }

    fn create_timer(&self) -> Result<Box<dyn GraphicsTimer>> {
        let queries = D3D12TimestampQueries::new(&self.device, self.queue.clone())?;
        Ok(Box::new(GpuTimer::new(Api::D3D12, queries)))
    }

    fn create_fence(&self, shareable: bool) -> Result<Box<dyn GraphicsFence>> {
        let flags = if shareable {
            D3D12_FENCE_FLAG_SHARED
        } else {
            D3D12_FENCE_FLAG_NONE
        };
        let fence: ID3D12Fence = unsafe { self.device.CreateFence(0, flags) }
            .native("ID3D12Device::CreateFence")?;
        debug!("Created D3D12 fence (shareable: {shareable})");
        Ok(Box::new(D3D12Fence::new(
            fence,
            self.device.clone(),
            self.queue.clone(),
            shareable,
        )))
    }

    fn open_fence(&self, handle: &ShareableHandle) -> Result<Box<dyn GraphicsFence>> {
        let raw = Self::require_nt(handle)?;
        let mut fence: Option<ID3D12Fence> = None;
        unsafe { self.device.OpenSharedHandle(raw, &mut fence) }
            .native("ID3D12Device::OpenSharedHandle")?;
        let fence = fence.ok_or(InteropError::NullNativePointer)?;
        debug!("Opened D3D12 fence from {handle:?}");
        Ok(Box::new(D3D12Fence::new(
            fence,
            self.device.clone(),
            self.queue.clone(),
            false,
        )))
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        shareable: bool,
    ) -> Result<Box<dyn GraphicsTexture>> {
        let desc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_TEXTURE2D,
            Alignment: 0,
            Width: u64::from(descriptor.width),
            Height: descriptor.height,
            DepthOrArraySize: descriptor.array_size as u16,
            MipLevels: descriptor.mip_count as u16,
            Format: DXGI_FORMAT(descriptor.format as i32),
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: descriptor.sample_count,
                Quality: 0,
            },
            Layout: D3D12_TEXTURE_LAYOUT_UNKNOWN,
            Flags: D3D12_RESOURCE_FLAGS(usage::resource_flags(descriptor.usage) as i32),
        };
        let heap_props = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_DEFAULT,
            CreationNodeMask: 1,
            VisibleNodeMask: 1,
            ..Default::default()
        };
        let heap_flags = if shareable {
            D3D12_HEAP_FLAG_SHARED
        } else {
            D3D12_HEAP_FLAG_NONE
        };
        let initial_state = D3D12_RESOURCE_STATES(usage::initial_state(descriptor.usage) as i32);

        let mut resource: Option<ID3D12Resource> = None;
        unsafe {
            self.device.CreateCommittedResource(
                &heap_props,
                heap_flags,
                &desc,
                initial_state,
                None,
                &mut resource,
            )
        }
        .native("ID3D12Device::CreateCommittedResource")?;
        self.wrap_resource(resource, None)
    }

    fn open_texture(
        &self,
        handle: &ShareableHandle,
        descriptor: &TextureDescriptor,
    ) -> Result<Box<dyn GraphicsTexture>> {
        let raw = Self::require_nt(handle)?;
        let mut resource: Option<ID3D12Resource> = None;
        unsafe { self.device.OpenSharedHandle(raw, &mut resource) }
            .native("ID3D12Device::OpenSharedHandle")?;
        debug!("Opened D3D12 texture from {handle:?}");
        self.wrap_resource(resource, Some(*descriptor))
    }

    unsafe fn open_texture_ptr(
        &self,
        native: *mut c_void,
        descriptor: &TextureDescriptor,
    ) -> Result<Box<dyn GraphicsTexture>> {
        let resource = unsafe { ID3D12Resource::from_raw_borrowed(&native) }.cloned();
        self.wrap_resource(resource, Some(*descriptor))
    }

    fn copy_texture(
        &self,
        source: &dyn GraphicsTexture,
        destination: &dyn GraphicsTexture,
    ) -> Result<()> {
        let source = downcast_texture::<D3D12Texture>(Api::D3D12, source)?;
        let destination = downcast_texture::<D3D12Texture>(Api::D3D12, destination)?;
        for texture in [source, destination] {
            if texture.device().as_raw() != self.device.as_raw() {
                return Err(InteropError::DeviceMismatch(Api::D3D12));
            }
        }
        ensure_copy_compatible(source.descriptor(), destination.descriptor())?;

        let list = self.pool.acquire()?;
        unsafe {
            list.list()
                .CopyResource(destination.resource(), source.resource());
        }
        self.pool.submit(list)
    }
}
