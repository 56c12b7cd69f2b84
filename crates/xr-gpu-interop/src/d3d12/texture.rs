use std::any::Any;
use std::ffi::c_void;

use tracing::debug;
use windows::core::{Interface, PCWSTR};
use windows::Win32::Graphics::Direct3D12::{
    ID3D12Device, ID3D12Resource, D3D12_HEAP_FLAGS, D3D12_RESOURCE_DESC,
};

use xr_interop_core::usage::d3d12 as usage;
use xr_interop_core::{
    ensure_shareable, Api, NativeResultExt, Result, ShareableHandle, TextureDescriptor,
};

use crate::device::GraphicsTexture;

const GENERIC_ALL: u32 = 0x1000_0000;

/// An `ID3D12Resource` texture with the descriptor it was created or opened with.
pub struct D3D12Texture {
    resource: ID3D12Resource,
    device: ID3D12Device,
    descriptor: TextureDescriptor,
    shareable: bool,
}

// SAFETY: D3D12 resources are free-threaded.
unsafe impl Send for D3D12Texture {}
unsafe impl Sync for D3D12Texture {}

impl D3D12Texture {
    /// Wrap `resource`. Without a `descriptor`, one is derived from the
    /// native description.
    pub(crate) fn new(
        resource: ID3D12Resource,
        device: ID3D12Device,
        descriptor: Option<TextureDescriptor>,
    ) -> Self {
        let desc = unsafe { resource.GetDesc() };
        debug!(
            "D3D12 texture {}x{} array {} mips {} format {} flags {:#x}",
            desc.Width,
            desc.Height,
            desc.DepthOrArraySize,
            desc.MipLevels,
            desc.Format.0,
            desc.Flags.0
        );

        // Placed and reserved resources have no heap of their own to share.
        let mut heap_flags = D3D12_HEAP_FLAGS::default();
        let shareable = match unsafe { resource.GetHeapProperties(None, Some(&mut heap_flags)) } {
            Ok(()) => heap_flags.0 as u32 & usage::HEAP_FLAG_SHARED != 0,
            Err(e) => {
                debug!("GetHeapProperties failed, treating texture as unshareable: {e}");
                false
            }
        };

        Self {
            resource,
            device,
            descriptor: descriptor.unwrap_or_else(|| descriptor_from_desc(&desc)),
            shareable,
        }
    }

    pub fn resource(&self) -> &ID3D12Resource {
        &self.resource
    }

    pub(crate) fn device(&self) -> &ID3D12Device {
        &self.device
    }
}

pub(crate) fn descriptor_from_desc(desc: &D3D12_RESOURCE_DESC) -> TextureDescriptor {
    TextureDescriptor {
        format: i64::from(desc.Format.0),
        width: desc.Width as u32,
        height: desc.Height,
        array_size: u32::from(desc.DepthOrArraySize),
        mip_count: u32::from(desc.MipLevels),
        sample_count: desc.SampleDesc.Count,
        face_count: 1,
        usage: usage::usage_from_resource_flags(desc.Flags.0 as u32),
    }
}

impl GraphicsTexture for D3D12Texture {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn api(&self) -> Api {
        Api::D3D12
    }

    fn native_texture_ptr(&self) -> *mut c_void {
        self.resource.as_raw()
    }

    fn export_handle(&self) -> Result<ShareableHandle> {
        ensure_shareable(self.shareable)?;
        let handle = unsafe {
            self.device
                .CreateSharedHandle(&self.resource, None, GENERIC_ALL, PCWSTR::null())
        }
        .native("ID3D12Device::CreateSharedHandle")?;
        debug!("Exported D3D12 texture as NT handle {:?}", handle.0);
        // SAFETY: CreateSharedHandle returns a fresh handle we now own.
        Ok(unsafe { ShareableHandle::from_nt(handle.0 as usize, Api::D3D12) })
    }

    fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    fn is_shareable(&self) -> bool {
        self.shareable
    }
}
