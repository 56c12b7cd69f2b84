use std::any::Any;
use std::ffi::c_void;

use tracing::debug;
use windows::core::{Interface, PCWSTR};
use windows::Win32::Graphics::Direct3D11::{ID3D11Device, ID3D11Texture2D, D3D11_TEXTURE2D_DESC};
use windows::Win32::Graphics::Dxgi::{IDXGIResource, IDXGIResource1};

use xr_interop_core::usage::d3d11 as usage;
use xr_interop_core::{
    ensure_shareable, Api, HandleKind, NativeResultExt, Result, ShareableHandle, TextureDescriptor,
};

use crate::device::GraphicsTexture;

const GENERIC_ALL: u32 = 0x1000_0000;

/// An `ID3D11Texture2D` with the descriptor it was created or opened with.
pub struct D3D11Texture {
    texture: ID3D11Texture2D,
    device: ID3D11Device,
    descriptor: TextureDescriptor,
    sharing: Option<HandleKind>,
}

// SAFETY: the texture is only touched through the owning device's immediate
// context, which callers use from one thread at a time.
unsafe impl Send for D3D11Texture {}

impl D3D11Texture {
    /// Wrap `texture`. Without a `descriptor`, one is derived from the
    /// native description.
    pub(crate) fn new(
        texture: ID3D11Texture2D,
        device: ID3D11Device,
        descriptor: Option<TextureDescriptor>,
    ) -> Self {
        let mut desc = D3D11_TEXTURE2D_DESC::default();
        unsafe { texture.GetDesc(&mut desc) };
        debug!(
            "D3D11 texture {}x{} array {} mips {} format {} bind {:#x} misc {:#x}",
            desc.Width,
            desc.Height,
            desc.ArraySize,
            desc.MipLevels,
            desc.Format.0,
            desc.BindFlags,
            desc.MiscFlags
        );

        let descriptor = descriptor.unwrap_or_else(|| descriptor_from_desc(&desc));
        Self {
            texture,
            device,
            descriptor,
            sharing: usage::sharing_from_misc_flags(desc.MiscFlags),
        }
    }

    pub fn texture(&self) -> &ID3D11Texture2D {
        &self.texture
    }

    pub(crate) fn device(&self) -> &ID3D11Device {
        &self.device
    }

    /// The flavor `export_handle` produces, if shareable.
    pub fn handle_kind(&self) -> Option<HandleKind> {
        self.sharing
    }
}

pub(crate) fn descriptor_from_desc(desc: &D3D11_TEXTURE2D_DESC) -> TextureDescriptor {
    TextureDescriptor {
        format: i64::from(desc.Format.0),
        width: desc.Width,
        height: desc.Height,
        array_size: desc.ArraySize,
        mip_count: desc.MipLevels,
        sample_count: desc.SampleDesc.Count,
        face_count: 1,
        usage: usage::usage_from_bind_flags(desc.BindFlags),
    }
}

impl GraphicsTexture for D3D11Texture {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn api(&self) -> Api {
        Api::D3D11
    }

    fn native_texture_ptr(&self) -> *mut c_void {
        self.texture.as_raw()
    }

    fn export_handle(&self) -> Result<ShareableHandle> {
        ensure_shareable(self.sharing.is_some())?;

        let handle = match self.sharing {
            Some(HandleKind::Nt) => {
                let resource =
                    self.texture.cast::<IDXGIResource1>().native("QueryInterface(IDXGIResource1)")?;
                let handle = unsafe { resource.CreateSharedHandle(None, GENERIC_ALL, PCWSTR::null()) }
                    .native("IDXGIResource1::CreateSharedHandle")?;
                // SAFETY: CreateSharedHandle returns a fresh handle we now own.
                unsafe { ShareableHandle::from_nt(handle.0 as usize, Api::D3D11) }
            }
            _ => {
                let resource =
                    self.texture.cast::<IDXGIResource>().native("QueryInterface(IDXGIResource)")?;
                let handle =
                    unsafe { resource.GetSharedHandle() }.native("IDXGIResource::GetSharedHandle")?;
                ShareableHandle::legacy(handle.0 as usize, Api::D3D11)
            }
        };
        debug!("Exported D3D11 texture as {handle:?}");
        Ok(handle)
    }

    fn descriptor(&self) -> &TextureDescriptor {
        &self.descriptor
    }

    fn is_shareable(&self) -> bool {
        self.sharing.is_some()
    }
}
