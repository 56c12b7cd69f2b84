//! D3D11 device wrapper.
//!
//! Holds the device, its immediate context, and the `Device5`/`Context4`
//! flavors needed for fences and NT handles. All GPU work is issued on the
//! immediate context, so this type is `Send` but not `Sync`.

use std::any::Any;
use std::ffi::c_void;

use tracing::{debug, error, warn};
use windows::core::Interface;
use windows::Win32::Foundation::{HANDLE, HMODULE};
use windows::Win32::Graphics::Direct3D::{D3D_DRIVER_TYPE_UNKNOWN, D3D_FEATURE_LEVEL_11_0};
use windows::Win32::Graphics::Direct3D11::*;
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT, DXGI_SAMPLE_DESC};
use windows::Win32::Graphics::Dxgi::IDXGIDevice;

use xr_interop_core::usage::d3d11 as usage;
use xr_interop_core::{
    ensure_copy_compatible, AdapterLuid, Api, DeviceOptions, HandleKind, InteropError,
    NativeResultExt, Result, ShareableHandle, TextureDescriptor,
};

use super::{D3D11Fence, D3D11Texture, D3D11TimestampQueries};
use crate::adapter;
use crate::device::{downcast_texture, GraphicsDevice, GraphicsFence, GraphicsTexture, GraphicsTimer};
use crate::timer::GpuTimer;

pub struct D3D11Device {
    device: ID3D11Device,
    device5: ID3D11Device5,
    context: ID3D11DeviceContext,
    context4: ID3D11DeviceContext4,
    luid: AdapterLuid,
    options: DeviceOptions,
}

// SAFETY: the immediate context is not free-threaded, so the wrapper is not
// `Sync`; moving it to another thread along with every resource it created
// is fine.
unsafe impl Send for D3D11Device {}

impl D3D11Device {
    /// Create a composition device on the adapter carrying `luid`.
    pub fn create(luid: AdapterLuid, options: &DeviceOptions) -> Result<Self> {
        let adapter = adapter::find_adapter(luid)?;

        let base_flags = D3D11_CREATE_DEVICE_BGRA_SUPPORT;
        let mut attempts = vec![base_flags];
        if options.debug_layer {
            attempts.insert(0, base_flags | D3D11_CREATE_DEVICE_DEBUG);
        }

        let mut last_error = None;
        for flags in attempts {
            let mut device = None;
            let hr = unsafe {
                D3D11CreateDevice(
                    &adapter,
                    D3D_DRIVER_TYPE_UNKNOWN,
                    HMODULE::default(),
                    flags,
                    Some(&[D3D_FEATURE_LEVEL_11_0]),
                    D3D11_SDK_VERSION,
                    Some(&mut device as *mut _),
                    None,
                    None,
                )
            };
            match (hr, device) {
                (Ok(()), Some(device)) => {
                    debug!("D3D11 device created on adapter {luid} with flags {:#x}", flags.0);
                    return Self::new(device, options.clone());
                }
                (Ok(()), None) => last_error = Some(InteropError::NullNativePointer),
                (Err(e), _) => {
                    warn!("D3D11CreateDevice with flags {:#x} failed: {e}", flags.0);
                    last_error = Some(InteropError::native("D3D11CreateDevice", e.code().0));
                }
            }
        }

        error!("Failed to create D3D11 device on adapter {luid}");
        Err(last_error.unwrap_or(InteropError::NullNativePointer))
    }

    /// Wrap an application-owned `ID3D11Device*`. A new reference is taken.
    ///
    /// # Safety
    /// `raw` must be null or a live `ID3D11Device`.
    pub unsafe fn wrap(raw: *mut c_void, options: DeviceOptions) -> Result<Self> {
        let device = unsafe { ID3D11Device::from_raw_borrowed(&raw) }
            .cloned()
            .ok_or(InteropError::NullNativePointer)?;
        Self::new(device, options)
    }

    fn new(device: ID3D11Device, options: DeviceOptions) -> Result<Self> {
        let device5 = device
            .cast::<ID3D11Device5>()
            .native("QueryInterface(ID3D11Device5)")?;
        let context = unsafe { device.GetImmediateContext() }.native("GetImmediateContext")?;
        let context4 = context
            .cast::<ID3D11DeviceContext4>()
            .native("QueryInterface(ID3D11DeviceContext4)")?;
        let luid = adapter_luid(&device)?;

        debug!("D3D11 device ready on adapter {luid}");
        Ok(Self {
            device,
            device5,
            context,
            context4,
            luid,
            options,
        })
    }

    /// Borrow the underlying `ID3D11Device`.
    pub fn device(&self) -> &ID3D11Device {
        &self.device
    }

    /// Borrow the immediate device context.
    pub fn context(&self) -> &ID3D11DeviceContext {
        &self.context
    }

    pub fn options(&self) -> &DeviceOptions {
        &self.options
    }

    fn wrap_texture(
        &self,
        texture: Option<ID3D11Texture2D>,
        descriptor: Option<TextureDescriptor>,
    ) -> Result<Box<dyn GraphicsTexture>> {
        let texture = texture.ok_or(InteropError::NullNativePointer)?;
        Ok(Box::new(D3D11Texture::new(
            texture,
            self.device.clone(),
            descriptor,
        )))
    }
}

fn adapter_luid(device: &ID3D11Device) -> Result<AdapterLuid> {
    let dxgi_device = device
        .cast::<IDXGIDevice>()
        .native("QueryInterface(IDXGIDevice)")?;
    let adapter = unsafe { dxgi_device.GetAdapter() }.native("IDXGIDevice::GetAdapter")?;
    let desc = unsafe { adapter.GetDesc() }.native("IDXGIAdapter::GetDesc")?;
    Ok(desc.AdapterLuid.into())
}

impl GraphicsDevice for D3D11Device {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn api(&self) -> Api {
        Api::D3D11
    }

    fn native_device_ptr(&self) -> *mut c_void {
        self.device.as_raw()
    }

    fn native_context_ptr(&self) -> *mut c_void {
        self.context.as_raw()
    }

    fn adapter_luid(&self) -> AdapterLuid {
        self.luid
    }

    fn create_timer(&self) -> Result<Box<dyn GraphicsTimer>> {
        let queries = D3D11TimestampQueries::new(&self.device, self.context.clone())?;
        Ok(Box::new(GpuTimer::new(Api::D3D11, queries)))
    }

    fn create_fence(&self, shareable: bool) -> Result<Box<dyn GraphicsFence>> {
        let flags = if shareable {
            D3D11_FENCE_FLAG_SHARED
        } else {
            D3D11_FENCE_FLAG_NONE
        };
        let fence: ID3D11Fence =
            unsafe { self.device5.CreateFence(0, flags) }.native("ID3D11Device5::CreateFence")?;
        debug!("Created D3D11 fence (shareable: {shareable})");
        Ok(Box::new(D3D11Fence::new(
            fence,
            self.context4.clone(),
            shareable,
        )))
    }

    fn open_fence(&self, handle: &ShareableHandle) -> Result<Box<dyn GraphicsFence>> {
        if !handle.is_nt_handle() {
            return Err(InteropError::InvalidHandleKind {
                api: Api::D3D11,
                kind: handle.kind(),
            });
        }
        let fence: ID3D11Fence =
            unsafe { self.device5.OpenSharedFence(HANDLE(handle.raw() as *mut c_void)) }
                .native("ID3D11Device5::OpenSharedFence")?;
        debug!("Opened D3D11 fence from {handle:?}");
        Ok(Box::new(D3D11Fence::new(fence, self.context4.clone(), false)))
    }

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        shareable: bool,
    ) -> Result<Box<dyn GraphicsTexture>> {
        let sharing = shareable.then(|| self.options.d3d11_texture_handle_kind());
        let desc = D3D11_TEXTURE2D_DESC {
            Width: descriptor.width,
            Height: descriptor.height,
            MipLevels: descriptor.mip_count,
            ArraySize: descriptor.array_size,
            Format: DXGI_FORMAT(descriptor.format as i32),
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: descriptor.sample_count,
                Quality: 0,
            },
            Usage: D3D11_USAGE_DEFAULT,
            BindFlags: usage::bind_flags(descriptor.usage),
            CPUAccessFlags: 0,
            MiscFlags: usage::misc_flags(sharing),
        };

        let mut texture = None;
        unsafe {
            self.device
                .CreateTexture2D(&desc, None, Some(&mut texture as *mut _))
        }
        .native("CreateTexture2D")?;
        self.wrap_texture(texture, None)
    }

    fn open_texture(
        &self,
        handle: &ShareableHandle,
        descriptor: &TextureDescriptor,
    ) -> Result<Box<dyn GraphicsTexture>> {
        let raw = HANDLE(handle.raw() as *mut c_void);
        let texture = match handle.kind() {
            HandleKind::Legacy => {
                let mut texture: Option<ID3D11Texture2D> = None;
                unsafe { self.device.OpenSharedResource(raw, &mut texture) }
                    .native("ID3D11Device::OpenSharedResource")?;
                texture
            }
            HandleKind::Nt => Some(
                unsafe { self.device5.OpenSharedResource1::<ID3D11Texture2D>(raw) }
                    .native("ID3D11Device1::OpenSharedResource1")?,
            ),
        };
        debug!("Opened D3D11 texture from {handle:?}");
        self.wrap_texture(texture, Some(*descriptor))
    }

    unsafe fn open_texture_ptr(
        &self,
        native: *mut c_void,
        descriptor: &TextureDescriptor,
    ) -> Result<Box<dyn GraphicsTexture>> {
        let texture = unsafe { ID3D11Texture2D::from_raw_borrowed(&native) }.cloned();
        self.wrap_texture(texture, Some(*descriptor))
    }

    fn copy_texture(
        &self,
        source: &dyn GraphicsTexture,
        destination: &dyn GraphicsTexture,
    ) -> Result<()> {
        let source = downcast_texture::<D3D11Texture>(Api::D3D11, source)?;
        let destination = downcast_texture::<D3D11Texture>(Api::D3D11, destination)?;
        for texture in [source, destination] {
            if texture.device().as_raw() != self.device.as_raw() {
                return Err(InteropError::DeviceMismatch(Api::D3D11));
            }
        }
        ensure_copy_compatible(source.descriptor(), destination.descriptor())?;

        unsafe {
            self.context
                .CopyResource(destination.texture(), source.texture());
        }
        Ok(())
    }
}
