//! Capability traits implemented by every backend.
//!
//! A device hands out boxed textures, fences and timers. Callers that need
//! the concrete backend type (for native escape hatches beyond raw pointers)
//! downcast through `as_any()`.

use std::any::Any;
use std::ffi::c_void;

use xr_interop_core::{
    format, AdapterLuid, Api, GenericFormat, Result, ShareableHandle, TextureDescriptor,
};

/// A start/stop timer reporting elapsed microseconds.
///
/// `query` mutates the timer: it consumes the measurement taken by the last
/// `start`/`stop` pair, so a second `query` without a new pair returns 0.
pub trait Timer {
    fn start(&mut self) -> Result<()>;
    fn stop(&mut self) -> Result<()>;
    fn query(&mut self) -> u64;
}

/// A timer measuring GPU execution time on a device's queue.
pub trait GraphicsTimer: Timer + Send {
    fn api(&self) -> Api;
}

/// A monotonic GPU fence. Values are chosen by the caller.
pub trait GraphicsFence: Send {
    fn as_any(&self) -> &dyn Any;

    fn api(&self) -> Api;

    fn native_fence_ptr(&self) -> *mut c_void;

    /// Export an NT handle another device can open.
    fn export_handle(&self) -> Result<ShareableHandle>;

    /// Enqueue a signal of `value` on the owning queue.
    fn signal(&self, value: u64) -> Result<()>;

    /// Make the owning queue wait until the fence reaches `value`. Never blocks.
    fn wait_on_device(&self, value: u64) -> Result<()>;

    /// Signal `value` from the owning queue and block the calling thread
    /// until the fence reaches it. There is no timeout.
    fn wait_on_cpu(&self, value: u64) -> Result<()>;

    fn completed_value(&self) -> u64;

    fn is_shareable(&self) -> bool;
}

/// A 2D texture (or texture array) owned by one device.
pub trait GraphicsTexture: Send {
    fn as_any(&self) -> &dyn Any;

    fn api(&self) -> Api;

    fn native_texture_ptr(&self) -> *mut c_void;

    /// Export a handle another device can open.
    fn export_handle(&self) -> Result<ShareableHandle>;

    /// The descriptor fixed when this wrapper was built.
    fn descriptor(&self) -> &TextureDescriptor;

    fn is_shareable(&self) -> bool;
}

/// A device wrapper: resource factory, copy engine and adapter identity.
pub trait GraphicsDevice: Send {
    fn as_any(&self) -> &dyn Any;

    fn api(&self) -> Api;

    /// `ID3D11Device*` or `ID3D12Device*`.
    fn native_device_ptr(&self) -> *mut c_void;

    /// `ID3D11DeviceContext*` or `ID3D12CommandQueue*`.
    fn native_context_ptr(&self) -> *mut c_void;

    fn adapter_luid(&self) -> AdapterLuid;

    fn create_timer(&self) -> Result<Box<dyn GraphicsTimer>>;

    fn create_fence(&self, shareable: bool) -> Result<Box<dyn GraphicsFence>>;

    /// Open a fence exported by another device. The result is not shareable.
    fn open_fence(&self, handle: &ShareableHandle) -> Result<Box<dyn GraphicsFence>>;

    fn create_texture(
        &self,
        descriptor: &TextureDescriptor,
        shareable: bool,
    ) -> Result<Box<dyn GraphicsTexture>>;

    /// Open a texture exported by another device.
    ///
    /// `descriptor` is stored as given; it is not checked against the
    /// imported resource.
    fn open_texture(
        &self,
        handle: &ShareableHandle,
        descriptor: &TextureDescriptor,
    ) -> Result<Box<dyn GraphicsTexture>>;

    /// Wrap a texture the caller already owns. The wrapper takes its own
    /// reference; nothing is allocated.
    ///
    /// # Safety
    /// `native` must be null or point to a live `ID3D11Texture2D` /
    /// `ID3D12Resource` of this device's API.
    unsafe fn open_texture_ptr(
        &self,
        native: *mut c_void,
        descriptor: &TextureDescriptor,
    ) -> Result<Box<dyn GraphicsTexture>>;

    /// Copy all of `source` into `destination`. Both must belong to this device.
    ///
    /// The copy is queued, not awaited. Use a fence to observe completion.
    fn copy_texture(
        &self,
        source: &dyn GraphicsTexture,
        destination: &dyn GraphicsTexture,
    ) -> Result<()>;

    fn translate_to_generic_format(&self, native: i64) -> GenericFormat {
        format::to_generic(self.api(), native)
    }

    fn translate_from_generic_format(&self, generic: GenericFormat) -> i64 {
        format::from_generic(self.api(), generic)
    }
}

/// Downcast a texture to the concrete backend type `T`, reporting which API
/// it actually belongs to on failure.
#[cfg_attr(not(target_os = "windows"), allow(dead_code))]
pub(crate) fn downcast_texture<T: 'static>(
    api: Api,
    texture: &dyn GraphicsTexture,
) -> Result<&T> {
    xr_interop_core::ensure_api(api, texture.api())?;
    texture
        .as_any()
        .downcast_ref::<T>()
        .ok_or(xr_interop_core::InteropError::DeviceMismatch(api))
}
