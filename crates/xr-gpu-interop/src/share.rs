//! Cross-device sharing helpers.
//!
//! These pair an export on one device with the matching import on another,
//! which is how the composition device and the application device exchange
//! swapchain images and synchronization.

use tracing::debug;
use xr_interop_core::{format, Api, Result, TextureDescriptor};

use crate::device::{GraphicsDevice, GraphicsFence, GraphicsTexture};

/// Re-express a native format of one API in the vocabulary of another.
pub fn translate_format(from: Api, to: Api, native: i64) -> i64 {
    format::translate(from, to, native)
}

/// Open `texture` (owned by `owner`) on `importer`.
///
/// `descriptor` is the importer-side view of the texture; when `None` the
/// owner's descriptor is used with its format translated to the importer's API.
pub fn share_texture(
    owner: &dyn GraphicsDevice,
    importer: &dyn GraphicsDevice,
    texture: &dyn GraphicsTexture,
    descriptor: Option<&TextureDescriptor>,
) -> Result<Box<dyn GraphicsTexture>> {
    xr_interop_core::ensure_api(owner.api(), texture.api())?;

    let descriptor = match descriptor {
        Some(descriptor) => *descriptor,
        None => {
            let mut descriptor = *texture.descriptor();
            descriptor.format = translate_format(owner.api(), importer.api(), descriptor.format);
            descriptor
        }
    };

    let handle = texture.export_handle()?;
    debug!(
        "Sharing texture {}x{} from {} to {} through a {} handle",
        descriptor.width,
        descriptor.height,
        owner.api(),
        importer.api(),
        handle.kind()
    );
    importer.open_texture(&handle, &descriptor)
}

/// Create a shareable fence on `owner` and open it on `importer`.
///
/// Returns `(owner_fence, importer_fence)`, two views of one timeline.
pub fn share_fence(
    owner: &dyn GraphicsDevice,
    importer: &dyn GraphicsDevice,
) -> Result<(Box<dyn GraphicsFence>, Box<dyn GraphicsFence>)> {
    let fence = owner.create_fence(true)?;
    let handle = fence.export_handle()?;
    debug!("Sharing fence from {} to {}", owner.api(), importer.api());
    let imported = importer.open_fence(&handle)?;
    Ok((fence, imported))
}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::ffi::c_void;

    use xr_interop_core::{
        AdapterLuid, GenericFormat, InteropError, ShareableHandle, UsageFlags,
    };

    use super::*;
    use crate::device::GraphicsTimer;

    struct FakeTexture {
        api: Api,
        descriptor: TextureDescriptor,
        shareable: bool,
    }

    impl GraphicsTexture for FakeTexture {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn api(&self) -> Api {
            self.api
        }

        fn native_texture_ptr(&self) -> *mut c_void {
            std::ptr::null_mut()
        }

        fn export_handle(&self) -> Result<ShareableHandle> {
            xr_interop_core::ensure_shareable(self.shareable)?;
            Ok(ShareableHandle::legacy(0x42, self.api))
        }

        fn descriptor(&self) -> &TextureDescriptor {
            &self.descriptor
        }

        fn is_shareable(&self) -> bool {
            self.shareable
        }
    }

    struct FakeFence {
        api: Api,
        shareable: bool,
    }

    impl GraphicsFence for FakeFence {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn api(&self) -> Api {
            self.api
        }

        fn native_fence_ptr(&self) -> *mut c_void {
            std::ptr::null_mut()
        }

        fn export_handle(&self) -> Result<ShareableHandle> {
            xr_interop_core::ensure_shareable(self.shareable)?;
            Ok(ShareableHandle::legacy(0x7, self.api))
        }

        fn signal(&self, _value: u64) -> Result<()> {
            Ok(())
        }

        fn wait_on_device(&self, _value: u64) -> Result<()> {
            Ok(())
        }

        fn wait_on_cpu(&self, _value: u64) -> Result<()> {
            Ok(())
        }

        fn completed_value(&self) -> u64 {
            0
        }

        fn is_shareable(&self) -> bool {
            self.shareable
        }
    }

    struct FakeDevice(Api);

    impl GraphicsDevice for FakeDevice {
        fn as_any(&self) -> &dyn Any {
            self
        }

        fn api(&self) -> Api {
            self.0
        }

        fn native_device_ptr(&self) -> *mut c_void {
            std::ptr::null_mut()
        }

        fn native_context_ptr(&self) -> *mut c_void {
            std::ptr::null_mut()
        }

        fn adapter_luid(&self) -> AdapterLuid {
            AdapterLuid::default()
        }

        fn create_timer(&self) -> Result<Box<dyn GraphicsTimer>> {
            Err(InteropError::native("CreateQuery", -1))
        }

        fn create_fence(&self, shareable: bool) -> Result<Box<dyn GraphicsFence>> {
            Ok(Box::new(FakeFence { api: self.0, shareable }))
        }

        fn open_fence(&self, handle: &ShareableHandle) -> Result<Box<dyn GraphicsFence>> {
            assert_ne!(handle.origin(), self.0);
            Ok(Box::new(FakeFence { api: self.0, shareable: false }))
        }

        fn create_texture(
            &self,
            descriptor: &TextureDescriptor,
            shareable: bool,
        ) -> Result<Box<dyn GraphicsTexture>> {
            Ok(Box::new(FakeTexture {
                api: self.0,
                descriptor: *descriptor,
                shareable,
            }))
        }

        fn open_texture(
            &self,
            _handle: &ShareableHandle,
            descriptor: &TextureDescriptor,
        ) -> Result<Box<dyn GraphicsTexture>> {
            self.create_texture(descriptor, false)
        }

        unsafe fn open_texture_ptr(
            &self,
            _native: *mut c_void,
            descriptor: &TextureDescriptor,
        ) -> Result<Box<dyn GraphicsTexture>> {
            self.create_texture(descriptor, false)
        }

        fn copy_texture(
            &self,
            _source: &dyn GraphicsTexture,
            _destination: &dyn GraphicsTexture,
        ) -> Result<()> {
            Ok(())
        }
    }

    fn descriptor() -> TextureDescriptor {
        TextureDescriptor::new_2d(
            i64::from(GenericFormat::B8G8R8A8_UNORM_SRGB.0),
            256,
            128,
            UsageFlags::COLOR_ATTACHMENT | UsageFlags::SAMPLED,
        )
    }

    #[test]
    fn shared_texture_inherits_owner_descriptor() {
        let (owner, importer) = (FakeDevice(Api::D3D11), FakeDevice(Api::D3D12));
        let texture = owner.create_texture(&descriptor(), true).unwrap();

        let imported = share_texture(&owner, &importer, texture.as_ref(), None).unwrap();
        assert_eq!(imported.api(), Api::D3D12);
        assert_eq!(*imported.descriptor(), descriptor());
        assert!(!imported.is_shareable());
    }

    #[test]
    fn explicit_descriptor_wins() {
        let (owner, importer) = (FakeDevice(Api::D3D12), FakeDevice(Api::D3D11));
        let texture = owner.create_texture(&descriptor(), true).unwrap();
        let view = descriptor().with_array_size(2);

        let imported = share_texture(&owner, &importer, texture.as_ref(), Some(&view)).unwrap();
        assert_eq!(imported.descriptor().array_size, 2);
    }

    #[test]
    fn unshareable_texture_is_rejected() {
        let (owner, importer) = (FakeDevice(Api::D3D11), FakeDevice(Api::D3D11));
        let texture = owner.create_texture(&descriptor(), false).unwrap();
        let err = share_texture(&owner, &importer, texture.as_ref(), None)
            .err()
            .unwrap();
        assert!(matches!(err, InteropError::NotShareable));
    }

    #[test]
    fn texture_of_another_api_is_rejected() {
        let (owner, importer) = (FakeDevice(Api::D3D11), FakeDevice(Api::D3D12));
        let foreign = importer.create_texture(&descriptor(), true).unwrap();
        let err = share_texture(&owner, &importer, foreign.as_ref(), None)
            .err()
            .unwrap();
        assert!(matches!(
            err,
            InteropError::ApiMismatch { expected: Api::D3D11, actual: Api::D3D12 }
        ));
    }

    #[test]
    fn shared_fence_pair() {
        let (owner, importer) = (FakeDevice(Api::D3D11), FakeDevice(Api::D3D12));
        let (fence, imported) = share_fence(&owner, &importer).unwrap();
        assert!(fence.is_shareable());
        assert_eq!(fence.api(), Api::D3D11);
        assert!(!imported.is_shareable());
        assert_eq!(imported.api(), Api::D3D12);
    }

    #[test]
    fn device_format_translation_defaults() {
        let device = FakeDevice(Api::D3D12);
        let generic = device.translate_to_generic_format(87);
        assert_eq!(generic, GenericFormat::B8G8R8A8_UNORM);
        assert_eq!(device.translate_from_generic_format(generic), 87);
        assert_eq!(translate_format(Api::D3D12, Api::D3D11, 87), 87);
    }
}
