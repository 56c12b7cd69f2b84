//! Device construction entry points.

use std::ffi::c_void;

use tracing::info;
use xr_interop_core::{AdapterLuid, Api, DeviceOptions, Result};

use crate::d3d11::D3D11Device;
use crate::d3d12::D3D12Device;
use crate::device::GraphicsDevice;

/// The native objects an application handed to the runtime at session
/// creation (`XrGraphicsBindingD3D11KHR` / `XrGraphicsBindingD3D12KHR`).
#[derive(Debug, Clone, Copy)]
pub enum ApplicationBinding {
    D3D11 {
        device: *mut c_void,
    },
    D3D12 {
        device: *mut c_void,
        queue: *mut c_void,
    },
}

impl ApplicationBinding {
    pub fn api(&self) -> Api {
        match self {
            ApplicationBinding::D3D11 { .. } => Api::D3D11,
            ApplicationBinding::D3D12 { .. } => Api::D3D12,
        }
    }
}

/// Create a device of `api` on the adapter carrying `luid`.
pub fn create_composition_device(
    api: Api,
    luid: AdapterLuid,
    options: &DeviceOptions,
) -> Result<Box<dyn GraphicsDevice>> {
    info!("Creating {api} composition device on adapter {luid}");
    Ok(match api {
        Api::D3D11 => Box::new(D3D11Device::create(luid, options)?),
        Api::D3D12 => Box::new(D3D12Device::create(luid, options)?),
    })
}

/// Wrap the application's own device.
///
/// # Safety
/// The pointers in `binding` must be null or live objects of the named
/// interfaces.
pub unsafe fn wrap_application_device(
    binding: &ApplicationBinding,
    options: &DeviceOptions,
) -> Result<Box<dyn GraphicsDevice>> {
    info!("Wrapping {} application device", binding.api());
    Ok(match *binding {
        ApplicationBinding::D3D11 { device } => {
            Box::new(unsafe { D3D11Device::wrap(device, options.clone()) }?)
        }
        ApplicationBinding::D3D12 { device, queue } => {
            Box::new(unsafe { D3D12Device::wrap(device, queue) }?)
        }
    })
}
