//! DXGI adapter enumeration.

use tracing::debug;
use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory1, IDXGIAdapter1, IDXGIFactory1, DXGI_ERROR_NOT_FOUND,
};

use xr_interop_core::{select_adapter, AdapterLuid, NativeResultExt, Result};

/// Every adapter DXGI reports, with its LUID, in enumeration order.
pub fn enumerate_adapters() -> Result<Vec<(AdapterLuid, IDXGIAdapter1)>> {
    let factory: IDXGIFactory1 = unsafe { CreateDXGIFactory1() }.native("CreateDXGIFactory1")?;

    let mut adapters = Vec::new();
    for index in 0.. {
        let adapter = match unsafe { factory.EnumAdapters1(index) } {
            Ok(adapter) => adapter,
            Err(e) if e.code() == DXGI_ERROR_NOT_FOUND => break,
            Err(e) => return Err(xr_interop_core::InteropError::native("EnumAdapters1", e.code().0)),
        };
        let desc = unsafe { adapter.GetDesc1() }.native("GetDesc1")?;
        let luid = AdapterLuid::from(desc.AdapterLuid);
        debug!(
            "Adapter {index}: {} ({luid})",
            String::from_utf16_lossy(&desc.Description)
                .trim_end_matches('\0')
        );
        adapters.push((luid, adapter));
    }
    Ok(adapters)
}

/// The adapter carrying `luid`.
pub fn find_adapter(luid: AdapterLuid) -> Result<IDXGIAdapter1> {
    select_adapter(enumerate_adapters()?, luid)
}
