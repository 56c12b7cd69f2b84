use std::any::Any;
use std::ffi::c_void;

use tracing::{debug, trace};
use windows::core::{Interface, PCWSTR};
use windows::Win32::Graphics::Direct3D11::{ID3D11DeviceContext4, ID3D11Fence};

use xr_interop_core::{ensure_shareable, Api, NativeResultExt, Result, ShareableHandle};

use crate::device::GraphicsFence;
use crate::event;

const GENERIC_ALL: u32 = 0x1000_0000;

/// An `ID3D11Fence` signaled and waited on through the immediate context.
pub struct D3D11Fence {
    fence: ID3D11Fence,
    context: ID3D11DeviceContext4,
    shareable: bool,
}

// SAFETY: see `D3D11Texture`; the immediate context is never used from two
// threads at once.
unsafe impl Send for D3D11Fence {}

impl D3D11Fence {
    pub(crate) fn new(fence: ID3D11Fence, context: ID3D11DeviceContext4, shareable: bool) -> Self {
        Self {
            fence,
            context,
            shareable,
        }
    }

    pub fn fence(&self) -> &ID3D11Fence {
        &self.fence
    }
}

impl GraphicsFence for D3D11Fence {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn api(&self) -> Api {
        Api::D3D11
    }

    fn native_fence_ptr(&self) -> *mut c_void {
        self.fence.as_raw()
    }

    fn export_handle(&self) -> Result<ShareableHandle> {
        ensure_shareable(self.shareable)?;
        let handle = unsafe { self.fence.CreateSharedHandle(None, GENERIC_ALL, PCWSTR::null()) }
            .native("ID3D11Fence::CreateSharedHandle")?;
        debug!("Exported D3D11 fence as NT handle {:?}", handle.0);
        // SAFETY: CreateSharedHandle returns a fresh handle we now own.
        Ok(unsafe { ShareableHandle::from_nt(handle.0 as usize, Api::D3D11) })
    }

    fn signal(&self, value: u64) -> Result<()> {
        trace!(value, "D3D11 fence signal");
        unsafe {
            self.context
                .Signal(&self.fence, value)
                .native("ID3D11DeviceContext4::Signal")?;
            self.context.Flush();
        }
        Ok(())
    }

    fn wait_on_device(&self, value: u64) -> Result<()> {
        trace!(value, "D3D11 fence device wait");
        unsafe { self.context.Wait(&self.fence, value) }.native("ID3D11DeviceContext4::Wait")
    }

    fn wait_on_cpu(&self, value: u64) -> Result<()> {
        trace!(value, "D3D11 fence host wait");
        self.signal(value)?;
        event::wait_for_value(
            || self.completed_value(),
            value,
            |event| {
                unsafe { self.fence.SetEventOnCompletion(value, event) }
                    .native("ID3D11Fence::SetEventOnCompletion")
            },
        )
    }

    fn completed_value(&self) -> u64 {
        unsafe { self.fence.GetCompletedValue() }
    }

    fn is_shareable(&self) -> bool {
        self.shareable
    }
}
