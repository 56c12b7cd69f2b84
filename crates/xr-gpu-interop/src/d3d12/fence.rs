use std::any::Any;
use std::ffi::c_void;

use tracing::{debug, trace};
use windows::core::{Interface, PCWSTR};
use windows::Win32::Graphics::Direct3D12::{ID3D12CommandQueue, ID3D12Device, ID3D12Fence};

use xr_interop_core::{ensure_shareable, Api, NativeResultExt, Result, ShareableHandle};

use crate::device::GraphicsFence;
use crate::event;

const GENERIC_ALL: u32 = 0x1000_0000;

/// An `ID3D12Fence` signaled and waited on through one command queue.
pub struct D3D12Fence {
    fence: ID3D12Fence,
    device: ID3D12Device,
    queue: ID3D12CommandQueue,
    shareable: bool,
}

// SAFETY: D3D12 fences and queues are free-threaded.
unsafe impl Send for D3D12Fence {}
unsafe impl Sync for D3D12Fence {}

impl D3D12Fence {
    pub(crate) fn new(
        fence: ID3D12Fence,
        device: ID3D12Device,
        queue: ID3D12CommandQueue,
        shareable: bool,
    ) -> Self {
        Self {
            fence,
            device,
            queue,
            shareable,
        }
    }

    pub fn fence(&self) -> &ID3D12Fence {
        &self.fence
    }
}

impl GraphicsFence for D3D12Fence {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn api(&self) -> Api {
        Api::D3D12
    }

    fn native_fence_ptr(&self) -> *mut c_void {
        self.fence.as_raw()
    }

    fn export_handle(&self) -> Result<ShareableHandle> {
        ensure_shareable(self.shareable)?;
        let handle = unsafe {
            self.device
                .CreateSharedHandle(&self.fence, None, GENERIC_ALL, PCWSTR::null())
        }
        .native("ID3D12Device::CreateSharedHandle")?;
        debug!("Exported D3D12 fence as NT handle {:?}", handle.0);
        // SAFETY: CreateSharedHandle returns a fresh handle we now own.
        Ok(unsafe { ShareableHandle::from_nt(handle.0 as usize, Api::D3D12) })
    }

    fn signal(&self, value: u64) -> Result<()> {
        trace!(value, "D3D12 fence signal");
        unsafe { self.queue.Signal(&self.fence, value) }.native("ID3D12CommandQueue::Signal")
    }

    fn wait_on_device(&self, value: u64) -> Result<()> {
        trace!(value, "D3D12 fence device wait");
        unsafe { self.queue.Wait(&self.fence, value) }.native("ID3D12CommandQueue::Wait")
    }

    fn wait_on_cpu(&self, value: u64) -> Result<()> {
        trace!(value, "D3D12 fence host wait");
        self.signal(value)?;
        event::wait_for_value(
            || self.completed_value(),
            value,
            |event| {
                unsafe { self.fence.SetEventOnCompletion(value, event) }
                    .native("ID3D12Fence::SetEventOnCompletion")
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
