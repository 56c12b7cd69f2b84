use windows::core::Interface;
use windows::Win32::Graphics::Direct3D12::*;

use xr_interop_core::{NativeResultExt, Result};

use crate::event;
use crate::pool::CommandBackend;

/// One allocator and the direct command list recording into it.
pub struct D3D12CommandList {
    allocator: ID3D12CommandAllocator,
    list: ID3D12GraphicsCommandList,
}

// SAFETY: D3D12 objects are free-threaded; the pool hands each list to one
// thread at a time.
unsafe impl Send for D3D12CommandList {}

impl D3D12CommandList {
    pub fn list(&self) -> &ID3D12GraphicsCommandList {
        &self.list
    }
}

/// Creates, resets and submits direct command lists on one queue, and owns
/// the fence that gates their reuse.
pub struct D3D12CommandBackend {
    device: ID3D12Device,
    queue: ID3D12CommandQueue,
    fence: ID3D12Fence,
}

// SAFETY: D3D12 devices, queues and fences are free-threaded.
unsafe impl Send for D3D12CommandBackend {}
unsafe impl Sync for D3D12CommandBackend {}

impl D3D12CommandBackend {
    pub(crate) fn new(device: ID3D12Device, queue: ID3D12CommandQueue) -> Result<Self> {
        let fence: ID3D12Fence = unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) }
            .native("ID3D12Device::CreateFence")?;
        Ok(Self {
            device,
            queue,
            fence,
        })
    }
}

/// Close `list` and hand it to `queue`.
pub(crate) fn execute(queue: &ID3D12CommandQueue, list: &ID3D12GraphicsCommandList) -> Result<()> {
    unsafe {
        list.Close().native("ID3D12GraphicsCommandList::Close")?;
        let lists = [Some(
            list.cast::<ID3D12CommandList>()
                .native("QueryInterface(ID3D12CommandList)")?,
        )];
        queue.ExecuteCommandLists(&lists);
    }
    Ok(())
}

/// A new allocator with a list open for recording into it.
pub(crate) fn create_command_list(
    device: &ID3D12Device,
) -> Result<(ID3D12CommandAllocator, ID3D12GraphicsCommandList)> {
    let allocator: ID3D12CommandAllocator =
        unsafe { device.CreateCommandAllocator(D3D12_COMMAND_LIST_TYPE_DIRECT) }
            .native("ID3D12Device::CreateCommandAllocator")?;
    let list: ID3D12GraphicsCommandList = unsafe {
        device.CreateCommandList(0, D3D12_COMMAND_LIST_TYPE_DIRECT, &allocator, None)
    }
    .native("ID3D12Device::CreateCommandList")?;
    Ok((allocator, list))
}

/// Reset an idle allocator and reopen its list.
pub(crate) fn reset_command_list(
    allocator: &ID3D12CommandAllocator,
    list: &ID3D12GraphicsCommandList,
) -> Result<()> {
    unsafe {
        allocator
            .Reset()
            .native("ID3D12CommandAllocator::Reset")?;
        list.Reset(allocator, None)
            .native("ID3D12GraphicsCommandList::Reset")
    }
}

impl CommandBackend for D3D12CommandBackend {
    type List = D3D12CommandList;

    fn allocate(&self) -> Result<D3D12CommandList> {
        let (allocator, list) = create_command_list(&self.device)?;
        Ok(D3D12CommandList { allocator, list })
    }

    fn reset(&self, list: &D3D12CommandList) -> Result<()> {
        reset_command_list(&list.allocator, &list.list)
    }

    fn execute(&self, list: &D3D12CommandList) -> Result<()> {
        execute(&self.queue, &list.list)
    }

    fn signal(&self, value: u64) -> Result<()> {
        unsafe { self.queue.Signal(&self.fence, value) }.native("ID3D12CommandQueue::Signal")
    }

    fn completed_value(&self) -> u64 {
        unsafe { self.fence.GetCompletedValue() }
    }

    fn wait(&self, value: u64) -> Result<()> {
        event::wait_for_value(
            || self.completed_value(),
            value,
            |event| {
                unsafe { self.fence.SetEventOnCompletion(value, event) }
                    .native("ID3D12Fence::SetEventOnCompletion")
            },
        )
    }

    fn discard(&self, list: &D3D12CommandList) -> Result<()> {
        unsafe { list.list.Close() }.native("ID3D12GraphicsCommandList::Close")
    }
}
