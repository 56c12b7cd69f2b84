use std::ffi::c_void;

use windows::Win32::Graphics::Direct3D12::*;
use windows::Win32::Graphics::Dxgi::Common::{DXGI_FORMAT_UNKNOWN, DXGI_SAMPLE_DESC};

use xr_interop_core::{InteropError, NativeResultExt, Result};

use super::commands::{create_command_list, execute, reset_command_list};
use crate::event;
use crate::timer::{TimestampQueries, TimestampReadback};

const QUERY_COUNT: u32 = 2;
const READBACK_SIZE: u64 = QUERY_COUNT as u64 * std::mem::size_of::<u64>() as u64;

/// A two-entry timestamp heap, one command list per stamp, and a readback
/// buffer gated by a private fence.
///
/// D3D12 has no disjoint query, so readbacks are never reported disjoint.
pub struct D3D12TimestampQueries {
    queue: ID3D12CommandQueue,
    allocators: [ID3D12CommandAllocator; 2],
    lists: [ID3D12GraphicsCommandList; 2],
    heap: ID3D12QueryHeap,
    readback: ID3D12Resource,
    fence: ID3D12Fence,
    fence_value: u64,
    /// The fence value each list's last submission retires at.
    retired_at: [u64; 2],
}

// SAFETY: D3D12 objects are free-threaded, and `&mut self` serializes recording.
unsafe impl Send for D3D12TimestampQueries {}

impl D3D12TimestampQueries {
    pub(crate) fn new(device: &ID3D12Device, queue: ID3D12CommandQueue) -> Result<Self> {
        let (begin_allocator, begin_list) = create_command_list(device)?;
        let (end_allocator, end_list) = create_command_list(device)?;
        for list in [&begin_list, &end_list] {
            unsafe { list.Close() }.native("ID3D12GraphicsCommandList::Close")?;
        }

        let fence: ID3D12Fence = unsafe { device.CreateFence(0, D3D12_FENCE_FLAG_NONE) }
            .native("ID3D12Device::CreateFence")?;

        let heap_desc = D3D12_QUERY_HEAP_DESC {
            Type: D3D12_QUERY_HEAP_TYPE_TIMESTAMP,
            Count: QUERY_COUNT,
            NodeMask: 0,
        };
        let mut heap: Option<ID3D12QueryHeap> = None;
        unsafe { device.CreateQueryHeap(&heap_desc, &mut heap) }
            .native("ID3D12Device::CreateQueryHeap")?;

        let heap_props = D3D12_HEAP_PROPERTIES {
            Type: D3D12_HEAP_TYPE_READBACK,
            CreationNodeMask: 1,
            VisibleNodeMask: 1,
            ..Default::default()
        };
        let buffer_desc = D3D12_RESOURCE_DESC {
            Dimension: D3D12_RESOURCE_DIMENSION_BUFFER,
            Alignment: 0,
            Width: READBACK_SIZE,
            Height: 1,
            DepthOrArraySize: 1,
            MipLevels: 1,
            Format: DXGI_FORMAT_UNKNOWN,
            SampleDesc: DXGI_SAMPLE_DESC {
                Count: 1,
                Quality: 0,
            },
            Layout: D3D12_TEXTURE_LAYOUT_ROW_MAJOR,
            Flags: D3D12_RESOURCE_FLAG_NONE,
        };
        let mut readback: Option<ID3D12Resource> = None;
        unsafe {
            device.CreateCommittedResource(
                &heap_props,
                D3D12_HEAP_FLAG_NONE,
                &buffer_desc,
                D3D12_RESOURCE_STATE_COPY_DEST,
                None,
                &mut readback,
            )
        }
        .native("ID3D12Device::CreateCommittedResource")?;

        Ok(Self {
            queue,
            allocators: [begin_allocator, end_allocator],
            lists: [begin_list, end_list],
            heap: heap.ok_or(InteropError::NullNativePointer)?,
            readback: readback.ok_or(InteropError::NullNativePointer)?,
            fence,
            fence_value: 0,
            retired_at: [0; 2],
        })
    }

    /// Block until the list at `index` has left the GPU, so its allocator
    /// can be reset.
    fn wait_retired(&self, index: usize) -> Result<()> {
        let value = self.retired_at[index];
        event::wait_for_value(
            || unsafe { self.fence.GetCompletedValue() },
            value,
            |event| {
                unsafe { self.fence.SetEventOnCompletion(value, event) }
                    .native("ID3D12Fence::SetEventOnCompletion")
            },
        )
    }

    fn record(&mut self, index: usize, resolve: bool) -> Result<()> {
        self.wait_retired(index)?;
        let (allocator, list) = (&self.allocators[index], &self.lists[index]);
        reset_command_list(allocator, list)?;
        unsafe {
            list.EndQuery(&self.heap, D3D12_QUERY_TYPE_TIMESTAMP, index as u32);
            if resolve {
                list.ResolveQueryData(
                    &self.heap,
                    D3D12_QUERY_TYPE_TIMESTAMP,
                    0,
                    QUERY_COUNT,
                    &self.readback,
                    0,
                );
            }
        }
        execute(&self.queue, list)?;

        self.fence_value += 1;
        self.retired_at[index] = self.fence_value;
        unsafe { self.queue.Signal(&self.fence, self.fence_value) }
            .native("ID3D12CommandQueue::Signal")
    }
}

impl TimestampQueries for D3D12TimestampQueries {
    fn begin(&mut self) -> Result<()> {
        self.record(0, false)
    }

    fn end(&mut self) -> Result<()> {
        self.record(1, true)
    }

    fn read(&mut self) -> Result<Option<TimestampReadback>> {
        if unsafe { self.fence.GetCompletedValue() } < self.retired_at[1] {
            return Ok(None);
        }
        let frequency = unsafe { self.queue.GetTimestampFrequency() }
            .native("ID3D12CommandQueue::GetTimestampFrequency")?;

        let range = D3D12_RANGE {
            Begin: 0,
            End: READBACK_SIZE as usize,
        };
        let mut mapped: *mut c_void = std::ptr::null_mut();
        unsafe { self.readback.Map(0, Some(&range), Some(&mut mapped)) }
            .native("ID3D12Resource::Map")?;
        if mapped.is_null() {
            return Err(InteropError::NullNativePointer);
        }
        // SAFETY: the buffer holds `QUERY_COUNT` resolved u64 stamps and the
        // fence guarantees the resolve has finished.
        let (start, end) = unsafe {
            let stamps = mapped as *const u64;
            (stamps.read(), stamps.add(1).read())
        };
        let written = D3D12_RANGE { Begin: 0, End: 0 };
        unsafe { self.readback.Unmap(0, Some(&written)) };

        Ok(Some(TimestampReadback {
            start,
            end,
            frequency,
            disjoint: false,
        }))
    }
}
