//! Host-side fence waits.

use windows::Win32::Foundation::{CloseHandle, GetLastError, HANDLE, WAIT_OBJECT_0};
use windows::Win32::System::Threading::{CreateEventA, WaitForSingleObject, INFINITE};

use xr_interop_core::{InteropError, NativeResultExt, Result};

/// An auto-reset event, closed on drop.
pub(crate) struct Event(HANDLE);

impl Event {
    pub(crate) fn new() -> Result<Self> {
        let handle = unsafe { CreateEventA(None, false, false, None) }.native("CreateEventA")?;
        Ok(Self(handle))
    }

    pub(crate) fn handle(&self) -> HANDLE {
        self.0
    }

    /// Block until the event is signaled. No timeout.
    pub(crate) fn wait(&self) -> Result<()> {
        wait_on(self.0)
    }
}

impl Drop for Event {
    fn drop(&mut self) {
        if let Err(e) = unsafe { CloseHandle(self.0) } {
            tracing::warn!("CloseHandle on fence event failed: {e}");
        }
    }
}

/// Infinite wait on `handle`. Anything but a signaled object is an error.
fn wait_on(handle: HANDLE) -> Result<()> {
    let status = unsafe { WaitForSingleObject(handle, INFINITE) };
    if status == WAIT_OBJECT_0 {
        return Ok(());
    }
    let code = unsafe { GetLastError() }.to_hresult();
    tracing::error!("WaitForSingleObject returned {:#x} ({:#010x})", status.0, code.0);
    Err(InteropError::native("WaitForSingleObject", code.0))
}

/// Block until a fence reaches `value`, given a way to arm an event on it.
pub(crate) fn wait_for_value(
    completed: impl Fn() -> u64,
    value: u64,
    arm: impl FnOnce(HANDLE) -> Result<()>,
) -> Result<()> {
    if completed() >= value {
        return Ok(());
    }
    let event = Event::new()?;
    arm(event.handle())?;
    event.wait()
}
