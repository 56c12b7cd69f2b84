//! Exported resource handles.

use std::fmt;

use crate::api::Api;

/// The flavor of an exported handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandleKind {
    /// A kernel object handle. It must be closed once, by its owner.
    Nt,
    /// A process-global DXGI token. It is never closed.
    Legacy,
}

impl fmt::Display for HandleKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HandleKind::Nt => f.write_str("NT"),
            HandleKind::Legacy => f.write_str("legacy"),
        }
    }
}

/// An owned NT handle, closed on drop.
struct NtHandle(usize);

impl Drop for NtHandle {
    fn drop(&mut self) {
        close_nt_handle(self.0);
    }
}

#[cfg(target_os = "windows")]
fn close_nt_handle(raw: usize) {
    use windows::Win32::Foundation::{CloseHandle, HANDLE};

    if raw == 0 {
        return;
    }
    // SAFETY: `NtHandle` is only built from a handle the caller handed over
    // ownership of, and it is closed exactly once here.
    if let Err(e) = unsafe { CloseHandle(HANDLE(raw as *mut std::ffi::c_void)) } {
        tracing::warn!("CloseHandle({raw:#x}) failed: {e}");
    }
}

#[cfg(not(target_os = "windows"))]
fn close_nt_handle(_raw: usize) {}

enum HandleValue {
    Nt(NtHandle),
    Legacy(usize),
}

/// A handle another device can open to reach the same memory or fence.
///
/// NT handles are owned: dropping the value closes the handle. Legacy handles
/// are plain tokens and need no cleanup. A `ShareableHandle` cannot be cloned,
/// so an NT handle is closed exactly once.
pub struct ShareableHandle {
    value: HandleValue,
    origin: Api,
}

impl ShareableHandle {
    /// Take ownership of an NT handle exported by `origin`.
    ///
    /// # Safety
    /// `raw` must be a valid NT handle that nothing else will close.
    pub unsafe fn from_nt(raw: usize, origin: Api) -> Self {
        Self {
            value: HandleValue::Nt(NtHandle(raw)),
            origin,
        }
    }

    /// Wrap a legacy shared handle exported by `origin`.
    pub fn legacy(raw: usize, origin: Api) -> Self {
        Self {
            value: HandleValue::Legacy(raw),
            origin,
        }
    }

    pub fn is_nt_handle(&self) -> bool {
        matches!(self.value, HandleValue::Nt(_))
    }

    pub fn kind(&self) -> HandleKind {
        match self.value {
            HandleValue::Nt(_) => HandleKind::Nt,
            HandleValue::Legacy(_) => HandleKind::Legacy,
        }
    }

    /// The raw handle value. Ownership stays with `self`.
    pub fn raw(&self) -> usize {
        match &self.value {
            HandleValue::Nt(h) => h.0,
            HandleValue::Legacy(raw) => *raw,
        }
    }

    /// The API that exported this handle.
    pub fn origin(&self) -> Api {
        self.origin
    }

    /// Release ownership of the raw value. An NT handle is no longer closed
    /// by this wrapper and must be closed by the caller.
    pub fn into_raw(self) -> usize {
        match self.value {
            HandleValue::Nt(h) => {
                let raw = h.0;
                std::mem::forget(h);
                raw
            }
            HandleValue::Legacy(raw) => raw,
        }
    }
}

impl fmt::Debug for ShareableHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShareableHandle")
            .field("kind", &self.kind())
            .field("raw", &format_args!("{:#x}", self.raw()))
            .field("origin", &self.origin)
            .finish()
    }
}
