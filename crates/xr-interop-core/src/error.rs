//! Error taxonomy shared by every backend.

use crate::api::Api;
use crate::descriptor::TextureDescriptor;
use crate::handle::HandleKind;
use crate::luid::AdapterLuid;

/// Errors surfaced by the interop layer.
///
/// Every variant is unrecoverable at this level: nothing is retried, and the
/// caller (session or swapchain logic) decides what to tear down.
#[derive(Debug, thiserror::Error)]
pub enum InteropError {
    /// A native allocation, query or submission call failed.
    #[error("{call} failed with HRESULT {code:#010x}")]
    NativeApi { call: &'static str, code: i32 },

    /// Export requested on a resource created without the shareable flag.
    #[error("resource is not shareable")]
    NotShareable,

    /// The handle flavor cannot be imported by the target API.
    #[error("{api} cannot import a {kind} handle")]
    InvalidHandleKind { api: Api, kind: HandleKind },

    /// No adapter in the system carries the requested LUID.
    #[error("no adapter matches LUID {0}")]
    AdapterNotFound(AdapterLuid),

    /// A resource created by another graphics API was handed to a device.
    #[error("expected a {expected} resource, got a {actual} resource")]
    ApiMismatch { expected: Api, actual: Api },

    /// A resource created by another device of the same API was handed to a device.
    #[error("resource belongs to a different {0} device")]
    DeviceMismatch(Api),

    /// A copy between textures whose extents, layers, mips or samples differ.
    #[error("cannot copy a {source_width}x{source_height} texture into a {destination_width}x{destination_height} one")]
    IncompatibleCopy {
        source_width: u32,
        source_height: u32,
        destination_width: u32,
        destination_height: u32,
    },

    /// A null native pointer was passed where a live object was expected.
    #[error("null native pointer")]
    NullNativePointer,
}

pub type Result<T> = std::result::Result<T, InteropError>;

impl InteropError {
    /// Build a [`InteropError::NativeApi`] from a raw result code.
    pub fn native(call: &'static str, code: i32) -> Self {
        Self::NativeApi { call, code }
    }

    /// The native result code, if this error came from a native call.
    pub fn native_code(&self) -> Option<i32> {
        match self {
            Self::NativeApi { code, .. } => Some(*code),
            _ => None,
        }
    }
}

/// Fail with [`InteropError::NotShareable`] unless `shareable` is set.
pub fn ensure_shareable(shareable: bool) -> Result<()> {
    if shareable {
        Ok(())
    } else {
        Err(InteropError::NotShareable)
    }
}

/// Fail with [`InteropError::ApiMismatch`] unless both APIs agree.
pub fn ensure_api(expected: Api, actual: Api) -> Result<()> {
    if expected == actual {
        Ok(())
    } else {
        Err(InteropError::ApiMismatch { expected, actual })
    }
}

/// Fail with [`InteropError::IncompatibleCopy`] unless `source` can be
/// copied into `destination` as a whole resource.
pub fn ensure_copy_compatible(
    source: &TextureDescriptor,
    destination: &TextureDescriptor,
) -> Result<()> {
    if source.copy_compatible(destination) {
        Ok(())
    } else {
        Err(InteropError::IncompatibleCopy {
            source_width: source.width,
            source_height: source.height,
            destination_width: destination.width,
            destination_height: destination.height,
        })
    }
}

#[cfg(target_os = "windows")]
mod windows_impl {
    use super::{InteropError, Result};

    /// Attach the failing call name to a `windows` crate result.
    pub trait NativeResultExt<T> {
        fn native(self, call: &'static str) -> Result<T>;
    }

    impl<T> NativeResultExt<T> for windows::core::Result<T> {
        fn native(self, call: &'static str) -> Result<T> {
            self.map_err(|e| InteropError::native(call, e.code().0))
        }
    }
}

#[cfg(target_os = "windows")]
pub use windows_impl::NativeResultExt;
