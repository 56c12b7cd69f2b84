//! API-neutral vocabulary for Direct3D interop.
//!
//! Everything here is plain data and pure translation: formats, usage flags,
//! texture descriptors, exported handles, adapter identity and the error
//! taxonomy. The devices that act on it live in `xr-gpu-interop`.

pub mod api;
pub mod descriptor;
pub mod error;
pub mod format;
pub mod handle;
pub mod logging;
pub mod luid;
pub mod options;
pub mod usage;

pub use api::Api;
pub use descriptor::TextureDescriptor;
pub use error::{ensure_api, ensure_copy_compatible, ensure_shareable, InteropError, Result};
pub use format::GenericFormat;
pub use handle::{HandleKind, ShareableHandle};
pub use luid::{select_adapter, AdapterLuid};
pub use options::DeviceOptions;
pub use usage::UsageFlags;

#[cfg(target_os = "windows")]
pub use error::NativeResultExt;
