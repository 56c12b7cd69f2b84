//! Direct3D 11 backend.
//!
//! Everything runs on the device's immediate context: copies are issued
//! directly, fence signals are followed by a flush, and timers use the
//! disjoint/timestamp query triple.

mod device;
mod fence;
mod texture;
mod timer;

pub use device::D3D11Device;
pub use fence::D3D11Fence;
pub use texture::D3D11Texture;
pub use timer::D3D11TimestampQueries;
