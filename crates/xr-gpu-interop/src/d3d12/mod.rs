//! Direct3D 12 backend.

mod commands;
mod device;
mod fence;
mod texture;
mod timer;

pub use commands::{D3D12CommandBackend, D3D12CommandList};
pub use device::D3D12Device;
pub use fence::D3D12Fence;
pub use texture::D3D12Texture;
pub use timer::D3D12TimestampQueries;
