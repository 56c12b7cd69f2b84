//! Direct3D 11 / Direct3D 12 device, texture, fence and timer wrappers.
//!
//! This crate defines the [`GraphicsDevice`] trait family, a common
//! interface over both Direct3D stacks. Textures and fences created on one
//! device can be exported as a [`ShareableHandle`] and opened on another,
//! including across the two APIs.
//!
//! The timer and command-pool state machines are platform independent; the
//! native backends only build on Windows.

pub mod device;
pub mod pool;
pub mod share;
pub mod timer;

pub use device::{GraphicsDevice, GraphicsFence, GraphicsTexture, GraphicsTimer, Timer};
pub use pool::{CommandBackend, CommandListPool, PoolStats, PooledCommandList};
pub use share::{share_fence, share_texture, translate_format};
pub use timer::{CpuTimer, GpuTimer, TimestampQueries, TimestampReadback};
pub use xr_interop_core::{
    AdapterLuid, Api, DeviceOptions, GenericFormat, HandleKind, InteropError, Result,
    ShareableHandle, TextureDescriptor, UsageFlags,
};

// Platform-specific implementations.

#[cfg(target_os = "windows")]
pub mod adapter;

#[cfg(target_os = "windows")]
mod event;

#[cfg(target_os = "windows")]
pub mod d3d11;

#[cfg(target_os = "windows")]
pub mod d3d12;

#[cfg(target_os = "windows")]
mod factory;

#[cfg(target_os = "windows")]
pub use factory::{create_composition_device, wrap_application_device, ApplicationBinding};
