//! Usage flags and their per-API binding translations.
//!
//! The two Direct3D stacks encode "can be sampled" with opposite polarity:
//! D3D11 sets an allow bit (`D3D11_BIND_SHADER_RESOURCE`), D3D12 clears a deny
//! bit (`D3D12_RESOURCE_FLAG_DENY_SHADER_RESOURCE`). Each API therefore has its
//! own table instead of a shared one.

use crate::handle::HandleKind;

bitflags::bitflags! {
    /// Swapchain image usage, using the `XrSwapchainUsageFlags` bit values.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct UsageFlags: u64 {
        const COLOR_ATTACHMENT = 0x0000_0001;
        const DEPTH_STENCIL_ATTACHMENT = 0x0000_0002;
        const UNORDERED_ACCESS = 0x0000_0004;
        const SAMPLED = 0x0000_0020;
    }
}

/// Direct3D 11 bind and misc flags.
pub mod d3d11 {
    use super::{HandleKind, UsageFlags};

    pub const BIND_SHADER_RESOURCE: u32 = 0x8;
    pub const BIND_RENDER_TARGET: u32 = 0x20;
    pub const BIND_DEPTH_STENCIL: u32 = 0x40;
    pub const BIND_UNORDERED_ACCESS: u32 = 0x80;

    pub const RESOURCE_MISC_SHARED: u32 = 0x2;
    pub const RESOURCE_MISC_SHARED_NTHANDLE: u32 = 0x800;

    const TABLE: [(UsageFlags, u32); 4] = [
        (UsageFlags::COLOR_ATTACHMENT, BIND_RENDER_TARGET),
        (UsageFlags::DEPTH_STENCIL_ATTACHMENT, BIND_DEPTH_STENCIL),
        (UsageFlags::SAMPLED, BIND_SHADER_RESOURCE),
        (UsageFlags::UNORDERED_ACCESS, BIND_UNORDERED_ACCESS),
    ];

    /// `D3D11_TEXTURE2D_DESC::BindFlags` for a usage.
    pub fn bind_flags(usage: UsageFlags) -> u32 {
        TABLE
            .iter()
            .filter(|(flag, _)| usage.contains(*flag))
            .fold(0, |bits, (_, bind)| bits | bind)
    }

    /// Usage recovered from `D3D11_TEXTURE2D_DESC::BindFlags`.
    pub fn usage_from_bind_flags(bits: u32) -> UsageFlags {
        TABLE
            .iter()
            .filter(|(_, bind)| bits & bind != 0)
            .fold(UsageFlags::empty(), |usage, (flag, _)| usage | *flag)
    }

    /// Every usage bit has a D3D11 bind flag.
    pub fn representable(usage: UsageFlags) -> UsageFlags {
        usage
    }

    /// `D3D11_TEXTURE2D_DESC::MiscFlags` for a texture, shared or not.
    pub fn misc_flags(sharing: Option<HandleKind>) -> u32 {
        match sharing {
            None => 0,
            Some(HandleKind::Legacy) => RESOURCE_MISC_SHARED,
            Some(HandleKind::Nt) => RESOURCE_MISC_SHARED | RESOURCE_MISC_SHARED_NTHANDLE,
        }
    }

    /// How a texture with these misc flags exports itself, if at all.
    pub fn sharing_from_misc_flags(bits: u32) -> Option<HandleKind> {
        if bits & RESOURCE_MISC_SHARED == 0 {
            None
        } else if bits & RESOURCE_MISC_SHARED_NTHANDLE != 0 {
            Some(HandleKind::Nt)
        } else {
            Some(HandleKind::Legacy)
        }
    }
}

/// Direct3D 12 resource flags, heap flags and states.
pub mod d3d12 {
    use super::UsageFlags;

    pub const RESOURCE_FLAG_ALLOW_RENDER_TARGET: u32 = 0x1;
    pub const RESOURCE_FLAG_ALLOW_DEPTH_STENCIL: u32 = 0x2;
    pub const RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS: u32 = 0x4;
    pub const RESOURCE_FLAG_DENY_SHADER_RESOURCE: u32 = 0x8;

    pub const HEAP_FLAG_SHARED: u32 = 0x1;

    pub const RESOURCE_STATE_COMMON: u32 = 0x0;
    pub const RESOURCE_STATE_RENDER_TARGET: u32 = 0x4;
    pub const RESOURCE_STATE_DEPTH_WRITE: u32 = 0x10;

    /// `D3D12_RESOURCE_DESC::Flags` for a usage.
    ///
    /// D3D12 only accepts the deny-shader-resource bit on depth-stencil
    /// resources, so a color texture is always sampleable.
    pub fn resource_flags(usage: UsageFlags) -> u32 {
        let mut bits = 0;
        if usage.contains(UsageFlags::COLOR_ATTACHMENT) {
            bits |= RESOURCE_FLAG_ALLOW_RENDER_TARGET;
        }
        if usage.contains(UsageFlags::DEPTH_STENCIL_ATTACHMENT) {
            bits |= RESOURCE_FLAG_ALLOW_DEPTH_STENCIL;
            if !usage.contains(UsageFlags::SAMPLED) {
                bits |= RESOURCE_FLAG_DENY_SHADER_RESOURCE;
            }
        }
        if usage.contains(UsageFlags::UNORDERED_ACCESS) {
            bits |= RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS;
        }
        bits
    }

    /// Usage recovered from `D3D12_RESOURCE_DESC::Flags`.
    pub fn usage_from_resource_flags(bits: u32) -> UsageFlags {
        let mut usage = UsageFlags::empty();
        if bits & RESOURCE_FLAG_ALLOW_RENDER_TARGET != 0 {
            usage |= UsageFlags::COLOR_ATTACHMENT;
        }
        if bits & RESOURCE_FLAG_ALLOW_DEPTH_STENCIL != 0 {
            usage |= UsageFlags::DEPTH_STENCIL_ATTACHMENT;
        }
        if bits & RESOURCE_FLAG_DENY_SHADER_RESOURCE == 0 {
            usage |= UsageFlags::SAMPLED;
        }
        if bits & RESOURCE_FLAG_ALLOW_UNORDERED_ACCESS != 0 {
            usage |= UsageFlags::UNORDERED_ACCESS;
        }
        usage
    }

    /// The usage a D3D12 resource created for `usage` reports back.
    pub fn representable(usage: UsageFlags) -> UsageFlags {
        if usage.contains(UsageFlags::DEPTH_STENCIL_ATTACHMENT) {
            usage
        } else {
            usage | UsageFlags::SAMPLED
        }
    }

    /// Initial `D3D12_RESOURCE_STATES` for a freshly created texture.
    pub fn initial_state(usage: UsageFlags) -> u32 {
        if usage.contains(UsageFlags::DEPTH_STENCIL_ATTACHMENT) {
            RESOURCE_STATE_DEPTH_WRITE
        } else if usage.contains(UsageFlags::COLOR_ATTACHMENT) {
            RESOURCE_STATE_RENDER_TARGET
        } else {
            RESOURCE_STATE_COMMON
        }
    }
}
