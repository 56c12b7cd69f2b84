//! Pixel format translation.
//!
//! DXGI is used as the common conversion point: a [`GenericFormat`] holds a
//! `DXGI_FORMAT` code. Native formats travel as `i64`, the OpenXR swapchain
//! format vocabulary. Both Direct3D stacks speak DXGI natively, so their
//! translators are identity maps; a stack with its own enum (e.g. Vulkan)
//! would plug its table in here.

use std::fmt;

use crate::api::Api;

/// A pixel format in the API-neutral vocabulary (a `DXGI_FORMAT` code).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct GenericFormat(pub u32);

impl GenericFormat {
    pub const UNKNOWN: Self = Self(0);
    pub const R32G32B32A32_FLOAT: Self = Self(2);
    pub const R16G16B16A16_FLOAT: Self = Self(10);
    pub const R16G16B16A16_UNORM: Self = Self(11);
    pub const D32_FLOAT_S8X24_UINT: Self = Self(20);
    pub const R10G10B10A2_UNORM: Self = Self(24);
    pub const R11G11B10_FLOAT: Self = Self(26);
    pub const R8G8B8A8_UNORM: Self = Self(28);
    pub const R8G8B8A8_UNORM_SRGB: Self = Self(29);
    pub const D32_FLOAT: Self = Self(40);
    pub const D24_UNORM_S8_UINT: Self = Self(45);
    pub const D16_UNORM: Self = Self(55);
    pub const B8G8R8A8_UNORM: Self = Self(87);
    pub const B8G8R8X8_UNORM: Self = Self(88);
    pub const B8G8R8A8_UNORM_SRGB: Self = Self(91);
    pub const B8G8R8X8_UNORM_SRGB: Self = Self(93);

    /// Formats runtimes commonly offer for swapchains on the Direct3D stacks.
    pub const SWAPCHAIN_FORMATS: &'static [GenericFormat] = &[
        Self::R32G32B32A32_FLOAT,
        Self::R16G16B16A16_FLOAT,
        Self::R16G16B16A16_UNORM,
        Self::D32_FLOAT_S8X24_UINT,
        Self::R10G10B10A2_UNORM,
        Self::R11G11B10_FLOAT,
        Self::R8G8B8A8_UNORM,
        Self::R8G8B8A8_UNORM_SRGB,
        Self::D32_FLOAT,
        Self::D24_UNORM_S8_UINT,
        Self::D16_UNORM,
        Self::B8G8R8A8_UNORM,
        Self::B8G8R8X8_UNORM,
        Self::B8G8R8A8_UNORM_SRGB,
        Self::B8G8R8X8_UNORM_SRGB,
    ];

    fn name(self) -> Option<&'static str> {
        Some(match self {
            Self::UNKNOWN => "UNKNOWN",
            Self::R32G32B32A32_FLOAT => "R32G32B32A32_FLOAT",
            Self::R16G16B16A16_FLOAT => "R16G16B16A16_FLOAT",
            Self::R16G16B16A16_UNORM => "R16G16B16A16_UNORM",
            Self::D32_FLOAT_S8X24_UINT => "D32_FLOAT_S8X24_UINT",
            Self::R10G10B10A2_UNORM => "R10G10B10A2_UNORM",
            Self::R11G11B10_FLOAT => "R11G11B10_FLOAT",
            Self::R8G8B8A8_UNORM => "R8G8B8A8_UNORM",
            Self::R8G8B8A8_UNORM_SRGB => "R8G8B8A8_UNORM_SRGB",
            Self::D32_FLOAT => "D32_FLOAT",
            Self::D24_UNORM_S8_UINT => "D24_UNORM_S8_UINT",
            Self::D16_UNORM => "D16_UNORM",
            Self::B8G8R8A8_UNORM => "B8G8R8A8_UNORM",
            Self::B8G8R8X8_UNORM => "B8G8R8X8_UNORM",
            Self::B8G8R8A8_UNORM_SRGB => "B8G8R8A8_UNORM_SRGB",
            Self::B8G8R8X8_UNORM_SRGB => "B8G8R8X8_UNORM_SRGB",
            _ => return None,
        })
    }
}

impl fmt::Display for GenericFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.name() {
            Some(name) => f.write_str(name),
            None => write!(f, "DXGI_FORMAT({})", self.0),
        }
    }
}

/// Translate a native format of `api` into the generic vocabulary.
pub fn to_generic(api: Api, native: i64) -> GenericFormat {
    match api {
        Api::D3D11 | Api::D3D12 => GenericFormat(native as u32),
    }
}

/// Translate a generic format into the native format of `api`.
pub fn from_generic(api: Api, generic: GenericFormat) -> i64 {
    match api {
        Api::D3D11 | Api::D3D12 => i64::from(generic.0),
    }
}

/// Re-express a native format of one API in the vocabulary of another.
pub fn translate(from: Api, to: Api, native: i64) -> i64 {
    from_generic(to, to_generic(from, native))
}
