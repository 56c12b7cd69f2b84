//! Texture descriptors.
//!
//! A descriptor is fixed when its texture is created or opened. Backends
//! report the usage they could actually honor, never the one requested.

use crate::usage::UsageFlags;

/// The immutable description of a texture, as the runtime sees it.
///
/// `format` is a native format of the API the texture belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TextureDescriptor {
    pub format: i64,
    pub width: u32,
    pub height: u32,
    pub array_size: u32,
    pub mip_count: u32,
    pub sample_count: u32,
    pub face_count: u32,
    pub usage: UsageFlags,
}

impl TextureDescriptor {
    /// A single-layer, single-mip, single-sample 2D texture.
    pub fn new_2d(format: i64, width: u32, height: u32, usage: UsageFlags) -> Self {
        Self {
            format,
            width,
            height,
            array_size: 1,
            mip_count: 1,
            sample_count: 1,
            face_count: 1,
            usage,
        }
    }

    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    pub fn with_mip_count(mut self, mip_count: u32) -> Self {
        self.mip_count = mip_count;
        self
    }

    pub fn with_sample_count(mut self, sample_count: u32) -> Self {
        self.sample_count = sample_count;
        self
    }

    /// Whether the two describe textures a copy can go between.
    pub fn copy_compatible(&self, other: &Self) -> bool {
        self.width == other.width
            && self.height == other.height
            && self.array_size == other.array_size
            && self.mip_count == other.mip_count
            && self.sample_count == other.sample_count
    }
}
