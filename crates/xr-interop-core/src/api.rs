//! Graphics API tags.

use std::fmt;

/// The native graphics stack a device or resource belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Api {
    D3D11,
    D3D12,
}

impl fmt::Display for Api {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Api::D3D11 => f.write_str("D3D11"),
            Api::D3D12 => f.write_str("D3D12"),
        }
    }
}
