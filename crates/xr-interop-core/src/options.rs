//! Device creation options.

use crate::handle::HandleKind;

/// Knobs for devices the interop layer creates itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceOptions {
    /// Export D3D11 textures through NT handles instead of legacy tokens.
    /// D3D12 always uses NT handles.
    pub prefer_nt_handles: bool,
    /// Enable the native debug layer on created devices.
    pub debug_layer: bool,
}

impl Default for DeviceOptions {
    fn default() -> Self {
        Self {
            prefer_nt_handles: false,
            debug_layer: cfg!(debug_assertions),
        }
    }
}

impl DeviceOptions {
    /// Read overrides from `XR_INTEROP_NT_HANDLES` and `XR_INTEROP_DEBUG_LAYER`.
    ///
    /// `1`, `true`, `yes` and `on` enable a knob; any other set value disables it.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut options = Self::default();
        if let Some(v) = lookup("XR_INTEROP_NT_HANDLES") {
            options.prefer_nt_handles = parse_bool(&v);
        }
        if let Some(v) = lookup("XR_INTEROP_DEBUG_LAYER") {
            options.debug_layer = parse_bool(&v);
        }
        options
    }

    /// The handle flavor D3D11 textures are exported with.
    pub fn d3d11_texture_handle_kind(&self) -> HandleKind {
        if self.prefer_nt_handles {
            HandleKind::Nt
        } else {
            HandleKind::Legacy
        }
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}
