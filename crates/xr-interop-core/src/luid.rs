//! Adapter identity.

use std::fmt;

use crate::error::{InteropError, Result};

/// The locally unique identifier of a display adapter.
///
/// Matches the Windows `LUID` layout: a low `u32` and a high `i32`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct AdapterLuid {
    pub low: u32,
    pub high: i32,
}

impl AdapterLuid {
    pub const fn new(low: u32, high: i32) -> Self {
        Self { low, high }
    }
}

impl fmt::Display for AdapterLuid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:08x}:{:08x}", self.high as u32, self.low)
    }
}

#[cfg(target_os = "windows")]
impl From<windows::Win32::Foundation::LUID> for AdapterLuid {
    fn from(luid: windows::Win32::Foundation::LUID) -> Self {
        Self::new(luid.LowPart, luid.HighPart)
    }
}

#[cfg(target_os = "windows")]
impl From<AdapterLuid> for windows::Win32::Foundation::LUID {
    fn from(luid: AdapterLuid) -> Self {
        Self {
            LowPart: luid.low,
            HighPart: luid.high,
        }
    }
}

/// Pick the adapter whose LUID matches `luid` from an enumeration.
///
/// Enumeration order does not matter, and the first match wins.
pub fn select_adapter<T>(
    candidates: impl IntoIterator<Item = (AdapterLuid, T)>,
    luid: AdapterLuid,
) -> Result<T> {
    candidates
        .into_iter()
        .find(|(candidate, _)| *candidate == luid)
        .map(|(_, adapter)| adapter)
        .ok_or(InteropError::AdapterNotFound(luid))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn selects_matching_adapter() {
        let adapters = vec![
            (AdapterLuid::new(0x1000, 0), "integrated"),
            (AdapterLuid::new(0x2000, 0), "discrete"),
            (AdapterLuid::new(0x3000, 1), "warp"),
        ];
        let picked = select_adapter(adapters, AdapterLuid::new(0x2000, 0)).unwrap();
        assert_eq!(picked, "discrete");
    }

    #[test]
    fn high_part_participates_in_match() {
        let adapters = vec![(AdapterLuid::new(0x3000, 0), 0), (AdapterLuid::new(0x3000, 1), 1)];
        assert_eq!(select_adapter(adapters, AdapterLuid::new(0x3000, 1)).unwrap(), 1);
    }

    #[test]
    fn missing_adapter_is_reported() {
        let wanted = AdapterLuid::new(0xdead, 7);
        let err = select_adapter(Vec::<(AdapterLuid, ())>::new(), wanted).unwrap_err();
        assert!(matches!(err, InteropError::AdapterNotFound(luid) if luid == wanted));
        assert_eq!(err.to_string(), "no adapter matches LUID 00000007:0000dead");
    }
}
