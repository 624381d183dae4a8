//! Compatibility level: the binary version generated units target.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Binary format version targeted by newly generated units.
///
/// Parses from either a bare number (`"52"`) or a `v`-prefixed form (`"v52"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CompatibilityLevel(u32);

impl CompatibilityLevel {
    /// Lowest version the orchestrator will emit.
    pub const MINIMUM: CompatibilityLevel = CompatibilityLevel(1);

    pub const fn new(binary_version: u32) -> Self {
        Self(binary_version)
    }

    /// The binary version stamped on generated units.
    pub const fn binary_version(self) -> u32 {
        self.0
    }

    /// Whether a unit of `version` can be handled at this level.
    pub fn supports(self, version: u32) -> bool {
        version <= self.0
    }
}

impl Default for CompatibilityLevel {
    fn default() -> Self {
        Self(52)
    }
}

impl fmt::Display for CompatibilityLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl FromStr for CompatibilityLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix('v')
            .or_else(|| trimmed.strip_prefix('V'))
            .unwrap_or(trimmed);
        let version: u32 = digits
            .parse()
            .map_err(|e| format!("invalid compatibility level '{}': {}", s, e))?;
        if version < Self::MINIMUM.0 {
            return Err(format!(
                "compatibility level '{}' is below the minimum {}",
                s,
                Self::MINIMUM
            ));
        }
        Ok(Self(version))
    }
}
