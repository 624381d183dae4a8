//! Environment variable parsing utilities.
//!
//! Type-safe helpers for reading configuration overrides from the process
//! environment, replacing the repeated
//! `std::env::var(..).ok().and_then(|v| v.parse().ok())` pattern.
//!
//! # Example
//!
//! ```
//! use loadweave_types::env_utils::{env_flag, env_var};
//!
//! let level: Option<u32> = env_var("LOADWEAVE_DOC_LEVEL");
//! assert_eq!(level, None);
//! assert_eq!(env_flag("LOADWEAVE_DOC_FLAG"), None);
//! ```

use std::str::FromStr;

/// Parse an environment variable into a type that implements `FromStr`.
///
/// Returns `None` if the variable is not set or cannot be parsed.
pub fn env_var<T: FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|v| v.trim().parse().ok())
}

/// Read a boolean flag, distinguishing "unset" from "false".
///
/// Truthy: "1", "true", "yes", "on". Falsy: "0", "false", "no", "off".
/// Anything else is treated as unset.
pub fn env_flag(key: &str) -> Option<bool> {
    let value = std::env::var(key).ok()?;
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
