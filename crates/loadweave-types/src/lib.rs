//! Shared types for the loadweave workspace.
//!
//! This crate provides the foundational data model used by the orchestrator
//! core and the CLI, breaking circular dependency chains.
//!
//! ## Unit Trees
//!
//! The [`tree`] module contains the mutable tree form of one compiled unit:
//! - [`ClassTree`](tree::ClassTree) - Qualified name, binary version, super-type, members
//! - [`Member`](tree::Member) - One field or method of a unit
//!
//! ## Compatibility
//!
//! [`CompatibilityLevel`](compat::CompatibilityLevel) selects the binary
//! version that freshly generated units target.

pub mod compat;
pub mod encoding;
pub mod env_utils;
pub mod tree;

// Re-export commonly used types at crate root
pub use compat::CompatibilityLevel;
pub use tree::{ClassTree, Member, MemberKind, DEFAULT_SUPER_TYPE};
