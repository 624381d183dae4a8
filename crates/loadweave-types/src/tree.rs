//! Tree representation of a compiled unit.
//!
//! A [`ClassTree`] is created by a codec (or as an empty stub for generation),
//! handed to weaving collaborators as `&mut`, then encoded back. Its qualified
//! name is fixed at construction: there is no setter, and the orchestrator
//! rejects any tree whose name differs from the one it handed out.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Super-type assigned to generated stubs when nothing else is configured.
pub const DEFAULT_SUPER_TYPE: &str = "core.Object";

/// Kind of a unit member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemberKind {
    Field,
    Method,
}

impl fmt::Display for MemberKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MemberKind::Field => f.write_str("field"),
            MemberKind::Method => f.write_str("method"),
        }
    }
}

/// One field or method of a compiled unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub kind: MemberKind,
    pub name: String,
    /// Type or signature descriptor, opaque to the orchestrator.
    pub descriptor: String,
    #[serde(default)]
    pub access: u32,
    /// Opaque body (initializer or code), carried through untouched.
    #[serde(default)]
    pub body: Vec<u8>,
}

impl Member {
    pub fn field(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Field,
            name: name.into(),
            descriptor: descriptor.into(),
            access: 0,
            body: Vec::new(),
        }
    }

    pub fn method(name: impl Into<String>, descriptor: impl Into<String>) -> Self {
        Self {
            kind: MemberKind::Method,
            name: name.into(),
            descriptor: descriptor.into(),
            access: 0,
            body: Vec::new(),
        }
    }

    pub fn with_access(mut self, access: u32) -> Self {
        self.access = access;
        self
    }

    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }

    /// Whether `other` declares the same member (kind, name and descriptor).
    pub fn same_signature(&self, other: &Member) -> bool {
        self.kind == other.kind && self.name == other.name && self.descriptor == other.descriptor
    }
}

/// Mutable tree of one compiled unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTree {
    name: String,
    /// Binary format version of the unit.
    pub version: u32,
    /// Qualified name of the super-type, if any.
    pub super_name: Option<String>,
    /// Members in declaration order.
    #[serde(default)]
    pub members: Vec<Member>,
}

impl ClassTree {
    /// Create an empty tree with the given identity.
    pub fn new(name: impl Into<String>, version: u32) -> Self {
        Self {
            name: name.into(),
            version,
            super_name: None,
            members: Vec::new(),
        }
    }

    pub fn with_super(mut self, super_name: impl Into<String>) -> Self {
        self.super_name = Some(super_name.into());
        self
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.members.push(member);
        self
    }

    /// Qualified name of the unit. Immutable for the lifetime of the tree.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Simple (unqualified) name: the segment after the last `.`.
    pub fn simple_name(&self) -> &str {
        self.name.rsplit('.').next().unwrap_or(&self.name)
    }

    /// Look up a member by kind and name.
    pub fn find_member(&self, kind: MemberKind, name: &str) -> Option<&Member> {
        self.members
            .iter()
            .find(|m| m.kind == kind && m.name == name)
    }

    /// Whether a member with the same signature is already declared.
    pub fn declares(&self, member: &Member) -> bool {
        self.members.iter().any(|m| m.same_signature(member))
    }

    /// Append `member` unless an identical signature exists.
    ///
    /// Returns `true` if the member was added.
    pub fn add_member(&mut self, member: Member) -> bool {
        if self.declares(&member) {
            return false;
        }
        self.members.push(member);
        true
    }

    /// Find the first pair of members sharing a signature, if any.
    pub fn first_duplicate(&self) -> Option<&Member> {
        self.members
            .iter()
            .enumerate()
            .find(|(i, m)| self.members[..*i].iter().any(|prev| prev.same_signature(m)))
            .map(|(_, m)| m)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_name() {
        assert_eq!(ClassTree::new("pkg.sub.Foo", 1).simple_name(), "Foo");
        assert_eq!(ClassTree::new("Foo", 1).simple_name(), "Foo");
    }

    #[test]
    fn test_add_member_skips_existing_signature() {
        let mut tree = ClassTree::new("pkg.Foo", 3).with_member(Member::method("run", "()V"));

        assert!(!tree.add_member(Member::method("run", "()V")));
        assert!(tree.add_member(Member::method("run", "(I)V")));
        assert!(tree.add_member(Member::field("run", "()V")));
        assert_eq!(tree.members.len(), 3);
    }

    #[test]
    fn test_first_duplicate() {
        let mut tree = ClassTree::new("pkg.Foo", 3)
            .with_member(Member::field("count", "I"))
            .with_member(Member::method("count", "()I"));
        assert!(tree.first_duplicate().is_none());

        tree.members.push(Member::field("count", "I").with_access(8));
        let dup = tree.first_duplicate().expect("duplicate expected");
        assert_eq!(dup.name, "count");
        assert_eq!(dup.access, 8);
    }

    #[test]
    fn test_json_shape() {
        let tree = ClassTree::new("pkg.Foo", 7)
            .with_super("pkg.Base")
            .with_member(Member::field("x", "I"));
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(json["name"], "pkg.Foo");
        assert_eq!(json["members"][0]["kind"], "field");

        let restored: ClassTree = serde_json::from_value(json).unwrap();
        assert_eq!(restored, tree);
    }
}
