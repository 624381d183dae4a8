//! Binary codec seam.
//!
//! The orchestrator never interprets unit bytes itself; it goes through a
//! [`ClassCodec`]. [`BcsClassCodec`] is the reference codec: a 4-byte header
//! followed by the BCS encoding of a [`ClassTree`]. BCS is canonical, so
//! encoding the same tree twice yields identical bytes.

use loadweave_types::ClassTree;

use crate::errors::CodecError;

/// Header prefixed to every unit written by [`BcsClassCodec`].
pub const UNIT_MAGIC: [u8; 4] = *b"LWU1";

/// Converts between unit bytes and their tree form.
pub trait ClassCodec: Send + Sync {
    fn decode(&self, bytes: &[u8]) -> Result<ClassTree, CodecError>;

    fn encode(&self, tree: &ClassTree) -> Result<Vec<u8>, CodecError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct BcsClassCodec;

impl BcsClassCodec {
    pub fn new() -> Self {
        Self
    }
}

fn check_tree(tree: &ClassTree) -> Result<(), CodecError> {
    if tree.name().is_empty() {
        return Err(CodecError::Invalid {
            reason: "unit name is empty".to_string(),
        });
    }
    Ok(())
}

impl ClassCodec for BcsClassCodec {
    fn decode(&self, bytes: &[u8]) -> Result<ClassTree, CodecError> {
        let payload = bytes
            .strip_prefix(&UNIT_MAGIC[..])
            .ok_or(CodecError::BadMagic {
                expected: UNIT_MAGIC,
            })?;
        let tree: ClassTree = bcs::from_bytes(payload).map_err(|e| CodecError::Malformed {
            reason: e.to_string(),
        })?;
        check_tree(&tree)?;
        Ok(tree)
    }

    fn encode(&self, tree: &ClassTree) -> Result<Vec<u8>, CodecError> {
        check_tree(tree)?;
        let payload = bcs::to_bytes(tree).map_err(|e| CodecError::Malformed {
            reason: e.to_string(),
        })?;
        let mut out = Vec::with_capacity(UNIT_MAGIC.len() + payload.len());
        out.extend_from_slice(&UNIT_MAGIC);
        out.extend_from_slice(&payload);
        Ok(out)
    }
}
