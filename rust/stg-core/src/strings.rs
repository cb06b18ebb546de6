//! Interning table for string literals.
//!
//! String literals in the IR become [`StringPtr`] atoms that point into this
//! table. Every literal reads as NUL-terminated, like the C strings the
//! compiler emits.

use crate::atom::StringPtr;
use std::collections::HashMap;

#[derive(Debug, Default)]
pub struct StringTable {
    strings: Vec<Vec<u8>>,
    lookup: HashMap<Vec<u8>, u32>,
}

impl StringTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn intern(&mut self, bytes: &[u8]) -> StringPtr {
        if let Some(&id) = self.lookup.get(bytes) {
            return StringPtr { id, offset: 0 };
        }
        let id = self.strings.len() as u32;
        self.strings.push(bytes.to_vec());
        self.lookup.insert(bytes.to_vec(), id);
        StringPtr { id, offset: 0 }
    }

    pub fn resolve(&self, id: u32) -> Option<&[u8]> {
        self.strings.get(id as usize).map(|s| s.as_slice())
    }

    /// Byte at `ptr`; the position one past the end reads as the terminator.
    pub fn byte_at(&self, ptr: StringPtr) -> Option<u8> {
        let bytes = self.resolve(ptr.id)?;
        match ptr.offset {
            i if i < bytes.len() => Some(bytes[i]),
            i if i == bytes.len() => Some(0),
            _ => None,
        }
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }
}
