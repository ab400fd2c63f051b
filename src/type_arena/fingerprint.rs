// type_arena/fingerprint.rs
//
// Fingerprint: the order-sensitive word encoding of a constructor's arguments,
// used as the intern key for a type reference.

use std::fmt;

use smallvec::SmallVec;

use super::type_ref_id::TypeRefId;

/// Encoded identity of a type reference's constructor arguments.
///
/// Child references contribute their arena index, not their content: children
/// are already canonical, so one level of encoding is enough to tell two
/// structures apart. Equality is exact word-sequence equality and the derived
/// `Hash` follows it.
///
/// Variable-length pieces carry a length prefix, so the encoding of one
/// argument list can never be mistaken for a different argument list.
#[derive(Clone, Default, PartialEq, Eq, Hash)]
pub struct Fingerprint {
    words: SmallVec<[u32; 8]>,
}

impl Fingerprint {
    pub fn new() -> Self {
        Self::default()
    }

    /// Encoded words, in the order they were added
    pub fn words(&self) -> &[u32] {
        &self.words
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Add a child reference by identity
    pub fn add_ref(&mut self, id: TypeRefId) -> &mut Self {
        self.words.push(id.index());
        self
    }

    /// Add an optional child reference: `0` when absent, `1, id` when present
    pub fn add_optional_ref(&mut self, id: Option<TypeRefId>) -> &mut Self {
        match id {
            Some(id) => {
                self.words.push(1);
                self.words.push(id.index());
            }
            None => self.words.push(0),
        }
        self
    }

    /// Add a count-prefixed list of child references
    pub fn add_refs(&mut self, ids: &[TypeRefId]) -> &mut Self {
        self.add_len(ids.len());
        for &id in ids {
            self.add_ref(id);
        }
        self
    }

    pub fn add_u32(&mut self, value: u32) -> &mut Self {
        self.words.push(value);
        self
    }

    /// Add a 64-bit integer as two words, low half first
    pub fn add_u64(&mut self, value: u64) -> &mut Self {
        self.words.push(value as u32);
        self.words.push((value >> 32) as u32);
        self
    }

    pub fn add_bool(&mut self, value: bool) -> &mut Self {
        self.words.push(u32::from(value));
        self
    }

    /// Add a string: byte length, then the bytes packed little-endian four to
    /// a word, the final word zero-padded. The empty string is the single
    /// word `0`.
    pub fn add_str(&mut self, s: &str) -> &mut Self {
        let bytes = s.as_bytes();
        self.add_len(bytes.len());
        for chunk in bytes.chunks(4) {
            let mut word = [0u8; 4];
            word[..chunk.len()].copy_from_slice(chunk);
            self.words.push(u32::from_le_bytes(word));
        }
        self
    }

    /// Add a length or element count word
    pub fn add_len(&mut self, len: usize) -> &mut Self {
        // Inputs come from decoded metadata; nothing legitimately exceeds u32.
        let len = u32::try_from(len).unwrap_or_else(|_| {
            panic!("INTERNAL ERROR: fingerprint component length {len} exceeds u32")
        });
        self.words.push(len);
        self
    }
}

impl fmt::Debug for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list()
            .entries(self.words.iter().copied().map(HexWord))
            .finish()
    }
}

struct HexWord(u32);

impl fmt::Debug for HexWord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#010x}", self.0)
    }
}
