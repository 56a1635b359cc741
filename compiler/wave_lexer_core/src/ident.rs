//! Fixed-capacity identifier names.

use std::fmt;

/// Size of the NUL-padded name field.
const FIELD: usize = 32;

/// A Wave identifier: at most 31 meaningful bytes in a fixed 32-byte,
/// NUL-padded field.
///
/// Longer lexemes are silently truncated by [`Ident::new`]. Equality is
/// byte-exact over the whole 32-byte field, so two identifiers that differ
/// only past the 31st byte collide. The truncation width is load-bearing
/// for name lookup and must not be narrowed.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident {
    bytes: [u8; FIELD],
}

impl Ident {
    /// Maximum number of meaningful bytes kept from a lexeme.
    pub const MAX_LEN: usize = FIELD - 1;

    /// Build an identifier from a raw lexeme, keeping at most
    /// [`MAX_LEN`](Self::MAX_LEN) bytes.
    pub fn new(lexeme: &[u8]) -> Self {
        let mut bytes = [0u8; FIELD];
        let keep = lexeme.len().min(Self::MAX_LEN);
        bytes[..keep].copy_from_slice(&lexeme[..keep]);
        Self { bytes }
    }

    /// The meaningful bytes of the name (up to the first NUL).
    pub fn as_bytes(&self) -> &[u8] {
        let end = self.bytes.iter().position(|&b| b == 0).unwrap_or(FIELD);
        &self.bytes[..end]
    }

    /// The name as a string slice.
    ///
    /// Identifier bytes are `[A-Za-z0-9_.]`, so the field is always ASCII;
    /// the fallback only fires for hand-constructed non-identifier input.
    pub fn as_str(&self) -> &str {
        std::str::from_utf8(self.as_bytes()).unwrap_or("<non-ascii>")
    }

    /// Number of meaningful bytes.
    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    /// Returns `true` for the empty name.
    pub fn is_empty(&self) -> bool {
        self.bytes[0] == 0
    }
}

impl fmt::Debug for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ident({:?})", self.as_str())
    }
}

impl fmt::Display for Ident {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn short_name_round_trips() {
        let id = Ident::new(b"counter");
        assert_eq!(id.as_bytes(), b"counter");
        assert_eq!(id.as_str(), "counter");
        assert_eq!(id.len(), 7);
        assert!(!id.is_empty());
    }

    #[test]
    fn empty_name() {
        let id = Ident::new(b"");
        assert!(id.is_empty());
        assert_eq!(id.len(), 0);
    }

    #[test]
    fn exactly_31_bytes_kept() {
        let lexeme = [b'a'; 31];
        let id = Ident::new(&lexeme);
        assert_eq!(id.len(), 31);
    }

    #[test]
    fn thirty_second_byte_truncated() {
        let lexeme = [b'a'; 32];
        let id = Ident::new(&lexeme);
        assert_eq!(id.len(), 31);
    }

    #[test]
    fn truncation_makes_long_names_collide() {
        let mut long_a = vec![b'x'; 31];
        long_a.push(b'a');
        let mut long_b = vec![b'x'; 31];
        long_b.push(b'b');
        assert_eq!(Ident::new(&long_a), Ident::new(&long_b));
    }

    #[test]
    fn names_differing_within_31_bytes_do_not_collide() {
        assert_ne!(Ident::new(b"alpha"), Ident::new(b"alphb"));
        assert_ne!(Ident::new(b"alpha"), Ident::new(b"alph"));
    }

    #[test]
    fn dotted_name_is_one_ident() {
        let id = Ident::new(b"syscall.exit");
        assert_eq!(id.as_str(), "syscall.exit");
    }

    #[test]
    fn display_shows_name() {
        assert_eq!(Ident::new(b"main").to_string(), "main");
    }
}
