//! Append-only machine code buffer with typed emits and in-place patching.
//!
//! The buffer length doubles as the "current code offset": branch targets,
//! function entries and RIP-relative references are all expressed as byte
//! offsets into this buffer. No byte once written is ever removed; only the
//! 4-byte slots handed out by [`CodeBuffer::reserve_u32`] may be
//! overwritten, via [`CodeBuffer::patch_u32`] or
//! [`CodeBuffer::patch_rel32`].

/// Ceiling on emitted code size (4 MiB).
pub const MAX_CODE_BYTES: usize = 4 * 1024 * 1024;

/// Append-only byte buffer for emitted machine code.
#[derive(Clone, Debug, Default)]
pub struct CodeBuffer {
    bytes: Vec<u8>,
}

impl CodeBuffer {
    /// Create an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current code offset: the offset of the next byte to be emitted.
    #[allow(clippy::cast_possible_truncation)] // length is capped at 4 MiB
    pub fn offset(&self) -> u32 {
        self.bytes.len() as u32
    }

    /// Number of bytes emitted so far.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Returns `true` if nothing has been emitted.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// The emitted bytes.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the buffer, yielding the emitted bytes.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Append one byte.
    #[inline]
    pub fn emit_u8(&mut self, byte: u8) {
        self.bytes.push(byte);
    }

    /// Append a 24-bit little-endian value.
    pub fn emit_u24(&mut self, value: u32) {
        debug_assert!(value < (1 << 24), "u24 value out of range");
        self.bytes.extend_from_slice(&value.to_le_bytes()[..3]);
    }

    /// Append a 32-bit little-endian value.
    #[inline]
    pub fn emit_u32(&mut self, value: u32) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Append a 64-bit little-endian value.
    #[inline]
    pub fn emit_u64(&mut self, value: u64) {
        self.bytes.extend_from_slice(&value.to_le_bytes());
    }

    /// Append raw bytes (string literal payloads).
    pub fn emit_bytes(&mut self, bytes: &[u8]) {
        self.bytes.extend_from_slice(bytes);
    }

    /// Append a zero-filled 4-byte slot and return its offset for a later
    /// [`patch_u32`](Self::patch_u32) / [`patch_rel32`](Self::patch_rel32).
    pub fn reserve_u32(&mut self) -> u32 {
        let at = self.offset();
        self.emit_u32(0);
        at
    }

    /// Overwrite the 4-byte slot at `at` with a little-endian value.
    ///
    /// `at` must come from [`reserve_u32`](Self::reserve_u32).
    pub fn patch_u32(&mut self, at: u32, value: u32) {
        let at = at as usize;
        self.bytes[at..at + 4].copy_from_slice(&value.to_le_bytes());
    }

    /// Patch the slot at `slot` with the rel32 displacement that reaches
    /// `target`.
    ///
    /// x86-64 rel32 operands are relative to the end of the instruction,
    /// which for every consumer here is `slot + 4`: the displacement slot
    /// is always the final operand.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)] // code is capped at 4 MiB, so rel32 never overflows
    pub fn patch_rel32(&mut self, slot: u32, target: u32) {
        let disp = i64::from(target) - i64::from(slot) - 4;
        debug_assert!(
            i64::from(i32::MIN) <= disp && disp <= i64::from(i32::MAX),
            "rel32 displacement out of range"
        );
        self.patch_u32(slot, disp as i32 as u32);
    }
}
