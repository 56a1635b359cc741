//! Sentinel-terminated source buffer for zero-bounds-check scanning.
//!
//! The buffer guarantees a `0x00` sentinel byte after the source content,
//! allowing the scanner to detect EOF without explicit bounds checking.
//! The total buffer size is rounded up past the next 64-byte boundary for
//! cache-line alignment, which also provides a full line of zero padding
//! so multi-byte probes (`starts_with`, `peek_at`) near the end of the
//! buffer stay in bounds.
//!
//! Wave sources are byte streams: the buffer performs no encoding
//! validation. Non-ASCII bytes only ever appear inside string literals and
//! comments, where they pass through untouched.

use crate::Cursor;

/// Cache line size in bytes, used for buffer alignment padding.
const CACHE_LINE: usize = 64;

/// Sentinel-terminated source buffer.
///
/// # Layout
///
/// ```text
/// [source_bytes..., 0x00, padding_zeros...]
///  ^                ^     ^
///  0                |     at least one full cache line, 64-byte aligned
///              source_len (sentinel)
/// ```
///
/// The sentinel byte at `source_len` is always `0x00`, as is every byte of
/// padding after it.
#[derive(Clone, Debug)]
pub struct SourceBuffer {
    /// Owned buffer: `[source_bytes..., 0x00 sentinel, 0x00 padding...]`.
    buf: Vec<u8>,
    /// Length of the actual source content (excludes sentinel and padding).
    source_len: u32,
}

impl SourceBuffer {
    /// Create a new sentinel-terminated buffer from raw source bytes.
    ///
    /// Copies the source into a zero-filled buffer whose length is the next
    /// 64-byte boundary past `source.len() + 1`, guaranteeing the sentinel
    /// plus at least one cache line of zero padding.
    pub fn new(source: &[u8]) -> Self {
        let source_len = source.len();

        // Sentinel plus a full trailing cache line, rounded to a 64-byte
        // boundary. The extra line keeps multi-byte keyword probes and the
        // occasional one-past-EOF peek inside the allocation.
        let padded_len = (source_len + 1 + CACHE_LINE) & !(CACHE_LINE - 1);

        let mut buf = vec![0u8; padded_len];
        buf[..source_len].copy_from_slice(source);

        // Wave sources are capped at 1 MiB by the driver; the saturation
        // here only matters for callers that skip that check.
        let source_len = u32::try_from(source_len).unwrap_or(u32::MAX);

        Self { buf, source_len }
    }

    /// Returns the source bytes (without sentinel or padding).
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.source_len as usize]
    }

    /// Create a [`Cursor`] positioned at byte 0.
    pub fn cursor(&self) -> Cursor<'_> {
        Cursor::new(&self.buf, self.source_len)
    }

    /// Length of the source content in bytes (excludes sentinel and padding).
    pub fn len(&self) -> u32 {
        self.source_len
    }

    /// Returns `true` if the source content is empty.
    pub fn is_empty(&self) -> bool {
        self.source_len == 0
    }
}
