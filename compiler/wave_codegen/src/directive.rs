//! Compile-time directive state.
//!
//! `unified { ... }` and `fate on|off` configure the compiler, not the
//! program: in this revision neither influences a single emitted byte.
//! The state is parsed, validated and kept so that directive-bearing
//! sources compile, and logged at debug level for visibility.

/// Fixed-point configuration set by `unified { i: F, e: F, r: F }`.
///
/// Each component is the written value x1000 (milli-units), matching the
/// fixed-point float reader.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UnifiedField {
    /// The `i` component, x1000.
    pub i: i64,
    /// The `e` component, x1000.
    pub e: i64,
    /// The `r` component, x1000.
    pub r: i64,
}
