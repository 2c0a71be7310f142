//! Zero-information success marker.

use std::fmt;

/// The unit value: a content-free result for void-like computations that
/// still need to flow through a generic task pipeline.
///
/// All `Unit` values are equal; there is exactly one logical value,
/// available as [`Unit::VALUE`].
///
/// # Examples
///
/// ```rust
/// use task_helpers::Unit;
///
/// assert_eq!(Unit::VALUE, Unit);
/// assert_eq!(Unit.to_string(), "()");
/// ```
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Unit;

impl Unit {
    /// The single unit value.
    pub const VALUE: Unit = Unit;
}

impl fmt::Display for Unit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("()")
    }
}
