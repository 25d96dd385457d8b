//! Loop adjacency within a polygon.
//!
//! A polygon owns the loops `start..start + total`; walking off either end
//! wraps around to the other.

/// Returns the loop before `index` in the polygon whose loops start at
/// `start` and number `total`.
#[inline]
pub(crate) const fn left_index(index: usize, start: usize, total: usize) -> usize {
    if index > start {
        index - 1
    } else {
        start + total - 1
    }
}

/// Returns the loop after `index` in the polygon whose loops start at
/// `start` and number `total`.
#[inline]
pub(crate) const fn right_index(index: usize, start: usize, total: usize) -> usize {
    if index + 1 < start + total {
        index + 1
    } else {
        start
    }
}
