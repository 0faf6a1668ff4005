//! Bit helpers for the packed memory engine.
//!
//! Bit positions inside a cell are counted from the most significant bit: position `0` is the
//! leftmost bit of a cell, position `width - 1` the rightmost one.

/// Value with the `count` lowest bits set.
#[must_use]
const fn low_ones(count: u32) -> u64 {
    if count == 0 { 0 } else { u64::MAX >> (u64::BITS - count) }
}

/// Generates a `width` bit mask whose positions `[from, to)` are `0` and all others `1`.
///
/// `from == to` gives an all-ones mask.
///
/// # Panics
/// - debug asserts `from <= to <= width <= 64`
#[must_use]
pub const fn generate_mask(width: u32, from: u32, to: u32) -> u64 {
    debug_assert!(from <= to && to <= width && width <= u64::BITS);
    if from == to {
        return low_ones(width);
    }
    let zero_range = low_ones(to - from) << (width - to);
    !zero_range & low_ones(width)
}

/// Location of a single bit: the index of the cell holding it and its position inside the cell.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct CellPosition {
    pub cell_index: usize,
    pub offset: u32,
}

impl CellPosition {
    /// Locates `bit_address` in memory made of `cell_width` bit cells.
    #[must_use]
    #[expect(
        clippy::cast_possible_truncation,
        reason = "addresses are validated against the cell count, offsets are below the cell width"
    )]
    pub fn locate(bit_address: u64, cell_width: u32) -> Self {
        let cell_width = u64::from(cell_width);
        Self {
            cell_index: (bit_address / cell_width) as usize,
            offset: (bit_address % cell_width) as u32,
        }
    }
}
