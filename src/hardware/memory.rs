use crate::errors::MemoryError;
use crate::hardware::bits::{CellPosition, generate_mask};
use std::fmt::{Debug, Formatter};

/// Width of one storage cell in bits.
pub const CELL_WIDTH: u32 = u64::BITS;

/// Bit-addressed memory made of fixed-width cells.
///
/// Values are read and written `instruction_width` bits at a time at any bit address, an
/// instruction may therefore start in one cell and end in the next one. Inside a cell bit
/// position `0` is the most significant bit.
///
/// Writes spanning two cells update them one after the other, there is no locking.
pub struct Memory {
    cells: Vec<u64>,
    instruction_width: u32,
    max_address: u64,
}

impl Debug for Memory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let used = self.cells.iter().filter(|c| **c != 0).count();
        write!(
            f,
            "Cells: {}, used cells: {used}, instruction width: {}, max address: {:#x}",
            self.cells.len(),
            self.instruction_width,
            self.max_address
        )
    }
}

impl Memory {
    /// Creates zeroed memory of `cell_count` cells serving `instruction_width` bit values.
    ///
    /// # Errors
    /// - `cell_count` is 0
    /// - `instruction_width` is outside `[2, CELL_WIDTH]`
    /// - the total number of bits does not fit into a 64 bit address
    /// - the cells cannot be allocated
    pub fn new(cell_count: usize, instruction_width: u32) -> Result<Self, MemoryError> {
        let invalid = || MemoryError::InvalidConfiguration {
            cell_count,
            instruction_width,
        };
        if cell_count == 0 || !(2..=CELL_WIDTH).contains(&instruction_width) {
            return Err(invalid());
        }
        let max_address = u64::try_from(cell_count)
            .ok()
            .and_then(|count| count.checked_mul(u64::from(CELL_WIDTH)))
            .ok_or_else(invalid)?
            - u64::from(instruction_width);
        let mut cells = Vec::new();
        cells.try_reserve_exact(cell_count).map_err(|_| invalid())?;
        cells.resize(cell_count, 0);
        Ok(Self {
            cells,
            instruction_width,
            max_address,
        })
    }

    /// Highest bit address a value can be read from or written to.
    #[must_use]
    pub const fn max_address(&self) -> u64 {
        self.max_address
    }
    #[must_use]
    pub const fn instruction_width(&self) -> u32 {
        self.instruction_width
    }
    /// Raw contents of the cells.
    #[must_use]
    pub fn cells(&self) -> &[u64] {
        &self.cells
    }

    /// Converts an address computed with signed arithmetic into a valid bit address.
    ///
    /// # Errors
    /// - `address` is negative or greater than [`Memory::max_address()`]
    pub fn checked_address(&self, address: i64) -> Result<u64, MemoryError> {
        u64::try_from(address)
            .ok()
            .filter(|address| *address <= self.max_address)
            .ok_or(MemoryError::AddressOutOfRange {
                address,
                max_address: self.max_address,
            })
    }

    /// Writes the lowest `instruction_width` bits of `instruction` starting at bit `address`.
    /// Higher bits of `instruction` are ignored.
    ///
    /// # Errors
    /// - `address` is greater than [`Memory::max_address()`]
    pub fn write(&mut self, address: u64, instruction: u64) -> Result<(), MemoryError> {
        let span = self.span(address)?;
        let instruction = instruction & self.value_mask();
        let head = span.head;
        if let Some(tail_bits) = span.split_tail_bits() {
            self.clear(head.cell_index, head.offset, CELL_WIDTH);
            self.cells[head.cell_index] += instruction >> tail_bits;
            self.clear(head.cell_index + 1, 0, tail_bits);
            self.cells[head.cell_index + 1] += instruction << (CELL_WIDTH - tail_bits);
        } else {
            let end = head.offset + self.instruction_width;
            self.clear(head.cell_index, head.offset, end);
            self.cells[head.cell_index] += instruction << (CELL_WIDTH - end);
        }
        Ok(())
    }

    /// Reads `instruction_width` bits starting at bit `address`, right aligned.
    ///
    /// # Errors
    /// - `address` is greater than [`Memory::max_address()`]
    pub fn read(&self, address: u64) -> Result<u64, MemoryError> {
        let span = self.span(address)?;
        let head = span.head;
        if let Some(tail_bits) = span.split_tail_bits() {
            let first_part = self.range(head.cell_index, head.offset, CELL_WIDTH);
            let last_part = self.range(head.cell_index + 1, 0, tail_bits);
            Ok((first_part << tail_bits) + (last_part >> (CELL_WIDTH - tail_bits)))
        } else {
            let end = head.offset + self.instruction_width;
            Ok(self.range(head.cell_index, head.offset, end) >> (CELL_WIDTH - end))
        }
    }

    fn span(&self, address: u64) -> Result<Span, MemoryError> {
        if address > self.max_address {
            return Err(MemoryError::AddressOutOfRange {
                address: i64::try_from(address).unwrap_or(i64::MAX),
                max_address: self.max_address,
            });
        }
        let last_bit = address + u64::from(self.instruction_width) - 1;
        Ok(Span {
            head: CellPosition::locate(address, CELL_WIDTH),
            last: CellPosition::locate(last_bit, CELL_WIDTH),
        })
    }

    /// Lowest `instruction_width` bits set.
    const fn value_mask(&self) -> u64 {
        generate_mask(CELL_WIDTH, 0, CELL_WIDTH - self.instruction_width)
    }

    /// Zeroes positions `[from, to)` of a cell.
    fn clear(&mut self, cell_index: usize, from: u32, to: u32) {
        self.cells[cell_index] &= generate_mask(CELL_WIDTH, from, to);
    }

    /// Only positions `[from, to)` of a cell, left in place.
    fn range(&self, cell_index: usize, from: u32, to: u32) -> u64 {
        self.cells[cell_index] & !generate_mask(CELL_WIDTH, from, to)
    }
}

/// Cells touched by one instruction: where its first and its last bit live.
struct Span {
    head: CellPosition,
    last: CellPosition,
}

impl Span {
    /// Number of bits stored in the second cell if the instruction crosses a cell boundary.
    const fn split_tail_bits(&self) -> Option<u32> {
        if self.head.cell_index == self.last.cell_index {
            None
        } else {
            Some(self.last.offset + 1)
        }
    }
}
