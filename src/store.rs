//! Bit-packed storage: a fixed array of 64-bit cells.
//!
//! The store addresses individual bits, most-significant first within
//! each cell: bit 0 of the store is the top bit of cell 0. All reads and
//! writes cover a power-of-two-sized range, so a range no wider than a
//! cell never straddles a cell boundary.

use smallvec::SmallVec;

use crate::error::{VmError, VmResult};

/// log2 of the cell width.
pub const CELL_DEPTH: u32 = 6;

/// Bits in each storage cell.
pub const CELL: u64 = 1 << CELL_DEPTH;

/// The contents of one window: a single masked value for windows up to
/// one cell wide, whole cells in order for anything wider.
pub type WindowReport = SmallVec<[u64; 2]>;

/// Fixed-capacity bit array. The cell count is set at construction and
/// never changes; it is the hard upper bound on addressable bits.
#[derive(Debug, Clone)]
pub struct BitStore {
    cells: Vec<u64>,
}

impl BitStore {
    /// A store able to hold `2^max_depth` bits, with a minimum of one
    /// cell when `max_depth` is smaller than the cell depth.
    pub fn new(max_depth: u32) -> Self {
        let count = if max_depth > CELL_DEPTH {
            1usize << (max_depth - CELL_DEPTH)
        } else {
            1
        };
        BitStore { cells: vec![0; count] }
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Physical capacity in bits.
    pub fn capacity(&self) -> u64 {
        self.cells.len() as u64 * CELL
    }

    /// All-ones mask of `width` bits. Saturates at the cell width.
    pub fn mask(width: u64) -> u64 {
        if width < CELL {
            (1u64 << width) - 1
        } else {
            !0
        }
    }

    /// Read a `width`-bit value starting at bit `offset`.
    ///
    /// `width` must be a power of two no wider than a cell. The offset
    /// need not be aligned (instruction fetch reads 4 bits at whatever
    /// index the cursor holds), so a range may straddle two cells.
    /// Out-of-range access is a programmer error.
    pub fn read(&self, offset: u64, width: u64) -> u64 {
        debug_assert!(width.is_power_of_two() && width <= CELL);
        debug_assert!(offset + width <= self.capacity());
        let cell = (offset / CELL) as usize;
        let bit = offset % CELL;
        if bit + width <= CELL {
            (self.cells[cell] >> (CELL - bit - width)) & Self::mask(width)
        } else {
            let high_bits = CELL - bit;
            let low_bits = width - high_bits;
            let high = self.cells[cell] & Self::mask(high_bits);
            let low = self.cells[cell + 1] >> (CELL - low_bits);
            (high << low_bits) | low
        }
    }

    /// Overwrite a `width`-bit field starting at bit `offset`. Same
    /// contract as [`read`](Self::read).
    pub fn write(&mut self, offset: u64, width: u64, value: u64) {
        debug_assert!(width.is_power_of_two() && width <= CELL);
        debug_assert!(offset + width <= self.capacity());
        let cell = (offset / CELL) as usize;
        let bit = offset % CELL;
        if bit + width <= CELL {
            let shift = CELL - bit - width;
            self.cells[cell] &= !(Self::mask(width) << shift);
            self.cells[cell] |= (value & Self::mask(width)) << shift;
        } else {
            let high_bits = CELL - bit;
            let low_bits = width - high_bits;
            self.cells[cell] &= !Self::mask(high_bits);
            self.cells[cell] |= (value >> low_bits) & Self::mask(high_bits);
            let shift = CELL - low_bits;
            self.cells[cell + 1] &= !(Self::mask(low_bits) << shift);
            self.cells[cell + 1] |= (value & Self::mask(low_bits)) << shift;
        }
    }

    /// The contents of the window at `(offset, width)`: one masked value
    /// for `width <= CELL`, otherwise the `width / CELL` spanned cells.
    pub fn report(&self, offset: u64, width: u64) -> WindowReport {
        if width <= CELL {
            let mut out = WindowReport::new();
            out.push(self.read(offset, width));
            out
        } else {
            let first = (offset / CELL) as usize;
            let count = (width / CELL) as usize;
            self.cells[first..first + count].iter().copied().collect()
        }
    }

    pub(crate) fn cells_mut(&mut self) -> &mut [u64] {
        &mut self.cells
    }

    /// Load a packed byte stream into the cells, first byte into the top
    /// of cell 0. A trailing partial cell is zero-padded in its low
    /// bits. Returns the number of bits loaded.
    pub fn load_bytes(&mut self, bytes: &[u8]) -> VmResult<u64> {
        let bits = bytes.len() as u64 * 8;
        if bits > self.capacity() {
            return Err(VmError::ProgramTooLarge { bits, capacity: self.capacity() });
        }
        self.cells.fill(0);
        for (i, chunk) in bytes.chunks(8).enumerate() {
            let mut buf = [0u8; 8];
            buf[..chunk.len()].copy_from_slice(chunk);
            self.cells[i] = u64::from_be_bytes(buf);
        }
        Ok(bits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cell_count_minimum() {
        for depth in 0..=CELL_DEPTH {
            assert_eq!(BitStore::new(depth).cell_count(), 1);
        }
        assert_eq!(BitStore::new(7).cell_count(), 2);
        assert_eq!(BitStore::new(10).cell_count(), 16);
    }

    #[test]
    fn test_mask_widths() {
        assert_eq!(BitStore::mask(1), 0b1);
        assert_eq!(BitStore::mask(4), 0xF);
        assert_eq!(BitStore::mask(CELL), u64::MAX);
    }

    #[test]
    fn test_read_write_within_cell() {
        let mut store = BitStore::new(6);
        store.write(0, 4, 0xA);
        store.write(4, 4, 0x5);
        assert_eq!(store.read(0, 4), 0xA);
        assert_eq!(store.read(4, 4), 0x5);
        assert_eq!(store.read(0, 8), 0xA5);
        // Overwrite leaves neighbors alone
        store.write(4, 4, 0xC);
        assert_eq!(store.read(0, 8), 0xAC);
    }

    #[test]
    fn test_bit_zero_is_top_of_cell() {
        let mut store = BitStore::new(6);
        store.write(0, 1, 1);
        assert_eq!(store.read(0, CELL), 1u64 << 63);
    }

    #[test]
    fn test_report_spans_cells() {
        let mut store = BitStore::new(7);
        store.write(0, 64, 0x1111_2222_3333_4444);
        store.write(64, 64, 0x5555_6666_7777_8888);
        let report = store.report(0, 128);
        assert_eq!(report.as_slice(), &[0x1111_2222_3333_4444, 0x5555_6666_7777_8888]);
    }

    #[test]
    fn test_read_write_across_a_cell_boundary() {
        let mut store = BitStore::new(7);
        store.write(62, 4, 0b1011);
        assert_eq!(store.read(62, 4), 0b1011);
        assert_eq!(store.read(0, 64) & 0b11, 0b10);
        assert_eq!(store.read(64, 64) >> 62, 0b11);
    }

    #[test]
    fn test_unaligned_nybble_read() {
        let mut store = BitStore::new(6);
        store.write(0, 8, 0b0010_0100);
        // Fetch at bit 1 sees 0100
        assert_eq!(store.read(1, 4), 0b0100);
    }

    #[test]
    fn test_load_bytes_big_endian() {
        let mut store = BitStore::new(7);
        let bits = store.load_bytes(&[0x01, 0x02]).unwrap();
        assert_eq!(bits, 16);
        assert_eq!(store.read(0, 8), 0x01);
        assert_eq!(store.read(8, 8), 0x02);
        // Partial cell is padded at the low end
        assert_eq!(store.read(0, 64), 0x0102_0000_0000_0000);
    }

    #[test]
    fn test_load_bytes_overflow() {
        let mut store = BitStore::new(6);
        let result = store.load_bytes(&[0u8; 9]);
        assert!(matches!(result, Err(VmError::ProgramTooLarge { bits: 72, capacity: 64 })));
    }
}
