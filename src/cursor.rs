//! The binary-tree cursor.
//!
//! A cursor selects a window `(index, len)` into a [`BitStore`], where
//! `len` is always a power of two. Navigation never uses numeric
//! addresses directly: the window halves ([`halve`](PathOps::halve)),
//! widens to its parent ([`merge`](PathOps::merge)), or slides to its
//! sibling ([`later`](PathOps::later)), walking an implicit complete
//! binary tree whose leaves are single bits. Allocation grows only by
//! doubling ([`doalc`](PathOps::doalc)) up to the maximum depth fixed at
//! construction.
//!
//! A window is *aligned* when it is the left child of its parent, i.e.
//! `index % (2 * len) == 0`. Every public operation leaves `index` a
//! multiple of `len`; `later` and `merge` repair alignment on the way.

use tracing::trace;

use crate::error::{VmError, VmResult};
use crate::opcode::Opcode;
use crate::store::{BitStore, CELL};

/// The sixteen named operations a Dao cursor exposes, in opcode order.
/// [`Cursor`] is the one implementation; the dispatcher consumes the
/// trait so the operation surface stays in a single place.
pub trait PathOps {
    /// `IDLES` - do nothing.
    fn idles(&mut self) -> VmResult<()>;
    /// `SWAPS` - exchange the halves of the window, eagerly.
    fn swaps(&mut self) -> VmResult<()>;
    /// `LATER` - advance to the next same-width window, merging on carry.
    fn later(&mut self) -> VmResult<()>;
    /// `MERGE` - widen the window to its parent. A window already
    /// covering the whole allocation has no parent and stays put.
    fn merge(&mut self) -> VmResult<()>;
    /// `SIFTS` - not yet defined.
    fn sifts(&mut self) -> VmResult<()>;
    /// `EXECS` - spawn execution of the selection (child programs are
    /// outside this machine's scope; currently a no-op).
    fn execs(&mut self) -> VmResult<()>;
    /// `DELEV` - decrement the operating level.
    fn delev(&mut self) -> VmResult<()>;
    /// `EQUAL` - not yet defined.
    fn equal(&mut self) -> VmResult<()>;
    /// `HALVE` - narrow the window to its left half.
    fn halve(&mut self) -> VmResult<()>;
    /// `UPLEV` - not yet defined.
    fn uplev(&mut self) -> VmResult<()>;
    /// `READS` - render the window as text.
    fn reads(&mut self) -> VmResult<String>;
    /// `DEALC` - not yet defined.
    fn dealc(&mut self) -> VmResult<()>;
    /// `SPLIT` - polarize: left half all-ones, right half all-zeros.
    fn split(&mut self) -> VmResult<()>;
    /// `POLAR` - not yet defined.
    fn polar(&mut self) -> VmResult<()>;
    /// `DOALC` - double the allocation and widen to track it.
    fn doalc(&mut self) -> VmResult<()>;
    /// `INPUT` - not yet defined.
    fn input(&mut self) -> VmResult<()>;
}

/// Cursor state over an owned store. One instance per running program.
#[derive(Debug, Clone)]
pub struct Cursor {
    store: BitStore,
    /// Upper bound on tree depth; memory tops out at `2^max_depth` bits.
    max_depth: u32,
    /// Doublings performed so far; `alloc == 1 << alloc_depth`.
    alloc_depth: u32,
    /// Live bits.
    alloc: u64,
    /// Window depth; `len == 1 << len_depth`.
    len_depth: u32,
    /// Window width in bits.
    len: u64,
    /// Bit offset of the window start.
    index: u64,
    /// Lexical scope counter. Nothing here reads it; DELEV moves it.
    level: i32,
}

impl Cursor {
    /// A fresh cursor bounded at `2^max_depth` bits, selecting the
    /// single bit at index 0 of a one-bit allocation.
    pub fn new(max_depth: u32) -> Self {
        Cursor {
            store: BitStore::new(max_depth),
            max_depth,
            alloc_depth: 0,
            alloc: 1,
            len_depth: 0,
            len: 1,
            index: 0,
            level: 0,
        }
    }

    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    pub fn alloc(&self) -> u64 {
        self.alloc
    }

    pub fn alloc_depth(&self) -> u32 {
        self.alloc_depth
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn len_depth(&self) -> u32 {
        self.len_depth
    }

    pub fn index(&self) -> u64 {
        self.index
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn store(&self) -> &BitStore {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut BitStore {
        &mut self.store
    }

    /// Whether the window is the left child of its parent.
    pub fn aligned(&self) -> bool {
        self.index % (self.len << 1) == 0
    }

    /// Load a packed program: bytes into the store in order, `alloc`
    /// rounded up to the next power of two of the loaded bit count, the
    /// window reset to the first bit.
    pub fn load_program(&mut self, bytes: &[u8]) -> VmResult<()> {
        let bits = bytes.len() as u64 * 8;
        let bound = 1u64 << self.max_depth;
        if bits > bound {
            return Err(VmError::ProgramTooLarge { bits, capacity: bound });
        }
        let loaded = self.store.load_bytes(bytes)?;
        self.alloc = loaded.next_power_of_two();
        self.alloc_depth = self.alloc.trailing_zeros();
        self.len = 1;
        self.len_depth = 0;
        self.index = 0;
        Ok(())
    }

    /// Deepen the tree below a single-bit leaf. What a sub-bit selection
    /// means is an open question in the language; faults until defined.
    fn descend(&mut self) -> VmResult<()> {
        Err(VmError::SubBitDescent)
    }
}

impl PathOps for Cursor {
    fn idles(&mut self) -> VmResult<()> {
        Ok(())
    }

    fn swaps(&mut self) -> VmResult<()> {
        if self.len == 1 {
            return Ok(());
        }
        if self.len <= CELL {
            let half = self.len >> 1;
            let field = self.store.read(self.index, self.len);
            let left = field >> half;
            let right = field & BitStore::mask(half);
            self.store.write(self.index, self.len, (right << half) | left);
        } else {
            // Mirror whole cells from the ends inward. Coarser than a
            // recursive bit mirror, and documented as such.
            let mut left = (self.index / CELL) as usize;
            let mut right = left + (self.len / CELL) as usize - 1;
            let cells = self.store.cells_mut();
            while left < right {
                cells.swap(left, right);
                left += 1;
                right -= 1;
            }
        }
        trace!(index = self.index, len = self.len, "swapped");
        Ok(())
    }

    fn later(&mut self) -> VmResult<()> {
        if self.aligned() {
            self.index += self.len;
            Ok(())
        } else {
            // Right child with no sibling to its right: carry upward.
            self.merge()
        }
    }

    fn merge(&mut self) -> VmResult<()> {
        // Once the window covers the allocation there is no parent to
        // widen into; the operation stays total by doing nothing.
        if self.len >= self.alloc {
            return Ok(());
        }
        if !self.aligned() {
            self.index -= self.len;
        }
        self.len <<= 1;
        self.len_depth += 1;
        Ok(())
    }

    fn sifts(&mut self) -> VmResult<()> {
        Err(VmError::Unimplemented(Opcode::Sifts))
    }

    fn execs(&mut self) -> VmResult<()> {
        Ok(())
    }

    fn delev(&mut self) -> VmResult<()> {
        self.level -= 1;
        Ok(())
    }

    fn equal(&mut self) -> VmResult<()> {
        Err(VmError::Unimplemented(Opcode::Equal))
    }

    fn halve(&mut self) -> VmResult<()> {
        if self.len == 1 {
            return self.descend();
        }
        self.len_depth -= 1;
        self.len >>= 1;
        Ok(())
    }

    fn uplev(&mut self) -> VmResult<()> {
        Err(VmError::Unimplemented(Opcode::Uplev))
    }

    fn reads(&mut self) -> VmResult<String> {
        let report = self.store.report(self.index, self.len);
        render_window(&report, self.len, CELL)
    }

    fn dealc(&mut self) -> VmResult<()> {
        Err(VmError::Unimplemented(Opcode::Dealc))
    }

    fn split(&mut self) -> VmResult<()> {
        if self.len == 1 {
            self.descend()?;
            return self.split();
        }
        if self.len <= CELL {
            let half = self.len >> 1;
            self.store.write(self.index, self.len, BitStore::mask(half) << half);
        } else {
            let first = (self.index / CELL) as usize;
            let count = (self.len / CELL) as usize;
            let cells = self.store.cells_mut();
            cells[first..first + count / 2].fill(!0);
            cells[first + count / 2..first + count].fill(0);
        }
        trace!(index = self.index, len = self.len, "polarized");
        Ok(())
    }

    fn polar(&mut self) -> VmResult<()> {
        Err(VmError::Unimplemented(Opcode::Polar))
    }

    fn doalc(&mut self) -> VmResult<()> {
        if self.alloc_depth >= self.max_depth {
            return Err(VmError::AllocExceeded { max_depth: self.max_depth });
        }
        self.alloc <<= 1;
        self.alloc_depth += 1;
        trace!(alloc = self.alloc, "grew allocation");
        self.merge()
    }

    fn input(&mut self) -> VmResult<()> {
        Err(VmError::Unimplemented(Opcode::Input))
    }
}

/// Render one window as text. `cell_bits` is the storage word width the
/// report was assembled with; the 8- and 16-bit character forms depend
/// on it, so it is an explicit parameter rather than a buried constant.
///
/// Widths under 8 render as exactly `len` binary digits. Width 8 renders
/// one byte as a character, width 16 one 16-bit unit. Wider windows have
/// no defined rendering yet.
pub fn render_window(report: &[u64], len: u64, cell_bits: u64) -> VmResult<String> {
    if len < 8 {
        Ok(format!("{:0width$b}", report[0], width = len as usize))
    } else if len == 8 {
        Ok(char::from(report[0] as u8).to_string())
    } else if len == 16 {
        let unit = if cell_bits >= 16 {
            report[0] as u16
        } else {
            ((report[0] << 8) | report[1]) as u16
        };
        let ch = char::from_u32(unit as u32).unwrap_or(char::REPLACEMENT_CHARACTER);
        Ok(ch.to_string())
    } else {
        Err(VmError::UnrenderableWidth(len))
    }
}
