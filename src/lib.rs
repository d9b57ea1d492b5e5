/// Daoyu - Dao Language Compiler and Interpreter Library
///
/// This library implements the Dao esoteric language: a single growable,
/// bit-addressable memory navigated by a binary-tree cursor, where the
/// same bits serve as both program and data.
///
/// # Architecture
///
/// The pipeline consists of two stages:
///
/// 1. **Compilation** (`compile` module)
///    - Maps the 16 source symbols to 4-bit codes
///    - Handles `@` comments, tab/space skipping
///    - Packs codes two per byte, high nybble first, into a raw stream
///
/// 2. **Execution** (`store`, `cursor`, `machine` modules)
///    - `BitStore`: fixed array of 64-bit cells addressed by bit
///    - `Cursor`: a power-of-two window over the store, moved only by
///      halving, merging, and sibling advance - a zipper over the
///      implicit complete binary tree whose leaves are single bits
///    - `Machine`: the fetch-decode-execute loop reading 4-bit codes at
///      the cursor's position through the 16-entry opcode table
///
/// # Example
///
/// ```rust
/// use daoyu::compile::compile;
/// use daoyu::machine::{Machine, MachineConfig};
///
/// // Two growth instructions pack into one byte
/// let stream = compile("$$");
/// assert_eq!(stream, vec![0xEE]);
///
/// let mut machine = Machine::with_output(10, MachineConfig::default(), Vec::new());
/// machine.load(&stream).unwrap();
/// assert_eq!(machine.cursor().alloc(), 8);
/// ```
///
/// # Language Model
///
/// - **Window**: the cursor's selection `(index, len)`, always a
///   power-of-two width, always `len`-aligned
/// - **Allocation**: live bits, grown only by doubling (`DOALC`) up to
///   the `2^max_depth` bound fixed at construction
/// - **Dispatch**: the loop never advances the cursor itself; the
///   program counter moves only through the invoked operations
/// - **Undefined operations**: six opcodes, sub-bit descent, and the
///   sift scan mode are declared but not defined; each faults with a
///   distinct error rather than improvising semantics
pub mod compile;
pub mod cursor;
pub mod error;
pub mod machine;
pub mod opcode;
pub mod store;

pub use compile::{compile, decompile};
pub use cursor::{Cursor, PathOps};
pub use error::{VmError, VmResult};
pub use machine::{Machine, MachineConfig, ScanMode, Termination};
pub use opcode::Opcode;
pub use store::{BitStore, CELL, CELL_DEPTH};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compile_simple() {
        assert_eq!(compile(".!"), vec![0x01]);
    }

    #[test]
    fn test_compile_and_load() {
        let stream = compile("$$$$");
        let mut machine = Machine::with_output(10, MachineConfig::default(), Vec::new());
        machine.load(&stream).unwrap();
        assert_eq!(machine.cursor().alloc(), 16);
        assert_eq!(machine.cursor().index(), 0);
    }

    #[test]
    fn test_run_surfaces_undefined_operation() {
        let stream = compile(";");
        let mut machine = Machine::with_output(10, MachineConfig::default(), Vec::new());
        machine.load(&stream).unwrap();
        assert_eq!(machine.run(), Err(VmError::Unimplemented(Opcode::Input)));
    }

    #[test]
    fn test_cursor_grow_and_walk() {
        let mut cursor = Cursor::new(8);
        cursor.doalc().unwrap();
        cursor.doalc().unwrap();
        assert_eq!(cursor.alloc(), 4);
        assert_eq!(cursor.len(), 4);
        cursor.halve().unwrap();
        cursor.later().unwrap();
        assert_eq!((cursor.index(), cursor.len()), (2, 2));
    }
}
