//! The 16-entry opcode table.
//!
//! Every Dao instruction is a 4-bit code ("nybble"). The table below is
//! fixed and ordered: code 0 is IDLES, code 15 is INPUT. Six of the
//! sixteen operations are declared by the language but have no defined
//! semantics yet; they stay in the table so dispatch remains exhaustive,
//! and invoking them faults with [`VmError::Unimplemented`].
//!
//! [`VmError::Unimplemented`]: crate::error::VmError::Unimplemented

use std::fmt;

/// A 4-bit Dao instruction code, in code order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Opcode {
    /// `.` - do nothing
    Idles = 0x0,
    /// `!` - exchange the halves of the selection
    Swaps = 0x1,
    /// `/` - advance to the next same-width window, merging on carry
    Later = 0x2,
    /// `)` (also `]` in source) - widen the selection to its parent
    Merge = 0x3,
    /// `%` - sift the tree (not yet defined)
    Sifts = 0x4,
    /// `#` - execute the selection as instructions
    Execs = 0x5,
    /// `>` - decrement the operating level
    Delev = 0x6,
    /// `=` - compare window edges (not yet defined)
    Equal = 0x7,
    /// `(` - narrow the selection to its left half
    Halve = 0x8,
    /// `<` - increment the operating level (not yet defined)
    Uplev = 0x9,
    /// `:` - render the selection as text
    Reads = 0xA,
    /// `S` - shrink the allocation (not yet defined)
    Dealc = 0xB,
    /// `[` - polarize: left half all-ones, right half all-zeros
    Split = 0xC,
    /// `*` - query polarity (not yet defined)
    Polar = 0xD,
    /// `$` - double the allocation
    Doalc = 0xE,
    /// `;` - capture external input (not yet defined)
    Input = 0xF,
}

/// Canonical source symbol per code, in code order.
const SYMBOLS: [char; 16] = [
    '.', '!', '/', ')', '%', '#', '>', '=', '(', '<', ':', 'S', '[', '*', '$', ';',
];

impl Opcode {
    /// All sixteen opcodes in code order.
    pub const TABLE: [Opcode; 16] = [
        Opcode::Idles,
        Opcode::Swaps,
        Opcode::Later,
        Opcode::Merge,
        Opcode::Sifts,
        Opcode::Execs,
        Opcode::Delev,
        Opcode::Equal,
        Opcode::Halve,
        Opcode::Uplev,
        Opcode::Reads,
        Opcode::Dealc,
        Opcode::Split,
        Opcode::Polar,
        Opcode::Doalc,
        Opcode::Input,
    ];

    /// Decode a fetched nybble. Only the low four bits are meaningful.
    pub fn from_nybble(code: u8) -> Opcode {
        Self::TABLE[(code & 0xF) as usize]
    }

    /// The 4-bit code for this opcode.
    pub fn to_nybble(self) -> u8 {
        self as u8
    }

    /// Canonical source symbol. `]` compiles to the same code as `)` and
    /// decodes back to `)`.
    pub fn symbol(self) -> char {
        SYMBOLS[self as usize]
    }

    /// The operation's mnemonic name.
    pub fn name(self) -> &'static str {
        match self {
            Opcode::Idles => "IDLES",
            Opcode::Swaps => "SWAPS",
            Opcode::Later => "LATER",
            Opcode::Merge => "MERGE",
            Opcode::Sifts => "SIFTS",
            Opcode::Execs => "EXECS",
            Opcode::Delev => "DELEV",
            Opcode::Equal => "EQUAL",
            Opcode::Halve => "HALVE",
            Opcode::Uplev => "UPLEV",
            Opcode::Reads => "READS",
            Opcode::Dealc => "DEALC",
            Opcode::Split => "SPLIT",
            Opcode::Polar => "POLAR",
            Opcode::Doalc => "DOALC",
            Opcode::Input => "INPUT",
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}
