//! Fault taxonomy for the Daoyu machine.
//!
//! Three classes of failure exist, and they are kept distinct:
//! - resource exhaustion (`AllocExceeded`, `ProgramTooLarge`)
//! - operations the language leaves undefined (`Unimplemented`,
//!   `SubBitDescent`, `SiftUndefined`, `UnrenderableWidth`)
//! - output plumbing (`Output`)
//!
//! An undefined operation is a gap in the language, not a runtime
//! resource problem, so it never masquerades as exhaustion.

use std::fmt;

use crate::opcode::Opcode;

/// Result of machine and cursor operations
pub type VmResult<T> = Result<T, VmError>;

/// Errors that can occur while loading or running a program
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    /// Growth requested past the maximum depth fixed at construction
    AllocExceeded { max_depth: u32 },
    /// A loaded program needs more bits than the store can ever hold
    ProgramTooLarge { bits: u64, capacity: u64 },
    /// An opcode whose semantics the language has not yet defined
    Unimplemented(Opcode),
    /// Descending below a single bit has no defined meaning
    SubBitDescent,
    /// The sift scan mode is declared but not specified
    SiftUndefined,
    /// No rendering is defined for windows of this width
    UnrenderableWidth(u64),
    /// Writing rendered output to the sink failed
    Output(String),
}

impl fmt::Display for VmError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AllocExceeded { max_depth } => {
                write!(f, "Allocation exceeded specified memory (2^{} bits)", max_depth)
            }
            Self::ProgramTooLarge { bits, capacity } => {
                write!(f, "Program needs {} bits but the store holds at most {}", bits, capacity)
            }
            Self::Unimplemented(op) => write!(f, "Operation not yet defined: {}", op),
            Self::SubBitDescent => write!(f, "Descent below a single bit is not yet defined"),
            Self::SiftUndefined => write!(f, "Sift scan mode is not yet defined"),
            Self::UnrenderableWidth(len) => {
                write!(f, "No defined rendering for a {}-bit window", len)
            }
            Self::Output(msg) => write!(f, "Failed to write output: {}", msg),
        }
    }
}

impl std::error::Error for VmError {}
