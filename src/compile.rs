//! Compiler from symbolic Dao source to the packed nybble stream.
//!
//! Sixteen symbols map to the sixteen 4-bit codes; `]` and `)` share
//! code 3, so compiled streams are not invertible back to source. Codes
//! pack two per byte, high nybble first, and an odd-length symbol stream
//! flushes its pending high nybble with a zero low nybble. The output
//! carries no header or length field.
//!
//! `@` opens a comment (nestable: each `@` deepens it) and a carriage
//! return or line feed closes all of it. Tabs and spaces never compile
//! to anything. Any other unrecognized character is silently skipped.

use tracing::trace;

use crate::opcode::Opcode;

/// The 4-bit code for a source symbol, if it is one of the sixteen.
pub fn nybble_for(ch: char) -> Option<u8> {
    let code = match ch {
        '.' => 0x0,
        '!' => 0x1,
        '/' => 0x2,
        ']' | ')' => 0x3,
        '%' => 0x4,
        '#' => 0x5,
        '>' => 0x6,
        '=' => 0x7,
        '(' => 0x8,
        '<' => 0x9,
        ':' => 0xA,
        'S' => 0xB,
        '[' => 0xC,
        '*' => 0xD,
        '$' => 0xE,
        ';' => 0xF,
        _ => return None,
    };
    Some(code)
}

/// Compile source text into the packed byte stream.
pub fn compile(source: &str) -> Vec<u8> {
    let mut out = Vec::new();
    let mut pending: Option<u8> = None;
    let mut comment_depth: u32 = 0;

    for ch in source.chars() {
        match ch {
            '\t' | ' ' => continue,
            '@' => comment_depth += 1,
            '\r' | '\n' => comment_depth = 0,
            _ if comment_depth > 0 => {}
            _ => {
                if let Some(code) = nybble_for(ch) {
                    trace!(symbol = %ch, op = %Opcode::from_nybble(code), "compiled");
                    match pending.take() {
                        Some(high) => out.push(high | code),
                        None => pending = Some(code << 4),
                    }
                }
            }
        }
    }

    // Odd symbol count: flush the held high nybble alone.
    if let Some(high) = pending {
        out.push(high);
    }
    out
}

/// Render a packed stream back as canonical symbols, for diagnostics.
/// Lossy where the source used `]`.
pub fn decompile(stream: &[u8]) -> String {
    let mut out = String::with_capacity(stream.len() * 2);
    for byte in stream {
        out.push(Opcode::from_nybble(byte >> 4).symbol());
        out.push(Opcode::from_nybble(byte & 0xF).symbol());
    }
    out
}
