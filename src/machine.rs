//! Fetch-decode-execute loop over a [`Cursor`].
//!
//! The machine fetches a fixed 4-bit code at the cursor's current index
//! (regardless of the window width), decodes it through the opcode
//! table, and invokes the matching operation. The loop never advances
//! the cursor itself: the program counter moves only as a side effect of
//! the invoked operations, so instruction flow and data flow share the
//! same addressing primitives. A program whose opcodes never move the
//! cursor spins in place, which is why embedders (and tests) can bound
//! the loop with [`MachineConfig::max_steps`].

use std::io::{self, Write};

use tracing::{debug, warn};

use crate::cursor::{Cursor, PathOps};
use crate::error::{VmError, VmResult};
use crate::opcode::Opcode;

/// Width of one instruction fetch, in bits.
pub const NYBBLE: u64 = 4;

/// What the scan loop does with each fetched code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanMode {
    /// Invoke the decoded operation.
    Execute,
    /// Reorder the tree while scanning. Declared by the language, not
    /// yet specified; selecting it faults.
    Sift,
}

/// Machine configuration
#[derive(Debug, Clone)]
pub struct MachineConfig {
    /// Emit a `debug!` event per dispatch step
    pub trace: bool,
    /// Stop after this many dispatched operations (`None` = unbounded)
    pub max_steps: Option<u64>,
}

impl Default for MachineConfig {
    fn default() -> Self {
        MachineConfig { trace: false, max_steps: None }
    }
}

/// Why a scan loop stopped without a fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// The next 4-bit fetch would fall outside the allocated region.
    EndOfData,
    /// The configured step bound was reached first.
    StepLimit,
}

/// A single-program Dao machine: one cursor, one store, one loop.
///
/// Exclusively owned by one thread; nothing here is safe to drive
/// concurrently, and the design does not try to be.
pub struct Machine<W: Write> {
    cursor: Cursor,
    config: MachineConfig,
    out: W,
}

impl Machine<io::Stdout> {
    /// A machine bounded at `2^max_depth` bits, rendering to stdout.
    ///
    /// ```rust
    /// let mut machine = daoyu::Machine::new(10);
    /// machine.load(&daoyu::compile("$$")).unwrap();
    /// assert_eq!(machine.cursor().alloc(), 8);
    /// ```
    pub fn new(max_depth: u32) -> Self {
        Machine::with_output(max_depth, MachineConfig::default(), io::stdout())
    }
}

impl<W: Write> Machine<W> {
    pub fn with_output(max_depth: u32, config: MachineConfig, out: W) -> Self {
        Machine { cursor: Cursor::new(max_depth), config, out }
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    /// The sink `READS` renders into.
    pub fn output(&self) -> &W {
        &self.out
    }

    /// Load a packed program into the store and reset the cursor to the
    /// first bit. Dispatch starts wherever the cursor points, so this
    /// is all the setup a run needs.
    pub fn load(&mut self, bytes: &[u8]) -> VmResult<()> {
        self.cursor.load_program(bytes)
    }

    /// Run the loaded program to completion.
    pub fn run(&mut self) -> VmResult<Termination> {
        self.scan(ScanMode::Execute)
    }

    /// The scan loop: while a whole nybble fits in the allocated
    /// region, fetch at the cursor's index and act per `mode`.
    pub fn scan(&mut self, mode: ScanMode) -> VmResult<Termination> {
        if mode == ScanMode::Sift {
            warn!("sift scan requested but not defined");
            return Err(VmError::SiftUndefined);
        }
        let mut steps: u64 = 0;
        while self.cursor.index() + NYBBLE <= self.cursor.alloc() {
            if let Some(limit) = self.config.max_steps {
                if steps >= limit {
                    return Ok(Termination::StepLimit);
                }
            }
            let code = self.cursor.store().read(self.cursor.index(), NYBBLE) as u8;
            let op = Opcode::from_nybble(code);
            if self.config.trace {
                debug!(
                    step = steps,
                    index = self.cursor.index(),
                    len = self.cursor.len(),
                    alloc = self.cursor.alloc(),
                    op = %op,
                    symbol = %op.symbol(),
                    "dispatch"
                );
            }
            self.step(op)?;
            steps += 1;
        }
        Ok(Termination::EndOfData)
    }

    /// Execute one decoded opcode against the cursor. Exhaustive over
    /// the table, so the undefined entries stay visible here.
    pub fn step(&mut self, op: Opcode) -> VmResult<()> {
        match op {
            Opcode::Idles => self.cursor.idles(),
            Opcode::Swaps => self.cursor.swaps(),
            Opcode::Later => self.cursor.later(),
            Opcode::Merge => self.cursor.merge(),
            Opcode::Sifts => self.cursor.sifts(),
            Opcode::Execs => self.cursor.execs(),
            Opcode::Delev => self.cursor.delev(),
            Opcode::Equal => self.cursor.equal(),
            Opcode::Halve => self.cursor.halve(),
            Opcode::Uplev => self.cursor.uplev(),
            Opcode::Reads => {
                let text = self.cursor.reads()?;
                self.out
                    .write_all(text.as_bytes())
                    .and_then(|_| self.out.flush())
                    .map_err(|e| VmError::Output(e.to_string()))
            }
            Opcode::Dealc => self.cursor.dealc(),
            Opcode::Split => self.cursor.split(),
            Opcode::Polar => self.cursor.polar(),
            Opcode::Doalc => self.cursor.doalc(),
            Opcode::Input => self.cursor.input(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_machine(max_depth: u32, max_steps: Option<u64>) -> Machine<Vec<u8>> {
        let config = MachineConfig { trace: false, max_steps };
        Machine::with_output(max_depth, config, Vec::new())
    }

    #[test]
    fn test_empty_program_ends_immediately() {
        let mut machine = capture_machine(10, None);
        machine.load(&[]).unwrap();
        assert_eq!(machine.run().unwrap(), Termination::EndOfData);
    }

    #[test]
    fn test_idle_program_spins_until_step_limit() {
        let mut machine = capture_machine(10, Some(8));
        machine.load(&[0x00]).unwrap();
        assert_eq!(machine.run().unwrap(), Termination::StepLimit);
        assert_eq!(machine.cursor().index(), 0);
    }

    #[test]
    fn test_sift_mode_is_undefined() {
        let mut machine = capture_machine(10, None);
        machine.load(&[0x00]).unwrap();
        assert_eq!(machine.scan(ScanMode::Sift), Err(VmError::SiftUndefined));
    }

    #[test]
    fn test_stubbed_opcode_stops_the_loop() {
        // First nybble 0x4 (SIFTS) faults on the very first step
        let mut machine = capture_machine(10, None);
        machine.load(&[0x40]).unwrap();
        assert_eq!(machine.run(), Err(VmError::Unimplemented(Opcode::Sifts)));
    }

    #[test]
    fn test_growth_runs_to_exhaustion() {
        // DOALC at index 0 re-fetches itself forever; the machine dies
        // when growth passes the maximum depth.
        let mut machine = capture_machine(6, None);
        machine.load(&[0xE0]).unwrap();
        assert_eq!(machine.run(), Err(VmError::AllocExceeded { max_depth: 6 }));
        assert_eq!(machine.cursor().alloc(), 64);
    }

    #[test]
    fn test_reads_renders_to_sink() {
        // READS at len 1 renders the bit under the cursor, then the
        // step limit cuts the non-advancing loop.
        let mut machine = capture_machine(10, Some(1));
        machine.load(&[0xA0]).unwrap();
        assert_eq!(machine.run().unwrap(), Termination::StepLimit);
        assert_eq!(machine.output(), b"1");
    }
}
