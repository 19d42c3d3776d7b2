//! Bytecode virtual machine that turns a genome into a movement trajectory.
//!
//! Memory holds [`ARCHITECTURE`] 8-bit words. Each word splits into a 2-bit
//! opcode (high bits) and a 6-bit operand address (low bits):
//!
//! | opcode | meaning                                             |
//! |--------|-----------------------------------------------------|
//! | `00`   | increment the word at the operand address (wrapping) |
//! | `01`   | decrement the word at the operand address (wrapping) |
//! | `10`   | jump to the operand address                          |
//! | `11`   | emit a move chosen by the popcount of the whole word |
//!
//! Increment and decrement may rewrite words the program counter has not
//! reached yet, so a program can change its own shape while running.

use std::fmt;

use crate::schema::Move;

/// Number of addressable memory slots.
pub const ARCHITECTURE: usize = 64;

/// Maximum instructions processed in one execution.
pub const MAX_INSTRUCTIONS: usize = 500;

const OPERAND_MASK: u8 = 0b0011_1111;

/// Error type for machine execution.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MachineError {
    #[error("Instruction budget of {limit} exceeded")]
    InstructionBudgetExceeded { limit: usize },
}

/// A decoded instruction word.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    Increment(usize),
    Decrement(usize),
    Jump(usize),
    Emit(Move),
}

impl Instruction {
    /// Decode an 8-bit word.
    pub fn decode(word: u8) -> Self {
        let address = (word & OPERAND_MASK) as usize;
        match word >> 6 {
            0 => Instruction::Increment(address),
            1 => Instruction::Decrement(address),
            2 => Instruction::Jump(address),
            _ => Instruction::Emit(Move::from_word(word)),
        }
    }
}

impl Move {
    /// Map a full instruction word to a move by its number of set bits.
    ///
    /// Fewer than three bits is `Up`, exactly three is `Down`, five or six is
    /// `Right`, and everything else (four, seven, eight) is `Left`.
    pub fn from_word(word: u8) -> Self {
        match word.count_ones() {
            0..=2 => Move::Up,
            3 => Move::Down,
            5 | 6 => Move::Right,
            _ => Move::Left,
        }
    }
}

/// The virtual machine: an immutable address row beside a mutable data row.
#[derive(Debug, Clone)]
pub struct Machine {
    addresses: [u8; ARCHITECTURE],
    memory: [u8; ARCHITECTURE],
}

impl Default for Machine {
    fn default() -> Self {
        Self::new()
    }
}

impl Machine {
    /// Create a machine with zeroed memory.
    pub fn new() -> Self {
        let mut addresses = [0u8; ARCHITECTURE];
        for (slot, address) in addresses.iter_mut().enumerate() {
            *address = slot as u8;
        }

        Self {
            addresses,
            memory: [0; ARCHITECTURE],
        }
    }

    /// Zero every data word.
    pub fn clear(&mut self) {
        self.memory = [0; ARCHITECTURE];
    }

    /// Clear memory, then copy `program` into it.
    ///
    /// Programs longer than [`ARCHITECTURE`] are truncated; shorter ones
    /// leave the tail zeroed.
    pub fn load(&mut self, program: &[u8]) {
        self.clear();
        let len = program.len().min(ARCHITECTURE);
        self.memory[..len].copy_from_slice(&program[..len]);
    }

    /// Address row: each slot's own index.
    pub fn addresses(&self) -> &[u8; ARCHITECTURE] {
        &self.addresses
    }

    /// Data row as left by the last load or execution.
    pub fn memory(&self) -> &[u8; ARCHITECTURE] {
        &self.memory
    }

    /// Load `program` and execute it.
    pub fn run(&mut self, program: &[u8]) -> Result<Vec<Move>, MachineError> {
        self.load(program);
        self.execute()
    }

    /// Execute the loaded program from slot 0 until the program counter
    /// runs off the end of memory.
    ///
    /// Memory is modified in place; call [`Machine::load`] before reuse.
    pub fn execute(&mut self) -> Result<Vec<Move>, MachineError> {
        let mut trajectory = Vec::new();
        let mut executed = 0;
        let mut pc = 0;

        while pc < ARCHITECTURE {
            if executed >= MAX_INSTRUCTIONS {
                return Err(MachineError::InstructionBudgetExceeded {
                    limit: MAX_INSTRUCTIONS,
                });
            }
            executed += 1;

            match Instruction::decode(self.memory[pc]) {
                Instruction::Increment(address) => {
                    self.memory[address] = self.memory[address].wrapping_add(1);
                }
                Instruction::Decrement(address) => {
                    self.memory[address] = self.memory[address].wrapping_sub(1);
                }
                Instruction::Jump(address) => {
                    pc = address;
                    continue;
                }
                Instruction::Emit(step) => trajectory.push(step),
            }
            pc += 1;
        }

        Ok(trajectory)
    }
}

impl fmt::Display for Machine {
    /// One slot per line: 6-bit address beside the 8-bit data word.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (address, word) in self.addresses.iter().zip(self.memory.iter()) {
            writeln!(f, "{:06b} {:08b}", address, word)?;
        }
        Ok(())
    }
}
