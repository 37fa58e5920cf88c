use thiserror::Error;

/// Everything that can stop the machine.
///
/// None of these are recoverable mid-instruction. When one is returned the
/// machine state is exactly what it was before the failing cycle, so the host
/// can inspect it, then halt or reset.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum Chip8Error {
    #[error("Unknown opcode {opcode:#06X} at {address:#05X}")]
    UnknownOpcode { opcode: u16, address: u16 },

    #[error("Stack overflow calling {target:#05X} from {address:#05X}")]
    StackOverflow { target: u16, address: u16 },

    #[error("Stack underflow returning from {address:#05X}")]
    StackUnderflow { address: u16 },

    #[error("Address out of range: {len} bytes at {start:#05X} would run past the end of memory")]
    AddressOutOfRange { start: u16, len: usize },

    #[error("Invalid key {0:#04X}")]
    InvalidKey(u8),
}
