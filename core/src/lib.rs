pub use chip8::{Chip8, Step};
pub use entropy::{EntropySource, SeededEntropy};
pub use error::Chip8Error;
pub use instruction::Instruction;
pub use quirks::Quirks;

mod chip8;
pub mod constants;
mod entropy;
mod error;
mod instruction;
mod opcode;
mod operations;
mod quirks;
pub mod state;
