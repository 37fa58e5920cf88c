use crate::entropy::EntropySource;
use crate::error::Chip8Error;
use crate::opcode::Opcode;
use crate::operations::*;
use crate::quirks::Quirks;
use crate::state::State;

/// A decoded Chip-8 instruction.
///
/// `x` and `y` name registers, `kk` and `n` are immediates and `nnn` is an address.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Instruction {
    /// 00E0
    Clear,
    /// 00EE
    Return,
    /// 1nnn
    Jump { nnn: u16 },
    /// 2nnn
    Call { nnn: u16 },
    /// 3xkk
    SkipEqualByte { x: usize, kk: u8 },
    /// 4xkk
    SkipNotEqualByte { x: usize, kk: u8 },
    /// 5xy0
    SkipEqualRegister { x: usize, y: usize },
    /// 6xkk
    LoadByte { x: usize, kk: u8 },
    /// 7xkk
    AddByte { x: usize, kk: u8 },
    /// 8xy0
    Move { x: usize, y: usize },
    /// 8xy1
    Or { x: usize, y: usize },
    /// 8xy2
    And { x: usize, y: usize },
    /// 8xy3
    Xor { x: usize, y: usize },
    /// 8xy4
    AddRegister { x: usize, y: usize },
    /// 8xy5
    Subtract { x: usize, y: usize },
    /// 8xy6
    ShiftRight { x: usize },
    /// 8xy7
    SubtractReversed { x: usize, y: usize },
    /// 8xyE
    ShiftLeft { x: usize },
    /// 9xy0
    SkipNotEqualRegister { x: usize, y: usize },
    /// Annn
    LoadIndex { nnn: u16 },
    /// Bnnn
    JumpOffset { nnn: u16 },
    /// Cxkk
    Random { x: usize, kk: u8 },
    /// Dxyn
    Draw { x: usize, y: usize, n: u8 },
    /// Ex9E
    SkipKeyPressed { x: usize },
    /// ExA1
    SkipKeyReleased { x: usize },
    /// Fx07
    LoadDelay { x: usize },
    /// Fx0A
    WaitKey { x: usize },
    /// Fx15
    SetDelay { x: usize },
    /// Fx18
    SetSound { x: usize },
    /// Fx1E
    AddIndex { x: usize },
    /// Fx29
    LoadGlyph { x: usize },
    /// Fx33
    StoreBcd { x: usize },
    /// Fx55
    StoreRegisters { x: usize },
    /// Fx65
    LoadRegisters { x: usize },
}

impl Instruction {
    /// Selects the Instruction for an opcode fetched from `address`.
    pub fn decode(op: u16, address: u16) -> Result<Self, Chip8Error> {
        let (x, y) = (op.x(), op.y());
        let instruction = match op.nibbles() {
            (0x0, 0x0, 0xE, 0x0) => Instruction::Clear,
            (0x0, 0x0, 0xE, 0xE) => Instruction::Return,
            (0x1, ..) => Instruction::Jump { nnn: op.nnn() },
            (0x2, ..) => Instruction::Call { nnn: op.nnn() },
            (0x3, ..) => Instruction::SkipEqualByte { x, kk: op.kk() },
            (0x4, ..) => Instruction::SkipNotEqualByte { x, kk: op.kk() },
            (0x5, .., 0x0) => Instruction::SkipEqualRegister { x, y },
            (0x6, ..) => Instruction::LoadByte { x, kk: op.kk() },
            (0x7, ..) => Instruction::AddByte { x, kk: op.kk() },
            (0x8, .., 0x0) => Instruction::Move { x, y },
            (0x8, .., 0x1) => Instruction::Or { x, y },
            (0x8, .., 0x2) => Instruction::And { x, y },
            (0x8, .., 0x3) => Instruction::Xor { x, y },
            (0x8, .., 0x4) => Instruction::AddRegister { x, y },
            (0x8, .., 0x5) => Instruction::Subtract { x, y },
            (0x8, .., 0x6) => Instruction::ShiftRight { x },
            (0x8, .., 0x7) => Instruction::SubtractReversed { x, y },
            (0x8, .., 0xE) => Instruction::ShiftLeft { x },
            (0x9, .., 0x0) => Instruction::SkipNotEqualRegister { x, y },
            (0xA, ..) => Instruction::LoadIndex { nnn: op.nnn() },
            (0xB, ..) => Instruction::JumpOffset { nnn: op.nnn() },
            (0xC, ..) => Instruction::Random { x, kk: op.kk() },
            (0xD, ..) => Instruction::Draw { x, y, n: op.n() },
            (0xE, _, 0x9, 0xE) => Instruction::SkipKeyPressed { x },
            (0xE, _, 0xA, 0x1) => Instruction::SkipKeyReleased { x },
            (0xF, _, 0x0, 0x7) => Instruction::LoadDelay { x },
            (0xF, _, 0x0, 0xA) => Instruction::WaitKey { x },
            (0xF, _, 0x1, 0x5) => Instruction::SetDelay { x },
            (0xF, _, 0x1, 0x8) => Instruction::SetSound { x },
            (0xF, _, 0x1, 0xE) => Instruction::AddIndex { x },
            (0xF, _, 0x2, 0x9) => Instruction::LoadGlyph { x },
            (0xF, _, 0x3, 0x3) => Instruction::StoreBcd { x },
            (0xF, _, 0x5, 0x5) => Instruction::StoreRegisters { x },
            (0xF, _, 0x6, 0x5) => Instruction::LoadRegisters { x },
            _ => return Err(Chip8Error::UnknownOpcode { opcode: op, address }),
        };
        Ok(instruction)
    }

    /// Applies the instruction to a freshly fetched `state`, returning the next state.
    pub(crate) fn execute(
        self,
        state: &State,
        entropy: &mut dyn EntropySource,
        quirks: Quirks,
    ) -> Result<State, Chip8Error> {
        let next = match self {
            Instruction::Clear => clr(state),
            Instruction::Return => rts(state)?,
            Instruction::Jump { nnn } => jump(state, nnn),
            Instruction::Call { nnn } => call(state, nnn)?,
            Instruction::SkipEqualByte { x, kk } => ske(state, x, kk),
            Instruction::SkipNotEqualByte { x, kk } => skne(state, x, kk),
            Instruction::SkipEqualRegister { x, y } => skre(state, x, y),
            Instruction::LoadByte { x, kk } => load(state, x, kk),
            Instruction::AddByte { x, kk } => add(state, x, kk),
            Instruction::Move { x, y } => mv(state, x, y),
            Instruction::Or { x, y } => or(state, x, y),
            Instruction::And { x, y } => and(state, x, y),
            Instruction::Xor { x, y } => xor(state, x, y),
            Instruction::AddRegister { x, y } => addr(state, x, y),
            Instruction::Subtract { x, y } => sub(state, x, y, quirks),
            Instruction::ShiftRight { x } => shr(state, x),
            Instruction::SubtractReversed { x, y } => subn(state, x, y),
            Instruction::ShiftLeft { x } => shl(state, x),
            Instruction::SkipNotEqualRegister { x, y } => skrne(state, x, y),
            Instruction::LoadIndex { nnn } => loadi(state, nnn),
            Instruction::JumpOffset { nnn } => jumpi(state, nnn),
            Instruction::Random { x, kk } => rand(state, x, kk, entropy),
            Instruction::Draw { x, y, n } => draw(state, x, y, n),
            Instruction::SkipKeyPressed { x } => skpr(state, x),
            Instruction::SkipKeyReleased { x } => skup(state, x),
            Instruction::LoadDelay { x } => moved(state, x),
            Instruction::WaitKey { x } => keyd(state, x),
            Instruction::SetDelay { x } => loads(state, x),
            Instruction::SetSound { x } => ld(state, x),
            Instruction::AddIndex { x } => addi(state, x, quirks),
            Instruction::LoadGlyph { x } => ldspr(state, x),
            Instruction::StoreBcd { x } => bcd(state, x),
            Instruction::StoreRegisters { x } => stor(state, x),
            Instruction::LoadRegisters { x } => read(state, x),
        };
        Ok(next)
    }
}
