use crate::constants::{
    ADDRESS_MASK, DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_ADDRESS, KEY_COUNT, MEMORY_SIZE,
    PROGRAM_START, REGISTER_COUNT, SPRITE_SHEET, STACK_DEPTH,
};

/// The FrameBuffer is indexed as [y][x]; each pixel is 1 (on) or 0 (off)
pub type FrameBuffer = [[u8; DISPLAY_WIDTH]; DISPLAY_HEIGHT];

/// A snapshot of the Chip-8 machine state
///
/// ## CPU
/// Registers
/// - (v) 16 8-bit registers (V0..VF)
///     - VF doubles as the carry, borrow and collision flag
/// - (i) a 16-bit memory address register
///
/// Counter
/// - (pc) a 16-bit program counter, advanced by 2 on every fetch
///
/// Pointer
/// - (sp) the next free slot in `stack`, 0..=16
///
/// Timers
/// - 2 8-bit timers (delay & sound), decremented by the host at 60Hz
///
/// ## Memory
/// - 16 return addresses
/// - 4096 bytes of addressable memory
///     - 0x000..0x200 is reserved; the font lives at `FONT_ADDRESS`
/// - 32x64 frame buffer
///
/// ## Input
/// - 16 keys, pressed or released
/// - `awaiting_key` holds the register that Fx0A will write once a key goes down
///
/// No field is hidden; every handler reads and writes through this struct alone.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct State {
    pub v: [u8; REGISTER_COUNT],
    pub i: u16,
    pub pc: u16,
    pub sp: u8,
    pub stack: [u16; STACK_DEPTH],
    pub delay_timer: u8,
    pub sound_timer: u8,
    pub memory: [u8; MEMORY_SIZE],
    pub frame_buffer: FrameBuffer,
    pub keypad: [bool; KEY_COUNT],
    pub opcode: u16,
    pub draw_flag: bool,
    pub awaiting_key: Option<usize>,
}

impl State {
    pub fn new() -> Self {
        let mut memory = [0; MEMORY_SIZE];
        let font = FONT_ADDRESS as usize;
        memory[font..font + SPRITE_SHEET.len()].copy_from_slice(&SPRITE_SHEET);

        State {
            v: [0; REGISTER_COUNT],
            i: 0,
            pc: PROGRAM_START,
            sp: 0,
            stack: [0; STACK_DEPTH],
            delay_timer: 0,
            sound_timer: 0,
            memory,
            frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
            keypad: [false; KEY_COUNT],
            opcode: 0,
            draw_flag: false,
            awaiting_key: None,
        }
    }

    /// Reads the byte at `addr`, wrapping into the 12-bit address space.
    pub fn byte_at(&self, addr: u16) -> u8 {
        self.memory[(addr & ADDRESS_MASK) as usize]
    }

    /// Reads the big-endian word at `addr`; both halves wrap independently.
    pub fn word_at(&self, addr: u16) -> u16 {
        u16::from(self.byte_at(addr)) << 8 | u16::from(self.byte_at(addr.wrapping_add(1)))
    }
}

impl Default for State {
    fn default() -> Self {
        Self::new()
    }
}
