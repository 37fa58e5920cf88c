use log::{debug, trace, warn};

use crate::constants::{ADDRESS_MASK, KEY_COUNT, MAX_ROM_SIZE, PROGRAM_START};
use crate::entropy::{EntropySource, SeededEntropy};
use crate::error::Chip8Error;
use crate::instruction::Instruction;
use crate::quirks::Quirks;
use crate::state::{FrameBuffer, State};

/// What a single call to `Chip8::cycle` did
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Step {
    Executed(Instruction),
    /// Blocked on Fx0A; nothing was fetched
    AwaitingKey,
}

/// # Chip-8
/// Chip-8 is a virtual machine and corresponding interpreted language.
///
/// Tracks:
///  - current `state`
///  - the `entropy` source consumed by Cxkk
///  - which `quirks` are active
///
/// Supplies interfaces for:
/// - loading roms
/// - pressing and releasing keys
/// - advancing the CPU one instruction at a time
/// - advancing its timers
/// - inspecting its frame buffer for rendering by some display
///
/// Cadence is the host's business: `cycle` and `tick_timers` are independent.
pub struct Chip8<E: EntropySource = SeededEntropy> {
    state: State,
    entropy: E,
    quirks: Quirks,
}

impl Chip8<SeededEntropy> {
    pub fn new() -> Self {
        Self::with_parts(SeededEntropy::new(), Quirks::default())
    }

    pub fn with_quirks(quirks: Quirks) -> Self {
        Self::with_parts(SeededEntropy::new(), quirks)
    }
}

impl<E: EntropySource> Chip8<E> {
    pub fn with_entropy(entropy: E) -> Self {
        Self::with_parts(entropy, Quirks::default())
    }

    pub fn with_parts(entropy: E, quirks: Quirks) -> Self {
        Chip8 {
            state: State::new(),
            entropy,
            quirks,
        }
    }

    pub fn state(&self) -> &State {
        &self.state
    }

    pub fn quirks(&self) -> Quirks {
        self.quirks
    }

    /// Load a rom into memory at `PROGRAM_START`
    ///
    /// Nothing is written unless the whole rom fits.
    ///
    /// # Arguments
    /// * `rom` the program bytes
    pub fn load_rom(&mut self, rom: &[u8]) -> Result<(), Chip8Error> {
        if rom.len() > MAX_ROM_SIZE {
            return Err(Chip8Error::AddressOutOfRange {
                start: PROGRAM_START,
                len: rom.len(),
            });
        }
        let start = PROGRAM_START as usize;
        self.state.memory[start..start + rom.len()].copy_from_slice(rom);
        debug!("loaded {} byte rom at {:#05X}", rom.len(), PROGRAM_START);
        Ok(())
    }

    /// Returns the FrameBuffer if it changed since the last call
    pub fn take_frame(&mut self) -> Option<&FrameBuffer> {
        if self.state.draw_flag {
            self.state.draw_flag = false;
            Some(&self.state.frame_buffer)
        } else {
            None
        }
    }

    pub fn frame_buffer(&self) -> &FrameBuffer {
        &self.state.frame_buffer
    }

    /// Set the pressed status of key
    ///
    /// If an Fx0A is waiting and the key was up, the key is written to the
    /// waiting register and the machine resumes.
    ///
    /// # Arguments
    /// * `key` the hex value of the key that went down
    pub fn key_press(&mut self, key: u8) -> Result<(), Chip8Error> {
        let index = Self::key_index(key)?;
        let was_pressed = self.state.keypad[index];
        self.state.keypad[index] = true;
        if was_pressed {
            return Ok(());
        }
        if let Some(register) = self.state.awaiting_key.take() {
            debug!("key {:X} resumes execution into V{:X}", key, register);
            self.state.v[register] = key;
        }
        Ok(())
    }

    /// Unset the pressed status of key
    ///
    /// # Arguments
    /// * `key` the hex value of the key that went up
    pub fn key_release(&mut self, key: u8) -> Result<(), Chip8Error> {
        let index = Self::key_index(key)?;
        self.state.keypad[index] = false;
        Ok(())
    }

    fn key_index(key: u8) -> Result<usize, Chip8Error> {
        if (key as usize) < KEY_COUNT {
            Ok(key as usize)
        } else {
            Err(Chip8Error::InvalidKey(key))
        }
    }

    pub fn is_awaiting_key(&self) -> bool {
        self.state.awaiting_key.is_some()
    }

    /// Advances the CPU by a single cycle
    /// - returns `AwaitingKey` without fetching while an Fx0A is unresolved
    /// - otherwise fetches, advances pc by 2, decodes and executes
    ///
    /// On error the state is left exactly as it was before the call.
    pub fn cycle(&mut self) -> Result<Step, Chip8Error> {
        if self.state.awaiting_key.is_some() {
            return Ok(Step::AwaitingKey);
        }

        let address = self.state.pc;
        let opcode = self.state.word_at(address);
        trace!(
            "{:04X} v{:02X?} i{:04X} pc{:04X}",
            opcode,
            self.state.v,
            self.state.i,
            address
        );

        // Built outside the closure: a struct-update expression inside the
        // closure triggers a rustc ICE (broken MIR on array-length consts)
        let fetched = State {
            pc: address.wrapping_add(0x2) & ADDRESS_MASK,
            opcode,
            ..self.state
        };
        let result = Instruction::decode(opcode, address).and_then(|instruction| {
            let next = instruction.execute(&fetched, &mut self.entropy, self.quirks)?;
            Ok((instruction, next))
        });

        match result {
            Ok((instruction, next)) => {
                self.state = next;
                if let Instruction::WaitKey { x } = instruction {
                    debug!("V{:X} waiting for a key press", x);
                }
                Ok(Step::Executed(instruction))
            }
            Err(e) => {
                warn!("halting at {:#05X}: {}", address, e);
                Err(e)
            }
        }
    }

    /// Decrements both timers toward zero; the host calls this at `TIMER_HZ`
    pub fn tick_timers(&mut self) {
        self.state.delay_timer = self.state.delay_timer.saturating_sub(1);
        self.state.sound_timer = self.state.sound_timer.saturating_sub(1);
    }

    /// Whether the host should be producing a tone
    pub fn sound_active(&self) -> bool {
        self.state.sound_timer > 0
    }
}

impl Default for Chip8<SeededEntropy> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{DISPLAY_WIDTH, MEMORY_SIZE};
    use proptest::prelude::*;

    fn chip8_with(rom: &[u8]) -> Chip8 {
        let mut chip8 = Chip8::with_entropy(SeededEntropy::from_seed(0));
        chip8.load_rom(rom).unwrap();
        chip8
    }

    fn run(chip8: &mut Chip8, cycles: usize) {
        for _ in 0..cycles {
            chip8.cycle().unwrap();
        }
    }

    #[test]
    fn test_cycle_advances_pc() {
        let mut chip8 = chip8_with(&[0x00, 0xE0]);
        let starting_pc = chip8.state.pc;
        assert_eq!(chip8.cycle(), Ok(Step::Executed(Instruction::Clear)));
        assert_eq!(chip8.state.pc, starting_pc + 0x2);
        assert_eq!(chip8.state.opcode, 0x00E0);
    }

    #[test]
    fn test_add_program() {
        let mut chip8 = chip8_with(&[0x60, 0x0A, 0x61, 0x05, 0x80, 0x14]);
        run(&mut chip8, 3);
        assert_eq!(chip8.state.v[0x0], 15);
        assert_eq!(chip8.state.v[0x1], 5);
        assert_eq!(chip8.state.v[0xF], 0);
    }

    #[test]
    fn test_jump_to_self() {
        let mut chip8 = chip8_with(&[0x12, 0x00]);
        run(&mut chip8, 50);
        assert_eq!(chip8.state.pc, 0x200);
    }

    #[test]
    fn test_ret_with_empty_stack_leaves_state() {
        let mut chip8 = chip8_with(&[0x00, 0xEE]);
        let before = chip8.state;
        assert_eq!(
            chip8.cycle(),
            Err(Chip8Error::StackUnderflow { address: 0x200 })
        );
        assert_eq!(chip8.state, before);
    }

    #[test]
    fn test_unknown_opcode_surfaces() {
        let mut chip8 = chip8_with(&[0x80, 0x1F]);
        let before = chip8.state;
        assert_eq!(
            chip8.cycle(),
            Err(Chip8Error::UnknownOpcode {
                opcode: 0x801F,
                address: 0x200
            })
        );
        assert_eq!(chip8.state, before);
    }

    #[test]
    fn test_balanced_calls_are_stack_neutral() {
        // 0x200: call 0x300; loop forever
        // 0x300: V0 += 1; unless V0 == 16 call 0x300; ret
        let mut chip8 = chip8_with(&[0x23, 0x00, 0x12, 0x02]);
        chip8.state.memory[0x300..0x308]
            .copy_from_slice(&[0x70, 0x01, 0x30, 0x10, 0x23, 0x00, 0x00, 0xEE]);
        run(&mut chip8, 1);
        assert_eq!(chip8.state.sp, 1);
        // Descend until the stack is full, then unwind
        while chip8.state.pc != 0x202 {
            chip8.cycle().unwrap();
        }
        assert_eq!(chip8.state.sp, 0);
        assert_eq!(chip8.state.v[0x0], 16);

        chip8.state.memory[0x202..0x204].copy_from_slice(&[0x00, 0xEE]);
        assert_eq!(
            chip8.cycle(),
            Err(Chip8Error::StackUnderflow { address: 0x202 })
        );
    }

    #[test]
    fn test_seventeenth_call_overflows() {
        let mut chip8 = chip8_with(&[0x22, 0x00]);
        run(&mut chip8, 16);
        assert_eq!(chip8.state.sp, 16);
        let before = chip8.state;
        assert_eq!(
            chip8.cycle(),
            Err(Chip8Error::StackOverflow {
                target: 0x200,
                address: 0x200
            })
        );
        assert_eq!(chip8.state, before);
    }

    #[test]
    fn test_load_rom_rejects_oversize() {
        let mut chip8 = Chip8::new();
        let before = chip8.state;
        let rom = vec![0xAA; MEMORY_SIZE - 0x200 + 1];
        assert_eq!(
            chip8.load_rom(&rom),
            Err(Chip8Error::AddressOutOfRange {
                start: 0x200,
                len: rom.len()
            })
        );
        assert_eq!(chip8.state, before);
    }

    #[test]
    fn test_load_rom_accepts_full_size() {
        let mut chip8 = Chip8::new();
        let rom = vec![0xAA; MEMORY_SIZE - 0x200];
        chip8.load_rom(&rom).unwrap();
        assert_eq!(chip8.state.memory[0xFFF], 0xAA);
    }

    #[test]
    fn test_fetch_at_end_of_memory_wraps() {
        let mut chip8 = Chip8::new();
        chip8.state.pc = 0xFFE;
        chip8.state.memory[0xFFE..0x1000].copy_from_slice(&[0x00, 0xE0]);
        chip8.cycle().unwrap();
        assert_eq!(chip8.state.pc, 0x000);
    }

    #[test]
    fn test_doesnt_cycle_while_awaiting_key() {
        let mut chip8 = chip8_with(&[0xF1, 0x0A, 0x60, 0x01]);
        chip8.cycle().unwrap();
        let waiting_pc = chip8.state.pc;
        for _ in 0..5 {
            assert_eq!(chip8.cycle(), Ok(Step::AwaitingKey));
        }
        assert_eq!(chip8.state.pc, waiting_pc);
        assert_eq!(chip8.state.v[0x0], 0x0);
    }

    #[test]
    fn test_captures_key_presses() {
        let mut chip8 = chip8_with(&[0xF1, 0x0A, 0x60, 0x01]);
        chip8.cycle().unwrap();
        chip8.key_press(0xE).unwrap();
        assert!(!chip8.is_awaiting_key());
        assert_eq!(chip8.state.v[0x1], 0xE);
        chip8.cycle().unwrap();
        assert_eq!(chip8.state.v[0x0], 0x1);
    }

    #[test]
    fn test_held_key_doesnt_satisfy_wait() {
        let mut chip8 = chip8_with(&[0xF1, 0x0A]);
        chip8.key_press(0x3).unwrap();
        chip8.cycle().unwrap();
        chip8.key_press(0x3).unwrap();
        assert!(chip8.is_awaiting_key());
        chip8.key_release(0x3).unwrap();
        chip8.key_press(0x3).unwrap();
        assert!(!chip8.is_awaiting_key());
        assert_eq!(chip8.state.v[0x1], 0x3);
    }

    #[test]
    fn test_rejects_invalid_keys() {
        let mut chip8 = Chip8::new();
        assert_eq!(chip8.key_press(0x10), Err(Chip8Error::InvalidKey(0x10)));
        assert_eq!(chip8.key_release(0xFF), Err(Chip8Error::InvalidKey(0xFF)));
    }

    #[test]
    fn test_key_state_drives_skips() {
        // V0 = 5; skip if key V0 pressed; V1 = 1; V2 = 2
        let rom = [0x60, 0x05, 0xE0, 0x9E, 0x61, 0x01, 0x62, 0x02];
        let mut chip8 = chip8_with(&rom);
        chip8.key_press(0x5).unwrap();
        run(&mut chip8, 3);
        assert_eq!(chip8.state.v[0x1], 0x0);
        assert_eq!(chip8.state.v[0x2], 0x2);
    }

    #[test]
    fn test_timers_tick_to_zero() {
        // V0 = 2; DT = V0; ST = V0
        let mut chip8 = chip8_with(&[0x60, 0x02, 0xF0, 0x15, 0xF0, 0x18]);
        run(&mut chip8, 3);
        assert!(chip8.sound_active());
        chip8.tick_timers();
        assert_eq!(chip8.state.delay_timer, 1);
        chip8.tick_timers();
        chip8.tick_timers();
        assert_eq!(chip8.state.delay_timer, 0);
        assert_eq!(chip8.state.sound_timer, 0);
        assert!(!chip8.sound_active());
    }

    #[test]
    fn test_take_frame_clears_draw_flag() {
        let mut chip8 = chip8_with(&[0x00, 0xE0]);
        assert!(chip8.take_frame().is_none());
        chip8.cycle().unwrap();
        assert!(chip8.take_frame().is_some());
        assert!(chip8.take_frame().is_none());
    }

    #[test]
    fn test_seeded_random_is_reproducible() {
        let rom = [0xC0, 0xFF, 0xC1, 0xFF, 0xC2, 0xFF];
        let mut a = chip8_with(&rom);
        let mut b = chip8_with(&rom);
        run(&mut a, 3);
        run(&mut b, 3);
        assert_eq!(a.state.v, b.state.v);
    }

    #[test]
    fn test_wraps_sprite_past_right_edge() {
        // I = 0x300; V0 = 60; draw 1 row
        let mut chip8 = chip8_with(&[0xA3, 0x00, 0x60, 0x3C, 0xD0, 0x11]);
        chip8.state.memory[0x300] = 0xFF;
        run(&mut chip8, 3);
        let row = chip8.frame_buffer()[0];
        assert_eq!(row[0..4], [1, 1, 1, 1]);
        assert_eq!(row[60..DISPLAY_WIDTH], [1, 1, 1, 1]);
    }

    proptest! {
        #[test]
        fn test_double_draw_restores_frame(
            sprite in proptest::collection::vec(any::<u8>(), 1..16),
            px in any::<u8>(),
            py in any::<u8>(),
            noise in proptest::collection::vec((0usize..32, 0usize..64), 0..64),
        ) {
            let mut chip8 = Chip8::with_entropy(SeededEntropy::from_seed(1));
            for (y, x) in noise {
                chip8.state.frame_buffer[y][x] = 1;
            }
            let n = sprite.len() as u16;
            chip8.state.memory[0x300..0x300 + sprite.len()].copy_from_slice(&sprite);
            chip8.state.i = 0x300;
            chip8.state.v[0x1] = px;
            chip8.state.v[0x2] = py;
            let draw = 0xD120 | n;
            let rom = [(draw >> 8) as u8, draw as u8, (draw >> 8) as u8, draw as u8];
            chip8.load_rom(&rom).unwrap();

            let before = chip8.state.frame_buffer;
            chip8.cycle().unwrap();
            let after_first = chip8.state.frame_buffer;
            chip8.cycle().unwrap();
            prop_assert_eq!(chip8.state.frame_buffer, before);

            // The second draw collides wherever the first one turned a pixel on
            let collided = before
                .iter()
                .flatten()
                .zip(after_first.iter().flatten())
                .any(|(old, new)| *old == 0 && *new == 1);
            prop_assert_eq!(chip8.state.v[0xF], u8::from(collided));
        }
    }
}
