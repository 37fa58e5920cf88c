use crate::constants::{
    ADDRESS_MASK, DISPLAY_HEIGHT, DISPLAY_WIDTH, FONT_ADDRESS, GLYPH_SIZE, STACK_DEPTH,
};
use crate::entropy::EntropySource;
use crate::error::Chip8Error;
use crate::quirks::Quirks;
use crate::state::State;

// Every operation receives the state as it stands after the fetch, so `pc`
// already points at the next instruction.

/// Address of the instruction currently executing
fn current_address(state: &State) -> u16 {
    state.pc.wrapping_sub(0x2) & ADDRESS_MASK
}

fn skip_if(state: &State, condition: bool) -> State {
    let pc = if condition {
        state.pc.wrapping_add(0x2) & ADDRESS_MASK
    } else {
        state.pc
    };
    State { pc, ..*state }
}

fn with_register(state: &State, x: usize, value: u8) -> State {
    let mut v = state.v;
    v[x] = value;
    State { v, ..*state }
}

/// Writes Vx and then the flag, so VF holds the flag even when x is 0xF
fn with_register_and_flag(state: &State, x: usize, value: u8, flag: bool) -> State {
    let mut v = state.v;
    v[x] = value;
    v[0xF] = u8::from(flag);
    State { v, ..*state }
}

/// clear
pub fn clr(state: &State) -> State {
    State {
        frame_buffer: [[0; DISPLAY_WIDTH]; DISPLAY_HEIGHT],
        draw_flag: true,
        ..*state
    }
}

/// PC = STACK.pop()
pub fn rts(state: &State) -> Result<State, Chip8Error> {
    if state.sp == 0 || state.sp as usize > STACK_DEPTH {
        return Err(Chip8Error::StackUnderflow {
            address: current_address(state),
        });
    }
    let sp = state.sp - 0x1;
    Ok(State {
        pc: state.stack[sp as usize],
        sp,
        ..*state
    })
}

/// PC = nnn
pub fn jump(state: &State, nnn: u16) -> State {
    State { pc: nnn, ..*state }
}

/// STACK.push(PC); PC = nnn
pub fn call(state: &State, nnn: u16) -> Result<State, Chip8Error> {
    if state.sp as usize >= STACK_DEPTH {
        return Err(Chip8Error::StackOverflow {
            target: nnn,
            address: current_address(state),
        });
    }
    let mut stack = state.stack;
    stack[state.sp as usize] = state.pc;
    Ok(State {
        pc: nnn,
        sp: state.sp + 0x1,
        stack,
        ..*state
    })
}

/// if Vx == kk then pc += 2
pub fn ske(state: &State, x: usize, kk: u8) -> State {
    skip_if(state, state.v[x] == kk)
}

/// if Vx != kk then pc += 2
pub fn skne(state: &State, x: usize, kk: u8) -> State {
    skip_if(state, state.v[x] != kk)
}

/// if Vx == Vy then pc += 2
pub fn skre(state: &State, x: usize, y: usize) -> State {
    skip_if(state, state.v[x] == state.v[y])
}

/// Vx = kk
pub fn load(state: &State, x: usize, kk: u8) -> State {
    with_register(state, x, kk)
}

/// Vx += kk
/// Wraps; VF is left alone
pub fn add(state: &State, x: usize, kk: u8) -> State {
    with_register(state, x, state.v[x].wrapping_add(kk))
}

/// Vx = Vy
pub fn mv(state: &State, x: usize, y: usize) -> State {
    with_register(state, x, state.v[y])
}

/// Vx |= Vy
pub fn or(state: &State, x: usize, y: usize) -> State {
    with_register(state, x, state.v[x] | state.v[y])
}

/// Vx &= Vy
pub fn and(state: &State, x: usize, y: usize) -> State {
    with_register(state, x, state.v[x] & state.v[y])
}

/// Vx ^= Vy
pub fn xor(state: &State, x: usize, y: usize) -> State {
    with_register(state, x, state.v[x] ^ state.v[y])
}

/// Vx += Vy; VF = carry
pub fn addr(state: &State, x: usize, y: usize) -> State {
    let (res, carry) = state.v[x].overflowing_add(state.v[y]);
    with_register_and_flag(state, x, res, carry)
}

/// Vx -= Vy; VF = !borrow
///
/// With `legacy_reverse_subtract` a borrowing subtraction stores Vy - Vx instead.
pub fn sub(state: &State, x: usize, y: usize, quirks: Quirks) -> State {
    let (vx, vy) = (state.v[x], state.v[y]);
    let no_borrow = vx >= vy;
    let res = if !no_borrow && quirks.legacy_reverse_subtract {
        vy - vx
    } else {
        vx.wrapping_sub(vy)
    };
    with_register_and_flag(state, x, res, no_borrow)
}

/// Vx >>= 1; VF = the bit shifted out
pub fn shr(state: &State, x: usize) -> State {
    let vx = state.v[x];
    with_register_and_flag(state, x, vx >> 1, vx & 0x1 == 0x1)
}

/// Vx = Vy - Vx; VF = !borrow
pub fn subn(state: &State, x: usize, y: usize) -> State {
    let (vx, vy) = (state.v[x], state.v[y]);
    with_register_and_flag(state, x, vy.wrapping_sub(vx), vy >= vx)
}

/// Vx <<= 1; VF = the bit shifted out
pub fn shl(state: &State, x: usize) -> State {
    let vx = state.v[x];
    with_register_and_flag(state, x, vx << 1, (vx >> 7) & 0x1 == 0x1)
}

/// if Vx != Vy then pc += 2
pub fn skrne(state: &State, x: usize, y: usize) -> State {
    skip_if(state, state.v[x] != state.v[y])
}

/// I = nnn
pub fn loadi(state: &State, nnn: u16) -> State {
    State { i: nnn, ..*state }
}

/// PC = V0 + nnn
pub fn jumpi(state: &State, nnn: u16) -> State {
    State {
        pc: nnn.wrapping_add(u16::from(state.v[0x0])) & ADDRESS_MASK,
        ..*state
    }
}

/// Vx = rand_byte & kk
pub fn rand(state: &State, x: usize, kk: u8, entropy: &mut dyn EntropySource) -> State {
    with_register(state, x, entropy.next_byte() & kk)
}

/// draw_sprite(x=Vx y=Vy size=n)
/// XORs the n-byte sprite at memory I.. onto the FrameBuffer at (Vx, Vy), wrapping at the edges.
/// Sets VF if any lit pixel is erased.
pub fn draw(state: &State, x: usize, y: usize, n: u8) -> State {
    let mut v = state.v;
    let mut frame_buffer = state.frame_buffer;
    let mut collision = false;

    let origin_x = state.v[x] as usize;
    let origin_y = state.v[y] as usize;

    for row in 0..n as u16 {
        let sprite_row = state.byte_at(state.i.wrapping_add(row));
        let py = (origin_y + row as usize) % DISPLAY_HEIGHT;
        for bit in 0..8 {
            let pixel = (sprite_row >> (7 - bit)) & 0x1;
            if pixel == 0 {
                continue;
            }
            let px = (origin_x + bit) % DISPLAY_WIDTH;
            collision |= frame_buffer[py][px] == 0x1;
            frame_buffer[py][px] ^= 0x1;
        }
    }

    v[0xF] = u8::from(collision);
    State {
        draw_flag: true,
        v,
        frame_buffer,
        ..*state
    }
}

/// if keypad[Vx] then pc += 2
/// Only the low nibble of Vx names a key
pub fn skpr(state: &State, x: usize) -> State {
    skip_if(state, state.keypad[(state.v[x] & 0xF) as usize])
}

/// if !keypad[Vx] then pc += 2
pub fn skup(state: &State, x: usize) -> State {
    skip_if(state, !state.keypad[(state.v[x] & 0xF) as usize])
}

/// Vx = DT
pub fn moved(state: &State, x: usize) -> State {
    with_register(state, x, state.delay_timer)
}

/// await keypress for Vx
/// The machine stays blocked until the host reports a key going down.
pub fn keyd(state: &State, x: usize) -> State {
    State {
        awaiting_key: Some(x),
        ..*state
    }
}

/// DT = Vx
pub fn loads(state: &State, x: usize) -> State {
    State {
        delay_timer: state.v[x],
        ..*state
    }
}

/// ST = Vx
pub fn ld(state: &State, x: usize) -> State {
    State {
        sound_timer: state.v[x],
        ..*state
    }
}

/// I += Vx
/// Wraps at 0xFFF; with `index_overflow_sets_vf` VF records whether it did
pub fn addi(state: &State, x: usize, quirks: Quirks) -> State {
    let sum = u32::from(state.i) + u32::from(state.v[x]);
    let mut v = state.v;
    if quirks.index_overflow_sets_vf {
        v[0xF] = u8::from(sum > u32::from(ADDRESS_MASK));
    }
    State {
        i: sum as u16 & ADDRESS_MASK,
        v,
        ..*state
    }
}

/// I = address of the glyph for the low nibble of Vx
pub fn ldspr(state: &State, x: usize) -> State {
    State {
        i: FONT_ADDRESS + u16::from(state.v[x] & 0xF) * GLYPH_SIZE,
        ..*state
    }
}

/// mem[I..I+3] = bcd(Vx)
pub fn bcd(state: &State, x: usize) -> State {
    let vx = state.v[x];
    let digits = [vx / 100, vx / 10 % 10, vx % 10];
    let mut memory = state.memory;
    for (offset, digit) in digits.iter().enumerate() {
        memory[(state.i.wrapping_add(offset as u16) & ADDRESS_MASK) as usize] = *digit;
    }
    State { memory, ..*state }
}

/// mem[I..=I+x] = V0..=Vx
pub fn stor(state: &State, x: usize) -> State {
    let mut memory = state.memory;
    for (offset, value) in state.v[..=x].iter().enumerate() {
        memory[(state.i.wrapping_add(offset as u16) & ADDRESS_MASK) as usize] = *value;
    }
    State { memory, ..*state }
}

/// V0..=Vx = mem[I..=I+x]
pub fn read(state: &State, x: usize) -> State {
    let mut v = state.v;
    for (offset, register) in v[..=x].iter_mut().enumerate() {
        *register = state.byte_at(state.i.wrapping_add(offset as u16));
    }
    State { v, ..*state }
}
