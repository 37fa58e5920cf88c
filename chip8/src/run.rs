use std::fs;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{debug, info};

use emu8_core::constants::TIMER_HZ;
use emu8_core::{Chip8, Quirks, SeededEntropy, Step};

use crate::display;
use crate::keymap::keymap;

/// Everything the host needs to drive one session
pub struct Config {
    pub rom: PathBuf,
    pub hz: u64,
    pub cycles: Option<u64>,
    pub seed: Option<u64>,
    pub quirks: Quirks,
    pub held_keys: String,
    pub unthrottled: bool,
}

/// Why a session stopped without faulting
#[derive(Debug, PartialEq, Eq)]
pub enum Stop {
    CycleLimit,
    /// Fx0A is waiting and a headless host has no more input to give
    AwaitingKey,
}

pub fn run(config: Config) -> Result<Stop> {
    let entropy = match config.seed {
        Some(seed) => SeededEntropy::from_seed(seed),
        None => SeededEntropy::new(),
    };
    let mut chip8 = Chip8::with_parts(entropy, config.quirks);
    info!("quirks: {:?}", chip8.quirks());

    // Load ROM
    let rom = fs::read(&config.rom)
        .with_context(|| format!("unable to read rom {}", config.rom.display()))?;
    chip8
        .load_rom(&rom)
        .with_context(|| format!("unable to load rom {}", config.rom.display()))?;
    info!("loaded {} ({} bytes)", config.rom.display(), rom.len());

    for key in config.held_keys.chars() {
        let code = keymap(key).with_context(|| format!("no Chip-8 key is mapped to {key:?}"))?;
        chip8.key_press(code)?;
    }

    let stop = drive(&mut chip8, &config);
    println!("{}", display::render(chip8.frame_buffer()));
    stop
}

/// Steps the machine until it stops or faults.
///
/// Time is tracked on a virtual clock advanced once per instruction, so timers
/// tick at `TIMER_HZ` regardless of how fast instructions actually run.
fn drive(chip8: &mut Chip8, config: &Config) -> Result<Stop> {
    let cycle_time = Duration::from_nanos(1_000_000_000 / config.hz.max(1));
    let timer_period = Duration::from_nanos(1_000_000_000 / TIMER_HZ);

    let started = Instant::now();
    let mut virtual_time = Duration::ZERO;
    let mut next_timer_tick = timer_period;
    let mut sounding = false;
    let mut executed: u64 = 0;

    loop {
        if config.cycles.is_some_and(|limit| executed >= limit) {
            return Ok(Stop::CycleLimit);
        }

        match chip8.cycle()? {
            Step::Executed(_) => executed += 1,
            Step::AwaitingKey => {
                info!("blocked on a key press after {executed} instructions");
                return Ok(Stop::AwaitingKey);
            }
        }

        if chip8.take_frame().is_some() {
            debug!("frame updated after {executed} instructions");
        }

        virtual_time += cycle_time;
        while virtual_time >= next_timer_tick {
            chip8.tick_timers();
            next_timer_tick += timer_period;
        }

        if chip8.sound_active() != sounding {
            sounding = chip8.sound_active();
            debug!("sound {}", if sounding { "on" } else { "off" });
        }

        // Handle timing
        if !config.unthrottled {
            let elapsed = started.elapsed();
            if virtual_time > elapsed {
                std::thread::sleep(virtual_time - elapsed);
            }
        }
    }
}
