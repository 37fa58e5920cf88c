use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;

use emu8_core::constants::DEFAULT_CLOCK_HZ;
use emu8_core::Quirks;

mod display;
mod keymap;
mod run;

/// Runs a Chip-8 ROM headlessly and prints the final frame
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Path to the ROM image
    rom: PathBuf,

    /// Instructions per second
    #[arg(long, default_value_t = DEFAULT_CLOCK_HZ)]
    hz: u64,

    /// Stop after this many instructions
    #[arg(long)]
    cycles: Option<u64>,

    /// Seed for Cxkk so runs are reproducible
    #[arg(long)]
    seed: Option<u64>,

    /// Keys held down for the whole run, in the QWERTY layout (e.g. "qe")
    #[arg(long, default_value = "")]
    hold: String,

    /// Fx1E sets VF when I passes 0xFFF
    #[arg(long)]
    quirk_index_overflow: bool,

    /// 8xy5 stores Vy - Vx when it borrows
    #[arg(long)]
    quirk_legacy_subtract: bool,

    /// Run as fast as possible
    #[arg(long)]
    unthrottled: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = run::Config {
        rom: args.rom,
        hz: args.hz,
        cycles: args.cycles,
        seed: args.seed,
        quirks: Quirks {
            index_overflow_sets_vf: args.quirk_index_overflow,
            legacy_reverse_subtract: args.quirk_legacy_subtract,
        },
        held_keys: args.hold,
        unthrottled: args.unthrottled,
    };

    let stop = run::run(config)?;
    log::info!("stopped: {stop:?}");
    Ok(())
}
