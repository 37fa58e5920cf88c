/// # Quirks
/// Behaviors that differ between historical Chip-8 interpreters.
///
/// Both default to off:
/// - `index_overflow_sets_vf` Fx1E also sets VF to 1 when `I + Vx` passes 0xFFF, else 0
/// - `legacy_reverse_subtract` 8xy5 stores `Vy - Vx` instead of `Vx - Vy` when it borrows
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct Quirks {
    pub index_overflow_sets_vf: bool,
    pub legacy_reverse_subtract: bool,
}
