use emu8_core::state::FrameBuffer;

const ON: char = '█';
const OFF: char = ' ';

/// # Display
/// The Chip-8 display is composed of 64x32 black/white pixels.
///
/// Renders a FrameBuffer as text, one line per row, framed so trailing
/// blank columns stay visible.
pub fn render(frame: &FrameBuffer) -> String {
    let width = frame.first().map_or(0, |row| row.len());
    let border = "-".repeat(width);

    let mut out = String::with_capacity((width + 3) * (frame.len() + 2));
    out.push('+');
    out.push_str(&border);
    out.push_str("+\n");
    for row in frame.iter() {
        out.push('|');
        out.extend(row.iter().map(|pixel| if *pixel == 1 { ON } else { OFF }));
        out.push_str("|\n");
    }
    out.push('+');
    out.push_str(&border);
    out.push('+');
    out
}
