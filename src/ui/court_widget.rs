use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame as TerminalFrame,
};

use crate::game::Frame;

/// Reduce a frame to a `rows x cols` grid of lit cells.
///
/// A cell is lit when any pixel inside its block differs from the background,
/// so a ball smaller than one cell still shows up.
pub fn downsample(frame: &Frame, cols: usize, rows: usize) -> Vec<Vec<bool>> {
    if cols == 0 || rows == 0 || frame.width() == 0 || frame.height() == 0 {
        return Vec::new();
    }
    (0..rows)
        .map(|r| {
            let (r0, r1) = span(r, rows, frame.height());
            (0..cols)
                .map(|c| {
                    let (c0, c1) = span(c, cols, frame.width());
                    (r0..r1).any(|row| (c0..c1).any(|col| !frame.is_background(row, col)))
                })
                .collect()
        })
        .collect()
}

/// Pixel range `[start, end)` covered by cell `index` of `cells`.
fn span(index: usize, cells: usize, pixels: usize) -> (usize, usize) {
    let start = index * pixels / cells;
    let end = ((index + 1) * pixels / cells).max(start + 1).min(pixels);
    (start.min(pixels.saturating_sub(1)), end)
}

/// Render the court with half-block glyphs, two pixel rows per terminal row.
pub fn render_court(frame: &mut TerminalFrame, court: &Frame, area: Rect) {
    let cols = area.width as usize;
    let grid = downsample(court, cols, area.height as usize * 2);

    let lines: Vec<Line> = grid
        .chunks(2)
        .map(|pair| {
            let top = &pair[0];
            let bottom = pair.get(1);
            let text: String = (0..cols)
                .map(|c| {
                    let lower = bottom.is_some_and(|b| b[c]);
                    match (top[c], lower) {
                        (true, true) => '\u{2588}',
                        (true, false) => '\u{2580}',
                        (false, true) => '\u{2584}',
                        (false, false) => ' ',
                    }
                })
                .collect();
            Line::from(Span::styled(text, Style::default().fg(Color::White)))
        })
        .collect();

    let widget = Paragraph::new(lines).style(Style::default().bg(Color::Rgb(43, 48, 58)));
    frame.render_widget(widget, area);
}
