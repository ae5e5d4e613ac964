use ratatui::layout::Constraint;
use ratatui::prelude::{Layout, Rect};

pub(super) fn inner(area: Rect) -> Rect {
    Rect {
        x: area.x.saturating_add(1),
        y: area.y.saturating_add(1),
        width: area.width.saturating_sub(2),
        height: area.height.saturating_sub(2),
    }
}

/// A popup area of the given percentages, centered in `r`.
pub(super) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let pad_y = (100 - percent_y.min(100)) / 2;
    let pad_x = (100 - percent_x.min(100)) / 2;
    let rows = Layout::vertical([
        Constraint::Percentage(pad_y),
        Constraint::Percentage(percent_y),
        Constraint::Percentage(pad_y),
    ])
    .split(r);
    Layout::horizontal([
        Constraint::Percentage(pad_x),
        Constraint::Percentage(percent_x),
        Constraint::Percentage(pad_x),
    ])
    .split(rows[1])[1]
}

/// Equal-width columns, one per seat.
pub(super) fn seat_columns(area: Rect, seats: usize) -> Vec<Rect> {
    let n = seats.max(1) as u32;
    Layout::horizontal((0..n).map(|_| Constraint::Ratio(1, n))).split(area).to_vec()
}
