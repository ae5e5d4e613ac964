mod layout;
mod table;

use crate::tui::app::{AppState, Scene};
use ratatui::prelude::Frame;

pub fn draw(f: &mut Frame, app: &AppState) {
    match app.scene {
        Scene::Table => table::draw_table(f, app),
        Scene::Summary => table::draw_summary(f, app),
    }
}
