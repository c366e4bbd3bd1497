//! Grid screen: the live wall of desktops.
//!
//! Draws `GridView` snapshots in the core's column count, keeps a cursor
//! on one slot, and turns keys into core commands.

use std::cell::Cell;
use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::Paragraph,
};

use vncwall_core::{BulkButtons, Command, GridFilter, GridView, NamedLists, lists};

use crate::action::{Action, ConfirmAction, Notification};
use crate::component::Component;
use crate::theme;
use crate::widgets::tile::{TILE_HEIGHT, TileWidget};

pub struct GridScreen {
    focused: bool,
    view: Arc<GridView>,
    filter: GridFilter,
    lists: Arc<NamedLists>,
    cursor: usize,
    /// Tile rows that fit, as of the last render.
    rows_visible: Cell<usize>,
}

impl GridScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            view: Arc::new(GridView::default()),
            filter: GridFilter::default(),
            lists: Arc::new(NamedLists::new()),
            cursor: 0,
            rows_visible: Cell::new(1),
        }
    }

    fn columns(&self) -> usize {
        self.view.columns.max(1)
    }

    fn cursor_ip(&self) -> Option<&str> {
        self.view.slots.get(self.cursor).map(|s| s.ip.as_str())
    }

    fn bulk(&self) -> BulkButtons {
        BulkButtons::compute(
            self.view.any_checked(),
            self.filter.show_excluded,
            lists::has_custom_lists(&self.lists),
        )
    }

    /// Keep the cursor on the same server across snapshots.
    fn apply_view(&mut self, view: Arc<GridView>) {
        let followed = self
            .cursor_ip()
            .and_then(|ip| view.slots.iter().position(|s| s.ip == ip));
        self.cursor = followed.unwrap_or_else(|| self.cursor.min(view.slots.len().saturating_sub(1)));
        self.view = view;
    }

    /// Move by whole columns (`dx`) and rows (`dy`), staying inside the grid.
    fn move_cursor(&mut self, dx: isize, dy: isize) -> Option<Action> {
        let len = self.view.slots.len();
        if len == 0 {
            return None;
        }
        let cols = self.columns();
        let col = self.cursor % cols;
        let next = match (dx, dy) {
            (-1, _) if col > 0 => self.cursor - 1,
            (1, _) if col + 1 < cols && self.cursor + 1 < len => self.cursor + 1,
            (_, -1) if self.cursor >= cols => self.cursor - cols,
            (_, 1) if self.cursor + cols < len => self.cursor + cols,
            (_, 1) if self.cursor / cols + 1 < self.view.row_count() => len - 1,
            _ => self.cursor,
        };
        self.cursor = next;
        self.scroll_to_cursor()
    }

    /// First visible row that keeps the cursor on screen, if it changed.
    fn scroll_to_cursor(&self) -> Option<Action> {
        let row = self.cursor / self.columns();
        let visible = self.rows_visible.get().max(1);
        let top = self.view.scroll_top;
        let new_top = if row < top {
            row
        } else if row >= top + visible {
            row + 1 - visible
        } else {
            return None;
        };
        Some(Action::ScrollTo(new_top))
    }

    fn on_cursor(&self, f: impl FnOnce(String) -> Command) -> Option<Action> {
        self.cursor_ip().map(|ip| Action::Dispatch(f(ip.to_owned())))
    }

    fn render_header(&self, frame: &mut Frame, area: Rect) {
        let mode = if self.filter.show_excluded {
            "excluded"
        } else {
            "active"
        };
        let mut spans = vec![
            Span::styled(format!(" {} ", self.filter.list_label()), theme::title_style()),
            Span::styled(
                format!("\u{b7} {mode} \u{b7} {} tiles", self.view.tiles().count()),
                theme::table_row(),
            ),
        ];
        let checked = self.view.checked_ips().len();
        if checked > 0 {
            spans.push(Span::styled(
                format!(" \u{b7} {checked} selected"),
                Style::default().fg(theme::SUCCESS_GREEN),
            ));
        }
        if self.view.loading {
            spans.push(Span::styled(
                "  probing\u{2026}",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_hints(&self, frame: &mut Frame, area: Rect) {
        let bulk = self.bulk();
        let mut keys = vec![("space", "select"), ("a", "all"), ("p", "patch"), ("r", "reload")];
        keys.push(("e", if self.filter.show_excluded { "active" } else { "excluded" }));
        for (visible, key, label) in [
            (bulk.exclude, "x", "exclude"),
            (bulk.include, "u", "include"),
            (bulk.open, "o", "open"),
            (bulk.invert, "i", "invert"),
            (bulk.cancel, "c", "clear"),
            (bulk.add_to_list, "2", "lists"),
        ] {
            if visible {
                keys.push((key, label));
            }
        }

        let mut spans = vec![Span::raw(" ")];
        for (key, label) in keys {
            spans.push(Span::styled(key, theme::key_hint_key()));
            spans.push(Span::styled(format!(" {label}  "), theme::key_hint()));
        }
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }

    fn render_tiles(&self, frame: &mut Frame, area: Rect) {
        let visible = usize::from(area.height / TILE_HEIGHT).max(1);
        self.rows_visible.set(visible);

        if self.view.slots.is_empty() {
            let message = if self.view.loading {
                "Probing servers\u{2026}"
            } else {
                "No reachable servers"
            };
            let y = area.y + area.height / 2;
            frame.render_widget(
                Paragraph::new(message)
                    .alignment(Alignment::Center)
                    .style(theme::table_row()),
                Rect::new(area.x, y.min(area.bottom().saturating_sub(1)), area.width, 1),
            );
            return;
        }

        let cols = self.columns();
        let top = self.view.scroll_top.min(self.view.row_count().saturating_sub(1));
        let ratio = u32::try_from(cols).unwrap_or(1);
        let row_areas = Layout::vertical(vec![Constraint::Length(TILE_HEIGHT); visible]).split(area);

        for (offset, row_area) in row_areas.iter().enumerate() {
            let start = (top + offset) * cols;
            if start >= self.view.slots.len() {
                break;
            }
            let cells = Layout::horizontal(vec![Constraint::Ratio(1, ratio); cols]).split(*row_area);
            for (col, cell) in cells.iter().enumerate() {
                let idx = start + col;
                let Some(slot) = self.view.slots.get(idx) else {
                    break;
                };
                let cursor = self.focused && idx == self.cursor;
                frame.render_widget(TileWidget::new(slot, cursor), *cell);
            }
        }
    }
}

impl Component for GridScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        let bulk = self.bulk();
        let action = match key.code {
            KeyCode::Char('h') | KeyCode::Left => self.move_cursor(-1, 0),
            KeyCode::Char('l') | KeyCode::Right => self.move_cursor(1, 0),
            KeyCode::Char('k') | KeyCode::Up => self.move_cursor(0, -1),
            KeyCode::Char('j') | KeyCode::Down => self.move_cursor(0, 1),

            KeyCode::Char(' ') => self.on_cursor(|ip| Command::ToggleSelection { ip }),
            KeyCode::Char('a') => Some(Action::Dispatch(Command::SelectAll)),
            KeyCode::Char('i') if bulk.invert => Some(Action::Dispatch(Command::InvertSelection)),
            KeyCode::Char('c') if bulk.cancel => Some(Action::Dispatch(Command::CancelSelection)),

            KeyCode::Char('x') if bulk.exclude => Some(Action::Dispatch(Command::ExcludeSelected)),
            KeyCode::Char('u') if bulk.include => Some(Action::Dispatch(Command::IncludeSelected)),
            KeyCode::Char('x' | 'u') => Some(Action::Notify(Notification::warning(
                if self.view.any_checked() {
                    "Not available in this view (e toggles active/excluded)"
                } else {
                    "Select servers first (space)"
                },
            ))),

            KeyCode::Char('o') if bulk.open => Some(Action::Dispatch(Command::OpenSelected)),
            KeyCode::Char('o') | KeyCode::Enter => self
                .view
                .slots
                .get(self.cursor)
                .and_then(|s| s.tile())
                .map(|t| Action::ShowUrls(vec![t.open_url.clone()])),
            KeyCode::Char('v') => self
                .view
                .slots
                .get(self.cursor)
                .and_then(|s| s.tile())
                .map(|t| Action::ShowUrls(vec![t.view_url.clone()])),

            KeyCode::Char('p') => self.on_cursor(|ip| Command::PatchTile { ip }),
            KeyCode::Char('r') => Some(Action::Dispatch(Command::Refresh)),
            KeyCode::Char('e') => Some(Action::Dispatch(Command::SetShowExcluded(
                !self.filter.show_excluded,
            ))),
            KeyCode::Char('R') => Some(Action::ShowConfirm(ConfirmAction::ResetExclusions)),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::GridUpdated(view) => self.apply_view(Arc::clone(view)),
            Action::FilterUpdated(filter) => self.filter = filter.clone(),
            Action::ListsUpdated(lists) => self.lists = Arc::clone(lists),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [header, hints, tiles] = Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(TILE_HEIGHT),
        ])
        .areas(area);

        self.render_header(frame, header);
        self.render_hints(frame, hints);
        self.render_tiles(frame, tiles);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;
    use pretty_assertions::assert_eq;
    use vncwall_core::{Grid, Server, TileRenderer, column_count};

    fn view_of(n: usize) -> Arc<GridView> {
        let grid = Grid::new();
        grid.reset(column_count(n));
        let renderer = TileRenderer::default();
        for i in 0..n {
            grid.append(renderer.build(&Server {
                ip: format!("10.0.0.{i}"),
                username: format!("user{i}"),
                excluded: false,
                display_port: 6080,
            }));
        }
        Arc::new(grid.snapshot())
    }

    fn screen_with(n: usize) -> GridScreen {
        let mut screen = GridScreen::new();
        screen.apply_view(view_of(n));
        screen
    }

    fn press(screen: &mut GridScreen, code: KeyCode) -> Option<Action> {
        screen
            .handle_key_event(KeyEvent::new(code, KeyModifiers::NONE))
            .unwrap_or_else(|e| panic!("{e}"))
    }

    fn dispatched(action: Option<Action>) -> Option<Command> {
        match action {
            Some(Action::Dispatch(cmd)) => Some(cmd),
            _ => None,
        }
    }

    #[test]
    fn cursor_moves_within_columns() {
        // 5 tiles, 3 columns: rows [0 1 2] [3 4]
        let mut screen = screen_with(5);
        assert_eq!(screen.columns(), 3);

        press(&mut screen, KeyCode::Right);
        press(&mut screen, KeyCode::Right);
        press(&mut screen, KeyCode::Right);
        assert_eq!(screen.cursor, 2);

        press(&mut screen, KeyCode::Down);
        assert_eq!(screen.cursor, 4, "short last row clamps to its last tile");

        press(&mut screen, KeyCode::Up);
        assert_eq!(screen.cursor, 1);
        press(&mut screen, KeyCode::Left);
        press(&mut screen, KeyCode::Left);
        assert_eq!(screen.cursor, 0);
    }

    #[test]
    fn moving_past_visible_rows_scrolls() {
        // 16 tiles, 4 columns, one visible row
        let mut screen = screen_with(16);
        let action = press(&mut screen, KeyCode::Char('j'));
        assert!(matches!(action, Some(Action::ScrollTo(1))));
    }

    #[test]
    fn space_toggles_cursor_tile() {
        let mut screen = screen_with(2);
        press(&mut screen, KeyCode::Right);
        assert_eq!(
            dispatched(press(&mut screen, KeyCode::Char(' '))),
            Some(Command::ToggleSelection {
                ip: "10.0.0.1".into()
            })
        );
        assert_eq!(
            dispatched(press(&mut screen, KeyCode::Char('p'))),
            Some(Command::PatchTile {
                ip: "10.0.0.1".into()
            })
        );
    }

    #[test]
    fn bulk_keys_follow_visibility() {
        let mut screen = screen_with(2);
        assert!(matches!(
            press(&mut screen, KeyCode::Char('x')),
            Some(Action::Notify(_))
        ));
        assert_eq!(dispatched(press(&mut screen, KeyCode::Char('i'))), None);

        let grid = Grid::new();
        let renderer = TileRenderer::default();
        grid.append(renderer.build(&Server {
            ip: "10.0.0.9".into(),
            username: "eve".into(),
            excluded: false,
            display_port: 6080,
        }));
        vncwall_core::selection::toggle(&grid, "10.0.0.9");
        screen.apply_view(Arc::new(grid.snapshot()));

        assert_eq!(
            dispatched(press(&mut screen, KeyCode::Char('x'))),
            Some(Command::ExcludeSelected)
        );
        assert_eq!(
            dispatched(press(&mut screen, KeyCode::Char('o'))),
            Some(Command::OpenSelected)
        );
    }

    #[test]
    fn excluded_toggle_flips_filter() {
        let mut screen = screen_with(1);
        assert_eq!(
            dispatched(press(&mut screen, KeyCode::Char('e'))),
            Some(Command::SetShowExcluded(true))
        );
        screen
            .update(&Action::FilterUpdated(GridFilter {
                show_excluded: true,
                list: None,
            }))
            .unwrap_or_else(|e| panic!("{e}"));
        assert_eq!(
            dispatched(press(&mut screen, KeyCode::Char('e'))),
            Some(Command::SetShowExcluded(false))
        );
    }

    #[test]
    fn cursor_follows_server_across_snapshots() {
        let mut screen = screen_with(4);
        press(&mut screen, KeyCode::Right);
        assert_eq!(screen.cursor_ip(), Some("10.0.0.1"));

        let grid = Grid::new();
        grid.reset(2);
        let renderer = TileRenderer::default();
        for ip in ["10.0.0.7", "10.0.0.1"] {
            grid.append(renderer.build(&Server {
                ip: ip.into(),
                username: "u".into(),
                excluded: false,
                display_port: 6080,
            }));
        }
        screen.apply_view(Arc::new(grid.snapshot()));
        assert_eq!(screen.cursor, 1);
    }
}
