//! Lists screen: named server lists, the grid's list filter, and
//! membership changes for the current selection.

use std::sync::Arc;

use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Cell, Paragraph, Row, Table},
};

use vncwall_core::{ALL_SERVERS_LIST, Command, GridFilter, ListAction, NamedLists, lists};

use crate::action::{Action, ConfirmAction, Notification};
use crate::component::Component;
use crate::theme;

pub struct ListsScreen {
    focused: bool,
    lists: Arc<NamedLists>,
    filter: GridFilter,
    /// Checked grid ips, for add/remove.
    checked: Vec<String>,
    selected: usize,
    /// Name being typed for a new list.
    input: Option<String>,
}

impl ListsScreen {
    pub fn new() -> Self {
        Self {
            focused: false,
            lists: Arc::new(NamedLists::new()),
            filter: GridFilter::default(),
            checked: Vec::new(),
            selected: 0,
            input: None,
        }
    }

    /// Rows shown: "All Servers" first, then the backend's order.
    fn names(&self) -> Vec<String> {
        let mut names = vec![ALL_SERVERS_LIST.to_owned()];
        names.extend(lists::custom_list_names(&self.lists));
        names
    }

    fn selected_name(&self) -> Option<String> {
        self.names().into_iter().nth(self.selected)
    }

    fn move_selection(&mut self, delta: isize) {
        let last = self.names().len().saturating_sub(1);
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    fn membership(&self, action: ListAction) -> Option<Action> {
        let name = self.selected_name()?;
        if lists::is_reserved(&name) {
            return Some(Action::Notify(Notification::warning(format!(
                "\"{name}\" always holds every server"
            ))));
        }
        if self.checked.is_empty() {
            return Some(Action::Notify(Notification::warning(
                "Select servers on the grid first",
            )));
        }
        let lists = vec![name];
        let ips = self.checked.clone();
        Some(Action::Dispatch(match action {
            ListAction::Add => Command::AddToLists { lists, ips },
            ListAction::Remove => Command::RemoveFromLists { lists, ips },
        }))
    }

    fn handle_input_key(&mut self, key: KeyEvent) -> Option<Action> {
        let input = self.input.as_mut()?;
        match key.code {
            KeyCode::Esc => {
                self.input = None;
                None
            }
            KeyCode::Enter => {
                let name = self.input.take().unwrap_or_default();
                Some(Action::Dispatch(Command::CreateList { name }))
            }
            KeyCode::Backspace => {
                input.pop();
                None
            }
            KeyCode::Char(c) => {
                input.push(c);
                None
            }
            _ => None,
        }
    }

    fn render_table(&self, frame: &mut Frame, area: Rect) {
        let add_hint = lists::preselected_lists(&self.lists, &self.checked, ListAction::Add);
        let active = self.filter.list_label();

        let rows: Vec<Row> = self
            .names()
            .into_iter()
            .enumerate()
            .map(|(idx, name)| {
                let members = self.lists.get(&name).map(Vec::as_slice).unwrap_or_default();
                let count = if lists::is_reserved(&name) {
                    "all".to_owned()
                } else {
                    members.len().to_string()
                };
                let marker = if name == active { "\u{25cf}" } else { " " };
                let fit = if self.checked.is_empty() || lists::is_reserved(&name) {
                    ""
                } else if add_hint.contains(&name) {
                    "+"
                } else {
                    "-"
                };
                let style = if idx == self.selected && self.focused {
                    theme::table_selected()
                } else {
                    theme::table_row()
                };
                Row::new(vec![
                    Cell::from(marker),
                    Cell::from(name),
                    Cell::from(count),
                    Cell::from(fit),
                    Cell::from(members.join(", ")),
                ])
                .style(style)
            })
            .collect();

        let table = Table::new(
            rows,
            [
                Constraint::Length(2),
                Constraint::Length(24),
                Constraint::Length(8),
                Constraint::Length(4),
                Constraint::Min(10),
            ],
        )
        .header(Row::new(vec!["", "List", "Servers", "Sel", "Members"]).style(theme::table_header()))
        .block(
            Block::default()
                .title(" Named lists ")
                .title_style(theme::title_style())
                .borders(Borders::ALL)
                .border_type(BorderType::Rounded)
                .border_style(if self.focused {
                    theme::border_focused()
                } else {
                    theme::border_default()
                }),
        );
        frame.render_widget(table, area);
    }

    fn render_footer(&self, frame: &mut Frame, area: Rect) {
        let line = match &self.input {
            Some(name) => Line::from(vec![
                Span::styled(" New list: ", theme::key_hint_key()),
                Span::styled(format!("{name}\u{2588}"), Style::default().fg(theme::DIM_WHITE)),
                Span::styled("   Enter create  Esc cancel", theme::key_hint()),
            ]),
            None => {
                let mut spans = vec![Span::raw(" ")];
                for (key, label) in [
                    ("Enter", "filter grid"),
                    ("n", "new"),
                    ("d", "delete"),
                    ("+", "add selection"),
                    ("-", "remove selection"),
                    ("r", "reload"),
                ] {
                    spans.push(Span::styled(key, theme::key_hint_key()));
                    spans.push(Span::styled(format!(" {label}  "), theme::key_hint()));
                }
                spans.push(Span::styled(
                    format!("\u{b7} {} selected", self.checked.len()),
                    theme::table_row(),
                ));
                Line::from(spans)
            }
        };
        frame.render_widget(Paragraph::new(line), area);
    }
}

impl Component for ListsScreen {
    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if self.input.is_some() {
            return Ok(self.handle_input_key(key));
        }
        let action = match key.code {
            KeyCode::Char('j') | KeyCode::Down => {
                self.move_selection(1);
                None
            }
            KeyCode::Char('k') | KeyCode::Up => {
                self.move_selection(-1);
                None
            }
            KeyCode::Enter => self
                .selected_name()
                .map(|name| Action::Dispatch(Command::SelectList(name))),
            KeyCode::Char('n') => {
                self.input = Some(String::new());
                None
            }
            KeyCode::Char('d') => self.selected_name().map(|name| {
                if lists::is_reserved(&name) {
                    Action::Notify(Notification::warning(format!("\"{name}\" cannot be deleted")))
                } else {
                    Action::ShowConfirm(ConfirmAction::DeleteList { name })
                }
            }),
            KeyCode::Char('+') => self.membership(ListAction::Add),
            KeyCode::Char('-') => self.membership(ListAction::Remove),
            KeyCode::Char('r') => Some(Action::ReloadLists),
            _ => None,
        };
        Ok(action)
    }

    fn update(&mut self, action: &Action) -> Result<Option<Action>> {
        match action {
            Action::ListsUpdated(lists) => {
                self.lists = Arc::clone(lists);
                self.move_selection(0);
            }
            Action::FilterUpdated(filter) => self.filter = filter.clone(),
            Action::GridUpdated(view) => self.checked = view.checked_ips(),
            _ => {}
        }
        Ok(None)
    }

    fn render(&self, frame: &mut Frame, area: Rect) {
        let [table, footer] =
            Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).areas(area);
        self.render_table(frame, table);
        self.render_footer(frame, footer);
    }

    fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    fn captures_input(&self) -> bool {
        self.input.is_some()
    }
}
