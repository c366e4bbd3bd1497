//! One grid slot drawn as a bordered block.

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Paragraph, Widget},
};

use vncwall_core::{GridSlot, SlotContent};

use crate::theme;

/// Rows a tile occupies, borders included.
pub const TILE_HEIGHT: u16 = 6;

pub struct TileWidget<'a> {
    slot: &'a GridSlot,
    cursor: bool,
}

impl<'a> TileWidget<'a> {
    pub fn new(slot: &'a GridSlot, cursor: bool) -> Self {
        Self { slot, cursor }
    }

    fn checkbox(&self) -> &'static str {
        if self.slot.checked { "[x]" } else { "[ ]" }
    }

    pub fn title(&self) -> String {
        let label = match &self.slot.content {
            SlotContent::Tile(tile) => tile.label.as_str(),
            SlotContent::Loading | SlotContent::Error(_) => self.slot.ip.as_str(),
        };
        format!(" {} {label} ", self.checkbox())
    }

    pub fn body(&self) -> Vec<Line<'a>> {
        let slot: &'a GridSlot = self.slot;
        match &slot.content {
            SlotContent::Tile(tile) => {
                let mut status = vec![Span::styled(
                    format!("display :{}", tile.display_port),
                    Style::default().fg(theme::DIM_WHITE),
                )];
                if tile.excluded {
                    status.push(Span::raw("  "));
                    status.push(Span::styled(
                        "EXCLUDED",
                        Style::default()
                            .fg(theme::CORAL)
                            .add_modifier(Modifier::BOLD),
                    ));
                }
                vec![
                    Line::from(status),
                    Line::from(Span::styled(tile.view_url.as_str(), theme::key_hint())),
                ]
            }
            SlotContent::Loading => vec![Line::from(Span::styled(
                "updating\u{2026}",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ))],
            SlotContent::Error(message) => vec![Line::from(Span::styled(
                message.as_str(),
                Style::default().fg(theme::ERROR_RED),
            ))],
        }
    }

    fn border_style(&self) -> Style {
        let excluded = self.slot.tile().is_some_and(|t| t.excluded);
        if self.cursor {
            theme::border_focused()
        } else if matches!(self.slot.content, SlotContent::Error(_)) {
            Style::default().fg(theme::ERROR_RED)
        } else if excluded {
            theme::border_excluded()
        } else if self.slot.checked {
            Style::default().fg(theme::SUCCESS_GREEN)
        } else {
            theme::border_default()
        }
    }
}

impl Widget for TileWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::default()
            .title(self.title())
            .title_style(if self.cursor {
                theme::title_style()
            } else {
                theme::table_row()
            })
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(self.border_style());
        Paragraph::new(self.body()).block(block).render(area, buf);
    }
}
