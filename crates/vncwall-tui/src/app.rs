//! Application core: event loop, screen management, action dispatch.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use color_eyre::eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, BorderType, Borders, Clear, Paragraph, Tabs},
};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use vncwall_core::{Command, CommandResult, Dashboard, GridFilter, GridView, PatchOutcome};

use crate::action::{Action, ConfirmAction, Notification, NotificationLevel};
use crate::component::Component;
use crate::event::{Event, EventReader};
use crate::screen::ScreenId;
use crate::screens::create_screens;
use crate::theme;
use crate::tui::Tui;

/// How long a toast stays up.
const TOAST_TTL: Duration = Duration::from_secs(3);

pub struct App {
    dashboard: Arc<Dashboard>,
    active_screen: ScreenId,
    screens: HashMap<ScreenId, Box<dyn Component>>,
    running: bool,
    help_visible: bool,
    terminal_size: (u16, u16),
    action_tx: mpsc::UnboundedSender<Action>,
    action_rx: mpsc::UnboundedReceiver<Action>,
    data_cancel: CancellationToken,
    pending_confirm: Option<ConfirmAction>,
    notification: Option<(Notification, Instant)>,
    /// Viewer URLs overlay.
    urls: Option<Vec<String>>,
    /// Latest grid snapshot, for the status bar.
    view: Arc<GridView>,
    filter: GridFilter,
}

impl App {
    pub fn new(dashboard: Arc<Dashboard>) -> Self {
        let (action_tx, action_rx) = mpsc::unbounded_channel();
        let mut screens: HashMap<ScreenId, Box<dyn Component>> =
            create_screens().into_iter().collect();
        if let Some(screen) = screens.get_mut(&ScreenId::Grid) {
            screen.set_focused(true);
        }
        let filter = dashboard.filter();

        Self {
            dashboard,
            active_screen: ScreenId::Grid,
            screens,
            running: true,
            help_visible: false,
            terminal_size: (0, 0),
            action_tx,
            action_rx,
            data_cancel: CancellationToken::new(),
            pending_confirm: None,
            notification: None,
            urls: None,
            view: Arc::new(GridView::default()),
            filter,
        }
    }

    /// Run the main event loop until quit.
    pub async fn run(&mut self) -> Result<()> {
        let mut tui = Tui::new()?;
        tui.enter()?;
        self.terminal_size = tui.size().unwrap_or((80, 24));

        let dashboard = Arc::clone(&self.dashboard);
        let cancel = self.data_cancel.clone();
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            crate::data_bridge::spawn_data_bridge(dashboard, tx, cancel).await;
        });

        self.action_tx.send(Action::ReloadLists)?;
        self.action_tx.send(Action::Dispatch(Command::Refresh))?;

        let mut events = EventReader::new(Duration::from_millis(250), Duration::from_millis(33));
        info!("TUI event loop started");

        while self.running {
            let Some(event) = events.next().await else {
                break;
            };

            match event {
                Event::Key(key) => {
                    if let Some(action) = self.handle_key_event(key)? {
                        self.action_tx.send(action)?;
                    }
                }
                Event::Resize(w, h) => self.action_tx.send(Action::Resize(w, h))?,
                Event::Tick => self.action_tx.send(Action::Tick)?,
                Event::Render => self.action_tx.send(Action::Render)?,
            }

            while let Ok(action) = self.action_rx.try_recv() {
                self.process_action(&action)?;
                if let Action::Render = action {
                    tui.draw(|frame| self.render(frame))?;
                }
            }
        }

        self.data_cancel.cancel();
        self.dashboard.dispose();
        events.stop();
        tui.exit();
        info!("TUI event loop ended");
        Ok(())
    }

    // ── Input ───────────────────────────────────────────────────────

    fn handle_key_event(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
            return Ok(Some(Action::Quit));
        }

        if self.pending_confirm.is_some() {
            return Ok(match key.code {
                KeyCode::Char('y' | 'Y') => Some(Action::ConfirmYes),
                KeyCode::Char('n' | 'N') | KeyCode::Esc => Some(Action::ConfirmNo),
                _ => None,
            });
        }

        if self.urls.is_some() {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Enter | KeyCode::Char('q' | 'o') => Some(Action::CloseUrls),
                _ => None,
            });
        }

        if self.help_visible {
            return Ok(match key.code {
                KeyCode::Esc | KeyCode::Char('?' | 'q') => Some(Action::ToggleHelp),
                _ => None,
            });
        }

        let capturing = self
            .screens
            .get(&self.active_screen)
            .is_some_and(|s| s.captures_input());

        if !capturing {
            match key.code {
                KeyCode::Char('q') => return Ok(Some(Action::Quit)),
                KeyCode::Char('?') => return Ok(Some(Action::ToggleHelp)),
                KeyCode::Tab => {
                    return Ok(Some(Action::SwitchScreen(self.active_screen.next())));
                }
                KeyCode::Char(c @ '1'..='2') => {
                    let n = u8::try_from(c).map_or(0, |b| b - b'0');
                    if let Some(screen) = ScreenId::from_number(n) {
                        return Ok(Some(Action::SwitchScreen(screen)));
                    }
                }
                _ => {}
            }
        }

        match self.screens.get_mut(&self.active_screen) {
            Some(screen) => screen.handle_key_event(key),
            None => Ok(None),
        }
    }

    // ── Actions ─────────────────────────────────────────────────────

    fn process_action(&mut self, action: &Action) -> Result<()> {
        match action {
            Action::Quit => self.running = false,
            Action::Resize(w, h) => self.terminal_size = (*w, *h),
            Action::Render => {}
            Action::Tick => {
                if self
                    .notification
                    .as_ref()
                    .is_some_and(|(_, shown)| shown.elapsed() > TOAST_TTL)
                {
                    self.notification = None;
                }
            }

            Action::SwitchScreen(target) => self.switch_screen(*target),
            Action::ToggleHelp => self.help_visible = !self.help_visible,

            // Data goes to every screen so inactive ones stay current.
            Action::GridUpdated(view) => {
                self.view = Arc::clone(view);
                self.broadcast(action)?;
            }
            Action::FilterUpdated(filter) => {
                self.filter = filter.clone();
                self.broadcast(action)?;
            }
            Action::ListsUpdated(_) => self.broadcast(action)?,

            Action::Dispatch(cmd) => {
                if matches!(cmd, Command::SelectList(_)) {
                    self.switch_screen(ScreenId::Grid);
                }
                self.execute(cmd.clone());
            }
            Action::ReloadLists => self.reload_lists(),
            Action::ScrollTo(row) => self.dashboard.grid().set_scroll_top(*row),
            Action::ShowUrls(urls) => {
                info!(count = urls.len(), "showing viewer urls");
                self.urls = Some(urls.clone());
            }
            Action::CloseUrls => self.urls = None,

            Action::ShowConfirm(confirm) => self.pending_confirm = Some(confirm.clone()),
            Action::ConfirmYes => {
                if let Some(confirm) = self.pending_confirm.take() {
                    self.execute(confirm.command());
                }
            }
            Action::ConfirmNo => self.pending_confirm = None,

            Action::Notify(n) => self.notification = Some((n.clone(), Instant::now())),
        }
        Ok(())
    }

    fn switch_screen(&mut self, target: ScreenId) {
        if target == self.active_screen {
            return;
        }
        debug!("switching screen: {} -> {}", self.active_screen, target);
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(false);
        }
        self.active_screen = target;
        if let Some(screen) = self.screens.get_mut(&self.active_screen) {
            screen.set_focused(true);
        }
    }

    fn broadcast(&mut self, action: &Action) -> Result<()> {
        for screen in self.screens.values_mut() {
            if let Some(follow_up) = screen.update(action)? {
                self.action_tx.send(follow_up)?;
            }
        }
        Ok(())
    }

    /// Run a core command in the background; its outcome comes back as an action.
    fn execute(&self, cmd: Command) {
        let dashboard = Arc::clone(&self.dashboard);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            let patched_ip = match &cmd {
                Command::PatchTile { ip } => Some(ip.clone()),
                _ => None,
            };
            debug!(command = ?cmd, "executing");
            let follow_up = match dashboard.execute(cmd).await {
                Ok(result) => result_action(result, patched_ip.as_deref()),
                Err(e) => {
                    warn!(error = %e, "command failed");
                    Some(Action::Notify(Notification::error(e.to_string())))
                }
            };
            if let Some(action) = follow_up {
                let _ = tx.send(action);
            }
        });
    }

    fn reload_lists(&self) {
        let dashboard = Arc::clone(&self.dashboard);
        let tx = self.action_tx.clone();
        tokio::spawn(async move {
            if let Err(e) = dashboard.refresh_lists().await {
                warn!(error = %e, "loading lists failed");
                let _ = tx.send(Action::Notify(Notification::error(format!(
                    "Loading lists failed: {e}"
                ))));
            }
        });
    }

    // ── Rendering ───────────────────────────────────────────────────

    fn render(&self, frame: &mut Frame) {
        let area = frame.area();
        let [content, tabs, status] = Layout::vertical([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(area);

        if let Some(screen) = self.screens.get(&self.active_screen) {
            screen.render(frame, content);
        }
        self.render_tab_bar(frame, tabs);
        self.render_status_bar(frame, status);

        if self.help_visible {
            render_help_overlay(frame, area);
        }
        if let Some(urls) = &self.urls {
            render_urls(frame, area, urls);
        }
        if let Some((notif, _)) = &self.notification {
            render_notification(frame, area, notif);
        }
        if let Some(confirm) = &self.pending_confirm {
            render_confirm_dialog(frame, area, confirm);
        }
    }

    fn render_tab_bar(&self, frame: &mut Frame, area: Rect) {
        let titles: Vec<Line> = ScreenId::ALL
            .iter()
            .map(|&id| {
                let style = if id == self.active_screen {
                    theme::tab_active()
                } else {
                    theme::tab_inactive()
                };
                Line::from(Span::styled(format!(" {} {} ", id.number(), id.label()), style))
            })
            .collect();
        let selected = ScreenId::ALL
            .iter()
            .position(|&s| s == self.active_screen)
            .unwrap_or(0);
        frame.render_widget(
            Tabs::new(titles)
                .divider(Span::styled(" ", theme::key_hint()))
                .select(selected),
            area,
        );
    }

    fn render_status_bar(&self, frame: &mut Frame, area: Rect) {
        let poller = if self.view.poller_active {
            Span::styled("\u{25cf} polling", Style::default().fg(theme::SUCCESS_GREEN))
        } else {
            Span::styled("\u{25cb} poller idle", theme::key_hint())
        };
        let last_poll = Span::styled(
            format!("  last poll {}", poll_age(self.view.last_poll, Utc::now())),
            theme::table_row(),
        );
        let backend = Span::styled(
            format!("  \u{2502} {}", self.dashboard.backend().client().base_url()),
            theme::key_hint(),
        );
        let hints = Span::styled("  \u{2502} ? help  Tab screens  q quit", theme::key_hint());

        let mut spans = vec![Span::raw(" "), poller, last_poll];
        if self.view.loading {
            spans.push(Span::styled(
                "  \u{25d0} loading",
                Style::default().fg(theme::ELECTRIC_YELLOW),
            ));
        }
        spans.push(Span::styled(
            format!("  \u{2502} {}", self.filter.list_label()),
            theme::title_style(),
        ));
        spans.push(backend);
        spans.push(hints);
        frame.render_widget(Paragraph::new(Line::from(spans)), area);
    }
}

// ── Command results ─────────────────────────────────────────────────

/// Toast or overlay for a finished command. Selection changes speak for
/// themselves through the grid.
fn result_action(result: CommandResult, patched_ip: Option<&str>) -> Option<Action> {
    let notification = match result {
        CommandResult::Ok | CommandResult::Selection { .. } => return None,
        CommandResult::Rendered(report) if report.superseded => return None,
        CommandResult::Rendered(report) => Notification::info(format!(
            "{} of {} servers reachable",
            report.rendered, report.candidates
        )),
        CommandResult::Patched(outcome) => {
            let ip = patched_ip.unwrap_or("tile");
            match outcome {
                PatchOutcome::Replaced(_) => Notification::success(format!("Updated {ip}")),
                PatchOutcome::NotFound => {
                    Notification::warning(format!("{ip} is no longer registered"))
                }
                PatchOutcome::Failed(e) => Notification::error(format!("{ip}: {e}")),
                PatchOutcome::Missing | PatchOutcome::Stale => return None,
            }
        }
        CommandResult::Open(urls) if urls.is_empty() => return None,
        CommandResult::Open(urls) => return Some(Action::ShowUrls(urls)),
        CommandResult::Lists(_) => Notification::success("Lists updated"),
    };
    Some(Action::Notify(notification))
}

/// "12s ago" style age of the last poll tick.
fn poll_age(last: Option<DateTime<Utc>>, now: DateTime<Utc>) -> String {
    let Some(last) = last else {
        return "never".into();
    };
    let secs = now.signed_duration_since(last).num_seconds().max(0);
    let secs = u64::try_from(secs).unwrap_or(0);
    format!("{} ago", humantime::format_duration(Duration::from_secs(secs)))
}

// ── Overlays ────────────────────────────────────────────────────────

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width.saturating_sub(4));
    let height = height.min(area.height.saturating_sub(2));
    let x = area.x + area.width.saturating_sub(width) / 2;
    let y = area.y + area.height.saturating_sub(height) / 2;
    Rect::new(x, y, width, height)
}

fn overlay_block(title: &str, border: Style) -> Block<'_> {
    Block::default()
        .title(title)
        .title_style(theme::title_style())
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(border)
        .style(Style::default().bg(theme::BG_DARK))
}

fn render_help_overlay(frame: &mut Frame, area: Rect) {
    let help_area = centered(area, 62, 24);
    frame.render_widget(Clear, help_area);
    let block = overlay_block(" Keyboard Shortcuts ", theme::border_focused());
    let inner = block.inner(help_area);
    frame.render_widget(block, help_area);

    let section = |name: &'static str| {
        Line::from(Span::styled(format!("  {name}"), Style::default().fg(theme::NEON_CYAN)))
    };
    let key = |k: &'static str, label: &'static str| {
        Line::from(vec![
            Span::styled(format!("  {k:<10}"), theme::key_hint_key()),
            Span::styled(label, theme::key_hint()),
        ])
    };

    let lines = vec![
        section("Grid"),
        key("hjkl \u{2190}\u{2193}\u{2191}\u{2192}", "Move between tiles"),
        key("space", "Select / unselect tile"),
        key("a  i  c", "Select all / invert / clear"),
        key("x  u", "Exclude / include selected"),
        key("o  Enter", "Viewer URL (selected, or this tile)"),
        key("v", "View-only URL of this tile"),
        key("p", "Re-fetch this tile"),
        key("r", "Reload and re-probe"),
        key("e", "Toggle active / excluded servers"),
        key("R", "Include every excluded server"),
        Line::from(""),
        section("Lists"),
        key("Enter", "Filter grid by list"),
        key("n  d", "New / delete list"),
        key("+  -", "Add / remove selected servers"),
        Line::from(""),
        section("Global"),
        key("1-2 Tab", "Switch screen"),
        key("?", "This help"),
        key("q", "Quit"),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_urls(frame: &mut Frame, area: Rect, urls: &[String]) {
    let height = u16::try_from(urls.len()).unwrap_or(u16::MAX).saturating_add(4);
    let url_area = centered(area, area.width, height);
    frame.render_widget(Clear, url_area);
    let block = overlay_block(" Viewer URLs ", theme::border_focused());
    let inner = block.inner(url_area);
    frame.render_widget(block, url_area);

    let mut lines: Vec<Line> = urls
        .iter()
        .map(|u| Line::from(Span::styled(format!(" {u}"), theme::table_row())))
        .collect();
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(" Esc to close", theme::key_hint())));
    frame.render_widget(Paragraph::new(lines), inner);
}

fn render_confirm_dialog(frame: &mut Frame, area: Rect, confirm: &ConfirmAction) {
    let dialog_area = centered(area, 50, 5);
    frame.render_widget(Clear, dialog_area);
    let block = overlay_block(" Confirm ", Style::default().fg(theme::ELECTRIC_YELLOW));
    let inner = block.inner(dialog_area);
    frame.render_widget(block, dialog_area);

    let text = vec![
        Line::from(Span::styled(
            format!("  {confirm}"),
            Style::default().fg(theme::DIM_WHITE),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("  y ", theme::key_hint_key()),
            Span::styled("confirm    ", theme::key_hint()),
            Span::styled("n ", theme::key_hint_key()),
            Span::styled("cancel", theme::key_hint()),
        ]),
    ];
    frame.render_widget(Paragraph::new(text), inner);
}

/// Toast in the bottom-right corner, above the status bar.
fn render_notification(frame: &mut Frame, area: Rect, notif: &Notification) {
    let msg_len = u16::try_from(notif.message.chars().count()).unwrap_or(u16::MAX);
    let width = msg_len.saturating_add(6).clamp(20, 60).min(area.width);
    let height = 3u16;
    let x = area.x + area.width.saturating_sub(width + 1);
    let y = area.y + area.height.saturating_sub(height + 2);
    let toast_area = Rect::new(x, y, width, height.min(area.height));

    let (color, icon) = match notif.level {
        NotificationLevel::Success => (theme::SUCCESS_GREEN, "\u{2713}"),
        NotificationLevel::Error => (theme::ERROR_RED, "\u{2717}"),
        NotificationLevel::Warning => (theme::ELECTRIC_YELLOW, "!"),
        NotificationLevel::Info => (theme::NEON_CYAN, "\u{b7}"),
    };

    frame.render_widget(Clear, toast_area);
    let block = Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(color))
        .style(Style::default().bg(theme::BG_DARK));
    let inner = block.inner(toast_area);
    frame.render_widget(block, toast_area);

    let line = Line::from(vec![
        Span::styled(format!(" {icon} "), Style::default().fg(color)),
        Span::styled(notif.message.as_str(), Style::default().fg(theme::DIM_WHITE)),
    ]);
    frame.render_widget(Paragraph::new(line), inner);
}
