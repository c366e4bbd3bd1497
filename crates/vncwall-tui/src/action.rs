//! All UI actions. Actions are the sole mechanism for state mutation.

use std::fmt;
use std::sync::Arc;

use vncwall_core::{Command, GridFilter, GridView, NamedLists};

use crate::screen::ScreenId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// A toast notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub message: String,
    pub level: NotificationLevel,
}

impl Notification {
    pub fn success(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Success,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Error,
        }
    }

    pub fn warning(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Warning,
        }
    }

    pub fn info(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
            level: NotificationLevel::Info,
        }
    }
}

/// Operations that need a y/n before they run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmAction {
    /// Include every server again.
    ResetExclusions,
    DeleteList { name: String },
}

impl ConfirmAction {
    pub fn command(&self) -> Command {
        match self {
            Self::ResetExclusions => Command::ResetFilter,
            Self::DeleteList { name } => Command::DeleteLists {
                names: vec![name.clone()],
            },
        }
    }
}

impl fmt::Display for ConfirmAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResetExclusions => f.write_str("Include every excluded server?"),
            Self::DeleteList { name } => write!(f, "Delete list '{name}'?"),
        }
    }
}

#[derive(Debug, Clone)]
pub enum Action {
    // ── Lifecycle ──────────────────────────────────────────────────
    Quit,
    Tick,
    Render,
    Resize(u16, u16),

    // ── Navigation ────────────────────────────────────────────────
    SwitchScreen(ScreenId),
    ToggleHelp,

    // ── Data (from the bridge) ────────────────────────────────────
    GridUpdated(Arc<GridView>),
    FilterUpdated(GridFilter),
    ListsUpdated(Arc<NamedLists>),

    // ── Dashboard ─────────────────────────────────────────────────
    /// Run a core command in the background.
    Dispatch(Command),
    ReloadLists,
    /// Persist the first visible grid row so patches keep the viewport.
    ScrollTo(usize),
    /// Viewer URLs to show (the terminal cannot embed them).
    ShowUrls(Vec<String>),
    CloseUrls,

    // ── Confirm dialog ────────────────────────────────────────────
    ShowConfirm(ConfirmAction),
    ConfirmYes,
    ConfirmNo,

    // ── Notifications ─────────────────────────────────────────────
    Notify(Notification),
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn confirm_maps_to_core_command() {
        assert_eq!(ConfirmAction::ResetExclusions.command(), Command::ResetFilter);
        assert_eq!(
            ConfirmAction::DeleteList { name: "lab".into() }.command(),
            Command::DeleteLists {
                names: vec!["lab".into()]
            }
        );
        assert_eq!(
            ConfirmAction::DeleteList { name: "lab".into() }.to_string(),
            "Delete list 'lab'?"
        );
    }
}
