// ── Command API ──
//
// Every user-driven action on the dashboard is one `Command` variant,
// dispatched through `Dashboard::execute`. Front ends map keys, buttons
// or subcommands onto these and never touch the grid directly.

use vncwall_api::NamedLists;

use crate::reconciler::{PatchOutcome, RenderReport};

/// All operations a front end can request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    // ── Grid ─────────────────────────────────────────────────────────
    /// Reload the inventory and rebuild the grid with the current filter.
    Refresh,
    SetShowExcluded(bool),
    /// Filter by named list; `"All Servers"` clears the list filter.
    SelectList(String),
    PatchTile {
        ip: String,
    },

    // ── Selection ────────────────────────────────────────────────────
    SelectAll,
    InvertSelection,
    CancelSelection,
    ToggleSelection {
        ip: String,
    },
    /// Management URLs of the checked tiles.
    OpenSelected,

    // ── Exclusion ────────────────────────────────────────────────────
    ExcludeSelected,
    IncludeSelected,
    /// Include every server and return to the active view.
    ResetFilter,
    Exclude {
        ips: Vec<String>,
    },
    Include {
        ips: Vec<String>,
    },

    // ── Named lists ──────────────────────────────────────────────────
    CreateList {
        name: String,
    },
    DeleteLists {
        names: Vec<String>,
    },
    AddToLists {
        lists: Vec<String>,
        ips: Vec<String>,
    },
    RemoveFromLists {
        lists: Vec<String>,
        ips: Vec<String>,
    },
}

/// What a command produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommandResult {
    Ok,
    Rendered(RenderReport),
    Patched(PatchOutcome),
    /// Number of checked tiles after a selection change.
    Selection {
        checked: usize,
    },
    Open(Vec<String>),
    /// Named lists after a list mutation.
    Lists(NamedLists),
}
