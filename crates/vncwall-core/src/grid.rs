// ── In-memory grid ──
//
// The rendered grid as a list of slots, published through a `watch`
// channel so front ends redraw from snapshots. Every mutation goes through
// `send_modify`/`send_if_modified`, which notify receivers even when none
// are attached yet.

use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use tokio::sync::watch;

use crate::render::Tile;

/// Upper bound on grid columns.
pub const MAX_COLUMNS: usize = 4;

/// Column count for `n` visible servers: `min(ceil(sqrt(max(n, 1))), 4)`.
pub fn column_count(n: usize) -> usize {
    let n = n.max(1);
    let mut cols = 1;
    while cols * cols < n && cols < MAX_COLUMNS {
        cols += 1;
    }
    cols
}

/// Identity of one rendered node. A patch replaces the node, so a new id
/// means the slot was rebuilt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SlotContent {
    Tile(Tile),
    /// A patch is in flight for this slot.
    Loading,
    /// Inline error shown in place of the tile.
    Error(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct GridSlot {
    pub node: NodeId,
    pub ip: String,
    pub content: SlotContent,
    /// Selection checkbox state.
    pub checked: bool,
}

impl GridSlot {
    pub fn tile(&self) -> Option<&Tile> {
        match &self.content {
            SlotContent::Tile(tile) => Some(tile),
            _ => None,
        }
    }
}

/// Snapshot of the grid handed to subscribers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GridView {
    pub columns: usize,
    pub slots: Vec<GridSlot>,
    pub scroll_top: usize,
    /// Full render or reload in progress.
    pub loading: bool,
    pub poller_active: bool,
    pub last_poll: Option<DateTime<Utc>>,
}

impl GridView {
    pub fn tiles(&self) -> impl Iterator<Item = &Tile> {
        self.slots.iter().filter_map(GridSlot::tile)
    }

    pub fn slot(&self, ip: &str) -> Option<&GridSlot> {
        self.slots.iter().find(|s| s.ip == ip)
    }

    pub fn checked_ips(&self) -> Vec<String> {
        self.slots
            .iter()
            .filter(|s| s.checked)
            .map(|s| s.ip.clone())
            .collect()
    }

    pub fn any_checked(&self) -> bool {
        self.slots.iter().any(|s| s.checked)
    }

    /// Column index of the slot holding `ip`.
    pub fn column_of(&self, ip: &str) -> Option<usize> {
        let idx = self.slots.iter().position(|s| s.ip == ip)?;
        Some(idx % self.columns.max(1))
    }

    pub fn row_count(&self) -> usize {
        self.slots.len().div_ceil(self.columns.max(1))
    }
}

/// The live grid.
#[derive(Debug)]
pub struct Grid {
    view: watch::Sender<GridView>,
    next_node: AtomicU64,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    pub fn new() -> Self {
        let (view, _) = watch::channel(GridView {
            columns: 1,
            ..GridView::default()
        });
        Self {
            view,
            next_node: AtomicU64::new(1),
        }
    }

    fn alloc_node(&self) -> NodeId {
        NodeId(self.next_node.fetch_add(1, Ordering::Relaxed))
    }

    pub fn subscribe(&self) -> watch::Receiver<GridView> {
        self.view.subscribe()
    }

    pub fn snapshot(&self) -> GridView {
        self.view.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.view.borrow().slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.view.borrow().slots.is_empty()
    }

    /// Number of slots currently holding a built tile.
    pub fn tile_count(&self) -> usize {
        self.view.borrow().tiles().count()
    }

    pub fn node_of(&self, ip: &str) -> Option<NodeId> {
        self.view.borrow().slot(ip).map(|s| s.node)
    }

    // ── Structural mutations ─────────────────────────────────────────

    /// Drop every slot and set the column count.
    pub fn reset(&self, columns: usize) {
        self.view.send_modify(|v| {
            v.slots.clear();
            v.columns = columns.max(1);
            v.scroll_top = 0;
        });
    }

    /// Append a freshly built tile at the end.
    pub fn append(&self, tile: Tile) -> NodeId {
        let node = self.alloc_node();
        self.view.send_modify(|v| {
            v.slots.push(GridSlot {
                node,
                ip: tile.ip.clone(),
                content: SlotContent::Tile(tile),
                checked: false,
            });
        });
        node
    }

    /// Put a loading placeholder into the slot for `ip`, returning the node
    /// that now shows it. `None` when no slot exists.
    pub fn show_placeholder(&self, ip: &str) -> Option<NodeId> {
        let mut node = None;
        self.view.send_if_modified(|v| {
            let Some(slot) = v.slots.iter_mut().find(|s| s.ip == ip) else {
                return false;
            };
            slot.content = SlotContent::Loading;
            slot.checked = false;
            node = Some(slot.node);
            true
        });
        node
    }

    /// Replace the slot for `ip` with a new node holding `tile`, but only if
    /// the slot is still `expected`. Returns the new node id.
    pub fn replace_if(&self, ip: &str, expected: NodeId, tile: Tile) -> Option<NodeId> {
        let node = self.alloc_node();
        let mut replaced = false;
        self.view.send_if_modified(|v| {
            let Some(slot) = v.slots.iter_mut().find(|s| s.ip == ip && s.node == expected) else {
                return false;
            };
            *slot = GridSlot {
                node,
                ip: ip.to_owned(),
                content: SlotContent::Tile(tile),
                checked: false,
            };
            replaced = true;
            true
        });
        replaced.then_some(node)
    }

    /// Show an inline error in the slot for `ip` if it is still `expected`.
    pub fn mark_error_if(&self, ip: &str, expected: NodeId, message: impl Into<String>) -> bool {
        let message = message.into();
        self.view.send_if_modified(|v| {
            let Some(slot) = v.slots.iter_mut().find(|s| s.ip == ip && s.node == expected) else {
                return false;
            };
            slot.content = SlotContent::Error(message);
            true
        })
    }

    // ── Selection ────────────────────────────────────────────────────

    /// Apply `f` to the checkbox of every slot that holds a tile.
    /// Subscribers are notified only when some checkbox changed.
    pub(crate) fn update_checks(&self, mut f: impl FnMut(&GridSlot) -> bool) -> usize {
        let mut checked = 0;
        self.view.send_if_modified(|v| {
            let mut changed = false;
            for slot in &mut v.slots {
                let next = slot.tile().is_some() && f(slot);
                changed |= next != slot.checked;
                slot.checked = next;
                checked += usize::from(next);
            }
            changed
        });
        checked
    }

    // ── View state ───────────────────────────────────────────────────

    pub fn scroll_top(&self) -> usize {
        self.view.borrow().scroll_top
    }

    pub fn set_scroll_top(&self, scroll_top: usize) {
        self.view.send_if_modified(|v| {
            let changed = v.scroll_top != scroll_top;
            v.scroll_top = scroll_top;
            changed
        });
    }

    pub fn set_loading(&self, loading: bool) {
        self.view.send_if_modified(|v| {
            let changed = v.loading != loading;
            v.loading = loading;
            changed
        });
    }

    pub fn set_poller_active(&self, active: bool) {
        self.view.send_modify(|v| v.poller_active = active);
    }

    pub fn set_last_poll(&self, at: DateTime<Utc>) {
        self.view.send_modify(|v| v.last_poll = Some(at));
    }
}
