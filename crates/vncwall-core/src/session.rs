// ── Grid session ──
//
// Everything one dashboard instance owns: the state store, the grid, the
// poller guard and the counters that let late async results detect that
// they have been superseded.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::grid::Grid;
use crate::store::TileStateStore;

#[derive(Debug, Default)]
pub struct GridSession {
    store: TileStateStore,
    grid: Grid,
    poller_active: AtomicBool,
    cancel: CancellationToken,
    /// Latest patch generation handed out per ip.
    generations: DashMap<String, u64>,
    render_epoch: AtomicU64,
}

impl GridSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn store(&self) -> &TileStateStore {
        &self.store
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    // ── Poller guard ─────────────────────────────────────────────────

    pub fn poller_active(&self) -> bool {
        self.poller_active.load(Ordering::Acquire)
    }

    /// Claim the right to start the poller. Succeeds at most once per
    /// session, and never after [`dispose`](Self::dispose).
    pub fn try_claim_poller(&self) -> bool {
        if self.cancel.is_cancelled() {
            return false;
        }
        let claimed = self
            .poller_active
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok();
        if claimed {
            self.grid.set_poller_active(true);
        }
        claimed
    }

    /// Token cancelled when the session is disposed.
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel.child_token()
    }

    // ── Render epochs ────────────────────────────────────────────────

    /// Start a new full render, superseding any render still running.
    pub fn begin_render(&self) -> u64 {
        self.render_epoch.fetch_add(1, Ordering::AcqRel) + 1
    }

    pub fn is_current_render(&self, epoch: u64) -> bool {
        !self.cancel.is_cancelled() && self.render_epoch.load(Ordering::Acquire) == epoch
    }

    // ── Patch generations ────────────────────────────────────────────

    pub fn next_generation(&self, ip: &str) -> u64 {
        let mut entry = self.generations.entry(ip.to_owned()).or_insert(0);
        *entry += 1;
        *entry
    }

    pub fn is_current_generation(&self, ip: &str, generation: u64) -> bool {
        !self.cancel.is_cancelled()
            && self
                .generations
                .get(ip)
                .is_some_and(|g| *g.value() == generation)
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    pub fn is_disposed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Stop the poller and make every in-flight render or patch stale.
    pub fn dispose(&self) {
        if self.cancel.is_cancelled() {
            return;
        }
        self.cancel.cancel();
        self.poller_active.store(false, Ordering::Release);
        self.grid.set_poller_active(false);
        info!("grid session disposed");
    }
}
