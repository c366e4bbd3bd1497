// ── Grid reconciler ──
//
// Full render: filter, probe each candidate in turn, append reachable
// tiles. Single-tile patch: placeholder, re-fetch, swap the node. Both
// carry a render epoch or patch generation and drop their result once a
// newer operation has superseded them.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::filter::GridFilter;
use crate::grid::{NodeId, column_count};
use crate::model::Server;
use crate::poller::PollScheduler;
use crate::probe;
use crate::render::TileRenderer;
use crate::session::GridSession;

/// Result of [`GridReconciler::patch_one`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchOutcome {
    /// The slot now holds a freshly built tile.
    Replaced(NodeId),
    /// The server vanished from the backend; the slot shows an inline error.
    NotFound,
    /// Fetching failed; the slot shows an inline error.
    Failed(String),
    /// No slot exists for this ip.
    Missing,
    /// A newer render or patch took over; the result was discarded.
    Stale,
}

/// Reported after each probe of a full render.
#[derive(Debug, Clone, Copy)]
pub struct ProbeProgress<'a> {
    pub server: &'a Server,
    pub reachable: bool,
    /// Probes finished so far, including this one.
    pub done: usize,
    /// Candidates in this render.
    pub total: usize,
}

/// Counts from one [`GridReconciler::full_render`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RenderReport {
    /// Servers passing the exclusion rule.
    pub candidates: usize,
    pub rendered: usize,
    pub unreachable: usize,
    /// A newer render started before this one finished.
    pub superseded: bool,
}

pub struct GridReconciler<B: Backend> {
    backend: Arc<B>,
    session: Arc<GridSession>,
    renderer: TileRenderer,
    probe_pacing: Duration,
    poll_interval: Duration,
}

impl<B: Backend> Clone for GridReconciler<B> {
    fn clone(&self) -> Self {
        Self {
            backend: Arc::clone(&self.backend),
            session: Arc::clone(&self.session),
            renderer: self.renderer.clone(),
            probe_pacing: self.probe_pacing,
            poll_interval: self.poll_interval,
        }
    }
}

impl<B: Backend> GridReconciler<B> {
    pub fn new(
        backend: Arc<B>,
        session: Arc<GridSession>,
        renderer: TileRenderer,
        probe_pacing: Duration,
        poll_interval: Duration,
    ) -> Self {
        Self {
            backend,
            session,
            renderer,
            probe_pacing,
            poll_interval,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> &GridSession {
        &self.session
    }

    pub fn renderer(&self) -> &TileRenderer {
        &self.renderer
    }

    // ── Full render ──────────────────────────────────────────────────

    /// Rebuild the grid from `servers`.
    ///
    /// Every server is recorded in the state store; only those passing the
    /// filter's exclusion rule are probed, and only reachable ones become
    /// tiles. Probes run one at a time with the pacing delay after each.
    pub async fn full_render(&self, servers: &[Server], filter: &GridFilter) -> RenderReport {
        self.full_render_with(servers, filter, |_| {}).await
    }

    /// [`full_render`](Self::full_render), calling `on_probe` after every probe.
    pub async fn full_render_with<F>(
        &self,
        servers: &[Server],
        filter: &GridFilter,
        mut on_probe: F,
    ) -> RenderReport
    where
        F: FnMut(ProbeProgress<'_>) + Send,
    {
        let epoch = self.session.begin_render();
        let grid = self.session.grid();
        let candidates: Vec<&Server> = servers.iter().filter(|s| filter.shows(s)).collect();
        let mut report = RenderReport {
            candidates: candidates.len(),
            ..RenderReport::default()
        };

        grid.reset(column_count(candidates.len()));
        self.session.store().record_all(servers);
        debug!(
            epoch,
            total = servers.len(),
            candidates = candidates.len(),
            "full render started"
        );

        let total = candidates.len();
        for (idx, server) in candidates.into_iter().enumerate() {
            let reachable =
                probe::is_reachable(&*self.backend, &server.ip, server.display_port).await;
            if !self.session.is_current_render(epoch) {
                debug!(epoch, "full render superseded");
                report.superseded = true;
                return report;
            }
            if reachable {
                grid.append(self.renderer.build(server));
                report.rendered += 1;
            } else {
                report.unreachable += 1;
            }
            on_probe(ProbeProgress {
                server,
                reachable,
                done: idx + 1,
                total,
            });
            if !self.probe_pacing.is_zero() {
                tokio::time::sleep(self.probe_pacing).await;
            }
        }

        if !self.session.is_current_render(epoch) {
            report.superseded = true;
            return report;
        }
        self.ensure_poller();
        grid.set_loading(false);
        info!(
            rendered = report.rendered,
            unreachable = report.unreachable,
            "full render complete"
        );
        report
    }

    /// Start the background poller unless it already runs or is disabled.
    fn ensure_poller(&self) {
        if self.poll_interval.is_zero() || !self.session.try_claim_poller() {
            return;
        }
        let scheduler = PollScheduler::new(self.clone(), self.poll_interval);
        scheduler.spawn(self.session.cancel_token());
    }

    // ── Single-tile patch ────────────────────────────────────────────

    /// Rebuild the tile for `ip` from fresh backend state, keeping the
    /// grid's scroll position.
    pub async fn patch_one(&self, ip: &str) -> PatchOutcome {
        let grid = self.session.grid();
        let scroll = grid.scroll_top();

        let Some(node) = grid.show_placeholder(ip) else {
            debug!(ip, "patch skipped, no slot");
            return PatchOutcome::Missing;
        };
        let generation = self.session.next_generation(ip);
        grid.set_scroll_top(scroll);

        let fetched = self.backend.fetch_servers(true).await;
        if !self.session.is_current_generation(ip, generation) {
            debug!(ip, generation, "patch superseded");
            return PatchOutcome::Stale;
        }

        let outcome = match fetched {
            Ok(servers) => match servers.into_iter().find(|s| s.ip == ip) {
                Some(server) => {
                    let tile = self.renderer.build(&server);
                    match grid.replace_if(ip, node, tile) {
                        Some(new_node) => {
                            self.session.store().record(&server);
                            PatchOutcome::Replaced(new_node)
                        }
                        None => PatchOutcome::Stale,
                    }
                }
                None => {
                    warn!(ip, "server not found during patch");
                    if grid.mark_error_if(ip, node, "server not found") {
                        PatchOutcome::NotFound
                    } else {
                        PatchOutcome::Stale
                    }
                }
            },
            Err(e) => {
                warn!(ip, error = %e, "tile update failed");
                let message = format!("update failed: {e}");
                if grid.mark_error_if(ip, node, message.clone()) {
                    PatchOutcome::Failed(message)
                } else {
                    PatchOutcome::Stale
                }
            }
        };

        grid.set_scroll_top(scroll);
        outcome
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::grid::SlotContent;
    use crate::test_support::{FakeBackend, server};
    use pretty_assertions::assert_eq;

    const PACING: Duration = Duration::from_millis(100);

    fn reconciler(backend: FakeBackend) -> (GridReconciler<FakeBackend>, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let rec = GridReconciler::new(
            Arc::clone(&backend),
            Arc::new(GridSession::new()),
            TileRenderer::default(),
            PACING,
            Duration::ZERO,
        );
        (rec, backend)
    }

    fn sample() -> Vec<Server> {
        vec![
            server("10.0.0.1", "alice", false),
            server("10.0.0.2", "bob", true),
        ]
    }

    fn rendered_ips(rec: &GridReconciler<FakeBackend>) -> Vec<String> {
        rec.session()
            .grid()
            .snapshot()
            .slots
            .iter()
            .map(|s| s.ip.clone())
            .collect()
    }

    // ── full_render ──────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn hidden_servers_are_tracked_not_rendered() {
        let (rec, _) = reconciler(FakeBackend::new(sample()));
        let report = rec.full_render(&sample(), &GridFilter::default()).await;

        assert_eq!(report.rendered, 1);
        assert_eq!(rendered_ips(&rec), ["10.0.0.1"]);
        assert!(rec.session().store().contains("10.0.0.1"));
        assert!(rec.session().store().contains("10.0.0.2"));
    }

    #[tokio::test(start_paused = true)]
    async fn unreachable_server_is_recorded_but_not_shown() {
        let backend = FakeBackend::new(sample());
        backend.set_unreachable("10.0.0.1");
        let (rec, _) = reconciler(backend);

        let report = rec.full_render(&sample(), &GridFilter::default()).await;

        assert_eq!(report.unreachable, 1);
        assert!(rec.session().grid().is_empty());
        assert_eq!(rec.session().store().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn probe_error_does_not_abort_batch() {
        let servers = vec![
            server("10.0.0.1", "a", false),
            server("10.0.0.2", "b", false),
            server("10.0.0.3", "c", false),
        ];
        let backend = FakeBackend::new(servers.clone());
        backend.fail_probe("10.0.0.2");
        let (rec, _) = reconciler(backend);

        rec.full_render(&servers, &GridFilter::default()).await;
        assert_eq!(rendered_ips(&rec), ["10.0.0.1", "10.0.0.3"]);
    }

    #[tokio::test(start_paused = true)]
    async fn probes_are_sequential_and_paced() {
        let servers: Vec<_> = (1..=3)
            .map(|i| server(&format!("10.0.0.{i}"), "u", false))
            .collect();
        let (rec, backend) = reconciler(FakeBackend::new(servers.clone()));

        let start = tokio::time::Instant::now();
        rec.full_render(&servers, &GridFilter::default()).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= PACING * 3 && elapsed < PACING * 4, "{elapsed:?}");
        assert_eq!(
            backend.probe_log(),
            ["10.0.0.1", "10.0.0.2", "10.0.0.3"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn pacing_follows_unreachable_and_failed_probes() {
        let servers = vec![
            server("10.0.0.1", "a", false),
            server("10.0.0.2", "b", false),
        ];
        let backend = FakeBackend::new(servers.clone());
        backend.set_unreachable("10.0.0.1");
        backend.fail_probe("10.0.0.2");
        let (rec, backend) = reconciler(backend);

        let start = tokio::time::Instant::now();
        let report = rec.full_render(&servers, &GridFilter::default()).await;

        let elapsed = start.elapsed();
        assert!(elapsed >= PACING * 2, "{elapsed:?}");
        assert_eq!(report.rendered, 0);
        assert_eq!(report.unreachable, 2);
        assert_eq!(backend.probe_log(), ["10.0.0.1", "10.0.0.2"]);
    }

    #[tokio::test(start_paused = true)]
    async fn progress_reported_per_candidate() {
        let backend = FakeBackend::new(sample());
        backend.set_unreachable("10.0.0.1");
        let (rec, _) = reconciler(backend);

        let mut seen = Vec::new();
        rec.full_render_with(&sample(), &GridFilter::default(), |p| {
            seen.push((p.server.ip.clone(), p.reachable, p.done, p.total));
        })
        .await;

        assert_eq!(seen, [("10.0.0.1".to_owned(), false, 1, 1)]);
    }

    #[tokio::test(start_paused = true)]
    async fn show_excluded_renders_only_excluded() {
        let (rec, _) = reconciler(FakeBackend::new(sample()));
        let filter = GridFilter {
            show_excluded: true,
            list: None,
        };
        rec.full_render(&sample(), &filter).await;

        assert_eq!(rendered_ips(&rec), ["10.0.0.2"]);
        let view = rec.session().grid().snapshot();
        assert_eq!(view.tiles().next().unwrap().css_class(), "tile excluded");
    }

    #[tokio::test(start_paused = true)]
    async fn repeated_render_is_idempotent() {
        let servers: Vec<_> = (1..=7)
            .map(|i| server(&format!("10.0.0.{i}"), "u", false))
            .collect();
        let (rec, _) = reconciler(FakeBackend::new(servers.clone()));

        rec.full_render(&servers, &GridFilter::default()).await;
        let first = rec.session().grid().snapshot();
        rec.full_render(&servers, &GridFilter::default()).await;
        let second = rec.session().grid().snapshot();

        assert_eq!(first.columns, 3);
        assert_eq!(first.columns, second.columns);
        let layout = |v: &crate::grid::GridView| -> Vec<(String, Option<usize>)> {
            v.slots
                .iter()
                .map(|s| (s.ip.clone(), v.column_of(&s.ip)))
                .collect()
        };
        assert_eq!(layout(&first), layout(&second));
    }

    #[tokio::test(start_paused = true)]
    async fn empty_render_has_one_column_and_clears_loading() {
        let (rec, _) = reconciler(FakeBackend::new(Vec::new()));
        rec.session().grid().set_loading(true);
        rec.full_render(&[], &GridFilter::default()).await;

        let view = rec.session().grid().snapshot();
        assert_eq!(view.columns, 1);
        assert!(!view.loading);
    }

    #[tokio::test(start_paused = true)]
    async fn newer_render_supersedes_running_one() {
        let servers: Vec<_> = (1..=4)
            .map(|i| server(&format!("10.0.0.{i}"), "u", false))
            .collect();
        let (rec, _) = reconciler(FakeBackend::new(servers.clone()));

        let slow = rec.clone();
        let slow_servers = servers.clone();
        let first = tokio::spawn(async move {
            slow.full_render(&slow_servers, &GridFilter::default()).await
        });
        tokio::time::sleep(PACING + PACING / 2).await;

        let fresh = vec![server("10.0.0.9", "z", false)];
        rec.full_render(&fresh, &GridFilter::default()).await;
        let report = first.await.unwrap();

        assert!(report.superseded);
        assert_eq!(rendered_ips(&rec), ["10.0.0.9"]);
    }

    // ── patch_one ────────────────────────────────────────────────────

    #[tokio::test(start_paused = true)]
    async fn patch_replaces_node_with_fresh_state() {
        let (rec, backend) = reconciler(FakeBackend::new(sample()));
        rec.full_render(&sample(), &GridFilter::default()).await;
        let before = rec.session().grid().node_of("10.0.0.1").unwrap();

        backend.set_servers(vec![server("10.0.0.1", "carol", false)]);
        let outcome = rec.patch_one("10.0.0.1").await;

        let PatchOutcome::Replaced(after) = outcome else {
            panic!("expected Replaced, got {outcome:?}");
        };
        assert_ne!(before, after);
        let view = rec.session().grid().snapshot();
        assert_eq!(view.tiles().next().unwrap().label, "carol | host: 10.0.0.1");
        assert_eq!(rec.session().store().get("10.0.0.1").unwrap().username, "carol");
    }

    #[tokio::test(start_paused = true)]
    async fn patch_missing_server_marks_slot_error() {
        let (rec, backend) = reconciler(FakeBackend::new(sample()));
        rec.full_render(&sample(), &GridFilter::default()).await;
        let slots_before = rec.session().grid().len();

        backend.set_servers(Vec::new());
        assert_eq!(rec.patch_one("10.0.0.1").await, PatchOutcome::NotFound);

        let view = rec.session().grid().snapshot();
        assert_eq!(view.slots.len(), slots_before);
        assert_eq!(
            view.slot("10.0.0.1").unwrap().content,
            SlotContent::Error("server not found".into())
        );
    }

    #[tokio::test(start_paused = true)]
    async fn patch_fetch_failure_marks_slot_error() {
        let (rec, backend) = reconciler(FakeBackend::new(sample()));
        rec.full_render(&sample(), &GridFilter::default()).await;

        backend.fail_fetch(true);
        let outcome = rec.patch_one("10.0.0.1").await;

        assert!(matches!(outcome, PatchOutcome::Failed(ref m) if m.starts_with("update failed")));
        let view = rec.session().grid().snapshot();
        assert!(matches!(
            view.slot("10.0.0.1").unwrap().content,
            SlotContent::Error(_)
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn patch_without_slot_does_nothing() {
        let (rec, backend) = reconciler(FakeBackend::new(sample()));
        rec.full_render(&sample(), &GridFilter::default()).await;
        let fetches = backend.fetch_count();

        assert_eq!(rec.patch_one("10.0.0.2").await, PatchOutcome::Missing);
        assert_eq!(backend.fetch_count(), fetches);
    }

    #[tokio::test(start_paused = true)]
    async fn patch_preserves_scroll_position() {
        let (rec, _) = reconciler(FakeBackend::new(sample()));
        rec.full_render(&sample(), &GridFilter::default()).await;
        rec.session().grid().set_scroll_top(7);

        rec.patch_one("10.0.0.1").await;
        assert_eq!(rec.session().grid().scroll_top(), 7);
    }

    #[tokio::test(start_paused = true)]
    async fn older_patch_result_is_discarded() {
        let (rec, backend) = reconciler(FakeBackend::new(sample()));
        rec.full_render(&sample(), &GridFilter::default()).await;
        backend.set_fetch_delay(Duration::from_secs(1));

        let first = {
            let rec = rec.clone();
            tokio::spawn(async move { rec.patch_one("10.0.0.1").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        let second = rec.patch_one("10.0.0.1").await;

        assert_eq!(first.await.unwrap(), PatchOutcome::Stale);
        assert!(matches!(second, PatchOutcome::Replaced(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn patch_after_full_render_reset_is_stale() {
        let (rec, backend) = reconciler(FakeBackend::new(sample()));
        rec.full_render(&sample(), &GridFilter::default()).await;
        backend.set_fetch_delay(Duration::from_secs(1));

        let patch = {
            let rec = rec.clone();
            tokio::spawn(async move { rec.patch_one("10.0.0.1").await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;
        rec.full_render(&sample(), &GridFilter::default()).await;

        assert_eq!(patch.await.unwrap(), PatchOutcome::Stale);
        let view = rec.session().grid().snapshot();
        assert!(view.slot("10.0.0.1").unwrap().tile().is_some());
    }
}
