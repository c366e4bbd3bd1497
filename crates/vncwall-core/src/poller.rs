// ── Poll scheduler ──
//
// Background task that re-fetches the full inventory on a fixed interval
// and patches only the tiles whose username or exclusion flag changed
// since they were last recorded.

use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::backend::Backend;
use crate::error::CoreError;
use crate::reconciler::{GridReconciler, PatchOutcome};

/// What one poll tick did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PollReport {
    /// Servers returned by the backend.
    pub checked: usize,
    /// Ips whose stored snapshot diverged, with the patch result.
    pub patched: Vec<(String, PatchOutcome)>,
}

pub struct PollScheduler<B: Backend> {
    reconciler: GridReconciler<B>,
    interval: Duration,
}

impl<B: Backend> PollScheduler<B> {
    pub fn new(reconciler: GridReconciler<B>, interval: Duration) -> Self {
        Self {
            reconciler,
            interval,
        }
    }

    /// Run the poll loop until `cancel` fires.
    pub fn spawn(self, cancel: CancellationToken) -> JoinHandle<()> {
        info!(interval = ?self.interval, "starting grid poller");
        tokio::spawn(self.run(cancel))
    }

    async fn run(self, cancel: CancellationToken) {
        let mut interval = tokio::time::interval(self.interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
        interval.tick().await; // consume the immediate first tick

        loop {
            tokio::select! {
                biased;
                () = cancel.cancelled() => break,
                _ = interval.tick() => {
                    if let Err(e) = self.tick().await {
                        warn!(error = %e, "poll tick skipped");
                    }
                }
            }
        }
        debug!("grid poller stopped");
    }

    /// One poll: fetch everything, record and patch diverged servers.
    /// Servers never rendered or recorded before are ignored.
    pub async fn tick(&self) -> Result<PollReport, CoreError> {
        let session = self.reconciler.session();
        let servers = self.reconciler.backend().fetch_servers(true).await?;
        session.grid().set_last_poll(Utc::now());

        let store = session.store();
        let changed: Vec<String> = servers
            .iter()
            .filter(|s| store.diverged(s))
            .map(|s| {
                store.record(s);
                s.ip.clone()
            })
            .collect();

        let mut report = PollReport {
            checked: servers.len(),
            patched: Vec::with_capacity(changed.len()),
        };
        for ip in changed {
            debug!(ip, "server state changed, patching tile");
            let outcome = self.reconciler.patch_one(&ip).await;
            report.patched.push((ip, outcome));
        }
        Ok(report)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::filter::GridFilter;
    use crate::render::TileRenderer;
    use crate::session::GridSession;
    use crate::test_support::{FakeBackend, server};

    const INTERVAL: Duration = Duration::from_secs(5);

    async fn rendered(
        backend: FakeBackend,
        poll_interval: Duration,
    ) -> (GridReconciler<FakeBackend>, Arc<FakeBackend>) {
        let backend = Arc::new(backend);
        let rec = GridReconciler::new(
            Arc::clone(&backend),
            Arc::new(GridSession::new()),
            TileRenderer::default(),
            Duration::ZERO,
            poll_interval,
        );
        let servers = backend.fetch_servers(true).await.unwrap();
        rec.full_render(&servers, &GridFilter::default()).await;
        (rec, backend)
    }

    fn initial() -> Vec<crate::model::Server> {
        vec![
            server("10.0.0.1", "alice", false),
            server("10.0.0.2", "bob", false),
        ]
    }

    #[tokio::test(start_paused = true)]
    async fn unchanged_tick_replaces_nothing() {
        let (rec, _) = rendered(FakeBackend::new(initial()), Duration::ZERO).await;
        let before = rec.session().grid().snapshot();

        let report = PollScheduler::new(rec.clone(), INTERVAL).tick().await.unwrap();

        assert_eq!(report.checked, 2);
        assert!(report.patched.is_empty());
        let after = rec.session().grid().snapshot();
        let nodes = |v: &crate::grid::GridView| v.slots.iter().map(|s| s.node).collect::<Vec<_>>();
        assert_eq!(nodes(&before), nodes(&after));
        assert!(after.last_poll.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn changed_username_patches_only_that_tile() {
        let (rec, backend) = rendered(FakeBackend::new(initial()), Duration::ZERO).await;
        let untouched = rec.session().grid().node_of("10.0.0.2").unwrap();

        backend.set_servers(vec![
            server("10.0.0.1", "carol", false),
            server("10.0.0.2", "bob", false),
        ]);
        let report = PollScheduler::new(rec.clone(), INTERVAL).tick().await.unwrap();

        assert_eq!(report.patched.len(), 1);
        assert_eq!(report.patched[0].0, "10.0.0.1");
        assert!(matches!(report.patched[0].1, PatchOutcome::Replaced(_)));
        assert_eq!(rec.session().grid().node_of("10.0.0.2"), Some(untouched));
        assert_eq!(rec.session().store().get("10.0.0.1").unwrap().username, "carol");
    }

    #[tokio::test(start_paused = true)]
    async fn exclusion_change_is_recorded_even_without_slot() {
        let (rec, backend) = rendered(FakeBackend::new(initial()), Duration::ZERO).await;
        backend.set_unreachable("10.0.0.2");
        let servers = backend.fetch_servers(true).await.unwrap();
        rec.full_render(&servers, &GridFilter::default()).await;

        backend.set_servers(vec![
            server("10.0.0.1", "alice", false),
            server("10.0.0.2", "bob", true),
        ]);
        let report = PollScheduler::new(rec.clone(), INTERVAL).tick().await.unwrap();

        assert_eq!(report.patched, [("10.0.0.2".to_owned(), PatchOutcome::Missing)]);
        assert!(rec.session().store().get("10.0.0.2").unwrap().excluded);
    }

    #[tokio::test(start_paused = true)]
    async fn new_servers_are_ignored() {
        let (rec, backend) = rendered(FakeBackend::new(initial()), Duration::ZERO).await;
        let mut servers = initial();
        servers.push(server("10.0.0.3", "dave", false));
        backend.set_servers(servers);

        let report = PollScheduler::new(rec.clone(), INTERVAL).tick().await.unwrap();
        assert!(report.patched.is_empty());
        assert!(!rec.session().store().contains("10.0.0.3"));
    }

    #[tokio::test(start_paused = true)]
    async fn failed_fetch_is_an_error() {
        let (rec, backend) = rendered(FakeBackend::new(initial()), Duration::ZERO).await;
        backend.fail_fetch(true);
        assert!(PollScheduler::new(rec, INTERVAL).tick().await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn full_render_starts_poller_once() {
        let (rec, backend) = rendered(FakeBackend::new(initial()), INTERVAL).await;
        assert!(rec.session().poller_active());
        let fetches = backend.fetch_count();

        // A second render must not start a second poller.
        rec.full_render(&initial(), &GridFilter::default()).await;

        tokio::time::sleep(INTERVAL * 3 + Duration::from_millis(1)).await;
        assert_eq!(backend.fetch_count() - fetches, 3);
    }

    #[tokio::test(start_paused = true)]
    async fn poller_survives_failed_ticks() {
        let (rec, backend) = rendered(FakeBackend::new(initial()), INTERVAL).await;
        backend.fail_fetch(true);
        tokio::time::sleep(INTERVAL * 2 + Duration::from_millis(1)).await;

        backend.fail_fetch(false);
        backend.set_servers(vec![
            server("10.0.0.1", "carol", false),
            server("10.0.0.2", "bob", false),
        ]);
        tokio::time::sleep(INTERVAL).await;

        let view = rec.session().grid().snapshot();
        assert_eq!(view.slot("10.0.0.1").unwrap().tile().unwrap().username, "carol");
    }

    #[tokio::test(start_paused = true)]
    async fn dispose_stops_poller() {
        let (rec, backend) = rendered(FakeBackend::new(initial()), INTERVAL).await;
        rec.session().dispose();
        let fetches = backend.fetch_count();

        tokio::time::sleep(INTERVAL * 3).await;
        assert_eq!(backend.fetch_count(), fetches);
        assert!(!rec.session().grid().snapshot().poller_active);
    }
}
