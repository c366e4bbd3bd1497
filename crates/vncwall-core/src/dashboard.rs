// ── Dashboard facade ──
//
// Owns one grid session and routes every `Command` to the reconciler,
// the selection helpers or the backend. Front ends hold a `Dashboard`
// (usually behind an `Arc`) and subscribe to its watch channels.

use std::sync::Arc;

use futures_util::future::join_all;
use tokio::sync::watch;
use tracing::{info, warn};
use vncwall_api::{ListAction, ListMutation, NamedLists};

use crate::backend::{Backend, HttpBackend};
use crate::command::{Command, CommandResult};
use crate::config::DashboardConfig;
use crate::error::CoreError;
use crate::filter::GridFilter;
use crate::grid::Grid;
use crate::lists;
use crate::model::Server;
use crate::reconciler::{GridReconciler, ProbeProgress, RenderReport};
use crate::render::TileRenderer;
use crate::selection::{self, BulkButtons};
use crate::session::GridSession;

pub struct Dashboard<B: Backend = HttpBackend> {
    backend: Arc<B>,
    session: Arc<GridSession>,
    reconciler: GridReconciler<B>,
    filter: watch::Sender<GridFilter>,
    lists: watch::Sender<NamedLists>,
}

impl Dashboard<HttpBackend> {
    /// Dashboard over the HTTP backend described by `config`.
    pub fn new(config: &DashboardConfig) -> Result<Self, CoreError> {
        Ok(Self::with_backend(HttpBackend::new(config)?, config))
    }
}

impl<B: Backend> Dashboard<B> {
    pub fn with_backend(backend: B, config: &DashboardConfig) -> Self {
        let backend = Arc::new(backend);
        let session = Arc::new(GridSession::new());
        let reconciler = GridReconciler::new(
            Arc::clone(&backend),
            Arc::clone(&session),
            TileRenderer::new(config.viewer.clone()),
            config.probe_pacing,
            config.poll_interval,
        );

        let mut filter = GridFilter::default();
        if let Some(list) = &config.default_list {
            filter.select_list(list);
        }
        let (filter, _) = watch::channel(filter);
        let (lists, _) = watch::channel(NamedLists::new());

        Self {
            backend,
            session,
            reconciler,
            filter,
            lists,
        }
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> &GridSession {
        &self.session
    }

    pub fn grid(&self) -> &Grid {
        self.session.grid()
    }

    pub fn reconciler(&self) -> &GridReconciler<B> {
        &self.reconciler
    }

    pub fn renderer(&self) -> &TileRenderer {
        self.reconciler.renderer()
    }

    pub fn filter(&self) -> GridFilter {
        self.filter.borrow().clone()
    }

    pub fn subscribe_filter(&self) -> watch::Receiver<GridFilter> {
        self.filter.subscribe()
    }

    /// Named lists as of the last fetch.
    pub fn lists(&self) -> NamedLists {
        self.lists.borrow().clone()
    }

    pub fn subscribe_lists(&self) -> watch::Receiver<NamedLists> {
        self.lists.subscribe()
    }

    pub fn bulk_buttons(&self) -> BulkButtons {
        BulkButtons::compute(
            self.grid().snapshot().any_checked(),
            self.filter.borrow().show_excluded,
            lists::has_custom_lists(&self.lists.borrow()),
        )
    }

    // ── Loading ──────────────────────────────────────────────────────

    /// Fetch named lists and publish them to subscribers.
    pub async fn refresh_lists(&self) -> Result<NamedLists, CoreError> {
        let lists = self.backend.fetch_lists().await?;
        self.lists.send_replace(lists.clone());
        Ok(lists)
    }

    /// Replace the filter without reloading.
    pub fn set_filter(&self, filter: GridFilter) {
        self.filter.send_replace(filter);
    }

    /// Fetch the inventory, apply the list filter and rebuild the grid.
    pub async fn load_and_render(&self) -> Result<RenderReport, CoreError> {
        self.load_and_render_with(|_| {}).await
    }

    /// [`load_and_render`](Self::load_and_render) with per-probe progress.
    pub async fn load_and_render_with<F>(&self, on_probe: F) -> Result<RenderReport, CoreError>
    where
        F: FnMut(ProbeProgress<'_>) + Send,
    {
        let filter = self.filter();
        self.grid().set_loading(true);
        match self.fetch_filtered(&filter).await {
            Ok(servers) => Ok(self
                .reconciler
                .full_render_with(&servers, &filter, on_probe)
                .await),
            Err(e) => {
                warn!(error = %e, "loading servers failed");
                self.grid().set_loading(false);
                Err(e)
            }
        }
    }

    async fn fetch_filtered(&self, filter: &GridFilter) -> Result<Vec<Server>, CoreError> {
        let servers = self.backend.fetch_servers(true).await?;
        if filter.list.is_none() {
            return Ok(servers);
        }
        let lists = self.refresh_lists().await?;
        Ok(filter.apply_list(servers, &lists))
    }

    // ── Command dispatch ─────────────────────────────────────────────

    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        let grid = self.grid();
        match cmd {
            Command::Refresh => self.reload().await,
            Command::SetShowExcluded(show) => {
                self.filter.send_modify(|f| f.show_excluded = show);
                self.reload().await
            }
            Command::SelectList(name) => {
                self.filter.send_modify(|f| f.select_list(&name));
                self.reload().await
            }
            Command::PatchTile { ip } => Ok(CommandResult::Patched(
                self.reconciler.patch_one(&ip).await,
            )),

            Command::SelectAll => Ok(CommandResult::Selection {
                checked: selection::select_all(grid),
            }),
            Command::InvertSelection => Ok(CommandResult::Selection {
                checked: selection::invert(grid),
            }),
            Command::CancelSelection => {
                selection::cancel(grid);
                Ok(CommandResult::Selection { checked: 0 })
            }
            Command::ToggleSelection { ip } => {
                selection::toggle(grid, &ip);
                Ok(CommandResult::Selection {
                    checked: selection::checked_ips(grid).len(),
                })
            }
            Command::OpenSelected => {
                let view = grid.snapshot();
                let urls = view
                    .slots
                    .iter()
                    .filter(|s| s.checked)
                    .filter_map(|s| s.tile().map(|t| t.open_url.clone()))
                    .collect();
                Ok(CommandResult::Open(urls))
            }

            Command::ExcludeSelected => self.set_selected_exclusion(true).await,
            Command::IncludeSelected => self.set_selected_exclusion(false).await,
            Command::ResetFilter => self.reset_filter().await,
            Command::Exclude { ips } => {
                self.set_exclusion(&ips, true).await?;
                Ok(CommandResult::Ok)
            }
            Command::Include { ips } => {
                self.set_exclusion(&ips, false).await?;
                Ok(CommandResult::Ok)
            }

            Command::CreateList { name } => self.create_list(&name).await,
            Command::DeleteLists { names } => self.delete_lists(&names).await,
            Command::AddToLists { lists, ips } => {
                self.change_membership(&lists, &ips, ListAction::Add).await
            }
            Command::RemoveFromLists { lists, ips } => {
                self.change_membership(&lists, &ips, ListAction::Remove).await
            }
        }
    }

    async fn reload(&self) -> Result<CommandResult, CoreError> {
        Ok(CommandResult::Rendered(self.load_and_render().await?))
    }

    // ── Exclusion ────────────────────────────────────────────────────

    async fn set_selected_exclusion(&self, exclude: bool) -> Result<CommandResult, CoreError> {
        let ips = selection::checked_ips(self.grid());
        if ips.is_empty() {
            return Err(CoreError::validation("no servers selected"));
        }
        self.filter.send_modify(|f| f.show_excluded = false);
        let posted = self.set_exclusion(&ips, exclude).await;
        let report = self.load_and_render().await?;
        posted?;
        Ok(CommandResult::Rendered(report))
    }

    async fn reset_filter(&self) -> Result<CommandResult, CoreError> {
        self.filter.send_modify(|f| f.show_excluded = false);
        let ips: Vec<String> = self
            .backend
            .fetch_servers(true)
            .await?
            .into_iter()
            .map(|s| s.ip)
            .collect();
        let posted = self.set_exclusion(&ips, false).await;
        let report = self.load_and_render().await?;
        posted?;
        Ok(CommandResult::Rendered(report))
    }

    /// Post one exclude/include request per ip, concurrently.
    /// Every request runs; the first failure is returned.
    async fn set_exclusion(&self, ips: &[String], exclude: bool) -> Result<(), CoreError> {
        let backend = &*self.backend;
        let results = join_all(ips.iter().map(|ip| async move {
            let result = if exclude {
                backend.exclude(ip).await
            } else {
                backend.include(ip).await
            };
            (ip, result)
        }))
        .await;

        let mut first_err = None;
        for (ip, result) in results {
            if let Err(e) = result {
                warn!(ip, exclude, error = %e, "exclusion change failed");
                if first_err.is_none() {
                    first_err = Some(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => {
                info!(count = ips.len(), exclude, "exclusion updated");
                Ok(())
            }
        }
    }

    // ── Named lists ──────────────────────────────────────────────────

    async fn create_list(&self, name: &str) -> Result<CommandResult, CoreError> {
        let current = self.refresh_lists().await?;
        let name = lists::validate_new_name(&current, name)?;
        self.backend.mutate_list(ListMutation::create(&name)).await?;
        info!(list = %name, "list created");
        Ok(CommandResult::Lists(self.refresh_lists().await?))
    }

    async fn delete_lists(&self, names: &[String]) -> Result<CommandResult, CoreError> {
        if names.is_empty() {
            return Err(CoreError::validation("no lists given"));
        }
        let current = self.refresh_lists().await?;
        for name in names {
            if lists::is_reserved(name) {
                return Err(CoreError::validation(format!("\"{name}\" cannot be deleted")));
            }
            if !current.contains_key(name) {
                return Err(CoreError::ListNotFound { name: name.clone() });
            }
        }
        for name in names {
            self.backend.mutate_list(ListMutation::delete(name)).await?;
            info!(list = %name, "list deleted");
        }

        let lists = self.refresh_lists().await?;
        let filtered_out = self
            .filter
            .borrow()
            .list
            .as_ref()
            .is_some_and(|l| names.contains(l));
        if filtered_out {
            self.filter.send_modify(|f| f.list = None);
            self.load_and_render().await?;
        }
        Ok(CommandResult::Lists(lists))
    }

    async fn change_membership(
        &self,
        targets: &[String],
        ips: &[String],
        action: ListAction,
    ) -> Result<CommandResult, CoreError> {
        if ips.is_empty() {
            return Err(CoreError::validation("no servers selected"));
        }
        let current = self.refresh_lists().await?;
        let plan = lists::plan_membership(&current, targets, ips, action)?;
        let backend = &*self.backend;
        let results = join_all(plan.into_iter().map(|m| backend.mutate_list(m))).await;
        let lists = self.refresh_lists().await?;
        results.into_iter().collect::<Result<Vec<()>, _>>()?;
        Ok(CommandResult::Lists(lists))
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Stop background polling. In-flight work finishes but is discarded.
    pub fn dispose(&self) {
        self.session.dispose();
    }
}

impl<B: Backend> Drop for Dashboard<B> {
    fn drop(&mut self) {
        self.session.dispose();
    }
}
