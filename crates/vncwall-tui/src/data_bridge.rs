//! Data bridge: forwards the dashboard's watch channels into the TUI's
//! action loop as [`Action`]s.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use vncwall_core::Dashboard;

use crate::action::Action;

/// Push the current grid, filter and lists, then every change until
/// cancelled.
pub async fn spawn_data_bridge(
    dashboard: Arc<Dashboard>,
    action_tx: mpsc::UnboundedSender<Action>,
    cancel: CancellationToken,
) {
    let mut grid = dashboard.grid().subscribe();
    let mut filter = dashboard.subscribe_filter();
    let mut lists = dashboard.subscribe_lists();

    let _ = action_tx.send(Action::GridUpdated(Arc::new(grid.borrow_and_update().clone())));
    let _ = action_tx.send(Action::FilterUpdated(filter.borrow_and_update().clone()));
    let _ = action_tx.send(Action::ListsUpdated(Arc::new(lists.borrow_and_update().clone())));

    loop {
        let action = tokio::select! {
            biased;

            () = cancel.cancelled() => break,

            Ok(()) = grid.changed() => {
                Action::GridUpdated(Arc::new(grid.borrow_and_update().clone()))
            }
            Ok(()) = filter.changed() => {
                Action::FilterUpdated(filter.borrow_and_update().clone())
            }
            Ok(()) = lists.changed() => {
                debug!("dispatching ListsUpdated");
                Action::ListsUpdated(Arc::new(lists.borrow_and_update().clone()))
            }
        };
        if action_tx.send(action).is_err() {
            break;
        }
    }

    debug!("data bridge shut down");
}
