// ── Reachability probe ──

use tracing::warn;

use crate::backend::Backend;

/// Whether the desktop at `ip:port` answers.
///
/// Every failure (transport error, non-success status, negative verdict)
/// collapses to `false`. No retry; the transport timeout applies.
pub async fn is_reachable<B: Backend>(backend: &B, ip: &str, port: u16) -> bool {
    match backend.check_reachable(ip, port).await {
        Ok(true) => true,
        Ok(false) => {
            warn!(ip, port, "server unreachable, skipping tile");
            false
        }
        Err(e) => {
            warn!(ip, port, error = %e, "reachability probe failed, skipping tile");
            false
        }
    }
}
