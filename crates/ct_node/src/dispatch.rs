// Copyright (c) 2025 Cloudflare, Inc.
// Licensed under the BSD-3-Clause license found in the LICENSE file or at https://opensource.org/licenses/BSD-3-Clause

//! The staleness-aware dispatch layer: a periodic poll of the cluster
//! oracle, and the interceptors wrapped around every `/ct/v1/` path.

use crate::deps::ClusterStateController;
use crate::handlers::NodeState;
use crate::reply::send_error;
use axum::extract::{Request, State};
use axum::http::StatusCode;
use axum::middleware::Next;
use axum::response::Response;
use log::{debug, warn};
use parking_lot::Mutex;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Periodically refreshes the shared staleness flag. The fetch runs on the
/// blocking pool because the controller can block on cluster-state locks.
/// Shutting down stops the poll before the next tick and joins the task.
pub struct StalenessMonitor {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl StalenessMonitor {
    /// Starts polling the node's cluster-state controller every
    /// `staleness_check_delay_secs`, storing the result into the shared
    /// staleness flag. The flag was seeded at state construction, so the
    /// first poll only happens after one full delay.
    pub fn spawn(state: &NodeState) -> Self {
        let delay = Duration::from_secs(state.config.staleness_check_delay_secs);
        let flag = state.staleness_flag();
        let (shutdown, rx) = watch::channel(false);
        let handle = tokio::spawn(poll_loop(state.controller.clone(), flag, delay, rx));
        Self { shutdown, handle }
    }

    /// Stops scheduling polls and waits for the task to finish. Safe to
    /// call before the first tick.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        let _ = self.handle.await;
    }
}

async fn poll_loop(
    controller: Arc<dyn ClusterStateController>,
    flag: Arc<Mutex<bool>>,
    delay: Duration,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        tokio::select! {
            _ = shutdown.changed() => return,
            () = tokio::time::sleep(delay) => {}
        }

        let controller = controller.clone();
        match tokio::task::spawn_blocking(move || controller.node_is_stale()).await {
            Ok(node_is_stale) => {
                debug!("staleness check: node_is_stale={node_is_stale}");
                *flag.lock() = node_is_stale;
            }
            Err(e) => warn!("staleness check failed: {e}"),
        }
    }
}

/// Dispatches to the peer proxy when the node is stale; otherwise runs the
/// local handler. Proxying awaits outbound I/O and never blocks the
/// executor.
pub(crate) async fn proxy_interceptor(
    State(state): State<NodeState>,
    request: Request,
    next: Next,
) -> Response {
    if state.is_node_stale() {
        state
            .metrics
            .proxied_requests
            .with_label_values(&[request.uri().path()])
            .inc();
        match state.proxy.proxy_request(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!("proxying failed: {e}");
                send_error(StatusCode::BAD_GATEWAY, "Proxying failed.")
            }
        }
    } else {
        next.run(request).await
    }
}

/// Records the request latency histogram keyed by path.
pub(crate) async fn stats_interceptor(
    State(state): State<NodeState>,
    request: Request,
    next: Next,
) -> Response {
    let timer = state
        .metrics
        .request_duration
        .with_label_values(&[request.uri().path()])
        .start_timer();
    let response = next.run(request).await;
    timer.observe_duration();
    response
}
