// ── Background poll loop ──
//
// One task per provider. Each tick checks the gateway connection, then
// asks the coordinator for a refresh subject to interval suppression.
// Losing the connection ends the loop; reconnecting is up to the caller.

use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwap;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::connection::GatewayConnection;
use crate::error::CoreError;
use crate::model::Resource;
use crate::refresh::{RefreshCoordinator, RefreshOutcome};

/// Whether a provider's poll loop is running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    Stopped,
    Running,
}

pub(crate) struct PollLoop {
    state: Arc<watch::Sender<PollState>>,
    /// Token of the current run. Replaced on every `start` so a stopped
    /// loop can be started again.
    cancel: ArcSwap<CancellationToken>,
    handle: Mutex<Option<JoinHandle<()>>>,
}

impl PollLoop {
    pub(crate) fn new() -> Self {
        let (state, _) = watch::channel(PollState::Stopped);
        Self {
            state: Arc::new(state),
            cancel: ArcSwap::from_pointee(CancellationToken::new()),
            handle: Mutex::new(None),
        }
    }

    /// Token of the current run; manual refreshes observe it too.
    pub(crate) fn token(&self) -> CancellationToken {
        CancellationToken::clone(&self.cancel.load())
    }

    pub(crate) fn state(&self) -> watch::Receiver<PollState> {
        self.state.subscribe()
    }

    pub(crate) fn is_running(&self) -> bool {
        *self.state.borrow() == PollState::Running
    }

    /// Start polling every `period`, replacing any previous run.
    pub(crate) async fn start<T: Resource>(
        &self,
        coordinator: Arc<RefreshCoordinator<T>>,
        connection: GatewayConnection,
        period: Duration,
    ) -> Result<(), CoreError> {
        if period.is_zero() {
            return Err(CoreError::InvalidArgument {
                message: format!("{} poll interval must be greater than zero", T::KIND),
            });
        }

        let mut handle = self.handle.lock().await;

        let token = CancellationToken::new();
        self.cancel.swap(Arc::new(token.clone())).cancel();
        if let Some(previous) = handle.take() {
            if let Err(e) = previous.await {
                warn!(kind = T::KIND, error = %e, "previous poll task ended abnormally");
            }
        }

        self.state.send_replace(PollState::Running);
        let state = Arc::clone(&self.state);
        *handle = Some(tokio::spawn(poll_task(
            coordinator,
            connection,
            period,
            token,
            state,
        )));
        Ok(())
    }

    /// Signal the loop to stop and wait for it. An in-flight fetch is
    /// allowed to finish; nothing is published after this returns.
    pub(crate) async fn stop(&self) {
        self.cancel.load().cancel();
        let previous = self.handle.lock().await.take();
        if let Some(previous) = previous {
            if let Err(e) = previous.await {
                warn!(error = %e, "poll task ended abnormally");
            }
        }
        self.state.send_replace(PollState::Stopped);
    }
}

async fn poll_task<T: Resource>(
    coordinator: Arc<RefreshCoordinator<T>>,
    connection: GatewayConnection,
    period: Duration,
    cancel: CancellationToken,
    state: Arc<watch::Sender<PollState>>,
) {
    info!(kind = T::KIND, period = ?period, "poll loop started");

    // The first tick fires immediately and performs the initial refresh.
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = interval.tick() => {
                if !connection.is_connected() {
                    warn!(kind = T::KIND, "not connected to the Cluster Gateway; stopping poll loop");
                    break;
                }
                match coordinator.refresh_if_due(period, &cancel).await {
                    RefreshOutcome::Suppressed { due_in } => {
                        debug!(kind = T::KIND, ?due_in, "recent refresh; skipping tick");
                        interval.reset_after(due_in);
                    }
                    RefreshOutcome::Stopped => break,
                    outcome => debug!(kind = T::KIND, ?outcome, "poll tick"),
                }
            }
        }
    }

    state.send_replace(PollState::Stopped);
    info!(kind = T::KIND, "poll loop stopped");
}
