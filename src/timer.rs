// src/timer.rs
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info};

use crate::routes::AppState;
use crate::session::TickOutcome;

/// Drive `tick()` once per `period` while the poll timer is running.
///
/// The task exits when `shutdown` flips to `true` or its sender is dropped.
pub fn spawn_ticker(
    state: AppState,
    period: Duration,
    mut shutdown: watch::Receiver<bool>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately
        ticker.tick().await;

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let mut session = state.session.lock().await;
                    if !session.timer_active() {
                        continue;
                    }
                    match session.tick() {
                        Ok(TickOutcome::Expired) => {
                            let poll_id = session.active_poll().map(|p| p.id);
                            info!(?poll_id, "Timer reached zero");
                        }
                        Ok(TickOutcome::Running { .. }) => {}
                        Err(e) => debug!(error = %e, "Tick skipped"),
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        debug!("Ticker stopping");
                        break;
                    }
                }
            }
        }
    })
}
