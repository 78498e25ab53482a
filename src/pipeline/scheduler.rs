//! Periodic trigger
//!
//! Runs one pipeline cycle per tick until shutdown is broadcast. Cycle
//! errors never stop the loop; they are already logged by the cycle.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;

use super::Pipeline;

pub struct Scheduler {
    pipeline: Arc<Pipeline>,
    period: Duration,
}

impl Scheduler {
    pub fn new(pipeline: Arc<Pipeline>, period: Duration) -> Self {
        Self { pipeline, period }
    }

    /// Ticks immediately, then every `period`. A cycle that overruns the
    /// period delays the next tick instead of bursting.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!(period = ?self.period, "Scheduler started");

        let mut ticker = interval(self.period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.pipeline.run_cycle().await;
                    info!(correlation_id = %report.correlation_id, ok = report.is_clean(), "Cycle finished");
                }
                _ = shutdown_rx.recv() => {
                    info!("Scheduler shutting down");
                    break;
                }
            }
        }
    }
}
