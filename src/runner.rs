//! The monitoring loop
//!
//! [`MonitorLoop`] drives repeated cycles of fetch-then-evaluate at a
//! fixed interval. Cancellation is cooperative: the loop selects between
//! its work and a shutdown channel, so a signal observed during the
//! inter-cycle sleep stops cleanly before the next cycle, and a signal
//! observed mid-cycle drops the in-flight work (abandoning the fetches
//! and their scoped HTTP client) without leaving partial subscriber
//! state - dispatch happens inside the cycle and is awaited to completion
//! before the cycle counts as done.

use std::time::Duration;

use tokio::sync::mpsc;
use tracing::{debug, instrument, trace, warn};

use crate::collector::{Collector, FetchResult};
use crate::config::Config;
use crate::monitor::ThresholdMonitor;

pub struct MonitorLoop {
    endpoints: Vec<String>,
    interval: Duration,
    collector: Collector,
    monitor: ThresholdMonitor,
}

impl MonitorLoop {
    pub fn new(config: &Config, monitor: ThresholdMonitor) -> Self {
        Self {
            endpoints: config.endpoints.clone(),
            interval: Duration::from_secs(config.interval),
            collector: Collector::new(Duration::from_secs(config.timeout)),
            monitor,
        }
    }

    pub fn monitor(&self) -> &ThresholdMonitor {
        &self.monitor
    }

    /// Access the monitor between cycles, e.g. to add or remove
    /// subscribers.
    pub fn monitor_mut(&mut self) -> &mut ThresholdMonitor {
        &mut self.monitor
    }

    /// Execute a single monitoring cycle.
    ///
    /// Every successful fetch result is fed to the threshold monitor;
    /// failures are logged and dropped, they never reach the monitor.
    #[instrument(skip_all)]
    pub async fn run_once(&self) {
        trace!("starting cycle over {} endpoints", self.endpoints.len());

        let results = self.collector.collect(&self.endpoints).await;

        for result in results {
            match result {
                FetchResult::Success { endpoint, sample } => {
                    trace!("{endpoint}: evaluating {} metrics", sample.len());
                    self.monitor.update_metrics(&sample).await;
                }
                FetchResult::Failure { endpoint, reason } => {
                    warn!("{endpoint}: fetch failed: {reason}");
                }
            }
        }
    }

    /// Run cycles at the configured interval until shutdown.
    ///
    /// A message on `shutdown_rx` (or the channel closing) stops the
    /// loop. Shutdown during the sleep exits before the next cycle
    /// starts; shutdown during a cycle abandons it.
    #[instrument(skip_all)]
    pub async fn run_forever(&mut self, mut shutdown_rx: mpsc::Receiver<()>) {
        debug!(
            "starting monitor loop with interval {}s",
            self.interval.as_secs()
        );

        loop {
            tokio::select! {
                _ = self.run_once() => {}
                _ = shutdown_rx.recv() => {
                    debug!("shutdown requested mid-cycle, abandoning cycle");
                    break;
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.interval) => {}
                _ = shutdown_rx.recv() => {
                    debug!("shutdown requested, stopping monitor loop");
                    break;
                }
            }
        }

        debug!("monitor loop stopped");
    }
}
