//! Threshold evaluation and subscriber notification
//!
//! [`ThresholdMonitor`] compares incoming samples against a fixed
//! threshold and notifies its subscribers about every breach. Dispatch is
//! strictly sequential in subscription order, so a single
//! [`ThresholdMonitor::update_metrics`] call is deterministic. Subscriber
//! failures are logged and counted, never propagated.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use tracing::{debug, trace, warn};

use crate::MetricSample;
use crate::alerts::AlertError;

/// A single threshold breach.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertEvent {
    pub metric: String,
    pub value: f64,
}

/// A notification target registered with a [`ThresholdMonitor`].
///
/// Implementations must be `Send + Sync`; the monitor holds them as
/// `Arc<dyn Subscriber>` and removal is by identity, not equality.
#[async_trait]
pub trait Subscriber: Send + Sync {
    async fn on_notify(&self, event: &AlertEvent) -> Result<(), AlertError>;
}

/// Compares metric values against a threshold and notifies subscribers.
///
/// The threshold is fixed at construction; the subscriber list is the only
/// mutable state and is only touched through [`subscribe`] and
/// [`unsubscribe`].
///
/// [`subscribe`]: ThresholdMonitor::subscribe
/// [`unsubscribe`]: ThresholdMonitor::unsubscribe
pub struct ThresholdMonitor {
    threshold: f64,
    subscribers: Vec<Arc<dyn Subscriber>>,
    dispatch_failures: AtomicU64,
}

impl ThresholdMonitor {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            subscribers: Vec::new(),
            dispatch_failures: AtomicU64::new(0),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Append a notification target.
    ///
    /// Duplicates are allowed; a target registered twice is notified twice.
    pub fn subscribe(&mut self, target: Arc<dyn Subscriber>) {
        self.subscribers.push(target);
    }

    /// Remove the first registration of `target`, matched by identity.
    ///
    /// Removing a target that was never subscribed is a no-op.
    pub fn unsubscribe(&mut self, target: &Arc<dyn Subscriber>) {
        if let Some(position) = self
            .subscribers
            .iter()
            .position(|subscriber| Arc::ptr_eq(subscriber, target))
        {
            self.subscribers.remove(position);
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    /// Number of subscriber notifications that returned an error so far.
    pub fn dispatch_failures(&self) -> u64 {
        self.dispatch_failures.load(Ordering::Relaxed)
    }

    /// Evaluate one sample and notify subscribers about every breach.
    ///
    /// Entries are visited in sample order; values strictly greater than
    /// the threshold produce an [`AlertEvent`] which is dispatched to a
    /// snapshot of the subscriber list taken at the start of the call, one
    /// subscriber at a time, in subscription order. A failing subscriber
    /// is logged and counted and does not affect subsequent targets.
    pub async fn update_metrics(&self, sample: &MetricSample) {
        let snapshot: Vec<Arc<dyn Subscriber>> = self.subscribers.clone();

        for (metric, value) in sample {
            if *value <= self.threshold {
                trace!("{metric}: {value} within threshold {}", self.threshold);
                continue;
            }

            debug!(
                "{metric}: value {value} crossed threshold {}",
                self.threshold
            );

            let event = AlertEvent {
                metric: metric.clone(),
                value: *value,
            };

            for subscriber in &snapshot {
                if let Err(e) = subscriber.on_notify(&event).await {
                    self.dispatch_failures.fetch_add(1, Ordering::Relaxed);
                    warn!("{metric}: subscriber failed to handle alert: {e}");
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    /// Records every notification in a shared log, tagged with a label so
    /// order across subscribers is observable.
    struct RecordingSubscriber {
        label: &'static str,
        log: Arc<Mutex<Vec<(String, String, f64)>>>,
    }

    impl RecordingSubscriber {
        fn new(label: &'static str, log: Arc<Mutex<Vec<(String, String, f64)>>>) -> Arc<Self> {
            Arc::new(Self { label, log })
        }
    }

    #[async_trait]
    impl Subscriber for RecordingSubscriber {
        async fn on_notify(&self, event: &AlertEvent) -> Result<(), AlertError> {
            self.log.lock().unwrap().push((
                self.label.to_string(),
                event.metric.clone(),
                event.value,
            ));
            Ok(())
        }
    }

    struct FailingSubscriber;

    #[async_trait]
    impl Subscriber for FailingSubscriber {
        async fn on_notify(&self, _event: &AlertEvent) -> Result<(), AlertError> {
            Err(AlertError::Validation(String::from("always fails")))
        }
    }

    fn sample(entries: &[(&str, f64)]) -> MetricSample {
        entries
            .iter()
            .map(|(name, value)| (name.to_string(), *value))
            .collect()
    }

    #[tokio::test]
    async fn test_breach_notifies_subscriber() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = ThresholdMonitor::new(90.0);
        monitor.subscribe(RecordingSubscriber::new("a", log.clone()));

        monitor
            .update_metrics(&sample(&[("cpu", 95.0), ("memory", 40.0)]))
            .await;

        let entries = log.lock().unwrap();
        assert_eq!(
            *entries,
            vec![(String::from("a"), String::from("cpu"), 95.0)]
        );
    }

    #[tokio::test]
    async fn test_equal_to_threshold_does_not_notify() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = ThresholdMonitor::new(90.0);
        monitor.subscribe(RecordingSubscriber::new("a", log.clone()));

        monitor.update_metrics(&sample(&[("cpu", 90.0)])).await;

        assert!(log.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_notification_order_matches_subscription_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = ThresholdMonitor::new(50.0);
        monitor.subscribe(RecordingSubscriber::new("a", log.clone()));
        monitor.subscribe(RecordingSubscriber::new("b", log.clone()));

        // Repeat to make sure the ordering is deterministic, not lucky.
        for _ in 0..10 {
            monitor.update_metrics(&sample(&[("cpu", 75.0)])).await;
        }

        let entries = log.lock().unwrap();
        assert_eq!(entries.len(), 20);
        for pair in entries.chunks(2) {
            assert_eq!(pair[0].0, "a");
            assert_eq!(pair[1].0, "b");
        }
    }

    #[tokio::test]
    async fn test_sample_entries_visited_in_insertion_order() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = ThresholdMonitor::new(0.0);
        monitor.subscribe(RecordingSubscriber::new("a", log.clone()));

        monitor
            .update_metrics(&sample(&[("zeta", 1.0), ("alpha", 2.0), ("mid", 3.0)]))
            .await;

        let metrics: Vec<String> = log
            .lock()
            .unwrap()
            .iter()
            .map(|(_, metric, _)| metric.clone())
            .collect();
        assert_eq!(metrics, vec!["zeta", "alpha", "mid"]);
    }

    #[tokio::test]
    async fn test_unsubscribe_removes_target() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = ThresholdMonitor::new(50.0);

        let a = RecordingSubscriber::new("a", log.clone());
        let b = RecordingSubscriber::new("b", log.clone());

        let a_dyn: Arc<dyn Subscriber> = a;
        monitor.subscribe(a_dyn.clone());
        monitor.subscribe(b);

        monitor.unsubscribe(&a_dyn);
        monitor.update_metrics(&sample(&[("cpu", 75.0)])).await;

        let entries = log.lock().unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].0, "b");
    }

    #[tokio::test]
    async fn test_unsubscribe_absent_target_is_noop() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = ThresholdMonitor::new(50.0);
        monitor.subscribe(RecordingSubscriber::new("a", log.clone()));

        let stranger: Arc<dyn Subscriber> = RecordingSubscriber::new("x", log.clone());
        monitor.unsubscribe(&stranger);

        assert_eq!(monitor.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_duplicate_subscription_notified_twice() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = ThresholdMonitor::new(50.0);

        let a: Arc<dyn Subscriber> = RecordingSubscriber::new("a", log.clone());
        monitor.subscribe(a.clone());
        monitor.subscribe(a.clone());

        monitor.update_metrics(&sample(&[("cpu", 75.0)])).await;
        assert_eq!(log.lock().unwrap().len(), 2);

        // Removal by identity only drops the first registration.
        monitor.unsubscribe(&a);
        assert_eq!(monitor.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn test_failing_subscriber_does_not_block_later_targets() {
        let log = Arc::new(Mutex::new(Vec::new()));
        let mut monitor = ThresholdMonitor::new(50.0);
        monitor.subscribe(Arc::new(FailingSubscriber));
        monitor.subscribe(RecordingSubscriber::new("b", log.clone()));

        monitor.update_metrics(&sample(&[("cpu", 75.0)])).await;

        assert_eq!(log.lock().unwrap().len(), 1);
        assert_eq!(monitor.dispatch_failures(), 1);
    }

    #[tokio::test]
    async fn test_no_subscribers_is_fine() {
        let monitor = ThresholdMonitor::new(50.0);
        monitor.update_metrics(&sample(&[("cpu", 75.0)])).await;
        assert_eq!(monitor.dispatch_failures(), 0);
    }
}
