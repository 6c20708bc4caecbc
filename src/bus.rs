//! In-process notification channels shared by the wizard and its callers.
//!
//! Two independent concerns ride on the bus: transient alert messages for
//! the user, and a loading-state channel that mirrors whether a remote
//! call is in flight. Both are broadcast channels with explicit receiver
//! handles; nothing is replayed to late subscribers. The loading channel
//! additionally keeps its last published value readable synchronously.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Alert severity, mirroring the display classes consumers style with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Danger,
    Warning,
    Info,
    Success,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Severity::Danger => "danger",
            Severity::Warning => "warning",
            Severity::Info => "info",
            Severity::Success => "success",
        };
        write!(f, "{name}")
    }
}

/// A transient message for the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub text: String,
    pub severity: Severity,
}

impl Alert {
    /// How long consumers are expected to keep an alert on screen before
    /// letting it expire. Enforcing the expiry is the consumer's job.
    pub const DISPLAY_WINDOW: Duration = Duration::from_secs(5);
}

/// Whether a remote call is currently in flight.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadingState {
    #[default]
    Idle,
    Active,
    Error,
}

/// Publish/subscribe hub for alerts and loading state.
///
/// Cheap to clone; clones publish into and subscribe from the same
/// channels. Delivery is publish-ordered within the single logical thread
/// of control the wizard runs on.
#[derive(Debug, Clone)]
pub struct NotificationBus {
    alerts: broadcast::Sender<Alert>,
    loading: broadcast::Sender<LoadingState>,
    last_loading: Arc<Mutex<LoadingState>>,
}

impl Default for NotificationBus {
    fn default() -> Self {
        Self::new()
    }
}

impl NotificationBus {
    /// Channel capacity. Overflow only matters to subscribers that stop
    /// draining; publishers never block.
    const CAPACITY: usize = 64;

    pub fn new() -> Self {
        let (alerts, _) = broadcast::channel(Self::CAPACITY);
        let (loading, _) = broadcast::channel(Self::CAPACITY);
        Self {
            alerts,
            loading,
            last_loading: Arc::new(Mutex::new(LoadingState::Idle)),
        }
    }

    /// Publish an alert with the default (danger) severity.
    pub fn alert(&self, text: impl Into<String>) {
        self.alert_with(text, Severity::default());
    }

    /// Publish an alert with an explicit severity.
    pub fn alert_with(&self, text: impl Into<String>, severity: Severity) {
        let alert = Alert {
            text: text.into(),
            severity,
        };
        tracing::debug!(severity = ?alert.severity, text = %alert.text, "alert published");
        // A send error only means nobody is subscribed right now.
        let _ = self.alerts.send(alert);
    }

    /// Register for alert delivery. Dropping the receiver unsubscribes.
    pub fn subscribe_alerts(&self) -> broadcast::Receiver<Alert> {
        self.alerts.subscribe()
    }

    /// Publish a loading-state transition.
    pub fn set_loading(&self, state: LoadingState) {
        if let Ok(mut last) = self.last_loading.lock() {
            *last = state;
        }
        let _ = self.loading.send(state);
    }

    /// Register for loading-state transitions.
    pub fn subscribe_loading(&self) -> broadcast::Receiver<LoadingState> {
        self.loading.subscribe()
    }

    /// Last published loading state, for subscribers that arrive late.
    pub fn loading_state(&self) -> LoadingState {
        self.last_loading
            .lock()
            .map(|s| *s)
            .unwrap_or(LoadingState::Idle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_initial_state_is_idle() {
        let bus = NotificationBus::new();
        assert_eq!(bus.loading_state(), LoadingState::Idle);
    }

    #[test]
    fn test_alert_default_severity() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe_alerts();

        bus.alert("something went wrong");

        let alert = rx.try_recv().unwrap();
        assert_eq!(alert.text, "something went wrong");
        assert_eq!(alert.severity, Severity::Danger);
    }

    #[test]
    fn test_alerts_delivered_in_publish_order() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe_alerts();

        bus.alert_with("first", Severity::Info);
        bus.alert_with("second", Severity::Warning);

        assert_eq!(rx.try_recv().unwrap().text, "first");
        assert_eq!(rx.try_recv().unwrap().text, "second");
    }

    #[test]
    fn test_no_replay_for_late_subscribers() {
        let bus = NotificationBus::new();
        bus.alert("published before anyone listened");

        let mut rx = bus.subscribe_alerts();
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_loading_last_known_state() {
        let bus = NotificationBus::new();
        bus.set_loading(LoadingState::Active);
        assert_eq!(bus.loading_state(), LoadingState::Active);

        bus.set_loading(LoadingState::Error);
        assert_eq!(bus.loading_state(), LoadingState::Error);
    }

    #[test]
    fn test_loading_transitions_observed_in_order() {
        let bus = NotificationBus::new();
        let mut rx = bus.subscribe_loading();

        bus.set_loading(LoadingState::Active);
        bus.set_loading(LoadingState::Idle);

        assert_eq!(rx.try_recv().unwrap(), LoadingState::Active);
        assert_eq!(rx.try_recv().unwrap(), LoadingState::Idle);
    }

    #[test]
    fn test_clones_share_channels() {
        let bus = NotificationBus::new();
        let publisher = bus.clone();
        let mut rx = bus.subscribe_alerts();

        publisher.alert_with("from a clone", Severity::Success);
        assert_eq!(rx.try_recv().unwrap().severity, Severity::Success);
        assert_eq!(publisher.loading_state(), bus.loading_state());
    }
}
