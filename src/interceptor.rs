//! Loading-state bookkeeping around every outbound provisioning call.

use std::future::Future;

use crate::api::error::ProvisionError;
use crate::bus::{LoadingState, NotificationBus};

/// Wraps the full lifecycle of an outbound call so the loading channel
/// always reflects "in flight / idle / failed", no matter which wizard
/// step issued the call.
///
/// Every `Active` is followed by exactly one of `Idle` or `Error` once the
/// wrapped future resolves. A call that never resolves leaves the channel
/// on `Active`; that is a documented degradation, not a crash.
#[derive(Debug, Clone)]
pub struct RequestInterceptor {
    bus: NotificationBus,
}

impl RequestInterceptor {
    pub fn new(bus: NotificationBus) -> Self {
        Self { bus }
    }

    /// Publish `Active`, await the call, then publish `Idle` on success or
    /// `Error` on failure. The call's outcome passes through untouched.
    pub async fn run<T, F>(&self, call: F) -> Result<T, ProvisionError>
    where
        F: Future<Output = Result<T, ProvisionError>>,
    {
        self.bus.set_loading(LoadingState::Active);
        match call.await {
            Ok(value) => {
                self.bus.set_loading(LoadingState::Idle);
                Ok(value)
            }
            Err(err) => {
                self.bus.set_loading(LoadingState::Error);
                Err(err)
            }
        }
    }
}
