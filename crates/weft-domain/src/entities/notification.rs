//! Notification delivery types

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use serde_json::Value;

use crate::value_objects::UnitId;

/// What a listener is subscribed to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subscription {
    /// Only these notifications
    Only(Vec<UnitId>),
    /// Every notification
    All,
}

impl Subscription {
    /// Whether the subscription covers `notification`
    pub fn covers(&self, notification: &UnitId) -> bool {
        match self {
            Self::Only(ids) => ids.contains(notification),
            Self::All => true,
        }
    }
}

/// Stop signal shared by every listener of one publish call
#[derive(Debug, Clone, Default)]
pub struct Propagation {
    stopped: Arc<AtomicBool>,
}

impl Propagation {
    /// Create a fresh, running signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Prevent every remaining listener from running
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::SeqCst);
    }

    /// Whether [`Propagation::stop`] was called
    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::SeqCst)
    }
}

/// One delivery of a published notification to a listener
#[derive(Debug, Clone)]
pub struct Delivery {
    /// The notification being delivered
    pub notification: UnitId,
    /// The (validated) payload
    pub payload: Value,
    /// Control object for early termination
    pub propagation: Propagation,
}

impl Delivery {
    /// Stop propagation to lower-priority listeners
    pub fn stop(&self) {
        self.propagation.stop();
    }
}
