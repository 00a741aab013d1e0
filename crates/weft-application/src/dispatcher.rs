//! Notification Dispatcher
//!
//! Delivers a published payload to every interested listener, one at a
//! time, in a fixed order:
//!
//! 1. ascending priority (lower runs first)
//! 2. registration order for equal priorities
//!
//! Wildcard listeners take part in the same ordering. A listener may stop
//! propagation (the publish still succeeds); a listener error stops
//! propagation and is returned to the publisher unchanged.
//!
//! The listener order for every notification is computed once, when the
//! dispatcher is created.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::Value;
use tracing::debug;
use weft_domain::entities::{Delivery, ListenerDefinition, Propagation, UnitDefinition};
use weft_domain::error::{Error, Result};
use weft_domain::value_objects::UnitId;

use crate::resolver::DependencyResolver;
use crate::scope::Scope;

/// Routes notifications to listeners
pub struct NotificationDispatcher {
    resolver: Arc<DependencyResolver>,
    routes: HashMap<UnitId, Vec<UnitId>>,
    depth: Scope<usize>,
    max_depth: usize,
}

impl NotificationDispatcher {
    /// Create a dispatcher, precomputing the listener order per notification
    pub fn new(resolver: Arc<DependencyResolver>, max_depth: usize) -> Self {
        let registry = resolver.graph().registry();

        let mut listeners: Vec<(usize, &UnitId, &ListenerDefinition)> = registry
            .iter()
            .enumerate()
            .filter_map(|(index, unit)| match unit {
                UnitDefinition::Listener(listener) => Some((index, unit.id(), listener)),
                _ => None,
            })
            .collect();
        listeners.sort_by_key(|(index, _, listener)| (listener.priority, *index));

        let routes = registry
            .iter()
            .filter(|unit| matches!(unit, UnitDefinition::Notification(_)))
            .map(|notification| {
                let ordered = listeners
                    .iter()
                    .filter(|(_, _, listener)| listener.subscription.covers(notification.id()))
                    .map(|(_, id, _)| (*id).clone())
                    .collect();
                (notification.id().clone(), ordered)
            })
            .collect();

        Self {
            resolver,
            routes,
            depth: Scope::new("weft.dispatch_depth"),
            max_depth,
        }
    }

    /// Listener ids that would receive `notification`, in delivery order
    pub fn listeners_for(&self, notification: &str) -> &[UnitId] {
        self.routes.get(notification).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Publish `payload` and wait for every listener to finish
    pub async fn publish(&self, notification: &UnitId, payload: Value) -> Result<()> {
        let Some(UnitDefinition::Notification(definition)) =
            self.resolver.graph().registry().get(notification.as_str())
        else {
            return Err(Error::UnknownNotification {
                id: notification.clone(),
            });
        };

        let payload = match &definition.payload {
            Some(contract) => contract.parse(payload).map_err(|source| Error::PayloadValidation {
                notification: notification.clone(),
                source,
            })?,
            None => payload,
        };

        let depth = self.depth.try_current().unwrap_or(0);
        if depth >= self.max_depth {
            return Err(Error::DispatchDepthExceeded {
                notification: notification.clone(),
                depth: self.max_depth,
            });
        }

        self.depth
            .provide(depth + 1, self.deliver(notification, payload))
            .await
    }

    async fn deliver(&self, notification: &UnitId, payload: Value) -> Result<()> {
        let listeners = self.listeners_for(notification.as_str());
        debug!(notification = %notification, listeners = listeners.len(), "Publishing notification");

        let propagation = Propagation::new();
        for listener_id in listeners {
            if propagation.is_stopped() {
                debug!(notification = %notification, stopped_before = %listener_id, "Propagation stopped");
                break;
            }
            let Some(UnitDefinition::Listener(listener)) =
                self.resolver.graph().registry().get(listener_id.as_str())
            else {
                return Err(Error::internal(format!("'{listener_id}' is not a listener")));
            };
            let context = self.resolver.context(listener_id)?;
            let delivery = Delivery {
                notification: notification.clone(),
                payload: payload.clone(),
                propagation: propagation.clone(),
            };
            debug!(notification = %notification, listener = %listener_id, "Delivering notification");
            (listener.run)(delivery, context).await?;
        }
        Ok(())
    }
}
