//! Live instance store
//!
//! Holds what construction produced: the instance of every singleton, and
//! the resolved context of every singleton and wrapper. Disposers and
//! wrapper invocations read the stored context instead of resolving again.

use dashmap::DashMap;
use weft_domain::entities::{Instance, UnitContext};
use weft_domain::value_objects::UnitId;

/// Result of constructing one unit
#[derive(Debug, Clone)]
pub struct ConstructedUnit {
    /// Live instance (singletons only)
    pub instance: Option<Instance>,
    /// Context the unit was constructed with
    pub context: UnitContext,
}

/// Concurrent map of constructed units
#[derive(Debug, Default)]
pub struct InstanceStore {
    units: DashMap<UnitId, ConstructedUnit>,
}

impl InstanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a constructed singleton
    pub fn insert_singleton(&self, id: UnitId, instance: Instance, context: UnitContext) {
        self.units.insert(
            id,
            ConstructedUnit {
                instance: Some(instance),
                context,
            },
        );
    }

    /// Store a constructed wrapper
    pub fn insert_wrapper(&self, id: UnitId, context: UnitContext) {
        self.units.insert(
            id,
            ConstructedUnit {
                instance: None,
                context,
            },
        );
    }

    /// Live instance of a singleton
    pub fn instance(&self, id: &str) -> Option<Instance> {
        self.units.get(id).and_then(|u| u.instance.clone())
    }

    /// Stored context of a constructed unit
    pub fn context(&self, id: &str) -> Option<UnitContext> {
        self.units.get(id).map(|u| u.context.clone())
    }

    /// Whether the unit has been constructed
    pub fn contains(&self, id: &str) -> bool {
        self.units.contains_key(id)
    }

    /// Remove a unit, returning what was stored
    pub fn remove(&self, id: &str) -> Option<ConstructedUnit> {
        self.units.remove(id).map(|(_, unit)| unit)
    }

    /// Number of constructed units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether nothing is constructed
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
