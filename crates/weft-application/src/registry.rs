//! Unit Registry
//!
//! Registration is a single phase: definitions are collected in a
//! [`RegistryBuilder`], then [`RegistryBuilder::seal`] produces the immutable
//! [`UnitRegistry`] every later stage reads from. Nothing can observe a
//! half-registered set of units.
//!
//! ## Override rules
//!
//! | Existing | Incoming | Result |
//! |----------|----------|--------|
//! | none | any | appended in registration order |
//! | same kind | same id | replaces the definition, keeps the original slot |
//! | other kind | same id | `Error::Configuration` |

use std::collections::HashMap;

use tracing::{debug, info};
use weft_domain::entities::{Composition, UnitDefinition};
use weft_domain::error::{Error, Result};
use weft_domain::value_objects::{UnitId, UnitKind};

/// Collects unit definitions until registration closes
#[derive(Debug)]
pub struct RegistryBuilder {
    root: Option<UnitId>,
    units: Vec<UnitDefinition>,
    index: HashMap<UnitId, usize>,
    log_overrides: bool,
}

impl RegistryBuilder {
    /// Create an empty builder
    pub fn new() -> Self {
        Self {
            root: None,
            units: Vec::new(),
            index: HashMap::new(),
            log_overrides: true,
        }
    }

    /// Whether overrides are logged at info level (debug otherwise)
    #[must_use]
    pub fn log_overrides(mut self, enabled: bool) -> Self {
        self.log_overrides = enabled;
        self
    }

    /// Register the root composition
    ///
    /// Fails with `DuplicateRoot` when a root was already registered.
    pub fn register_root(&mut self, root: Composition) -> Result<()> {
        if let Some(existing) = &self.root {
            return Err(Error::DuplicateRoot {
                id: existing.to_string(),
            });
        }
        info!(root = %root.id, "Registering root composition");
        self.root = Some(root.id.clone());
        self.register(root.flatten())
    }

    /// Register definitions, later ids overriding earlier ones
    pub fn register<I>(&mut self, definitions: I) -> Result<()>
    where
        I: IntoIterator<Item = UnitDefinition>,
    {
        for definition in definitions {
            self.register_one(definition)?;
        }
        Ok(())
    }

    fn register_one(&mut self, definition: UnitDefinition) -> Result<()> {
        let id = definition.id().clone();
        match self.index.get(&id) {
            Some(&slot) => {
                let existing = self.units[slot].kind();
                if existing != definition.kind() {
                    return Err(Error::configuration(format!(
                        "unit '{id}' is already registered as a {existing}, cannot re-register it as a {}",
                        definition.kind()
                    )));
                }
                if self.log_overrides {
                    info!(unit = %id, kind = %existing, "Overriding unit definition");
                } else {
                    debug!(unit = %id, kind = %existing, "Overriding unit definition");
                }
                self.units[slot] = definition;
            }
            None => {
                debug!(unit = %id, kind = %definition.kind(), "Registering unit");
                self.index.insert(id, self.units.len());
                self.units.push(definition);
            }
        }
        Ok(())
    }

    /// Number of distinct ids registered so far
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether nothing has been registered
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    /// Close registration
    pub fn seal(self) -> UnitRegistry {
        info!(units = self.units.len(), "Registration closed");
        UnitRegistry {
            root: self.root,
            units: self.units,
            index: self.index,
        }
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Immutable set of registered units
#[derive(Debug)]
pub struct UnitRegistry {
    root: Option<UnitId>,
    units: Vec<UnitDefinition>,
    index: HashMap<UnitId, usize>,
}

impl UnitRegistry {
    /// Look up a unit by id
    pub fn get(&self, id: &str) -> Option<&UnitDefinition> {
        self.index.get(id).map(|&i| &self.units[i])
    }

    /// Registration slot of a unit
    pub fn position(&self, id: &str) -> Option<usize> {
        self.index.get(id).copied()
    }

    /// Unit at a registration slot
    pub fn at(&self, position: usize) -> Option<&UnitDefinition> {
        self.units.get(position)
    }

    /// Id of the root composition, if one was registered
    pub fn root(&self) -> Option<&UnitId> {
        self.root.as_ref()
    }

    /// Every unit in registration order
    pub fn iter(&self) -> impl Iterator<Item = &UnitDefinition> {
        self.units.iter()
    }

    /// Ids of every unit of `kind`, in registration order
    pub fn ids_of(&self, kind: UnitKind) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.kind() == kind)
            .map(|u| u.id().clone())
            .collect()
    }

    /// Ids of every unit carrying `tag`, in registration order
    pub fn tagged_with(&self, tag: &UnitId) -> Vec<UnitId> {
        self.units
            .iter()
            .filter(|u| u.header().tags.contains(tag))
            .map(|u| u.id().clone())
            .collect()
    }

    /// Number of registered units
    pub fn len(&self) -> usize {
        self.units.len()
    }

    /// Whether no unit is registered
    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}
