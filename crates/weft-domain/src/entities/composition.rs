//! Root composition
//!
//! A [`Composition`] bundles unit definitions and nested child compositions
//! into the single tree handed to the registry. Children are flattened
//! depth-first, each child's units before the parent's own, so a module can
//! override definitions pulled in from the modules it includes.
//!
//! ```text
//! app
//! ├── units: [api.handler]
//! └── children
//!     ├── storage   units: [db]
//!     └── users     units: [users.get, users.fetched]
//!
//! flattened: db, users.get, users.fetched, api.handler
//! ```

use super::definition::UnitDefinition;
use crate::value_objects::UnitId;

/// A named tree of unit definitions
#[derive(Debug, Clone)]
pub struct Composition {
    /// Composition id
    pub id: UnitId,
    /// Units declared directly in this composition
    pub units: Vec<UnitDefinition>,
    /// Nested compositions
    pub children: Vec<Composition>,
}

impl Composition {
    /// Create an empty composition
    pub fn new(id: impl Into<UnitId>) -> Self {
        Self {
            id: id.into(),
            units: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Add a unit
    #[must_use]
    pub fn with(mut self, unit: impl Into<UnitDefinition>) -> Self {
        self.units.push(unit.into());
        self
    }

    /// Add several units
    #[must_use]
    pub fn with_all<I, U>(mut self, units: I) -> Self
    where
        I: IntoIterator<Item = U>,
        U: Into<UnitDefinition>,
    {
        self.units.extend(units.into_iter().map(Into::into));
        self
    }

    /// Nest a child composition
    #[must_use]
    pub fn include(mut self, child: Composition) -> Self {
        self.children.push(child);
        self
    }

    /// Every unit in the tree, children first, depth-first
    pub fn flatten(self) -> Vec<UnitDefinition> {
        let mut out = Vec::new();
        self.flatten_into(&mut out);
        out
    }

    fn flatten_into(self, out: &mut Vec<UnitDefinition>) {
        for child in self.children {
            child.flatten_into(out);
        }
        out.extend(self.units);
    }
}
