//! Global wrapper attachments
//!
//! A global attachment applies a wrapper to every unit of the wrapper's target
//! kind whose metadata satisfies a predicate. The runtime evaluates the
//! predicate once per unit after registration closes and caches the match
//! set; it is never evaluated on the call path.

use std::fmt;
use std::sync::Arc;

use crate::value_objects::{UnitId, UnitKind};

/// Read-only metadata a predicate can inspect
#[derive(Debug, Clone, Copy)]
pub struct UnitMeta<'a> {
    /// Unit id
    pub id: &'a UnitId,
    /// Unit kind
    pub kind: UnitKind,
    /// Capability tags carried by the unit
    pub tags: &'a [UnitId],
}

impl UnitMeta<'_> {
    /// Whether the unit carries `tag`
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }
}

/// Predicate selecting the units a global wrapper applies to
#[derive(Clone)]
pub struct GlobalAttachment {
    predicate: Arc<dyn Fn(&UnitMeta<'_>) -> bool + Send + Sync>,
    label: String,
}

impl GlobalAttachment {
    /// Apply to every unit of the wrapper's target kind
    pub fn everywhere() -> Self {
        Self {
            predicate: Arc::new(|_| true),
            label: "everywhere".to_string(),
        }
    }

    /// Apply to units whose id starts with `prefix`
    pub fn id_prefix(prefix: impl Into<String>) -> Self {
        let prefix = prefix.into();
        let label = format!("id_prefix({prefix})");
        Self {
            predicate: Arc::new(move |meta| meta.id.has_prefix(&prefix)),
            label,
        }
    }

    /// Apply to units carrying `tag`
    pub fn tagged(tag: impl Into<UnitId>) -> Self {
        let tag = tag.into();
        let label = format!("tagged({tag})");
        Self {
            predicate: Arc::new(move |meta| meta.tags.contains(&tag)),
            label,
        }
    }

    /// Apply to units matching an arbitrary predicate
    pub fn matching<F>(label: impl Into<String>, predicate: F) -> Self
    where
        F: Fn(&UnitMeta<'_>) -> bool + Send + Sync + 'static,
    {
        Self {
            predicate: Arc::new(predicate),
            label: label.into(),
        }
    }

    /// Evaluate the predicate
    pub fn matches(&self, meta: &UnitMeta<'_>) -> bool {
        (self.predicate)(meta)
    }

    /// Human-readable description used in diagnostics
    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Debug for GlobalAttachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("GlobalAttachment").field(&self.label).finish()
    }
}
