//! Wrapper Composer
//!
//! Builds the onion of wrappers around an operation invocation or a
//! singleton construction.
//!
//! ```text
//! chain = [L1, L2, G]            local wrappers in declared order,
//!                                then matching global wrappers
//!
//! L1 ─► L2 ─► G ─► unit logic
//!  ◄──── ◄──── ◄────
//! ```
//!
//! The list is folded right to left, so each wrapper receives a [`Next`]
//! that runs the rest of the chain. Calling `next` more than once re-runs
//! the whole inner chain; not calling it short-circuits.

use std::sync::Arc;

use serde_json::Value;
use weft_domain::entities::{
    Instance, Interceptor, Next, UnitDefinition, WrapFn, WrapperContext, WrapperLogic,
};
use weft_domain::error::{Error, Result};
use weft_domain::value_objects::{UnitId, UnitKind};

use crate::graph::DependencyGraph;
use crate::store::InstanceStore;

/// One wrapper layer ready to be folded
struct Layer<O> {
    run: WrapFn<O>,
    context: WrapperContext,
}

/// Composes wrapper chains from the graph's cached attachment lists
pub struct WrapperComposer {
    graph: Arc<DependencyGraph>,
    store: Arc<InstanceStore>,
}

impl WrapperComposer {
    /// Create a composer
    pub fn new(graph: Arc<DependencyGraph>, store: Arc<InstanceStore>) -> Self {
        Self { graph, store }
    }

    /// Compose the wrapper chain of an operation around `base`
    pub fn operation_chain(&self, operation: &UnitId, base: Next<Value>) -> Result<Next<Value>> {
        let layers = self.layers(operation, UnitKind::Operation, |logic| match logic {
            WrapperLogic::Operation(run) => Some(Arc::clone(run)),
            WrapperLogic::Singleton(_) => None,
        })?;
        Ok(compose(layers, base))
    }

    /// Compose the construction wrapper chain of a singleton around `base`
    pub fn singleton_chain(&self, singleton: &UnitId, base: Next<Instance>) -> Result<Next<Instance>> {
        let layers = self.layers(singleton, UnitKind::Singleton, |logic| match logic {
            WrapperLogic::Singleton(run) => Some(Arc::clone(run)),
            WrapperLogic::Operation(_) => None,
        })?;
        Ok(compose(layers, base))
    }

    fn layers<O, F>(&self, target: &UnitId, target_kind: UnitKind, pick: F) -> Result<Vec<Layer<O>>>
    where
        F: Fn(&WrapperLogic) -> Option<WrapFn<O>>,
    {
        let registry = self.graph.registry();
        self.graph
            .wrapper_chain(target.as_str())
            .into_iter()
            .map(|wrapper_id| {
                let Some(UnitDefinition::Wrapper(wrapper)) = registry.get(wrapper_id.as_str()) else {
                    return Err(Error::internal(format!("'{wrapper_id}' is not a wrapper")));
                };
                let run = pick(&wrapper.logic).ok_or_else(|| {
                    Error::internal(format!("wrapper '{wrapper_id}' cannot wrap a {target_kind}"))
                })?;
                let constructed = self
                    .store
                    .context(wrapper_id.as_str())
                    .ok_or_else(|| Error::unresolved(target.clone(), wrapper_id.to_string()))?;
                Ok(Layer {
                    run,
                    context: WrapperContext {
                        wrapper: wrapper_id,
                        target: target.clone(),
                        target_kind,
                        config: constructed.config,
                        deps: constructed.deps,
                    },
                })
            })
            .collect()
    }
}

/// Fold layers right to left; the first layer ends up outermost
fn compose<O: Send + 'static>(layers: Vec<Layer<O>>, base: Next<O>) -> Next<O> {
    layers.into_iter().rev().fold(base, |inner, layer| {
        Next::new(move |input| (layer.run)(input, inner.clone(), layer.context.clone()))
    })
}

/// Wrap `chain` in interceptors; the last registered ends up outermost
pub fn intercept(interceptors: &[Interceptor], chain: Next<Value>) -> Next<Value> {
    interceptors.iter().fold(chain, |inner, interceptor| {
        let interceptor = Arc::clone(interceptor);
        Next::new(move |input| interceptor(input, inner.clone()))
    })
}
