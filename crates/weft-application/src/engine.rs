//! Operation Execution Engine
//!
//! ## Invocation phases
//!
//! ```text
//! Resolving ─► Validating ─► Executing ─► ValidatingResult ─► Complete
//!     │            │             │               │
//!     └────────────┴─────────────┴───────────────┴──────────► Failed
//! ```
//!
//! | Phase | Failure |
//! |-------|---------|
//! | Resolving | `UnknownOperation`, `UnresolvedDependency` |
//! | Validating | `InputValidation` |
//! | Executing | whatever a wrapper, interceptor or the body returns |
//! | ValidatingResult | `OutputValidation` |
//!
//! The engine performs no retries or timeouts of its own; those are
//! ordinary wrappers.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwap;
use serde_json::Value;
use tracing::{Instrument, debug, debug_span};
use uuid::Uuid;
use weft_domain::entities::{Interceptor, Next, UnitDefinition};
use weft_domain::error::{Error, Result};
use weft_domain::value_objects::{UnitId, UnitKind};

use crate::composer::{self, WrapperComposer};
use crate::resolver::DependencyResolver;

/// Phase of a single invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvocationPhase {
    /// Looking up the operation and resolving its dependencies
    Resolving,
    /// Applying the input contract
    Validating,
    /// Running the composed chain
    Executing,
    /// Applying the output contract
    ValidatingResult,
    /// Finished successfully
    Complete,
    /// Finished with an error
    Failed,
}

impl fmt::Display for InvocationPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Resolving => "resolving",
            Self::Validating => "validating",
            Self::Executing => "executing",
            Self::ValidatingResult => "validating_result",
            Self::Complete => "complete",
            Self::Failed => "failed",
        };
        f.write_str(label)
    }
}

/// Runs operations through their composed wrapper chains
pub struct ExecutionEngine {
    resolver: Arc<DependencyResolver>,
    composer: Arc<WrapperComposer>,
    interceptors: HashMap<UnitId, ArcSwap<Vec<Interceptor>>>,
}

impl ExecutionEngine {
    /// Create an engine with an empty interceptor list per operation
    pub fn new(resolver: Arc<DependencyResolver>, composer: Arc<WrapperComposer>) -> Self {
        let interceptors = resolver
            .graph()
            .registry()
            .ids_of(UnitKind::Operation)
            .into_iter()
            .map(|id| (id, ArcSwap::from_pointee(Vec::new())))
            .collect();
        Self {
            resolver,
            composer,
            interceptors,
        }
    }

    /// Invoke an operation
    pub async fn invoke(&self, operation: &UnitId, input: Value) -> Result<Value> {
        let call_id = Uuid::new_v4();
        let span = debug_span!("invoke", operation = %operation, call_id = %call_id);
        async move {
            let result = self.run_phases(operation, input).await;
            match &result {
                Ok(_) => debug!(phase = %InvocationPhase::Complete, "Invocation finished"),
                Err(err) => debug!(phase = %InvocationPhase::Failed, error = %err, "Invocation finished"),
            }
            result
        }
        .instrument(span)
        .await
    }

    async fn run_phases(&self, operation: &UnitId, input: Value) -> Result<Value> {
        debug!(phase = %InvocationPhase::Resolving, "Invocation phase");
        let Some(UnitDefinition::Operation(definition)) =
            self.resolver.graph().registry().get(operation.as_str())
        else {
            return Err(Error::UnknownOperation {
                id: operation.clone(),
            });
        };
        let context = self.resolver.context(operation)?;

        debug!(phase = %InvocationPhase::Validating, "Invocation phase");
        let input = match &definition.input {
            Some(contract) => contract.parse(input).map_err(|source| Error::InputValidation {
                operation: operation.clone(),
                source,
            })?,
            None => input,
        };

        debug!(phase = %InvocationPhase::Executing, "Invocation phase");
        let run = Arc::clone(&definition.run);
        let base = Next::new(move |input| run(input, context.clone()));
        let chain = self.composer.operation_chain(operation, base)?;
        let interceptors = self
            .interceptors
            .get(operation.as_str())
            .map(|slot| slot.load_full())
            .unwrap_or_default();
        let chain = composer::intercept(&interceptors, chain);
        let output = chain.run(input).await?;

        debug!(phase = %InvocationPhase::ValidatingResult, "Invocation phase");
        match &definition.output {
            Some(contract) => contract.parse(output).map_err(|source| Error::OutputValidation {
                operation: operation.clone(),
                source,
            }),
            None => Ok(output),
        }
    }

    /// Add an interceptor around every subsequent invocation of `operation`
    ///
    /// In-flight calls keep the interceptor list they loaded when they
    /// started.
    pub fn intercept(&self, operation: &UnitId, interceptor: Interceptor) -> Result<()> {
        let slot = self
            .interceptors
            .get(operation.as_str())
            .ok_or_else(|| Error::UnknownOperation {
                id: operation.clone(),
            })?;
        slot.rcu(|current| {
            let mut next = Vec::with_capacity(current.len() + 1);
            next.extend(current.iter().cloned());
            next.push(Arc::clone(&interceptor));
            next
        });
        debug!(operation = %operation, "Interceptor registered");
        Ok(())
    }

    /// Number of interceptors registered against `operation`
    pub fn interceptor_count(&self, operation: &str) -> usize {
        self.interceptors
            .get(operation)
            .map_or(0, |slot| slot.load().len())
    }
}
