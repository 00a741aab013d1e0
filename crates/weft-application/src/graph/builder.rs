//! Graph construction from a sealed registry

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, info};
use weft_domain::entities::{Subscription, UnitDefinition};
use weft_domain::error::{Error, Result};
use weft_domain::value_objects::{EdgeKind, UnitId, UnitKind};

use super::{DeclaredDependency, DependencyGraph, Edge, UnitNode, cycle, order};
use crate::registry::UnitRegistry;

impl DependencyGraph {
    /// Build and validate the graph
    ///
    /// Runs every configuration-time check, including cycle detection over
    /// declared and implicit edges. No unit behaviour is invoked apart from
    /// config contracts, dynamic dependency functions and global attachment
    /// predicates, each exactly once per unit.
    pub fn build(registry: Arc<UnitRegistry>) -> Result<Self> {
        let mut edges = Vec::new();
        let mut nodes = Vec::with_capacity(registry.len());

        for (index, unit) in registry.iter().enumerate() {
            let config = validated_config(unit)?;
            let dependencies = declared_dependencies(&registry, index, unit, &config, &mut edges)?;
            let local_wrappers = local_wrappers(&registry, index, unit, &mut edges)?;
            check_subscriptions(&registry, unit)?;
            nodes.push(UnitNode {
                config,
                dependencies,
                local_wrappers,
                global_wrappers: Vec::new(),
            });
        }

        apply_global_attachments(&registry, &mut nodes, &mut edges);

        // Forward references between handle-only units are resolved lazily
        // and may form cycles; every other edge takes part in detection.
        let visible = cycle::adjacency(registry.len(), &edges, |edge| {
            !edge.forward || !both_handle_only(&registry, edge)
        });
        let full = cycle::adjacency(registry.len(), &edges, |_| true);
        let found = cycle::find_cycle(&visible).or_else(|| {
            cycle::find_cycle_through(&full, |i| {
                registry.at(i).is_some_and(|u| u.kind().is_constructed())
            })
        });
        if let Some(path) = found {
            let cycle: Vec<UnitId> = path
                .into_iter()
                .filter_map(|i| registry.at(i).map(|u| u.id().clone()))
                .collect();
            return Err(Error::CircularDependency { cycle });
        }

        let construction_order = order::construction_order(&registry, &full);

        info!(
            units = registry.len(),
            edges = edges.len(),
            constructed = construction_order.len(),
            "Dependency graph built"
        );

        Ok(Self {
            registry,
            nodes,
            edges,
            construction_order,
        })
    }
}

fn validated_config(unit: &UnitDefinition) -> Result<Value> {
    let header = unit.header();
    match &header.config_contract {
        Some(contract) => contract
            .parse(header.config.clone())
            .map_err(|source| Error::InvalidConfig {
                unit: header.id.clone(),
                source,
            }),
        None => Ok(header.config.clone()),
    }
}

fn declared_dependencies(
    registry: &UnitRegistry,
    index: usize,
    unit: &UnitDefinition,
    config: &Value,
    edges: &mut Vec<Edge>,
) -> Result<Vec<DeclaredDependency>> {
    let map = unit.header().dependencies.evaluate(config);
    let mut resolved = Vec::with_capacity(map.len());

    for (name, reference) in map.iter() {
        let target = reference.resolve_id();
        let Some(position) = registry.position(target.as_str()) else {
            if reference.is_optional() {
                debug!(unit = %unit.id(), dependency = name, target = %target, "Optional dependency absent");
                continue;
            }
            return Err(Error::unknown_unit(target, unit.id().clone()));
        };

        let target_kind = registry
            .at(position)
            .map(UnitDefinition::kind)
            .ok_or_else(|| Error::internal(format!("registry slot {position} is empty")))?;
        if !target_kind.is_injectable() {
            return Err(Error::InvalidDependency {
                unit: unit.id().clone(),
                dependency: target,
                message: format!("a {target_kind} cannot be injected"),
            });
        }

        edges.push(Edge {
            from: index,
            to: position,
            kind: EdgeKind::Declared,
            name: Some(name.to_string()),
            forward: reference.is_forward(),
        });
        resolved.push(DeclaredDependency {
            name: name.to_string(),
            target,
            target_kind,
        });
    }

    Ok(resolved)
}

fn local_wrappers(
    registry: &UnitRegistry,
    index: usize,
    unit: &UnitDefinition,
    edges: &mut Vec<Edge>,
) -> Result<Vec<UnitId>> {
    let mut wrappers = Vec::new();
    for wrapper_id in unit.local_wrappers() {
        let Some(position) = registry.position(wrapper_id.as_str()) else {
            return Err(Error::invalid_attachment(
                unit.id().clone(),
                format!("wrapper '{wrapper_id}' is not registered"),
            ));
        };
        let Some(UnitDefinition::Wrapper(wrapper)) = registry.at(position) else {
            return Err(Error::invalid_attachment(
                unit.id().clone(),
                format!("'{wrapper_id}' is not a wrapper"),
            ));
        };
        if wrapper.target_kind() != unit.kind() {
            return Err(Error::invalid_attachment(
                unit.id().clone(),
                format!(
                    "wrapper '{wrapper_id}' wraps {} units, not {}",
                    wrapper.target_kind(),
                    unit.kind()
                ),
            ));
        }
        edges.push(Edge {
            from: index,
            to: position,
            kind: EdgeKind::LocalWrapper,
            name: None,
            forward: false,
        });
        wrappers.push(wrapper_id.clone());
    }
    Ok(wrappers)
}

fn check_subscriptions(registry: &UnitRegistry, unit: &UnitDefinition) -> Result<()> {
    let UnitDefinition::Listener(listener) = unit else {
        return Ok(());
    };
    let Subscription::Only(notifications) = &listener.subscription else {
        return Ok(());
    };
    for notification in notifications {
        match registry.get(notification.as_str()).map(UnitDefinition::kind) {
            None => return Err(Error::unknown_unit(notification.clone(), unit.id().clone())),
            Some(UnitKind::Notification) => {}
            Some(kind) => {
                return Err(Error::configuration(format!(
                    "listener '{}' subscribes to '{notification}', which is a {kind}",
                    unit.id()
                )));
            }
        }
    }
    Ok(())
}

/// Evaluate each global predicate once per candidate and cache the match set
///
/// A wrapper already attached locally to a unit is not applied a second time.
fn apply_global_attachments(registry: &UnitRegistry, nodes: &mut [UnitNode], edges: &mut Vec<Edge>) {
    for (wrapper_index, unit) in registry.iter().enumerate() {
        let UnitDefinition::Wrapper(wrapper) = unit else {
            continue;
        };
        let Some(attachment) = &wrapper.global else {
            continue;
        };
        let target_kind = wrapper.target_kind();
        let mut matched = 0_usize;

        for (candidate_index, candidate) in registry.iter().enumerate() {
            if candidate.kind() != target_kind || !attachment.matches(&candidate.meta()) {
                continue;
            }
            let node = &mut nodes[candidate_index];
            if node.local_wrappers.contains(unit.id()) {
                continue;
            }
            node.global_wrappers.push(unit.id().clone());
            edges.push(Edge {
                from: candidate_index,
                to: wrapper_index,
                kind: EdgeKind::GlobalWrapper,
                name: None,
                forward: false,
            });
            matched += 1;
        }

        debug!(
            wrapper = %unit.id(),
            attachment = attachment.label(),
            matched,
            "Global wrapper attached"
        );
    }
}

fn both_handle_only(registry: &UnitRegistry, edge: &Edge) -> bool {
    let handle_only = |i: usize| registry.at(i).is_some_and(|u| !u.kind().is_constructed());
    handle_only(edge.from) && handle_only(edge.to)
}
