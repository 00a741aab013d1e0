//! Construction order
//!
//! Post-order DFS over every edge of the graph, emitting only units that are
//! constructed (singletons and wrappers). Walking through operations and
//! other handle-only units keeps transitive requirements intact: a singleton
//! that holds an operation handle is built after the singletons that
//! operation depends on, whether the handle is a direct or a forward
//! reference. Visited nodes are skipped, so handle-only cycles terminate.

use weft_domain::value_objects::UnitId;

use crate::registry::UnitRegistry;

pub(super) fn construction_order(registry: &UnitRegistry, adjacency: &[Vec<usize>]) -> Vec<UnitId> {
    let mut visited = vec![false; adjacency.len()];
    let mut order = Vec::new();
    let mut stack: Vec<(usize, usize)> = Vec::new();

    for root in 0..adjacency.len() {
        if visited[root] {
            continue;
        }
        visited[root] = true;
        stack.push((root, 0));

        while let Some((node, cursor)) = stack.pop() {
            if let Some(&next) = adjacency[node].get(cursor) {
                stack.push((node, cursor + 1));
                if !visited[next] {
                    visited[next] = true;
                    stack.push((next, 0));
                }
                continue;
            }
            if let Some(unit) = registry.at(node).filter(|u| u.kind().is_constructed()) {
                order.push(unit.id().clone());
            }
        }
    }

    order
}
