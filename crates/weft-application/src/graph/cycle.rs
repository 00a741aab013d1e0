//! Cycle detection
//!
//! Depth-first search over the adjacency lists with an explicit recursion
//! stack. Roots and neighbours are visited in registration and declaration
//! order, so the reported cycle is the same on every run for the same input.

use super::Edge;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    OnStack,
    Done,
}

/// Adjacency lists over registration slots, keeping only edges accepted by `keep`
pub fn adjacency<F>(node_count: usize, edges: &[Edge], keep: F) -> Vec<Vec<usize>>
where
    F: Fn(&Edge) -> bool,
{
    let mut adjacency = vec![Vec::new(); node_count];
    for edge in edges.iter().filter(|e| keep(e)) {
        adjacency[edge.from].push(edge.to);
    }
    adjacency
}

/// First cycle found, as a closed path (`[a, b, a]`), or `None`
pub fn find_cycle(adjacency: &[Vec<usize>]) -> Option<Vec<usize>> {
    let mut marks = vec![Mark::Unvisited; adjacency.len()];
    let mut path: Vec<usize> = Vec::new();
    let mut cursors: Vec<usize> = Vec::new();

    for root in 0..adjacency.len() {
        if marks[root] != Mark::Unvisited {
            continue;
        }
        marks[root] = Mark::OnStack;
        path.push(root);
        cursors.push(0);

        while let Some(&node) = path.last() {
            let top = cursors.len() - 1;
            let Some(&next) = adjacency[node].get(cursors[top]) else {
                marks[node] = Mark::Done;
                path.pop();
                cursors.pop();
                continue;
            };
            cursors[top] += 1;

            match marks[next] {
                Mark::Unvisited => {
                    marks[next] = Mark::OnStack;
                    path.push(next);
                    cursors.push(0);
                }
                Mark::OnStack => {
                    let start = path.iter().position(|&n| n == next)?;
                    let mut cycle = path[start..].to_vec();
                    cycle.push(next);
                    return Some(cycle);
                }
                Mark::Done => {}
            }
        }
    }

    None
}

/// First cycle that passes through a node accepted by `through`, as a closed
/// path starting at that node
///
/// Nodes are tried in slot order. From each one a depth-first search looks for
/// a path back to it.
pub fn find_cycle_through<F>(adjacency: &[Vec<usize>], through: F) -> Option<Vec<usize>>
where
    F: Fn(usize) -> bool,
{
    for start in (0..adjacency.len()).filter(|&n| through(n)) {
        let mut visited = vec![false; adjacency.len()];
        let mut path = vec![start];
        let mut cursors = vec![0_usize];
        visited[start] = true;

        while let Some(&node) = path.last() {
            let top = cursors.len() - 1;
            let Some(&next) = adjacency[node].get(cursors[top]) else {
                path.pop();
                cursors.pop();
                continue;
            };
            cursors[top] += 1;

            if next == start {
                path.push(start);
                return Some(path);
            }
            if !visited[next] {
                visited[next] = true;
                path.push(next);
                cursors.push(0);
            }
        }
    }

    None
}
