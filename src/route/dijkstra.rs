// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::sync::atomic::{self, AtomicBool};

use super::{Route, RouteError};
use crate::{Edge, Graph};

#[derive(Debug, Clone, Copy)]
struct QueueItem {
    at: i64,
    cost: f64,
}

impl PartialEq for QueueItem {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueItem {}

impl PartialOrd for QueueItem {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueItem {
    fn cmp(&self, other: &Self) -> Ordering {
        // NOTE: We revert the order of comparison,
        // as lower costs (and lower ids on ties) are considered better ("higher"),
        // and Rust's BinaryHeap is a max-heap.
        other
            .cost
            .total_cmp(&self.cost)
            .then_with(|| other.at.cmp(&self.at))
    }
}

fn reconstruct_path(came_from: &HashMap<i64, i64>, mut last: i64) -> Vec<i64> {
    let mut path = vec![last];

    while let Some(&nd) = came_from.get(&last) {
        path.push(nd);
        last = nd;
    }

    path.reverse();
    path
}

/// Uses [Dijkstra's algorithm](https://en.wikipedia.org/wiki/Dijkstra%27s_algorithm)
/// to find the shortest route between two vertices in the provided graph.
///
/// Returns [Route::unreachable] if there is no route between the two vertices.
/// Among multiple equally short routes, the one expanding lower vertex ids first
/// is returned, so the result is always the same for the same graph.
///
/// `step_limit` limits how many vertices may be expanded during the search
/// before returning [RouteError::StepLimitExceeded]. Concluding that no route exists requires
/// expanding all vertices accessible from the start, which is usually very time-consuming,
/// especially on large datasets. The recommended value is
/// [DEFAULT_STEP_LIMIT](crate::DEFAULT_STEP_LIMIT).
pub fn find_route(
    g: &Graph,
    from_id: i64,
    to_id: i64,
    step_limit: usize,
) -> Result<Route, RouteError> {
    find_route_with_cancel(g, from_id, to_id, step_limit, &AtomicBool::new(false))
}

/// Same as [find_route], but checks `cancel` before expanding every vertex,
/// returning [RouteError::Cancelled] as soon as it's set.
pub fn find_route_with_cancel(
    g: &Graph,
    from_id: i64,
    to_id: i64,
    step_limit: usize,
    cancel: &AtomicBool,
) -> Result<Route, RouteError> {
    g.get_node(from_id)
        .ok_or(RouteError::InvalidReference(from_id))?;
    g.get_node(to_id).ok_or(RouteError::InvalidReference(to_id))?;

    let mut queue: BinaryHeap<QueueItem> = BinaryHeap::default();
    let mut came_from: HashMap<i64, i64> = HashMap::default();
    let mut known_costs: HashMap<i64, f64> = HashMap::default();
    let mut visited: HashSet<i64> = HashSet::default();
    let mut steps: usize = 0;

    queue.push(QueueItem {
        at: from_id,
        cost: 0.0,
    });
    known_costs.insert(from_id, 0.0);

    while let Some(item) = queue.pop() {
        if cancel.load(atomic::Ordering::Relaxed) {
            return Err(RouteError::Cancelled);
        }

        // Multiple items for the same vertex may be kept in the queue;
        // only the first (cheapest) one is expanded.
        if !visited.insert(item.at) {
            continue;
        }

        if item.at == to_id {
            log::debug!("route {from_id} -> {to_id} found after {steps} steps");
            return Ok(Route {
                nodes: reconstruct_path(&came_from, to_id),
                cost: item.cost,
            });
        }

        steps += 1;
        if steps > step_limit {
            return Err(RouteError::StepLimitExceeded);
        }

        for &Edge {
            to: neighbor_id,
            cost: edge_cost,
            ..
        } in g.get_edges(item.at)
        {
            if visited.contains(&neighbor_id) || g.get_node(neighbor_id).is_none() {
                continue;
            }

            // Check if this is the cheapest way to the neighbor
            let neighbor_cost = item.cost + edge_cost;
            if neighbor_cost
                >= known_costs
                    .get(&neighbor_id)
                    .cloned()
                    .unwrap_or(f64::INFINITY)
            {
                continue;
            }

            // Push the new item into the queue
            came_from.insert(neighbor_id, item.at);
            known_costs.insert(neighbor_id, neighbor_cost);
            queue.push(QueueItem {
                at: neighbor_id,
                cost: neighbor_cost,
            });
        }
    }

    log::debug!("no route {from_id} -> {to_id} after {steps} steps");
    Ok(Route::unreachable())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{earth_distance, Point};

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-9),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    /// Builds a graph from (id, lat, lon) vertices and undirected edges
    /// weighted with the distance between their ends.
    fn build_graph(points: &[(i64, f64, f64)], edges: &[(i64, i64)]) -> Graph {
        let mut g = Graph::default();
        for &(id, lat, lon) in points {
            g.set_node(Point { id, lat, lon });
        }
        for (way_id, &(a, b)) in edges.iter().enumerate() {
            let pa = g.get_node(a).unwrap();
            let pb = g.get_node(b).unwrap();
            let cost = earth_distance(pa.lat, pa.lon, pb.lat, pb.lon);
            let way_id = way_id as i64 + 1;
            g.add_edge(a, Edge { to: b, cost, way_id });
            g.add_edge(b, Edge { to: a, cost, way_id });
        }
        g
    }

    fn path_cost(g: &Graph, path: &[i64]) -> f64 {
        path.windows(2).map(|p| g.get_edge(p[0], p[1])).sum()
    }

    /// Finds the cheapest route by enumerating all simple paths.
    fn brute_force_cost(g: &Graph, from: i64, to: i64) -> f64 {
        fn dfs(g: &Graph, at: i64, to: i64, cost: f64, seen: &mut Vec<i64>) -> f64 {
            if at == to {
                return cost;
            }
            let mut best = f64::INFINITY;
            for e in g.get_edges(at) {
                if !seen.contains(&e.to) {
                    seen.push(e.to);
                    best = best.min(dfs(g, e.to, to, cost + e.cost, seen));
                    seen.pop();
                }
            }
            best
        }
        dfs(g, from, to, 0.0, &mut vec![from])
    }

    #[test]
    fn simple_line() {
        //  1 ── 2 ── 3
        let g = build_graph(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 2.0, 0.0)],
            &[(1, 2), (2, 3)],
        );

        let r = find_route(&g, 1, 3, 100).unwrap();
        assert_eq!(r.nodes, vec![1, 2, 3]);
        assert_almost_eq!(r.cost, g.get_edge(1, 2) + g.get_edge(2, 3));
    }

    #[test]
    fn shortcut_is_taken() {
        //  1 ─── 2 ─── 3
        //   \         /
        //    4 ──── 5
        let g = build_graph(
            &[
                (1, 0.0, 0.0),
                (2, 0.0, 0.01),
                (3, 0.0, 0.02),
                (4, -0.01, 0.005),
                (5, -0.01, 0.015),
            ],
            &[(1, 2), (2, 3), (1, 4), (4, 5), (5, 3)],
        );

        let r = find_route(&g, 1, 3, 100).unwrap();
        assert_eq!(r.nodes, vec![1, 2, 3]);

        let r = find_route(&g, 4, 2, 100).unwrap();
        assert_eq!(r.nodes, vec![4, 1, 2]);
    }

    #[test]
    fn same_start_and_end() {
        let g = build_graph(&[(1, 0.0, 0.0), (2, 1.0, 0.0)], &[(1, 2)]);
        let r = find_route(&g, 1, 1, 100).unwrap();
        assert_eq!(r.nodes, vec![1]);
        assert_eq!(r.cost, 0.0);
    }

    #[test]
    fn disconnected() {
        //  1 ── 2    3 ── 4
        let g = build_graph(
            &[(1, 0.0, 0.0), (2, 0.0, 1.0), (3, 5.0, 5.0), (4, 5.0, 6.0)],
            &[(1, 2), (3, 4)],
        );

        let r = find_route(&g, 1, 4, 100).unwrap();
        assert_eq!(r, Route::unreachable());
        assert!(!r.is_reachable());
        assert!(r.cost.is_infinite());
    }

    #[test]
    fn invalid_reference() {
        let g = build_graph(&[(1, 0.0, 0.0), (2, 0.0, 1.0)], &[(1, 2)]);
        assert_eq!(
            find_route(&g, 1, 42, 100),
            Err(RouteError::InvalidReference(42))
        );
        assert_eq!(
            find_route(&g, 42, 1, 100),
            Err(RouteError::InvalidReference(42))
        );
    }

    #[test]
    fn step_limit() {
        let g = build_graph(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 2.0, 0.0), (4, 3.0, 0.0)],
            &[(1, 2), (2, 3), (3, 4)],
        );
        assert_eq!(find_route(&g, 1, 4, 2), Err(RouteError::StepLimitExceeded));
        assert!(find_route(&g, 1, 4, 3).is_ok());
    }

    #[test]
    fn cancelled() {
        let g = build_graph(&[(1, 0.0, 0.0), (2, 1.0, 0.0)], &[(1, 2)]);
        let cancel = AtomicBool::new(true);
        assert_eq!(
            find_route_with_cancel(&g, 1, 2, 100, &cancel),
            Err(RouteError::Cancelled)
        );
    }

    #[test]
    fn equal_cost_tie_break() {
        //      7
        //    /   \
        //  1       4
        //    \   /
        //      3
        // Both detours are exactly as long; the one through the lower id wins,
        // regardless of the edge insertion order.
        let g = build_graph(
            &[(1, 0.0, 0.0), (7, 1.0, 1.0), (3, -1.0, 1.0), (4, 0.0, 2.0)],
            &[(1, 7), (7, 4), (1, 3), (3, 4)],
        );

        for _ in 0..5 {
            let r = find_route(&g, 1, 4, 100).unwrap();
            assert_eq!(r.nodes, vec![1, 3, 4]);
        }
    }

    #[test]
    fn directed_edges() {
        let mut g = build_graph(&[(1, 0.0, 0.0), (2, 0.0, 1.0)], &[]);
        g.add_edge(1, Edge { to: 2, cost: 111.0, way_id: 1 });

        assert_eq!(find_route(&g, 1, 2, 100).unwrap().nodes, vec![1, 2]);
        assert!(!find_route(&g, 2, 1, 100).unwrap().is_reachable());
    }

    #[test]
    fn matches_brute_force() {
        //  1 ── 2 ── 3 ── 4
        //  │ ╲  │    │  ╱ │
        //  5 ── 6 ── 7 ── 8
        //       │  ╱
        //       9
        let g = build_graph(
            &[
                (1, 0.00, 0.00),
                (2, 0.00, 0.013),
                (3, 0.002, 0.021),
                (4, 0.00, 0.03),
                (5, -0.01, 0.00),
                (6, -0.012, 0.01),
                (7, -0.009, 0.022),
                (8, -0.01, 0.031),
                (9, -0.02, 0.011),
            ],
            &[
                (1, 2),
                (2, 3),
                (3, 4),
                (1, 5),
                (1, 6),
                (2, 6),
                (3, 7),
                (4, 7),
                (4, 8),
                (5, 6),
                (6, 7),
                (7, 8),
                (6, 9),
                (7, 9),
            ],
        );

        for from in 1..=9 {
            for to in 1..=9 {
                let r = find_route(&g, from, to, 1000).unwrap();
                assert_eq!(r.nodes.first(), Some(&from));
                assert_eq!(r.nodes.last(), Some(&to));
                assert_almost_eq!(r.cost, path_cost(&g, &r.nodes));
                assert_almost_eq!(r.cost, brute_force_cost(&g, from, to));
            }
        }
    }
}
