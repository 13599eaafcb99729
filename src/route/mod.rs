// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod dijkstra;
mod error;

pub use dijkstra::{find_route, find_route_with_cancel};
pub use error::{RouteError, DEFAULT_STEP_LIMIT};

/// Shortest path between two [Graph](crate::Graph) vertices.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Vertex ids from the start to the end, inclusive.
    /// Empty if the end is not reachable from the start.
    pub nodes: Vec<i64>,

    /// Sum of the [Edge](crate::Edge) costs along the route, in kilometers.
    /// [f64::INFINITY] if the end is not reachable from the start.
    pub cost: f64,
}

impl Route {
    /// Creates the result signaling that no route exists.
    pub fn unreachable() -> Self {
        Self {
            nodes: Vec::new(),
            cost: f64::INFINITY,
        }
    }

    pub fn is_reachable(&self) -> bool {
        !self.nodes.is_empty()
    }
}
