// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::{earth_distance, Edge, Point};
use std::collections::btree_map::{BTreeMap, Entry};

/// Represents a road network as a set of [Points](Point)
/// and [Edges](Edge) between them.
///
/// Iteration order (and thus every query over the graph) is deterministic,
/// ordered by point id.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Graph(BTreeMap<i64, (Point, Vec<Edge>)>);

impl Graph {
    /// Returns the number of vertices in the graph.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no vertices in the graph.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the number of (one-way) edges in the graph.
    pub fn edge_count(&self) -> usize {
        self.0.values().map(|(_, edges)| edges.len()).sum()
    }

    /// Returns an iterator over all [Points](Point) in the graph.
    pub fn iter(&self) -> impl Iterator<Item = &Point> {
        self.0.values().map(|(point, _)| point)
    }

    /// Retrieves a [Point] with the provided id.
    pub fn get_node(&self, id: i64) -> Option<Point> {
        self.0.get(&id).map(|&(point, _)| point)
    }

    /// Creates a vertex for `point.id`, unless one already exists.
    ///
    /// Vertices can't be moved once created, as this would break the [Edge]
    /// cost invariant.
    pub fn set_node(&mut self, point: Point) {
        debug_assert!(point.is_valid());

        match self.0.entry(point.id) {
            Entry::Vacant(e) => {
                e.insert((point, Vec::default()));
            }
            Entry::Occupied(e) => {
                debug_assert_eq!(e.get().0, point);
            }
        }
    }

    /// Finds the closest [Point] to the given position, preferring lower ids on ties.
    ///
    /// This function requires computing the distance to every [Point] in the graph,
    /// and is not suitable for large graphs - use a [KDTree](crate::KDTree) instead.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Option<Point> {
        self.iter()
            .map(|&pt| (earth_distance(lat, lon, pt.lat, pt.lon), pt))
            .min_by(|(a_dist, _), (b_dist, _)| a_dist.total_cmp(b_dist))
            .map(|(_, pt)| pt)
    }

    /// Gets all outgoing [Edges](Edge) from a vertex with a given id.
    pub fn get_edges(&self, from_id: i64) -> &[Edge] {
        self.0
            .get(&from_id)
            .map(|(_, e)| e.as_slice())
            .unwrap_or_default()
    }

    /// Gets the cost of the cheapest [Edge] from one vertex to another.
    /// If such an edge doesn't exist, returns [f64::INFINITY].
    pub fn get_edge(&self, from_id: i64, to_id: i64) -> f64 {
        self.get_edges(from_id)
            .iter()
            .filter(|edge| edge.to == to_id)
            .map(|edge| edge.cost)
            .fold(f64::INFINITY, f64::min)
    }

    /// Adds an [Edge] from a vertex with a given id.
    ///
    /// Existing edges between the same vertices are preserved.
    /// Edges from unknown vertices are ignored.
    pub fn add_edge(&mut self, from_id: i64, edge: Edge) {
        debug_assert!(edge.cost >= 0.0);

        if let Some((_, edges)) = self.0.get_mut(&from_id) {
            edges.push(edge);
        }
    }
}
