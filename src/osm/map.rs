// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::sync::atomic::AtomicBool;
use std::thread;

use super::area::{Area, AreaAssembler};
use super::diagnostic::Diagnostic;
use super::graph_builder::{GraphBuilder, Road};
use super::model::Feature;
use super::reader::Options;
use super::store::EntityStore;
use crate::{find_route_with_cancel, Graph, KDTree, Point, Route, RouteError};

/// Below this amount of vertices, [Map::nearest_vertex] scans all vertices
/// instead of searching the k-d tree.
pub const LINEAR_SCAN_LIMIT: usize = 64;

/// Everything derived from a single load of map data: areas and roads for drawing,
/// plus the routing [Graph] with a spatial index over its vertices.
///
/// A Map is immutable once built, and can be shared between threads
/// answering routing queries concurrently.
#[derive(Debug)]
pub struct Map {
    areas: Vec<Area>,
    roads: Vec<Road>,
    graph: Graph,
    locator: Option<KDTree>,
    diagnostics: Vec<Diagnostic>,
}

impl Map {
    /// Consumes a stream of features and derives a Map from them, as per the provided [Options].
    /// [Options::file_format] is ignored.
    ///
    /// Only errors of the stream itself abort the load. Problems with individual features
    /// are collected into [Map::diagnostics].
    pub fn from_features<I, E>(features: I, options: &Options) -> Result<Self, E>
    where
        I: IntoIterator<Item = Result<Feature, E>>,
    {
        let store = EntityStore::from_features(options.bbox, features)?;
        Ok(Self::from_store(store, options))
    }

    /// Derives a Map from features already collected into an [EntityStore].
    pub fn from_store(mut store: EntityStore, options: &Options) -> Self {
        let ((areas, area_diagnostics), (graph, roads, graph_diagnostics)) = if options.parallel {
            thread::scope(|s| {
                let areas = s.spawn(|| AreaAssembler::new(&store, options.classifier).assemble());
                let graph = GraphBuilder::new(&store, options.classifier).build();
                let areas = areas
                    .join()
                    .unwrap_or_else(|e| std::panic::resume_unwind(e));
                (areas, graph)
            })
        } else {
            (
                AreaAssembler::new(&store, options.classifier).assemble(),
                GraphBuilder::new(&store, options.classifier).build(),
            )
        };

        let mut diagnostics = std::mem::take(&mut store.diagnostics);
        diagnostics.extend(area_diagnostics);
        diagnostics.extend(graph_diagnostics);

        let locator = if graph.len() >= LINEAR_SCAN_LIMIT {
            KDTree::from_iter(graph.iter().copied())
        } else {
            None
        };

        log::info!(
            "built {} areas, {} roads and a graph with {} vertices and {} edges ({} diagnostics)",
            areas.len(),
            roads.len(),
            graph.len(),
            graph.edge_count(),
            diagnostics.len(),
        );

        Self {
            areas,
            roads,
            graph,
            locator,
            diagnostics,
        }
    }

    /// Closed polygons, in the order of their source ways, followed by relation areas.
    pub fn areas(&self) -> &[Area] {
        &self.areas
    }

    /// Classified line features, in the order of their source ways.
    pub fn roads(&self) -> &[Road] {
        &self.roads
    }

    pub fn graph(&self) -> &Graph {
        &self.graph
    }

    /// Problems found while loading, in the order they were encountered.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Returns the graph vertex closest to the provided position, or [None]
    /// if the graph is empty. Ties are broken by the lowest vertex id.
    pub fn nearest_vertex(&self, lat: f64, lon: f64) -> Option<Point> {
        match &self.locator {
            Some(kd) => Some(kd.find_nearest_node(lat, lon)),
            None => self.graph.find_nearest_node(lat, lon),
        }
    }

    /// Snaps both positions onto their nearest vertices and finds the shortest route
    /// between them. See [find_route](crate::find_route) for the meaning of `step_limit`.
    ///
    /// An empty graph yields an [unreachable](Route::unreachable) route.
    pub fn find_route(
        &self,
        from_lat: f64,
        from_lon: f64,
        to_lat: f64,
        to_lon: f64,
        step_limit: usize,
    ) -> Result<Route, RouteError> {
        self.find_route_with_cancel(
            from_lat,
            from_lon,
            to_lat,
            to_lon,
            step_limit,
            &AtomicBool::new(false),
        )
    }

    /// Same as [Map::find_route], but can be aborted by setting `cancel`.
    pub fn find_route_with_cancel(
        &self,
        from_lat: f64,
        from_lon: f64,
        to_lat: f64,
        to_lon: f64,
        step_limit: usize,
        cancel: &AtomicBool,
    ) -> Result<Route, RouteError> {
        let (from, to) = match (
            self.nearest_vertex(from_lat, from_lon),
            self.nearest_vertex(to_lat, to_lon),
        ) {
            (Some(from), Some(to)) => (from, to),
            _ => return Ok(Route::unreachable()),
        };

        log::debug!("snapped query to vertices {} and {}", from.id, to.id);
        find_route_with_cancel(&self.graph, from.id, to.id, step_limit, cancel)
    }

    /// Resolves vertex ids of a route into their positions, for highlighting.
    pub fn route_coordinates(&self, route: &Route) -> Vec<Point> {
        route
            .nodes
            .iter()
            .filter_map(|&id| self.graph.get_node(id))
            .collect()
    }
}
