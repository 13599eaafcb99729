// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Area assembly and routing over [OpenStreetMap](https://www.openstreetmap.org/) data.
//!
//! Raw OSM features are [classified](crate::osm::Classifier) by their tags and turned
//! into two products: filled [areas](crate::osm::Area) (buildings, water, land use),
//! with multipolygon relations stitched into outer rings and holes, and an undirected
//! weighted [Graph] of roads, over which Dijkstra's algorithm finds shortest paths.
//! One-way streets are supported as an opt-in [classifier](crate::osm::ONEWAY_CLASSIFIER)
//! setting.
//!
//! # Example
//!
//! ```no_run
//! let options = osmgeo::osm::Options {
//!     classifier: &osmgeo::osm::DEFAULT_CLASSIFIER,
//!     file_format: osmgeo::osm::FileFormat::Unknown,
//!     bbox: [0.0; 4],
//!     parallel: true,
//! };
//! let map = osmgeo::osm::load_from_file(&options, "path/to/monaco.osm")
//!     .expect("failed to load monaco.osm");
//!
//! println!("{} areas, {} road vertices", map.areas().len(), map.graph().len());
//!
//! let route = map
//!     .find_route(43.7384, 7.4246, 43.7478, 7.4323, osmgeo::DEFAULT_STEP_LIMIT)
//!     .expect("failed to find route");
//!
//! println!("Route: {:?} ({} km)", route.nodes, route.cost);
//! ```

mod distance;
mod graph;
mod kd;
pub mod osm;
mod route;

pub use distance::earth_distance;
pub use graph::Graph;
pub use kd::KDTree;
pub use route::{
    find_route, find_route_with_cancel, Route, RouteError, DEFAULT_STEP_LIMIT,
};

/// Represents an [OSM node](https://wiki.openstreetmap.org/wiki/Node), which
/// also serves as a vertex of the [Graph].
///
/// A point either has both coordinates set to finite, in-range values,
/// or is explicitly invalid ([Point::invalid]). Invalid points never end up
/// in [Areas](crate::osm::Area) or in the [Graph].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    pub id: i64,
    pub lat: f64,
    pub lon: f64,
}

impl Point {
    /// Creates a point with an invalid (NaN) position.
    pub const fn invalid(id: i64) -> Self {
        Self {
            id,
            lat: f64::NAN,
            lon: f64::NAN,
        }
    }

    /// Returns true if both coordinates are finite and within the WGS84 range.
    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lon.is_finite()
            && self.lat.abs() <= 90.0
            && self.lon.abs() <= 180.0
    }
}

/// Represents an outgoing connection from a specific [Point] in the [Graph].
///
/// `cost` is the great-circle distance between the two points, in kilometers,
/// and is never negative. Every edge remembers the way which produced it;
/// multiple edges between the same pair of points are kept apart.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Edge {
    pub to: i64,
    pub cost: f64,
    pub way_id: i64,
}
