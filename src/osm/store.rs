// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::{HashMap, HashSet};

use super::diagnostic::{report, Diagnostic};
use super::model::{Feature, Relation, Way};
use crate::Point;

/// Read-only snapshot of all features of a map, collected in a single forward pass.
///
/// Both area assembly and graph building only read from the store,
/// and can thus safely run at the same time.
#[derive(Debug, Default, Clone)]
pub struct EntityStore {
    points: HashMap<i64, Point>,
    clipped: HashSet<i64>,
    ways: Vec<Way>,
    way_index: HashMap<i64, usize>,
    relations: Vec<Relation>,
    bbox: Option<[f64; 4]>,
    pub(crate) diagnostics: Vec<Diagnostic>,
}

impl EntityStore {
    /// Creates an empty store. Points outside of the bounding box (left/min lon, bottom/min lat,
    /// right/max lon, top/max lat) are dropped. The bounding box is ignored if all values are
    /// zero, or at least one of them is not finite.
    pub fn new(bbox: [f64; 4]) -> Self {
        // TODO: Report bounding boxes with min > max instead of silently accepting them
        let ignore_bbox = bbox.iter().all(|&x| x == 0.0) || bbox.iter().any(|x| !x.is_finite());

        Self {
            bbox: if ignore_bbox { None } else { Some(bbox) },
            ..Self::default()
        }
    }

    /// Collects all features from an iterator, stopping on the first error.
    pub fn from_features<I, E>(bbox: [f64; 4], features: I) -> Result<Self, E>
    where
        I: IntoIterator<Item = Result<Feature, E>>,
    {
        let mut store = Self::new(bbox);
        for f in features {
            store.add_feature(f?);
        }
        log::info!(
            "loaded {} nodes, {} ways and {} relations",
            store.points.len(),
            store.ways.len(),
            store.relations.len(),
        );
        Ok(store)
    }

    pub fn add_feature(&mut self, f: Feature) {
        match f {
            Feature::Node(n) => self.add_point(n),
            Feature::Way(w) => self.add_way(w),
            Feature::Relation(r) => self.add_relation(r),
        }
    }

    /// Stores a point. Invalid points are kept (so that anything referencing them can be
    /// recognized as broken), but a [Diagnostic::InvalidCoordinate] is emitted.
    /// Points outside of the bounding box are only remembered as [clipped](Self::is_clipped).
    pub fn add_point(&mut self, p: Point) {
        if !p.is_valid() {
            report(&mut self.diagnostics, Diagnostic::InvalidCoordinate(p.id));
            self.points.insert(p.id, Point::invalid(p.id));
        } else if self.is_in_bbox(p.lat, p.lon) {
            self.clipped.remove(&p.id);
            self.points.insert(p.id, p);
        } else {
            self.points.remove(&p.id);
            self.clipped.insert(p.id);
        }
    }

    pub fn add_way(&mut self, w: Way) {
        self.way_index.insert(w.id, self.ways.len());
        self.ways.push(w);
    }

    pub fn add_relation(&mut self, r: Relation) {
        self.relations.push(r);
    }

    fn is_in_bbox(&self, lat: f64, lon: f64) -> bool {
        match self.bbox {
            None => true,
            Some([min_lon, min_lat, max_lon, max_lat]) => {
                lat >= min_lat && lat <= max_lat && lon >= min_lon && lon <= max_lon
            }
        }
    }

    /// Returns the point with a given id, but only if it exists and has a valid position.
    pub fn valid_point(&self, id: i64) -> Option<Point> {
        self.points.get(&id).filter(|p| p.is_valid()).copied()
    }

    /// Checks if a node was dropped by the bounding box filter.
    pub fn is_clipped(&self, id: i64) -> bool {
        self.clipped.contains(&id)
    }

    /// Returns a way with a given id. If a way was added multiple times,
    /// the last instance is returned.
    pub fn way(&self, id: i64) -> Option<&Way> {
        self.way_index.get(&id).map(|&idx| &self.ways[idx])
    }

    /// Returns all ways, in the order they were added.
    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    /// Returns all relations, in the order they were added.
    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }
}
