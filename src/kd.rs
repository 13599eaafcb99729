// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use crate::distance::{meridian_distance_bound, parallel_distance_bound};
use crate::{earth_distance, Point};

/// KDTree implements the [k-d tree data structure](https://en.wikipedia.org/wiki/K-d_tree),
/// used to snap arbitrary positions onto the closest [Graph](crate::Graph) vertex without
/// computing the distance to every vertex, as [crate::Graph::find_nearest_node] does.
///
/// The tree alternates latitude and longitude splits. Branches are pruned using
/// lower bounds of the great-circle distance to the splitting parallel or meridian,
/// so results match a linear scan with [earth_distance], including the lowest-id
/// tie-break. The exception are datasets crossing the ante meridian (180°/-180° longitude),
/// where longitude splits do not separate points on a sphere.
#[derive(Debug, Clone)]
pub struct KDTree {
    pivot: Point,
    left: Option<Box<KDTree>>,
    right: Option<Box<KDTree>>,
}

impl KDTree {
    /// Finds the closest [Point] to the given position.
    /// If multiple points are equally close, the one with the lowest id is returned.
    pub fn find_nearest_node(&self, lat: f64, lon: f64) -> Point {
        self.find_nearest_node_impl(lat, lon, false).0
    }

    fn find_nearest_node_impl(&self, lat: f64, lon: f64, lon_divides: bool) -> (Point, f64) {
        // Start by assuming that pivot is the closest
        let mut best = self.pivot;
        let mut best_dist = earth_distance(lat, lon, best.lat, best.lon);

        // Select which branch to recurse into first
        let first_left = if lon_divides {
            lon < best.lon
        } else {
            lat < best.lat
        };
        let (first, second) = if first_left {
            (&self.left, &self.right)
        } else {
            (&self.right, &self.left)
        };

        // Recurse into the first branch
        if let Some(ref branch) = first {
            let (alt, alt_dist) = branch.find_nearest_node_impl(lat, lon, !lon_divides);
            if is_better(alt, alt_dist, best, best_dist) {
                best = alt;
                best_dist = alt_dist;
            }
        }

        // (Optionally) recurse into the second branch
        if let Some(ref branch) = second {
            // A closer (or equally close) point is possible in the second branch if and only if
            // the splitting axis is not further away than the current best candidate.
            let dist_to_axis = if lon_divides {
                meridian_distance_bound(lat, lon, self.pivot.lon)
            } else {
                parallel_distance_bound(lat, self.pivot.lat)
            };

            if dist_to_axis <= best_dist {
                let (alt, alt_dist) = branch.find_nearest_node_impl(lat, lon, !lon_divides);
                if is_better(alt, alt_dist, best, best_dist) {
                    best = alt;
                    best_dist = alt_dist;
                }
            }
        }

        (best, best_dist)
    }

    /// Builds a k-d tree from an iterable of [Points](Point).
    /// Returns `None` if there are no points.
    pub fn from_iter<I: IntoIterator<Item = Point>>(points: I) -> Option<Self> {
        let mut points = points.into_iter().collect::<Vec<_>>();
        Self::build(points.as_mut_slice())
    }

    /// Builds a k-d tree from a mutable slice of [Points](Point). Points will be reordered
    /// in the slice to facilitate building the tree.
    ///
    /// The provided slice must only contain valid points;
    /// this is checked with a `debug_assert!`.
    pub fn build(points: &mut [Point]) -> Option<Self> {
        debug_assert!(points.iter().all(|p| p.is_valid()));
        Self::build_impl(points, false)
    }

    fn build_impl(points: &mut [Point], lon_divides: bool) -> Option<Self> {
        match points.len() {
            0 => None,
            1 => Some(Self {
                pivot: points[0],
                left: None,
                right: None,
            }),
            _ => {
                if lon_divides {
                    points.sort_by(|a, b| a.lon.total_cmp(&b.lon).then(a.id.cmp(&b.id)));
                } else {
                    points.sort_by(|a, b| a.lat.total_cmp(&b.lat).then(a.id.cmp(&b.id)));
                }
                let median = points.len() / 2;
                let pivot = points[median];
                let (left, right_and_pivot) = points.split_at_mut(median);
                let right = &mut right_and_pivot[1..];
                Some(Self {
                    pivot,
                    left: Self::build_impl(left, !lon_divides).map(Box::new),
                    right: Self::build_impl(right, !lon_divides).map(Box::new),
                })
            }
        }
    }
}

#[inline]
fn is_better(candidate: Point, candidate_dist: f64, best: Point, best_dist: f64) -> bool {
    candidate_dist < best_dist || (candidate_dist == best_dist && candidate.id < best.id)
}
