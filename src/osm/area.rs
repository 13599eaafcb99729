// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashSet;

use super::classify::{Classification, Classifier, PolygonKind};
use super::diagnostic::{report, Diagnostic, RingDefect};
use super::model::{FeatureType, Relation, Role, Way};
use super::store::EntityStore;
use crate::Point;

/// Closed sequence of points: the first and the last point are always the same.
///
/// Points are copied out of the source ways, so rings stay valid
/// after the [EntityStore] is dropped.
#[derive(Debug, Clone, PartialEq)]
pub struct Ring(Vec<Point>);

impl Ring {
    pub fn points(&self) -> &[Point] {
        &self.0
    }

    /// Returns the ids of all points in the ring, in order.
    pub fn node_ids(&self) -> impl Iterator<Item = i64> + '_ {
        self.0.iter().map(|p| p.id)
    }

    /// Checks if a position lies inside the ring using the even-odd rule,
    /// treating longitude and latitude as planar coordinates.
    ///
    /// Positions exactly on the boundary may be classified either way.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        let mut inside = false;
        for pair in self.0.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if (a.lat > lat) != (b.lat > lat) {
                let crossing_lon = a.lon + (lat - a.lat) * (b.lon - a.lon) / (b.lat - a.lat);
                if lon < crossing_lon {
                    inside = !inside;
                }
            }
        }
        inside
    }

    /// Checks if another ring lies inside this ring. Only a single point of `other` is tested:
    /// the first one which is not shared with this ring (inner rings may touch outer rings).
    pub fn contains_ring(&self, other: &Ring) -> bool {
        let own: HashSet<i64> = self.node_ids().collect();
        let probe = other
            .0
            .iter()
            .find(|p| !own.contains(&p.id))
            .or(other.0.first());

        match probe {
            Some(p) => self.contains(p.lat, p.lon),
            None => false,
        }
    }

    /// Returns the absolute planar area of the ring, in square degrees (shoelace formula).
    pub fn planar_area(&self) -> f64 {
        let twice_area: f64 = self
            .0
            .windows(2)
            .map(|pair| pair[0].lon * pair[1].lat - pair[1].lon * pair[0].lat)
            .sum();
        twice_area.abs() * 0.5
    }
}

/// Type of the feature an [Area] was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AreaSource {
    Way,
    Relation,
}

/// Filled polygon: an outer ring with zero or more holes inside it.
#[derive(Debug, Clone, PartialEq)]
pub struct Area {
    /// Id of the way or relation this area comes from. A relation with multiple
    /// outer rings produces multiple areas with the same id.
    pub id: i64,
    pub source: AreaSource,
    pub kind: PolygonKind,
    pub outer: Ring,
    pub inners: Vec<Ring>,
}

/// Turns a closed way into an [Area] without holes.
pub fn assemble_way(w: &Way, kind: PolygonKind, store: &EntityStore) -> Result<Area, Diagnostic> {
    let defective = |defect| Diagnostic::MalformedRing {
        type_: FeatureType::Way,
        id: w.id,
        defect,
    };

    if !w.is_closed() {
        return Err(defective(RingDefect::NotClosed));
    }

    let outer = resolve_ring(&w.nodes, store).map_err(defective)?;
    Ok(Area {
        id: w.id,
        source: AreaSource::Way,
        kind,
        outer,
        inners: Vec::new(),
    })
}

/// Turns a [multipolygon relation](https://wiki.openstreetmap.org/wiki/Relation:multipolygon)
/// into [Areas](Area), one per outer ring.
///
/// Member ways are stitched into closed rings separately for outer (and unspecified)
/// and inner roles. Every inner ring is then assigned to the smallest outer ring which
/// contains it. Problems are appended to `diagnostics`; whatever could be assembled
/// is still returned.
pub fn assemble_relation(
    r: &Relation,
    kind: PolygonKind,
    store: &EntityStore,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<Area> {
    let mut outer_fragments: Vec<(i64, &[i64])> = Vec::new();
    let mut inner_fragments: Vec<(i64, &[i64])> = Vec::new();

    for m in r.members.iter().filter(|m| m.type_ == FeatureType::Way) {
        let w = match store.way(m.ref_) {
            Some(w) => w,
            None => {
                report(diagnostics, malformed(r, RingDefect::UnknownWay(m.ref_)));
                continue;
            }
        };

        if w.nodes.len() < 2 {
            report(diagnostics, malformed(r, RingDefect::TooFewPoints));
            continue;
        }

        match m.role {
            Role::Inner => inner_fragments.push((w.id, w.nodes.as_slice())),
            Role::Outer | Role::Unspecified => outer_fragments.push((w.id, w.nodes.as_slice())),
        }
    }

    let outers_clipped = outer_fragments
        .iter()
        .any(|(_, nodes)| nodes.iter().any(|&id| store.is_clipped(id)));
    let outers: Vec<Ring> = build_rings(r, &outer_fragments, store, diagnostics)
        .into_iter()
        .map(|(ring, _)| ring)
        .collect();
    let inners = build_rings(r, &inner_fragments, store, diagnostics);

    let mut holes: Vec<Vec<Ring>> = vec![Vec::new(); outers.len()];
    for (inner, way_ids) in inners {
        let container = outers
            .iter()
            .enumerate()
            .filter(|(_, outer)| outer.contains_ring(&inner))
            .min_by(|(_, a), (_, b)| a.planar_area().total_cmp(&b.planar_area()))
            .map(|(outer_idx, _)| outer_idx);

        match container {
            Some(outer_idx) => holes[outer_idx].push(inner),
            None if outers_clipped => log::debug!(
                "relation {}: inner ring of ways {:?} dropped with the bounding box",
                r.id,
                way_ids,
            ),
            None => report(
                diagnostics,
                Diagnostic::OrphanHole {
                    relation: r.id,
                    ways: way_ids,
                },
            ),
        }
    }

    outers
        .into_iter()
        .zip(holes)
        .map(|(outer, inners)| Area {
            id: r.id,
            source: AreaSource::Relation,
            kind,
            outer,
            inners,
        })
        .collect()
}

fn malformed(r: &Relation, defect: RingDefect) -> Diagnostic {
    Diagnostic::MalformedRing {
        type_: FeatureType::Relation,
        id: r.id,
        defect,
    }
}

/// Stitches fragments into rings and resolves their positions,
/// reporting (and skipping) anything malformed. Every ring comes with
/// the ids of the ways it was made of.
fn build_rings(
    r: &Relation,
    fragments: &[(i64, &[i64])],
    store: &EntityStore,
    diagnostics: &mut Vec<Diagnostic>,
) -> Vec<(Ring, Vec<i64>)> {
    let (rings, unclosed) = stitch(fragments);

    for way_ids in unclosed {
        report(diagnostics, malformed(r, RingDefect::Unclosed(way_ids)));
    }

    rings
        .into_iter()
        .filter_map(|(nodes, way_ids)| match resolve_ring(&nodes, store) {
            Ok(ring) => Some((ring, way_ids)),
            Err(defect) => {
                report(diagnostics, malformed(r, defect));
                None
            }
        })
        .collect()
}

/// Upper bound on the candidates tried while closing a single ring.
const MAX_STITCH_ATTEMPTS: usize = 10_000;

fn is_closed(nodes: &[i64]) -> bool {
    nodes.len() >= 2 && nodes.first() == nodes.last()
}

/// Joins way fragments (way id and node ids) into closed sequences of node ids.
///
/// Closed fragments are rings on their own. Open fragments are chained, starting from
/// the first unused one, by appending fragments which start (or end) at the current last node.
/// Candidates closing the ring come first, the rest are tried in the order of `fragments`,
/// backtracking out of dead ends. Rings never pass through the same node twice.
///
/// Returns the closed rings (with ids of their ways) and, grouped into chains,
/// ids of ways which are not part of any ring.
fn stitch(fragments: &[(i64, &[i64])]) -> (Vec<(Vec<i64>, Vec<i64>)>, Vec<Vec<i64>>) {
    let mut used = vec![false; fragments.len()];
    let mut rings = Vec::new();

    for start in 0..fragments.len() {
        if used[start] {
            continue;
        }

        let (id, nodes) = fragments[start];
        if is_closed(nodes) {
            used[start] = true;
            rings.push((nodes.to_vec(), vec![id]));
            continue;
        }

        let mut stitcher = Stitcher {
            fragments,
            used: &mut used,
            ring: nodes.to_vec(),
            on_ring: nodes.iter().copied().collect(),
            chain: vec![start],
            attempts: MAX_STITCH_ATTEMPTS,
        };

        if stitcher.on_ring.len() == nodes.len() {
            stitcher.used[start] = true;
            if stitcher.close() {
                let way_ids = stitcher.chain.iter().map(|&idx| fragments[idx].0).collect();
                rings.push((stitcher.ring, way_ids));
            } else {
                stitcher.used[start] = false;
            }
        }
    }

    (rings, leftover_chains(fragments, &mut used))
}

/// State of the search for a single ring.
struct Stitcher<'a, 'f> {
    fragments: &'a [(i64, &'f [i64])],
    used: &'a mut [bool],
    ring: Vec<i64>,
    on_ring: HashSet<i64>,
    chain: Vec<usize>,
    attempts: usize,
}

impl Stitcher<'_, '_> {
    /// Extends the ring until it ends at its first node. On failure,
    /// the ring and the used fragments are left as they were.
    fn close(&mut self) -> bool {
        let (Some(&first), Some(&last)) = (self.ring.first(), self.ring.last()) else {
            return false;
        };

        let mut candidates: Vec<(usize, bool)> = self
            .fragments
            .iter()
            .enumerate()
            .filter_map(|(idx, &(_, nodes))| {
                if self.used[idx] || is_closed(nodes) {
                    None
                } else if nodes.first() == Some(&last) {
                    Some((idx, false))
                } else if nodes.last() == Some(&last) {
                    Some((idx, true))
                } else {
                    None
                }
            })
            .collect();

        // Stable sort: fragments closing the ring first, otherwise in member order
        candidates.sort_by_key(|&(idx, reversed)| {
            let nodes = self.fragments[idx].1;
            let far_end = if reversed { nodes.first() } else { nodes.last() };
            far_end != Some(&first)
        });

        for (idx, reversed) in candidates {
            if self.attempts == 0 {
                return false;
            }
            self.attempts -= 1;

            let nodes = self.fragments[idx].1;
            let added: Vec<i64> = if reversed {
                nodes.iter().rev().skip(1).copied().collect()
            } else {
                nodes.iter().skip(1).copied().collect()
            };
            let closes = added.last() == Some(&first);
            let interior = if closes { &added[..added.len() - 1] } else { &added[..] };

            let mut inserted = 0;
            while inserted < interior.len() && self.on_ring.insert(interior[inserted]) {
                inserted += 1;
            }

            if inserted == interior.len() {
                let len_before = self.ring.len();
                self.used[idx] = true;
                self.ring.extend_from_slice(&added);
                self.chain.push(idx);

                if closes || self.close() {
                    return true;
                }

                self.chain.pop();
                self.ring.truncate(len_before);
                self.used[idx] = false;
            }

            for node in &interior[..inserted] {
                self.on_ring.remove(node);
            }
        }

        false
    }
}

/// Greedily groups fragments which didn't end up in any ring into chains of way ids.
fn leftover_chains(fragments: &[(i64, &[i64])], used: &mut [bool]) -> Vec<Vec<i64>> {
    let mut chains = Vec::new();

    for start in 0..fragments.len() {
        if used[start] {
            continue;
        }
        used[start] = true;

        let mut chain = vec![fragments[start].0];
        let mut last = fragments[start].1.last().copied();

        while let Some(node) = last {
            let next = fragments.iter().enumerate().find_map(|(idx, &(_, nodes))| {
                if used[idx] {
                    None
                } else if nodes.first() == Some(&node) {
                    Some((idx, nodes.last()))
                } else if nodes.last() == Some(&node) {
                    Some((idx, nodes.first()))
                } else {
                    None
                }
            });

            match next {
                Some((idx, far_end)) => {
                    used[idx] = true;
                    chain.push(fragments[idx].0);
                    last = far_end.copied();
                }
                None => last = None,
            }
        }

        chains.push(chain);
    }

    chains
}

/// Turns a closed sequence of node ids into a [Ring]. Fails if any node has no
/// valid position, or if there are fewer than 3 distinct nodes.
fn resolve_ring(nodes: &[i64], store: &EntityStore) -> Result<Ring, RingDefect> {
    debug_assert!(nodes.len() >= 2 && nodes.first() == nodes.last());

    let distinct: HashSet<i64> = nodes.iter().copied().collect();
    if distinct.len() < 3 {
        return Err(RingDefect::TooFewPoints);
    }

    nodes
        .iter()
        .map(|&id| match store.valid_point(id) {
            Some(p) => Ok(p),
            None if store.is_clipped(id) => Err(RingDefect::OutsideBbox(id)),
            None => Err(RingDefect::InvalidPoint(id)),
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Ring)
}

/// Builds [Areas](Area) out of all polygon-like ways and relations in a store.
pub(crate) struct AreaAssembler<'a> {
    store: &'a EntityStore,
    classifier: &'a Classifier<'a>,
    areas: Vec<Area>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> AreaAssembler<'a> {
    pub(crate) fn new(store: &'a EntityStore, classifier: &'a Classifier<'a>) -> Self {
        Self {
            store,
            classifier,
            areas: Vec::default(),
            diagnostics: Vec::default(),
        }
    }

    pub(crate) fn assemble(mut self) -> (Vec<Area>, Vec<Diagnostic>) {
        let store = self.store;

        for w in store.ways() {
            if let Classification::Polygon(kind) = self.classifier.classify_way(&w.tags) {
                match assemble_way(w, kind, store) {
                    Ok(area) => self.areas.push(area),
                    Err(d) => report(&mut self.diagnostics, d),
                }
            }
        }

        for r in store.relations() {
            if let Classification::Polygon(kind) = self.classifier.classify_relation(&r.tags) {
                let areas = assemble_relation(r, kind, store, &mut self.diagnostics);
                self.areas.extend(areas);
            }
        }

        (self.areas, self.diagnostics)
    }
}
