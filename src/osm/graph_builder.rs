// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::classify::{Classification, Classifier, RoadKind};
use super::diagnostic::{report, Diagnostic};
use super::model::Way;
use super::store::EntityStore;
use crate::{earth_distance, Edge, Graph, Point};

/// Line feature handed over for drawing: every classified road or rail way,
/// routable or not.
#[derive(Debug, Clone, PartialEq)]
pub struct Road {
    pub way_id: i64,
    pub kind: RoadKind,

    /// Positions of the way's nodes, in order. Nodes without a valid position are omitted.
    pub points: Vec<Point>,
}

/// Helper object used for converting ways from an [EntityStore] into a [Graph].
pub(crate) struct GraphBuilder<'a> {
    store: &'a EntityStore,
    classifier: &'a Classifier<'a>,
    g: Graph,
    roads: Vec<Road>,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> GraphBuilder<'a> {
    /// Create a new graph builder, with an empty graph.
    pub(crate) fn new(store: &'a EntityStore, classifier: &'a Classifier<'a>) -> Self {
        Self {
            store,
            classifier,
            g: Graph::default(),
            roads: Vec::default(),
            diagnostics: Vec::default(),
        }
    }

    /// Adds all road ways from the store.
    pub(crate) fn build(mut self) -> (Graph, Vec<Road>, Vec<Diagnostic>) {
        let store = self.store;
        for w in store.ways() {
            if let Classification::Road(kind) = self.classifier.classify_way(&w.tags) {
                self.add_way(w, kind);
            }
        }
        (self.g, self.roads, self.diagnostics)
    }

    fn add_way(&mut self, w: &Way, kind: RoadKind) {
        self.roads.push(Road {
            way_id: w.id,
            kind,
            points: w
                .nodes
                .iter()
                .filter_map(|&id| self.store.valid_point(id))
                .collect(),
        });

        if kind.is_routable() {
            let (forward, backward) = self.classifier.way_direction(&w.tags);
            self.create_edges(w, forward, backward);
        }
    }

    fn create_edges(&mut self, w: &Way, forward: bool, backward: bool) {
        for pair in w.nodes.windows(2) {
            // Repeated nodes don't make for a segment
            if pair[0] == pair[1] {
                continue;
            }

            let (left, right) = match (
                self.store.valid_point(pair[0]),
                self.store.valid_point(pair[1]),
            ) {
                (Some(left), Some(right)) => (left, right),
                _ if self.store.is_clipped(pair[0]) || self.store.is_clipped(pair[1]) => {
                    log::debug!(
                        "way {}: segment {}-{} outside of the bounding box",
                        w.id,
                        pair[0],
                        pair[1],
                    );
                    continue;
                }
                _ => {
                    report(
                        &mut self.diagnostics,
                        Diagnostic::EdgeSkipped {
                            way: w.id,
                            from: pair[0],
                            to: pair[1],
                        },
                    );
                    continue;
                }
            };

            let cost = earth_distance(left.lat, left.lon, right.lat, right.lon);

            self.g.set_node(left);
            self.g.set_node(right);

            if forward {
                self.g.add_edge(
                    left.id,
                    Edge {
                        to: right.id,
                        cost,
                        way_id: w.id,
                    },
                );
            }
            if backward {
                self.g.add_edge(
                    right.id,
                    Edge {
                        to: left.id,
                        cost,
                        way_id: w.id,
                    },
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm::{DEFAULT_CLASSIFIER, ONEWAY_CLASSIFIER};
    use crate::Point;
    use std::collections::HashMap;

    macro_rules! tags {
        {} => { HashMap::default() };
        {$( $k:literal : $v:literal ),+} => {
            HashMap::from_iter([ $( ($k.to_string(), $v.to_string()) ),+ ])
        };
    }

    fn store(points: &[(i64, f64, f64)], ways: Vec<Way>) -> EntityStore {
        let mut s = EntityStore::new([0.0; 4]);
        for &(id, lat, lon) in points {
            s.add_point(Point { id, lat, lon });
        }
        for w in ways {
            s.add_way(w);
        }
        s
    }

    #[test]
    fn motorway_and_footway() {
        let s = store(
            &[(1, 0.0, 0.0), (2, 1.0, 0.0), (3, 2.0, 0.0)],
            vec![
                Way {
                    id: 10,
                    nodes: vec![1, 2],
                    tags: tags! {"highway": "motorway"},
                },
                Way {
                    id: 11,
                    nodes: vec![2, 3],
                    tags: tags! {"highway": "footway"},
                },
            ],
        );

        let (g, roads, diagnostics) = GraphBuilder::new(&s, &DEFAULT_CLASSIFIER).build();
        assert!(diagnostics.is_empty());
        assert_eq!(roads.len(), 2);
        assert_eq!(g.len(), 3);
        assert_eq!(g.edge_count(), 4);

        assert_eq!(g.get_edge(1, 2), earth_distance(0.0, 0.0, 1.0, 0.0));
        assert_eq!(g.get_edge(2, 1), earth_distance(0.0, 0.0, 1.0, 0.0));
        assert_eq!(g.get_edge(2, 3), earth_distance(1.0, 0.0, 2.0, 0.0));
        assert_eq!(g.get_edges(1)[0].way_id, 10);
        assert_eq!(g.get_edges(3)[0].way_id, 11);
    }

    #[test]
    fn every_segment_becomes_an_edge() {
        let points = [
            (1, 52.0, 21.0),
            (2, 52.001, 21.002),
            (3, 52.003, 21.002),
            (4, 52.004, 21.0),
        ];
        let s = store(
            &points,
            vec![Way {
                id: 10,
                nodes: vec![1, 2, 3, 4, 1],
                tags: tags! {"highway": "residential"},
            }],
        );

        let (g, _, _) = GraphBuilder::new(&s, &DEFAULT_CLASSIFIER).build();
        assert_eq!(g.len(), 4);
        for pair in [1, 2, 3, 4, 1].windows(2) {
            let a = g.get_node(pair[0]).unwrap();
            let b = g.get_node(pair[1]).unwrap();
            let expected = earth_distance(a.lat, a.lon, b.lat, b.lon);
            assert_eq!(g.get_edge(a.id, b.id), expected);
            assert_eq!(g.get_edge(b.id, a.id), expected);
        }
    }

    #[test]
    fn shared_nodes_and_parallel_edges() {
        let s = store(
            &[(1, 0.0, 0.0), (2, 0.0, 0.01), (3, 0.01, 0.0)],
            vec![
                Way {
                    id: 10,
                    nodes: vec![1, 2],
                    tags: tags! {"highway": "primary"},
                },
                Way {
                    id: 11,
                    nodes: vec![1, 2, 3],
                    tags: tags! {"highway": "service"},
                },
            ],
        );

        let (g, _, _) = GraphBuilder::new(&s, &DEFAULT_CLASSIFIER).build();
        assert_eq!(g.len(), 3);
        let from_1: Vec<i64> = g.get_edges(1).iter().map(|e| e.way_id).collect();
        assert_eq!(from_1, vec![10, 11]);
        assert!(g.get_edges(1).iter().all(|e| e.to == 2));
    }

    #[test]
    fn non_routable_and_unclassified_ways() {
        let s = store(
            &[(1, 0.0, 0.0), (2, 0.0, 0.01), (3, 0.01, 0.0)],
            vec![
                Way {
                    id: 10,
                    nodes: vec![1, 2],
                    tags: tags! {"railway": "rail"},
                },
                Way {
                    id: 11,
                    nodes: vec![2, 3],
                    tags: tags! {"barrier": "fence"},
                },
                Way {
                    id: 12,
                    nodes: vec![1, 3, 2, 1],
                    tags: tags! {"building": "yes"},
                },
            ],
        );

        let (g, roads, _) = GraphBuilder::new(&s, &DEFAULT_CLASSIFIER).build();
        assert!(g.is_empty());
        assert_eq!(roads.len(), 1);
        assert_eq!(roads[0].kind, RoadKind::Railway);
    }

    #[test]
    fn invalid_points_skip_segments() {
        let mut s = store(
            &[(1, 0.0, 0.0), (2, 0.0, 0.01), (4, 0.0, 0.03)],
            vec![Way {
                id: 10,
                nodes: vec![1, 2, 3, 4],
                tags: tags! {"highway": "tertiary"},
            }],
        );
        s.add_point(Point::invalid(3));

        let (g, roads, diagnostics) = GraphBuilder::new(&s, &DEFAULT_CLASSIFIER).build();
        assert_eq!(g.len(), 2);
        assert!(g.get_node(4).is_none());
        assert_eq!(roads[0].points.len(), 3);
        assert_eq!(
            diagnostics,
            vec![
                Diagnostic::EdgeSkipped {
                    way: 10,
                    from: 2,
                    to: 3
                },
                Diagnostic::EdgeSkipped {
                    way: 10,
                    from: 3,
                    to: 4
                },
            ],
        );
    }

    #[test]
    fn clipped_segments_are_skipped_quietly() {
        let mut s = EntityStore::new([-1.0, -1.0, 1.0, 1.0]);
        s.add_point(Point::invalid(1));
        s.add_point(Point { id: 2, lat: 0.0, lon: 0.0 });
        s.add_point(Point { id: 3, lat: 0.0, lon: 0.5 });
        s.add_point(Point { id: 4, lat: 0.0, lon: 2.0 });
        s.add_way(Way {
            id: 10,
            nodes: vec![1, 2, 3, 4],
            tags: tags! {"highway": "secondary"},
        });

        let (g, roads, diagnostics) = GraphBuilder::new(&s, &DEFAULT_CLASSIFIER).build();
        assert_eq!(g.len(), 2);
        assert_eq!(g.edge_count(), 2);
        assert_eq!(roads[0].points.len(), 2);

        // Only the segment with a broken node is reported, 3-4 was cut off by the bbox
        assert_eq!(
            diagnostics,
            vec![Diagnostic::EdgeSkipped {
                way: 10,
                from: 1,
                to: 2
            }],
        );
    }

    #[test]
    fn oneway() {
        let s = store(
            &[(1, 0.0, 0.0), (2, 0.0, 0.01), (3, 0.01, 0.0)],
            vec![
                Way {
                    id: 10,
                    nodes: vec![1, 2],
                    tags: tags! {"highway": "primary", "oneway": "yes"},
                },
                Way {
                    id: 11,
                    nodes: vec![2, 3],
                    tags: tags! {"highway": "primary", "oneway": "-1"},
                },
            ],
        );

        let (g, _, _) = GraphBuilder::new(&s, &DEFAULT_CLASSIFIER).build();
        assert_eq!(g.edge_count(), 4);

        let (g, _, _) = GraphBuilder::new(&s, &ONEWAY_CLASSIFIER).build();
        assert_eq!(g.edge_count(), 2);
        assert!(g.get_edge(1, 2).is_finite());
        assert!(g.get_edge(2, 1).is_infinite());
        assert!(g.get_edge(3, 2).is_finite());
        assert!(g.get_edge(2, 3).is_infinite());
    }
}
