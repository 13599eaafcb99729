// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

mod area;
mod classify;
mod diagnostic;
mod graph_builder;
mod map;
mod model;
mod reader;
mod store;
mod style;

pub use area::{assemble_relation, assemble_way, Area, AreaSource, Ring};
pub use classify::{
    Classification, Classifier, PolygonKind, RoadKind, Rule, DEFAULT_CLASSIFIER,
    ONEWAY_CLASSIFIER,
};
pub use diagnostic::{Diagnostic, RingDefect};
pub use graph_builder::Road;
pub use map::{Map, LINEAR_SCAN_LIMIT};
pub use model::{Feature, FeatureType, Relation, RelationMember, Role, Way};
pub use reader::{load_from_buffer, load_from_file, load_from_io, Error, FileFormat, Options};
pub use store::EntityStore;
pub use style::{Rgb, Stroke, ROUTE_STROKE, ROUTE_Z_ORDER};

#[cfg(test)]
mod tests {
    use super::*;
    use crate::DEFAULT_STEP_LIMIT;

    macro_rules! assert_almost_eq {
        ($a:expr, $b:expr) => {
            assert!(
                (($a - $b).abs() < 1e-4),
                "assertion failed: {} ≈ {}",
                $a,
                $b
            )
        };
    }

    macro_rules! assert_edge {
        ($graph:expr, $from:expr, $to:expr) => {
            assert!($graph.get_edge($from, $to).is_finite());
        };
    }

    macro_rules! assert_no_edge {
        ($graph:expr, $from:expr, $to:expr) => {
            assert!($graph.get_edge($from, $to).is_infinite());
        };
    }

    const SIMPLE_XML: &[u8] = include_bytes!("reader/test_fixtures/simple.osm");
    const SIMPLE_XML_GZ: &[u8] = include_bytes!("reader/test_fixtures/simple.osm.gz");
    const SIMPLE_XML_BZ2: &[u8] = include_bytes!("reader/test_fixtures/simple.osm.bz2");

    fn options(file_format: FileFormat) -> Options<'static> {
        Options {
            file_format,
            ..Options::default()
        }
    }

    fn check_simple_map(m: &Map) {
        //      3
        //      │ \
        //      │  (rail)
        //      │    \
        //      2 ──> 4     5 ── 6
        //      │
        //      1
        //
        // plus a lake with an island, a building, a broken meadow and a broken forest

        let g = m.graph();
        assert_eq!(g.len(), 6);
        assert_eq!(g.edge_count(), 8);
        assert_almost_eq!(g.get_edge(1, 2), 1.1119508);
        assert_eq!(g.get_edge(1, 2), g.get_edge(2, 1));
        assert_edge!(g, 2, 4);
        assert_edge!(g, 4, 2);
        assert_no_edge!(g, 3, 4);
        assert_no_edge!(g, 4, 3);

        let roads: Vec<(i64, RoadKind)> = m.roads().iter().map(|r| (r.way_id, r.kind)).collect();
        assert_eq!(
            roads,
            vec![
                (100, RoadKind::Motorway),
                (101, RoadKind::Footway),
                (102, RoadKind::Residential),
                (103, RoadKind::Railway),
                (104, RoadKind::Service),
            ],
        );

        let areas = m.areas();
        assert_eq!(areas.len(), 2);

        assert_eq!(areas[0].id, 120);
        assert_eq!(areas[0].source, AreaSource::Way);
        assert_eq!(areas[0].kind, PolygonKind::Building);
        assert_eq!(
            areas[0].outer.node_ids().collect::<Vec<_>>(),
            vec![20, 21, 22, 23, 20]
        );

        assert_eq!(areas[1].id, 200);
        assert_eq!(areas[1].source, AreaSource::Relation);
        assert_eq!(areas[1].kind, PolygonKind::Water);
        assert_eq!(
            areas[1].outer.node_ids().collect::<Vec<_>>(),
            vec![10, 11, 12, 13, 10]
        );
        assert_eq!(areas[1].inners.len(), 1);
        assert_eq!(
            areas[1].inners[0].node_ids().collect::<Vec<_>>(),
            vec![14, 15, 16, 14]
        );

        assert_eq!(
            m.diagnostics(),
            &[
                Diagnostic::InvalidCoordinate(30),
                Diagnostic::MalformedRing {
                    type_: FeatureType::Way,
                    id: 121,
                    defect: RingDefect::InvalidPoint(30),
                },
                Diagnostic::OrphanHole {
                    relation: 200,
                    ways: vec![113],
                },
                Diagnostic::MalformedRing {
                    type_: FeatureType::Relation,
                    id: 201,
                    defect: RingDefect::Unclosed(vec![122]),
                },
            ],
        );
    }

    #[test]
    fn load_xml_from_buffer() -> Result<(), Error> {
        let m = load_from_buffer(&options(FileFormat::Xml), SIMPLE_XML)?;
        check_simple_map(&m);
        Ok(())
    }

    #[test]
    fn load_xml_from_io() -> Result<(), Error> {
        let m = load_from_io(&options(FileFormat::Xml), SIMPLE_XML)?;
        check_simple_map(&m);
        Ok(())
    }

    #[test]
    fn load_xml_gz() -> Result<(), Error> {
        let m = load_from_buffer(&options(FileFormat::XmlGz), SIMPLE_XML_GZ)?;
        check_simple_map(&m);
        Ok(())
    }

    #[test]
    fn load_xml_bz2() -> Result<(), Error> {
        let m = load_from_buffer(&options(FileFormat::XmlBz2), SIMPLE_XML_BZ2)?;
        check_simple_map(&m);
        Ok(())
    }

    #[test]
    fn load_with_format_detection() -> Result<(), Error> {
        for data in [SIMPLE_XML, SIMPLE_XML_GZ, SIMPLE_XML_BZ2] {
            check_simple_map(&load_from_buffer(&options(FileFormat::Unknown), data)?);
            check_simple_map(&load_from_io(&options(FileFormat::Unknown), data)?);
        }
        Ok(())
    }

    #[test]
    fn load_from_file_path() -> Result<(), Error> {
        let path = concat!(
            env!("CARGO_MANIFEST_DIR"),
            "/src/osm/reader/test_fixtures/simple.osm.gz"
        );
        check_simple_map(&load_from_file(&options(FileFormat::Unknown), path)?);

        let missing = load_from_file(&options(FileFormat::Unknown), "/does/not/exist.osm");
        assert!(matches!(missing, Err(Error::Io(_))));
        Ok(())
    }

    #[test]
    fn sequential_load() -> Result<(), Error> {
        let options = Options {
            parallel: false,
            ..options(FileFormat::Xml)
        };
        check_simple_map(&load_from_buffer(&options, SIMPLE_XML)?);
        Ok(())
    }

    #[test]
    fn routing() -> Result<(), Error> {
        let m = load_from_buffer(&options(FileFormat::Xml), SIMPLE_XML)?;

        let r = m.find_route(0.0, 0.0, 0.0201, -0.0001, DEFAULT_STEP_LIMIT).unwrap();
        assert_eq!(r.nodes, vec![1, 2, 3]);
        assert_almost_eq!(r.cost, 2.2239016);

        let r = m.find_route(0.011, 0.011, 0.0, 0.0, DEFAULT_STEP_LIMIT).unwrap();
        assert_eq!(r.nodes, vec![4, 2, 1]);

        let r = m.find_route(0.0, 0.0, 0.05, 0.05, DEFAULT_STEP_LIMIT).unwrap();
        assert!(!r.is_reachable());
        assert_eq!(r.cost, f64::INFINITY);
        assert!(m.route_coordinates(&r).is_empty());
        Ok(())
    }

    #[test]
    fn oneway_routing() -> Result<(), Error> {
        let options = Options {
            classifier: &ONEWAY_CLASSIFIER,
            ..options(FileFormat::Xml)
        };
        let m = load_from_buffer(&options, SIMPLE_XML)?;
        let g = m.graph();

        assert_eq!(g.edge_count(), 7);
        assert_edge!(g, 2, 4);
        assert_no_edge!(g, 4, 2);

        let r = m.find_route(0.0, 0.0, 0.01, 0.01, DEFAULT_STEP_LIMIT).unwrap();
        assert_eq!(r.nodes, vec![1, 2, 4]);

        let r = m.find_route(0.01, 0.01, 0.0, 0.0, DEFAULT_STEP_LIMIT).unwrap();
        assert!(!r.is_reachable());
        Ok(())
    }

    #[test]
    fn bbox_filtering() -> Result<(), Error> {
        let options = Options {
            bbox: [-0.001, -0.001, 0.03, 0.03],
            ..options(FileFormat::Xml)
        };
        let m = load_from_buffer(&options, SIMPLE_XML)?;

        assert_eq!(m.graph().len(), 4);
        assert!(m.graph().get_node(5).is_none());
        assert!(m.areas().is_empty());

        // Features cut off by the bounding box are not reported,
        // but genuinely broken ones still are
        assert_eq!(
            m.diagnostics(),
            &[
                Diagnostic::InvalidCoordinate(30),
                Diagnostic::MalformedRing {
                    type_: FeatureType::Way,
                    id: 121,
                    defect: RingDefect::InvalidPoint(30),
                },
                Diagnostic::MalformedRing {
                    type_: FeatureType::Relation,
                    id: 201,
                    defect: RingDefect::Unclosed(vec![122]),
                },
            ],
        );
        Ok(())
    }
}
