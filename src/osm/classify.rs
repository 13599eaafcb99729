// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use std::collections::HashMap;

/// Kind of a filled area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PolygonKind {
    Building,
    Water,
    Grass,
    Forest,
    Industrial,
    Leisure,
    Railway,
    Commercial,
    Residential,
}

/// Kind of a linear road (or rail) feature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoadKind {
    Motorway,
    Trunk,
    Primary,
    Secondary,
    Tertiary,
    Residential,
    Service,
    Footway,
    Unclassified,
    Railway,
}

impl RoadKind {
    /// Returns true if ways of this kind are used to build the routing [Graph](crate::Graph).
    pub fn is_routable(self) -> bool {
        !matches!(self, Self::Railway)
    }
}

/// Result of interpreting the tags of a single OSM feature.
///
/// Unclassified features are excluded from both area assembly and the routing graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Classification {
    Polygon(PolygonKind),
    Road(RoadKind),
    Unclassified,
}

impl Classification {
    /// Returns the road kind, if this classification describes a routable road.
    pub fn routable_road(self) -> Option<RoadKind> {
        match self {
            Self::Road(kind) if kind.is_routable() => Some(kind),
            _ => None,
        }
    }
}

/// Single entry of a [Classifier] table.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule<'a> {
    /// Tag key which needs to be present for the rule to match, e.g. "building" or "highway".
    pub key: &'a str,

    /// Required value under [Rule::key]. `None` matches any value.
    pub value: Option<&'a str>,

    /// Classification assigned if this is the first matching rule.
    pub class: Classification,
}

/// Describes how to interpret OSM tags as [Classifications](Classification).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Classifier<'a> {
    /// Human readable name of the classifier.
    pub name: &'a str,

    /// Priority-ordered rules. A feature is matched against all rules in order,
    /// and the first match wins.
    pub rules: &'a [Rule<'a>],

    /// Values of the relation `type` tag which describe areas,
    /// usually "multipolygon".
    pub relation_types: &'a [&'a str],

    /// Respect `oneway` and `junction=roundabout` tags when building the graph.
    /// Disabled by default, in which case all roads are traversable both ways.
    pub honor_oneway: bool,
}

impl<'a> Classifier<'a> {
    /// Classifies a way by its tags. The first matching [Rule] wins.
    pub fn classify_way(&self, tags: &HashMap<String, String>) -> Classification {
        self.rules
            .iter()
            .find(|r| Self::matches(r, tags))
            .map(|r| r.class)
            .unwrap_or(Classification::Unclassified)
    }

    /// Classifies a relation by its tags. Only area relations
    /// (see [Classifier::relation_types]) and polygon rules are considered.
    pub fn classify_relation(&self, tags: &HashMap<String, String>) -> Classification {
        let is_area = tags
            .get("type")
            .is_some_and(|t| self.relation_types.contains(&t.as_str()));
        if !is_area {
            return Classification::Unclassified;
        }

        self.rules
            .iter()
            .filter(|r| matches!(r.class, Classification::Polygon(_)))
            .find(|r| Self::matches(r, tags))
            .map(|r| r.class)
            .unwrap_or(Classification::Unclassified)
    }

    fn matches(rule: &Rule<'_>, tags: &HashMap<String, String>) -> bool {
        match (tags.get(rule.key), rule.value) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(v), Some(expected)) => v == expected,
        }
    }

    /// Checks if a way is traversable forward (first return value) and
    /// backwards (second return value).
    ///
    /// Always returns `(true, true)` unless [Classifier::honor_oneway] is set.
    pub fn way_direction(&self, tags: &HashMap<String, String>) -> (bool, bool) {
        if !self.honor_oneway {
            return (true, true);
        }

        let mut forward = true;
        let mut backward = true;

        if let Some("roundabout" | "circular") = tags.get("junction").map(|s| s.as_str()) {
            backward = false;
        }

        match tags.get("oneway").map(|s| s.as_str()).unwrap_or("") {
            "yes" | "true" | "1" => {
                forward = true;
                backward = false;
            }

            "-1" | "reverse" => {
                forward = false;
                backward = true;
            }

            "no" => {
                forward = true;
                backward = true;
            }

            _ => {}
        }

        (forward, backward)
    }
}

macro_rules! rule {
    ($key:literal, $class:expr) => {
        Rule {
            key: $key,
            value: None,
            class: $class,
        }
    };
    ($key:literal = $value:literal, $class:expr) => {
        Rule {
            key: $key,
            value: Some($value),
            class: $class,
        }
    };
}

use Classification::{Polygon, Road};

/// Default rules: buildings, then roads, then rail lines, then land cover.
pub const DEFAULT_CLASSIFIER: Classifier = Classifier {
    name: "default",
    rules: &[
        rule!("building", Polygon(PolygonKind::Building)),
        rule!("highway" = "motorway", Road(RoadKind::Motorway)),
        rule!("highway" = "motorway_link", Road(RoadKind::Motorway)),
        rule!("highway" = "trunk", Road(RoadKind::Trunk)),
        rule!("highway" = "trunk_link", Road(RoadKind::Trunk)),
        rule!("highway" = "primary", Road(RoadKind::Primary)),
        rule!("highway" = "primary_link", Road(RoadKind::Primary)),
        rule!("highway" = "secondary", Road(RoadKind::Secondary)),
        rule!("highway" = "secondary_link", Road(RoadKind::Secondary)),
        rule!("highway" = "tertiary", Road(RoadKind::Tertiary)),
        rule!("highway" = "tertiary_link", Road(RoadKind::Tertiary)),
        rule!("highway" = "residential", Road(RoadKind::Residential)),
        rule!("highway" = "living_street", Road(RoadKind::Residential)),
        rule!("highway" = "service", Road(RoadKind::Service)),
        rule!("highway" = "unclassified", Road(RoadKind::Unclassified)),
        rule!("highway" = "road", Road(RoadKind::Unclassified)),
        rule!("highway" = "footway", Road(RoadKind::Footway)),
        rule!("highway" = "pedestrian", Road(RoadKind::Footway)),
        rule!("highway" = "path", Road(RoadKind::Footway)),
        rule!("highway" = "steps", Road(RoadKind::Footway)),
        rule!("highway" = "cycleway", Road(RoadKind::Footway)),
        rule!("railway" = "rail", Road(RoadKind::Railway)),
        rule!("railway" = "light_rail", Road(RoadKind::Railway)),
        rule!("railway" = "subway", Road(RoadKind::Railway)),
        rule!("railway" = "tram", Road(RoadKind::Railway)),
        rule!("natural" = "water", Polygon(PolygonKind::Water)),
        rule!("waterway" = "riverbank", Polygon(PolygonKind::Water)),
        rule!("landuse" = "reservoir", Polygon(PolygonKind::Water)),
        rule!("landuse" = "basin", Polygon(PolygonKind::Water)),
        rule!("natural" = "wood", Polygon(PolygonKind::Forest)),
        rule!("landuse" = "forest", Polygon(PolygonKind::Forest)),
        rule!("landuse" = "grass", Polygon(PolygonKind::Grass)),
        rule!("landuse" = "meadow", Polygon(PolygonKind::Grass)),
        rule!("landuse" = "village_green", Polygon(PolygonKind::Grass)),
        rule!("natural" = "grassland", Polygon(PolygonKind::Grass)),
        rule!("leisure", Polygon(PolygonKind::Leisure)),
        rule!("landuse" = "industrial", Polygon(PolygonKind::Industrial)),
        rule!("landuse" = "railway", Polygon(PolygonKind::Railway)),
        rule!("landuse" = "commercial", Polygon(PolygonKind::Commercial)),
        rule!("landuse" = "retail", Polygon(PolygonKind::Commercial)),
        rule!("landuse" = "residential", Polygon(PolygonKind::Residential)),
    ],
    relation_types: &["multipolygon"],
    honor_oneway: false,
};

/// [DEFAULT_CLASSIFIER] with one-way handling enabled.
pub const ONEWAY_CLASSIFIER: Classifier = Classifier {
    name: "oneway",
    honor_oneway: true,
    ..DEFAULT_CLASSIFIER
};
