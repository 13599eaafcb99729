// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

//! Static display attributes for classified features.
//!
//! These are never used by area assembly or routing, only handed over to
//! whatever draws the map.

use super::classify::{PolygonKind, RoadKind};

/// 8-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rgb(pub u8, pub u8, pub u8);

/// How a line feature should be stroked.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub color: Rgb,
    pub width: f32,
}

/// Stroke used to highlight a computed route.
pub const ROUTE_STROKE: Stroke = Stroke {
    color: Rgb(255, 0, 0),
    width: 7.0,
};

/// Drawing order of a highlighted route, see [RoadKind::z_order].
pub const ROUTE_Z_ORDER: f32 = PolygonKind::Leisure.z_order();

impl PolygonKind {
    /// Fill color of an area of this kind.
    pub fn fill(self) -> Rgb {
        match self {
            Self::Building => Rgb(255, 190, 190),
            Self::Water => Rgb(0, 201, 215),
            Self::Grass => Rgb(197, 236, 148),
            Self::Forest => Rgb(46, 139, 87),
            Self::Industrial => Rgb(223, 197, 220),
            Self::Leisure => Rgb(189, 252, 193),
            Self::Railway => Rgb(193, 193, 193),
            Self::Commercial => Rgb(233, 195, 196),
            Self::Residential => Rgb(209, 209, 209),
        }
    }

    /// Drawing order of an area of this kind: features with a higher value are drawn on top.
    pub const fn z_order(self) -> f32 {
        match self {
            Self::Building => 0.0,
            Self::Water => 1.0,
            Self::Grass => 2.0,
            Self::Forest => 3.0,
            Self::Industrial => 4.0,
            Self::Leisure => 5.0,
            Self::Railway => 6.0,
            Self::Commercial => 7.0,
            Self::Residential => 8.0,
        }
    }
}

impl RoadKind {
    /// Stroke of a line of this kind.
    pub fn stroke(self) -> Stroke {
        let (color, width) = match self {
            Self::Railway => (Rgb(100, 100, 100), 6.0),
            Self::Motorway => (Rgb(226, 122, 143), 6.0),
            Self::Trunk => (Rgb(245, 161, 136), 6.0),
            Self::Primary => (Rgb(249, 207, 144), 5.0),
            Self::Secondary => (Rgb(244, 251, 173), 5.0),
            Self::Tertiary => (Rgb(244, 251, 173), 4.0),
            Self::Residential => (Rgb(254, 254, 254), 2.5),
            Self::Unclassified => (Rgb(254, 254, 254), 2.5),
            Self::Service => (Rgb(254, 254, 254), 1.0),
            Self::Footway => (Rgb(241, 106, 96), 0.0),
        };
        Stroke { color, width }
    }

    /// Drawing order of a line of this kind. Lines sit just above leisure areas,
    /// with minor roads drawn over major ones.
    pub fn z_order(self) -> f32 {
        let rank: u8 = match self {
            Self::Railway => 1,
            Self::Motorway => 2,
            Self::Trunk => 3,
            Self::Primary => 4,
            Self::Secondary => 5,
            Self::Tertiary => 6,
            Self::Residential => 7,
            Self::Service => 8,
            Self::Footway => 9,
            Self::Unclassified => 10,
        };
        ROUTE_Z_ORDER + f32::from(rank) * 0.1
    }
}
