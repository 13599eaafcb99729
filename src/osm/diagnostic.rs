// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

use super::model::FeatureType;

/// Problem with a single feature, found while building [Areas](super::Area)
/// or the [Graph](crate::Graph).
///
/// Diagnostics never abort loading - the offending feature (or a part of it) is
/// skipped, and everything else is processed as usual.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Diagnostic {
    /// A ring could not be assembled; the feature (or some of its members) was skipped.
    #[error("{type_} {id}: malformed ring: {defect}")]
    MalformedRing {
        type_: FeatureType,
        id: i64,
        defect: RingDefect,
    },

    /// An inner ring of a relation is not contained in any of its outer rings, and was dropped.
    /// The ring is identified by the ids of the member ways it was stitched from.
    #[error("relation {relation}: inner ring of ways {ways:?} is not inside any outer ring")]
    OrphanHole { relation: i64, ways: Vec<i64> },

    /// A node has a NaN or out-of-range position and was excluded.
    #[error("node {0}: invalid coordinate")]
    InvalidCoordinate(i64),

    /// A road segment could not be added to the graph, as one of its ends has
    /// no valid position.
    #[error("way {way}: segment {from}-{to} skipped: no valid position")]
    EdgeSkipped { way: i64, from: i64, to: i64 },
}

/// Reason for a [Diagnostic::MalformedRing].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RingDefect {
    #[error("way is not closed")]
    NotClosed,

    #[error("ways {0:?} can't be joined into a closed ring")]
    Unclosed(Vec<i64>),

    #[error("less than 3 distinct nodes")]
    TooFewPoints,

    #[error("reference to unknown way {0}")]
    UnknownWay(i64),

    #[error("node {0} has no valid position")]
    InvalidPoint(i64),

    /// The ring runs through a node dropped by the bounding box filter.
    #[error("node {0} lies outside of the bounding box")]
    OutsideBbox(i64),
}

impl Diagnostic {
    /// Checks if the diagnostic only follows from bounding box filtering,
    /// rather than from broken data.
    pub fn is_clipped(&self) -> bool {
        matches!(
            self,
            Diagnostic::MalformedRing {
                defect: RingDefect::OutsideBbox(_),
                ..
            }
        )
    }
}

/// Logs a diagnostic and appends it to `diagnostics`.
/// Features cut by the bounding box are only logged at debug level.
pub(crate) fn report(diagnostics: &mut Vec<Diagnostic>, d: Diagnostic) {
    if d.is_clipped() {
        log::debug!("{d}");
    } else {
        log::warn!("{d}");
        diagnostics.push(d);
    }
}
