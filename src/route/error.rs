// (c) Copyright 2025 Mikołaj Kuranowski
// SPDX-License-Identifier: MIT

/// Recommended number of allowed vertex expansions in [find_route](crate::find_route)
/// before [RouteError::StepLimitExceeded] is returned.
pub const DEFAULT_STEP_LIMIT: usize = 1_000_000;

/// Error conditions which may occur during [find_route](crate::find_route) or
/// [find_route_with_cancel](crate::find_route_with_cancel).
///
/// Absence of a route is not an error - see [Route::unreachable](crate::Route::unreachable).
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    /// The start or end vertices don't exist in a graph.
    #[error("invalid vertex: {0}")]
    InvalidReference(i64),

    /// Route search has exceeded its limit of steps.
    /// Either the vertices are really far apart, or no route exists.
    ///
    /// Concluding that no route exists requires traversing the whole graph,
    /// which can result in a denial-of-service. The step limit protects
    /// against resource exhaustion.
    #[error("step limit exceeded")]
    StepLimitExceeded,

    /// The search was stopped through its cancellation flag.
    #[error("route search cancelled")]
    Cancelled,
}
