//! Typed errors for graph mutation, search selection, and scenario handling.

/// Errors surfaced synchronously by the failing call. An exhausted search is
/// not an error; it yields an absent path instead.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GridError {
    /// Coordinates outside `[0, width) x [0, height)` on a checked operation.
    #[error("coordinates ({x}, {y}) are out of bounds for a {width}x{height} grid")]
    OutOfBounds {
        x: i32,
        y: i32,
        width: usize,
        height: usize,
    },

    /// An algorithm name that maps to no [SearchVariant](crate::SearchVariant).
    /// Selection never falls back to a default.
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),

    /// Random-grid parameters that cannot produce a usable scenario.
    #[error("invalid scenario parameters: {0}")]
    InvalidScenario(String),

    /// A composite seed string that does not decode into the nine scalar
    /// fields `width-height-blocked-teleport-seed-startx-starty-goalx-goaly`.
    #[error("malformed scenario string: {0}")]
    MalformedScenario(String),
}
