use super::HacdState;
use crate::transformation::half_edge::HalfEdgeMeshError;

/// Errors that can occur while computing a convex decomposition.
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum HacdError {
    /// The input mesh has no face.
    #[error("The input mesh has no face to decompose.")]
    EmptyGraph,
    /// The decomposition was already extracted.
    #[error("The decomposition was already finalized.")]
    AlreadyFinalized,
    /// An operation was called in the wrong phase of the algorithm.
    #[error("Expected the {expected:?} state, found {found:?}.")]
    InvalidState {
        /// The state the operation requires.
        expected: HacdState,
        /// The current state.
        found: HacdState,
    },
    /// The input mesh could not be built.
    #[error(transparent)]
    Mesh(#[from] HalfEdgeMeshError),
}
