use super::EdgeId;

/// Errors reported by the editing operations of a [`HalfEdgeMesh`](super::HalfEdgeMesh).
///
/// An operation returning an error leaves the mesh untouched.
#[derive(thiserror::Error, Debug, PartialEq, Eq, Copy, Clone)]
pub enum HalfEdgeMeshError {
    /// The directed edge `from -> to` is already used by a face.
    ///
    /// Adding the face would give the undirected edge three or more incident faces, or two
    /// faces with inconsistent orientations.
    #[error("The edge ({from}, {to}) is already used by another face.")]
    NonManifoldEdge {
        /// The origin of the offending edge.
        from: u32,
        /// The destination of the offending edge.
        to: u32,
    },
    /// The face has less than three vertices, or a vertex repeats.
    #[error("The face is degenerate.")]
    DegenerateFace,
    /// `add_face` was called outside of a `begin_face`/`end_face` block.
    #[error("Faces can only be added between `begin_face` and `end_face`.")]
    NotBuilding,
    /// The half-edge does not exist, or cannot be used by this operation.
    #[error("Invalid half-edge {0}.")]
    InvalidEdge(EdgeId),
    /// The vertex index is out of bounds.
    #[error("Invalid vertex {0}.")]
    InvalidVertex(u32),
}
