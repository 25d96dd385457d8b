use crate::{Ops, math::Vec3};

/// Object to tangent space rotation for one loop.
///
/// Rows are the tangent, the bitangent and the normal, each normalized.
/// The bitangent is always derived as `normal × tangent`, whatever the mesh
/// stores. Rows are not re-orthogonalized, so a tangent that is not
/// perpendicular to the normal yields a skewed basis; callers normalize the
/// projected vector.
pub(super) struct TangentBasis<O: Ops> {
    rows: [Vec3<O>; 3],
}

impl<O: Ops> TangentBasis<O> {
    pub(super) fn new(normal: Vec3<O>, tangent: Vec3<O>) -> Self {
        let bitangent = normal.cross(tangent);
        Self {
            rows: [tangent, bitangent, normal].map(Vec3::normalized_or_zero),
        }
    }

    /// Multiplies `v` by the basis matrix.
    pub(super) fn to_tangent_space(&self, v: Vec3<O>) -> Vec3<O> {
        self.rows.map(|row| row.dot(v)).into()
    }
}
