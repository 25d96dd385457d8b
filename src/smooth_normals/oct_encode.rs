//! Octahedral packing of unit vectors into two components.

use crate::math::fabsf;

/// Packs the unit vector `n` into two components using an octahedral
/// projection with quadrant folding.
///
/// `n` is scaled onto the octahedron `|x| + |y| + |z| = 1`.
/// The lower hemisphere is then folded outwards by `t = clamp(-z, 0, 1)`:
/// added to both components when `x` and `y` are both non-negative, and
/// subtracted otherwise.
/// The fold is deliberately asymmetric; decoders rely on it.
///
/// For unit input, both components stay within `[-1, 1]`.
/// Vectors shorter than `1e-6` in L1 norm are scaled as if they had that norm.
///
/// ```
/// # use smooth_normals::oct_quad_encode;
/// assert_eq!(oct_quad_encode([0., 0., 1.]), [0., 0.]);
/// assert_eq!(oct_quad_encode([0., 0., -1.]), [1., 1.]);
/// ```
pub fn oct_quad_encode(n: [f32; 3]) -> [f32; 2] {
    let l1 = fabsf(n[0]) + fabsf(n[1]) + fabsf(n[2]);
    let n = n.map(|c| c / l1.max(1e-6));

    let t = (-n[2]).clamp(0., 1.);
    let [x, y] = [n[0], n[1]];
    if x >= 0. && y >= 0. {
        [x + t, y + t]
    } else {
        [x - t, y - t]
    }
}
