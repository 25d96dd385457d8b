//! Provides [`PolyMesh`], an owned mesh implementing [`Geometry`].

use alloc::{string::String, vec, vec::Vec};
use core::marker::PhantomData;

use crate::{
    Geometry, Ops, SmoothNormalsError,
    math::{Vec3, fabsf, not_zero},
    smooth_normals::{left_index, right_index},
};

#[derive(Clone, PartialEq, Debug)]
struct UvChannel {
    name: String,
    data: Vec<[f32; 2]>,
}

/// An in-memory polygon mesh.
///
/// Loops are laid out polygon after polygon, so the loop ranges are contiguous
/// by construction.
/// Vertex normals, split normals and tangents start out absent; provide them with
/// [`calc_normals_split`](PolyMesh::calc_normals_split) and
/// [`calc_tangents`](PolyMesh::calc_tangents), or set them directly.
#[derive(Clone, PartialEq, Debug)]
pub struct PolyMesh<
    #[cfg(not(feature = "std"))] O: Ops,
    #[cfg(feature = "std")] O: Ops = crate::StdOps,
> {
    positions: Vec<[f32; 3]>,
    vertex_normals: Option<Vec<[f32; 3]>>,
    loop_vertices: Vec<usize>,
    /// `(loop_start, loop_total)` for each polygon.
    polygons: Vec<(usize, usize)>,
    polygon_smooth: Vec<bool>,
    loop_normals: Option<Vec<[f32; 3]>>,
    loop_tangents: Option<Vec<[f32; 3]>>,
    uv_channels: Vec<UvChannel>,
    active_uv: Option<usize>,
    _phantom: PhantomData<O>,
}

#[cfg(feature = "std")]
impl PolyMesh {
    /// Builds a mesh from vertex `positions` and a list of polygons, each given
    /// as the vertex indices of its corners in winding order.
    ///
    /// Fails if a polygon has fewer than 3 corners or references a vertex that
    /// does not exist.
    pub fn new(
        positions: Vec<[f32; 3]>,
        polygons: &[&[usize]],
    ) -> Result<Self, SmoothNormalsError> {
        Self::with_ops(positions, polygons)
    }
}

impl<O: Ops> PolyMesh<O> {
    /// Same as [`PolyMesh::new`], for an explicit [`Ops`] backend.
    pub fn with_ops(
        positions: Vec<[f32; 3]>,
        polygons: &[&[usize]],
    ) -> Result<Self, SmoothNormalsError> {
        let mut loop_vertices = Vec::with_capacity(polygons.iter().map(|p| p.len()).sum());
        let mut ranges = Vec::with_capacity(polygons.len());

        for (polygon, corners) in polygons.iter().enumerate() {
            if corners.len() < 3 {
                return Err(SmoothNormalsError::TooFewLoops {
                    polygon,
                    loop_total: corners.len(),
                });
            }

            ranges.push((loop_vertices.len(), corners.len()));

            for &vertex in corners.iter() {
                if vertex >= positions.len() {
                    return Err(SmoothNormalsError::VertexOutOfRange {
                        loop_index: loop_vertices.len(),
                        vertex,
                        vertices: positions.len(),
                    });
                }
                loop_vertices.push(vertex);
            }
        }

        Ok(Self {
            positions,
            vertex_normals: None,
            loop_vertices,
            polygon_smooth: vec![false; ranges.len()],
            polygons: ranges,
            loop_normals: None,
            loop_tangents: None,
            uv_channels: Vec::new(),
            active_uv: None,
            _phantom: PhantomData,
        })
    }

    #[inline]
    pub fn positions(&self) -> &[[f32; 3]] {
        &self.positions
    }

    #[inline]
    pub fn vertex_normals(&self) -> Option<&[[f32; 3]]> {
        self.vertex_normals.as_deref()
    }

    #[inline]
    pub fn loop_vertices(&self) -> &[usize] {
        &self.loop_vertices
    }

    #[inline]
    pub fn loop_normals(&self) -> Option<&[[f32; 3]]> {
        self.loop_normals.as_deref()
    }

    #[inline]
    pub fn loop_tangents(&self) -> Option<&[[f32; 3]]> {
        self.loop_tangents.as_deref()
    }

    /// Returns the loop range of every polygon as `(loop_start, loop_total)`.
    #[inline]
    pub fn polygons(&self) -> &[(usize, usize)] {
        &self.polygons
    }

    /// Marks `polygon` as smooth shaded: its split normals follow the vertex
    /// normals instead of the polygon's own normal.
    ///
    /// # Panics
    ///
    /// Panics if `polygon` is out of range.
    pub fn set_polygon_smooth(&mut self, polygon: usize, smooth: bool) {
        self.polygon_smooth[polygon] = smooth;
    }

    /// # Panics
    ///
    /// Panics if `normals` does not hold one entry per vertex.
    pub fn set_vertex_normals(&mut self, normals: Vec<[f32; 3]>) {
        assert_eq!(normals.len(), self.positions.len());
        self.vertex_normals = Some(normals);
    }

    /// # Panics
    ///
    /// Panics if `normals` does not hold one entry per loop.
    pub fn set_loop_normals(&mut self, normals: Vec<[f32; 3]>) {
        assert_eq!(normals.len(), self.loop_vertices.len());
        self.loop_normals = Some(normals);
    }

    /// # Panics
    ///
    /// Panics if `tangents` does not hold one entry per loop.
    pub fn set_loop_tangents(&mut self, tangents: Vec<[f32; 3]>) {
        assert_eq!(tangents.len(), self.loop_vertices.len());
        self.loop_tangents = Some(tangents);
    }

    pub fn clear_loop_tangents(&mut self) {
        self.loop_tangents = None;
    }

    /// Returns the index of the UV channel called `name`.
    pub fn find_uv_channel(&self, name: &str) -> Option<usize> {
        self.uv_channels.iter().position(|c| c.name == name)
    }

    /// Adds a zero-filled UV channel called `name` and returns its index.
    /// The first channel added to a mesh becomes the active one.
    pub fn add_uv_channel(&mut self, name: &str) -> usize {
        self.uv_channels.push(UvChannel {
            name: name.into(),
            data: vec![[0.; 2]; self.loop_vertices.len()],
        });
        let index = self.uv_channels.len() - 1;
        if self.active_uv.is_none() {
            self.active_uv = Some(index);
        }
        index
    }

    #[inline]
    pub fn active_uv_channel(&self) -> Option<usize> {
        self.active_uv
    }

    /// # Panics
    ///
    /// Panics if `channel` does not exist.
    pub fn set_active_uv_channel(&mut self, channel: Option<usize>) {
        if let Some(channel) = channel {
            assert!(channel < self.uv_channels.len(), "no uv channel {channel}");
        }
        self.active_uv = channel;
    }

    #[inline]
    pub fn num_uv_channels(&self) -> usize {
        self.uv_channels.len()
    }

    pub fn uv_channel(&self, channel: usize) -> Option<&[[f32; 2]]> {
        self.uv_channels.get(channel).map(|c| c.data.as_slice())
    }

    pub fn uv_channel_by_name(&self, name: &str) -> Option<&[[f32; 2]]> {
        self.find_uv_channel(name).and_then(|c| self.uv_channel(c))
    }

    pub fn uv_channel_name(&self, channel: usize) -> Option<&str> {
        self.uv_channels.get(channel).map(|c| c.name.as_str())
    }

    /// Replaces the contents of UV channel `channel`.
    /// `values` must hold one entry per loop.
    pub fn set_uv_channel_data(
        &mut self,
        channel: usize,
        values: &[[f32; 2]],
    ) -> Result<(), SmoothNormalsError> {
        let loops = self.loop_vertices.len();
        let data = &mut self
            .uv_channels
            .get_mut(channel)
            .ok_or(SmoothNormalsError::UnknownChannel { channel })?
            .data;
        if values.len() != loops {
            return Err(SmoothNormalsError::ChannelLengthMismatch {
                channel,
                expected: loops,
                found: values.len(),
            });
        }
        data.copy_from_slice(values);
        Ok(())
    }

    /// Calculates polygon normals, vertex normals and split normals.
    ///
    /// Polygon normals use Newell's method, so non-planar polygons get a
    /// sensible average.
    /// Vertex normals are the sum of adjacent polygon normals weighted by the
    /// corner angle, normalized.
    /// Split normals equal the polygon normal, or the vertex normal for
    /// polygons marked [smooth](PolyMesh::set_polygon_smooth).
    pub fn calc_normals_split(&mut self) {
        let polygon_normals = self
            .polygons
            .iter()
            .map(|&(start, total)| self.newell_normal(start, total))
            .collect::<Vec<_>>();

        let mut vertex_normals = vec![Vec3::<O>::ZERO; self.positions.len()];
        for (&(start, total), &normal) in self.polygons.iter().zip(&polygon_normals) {
            for i in start..start + total {
                let p = [
                    left_index(i, start, total),
                    i,
                    right_index(i, start, total),
                ]
                .map(|l| self.loop_position(l));
                let angle = (p[0] - p[1]).angle_between(p[2] - p[1]);
                vertex_normals[self.loop_vertices[i]] += normal * angle;
            }
        }
        let vertex_normals = vertex_normals
            .into_iter()
            .map(|n| n.normalized_or_zero().into())
            .collect::<Vec<[f32; 3]>>();

        let mut loop_normals = vec![[0.; 3]; self.loop_vertices.len()];
        for (polygon, &(start, total)) in self.polygons.iter().enumerate() {
            for l in start..start + total {
                loop_normals[l] = if self.polygon_smooth[polygon] {
                    vertex_normals[self.loop_vertices[l]]
                } else {
                    polygon_normals[polygon].into()
                };
            }
        }
        self.vertex_normals = Some(vertex_normals);
        self.loop_normals = Some(loop_normals);
    }

    /// Calculates a tangent per loop from the texture coordinates in UV
    /// channel `channel`.
    ///
    /// Each polygon is fanned from its first corner and the first-order
    /// derivative of position along `u` is accumulated over the fan.
    /// Every loop then receives that direction made orthogonal to its split
    /// normal.
    /// Polygons without usable texture coordinates get an arbitrary direction
    /// orthogonal to the normal.
    pub fn calc_tangents(&mut self, channel: usize) -> Result<(), SmoothNormalsError> {
        let loop_normals = self
            .loop_normals
            .as_ref()
            .ok_or(SmoothNormalsError::MissingNormal { loop_index: 0 })?;
        let tex_coords = &self
            .uv_channels
            .get(channel)
            .ok_or(SmoothNormalsError::UnknownChannel { channel })?
            .data;

        let mut tangents = vec![[0.; 3]; self.loop_vertices.len()];
        for &(start, total) in &self.polygons {
            let mut s = Vec3::<O>::ZERO;
            for corner in 1..total - 1 {
                let idx = [start, start + corner, start + corner + 1];
                let v = idx.map(|l| self.loop_position(l));
                let tx = idx.map(|l| tex_coords[l]);

                let d_tx = [1, 2].map(|t| [0, 1].map(|i| tx[t][i] - tx[0][i]));
                let d_v = [1, 2].map(|i| v[i] - v[0]);

                let signed_area_double = d_tx[0][0] * d_tx[1][1] - d_tx[0][1] * d_tx[1][0];
                if !not_zero(signed_area_double) {
                    continue;
                }

                s += ((d_tx[1][1] * d_v[0]) - (d_tx[0][1] * d_v[1])) * signed_area_double.recip();
            }

            for l in start..start + total {
                let n = Vec3::<O>::from(loop_normals[l]).normalized_or_zero();
                let mut t = (s - n.dot(s) * n).normalized_or_zero();
                if t.is_zero() {
                    t = orthogonal(n);
                }
                tangents[l] = t.into();
            }
        }

        self.loop_tangents = Some(tangents);
        Ok(())
    }

    fn loop_position(&self, loop_index: usize) -> Vec3<O> {
        self.positions[self.loop_vertices[loop_index]].into()
    }

    fn newell_normal(&self, start: usize, total: usize) -> Vec3<O> {
        let mut n = Vec3::<O>::ZERO;
        for i in start..start + total {
            let (a, b) = (
                self.loop_position(i),
                self.loop_position(right_index(i, start, total)),
            );
            n.x += (a.y - b.y) * (a.z + b.z);
            n.y += (a.z - b.z) * (a.x + b.x);
            n.z += (a.x - b.x) * (a.y + b.y);
        }
        n.normalized_or_zero()
    }
}

/// Returns a unit vector orthogonal to `n`, or the X axis if `n` is zero.
fn orthogonal<O: Ops>(n: Vec3<O>) -> Vec3<O> {
    let axis = if fabsf(n.x) < 0.9 {
        Vec3::from([1., 0., 0.])
    } else {
        Vec3::from([0., 1., 0.])
    };
    let t = (axis - n.dot(axis) * n).normalized_or_zero();
    if t.is_zero() { axis } else { t }
}

impl<O: Ops> Geometry<O> for PolyMesh<O> {
    fn num_vertices(&self) -> usize {
        self.positions.len()
    }

    fn position(&self, vertex: usize) -> [f32; 3] {
        self.positions[vertex]
    }

    fn vertex_normal(&self, vertex: usize) -> Option<[f32; 3]> {
        self.vertex_normals.as_ref().map(|normals| normals[vertex])
    }

    fn num_loops(&self) -> usize {
        self.loop_vertices.len()
    }

    fn loop_vertex(&self, loop_index: usize) -> usize {
        self.loop_vertices[loop_index]
    }

    fn loop_normal(&self, loop_index: usize) -> Option<[f32; 3]> {
        self.loop_normals.as_ref().map(|n| n[loop_index])
    }

    fn loop_tangent(&self, loop_index: usize) -> Option<[f32; 3]> {
        self.loop_tangents.as_ref().map(|t| t[loop_index])
    }

    fn num_polygons(&self) -> usize {
        self.polygons.len()
    }

    fn loop_start(&self, polygon: usize) -> usize {
        self.polygons[polygon].0
    }

    fn loop_total(&self, polygon: usize) -> usize {
        self.polygons[polygon].1
    }

    fn find_uv_channel(&self, name: &str) -> Option<usize> {
        PolyMesh::find_uv_channel(self, name)
    }

    fn add_uv_channel(&mut self, name: &str) -> usize {
        PolyMesh::add_uv_channel(self, name)
    }

    fn active_uv_channel(&self) -> Option<usize> {
        self.active_uv
    }

    fn set_active_uv_channel(&mut self, channel: Option<usize>) {
        PolyMesh::set_active_uv_channel(self, channel);
    }

    fn set_uv(&mut self, channel: usize, loop_index: usize, uv: [f32; 2]) {
        self.uv_channels[channel].data[loop_index] = uv;
    }

    fn set_loop_tangent(&mut self, loop_index: usize, tangent: [f32; 3]) {
        let loops = self.loop_vertices.len();
        self.loop_tangents.get_or_insert_with(|| vec![[0.; 3]; loops])[loop_index] = tangent;
    }
}
