//! Computes smoothed per-loop normals for polygon meshes and packs them into an
//! auxiliary channel for consumption by a shader.
//!
//! The typical consumer is an outline (inverted hull) shader: extruding along
//! the split normals of a hard-edged mesh tears the hull apart at every crease.
//! Instead, the shader reads a normal that has been averaged across every loop
//! sharing a vertex position, stored in tangent space so it survives skinning
//! and deformation.
//! This crate is `no_std` and only requires `alloc`.
//!
//! # Usage
//!
//! First, implement [`Geometry`] for your mesh, or build a [`PolyMesh`].
//!
//! ```ignore
//! impl Geometry for MyMesh { /* ... */ }
//! ```
//!
//! The interface is how this crate reads vertex, loop and polygon information
//! _and_ writes back the generated values.
//! Split normals and tangents must already be available on every loop; they
//! are read, never generated.
//!
//! Finally, use [`smooth_normals`] (or [`smooth_normals_with_settings`]) to
//! compute and write back the smoothed normals.
//!
//! ```
//! use smooth_normals::{PolyMesh, WriteChannel, Settings};
//!
//! let mut mesh = PolyMesh::new(
//!     vec![[0., 0., 0.], [1., 0., 0.], [1., 1., 0.], [0., 1., 0.]],
//!     &[&[0, 1, 2, 3]],
//! )
//! .unwrap();
//! let uv = mesh.add_uv_channel("UVMap");
//! mesh.set_uv_channel_data(uv, &[[0., 0.], [1., 0.], [1., 1.], [0., 1.]])
//!     .unwrap();
//! mesh.calc_normals_split();
//! mesh.calc_tangents(uv).unwrap();
//!
//! let summary = smooth_normals::smooth_normals(&mut mesh).unwrap();
//! assert_eq!(summary.write_channel(), WriteChannel::Uv2);
//! assert_eq!(mesh.uv_channel_by_name("UV2").unwrap().len(), 4);
//! ```
//!
//! # Description
//!
//! A run moves through five stages, each consuming the output of the last:
//!
//! 1. **Grouping.** Every loop is keyed by the exact bit pattern of its
//!    vertex position. Loops of different polygons meeting at the same point
//!    land in the same group; vertices split apart by even the smallest offset
//!    stay apart. Each loop also records the angle of its polygon corner.
//! 2. **Averaging.** The split normals of each group are blended, either
//!    uniformly or weighted by corner angle ([`Weighting`]), normalized, and
//!    assigned to every member.
//! 3. **Projection.** For each loop a basis is built with rows tangent,
//!    `normal × tangent` and normal ([`NormalSource`] picks the vertex or the
//!    split normal). The averaged normal is expressed in that basis and
//!    normalized again.
//! 4. **Encoding.** In [`WriteChannel::Uv2`] mode each projected normal is
//!    folded onto an octahedron with [`oct_quad_encode`].
//! 5. **Writing.** Encoded values go into the `UV2` channel (created if needed,
//!    without disturbing the active channel) or projected normals replace the
//!    loop tangents.
//!
//! Nothing is kept between runs. Validation happens before the first write, so
//! a failed run leaves the mesh as it was.
//!
//! # Features
//!
//! ## `std` (default)
//!
//! Provides access to the standard library, allowing a default implementation
//! of [`Ops`] to be provided.
//! If you disable this feature, you will need to provide a type implementing
//! [`Ops`] as the `O` parameter in the [`Geometry`] trait.
//!
//! A common backend for implementing [`Ops`] is [`libm`]:
//!
//! ```
//! # use smooth_normals::Ops;
//! # struct LibmOps;
//! impl Ops for LibmOps {
//!     fn sqrt(x: f32) -> f32 {
//!         libm::sqrtf(x)
//!     }
//!
//!     fn acos(x: f32) -> f32 {
//!         libm::acos(x as f64) as f32
//!     }
//! }
//! ```
//!
//! # Logging
//!
//! Progress is reported through [`tracing`] under the `smooth_normals` span.
//! No subscriber is installed by this crate.
//!
//! [`libm`]: https://docs.rs/libm
//! [`tracing`]: https://docs.rs/tracing

#![forbid(unsafe_code)]
#![no_std]

extern crate alloc;

mod config;
mod math;
mod poly_mesh;
mod smooth_normals;

#[cfg(all(test, feature = "std"))]
mod tests;

#[cfg(feature = "std")]
mod std {
    extern crate std;

    /// Implements [`Ops`](crate::Ops) using the standard library.
    /// This is the recommended default when the `std` feature is enabled.
    #[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
    pub struct StdOps;

    impl crate::Ops for StdOps {
        #[inline]
        fn sqrt(x: f32) -> f32 {
            x.sqrt()
        }

        #[inline]
        fn acos(x: f32) -> f32 {
            // Evaluated in f64 so corner weights are stable across platforms.
            (x as f64).acos() as f32
        }
    }
}

use alloc::boxed::Box;

pub use config::{
    DEFAULT_UV_CHANNEL, NormalSource, ParseWriteChannelError, Settings, Weighting, WriteChannel,
    ZeroNormalFallback,
};
pub use math::Ops;
pub use poly_mesh::PolyMesh;
pub use smooth_normals::oct_quad_encode;

#[cfg(feature = "std")]
pub use std::StdOps;

/// Smooths the normals of `mesh` with the default [`Settings`]: uniform
/// weighting, a vertex-normal basis, and output to the `UV2` channel.
pub fn smooth_normals<I, O>(mesh: &mut I) -> Result<Summary, SmoothNormalsError>
where
    I: Geometry<O>,
    O: Ops,
{
    smooth_normals_with_settings(mesh, &Settings::default())
}

/// Smooths the normals of `mesh` and writes them to the destination chosen by
/// `settings`.
///
/// The mesh topology and the presence of split normals and tangents are
/// checked before anything is written.
pub fn smooth_normals_with_settings<I, O>(
    mesh: &mut I,
    settings: &Settings,
) -> Result<Summary, SmoothNormalsError>
where
    I: Geometry<O>,
    O: Ops,
{
    smooth_normals::smooth_normals_and_write(mesh, settings)
}

/// Runs [`smooth_normals_with_settings`] over each mesh in turn.
///
/// Meshes are processed one at a time and share nothing.
/// Processing stops at the first failure, which is reported as
/// [`SmoothNormalsError::Mesh`] carrying the position of the failing mesh;
/// meshes before it keep their results.
pub fn smooth_normals_all<'a, I, O>(
    meshes: impl IntoIterator<Item = &'a mut I>,
    settings: &Settings,
) -> Result<alloc::vec::Vec<Summary>, SmoothNormalsError>
where
    I: Geometry<O> + 'a,
    O: Ops,
{
    meshes
        .into_iter()
        .enumerate()
        .map(|(index, mesh)| {
            smooth_normals_with_settings(mesh, settings).map_err(|source| {
                SmoothNormalsError::Mesh {
                    index,
                    source: Box::new(source),
                }
            })
        })
        .collect()
}

/// Provides an interface for reading mesh information, and writing back the
/// smoothed normals.
///
/// The mesh is described the way most DCC tools store it: a list of vertices,
/// a list of loops (one per polygon corner, each referencing a vertex) and a
/// list of polygons, each owning a contiguous range of loops.
///
/// Without the `std` feature, there is no default implementation for [`Ops`]
/// provided.
/// Instead, you must also provide a type implementing [`Ops`] using an alternative
/// math backend, such as [`libm`].
///
/// [`libm`]: https://docs.rs/libm
pub trait Geometry<
    #[cfg(not(feature = "std"))] O: Ops,
    #[cfg(feature = "std")] O: Ops = std::StdOps,
>
{
    /// Returns the number of vertices on the mesh.
    fn num_vertices(&self) -> usize;

    /// Returns the position of `vertex`.
    /// `vertex` is a number in the range `0..num_vertices()`.
    fn position(&self, vertex: usize) -> [f32; 3];

    /// Returns the normal of `vertex`, aggregated over its adjacent polygons,
    /// or [`None`] if vertex normals have not been calculated.
    /// `vertex` is a number in the range `0..num_vertices()`.
    fn vertex_normal(&self, vertex: usize) -> Option<[f32; 3]>;

    /// Returns the number of loops on the mesh.
    fn num_loops(&self) -> usize;

    /// Returns the vertex referenced by loop `loop_index`.
    /// `loop_index` is a number in the range `0..num_loops()`.
    fn loop_vertex(&self, loop_index: usize) -> usize;

    /// Returns the split normal of loop `loop_index`, or [`None`] if split
    /// normals have not been calculated.
    fn loop_normal(&self, loop_index: usize) -> Option<[f32; 3]>;

    /// Returns the tangent of loop `loop_index`, or [`None`] if tangents have
    /// not been calculated.
    fn loop_tangent(&self, loop_index: usize) -> Option<[f32; 3]>;

    /// Returns the number of polygons on the mesh.
    fn num_polygons(&self) -> usize;

    /// Returns the index of the first loop of `polygon`.
    /// `polygon` is a number in the range `0..num_polygons()`.
    fn loop_start(&self, polygon: usize) -> usize;

    /// Returns the number of loops of `polygon`.
    /// `polygon` is a number in the range `0..num_polygons()`.
    fn loop_total(&self, polygon: usize) -> usize;

    /// Returns the index of the auxiliary 2-component channel called `name`,
    /// if there is one.
    fn find_uv_channel(&self, name: &str) -> Option<usize>;

    /// Creates an auxiliary 2-component channel called `name` with one entry
    /// per loop and returns its index.
    /// Creating a channel may change which channel is active; the caller
    /// restores the previous selection afterwards.
    fn add_uv_channel(&mut self, name: &str) -> usize;

    /// Returns the index of the active auxiliary channel, if any.
    fn active_uv_channel(&self) -> Option<usize>;

    /// Makes `channel` the active auxiliary channel.
    fn set_active_uv_channel(&mut self, channel: Option<usize>);

    /// Writes the value of loop `loop_index` in the auxiliary channel `channel`.
    fn set_uv(&mut self, channel: usize, loop_index: usize, uv: [f32; 2]);

    /// Overwrites the tangent of loop `loop_index`.
    fn set_loop_tangent(&mut self, loop_index: usize, tangent: [f32; 3]);
}

/// Describes what a completed run did.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct Summary {
    loops: usize,
    polygons: usize,
    groups: usize,
    degenerate_groups: usize,
    degenerate_corners: usize,
    write_channel: WriteChannel,
}

impl Summary {
    /// Returns the number of loops written.
    #[inline]
    pub const fn loops(&self) -> usize {
        self.loops
    }

    /// Returns the number of polygons visited.
    #[inline]
    pub const fn polygons(&self) -> usize {
        self.polygons
    }

    /// Returns the number of distinct vertex positions.
    #[inline]
    pub const fn groups(&self) -> usize {
        self.groups
    }

    /// Returns the number of groups whose blended normal had zero length and
    /// received the [`ZeroNormalFallback`] value.
    #[inline]
    pub const fn degenerate_groups(&self) -> usize {
        self.degenerate_groups
    }

    /// Returns the number of polygon corners with a zero-length edge, whose
    /// angle was taken to be a right angle.
    #[inline]
    pub const fn degenerate_corners(&self) -> usize {
        self.degenerate_corners
    }

    /// Returns the destination that was written.
    #[inline]
    pub const fn write_channel(&self) -> WriteChannel {
        self.write_channel
    }
}

/// Error returned when failing to smooth the normals of a mesh.
#[derive(Clone, PartialEq, Debug, thiserror::Error)]
// Reserving the right to introduce new error variants in the future.
#[non_exhaustive]
pub enum SmoothNormalsError {
    /// A polygon has fewer than three loops.
    #[error("polygon {polygon} has {loop_total} loops, at least 3 are required")]
    TooFewLoops { polygon: usize, loop_total: usize },
    /// A polygon's loops do not start where the previous polygon's ended.
    #[error("polygon {polygon} starts at loop {loop_start}, expected loop {expected}")]
    NonContiguousLoops {
        polygon: usize,
        loop_start: usize,
        expected: usize,
    },
    /// The polygons do not account for every loop.
    #[error("polygons cover {covered} loops but the mesh has {loops}")]
    UncoveredLoops { covered: usize, loops: usize },
    /// A loop references a vertex that does not exist.
    #[error("loop {loop_index} references vertex {vertex} but the mesh has {vertices} vertices")]
    VertexOutOfRange {
        loop_index: usize,
        vertex: usize,
        vertices: usize,
    },
    /// Split normals have not been calculated.
    #[error("loop {loop_index} has no split normal, calculate split normals first")]
    MissingNormal { loop_index: usize },
    /// Vertex normals have not been calculated.
    #[error("loop {loop_index} uses vertex {vertex} which has no normal, calculate normals first")]
    MissingVertexNormal { loop_index: usize, vertex: usize },
    /// Tangents have not been calculated.
    #[error("loop {loop_index} has no tangent, calculate tangents first")]
    MissingTangent { loop_index: usize },
    /// A UV channel index does not exist on the mesh.
    #[error("uv channel {channel} does not exist")]
    UnknownChannel { channel: usize },
    /// Data written to a UV channel does not have one value per loop.
    #[error("uv channel {channel} takes {expected} values, got {found}")]
    ChannelLengthMismatch {
        channel: usize,
        expected: usize,
        found: usize,
    },
    /// One mesh of a batch failed.
    #[error("mesh {index} failed: {source}")]
    Mesh {
        index: usize,
        source: Box<SmoothNormalsError>,
    },
}
