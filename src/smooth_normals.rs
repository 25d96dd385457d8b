//! The smoothing pipeline: grouping, averaging, projection, encoding and
//! writing, run once over one mesh.

mod averaging;
mod channel_writer;
mod corner;
mod oct_encode;
mod position_groups;
mod tangent_frame;

use alloc::vec::Vec;

pub use self::oct_encode::oct_quad_encode;
pub(crate) use self::corner::{left_index, right_index};
use self::{
    averaging::SmoothedNormals, position_groups::PositionGroups, tangent_frame::TangentBasis,
};
use crate::{
    Geometry, NormalSource, Settings, SmoothNormalsError, Summary, WriteChannel, math::*,
};

pub(crate) fn smooth_normals_and_write<I: Geometry<O>, O: Ops>(
    context: &mut I,
    settings: &Settings,
) -> Result<Summary, SmoothNormalsError> {
    let loops_total = context.num_loops();
    let polygons_total = context.num_polygons();

    let span = tracing::debug_span!(
        "smooth_normals",
        loops = loops_total,
        polygons = polygons_total,
        write_channel = ?settings.write_channel()
    );
    let _enter = span.enter();

    validate_topology(&*context)?;
    let frames = read_loop_frames(&*context, settings.normal_source())?;

    if loops_total == 0 {
        tracing::debug!("empty mesh, nothing to write");
        return Ok(Summary {
            write_channel: settings.write_channel(),
            ..Summary::default()
        });
    }

    let groups = PositionGroups::build(&*context, &frames);
    tracing::trace!(
        groups = groups.len(),
        degenerate_corners = groups.degenerate_corners(),
        "grouped loops by position"
    );

    let smoothed = SmoothedNormals::average(
        &groups,
        settings.weighting(),
        settings.zero_fallback(),
        loops_total,
    );
    tracing::trace!(weighting = ?settings.weighting(), "averaged group normals");
    if smoothed.degenerate_groups() > 0 {
        tracing::warn!(
            groups = smoothed.degenerate_groups(),
            fallback = ?settings.zero_fallback(),
            "blended normal has zero length"
        );
    }
    if smoothed.unweighted_groups() > 0 {
        tracing::warn!(
            groups = smoothed.unweighted_groups(),
            "corner angles sum to zero, weighting uniformly"
        );
    }

    let projected = project_to_tangent_space(&frames, smoothed.normals());
    tracing::trace!(loops = projected.len(), "projected into tangent space");

    match settings.write_channel() {
        WriteChannel::Uv2 => {
            let encoded = projected
                .iter()
                .map(|&n| oct_quad_encode(n.into()))
                .collect::<Vec<_>>();
            channel_writer::write_uv_channel(context, settings.uv_channel_name(), &encoded);
        }
        WriteChannel::Tangent => channel_writer::write_tangents(context, &projected),
    }

    let summary = Summary {
        loops: loops_total,
        polygons: polygons_total,
        groups: groups.len(),
        degenerate_groups: smoothed.degenerate_groups(),
        degenerate_corners: groups.degenerate_corners(),
        write_channel: settings.write_channel(),
    };
    tracing::debug!(groups = summary.groups, "wrote smoothed normals");

    Ok(summary)
}

/// Everything read from the mesh for a single loop before any stage runs.
pub(super) struct LoopFrame<O: Ops> {
    /// The loop's split normal, blended during averaging.
    split_normal: Vec3<O>,
    /// The normal forming the third row of the tangent basis.
    basis_normal: Vec3<O>,
    tangent: Vec3<O>,
}

impl<O: Ops> Copy for LoopFrame<O> {}

impl<O: Ops> Clone for LoopFrame<O> {
    fn clone(&self) -> Self {
        *self
    }
}

/// Checks the polygon loop ranges are ascending, contiguous, cover every loop
/// exactly once and only reference existing vertices.
fn validate_topology<I: Geometry<O>, O: Ops>(context: &I) -> Result<(), SmoothNormalsError> {
    let mut expected = 0;
    for polygon in 0..context.num_polygons() {
        let loop_start = context.loop_start(polygon);
        let loop_total = context.loop_total(polygon);

        if loop_total < 3 {
            return Err(SmoothNormalsError::TooFewLoops {
                polygon,
                loop_total,
            });
        }

        if loop_start != expected {
            return Err(SmoothNormalsError::NonContiguousLoops {
                polygon,
                loop_start,
                expected,
            });
        }

        expected += loop_total;
    }

    let loops = context.num_loops();
    if expected != loops {
        return Err(SmoothNormalsError::UncoveredLoops {
            covered: expected,
            loops,
        });
    }

    let vertices = context.num_vertices();
    (0..loops)
        .map(|loop_index| (loop_index, context.loop_vertex(loop_index)))
        .find(|&(_, vertex)| vertex >= vertices)
        .map_or(Ok(()), |(loop_index, vertex)| {
            Err(SmoothNormalsError::VertexOutOfRange {
                loop_index,
                vertex,
                vertices,
            })
        })
}

fn read_loop_frames<I: Geometry<O>, O: Ops>(
    context: &I,
    normal_source: NormalSource,
) -> Result<Vec<LoopFrame<O>>, SmoothNormalsError> {
    (0..context.num_loops())
        .map(|loop_index| {
            let split_normal: Vec3<O> = context
                .loop_normal(loop_index)
                .ok_or(SmoothNormalsError::MissingNormal { loop_index })?
                .into();
            let tangent: Vec3<O> = context
                .loop_tangent(loop_index)
                .ok_or(SmoothNormalsError::MissingTangent { loop_index })?
                .into();
            let basis_normal = match normal_source {
                NormalSource::Vertex => {
                    let vertex = context.loop_vertex(loop_index);
                    context
                        .vertex_normal(vertex)
                        .ok_or(SmoothNormalsError::MissingVertexNormal { loop_index, vertex })?
                        .into()
                }
                NormalSource::Loop => split_normal,
            };

            Ok(LoopFrame {
                split_normal,
                basis_normal,
                tangent,
            })
        })
        .collect()
}

/// Expresses each loop's smoothed normal in that loop's tangent basis.
fn project_to_tangent_space<O: Ops>(
    frames: &[LoopFrame<O>],
    smoothed: &[Vec3<O>],
) -> Vec<Vec3<O>> {
    frames
        .iter()
        .zip(smoothed)
        .map(|(frame, &normal)| {
            TangentBasis::new(frame.basis_normal, frame.tangent)
                .to_tangent_space(normal)
                .normalized_or_zero()
        })
        .collect()
}
