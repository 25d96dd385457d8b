//! Persists pipeline output onto the mesh.

use crate::{Geometry, Ops, math::Vec3};

/// Writes `values` into the UV channel called `name`, creating it if needed.
///
/// The channel is made active while it is written and the previously active
/// channel is restored afterwards.
pub(super) fn write_uv_channel<I: Geometry<O>, O: Ops>(
    context: &mut I,
    name: &str,
    values: &[[f32; 2]],
) {
    let previous = context.active_uv_channel();

    let channel = match context.find_uv_channel(name) {
        Some(channel) => channel,
        None => {
            tracing::debug!(name, "creating uv channel");
            context.add_uv_channel(name)
        }
    };

    context.set_active_uv_channel(Some(channel));
    for (loop_index, &uv) in values.iter().enumerate() {
        context.set_uv(channel, loop_index, uv);
    }
    context.set_active_uv_channel(previous);
}

/// Overwrites each loop tangent with the matching entry of `values`.
pub(super) fn write_tangents<I: Geometry<O>, O: Ops>(context: &mut I, values: &[Vec3<O>]) {
    for (loop_index, &value) in values.iter().enumerate() {
        context.set_loop_tangent(loop_index, value.into());
    }
}
