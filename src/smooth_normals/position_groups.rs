//! Provides [`PositionGroups`]; loops partitioned by the vertex position they
//! sit on.
//!
//! Positions are compared by their exact bit patterns, never with a tolerance.
//! Two vertices a single ULP apart, or at `0.0` and `-0.0`, stay in separate
//! groups; duplicating a vertex is how hard edges are authored.
//! Iteration follows [`BTreeMap`] order over the keys, so results do not depend
//! on hashing.

use alloc::{collections::BTreeMap, vec::Vec};

use super::{LoopFrame, left_index, right_index};
use crate::{Geometry, Ops, math::Vec3};

/// Orders positions by the raw bits of each component.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
pub(super) struct PositionKey([u32; 3]);

impl PositionKey {
    pub(super) fn new(position: [f32; 3]) -> Self {
        Self(position.map(f32::to_bits))
    }
}

/// One loop's contribution to its group.
pub(super) struct LoopWeight<O: Ops> {
    pub(super) loop_index: usize,
    /// The loop's split normal.
    pub(super) normal: Vec3<O>,
    /// Angle in radians of the polygon corner at this loop.
    pub(super) weight: f32,
}

impl<O: Ops> Copy for LoopWeight<O> {}

impl<O: Ops> Clone for LoopWeight<O> {
    fn clone(&self) -> Self {
        *self
    }
}

pub(super) struct PositionGroups<O: Ops> {
    groups: BTreeMap<PositionKey, Vec<LoopWeight<O>>>,
    /// Corners where an adjacent edge had no direction, weighted as a right
    /// angle.
    degenerate_corners: usize,
}

impl<O: Ops> PositionGroups<O> {
    /// Visits every loop of every polygon, measuring its corner angle and
    /// filing it under its vertex position.
    /// Within a group, members keep polygon order.
    pub(super) fn build<I: Geometry<O>>(context: &I, frames: &[LoopFrame<O>]) -> Self {
        let mut groups = BTreeMap::<PositionKey, Vec<LoopWeight<O>>>::new();
        let mut degenerate_corners = 0;

        for polygon in 0..context.num_polygons() {
            let start = context.loop_start(polygon);
            let total = context.loop_total(polygon);

            for index in start..start + total {
                let [prev, cur, next] = [
                    left_index(index, start, total),
                    index,
                    right_index(index, start, total),
                ]
                .map(|l| context.position(context.loop_vertex(l)));

                let v1 = Vec3::<O>::from(prev) - cur.into();
                let v2 = Vec3::<O>::from(next) - cur.into();
                if !v1.has_direction() || !v2.has_direction() {
                    degenerate_corners += 1;
                }

                groups
                    .entry(PositionKey::new(cur))
                    .or_default()
                    .push(LoopWeight {
                        loop_index: index,
                        normal: frames[index].split_normal,
                        weight: v1.angle_between(v2),
                    });
            }
        }

        Self {
            groups,
            degenerate_corners,
        }
    }

    /// Returns the number of distinct positions.
    pub(super) fn len(&self) -> usize {
        self.groups.len()
    }

    pub(super) fn degenerate_corners(&self) -> usize {
        self.degenerate_corners
    }

    pub(super) fn iter(&self) -> impl Iterator<Item = &[LoopWeight<O>]> {
        self.groups.values().map(Vec::as_slice)
    }
}
