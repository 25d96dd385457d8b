//! Blends the split normals of each position group into one smoothed normal.

use alloc::{vec, vec::Vec};

use super::position_groups::{LoopWeight, PositionGroups};
use crate::{Ops, Weighting, ZeroNormalFallback, math::Vec3};

/// One smoothed normal per loop, indexed by loop.
pub(super) struct SmoothedNormals<O: Ops> {
    normals: Vec<Vec3<O>>,
    /// Groups whose blend summed to a zero vector.
    degenerate_groups: usize,
    /// Groups that asked for angle weights but had none to give.
    unweighted_groups: usize,
}

impl<O: Ops> SmoothedNormals<O> {
    pub(super) fn average(
        groups: &PositionGroups<O>,
        weighting: Weighting,
        fallback: ZeroNormalFallback,
        loops_total: usize,
    ) -> Self {
        let mut normals = vec![Vec3::ZERO; loops_total];
        let mut degenerate_groups = 0;
        let mut unweighted_groups = 0;

        #[cfg(smooth_normals_more_assertions)]
        let mut assigned = vec![false; loops_total];

        for group in groups.iter() {
            let mut normal = match weighting {
                Weighting::Uniform => blend_uniform(group),
                Weighting::Angle => blend_by_angle(group).unwrap_or_else(|| {
                    unweighted_groups += 1;
                    blend_uniform(group)
                }),
            }
            .normalized_or_zero();

            if normal.is_zero() {
                degenerate_groups += 1;
                normal = match fallback {
                    ZeroNormalFallback::Zero => Vec3::ZERO,
                    ZeroNormalFallback::FirstMember => group[0].normal.normalized_or_zero(),
                };
            }

            for member in group {
                #[cfg(smooth_normals_more_assertions)]
                {
                    assert!(!assigned[member.loop_index]);
                    assigned[member.loop_index] = true;
                }

                normals[member.loop_index] = normal;
            }
        }

        #[cfg(smooth_normals_more_assertions)]
        assert!(assigned.iter().all(|&a| a));

        Self {
            normals,
            degenerate_groups,
            unweighted_groups,
        }
    }

    pub(super) fn normals(&self) -> &[Vec3<O>] {
        &self.normals
    }

    pub(super) fn degenerate_groups(&self) -> usize {
        self.degenerate_groups
    }

    pub(super) fn unweighted_groups(&self) -> usize {
        self.unweighted_groups
    }
}

/// Every member contributes `1 / group.len()`.
fn blend_uniform<O: Ops>(group: &[LoopWeight<O>]) -> Vec3<O> {
    let share = (group.len() as f32).recip();
    group
        .iter()
        .fold(Vec3::ZERO, |sum, member| sum + member.normal * share)
}

/// Members contribute in proportion to their corner angle.
/// Returns [`None`] when the angles do not sum to a positive value.
fn blend_by_angle<O: Ops>(group: &[LoopWeight<O>]) -> Option<Vec3<O>> {
    let angle_sum = group.iter().map(|member| member.weight).sum::<f32>();
    if !(angle_sum > 0f32) {
        return None;
    }

    let inv_angle_sum = angle_sum.recip();
    Some(group.iter().fold(Vec3::ZERO, |sum, member| {
        sum + member.normal * (member.weight * inv_angle_sum)
    }))
}
