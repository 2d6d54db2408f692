//! Roadblock layout computation
//!
//! Picks which vehicles fit across a road and converts them into individual
//! placement transforms along the roadblock line. Pure functions, no state.

use std::f32::consts::FRAC_PI_2;

use glam::{Mat3, Quat, Vec3};
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::core::types::VehicleId;

/// Space a vehicle or prop occupies
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    pub id: VehicleId,
    /// Bounding box extents (width, length, height)
    pub extents: Vec3,
    /// Offset of the vehicle origin from its bounding box reference point
    pub ref_offset: Vec3,
}

impl Footprint {
    pub fn new(id: VehicleId, extents: Vec3) -> Self {
        Self {
            id,
            extents,
            ref_offset: Vec3::ZERO,
        }
    }

    pub fn with_ref_offset(mut self, ref_offset: Vec3) -> Self {
        self.ref_offset = ref_offset;
        self
    }

    /// Length this footprint takes up across the road
    pub fn length(&self, axis: FootprintAxis) -> f32 {
        match axis {
            FootprintAxis::Auto => self.extents.x.max(self.extents.y),
            FootprintAxis::Width => self.extents.x,
            FootprintAxis::Length => self.extents.y,
        }
    }
}

/// Which bounding box axis counts as a footprint's length
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FootprintAxis {
    /// Larger of width and length (blocking vehicles)
    #[default]
    Auto,
    Width,
    Length,
}

/// Final transform for one roadblock member
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: VehicleId,
    pub position: Vec3,
    pub rotation: Quat,
}

/// Greedily select the smallest footprints that fit inside `max_width`
///
/// Candidates are taken shortest first and selection stops at the first one
/// that would overflow. Returns the chosen footprints in ascending length
/// order and their summed length.
pub fn select_fitting_subset(
    candidates: &[Footprint],
    max_width: f32,
    axis: FootprintAxis,
) -> (Vec<Footprint>, f32) {
    let mut sorted = candidates.to_vec();
    sorted.sort_by_key(|footprint| OrderedFloat(footprint.length(axis)));

    let mut remaining = max_width;
    let mut selected = Vec::with_capacity(sorted.len());
    for footprint in sorted {
        let length = footprint.length(axis);
        if remaining - length < 0.0 {
            break;
        }
        remaining -= length;
        selected.push(footprint);
    }

    let total = selected.iter().map(|f| f.length(axis)).sum();
    (selected, total)
}

/// Rotation whose +Y axis is `forward` and +Z axis is (close to) `up`
pub fn rotation_from_basis(forward: Vec3, up: Vec3) -> Quat {
    let forward = forward.try_normalize().unwrap_or(Vec3::Y);
    let right = forward
        .cross(up)
        .try_normalize()
        .unwrap_or_else(|| forward.any_orthonormal_vector());
    let up = right.cross(forward);
    Quat::from_mat3(&Mat3::from_cols(right, forward, up))
}

/// Lay members side by side across the roadblock line
///
/// Each member takes an equal `width / n` slice. Members left of centre are
/// turned by `angle_offset` degrees one way and members right of centre the
/// other way; the member sitting on the centre uses `center_angle` when
/// given. Positions are corrected by each member's reference point offset.
pub fn compute_placement(
    members: &[Footprint],
    center: Vec3,
    center_rotation: Quat,
    width: f32,
    angle_offset: f32,
    center_angle: Option<f32>,
) -> Vec<Placement> {
    if members.is_empty() {
        return Vec::new();
    }

    let count = members.len();
    let slice = width / count as f32;
    let lateral = center_rotation * Vec3::X;

    members
        .iter()
        .enumerate()
        .map(|(i, member)| {
            let offset = -width / 2.0 + slice * (i as f32 + 0.5);
            let on_center = count % 2 == 1 && i == count / 2;

            let angle = if on_center {
                center_angle.unwrap_or(angle_offset)
            } else {
                angle_offset * offset.signum()
            };

            let rotation =
                center_rotation * Quat::from_rotation_z(FRAC_PI_2 + angle.to_radians());
            let position = center + lateral * offset - rotation * member.ref_offset;

            Placement {
                id: member.id,
                position,
                rotation,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn car(id: u32, width: f32, length: f32) -> Footprint {
        Footprint::new(VehicleId(id), Vec3::new(width, length, 1.5))
    }

    fn approx(a: Vec3, b: Vec3) -> bool {
        a.abs_diff_eq(b, 1e-4)
    }

    #[test]
    fn test_select_smallest_first() {
        let candidates = [car(1, 2.0, 5.0), car(2, 2.0, 4.0), car(3, 2.5, 6.0)];
        let (selected, total) = select_fitting_subset(&candidates, 10.0, FootprintAxis::Auto);
        let ids: Vec<_> = selected.iter().map(|f| f.id).collect();
        assert_eq!(ids, vec![VehicleId(2), VehicleId(1)]);
        assert_eq!(total, 9.0);
    }

    #[test]
    fn test_select_stops_at_first_overflow() {
        // 4 + 5 = 9 fits, 6 would overflow
        let candidates = [car(1, 2.0, 4.0), car(2, 2.0, 5.0), car(3, 2.0, 6.0)];
        let (selected, _) = select_fitting_subset(&candidates, 12.0, FootprintAxis::Auto);
        assert_eq!(selected.len(), 2);
    }

    #[test]
    fn test_select_exact_fit() {
        let candidates = [car(1, 2.0, 5.0), car(2, 2.0, 5.0)];
        let (selected, total) = select_fitting_subset(&candidates, 10.0, FootprintAxis::Auto);
        assert_eq!(selected.len(), 2);
        assert_eq!(total, 10.0);
    }

    #[test]
    fn test_forced_axis() {
        let candidates = [car(1, 1.0, 3.0), car(2, 1.0, 3.0), car(3, 1.0, 3.0)];
        let (by_width, _) = select_fitting_subset(&candidates, 3.0, FootprintAxis::Width);
        let (by_length, _) = select_fitting_subset(&candidates, 3.0, FootprintAxis::Length);
        assert_eq!(by_width.len(), 3);
        assert_eq!(by_length.len(), 1);
    }

    #[test]
    fn test_select_empty_when_nothing_fits() {
        let (selected, total) =
            select_fitting_subset(&[car(1, 2.0, 5.0)], 4.0, FootprintAxis::Auto);
        assert!(selected.is_empty());
        assert_eq!(total, 0.0);
    }

    #[test]
    fn test_rotation_from_basis_axes() {
        let rotation = rotation_from_basis(Vec3::X, Vec3::Z);
        assert!(approx(rotation * Vec3::Y, Vec3::X));
        assert!(approx(rotation * Vec3::Z, Vec3::Z));
    }

    #[test]
    fn test_placement_even_slices() {
        let members = [car(1, 2.0, 5.0), car(2, 2.0, 5.0)];
        let placements =
            compute_placement(&members, Vec3::ZERO, Quat::IDENTITY, 10.0, 0.0, None);
        assert_eq!(placements.len(), 2);
        assert!(approx(placements[0].position, Vec3::new(-2.5, 0.0, 0.0)));
        assert!(approx(placements[1].position, Vec3::new(2.5, 0.0, 0.0)));
    }

    #[test]
    fn test_placement_faces_across_road() {
        let members = [car(1, 2.0, 5.0)];
        let placements =
            compute_placement(&members, Vec3::ZERO, Quat::IDENTITY, 6.0, 0.0, None);
        let forward = placements[0].rotation * Vec3::Y;
        assert!(approx(forward, Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_placement_mirrors_angle_by_side() {
        let members = [car(1, 2.0, 5.0), car(2, 2.0, 5.0)];
        let placements =
            compute_placement(&members, Vec3::ZERO, Quat::IDENTITY, 10.0, 20.0, None);
        let left = placements[0].rotation * Vec3::Y;
        let right = placements[1].rotation * Vec3::Y;
        // Mirrored headings share the across-road component and flip along the road
        assert!((left.x - right.x).abs() < 1e-4);
        assert!((left.y + right.y).abs() < 1e-4);
        assert!(left.y.abs() > 0.1);
    }

    #[test]
    fn test_center_member_uses_override() {
        let members = [car(1, 2.0, 4.0), car(2, 2.0, 4.0), car(3, 2.0, 4.0)];
        let placements =
            compute_placement(&members, Vec3::ZERO, Quat::IDENTITY, 12.0, 30.0, Some(0.0));
        assert!(approx(placements[1].position, Vec3::ZERO));
        let forward = placements[1].rotation * Vec3::Y;
        assert!(approx(forward, Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_ref_offset_correction() {
        let member = car(1, 2.0, 5.0).with_ref_offset(Vec3::new(0.0, 1.0, 0.0));
        let placements =
            compute_placement(&[member], Vec3::ZERO, Quat::IDENTITY, 6.0, 0.0, None);
        // Rotated +Y offset points along -X, so the origin shifts to +X
        assert!(approx(placements[0].position, Vec3::new(1.0, 0.0, 0.0)));
    }

    #[test]
    fn test_placement_empty() {
        assert!(compute_placement(&[], Vec3::ZERO, Quat::IDENTITY, 10.0, 5.0, None).is_empty());
    }
}
