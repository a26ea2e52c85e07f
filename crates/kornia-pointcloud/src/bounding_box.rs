use glam::DVec3;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{PointCloudError, PointCloudResult};

/// An axis aligned bounding box given by its minimum and maximum corners.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AxisAlignedBoundingBox {
    /// The minimum corner.
    pub min_bound: DVec3,
    /// The maximum corner.
    pub max_bound: DVec3,
}

impl AxisAlignedBoundingBox {
    /// Create a new bounding box from its corners.
    pub fn new(min_bound: DVec3, max_bound: DVec3) -> Self {
        Self {
            min_bound,
            max_bound,
        }
    }

    /// Check that the minimum corner does not exceed the maximum corner.
    pub fn validate(&self) -> PointCloudResult<()> {
        if self.min_bound.cmpgt(self.max_bound).any() {
            return Err(PointCloudError::InvalidBoundingBox {
                min: self.min_bound.to_array(),
                max: self.max_bound.to_array(),
            });
        }
        Ok(())
    }

    /// The center of the box.
    pub fn center(&self) -> DVec3 {
        (self.min_bound + self.max_bound) * 0.5
    }

    /// The edge lengths of the box.
    pub fn extent(&self) -> DVec3 {
        self.max_bound - self.min_bound
    }

    /// The volume of the box.
    pub fn volume(&self) -> f64 {
        let extent = self.extent();
        extent.x * extent.y * extent.z
    }

    /// Check if a point lies inside the box, the bounds are inclusive.
    #[inline]
    pub fn contains(&self, point: &[f64; 3]) -> bool {
        (0..3).all(|i| self.min_bound[i] <= point[i] && point[i] <= self.max_bound[i])
    }

    /// Indices of the points inside the box, in ascending order.
    pub fn get_point_indices_within_bounding_box(&self, points: &[[f64; 3]]) -> Vec<usize> {
        points
            .par_iter()
            .enumerate()
            .filter_map(|(i, p)| self.contains(p).then_some(i))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_aabb_geometry() {
        let aabb =
            AxisAlignedBoundingBox::new(DVec3::new(0.0, 0.0, 0.0), DVec3::new(2.0, 4.0, 6.0));
        assert_eq!(aabb.center(), DVec3::new(1.0, 2.0, 3.0));
        assert_eq!(aabb.extent(), DVec3::new(2.0, 4.0, 6.0));
        assert_relative_eq!(aabb.volume(), 48.0);
        assert!(aabb.validate().is_ok());
    }

    #[test]
    fn test_aabb_contains_is_inclusive() {
        let aabb = AxisAlignedBoundingBox::new(DVec3::ZERO, DVec3::ONE);
        assert!(aabb.contains(&[0.0, 0.0, 0.0]));
        assert!(aabb.contains(&[1.0, 1.0, 1.0]));
        assert!(aabb.contains(&[0.5, 1.0, 0.0]));
        assert!(!aabb.contains(&[1.0000001, 0.5, 0.5]));
        assert!(!aabb.contains(&[0.5, -0.1, 0.5]));
    }

    #[test]
    fn test_aabb_indices() {
        let aabb = AxisAlignedBoundingBox::new(DVec3::ZERO, DVec3::ONE);
        let points = vec![
            [0.5, 0.5, 0.5],
            [2.0, 0.5, 0.5],
            [1.0, 1.0, 1.0],
            [-1.0, 0.0, 0.0],
        ];
        assert_eq!(
            aabb.get_point_indices_within_bounding_box(&points),
            vec![0, 2]
        );
    }

    #[test]
    fn test_aabb_invalid() {
        let aabb = AxisAlignedBoundingBox::new(DVec3::new(1.0, 0.0, 0.0), DVec3::ZERO);
        assert!(matches!(
            aabb.validate(),
            Err(PointCloudError::InvalidBoundingBox { .. })
        ));
    }
}
