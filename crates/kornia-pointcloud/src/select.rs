use rayon::prelude::*;

use crate::bounding_box::AxisAlignedBoundingBox;
use crate::error::{PointCloudError, PointCloudResult};
use crate::pointcloud::PointCloud;

impl PointCloud {
    /// Select the entries at `indices`, or all the others with `invert`.
    ///
    /// `indices` is treated as a set: duplicates are ignored and the output
    /// follows ascending index order in both modes.
    ///
    /// # Errors
    ///
    /// Fails if any index is not lower than the number of points.
    ///
    /// Example:
    ///
    /// ```
    /// use kornia_pointcloud::PointCloud;
    ///
    /// let pcd = PointCloud::from_points(vec![[0.0; 3], [1.0; 3], [2.0; 3]]);
    /// let selected = pcd.select_by_index(&[2, 0, 2], false).unwrap();
    /// assert_eq!(selected.points(), &[[0.0; 3], [2.0; 3]]);
    /// let others = pcd.select_by_index(&[2, 0], true).unwrap();
    /// assert_eq!(others.points(), &[[1.0; 3]]);
    /// ```
    pub fn select_by_index(&self, indices: &[usize], invert: bool) -> PointCloudResult<PointCloud> {
        let len = self.len();
        if let Some(&index) = indices.iter().find(|&&i| i >= len) {
            return Err(PointCloudError::IndexOutOfRange { index, len });
        }
        self.warn_unpaired("select_by_index");

        let mut mask = vec![false; len];
        for &i in indices {
            mask[i] = true;
        }

        let selected = mask
            .par_iter()
            .enumerate()
            .filter_map(|(i, &m)| (m != invert).then_some(i))
            .collect::<Vec<_>>();

        log::debug!("select_by_index: kept {} of {} points", selected.len(), len);
        Ok(self.gather(&selected))
    }

    /// Keep the points inside the bounding box, bounds included.
    ///
    /// # Errors
    ///
    /// Fails if the minimum corner of the box exceeds the maximum corner.
    pub fn crop(&self, aabb: &AxisAlignedBoundingBox) -> PointCloudResult<PointCloud> {
        aabb.validate()?;
        self.warn_unpaired("crop");
        let indices = aabb.get_point_indices_within_bounding_box(self.points());
        Ok(self.gather(&indices))
    }
}
