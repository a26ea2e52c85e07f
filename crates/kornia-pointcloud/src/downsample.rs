use glam::DVec3;
use rayon::prelude::*;

use crate::error::{PointCloudError, PointCloudResult};
use crate::pointcloud::PointCloud;

/// Integer coordinates of a voxel in the grid.
pub type VoxelKey = [i32; 3];

/// Compute the voxel key of a point given the grid origin and the voxel size.
#[inline]
pub fn compute_voxel_key(point: &[f64; 3], origin: DVec3, voxel_size: f64) -> VoxelKey {
    let v = ((DVec3::from_array(*point) - origin) / voxel_size).floor();
    [v.x as i32, v.y as i32, v.z as i32]
}

// Mean of the attribute over one run of the sorted (key, index) pairs.
fn segment_mean(attr: &[[f64; 3]], run: &[(VoxelKey, usize)]) -> [f64; 3] {
    let sum = run
        .iter()
        .fold(DVec3::ZERO, |acc, &(_, i)| acc + DVec3::from_array(attr[i]));
    (sum / run.len() as f64).to_array()
}

impl PointCloud {
    /// Keep every `every_k_points`-th point, starting with the first one.
    ///
    /// The output holds `ceil(N / every_k_points)` points in their original
    /// order with their normals and colors.
    ///
    /// # Errors
    ///
    /// Fails if `every_k_points` is zero.
    pub fn uniform_down_sample(&self, every_k_points: usize) -> PointCloudResult<PointCloud> {
        if every_k_points == 0 {
            return Err(PointCloudError::InvalidStride(every_k_points));
        }
        self.warn_unpaired("uniform_down_sample");
        let indices = (0..self.len()).step_by(every_k_points).collect::<Vec<_>>();
        Ok(self.gather(&indices))
    }

    /// Downsample the point cloud with a regular voxel grid.
    ///
    /// The grid starts at the minimum bound of the cloud. The points falling
    /// in the same voxel are replaced by their mean, and so are their normals
    /// and colors when present. Normals are averaged but not renormalized.
    /// Voxels are emitted in ascending key order. Points with a NaN or
    /// infinite coordinate are skipped.
    ///
    /// # Errors
    ///
    /// Fails if `voxel_size` is not strictly positive and finite, or too small
    /// to index the extent of the cloud.
    pub fn voxel_down_sample(&self, voxel_size: f64) -> PointCloudResult<PointCloud> {
        if !(voxel_size > 0.0 && voxel_size.is_finite()) {
            return Err(PointCloudError::InvalidVoxelSize(voxel_size));
        }
        if self.is_empty() {
            return Ok(PointCloud::default());
        }

        let non_finite = self
            .points()
            .par_iter()
            .filter(|p| !p.iter().all(|v| v.is_finite()))
            .count();
        if non_finite > 0 {
            log::warn!("voxel_down_sample: skipping {non_finite} non finite points");
            return self
                .remove_non_finite_points(true, true)
                .voxel_down_sample(voxel_size);
        }

        let origin = self.get_min_bound();
        let extent = (self.get_max_bound() - origin).max_element();
        if extent / voxel_size >= i32::MAX as f64 {
            return Err(PointCloudError::VoxelSizeTooSmall { voxel_size, extent });
        }
        self.warn_unpaired("voxel_down_sample");

        // sort by key, then reduce every run of equal keys
        let mut keyed = self
            .points()
            .par_iter()
            .enumerate()
            .map(|(i, p)| (compute_voxel_key(p, origin, voxel_size), i))
            .collect::<Vec<_>>();
        keyed.par_sort_unstable();

        let mut segments = Vec::new();
        let mut start = 0;
        for i in 1..=keyed.len() {
            if i == keyed.len() || keyed[i].0 != keyed[start].0 {
                segments.push(start..i);
                start = i;
            }
        }

        let reduce = |attr: &[[f64; 3]], paired: bool| -> Vec<[f64; 3]> {
            if !paired {
                return Vec::new();
            }
            segments
                .par_iter()
                .map(|range| segment_mean(attr, &keyed[range.clone()]))
                .collect()
        };

        let downsampled = PointCloud::new(
            reduce(self.points(), true),
            reduce(self.normals(), self.has_paired_normals()),
            reduce(self.colors(), self.has_paired_colors()),
        );

        log::debug!(
            "voxel_down_sample: {} points into {} voxels of size {voxel_size}",
            self.len(),
            downsampled.len()
        );
        Ok(downsampled)
    }
}
