use glam::DVec3;
use rayon::prelude::*;

use crate::bounding_box::AxisAlignedBoundingBox;

/// A point cloud with points, and optionally normals and colors.
///
/// Normals and colors are index aligned with the points. An attribute is
/// considered present when its buffer is not empty, and it takes part in the
/// operations that pair it with the points only when its length matches the
/// number of points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    // The points in the point cloud.
    points: Vec<[f64; 3]>,
    // The normals of the points.
    normals: Vec<[f64; 3]>,
    // The colors of the points.
    colors: Vec<[f64; 3]>,
}

impl PointCloud {
    /// Create a new point cloud from points, normals and colors.
    ///
    /// Pass an empty vector for a missing attribute.
    pub fn new(points: Vec<[f64; 3]>, normals: Vec<[f64; 3]>, colors: Vec<[f64; 3]>) -> Self {
        Self {
            points,
            normals,
            colors,
        }
    }

    /// Create a new point cloud holding only points.
    pub fn from_points(points: Vec<[f64; 3]>) -> Self {
        Self::new(points, Vec::new(), Vec::new())
    }

    /// Get the number of points in the point cloud.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the point cloud is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Get as reference the points in the point cloud.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    /// Get as reference the normals of the points in the point cloud.
    pub fn normals(&self) -> &[[f64; 3]] {
        &self.normals
    }

    /// Get as reference the colors of the points in the point cloud.
    pub fn colors(&self) -> &[[f64; 3]] {
        &self.colors
    }

    /// Get as mutable reference the points in the point cloud.
    pub fn points_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.points
    }

    /// Get as mutable reference the normals in the point cloud.
    pub fn normals_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.normals
    }

    /// Get as mutable reference the colors in the point cloud.
    pub fn colors_mut(&mut self) -> &mut [[f64; 3]] {
        &mut self.colors
    }

    // Split borrow for the passes reading points while writing normals.
    pub(crate) fn points_and_normals_mut(&mut self) -> (&[[f64; 3]], &mut [[f64; 3]]) {
        (&self.points, &mut self.normals)
    }

    /// Replace the points.
    pub fn set_points(&mut self, points: Vec<[f64; 3]>) {
        self.points = points;
    }

    /// Replace the normals.
    pub fn set_normals(&mut self, normals: Vec<[f64; 3]>) {
        self.normals = normals;
    }

    /// Replace the colors.
    pub fn set_colors(&mut self, colors: Vec<[f64; 3]>) {
        self.colors = colors;
    }

    /// Move the points, normals and colors out of the point cloud.
    pub fn into_parts(self) -> (Vec<[f64; 3]>, Vec<[f64; 3]>, Vec<[f64; 3]>) {
        (self.points, self.normals, self.colors)
    }

    /// Check if the point cloud holds points.
    #[inline]
    pub fn has_points(&self) -> bool {
        !self.points.is_empty()
    }

    /// Check if the point cloud holds normals.
    #[inline]
    pub fn has_normals(&self) -> bool {
        !self.normals.is_empty()
    }

    /// Check if the point cloud holds colors.
    #[inline]
    pub fn has_colors(&self) -> bool {
        !self.colors.is_empty()
    }

    // Normals index aligned with the points.
    pub(crate) fn has_paired_normals(&self) -> bool {
        self.has_normals() && self.normals.len() == self.points.len()
    }

    // Colors index aligned with the points.
    pub(crate) fn has_paired_colors(&self) -> bool {
        self.has_colors() && self.colors.len() == self.points.len()
    }

    pub(crate) fn warn_unpaired(&self, op: &str) {
        if self.has_normals() && !self.has_paired_normals() {
            log::warn!(
                "{op}: ignoring {} normals for {} points",
                self.normals.len(),
                self.points.len()
            );
        }
        if self.has_colors() && !self.has_paired_colors() {
            log::warn!(
                "{op}: ignoring {} colors for {} points",
                self.colors.len(),
                self.points.len()
            );
        }
    }

    /// Build a new point cloud from the entries at `indices`.
    ///
    /// PRECONDITION: every index is lower than the number of points.
    pub(crate) fn gather(&self, indices: &[usize]) -> PointCloud {
        let gather_attr = |attr: &[[f64; 3]], paired: bool| -> Vec<[f64; 3]> {
            if paired {
                indices.par_iter().map(|&i| attr[i]).collect()
            } else {
                Vec::new()
            }
        };
        PointCloud {
            points: gather_attr(&self.points, true),
            normals: gather_attr(&self.normals, self.has_paired_normals()),
            colors: gather_attr(&self.colors, self.has_paired_colors()),
        }
    }

    /// Empty the points, normals and colors.
    pub fn clear(&mut self) {
        self.points.clear();
        self.normals.clear();
        self.colors.clear();
    }

    /// Get the minimum bound of the point cloud.
    ///
    /// Returns the zero vector if the point cloud is empty.
    pub fn get_min_bound(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        self.points
            .par_iter()
            .map(|p| DVec3::from_array(*p))
            .reduce(|| DVec3::INFINITY, |a, b| a.min(b))
    }

    /// Get the maximum bound of the point cloud.
    ///
    /// Returns the zero vector if the point cloud is empty.
    pub fn get_max_bound(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        self.points
            .par_iter()
            .map(|p| DVec3::from_array(*p))
            .reduce(|| DVec3::NEG_INFINITY, |a, b| a.max(b))
    }

    /// Get the mean of the points, or the zero vector if empty.
    pub fn get_center(&self) -> DVec3 {
        if self.points.is_empty() {
            return DVec3::ZERO;
        }
        let sum = self
            .points
            .par_iter()
            .map(|p| DVec3::from_array(*p))
            .reduce(|| DVec3::ZERO, |a, b| a + b);
        sum / self.points.len() as f64
    }

    /// Get the axis aligned bounding box enclosing the points.
    pub fn get_axis_aligned_bounding_box(&self) -> AxisAlignedBoundingBox {
        AxisAlignedBoundingBox::new(self.get_min_bound(), self.get_max_bound())
    }

    /// Assign the same color to every point.
    pub fn paint_uniform_color(&mut self, color: [f64; 3]) {
        self.colors = vec![color; self.points.len()];
    }

    /// Remove the points with NaN and/or infinite coordinates.
    ///
    /// Returns a new point cloud carrying the index aligned normals and colors
    /// of the remaining points.
    pub fn remove_non_finite_points(&self, remove_nan: bool, remove_infinite: bool) -> PointCloud {
        self.warn_unpaired("remove_non_finite_points");
        let keep = self
            .points
            .par_iter()
            .enumerate()
            .filter_map(|(i, p)| {
                let has_nan = remove_nan && p.iter().any(|v| v.is_nan());
                let has_inf = remove_infinite && p.iter().any(|v| v.is_infinite());
                (!has_nan && !has_inf).then_some(i)
            })
            .collect::<Vec<_>>();

        log::debug!(
            "remove_non_finite_points: removed {} of {} points",
            self.points.len() - keep.len(),
            self.points.len()
        );
        self.gather(&keep)
    }
}

impl std::ops::AddAssign<&PointCloud> for PointCloud {
    /// Append the entries of `other`.
    ///
    /// An attribute survives when both clouds carry it index aligned, or when
    /// `self` is empty and `other` carries it.
    fn add_assign(&mut self, other: &PointCloud) {
        if other.is_empty() {
            return;
        }
        if self.is_empty() {
            *self = other.clone();
            return;
        }
        let keep_normals = self.has_paired_normals() && other.has_paired_normals();
        let keep_colors = self.has_paired_colors() && other.has_paired_colors();

        self.points.extend_from_slice(&other.points);
        if keep_normals {
            self.normals.extend_from_slice(&other.normals);
        } else {
            self.normals.clear();
        }
        if keep_colors {
            self.colors.extend_from_slice(&other.colors);
        } else {
            self.colors.clear();
        }
    }
}

impl std::ops::Add<&PointCloud> for &PointCloud {
    type Output = PointCloud;

    fn add(self, other: &PointCloud) -> PointCloud {
        let mut res = self.clone();
        res += other;
        res
    }
}
