use glam::{DMat3, DMat4, DVec3, DVec4};
use rayon::prelude::*;

use crate::pointcloud::PointCloud;

/// Build a 4x4 matrix from its rows.
///
/// `glam` stores matrices column major, this helper reads literal row major
/// fixtures.
///
/// Example:
///
/// ```
/// use kornia_pointcloud::transforms::mat4_from_row_major;
///
/// let m = mat4_from_row_major(&[
///     [1.0, 0.0, 0.0, 5.0],
///     [0.0, 1.0, 0.0, 0.0],
///     [0.0, 0.0, 1.0, 0.0],
///     [0.0, 0.0, 0.0, 1.0],
/// ]);
/// assert_eq!(m.w_axis.x, 5.0);
/// ```
pub fn mat4_from_row_major(rows: &[[f64; 4]; 4]) -> DMat4 {
    DMat4::from_cols_array_2d(rows).transpose()
}

/// Apply the homogeneous transform to a point.
///
/// The result is divided by the homogeneous coordinate when it is not one.
#[inline]
pub fn transform_point(transformation: &DMat4, point: &[f64; 3]) -> [f64; 3] {
    let h = *transformation * DVec4::new(point[0], point[1], point[2], 1.0);
    let p = h.truncate();
    if h.w != 1.0 {
        (p / h.w).to_array()
    } else {
        p.to_array()
    }
}

/// Apply the linear part of the transform to a normal, without renormalizing.
#[inline]
pub fn transform_normal(linear: &DMat3, normal: &[f64; 3]) -> [f64; 3] {
    (*linear * DVec3::from_array(*normal)).to_array()
}

impl PointCloud {
    /// Transform the point cloud in place by a 4x4 matrix.
    ///
    /// Points are mapped as homogeneous coordinates. Normals are mapped by the
    /// upper left 3x3 block and keep their length, call
    /// [`PointCloud::normalize_normals`] afterwards if unit normals are needed.
    pub fn transform(&mut self, transformation: &DMat4) -> &mut Self {
        let linear = DMat3::from_mat4(*transformation);
        let transform_normals = self.has_paired_normals();

        self.points_mut()
            .par_iter_mut()
            .for_each(|p| *p = transform_point(transformation, p));

        if transform_normals {
            self.normals_mut()
                .par_iter_mut()
                .for_each(|n| *n = transform_normal(&linear, n));
        } else {
            self.warn_unpaired("transform");
        }
        self
    }

    /// Translate the point cloud.
    ///
    /// With `relative` the points are shifted by `translation`, otherwise the
    /// center of the cloud is moved to `translation`.
    pub fn translate(&mut self, translation: DVec3, relative: bool) -> &mut Self {
        let offset = if relative {
            translation
        } else {
            translation - self.get_center()
        };
        self.points_mut().par_iter_mut().for_each(|p| {
            *p = (DVec3::from_array(*p) + offset).to_array();
        });
        self
    }

    /// Scale the point cloud about `center`.
    pub fn scale(&mut self, scale: f64, center: DVec3) -> &mut Self {
        self.points_mut().par_iter_mut().for_each(|p| {
            *p = ((DVec3::from_array(*p) - center) * scale + center).to_array();
        });
        self
    }

    /// Rotate the point cloud about `center`, normals are rotated as well.
    pub fn rotate(&mut self, rotation: &DMat3, center: DVec3) -> &mut Self {
        let rotate_normals = self.has_paired_normals();
        self.points_mut().par_iter_mut().for_each(|p| {
            *p = (*rotation * (DVec3::from_array(*p) - center) + center).to_array();
        });
        if rotate_normals {
            self.normals_mut()
                .par_iter_mut()
                .for_each(|n| *n = transform_normal(rotation, n));
        }
        self
    }
}
