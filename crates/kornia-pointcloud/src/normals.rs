use glam::DVec3;
use kornia_kdtree::{KdTree, Neighbor, SearchParam};
use rayon::prelude::*;

use crate::covariance::{compute_mean_and_covariance, smallest_eigenvector};
use crate::error::PointCloudResult;
use crate::pointcloud::PointCloud;

/// Minimum number of neighbors needed to fit a plane.
pub const MIN_NEIGHBORS: usize = 3;

// Normal of the plane fitted to the neighborhood, `None` when degenerate.
fn fit_normal(points: &[[f64; 3]], neighbors: &[Neighbor]) -> Option<DVec3> {
    if neighbors.len() < MIN_NEIGHBORS {
        return None;
    }
    let indices = neighbors.iter().map(|n| n.index).collect::<Vec<_>>();
    let (_, covariance) = compute_mean_and_covariance(points, &indices);
    smallest_eigenvector(&covariance)
}

impl PointCloud {
    /// Estimate a normal for every point from its local neighborhood.
    ///
    /// The normal is the direction of least variance of the neighborhood
    /// returned by `param`, the query point included. Points with fewer than
    /// three neighbors get a zero normal. The sign of each normal is arbitrary,
    /// unless the cloud already carries normals: then every new normal is
    /// flipped to agree with the previous one at the same index.
    ///
    /// # Errors
    ///
    /// Fails without touching the cloud if `param` is malformed.
    pub fn estimate_normals(&mut self, param: &SearchParam) -> PointCloudResult<()> {
        param.validate()?;

        let points = self.points();
        let tree = KdTree::new(points);
        let neighborhoods = tree.search_batch(points, param)?;
        let previous = self.has_paired_normals().then(|| self.normals());

        let estimated = neighborhoods
            .par_iter()
            .enumerate()
            .map(|(i, neighbors)| {
                let normal = fit_normal(points, neighbors)?;
                match previous {
                    Some(previous) if normal.dot(DVec3::from_array(previous[i])) < 0.0 => {
                        Some(-normal)
                    }
                    _ => Some(normal),
                }
            })
            .collect::<Vec<_>>();

        let degenerate = estimated.iter().filter(|n| n.is_none()).count();
        if degenerate > 0 {
            log::debug!(
                "estimate_normals: {degenerate} of {} points lack neighbors",
                points.len()
            );
        }

        let normals = estimated
            .into_iter()
            .map(|n| n.unwrap_or(DVec3::ZERO).to_array())
            .collect();
        self.set_normals(normals);
        Ok(())
    }

    /// Rescale every normal to unit length, zero normals stay zero.
    pub fn normalize_normals(&mut self) -> &mut Self {
        self.normals_mut().par_iter_mut().for_each(|n| {
            *n = DVec3::from_array(*n).normalize_or_zero().to_array();
        });
        self
    }

    /// Flip every normal pointing away from `direction`.
    ///
    /// After the call `dot(n, direction) >= 0` holds for every normal. This is
    /// a per point sign flip, no orientation is propagated between neighbors.
    pub fn orient_normals_to_align_with_direction(&mut self, direction: DVec3) -> &mut Self {
        self.normals_mut().par_iter_mut().for_each(|n| {
            let normal = DVec3::from_array(*n);
            if normal.dot(direction) < 0.0 {
                *n = (-normal).to_array();
            }
        });
        self
    }

    /// Flip every normal so that it faces `camera_location`.
    pub fn orient_normals_towards_camera_location(&mut self, camera_location: DVec3) -> &mut Self {
        if !self.has_paired_normals() {
            self.warn_unpaired("orient_normals_towards_camera_location");
            return self;
        }
        let (points, normals) = self.points_and_normals_mut();
        normals
            .par_iter_mut()
            .zip(points.par_iter())
            .for_each(|(n, p)| {
                let normal = DVec3::from_array(*n);
                if normal.dot(camera_location - DVec3::from_array(*p)) < 0.0 {
                    *n = (-normal).to_array();
                }
            });
        self
    }

    /// Distance from every point to its closest other point.
    ///
    /// A cloud with a single point yields a zero distance.
    pub fn compute_nearest_neighbor_distance(&self) -> Vec<f64> {
        let tree = KdTree::new(self.points());
        self.points()
            .par_iter()
            .map(|p| {
                tree.knn(p, 2)
                    .get(1)
                    .map(Neighbor::distance)
                    .unwrap_or(0.0)
            })
            .collect()
    }
}
