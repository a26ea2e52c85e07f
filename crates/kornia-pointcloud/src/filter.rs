use kornia_kdtree::{KdTree, Neighbor, SearchParam};
use rayon::prelude::*;

use crate::error::{PointCloudError, PointCloudResult};
use crate::pointcloud::PointCloud;

// Mean plus `std_ratio` sample standard deviations of the distances.
fn distance_threshold(distances: &[f64], std_ratio: f64) -> f64 {
    let n = distances.len() as f64;
    let mean = distances.iter().sum::<f64>() / n;
    if distances.len() < 2 {
        return mean;
    }
    let sq_sum = distances
        .iter()
        .map(|d| (d - mean) * (d - mean))
        .sum::<f64>();
    mean + std_ratio * (sq_sum / (n - 1.0)).sqrt()
}

impl PointCloud {
    /// Remove the points having less than `nb_points` neighbors within `radius`.
    ///
    /// The point itself counts as one of its neighbors. Returns the filtered
    /// cloud together with the indices of the kept points.
    pub fn remove_radius_outliers(
        &self,
        nb_points: usize,
        radius: f64,
    ) -> PointCloudResult<(PointCloud, Vec<usize>)> {
        if nb_points == 0 {
            return Err(PointCloudError::InvalidArgument(
                "nb_points must be > 0".to_string(),
            ));
        }
        SearchParam::Radius { radius }.validate()?;
        self.warn_unpaired("remove_radius_outliers");

        let tree = KdTree::new(self.points());
        let keep = self
            .points()
            .par_iter()
            .enumerate()
            .filter_map(|(i, p)| {
                // a hybrid query stops counting once nb_points are found
                let found = tree.hybrid(p, radius, nb_points).len();
                (found >= nb_points).then_some(i)
            })
            .collect::<Vec<_>>();

        log::debug!(
            "remove_radius_outliers: kept {} of {} points",
            keep.len(),
            self.len()
        );
        Ok((self.gather(&keep), keep))
    }

    /// Remove the points that are further away from their neighbors than the average.
    ///
    /// For every point the mean distance to its `nb_neighbors` closest other
    /// points is computed. A point is kept when its mean distance does not
    /// exceed the global mean plus `std_ratio` sample standard deviations,
    /// normalized by `N - 1`. Returns the filtered cloud together with the
    /// indices of the kept points.
    pub fn remove_statistical_outliers(
        &self,
        nb_neighbors: usize,
        std_ratio: f64,
    ) -> PointCloudResult<(PointCloud, Vec<usize>)> {
        if nb_neighbors == 0 {
            return Err(PointCloudError::InvalidArgument(
                "nb_neighbors must be > 0".to_string(),
            ));
        }
        if !(std_ratio > 0.0 && std_ratio.is_finite()) {
            return Err(PointCloudError::InvalidArgument(format!(
                "std_ratio must be positive and finite, got {std_ratio}"
            )));
        }
        if self.is_empty() {
            return Ok((PointCloud::default(), Vec::new()));
        }
        self.warn_unpaired("remove_statistical_outliers");

        let tree = KdTree::new(self.points());
        let mean_distances = self
            .points()
            .par_iter()
            .enumerate()
            .map(|(i, p)| {
                let neighbors = tree
                    .knn(p, nb_neighbors + 1)
                    .into_iter()
                    .filter(|n| n.index != i)
                    .take(nb_neighbors)
                    .collect::<Vec<_>>();
                if neighbors.is_empty() {
                    return 0.0;
                }
                neighbors.iter().map(Neighbor::distance).sum::<f64>() / neighbors.len() as f64
            })
            .collect::<Vec<_>>();

        let threshold = distance_threshold(&mean_distances, std_ratio);

        let keep = mean_distances
            .par_iter()
            .enumerate()
            .filter_map(|(i, &d)| (d <= threshold).then_some(i))
            .collect::<Vec<_>>();

        log::debug!(
            "remove_statistical_outliers: kept {} of {} points, threshold {threshold}",
            keep.len(),
            self.len()
        );
        Ok((self.gather(&keep), keep))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn cluster_with_outlier() -> PointCloud {
        let mut points = Vec::new();
        for i in 0..5 {
            for j in 0..5 {
                points.push([i as f64 * 0.1, j as f64 * 0.1, 0.0]);
            }
        }
        points.push([10.0, 10.0, 10.0]);
        let colors = vec![[1.0, 0.0, 0.0]; points.len()];
        PointCloud::new(points, Vec::new(), colors)
    }

    #[test]
    fn test_remove_radius_outliers() -> PointCloudResult<()> {
        let pcd = cluster_with_outlier();
        let (res, kept) = pcd.remove_radius_outliers(3, 0.15)?;
        assert_eq!(res.len(), 25);
        assert_eq!(kept, (0..25).collect::<Vec<_>>());
        assert_eq!(res.colors().len(), 25);
        Ok(())
    }

    #[test]
    fn test_remove_radius_outliers_invalid() {
        let pcd = cluster_with_outlier();
        assert!(matches!(
            pcd.remove_radius_outliers(0, 1.0),
            Err(PointCloudError::InvalidArgument(_))
        ));
        assert!(matches!(
            pcd.remove_radius_outliers(2, -1.0),
            Err(PointCloudError::InvalidSearchParam(_))
        ));
    }

    #[test]
    fn test_remove_statistical_outliers() -> PointCloudResult<()> {
        let pcd = cluster_with_outlier();
        let (res, kept) = pcd.remove_statistical_outliers(4, 1.0)?;
        assert_eq!(res.len(), 25);
        assert!(!kept.contains(&25));
        Ok(())
    }

    #[test]
    fn test_distance_threshold_uses_sample_deviation() {
        // mean 2.5, squared deviations sum to 5, sample variance 5 / 3
        let distances = [1.0, 2.0, 3.0, 4.0];
        let expected = 2.5 + 2.0 * (5.0f64 / 3.0).sqrt();
        let threshold = distance_threshold(&distances, 2.0);
        assert_relative_eq!(threshold, expected, epsilon = 1e-12);
        assert_eq!(distance_threshold(&[0.7], 3.0), 0.7);
    }

    #[test]
    fn test_remove_statistical_outliers_single_point() -> PointCloudResult<()> {
        let pcd = PointCloud::from_points(vec![[1.0, 2.0, 3.0]]);
        let (res, kept) = pcd.remove_statistical_outliers(3, 1.0)?;
        assert_eq!(res, pcd);
        assert_eq!(kept, vec![0]);
        Ok(())
    }

    #[test]
    fn test_remove_statistical_outliers_invalid_and_empty() -> PointCloudResult<()> {
        let pcd = cluster_with_outlier();
        assert!(pcd.remove_statistical_outliers(0, 1.0).is_err());
        assert!(pcd.remove_statistical_outliers(3, 0.0).is_err());

        let (res, kept) = PointCloud::default().remove_statistical_outliers(3, 1.0)?;
        assert!(res.is_empty());
        assert!(kept.is_empty());
        Ok(())
    }
}
