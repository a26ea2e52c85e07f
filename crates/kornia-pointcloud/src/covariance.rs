use glam::{DMat3, DVec3};

/// Compute the centroid and the covariance matrix of the points at `indices`.
///
/// The covariance is taken about the centroid and normalized by the number of
/// points. Returns zeros when `indices` is empty.
///
/// PRECONDITION: every index is lower than `points.len()`.
pub fn compute_mean_and_covariance(points: &[[f64; 3]], indices: &[usize]) -> (DVec3, DMat3) {
    if indices.is_empty() {
        return (DVec3::ZERO, DMat3::ZERO);
    }
    let inv_count = 1.0 / indices.len() as f64;

    let mean = indices
        .iter()
        .fold(DVec3::ZERO, |acc, &i| acc + DVec3::from_array(points[i]))
        * inv_count;

    // accumulate the upper triangle of the symmetric matrix
    let mut c = [0.0f64; 6];
    for &i in indices {
        let d = DVec3::from_array(points[i]) - mean;
        c[0] += d.x * d.x;
        c[1] += d.x * d.y;
        c[2] += d.x * d.z;
        c[3] += d.y * d.y;
        c[4] += d.y * d.z;
        c[5] += d.z * d.z;
    }
    for v in c.iter_mut() {
        *v *= inv_count;
    }

    let covariance = DMat3::from_cols(
        DVec3::new(c[0], c[1], c[2]),
        DVec3::new(c[1], c[3], c[4]),
        DVec3::new(c[2], c[4], c[5]),
    );
    (mean, covariance)
}

/// Unit eigenvector of the smallest eigenvalue of a symmetric 3x3 matrix.
///
/// The sign of the result is arbitrary. Returns `None` if the matrix holds
/// non finite values.
pub fn smallest_eigenvector(covariance: &DMat3) -> Option<DVec3> {
    if !covariance.is_finite() {
        return None;
    }
    let mat = faer::Mat::<f64>::from_fn(3, 3, |i, j| covariance.col(j)[i]);
    let evd = mat.selfadjoint_eigendecomposition(faer::Side::Lower);
    let eigenvalues = evd.s().column_vector();
    let eigenvectors = evd.u();

    let mut min_idx = 0;
    for i in 1..3 {
        if eigenvalues.read(i) < eigenvalues.read(min_idx) {
            min_idx = i;
        }
    }

    let normal = DVec3::new(
        eigenvectors.read(0, min_idx),
        eigenvectors.read(1, min_idx),
        eigenvectors.read(2, min_idx),
    );
    Some(normal.normalize_or_zero())
}
