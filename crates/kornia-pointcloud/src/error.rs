use crate::parallel::ParallelError;
use kornia_kdtree::KdTreeError;

/// An error type for the point cloud operations.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PointCloudError {
    /// The voxel size must be strictly positive and finite.
    #[error("voxel size must be positive and finite, got {0}")]
    InvalidVoxelSize(f64),

    /// The grid extent holds more voxels per axis than a voxel key can address.
    #[error("voxel size {voxel_size} is too small for a point cloud extent of {extent}")]
    VoxelSizeTooSmall {
        /// The requested voxel size.
        voxel_size: f64,
        /// The largest extent of the point cloud along one axis.
        extent: f64,
    },

    /// The stride of the uniform downsampling must be strictly positive.
    #[error("every_k_points must be > 0, got {0}")]
    InvalidStride(usize),

    /// The minimum corner of a bounding box exceeds the maximum corner.
    #[error("bounding box min bound {min:?} exceeds max bound {max:?}")]
    InvalidBoundingBox {
        /// The minimum corner.
        min: [f64; 3],
        /// The maximum corner.
        max: [f64; 3],
    },

    /// A numeric argument is outside its valid range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The neighbor search parameter is malformed.
    #[error("invalid search parameter")]
    InvalidSearchParam(#[from] KdTreeError),

    /// A selection index is not a valid point position.
    #[error("index {index} is out of range for a point cloud of {len} points")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// The number of points.
        len: usize,
    },

    /// The execution strategy could not be set up.
    #[error("parallel execution failed")]
    Parallel(#[from] ParallelError),
}

/// A result type for the point cloud operations.
pub type PointCloudResult<T> = Result<T, PointCloudError>;
