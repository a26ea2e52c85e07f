#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

/// Axis aligned bounding boxes.
pub mod bounding_box;

/// Mean and covariance of point neighborhoods.
pub mod covariance;

/// Voxel and uniform downsampling.
pub mod downsample;

/// Error types for the point cloud operations.
pub mod error;

/// Radius and statistical outlier removal.
pub mod filter;

/// Normal estimation and orientation.
pub mod normals;

/// Thread pool selection for the parallel operations.
pub mod parallel;

/// The point cloud container.
pub mod pointcloud;

/// Index based selection and cropping.
pub mod select;

/// Affine transforms of points and normals.
pub mod transforms;

pub use bounding_box::AxisAlignedBoundingBox;
pub use error::{PointCloudError, PointCloudResult};
pub use kornia_kdtree::{KdTree, Neighbor, SearchParam};
pub use parallel::ExecutionStrategy;
pub use pointcloud::PointCloud;
