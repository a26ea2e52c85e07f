#![deny(missing_docs)]
#![doc = env!("CARGO_PKG_DESCRIPTION")]

mod heap;

/// Neighbor search parameters.
pub mod search_param;

/// The k-d tree implementation.
pub mod tree;

pub use search_param::SearchParam;
pub use tree::{KdTree, Neighbor, DEFAULT_LEAF_SIZE};

/// Errors that can occur when configuring a neighbor search.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum KdTreeError {
    /// The number of nearest neighbors must be strictly positive.
    #[error("knn must be > 0, got {0}")]
    InvalidKnn(usize),

    /// The search radius must be strictly positive and finite.
    #[error("radius must be positive and finite, got {0}")]
    InvalidRadius(f64),

    /// The maximum number of neighbors of a hybrid search must be strictly positive.
    #[error("max_nn must be > 0, got {0}")]
    InvalidMaxNn(usize),

    /// The leaf size of the tree must be strictly positive.
    #[error("leaf size must be > 0")]
    InvalidLeafSize,
}
