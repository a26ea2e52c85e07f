use rayon::prelude::*;

use crate::heap::NeighborHeap;
use crate::{KdTreeError, SearchParam};

/// Default maximum number of points stored in a leaf.
pub const DEFAULT_LEAF_SIZE: usize = 10;

/// A neighbor returned by a query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    /// Index of the point in the buffer the tree was built from.
    pub index: usize,
    /// Squared Euclidean distance to the query point.
    pub distance_squared: f64,
}

impl Neighbor {
    /// Euclidean distance to the query point.
    #[inline]
    pub fn distance(&self) -> f64 {
        self.distance_squared.sqrt()
    }
}

// Nodes live in a flat arena and refer to each other by index.
#[derive(Debug, Clone)]
enum Node {
    // a contiguous range of the permutation array
    Leaf {
        start: usize,
        end: usize,
    },
    // points on the left have `p[axis] <= value`, on the right `p[axis] >= value`
    Split {
        axis: usize,
        value: f64,
        left: usize,
        right: usize,
    },
}

/// A balanced k-d tree over a snapshot of 3d points.
///
/// The tree copies the positions at construction time. If the source buffer
/// changes afterwards the tree must be rebuilt.
///
/// Example:
///
/// ```
/// use kornia_kdtree::KdTree;
///
/// let points = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 2.0, 0.0]];
/// let tree = KdTree::new(&points);
/// let nn = tree.knn(&[0.9, 0.0, 0.0], 1);
/// assert_eq!(nn[0].index, 1);
/// ```
#[derive(Debug, Clone)]
pub struct KdTree {
    points: Vec<[f64; 3]>,
    indices: Vec<usize>,
    nodes: Vec<Node>,
    root: Option<usize>,
}

#[inline]
fn distance_squared(a: &[f64; 3], b: &[f64; 3]) -> f64 {
    let dx = a[0] - b[0];
    let dy = a[1] - b[1];
    let dz = a[2] - b[2];
    dx * dx + dy * dy + dz * dz
}

// axis with the largest extent among the given points
fn widest_axis(points: &[[f64; 3]], indices: &[usize]) -> usize {
    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for &i in indices {
        for axis in 0..3 {
            min[axis] = min[axis].min(points[i][axis]);
            max[axis] = max[axis].max(points[i][axis]);
        }
    }
    let spread = [max[0] - min[0], max[1] - min[1], max[2] - min[2]];
    let mut axis = 0;
    for a in 1..3 {
        if spread[a] > spread[axis] {
            axis = a;
        }
    }
    axis
}

fn build_node(
    nodes: &mut Vec<Node>,
    points: &[[f64; 3]],
    indices: &mut [usize],
    offset: usize,
    leaf_size: usize,
) -> usize {
    if indices.len() <= leaf_size {
        nodes.push(Node::Leaf {
            start: offset,
            end: offset + indices.len(),
        });
        return nodes.len() - 1;
    }

    let axis = widest_axis(points, indices);
    let mid = indices.len() / 2;
    indices.select_nth_unstable_by(mid, |&a, &b| {
        points[a][axis].total_cmp(&points[b][axis]).then(a.cmp(&b))
    });
    let value = points[indices[mid]][axis];

    // reserve the slot, children are filled in below
    let node_id = nodes.len();
    nodes.push(Node::Leaf { start: 0, end: 0 });

    let (lower, upper) = indices.split_at_mut(mid);
    let left = build_node(nodes, points, lower, offset, leaf_size);
    let right = build_node(nodes, points, upper, offset + mid, leaf_size);
    nodes[node_id] = Node::Split {
        axis,
        value,
        left,
        right,
    };
    node_id
}

impl KdTree {
    /// Build a tree with the default leaf size.
    pub fn new(points: &[[f64; 3]]) -> Self {
        Self::build(points, DEFAULT_LEAF_SIZE)
    }

    /// Build a tree storing at most `leaf_size` points per leaf.
    pub fn with_leaf_size(points: &[[f64; 3]], leaf_size: usize) -> Result<Self, KdTreeError> {
        if leaf_size == 0 {
            return Err(KdTreeError::InvalidLeafSize);
        }
        Ok(Self::build(points, leaf_size))
    }

    fn build(points: &[[f64; 3]], leaf_size: usize) -> Self {
        let points = points.to_vec();
        let mut indices = (0..points.len()).collect::<Vec<_>>();
        let mut nodes = Vec::with_capacity(2 * points.len() / leaf_size + 1);

        let root = if points.is_empty() {
            None
        } else {
            Some(build_node(&mut nodes, &points, &mut indices, 0, leaf_size))
        };

        log::debug!(
            "built kd-tree over {} points with {} nodes",
            points.len(),
            nodes.len()
        );

        Self {
            points,
            indices,
            nodes,
            root,
        }
    }

    /// Number of points indexed by the tree.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Check if the tree indexes no points.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// The positions the tree was built from.
    pub fn points(&self) -> &[[f64; 3]] {
        &self.points
    }

    fn search_node(&self, node: usize, query: &[f64; 3], heap: &mut NeighborHeap) {
        match self.nodes[node] {
            Node::Leaf { start, end } => {
                for &i in &self.indices[start..end] {
                    heap.push(i, distance_squared(&self.points[i], query));
                }
            }
            Node::Split {
                axis,
                value,
                left,
                right,
            } => {
                let diff = query[axis] - value;
                let (near, far) = if diff < 0.0 {
                    (left, right)
                } else {
                    (right, left)
                };
                self.search_node(near, query, heap);
                // ties on the splitting plane may still hold a lower index
                if diff * diff <= heap.bound() {
                    self.search_node(far, query, heap);
                }
            }
        }
    }

    fn collect(
        &self,
        query: &[f64; 3],
        capacity: usize,
        max_distance_squared: f64,
    ) -> Vec<Neighbor> {
        let mut heap = NeighborHeap::new(capacity, max_distance_squared);
        if let Some(root) = self.root {
            self.search_node(root, query, &mut heap);
        }
        heap.into_sorted_vec()
    }

    /// Find the `k` nearest neighbors of `query`.
    ///
    /// Results are sorted by distance and equal distances resolve to the lower
    /// point index. A stored point equal to the query is part of the result.
    pub fn knn(&self, query: &[f64; 3], k: usize) -> Vec<Neighbor> {
        self.collect(query, k, f64::INFINITY)
    }

    /// Find every point within `radius` of `query`, the bound is inclusive.
    ///
    /// The order of the result is not part of the contract.
    pub fn radius(&self, query: &[f64; 3], radius: f64) -> Vec<Neighbor> {
        self.collect(query, usize::MAX, radius * radius)
    }

    /// Find the `max_nn` closest points within `radius` of `query`.
    pub fn hybrid(&self, query: &[f64; 3], radius: f64, max_nn: usize) -> Vec<Neighbor> {
        self.collect(query, max_nn, radius * radius)
    }

    fn search_unchecked(&self, query: &[f64; 3], param: &SearchParam) -> Vec<Neighbor> {
        match *param {
            SearchParam::Knn { knn } => self.knn(query, knn),
            SearchParam::Radius { radius } => self.radius(query, radius),
            SearchParam::Hybrid { radius, max_nn } => self.hybrid(query, radius, max_nn),
        }
    }

    /// Query the neighborhood of `query` as configured by `param`.
    pub fn search(
        &self,
        query: &[f64; 3],
        param: &SearchParam,
    ) -> Result<Vec<Neighbor>, KdTreeError> {
        param.validate()?;
        Ok(self.search_unchecked(query, param))
    }

    /// Query the neighborhoods of many points in parallel.
    ///
    /// The i-th result belongs to the i-th query.
    pub fn search_batch(
        &self,
        queries: &[[f64; 3]],
        param: &SearchParam,
    ) -> Result<Vec<Vec<Neighbor>>, KdTreeError> {
        param.validate()?;
        Ok(queries
            .par_iter()
            .map(|query| self.search_unchecked(query, param))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    fn random_points(n: usize, seed: u64) -> Vec<[f64; 3]> {
        let mut rng = StdRng::seed_from_u64(seed);
        (0..n)
            .map(|_| {
                [
                    rng.random_range(0.0..10.0),
                    rng.random_range(0.0..10.0),
                    rng.random_range(0.0..10.0),
                ]
            })
            .collect()
    }

    fn brute_force(points: &[[f64; 3]], query: &[f64; 3]) -> Vec<Neighbor> {
        let mut all = points
            .iter()
            .enumerate()
            .map(|(index, p)| Neighbor {
                index,
                distance_squared: distance_squared(p, query),
            })
            .collect::<Vec<_>>();
        all.sort_by(|a, b| {
            a.distance_squared
                .total_cmp(&b.distance_squared)
                .then(a.index.cmp(&b.index))
        });
        all
    }

    #[test]
    fn test_knn_smoke() {
        let points = vec![
            [0.0, 0.0, 0.0],
            [1.0, 0.0, 0.0],
            [0.0, 1.0, 0.0],
            [0.0, 0.0, 1.0],
        ];
        let tree = KdTree::new(&points);
        let knn = tree.knn(&[0.0, 0.0, 0.0], 1);
        assert_eq!(knn.len(), 1);
        assert_eq!(knn[0].index, 0);
        assert_eq!(knn[0].distance_squared, 0.0);
    }

    #[test]
    fn test_empty_tree() {
        let tree = KdTree::new(&[]);
        assert!(tree.is_empty());
        assert!(tree.knn(&[0.0, 0.0, 0.0], 3).is_empty());
        assert!(tree.radius(&[0.0, 0.0, 0.0], 1.0).is_empty());
    }

    #[test]
    fn test_knn_matches_brute_force() -> Result<(), KdTreeError> {
        let points = random_points(500, 7);
        let queries = random_points(50, 8);
        let tree = KdTree::with_leaf_size(&points, 4)?;

        for query in queries.iter() {
            let expected = brute_force(&points, query);
            let got = tree.knn(query, 12);
            assert_eq!(got, expected[..12].to_vec());
        }
        Ok(())
    }

    #[test]
    fn test_knn_more_than_points() {
        let points = random_points(5, 1);
        let tree = KdTree::new(&points);
        let got = tree.knn(&[5.0, 5.0, 5.0], 10);
        assert_eq!(got.len(), 5);
    }

    #[test]
    fn test_knn_ties_resolve_to_lower_index() -> Result<(), KdTreeError> {
        // many duplicates force equal distances across leaves
        let mut points = Vec::new();
        for _ in 0..8 {
            for x in 0..4 {
                points.push([x as f64, 0.0, 0.0]);
            }
        }
        let tree = KdTree::with_leaf_size(&points, 2)?;
        let got = tree.knn(&[0.0, 0.0, 0.0], 8);
        let indices = got.iter().map(|n| n.index).collect::<Vec<_>>();
        assert_eq!(indices, vec![0, 4, 8, 12, 16, 20, 24, 28]);
        Ok(())
    }

    #[test]
    fn test_radius_matches_brute_force() {
        let points = random_points(300, 3);
        let tree = KdTree::new(&points);
        let query = [5.0, 5.0, 5.0];
        let radius = 2.5;

        let expected = brute_force(&points, &query)
            .into_iter()
            .filter(|n| n.distance_squared <= radius * radius)
            .collect::<Vec<_>>();

        let mut got = tree.radius(&query, radius);
        got.sort_by_key(|n| n.index);
        let mut expected_sorted = expected.clone();
        expected_sorted.sort_by_key(|n| n.index);
        assert_eq!(got, expected_sorted);
    }

    #[test]
    fn test_hybrid_is_capped_radius() {
        let points = random_points(300, 4);
        let tree = KdTree::new(&points);
        let query = [2.0, 3.0, 4.0];

        let within = tree.radius(&query, 3.0);
        assert!(within.len() > 5);

        let capped = tree.hybrid(&query, 3.0, 5);
        assert_eq!(capped, within[..5].to_vec());

        let far = tree.hybrid(&query, 1e-9, 5);
        assert!(far.iter().all(|n| n.distance_squared <= 1e-18));
    }

    #[test]
    fn test_search_validates_param() {
        let tree = KdTree::new(&random_points(10, 0));
        let res = tree.search(&[0.0, 0.0, 0.0], &SearchParam::Knn { knn: 0 });
        assert_eq!(res, Err(KdTreeError::InvalidKnn(0)));
        assert!(KdTree::with_leaf_size(&[], 0).is_err());
    }

    #[test]
    fn test_search_batch_preserves_order() -> Result<(), KdTreeError> {
        let points = random_points(200, 11);
        let tree = KdTree::new(&points);
        let param = SearchParam::Knn { knn: 1 };
        let res = tree.search_batch(&points, &param)?;
        assert_eq!(res.len(), points.len());
        for (i, neighbors) in res.iter().enumerate() {
            assert_eq!(neighbors[0].index, i);
        }
        Ok(())
    }
}
