//! Weighted directed graph over the image set and its minimum spanning tree.
//!
//! The graph is a dense N x N weight matrix where 0 means "no edge". Node
//! counts are expected in the tens to low hundreds, so the O(N^2) Prim
//! implementation below is deliberate; a priority queue only pays off well
//! beyond that scale.

use nalgebra::{DMatrix, Vector2};

use crate::error::{AlignError, Result};

/// Weighted directed graph over a fixed node set.
///
/// Node labels are carried along for error reporting; optional 2D node
/// positions are stored for diagnostic rendering only and play no role in
/// any computation here.
#[derive(Debug, Clone)]
pub struct WeightedGraph {
    labels: Vec<String>,
    weights: DMatrix<f64>,
    positions: Option<Vec<Vector2<f64>>>,
}

impl WeightedGraph {
    /// Build a graph from node labels and a non-negative weight matrix.
    ///
    /// Panics if the matrix is not square over the label count, or if
    /// positions are given for a different number of nodes.
    pub fn new(
        labels: Vec<String>,
        weights: DMatrix<f64>,
        positions: Option<Vec<Vector2<f64>>>,
    ) -> Self {
        assert_eq!(weights.nrows(), labels.len(), "weight matrix must be square over the node set");
        assert_eq!(weights.ncols(), labels.len(), "weight matrix must be square over the node set");
        if let Some(positions) = &positions {
            assert_eq!(positions.len(), labels.len(), "one position per node");
        }
        Self {
            labels,
            weights,
            positions,
        }
    }

    pub fn node_count(&self) -> usize {
        self.labels.len()
    }

    pub fn weight(&self, from: usize, to: usize) -> f64 {
        self.weights[(from, to)]
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    /// Diagnostic node positions, if any were supplied.
    pub fn positions(&self) -> Option<&[Vector2<f64>]> {
        self.positions.as_deref()
    }

    /// Number of node pairs connected in either direction.
    pub fn undirected_edge_count(&self) -> usize {
        let n = self.node_count();
        let mut count = 0;
        for i in 0..n {
            for j in (i + 1)..n {
                if self.weights[(i, j)] != 0.0 || self.weights[(j, i)] != 0.0 {
                    count += 1;
                }
            }
        }
        count
    }

    /// Extract the minimum spanning tree rooted at `root` with Prim's
    /// algorithm.
    ///
    /// Node selection scans indices in ascending order and takes the first
    /// strictly smaller cost, so ties always resolve to the lowest index;
    /// this tie-break is part of the determinism contract. The resulting
    /// graph contains only tree edges, with each tree edge's weight written
    /// to both directions even when the source matrix was asymmetric.
    ///
    /// Fails with [`AlignError::DisconnectedGraph`] when some node cannot be
    /// reached from the root.
    pub fn minimum_spanning_tree(&self, root: usize) -> Result<WeightedGraph> {
        let n = self.node_count();
        let mut best_cost = vec![f64::INFINITY; n];
        let mut parent: Vec<Option<usize>> = vec![None; n];
        let mut settled = vec![false; n];
        best_cost[root] = 0.0;

        for _ in 0..n {
            let u = self.next_unsettled(&best_cost, &settled)?;
            settled[u] = true;

            for v in 0..n {
                let w = self.weights[(u, v)];
                if w > 0.0 && !settled[v] && best_cost[v] > w {
                    best_cost[v] = w;
                    parent[v] = Some(u);
                }
            }
        }

        let mut tree = DMatrix::zeros(n, n);
        for v in 0..n {
            if let Some(p) = parent[v] {
                let w = self.weights[(p, v)];
                tree[(p, v)] = w;
                tree[(v, p)] = w;
            }
        }

        Ok(WeightedGraph {
            labels: self.labels.clone(),
            weights: tree,
            positions: self.positions.clone(),
        })
    }

    /// Unsettled node with the minimum known connection cost, lowest index
    /// first on ties. `None` left means the remaining nodes are unreachable.
    fn next_unsettled(&self, best_cost: &[f64], settled: &[bool]) -> Result<usize> {
        let mut min_cost = f64::INFINITY;
        let mut min_index = None;
        for v in 0..best_cost.len() {
            if !settled[v] && best_cost[v] < min_cost {
                min_cost = best_cost[v];
                min_index = Some(v);
            }
        }
        min_index.ok_or_else(|| {
            let unreachable = (0..settled.len()).find(|&v| !settled[v]).unwrap_or(0);
            AlignError::DisconnectedGraph {
                image: self.labels[unreachable].clone(),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(n: usize) -> Vec<String> {
        (0..n).map(|i| format!("img_{i}")).collect()
    }

    fn symmetric(n: usize, edges: &[(usize, usize, f64)]) -> DMatrix<f64> {
        let mut weights = DMatrix::zeros(n, n);
        for &(i, j, w) in edges {
            weights[(i, j)] = w;
            weights[(j, i)] = w;
        }
        weights
    }

    #[test]
    fn mst_of_a_connected_graph_is_a_tree() {
        // Square with a heavy diagonal; the diagonal must be dropped.
        let weights = symmetric(
            4,
            &[
                (0, 1, 1.0),
                (1, 2, 2.0),
                (2, 3, 1.0),
                (3, 0, 2.0),
                (0, 2, 10.0),
            ],
        );
        let graph = WeightedGraph::new(labels(4), weights, None);
        let tree = graph.minimum_spanning_tree(0).unwrap();

        assert_eq!(tree.undirected_edge_count(), 3);
        assert_eq!(tree.weight(0, 2), 0.0);
        assert_eq!(tree.weight(2, 0), 0.0);
        // Tree edges are symmetric.
        assert_eq!(tree.weight(0, 1), tree.weight(1, 0));
    }

    #[test]
    fn mst_is_deterministic_with_equal_weights() {
        // All edges weigh the same; the lowest-index expansion must win.
        let weights = symmetric(3, &[(0, 1, 1.0), (0, 2, 1.0), (1, 2, 1.0)]);
        let graph = WeightedGraph::new(labels(3), weights, None);

        let a = graph.minimum_spanning_tree(0).unwrap();
        let b = graph.minimum_spanning_tree(0).unwrap();
        for i in 0..3 {
            for j in 0..3 {
                assert_eq!(a.weight(i, j), b.weight(i, j));
            }
        }
        // Node 1 is settled before node 2, so both hang off the root.
        assert_eq!(a.weight(0, 1), 1.0);
        assert_eq!(a.weight(0, 2), 1.0);
        assert_eq!(a.weight(1, 2), 0.0);
    }

    #[test]
    fn tree_edges_are_symmetrized_from_an_asymmetric_source() {
        let mut weights = DMatrix::zeros(2, 2);
        weights[(0, 1)] = 3.0;
        let graph = WeightedGraph::new(labels(2), weights, None);
        let tree = graph.minimum_spanning_tree(0).unwrap();
        assert_eq!(tree.weight(0, 1), 3.0);
        assert_eq!(tree.weight(1, 0), 3.0);
    }

    #[test]
    fn disconnected_graph_is_an_error_naming_the_unreachable_node() {
        let weights = symmetric(4, &[(0, 1, 1.0), (1, 2, 2.0)]);
        let graph = WeightedGraph::new(labels(4), weights, None);
        let err = graph.minimum_spanning_tree(0).unwrap_err();
        assert!(matches!(
            err,
            AlignError::DisconnectedGraph { image } if image == "img_3"
        ));
    }

    #[test]
    fn single_node_graph_has_an_empty_tree() {
        let graph = WeightedGraph::new(labels(1), DMatrix::zeros(1, 1), None);
        let tree = graph.minimum_spanning_tree(0).unwrap();
        assert_eq!(tree.undirected_edge_count(), 0);
    }
}
