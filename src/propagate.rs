//! Spanning-tree propagation of absolute transforms.
//!
//! Walks a spanning tree from the reference image outward, chaining pairwise
//! relative transforms into one absolute transform per reachable image.

use std::collections::VecDeque;

use nalgebra::Matrix3;

use crate::error::{AlignError, Result};
use crate::graph::WeightedGraph;
use crate::images::ImageSet;
use crate::pairwise::PairwiseSet;
use crate::types::AbsoluteHomographies;

/// Chain relative transforms along `tree` starting at `root`.
///
/// The tree decides *which* pairwise record to chain; the record itself is
/// looked up in the full pairwise set, so `absolute(child) =
/// absolute(parent) * relative(parent -> child)`. The traversal is
/// breadth-first and visits each reachable node exactly once; the order does
/// not affect the result.
///
/// A tree edge whose directed record is missing means the edge-weight matrix
/// disagreed with the available pairwise data, surfaced as
/// [`AlignError::MissingPairwiseData`]. Nodes unreachable in `tree` end up
/// absent from the returned map; a tree produced by
/// [`WeightedGraph::minimum_spanning_tree`] is always fully connected.
pub fn propagate_absolute(
    tree: &WeightedGraph,
    root: usize,
    images: &ImageSet,
    pairwise: &PairwiseSet,
) -> Result<AbsoluteHomographies> {
    let n = tree.node_count();
    let mut absolute: Vec<Option<Matrix3<f64>>> = vec![None; n];
    absolute[root] = Some(Matrix3::identity());

    let mut queue = VecDeque::with_capacity(n);
    queue.push_back(root);

    while let Some(u) = queue.pop_front() {
        let absolute_u = absolute[u].expect("queued nodes have an absolute transform");
        for v in 0..n {
            if tree.weight(u, v) == 0.0 || absolute[v].is_some() {
                continue;
            }
            let record = pairwise
                .get(u, v)
                .ok_or_else(|| AlignError::MissingPairwiseData {
                    from: name_of(images, u),
                    to: name_of(images, v),
                })?;
            absolute[v] = Some(absolute_u * record.relative);
            queue.push_back(v);
        }
    }

    let mut map = AbsoluteHomographies::new();
    for (i, h) in absolute.into_iter().enumerate() {
        if let Some(h) = h {
            map.insert(name_of(images, i), h);
        }
    }
    Ok(map)
}

fn name_of(images: &ImageSet, index: usize) -> String {
    images
        .name_of(index)
        .map(str::to_string)
        .unwrap_or_else(|| format!("#{index}"))
}
