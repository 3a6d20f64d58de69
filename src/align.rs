//! End-to-end alignment pipeline.
//!
//! Ties the stages together: build the pairwise graph, extract its minimum
//! spanning tree, propagate initial absolute transforms from the reference
//! image, then hand the problem to the configured solver backend for global
//! refinement.

use std::collections::HashMap;

use nalgebra::Vector2;

use crate::error::{AlignError, Result};
use crate::family::TransformFamily;
use crate::graph::WeightedGraph;
use crate::images::ImageSet;
use crate::observer::{AlignmentEvent, AlignmentObserver, NullObserver};
use crate::pairwise::PairwiseSet;
use crate::propagate::propagate_absolute;
use crate::residual::ResidualModel;
use crate::solvers::{RefineProblem, SolverBackend};
use crate::types::{flatten_absolute, AbsoluteHomographies};

/// Tunable knobs of the alignment pipeline.
#[derive(Debug, Clone, Copy)]
pub struct AlignmentSettings {
    /// Transform family the refinement constrains every image to.
    pub family: TransformFamily,
    /// Maximum number of correspondences used per pair during refinement.
    pub inlier_cap: usize,
}

impl Default for AlignmentSettings {
    fn default() -> Self {
        Self {
            family: TransformFamily::Homography,
            inlier_cap: 20,
        }
    }
}

/// Alignment pipeline parameterized over the refinement backend.
pub struct Aligner<B: SolverBackend> {
    settings: AlignmentSettings,
    backend: B,
    observer: Box<dyn AlignmentObserver>,
}

impl<B: SolverBackend> Aligner<B> {
    pub fn new(settings: AlignmentSettings, backend: B) -> Self {
        Self {
            settings,
            backend,
            observer: Box::new(NullObserver),
        }
    }

    /// Replace the progress observer.
    pub fn with_observer(mut self, observer: Box<dyn AlignmentObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Compute one absolute transform per image, with `reference` anchored to
    /// the identity.
    ///
    /// `locations` are optional rough image positions carried on the graph
    /// for diagnostics; they do not influence the result. Fails when the
    /// reference is not in the image set, when the pairwise graph does not
    /// connect every image, or when the backend fails.
    pub fn align(
        &self,
        images: &ImageSet,
        pairwise: &PairwiseSet,
        reference: &str,
        locations: Option<&HashMap<String, Vector2<f64>>>,
    ) -> Result<AbsoluteHomographies> {
        let root = images
            .index_of(reference)
            .ok_or_else(|| AlignError::UnknownImage {
                image: reference.to_string(),
            })?;

        let positions = locations.map(|map| {
            images
                .names()
                .iter()
                .map(|name| map.get(name).copied().unwrap_or_else(Vector2::zeros))
                .collect()
        });
        let graph = WeightedGraph::new(
            images.names().to_vec(),
            pairwise.edge_matrix(images.len()),
            positions,
        );

        let tree = graph.minimum_spanning_tree(root)?;
        self.observer.on_event(&AlignmentEvent::MstExtracted {
            tree_edges: tree.undirected_edge_count(),
        });

        let initial = propagate_absolute(&tree, root, images, pairwise)?;
        self.observer.on_event(&AlignmentEvent::InitialPropagated {
            images: initial.len(),
        });
        log::info!(
            "propagated initial transforms for {} of {} images",
            initial.len(),
            images.len()
        );

        let model = ResidualModel::new(
            images.len(),
            pairwise,
            self.settings.family,
            root,
            self.settings.inlier_cap,
        );
        let initial_params = flatten_absolute(images, &initial)?;
        let before = model.mean_abs_residual(&initial_params);

        self.observer.on_event(&AlignmentEvent::RefineStarted {
            backend: self.backend.name(),
            parameters: model.parameter_count(),
        });
        let problem = RefineProblem {
            images,
            pairwise,
            initial: &initial,
            family: self.settings.family,
            reference,
            inlier_cap: self.settings.inlier_cap,
        };
        let refined = self.backend.refine(&problem)?;

        let refined_params = flatten_absolute(images, &refined)?;
        let after = model.mean_abs_residual(&refined_params);
        self.observer.on_event(&AlignmentEvent::RefineFinished {
            mean_residual_before: before,
            mean_residual_after: after,
        });
        log::info!("global refinement: mean |residual| {before:.6e} -> {after:.6e}");

        Ok(refined)
    }
}
