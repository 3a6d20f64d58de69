//! Progress observation hooks.
//!
//! The alignment pipeline reports its milestones through a trait object
//! instead of printing; callers wire up logging, progress bars or test
//! recorders without the core knowing about any of them.

/// Milestone emitted by the alignment pipeline, in pipeline order.
#[derive(Debug, Clone, PartialEq)]
pub enum AlignmentEvent {
    /// The minimum spanning tree over the pairwise graph was extracted.
    MstExtracted {
        /// Number of undirected tree edges, `image count - 1` when connected.
        tree_edges: usize,
    },
    /// Initial absolute transforms were propagated along the tree.
    InitialPropagated {
        /// Number of images that received an absolute transform.
        images: usize,
    },
    /// Global refinement is about to start.
    RefineStarted {
        /// Name of the solver backend in use.
        backend: &'static str,
        /// Total number of scalar parameters being optimized.
        parameters: usize,
    },
    /// Global refinement finished.
    RefineFinished {
        mean_residual_before: f64,
        mean_residual_after: f64,
    },
}

/// Receiver for [`AlignmentEvent`]s.
pub trait AlignmentObserver {
    fn on_event(&self, event: &AlignmentEvent);
}

/// Observer that discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullObserver;

impl AlignmentObserver for NullObserver {
    fn on_event(&self, _event: &AlignmentEvent) {}
}

/// Observer forwarding every event to the `log` facade at info level.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogObserver;

impl AlignmentObserver for LogObserver {
    fn on_event(&self, event: &AlignmentEvent) {
        match event {
            AlignmentEvent::MstExtracted { tree_edges } => {
                log::info!("spanning tree extracted with {tree_edges} edges");
            }
            AlignmentEvent::InitialPropagated { images } => {
                log::info!("initial absolute transforms propagated to {images} images");
            }
            AlignmentEvent::RefineStarted {
                backend,
                parameters,
            } => {
                log::info!("refinement started: backend={backend}, {parameters} parameters");
            }
            AlignmentEvent::RefineFinished {
                mean_residual_before,
                mean_residual_after,
            } => {
                log::info!(
                    "refinement finished: mean |residual| {mean_residual_before:.6e} -> {mean_residual_after:.6e}"
                );
            }
        }
    }
}
