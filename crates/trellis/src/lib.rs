//! Trellis - An interaction graph for sequence diagrams.
//!
//! Trellis reconciles the semantic model of a sequence interaction (lifelines,
//! messages, executions, fragments, gates) with its graphical notation. The
//! resulting [`InteractionGraph`] places every element on a grid of rows and
//! columns, answers structural queries, and drives incremental re-layout
//! through a [`GeometryAdapter`](adapter::GeometryAdapter).

pub mod adapter;
pub mod config;
pub mod path;

mod builder;
mod constraint;
mod error;
mod graph;
mod grid;
mod layout;
mod mutation;
mod query;
mod validate;

pub use trellis_core::{geometry, identifier, notation, semantic};

pub use error::{GraphError, PathError};
pub use graph::{
    ClusterKind, GateKind, InteractionGraph, Link, LinkId, MarkKind, Node, NodeId, NodeKind,
};
pub use grid::{ColumnId, RowId, Slot, SlotHandle, SlotIndex};

use log::info;

use adapter::GeometryAdapter;
use builder::Builder;
use config::AppConfig;
use notation::Notation;
use semantic::SemanticModel;

/// Builder for interaction graphs.
///
/// # Examples
///
/// ```rust
/// use trellis::{
///     GraphBuilder,
///     adapter::NotationSurface,
///     config::AppConfig,
///     identifier::Id,
///     notation::Diagram,
///     semantic::Interaction,
/// };
///
/// let interaction = Interaction::new(Id::new("empty"));
/// let diagram = Diagram::new(Vec::new(), Vec::new()).expect("valid diagram");
/// let surface = NotationSurface::new(diagram);
///
/// let builder = GraphBuilder::new(AppConfig::default());
/// let graph = builder
///     .build(&interaction, surface.diagram(), &surface)
///     .expect("graph builds");
/// assert!(graph.lifeline_clusters().is_empty());
/// ```
#[derive(Default)]
pub struct GraphBuilder {
    config: AppConfig,
}

impl GraphBuilder {
    /// Create a new graph builder with the given configuration.
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration the builder uses.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Build the interaction graph of one snapshot.
    ///
    /// The build is a pure function of its inputs: building twice from the
    /// same snapshot yields the same rows, columns and containment.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::Unsupported`] for message ends the graph cannot
    /// resolve, such as lost and found messages, and
    /// [`GraphError::StructuralInconsistency`] when the semantic model is
    /// mis-nested or the ordering constraints contradict each other.
    pub fn build(
        &self,
        semantic: &dyn SemanticModel,
        notation: &dyn Notation,
        adapter: &dyn GeometryAdapter,
    ) -> Result<InteractionGraph, GraphError> {
        info!(
            interaction:% = semantic.interaction(),
            lifelines = semantic.lifelines().len(),
            messages = semantic.messages().len();
            "Building graph"
        );
        Builder::new(semantic, notation).build(adapter, self.config.graph())
    }
}
