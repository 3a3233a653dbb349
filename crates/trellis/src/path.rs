//! Path-style lookup into an interaction graph.
//!
//! A path is a `/`-separated list of steps, each a collection name followed
//! by a 1-based index:
//!
//! ```text
//! lifelineClusters[2]/nodes[1]/nodes[3]
//! fragmentClusters[1]/outerGates[1]
//! rows[4]/nodes[2]
//! ```
//!
//! Root collections: `lifelineClusters`, `fragmentClusters`, `formalGates`,
//! `messageLinks`, `rows`, `columns`. Node collections: `nodes` (children of
//! a cluster), `clusters` (children that are clusters, or the slices of a
//! fragment cluster), `outerGates` and `ownedFragmentClusters` (fragment
//! clusters only). Rows and columns expose their member `nodes`.

use std::str::FromStr;

use winnow::{
    Parser as _,
    ascii::{alpha1, digit1},
    combinator::{delimited, separated},
    error::{ContextError, ErrMode, StrContext},
};

use crate::{
    error::PathError,
    graph::{ClusterKind, InteractionGraph, LinkId, NodeId},
    grid::{ColumnId, RowId},
};

type Input<'src> = &'src str;
type IResult<O> = Result<O, ErrMode<ContextError>>;

/// A named collection a step selects from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    LifelineClusters,
    FragmentClusters,
    FormalGates,
    MessageLinks,
    Rows,
    Columns,
    Nodes,
    Clusters,
    OuterGates,
    OwnedFragmentClusters,
}

impl FromStr for Collection {
    type Err = PathError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        match name {
            "lifelineClusters" => Ok(Self::LifelineClusters),
            "fragmentClusters" => Ok(Self::FragmentClusters),
            "formalGates" => Ok(Self::FormalGates),
            "messageLinks" => Ok(Self::MessageLinks),
            "rows" => Ok(Self::Rows),
            "columns" => Ok(Self::Columns),
            "nodes" => Ok(Self::Nodes),
            "clusters" => Ok(Self::Clusters),
            "outerGates" => Ok(Self::OuterGates),
            "ownedFragmentClusters" => Ok(Self::OwnedFragmentClusters),
            _ => Err(PathError::UnknownStep(name.to_string())),
        }
    }
}

/// One parsed step: a collection and a 1-based index into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Step {
    collection: Collection,
    index: usize,
}

impl Step {
    pub fn collection(self) -> Collection {
        self.collection
    }

    pub fn index(self) -> usize {
        self.index
    }

    fn label(self) -> String {
        format!("{:?}", self.collection)
    }
}

/// What a path resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolved {
    Node(NodeId),
    Link(LinkId),
    Row(RowId),
    Column(ColumnId),
}

impl Resolved {
    pub fn node(self) -> Option<NodeId> {
        match self {
            Self::Node(node) => Some(node),
            _ => None,
        }
    }

    pub fn link(self) -> Option<LinkId> {
        match self {
            Self::Link(link) => Some(link),
            _ => None,
        }
    }

    pub fn row(self) -> Option<RowId> {
        match self {
            Self::Row(row) => Some(row),
            _ => None,
        }
    }

    pub fn column(self) -> Option<ColumnId> {
        match self {
            Self::Column(column) => Some(column),
            _ => None,
        }
    }
}

fn index(input: &mut Input<'_>) -> IResult<usize> {
    delimited('[', digit1.try_map(str::parse::<usize>), ']')
        .context(StrContext::Label("index"))
        .parse_next(input)
}

fn step<'src>(input: &mut Input<'src>) -> IResult<(&'src str, usize)> {
    (alpha1.context(StrContext::Label("collection")), index).parse_next(input)
}

fn steps<'src>(input: &mut Input<'src>) -> IResult<Vec<(&'src str, usize)>> {
    separated(1.., step, '/').parse_next(input)
}

/// Parses a path into steps.
pub fn parse(path: &str) -> Result<Vec<Step>, PathError> {
    let raw = steps.parse(path.trim()).map_err(|err| PathError::Syntax {
        path: path.to_string(),
        offset: err.offset(),
    })?;

    raw.into_iter()
        .map(|(name, index)| {
            let collection = name.parse::<Collection>()?;
            if index == 0 {
                return Err(PathError::ZeroIndex(name.to_string()));
            }
            Ok(Step { collection, index })
        })
        .collect()
}

fn pick<T: Copy>(items: &[T], step: Step) -> Result<T, PathError> {
    items
        .get(step.index - 1)
        .copied()
        .ok_or_else(|| PathError::OutOfRange {
            step: step.label(),
            index: step.index,
        })
}

impl InteractionGraph {
    /// Resolves a path query.
    ///
    /// # Examples
    ///
    /// ```
    /// # use trellis::path::Resolved;
    /// # fn check(graph: &trellis::InteractionGraph) -> Result<(), trellis::PathError> {
    /// let first = graph.resolve("lifelineClusters[1]/nodes[1]")?;
    /// assert!(matches!(first, Resolved::Node(_)));
    /// # Ok(())
    /// # }
    /// ```
    pub fn resolve(&self, path: &str) -> Result<Resolved, PathError> {
        let steps = parse(path)?;
        let mut current: Option<Resolved> = None;
        for step in steps {
            current = Some(self.resolve_step(current, step)?);
        }
        current.ok_or_else(|| PathError::Syntax {
            path: path.to_string(),
            offset: 0,
        })
    }

    /// Resolves a path that must end on a node.
    pub fn resolve_node(&self, path: &str) -> Result<NodeId, PathError> {
        self.resolve(path)?
            .node()
            .ok_or_else(|| PathError::NotApplicable(path.to_string()))
    }

    fn resolve_step(&self, current: Option<Resolved>, step: Step) -> Result<Resolved, PathError> {
        let not_applicable = || PathError::NotApplicable(step.label());
        match current {
            None => match step.collection {
                Collection::LifelineClusters => {
                    pick(self.lifeline_clusters(), step).map(Resolved::Node)
                }
                Collection::FragmentClusters => {
                    pick(self.fragment_clusters(), step).map(Resolved::Node)
                }
                Collection::FormalGates => pick(self.formal_gates(), step).map(Resolved::Node),
                Collection::MessageLinks => {
                    let links: Vec<LinkId> = self.links().map(|link| link.id()).collect();
                    pick(&links, step).map(Resolved::Link)
                }
                Collection::Rows => self
                    .rows()
                    .get(step.index)
                    .map(|row| Resolved::Row(row.id()))
                    .ok_or_else(|| PathError::OutOfRange {
                        step: step.label(),
                        index: step.index,
                    }),
                Collection::Columns => self
                    .columns()
                    .get(step.index)
                    .map(|column| Resolved::Column(column.id()))
                    .ok_or_else(|| PathError::OutOfRange {
                        step: step.label(),
                        index: step.index,
                    }),
                _ => Err(not_applicable()),
            },
            Some(Resolved::Node(id)) => {
                let node = self.node(id).ok_or_else(not_applicable)?;
                let is_fragment = matches!(node.cluster_kind(), Some(ClusterKind::Fragment(_)));
                match step.collection {
                    Collection::Nodes if node.is_cluster() && !is_fragment => {
                        pick(node.children(), step).map(Resolved::Node)
                    }
                    Collection::Clusters if is_fragment => {
                        pick(node.children(), step).map(Resolved::Node)
                    }
                    Collection::Clusters if node.is_cluster() => {
                        let clusters: Vec<NodeId> = node
                            .children()
                            .iter()
                            .copied()
                            .filter(|&child| self.node(child).is_some_and(|n| n.is_cluster()))
                            .collect();
                        pick(&clusters, step).map(Resolved::Node)
                    }
                    Collection::OuterGates if is_fragment => {
                        pick(node.outer_gates(), step).map(Resolved::Node)
                    }
                    Collection::OwnedFragmentClusters if is_fragment => {
                        pick(node.owned_fragments(), step).map(Resolved::Node)
                    }
                    _ => Err(not_applicable()),
                }
            }
            Some(Resolved::Row(row)) => match step.collection {
                Collection::Nodes => {
                    let nodes = self.rows().slot(row).map(|row| row.nodes()).unwrap_or(&[]);
                    pick(nodes, step).map(Resolved::Node)
                }
                _ => Err(not_applicable()),
            },
            Some(Resolved::Column(column)) => match step.collection {
                Collection::Nodes => {
                    let nodes = self
                        .columns()
                        .slot(column)
                        .map(|column| column.nodes())
                        .unwrap_or(&[]);
                    pick(nodes, step).map(Resolved::Node)
                }
                _ => Err(not_applicable()),
            },
            Some(Resolved::Link(_)) => Err(not_applicable()),
        }
    }
}
