//! Incremental re-layout of a built graph.
//!
//! Mutations shift rows or columns and ask the [`GeometryAdapter`] for the
//! matching graphical edits. Every precondition is checked before the first
//! adapter call, so a rejected mutation leaves graph and notation untouched.

use log::{debug, info, warn};

use trellis_core::{
    identifier::Id,
    notation::{NotationError, ViewRef},
};

use crate::{
    GraphError,
    adapter::GeometryAdapter,
    graph::{ClusterKind, InteractionGraph, Node, NodeId, NodeKind},
    grid::{ColumnId, RowId},
};

/// Graphical edits a mutation asks for, in application order.
#[derive(Debug, Default)]
struct Plan {
    translate: Vec<Id>,
    resize: Vec<Id>,
    anchors: Vec<ViewRef>,
}

impl Plan {
    /// Drops shapes that move along with a translated container.
    fn drop_carried_shapes(&mut self, adapter: &dyn GeometryAdapter) {
        let candidates = self.translate.clone();
        self.translate.retain(|&shape| {
            !candidates
                .iter()
                .any(|&other| other != shape && adapter.is_ancestor_or_self(other, shape))
        });
    }

    /// Keeps an anchor only if the shape it is attached to does not move.
    fn push_anchor(&mut self, adapter: &dyn GeometryAdapter, view: ViewRef) {
        let ViewRef::Anchor(connector, end) = view else {
            return;
        };
        let carried = adapter.attached_to(connector, end).is_some_and(|attached| {
            self.translate
                .iter()
                .any(|&shape| adapter.is_ancestor_or_self(shape, attached))
        });
        if !carried && !self.anchors.contains(&view) {
            self.anchors.push(view);
        }
    }

    fn edits(&self) -> impl Iterator<Item = Edit> + '_ {
        self.translate
            .iter()
            .map(|&shape| Edit::Translate(ViewRef::Shape(shape)))
            .chain(self.resize.iter().map(|&shape| Edit::Resize(shape)))
            .chain(self.anchors.iter().map(|&anchor| Edit::Translate(anchor)))
    }

    fn apply(
        &self,
        adapter: &mut dyn GeometryAdapter,
        dx: f32,
        dy: f32,
    ) -> Result<(), GraphError> {
        let edits: Vec<(Edit, f32, f32)> = self.edits().map(|edit| (edit, dx, dy)).collect();
        apply_edits(adapter, &edits)
    }
}

/// One graphical edit of a mutation.
#[derive(Debug, Clone, Copy)]
enum Edit {
    Translate(ViewRef),
    Resize(Id),
}

impl Edit {
    fn has_geometry(self, adapter: &dyn GeometryAdapter) -> bool {
        match self {
            Self::Translate(ViewRef::Shape(view)) | Self::Resize(view) => {
                adapter.bounds_of(view).is_some()
            }
            Self::Translate(ViewRef::Anchor(connector, end)) => {
                adapter.anchor_of(connector, end).is_some()
            }
        }
    }

    fn apply(self, adapter: &mut dyn GeometryAdapter, dx: f32, dy: f32) -> Result<(), NotationError> {
        match self {
            Self::Translate(view) => adapter.translate(view, dx, dy),
            Self::Resize(view) => adapter.resize(view, dx, dy),
        }
    }
}

/// Applies edits as a whole.
///
/// Every view must have geometry before the first edit. If an edit still
/// fails, the edits applied before it are undone and the mutation is
/// rejected.
fn apply_edits(
    adapter: &mut dyn GeometryAdapter,
    edits: &[(Edit, f32, f32)],
) -> Result<(), GraphError> {
    if let Some((edit, ..)) = edits.iter().find(|(edit, ..)| !edit.has_geometry(&*adapter)) {
        return Err(GraphError::rejected(format!("{edit:?} has no geometry")));
    }

    for (done, &(edit, dx, dy)) in edits.iter().enumerate() {
        if let Err(err) = edit.apply(adapter, dx, dy) {
            for &(applied, dx, dy) in edits[..done].iter().rev() {
                if let Err(undo) = applied.apply(adapter, -dx, -dy) {
                    warn!(edit:? = applied, err:% = undo; "Edit could not be undone");
                }
            }
            return Err(GraphError::rejected(format!("{edit:?} failed: {err}")));
        }
    }
    Ok(())
}

fn shape_of(node: &Node) -> Option<Id> {
    match node.view()? {
        ViewRef::Shape(view) => Some(view),
        ViewRef::Anchor(..) => None,
    }
}

/// Clusters drawn as shapes: lifelines, executions and fragments.
fn is_drawn_cluster(node: &Node) -> bool {
    matches!(
        node.cluster_kind(),
        Some(ClusterKind::Lifeline | ClusterKind::Execution | ClusterKind::Fragment(_))
    )
}

impl InteractionGraph {
    /// Moves every row from `start_row` on by `delta` pixels.
    ///
    /// Shapes lying wholly in the shifted rows are translated, clusters
    /// straddling `start_row` are stretched, and message anchors are moved
    /// unless their shape already carries them.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MutationRejected`] if `start_row` is not a leaf
    /// row, if the shifted rows would no longer lie more than the row
    /// tolerance below row `start_row - 1`, or if the adapter fails an edit.
    /// Nothing is changed in that case.
    pub fn nudge(
        &mut self,
        start_row: usize,
        delta: f32,
        adapter: &mut dyn GeometryAdapter,
    ) -> Result<(), GraphError> {
        if start_row < 2 || start_row > self.rows.len() {
            return Err(GraphError::rejected(format!(
                "row {start_row} cannot be nudged, leaf rows are 2..={}",
                self.rows.len()
            )));
        }
        let (Some(previous), Some(first)) = (self.rows.get(start_row - 1), self.rows.get(start_row))
        else {
            return Err(GraphError::rejected(format!("row {start_row} does not exist")));
        };
        let tolerance = self.config().row_tolerance();
        if first.position() + delta - previous.position() <= tolerance {
            return Err(GraphError::rejected(format!(
                "row {start_row} would move to {} which is not more than {tolerance} below row {} at {}",
                first.position() + delta,
                start_row - 1,
                previous.position()
            )));
        }

        let shifted = |index: Option<usize>| index.is_some_and(|index| index >= start_row);
        let mut plan = Plan::default();

        for node in self.nodes().filter(|node| is_drawn_cluster(node)) {
            let (Some(shape), Some((min, max))) = (shape_of(node), self.row_span(node.id())) else {
                continue;
            };
            if min >= start_row {
                plan.translate.push(shape);
            } else if max >= start_row {
                plan.resize.push(shape);
            }
        }
        for node in self.nodes().filter(|node| node.is_leaf()) {
            if let Some(shape) = shape_of(node) {
                if matches!(node.kind(), NodeKind::Gate(_))
                    && shifted(self.row_index(node.id()))
                {
                    plan.translate.push(shape);
                }
            }
        }
        plan.drop_carried_shapes(adapter);

        for node in self.nodes().filter(|node| node.is_leaf()) {
            if let Some(view @ ViewRef::Anchor(..)) = node.view() {
                if shifted(self.row_index(node.id())) {
                    plan.push_anchor(adapter, view);
                }
            }
        }

        debug!(
            start_row,
            translate = plan.translate.len(),
            resize = plan.resize.len(),
            anchors = plan.anchors.len();
            "Nudge planned"
        );
        plan.apply(adapter, 0.0, delta)?;

        let ids: Vec<RowId> = self.rows.iter().skip(start_row - 1).map(|row| row.id()).collect();
        for id in ids {
            if let Some(position) = self.rows.slot(id).map(|row| row.position()) {
                self.rows.set_position(id, position + delta);
            }
        }
        info!(start_row, delta; "Rows nudged");
        Ok(())
    }

    /// Moves every column from `start_column` on by `delta` pixels.
    ///
    /// Lifelines and gates in the shifted columns are translated; fragments
    /// covering shifted and unshifted columns are widened.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MutationRejected`] if `start_column` is out of
    /// range, or if the shifted columns would no longer lie more than the
    /// column tolerance right of column `start_column - 1`.
    pub fn nudge_column(
        &mut self,
        start_column: usize,
        delta: f32,
        adapter: &mut dyn GeometryAdapter,
    ) -> Result<(), GraphError> {
        let Some(first) = self.columns.get(start_column) else {
            return Err(GraphError::rejected(format!(
                "column {start_column} cannot be nudged, columns are 1..={}",
                self.columns.len()
            )));
        };
        if let Some(previous) = start_column.checked_sub(1).and_then(|idx| self.columns.get(idx)) {
            let tolerance = self.config().column_tolerance();
            if first.position() + delta - previous.position() <= tolerance {
                return Err(GraphError::rejected(format!(
                    "column {start_column} would move to {} which is not more than {tolerance} right of column {} at {}",
                    first.position() + delta,
                    start_column - 1,
                    previous.position()
                )));
            }
        }

        let shifted = |node: NodeId| {
            self.column_index(node)
                .is_some_and(|index| index >= start_column)
        };
        let mut plan = Plan::default();

        for node in self.nodes() {
            let Some(shape) = shape_of(node) else {
                continue;
            };
            match node.cluster_kind() {
                Some(ClusterKind::Lifeline) if shifted(node.id()) => plan.translate.push(shape),
                Some(ClusterKind::Fragment(_)) => {
                    let columns: Vec<bool> =
                        node.children().iter().map(|&slice| shifted(slice)).collect();
                    if !columns.is_empty() && columns.iter().all(|&moved| moved) {
                        plan.translate.push(shape);
                    } else if columns.iter().any(|&moved| moved) {
                        plan.resize.push(shape);
                    }
                }
                None if matches!(node.kind(), NodeKind::Gate(_)) && shifted(node.id()) => {
                    plan.translate.push(shape)
                }
                _ => {}
            }
        }
        plan.drop_carried_shapes(adapter);

        for node in self.nodes().filter(|node| node.is_leaf()) {
            if let Some(view @ ViewRef::Anchor(..)) = node.view() {
                if shifted(node.id()) {
                    plan.push_anchor(adapter, view);
                }
            }
        }

        plan.apply(adapter, delta, 0.0)?;

        let ids: Vec<ColumnId> = self
            .columns
            .iter()
            .skip(start_column - 1)
            .map(|column| column.id())
            .collect();
        for id in ids {
            if let Some(position) = self.columns.slot(id).map(|column| column.position()) {
                self.columns.set_position(id, position + delta);
            }
        }
        info!(start_column, delta; "Columns nudged");
        Ok(())
    }

    /// Moves `lifeline` in front of the lifeline `before`, or behind the last
    /// lifeline when `before` is `None`.
    ///
    /// The columns between the old and the new place keep their positions;
    /// every lifeline in that range is translated horizontally onto the
    /// column it now occupies, carrying its executions and message anchors.
    ///
    /// # Errors
    ///
    /// Returns [`GraphError::MutationRejected`] if either element is not a
    /// lifeline, if a gate column lies in the moved range, if a lifeline in
    /// the range is covered by a fragment, or if the adapter fails an edit.
    /// Nothing is changed in that case.
    pub fn move_lifeline(
        &mut self,
        lifeline: Id,
        before: Option<Id>,
        adapter: &mut dyn GeometryAdapter,
    ) -> Result<(), GraphError> {
        let from = self.lifeline_position(lifeline)?;
        let to = match before {
            Some(before) => {
                let at = self.lifeline_position(before)?;
                if at > from { at - 1 } else { at }
            }
            None => self.lifeline_clusters().len() - 1,
        };
        if from == to {
            return Ok(());
        }

        let (lo, hi) = (from.min(to), from.max(to));
        let old: Vec<NodeId> = self.lifeline_clusters()[lo..=hi].to_vec();
        let mut new = old.clone();
        let moved = new.remove(from - lo);
        new.insert(to - lo, moved);

        let mut columns = Vec::with_capacity(old.len());
        for &cluster in &old {
            let column = self
                .node(cluster)
                .and_then(Node::column)
                .ok_or_else(|| GraphError::rejected("lifeline without column"))?;
            let (Some(index), Some(position)) = (
                self.columns.index_of(column),
                self.columns.slot(column).map(|slot| slot.position()),
            ) else {
                return Err(GraphError::rejected("lifeline without column"));
            };
            columns.push((column, index, position));
        }
        let (first, last) = (columns[0].1, columns[columns.len() - 1].1);
        if last - first != hi - lo {
            return Err(GraphError::rejected(format!(
                "columns {first}..={last} hold gates between the moved lifelines"
            )));
        }
        for &cluster in &old {
            let covered = self.descendants(cluster).into_iter().any(|node| {
                self.node(node).and_then(Node::cluster_kind) == Some(ClusterKind::FragmentSlice)
            });
            if covered {
                return Err(GraphError::rejected(format!(
                    "lifeline `{}` is covered by a fragment",
                    self.node(cluster).map(Node::element).unwrap_or(lifeline)
                )));
            }
        }

        let mut edits = Vec::new();
        for (&cluster, &(_, _, target)) in new.iter().zip(&columns) {
            let Some(at) = old.iter().position(|&other| other == cluster) else {
                continue;
            };
            let dx = target - columns[at].2;
            if dx != 0.0 {
                if let Some(shape) = self.node(cluster).and_then(shape_of) {
                    edits.push((Edit::Translate(ViewRef::Shape(shape)), dx, 0.0));
                }
            }
        }
        debug!(lifeline:%, from, to, edits = edits.len(); "Lifeline move planned");
        apply_edits(adapter, &edits)?;

        self.reorder_lifeline_cluster(from, to);
        let moved_column = columns[from - lo].0;
        self.columns.move_to(moved_column, first + (to - lo));
        for (&cluster, &(_, _, target)) in new.iter().zip(&columns) {
            if let Some(column) = self.node(cluster).and_then(Node::column) {
                self.columns.set_position(column, target);
            }
        }
        info!(lifeline:%, from = from + 1, to = to + 1; "Lifeline moved");
        Ok(())
    }

    fn lifeline_position(&self, element: Id) -> Result<usize, GraphError> {
        self.node_for(element)
            .and_then(|node| {
                self.lifeline_clusters()
                    .iter()
                    .position(|&cluster| cluster == node)
            })
            .ok_or_else(|| GraphError::rejected(format!("`{element}` is not a lifeline")))
    }

    /// Inserts an empty row right after the row with 1-based index `row`.
    ///
    /// The new row sits halfway to the next row, or at the same position when
    /// `row` is the last one.
    pub fn insert_row_after(&mut self, row: usize) -> Result<RowId, GraphError> {
        let Some(position) = self.rows.get(row).map(|slot| slot.position()) else {
            return Err(GraphError::rejected(format!(
                "cannot insert after missing row {row}"
            )));
        };
        let position = match self.rows.get(row + 1) {
            Some(next) => (position + next.position()) / 2.0,
            None => position,
        };
        self.rows
            .insert_after(row, position)
            .ok_or_else(|| GraphError::rejected(format!("cannot insert after row {row}")))
    }

    /// Removes the row with 1-based index `row` if no node occupies it.
    pub fn remove_row_if_empty(&mut self, row: usize) -> bool {
        self.rows.remove_if_empty(row)
    }

    /// Inserts an empty column right after the column with 1-based index `column`.
    pub fn insert_column_after(&mut self, column: usize) -> Result<ColumnId, GraphError> {
        let Some(position) = self.columns.get(column).map(|slot| slot.position()) else {
            return Err(GraphError::rejected(format!(
                "cannot insert after missing column {column}"
            )));
        };
        let position = match self.columns.get(column + 1) {
            Some(next) => (position + next.position()) / 2.0,
            None => position,
        };
        self.columns
            .insert_after(column, position)
            .ok_or_else(|| GraphError::rejected(format!("cannot insert after column {column}")))
    }

    /// Removes the column with 1-based index `column` if no node occupies it.
    pub fn remove_column_if_empty(&mut self, column: usize) -> bool {
        self.columns.remove_if_empty(column)
    }
}
