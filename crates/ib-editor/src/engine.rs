//! The canvas engine: single owner of board state.
//!
//! Everything the host does goes through [`CanvasEngine`]:
//!
//! - **Input**: pointer, wheel and key events are routed to the gesture
//!   controller, the viewport, or the shortcut map. Node drags mutate the
//!   store on every move; pan/zoom commits are throttled.
//! - **Commands**: add/delete/edit nodes, expand, reorganize, set use case.
//! - **Service results**: `resolve_*` applies a completed combine, expand or
//!   generation as one atomic batch, or discards it if stale.
//! - **Tick**: flushes the viewport, abandons timed-out operations, and runs
//!   layout when the scheduler allows it.
//!
//! All of it is synchronous. Nothing here awaits or locks.

use crate::error::{EngineError, Result};
use crate::gesture::{CursorHint, GestureAction, GestureContext, GestureController};
use crate::input::{InputEvent, Modifiers};
use crate::orchestrator::{ExpandPlan, InFlightOp, OpId, OpKind, Orchestrator, Outcome, Resolution, ServiceRequest};
use crate::schedule::LayoutScheduler;
use crate::service::{CombineResponse, ExpandResponse, ServiceError, TopicsResponse};
use crate::shortcuts::{ShortcutAction, ShortcutMap};
use ib_core::{
    ApproxMetrics, BoardSnapshot, CanvasConfig, GraphError, IdeaGraph, IdeaNode, LayoutAlgorithm, NodeId, NodeKind,
    Point, Size, TextMetrics, TreeLayout, ViewTransform, ViewportController, ZoomDirection, measure_node, relayout,
};
use ib_render::scene::{DisplayList, SceneInput, build_display_list};
use serde::Serialize;

/// A single change to the node store.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphMutation {
    MoveNode { id: NodeId, x: f32, y: f32 },
    RaiseNode { id: NodeId },
    AddNode { node: Box<IdeaNode> },
    /// Cascades to the node's subtree.
    RemoveNode { id: NodeId },
    SetText { id: NodeId, text: String },
    ResizeNode { id: NodeId, width: f32, height: f32 },
}

impl GraphMutation {
    /// Apply to `graph`. Returns ids removed as a side effect.
    fn apply(self, graph: &mut IdeaGraph) -> std::result::Result<Vec<NodeId>, GraphError> {
        match self {
            GraphMutation::MoveNode { id, x, y } => graph.update_position(id, x, y).map(|_| Vec::new()),
            GraphMutation::RaiseNode { id } => graph.raise_to_top(id).map(|_| Vec::new()),
            GraphMutation::AddNode { node } => graph.upsert(*node).map(|_| Vec::new()),
            GraphMutation::RemoveNode { id } => graph.remove(id).map(|gone| gone.into_iter().map(|n| n.id).collect()),
            GraphMutation::SetText { id, text } => graph.update_text(id, &text).map(|_| Vec::new()),
            GraphMutation::ResizeNode { id, width, height } => {
                graph.update_size(id, width, height).map(|_| Vec::new())
            }
        }
    }

    fn is_structural(&self) -> bool {
        matches!(self, GraphMutation::AddNode { .. } | GraphMutation::RemoveNode { .. })
    }
}

/// Dismissible user-facing message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notice {
    pub id: u64,
    pub message: String,
}

/// Result of [`CanvasEngine::request_expand`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum ExpandStatus {
    /// Existing expansions were removed.
    Collapsed { removed: usize },
    Requested { op: OpId },
}

/// What a tick did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TickReport {
    pub layout_ran: bool,
    pub abandoned: usize,
    pub viewport_committed: bool,
}

pub struct CanvasEngine {
    graph: IdeaGraph,
    config: CanvasConfig,
    viewport: ViewportController,
    gesture: GestureController,
    orchestrator: Orchestrator,
    scheduler: LayoutScheduler,
    layout: Box<dyn LayoutAlgorithm>,
    metrics: Box<dyn TextMetrics>,
    use_case: Option<String>,
    selected: Option<NodeId>,
    notices: Vec<Notice>,
    next_notice: u64,
    screen: Size,
    /// Bumped on every visible change so hosts can skip redundant redraws.
    revision: u64,
}

impl Default for CanvasEngine {
    fn default() -> Self {
        Self::new(CanvasConfig::default())
    }
}

impl CanvasEngine {
    pub fn new(config: CanvasConfig) -> Self {
        Self {
            graph: IdeaGraph::new(),
            viewport: ViewportController::from_config(&config),
            gesture: GestureController::new(),
            orchestrator: Orchestrator::new(),
            scheduler: LayoutScheduler::new(config.layout_cooldown_ms),
            layout: Box::new(TreeLayout),
            metrics: Box::new(ApproxMetrics::default()),
            config,
            use_case: None,
            selected: None,
            notices: Vec::new(),
            next_notice: 0,
            screen: Size {
                width: 800.0,
                height: 600.0,
            },
            revision: 0,
        }
    }

    pub fn with_layout(mut self, layout: Box<dyn LayoutAlgorithm>) -> Self {
        self.layout = layout;
        self
    }

    pub fn with_metrics(mut self, metrics: Box<dyn TextMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    // ─── Read access ─────────────────────────────────────────────────────

    pub fn graph(&self) -> &IdeaGraph {
        &self.graph
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn use_case(&self) -> Option<&str> {
        self.use_case.as_deref()
    }

    /// The committed view, i.e. what is on screen.
    pub fn view(&self) -> ViewTransform {
        self.viewport.committed()
    }

    pub fn screen_to_world(&self, sx: f32, sy: f32) -> Point {
        self.viewport.screen_to_world(sx, sy)
    }

    pub fn selected(&self) -> Option<NodeId> {
        self.selected
    }

    pub fn candidate(&self) -> Option<(NodeId, NodeId)> {
        self.gesture.candidate()
    }

    pub fn dragged(&self) -> Option<NodeId> {
        self.gesture.dragged()
    }

    pub fn cursor(&self) -> CursorHint {
        self.gesture.cursor()
    }

    pub fn is_busy(&self, id: NodeId) -> bool {
        self.orchestrator.is_locked(id)
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &InFlightOp> {
        self.orchestrator.in_flight()
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot::capture(&self.graph, self.use_case.as_deref())
    }

    pub fn display_list(&self) -> DisplayList {
        let busy = |id: NodeId| self.orchestrator.is_locked(id);
        build_display_list(&SceneInput {
            graph: &self.graph,
            view: self.viewport.committed(),
            screen: self.screen,
            sizing: &self.config.sizing,
            candidate: self.gesture.candidate(),
            selected: self.selected,
            dragging: self.gesture.dragged(),
            is_busy: &busy,
        })
    }

    // ─── Host commands ───────────────────────────────────────────────────

    pub fn set_screen_size(&mut self, width: f32, height: f32) {
        self.screen = Size {
            width: width.max(0.0),
            height: height.max(0.0),
        };
        self.touch();
    }

    fn measure(&self, kind: NodeKind, text: &str) -> Size {
        measure_node(self.metrics.as_ref(), &self.config.sizing, kind, text)
    }

    /// Set the active use case, creating or retitling the root node.
    pub fn set_use_case(&mut self, text: &str) -> Result<NodeId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GraphError::EmptyText.into());
        }
        let size = self.measure(NodeKind::Root, text);
        let id = match self.graph.root() {
            Some(root) => {
                if self.orchestrator.is_locked(root) {
                    return Err(EngineError::Busy(root));
                }
                self.apply_batch(vec![
                    GraphMutation::SetText {
                        id: root,
                        text: text.to_string(),
                    },
                    GraphMutation::ResizeNode {
                        id: root,
                        width: size.width,
                        height: size.height,
                    },
                ])?;
                root
            }
            None => {
                let node = IdeaNode::new(NodeId::root(), NodeKind::Root, text).sized(size);
                self.apply_batch(vec![GraphMutation::AddNode { node: Box::new(node) }])?;
                NodeId::root()
            }
        };
        self.use_case = Some(text.to_string());
        self.scheduler.mark_dirty();
        log::info!("use case set: {text:?}");
        Ok(id)
    }

    /// Ask the service for an initial idea set for the current use case.
    pub fn request_generation(&mut self, now_ms: f64) -> Result<OpId> {
        let context = self.use_case.clone().ok_or(EngineError::NoUseCase)?;
        self.orchestrator.begin_generation(&context, now_ms)
    }

    /// Add top-level topics in one batch. Blank entries are skipped.
    pub fn seed_topics<S: AsRef<str>>(&mut self, texts: &[S]) -> Result<Vec<NodeId>> {
        let mut ids = Vec::new();
        let mut batch = Vec::new();
        let anchor = self.spawn_point();
        for (i, text) in texts.iter().map(|t| t.as_ref().trim()).filter(|t| !t.is_empty()).enumerate() {
            let size = self.measure(NodeKind::Topic, text);
            let node = IdeaNode::new(NodeId::with_prefix(NodeKind::Topic.id_prefix()), NodeKind::Topic, text)
                .at(Point::new(anchor.x + i as f32 * 40.0, anchor.y + i as f32 * 40.0))
                .sized(size);
            ids.push(node.id);
            batch.push(GraphMutation::AddNode { node: Box::new(node) });
        }
        self.apply_batch(batch)?;
        Ok(ids)
    }

    /// Add one user-authored top-level topic at the center of the view.
    pub fn add_topic(&mut self, text: &str) -> Result<NodeId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(GraphError::EmptyText.into());
        }
        let ids = self.seed_topics(&[text])?;
        ids.first().copied().ok_or(EngineError::Graph(GraphError::EmptyText))
    }

    fn spawn_point(&self) -> Point {
        self.viewport
            .screen_to_world(self.screen.width / 2.0, self.screen.height / 2.0)
    }

    /// Delete a node and its subtree. Returns the removed ids.
    pub fn delete_node(&mut self, id: NodeId) -> Result<Vec<NodeId>> {
        if !self.graph.contains(id) {
            return Err(GraphError::UnknownNode(id).into());
        }
        if self.graph.root() == Some(id) {
            return Err(GraphError::RootProtected.into());
        }
        if let Some(dragged) = self.gesture.dragged()
            && (dragged == id || self.graph.is_ancestor_of(id, dragged))
        {
            return Err(EngineError::Dragging(dragged));
        }
        if let Some(busy) = self.orchestrator.subtree_locked(&self.graph, id) {
            return Err(EngineError::Busy(busy));
        }
        let removed = self.apply_batch(vec![GraphMutation::RemoveNode { id }])?;
        log::info!("deleted {id} ({} nodes)", removed.len());
        Ok(removed)
    }

    /// Replace a node's text and re-measure it.
    pub fn edit_node(&mut self, id: NodeId, text: &str) -> Result<()> {
        let kind = self.graph.get(id).map(|n| n.kind).ok_or(GraphError::UnknownNode(id))?;
        if self.gesture.dragged() == Some(id) {
            return Err(EngineError::Dragging(id));
        }
        if self.orchestrator.is_locked(id) {
            return Err(EngineError::Busy(id));
        }
        let text = text.trim();
        if text.is_empty() {
            return Err(GraphError::EmptyText.into());
        }
        let size = self.measure(kind, text);
        self.apply_batch(vec![
            GraphMutation::SetText {
                id,
                text: text.to_string(),
            },
            GraphMutation::ResizeNode {
                id,
                width: size.width,
                height: size.height,
            },
        ])?;
        if kind == NodeKind::Root {
            self.use_case = Some(text.to_string());
        }
        // A new size can make neighbours overlap.
        self.scheduler.mark_dirty();
        Ok(())
    }

    /// Expand/collapse toggle.
    pub fn request_expand(&mut self, id: NodeId, now_ms: f64) -> Result<ExpandStatus> {
        let plan = self
            .orchestrator
            .begin_expand(&self.graph, id, self.use_case.as_deref(), now_ms)?;
        match plan {
            ExpandPlan::Requested(op) => {
                self.touch();
                Ok(ExpandStatus::Requested { op })
            }
            ExpandPlan::Collapse(children) => {
                let batch = children.into_iter().map(|id| GraphMutation::RemoveNode { id }).collect();
                let removed = self.apply_batch(batch)?;
                Ok(ExpandStatus::Collapsed { removed: removed.len() })
            }
        }
    }

    pub fn request_combine(&mut self, a: NodeId, b: NodeId, now_ms: f64) -> Result<OpId> {
        let op = self
            .orchestrator
            .begin_combine(&self.graph, a, b, self.use_case.as_deref(), now_ms)?;
        self.touch();
        Ok(op)
    }

    /// Force a layout pass on the next tick, cooldown or not.
    pub fn request_reorganize(&mut self) {
        self.scheduler.force();
    }

    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        let before = self.notices.len();
        self.notices.retain(|n| n.id != id);
        let dismissed = self.notices.len() != before;
        if dismissed {
            self.touch();
        }
        dismissed
    }

    fn push_notice(&mut self, message: String) {
        let id = self.next_notice;
        self.next_notice += 1;
        self.notices.push(Notice { id, message });
        self.touch();
    }

    fn touch(&mut self) {
        self.revision += 1;
    }

    // ─── Mutation plumbing ───────────────────────────────────────────────

    /// Apply a batch all-or-nothing. On error the store is unchanged.
    /// Returns every id removed by the batch.
    fn apply_batch(&mut self, batch: Vec<GraphMutation>) -> std::result::Result<Vec<NodeId>, GraphError> {
        if batch.is_empty() {
            return Ok(Vec::new());
        }
        let structural = batch.iter().any(GraphMutation::is_structural);
        let mut next = self.graph.clone();
        let mut removed = Vec::new();
        for mutation in batch {
            removed.extend(mutation.apply(&mut next)?);
        }
        self.graph = next;
        if structural {
            self.scheduler.mark_dirty();
        }
        if !removed.is_empty() {
            self.forget(&removed);
        }
        self.touch();
        Ok(removed)
    }

    /// Hot-path single mutation (drag moves, raise). Errors are logged.
    fn apply_one(&mut self, mutation: GraphMutation) {
        match mutation.apply(&mut self.graph) {
            Ok(_) => self.touch(),
            Err(err) => log::debug!("mutation rejected: {err}"),
        }
    }

    /// Clear transient references to removed nodes.
    fn forget(&mut self, removed: &[NodeId]) {
        if self.selected.is_some_and(|s| removed.contains(&s)) {
            self.selected = None;
        }
        if let Some(lost) = self.gesture.forget(removed) {
            log::debug!("drag of {lost} ended: node removed");
            self.scheduler.drag_ended(0.0, false);
        }
    }

    // ─── Service results ─────────────────────────────────────────────────

    pub fn take_requests(&mut self) -> Vec<ServiceRequest> {
        self.orchestrator.take_requests()
    }

    pub fn resolve_combine(
        &mut self,
        op: OpId,
        result: std::result::Result<CombineResponse, ServiceError>,
        _now_ms: f64,
    ) -> Outcome {
        let measure = |kind: NodeKind, text: &str| measure_node(self.metrics.as_ref(), &self.config.sizing, kind, text);
        let resolution = self.orchestrator.complete_combine(
            &self.graph,
            op,
            result.map(|r| r.combined_topic),
            &measure,
        );
        self.land(op, OpKind::Combine, resolution)
    }

    pub fn resolve_expand(
        &mut self,
        op: OpId,
        result: std::result::Result<ExpandResponse, ServiceError>,
        _now_ms: f64,
    ) -> Outcome {
        let measure = |kind: NodeKind, text: &str| measure_node(self.metrics.as_ref(), &self.config.sizing, kind, text);
        let resolution = self.orchestrator.complete_expand(
            &self.graph,
            op,
            result.map(|r| r.expansions),
            self.config.max_expansions,
            &measure,
        );
        self.land(op, OpKind::Expand, resolution)
    }

    pub fn resolve_generation(
        &mut self,
        op: OpId,
        result: std::result::Result<TopicsResponse, ServiceError>,
        _now_ms: f64,
    ) -> Outcome {
        let measure = |kind: NodeKind, text: &str| measure_node(self.metrics.as_ref(), &self.config.sizing, kind, text);
        let resolution = self
            .orchestrator
            .complete_generation(&self.graph, op, result.map(|r| r.topics), &measure);
        self.land(op, OpKind::Generate, resolution)
    }

    fn land(&mut self, op: OpId, kind: OpKind, resolution: Resolution) -> Outcome {
        let Resolution {
            outcome,
            mutations,
            notice,
        } = resolution;
        if let Some(message) = notice {
            self.push_notice(message);
        }
        if outcome != Outcome::Applied {
            // Locks were released; busy overlays must go.
            self.touch();
            return outcome;
        }
        let added = mutations
            .iter()
            .filter(|m| matches!(m, GraphMutation::AddNode { .. }))
            .count();
        match self.apply_batch(mutations) {
            Ok(removed) => {
                log::info!("{op}: {kind:?} applied (+{added}, -{})", removed.len());
                Outcome::Applied
            }
            Err(err) => {
                log::warn!("{op}: {kind:?} result could not be applied: {err}");
                Outcome::Stale
            }
        }
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Route one input event. Returns `true` if it was consumed.
    pub fn handle_input(&mut self, event: &InputEvent, now_ms: f64) -> bool {
        match event {
            InputEvent::Wheel { x, y, delta_y, .. } => {
                let Some(direction) = ZoomDirection::from_wheel(*delta_y) else {
                    return true;
                };
                if let Some(committed) = self.viewport.zoom(Point::new(*x, *y), direction, now_ms)
                    && committed
                {
                    self.touch();
                }
                true
            }
            InputEvent::Key { key, modifiers } => self.handle_key(key, *modifiers, now_ms),
            _ => {
                let ctx = GestureContext {
                    graph: &self.graph,
                    view: self.viewport.target(),
                    combine_distance: self.config.combine_distance,
                    click_slop: self.config.click_slop,
                };
                let actions = self.gesture.handle(event, ctx);
                let consumed = !actions.is_empty();
                self.run_actions(actions, now_ms);
                consumed
            }
        }
    }

    fn handle_key(&mut self, key: &str, m: Modifiers, now_ms: f64) -> bool {
        let Some(action) = ShortcutMap::resolve(key, m.ctrl, m.shift, m.alt, m.meta) else {
            return false;
        };
        let result = match action {
            ShortcutAction::Delete => match self.selected {
                Some(id) => self.delete_node(id).map(|_| ()),
                None => Ok(()),
            },
            ShortcutAction::ExpandToggle => match self.selected {
                Some(id) => self.request_expand(id, now_ms).map(|_| ()),
                None => Ok(()),
            },
            ShortcutAction::Reorganize => {
                self.request_reorganize();
                Ok(())
            }
            ShortcutAction::ZoomIn | ShortcutAction::ZoomOut => {
                let direction = if action == ShortcutAction::ZoomIn {
                    ZoomDirection::In
                } else {
                    ZoomDirection::Out
                };
                if self
                    .viewport
                    .zoom_centered(self.screen.width, self.screen.height, direction, now_ms)
                {
                    self.touch();
                }
                Ok(())
            }
            ShortcutAction::ResetView => {
                self.viewport.reset(now_ms);
                self.touch();
                Ok(())
            }
            ShortcutAction::Cancel => {
                if self.gesture.is_active() {
                    let actions = self.gesture.cancel();
                    self.run_actions(actions, now_ms);
                } else if self.selected.take().is_some() {
                    self.touch();
                }
                Ok(())
            }
        };
        if let Err(err) = result {
            log::debug!("shortcut {action:?} rejected: {err}");
        }
        true
    }

    fn run_actions(&mut self, actions: Vec<GestureAction>, now_ms: f64) {
        for action in actions {
            match action {
                GestureAction::Mutate(mutation) => self.apply_one(mutation),
                GestureAction::Select(id) => {
                    if self.selected != id {
                        self.selected = id;
                        self.touch();
                    }
                }
                GestureAction::DragStarted(_) => self.scheduler.drag_started(),
                GestureAction::DragEnded { moved, .. } => {
                    self.scheduler.drag_ended(now_ms, moved);
                    self.touch();
                }
                GestureAction::Pan { dx, dy } => {
                    if self.viewport.pan(dx, dy, now_ms) {
                        self.touch();
                    }
                }
                GestureAction::PanEnded => {
                    if self.viewport.end_gesture(now_ms) {
                        self.touch();
                    }
                }
                GestureAction::Click(id) => {
                    if self.config.expand_on_click
                        && let Err(err) = self.request_expand(id, now_ms)
                    {
                        log::debug!("click on {id}: expand rejected: {err}");
                    }
                }
                GestureAction::Combine { source, target } => {
                    if let Err(err) = self.request_combine(source, target, now_ms) {
                        log::debug!("drop {source} on {target}: combine rejected: {err}");
                    }
                }
            }
        }
    }

    // ─── Tick ────────────────────────────────────────────────────────────

    /// Periodic housekeeping; call once per animation frame.
    pub fn tick(&mut self, now_ms: f64) -> TickReport {
        let mut report = TickReport::default();

        if self.viewport.flush(now_ms) {
            report.viewport_committed = true;
            self.touch();
        }

        let abandoned = self
            .orchestrator
            .abandon_older_than(now_ms, self.config.op_timeout_ms);
        report.abandoned = abandoned.len();
        for op in abandoned {
            let what = match op.kind {
                OpKind::Combine => "Combining ideas",
                OpKind::Expand => "Expanding an idea",
                OpKind::Generate => "Generating topics",
            };
            self.push_notice(format!("{what} took too long and was cancelled."));
        }

        if self.scheduler.should_run(now_ms) {
            let moved = relayout(&mut self.graph, self.layout.as_ref(), &self.config.layout);
            self.scheduler.ran();
            report.layout_ran = true;
            if moved > 0 {
                self.touch();
            }
            log::debug!("layout pass moved {moved} nodes");
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine_with(texts: &[&str]) -> (CanvasEngine, Vec<NodeId>) {
        let mut engine = CanvasEngine::default();
        engine.set_use_case("Writing a novel").unwrap();
        let ids = engine.seed_topics(texts).unwrap();
        engine.tick(0.0);
        (engine, ids)
    }

    #[test]
    fn seeded_topics_are_laid_out_below_root() {
        let (engine, ids) = engine_with(&["A", "B", "C"]);
        let g = engine.graph();
        let root_y = g.get(NodeId::root()).unwrap().position.y;
        for id in &ids {
            assert!(g.get(*id).unwrap().position.y > root_y);
        }
    }

    #[test]
    fn delete_root_is_rejected() {
        let (mut engine, _) = engine_with(&["A"]);
        let before = engine.snapshot();
        assert_eq!(
            engine.delete_node(NodeId::root()),
            Err(EngineError::Graph(GraphError::RootProtected))
        );
        assert_eq!(engine.snapshot(), before);
    }

    #[test]
    fn edit_remeasures_and_rejects_empty() {
        let (mut engine, ids) = engine_with(&["A"]);
        let before = engine.graph().get(ids[0]).unwrap().size;
        engine
            .edit_node(ids[0], "A much longer idea that certainly needs a wider box than before")
            .unwrap();
        assert!(engine.graph().get(ids[0]).unwrap().size.width > before.width);
        assert_eq!(engine.edit_node(ids[0], "  "), Err(EngineError::Graph(GraphError::EmptyText)));
    }

    #[test]
    fn busy_node_cannot_be_deleted_or_edited() {
        let (mut engine, ids) = engine_with(&["A", "B"]);
        engine.request_combine(ids[0], ids[1], 0.0).unwrap();
        assert_eq!(engine.delete_node(ids[0]), Err(EngineError::Busy(ids[0])));
        assert_eq!(engine.edit_node(ids[1], "B2"), Err(EngineError::Busy(ids[1])));
    }

    #[test]
    fn timed_out_ops_are_abandoned_with_notice() {
        let (mut engine, ids) = engine_with(&["A"]);
        let ExpandStatus::Requested { op } = engine.request_expand(ids[0], 0.0).unwrap() else {
            panic!("expected a request");
        };
        let report = engine.tick(31_000.0);
        assert_eq!(report.abandoned, 1);
        assert_eq!(engine.notices().len(), 1);
        assert!(!engine.is_busy(ids[0]));
        let late = engine.resolve_expand(op, Ok(ExpandResponse { expansions: vec!["x".into()] }), 32_000.0);
        assert_eq!(late, Outcome::Stale);
        assert!(engine.graph().expansions_of(ids[0]).is_empty());
    }

    #[test]
    fn notices_are_dismissible() {
        let (mut engine, ids) = engine_with(&["A"]);
        let ExpandStatus::Requested { op } = engine.request_expand(ids[0], 0.0).unwrap() else {
            panic!("expected a request");
        };
        engine.resolve_expand(op, Err(ServiceError::Unavailable("offline".into())), 1.0);
        let id = engine.notices()[0].id;
        assert!(engine.dismiss_notice(id));
        assert!(engine.notices().is_empty());
        assert!(!engine.dismiss_notice(id));
    }

    #[test]
    fn generation_requires_use_case() {
        let mut engine = CanvasEngine::default();
        assert_eq!(engine.request_generation(0.0), Err(EngineError::NoUseCase));
    }
}
