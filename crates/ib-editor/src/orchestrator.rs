//! Merge/expand orchestration.
//!
//! Service calls are split into a synchronous *begin* step, which validates
//! the request, locks the participants, and queues a [`ServiceRequest`], and
//! a synchronous *complete* step, which turns the service result into one
//! batch of [`GraphMutation`]s. The engine applies that batch atomically.
//! Nothing here awaits.
//!
//! Locks are logical: a node referenced by an in-flight operation cannot be
//! deleted, edited, or join another operation. Dragging it is fine.

use crate::engine::GraphMutation;
use crate::error::{EngineError, Result};
use crate::service::ServiceError;
use ib_core::id::NodeId;
use ib_core::model::{IdeaGraph, IdeaNode, NodeKind, Point, Size};
use serde::Serialize;
use smallvec::{SmallVec, smallvec};
use std::collections::{BTreeMap, VecDeque};
use std::fmt;

/// Vertical gap between a parent and freshly attached children, before layout.
const SPAWN_GAP: f32 = 80.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, serde::Deserialize)]
#[serde(transparent)]
pub struct OpId(pub u64);

impl fmt::Display for OpId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "op#{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum OpKind {
    Combine,
    Expand,
    Generate,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InFlightOp {
    pub id: OpId,
    pub kind: OpKind,
    pub participants: SmallVec<[NodeId; 2]>,
    pub started_at: f64,
}

/// A call the host (or the async driver) must make on the idea service.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServiceRequest {
    Combine {
        op: OpId,
        text1: String,
        text2: String,
        context: Option<String>,
    },
    Expand {
        op: OpId,
        text: String,
        context: Option<String>,
    },
    Generate { op: OpId, context: String },
}

impl ServiceRequest {
    pub fn op(&self) -> OpId {
        match self {
            Self::Combine { op, .. } | Self::Expand { op, .. } | Self::Generate { op, .. } => *op,
        }
    }
}

/// How a completed operation landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Outcome {
    Applied,
    /// Valid but nothing to add (zero expansions or topics).
    Empty,
    /// Service failure; state untouched.
    Failed,
    /// Participants gone or the op was abandoned; result discarded.
    Stale,
}

/// Mutations to apply for a completed operation, plus any user notice.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub outcome: Outcome,
    pub mutations: Vec<GraphMutation>,
    pub notice: Option<String>,
}

impl Resolution {
    fn stale() -> Self {
        Self {
            outcome: Outcome::Stale,
            mutations: Vec::new(),
            notice: None,
        }
    }

    fn failed(message: String) -> Self {
        Self {
            outcome: Outcome::Failed,
            mutations: Vec::new(),
            notice: Some(message),
        }
    }
}

/// Outcome of an expand request.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpandPlan {
    /// The node already had expansions; remove them, no call.
    Collapse(Vec<NodeId>),
    Requested(OpId),
}

#[derive(Debug, Default)]
pub struct Orchestrator {
    ops: BTreeMap<OpId, InFlightOp>,
    outbox: VecDeque<ServiceRequest>,
    next_op: u64,
}

impl Orchestrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn in_flight(&self) -> impl Iterator<Item = &InFlightOp> {
        self.ops.values()
    }

    pub fn get(&self, op: OpId) -> Option<&InFlightOp> {
        self.ops.get(&op)
    }

    pub fn is_locked(&self, id: NodeId) -> bool {
        self.ops.values().any(|op| op.participants.contains(&id))
    }

    /// `id` or anything below it is locked.
    pub fn subtree_locked(&self, graph: &IdeaGraph, id: NodeId) -> Option<NodeId> {
        std::iter::once(id)
            .chain(graph.descendants_of(id))
            .find(|n| self.is_locked(*n))
    }

    /// `id` sits under a pending combine participant and will be consumed
    /// with it.
    fn consumed_by_combine(&self, graph: &IdeaGraph, id: NodeId) -> Option<NodeId> {
        let mut current = Some(id);
        while let Some(n) = current {
            let hit = self
                .ops
                .values()
                .any(|op| op.kind == OpKind::Combine && op.participants.contains(&n));
            if hit {
                return Some(n);
            }
            current = graph.parent_of(n);
        }
        None
    }

    fn generation_in_flight(&self) -> Option<OpId> {
        self.ops.values().find(|op| op.kind == OpKind::Generate).map(|op| op.id)
    }

    fn start(&mut self, kind: OpKind, participants: SmallVec<[NodeId; 2]>, now_ms: f64) -> OpId {
        let id = OpId(self.next_op);
        self.next_op += 1;
        self.ops.insert(
            id,
            InFlightOp {
                id,
                kind,
                participants,
                started_at: now_ms,
            },
        );
        id
    }

    /// Drain queued service calls.
    pub fn take_requests(&mut self) -> Vec<ServiceRequest> {
        self.outbox.drain(..).collect()
    }

    // ─── Begin ───────────────────────────────────────────────────────────

    pub fn begin_combine(
        &mut self,
        graph: &IdeaGraph,
        a: NodeId,
        b: NodeId,
        context: Option<&str>,
        now_ms: f64,
    ) -> Result<OpId> {
        if a == b {
            return Err(EngineError::SelfCombine(a));
        }
        let mut texts = [String::new(), String::new()];
        for (slot, id) in texts.iter_mut().zip([a, b]) {
            let node = graph.get(id).ok_or(EngineError::Graph(ib_core::GraphError::UnknownNode(id)))?;
            if node.kind == NodeKind::Root {
                return Err(EngineError::RootCombine);
            }
            if let Some(busy) = self
                .subtree_locked(graph, id)
                .or_else(|| self.consumed_by_combine(graph, id))
            {
                return Err(EngineError::Busy(busy));
            }
            *slot = node.text.clone();
        }
        let [text1, text2] = texts;

        let op = self.start(OpKind::Combine, smallvec![a, b], now_ms);
        self.outbox.push_back(ServiceRequest::Combine {
            op,
            text1,
            text2,
            context: context.map(str::to_string),
        });
        log::debug!("{op}: combine {a} + {b} requested");
        Ok(op)
    }

    pub fn begin_expand(
        &mut self,
        graph: &IdeaGraph,
        id: NodeId,
        context: Option<&str>,
        now_ms: f64,
    ) -> Result<ExpandPlan> {
        let node = graph.get(id).ok_or(EngineError::Graph(ib_core::GraphError::UnknownNode(id)))?;
        if node.kind == NodeKind::Expansion {
            return Err(EngineError::NotExpandable(id));
        }
        if let Some(busy) = (self.is_locked(id).then_some(id)).or_else(|| self.consumed_by_combine(graph, id)) {
            return Err(EngineError::Busy(busy));
        }

        let existing = graph.expansions_of(id);
        if !existing.is_empty() {
            if let Some(busy) = existing.iter().find_map(|e| self.subtree_locked(graph, *e)) {
                return Err(EngineError::Busy(busy));
            }
            log::debug!("expand {id}: collapsing {} expansions", existing.len());
            return Ok(ExpandPlan::Collapse(existing));
        }

        let op = self.start(OpKind::Expand, smallvec![id], now_ms);
        self.outbox.push_back(ServiceRequest::Expand {
            op,
            text: node.text.clone(),
            context: context.map(str::to_string),
        });
        log::debug!("{op}: expand {id} requested");
        Ok(ExpandPlan::Requested(op))
    }

    pub fn begin_generation(&mut self, context: &str, now_ms: f64) -> Result<OpId> {
        if let Some(op) = self.generation_in_flight() {
            return Err(EngineError::GenerationBusy(op));
        }
        let op = self.start(OpKind::Generate, SmallVec::new(), now_ms);
        self.outbox.push_back(ServiceRequest::Generate {
            op,
            context: context.to_string(),
        });
        log::debug!("{op}: topic generation requested");
        Ok(op)
    }

    // ─── Complete ────────────────────────────────────────────────────────

    /// Release `op` if it is in flight with the expected kind and all its
    /// participants are still alive.
    fn finish(&mut self, graph: &IdeaGraph, op: OpId, kind: OpKind) -> Option<InFlightOp> {
        let Some(entry) = self.ops.get(&op) else {
            log::debug!("{op}: unknown or abandoned, result discarded");
            return None;
        };
        if entry.kind != kind {
            log::debug!("{op}: is a {:?}, not a {kind:?}; result ignored", entry.kind);
            return None;
        }
        let entry = self.ops.remove(&op)?;
        self.outbox.retain(|r| r.op() != op);
        if let Some(gone) = entry.participants.iter().find(|p| !graph.contains(**p)) {
            log::debug!("{op}: participant {gone} no longer exists, result discarded");
            return None;
        }
        Some(entry)
    }

    pub fn complete_combine(
        &mut self,
        graph: &IdeaGraph,
        op: OpId,
        result: std::result::Result<String, ServiceError>,
        measure: &dyn Fn(NodeKind, &str) -> Size,
    ) -> Resolution {
        let Some(entry) = self.finish(graph, op, OpKind::Combine) else {
            return Resolution::stale();
        };
        let [a, b] = [entry.participants[0], entry.participants[1]];
        let text = match result {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => {
                log::warn!("{op}: combine returned empty text");
                return Resolution::failed("Couldn't combine those ideas. Try again.".to_string());
            }
            Err(err) => {
                log::warn!("{op}: combine failed: {err}");
                return Resolution::failed("Couldn't combine those ideas. Try again.".to_string());
            }
        };

        let (Some(na), Some(nb)) = (graph.get(a), graph.get(b)) else {
            return Resolution::stale();
        };
        let midpoint = na.position.midpoint(nb.position);

        let mut mutations = Vec::with_capacity(3);
        // One input may sit inside the other's subtree; its removal then
        // cascades from the ancestor.
        if !graph.is_ancestor_of(b, a) {
            mutations.push(GraphMutation::RemoveNode { id: a });
        }
        if !graph.is_ancestor_of(a, b) {
            mutations.push(GraphMutation::RemoveNode { id: b });
        }
        let node = IdeaNode::new(NodeId::with_prefix(NodeKind::Topic.id_prefix()), NodeKind::Topic, text.as_str())
            .at(midpoint)
            .sized(measure(NodeKind::Topic, &text));
        mutations.push(GraphMutation::AddNode { node: Box::new(node) });

        Resolution {
            outcome: Outcome::Applied,
            mutations,
            notice: None,
        }
    }

    pub fn complete_expand(
        &mut self,
        graph: &IdeaGraph,
        op: OpId,
        result: std::result::Result<Vec<String>, ServiceError>,
        max_expansions: usize,
        measure: &dyn Fn(NodeKind, &str) -> Size,
    ) -> Resolution {
        let Some(entry) = self.finish(graph, op, OpKind::Expand) else {
            return Resolution::stale();
        };
        let parent_id = entry.participants[0];
        let texts = match result {
            Ok(texts) => clean_texts(texts, max_expansions),
            Err(err) => {
                log::warn!("{op}: expand failed: {err}");
                return Resolution::failed("Couldn't expand that idea. Try again.".to_string());
            }
        };
        let Some(parent) = graph.get(parent_id) else {
            return Resolution::stale();
        };
        if texts.is_empty() {
            return Resolution {
                outcome: Outcome::Empty,
                mutations: Vec::new(),
                notice: None,
            };
        }

        let anchor = Point::new(parent.position.x, parent.position.y + parent.size.height / 2.0 + SPAWN_GAP);
        let mutations = spawn_row(&texts, anchor, NodeKind::Expansion, Some(parent_id), measure);
        Resolution {
            outcome: Outcome::Applied,
            mutations,
            notice: None,
        }
    }

    pub fn complete_generation(
        &mut self,
        graph: &IdeaGraph,
        op: OpId,
        result: std::result::Result<Vec<String>, ServiceError>,
        measure: &dyn Fn(NodeKind, &str) -> Size,
    ) -> Resolution {
        if self.finish(graph, op, OpKind::Generate).is_none() {
            return Resolution::stale();
        }
        let texts = match result {
            Ok(texts) => clean_texts(texts, usize::MAX),
            Err(err) => {
                log::warn!("{op}: topic generation failed: {err}");
                return Resolution::failed("Couldn't generate topics. Try again.".to_string());
            }
        };
        if texts.is_empty() {
            return Resolution {
                outcome: Outcome::Empty,
                mutations: Vec::new(),
                notice: None,
            };
        }
        let anchor = match graph.root().and_then(|r| graph.get(r)) {
            Some(root) => Point::new(root.position.x, root.position.y + root.size.height / 2.0 + SPAWN_GAP),
            None => Point::default(),
        };
        Resolution {
            outcome: Outcome::Applied,
            mutations: spawn_row(&texts, anchor, NodeKind::Topic, None, measure),
            notice: None,
        }
    }

    /// Abandon operations older than `timeout_ms`, releasing their locks.
    pub fn abandon_older_than(&mut self, now_ms: f64, timeout_ms: f64) -> Vec<InFlightOp> {
        let expired: Vec<OpId> = self
            .ops
            .values()
            .filter(|op| now_ms - op.started_at >= timeout_ms)
            .map(|op| op.id)
            .collect();
        let abandoned: Vec<InFlightOp> = expired.iter().filter_map(|id| self.ops.remove(id)).collect();
        if !abandoned.is_empty() {
            self.outbox.retain(|r| !expired.contains(&r.op()));
        }
        for op in &abandoned {
            log::warn!("{}: {:?} abandoned after {:.0} ms", op.id, op.kind, now_ms - op.started_at);
        }
        abandoned
    }
}

fn clean_texts(texts: Vec<String>, limit: usize) -> Vec<String> {
    texts
        .into_iter()
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty())
        .take(limit)
        .collect()
}

/// New nodes in a centered row below `anchor`; layout places them properly
/// on its next pass.
fn spawn_row(
    texts: &[String],
    anchor: Point,
    kind: NodeKind,
    parent: Option<NodeId>,
    measure: &dyn Fn(NodeKind, &str) -> Size,
) -> Vec<GraphMutation> {
    let sizes: Vec<Size> = texts.iter().map(|t| measure(kind, t)).collect();
    let gap = 20.0;
    let total = sizes.iter().map(|s| s.width).sum::<f32>() + gap * (sizes.len().saturating_sub(1)) as f32;
    let mut x = anchor.x - total / 2.0;
    texts
        .iter()
        .zip(sizes)
        .map(|(text, size)| {
            let mut node = IdeaNode::new(NodeId::with_prefix(kind.id_prefix()), kind, text.as_str())
                .at(Point::new(x + size.width / 2.0, anchor.y))
                .sized(size);
            node.parent = parent;
            x += size.width + gap;
            GraphMutation::AddNode { node: Box::new(node) }
        })
        .collect()
}
