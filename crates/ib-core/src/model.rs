//! Idea graph data model: the canonical node store.
//!
//! The board is a forest of idea nodes. Containment edges go from a parent
//! to its children (`parent` links); top-level topics additionally fan out
//! from the use-case root when one exists. Those fan-out edges are derived
//! on demand and never stored.
//!
//! Positions are node **centers** in world coordinates. Sizes come from text
//! measurement (see [`crate::measure`]) and change when the text does.
//!
//! Every mutation is synchronous and validated up front: a rejected call
//! leaves the store exactly as it was.

use crate::error::{GraphError, Result};
use crate::id::NodeId;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use petgraph::visit::Dfs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ─── Geometry ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: Point) -> f32 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    pub fn midpoint(self, other: Point) -> Point {
        Point::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

/// Axis-aligned box in world coordinates (top-left origin).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Bounds {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub fn around(center: Point, size: Size) -> Self {
        Self {
            x: center.x - size.width / 2.0,
            y: center.y - size.height / 2.0,
            width: size.width,
            height: size.height,
        }
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Strict AABB overlap; boxes that only touch do not intersect.
    pub fn intersects(&self, other: &Bounds) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }
}

// ─── Nodes ───────────────────────────────────────────────────────────────

/// The three node variants. Rendering and layout dispatch on this tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeKind {
    /// The use-case node every top-level topic fans out from.
    Root,
    /// A primary idea: generated, user-added, or a combine result.
    Topic,
    /// A generated sub-idea attached to a topic or the root.
    Expansion,
}

impl NodeKind {
    pub fn id_prefix(self) -> &'static str {
        match self {
            NodeKind::Root => "root",
            NodeKind::Topic => "topic",
            NodeKind::Expansion => "expansion",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdeaNode {
    pub id: NodeId,
    pub kind: NodeKind,
    pub text: String,
    /// Center of the node in world coordinates.
    pub position: Point,
    pub size: Size,
    /// Reference to the parent node; not ownership.
    pub parent: Option<NodeId>,
    /// Creation sequence. Assigned by the store; gives stable iteration order.
    #[serde(default)]
    pub seq: u64,
    /// Paint order. Higher paints later (on top).
    #[serde(default)]
    pub z: u64,
}

impl IdeaNode {
    pub fn new(id: NodeId, kind: NodeKind, text: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            text: text.into(),
            position: Point::default(),
            size: Size::default(),
            parent: None,
            seq: 0,
            z: 0,
        }
    }

    pub fn with_parent(mut self, parent: NodeId) -> Self {
        self.parent = Some(parent);
        self
    }

    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    pub fn sized(mut self, size: Size) -> Self {
        self.size = size;
        self
    }

    pub fn bounds(&self) -> Bounds {
        Bounds::around(self.position, self.size)
    }
}

// ─── Edges ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum EdgeKind {
    /// Follows a node's `parent` link.
    Child,
    /// Root → top-level topic, derived while a root exists.
    FanOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EdgeRef {
    pub from: NodeId,
    pub to: NodeId,
    pub kind: EdgeKind,
}

// ─── Store ───────────────────────────────────────────────────────────────

/// The node store. Stored edges are parent → child containment only.
#[derive(Debug, Clone, Default)]
pub struct IdeaGraph {
    graph: StableDiGraph<IdeaNode, ()>,
    id_index: HashMap<NodeId, NodeIndex>,
    root: Option<NodeId>,
    next_seq: u64,
    next_z: u64,
}

impl IdeaGraph {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.graph.node_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.node_count() == 0
    }

    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.id_index.contains_key(&id)
    }

    pub fn get(&self, id: NodeId) -> Option<&IdeaNode> {
        self.id_index.get(&id).map(|idx| &self.graph[*idx])
    }

    fn get_mut(&mut self, id: NodeId) -> Result<&mut IdeaNode> {
        let idx = *self.id_index.get(&id).ok_or(GraphError::UnknownNode(id))?;
        Ok(&mut self.graph[idx])
    }

    /// Insert a new node or replace an existing one with the same id.
    ///
    /// New nodes get a fresh sequence number and are painted on top.
    /// Replacing keeps the node's sequence and paint order; the kind cannot
    /// change in place.
    pub fn upsert(&mut self, mut node: IdeaNode) -> Result<NodeId> {
        let id = node.id;
        if node.text.trim().is_empty() {
            return Err(GraphError::EmptyText);
        }
        if !node.position.is_finite() {
            return Err(GraphError::NonFinite(id));
        }
        self.check_parent(&node)?;

        if let Some(&idx) = self.id_index.get(&id) {
            let existing = &self.graph[idx];
            if existing.kind != node.kind {
                return Err(GraphError::KindChange(id));
            }
            if node.parent == Some(id) || node.parent.is_some_and(|p| self.is_ancestor_of(id, p)) {
                return Err(GraphError::InvalidParent {
                    node: id,
                    parent: node.parent,
                });
            }
            let old_parent = existing.parent;
            node.seq = existing.seq;
            node.z = existing.z;
            if old_parent != node.parent {
                if let Some(edge) = old_parent
                    .and_then(|p| self.id_index.get(&p))
                    .and_then(|&p| self.graph.find_edge(p, idx))
                {
                    self.graph.remove_edge(edge);
                }
                if let Some(&p) = node.parent.and_then(|p| self.id_index.get(&p)) {
                    self.graph.add_edge(p, idx, ());
                }
            }
            self.graph[idx] = node;
            return Ok(id);
        }

        if node.kind == NodeKind::Root {
            if let Some(existing) = self.root {
                return Err(GraphError::DuplicateRoot(existing));
            }
            self.root = Some(id);
        }
        node.seq = self.next_seq;
        self.next_seq += 1;
        node.z = self.next_z;
        self.next_z += 1;
        let parent = node.parent;
        let idx = self.graph.add_node(node);
        self.id_index.insert(id, idx);
        if let Some(&p) = parent.and_then(|p| self.id_index.get(&p)) {
            self.graph.add_edge(p, idx, ());
        }
        Ok(id)
    }

    fn check_parent(&self, node: &IdeaNode) -> Result<()> {
        let parent_kind = node.parent.map(|p| self.get(p).map(|n| n.kind));
        let ok = match (node.kind, parent_kind) {
            (NodeKind::Root, None) => true,
            (NodeKind::Root, Some(_)) => false,
            // Expansions must hang off a live topic or the root.
            (NodeKind::Expansion, Some(Some(NodeKind::Topic | NodeKind::Root))) => true,
            (NodeKind::Expansion, _) => false,
            (NodeKind::Topic, None) => true,
            (NodeKind::Topic, Some(Some(NodeKind::Topic | NodeKind::Root))) => true,
            (NodeKind::Topic, Some(_)) => false,
        };
        if ok {
            Ok(())
        } else {
            Err(GraphError::InvalidParent {
                node: node.id,
                parent: node.parent,
            })
        }
    }

    /// Remove a node and every node whose parent chain leads to it.
    /// Returns the removed nodes in creation order.
    pub fn remove(&mut self, id: NodeId) -> Result<Vec<IdeaNode>> {
        if self.root == Some(id) {
            return Err(GraphError::RootProtected);
        }
        let start = *self.id_index.get(&id).ok_or(GraphError::UnknownNode(id))?;

        let mut doomed = Vec::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(idx) = dfs.next(&self.graph) {
            doomed.push(idx);
        }

        let mut removed: Vec<IdeaNode> = doomed
            .into_iter()
            .filter_map(|idx| self.graph.remove_node(idx))
            .collect();
        for node in &removed {
            self.id_index.remove(&node.id);
        }
        removed.sort_by_key(|n| n.seq);
        Ok(removed)
    }

    pub fn update_position(&mut self, id: NodeId, x: f32, y: f32) -> Result<()> {
        if !(x.is_finite() && y.is_finite()) {
            return Err(GraphError::NonFinite(id));
        }
        self.get_mut(id)?.position = Point::new(x, y);
        Ok(())
    }

    pub fn update_size(&mut self, id: NodeId, width: f32, height: f32) -> Result<()> {
        if !(width.is_finite() && height.is_finite()) {
            return Err(GraphError::NonFinite(id));
        }
        self.get_mut(id)?.size = Size {
            width: width.max(0.0),
            height: height.max(0.0),
        };
        Ok(())
    }

    pub fn update_text(&mut self, id: NodeId, text: &str) -> Result<()> {
        if text.trim().is_empty() {
            return Err(GraphError::EmptyText);
        }
        self.get_mut(id)?.text = text.to_string();
        Ok(())
    }

    /// Move a node to the top of the paint order.
    pub fn raise_to_top(&mut self, id: NodeId) -> Result<()> {
        let z = self.next_z;
        self.get_mut(id)?.z = z;
        self.next_z += 1;
        Ok(())
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// Direct children (via `parent` links) in creation order.
    pub fn children_of(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&idx) = self.id_index.get(&id) else {
            return Vec::new();
        };
        let mut children: Vec<&IdeaNode> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|c| &self.graph[c])
            .collect();
        children.sort_by_key(|n| n.seq);
        children.into_iter().map(|n| n.id).collect()
    }

    /// Direct children of kind `Expansion`.
    pub fn expansions_of(&self, id: NodeId) -> Vec<NodeId> {
        self.children_of(id)
            .into_iter()
            .filter(|c| self.get(*c).is_some_and(|n| n.kind == NodeKind::Expansion))
            .collect()
    }

    /// Every node below `id` (excluding `id` itself), in creation order.
    pub fn descendants_of(&self, id: NodeId) -> Vec<NodeId> {
        let Some(&start) = self.id_index.get(&id) else {
            return Vec::new();
        };
        let mut found: Vec<&IdeaNode> = Vec::new();
        let mut dfs = Dfs::new(&self.graph, start);
        while let Some(idx) = dfs.next(&self.graph) {
            if idx != start {
                found.push(&self.graph[idx]);
            }
        }
        found.sort_by_key(|n| n.seq);
        found.into_iter().map(|n| n.id).collect()
    }

    /// Check if `ancestor` is a parent/grandparent/etc. of `descendant`.
    pub fn is_ancestor_of(&self, ancestor: NodeId, descendant: NodeId) -> bool {
        if ancestor == descendant {
            return false;
        }
        let mut current = self.parent_of(descendant);
        while let Some(p) = current {
            if p == ancestor {
                return true;
            }
            current = self.parent_of(p);
        }
        false
    }

    /// All nodes in creation order.
    pub fn nodes(&self) -> Vec<&IdeaNode> {
        let mut nodes: Vec<&IdeaNode> = self.graph.node_weights().collect();
        nodes.sort_by_key(|n| n.seq);
        nodes
    }

    /// All nodes back-to-front.
    pub fn paint_order(&self) -> Vec<&IdeaNode> {
        let mut nodes: Vec<&IdeaNode> = self.graph.node_weights().collect();
        nodes.sort_by_key(|n| n.z);
        nodes
    }

    /// Non-root nodes without a parent, in creation order.
    pub fn top_level(&self) -> Vec<NodeId> {
        self.nodes()
            .into_iter()
            .filter(|n| n.parent.is_none() && n.kind != NodeKind::Root)
            .map(|n| n.id)
            .collect()
    }

    /// Parent in the layout hierarchy: the `parent` link, or the root for
    /// top-level nodes while a root exists.
    pub fn hierarchy_parent(&self, id: NodeId) -> Option<NodeId> {
        let node = self.get(id)?;
        match node.parent {
            Some(p) => Some(p),
            None if node.kind == NodeKind::Root => None,
            None => self.root,
        }
    }

    /// Children in the layout hierarchy, in creation order.
    pub fn hierarchy_children(&self, id: NodeId) -> Vec<NodeId> {
        let mut children = self.children_of(id);
        if self.root == Some(id) {
            children.extend(self.top_level());
            children.sort_by_key(|c| self.get(*c).map(|n| n.seq));
        }
        children
    }

    /// Derived edge list: one per parent link, plus root fan-out.
    pub fn edges(&self) -> Vec<EdgeRef> {
        self.nodes()
            .into_iter()
            .filter_map(|n| match (n.parent, self.root) {
                (Some(parent), _) => Some(EdgeRef {
                    from: parent,
                    to: n.id,
                    kind: EdgeKind::Child,
                }),
                (None, Some(root)) if n.kind != NodeKind::Root => Some(EdgeRef {
                    from: root,
                    to: n.id,
                    kind: EdgeKind::FanOut,
                }),
                _ => None,
            })
            .collect()
    }
}
