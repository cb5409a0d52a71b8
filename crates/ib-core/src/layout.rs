//! Layered tree layout.
//!
//! Converts the hierarchy (root → topics → expansions, with root fan-out)
//! into center positions. Ranks grow along the layout direction; the cross
//! axis packs sibling subtrees side by side and centers every parent over
//! its children.
//!
//! The algorithm sits behind [`LayoutAlgorithm`] so hosts can swap in a
//! different layered layout without touching the engine.

use crate::id::NodeId;
use crate::model::{IdeaGraph, Point, Size};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LayoutDirection {
    /// Ranks grow downward.
    #[default]
    TopToBottom,
    /// Ranks grow to the right.
    LeftToRight,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct LayoutConfig {
    pub direction: LayoutDirection,
    /// Gap between neighbouring subtrees on the cross axis.
    pub node_sep: f32,
    /// Gap between consecutive ranks.
    pub rank_sep: f32,
    /// Offset of the whole drawing from the world origin.
    pub margin: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            direction: LayoutDirection::TopToBottom,
            node_sep: 120.0,
            rank_sep: 150.0,
            margin: 50.0,
        }
    }
}

// ─── Input / Output ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LayoutNode {
    pub id: NodeId,
    pub size: Size,
}

/// Node set plus hierarchy edges (parent → child). Node order is the
/// tie-break for sibling order and must be stable across calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LayoutInput {
    pub nodes: Vec<LayoutNode>,
    pub edges: Vec<(NodeId, NodeId)>,
}

impl LayoutInput {
    /// Snapshot the hierarchy of `graph`, including root fan-out edges.
    pub fn from_graph(graph: &IdeaGraph) -> Self {
        Self {
            nodes: graph
                .nodes()
                .into_iter()
                .map(|n| LayoutNode {
                    id: n.id,
                    size: n.size,
                })
                .collect(),
            edges: graph.edges().into_iter().map(|e| (e.from, e.to)).collect(),
        }
    }
}

pub type Positions = HashMap<NodeId, Point>;

/// `layout(nodes, edges, direction) -> positions`.
pub trait LayoutAlgorithm {
    fn layout(&self, input: &LayoutInput, config: &LayoutConfig) -> Positions;
}

// ─── Tree layout ─────────────────────────────────────────────────────────

/// Two-pass tidy tree: subtree extents bottom-up, placement top-down.
#[derive(Debug, Clone, Copy, Default)]
pub struct TreeLayout;

/// Cross-axis footprint of a subtree.
#[derive(Debug, Clone, Copy)]
struct Extent {
    width: f32,
    /// Offset of the subtree root's center from the subtree's left edge.
    anchor: f32,
    /// Offset of the first child subtree from the subtree's left edge.
    shift: f32,
}

struct Tree<'a> {
    config: &'a LayoutConfig,
    sizes: HashMap<NodeId, Size>,
    children: HashMap<NodeId, Vec<NodeId>>,
    extents: HashMap<NodeId, Extent>,
    depth: HashMap<NodeId, usize>,
}

impl<'a> Tree<'a> {
    /// Cross-axis size of a node.
    fn breadth(&self, id: NodeId) -> f32 {
        let size = self.sizes.get(&id).copied().unwrap_or_default();
        match self.config.direction {
            LayoutDirection::TopToBottom => size.width,
            LayoutDirection::LeftToRight => size.height,
        }
    }

    /// Rank-axis size of a node.
    fn thickness(&self, id: NodeId) -> f32 {
        let size = self.sizes.get(&id).copied().unwrap_or_default();
        match self.config.direction {
            LayoutDirection::TopToBottom => size.height,
            LayoutDirection::LeftToRight => size.width,
        }
    }

    fn kids(&self, id: NodeId) -> &[NodeId] {
        self.children.get(&id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn measure(&mut self, id: NodeId, depth: usize) -> Extent {
        self.depth.insert(id, depth);
        let own = self.breadth(id);
        let kids = self.kids(id).to_vec();
        if kids.is_empty() {
            let extent = Extent {
                width: own,
                anchor: own / 2.0,
                shift: 0.0,
            };
            self.extents.insert(id, extent);
            return extent;
        }

        let mut cursor = 0.0;
        let mut center_sum = 0.0;
        for &kid in &kids {
            let e = self.measure(kid, depth + 1);
            center_sum += cursor + e.anchor;
            cursor += e.width + self.config.node_sep;
        }
        let span = cursor - self.config.node_sep;
        let centroid = center_sum / kids.len() as f32;
        // A parent wider than its children's spread pushes them right.
        let shift = (own / 2.0 - centroid).max(0.0);
        let extent = Extent {
            width: shift + span.max(centroid + own / 2.0),
            anchor: shift + centroid,
            shift,
        };
        self.extents.insert(id, extent);
        extent
    }

    fn place(&self, id: NodeId, left: f32, out: &mut HashMap<NodeId, (f32, usize)>) {
        let Some(extent) = self.extents.get(&id) else {
            return;
        };
        out.insert(id, (left + extent.anchor, self.depth.get(&id).copied().unwrap_or(0)));
        let mut cursor = left + extent.shift;
        for &kid in self.kids(id) {
            self.place(kid, cursor, out);
            if let Some(e) = self.extents.get(&kid) {
                cursor += e.width + self.config.node_sep;
            }
        }
    }
}

impl LayoutAlgorithm for TreeLayout {
    fn layout(&self, input: &LayoutInput, config: &LayoutConfig) -> Positions {
        let sizes: HashMap<NodeId, Size> = input.nodes.iter().map(|n| (n.id, n.size)).collect();
        let order: HashMap<NodeId, usize> = input
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect();

        let mut children: HashMap<NodeId, Vec<NodeId>> = HashMap::new();
        let mut has_parent: HashMap<NodeId, bool> = HashMap::new();
        for &(from, to) in &input.edges {
            if !(sizes.contains_key(&from) && sizes.contains_key(&to)) || from == to {
                log::warn!("layout: ignoring edge {from} -> {to}");
                continue;
            }
            // First parent wins; later edges into the same node are ignored.
            if has_parent.insert(to, true).is_some() {
                continue;
            }
            children.entry(from).or_default().push(to);
        }
        for kids in children.values_mut() {
            kids.sort_by_key(|k| order.get(k).copied().unwrap_or(usize::MAX));
        }

        let mut tree = Tree {
            config,
            sizes,
            children,
            extents: HashMap::new(),
            depth: HashMap::new(),
        };

        // Side-by-side forest of every parentless node.
        let mut placed: HashMap<NodeId, (f32, usize)> = HashMap::new();
        let mut cursor = config.margin;
        for node in &input.nodes {
            if has_parent.contains_key(&node.id) {
                continue;
            }
            let extent = tree.measure(node.id, 0);
            tree.place(node.id, cursor, &mut placed);
            cursor += extent.width + config.node_sep;
        }

        // Rank bands: each rank is as thick as its thickest node.
        let max_depth = placed.values().map(|(_, d)| *d).max().unwrap_or(0);
        let mut band = vec![0.0f32; max_depth + 1];
        for (id, (_, depth)) in &placed {
            band[*depth] = band[*depth].max(tree.thickness(*id));
        }
        let mut rank_center = Vec::with_capacity(band.len());
        let mut offset = config.margin;
        for thickness in &band {
            rank_center.push(offset + thickness / 2.0);
            offset += thickness + config.rank_sep;
        }

        let positions: Positions = placed
            .into_iter()
            .map(|(id, (cross, depth))| {
                let rank = rank_center[depth];
                let point = match config.direction {
                    LayoutDirection::TopToBottom => Point::new(cross, rank),
                    LayoutDirection::LeftToRight => Point::new(rank, cross),
                };
                (id, point)
            })
            .collect();
        log::debug!("layout: positioned {} nodes in {} ranks", positions.len(), band.len());
        positions
    }
}

/// Write computed positions back into the store. Returns how many nodes moved.
pub fn apply_positions(graph: &mut IdeaGraph, positions: &Positions) -> usize {
    let mut moved = 0;
    for (id, point) in positions {
        let Some(node) = graph.get(*id) else {
            continue;
        };
        if node.position == *point {
            continue;
        }
        if graph.update_position(*id, point.x, point.y).is_ok() {
            moved += 1;
        }
    }
    moved
}

/// Run `algorithm` over the whole graph and apply the result.
pub fn relayout(graph: &mut IdeaGraph, algorithm: &dyn LayoutAlgorithm, config: &LayoutConfig) -> usize {
    let input = LayoutInput::from_graph(graph);
    let positions = algorithm.layout(&input, config);
    apply_positions(graph, &positions)
}
