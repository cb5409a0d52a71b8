//! Board state → display list.
//!
//! [`build_display_list`] is a pure function of the node store, the
//! committed viewport, and the transient interaction state. Primitives are in
//! world coordinates; painters apply [`DisplayList::transform`] once.
//!
//! Draw order: grid, edges, nodes (paint order), merge affordance.

use ib_core::id::NodeId;
use ib_core::measure::SizingConfig;
use ib_core::model::{Bounds, EdgeKind, IdeaGraph, NodeKind, Point, Size};
use ib_core::viewport::ViewTransform;
use serde::Serialize;

/// World-space spacing of the background dot grid.
pub const GRID_SPACING: f32 = 50.0;
/// Below this scale the grid is too dense to be useful and is skipped.
pub const GRID_MIN_SCALE: f32 = 0.3;
pub const MERGE_BADGE_RADIUS: f32 = 18.0;
/// Extra radius of the pulse ring beyond the target's half-diagonal.
pub const PULSE_PADDING: f32 = 8.0;
pub const GLOW_PADDING: f32 = 6.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Primitive {
    /// Dots every `spacing` world units covering the visible rect.
    #[serde(rename_all = "camelCase")]
    GridDots {
        spacing: f32,
        min: Point,
        max: Point,
    },
    Edge {
        from: Point,
        to: Point,
        kind: EdgeKind,
    },
    #[serde(rename_all = "camelCase")]
    Node {
        id: NodeId,
        kind: NodeKind,
        bounds: Bounds,
        text: String,
        font_size: f32,
        padding: f32,
        selected: bool,
        busy: bool,
        dragging: bool,
    },
    /// Dashed line between a combine source and target.
    CandidateLine { from: Point, to: Point },
    Glow {
        bounds: Bounds,
    },
    Pulse { center: Point, radius: f32 },
    MergeBadge { center: Point, radius: f32 },
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DisplayList {
    pub view: ViewTransform,
    pub items: Vec<Primitive>,
}

impl DisplayList {
    /// World → screen affine `[a, b, c, d, e, f]`.
    pub fn transform(&self) -> [f64; 6] {
        self.view.as_affine()
    }

    pub fn nodes(&self) -> impl Iterator<Item = &Primitive> {
        self.items.iter().filter(|p| matches!(p, Primitive::Node { .. }))
    }
}

/// Everything the render surface reads.
pub struct SceneInput<'a> {
    pub graph: &'a IdeaGraph,
    pub view: ViewTransform,
    /// Screen size in pixels; bounds the grid.
    pub screen: Size,
    pub sizing: &'a SizingConfig,
    /// `(source, target)` while a combine candidate is live.
    pub candidate: Option<(NodeId, NodeId)>,
    pub selected: Option<NodeId>,
    pub dragging: Option<NodeId>,
    pub is_busy: &'a dyn Fn(NodeId) -> bool,
}

pub fn build_display_list(input: &SceneInput<'_>) -> DisplayList {
    let graph = input.graph;
    let mut items = Vec::with_capacity(graph.len() * 2 + 8);

    if input.view.scale >= GRID_MIN_SCALE && input.screen.width > 0.0 && input.screen.height > 0.0 {
        let tl = input.view.screen_to_world(0.0, 0.0);
        let br = input.view.screen_to_world(input.screen.width, input.screen.height);
        let snap_down = |v: f32| (v / GRID_SPACING).floor() * GRID_SPACING;
        items.push(Primitive::GridDots {
            spacing: GRID_SPACING,
            min: Point::new(snap_down(tl.x), snap_down(tl.y)),
            max: Point::new(br.x, br.y),
        });
    }

    for edge in graph.edges() {
        let (Some(from), Some(to)) = (graph.get(edge.from), graph.get(edge.to)) else {
            continue;
        };
        items.push(Primitive::Edge {
            from: from.position,
            to: to.position,
            kind: edge.kind,
        });
    }

    for node in graph.paint_order() {
        let sizing = input.sizing.for_kind(node.kind);
        items.push(Primitive::Node {
            id: node.id,
            kind: node.kind,
            bounds: node.bounds(),
            text: node.text.clone(),
            font_size: sizing.font_size,
            padding: sizing.padding,
            selected: input.selected == Some(node.id),
            busy: (input.is_busy)(node.id),
            dragging: input.dragging == Some(node.id),
        });
    }

    if let Some((source, target)) = input.candidate
        && let (Some(s), Some(t)) = (graph.get(source), graph.get(target))
    {
        items.push(Primitive::CandidateLine {
            from: s.position,
            to: t.position,
        });
        for b in [s.bounds(), t.bounds()] {
            items.push(Primitive::Glow {
                bounds: Bounds {
                    x: b.x - GLOW_PADDING,
                    y: b.y - GLOW_PADDING,
                    width: b.width + 2.0 * GLOW_PADDING,
                    height: b.height + 2.0 * GLOW_PADDING,
                },
            });
        }
        items.push(Primitive::Pulse {
            center: t.position,
            radius: t.size.width.hypot(t.size.height) / 2.0 + PULSE_PADDING,
        });
        items.push(Primitive::MergeBadge {
            center: s.position.midpoint(t.position),
            radius: MERGE_BADGE_RADIUS,
        });
    }

    DisplayList {
        view: input.view,
        items,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ib_core::model::IdeaNode;

    fn graph() -> (IdeaGraph, NodeId, NodeId) {
        let mut g = IdeaGraph::new();
        g.upsert(IdeaNode::new(NodeId::root(), NodeKind::Root, "Use case")).unwrap();
        let a = g
            .upsert(IdeaNode::new(NodeId::with_prefix("topic"), NodeKind::Topic, "A").at(Point::new(0.0, 200.0)))
            .unwrap();
        let b = g
            .upsert(IdeaNode::new(NodeId::with_prefix("topic"), NodeKind::Topic, "B").at(Point::new(80.0, 200.0)))
            .unwrap();
        (g, a, b)
    }

    fn input<'a>(g: &'a IdeaGraph, sizing: &'a SizingConfig, busy: &'a dyn Fn(NodeId) -> bool) -> SceneInput<'a> {
        SceneInput {
            graph: g,
            view: ViewTransform::default(),
            screen: Size {
                width: 800.0,
                height: 600.0,
            },
            sizing,
            candidate: None,
            selected: None,
            dragging: None,
            is_busy: busy,
        }
    }

    #[test]
    fn one_shape_per_node_and_line_per_edge() {
        let (g, _, _) = graph();
        let sizing = SizingConfig::default();
        let list = build_display_list(&input(&g, &sizing, &|_| false));
        assert_eq!(list.nodes().count(), 3);
        let edges = list
            .items
            .iter()
            .filter(|p| matches!(p, Primitive::Edge { kind: EdgeKind::FanOut, .. }))
            .count();
        assert_eq!(edges, 2);
        assert!(matches!(list.items[0], Primitive::GridDots { .. }));
    }

    #[test]
    fn grid_skipped_when_zoomed_far_out() {
        let (g, _, _) = graph();
        let sizing = SizingConfig::default();
        let never = |_: NodeId| false;
        let mut scene = input(&g, &sizing, &never);
        scene.view.scale = 0.2;
        let list = build_display_list(&scene);
        assert!(!list.items.iter().any(|p| matches!(p, Primitive::GridDots { .. })));
    }

    #[test]
    fn merge_affordance_drawn_last() {
        let (g, a, b) = graph();
        let sizing = SizingConfig::default();
        let never = |_: NodeId| false;
        let mut scene = input(&g, &sizing, &never);
        scene.candidate = Some((a, b));
        let list = build_display_list(&scene);
        let tail: Vec<&Primitive> = list.items.iter().rev().take(5).collect();
        assert!(matches!(tail[0], Primitive::MergeBadge { center, .. } if *center == Point::new(40.0, 200.0)));
        assert!(matches!(tail[1], Primitive::Pulse { .. }));
        assert!(matches!(tail[2], Primitive::Glow { .. }));
        assert!(matches!(tail[3], Primitive::Glow { .. }));
        assert!(matches!(tail[4], Primitive::CandidateLine { .. }));
    }

    #[test]
    fn busy_nodes_are_flagged() {
        let (g, a, _) = graph();
        let sizing = SizingConfig::default();
        let busy = move |id: NodeId| id == a;
        let list = build_display_list(&input(&g, &sizing, &busy));
        let flagged: Vec<NodeId> = list
            .nodes()
            .filter_map(|p| match p {
                Primitive::Node { id, busy: true, .. } => Some(*id),
                _ => None,
            })
            .collect();
        assert_eq!(flagged, vec![a]);
    }
}
