//! Hit testing: point → node lookup, and proximity search for combine
//! candidates.

use ib_core::id::NodeId;
use ib_core::model::{IdeaGraph, NodeKind, Point};

/// Find the topmost node containing world point (px, py).
/// Returns `None` if no node is hit (background).
pub fn hit_test(graph: &IdeaGraph, px: f32, py: f32) -> Option<NodeId> {
    // Last painted = topmost.
    graph
        .paint_order()
        .into_iter()
        .rev()
        .find(|n| n.bounds().contains(px, py))
        .map(|n| n.id)
}

/// Nearest live node to `source` whose center lies strictly within
/// `max_distance`. Excludes `source` itself and the root; a root source never
/// has a candidate. Exact ties go to the earliest-created node.
pub fn nearest_within(graph: &IdeaGraph, source: NodeId, max_distance: f32) -> Option<(NodeId, f32)> {
    let center = graph.get(source)?.position;
    nearest_from(graph, source, center, max_distance)
}

/// Like [`nearest_within`], measuring from `center` instead of the stored
/// position. Lets a drag score candidates before the move is applied.
pub fn nearest_from(graph: &IdeaGraph, source: NodeId, center: Point, max_distance: f32) -> Option<(NodeId, f32)> {
    if graph.get(source)?.kind == NodeKind::Root {
        return None;
    }

    let mut best: Option<(NodeId, f32)> = None;
    // `nodes()` is in creation order, so keeping the first of equal
    // distances is the tie-break.
    for node in graph.nodes() {
        if node.id == source || node.kind == NodeKind::Root {
            continue;
        }
        let d = center.distance(node.position);
        if d >= max_distance {
            continue;
        }
        if best.is_none_or(|(_, bd)| d < bd) {
            best = Some((node.id, d));
        }
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use ib_core::model::{IdeaNode, Size};

    fn place(graph: &mut IdeaGraph, text: &str, x: f32, y: f32) -> NodeId {
        graph
            .upsert(
                IdeaNode::new(NodeId::with_prefix("topic"), NodeKind::Topic, text)
                    .at(Point::new(x, y))
                    .sized(Size {
                        width: 100.0,
                        height: 60.0,
                    }),
            )
            .unwrap()
    }

    #[test]
    fn hit_test_prefers_topmost() {
        let mut g = IdeaGraph::new();
        let a = place(&mut g, "A", 100.0, 100.0);
        let b = place(&mut g, "B", 120.0, 100.0);
        assert_eq!(hit_test(&g, 110.0, 100.0), Some(b));
        g.raise_to_top(a).unwrap();
        assert_eq!(hit_test(&g, 110.0, 100.0), Some(a));
        assert_eq!(hit_test(&g, 500.0, 500.0), None);
    }

    #[test]
    fn nearest_within_threshold() {
        let mut g = IdeaGraph::new();
        let a = place(&mut g, "A", 0.0, 0.0);
        let b = place(&mut g, "B", 60.0, 0.0);
        let _far = place(&mut g, "C", 300.0, 0.0);
        assert_eq!(nearest_within(&g, a, 100.0).map(|(id, _)| id), Some(b));
        assert_eq!(nearest_within(&g, a, 50.0), None);
    }

    #[test]
    fn threshold_is_exclusive() {
        let mut g = IdeaGraph::new();
        let a = place(&mut g, "A", 0.0, 0.0);
        place(&mut g, "B", 100.0, 0.0);
        assert_eq!(nearest_within(&g, a, 100.0), None);
    }

    #[test]
    fn ties_go_to_earliest_node() {
        let mut g = IdeaGraph::new();
        let src = place(&mut g, "S", 0.0, 0.0);
        let first = place(&mut g, "L", -40.0, 0.0);
        let _second = place(&mut g, "R", 40.0, 0.0);
        for _ in 0..3 {
            assert_eq!(nearest_within(&g, src, 100.0).map(|(id, _)| id), Some(first));
        }
    }

    #[test]
    fn root_is_never_a_candidate() {
        let mut g = IdeaGraph::new();
        let root = g
            .upsert(IdeaNode::new(NodeId::root(), NodeKind::Root, "Use case").at(Point::new(10.0, 0.0)))
            .unwrap();
        let a = place(&mut g, "A", 0.0, 0.0);
        assert_eq!(nearest_within(&g, a, 100.0), None);
        assert_eq!(nearest_within(&g, root, 100.0), None);
    }
}
