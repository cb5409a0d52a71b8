//! Display list → Vello drawing commands.
//!
//! Emits fills and strokes for every primitive under the list's view
//! affine. The caller owns the surface and presents the scene.

use crate::scene::{DisplayList, Primitive};
use crate::theme::{Rgba, Theme};
use ib_core::model::{Bounds, EdgeKind, Point};
use kurbo::{Affine, Circle, Line, Rect, RoundedRect, Stroke as KurboStroke};
use peniko::{Color, Fill};
use vello::Scene;

/// Skip the dot grid rather than emit more dots than this per frame.
const MAX_GRID_DOTS: usize = 40_000;

/// Paint a display list into a Vello scene.
///
/// Call once per frame with a freshly-cleared `Scene`.
pub fn paint_display_list(scene: &mut Scene, list: &DisplayList, theme: &Theme) {
    let [a, b, c, d, e, f] = list.transform();
    let view = Affine::new([a, b, c, d, e, f]);
    let scale = list.view.scale.max(f32::EPSILON) as f64;

    for item in &list.items {
        match item {
            Primitive::GridDots { spacing, min, max } => {
                paint_grid(scene, view, *spacing, *min, *max, scale, theme.grid);
            }
            Primitive::Edge { from, to, kind } => {
                let width = match kind {
                    EdgeKind::Child => 1.5,
                    EdgeKind::FanOut => 2.0,
                };
                let line = Line::new(pt(*from), pt(*to));
                scene.stroke(&KurboStroke::new(width / scale), view, color(theme.edge), None, &line);
            }
            Primitive::Node {
                id,
                kind,
                bounds,
                text,
                selected,
                busy,
                dragging,
                ..
            } => {
                let style = theme.node(*kind);
                let shape = rect(*bounds).to_rounded_rect(style.corner_radius as f64);
                let fill = if *dragging { style.fill.with_alpha(230) } else { style.fill };
                scene.fill(Fill::NonZero, view, color(fill), None, &shape);
                scene.stroke(&KurboStroke::new(1.0 / scale), view, color(style.stroke), None, &shape);
                if *busy {
                    scene.fill(Fill::NonZero, view, color(theme.busy), None, &shape);
                }
                if *selected {
                    let ring = rect(inflate(*bounds, 2.0)).to_rounded_rect(style.corner_radius as f64 + 2.0);
                    scene.stroke(&KurboStroke::new(2.0 / scale), view, color(theme.selection), None, &ring);
                }
                log::trace!("LABEL {} {:?} at ({}, {})", id, text, bounds.x, bounds.y);
                // Glyph shaping needs a font context; labels are left to the host.
            }
            Primitive::CandidateLine { from, to } => {
                let stroke = KurboStroke::new(2.0 / scale).with_dashes(0.0, [8.0 / scale, 6.0 / scale]);
                let line = Line::new(pt(*from), pt(*to));
                scene.stroke(&stroke, view, color(theme.merge), None, &line);
            }
            Primitive::Glow { bounds } => {
                let shape: RoundedRect = rect(*bounds).to_rounded_rect(12.0);
                scene.fill(Fill::NonZero, view, color(theme.merge.with_alpha(40)), None, &shape);
                scene.stroke(&KurboStroke::new(3.0 / scale), view, color(theme.merge.with_alpha(160)), None, &shape);
            }
            Primitive::Pulse { center, radius } => {
                let ring = Circle::new(pt(*center), *radius as f64);
                scene.stroke(&KurboStroke::new(2.0 / scale), view, color(theme.merge.with_alpha(120)), None, &ring);
            }
            Primitive::MergeBadge { center, radius } => {
                let badge = Circle::new(pt(*center), *radius as f64);
                scene.fill(Fill::NonZero, view, color(theme.merge), None, &badge);
                // "+" glyph drawn as two strokes.
                let arm = *radius as f64 * 0.45;
                let c = pt(*center);
                let plus = KurboStroke::new(2.5 / scale);
                let ink = color(theme.merge_badge_text);
                scene.stroke(&plus, view, ink, None, &Line::new((c.x - arm, c.y), (c.x + arm, c.y)));
                scene.stroke(&plus, view, ink, None, &Line::new((c.x, c.y - arm), (c.x, c.y + arm)));
            }
        }
    }
}

fn paint_grid(scene: &mut Scene, view: Affine, spacing: f32, min: Point, max: Point, scale: f64, grid: Rgba) {
    if spacing <= 0.0 {
        return;
    }
    let cols = ((max.x - min.x) / spacing).ceil().max(0.0) as usize + 1;
    let rows = ((max.y - min.y) / spacing).ceil().max(0.0) as usize + 1;
    if cols.saturating_mul(rows) > MAX_GRID_DOTS {
        log::trace!("grid: {cols}x{rows} dots over budget, skipped");
        return;
    }
    let dot = color(grid);
    let r = 1.0 / scale;
    for row in 0..rows {
        for col in 0..cols {
            let x = min.x as f64 + col as f64 * spacing as f64;
            let y = min.y as f64 + row as f64 * spacing as f64;
            scene.fill(Fill::NonZero, view, dot, None, &Circle::new((x, y), r));
        }
    }
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

fn pt(p: Point) -> kurbo::Point {
    kurbo::Point::new(p.x as f64, p.y as f64)
}

fn rect(b: Bounds) -> Rect {
    Rect::new(
        b.x as f64,
        b.y as f64,
        (b.x + b.width) as f64,
        (b.y + b.height) as f64,
    )
}

fn inflate(b: Bounds, by: f32) -> Bounds {
    Bounds {
        x: b.x - by,
        y: b.y - by,
        width: b.width + 2.0 * by,
        height: b.height + 2.0 * by,
    }
}

fn color(c: Rgba) -> Color {
    Color::from_rgba8(c.r, c.g, c.b, c.a)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{SceneInput, build_display_list};
    use ib_core::id::NodeId;
    use ib_core::measure::SizingConfig;
    use ib_core::model::{IdeaGraph, IdeaNode, NodeKind, Size};
    use ib_core::viewport::ViewTransform;

    #[test]
    fn paints_every_primitive_kind() {
        let mut g = IdeaGraph::new();
        g.upsert(IdeaNode::new(NodeId::root(), NodeKind::Root, "Use case").sized(Size {
            width: 160.0,
            height: 70.0,
        }))
        .unwrap();
        let a = g
            .upsert(IdeaNode::new(NodeId::with_prefix("topic"), NodeKind::Topic, "A").at(Point::new(0.0, 200.0)))
            .unwrap();
        let b = g
            .upsert(IdeaNode::new(NodeId::with_prefix("topic"), NodeKind::Topic, "B").at(Point::new(60.0, 200.0)))
            .unwrap();
        let sizing = SizingConfig::default();
        let busy = |id: NodeId| id == b;
        let list = build_display_list(&SceneInput {
            graph: &g,
            view: ViewTransform::default(),
            screen: Size {
                width: 400.0,
                height: 300.0,
            },
            sizing: &sizing,
            candidate: Some((a, b)),
            selected: Some(a),
            dragging: Some(a),
            is_busy: &busy,
        });

        let mut scene = Scene::new();
        assert!(scene.encoding().is_empty());
        paint_display_list(&mut scene, &list, &Theme::dark());
        assert!(!scene.encoding().is_empty());
    }
}
