//! Canvas2D painter.
//!
//! Draws a [`DisplayList`] to an HTML `<canvas>` via
//! `CanvasRenderingContext2d`. Primitives are in world coordinates; the view
//! transform is set once and everything after it is drawn in world units.

use ib_core::TextMetrics;
use ib_core::model::{Bounds, EdgeKind, NodeKind, Point};
use ib_render::scene::{DisplayList, Primitive};
use ib_render::theme::{Rgba, Theme};
use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

const FONT_FAMILY: &str = "Inter, system-ui, sans-serif";

/// Text widths measured by the browser's font stack.
pub struct CanvasMetrics {
    ctx: CanvasRenderingContext2d,
}

impl CanvasMetrics {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }
}

impl TextMetrics for CanvasMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        self.ctx.save();
        self.ctx.set_font(&format!("500 {font_size}px {FONT_FAMILY}"));
        let width = self.ctx.measure_text(text).map(|m| m.width()).unwrap_or(0.0);
        self.ctx.restore();
        width as f32
    }
}

/// Paint the whole display list. `time_ms` drives the pulse animation.
pub fn render(ctx: &CanvasRenderingContext2d, list: &DisplayList, theme: &Theme, width: f64, height: f64, time_ms: f64) {
    // Clear in screen space.
    let _ = ctx.set_transform(1.0, 0.0, 0.0, 1.0, 0.0, 0.0);
    ctx.set_fill_style_str(&theme.background.to_css());
    ctx.fill_rect(0.0, 0.0, width, height);

    let [a, b, c, d, e, f] = list.transform();
    let _ = ctx.set_transform(a, b, c, d, e, f);
    // Hairlines stay one screen pixel wide at any zoom.
    let px = 1.0 / list.view.scale as f64;

    for item in &list.items {
        match item {
            Primitive::GridDots { spacing, min, max } => draw_grid(ctx, *spacing, *min, *max, theme.grid, px),
            Primitive::Edge { from, to, kind } => draw_edge(ctx, *from, *to, *kind, theme.edge, px),
            Primitive::Node {
                kind,
                bounds,
                text,
                font_size,
                padding,
                selected,
                busy,
                dragging,
                ..
            } => {
                let style = theme.node(*kind);
                ctx.save();
                if *dragging {
                    ctx.set_global_alpha(0.85);
                }
                rounded_rect_path(ctx, bounds, style.corner_radius as f64);
                ctx.set_fill_style_str(&style.fill.to_css());
                ctx.fill();
                ctx.set_stroke_style_str(&style.stroke.to_css());
                ctx.set_line_width(px);
                ctx.stroke();
                draw_label(ctx, bounds, text, *kind, *font_size as f64, *padding as f64, style.text);
                if *busy {
                    rounded_rect_path(ctx, bounds, style.corner_radius as f64);
                    ctx.set_fill_style_str(&theme.busy.to_css());
                    ctx.fill();
                }
                if *selected {
                    let ring = Bounds {
                        x: bounds.x - 2.0,
                        y: bounds.y - 2.0,
                        width: bounds.width + 4.0,
                        height: bounds.height + 4.0,
                    };
                    rounded_rect_path(ctx, &ring, style.corner_radius as f64 + 2.0);
                    ctx.set_stroke_style_str(&theme.selection.to_css());
                    ctx.set_line_width(2.0 * px);
                    ctx.stroke();
                }
                ctx.restore();
            }
            Primitive::CandidateLine { from, to } => {
                ctx.save();
                set_dash(ctx, &[6.0 * px, 4.0 * px]);
                ctx.set_stroke_style_str(&theme.merge.to_css());
                ctx.set_line_width(2.0 * px);
                ctx.begin_path();
                ctx.move_to(from.x as f64, from.y as f64);
                ctx.line_to(to.x as f64, to.y as f64);
                ctx.stroke();
                ctx.restore();
            }
            Primitive::Glow { bounds } => {
                ctx.save();
                ctx.set_shadow_color(&theme.merge.to_css());
                ctx.set_shadow_blur(12.0);
                rounded_rect_path(ctx, bounds, 12.0);
                ctx.set_stroke_style_str(&theme.merge.with_alpha(160).to_css());
                ctx.set_line_width(3.0 * px);
                ctx.stroke();
                ctx.restore();
            }
            Primitive::Pulse { center, radius } => {
                // 1 s breathing cycle.
                let phase = (time_ms / 1000.0 * std::f64::consts::TAU).sin() * 0.5 + 0.5;
                ctx.save();
                ctx.set_stroke_style_str(&theme.merge.with_alpha((80.0 + 120.0 * phase) as u8).to_css());
                ctx.set_line_width(2.0 * px);
                ctx.begin_path();
                let _ = ctx.arc(
                    center.x as f64,
                    center.y as f64,
                    *radius as f64 + 4.0 * phase,
                    0.0,
                    std::f64::consts::TAU,
                );
                ctx.stroke();
                ctx.restore();
            }
            Primitive::MergeBadge { center, radius } => {
                ctx.save();
                ctx.begin_path();
                let _ = ctx.arc(center.x as f64, center.y as f64, *radius as f64, 0.0, std::f64::consts::TAU);
                ctx.set_fill_style_str(&theme.merge.to_css());
                ctx.fill();
                ctx.set_fill_style_str(&theme.merge_badge_text.to_css());
                ctx.set_font(&format!("700 {}px {FONT_FAMILY}", *radius as f64 * 1.2));
                ctx.set_text_align("center");
                ctx.set_text_baseline("middle");
                let _ = ctx.fill_text("+", center.x as f64, center.y as f64);
                ctx.restore();
            }
        }
    }
}

fn draw_grid(ctx: &CanvasRenderingContext2d, spacing: f32, min: Point, max: Point, color: Rgba, px: f64) {
    ctx.set_fill_style_str(&color.to_css());
    let dot = 1.5 * px;
    let mut x = min.x;
    while x <= max.x {
        let mut y = min.y;
        while y <= max.y {
            ctx.fill_rect(x as f64 - dot / 2.0, y as f64 - dot / 2.0, dot, dot);
            y += spacing;
        }
        x += spacing;
    }
}

fn draw_edge(ctx: &CanvasRenderingContext2d, from: Point, to: Point, kind: EdgeKind, color: Rgba, px: f64) {
    ctx.save();
    ctx.set_stroke_style_str(&color.to_css());
    ctx.set_line_width(1.5 * px);
    if kind == EdgeKind::FanOut {
        set_dash(ctx, &[4.0 * px, 4.0 * px]);
    }
    ctx.begin_path();
    ctx.move_to(from.x as f64, from.y as f64);
    ctx.line_to(to.x as f64, to.y as f64);
    ctx.stroke();
    ctx.restore();
}

/// Centered label, word-wrapped to the node's inner width.
fn draw_label(
    ctx: &CanvasRenderingContext2d,
    b: &Bounds,
    text: &str,
    kind: NodeKind,
    font_size: f64,
    padding: f64,
    color: Rgba,
) {
    let weight = if kind == NodeKind::Root { 600 } else { 500 };
    ctx.set_font(&format!("{weight} {font_size}px {FONT_FAMILY}"));
    ctx.set_fill_style_str(&color.to_css());
    ctx.set_text_align("center");
    ctx.set_text_baseline("middle");

    let max_width = (b.width as f64 - 2.0 * padding).max(1.0);
    let lines = wrap(text, max_width, |s| ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0));
    let line_height = font_size * 1.3;
    let center = b.center();
    let top = center.y as f64 - line_height * (lines.len() as f64 - 1.0) / 2.0;
    for (i, line) in lines.iter().enumerate() {
        let _ = ctx.fill_text(line, center.x as f64, top + i as f64 * line_height);
    }
}

/// Greedy whitespace wrap. A single word wider than `max_width` gets its own line.
fn wrap(text: &str, max_width: f64, width_of: impl Fn(&str) -> f64) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if !current.is_empty() && width_of(&candidate) > max_width {
            lines.push(std::mem::replace(&mut current, word.to_string()));
        } else {
            current = candidate;
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn set_dash(ctx: &CanvasRenderingContext2d, pattern: &[f64]) {
    let array = js_sys::Array::new();
    for v in pattern {
        array.push(&JsValue::from_f64(*v));
    }
    let _ = ctx.set_line_dash(&array);
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, b: &Bounds, r: f64) {
    let (x, y, w, h) = (b.x as f64, b.y as f64, b.width as f64, b.height as f64);
    let r = r.min(w / 2.0).min(h / 2.0).max(0.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}

#[cfg(test)]
mod tests {
    use super::wrap;

    fn chars(s: &str) -> f64 {
        s.chars().count() as f64
    }

    #[test]
    fn wrap_breaks_on_whitespace() {
        assert_eq!(wrap("one two three four", 9.0, chars), vec!["one two", "three", "four"]);
    }

    #[test]
    fn wrap_keeps_long_words_whole() {
        assert_eq!(wrap("supercalifragilistic ok", 5.0, chars), vec!["supercalifragilistic", "ok"]);
    }

    #[test]
    fn wrap_empty_text_has_no_lines() {
        assert!(wrap("   ", 10.0, chars).is_empty());
    }
}
