//! Text measurement: node size derived from its label.
//!
//! A node's box is its wrapped text block plus padding. The text block width
//! is the natural single-line width clamped to `[min_text_width,
//! max_text_width]`; longer text wraps greedily on whitespace.

use crate::model::{NodeKind, Size};
use serde::{Deserialize, Serialize};

/// Supplies glyph-run widths. The default estimate is good enough for layout;
/// hosts with a real font stack (Canvas2D `measureText`) can plug their own.
pub trait TextMetrics {
    /// Width of `text` laid out on a single line at `font_size`.
    fn text_width(&self, text: &str, font_size: f32) -> f32;
}

/// Fixed average-advance estimate.
#[derive(Debug, Clone, Copy)]
pub struct ApproxMetrics {
    /// Average glyph advance as a fraction of the font size.
    pub advance: f32,
}

impl Default for ApproxMetrics {
    fn default() -> Self {
        Self { advance: 0.56 }
    }
}

impl TextMetrics for ApproxMetrics {
    fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars().count() as f32 * font_size * self.advance
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct KindSizing {
    pub font_size: f32,
    pub min_text_width: f32,
    pub max_text_width: f32,
    pub min_text_height: f32,
    pub padding: f32,
    /// Line height as a multiple of the font size.
    pub line_height: f32,
}

impl Default for KindSizing {
    fn default() -> Self {
        Self {
            font_size: 16.0,
            min_text_width: 80.0,
            max_text_width: 300.0,
            min_text_height: 30.0,
            padding: 20.0,
            line_height: 1.2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct SizingConfig {
    pub root: KindSizing,
    pub topic: KindSizing,
    pub expansion: KindSizing,
}

impl Default for SizingConfig {
    fn default() -> Self {
        Self {
            root: KindSizing {
                font_size: 18.0,
                max_text_width: 320.0,
                ..KindSizing::default()
            },
            topic: KindSizing::default(),
            expansion: KindSizing {
                font_size: 14.0,
                max_text_width: 280.0,
                ..KindSizing::default()
            },
        }
    }
}

impl SizingConfig {
    pub fn for_kind(&self, kind: NodeKind) -> &KindSizing {
        match kind {
            NodeKind::Root => &self.root,
            NodeKind::Topic => &self.topic,
            NodeKind::Expansion => &self.expansion,
        }
    }
}

/// Measure the box a node of `kind` needs for `text`.
pub fn measure_node(
    metrics: &dyn TextMetrics,
    sizing: &SizingConfig,
    kind: NodeKind,
    text: &str,
) -> Size {
    let s = sizing.for_kind(kind);
    let natural = metrics.text_width(text, s.font_size);
    let text_width = natural.clamp(s.min_text_width, s.max_text_width.max(s.min_text_width));
    let lines = count_lines(metrics, text, s.font_size, text_width);
    let text_height = (lines as f32 * s.font_size * s.line_height).max(s.min_text_height);
    Size {
        width: text_width + 2.0 * s.padding,
        height: text_height + 2.0 * s.padding,
    }
}

/// Greedy word wrap; returns the number of visual lines.
fn count_lines(metrics: &dyn TextMetrics, text: &str, font_size: f32, max_width: f32) -> usize {
    // Nothing can wrap inside a zero-width block; only hard breaks count.
    if !(max_width.is_finite() && max_width > 0.0) {
        return text.split('\n').count().max(1);
    }
    let space = metrics.text_width(" ", font_size);
    let mut lines = 0;
    for paragraph in text.split('\n') {
        let mut line_width = 0.0f32;
        let mut para_lines: usize = 1;
        for word in paragraph.split_whitespace() {
            let w = metrics.text_width(word, font_size);
            if w > max_width {
                // Over-long word: break it across as many lines as needed.
                if line_width > 0.0 {
                    para_lines += 1;
                }
                let extra = ((w / max_width).ceil() as usize).max(1);
                para_lines = para_lines.saturating_add(extra - 1);
                line_width = w - (extra - 1) as f32 * max_width;
                continue;
            }
            let needed = if line_width > 0.0 { line_width + space + w } else { w };
            if needed > max_width {
                para_lines += 1;
                line_width = w;
            } else {
                line_width = needed;
            }
        }
        lines = para_lines.saturating_add(lines);
    }
    lines.max(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_gets_minimum_box() {
        let size = measure_node(
            &ApproxMetrics::default(),
            &SizingConfig::default(),
            NodeKind::Topic,
            "Go",
        );
        assert_eq!(size.width, 80.0 + 40.0);
        assert_eq!(size.height, 30.0 + 40.0);
    }

    #[test]
    fn long_text_wraps_at_max_width() {
        let sizing = SizingConfig::default();
        let text = "An unusually long idea about rock climbing gyms that double as co-working spaces for remote developers";
        let size = measure_node(&ApproxMetrics::default(), &sizing, NodeKind::Topic, text);
        assert_eq!(size.width, sizing.topic.max_text_width + 40.0);
        assert!(size.height > 30.0 + 40.0, "wrapped text should be taller: {size:?}");
    }

    #[test]
    fn expansions_are_smaller_than_topics() {
        let text = "Bouldering competitions";
        let metrics = ApproxMetrics::default();
        let sizing = SizingConfig::default();
        let topic = measure_node(&metrics, &sizing, NodeKind::Topic, text);
        let expansion = measure_node(&metrics, &sizing, NodeKind::Expansion, text);
        assert!(expansion.width < topic.width);
    }

    #[test]
    fn explicit_newlines_add_lines() {
        let metrics = ApproxMetrics::default();
        assert_eq!(count_lines(&metrics, "a\nb\nc", 16.0, 200.0), 3);
        assert_eq!(count_lines(&metrics, "", 16.0, 200.0), 1);
    }

    #[test]
    fn zero_width_block_does_not_overflow() {
        let mut sizing = SizingConfig::default();
        sizing.topic.min_text_width = 0.0;
        sizing.topic.max_text_width = 0.0;
        let size = measure_node(&ApproxMetrics::default(), &sizing, NodeKind::Topic, "two words");
        assert_eq!(size.width, 40.0);
        assert!(size.height.is_finite());
        assert_eq!(count_lines(&ApproxMetrics::default(), "a\nb", 16.0, 0.0), 2);
    }
}
