//! Colors shared by the Vello and Canvas2D painters.

use ib_core::NodeKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn with_alpha(self, a: u8) -> Self {
        Self { a, ..self }
    }

    /// `rgba(r, g, b, a)` for Canvas2D style setters.
    pub fn to_css(self) -> String {
        format!(
            "rgba({}, {}, {}, {:.3})",
            self.r,
            self.g,
            self.b,
            self.a as f32 / 255.0
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NodeStyle {
    pub fill: Rgba,
    pub stroke: Rgba,
    pub text: Rgba,
    pub corner_radius: f32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Theme {
    pub background: Rgba,
    pub grid: Rgba,
    pub edge: Rgba,
    pub root: NodeStyle,
    pub topic: NodeStyle,
    pub expansion: NodeStyle,
    pub selection: Rgba,
    /// Overlay color for nodes with an operation in flight.
    pub busy: Rgba,
    /// Candidate line, glow, pulse and badge.
    pub merge: Rgba,
    pub merge_badge_text: Rgba,
}

impl Theme {
    /// Light theme, warm white canvas.
    pub fn light() -> Self {
        Self {
            background: Rgba::rgb(0xF5, 0xF5, 0xF7),
            grid: Rgba::rgba(0, 0, 0, 40),
            edge: Rgba::rgb(0xB0, 0xB0, 0xB8),
            root: NodeStyle {
                fill: Rgba::rgb(0x1D, 0x1D, 0x1F),
                stroke: Rgba::rgb(0x1D, 0x1D, 0x1F),
                text: Rgba::rgb(0xFF, 0xFF, 0xFF),
                corner_radius: 14.0,
            },
            topic: NodeStyle {
                fill: Rgba::rgb(0xFF, 0xFF, 0xFF),
                stroke: Rgba::rgb(0xD2, 0xD2, 0xD7),
                text: Rgba::rgb(0x1D, 0x1D, 0x1F),
                corner_radius: 10.0,
            },
            expansion: NodeStyle {
                fill: Rgba::rgb(0xEE, 0xF4, 0xFF),
                stroke: Rgba::rgb(0xA8, 0xC7, 0xFA),
                text: Rgba::rgb(0x1D, 0x3A, 0x6E),
                corner_radius: 8.0,
            },
            selection: Rgba::rgb(0x4F, 0xC3, 0xF7),
            busy: Rgba::rgba(0x86, 0x86, 0x8B, 90),
            merge: Rgba::rgb(0xAF, 0x52, 0xDE),
            merge_badge_text: Rgba::rgb(0xFF, 0xFF, 0xFF),
        }
    }

    /// Dark theme.
    pub fn dark() -> Self {
        Self {
            background: Rgba::rgb(0x1C, 0x1C, 0x1E),
            grid: Rgba::rgba(255, 255, 255, 24),
            edge: Rgba::rgb(0x48, 0x48, 0x4A),
            root: NodeStyle {
                fill: Rgba::rgb(0xF5, 0xF5, 0xF7),
                stroke: Rgba::rgb(0xF5, 0xF5, 0xF7),
                text: Rgba::rgb(0x1C, 0x1C, 0x1E),
                corner_radius: 14.0,
            },
            topic: NodeStyle {
                fill: Rgba::rgb(0x2C, 0x2C, 0x2E),
                stroke: Rgba::rgb(0x48, 0x48, 0x4A),
                text: Rgba::rgb(0xF5, 0xF5, 0xF7),
                corner_radius: 10.0,
            },
            expansion: NodeStyle {
                fill: Rgba::rgb(0x1E, 0x2A, 0x3D),
                stroke: Rgba::rgb(0x3A, 0x5A, 0x8C),
                text: Rgba::rgb(0xC8, 0xDC, 0xFF),
                corner_radius: 8.0,
            },
            selection: Rgba::rgb(0x4F, 0xC3, 0xF7),
            busy: Rgba::rgba(0x63, 0x63, 0x66, 110),
            merge: Rgba::rgb(0xBF, 0x5A, 0xF2),
            merge_badge_text: Rgba::rgb(0xFF, 0xFF, 0xFF),
        }
    }

    pub fn node(&self, kind: NodeKind) -> &NodeStyle {
        match kind {
            NodeKind::Root => &self.root,
            NodeKind::Topic => &self.topic,
            NodeKind::Expansion => &self.expansion,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::light()
    }
}
