//! Drag & gesture controller.
//!
//! Translates pointer events into [`GestureAction`]s that the engine
//! applies. State machine:
//!
//! ```text
//! Idle ──down on node──▶ Dragging ◀──▶ Combining
//!  │                        │              │
//!  │                        └──── up ──────┴──▶ Idle
//!  └──down on background──▶ Panning ── up ──▶ Idle
//! ```
//!
//! Node moves are emitted on every pointer-move, never coalesced. A combine
//! candidate is only considered once the pointer has left the click slop, so
//! pressing a node that already sits next to another one is still a click.

use crate::engine::GraphMutation;
use crate::input::InputEvent;
use ib_core::id::NodeId;
use ib_core::model::{IdeaGraph, Point};
use ib_core::viewport::ViewTransform;
use ib_render::hit::{hit_test, nearest_from};

/// Cursor affordance for the host to display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CursorHint {
    Default,
    /// Hovering a node.
    Grab,
    Grabbing,
    /// Dragged node is over a combine target.
    Merge,
    /// Panning the background.
    Move,
}

/// What the controller needs to read from the board for one event.
#[derive(Clone, Copy)]
pub struct GestureContext<'a> {
    pub graph: &'a IdeaGraph,
    /// Latest (uncommitted) view; pointer math must not lag the gesture.
    pub view: ViewTransform,
    pub combine_distance: f32,
    pub click_slop: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DragSession {
    pub id: NodeId,
    /// World offset from the pointer to the node center at press time.
    grab: Point,
    /// Node position before the drag, restored on cancel.
    origin: Point,
    /// Screen position of the press.
    press: Point,
    /// Farthest screen distance from the press so far.
    travelled: f32,
}

impl DragSession {
    fn past_slop(&self, slop: f32) -> bool {
        self.travelled > slop
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Dragging(DragSession),
    Combining { drag: DragSession, target: NodeId },
    Panning { last: Point },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureAction {
    Mutate(GraphMutation),
    Select(Option<NodeId>),
    DragStarted(NodeId),
    /// `moved` is false for clicks and cancelled drags.
    DragEnded { id: NodeId, moved: bool },
    /// Screen-space pan delta.
    Pan { dx: f32, dy: f32 },
    PanEnded,
    Click(NodeId),
    Combine { source: NodeId, target: NodeId },
}

#[derive(Debug, Clone)]
pub struct GestureController {
    state: GestureState,
    hover: Option<NodeId>,
}

impl Default for GestureController {
    fn default() -> Self {
        Self::new()
    }
}

impl GestureController {
    pub fn new() -> Self {
        Self {
            state: GestureState::Idle,
            hover: None,
        }
    }

    pub fn state(&self) -> &GestureState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        !matches!(self.state, GestureState::Idle)
    }

    /// Node currently held by the pointer.
    pub fn dragged(&self) -> Option<NodeId> {
        match self.state {
            GestureState::Dragging(drag) | GestureState::Combining { drag, .. } => Some(drag.id),
            _ => None,
        }
    }

    /// `(source, target)` of the live combine candidate.
    pub fn candidate(&self) -> Option<(NodeId, NodeId)> {
        match self.state {
            GestureState::Combining { drag, target } => Some((drag.id, target)),
            _ => None,
        }
    }

    pub fn cursor(&self) -> CursorHint {
        match self.state {
            GestureState::Idle if self.hover.is_some() => CursorHint::Grab,
            GestureState::Idle => CursorHint::Default,
            GestureState::Dragging(_) => CursorHint::Grabbing,
            GestureState::Combining { .. } => CursorHint::Merge,
            GestureState::Panning { .. } => CursorHint::Move,
        }
    }

    pub fn handle(&mut self, event: &InputEvent, ctx: GestureContext<'_>) -> Vec<GestureAction> {
        match event {
            InputEvent::PointerDown { x, y, .. } => self.pointer_down(Point::new(*x, *y), ctx),
            InputEvent::PointerMove { x, y, .. } => self.pointer_move(Point::new(*x, *y), ctx),
            InputEvent::PointerUp { .. } => self.pointer_up(ctx),
            InputEvent::Wheel { .. } | InputEvent::Key { .. } => Vec::new(),
        }
    }

    fn pointer_down(&mut self, screen: Point, ctx: GestureContext<'_>) -> Vec<GestureAction> {
        if self.is_active() {
            // Second pointer while one is held: ignored.
            return Vec::new();
        }
        let world = ctx.view.screen_to_world(screen.x, screen.y);
        let Some(node) = hit_test(ctx.graph, world.x, world.y).and_then(|id| ctx.graph.get(id)) else {
            self.state = GestureState::Panning { last: screen };
            return vec![GestureAction::Select(None)];
        };

        let id = node.id;
        self.state = GestureState::Dragging(DragSession {
            id,
            grab: Point::new(node.position.x - world.x, node.position.y - world.y),
            origin: node.position,
            press: screen,
            travelled: 0.0,
        });
        vec![
            GestureAction::Select(Some(id)),
            GestureAction::Mutate(GraphMutation::RaiseNode { id }),
            GestureAction::DragStarted(id),
        ]
    }

    fn pointer_move(&mut self, screen: Point, ctx: GestureContext<'_>) -> Vec<GestureAction> {
        match self.state {
            GestureState::Idle => {
                let world = ctx.view.screen_to_world(screen.x, screen.y);
                self.hover = hit_test(ctx.graph, world.x, world.y);
                Vec::new()
            }
            GestureState::Panning { last } => {
                self.state = GestureState::Panning { last: screen };
                vec![GestureAction::Pan {
                    dx: screen.x - last.x,
                    dy: screen.y - last.y,
                }]
            }
            GestureState::Dragging(mut drag) | GestureState::Combining { mut drag, .. } => {
                drag.travelled = drag.travelled.max(drag.press.distance(screen));
                let world = ctx.view.screen_to_world(screen.x, screen.y);
                let center = Point::new(world.x + drag.grab.x, world.y + drag.grab.y);

                let target = if drag.past_slop(ctx.click_slop) {
                    nearest_from(ctx.graph, drag.id, center, ctx.combine_distance).map(|(t, _)| t)
                } else {
                    None
                };
                self.state = match target {
                    Some(target) => GestureState::Combining { drag, target },
                    None => GestureState::Dragging(drag),
                };
                vec![GestureAction::Mutate(GraphMutation::MoveNode {
                    id: drag.id,
                    x: center.x,
                    y: center.y,
                })]
            }
        }
    }

    fn pointer_up(&mut self, ctx: GestureContext<'_>) -> Vec<GestureAction> {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        match state {
            GestureState::Idle => Vec::new(),
            GestureState::Panning { .. } => vec![GestureAction::PanEnded],
            GestureState::Dragging(drag) if !drag.past_slop(ctx.click_slop) => vec![
                GestureAction::DragEnded {
                    id: drag.id,
                    moved: false,
                },
                GestureAction::Click(drag.id),
            ],
            GestureState::Dragging(drag) => vec![GestureAction::DragEnded {
                id: drag.id,
                moved: true,
            }],
            GestureState::Combining { drag, target } => vec![
                GestureAction::DragEnded {
                    id: drag.id,
                    moved: true,
                },
                GestureAction::Combine {
                    source: drag.id,
                    target,
                },
            ],
        }
    }

    /// Abort the current gesture. A dragged node returns to where it started.
    pub fn cancel(&mut self) -> Vec<GestureAction> {
        let state = std::mem::replace(&mut self.state, GestureState::Idle);
        match state {
            GestureState::Idle => Vec::new(),
            GestureState::Panning { .. } => vec![GestureAction::PanEnded],
            GestureState::Dragging(drag) | GestureState::Combining { drag, .. } => vec![
                GestureAction::Mutate(GraphMutation::MoveNode {
                    id: drag.id,
                    x: drag.origin.x,
                    y: drag.origin.y,
                }),
                GestureAction::DragEnded {
                    id: drag.id,
                    moved: false,
                },
            ],
        }
    }

    /// Drop references to removed nodes. Returns the dragged id if the drag
    /// itself was lost.
    pub fn forget(&mut self, removed: &[NodeId]) -> Option<NodeId> {
        if self.hover.is_some_and(|h| removed.contains(&h)) {
            self.hover = None;
        }
        match self.state {
            GestureState::Dragging(drag) | GestureState::Combining { drag, .. } if removed.contains(&drag.id) => {
                self.state = GestureState::Idle;
                Some(drag.id)
            }
            GestureState::Combining { drag, target } if removed.contains(&target) => {
                self.state = GestureState::Dragging(drag);
                None
            }
            _ => None,
        }
    }
}
