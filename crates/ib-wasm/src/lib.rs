//! WASM bridge for Idea Board: exposes the canvas engine to JavaScript.
//!
//! Compiled via `wasm-pack build --target web`. The host page owns the
//! network: it polls [`IdeaCanvas::take_requests`], calls the idea service,
//! and feeds responses back through the `resolve_*` methods. Every structured
//! return value is a JSON string.

mod render2d;

use ib_core::{CanvasConfig, NodeId};
use ib_editor::{
    CanvasEngine, CombineResponse, EngineError, ExpandResponse, InputEvent, Modifiers, OpId, ServiceError,
    TopicsResponse,
};
use ib_render::Theme;
use serde::Serialize;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;

/// The WASM-facing canvas controller. All interaction from the page goes
/// through this struct.
#[wasm_bindgen]
pub struct IdeaCanvas {
    engine: CanvasEngine,
    width: f64,
    height: f64,
    /// `false` = light (default), `true` = dark.
    dark_mode: bool,
    /// Engine revision at the last paint.
    painted: Option<u64>,
}

#[wasm_bindgen]
impl IdeaCanvas {
    /// Create a canvas with default settings.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        Self::with_engine(CanvasEngine::default(), width, height)
    }

    /// Create a canvas from a (possibly partial) JSON config. Invalid config
    /// falls back to the defaults and logs a warning.
    pub fn with_config(config_json: &str, width: f64, height: f64) -> Self {
        console_error_panic_hook_setup();
        let config = CanvasConfig::from_json(config_json).unwrap_or_else(|e| {
            log::warn!("invalid canvas config, using defaults: {e}");
            CanvasConfig::default()
        });
        Self::with_engine(CanvasEngine::new(config), width, height)
    }

    // ─── Rendering ───────────────────────────────────────────────────────

    /// Paint to a Canvas2D context. `time_ms` drives the merge pulse.
    pub fn render(&mut self, ctx: &CanvasRenderingContext2d, time_ms: f64) {
        let theme = if self.dark_mode { Theme::dark() } else { Theme::light() };
        let list = self.engine.display_list();
        render2d::render(ctx, &list, &theme, self.width, self.height, time_ms);
        self.painted = Some(self.engine.revision());
    }

    /// `true` if anything visible changed since the last `render`.
    pub fn needs_render(&self) -> bool {
        self.painted != Some(self.engine.revision()) || self.engine.candidate().is_some()
    }

    /// The display list as JSON, for hosts that paint themselves.
    pub fn get_display_list(&self) -> String {
        to_json(&self.engine.display_list())
    }

    /// Measure node text with this context's fonts from now on. Existing
    /// nodes keep their size until edited.
    pub fn set_measure_context(&mut self, ctx: CanvasRenderingContext2d) {
        let engine = std::mem::take(&mut self.engine);
        self.engine = engine.with_metrics(Box::new(render2d::CanvasMetrics::new(ctx)));
    }

    pub fn set_theme(&mut self, is_dark: bool) {
        self.dark_mode = is_dark;
        self.painted = None;
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.width = width;
        self.height = height;
        self.engine.set_screen_size(width as f32, height as f32);
    }

    // ─── Input ───────────────────────────────────────────────────────────

    /// Returns `true` if the event was consumed.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_down(&mut self, x: f32, y: f32, shift: bool, ctrl: bool, alt: bool, meta: bool, now_ms: f64) -> bool {
        let modifiers = mods(shift, ctrl, alt, meta);
        self.engine.handle_input(&InputEvent::PointerDown { x, y, modifiers }, now_ms)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_move(&mut self, x: f32, y: f32, shift: bool, ctrl: bool, alt: bool, meta: bool, now_ms: f64) -> bool {
        let modifiers = mods(shift, ctrl, alt, meta);
        self.engine.handle_input(&InputEvent::PointerMove { x, y, modifiers }, now_ms)
    }

    #[allow(clippy::too_many_arguments)]
    pub fn handle_pointer_up(&mut self, x: f32, y: f32, shift: bool, ctrl: bool, alt: bool, meta: bool, now_ms: f64) -> bool {
        let modifiers = mods(shift, ctrl, alt, meta);
        self.engine.handle_input(&InputEvent::PointerUp { x, y, modifiers }, now_ms)
    }

    pub fn handle_wheel(&mut self, x: f32, y: f32, delta_y: f32, now_ms: f64) -> bool {
        self.engine.handle_input(
            &InputEvent::Wheel {
                x,
                y,
                delta_y,
                modifiers: Modifiers::NONE,
            },
            now_ms,
        )
    }

    /// Returns `true` if the key had a binding.
    #[allow(clippy::too_many_arguments)]
    pub fn handle_key(&mut self, key: &str, ctrl: bool, shift: bool, alt: bool, meta: bool, now_ms: f64) -> bool {
        let event = InputEvent::Key {
            key: key.to_string(),
            modifiers: mods(shift, ctrl, alt, meta),
        };
        self.engine.handle_input(&event, now_ms)
    }

    /// CSS-ish cursor name: `default`, `grab`, `grabbing`, `merge`, `move`.
    pub fn get_cursor(&self) -> String {
        serde_json::to_value(self.engine.cursor())
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_else(|| "default".to_string())
    }

    /// Housekeeping; call once per animation frame. Returns the tick report
    /// as JSON.
    pub fn tick(&mut self, now_ms: f64) -> String {
        to_json(&self.engine.tick(now_ms))
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Returns `{"ok":true,"id":"root"}` or `{"ok":false,"error":"..."}`.
    pub fn set_use_case(&mut self, text: &str) -> String {
        respond(self.engine.set_use_case(text).map(|id| serde_json::json!({ "id": id })))
    }

    pub fn get_use_case(&self) -> Option<String> {
        self.engine.use_case().map(str::to_string)
    }

    pub fn request_generation(&mut self, now_ms: f64) -> String {
        respond(self.engine.request_generation(now_ms).map(|op| serde_json::json!({ "op": op })))
    }

    pub fn add_topic(&mut self, text: &str) -> String {
        respond(self.engine.add_topic(text).map(|id| serde_json::json!({ "id": id })))
    }

    pub fn delete_node(&mut self, node_id: &str) -> String {
        let result = lookup(node_id).and_then(|id| self.engine.delete_node(id));
        respond(result.map(|removed| serde_json::json!({ "removed": removed })))
    }

    pub fn edit_node(&mut self, node_id: &str, text: &str) -> String {
        let result = lookup(node_id).and_then(|id| self.engine.edit_node(id, text));
        respond(result.map(|()| serde_json::json!({})))
    }

    pub fn request_expand(&mut self, node_id: &str, now_ms: f64) -> String {
        let result = lookup(node_id).and_then(|id| self.engine.request_expand(id, now_ms));
        respond(result.map(|status| serde_json::json!(status)))
    }

    pub fn request_combine(&mut self, a: &str, b: &str, now_ms: f64) -> String {
        let result = lookup(a)
            .and_then(|a| lookup(b).map(|b| (a, b)))
            .and_then(|(a, b)| self.engine.request_combine(a, b, now_ms));
        respond(result.map(|op| serde_json::json!({ "op": op })))
    }

    pub fn reorganize(&mut self) {
        self.engine.request_reorganize();
    }

    pub fn get_selected_id(&self) -> String {
        self.engine
            .selected()
            .map(|id| id.as_str().to_string())
            .unwrap_or_default()
    }

    // ─── Service plumbing ────────────────────────────────────────────────

    /// Drain queued service calls as a JSON array of tagged requests.
    pub fn take_requests(&mut self) -> String {
        to_json(&self.engine.take_requests())
    }

    /// Feed back a combine response. `error` set means the call failed;
    /// otherwise `body` is the service's JSON. Returns the outcome name.
    pub fn resolve_combine(&mut self, op: u64, body: &str, error: Option<String>, now_ms: f64) -> String {
        let result = response(body, error, CombineResponse::from_json);
        to_json(&self.engine.resolve_combine(OpId(op), result, now_ms))
    }

    pub fn resolve_expand(&mut self, op: u64, body: &str, error: Option<String>, now_ms: f64) -> String {
        let result = response(body, error, ExpandResponse::from_json);
        to_json(&self.engine.resolve_expand(OpId(op), result, now_ms))
    }

    pub fn resolve_generation(&mut self, op: u64, body: &str, error: Option<String>, now_ms: f64) -> String {
        let result = response(body, error, TopicsResponse::from_json);
        to_json(&self.engine.resolve_generation(OpId(op), result, now_ms))
    }

    // ─── Read-only views ─────────────────────────────────────────────────

    pub fn get_notices(&self) -> String {
        to_json(&self.engine.notices())
    }

    pub fn dismiss_notice(&mut self, id: u64) -> bool {
        self.engine.dismiss_notice(id)
    }

    pub fn get_snapshot(&self) -> String {
        to_json(&self.engine.snapshot())
    }

    /// Board snapshot as MessagePack bytes.
    pub fn export_msgpack(&self) -> Vec<u8> {
        self.engine.snapshot().to_msgpack().unwrap_or_else(|e| {
            log::warn!("snapshot export failed: {e}");
            Vec::new()
        })
    }

    pub fn get_view(&self) -> String {
        to_json(&self.engine.view())
    }
}

impl IdeaCanvas {
    fn with_engine(mut engine: CanvasEngine, width: f64, height: f64) -> Self {
        engine.set_screen_size(width as f32, height as f32);
        Self {
            engine,
            width,
            height,
            dark_mode: false,
            painted: None,
        }
    }
}

fn mods(shift: bool, ctrl: bool, alt: bool, meta: bool) -> Modifiers {
    Modifiers { shift, ctrl, alt, meta }
}

fn lookup(node_id: &str) -> Result<NodeId, EngineError> {
    NodeId::lookup(node_id).ok_or_else(|| ib_core::GraphError::UnknownNode(NodeId::intern(node_id)).into())
}

fn response<T>(
    body: &str,
    error: Option<String>,
    parse: fn(&str) -> Result<T, ServiceError>,
) -> Result<T, ServiceError> {
    match error {
        Some(message) => Err(ServiceError::Unavailable(message)),
        None => parse(body),
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T) -> String {
    serde_json::to_string(value).unwrap_or_else(|e| error_json(&format!("serialization error: {e}")))
}

fn respond(result: Result<serde_json::Value, EngineError>) -> String {
    match result {
        Ok(mut value) => {
            if let Some(obj) = value.as_object_mut() {
                obj.insert("ok".into(), serde_json::Value::Bool(true));
            }
            value.to_string()
        }
        Err(e) => error_json(&e.to_string()),
    }
}

fn error_json(message: &str) -> String {
    serde_json::json!({ "ok": false, "error": message }).to_string()
}

/// Set up a panic hook that logs to the browser console.
fn console_error_panic_hook_setup() {
    #[cfg(target_arch = "wasm32")]
    {
        use std::sync::Once;
        static SET_HOOK: Once = Once::new();
        SET_HOOK.call_once(|| {
            std::panic::set_hook(Box::new(|info| {
                let msg = format!("Idea Board WASM panic: {info}");
                web_sys::console::error_1(&msg.into());
            }));
        });
    }
}
