use std::cell::Cell;
use std::rc::Rc;

use beadchain::{EngineConfig, LinkKind, RosaryEngine, Shape, Vec2};
use wasm_bindgen::prelude::*;

/// Floats per body in [`RosaryDemo::bodies`].
const BODY_STRIDE: usize = 9;

// ---- Rosary Demo ----

#[wasm_bindgen]
pub struct RosaryDemo {
    engine: RosaryEngine<f32>,
    last_click: Rc<Cell<Option<usize>>>,
}

#[wasm_bindgen]
impl RosaryDemo {
    #[wasm_bindgen(constructor)]
    pub fn new(width: f32, height: f32) -> Result<RosaryDemo, JsValue> {
        let mut config = EngineConfig::<f32>::default();
        config.bounds = beadchain::Rect::from_size(width, height);
        config.chain.center = Vec2::new(width * 0.5, height * 0.5);
        let mut engine = RosaryEngine::new(config).map_err(to_js)?;

        let last_click = Rc::new(Cell::new(None));
        let sink = Rc::clone(&last_click);
        engine.on_body_clicked(move |event| sink.set(event.logical_index));

        Ok(RosaryDemo { engine, last_click })
    }

    /// Advance by real elapsed seconds; returns the number of solver steps run.
    pub fn tick(&mut self, elapsed: f32) -> usize {
        self.engine.tick(elapsed)
    }

    pub fn pointer_down(&mut self, x: f32, y: f32) -> Result<bool, JsValue> {
        let hit = self.engine.pointer_down(Vec2::new(x, y)).map_err(to_js)?;
        Ok(hit.is_some())
    }

    pub fn pointer_move(&mut self, x: f32, y: f32) -> Result<bool, JsValue> {
        self.engine.pointer_move(Vec2::new(x, y)).map_err(to_js)
    }

    pub fn pointer_up(&mut self) {
        self.engine.pointer_up();
    }

    pub fn set_loop_count(&mut self, count: usize) -> Result<(), JsValue> {
        let mut next = self.engine.config().clone();
        next.chain.loop_count = count;
        self.engine.apply_config(next).map(|_| ()).map_err(to_js)
    }

    pub fn set_tail_count(&mut self, count: usize) -> Result<(), JsValue> {
        let mut next = self.engine.config().clone();
        next.chain.tail_count = count;
        self.engine.apply_config(next).map(|_| ()).map_err(to_js)
    }

    /// Highlighted logical index, or -1.
    pub fn highlighted(&self) -> i32 {
        self.engine.highlighted().map_or(-1, |i| i as i32)
    }

    pub fn highlight(&mut self, index: usize) -> bool {
        self.engine.highlight(index)
    }

    pub fn step_highlight(&mut self, delta: i32) -> i32 {
        self.engine.step_highlight(delta as isize).map_or(-1, |i| i as i32)
    }

    /// Logical index of the last clicked body, or -1.
    pub fn last_click(&self) -> i32 {
        self.last_click.get().map_or(-1, |i| i as i32)
    }

    pub fn logical_count(&self) -> usize {
        self.engine.mapper().len()
    }

    /// Flat `[x, y, kind, w, h, highlighted, r, g, b, ...]` per body, where
    /// kind is 0 for a circle (w = h = radius) and 1 for a square (half sizes).
    pub fn bodies(&self) -> Vec<f32> {
        let mut out = Vec::with_capacity(self.engine.world().body_count() * BODY_STRIDE);
        for item in self.engine.render_items() {
            let (kind, w, h) = match item.shape {
                Shape::Circle { radius } => (0.0, radius, radius),
                Shape::Rect { half_width, half_height } => (1.0, half_width, half_height),
            };
            out.extend_from_slice(&[
                item.position.x,
                item.position.y,
                kind,
                w,
                h,
                if item.highlighted { 1.0 } else { 0.0 },
                item.color.r as f32,
                item.color.g as f32,
                item.color.b as f32,
            ]);
        }
        out
    }

    /// Flat `[x0, y0, x1, y1, ...]` cord segments. Cross braces and the drag
    /// link are left out.
    pub fn links(&self) -> Vec<f32> {
        let mut out = Vec::new();
        for link in self.engine.render_links().filter(|l| l.kind == LinkKind::Chain) {
            out.extend_from_slice(&[link.from.x, link.from.y, link.to.x, link.to.y]);
        }
        out
    }

    pub fn body_stride(&self) -> usize {
        BODY_STRIDE
    }
}

fn to_js(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}
