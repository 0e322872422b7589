use crate::controller::RenderState;
use crate::measure::{wrap_lines, Font, TextMeasure, TEXT_PADDING_X, TEXT_PADDING_Y};
use crate::state::{Node, NodeStyle, Shape, Viewport, RESIZE_HANDLE_SIZE};
use std::f64::consts::PI;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

const BG_COLOR: &str = "#F9FAFB";
const GRID_DOT: &str = "#D1D5DB";
const GRID_SPACING: f64 = 24.0;
const TEXT_ON_COLOR: &str = "#FFFFFF";
const TEXT_ON_CRYSTAL: &str = "#111827";
const SELECTED_BORDER: &str = "#111827";
const HIGHLIGHT_BORDER: &str = "#FACC15";
const COLLISION_BORDER: &str = "#DC2626";
const HANDLE_COLOR: &str = "rgba(255, 255, 255, 0.7)";
const CORNER_RADIUS: f64 = 8.0;

pub fn render_nodes(
    ctx: &CanvasRenderingContext2d,
    width: f64,
    height: f64,
    nodes: &[Node],
    viewport: &Viewport,
    state: &RenderState,
    font: &Font,
) {
    ctx.set_fill_style_str(BG_COLOR);
    ctx.fill_rect(0.0, 0.0, width, height);

    draw_grid(ctx, viewport, width, height);

    let visible = viewport_rect(viewport, width, height);
    for node in nodes.iter().filter(|n| n.rect().overlaps(&visible)) {
        draw_node(ctx, node, viewport, state, font);
    }
}

fn viewport_rect(viewport: &Viewport, width: f64, height: f64) -> crate::state::Rect {
    Viewport {
        width,
        height,
        ..*viewport
    }
    .world_rect()
}

fn draw_grid(ctx: &CanvasRenderingContext2d, viewport: &Viewport, width: f64, height: f64) {
    ctx.set_fill_style_str(GRID_DOT);
    let offset_x = viewport.scroll_x.rem_euclid(GRID_SPACING);
    let offset_y = viewport.scroll_y.rem_euclid(GRID_SPACING);

    let mut y = -offset_y;
    while y < height {
        let mut x = -offset_x;
        while x < width {
            ctx.fill_rect(x, y, 1.5, 1.5);
            x += GRID_SPACING;
        }
        y += GRID_SPACING;
    }
}

fn draw_node(
    ctx: &CanvasRenderingContext2d,
    node: &Node,
    viewport: &Viewport,
    state: &RenderState,
    font: &Font,
) {
    let (sx, sy) = viewport.world_to_screen(node.x, node.y);
    let is_selected = state.selected.as_deref() == Some(node.id.as_str());
    let is_editing = state.editing.as_deref() == Some(node.id.as_str());
    let is_highlighted = state.highlighted.as_deref() == Some(node.id.as_str());
    let is_colliding = state.colliding.contains(&node.id);

    ctx.save();
    trace_shape(ctx, node.shape, sx, sy, node.width, node.height);
    match node.style {
        NodeStyle::Colored => {
            ctx.set_fill_style_str(&node.color);
            ctx.fill();
        }
        NodeStyle::Crystal => {
            ctx.set_global_alpha(0.25);
            ctx.set_fill_style_str(&node.color);
            ctx.fill();
            ctx.set_global_alpha(1.0);
            ctx.set_stroke_style_str(&node.color);
            ctx.set_line_width(1.5);
            ctx.stroke();
        }
    }

    let border = if is_colliding {
        Some((COLLISION_BORDER, 3.0))
    } else if is_highlighted {
        Some((HIGHLIGHT_BORDER, 4.0))
    } else if is_selected {
        Some((SELECTED_BORDER, 2.0))
    } else {
        None
    };
    if let Some((color, line_width)) = border {
        ctx.set_stroke_style_str(color);
        ctx.set_line_width(line_width);
        if is_highlighted {
            ctx.set_shadow_color(color);
            ctx.set_shadow_blur(12.0);
        }
        ctx.stroke();
        ctx.set_shadow_blur(0.0);
    }
    ctx.restore();

    if !is_editing {
        draw_text(ctx, node, sx, sy, font);
    }

    if is_selected && !state.touch_mode && node.shape == Shape::Rectangle {
        draw_resize_handle(ctx, sx + node.width, sy + node.height);
    }
}

fn trace_shape(ctx: &CanvasRenderingContext2d, shape: Shape, x: f64, y: f64, w: f64, h: f64) {
    ctx.begin_path();
    match shape {
        Shape::Rectangle => {
            let r = CORNER_RADIUS.min(w / 2.0).min(h / 2.0);
            ctx.move_to(x + r, y);
            ctx.arc_to(x + w, y, x + w, y + h, r).ok();
            ctx.arc_to(x + w, y + h, x, y + h, r).ok();
            ctx.arc_to(x, y + h, x, y, r).ok();
            ctx.arc_to(x, y, x + w, y, r).ok();
        }
        Shape::Circle => {
            ctx.ellipse(x + w / 2.0, y + h / 2.0, w / 2.0, h / 2.0, 0.0, 0.0, 2.0 * PI)
                .ok();
        }
    }
    ctx.close_path();
}

fn draw_text(ctx: &CanvasRenderingContext2d, node: &Node, sx: f64, sy: f64, font: &Font) {
    let default_color = match node.style {
        NodeStyle::Colored => TEXT_ON_COLOR,
        NodeStyle::Crystal => TEXT_ON_CRYSTAL,
    };
    ctx.set_fill_style_str(node.text_color.as_deref().unwrap_or(default_color));
    ctx.set_font(&font.css());
    ctx.set_text_align("left");
    ctx.set_text_baseline("top");

    let max_width = node.width - 2.0 * TEXT_PADDING_X;
    let lines = wrap_lines(&node.text, max_width, |s| {
        ctx.measure_text(s).map(|m| m.width()).unwrap_or(0.0)
    });
    let block_height = lines.len() as f64 * font.line_height;
    let top = match node.shape {
        Shape::Circle => sy + (node.height - block_height).max(0.0) / 2.0,
        Shape::Rectangle => sy + TEXT_PADDING_Y,
    };

    for (i, line) in lines.iter().enumerate() {
        let y = top + i as f64 * font.line_height + (font.line_height - font.size) / 2.0;
        if y + font.size > sy + node.height {
            break;
        }
        let _ = ctx.fill_text(line, sx + TEXT_PADDING_X, y);
    }
}

fn draw_resize_handle(ctx: &CanvasRenderingContext2d, right: f64, bottom: f64) {
    ctx.set_stroke_style_str(HANDLE_COLOR);
    ctx.set_line_width(1.5);
    for step in [0.25, 0.5, 0.75] {
        let d = RESIZE_HANDLE_SIZE * step;
        ctx.begin_path();
        ctx.move_to(right - d, bottom - 2.0);
        ctx.line_to(right - 2.0, bottom - d);
        ctx.stroke();
    }
}

/// Text measurement backed by a 2d context's `measureText`.
pub struct CanvasMeasure {
    ctx: CanvasRenderingContext2d,
}

impl CanvasMeasure {
    pub fn new(ctx: CanvasRenderingContext2d) -> Self {
        Self { ctx }
    }

    /// Measures on a detached canvas so it works before the view mounts.
    pub fn detached() -> Result<Self, JsValue> {
        let canvas = create_canvas(1, 1)?;
        Ok(Self::new(get_canvas_context(&canvas)?))
    }
}

impl TextMeasure for CanvasMeasure {
    fn line_width(&self, line: &str, font: &Font) -> f64 {
        self.ctx.set_font(&font.css());
        self.ctx.measure_text(line).map(|m| m.width()).unwrap_or(0.0)
    }
}

pub fn create_canvas(width: u32, height: u32) -> Result<HtmlCanvasElement, JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .create_element("canvas")?
        .dyn_into::<HtmlCanvasElement>()?;
    canvas.set_width(width);
    canvas.set_height(height);
    Ok(canvas)
}

pub fn get_canvas_context(
    canvas: &HtmlCanvasElement,
) -> Result<CanvasRenderingContext2d, JsValue> {
    Ok(canvas
        .get_context("2d")?
        .ok_or_else(|| JsValue::from_str("Failed to get 2d context"))?
        .dyn_into::<CanvasRenderingContext2d>()?)
}
