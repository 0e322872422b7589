//! JSON and PNG exports of the canvas.

use crate::canvas::{create_canvas, get_canvas_context, render_nodes};
use crate::controller::RenderState;
use crate::layout::{self, EXPORT_PADDING};
use crate::measure::Font;
use crate::state::{Node, Viewport};
use thiserror::Error;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

pub const JSON_FILENAME: &str = "canvas-data.json";
pub const IMAGE_FILENAME: &str = "canvas.png";

/// Largest canvas side every major browser will allocate. Its square is
/// also the largest area they accept.
pub const MAX_EXPORT_SIDE: f64 = 16384.0;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("invalid node data: {0}")]
    Json(#[from] serde_json::Error),
    #[error("browser refused export: {0}")]
    Browser(String),
}

impl From<JsValue> for ExportError {
    fn from(value: JsValue) -> Self {
        ExportError::Browser(value.as_string().unwrap_or_else(|| format!("{:?}", value)))
    }
}

/// Pretty-printed JSON array of every node.
pub fn export_json(nodes: &[Node]) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(nodes)?)
}

/// Reads a node array written by [`export_json`]. Nothing comes back in
/// editing state.
pub fn import_json(json: &str) -> Result<Vec<Node>, ExportError> {
    let mut nodes: Vec<Node> = serde_json::from_str(json)?;
    for node in &mut nodes {
        node.is_editing = false;
    }
    Ok(nodes)
}

/// Offers `json` as a `canvas-data.json` download.
pub fn download_json(json: &str) -> Result<(), ExportError> {
    let parts = js_sys::Array::of1(&JsValue::from_str(json));
    let options = web_sys::BlobPropertyBag::new();
    options.set_type("application/json");
    let blob = web_sys::Blob::new_with_str_sequence_and_options(&parts, &options)?;
    let url = web_sys::Url::create_object_url_with_blob(&blob)?;
    let result = download_url(&url, JSON_FILENAME);
    web_sys::Url::revoke_object_url(&url)?;
    result
}

/// Rasterizes every node (not just the visible ones) and offers the result
/// as `canvas.png`.
pub fn export_image(
    nodes: &[Node],
    viewport_width: f64,
    viewport_height: f64,
    font: &Font,
) -> Result<(), ExportError> {
    let bounds = layout::content_bounds(nodes, EXPORT_PADDING, viewport_width, viewport_height);
    let width = bounds.width.ceil();
    let height = bounds.height.ceil();
    let size = export_size(width, height);
    if size.scale < 1.0 {
        log::warn!(
            "canvas of {}x{} exceeds browser limits, exporting at {:.3}x as {}x{}",
            width,
            height,
            size.scale,
            size.width,
            size.height
        );
    }

    let canvas = create_canvas(size.width, size.height)?;
    let ctx = get_canvas_context(&canvas)?;
    ctx.scale(size.scale, size.scale)?;
    let viewport = Viewport {
        scroll_x: bounds.x,
        scroll_y: bounds.y,
        width,
        height,
    };
    render_nodes(&ctx, width, height, nodes, &viewport, &RenderState::default(), font);

    let data_url = canvas.to_data_url_with_type("image/png")?;
    download_url(&data_url, IMAGE_FILENAME)?;
    log::info!("exported {} nodes as {}x{} image", nodes.len(), size.width, size.height);
    Ok(())
}

/// Pixel size of an exported image and the scale applied to reach it.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ExportSize {
    pub width: u32,
    pub height: u32,
    pub scale: f64,
}

/// Fits a `width` x `height` region inside the browser's canvas limits,
/// shrinking it uniformly when it is too large.
pub fn export_size(width: f64, height: f64) -> ExportSize {
    let width = width.max(1.0);
    let height = height.max(1.0);
    let scale = (MAX_EXPORT_SIDE / width)
        .min(MAX_EXPORT_SIDE / height)
        .min(1.0);
    ExportSize {
        width: ((width * scale).round() as u32).clamp(1, MAX_EXPORT_SIDE as u32),
        height: ((height * scale).round() as u32).clamp(1, MAX_EXPORT_SIDE as u32),
        scale,
    }
}

fn download_url(url: &str, filename: &str) -> Result<(), ExportError> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| ExportError::Browser("no document".to_string()))?;
    let anchor = document
        .create_element("a")?
        .dyn_into::<web_sys::HtmlAnchorElement>()
        .map_err(|_| ExportError::Browser("anchor element unavailable".to_string()))?;
    anchor.set_href(url);
    anchor.set_download(filename);
    anchor.click();
    Ok(())
}
