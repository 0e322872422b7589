//! Placement and overlap checks for nodes on the canvas.
//!
//! Every check is a linear scan over the node list, which is fine for the
//! few hundred nodes a canvas realistically holds.

use crate::state::{Node, Rect};

pub const MAX_PLACEMENT_ATTEMPTS: u32 = 50;
pub const SPIRAL_STEP_DEGREES: f64 = 45.0;
pub const SPIRAL_RADIUS_SCALE: f64 = 20.0;
pub const EXPORT_PADDING: f64 = 40.0;

/// True if `rect` overlaps any node other than `exclude_id`.
pub fn check_collision(nodes: &[Node], rect: &Rect, exclude_id: Option<&str>) -> bool {
    others(nodes, exclude_id).any(|n| rect.overlaps(&n.rect()))
}

/// Ids of every node `rect` overlaps, for the drag-time indicator.
pub fn colliding_ids(nodes: &[Node], rect: &Rect, exclude_id: Option<&str>) -> Vec<String> {
    others(nodes, exclude_id)
        .filter(|n| rect.overlaps(&n.rect()))
        .map(|n| n.id.clone())
        .collect()
}

/// Where to put `rect` so it overlaps nothing.
///
/// Returns the requested origin if it is already free. Otherwise candidates an
/// outward spiral around it: attempt `i` sits at angle `i * 45°` and radius
/// `20 * sqrt(i)`. If every candidate collides the last one is returned anyway,
/// so callers get a best-effort position, never an error.
pub fn find_non_overlapping_position(nodes: &[Node], rect: &Rect, exclude_id: Option<&str>) -> (f64, f64) {
    if !check_collision(nodes, rect, exclude_id) {
        return (rect.x, rect.y);
    }

    let mut candidate = (rect.x, rect.y);
    for attempt in 1..=MAX_PLACEMENT_ATTEMPTS {
        candidate = spiral_candidate(rect.x, rect.y, attempt);
        if !check_collision(nodes, &rect.at(candidate.0, candidate.1), exclude_id) {
            return candidate;
        }
    }

    log::debug!(
        "no free slot near ({:.0}, {:.0}) after {} attempts; accepting overlap",
        rect.x,
        rect.y,
        MAX_PLACEMENT_ATTEMPTS
    );
    candidate
}

fn spiral_candidate(origin_x: f64, origin_y: f64, attempt: u32) -> (f64, f64) {
    let angle = (attempt as f64 * SPIRAL_STEP_DEGREES).to_radians();
    let radius = SPIRAL_RADIUS_SCALE * (attempt as f64).sqrt();
    (origin_x + radius * angle.cos(), origin_y + radius * angle.sin())
}

/// Region to rasterize for an image export: the bounding box of all nodes,
/// padded on every side, and never smaller than the viewport. An empty
/// canvas exports a viewport-sized area at the origin.
pub fn content_bounds(nodes: &[Node], padding: f64, viewport_width: f64, viewport_height: f64) -> Rect {
    if nodes.is_empty() {
        return Rect::new(0.0, 0.0, viewport_width, viewport_height);
    }

    let (min_x, min_y, max_x, max_y) = nodes.iter().fold(
        (f64::INFINITY, f64::INFINITY, f64::NEG_INFINITY, f64::NEG_INFINITY),
        |(min_x, min_y, max_x, max_y), n| {
            (
                min_x.min(n.x),
                min_y.min(n.y),
                max_x.max(n.x + n.width),
                max_y.max(n.y + n.height),
            )
        },
    );

    Rect::new(
        min_x - padding,
        min_y - padding,
        (max_x - min_x + 2.0 * padding).max(viewport_width),
        (max_y - min_y + 2.0 * padding).max(viewport_height),
    )
}

fn others<'a>(nodes: &'a [Node], exclude_id: Option<&'a str>) -> impl Iterator<Item = &'a Node> + 'a {
    nodes.iter().filter(move |n| Some(n.id.as_str()) != exclude_id)
}
