use crate::history::TextHistory;
use serde::{Deserialize, Serialize};

pub const RESIZE_HANDLE_SIZE: f64 = 16.0;
pub const DEFAULT_NODE_WIDTH: f64 = 200.0;
pub const DEFAULT_NODE_HEIGHT: f64 = 50.0;
pub const MIN_NODE_WIDTH: f64 = 100.0;
pub const MIN_NODE_HEIGHT: f64 = 40.0;
pub const DEFAULT_NODE_TEXT: &str = "New Node";

pub const PALETTE: [&str; 6] = [
    "#3B82F6", // blue
    "#10B981", // emerald
    "#F59E0B", // amber
    "#EF4444", // red
    "#8B5CF6", // violet
    "#06B6D4", // cyan
];

#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    #[default]
    Rectangle,
    Circle,
}

/// Background treatment. Presentation only.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum NodeStyle {
    #[default]
    Colored,
    Crystal,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Node {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub text: String,
    #[serde(default = "default_color")]
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
    #[serde(default)]
    pub shape: Shape,
    #[serde(default)]
    pub style: NodeStyle,
    #[serde(default, skip_serializing_if = "is_false")]
    pub is_editing: bool,
    /// Set once the user drags the resize handle; auto-sizing then keeps
    /// the width.
    #[serde(default, skip_serializing_if = "is_false")]
    pub manually_resized: bool,
    #[serde(flatten)]
    pub history: TextHistory,
}

fn default_color() -> String {
    PALETTE[0].to_string()
}

fn is_false(value: &bool) -> bool {
    !*value
}

impl Node {
    pub fn new(id: String, x: f64, y: f64, text: String) -> Self {
        Self {
            id,
            x,
            y,
            width: DEFAULT_NODE_WIDTH,
            height: DEFAULT_NODE_HEIGHT,
            text,
            color: default_color(),
            text_color: None,
            shape: Shape::Rectangle,
            style: NodeStyle::Colored,
            is_editing: false,
            manually_resized: false,
            history: TextHistory::default(),
        }
    }

    pub fn rect(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn contains_point(&self, px: f64, py: f64) -> bool {
        px >= self.x && px <= self.x + self.width && py >= self.y && py <= self.y + self.height
    }

    /// The only resize handle sits on the bottom-right corner, inset into the node.
    pub fn hits_resize_handle(&self, px: f64, py: f64, handle_size: f64) -> bool {
        let right = self.x + self.width;
        let bottom = self.y + self.height;
        px >= right - handle_size && px <= right && py >= bottom - handle_size && py <= bottom
    }

    pub fn is_manually_resized(&self) -> bool {
        self.manually_resized
    }
}

/// Axis-aligned rectangle in canvas space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Rect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> f64 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f64 {
        self.y + self.height
    }

    pub fn at(&self, x: f64, y: f64) -> Self {
        Self { x, y, ..*self }
    }

    /// Strict overlap: rectangles that only share an edge do not overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.right() <= other.x
            || other.right() <= self.x
            || self.bottom() <= other.y
            || other.bottom() <= self.y)
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Port {
    Top,
    Right,
    Bottom,
    Left,
}

/// A directed link between two nodes. Modelled for file compatibility; the
/// canvas does not draw connections.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub id: String,
    pub from_node_id: String,
    pub to_node_id: String,
    pub from_port: Port,
    pub to_port: Port,
}

/// Scroll window onto the canvas. Screen coordinates are relative to the
/// canvas element; world coordinates are canvas space.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Viewport {
    pub scroll_x: f64,
    pub scroll_y: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            scroll_x: 0.0,
            scroll_y: 0.0,
            width,
            height,
        }
    }

    pub fn screen_to_world(&self, screen_x: f64, screen_y: f64) -> (f64, f64) {
        (screen_x + self.scroll_x, screen_y + self.scroll_y)
    }

    pub fn world_to_screen(&self, world_x: f64, world_y: f64) -> (f64, f64) {
        (world_x - self.scroll_x, world_y - self.scroll_y)
    }

    /// Scroll offsets that put the centre of `rect` in the middle of the view.
    pub fn centered_on(&self, rect: &Rect) -> (f64, f64) {
        (
            rect.x + rect.width / 2.0 - self.width / 2.0,
            rect.y + rect.height / 2.0 - self.height / 2.0,
        )
    }

    pub fn world_rect(&self) -> Rect {
        Rect::new(self.scroll_x, self.scroll_y, self.width, self.height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    mod viewport_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn screen_to_world_identity_at_origin() {
            let vp = Viewport::new(800.0, 600.0);
            assert_eq!(vp.screen_to_world(100.0, 200.0), (100.0, 200.0));
            assert_eq!(vp.world_to_screen(100.0, 200.0), (100.0, 200.0));
        }

        #[test]
        fn scroll_offsets_shift_world_coordinates() {
            let vp = Viewport {
                scroll_x: 50.0,
                scroll_y: 100.0,
                width: 800.0,
                height: 600.0,
            };
            assert_eq!(vp.screen_to_world(100.0, 200.0), (150.0, 300.0));
            assert_eq!(vp.world_to_screen(150.0, 300.0), (100.0, 200.0));
        }

        #[test]
        fn centered_on_puts_rect_center_mid_view() {
            let vp = Viewport::new(800.0, 600.0);
            let rect = Rect::new(1000.0, 500.0, 200.0, 50.0);
            assert_eq!(vp.centered_on(&rect), (700.0, 225.0));
        }
    }

    mod node_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn new_has_default_dimensions() {
            let node = Node::new("abc".to_string(), 10.0, 20.0, "Hello".to_string());
            assert_eq!(node.width, DEFAULT_NODE_WIDTH);
            assert_eq!(node.height, DEFAULT_NODE_HEIGHT);
            assert_eq!(node.shape, Shape::Rectangle);
            assert_eq!(node.style, NodeStyle::Colored);
            assert!(!node.is_editing);
            assert!(!node.is_manually_resized());
            assert!(!node.history.can_undo());
        }

        #[test]
        fn contains_point_on_boundary_and_outside() {
            let node = Node::new("n".to_string(), 100.0, 100.0, String::new());
            assert!(node.contains_point(100.0, 100.0));
            assert!(node.contains_point(300.0, 150.0));
            assert!(!node.contains_point(99.0, 120.0));
            assert!(!node.contains_point(150.0, 151.0));
        }

        #[test]
        fn resize_handle_only_in_bottom_right_corner() {
            let node = Node::new("n".to_string(), 100.0, 100.0, String::new());
            assert!(node.hits_resize_handle(295.0, 145.0, RESIZE_HANDLE_SIZE));
            assert!(node.hits_resize_handle(300.0, 150.0, RESIZE_HANDLE_SIZE));
            assert!(!node.hits_resize_handle(100.0, 100.0, RESIZE_HANDLE_SIZE));
            assert!(!node.hits_resize_handle(200.0, 125.0, RESIZE_HANDLE_SIZE));
        }

        #[test]
        fn manual_resize_flag_round_trips() {
            let mut node = Node::new("n".to_string(), 0.0, 0.0, String::new());
            node.width = 260.0;
            assert!(!node.is_manually_resized());
            node.manually_resized = true;
            let json = serde_json::to_string(&node).unwrap();
            assert!(json.contains("\"manuallyResized\":true"));
            let back: Node = serde_json::from_str(&json).unwrap();
            assert!(back.is_manually_resized());
        }
    }

    mod rect_tests {
        use super::*;

        #[test]
        fn touching_edges_do_not_overlap() {
            let a = Rect::new(0.0, 0.0, 100.0, 100.0);
            let right = Rect::new(100.0, 0.0, 100.0, 100.0);
            let below = Rect::new(0.0, 100.0, 100.0, 100.0);
            assert!(!a.overlaps(&right));
            assert!(!a.overlaps(&below));
        }

        #[test]
        fn partial_and_contained_rects_overlap() {
            let a = Rect::new(0.0, 0.0, 100.0, 100.0);
            assert!(a.overlaps(&Rect::new(50.0, 50.0, 100.0, 100.0)));
            assert!(a.overlaps(&Rect::new(10.0, 10.0, 5.0, 5.0)));
            assert!(Rect::new(10.0, 10.0, 5.0, 5.0).overlaps(&a));
        }
    }

    mod serde_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn field_names_are_camel_case() {
            let mut node = Node::new("n1".to_string(), 0.0, 0.0, "Styled".to_string());
            node.text_color = Some("#ffffff".to_string());
            node.is_editing = true;
            let json = serde_json::to_string(&node).unwrap();
            assert!(json.contains("\"textColor\":\"#ffffff\""));
            assert!(json.contains("\"isEditing\":true"));
            assert!(json.contains("\"shape\":\"rectangle\""));
            assert!(json.contains("\"style\":\"colored\""));
        }

        #[test]
        fn skip_serializing_transient_defaults() {
            let node = Node::new("n1".to_string(), 0.0, 0.0, "Plain".to_string());
            let json = serde_json::to_string(&node).unwrap();
            assert!(!json.contains("textColor"));
            assert!(!json.contains("isEditing"));
            assert!(!json.contains("undoStack"));
            assert!(!json.contains("redoStack"));
        }

        #[test]
        fn deserialize_minimal_record_uses_defaults() {
            let json = r#"{
                "id": "n1",
                "x": 0, "y": 0, "width": 200, "height": 50,
                "text": "Old node"
            }"#;
            let node: Node = serde_json::from_str(json).unwrap();
            assert_eq!(node.color, PALETTE[0]);
            assert_eq!(node.shape, Shape::Rectangle);
            assert_eq!(node.style, NodeStyle::Colored);
            assert_eq!(node.text_color, None);
            assert!(!node.history.can_undo());
        }

        #[test]
        fn deserialize_text_stacks() {
            let json = r##"{
                "id": "n1", "x": 0, "y": 0, "width": 200, "height": 50,
                "text": "third", "color": "#EF4444", "shape": "circle", "style": "crystal",
                "undoStack": ["first", "second"], "redoStack": []
            }"##;
            let mut node: Node = serde_json::from_str(json).unwrap();
            assert_eq!(node.shape, Shape::Circle);
            assert_eq!(node.style, NodeStyle::Crystal);
            assert_eq!(node.history.undo("third".to_string()), Some("second".to_string()));
        }

        #[test]
        fn connection_round_trip() {
            let conn = Connection {
                id: "c1".to_string(),
                from_node_id: "a".to_string(),
                to_node_id: "b".to_string(),
                from_port: Port::Right,
                to_port: Port::Left,
            };
            let json = serde_json::to_string(&conn).unwrap();
            assert!(json.contains("\"fromNodeId\":\"a\""));
            assert!(json.contains("\"fromPort\":\"right\""));
            let back: Connection = serde_json::from_str(&json).unwrap();
            assert_eq!(conn, back);
        }

        #[test]
        fn node_with_unicode_and_negative_coordinates() {
            let mut node = Node::new("u".to_string(), -1000.0, -500.0, "Hello 世界 🌍".to_string());
            node.history.push("draft".to_string());
            let json = serde_json::to_string(&node).unwrap();
            let back: Node = serde_json::from_str(&json).unwrap();
            assert_eq!(node, back);
        }
    }
}
