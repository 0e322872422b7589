//! Turns pointer, keyboard and menu input into store mutations.
//!
//! The controller owns the node store and all transient interaction state
//! (gesture, edit session, context menu, long press, selection). It never
//! touches the DOM: the shell converts browser events into the input types
//! below and acts on the values returned.

use crate::config::{CanvasConfig, UndoModel};
use crate::export;
use crate::gateway::{self, GatewayError};
use crate::history::History;
use crate::layout;
use crate::measure::{Font, TextMeasure, TEXT_PADDING_X, TEXT_PADDING_Y};
use crate::state::{
    Node, Rect, Viewport, DEFAULT_NODE_HEIGHT, DEFAULT_NODE_WIDTH, MIN_NODE_HEIGHT,
    RESIZE_HANDLE_SIZE,
};
use crate::store::{CommitOutcome, NewNode, NodePatch, NodeStore};
use std::collections::{HashMap, HashSet};

pub const LONG_PRESS_MS: u32 = 500;
pub const LONG_PRESS_TOLERANCE: f64 = 10.0;
pub const HIGHLIGHT_MS: u32 = 2000;
pub const MAX_AUTO_WIDTH: f64 = 400.0;
pub const RESIZE_THRESHOLD_DESKTOP: f64 = 10.0;
pub const RESIZE_THRESHOLD_TOUCH: f64 = 5.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerKind {
    Mouse,
    Touch,
    Pen,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerButton {
    Primary,
    Secondary,
    Other,
}

/// A pointer event in canvas-element (screen) coordinates.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PointerInput {
    pub x: f64,
    pub y: f64,
    pub button: PointerButton,
    pub kind: PointerKind,
}

impl PointerInput {
    pub fn mouse(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Primary,
            kind: PointerKind::Mouse,
        }
    }

    pub fn touch(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            button: PointerButton::Primary,
            kind: PointerKind::Touch,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct KeyInput {
    pub key: String,
    pub ctrl: bool,
    pub meta: bool,
    pub shift: bool,
    /// Focus is inside a text field, which keeps its native editing keys.
    pub in_text_input: bool,
}

impl KeyInput {
    pub fn plain(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ..Self::default()
        }
    }

    pub fn command(key: &str) -> Self {
        Self {
            key: key.to_string(),
            ctrl: true,
            ..Self::default()
        }
    }

    fn has_command_modifier(&self) -> bool {
        self.ctrl || self.meta
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Gesture {
    Idle,
    Dragging {
        id: String,
        offset_x: f64,
        offset_y: f64,
        moved: bool,
    },
    Resizing {
        id: String,
        start_x: f64,
        start_y: f64,
        start_width: f64,
        start_height: f64,
        moved: bool,
    },
}

#[derive(Clone, Debug, PartialEq)]
pub struct EditSession {
    pub id: String,
    pub original_text: String,
    pub draft: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContextMenu {
    pub screen_x: f64,
    pub screen_y: f64,
    pub world_x: f64,
    pub world_y: f64,
    /// Node under the pointer when the menu opened.
    pub target: Option<String>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
    AddNodeHere,
    Undo,
    Redo,
    ToggleAi,
    ExportJson,
    ExportImage,
    ToggleNodeList,
    Cancel,
}

impl MenuAction {
    pub const ALL: [MenuAction; 8] = [
        MenuAction::AddNodeHere,
        MenuAction::Undo,
        MenuAction::Redo,
        MenuAction::ToggleAi,
        MenuAction::ExportJson,
        MenuAction::ExportImage,
        MenuAction::ToggleNodeList,
        MenuAction::Cancel,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuAction::AddNodeHere => "Add Node Here",
            MenuAction::Undo => "Undo",
            MenuAction::Redo => "Redo",
            MenuAction::ToggleAi => "Toggle AI",
            MenuAction::ExportJson => "Export JSON",
            MenuAction::ExportImage => "Export Image",
            MenuAction::ToggleNodeList => "List Nodes",
            MenuAction::Cancel => "Cancel",
        }
    }
}

/// Work only the browser shell can do, handed back from the controller.
#[derive(Clone, Debug, PartialEq)]
pub enum ShellCommand {
    ToggleAi { target: Option<String> },
    DownloadJson(String),
    ExportImage,
    ToggleNodeList,
}

/// What the shell should do after a pointer-down.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PointerDownResult {
    /// A drag or resize started; attach window-level move/up listeners.
    pub capture: bool,
    /// Start a long-press timer and report back with this serial.
    pub long_press: Option<u64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenerationTicket {
    pub serial: u64,
    pub prompt: String,
    /// Node to overwrite, or `None` to create a new node.
    pub target: Option<String>,
    origin: (f64, f64),
}

/// Tracks the newest generation per target node. Older tickets for the same
/// target are superseded and their results dropped.
#[derive(Debug, Default)]
struct GenerationTracker {
    next_serial: u64,
    pending: HashMap<String, u64>,
}

impl GenerationTracker {
    fn issue(&mut self, target: Option<&str>) -> u64 {
        self.next_serial += 1;
        if let Some(target) = target {
            if self.pending.insert(target.to_string(), self.next_serial).is_some() {
                log::debug!("generation for {} superseded", target);
            }
        }
        self.next_serial
    }

    /// Consumes the pending entry if `serial` is still the newest for `target`.
    fn settle(&mut self, target: &str, serial: u64) -> bool {
        if self.pending.get(target) == Some(&serial) {
            self.pending.remove(target);
            true
        } else {
            false
        }
    }

    fn is_pending(&self, target: &str) -> bool {
        self.pending.contains_key(target)
    }

    fn forget(&mut self, target: &str) {
        self.pending.remove(target);
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct LongPress {
    serial: u64,
    screen_x: f64,
    screen_y: f64,
}

/// Per-frame inputs for the renderer that are not part of the nodes.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RenderState {
    pub selected: Option<String>,
    pub editing: Option<String>,
    pub highlighted: Option<String>,
    pub colliding: HashSet<String>,
    pub dragging: Option<String>,
    pub touch_mode: bool,
}

pub struct Controller {
    store: NodeStore,
    config: CanvasConfig,
    measure: Box<dyn TextMeasure>,
    font: Font,
    viewport: Viewport,
    touch_mode: bool,
    gesture: Gesture,
    editing: Option<EditSession>,
    selected: Option<String>,
    highlighted: Option<(String, u64)>,
    context_menu: Option<ContextMenu>,
    long_press: Option<LongPress>,
    colliding: HashSet<String>,
    canvas_history: History<Vec<Node>>,
    generations: GenerationTracker,
    serial: u64,
}

impl Controller {
    pub fn new(store: NodeStore, config: CanvasConfig, measure: Box<dyn TextMeasure>) -> Self {
        let canvas_history = History::new(config.canvas_history_depth);
        let touch_mode = config.touch_mode.unwrap_or(false);
        Self {
            store,
            config,
            measure,
            font: Font::default(),
            viewport: Viewport::new(0.0, 0.0),
            touch_mode,
            gesture: Gesture::Idle,
            editing: None,
            selected: None,
            highlighted: None,
            context_menu: None,
            long_press: None,
            colliding: HashSet::new(),
            canvas_history,
            generations: GenerationTracker::default(),
            serial: 0,
        }
    }

    // Accessors

    pub fn store(&self) -> &NodeStore {
        &self.store
    }

    pub fn nodes(&self) -> &[Node] {
        self.store.list()
    }

    pub fn config(&self) -> &CanvasConfig {
        &self.config
    }

    pub fn font(&self) -> &Font {
        &self.font
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn edit_session(&self) -> Option<&EditSession> {
        self.editing.as_ref()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn highlighted(&self) -> Option<&str> {
        self.highlighted.as_ref().map(|(id, _)| id.as_str())
    }

    pub fn context_menu(&self) -> Option<&ContextMenu> {
        self.context_menu.as_ref()
    }

    pub fn colliding(&self) -> &HashSet<String> {
        &self.colliding
    }

    pub fn is_touch_mode(&self) -> bool {
        self.touch_mode
    }

    pub fn is_generating(&self, id: &str) -> bool {
        self.generations.is_pending(id)
    }

    pub fn render_state(&self) -> RenderState {
        RenderState {
            selected: self.selected.clone(),
            editing: self.editing.as_ref().map(|s| s.id.clone()),
            highlighted: self.highlighted().map(str::to_string),
            colliding: self.colliding.clone(),
            dragging: match &self.gesture {
                Gesture::Dragging { id, .. } => Some(id.clone()),
                _ => None,
            },
            touch_mode: self.touch_mode,
        }
    }

    // Viewport

    pub fn set_touch_mode(&mut self, touch: bool) {
        if self.config.touch_mode.is_none() {
            self.touch_mode = touch;
        }
    }

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport.width = width;
        self.viewport.height = height;
    }

    pub fn scroll_by(&mut self, dx: f64, dy: f64) {
        self.viewport.scroll_x += dx;
        self.viewport.scroll_y += dy;
    }

    /// Scrolls so node `id` is centred and highlights it. Returns the serial
    /// to pass to [`Controller::clear_highlight`] after [`HIGHLIGHT_MS`].
    pub fn focus_node(&mut self, id: &str) -> Option<u64> {
        let rect = self.store.get(id)?.rect();
        let (scroll_x, scroll_y) = self.viewport.centered_on(&rect);
        self.viewport.scroll_x = scroll_x;
        self.viewport.scroll_y = scroll_y;
        self.selected = Some(id.to_string());
        let serial = self.next_serial();
        self.highlighted = Some((id.to_string(), serial));
        Some(serial)
    }

    /// Ends a highlight unless a newer one replaced it.
    pub fn clear_highlight(&mut self, serial: u64) -> bool {
        if matches!(&self.highlighted, Some((_, s)) if *s == serial) {
            self.highlighted = None;
            true
        } else {
            false
        }
    }

    // Pointer gestures

    pub fn pointer_down(&mut self, input: PointerInput) -> PointerDownResult {
        if self.context_menu.take().is_some() {
            return PointerDownResult::default();
        }
        if input.button != PointerButton::Primary {
            return PointerDownResult::default();
        }
        let touch = input.kind == PointerKind::Touch;
        if touch {
            self.set_touch_mode(true);
        }

        let (wx, wy) = self.viewport.screen_to_world(input.x, input.y);
        let hit = self.store.hit_test(wx, wy).cloned();

        let long_press = touch.then(|| {
            let serial = self.next_serial();
            self.long_press = Some(LongPress {
                serial,
                screen_x: input.x,
                screen_y: input.y,
            });
            serial
        });

        let Some(node) = hit else {
            self.selected = None;
            if self.editing.is_some() {
                self.commit_edit();
            }
            return PointerDownResult {
                capture: false,
                long_press,
            };
        };

        if self.editing.as_ref().is_some_and(|s| s.id == node.id) {
            return PointerDownResult {
                capture: false,
                long_press,
            };
        }
        if self.editing.is_some() {
            self.commit_edit();
        }
        // The commit above may have deleted a blank node.
        if !self.store.contains(&node.id) {
            return PointerDownResult::default();
        }
        self.selected = Some(node.id.clone());

        let grab_handle = !self.touch_mode && node.hits_resize_handle(wx, wy, RESIZE_HANDLE_SIZE);
        let Node {
            id,
            x,
            y,
            width,
            height,
            ..
        } = node;
        self.gesture = if grab_handle {
            log::debug!("resize start on {}", id);
            Gesture::Resizing {
                id,
                start_x: wx,
                start_y: wy,
                start_width: width,
                start_height: height,
                moved: false,
            }
        } else {
            log::debug!("drag start on {}", id);
            Gesture::Dragging {
                id,
                offset_x: wx - x,
                offset_y: wy - y,
                moved: false,
            }
        };
        PointerDownResult {
            capture: true,
            long_press,
        }
    }

    /// Returns true if anything visible changed.
    pub fn pointer_move(&mut self, input: PointerInput) -> bool {
        if let Some(press) = self.long_press {
            let dx = input.x - press.screen_x;
            let dy = input.y - press.screen_y;
            if (dx * dx + dy * dy).sqrt() > LONG_PRESS_TOLERANCE {
                self.long_press = None;
            }
        }

        let (wx, wy) = self.viewport.screen_to_world(input.x, input.y);
        match self.gesture.clone() {
            Gesture::Idle => false,
            Gesture::Dragging {
                id,
                offset_x,
                offset_y,
                moved,
            } => {
                // Touch drags wait until the long press is ruled out.
                if self.long_press.is_some() {
                    return false;
                }
                if !moved {
                    self.snapshot();
                    self.gesture = Gesture::Dragging {
                        id: id.clone(),
                        offset_x,
                        offset_y,
                        moved: true,
                    };
                }
                let (x, y) = (wx - offset_x, wy - offset_y);
                if !self.store.update(&id, NodePatch::position(x, y)) {
                    self.end_gesture();
                    return true;
                }
                if let Some(node) = self.store.get(&id) {
                    self.colliding =
                        layout::colliding_ids(self.store.list(), &node.rect(), Some(&id))
                            .into_iter()
                            .collect();
                    if !self.colliding.is_empty() {
                        self.colliding.insert(id);
                    }
                }
                true
            }
            Gesture::Resizing {
                id,
                start_x,
                start_y,
                start_width,
                start_height,
                moved,
            } => {
                if !moved {
                    self.snapshot();
                    self.gesture = Gesture::Resizing {
                        id: id.clone(),
                        start_x,
                        start_y,
                        start_width,
                        start_height,
                        moved: true,
                    };
                }
                let patch = NodePatch {
                    manually_resized: Some(true),
                    ..NodePatch::size(start_width + wx - start_x, start_height + wy - start_y)
                };
                if !self.store.update(&id, patch) {
                    self.end_gesture();
                }
                true
            }
        }
    }

    /// Ends the gesture. A dragged node that ends up overlapping another is
    /// moved to the nearest free spot.
    pub fn pointer_up(&mut self, _input: PointerInput) -> bool {
        self.long_press = None;
        let gesture = std::mem::replace(&mut self.gesture, Gesture::Idle);
        self.colliding.clear();
        match gesture {
            Gesture::Idle => false,
            Gesture::Dragging { id, moved, .. } => {
                if moved {
                    self.settle(&id);
                }
                log::debug!("drag end on {}", id);
                moved
            }
            Gesture::Resizing { id, moved, .. } => {
                log::debug!("resize end on {}", id);
                moved
            }
        }
    }

    /// Pointer left the window or the browser cancelled it. Same as a
    /// release: the gesture always ends.
    pub fn pointer_cancel(&mut self) -> bool {
        self.pointer_up(PointerInput::mouse(0.0, 0.0))
    }

    fn settle(&mut self, id: &str) {
        let Some(rect) = self.store.get(id).map(Node::rect) else {
            return;
        };
        let (x, y) = layout::find_non_overlapping_position(self.store.list(), &rect, Some(id));
        if (x, y) != (rect.x, rect.y) {
            log::debug!("settling {} to ({:.0}, {:.0})", id, x, y);
            self.store.update(id, NodePatch::position(x, y));
        }
    }

    fn end_gesture(&mut self) {
        self.gesture = Gesture::Idle;
        self.colliding.clear();
    }

    /// Long-press timer fired. Opens the context menu if the press with this
    /// serial is still held and has not moved.
    pub fn long_press_elapsed(&mut self, serial: u64) -> bool {
        match self.long_press {
            Some(press) if press.serial == serial => {
                self.long_press = None;
                self.end_gesture();
                self.open_context_menu(press.screen_x, press.screen_y);
                true
            }
            _ => false,
        }
    }

    // Context menu

    pub fn open_context_menu(&mut self, screen_x: f64, screen_y: f64) {
        self.long_press = None;
        self.end_gesture();
        let (world_x, world_y) = self.viewport.screen_to_world(screen_x, screen_y);
        let target = self.store.hit_test(world_x, world_y).map(|n| n.id.clone());
        if target.is_some() {
            self.selected = target.clone();
        }
        self.context_menu = Some(ContextMenu {
            screen_x,
            screen_y,
            world_x,
            world_y,
            target,
        });
    }

    pub fn close_context_menu(&mut self) -> bool {
        self.context_menu.take().is_some()
    }

    pub fn menu_action(&mut self, action: MenuAction) -> Option<ShellCommand> {
        let menu = self.context_menu.take();
        match action {
            MenuAction::AddNodeHere => {
                let (x, y) = menu
                    .map(|m| (m.world_x, m.world_y))
                    .unwrap_or_else(|| self.viewport_center_origin());
                self.create_node(x, y, None);
                None
            }
            MenuAction::Undo => {
                self.undo();
                None
            }
            MenuAction::Redo => {
                self.redo();
                None
            }
            MenuAction::ToggleAi => Some(ShellCommand::ToggleAi {
                target: menu.and_then(|m| m.target).or_else(|| self.selected.clone()),
            }),
            MenuAction::ExportJson => match export::export_json(self.store.list()) {
                Ok(json) => Some(ShellCommand::DownloadJson(json)),
                Err(e) => {
                    log::error!("json export failed: {}", e);
                    None
                }
            },
            MenuAction::ExportImage => Some(ShellCommand::ExportImage),
            MenuAction::ToggleNodeList => Some(ShellCommand::ToggleNodeList),
            MenuAction::Cancel => None,
        }
    }

    // Editing

    /// Double-click or double-tap: edit the node under the pointer, or make a
    /// new one there. Returns the node now being edited or created.
    pub fn double_click(&mut self, screen_x: f64, screen_y: f64) -> Option<String> {
        self.end_gesture();
        let (wx, wy) = self.viewport.screen_to_world(screen_x, screen_y);
        match self.store.hit_test(wx, wy).map(|n| n.id.clone()) {
            Some(id) => self.begin_edit(&id).then_some(id),
            None => Some(self.create_node(wx, wy, None)),
        }
    }

    /// Enters editing on `id`, committing any other open edit first.
    pub fn begin_edit(&mut self, id: &str) -> bool {
        if self.editing.as_ref().is_some_and(|s| s.id == id) {
            return true;
        }
        if self.editing.is_some() {
            self.commit_edit();
        }
        let Some(original_text) = self.store.get(id).map(|n| n.text.clone()) else {
            return false;
        };
        self.store.set_editing(id);
        self.selected = Some(id.to_string());
        self.editing = Some(EditSession {
            id: id.to_string(),
            draft: original_text.clone(),
            original_text,
        });
        true
    }

    pub fn edit_input(&mut self, text: &str) {
        if let Some(session) = self.editing.as_mut() {
            session.draft = text.to_string();
        }
    }

    /// Saves the draft. Blank drafts delete the node.
    pub fn commit_edit(&mut self) -> Option<CommitOutcome> {
        let session = self.editing.take()?;
        if session.draft != session.original_text {
            self.snapshot();
        }
        let outcome = self.store.commit_text(&session.id, &session.draft);
        match outcome {
            CommitOutcome::Deleted => self.prune_references(),
            CommitOutcome::Updated | CommitOutcome::Unchanged => self.auto_resize(&session.id),
        }
        Some(outcome)
    }

    /// Leaves editing with the text it had before editing began.
    pub fn cancel_edit(&mut self) -> bool {
        let Some(session) = self.editing.take() else {
            return false;
        };
        self.store.update(
            &session.id,
            NodePatch {
                text: Some(session.original_text),
                is_editing: Some(false),
                ..NodePatch::default()
            },
        );
        true
    }

    /// Fits the node's height (and width, unless resized by hand) to its text.
    pub fn auto_resize(&mut self, id: &str) {
        let Some(node) = self.store.get(id) else {
            return;
        };
        let manual = node.is_manually_resized();
        let box_width = if manual { node.width } else { MAX_AUTO_WIDTH };
        let (text_width, text_height) =
            self.measure
                .measure(&node.text, &self.font, box_width - 2.0 * TEXT_PADDING_X);
        let threshold = if self.touch_mode {
            RESIZE_THRESHOLD_TOUCH
        } else {
            RESIZE_THRESHOLD_DESKTOP
        };

        let mut patch = NodePatch::default();
        let height = (text_height + 2.0 * TEXT_PADDING_Y).max(MIN_NODE_HEIGHT);
        if (height - node.height).abs() > threshold {
            patch.height = Some(height);
        }
        if !manual {
            let width = (text_width + 2.0 * TEXT_PADDING_X).clamp(DEFAULT_NODE_WIDTH, MAX_AUTO_WIDTH);
            if (width - node.width).abs() > f64::EPSILON {
                patch.width = Some(width);
            }
        }
        if patch != NodePatch::default() {
            self.store.update(id, patch);
        }
    }

    // Keyboard

    /// Returns true if the key was consumed and its default should be
    /// suppressed.
    pub fn key_down(&mut self, key: &KeyInput) -> bool {
        let lower = key.key.to_lowercase();
        if key.key == "Escape" {
            return self.close_context_menu() || self.cancel_edit();
        }
        if key.in_text_input {
            return false;
        }
        if key.has_command_modifier() {
            match lower.as_str() {
                "z" if key.shift => return self.redo(),
                "z" => return self.undo(),
                "y" => return self.redo(),
                _ => return false,
            }
        }
        if (key.key == "Delete" || key.key == "Backspace") && self.editing.is_none() {
            if let Some(id) = self.selected.clone() {
                return self.delete_node(&id);
            }
        }
        false
    }

    // Creation and deletion

    /// Creates a default node near `(x, y)`, moved off any node it would cover.
    pub fn create_node(&mut self, x: f64, y: f64, text: Option<&str>) -> String {
        self.create_node_with(NewNode {
            text: text.map(str::to_string),
            ..NewNode::at(x, y)
        })
    }

    pub fn create_node_with(&mut self, template: NewNode) -> String {
        let rect = Rect::new(
            template.x,
            template.y,
            template.width.unwrap_or(DEFAULT_NODE_WIDTH),
            template.height.unwrap_or(DEFAULT_NODE_HEIGHT),
        );
        let (x, y) = layout::find_non_overlapping_position(self.store.list(), &rect, None);
        self.snapshot();
        let id = self.store.create_with(NewNode { x, y, ..template });
        self.selected = Some(id.clone());
        id
    }

    pub fn delete_node(&mut self, id: &str) -> bool {
        if !self.store.contains(id) {
            return false;
        }
        self.snapshot();
        self.store.delete(id);
        self.prune_references();
        true
    }

    /// Replaces the canvas with imported nodes.
    pub fn import_nodes(&mut self, nodes: Vec<Node>) {
        self.snapshot();
        self.store.replace_all(nodes);
        self.prune_references();
    }

    /// Drops transient state that points at nodes which no longer exist.
    fn prune_references(&mut self) {
        let store = &self.store;
        let gone = |id: &str| !store.contains(id);

        let gesture_gone = match &self.gesture {
            Gesture::Idle => false,
            Gesture::Dragging { id, .. } | Gesture::Resizing { id, .. } => gone(id.as_str()),
        };
        if gesture_gone {
            self.gesture = Gesture::Idle;
            self.long_press = None;
        }
        if self.editing.as_ref().is_some_and(|s| gone(s.id.as_str())) {
            self.editing = None;
        }
        if self.selected.as_deref().is_some_and(gone) {
            self.selected = None;
        }
        if self.highlighted.as_ref().is_some_and(|(id, _)| gone(id.as_str())) {
            self.highlighted = None;
        }
        if self
            .context_menu
            .as_ref()
            .and_then(|m| m.target.as_deref())
            .is_some_and(gone)
        {
            self.context_menu = None;
        }
        self.colliding.retain(|id| store.contains(id));
        let stale: Vec<String> = self
            .generations
            .pending
            .keys()
            .filter(|id| gone(id.as_str()))
            .cloned()
            .collect();
        for id in stale {
            self.generations.forget(&id);
        }
    }

    // Undo and redo

    pub fn can_undo(&self) -> bool {
        match self.config.undo_model {
            UndoModel::Canvas => self.canvas_history.can_undo(),
            UndoModel::NodeText => self
                .selected
                .as_deref()
                .and_then(|id| self.store.get(id))
                .is_some_and(|n| n.history.can_undo()),
        }
    }

    pub fn can_redo(&self) -> bool {
        match self.config.undo_model {
            UndoModel::Canvas => self.canvas_history.can_redo(),
            UndoModel::NodeText => self
                .selected
                .as_deref()
                .and_then(|id| self.store.get(id))
                .is_some_and(|n| n.history.can_redo()),
        }
    }

    pub fn undo(&mut self) -> bool {
        match self.config.undo_model {
            UndoModel::NodeText => {
                let Some(id) = self.selected.clone() else {
                    return false;
                };
                let changed = self.store.undo_text(&id);
                if changed {
                    self.auto_resize(&id);
                }
                changed
            }
            UndoModel::Canvas => {
                let current = self.settled_nodes();
                match self.canvas_history.undo(current) {
                    Some(previous) => {
                        self.restore(previous);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    pub fn redo(&mut self) -> bool {
        match self.config.undo_model {
            UndoModel::NodeText => {
                let Some(id) = self.selected.clone() else {
                    return false;
                };
                let changed = self.store.redo_text(&id);
                if changed {
                    self.auto_resize(&id);
                }
                changed
            }
            UndoModel::Canvas => {
                let current = self.settled_nodes();
                match self.canvas_history.redo(current) {
                    Some(next) => {
                        self.restore(next);
                        true
                    }
                    None => false,
                }
            }
        }
    }

    fn restore(&mut self, mut nodes: Vec<Node>) {
        for node in &mut nodes {
            node.is_editing = false;
        }
        self.editing = None;
        self.gesture = Gesture::Idle;
        self.store.replace_all(nodes);
        self.prune_references();
    }

    /// The collection as history should hold it. Edit sessions are not part
    /// of canvas state, so no node is recorded as editing.
    fn settled_nodes(&self) -> Vec<Node> {
        let mut nodes = self.store.list().to_vec();
        for node in &mut nodes {
            node.is_editing = false;
        }
        nodes
    }

    /// Records the collection before a mutation when canvas undo is active.
    fn snapshot(&mut self) {
        if self.config.undo_model == UndoModel::Canvas {
            let nodes = self.settled_nodes();
            self.canvas_history.push(nodes);
        }
    }

    // Text generation

    /// Validates `prompt` and issues a ticket. With a `target`, any earlier
    /// ticket for the same node is superseded.
    pub fn start_generation(
        &mut self,
        prompt: &str,
        target: Option<&str>,
    ) -> Result<GenerationTicket, GatewayError> {
        let prompt = gateway::validate_prompt(prompt)?.to_string();
        let target = target.filter(|id| self.store.contains(id));
        let serial = self.generations.issue(target);
        Ok(GenerationTicket {
            serial,
            prompt,
            target: target.map(str::to_string),
            origin: self.viewport_center_origin(),
        })
    }

    /// Applies a finished request. Returns the node that changed, or `None`
    /// when the result was stale or its target is gone.
    pub fn finish_generation(
        &mut self,
        ticket: &GenerationTicket,
        result: Result<String, GatewayError>,
    ) -> Option<String> {
        if let Some(target) = &ticket.target {
            if !self.generations.settle(target, ticket.serial) {
                log::debug!("dropping stale generation {} for {}", ticket.serial, target);
                return None;
            }
            // Commit an open edit on the target before the result replaces it.
            if self.editing.as_ref().is_some_and(|s| &s.id == target) {
                self.commit_edit();
            }
            if !self.store.contains(target) {
                return None;
            }
            let patch = match result {
                Ok(content) => {
                    let generated = gateway::parse_generated(&content);
                    NodePatch {
                        text: Some(generated.display_text()),
                        color: generated.color,
                        ..NodePatch::default()
                    }
                }
                Err(e) => NodePatch::text(e.node_text()),
            };
            self.snapshot();
            self.store.update(target, patch);
            self.auto_resize(target);
            log::info!("generation {} applied to {}", ticket.serial, target);
            return Some(target.clone());
        }

        let (x, y) = ticket.origin;
        let template = match result {
            Ok(content) => {
                let generated = gateway::parse_generated(&content);
                NewNode {
                    text: Some(generated.text),
                    color: generated.color,
                    emoji: generated.emoji,
                    ..NewNode::at(x, y)
                }
            }
            Err(e) => NewNode {
                text: Some(e.node_text()),
                ..NewNode::at(x, y)
            },
        };
        let id = self.create_node_with(template);
        self.auto_resize(&id);
        log::info!("generation {} created {}", ticket.serial, id);
        Some(id)
    }

    fn viewport_center_origin(&self) -> (f64, f64) {
        let center_x = self.viewport.scroll_x + self.viewport.width / 2.0;
        let center_y = self.viewport.scroll_y + self.viewport.height / 2.0;
        (
            center_x - DEFAULT_NODE_WIDTH / 2.0,
            center_y - DEFAULT_NODE_HEIGHT / 2.0,
        )
    }

    fn next_serial(&mut self) -> u64 {
        self.serial += 1;
        self.serial
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::measure::MonospaceMeasure;

    fn controller() -> Controller {
        controller_with(CanvasConfig::default())
    }

    fn controller_with(config: CanvasConfig) -> Controller {
        let mut c = Controller::new(
            NodeStore::in_memory(),
            config,
            Box::new(MonospaceMeasure::default()),
        );
        c.set_viewport_size(1000.0, 800.0);
        c
    }

    fn canvas_undo() -> Controller {
        controller_with(CanvasConfig {
            undo_model: UndoModel::Canvas,
            ..CanvasConfig::default()
        })
    }

    fn node(c: &Controller, id: &str) -> Node {
        c.store().get(id).cloned().unwrap()
    }

    mod drag_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn drag_moves_node_by_pointer_delta() {
            let mut c = controller();
            let id = c.create_node(100.0, 100.0, None);

            let down = c.pointer_down(PointerInput::mouse(110.0, 110.0));
            assert!(down.capture);
            assert_eq!(down.long_press, None);
            assert!(c.pointer_move(PointerInput::mouse(160.0, 210.0)));
            c.pointer_up(PointerInput::mouse(160.0, 210.0));

            let n = node(&c, &id);
            assert_eq!((n.x, n.y), (150.0, 200.0));
            assert_eq!(c.gesture(), &Gesture::Idle);
        }

        #[test]
        fn overlap_is_flagged_during_drag_and_settled_on_release() {
            let mut c = controller();
            let a = c.create_node(0.0, 0.0, None);
            let b = c.create_node(500.0, 0.0, None);

            c.pointer_down(PointerInput::mouse(510.0, 10.0));
            c.pointer_move(PointerInput::mouse(60.0, 20.0));
            assert!(c.colliding().contains(&a));
            assert!(c.colliding().contains(&b));

            c.pointer_up(PointerInput::mouse(60.0, 20.0));
            assert!(c.colliding().is_empty());
            let moved = node(&c, &b);
            assert!(!node(&c, &a).rect().overlaps(&moved.rect()));
        }

        #[test]
        fn click_without_move_is_not_a_drag() {
            let mut c = controller();
            let id = c.create_node(100.0, 100.0, None);
            c.pointer_down(PointerInput::mouse(150.0, 120.0));
            assert!(!c.pointer_up(PointerInput::mouse(150.0, 120.0)));
            assert_eq!(c.selected(), Some(id.as_str()));
        }

        #[test]
        fn cancel_always_returns_to_idle() {
            let mut c = controller();
            c.create_node(100.0, 100.0, None);
            c.pointer_down(PointerInput::mouse(150.0, 120.0));
            c.pointer_move(PointerInput::mouse(170.0, 140.0));
            c.pointer_cancel();
            assert_eq!(c.gesture(), &Gesture::Idle);
            assert!(!c.pointer_move(PointerInput::mouse(400.0, 400.0)));
        }

        #[test]
        fn scroll_offsets_apply_to_drag() {
            let mut c = controller();
            let id = c.create_node(1000.0, 1000.0, None);
            c.scroll_by(900.0, 900.0);
            c.pointer_down(PointerInput::mouse(110.0, 110.0));
            c.pointer_move(PointerInput::mouse(120.0, 130.0));
            c.pointer_up(PointerInput::mouse(120.0, 130.0));
            let n = node(&c, &id);
            assert_eq!((n.x, n.y), (1010.0, 1020.0));
        }

        #[test]
        fn empty_canvas_click_clears_selection() {
            let mut c = controller();
            c.create_node(100.0, 100.0, None);
            assert!(c.selected().is_some());
            let down = c.pointer_down(PointerInput::mouse(700.0, 700.0));
            assert!(!down.capture);
            assert_eq!(c.selected(), None);
        }
    }

    mod resize_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn handle_drag_resizes_with_minimums() {
            let mut c = controller();
            let id = c.create_node(100.0, 100.0, None);

            c.pointer_down(PointerInput::mouse(295.0, 145.0));
            assert!(matches!(c.gesture(), Gesture::Resizing { .. }));
            c.pointer_move(PointerInput::mouse(395.0, 245.0));
            let n = node(&c, &id);
            assert_eq!((n.width, n.height), (300.0, 150.0));
            assert!(n.is_manually_resized());

            c.pointer_move(PointerInput::mouse(0.0, 0.0));
            let n = node(&c, &id);
            assert_eq!((n.width, n.height), (100.0, 40.0));
            c.pointer_up(PointerInput::mouse(0.0, 0.0));
        }

        #[test]
        fn touch_never_resizes() {
            let mut c = controller();
            c.create_node(100.0, 100.0, None);
            c.pointer_down(PointerInput::touch(295.0, 145.0));
            assert!(matches!(c.gesture(), Gesture::Dragging { .. }));
        }
    }

    mod long_press_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn held_press_opens_menu() {
            let mut c = controller();
            let down = c.pointer_down(PointerInput::touch(300.0, 300.0));
            let serial = down.long_press.unwrap();
            c.pointer_move(PointerInput::touch(304.0, 303.0));
            assert!(c.long_press_elapsed(serial));
            let menu = c.context_menu().unwrap();
            assert_eq!((menu.screen_x, menu.screen_y), (300.0, 300.0));
        }

        #[test]
        fn movement_cancels_press() {
            let mut c = controller();
            let serial = c.pointer_down(PointerInput::touch(300.0, 300.0)).long_press.unwrap();
            c.pointer_move(PointerInput::touch(320.0, 300.0));
            assert!(!c.long_press_elapsed(serial));
            assert!(c.context_menu().is_none());
        }

        #[test]
        fn lift_before_threshold_cancels_press() {
            let mut c = controller();
            let serial = c.pointer_down(PointerInput::touch(300.0, 300.0)).long_press.unwrap();
            c.pointer_up(PointerInput::touch(300.0, 300.0));
            assert!(!c.long_press_elapsed(serial));
        }

        #[test]
        fn stale_timer_is_ignored() {
            let mut c = controller();
            let first = c.pointer_down(PointerInput::touch(300.0, 300.0)).long_press.unwrap();
            c.pointer_up(PointerInput::touch(300.0, 300.0));
            let second = c.pointer_down(PointerInput::touch(310.0, 300.0)).long_press.unwrap();
            assert!(!c.long_press_elapsed(first));
            assert!(c.long_press_elapsed(second));
        }

        #[test]
        fn press_on_node_ends_pending_drag() {
            let mut c = controller();
            let id = c.create_node(100.0, 100.0, None);
            let serial = c.pointer_down(PointerInput::touch(150.0, 120.0)).long_press.unwrap();
            assert!(c.long_press_elapsed(serial));
            assert_eq!(c.gesture(), &Gesture::Idle);
            assert_eq!(c.context_menu().unwrap().target.as_deref(), Some(id.as_str()));
        }
    }

    mod menu_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn add_node_here_uses_menu_position() {
            let mut c = controller();
            c.scroll_by(50.0, 50.0);
            c.open_context_menu(200.0, 300.0);
            assert_eq!(c.menu_action(MenuAction::AddNodeHere), None);
            assert!(c.context_menu().is_none());
            let n = &c.nodes()[0];
            assert_eq!((n.x, n.y), (250.0, 350.0));
        }

        #[test]
        fn shell_actions_are_handed_back() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, None);
            c.open_context_menu(10.0, 10.0);
            assert_eq!(
                c.menu_action(MenuAction::ToggleAi),
                Some(ShellCommand::ToggleAi { target: Some(id) })
            );
            assert_eq!(c.menu_action(MenuAction::ExportImage), Some(ShellCommand::ExportImage));
            assert_eq!(c.menu_action(MenuAction::ToggleNodeList), Some(ShellCommand::ToggleNodeList));
            match c.menu_action(MenuAction::ExportJson) {
                Some(ShellCommand::DownloadJson(json)) => assert!(json.starts_with('[')),
                other => panic!("unexpected {:?}", other),
            }
        }

        #[test]
        fn escape_and_outside_click_dismiss() {
            let mut c = controller();
            c.open_context_menu(10.0, 10.0);
            assert!(c.key_down(&KeyInput::plain("Escape")));
            assert!(c.context_menu().is_none());

            c.open_context_menu(10.0, 10.0);
            let down = c.pointer_down(PointerInput::mouse(500.0, 500.0));
            assert!(!down.capture);
            assert!(c.context_menu().is_none());
        }

        #[test]
        fn every_action_has_a_label() {
            let labels: Vec<&str> = MenuAction::ALL.iter().map(|a| a.label()).collect();
            assert_eq!(labels.len(), 8);
            assert!(labels.contains(&"Add Node Here"));
            assert!(labels.contains(&"Cancel"));
        }
    }

    mod edit_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn double_click_on_empty_canvas_creates() {
            let mut c = controller();
            let id = c.double_click(300.0, 300.0).unwrap();
            assert_eq!(c.nodes().len(), 1);
            assert_eq!(node(&c, &id).text, "New Node");
        }

        #[test]
        fn edit_commit_updates_text_and_history() {
            let mut c = controller();
            let id = c.create_node(100.0, 100.0, None);
            assert_eq!(c.double_click(150.0, 120.0), Some(id.clone()));
            assert!(node(&c, &id).is_editing);

            c.edit_input("Renamed");
            assert_eq!(c.commit_edit(), Some(CommitOutcome::Updated));
            let n = node(&c, &id);
            assert_eq!(n.text, "Renamed");
            assert!(!n.is_editing);
            assert!(n.history.can_undo());
        }

        #[test]
        fn escape_reverts_draft() {
            let mut c = controller();
            let id = c.create_node(100.0, 100.0, Some("Keep me"));
            c.begin_edit(&id);
            c.edit_input("Throw away");
            assert!(c.key_down(&KeyInput {
                key: "Escape".to_string(),
                in_text_input: true,
                ..KeyInput::default()
            }));
            assert_eq!(node(&c, &id).text, "Keep me");
            assert!(c.edit_session().is_none());
        }

        #[test]
        fn blank_commit_deletes_node() {
            let mut c = controller();
            let id = c.create_node(100.0, 100.0, None);
            c.begin_edit(&id);
            c.edit_input("  \n ");
            assert_eq!(c.commit_edit(), Some(CommitOutcome::Deleted));
            assert!(c.nodes().is_empty());
            assert_eq!(c.selected(), None);
        }

        #[test]
        fn editing_another_node_commits_the_first() {
            let mut c = controller();
            let a = c.create_node(0.0, 0.0, Some("a"));
            let b = c.create_node(400.0, 0.0, Some("b"));
            c.begin_edit(&a);
            c.edit_input("a2");
            c.begin_edit(&b);
            assert_eq!(node(&c, &a).text, "a2");
            assert!(!node(&c, &a).is_editing);
            assert!(node(&c, &b).is_editing);
            assert_eq!(c.edit_session().map(|s| s.id.as_str()), Some(b.as_str()));
        }

        #[test]
        fn long_text_grows_height_and_width() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, None);
            c.begin_edit(&id);
            c.edit_input(&"word ".repeat(40));
            c.commit_edit();
            let n = node(&c, &id);
            assert!(n.height > DEFAULT_NODE_HEIGHT);
            assert!(n.width > DEFAULT_NODE_WIDTH);
            assert!(n.width <= MAX_AUTO_WIDTH);
        }

        #[test]
        fn manual_width_is_held_on_commit() {
            let mut c = controller();
            let id = c.create_node(100.0, 100.0, None);
            c.pointer_down(PointerInput::mouse(295.0, 145.0));
            c.pointer_move(PointerInput::mouse(255.0, 145.0));
            c.pointer_up(PointerInput::mouse(255.0, 145.0));
            let resized_width = node(&c, &id).width;

            c.begin_edit(&id);
            c.edit_input(&"word ".repeat(40));
            c.commit_edit();
            assert_eq!(node(&c, &id).width, resized_width);
        }

        #[test]
        fn small_height_change_is_ignored() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("short"));
            c.auto_resize(&id);
            // One line measures 20 + 2 * 10 = 40, within 10 of the 50 default.
            assert_eq!(node(&c, &id).height, DEFAULT_NODE_HEIGHT);
        }

        #[test]
        fn pointer_down_elsewhere_commits_open_edit() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("x"));
            c.begin_edit(&id);
            c.edit_input("y");
            c.pointer_down(PointerInput::mouse(900.0, 700.0));
            assert_eq!(node(&c, &id).text, "y");
            assert!(c.edit_session().is_none());
        }
    }

    mod keyboard_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn node_text_undo_and_redo() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("one"));
            c.begin_edit(&id);
            c.edit_input("two");
            c.commit_edit();

            assert!(c.key_down(&KeyInput::command("z")));
            assert_eq!(node(&c, &id).text, "one");
            assert!(c.key_down(&KeyInput::command("y")));
            assert_eq!(node(&c, &id).text, "two");
            assert!(c.key_down(&KeyInput::command("z")));
            assert!(c.key_down(&KeyInput {
                shift: true,
                ..KeyInput::command("Z")
            }));
            assert_eq!(node(&c, &id).text, "two");
        }

        #[test]
        fn meta_works_like_ctrl() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("one"));
            c.begin_edit(&id);
            c.edit_input("two");
            c.commit_edit();
            assert!(c.key_down(&KeyInput {
                key: "z".to_string(),
                meta: true,
                ..KeyInput::default()
            }));
            assert_eq!(node(&c, &id).text, "one");
        }

        #[test]
        fn text_fields_keep_native_undo() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("one"));
            c.begin_edit(&id);
            c.edit_input("two");
            c.commit_edit();
            assert!(!c.key_down(&KeyInput {
                in_text_input: true,
                ..KeyInput::command("z")
            }));
            assert_eq!(node(&c, &id).text, "two");
        }

        #[test]
        fn delete_removes_selected_node() {
            let mut c = controller();
            c.create_node(0.0, 0.0, None);
            assert!(c.key_down(&KeyInput::plain("Delete")));
            assert!(c.nodes().is_empty());
            assert!(!c.key_down(&KeyInput::plain("Delete")));
        }

        #[test]
        fn undo_with_nothing_selected_is_noop() {
            let mut c = controller();
            assert!(!c.key_down(&KeyInput::command("z")));
        }
    }

    mod canvas_history_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn undo_then_redo_restores_exact_list() {
            let mut c = canvas_undo();
            c.create_node(0.0, 0.0, Some("a"));
            let b = c.create_node(300.0, 0.0, Some("b"));
            c.delete_node(&b);
            let after = c.nodes().to_vec();

            assert!(c.undo());
            assert_eq!(c.nodes().len(), 2);
            assert!(c.redo());
            assert_eq!(c.nodes(), after.as_slice());
        }

        #[test]
        fn drag_is_one_snapshot() {
            let mut c = canvas_undo();
            let id = c.create_node(100.0, 100.0, None);
            c.pointer_down(PointerInput::mouse(110.0, 110.0));
            for step in 1..=5 {
                c.pointer_move(PointerInput::mouse(110.0 + step as f64 * 10.0, 110.0));
            }
            c.pointer_up(PointerInput::mouse(160.0, 110.0));
            assert_eq!(node(&c, &id).x, 150.0);

            assert!(c.undo());
            assert_eq!(node(&c, &id).x, 100.0);
            assert!(c.undo());
            assert!(c.nodes().is_empty());
            assert!(!c.undo());
        }

        #[test]
        fn undo_after_edit_leaves_no_node_editing() {
            let mut c = canvas_undo();
            let id = c.create_node(0.0, 0.0, Some("a"));
            c.begin_edit(&id);
            c.edit_input("b");
            c.commit_edit();

            assert!(c.undo());
            let n = node(&c, &id);
            assert_eq!(n.text, "a");
            assert!(!n.is_editing);
            assert_eq!(c.store().editing_id(), None);
            assert!(c.edit_session().is_none());

            assert!(c.redo());
            assert_eq!(node(&c, &id).text, "b");
            assert_eq!(c.store().editing_id(), None);
        }

        #[test]
        fn undo_clears_references_to_vanished_nodes() {
            let mut c = canvas_undo();
            let id = c.create_node(0.0, 0.0, None);
            assert_eq!(c.selected(), Some(id.as_str()));
            c.undo();
            assert_eq!(c.selected(), None);
        }
    }

    mod generation_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn blank_prompt_never_issues_ticket() {
            let mut c = controller();
            assert_eq!(c.start_generation("   ", None), Err(GatewayError::MissingPrompt));
            assert!(c.nodes().is_empty());
        }

        #[test]
        fn plain_response_creates_node_with_verbatim_text() {
            let mut c = controller();
            let ticket = c.start_generation("Say hello in French", None).unwrap();
            let id = c.finish_generation(&ticket, Ok("Bonjour".to_string())).unwrap();
            assert_eq!(node(&c, &id).text, "Bonjour");
        }

        #[test]
        fn failure_becomes_error_node() {
            let mut c = controller();
            let ticket = c.start_generation("anything", None).unwrap();
            let err = GatewayError::Upstream("Failed to generate text".to_string());
            let id = c.finish_generation(&ticket, Err(err)).unwrap();
            assert!(node(&c, &id).text.starts_with("Error: "));
        }

        #[test]
        fn structured_response_updates_target() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("old"));
            let ticket = c.start_generation("improve", Some(&id)).unwrap();
            assert!(c.is_generating(&id));
            let content = r##"{"text":"new","color":"#EF4444","emoji":"✨"}"##.to_string();
            assert_eq!(c.finish_generation(&ticket, Ok(content)), Some(id.clone()));
            let n = node(&c, &id);
            assert_eq!(n.text, "✨ new");
            assert_eq!(n.color, "#EF4444");
            assert!(!c.is_generating(&id));
        }

        #[test]
        fn rewrite_can_be_undone() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("My careful notes"));
            let ticket = c.start_generation("Translate to French", Some(&id)).unwrap();
            c.finish_generation(&ticket, Ok("Bonjour".to_string()));
            assert_eq!(node(&c, &id).text, "Bonjour");

            assert!(c.key_down(&KeyInput::command("z")));
            assert_eq!(node(&c, &id).text, "My careful notes");
            assert!(c.key_down(&KeyInput::command("y")));
            assert_eq!(node(&c, &id).text, "Bonjour");
        }

        #[test]
        fn result_for_node_in_editor_survives_commit() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("orig"));
            let ticket = c.start_generation("rewrite", Some(&id)).unwrap();
            c.begin_edit(&id);
            assert_eq!(c.finish_generation(&ticket, Ok("AI text".to_string())), Some(id.clone()));

            assert!(c.edit_session().is_none());
            assert_eq!(c.commit_edit(), None);
            assert!(!c.cancel_edit());
            let n = node(&c, &id);
            assert_eq!(n.text, "AI text");
            assert!(!n.is_editing);
        }

        #[test]
        fn draft_in_editor_is_one_undo_behind_result() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("orig"));
            let ticket = c.start_generation("rewrite", Some(&id)).unwrap();
            c.begin_edit(&id);
            c.edit_input("typed");
            c.finish_generation(&ticket, Ok("AI text".to_string()));

            assert_eq!(node(&c, &id).text, "AI text");
            assert!(c.undo());
            assert_eq!(node(&c, &id).text, "typed");
            assert!(c.undo());
            assert_eq!(node(&c, &id).text, "orig");
        }

        #[test]
        fn newer_request_supersedes_older() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("old"));
            let first = c.start_generation("one", Some(&id)).unwrap();
            let second = c.start_generation("two", Some(&id)).unwrap();

            assert_eq!(c.finish_generation(&second, Ok("second".to_string())), Some(id.clone()));
            assert_eq!(c.finish_generation(&first, Ok("first".to_string())), None);
            assert_eq!(node(&c, &id).text, "second");
        }

        #[test]
        fn deleted_target_discards_result() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, Some("old"));
            let ticket = c.start_generation("x", Some(&id)).unwrap();
            c.delete_node(&id);
            assert_eq!(c.finish_generation(&ticket, Ok("late".to_string())), None);
            assert!(c.nodes().is_empty());
        }

        #[test]
        fn new_node_requests_are_independent() {
            let mut c = controller();
            let a = c.start_generation("a", None).unwrap();
            let b = c.start_generation("b", None).unwrap();
            assert!(c.finish_generation(&b, Ok("B".to_string())).is_some());
            assert!(c.finish_generation(&a, Ok("A".to_string())).is_some());
            assert_eq!(c.nodes().len(), 2);
            assert!(!c.nodes()[0].rect().overlaps(&c.nodes()[1].rect()));
        }
    }

    mod focus_tests {
        use super::*;
        use pretty_assertions::assert_eq;

        #[test]
        fn focus_centres_and_highlights() {
            let mut c = controller();
            let id = c.create_node(2000.0, 1000.0, None);
            let serial = c.focus_node(&id).unwrap();
            let vp = c.viewport();
            assert_eq!((vp.scroll_x, vp.scroll_y), (1600.0, 625.0));
            assert_eq!(c.highlighted(), Some(id.as_str()));

            assert!(c.clear_highlight(serial));
            assert_eq!(c.highlighted(), None);
        }

        #[test]
        fn older_highlight_timer_does_not_clear_newer() {
            let mut c = controller();
            let id = c.create_node(0.0, 0.0, None);
            let first = c.focus_node(&id).unwrap();
            let second = c.focus_node(&id).unwrap();
            assert!(!c.clear_highlight(first));
            assert!(c.clear_highlight(second));
        }

        #[test]
        fn unknown_node_is_not_focused() {
            let mut c = controller();
            assert_eq!(c.focus_node("missing"), None);
        }
    }
}
