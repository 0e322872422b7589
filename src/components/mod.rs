mod ai_assistant;
mod context_menu;
mod node_editor;
mod node_list;
mod toolbar;

pub use ai_assistant::{suggestions, AiAssistant};
pub use context_menu::CanvasMenu;
pub use node_editor::NodeEditor;
pub use node_list::{node_label, NodeList};
pub use toolbar::Toolbar;
