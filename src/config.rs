use crate::persist::{KeyValueStore, DEFAULT_STORAGE_KEY};
use serde::{Deserialize, Serialize};

/// localStorage key holding an optional JSON override of [`CanvasConfig`].
pub const CONFIG_STORAGE_KEY: &str = "ai-canvas-config";

pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080";

/// Which undo facility Ctrl/Cmd+Z drives.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum UndoModel {
    /// Per-node text history; positions, sizes and deletions are not undoable.
    #[default]
    NodeText,
    /// Whole-collection snapshots before every mutation.
    Canvas,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct CanvasConfig {
    pub api_base_url: String,
    pub storage_key: String,
    pub undo_model: UndoModel,
    pub canvas_history_depth: usize,
    /// Forces touch behaviour on or off; `None` lets the shell detect it.
    pub touch_mode: Option<bool>,
    pub log_level: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            undo_model: UndoModel::NodeText,
            canvas_history_depth: 100,
            touch_mode: None,
            log_level: "info".to_string(),
        }
    }
}

impl CanvasConfig {
    /// Defaults, overridden field-by-field by whatever JSON is stored under
    /// [`CONFIG_STORAGE_KEY`]. An unreadable override is ignored.
    pub fn load(store: &dyn KeyValueStore) -> Self {
        match store.get(CONFIG_STORAGE_KEY) {
            Ok(Some(json)) => serde_json::from_str(&json).unwrap_or_else(|e| {
                log::warn!("ignoring invalid canvas config override: {}", e);
                Self::default()
            }),
            Ok(None) => Self::default(),
            Err(e) => {
                log::warn!("canvas config unavailable: {}", e);
                Self::default()
            }
        }
    }

    pub fn level_filter(&self) -> log::LevelFilter {
        self.log_level.parse().unwrap_or(log::LevelFilter::Info)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStore;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_when_no_override() {
        let store = MemoryStore::new();
        assert_eq!(CanvasConfig::load(&store), CanvasConfig::default());
    }

    #[test]
    fn partial_override_keeps_other_defaults() {
        let store = MemoryStore::new();
        store
            .set(CONFIG_STORAGE_KEY, r#"{"undo_model": "canvas", "api_base_url": "https://ai.example"}"#)
            .unwrap();
        let config = CanvasConfig::load(&store);
        assert_eq!(config.undo_model, UndoModel::Canvas);
        assert_eq!(config.api_base_url, "https://ai.example");
        assert_eq!(config.storage_key, DEFAULT_STORAGE_KEY);
        assert_eq!(config.canvas_history_depth, 100);
    }

    #[test]
    fn invalid_override_falls_back_to_defaults() {
        let store = MemoryStore::new();
        store.set(CONFIG_STORAGE_KEY, r#"{"undo_model": "everything"}"#).unwrap();
        assert_eq!(CanvasConfig::load(&store), CanvasConfig::default());
    }

    #[test]
    fn log_level_parses_with_fallback() {
        let mut config = CanvasConfig::default();
        config.log_level = "debug".to_string();
        assert_eq!(config.level_filter(), log::LevelFilter::Debug);
        config.log_level = "loud".to_string();
        assert_eq!(config.level_filter(), log::LevelFilter::Info);
    }
}
