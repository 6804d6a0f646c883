use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use kanban_dnd::DragConfig;
use serde::{Deserialize, Serialize};

/// Environment variable naming the config file to load instead of
/// `kanban.json`.
pub const CONFIG_ENV: &str = "KANBAN_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "kanban.json";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct KanbanConfig {
    pub board_width: f32,
    pub task_height: f32,
    /// Where boards are saved. `None` keeps them in memory only.
    pub data_path: Option<PathBuf>,
    /// Fill an empty store with sample boards on startup.
    pub seed: bool,
    /// Artificial delay of every store call, in milliseconds.
    pub store_latency_ms: u64,
    pub drag: DragConfig,
}

impl Default for KanbanConfig {
    fn default() -> Self {
        Self {
            board_width: 280.,
            task_height: 44.,
            data_path: Some(PathBuf::from("kanban-data.json")),
            seed: true,
            store_latency_ms: 0,
            drag: DragConfig::default(),
        }
    }
}

impl KanbanConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let mut config: Self = serde_json::from_str(content)?;
        let drag = config.drag.sanitized();
        if drag != config.drag {
            tracing::warn!(?drag, "spring settings out of range, clamped");
            config.drag = drag;
        }
        Ok(config)
    }

    /// Load from `$KANBAN_CONFIG`, or `kanban.json` in the working directory.
    /// A missing default file yields the defaults.
    pub fn load_or_default() -> Result<Self> {
        if let Some(path) = std::env::var_os(CONFIG_ENV) {
            return Self::load(Path::new(&path));
        }
        let path = Path::new(DEFAULT_CONFIG_FILE);
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_object_uses_defaults() {
        let config = KanbanConfig::parse("{}").unwrap();
        assert_eq!(config, KanbanConfig::default());
    }

    #[test]
    fn nested_drag_settings_are_partial() {
        let config = KanbanConfig::parse(
            r#"{ "board_width": 320, "data_path": null, "drag": { "displace": { "damping": 30 } } }"#,
        )
        .unwrap();
        assert_eq!(config.board_width, 320.);
        assert_eq!(config.data_path, None);
        assert_eq!(config.drag.displace.damping, 30.);
        assert_eq!(config.drag.settle, DragConfig::default().settle);
    }

    #[test]
    fn spring_settings_are_clamped_on_load() {
        let config = KanbanConfig::parse(
            r#"{ "drag": { "settle": { "damping": 0 }, "displace": { "stiffness": -50 } } }"#,
        )
        .unwrap();
        assert!(config.drag.settle.damping > 0.);
        assert!(config.drag.displace.stiffness > 0.);
        assert_eq!(config.drag.transition, DragConfig::default().transition);
    }
}
