// SPDX-License-Identifier: MIT OR Apache-2.0
//! Demo configuration, stored as RON.

use blueprint_editor::{CanvasStyle, LayoutStyle};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Current configuration format version
pub const CONFIG_FORMAT_VERSION: u32 = 1;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Reading or writing the file failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not valid RON for a configuration
    #[error("Invalid configuration: {0}")]
    Parse(#[from] ron::error::SpannedError),

    /// Serializing the configuration failed
    #[error("Failed to serialize configuration: {0}")]
    Serialize(#[from] ron::Error),

    /// Written by a newer version of the demo
    #[error("Configuration version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version in the file
        found: u32,
        /// Newest version this build reads
        supported: u32,
    },
}

/// Size of the tiled header texture
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeaderTextureSize {
    /// Width in pixels
    pub width: u32,
    /// Height in pixels
    pub height: u32,
}

/// Something the user does on the canvas
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum DemoAction {
    /// Drag a link between two pins
    Connect {
        /// Pin the drag starts at
        from: u32,
        /// Pin the drag ends at
        to: u32,
    },
    /// Drag a link from a pin onto empty canvas
    CreateNodeFrom {
        /// Pin the drag starts at
        pin: u32,
    },
    /// Delete a node
    DeleteNode {
        /// Node to delete
        node: u32,
    },
    /// Delete a link
    DeleteLink {
        /// Link to delete
        link: u32,
    },
    /// Drag a node to a new position
    MoveNode {
        /// Node to move
        node: u32,
        /// New left edge
        x: f32,
        /// New top edge
        y: f32,
    },
}

/// An action replayed at a given frame
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    /// Frame the action happens in, starting at 0
    pub frame: u32,
    /// The action
    pub action: DemoAction,
}

/// Demo settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoConfig {
    /// Format version
    pub version: u32,
    /// Size of the visible canvas area
    pub viewport: [f32; 2],
    /// Number of frames to run
    pub frames: u32,
    /// Ambient layout style
    pub layout_style: LayoutStyle,
    /// Node style
    pub canvas_style: CanvasStyle,
    /// Header texture, `None` draws plain headers
    pub header_texture: Option<HeaderTextureSize>,
    /// Evaluation steps run after each frame
    pub steps_per_frame: u32,
    /// Start over once execution finished
    pub restart_when_done: bool,
    /// Blueprint to load instead of the built-in sample
    pub blueprint_path: Option<PathBuf>,
    /// Interactions to replay
    pub actions: Vec<ScheduledAction>,
    /// Where to write the JSON frame report
    pub report_path: Option<PathBuf>,
}

impl Default for DemoConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_FORMAT_VERSION,
            viewport: [1280.0, 720.0],
            frames: 8,
            layout_style: LayoutStyle::default(),
            canvas_style: CanvasStyle::default(),
            header_texture: Some(HeaderTextureSize {
                width: 64,
                height: 64,
            }),
            steps_per_frame: 1,
            restart_when_done: true,
            blueprint_path: None,
            actions: Vec::new(),
            report_path: None,
        }
    }
}

impl DemoConfig {
    /// Parse a configuration from RON
    pub fn from_ron(content: &str) -> Result<Self, ConfigError> {
        let config: DemoConfig = ron::from_str(content)?;

        if config.version > CONFIG_FORMAT_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                found: config.version,
                supported: CONFIG_FORMAT_VERSION,
            });
        }

        Ok(config)
    }

    /// Serialize to RON
    pub fn to_ron(&self) -> Result<String, ConfigError> {
        let config = ron::ser::PrettyConfig::default()
            .struct_names(true)
            .enumerate_arrays(false);
        Ok(ron::ser::to_string_pretty(self, config)?)
    }

    /// Load a configuration file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_ron(&content)
    }

    /// Load `path` if given and present, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if path.exists() => {
                tracing::info!("Loading configuration from {}", path.display());
                Self::load(path)
            }
            Some(path) => {
                tracing::warn!("Configuration {} not found, using defaults", path.display());
                Ok(Self::default())
            }
            None => Ok(Self::default()),
        }
    }

    /// Save to a file
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, self.to_ron()?)?;
        Ok(())
    }

    /// Actions scheduled for `frame`
    pub fn actions_at(&self, frame: u32) -> impl Iterator<Item = DemoAction> + '_ {
        self.actions
            .iter()
            .filter(move |scheduled| scheduled.frame == frame)
            .map(|scheduled| scheduled.action)
    }
}
