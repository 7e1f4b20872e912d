//! Scene files: the root window plus optional engine settings.
//!
//! ```json
//! {
//!   "config": {"fps": {"num": 30, "den": 1}, "total_frames": 900},
//!   "root": {"id": "root", "duration": 900, "children": [], "layers": []}
//! }
//! ```

use crate::foundation::error::{FramewiseError, FramewiseResult};
use crate::render::engine::EngineConfig;
use crate::timeline::tree::SequenceTree;
use crate::timeline::window::TimeWindow;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Serialized scene layout.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneDef {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EngineConfig>,
    pub root: TimeWindow,
}

/// A validated scene, ready for evaluation.
#[derive(Clone, Debug)]
pub struct Scene {
    config: Option<EngineConfig>,
    tree: SequenceTree,
}

impl Scene {
    pub fn new(root: TimeWindow) -> FramewiseResult<Self> {
        Self::from_def(SceneDef { config: None, root })
    }

    pub fn from_def(def: SceneDef) -> FramewiseResult<Self> {
        if let Some(cfg) = &def.config {
            cfg.validate()?;
        }
        Ok(Self {
            config: def.config,
            tree: SequenceTree::new(def.root)?,
        })
    }

    /// Parse a scene from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> FramewiseResult<Self> {
        let def: SceneDef = serde_json::from_reader(r)
            .map_err(|e| FramewiseError::serde(format!("parse scene JSON: {e}")))?;
        Self::from_def(def)
    }

    /// Parse a scene from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> FramewiseResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            FramewiseError::validation(format!("open scene JSON '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    pub fn from_json_str(s: &str) -> FramewiseResult<Self> {
        let def: SceneDef = serde_json::from_str(s)
            .map_err(|e| FramewiseError::serde(format!("parse scene JSON: {e}")))?;
        Self::from_def(def)
    }

    pub fn with_config(mut self, config: EngineConfig) -> FramewiseResult<Self> {
        config.validate()?;
        self.config = Some(config);
        Ok(self)
    }

    pub fn config(&self) -> Option<&EngineConfig> {
        self.config.as_ref()
    }

    pub fn tree(&self) -> &SequenceTree {
        &self.tree
    }

    pub fn into_parts(self) -> (SequenceTree, Option<EngineConfig>) {
        (self.tree, self.config)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/scene.rs"]
mod tests;
