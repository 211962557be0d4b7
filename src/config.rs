//! Search, game and model configuration.
//!
//! All structs deserialize from JSON with defaults for missing fields, so a
//! config file only needs to name what it changes.

use std::{fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// How a leaf value is accumulated along the path to the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ValueBackup {
    /// Alternate the sign at every ply. Each node accumulates value from the
    /// point of view of the player who moved into it, which is what its
    /// parent maximizes during selection.
    #[default]
    Negamax,
    /// Add the same value to every node on the path.
    SameSign,
}

/// Configuration for one tree search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Root visits to reach before a move is chosen.
    pub simulations: u32,

    /// Exploration constant in the PUCT formula.
    pub c_puct: f32,

    /// Mean action value assumed for unvisited nodes (first-play urgency).
    pub fpu: f32,

    pub backup: ValueBackup,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            simulations: 10,
            c_puct: 2.0,
            fpu: 0.0,
            backup: ValueBackup::Negamax,
        }
    }
}

impl SearchConfig {
    /// Builder pattern: set number of simulations.
    pub fn with_simulations(mut self, n: u32) -> Self {
        self.simulations = n;
        self
    }

    /// Builder pattern: set the exploration constant.
    pub fn with_c_puct(mut self, c: f32) -> Self {
        self.c_puct = c;
        self
    }

    pub fn with_fpu(mut self, fpu: f32) -> Self {
        self.fpu = fpu;
        self
    }

    pub fn with_backup(mut self, backup: ValueBackup) -> Self {
        self.backup = backup;
        self
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub search: SearchConfig,

    /// Stop after this many plies even if the game is not over. `None` plays
    /// until the game ends.
    pub max_plies: Option<u32>,
}

/// Inference backend used by ONNX Runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Backend {
    #[default]
    Tract,
    Candle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Path to the `.onnx` model.
    pub path: PathBuf,

    /// Where to download the model from when `path` does not exist.
    pub url: Option<String>,

    pub backend: Backend,

    /// Name of the `[B, 21, 8, 8]` input tensor.
    pub input_name: String,

    /// Name of the value output; its first element is the value.
    pub value_output: String,

    /// Name of the policy output, one score per vocabulary move.
    pub policy_output: String,

    /// Pass the value output through `tanh`.
    pub value_tanh: bool,

    /// Move vocabulary file. The generated standard vocabulary is used when
    /// absent.
    pub vocabulary: Option<PathBuf>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("model.onnx"),
            url: None,
            backend: Backend::Tract,
            input_name: "input".to_string(),
            value_output: "value".to_string(),
            policy_output: "policy".to_string(),
            value_tanh: true,
            vocabulary: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub game: GameConfig,
    pub model: ModelConfig,
}

impl EngineConfig {
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json_str(&contents)
    }
}
