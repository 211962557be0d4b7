//! PUCT Monte Carlo tree search for chess, guided by a policy/value network.
//!
//! Positions are encoded into a `[21, 8, 8]` plane stack from the side to
//! move's point of view and handed to an [`Evaluator`], which returns a value
//! and one score per entry of a fixed move vocabulary. The scores are
//! restricted to the legal moves, turned into priors and used to grow a
//! search [`Tree`]. [`play_game`] runs one fresh search per ply and plays the
//! most visited move.
//!
//! [`OnnxEvaluator`] runs an ONNX model through ONNX Runtime with a pure Rust
//! backend; [`UniformEvaluator`] or any closure can stand in for it.
//!
//! The library re‑exports `shakmaty` to make position construction easy.

mod config;
mod error;
mod evaluator;
mod game;
mod moves;
mod node;
mod onnx;
mod policy;
mod position;
mod tensor;
mod tree;
mod types;

/// Search, game and model settings.
pub use config::{Backend, EngineConfig, GameConfig, ModelConfig, SearchConfig, ValueBackup};

/// Error type produced by library operations.
pub use error::EngineError;

pub use evaluator::{Evaluator, UniformEvaluator, evaluate_position};
pub use game::{GameRecord, PlyRecord, play_game, search_ply};
pub use moves::{MoveVocabulary, STANDARD_MOVES, flip_ranks};
pub use node::{Node, NodeId};
pub use onnx::{OnnxEvaluator, download_model};
pub use policy::map_policy;
pub use position::{CastlingRights, GameResult, GameState};
pub use tensor::{EncodedPosition, PLANES, encode};
pub use tree::{Tree, TreeStats};

/// Output data structures returned by evaluations.
pub use types::{EvaluationResult, MoveProbability, RawEvaluation};

/// Re-export of `shakmaty` for convenience when building positions.
pub use shakmaty;
