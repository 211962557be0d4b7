//! Error types for the search engine.
//!
//! A single enumeration covers failures from ONNX Runtime, chess parsing,
//! tensor shapes and the search itself. Every variant is fatal for the ply
//! in which it occurs; the engine has no degraded fallback.

use shakmaty::uci::UciMove;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Wraps an error returned by the underlying ONNX Runtime bindings.
    #[error("ONNX Runtime error: {0}")]
    OrtError(#[from] ort::Error),

    /// The provided FEN string could not be parsed.
    #[error("Invalid FEN: {0}")]
    InvalidFen(#[from] shakmaty::fen::ParseFenError),

    /// A parsed position is invalid from the perspective of `shakmaty`.
    #[error("Invalid Chess Position: {0}")]
    InvalidPosition(#[from] shakmaty::PositionError<shakmaty::Chess>),

    /// A move could not be applied to the current position.
    #[error("Illegal move: {0}")]
    IllegalMove(#[from] shakmaty::uci::IllegalUciMoveError),

    /// Occurs when an ndarray has an unexpected shape during tensor
    /// preparation or extraction.
    #[error("Tensor shape error: {0}")]
    ShapeError(#[from] ndarray::ShapeError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A legal move has no slot in the evaluator's move vocabulary.
    #[error("Move {0} is not part of the move vocabulary")]
    UnknownMove(UciMove),

    #[error("Policy has {actual} entries but the vocabulary has {expected}")]
    PolicyLength { expected: usize, actual: usize },

    #[error("Invalid move vocabulary at entry {line}: {reason}")]
    InvalidVocabulary { line: usize, reason: String },

    /// The ply parity handed to the policy mapper names the other side.
    #[error("Ply {ply} does not match the side to move")]
    OrientationMismatch { ply: u32 },

    #[error("Node {0} is already expanded")]
    AlreadyExpanded(u32),

    #[error("Node {0} is terminal and cannot be expanded")]
    TerminalExpansion(u32),

    #[error("Node {0} has no evaluation to backpropagate")]
    NotEvaluated(u32),

    /// The position reports an ongoing game but no legal moves.
    #[error("No legal moves in a non-terminal position")]
    NoLegalMoves,

    #[error("Root node has no children to choose from")]
    RootNotExpanded,

    /// The fullmove number of a position is too large to count plies.
    #[error("Move number {0} is out of range")]
    MoveNumberOutOfRange(u32),

    #[error("No move to undo")]
    EmptyHistory,

    #[error("Model output '{0}' is missing")]
    MissingOutput(String),

    #[error("Failed to download model: {0}")]
    Download(String),
}
