//! Evaluator trait for position evaluation.
//!
//! An evaluator maps an encoded position to a value estimate and raw policy
//! scores over the global move vocabulary. The search treats it as a
//! blocking call; any error it returns aborts the current ply.

use crate::{
    error::EngineError,
    moves::MoveVocabulary,
    policy::map_policy,
    position::GameState,
    tensor::{EncodedPosition, encode},
    types::{EvaluationResult, RawEvaluation},
};

pub trait Evaluator {
    /// Evaluate one encoded position.
    ///
    /// The returned policy must have one entry per vocabulary slot. The value
    /// is from the point of view of the side to move.
    fn evaluate(&mut self, position: &EncodedPosition) -> Result<RawEvaluation, EngineError>;
}

impl<F> Evaluator for F
where
    F: FnMut(&EncodedPosition) -> Result<RawEvaluation, EngineError>,
{
    fn evaluate(&mut self, position: &EncodedPosition) -> Result<RawEvaluation, EngineError> {
        self(position)
    }
}

/// Encode `state`, evaluate it and restrict the policy to its legal moves.
pub fn evaluate_position<E: Evaluator + ?Sized>(
    evaluator: &mut E,
    state: &GameState,
    vocabulary: &MoveVocabulary,
) -> Result<EvaluationResult, EngineError> {
    let raw = evaluator.evaluate(&encode(state))?;
    let policy = map_policy(&raw.policy, state, state.ply(), vocabulary)?;
    Ok(EvaluationResult {
        policy,
        value: raw.value,
    })
}

/// Evaluator with flat policy scores and a neutral value.
///
/// After the legal-move softmax every legal move gets the same prior.
/// Useful for testing the search without a model.
#[derive(Debug, Clone)]
pub struct UniformEvaluator {
    policy_len: usize,
}

impl UniformEvaluator {
    pub fn new(policy_len: usize) -> Self {
        Self { policy_len }
    }
}

impl Evaluator for UniformEvaluator {
    fn evaluate(&mut self, _position: &EncodedPosition) -> Result<RawEvaluation, EngineError> {
        Ok(RawEvaluation {
            value: 0.0,
            policy: vec![0.0; self.policy_len],
        })
    }
}
