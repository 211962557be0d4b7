//! Restriction of the evaluator's global policy to the legal moves.
//!
//! The evaluator only ever sees the canonical orientation, so the legal moves
//! of a position with the second player to move are first mirrored into that
//! orientation for the vocabulary lookup and then mirrored back with the rank
//! transform `r -> 9 - r` before they are reported.

use shakmaty::Color;

use crate::{
    error::EngineError,
    moves::{MoveVocabulary, flip_ranks},
    position::GameState,
    types::MoveProbability,
};

/// Map raw policy scores to a distribution over the legal moves of `state`.
///
/// `ply` is the absolute ply of `state`; an odd ply means the second player
/// is to move and the canonical moves need the rank transform. The result is
/// sorted by descending probability, keeping move-generation order between
/// equal probabilities, and sums to 1.
pub fn map_policy(
    raw_policy: &[f32],
    state: &GameState,
    ply: u32,
    vocabulary: &MoveVocabulary,
) -> Result<Vec<MoveProbability>, EngineError> {
    if raw_policy.len() != vocabulary.len() {
        return Err(EngineError::PolicyLength {
            expected: vocabulary.len(),
            actual: raw_policy.len(),
        });
    }
    let mirrored = ply % 2 == 1;
    if mirrored != (state.turn() == Color::Black) {
        return Err(EngineError::OrientationMismatch { ply });
    }

    // 1. Look every legal move up in canonical orientation.
    let mut max_logit = f32::NEG_INFINITY;
    let mut move_data = Vec::new();
    for uci in state.legal_moves() {
        let canonical = if mirrored { flip_ranks(&uci) } else { uci };
        let idx = vocabulary
            .index_of(&canonical)
            .ok_or_else(|| EngineError::UnknownMove(canonical.clone()))?;
        let logit = raw_policy[idx];
        if logit > max_logit {
            max_logit = logit;
        }
        move_data.push((canonical, logit));
    }

    // 2. Softmax over the legal moves only.
    let exps: Vec<f32> = move_data
        .iter()
        .map(|&(_, logit)| (logit - max_logit).exp())
        .collect();
    let sum_exp: f32 = exps.iter().sum();

    // 3. Back to absolute coordinates.
    let mut policy: Vec<MoveProbability> = move_data
        .into_iter()
        .zip(exps)
        .map(|((canonical, _), exp)| MoveProbability {
            uci: if mirrored {
                flip_ranks(&canonical)
            } else {
                canonical
            },
            probability: exp / sum_exp,
        })
        .collect();

    policy.sort_by(|a, b| b.probability.total_cmp(&a.probability));
    Ok(policy)
}
