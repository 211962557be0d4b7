use shakmaty::uci::UciMove;

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct MoveProbability {
    #[cfg_attr(feature = "serde", serde(serialize_with = "serialize_uci"))]
    pub uci: UciMove,
    pub probability: f32,
}

/// Evaluator output before it is restricted to the legal moves.
#[derive(Debug, Clone)]
pub struct RawEvaluation {
    /// Value estimate in `[-1, 1]` for the side to move
    pub value: f32,
    /// One score per vocabulary entry, unnormalised
    pub policy: Vec<f32>,
}

#[derive(Debug, Clone)]
pub struct EvaluationResult {
    /// Legal moves in absolute coordinates with their probabilities,
    /// sorted highest to lowest
    pub policy: Vec<MoveProbability>,
    /// Value estimate in `[-1, 1]` for the side to move
    pub value: f32,
}

/// Writes a move in its UCI text form.
#[cfg(feature = "serde")]
pub(crate) fn serialize_uci<S: serde::Serializer>(uci: &UciMove, s: S) -> Result<S::Ok, S::Error> {
    s.collect_str(uci)
}
