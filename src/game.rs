//! Game driver: one fresh search per ply until the game ends.

use shakmaty::uci::UciMove;

use crate::{
    config::{GameConfig, SearchConfig},
    error::EngineError,
    evaluator::Evaluator,
    moves::MoveVocabulary,
    position::{GameResult, GameState},
    tree::Tree,
    types::MoveProbability,
};

/// Summary of the search that chose one move.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct PlyRecord {
    /// Absolute ply the move was played at
    pub ply: u32,
    #[cfg_attr(feature = "serde", serde(serialize_with = "crate::types::serialize_uci"))]
    pub mv: UciMove,
    pub root_visits: u32,
    /// Search value for the side that played the move
    pub root_value: f32,
    pub nodes: usize,
    /// Root visit distribution, in child order
    pub visits: Vec<MoveProbability>,
}

#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct GameRecord {
    pub start_fen: String,
    pub plies: Vec<PlyRecord>,
    pub final_fen: String,
    /// `None` when play stopped at the ply limit
    pub result: Option<GameResult>,
}

impl GameRecord {
    pub fn moves(&self) -> impl Iterator<Item = &UciMove> {
        self.plies.iter().map(|p| &p.mv)
    }
}

/// Search the current position of `state` and return the chosen move with
/// its statistics. `state` is left unchanged.
pub fn search_ply<E: Evaluator>(
    state: &mut GameState,
    evaluator: &mut E,
    vocabulary: &MoveVocabulary,
    config: &SearchConfig,
) -> Result<PlyRecord, EngineError> {
    let ply = state.ply();
    let mut tree = Tree::new(state, evaluator, vocabulary, config.clone());
    tree.run()?;

    let mv = tree.choose_move()?;
    let stats = tree.stats();
    Ok(PlyRecord {
        ply,
        mv,
        root_visits: stats.root_visits,
        root_value: stats.root_value,
        nodes: stats.total_nodes,
        visits: tree.visit_distribution(),
    })
}

/// Play from the current position of `state` until the game is over or
/// `config.max_plies` moves have been made. The moves stay on `state`.
pub fn play_game<E: Evaluator>(
    state: &mut GameState,
    evaluator: &mut E,
    vocabulary: &MoveVocabulary,
    config: &GameConfig,
) -> Result<GameRecord, EngineError> {
    let start_fen = state.fen();
    log::info!("starting game from {start_fen}");

    let mut plies = Vec::new();
    while !state.is_game_over() {
        if config
            .max_plies
            .is_some_and(|max| plies.len() >= max as usize)
        {
            log::info!("stopping after {} plies", plies.len());
            break;
        }

        let record = search_ply(state, evaluator, vocabulary, &config.search)?;
        state.push(&record.mv)?;
        log::info!(
            "ply {}: {} (visits {}, value {:.3}, nodes {})",
            record.ply,
            record.mv,
            record.root_visits,
            record.root_value,
            record.nodes
        );
        plies.push(record);
    }

    let result = state.result();
    if let Some(result) = result {
        log::info!("game over: {result:?}");
    }
    Ok(GameRecord {
        start_fen,
        plies,
        final_fen: state.fen(),
        result,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        evaluator::UniformEvaluator, moves::STANDARD_MOVES, tensor::EncodedPosition,
        types::RawEvaluation,
    };

    fn game_config(simulations: u32, max_plies: Option<u32>) -> GameConfig {
        GameConfig {
            search: SearchConfig::default().with_simulations(simulations),
            max_plies,
        }
    }

    #[test]
    fn test_single_ply() {
        let mut state = GameState::default();
        let legal = state.legal_moves();
        let mut evaluator = UniformEvaluator::new(STANDARD_MOVES.len());
        let record =
            play_game(&mut state, &mut evaluator, &STANDARD_MOVES, &game_config(10, Some(1)))
                .unwrap();

        assert_eq!(record.plies.len(), 1);
        let ply = &record.plies[0];
        assert_eq!(ply.ply, 0);
        assert_eq!(ply.root_visits, 10);
        assert!(legal.contains(&ply.mv));
        assert_eq!(ply.visits.len(), 20);
        assert_eq!(record.result, None);
        assert_ne!(record.start_fen, record.final_fen);
        assert_eq!(state.ply(), 1);
        assert_eq!(record.final_fen, state.fen());
    }

    #[test]
    fn test_ply_limit() {
        let mut state = GameState::default();
        let mut evaluator = UniformEvaluator::new(STANDARD_MOVES.len());
        let record =
            play_game(&mut state, &mut evaluator, &STANDARD_MOVES, &game_config(8, Some(6)))
                .unwrap();

        assert_eq!(record.plies.len(), 6);
        let plies: Vec<u32> = record.plies.iter().map(|p| p.ply).collect();
        assert_eq!(plies, vec![0, 1, 2, 3, 4, 5]);
        assert_eq!(state.ply(), 6);
        assert_eq!(record.moves().count(), 6);
    }

    #[test]
    fn test_zero_plies() {
        let mut state = GameState::default();
        let mut evaluator = UniformEvaluator::new(STANDARD_MOVES.len());
        let record =
            play_game(&mut state, &mut evaluator, &STANDARD_MOVES, &game_config(8, Some(0)))
                .unwrap();
        assert!(record.plies.is_empty());
        assert_eq!(record.start_fen, record.final_fen);
    }

    #[test]
    fn test_finished_game() {
        let mut state =
            GameState::from_fen("rnb1kbnr/pppp1ppp/8/4p3/6Pq/5P2/PPPPP2P/RNBQKBNR w KQkq - 1 3")
                .unwrap();
        let mut evaluator = UniformEvaluator::new(STANDARD_MOVES.len());
        let record =
            play_game(&mut state, &mut evaluator, &STANDARD_MOVES, &game_config(8, None)).unwrap();
        assert!(record.plies.is_empty());
        assert_eq!(record.result, Some(GameResult::BlackWins));
    }

    #[test]
    fn test_plays_mate_in_one() {
        let mut state = GameState::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1").unwrap();
        let mate: UciMove = "a1a8".parse().unwrap();
        let mate_slot = STANDARD_MOVES.index_of(&mate).unwrap();
        let mut evaluator = |_: &EncodedPosition| -> Result<RawEvaluation, EngineError> {
            let mut policy = vec![0.0; STANDARD_MOVES.len()];
            policy[mate_slot] = 5.0;
            Ok(RawEvaluation { value: 0.9, policy })
        };
        let record =
            play_game(&mut state, &mut evaluator, &STANDARD_MOVES, &game_config(30, None))
                .unwrap();

        assert_eq!(record.moves().collect::<Vec<_>>(), vec![&mate]);
        assert_eq!(record.result, Some(GameResult::WhiteWins));
        assert!(record.plies[0].root_value > 0.0);
    }

    #[test]
    fn test_evaluator_error_aborts_game() {
        let mut state = GameState::default();
        let mut evaluator = UniformEvaluator::new(7);
        let err = play_game(&mut state, &mut evaluator, &STANDARD_MOVES, &game_config(4, None))
            .unwrap_err();
        assert!(matches!(err, EngineError::PolicyLength { actual: 7, .. }));
        assert_eq!(state.ply(), 0);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_record_serializes() {
        let mut state = GameState::default();
        let mut evaluator = UniformEvaluator::new(STANDARD_MOVES.len());
        let record =
            play_game(&mut state, &mut evaluator, &STANDARD_MOVES, &game_config(4, Some(2)))
                .unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["plies"].as_array().unwrap().len(), 2);
        assert_eq!(json["result"], serde_json::Value::Null);
        assert_eq!(json["plies"][0]["mv"], record.plies[0].mv.to_string());
    }
}
