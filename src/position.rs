//! Reversible game state on top of `shakmaty`.
//!
//! `shakmaty` positions have no undo, so [`GameState`] keeps the previous
//! positions on a stack together with the Zobrist hashes needed for
//! repetition detection.

use shakmaty::{
    CastlingMode, Chess, Color, EnPassantMode, Position, Setup, Square,
    fen::Fen,
    uci::UciMove,
    zobrist::Zobrist64,
};

use crate::error::EngineError;

/// Half-move clock value at which the game is drawn.
const FIFTY_MOVE_PLIES: u32 = 100;

/// Earlier occurrences of the current position that end the game.
const THREEFOLD: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CastlingRights {
    pub queenside: bool,
    pub kingside: bool,
}

/// How a finished game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub enum GameResult {
    WhiteWins,
    BlackWins,
    Draw,
}

#[derive(Debug, Clone)]
pub struct GameState {
    position: Chess,
    /// Positions before each pushed move, most recent last
    undo: Vec<Chess>,
    /// Hashes of every position reached before the current one
    hashes: Vec<Zobrist64>,
    /// Absolute ply count from the start of the game
    ply: u32,
}

impl Default for GameState {
    fn default() -> Self {
        Self::with_ply(Chess::default(), 0)
    }
}

impl GameState {
    /// Start from `position`, deriving the ply from its fullmove number.
    pub fn new(position: Chess) -> Result<Self, EngineError> {
        let fullmoves = position.fullmoves().get();
        let ply = (fullmoves - 1)
            .checked_mul(2)
            .and_then(|ply| ply.checked_add(u32::from(position.turn().is_black())))
            .ok_or(EngineError::MoveNumberOutOfRange(fullmoves))?;
        Ok(Self::with_ply(position, ply))
    }

    fn with_ply(position: Chess, ply: u32) -> Self {
        Self {
            position,
            undo: Vec::new(),
            hashes: Vec::new(),
            ply,
        }
    }

    pub fn from_fen(fen: &str) -> Result<Self, EngineError> {
        let fen: Fen = fen.parse()?;
        let setup: Setup = fen.into_setup();
        let position: Chess = setup.position(CastlingMode::Standard)?;
        Self::new(position)
    }

    pub fn position(&self) -> &Chess {
        &self.position
    }

    /// Legal moves in absolute coordinates, in generation order.
    pub fn legal_moves(&self) -> Vec<UciMove> {
        self.position
            .legal_moves()
            .iter()
            .map(|m| m.to_uci(CastlingMode::Standard))
            .collect()
    }

    pub fn push(&mut self, uci: &UciMove) -> Result<(), EngineError> {
        let m = uci.to_move(&self.position)?;
        let ply = self
            .ply
            .checked_add(1)
            .ok_or(EngineError::MoveNumberOutOfRange(self.position.fullmoves().get()))?;
        let hash = self.hash();
        let previous = self.position.clone();
        self.position.play_unchecked(m);
        self.undo.push(previous);
        self.hashes.push(hash);
        self.ply = ply;
        Ok(())
    }

    pub fn pop(&mut self) -> Result<(), EngineError> {
        let previous = self.undo.pop().ok_or(EngineError::EmptyHistory)?;
        self.hashes.pop();
        self.position = previous;
        self.ply -= 1;
        Ok(())
    }

    pub fn turn(&self) -> Color {
        self.position.turn()
    }

    pub fn ply(&self) -> u32 {
        self.ply
    }

    pub fn castling_rights(&self, color: Color) -> CastlingRights {
        let rooks = self.position.castles().castling_rights();
        let (queen_rook, king_rook) = match color {
            Color::White => (Square::A1, Square::H1),
            Color::Black => (Square::A8, Square::H8),
        };
        CastlingRights {
            queenside: rooks.contains(queen_rook),
            kingside: rooks.contains(king_rook),
        }
    }

    /// Earlier occurrences of the current position, capped at 2.
    pub fn repetition_count(&self) -> usize {
        let current = self.hash();
        self.hashes
            .iter()
            .filter(|h| **h == current)
            .count()
            .min(THREEFOLD)
    }

    pub fn halfmove_clock(&self) -> u32 {
        self.position.halfmoves()
    }

    /// Checkmate, stalemate, insufficient material, the fifty-move rule and
    /// threefold repetition all end the game.
    pub fn is_game_over(&self) -> bool {
        self.result().is_some()
    }

    pub fn result(&self) -> Option<GameResult> {
        if self.position.is_checkmate() {
            return Some(match self.turn() {
                Color::White => GameResult::BlackWins,
                Color::Black => GameResult::WhiteWins,
            });
        }
        let drawn = self.position.is_stalemate()
            || self.position.is_insufficient_material()
            || self.halfmove_clock() >= FIFTY_MOVE_PLIES
            || self.repetition_count() >= THREEFOLD;
        drawn.then_some(GameResult::Draw)
    }

    /// Value of a finished game for the side to move: -1 when mated, 0 for
    /// draws.
    pub fn terminal_value(&self) -> Option<f32> {
        self.result().map(|result| match result {
            GameResult::Draw => 0.0,
            _ => -1.0,
        })
    }

    pub fn fen(&self) -> String {
        Fen::from_position(&self.position, EnPassantMode::Legal).to_string()
    }

    fn hash(&self) -> Zobrist64 {
        self.position.zobrist_hash(EnPassantMode::Legal)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uci(s: &str) -> UciMove {
        s.parse().unwrap()
    }

    #[test]
    fn test_start_position() {
        let state = GameState::default();
        assert_eq!(state.legal_moves().len(), 20);
        assert_eq!(state.turn(), Color::White);
        assert_eq!(state.ply(), 0);
        assert!(!state.is_game_over());
        assert_eq!(
            state.castling_rights(Color::Black),
            CastlingRights {
                queenside: true,
                kingside: true
            }
        );
    }

    #[test]
    fn test_ply_from_fen() {
        let state =
            GameState::from_fen("rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1")
                .unwrap();
        assert_eq!(state.ply(), 1);
        let state = GameState::from_fen("8/8/8/8/8/8/8/K6k w - - 0 10").unwrap();
        assert_eq!(state.ply(), 18);
    }

    #[test]
    fn test_huge_move_number_rejected() {
        let err = GameState::from_fen("4k3/8/8/8/8/8/8/4K2R w K - 0 3000000000").unwrap_err();
        assert!(matches!(
            err,
            EngineError::MoveNumberOutOfRange(3_000_000_000)
        ));

        // The largest move number whose ply still fits.
        let mut state = GameState::from_fen("4k3/8/8/8/8/8/8/4K2R b K - 0 2147483648").unwrap();
        assert_eq!(state.ply(), u32::MAX);
        assert!(matches!(
            state.push(&uci("e8d8")),
            Err(EngineError::MoveNumberOutOfRange(_))
        ));
        assert_eq!(state.ply(), u32::MAX);
    }

    #[test]
    fn test_push_pop_restores_state() {
        let mut state = GameState::default();
        let fen = state.fen();
        state.push(&uci("e2e4")).unwrap();
        state.push(&uci("e7e5")).unwrap();
        assert_eq!(state.ply(), 2);
        assert_eq!(state.turn(), Color::White);
        state.pop().unwrap();
        state.pop().unwrap();
        assert_eq!(state.fen(), fen);
        assert_eq!(state.ply(), 0);
        assert!(matches!(state.pop(), Err(EngineError::EmptyHistory)));
    }

    #[test]
    fn test_illegal_move_rejected() {
        let mut state = GameState::default();
        assert!(matches!(
            state.push(&uci("e2e5")),
            Err(EngineError::IllegalMove(_))
        ));
        assert_eq!(state.ply(), 0);
    }

    #[test]
    fn test_castling_rights_after_king_move() {
        let mut state = GameState::default();
        for m in ["e2e4", "e7e5", "e1e2"] {
            state.push(&uci(m)).unwrap();
        }
        assert_eq!(
            state.castling_rights(Color::White),
            CastlingRights {
                queenside: false,
                kingside: false
            }
        );
        assert!(state.castling_rights(Color::Black).kingside);
    }

    #[test]
    fn test_repetition_draw() {
        let mut state = GameState::default();
        let shuffle = ["g1f3", "g8f6", "f3g1", "f6g8"];
        for m in shuffle {
            state.push(&uci(m)).unwrap();
        }
        assert_eq!(state.repetition_count(), 1);
        assert!(!state.is_game_over());
        for m in shuffle {
            state.push(&uci(m)).unwrap();
        }
        assert_eq!(state.repetition_count(), 2);
        assert_eq!(state.result(), Some(GameResult::Draw));
        assert_eq!(state.terminal_value(), Some(0.0));

        state.pop().unwrap();
        assert!(!state.is_game_over());
    }

    #[test]
    fn test_checkmate_result() {
        // Fool's mate.
        let mut state = GameState::default();
        for m in ["f2f3", "e7e5", "g2g4", "d8h4"] {
            state.push(&uci(m)).unwrap();
        }
        assert!(state.is_game_over());
        assert_eq!(state.result(), Some(GameResult::BlackWins));
        assert_eq!(state.terminal_value(), Some(-1.0));
        assert!(state.legal_moves().is_empty());
    }

    #[test]
    fn test_fifty_move_rule() {
        let state = GameState::from_fen("8/8/8/4k3/8/8/3QK3/8 w - - 100 80").unwrap();
        assert_eq!(state.halfmove_clock(), 100);
        assert_eq!(state.result(), Some(GameResult::Draw));
    }
}
