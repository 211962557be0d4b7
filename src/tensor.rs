use ndarray::{Array3, Array4, ArrayViewMut2, Axis};
use shakmaty::{Color, Position, Role, Square};

use crate::position::GameState;

/// Number of feature planes in an encoded position.
pub const PLANES: usize = 21;

const WHITE_TO_MOVE: usize = 0;
const BLACK_TO_MOVE: usize = 1;
const OWN_CASTLING: usize = 2;
const OPPONENT_CASTLING: usize = 4;
const REPETITIONS: usize = 6;
const HALFMOVE_CLOCK: usize = 7;
const OWN_PIECES: usize = 8;
const OPPONENT_PIECES: usize = 14;
/// Reserved for the en passant square; currently left empty.
pub const EN_PASSANT: usize = 20;

/// Position encoded from the perspective of the side to move.
///
/// `planes` has shape `[21, 8, 8]`, indexed as `[plane, row, file]`. Row 0
/// is the back rank of the side to move, so Black positions are flipped
/// vertically and the evaluator always sees its own pieces moving up the
/// board.
#[derive(Debug, Clone, PartialEq)]
pub struct EncodedPosition {
    pub planes: Array3<f32>,
}

impl EncodedPosition {
    /// Add the leading batch axis expected by the model: `[1, 21, 8, 8]`.
    pub fn to_batch(&self) -> Array4<f32> {
        self.planes.clone().insert_axis(Axis(0))
    }
}

/// Encode `state` into feature planes. Does not modify the position.
pub fn encode(state: &GameState) -> EncodedPosition {
    let mut planes = Array3::<f32>::zeros((PLANES, 8, 8));
    let us = state.turn();
    let them = !us;

    // 1. Side to move, in absolute colours.
    let turn_plane = if us == Color::White {
        WHITE_TO_MOVE
    } else {
        BLACK_TO_MOVE
    };
    planes.index_axis_mut(Axis(0), turn_plane).fill(1.0);

    // 2. Castling rights, queenside then kingside, ours then theirs.
    for (offset, color) in [(OWN_CASTLING, us), (OPPONENT_CASTLING, them)] {
        let rights = state.castling_rights(color);
        for (i, &has_right) in [rights.queenside, rights.kingside].iter().enumerate() {
            planes
                .index_axis_mut(Axis(0), offset + i)
                .fill(has_right as u8 as f32);
        }
    }

    // 3. Repetition count and half-move clock as constant planes.
    planes
        .index_axis_mut(Axis(0), REPETITIONS)
        .fill(state.repetition_count() as f32);
    planes
        .index_axis_mut(Axis(0), HALFMOVE_CLOCK)
        .fill(state.halfmove_clock() as f32);

    // 4. Pieces, ours in 8..13 and theirs in 14..19.
    let flip = us == Color::Black;
    let board = state.position().board();
    for sq in Square::ALL {
        if let Some(piece) = board.piece_at(sq) {
            let base = if piece.color == us {
                OWN_PIECES
            } else {
                OPPONENT_PIECES
            };
            let mut plane = planes.index_axis_mut(Axis(0), base + role_offset(piece.role));
            set_square(&mut plane, sq, flip);
        }
    }

    // 5. The en passant plane stays zero.

    EncodedPosition { planes }
}

fn role_offset(role: Role) -> usize {
    match role {
        Role::Pawn => 0,
        Role::Knight => 1,
        Role::Bishop => 2,
        Role::Rook => 3,
        Role::Queen => 4,
        Role::King => 5,
    }
}

fn set_square(plane: &mut ArrayViewMut2<f32>, sq: Square, flip: bool) {
    let rank = sq.rank() as usize;
    let row = if flip { 7 - rank } else { rank };
    plane[[row, sq.file() as usize]] = 1.0;
}
