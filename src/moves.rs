use std::{
    collections::HashMap,
    fs,
    io::BufRead,
    path::Path,
    sync::LazyLock,
};

use shakmaty::{Role, Square, uci::UciMove};

use crate::error::EngineError;

/// Ordered global move list the evaluator's policy output is aligned to.
///
/// Moves are stored from the canonical point of view where the side to move
/// plays up the board. The lookup table is built once when the vocabulary
/// is constructed and never recomputed.
#[derive(Debug, Clone)]
pub struct MoveVocabulary {
    moves: Vec<UciMove>,
    index: HashMap<UciMove, usize>,
}

/// Vocabulary generated from move geometry, used when no vocabulary file is
/// supplied.
///
/// This map is lazily initialized on first access.
pub static STANDARD_MOVES: LazyLock<MoveVocabulary> = LazyLock::new(MoveVocabulary::standard);

const KNIGHT_JUMPS: [(i32, i32); 8] = [
    (1, 2),
    (2, 1),
    (2, -1),
    (1, -2),
    (-1, -2),
    (-2, -1),
    (-2, 1),
    (-1, 2),
];

const PROMOTION_ROLES: [Role; 4] = [Role::Queen, Role::Rook, Role::Bishop, Role::Knight];

impl MoveVocabulary {
    /// Build a vocabulary from moves in output-slot order.
    pub fn from_moves(moves: Vec<UciMove>) -> Result<Self, EngineError> {
        let mut index = HashMap::with_capacity(moves.len());
        for (slot, uci) in moves.iter().enumerate() {
            if index.insert(uci.clone(), slot).is_some() {
                return Err(EngineError::InvalidVocabulary {
                    line: slot + 1,
                    reason: format!("duplicate move {uci}"),
                });
            }
        }
        Ok(Self { moves, index })
    }

    /// Read one UCI move per line. Blank lines are ignored.
    pub fn from_reader(reader: impl BufRead) -> Result<Self, EngineError> {
        let mut moves = Vec::new();
        for (i, line) in reader.lines().enumerate() {
            let line = line?;
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let uci = trimmed
                .parse::<UciMove>()
                .map_err(|e| EngineError::InvalidVocabulary {
                    line: i + 1,
                    reason: e.to_string(),
                })?;
            moves.push(uci);
        }
        Self::from_moves(moves)
    }

    /// Parse a JSON object mapping UCI strings to output indices.
    ///
    /// Indices must cover `0..len` exactly once.
    pub fn from_json_str(json: &str) -> Result<Self, EngineError> {
        let parsed: HashMap<String, usize> = serde_json::from_str(json)?;
        let mut slots: Vec<Option<UciMove>> = vec![None; parsed.len()];
        for (uci_str, idx) in parsed {
            let uci = uci_str
                .parse::<UciMove>()
                .map_err(|e| EngineError::InvalidVocabulary {
                    line: idx,
                    reason: e.to_string(),
                })?;
            let slot = slots
                .get_mut(idx)
                .ok_or_else(|| EngineError::InvalidVocabulary {
                    line: idx,
                    reason: format!("index out of range for {uci_str}"),
                })?;
            if slot.replace(uci).is_some() {
                return Err(EngineError::InvalidVocabulary {
                    line: idx,
                    reason: "index used twice".to_string(),
                });
            }
        }
        // Every slot is filled: there are as many entries as slots and no
        // index was reused.
        let moves = slots.into_iter().flatten().collect();
        Self::from_moves(moves)
    }

    /// Load a vocabulary file. `.json` files are read as an index map,
    /// anything else as a move list.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, EngineError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let vocabulary = if path.extension().is_some_and(|ext| ext == "json") {
            Self::from_json_str(&contents)?
        } else {
            Self::from_reader(contents.as_bytes())?
        };
        log::info!(
            "loaded move vocabulary of {} moves from {}",
            vocabulary.len(),
            path.display()
        );
        Ok(vocabulary)
    }

    /// Every queen-line and knight move between two squares, followed by the
    /// promotions from the seventh to the eighth rank. 1880 moves in total.
    pub fn standard() -> Self {
        let mut moves = Vec::with_capacity(1880);
        for from in Square::ALL {
            let (file, rank) = (from.file() as i32, from.rank() as i32);
            let targets = Square::ALL
                .into_iter()
                .filter(|&to| {
                    let (df, dr) = (to.file() as i32 - file, to.rank() as i32 - rank);
                    let queen_line = (df, dr) != (0, 0)
                        && (df == 0 || dr == 0 || df.abs() == dr.abs());
                    queen_line || KNIGHT_JUMPS.contains(&(df, dr))
                });
            moves.extend(targets.map(|to| UciMove::Normal {
                from,
                to,
                promotion: None,
            }));
        }
        for from in Square::ALL.into_iter().filter(|sq| sq.rank() as u32 == 6) {
            let file = from.file() as i32;
            for to in Square::ALL
                .into_iter()
                .filter(|sq| sq.rank() as u32 == 7 && (sq.file() as i32 - file).abs() <= 1)
            {
                for role in PROMOTION_ROLES {
                    moves.push(UciMove::Normal {
                        from,
                        to,
                        promotion: Some(role),
                    });
                }
            }
        }
        Self::from_moves(moves).expect("generated vocabulary has no duplicates")
    }

    /// Output slot for a canonical move.
    pub fn index_of(&self, uci: &UciMove) -> Option<usize> {
        self.index.get(uci).copied()
    }

    pub fn get(&self, slot: usize) -> Option<&UciMove> {
        self.moves.get(slot)
    }

    pub fn len(&self) -> usize {
        self.moves.len()
    }

    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &UciMove> {
        self.moves.iter()
    }
}

/// Rank transform `r -> 9 - r` on both squares of a move. Converts between
/// the canonical orientation and absolute coordinates for the second player.
pub fn flip_ranks(uci: &UciMove) -> UciMove {
    uci.to_mirrored()
}
