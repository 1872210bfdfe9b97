//! Raw engine scores and their normalized form

use std::fmt;

use shakmaty::Color;

/// Sentinel magnitude for forced-mate scores, in pawn units.
pub const MATE_SCORE: f64 = 100.0;

/// A raw score reported by the engine, relative to the side to move.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Score {
    /// Centipawn advantage for the side to move.
    Centipawns(i32),
    /// Forced mate in the given number of moves. Zero or negative means
    /// the side to move is the one getting mated.
    Mate(i32),
}

impl Score {
    /// Pawn-unit value from the searched side's own perspective. Mate
    /// scores collapse to the ±[`MATE_SCORE`] sentinel regardless of
    /// distance.
    pub fn as_pawns(&self) -> f64 {
        match self {
            Score::Centipawns(cp) => f64::from(*cp) / 100.0,
            Score::Mate(moves) => {
                if *moves > 0 {
                    MATE_SCORE
                } else {
                    -MATE_SCORE
                }
            }
        }
    }

    /// Pawn-unit value from White's perspective: positive favors White
    /// no matter who is to move. The engine reports scores relative to
    /// the side to move, so Black-to-move values flip sign.
    pub fn white_pov(&self, side_to_move: Color) -> f64 {
        match side_to_move {
            Color::White => self.as_pawns(),
            Color::Black => -self.as_pawns(),
        }
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Score::Centipawns(cp) => {
                let pawns = f64::from(*cp) / 100.0;
                if pawns >= 0.0 {
                    write!(f, "+{:.2}", pawns)
                } else {
                    write!(f, "{:.2}", pawns)
                }
            }
            Score::Mate(moves) => write!(f, "M{}", moves),
        }
    }
}
