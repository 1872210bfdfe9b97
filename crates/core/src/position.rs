//! Immutable board snapshots backed by the rules engine

use shakmaty::fen::Fen;
use shakmaty::san::San;
use shakmaty::uci::UciMove;
use shakmaty::{CastlingMode, Chess, Color, EnPassantMode, Position as _};

use crate::error::{Error, Result};

/// An immutable snapshot of a board position plus side to move.
///
/// Wraps the rules engine's game state together with its FEN encoding.
/// Equality is by the FEN text.
#[derive(Debug, Clone)]
pub struct Position {
    state: Chess,
    fen: String,
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.fen == other.fen
    }
}

impl Eq for Position {}

impl Position {
    /// The standard starting position.
    pub fn startpos() -> Self {
        Self::from_state(Chess::default())
    }

    /// Parses a FEN string into a position.
    pub fn from_fen(fen: &str) -> Result<Self> {
        let parsed: Fen = fen
            .parse()
            .map_err(|e| Error::Fen(format!("{}: {}", fen, e)))?;
        let state = parsed
            .into_position(CastlingMode::Standard)
            .map_err(|e| Error::Fen(format!("{}: {}", fen, e)))?;
        Ok(Self::from_state(state))
    }

    fn from_state(state: Chess) -> Self {
        let fen = Fen::from_position(&state, EnPassantMode::Legal).to_string();
        Self { state, fen }
    }

    /// FEN encoding of this position.
    pub fn fen(&self) -> &str {
        &self.fen
    }

    /// The side to move.
    pub fn turn(&self) -> Color {
        self.state.turn()
    }

    /// True when the game is over in this position (no legal moves, or
    /// neither side has mating material).
    pub fn is_terminal(&self) -> bool {
        self.state.is_game_over()
    }

    /// Applies a move in standard algebraic notation, returning the
    /// resulting position.
    pub fn apply_san(&self, notation: &str) -> Result<Self> {
        let san: San = notation.parse().map_err(|e| {
            Error::IllegalContinuation(format!("unreadable move '{}': {}", notation, e))
        })?;
        let mv = san.to_move(&self.state).map_err(|e| {
            Error::IllegalContinuation(format!(
                "move '{}' not playable from {}: {}",
                notation, self.fen, e
            ))
        })?;
        self.play(mv, notation)
    }

    /// Applies a move in UCI coordinate notation, the form the engine
    /// reports its chosen move in.
    pub fn apply_uci(&self, notation: &str) -> Result<Self> {
        let uci: UciMove = notation.parse().map_err(|e| {
            Error::IllegalContinuation(format!("unreadable move '{}': {}", notation, e))
        })?;
        let mv = uci.to_move(&self.state).map_err(|e| {
            Error::IllegalContinuation(format!(
                "move '{}' not playable from {}: {}",
                notation, self.fen, e
            ))
        })?;
        self.play(mv, notation)
    }

    fn play(&self, mv: shakmaty::Move, notation: &str) -> Result<Self> {
        let state = self.state.clone().play(mv).map_err(|e| {
            Error::IllegalContinuation(format!(
                "move '{}' not playable from {}: {}",
                notation, self.fen, e
            ))
        })?;
        Ok(Self::from_state(state))
    }
}
