//! Continuation data model

use crate::explorer::Opening;
use crate::position::Position;

/// A candidate reply from a position, with aggregate historical outcome
/// statistics and opening classification.
#[derive(Debug, Clone, PartialEq)]
pub struct Continuation {
    /// The reply in standard algebraic notation.
    pub san: String,
    /// Position after playing the reply.
    pub position: Position,
    /// White wins among recorded games continuing this way.
    pub white: u64,
    /// Draws among recorded games continuing this way.
    pub draws: u64,
    /// Black wins among recorded games continuing this way.
    pub black: u64,
    /// Opening classification of the resulting position, when known.
    pub opening: Option<Opening>,
    /// White-positive evaluation of the resulting position; populated
    /// only for continuations flagged as traps.
    pub trap_eval: Option<f64>,
}

impl Continuation {
    /// Total recorded games for this reply.
    pub fn total_games(&self) -> u64 {
        self.white + self.draws + self.black
    }

    /// Opening name of the resulting position, or a placeholder when
    /// classification is missing.
    pub fn opening_name(&self) -> &str {
        self.opening
            .as_ref()
            .map(|opening| opening.name.as_str())
            .unwrap_or("Unknown Opening")
    }

    /// ECO code of the resulting opening, when known.
    pub fn opening_code(&self) -> Option<&str> {
        self.opening.as_ref().map(|opening| opening.eco.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_opening_helpers_fall_back_when_unclassified() {
        let continuation = Continuation {
            san: "e4".to_string(),
            position: Position::startpos().apply_san("e4").unwrap(),
            white: 3,
            draws: 2,
            black: 1,
            opening: None,
            trap_eval: None,
        };

        assert_eq!(continuation.total_games(), 6);
        assert_eq!(continuation.opening_name(), "Unknown Opening");
        assert_eq!(continuation.opening_code(), None);
    }
}
