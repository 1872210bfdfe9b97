//! Engine process management and evaluation

mod channel;
mod score;

pub use channel::{Analysis, EngineChannel, EngineConfig, SearchLimit, DEFAULT_SEARCH_DEPTH};
pub use score::{Score, MATE_SCORE};

use async_trait::async_trait;

use crate::error::Result;
use crate::position::Position;

/// Anything that can evaluate a position.
///
/// Implemented by [`EngineChannel`]; classification code depends on this
/// seam so it can run against scripted evaluators in tests.
#[async_trait]
pub trait Evaluator: Send + Sync {
    /// White-positive evaluation of a position, in pawn units.
    async fn evaluate(&self, position: &Position) -> Result<f64>;
}
