//! Opening statistics from the Lichess explorer

mod client;
mod types;

pub use client::{Database, ExplorerClient};
pub use types::{ExplorerMove, ExplorerResponse, LookupParams, Opening, RatingBand};

use async_trait::async_trait;

use crate::error::Result;
use crate::position::Position;

/// Source of opening statistics for positions.
///
/// Implemented by [`ExplorerClient`]; enrichment depends on this seam so
/// it can run against stubbed statistics in tests.
#[async_trait]
pub trait OpeningStats: Send + Sync {
    /// Candidate replies and opening classification for a position.
    async fn lookup(&self, position: &Position, params: &LookupParams)
        -> Result<ExplorerResponse>;
}
