//! Continuation enrichment from opening statistics

use futures::stream::{self, StreamExt};
use tracing::{error, warn};

use super::types::Continuation;
use crate::error::Result;
use crate::explorer::{ExplorerMove, LookupParams, OpeningStats, RatingBand};
use crate::position::Position;

/// Default bound on concurrent classification lookups.
pub const DEFAULT_ENRICH_CONCURRENCY: usize = 4;

/// Builds enriched continuations for a position from raw explorer
/// statistics.
pub struct ContinuationEnricher<S> {
    stats: S,
    concurrency: usize,
}

impl<S: OpeningStats> ContinuationEnricher<S> {
    pub fn new(stats: S) -> Self {
        Self {
            stats,
            concurrency: DEFAULT_ENRICH_CONCURRENCY,
        }
    }

    /// Caps how many classification lookups run at once.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Fetches candidate replies for a position and enriches each with
    /// its resulting position and opening classification.
    ///
    /// Output order matches the statistics source. Candidates the rules
    /// engine rejects are logged and excluded; a failed statistics fetch
    /// degrades to an empty list.
    pub async fn enrich(
        &self,
        position: &Position,
        rating: Option<RatingBand>,
    ) -> Vec<Continuation> {
        let mut params = LookupParams::new();
        if let Some(band) = rating {
            params = params.rating(band);
        }

        let response = match self.stats.lookup(position, &params).await {
            Ok(response) => response,
            Err(e) => {
                warn!(fen = position.fen(), error = %e, "statistics lookup failed; no continuations");
                return Vec::new();
            }
        };

        let results: Vec<Result<Continuation>> = stream::iter(response.moves)
            .map(|candidate| self.enrich_one(position, candidate, &params))
            .buffered(self.concurrency)
            .collect()
            .await;

        let mut continuations = Vec::with_capacity(results.len());
        for result in results {
            match result {
                Ok(continuation) => continuations.push(continuation),
                Err(e) => error!(fen = position.fen(), error = %e, "skipping continuation"),
            }
        }
        continuations
    }

    async fn enrich_one(
        &self,
        position: &Position,
        candidate: ExplorerMove,
        params: &LookupParams,
    ) -> Result<Continuation> {
        let resulting = position.apply_san(&candidate.san)?;

        let opening = match self.stats.lookup(&resulting, params).await {
            Ok(response) => response.opening,
            Err(e) => {
                warn!(san = %candidate.san, error = %e, "opening classification failed");
                None
            }
        };

        Ok(Continuation {
            san: candidate.san,
            position: resulting,
            white: candidate.white,
            draws: candidate.draws,
            black: candidate.black,
            opening,
            trap_eval: None,
        })
    }
}
