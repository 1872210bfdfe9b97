//! Chess Scout Core Library

pub mod book;
pub mod engine;
pub mod error;
pub mod explorer;
pub mod position;

pub use book::{Continuation, ContinuationEnricher, TrapClassifier, DEFAULT_TRAP_THRESHOLD};
pub use engine::{Analysis, EngineChannel, EngineConfig, Evaluator, SearchLimit};
pub use error::{Error, Result};
pub use explorer::{ExplorerClient, LookupParams, OpeningStats, RatingBand};
pub use position::Position;

/// Outcome of scanning one position's book continuations for traps.
#[derive(Debug)]
pub struct BookScan {
    /// Every continuation the statistics source reported, in its order.
    pub continuations: Vec<Continuation>,
    /// The subset flagged as traps, annotated with their evaluations.
    pub traps: Vec<Continuation>,
}

/// Runs the full pipeline for one position: enrich continuations from
/// the opening statistics source, then flag traps against the engine's
/// evaluations.
pub async fn scan_book<S, E>(
    enricher: &ContinuationEnricher<S>,
    classifier: &TrapClassifier<E>,
    position: &Position,
    rating: Option<RatingBand>,
) -> Result<BookScan>
where
    S: OpeningStats,
    E: Evaluator,
{
    let continuations = enricher.enrich(position, rating).await;
    let traps = classifier.classify(position, &continuations).await?;
    Ok(BookScan {
        continuations,
        traps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::explorer::{ExplorerMove, ExplorerResponse};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct CannedStats {
        base_fen: String,
        moves: Vec<ExplorerMove>,
    }

    #[async_trait]
    impl OpeningStats for CannedStats {
        async fn lookup(
            &self,
            position: &Position,
            _params: &LookupParams,
        ) -> Result<ExplorerResponse> {
            if position.fen() == self.base_fen {
                Ok(ExplorerResponse {
                    white: 0,
                    draws: 0,
                    black: 0,
                    moves: self.moves.clone(),
                    opening: None,
                })
            } else {
                Err(Error::Explorer("unclassified".into()))
            }
        }
    }

    struct CannedEvals(HashMap<String, f64>);

    #[async_trait]
    impl Evaluator for CannedEvals {
        async fn evaluate(&self, position: &Position) -> Result<f64> {
            self.0
                .get(position.fen())
                .copied()
                .ok_or_else(|| Error::EngineUnavailable("no canned evaluation".into()))
        }
    }

    fn reply(uci: &str, san: &str) -> ExplorerMove {
        ExplorerMove {
            uci: uci.to_string(),
            san: san.to_string(),
            average_rating: None,
            white: 1,
            draws: 0,
            black: 0,
        }
    }

    #[tokio::test]
    async fn test_scan_book_enriches_then_flags_traps() {
        let base = Position::startpos();
        let e4 = base.apply_san("e4").unwrap();
        let g4 = base.apply_san("g4").unwrap();

        let stats = CannedStats {
            base_fen: base.fen().to_string(),
            moves: vec![reply("e2e4", "e4"), reply("g2g4", "g4")],
        };
        let evals = CannedEvals(HashMap::from([
            (base.fen().to_string(), 0.3),
            (e4.fen().to_string(), 0.5),
            (g4.fen().to_string(), -2.5),
        ]));

        let enricher = ContinuationEnricher::new(stats);
        let classifier = TrapClassifier::new(evals);
        let scan = scan_book(&enricher, &classifier, &base, None)
            .await
            .unwrap();

        assert_eq!(scan.continuations.len(), 2);
        assert_eq!(scan.continuations[0].san, "e4");
        assert_eq!(scan.continuations[1].san, "g4");
        assert_eq!(scan.traps.len(), 1);
        assert_eq!(scan.traps[0].san, "g4");
        assert_eq!(scan.traps[0].trap_eval, Some(-2.5));
    }
}
