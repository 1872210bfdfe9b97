//! Trap classification over engine evaluations

use shakmaty::Color;
use tracing::debug;

use super::types::Continuation;
use crate::engine::Evaluator;
use crate::error::Result;
use crate::position::Position;

/// Evaluation swing (in pawns) a continuation must lose for its mover to
/// be flagged as a trap.
pub const DEFAULT_TRAP_THRESHOLD: f64 = 2.0;

/// Flags continuations whose evaluation swings sharply against the side
/// playing them.
pub struct TrapClassifier<E> {
    engine: E,
    threshold: f64,
}

impl<E: Evaluator> TrapClassifier<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            threshold: DEFAULT_TRAP_THRESHOLD,
        }
    }

    /// Overrides the default swing threshold.
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    /// Evaluates the baseline position and every continuation's resulting
    /// position, returning the continuations whose evaluation swings
    /// against the mover by more than the threshold, each annotated with
    /// its own evaluation.
    ///
    /// Evaluations run sequentially on the underlying engine; a failed
    /// evaluation aborts the classification.
    pub async fn classify(
        &self,
        baseline: &Position,
        continuations: &[Continuation],
    ) -> Result<Vec<Continuation>> {
        if continuations.is_empty() {
            return Ok(Vec::new());
        }

        let baseline_eval = self.engine.evaluate(baseline).await?;
        let mover = baseline.turn();
        let mut traps = Vec::new();

        for continuation in continuations {
            let eval = self.engine.evaluate(&continuation.position).await?;
            let delta = eval - baseline_eval;
            // Downward swings hurt White; upward swings hurt Black.
            let against_mover = match mover {
                Color::White => delta < -self.threshold,
                Color::Black => delta > self.threshold,
            };
            if against_mover {
                debug!(san = %continuation.san, eval, delta, "trap flagged");
                let mut flagged = continuation.clone();
                flagged.trap_eval = Some(eval);
                traps.push(flagged);
            }
        }

        Ok(traps)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    struct ScriptedEvaluator {
        evals: HashMap<String, f64>,
        calls: Arc<Mutex<Vec<String>>>,
    }

    #[async_trait]
    impl Evaluator for ScriptedEvaluator {
        async fn evaluate(&self, position: &Position) -> Result<f64> {
            self.calls.lock().unwrap().push(position.fen().to_string());
            self.evals
                .get(position.fen())
                .copied()
                .ok_or_else(|| Error::EngineUnavailable("no scripted evaluation".into()))
        }
    }

    fn continuation(san: &str, position: Position) -> Continuation {
        Continuation {
            san: san.to_string(),
            position,
            white: 1,
            draws: 0,
            black: 0,
            opening: None,
            trap_eval: None,
        }
    }

    fn scripted(evals: Vec<(&Position, f64)>) -> (ScriptedEvaluator, Arc<Mutex<Vec<String>>>) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let evaluator = ScriptedEvaluator {
            evals: evals
                .into_iter()
                .map(|(position, eval)| (position.fen().to_string(), eval))
                .collect(),
            calls: calls.clone(),
        };
        (evaluator, calls)
    }

    #[tokio::test]
    async fn test_white_mover_flags_only_big_downswings() {
        let base = Position::startpos();
        let solid = base.apply_san("e4").unwrap();
        let losing = base.apply_san("g4").unwrap();
        let (evaluator, calls) =
            scripted(vec![(&base, 0.3), (&solid, 0.5), (&losing, -2.5)]);

        let continuations = vec![
            continuation("e4", solid.clone()),
            continuation("g4", losing.clone()),
        ];
        let traps = TrapClassifier::new(evaluator)
            .classify(&base, &continuations)
            .await
            .unwrap();

        assert_eq!(traps.len(), 1);
        assert_eq!(traps[0].san, "g4");
        assert_eq!(traps[0].trap_eval, Some(-2.5));

        // Baseline first, then candidates in source order.
        let seen = calls.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                base.fen().to_string(),
                solid.fen().to_string(),
                losing.fen().to_string()
            ]
        );
    }

    #[tokio::test]
    async fn test_black_mover_flags_only_big_upswings() {
        let base = Position::startpos().apply_san("e4").unwrap();
        let solid = base.apply_san("e5").unwrap();
        let losing = base.apply_san("f5").unwrap();
        let promising = base.apply_san("c5").unwrap();
        let (evaluator, _calls) = scripted(vec![
            (&base, 0.3),
            (&solid, 0.2),
            (&losing, 3.4),
            (&promising, -2.9),
        ]);

        let continuations = vec![
            continuation("e5", solid),
            continuation("f5", losing),
            // A swing in Black's favor is not a trap for Black.
            continuation("c5", promising),
        ];
        let traps = TrapClassifier::new(evaluator)
            .classify(&base, &continuations)
            .await
            .unwrap();

        assert_eq!(traps.len(), 1);
        assert_eq!(traps[0].san, "f5");
        assert_eq!(traps[0].trap_eval, Some(3.4));
    }

    #[tokio::test]
    async fn test_swing_exactly_at_threshold_is_not_flagged() {
        let base = Position::startpos();
        let at_threshold = base.apply_san("e4").unwrap();
        let past_threshold = base.apply_san("d4").unwrap();
        let (evaluator, _calls) = scripted(vec![
            (&base, 0.5),
            (&at_threshold, -1.5),
            (&past_threshold, -1.51),
        ]);

        let continuations = vec![
            continuation("e4", at_threshold),
            continuation("d4", past_threshold),
        ];
        let traps = TrapClassifier::new(evaluator)
            .classify(&base, &continuations)
            .await
            .unwrap();

        assert_eq!(traps.len(), 1);
        assert_eq!(traps[0].san, "d4");
    }

    #[tokio::test]
    async fn test_no_continuations_means_no_engine_calls() {
        let base = Position::startpos();
        let (evaluator, calls) = scripted(vec![(&base, 0.3)]);

        let traps = TrapClassifier::new(evaluator)
            .classify(&base, &[])
            .await
            .unwrap();

        assert!(traps.is_empty());
        assert!(calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_custom_threshold_tightens_the_flagging() {
        let base = Position::startpos();
        let slightly_worse = base.apply_san("e4").unwrap();
        let (evaluator, _calls) = scripted(vec![(&base, 0.3), (&slightly_worse, -0.4)]);

        let continuations = vec![continuation("e4", slightly_worse)];
        let traps = TrapClassifier::new(evaluator)
            .with_threshold(0.5)
            .classify(&base, &continuations)
            .await
            .unwrap();

        assert_eq!(traps.len(), 1);
        assert_eq!(traps[0].trap_eval, Some(-0.4));
    }

    #[tokio::test]
    async fn test_failed_evaluation_aborts_classification() {
        let base = Position::startpos();
        let unknown = base.apply_san("e4").unwrap();
        let (evaluator, _calls) = scripted(vec![(&base, 0.3)]);

        let continuations = vec![continuation("e4", unknown)];
        let result = TrapClassifier::new(evaluator)
            .classify(&base, &continuations)
            .await;

        assert!(matches!(result, Err(Error::EngineUnavailable(_))));
    }
}
