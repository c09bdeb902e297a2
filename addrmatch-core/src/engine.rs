//! # Motor de Similaridade
//!
//! Escolhe a estratégia **uma única vez** na construção e aplica fallback por chamada:
//!
//! ```text
//! select(loader) ──► Ok(extrator) ──► Híbrida ──► score(a, b)
//!                │                         │
//!                │                         └─ Err ─► warn! ─► Baseline (só nesta chamada)
//!                └─► Err ─► warn! ─► Baseline (para sempre)
//! ```
//!
//! Quem chama `score` nunca vê erro: o resultado é sempre um número em [0, 1].

use std::sync::Arc;

use tracing::{info, warn};

use crate::config::ScoringConfig;
use crate::countries::CountryAliasTable;
use crate::entities::{EntityError, EntityExtractor};
use crate::parser::AddressParser;
use crate::scorer::{AddressSimilarity, BaselineSimilarity, EngineKind, HybridSimilarity, ScoreBreakdown, ScoreError};

pub struct SimilarityEngine {
    primary: Box<dyn AddressSimilarity>,
    fallback: BaselineSimilarity,
    extractor: Option<Arc<dyn EntityExtractor>>,
}

impl std::fmt::Debug for SimilarityEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimilarityEngine")
            .field("kind", &self.kind())
            .finish()
    }
}

impl SimilarityEngine {
    /// Motor que só usa a estratégia baseline.
    pub fn baseline() -> Self {
        Self {
            primary: Box::new(BaselineSimilarity),
            fallback: BaselineSimilarity,
            extractor: None,
        }
    }

    /// Tenta carregar o colaborador de entidades; se falhar, fica com a baseline.
    pub fn select<F>(config: ScoringConfig, table: Arc<CountryAliasTable>, loader: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn EntityExtractor>, EntityError>,
    {
        let extractor = match loader() {
            Ok(extractor) => extractor,
            Err(err) => {
                warn!(error = %err, "entity extractor unavailable; using baseline similarity");
                return Self::baseline();
            }
        };

        let parser = AddressParser::new(table).with_entity_extractor(Arc::clone(&extractor));
        match HybridSimilarity::new(config, parser) {
            Ok(hybrid) => {
                info!(engine = %EngineKind::Hybrid, "similarity engine selected");
                Self {
                    primary: Box::new(hybrid),
                    fallback: BaselineSimilarity,
                    extractor: Some(extractor),
                }
            }
            Err(err) => {
                warn!(error = %err, "hybrid similarity unavailable; using baseline similarity");
                Self::baseline()
            }
        }
    }

    /// Estratégia escolhida na construção.
    pub fn kind(&self) -> EngineKind {
        self.primary.kind()
    }

    /// Colaborador em uso, se a híbrida foi selecionada.
    pub fn entity_extractor(&self) -> Option<&Arc<dyn EntityExtractor>> {
        self.extractor.as_ref()
    }

    /// Score em [0, 1]. Nunca falha.
    pub fn score(&self, a: &str, b: &str) -> f64 {
        let score = match self.primary.try_score(a, b) {
            Ok(score) => score,
            Err(err) => {
                warn!(
                    engine = %self.primary.kind(),
                    error = %err,
                    "scoring failed; falling back to baseline for this call"
                );
                self.fallback.score(a, b)
            }
        };
        score.clamp(0.0, 1.0)
    }

    /// Decomposição do score; erro se a estratégia não sabe explicar ou o colaborador falhou.
    pub fn explain(&self, a: &str, b: &str) -> Result<ScoreBreakdown, ScoreError> {
        self.primary.explain(a, b)
    }
}

impl Default for SimilarityEngine {
    fn default() -> Self {
        Self::baseline()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::entities::ExtractedEntities;
    use crate::gazetteer::GazetteerExtractor;

    fn gazetteer() -> Result<Arc<dyn EntityExtractor>, EntityError> {
        Ok(Arc::new(GazetteerExtractor::builtin()))
    }

    #[test]
    fn test_select_hybrid() {
        let engine = SimilarityEngine::select(ScoringConfig::default(), CountryAliasTable::builtin(), gazetteer);
        assert_eq!(engine.kind(), EngineKind::Hybrid);
        assert!(engine.entity_extractor().is_some());
    }

    #[test]
    fn test_select_downgrades_when_unavailable() {
        let engine = SimilarityEngine::select(ScoringConfig::default(), CountryAliasTable::builtin(), || {
            Err(EntityError::Unavailable {
                reason: "model not installed".to_string(),
            })
        });
        assert_eq!(engine.kind(), EngineKind::Baseline);
        assert!(engine.entity_extractor().is_none());
        assert!(matches!(
            engine.explain("a", "b"),
            Err(ScoreError::ExplainUnsupported { .. })
        ));
    }

    #[test]
    fn test_failing_collaborator_falls_back_per_call() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let failing = move |_: &str| -> Result<ExtractedEntities, EntityError> {
            counter.fetch_add(1, Ordering::SeqCst);
            Err(EntityError::Failed {
                reason: "timeout".to_string(),
            })
        };
        let engine = SimilarityEngine::select(ScoringConfig::default(), CountryAliasTable::builtin(), || {
            Ok(Arc::new(failing) as Arc<dyn EntityExtractor>)
        });
        assert_eq!(engine.kind(), EngineKind::Hybrid);

        let a = "Damrak 1, Amsterdam";
        let b = "Damrak 2, Amsterdam";
        assert_eq!(engine.score(a, b), BaselineSimilarity.score(a, b));
        // a seleção não muda: a próxima chamada tenta a híbrida de novo
        engine.score(a, b);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert_eq!(engine.kind(), EngineKind::Hybrid);
    }

    #[test]
    fn test_score_bounds() {
        let engine = SimilarityEngine::select(ScoringConfig::default(), CountryAliasTable::builtin(), gazetteer);
        let pairs = [
            ("", ""),
            ("Damrak 1, Amsterdam", ""),
            ("Kalverstraat 92, 1012 PH Amsterdam", "Coolsingel 40, 3011 AD Rotterdam"),
            ("10 Main St", "10 Main St"),
        ];
        for (a, b) in pairs {
            let s = engine.score(a, b);
            assert!((0.0..=1.0).contains(&s), "{a} / {b}: {s}");
        }
    }

    #[test]
    fn test_baseline_engine() {
        let engine = SimilarityEngine::default();
        assert_eq!(engine.kind(), EngineKind::Baseline);
        assert_eq!(engine.score("Damrak 1", "damrak 1"), 1.0);
    }
}
