//! # Scorers — Baseline e Híbrido
//!
//! Duas estratégias intercambiáveis atrás de [`AddressSimilarity`]:
//!
//! - **Baseline**: normaliza as duas strings inteiras e aplica a similaridade de blocos.
//!   Barata, nunca falha.
//! - **Híbrida**: decompõe os dois endereços em campos ([`AddressComponents`]) e combina
//!   sinais por campo. Depende do colaborador de entidades e, por isso, pode falhar.
//!
//! ## Montagem do score híbrido
//!
//! O score final fica entre um piso `base` (início 0) e um teto `max_score` (início 1),
//! ajustados nesta ordem exata:
//!
//! 1. País conhecido e diferente → teto ≤ `country_mismatch_cap`.
//! 2. CEP conhecido e igual → piso ≥ `postal_match_floor`.
//! 3. Senão, CEP conhecido e diferente → teto ≤ `postal_mismatch_cap`.
//! 4. `strong_locality = street_sim > 0.80 || rest_sim > 0.85`.
//! 5. Número conhecido, igual e localidade forte → piso ≥ `house_match_floor`.
//! 6. Senão, número conhecido, diferente e localidade forte → teto ≤ `house_mismatch_cap`.
//! 7. Se `max_score < base`, o teto sobe até o piso (limites nunca se invertem).
//! 8. `score = base + (max_score - base) · within_sim`, limitado a [0, 1].
//!
//! Campos "desconhecidos" (ausentes de um dos lados) não contam nem a favor nem contra.
//! A ordem importa: um piso de CEP pode superar o teto de país (passo 7).

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::entities::EntityError;
use crate::normalize::{normalize, normalize_house_number, normalize_postal_code};
use crate::parser::{AddressComponents, AddressParser};
use crate::similarity::{similarity, similarity_opt};

/// Estratégia efetivamente em uso.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineKind {
    Baseline,
    Hybrid,
}

impl EngineKind {
    pub fn name(&self) -> &'static str {
        match self {
            EngineKind::Baseline => "baseline",
            EngineKind::Hybrid => "hybrid",
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoreError {
    #[error(transparent)]
    Entity(#[from] EntityError),

    #[error("score explanation is not available for the {engine} engine")]
    ExplainUnsupported { engine: EngineKind },
}

/// Capacidade comum às estratégias: `score(a, b) → [0, 1]`.
pub trait AddressSimilarity: Send + Sync {
    /// Score em [0, 1]; só a estratégia híbrida pode falhar.
    fn try_score(&self, a: &str, b: &str) -> Result<f64, ScoreError>;

    fn kind(&self) -> EngineKind;

    /// Decomposição do score por sinal. Só a híbrida sabe explicar.
    fn explain(&self, _a: &str, _b: &str) -> Result<ScoreBreakdown, ScoreError> {
        Err(ScoreError::ExplainUnsupported { engine: self.kind() })
    }
}

/// Similaridade de string inteira. Entradas vazias (após normalização) valem 0.0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BaselineSimilarity;

impl BaselineSimilarity {
    pub fn score(&self, a: &str, b: &str) -> f64 {
        if normalize(a).is_empty() || normalize(b).is_empty() {
            return 0.0;
        }
        similarity(a, b)
    }
}

impl AddressSimilarity for BaselineSimilarity {
    fn try_score(&self, a: &str, b: &str) -> Result<f64, ScoreError> {
        Ok(self.score(a, b))
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Baseline
    }
}

/// Todos os sinais de uma comparação híbrida.
///
/// `*_match` é `None` quando o campo é desconhecido (ausente em pelo menos um lado).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreBreakdown {
    pub query: AddressComponents,
    pub candidate: AddressComponents,
    pub street_sim: f64,
    pub city_sim: f64,
    pub rest_sim: f64,
    pub semantic_sim: f64,
    pub within_sim: f64,
    pub country_match: Option<bool>,
    pub postal_match: Option<bool>,
    pub house_match: Option<bool>,
    pub strong_locality: bool,
    pub base: f64,
    pub max_score: f64,
    pub score: f64,
}

/// Estratégia híbrida: extratores + colaborador de entidades + pisos/tetos.
#[derive(Debug, Clone)]
pub struct HybridSimilarity {
    parser: AddressParser,
    config: ScoringConfig,
}

impl HybridSimilarity {
    /// O parser deve ter um colaborador de entidades; sem ele a rua/cidade
    /// ficariam sempre ausentes.
    pub fn new(config: ScoringConfig, parser: AddressParser) -> Result<Self, EntityError> {
        if !parser.has_entity_extractor() {
            return Err(EntityError::Unavailable {
                reason: "hybrid scoring requires an entity extractor".to_string(),
            });
        }
        Ok(Self { parser, config })
    }

    /// Combina dois registros já parseados. Função pura.
    pub fn compare(&self, query: AddressComponents, candidate: AddressComponents) -> ScoreBreakdown {
        assemble(&self.config, query, candidate)
    }
}

impl AddressSimilarity for HybridSimilarity {
    fn try_score(&self, a: &str, b: &str) -> Result<f64, ScoreError> {
        if normalize(a).is_empty() || normalize(b).is_empty() {
            return Ok(0.0);
        }
        Ok(self.explain(a, b)?.score)
    }

    fn kind(&self) -> EngineKind {
        EngineKind::Hybrid
    }

    fn explain(&self, a: &str, b: &str) -> Result<ScoreBreakdown, ScoreError> {
        let query = self.parser.try_parse(a)?;
        let candidate = self.parser.try_parse(b)?;
        Ok(self.compare(query, candidate))
    }
}

/// `Some(a == b)` se os dois lados existem, senão `None`.
fn known_match(a: Option<String>, b: Option<String>) -> Option<bool> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a == b),
        _ => None,
    }
}

fn non_empty(value: String) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Monta o score híbrido na ordem documentada no módulo.
fn assemble(config: &ScoringConfig, query: AddressComponents, candidate: AddressComponents) -> ScoreBreakdown {
    // === Passo 1: Sinais por campo ===
    let street_sim = similarity_opt(query.street_name(), candidate.street_name());
    let city_sim = similarity_opt(query.city(), candidate.city());
    let rest_sim = similarity(query.rest(), candidate.rest());

    let semantic_weight = config.street_weight + config.city_weight;
    let semantic_sim = if semantic_weight > 0.0 {
        (config.street_weight * street_sim + config.city_weight * city_sim) / semantic_weight
    } else {
        0.0
    };
    let within_sim = semantic_sim.max(rest_sim);

    // === Passo 2: Flags conhecidas/desconhecidas ===
    let country_match = known_match(
        query.country().map(str::to_string),
        candidate.country().map(str::to_string),
    );
    let postal_match = known_match(
        query.postal_code().map(normalize_postal_code).and_then(non_empty),
        candidate.postal_code().map(normalize_postal_code).and_then(non_empty),
    );
    let house_match = known_match(
        query.house_number().map(normalize_house_number).and_then(non_empty),
        candidate.house_number().map(normalize_house_number).and_then(non_empty),
    );

    // === Passo 3: Pisos e tetos, na ordem fixa ===
    let mut base: f64 = 0.0;
    let mut max_score: f64 = 1.0;

    if country_match == Some(false) {
        max_score = max_score.min(config.country_mismatch_cap);
    }

    match postal_match {
        Some(true) => base = base.max(config.postal_match_floor),
        Some(false) => max_score = max_score.min(config.postal_mismatch_cap),
        None => {}
    }

    let strong_locality =
        street_sim > config.strong_street_threshold || rest_sim > config.strong_rest_threshold;
    match house_match {
        Some(true) if strong_locality => base = base.max(config.house_match_floor),
        Some(false) if strong_locality => max_score = max_score.min(config.house_mismatch_cap),
        _ => {}
    }

    if max_score < base {
        max_score = base;
    }

    // === Passo 4: Interpolação ===
    let score = (base + (max_score - base) * within_sim).clamp(0.0, 1.0);

    debug!(
        street_sim,
        city_sim,
        rest_sim,
        within_sim,
        ?country_match,
        ?postal_match,
        ?house_match,
        base,
        max_score,
        score,
        "hybrid score assembled"
    );

    ScoreBreakdown {
        query,
        candidate,
        street_sim,
        city_sim,
        rest_sim,
        semantic_sim,
        within_sim,
        country_match,
        postal_match,
        house_match,
        strong_locality,
        base,
        max_score,
        score,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::entities::ExtractedEntities;
    use crate::gazetteer::GazetteerExtractor;

    fn hybrid() -> HybridSimilarity {
        let parser =
            AddressParser::default().with_entity_extractor(Arc::new(GazetteerExtractor::builtin()));
        HybridSimilarity::new(ScoringConfig::default(), parser).unwrap()
    }

    #[test]
    fn test_baseline_identity_and_empty() {
        let baseline = BaselineSimilarity;
        assert_eq!(baseline.score("Damrak 1, Amsterdam", "  damrak 1,   AMSTERDAM "), 1.0);
        assert_eq!(baseline.score("", ""), 0.0);
        assert_eq!(baseline.score("Damrak", " , "), 0.0);
    }

    #[test]
    fn test_baseline_bounded() {
        let baseline = BaselineSimilarity;
        let s = baseline.score("Damrak 1 Amsterdam", "Coolsingel 40 Rotterdam");
        assert!((0.0..=1.0).contains(&s));
        assert_eq!(baseline.kind(), EngineKind::Baseline);
        assert!(matches!(
            baseline.explain("a", "b"),
            Err(ScoreError::ExplainUnsupported { engine: EngineKind::Baseline })
        ));
    }

    #[test]
    fn test_hybrid_requires_extractor() {
        let err = HybridSimilarity::new(ScoringConfig::default(), AddressParser::default());
        assert!(matches!(err, Err(EntityError::Unavailable { .. })));
    }

    #[test]
    fn test_hybrid_identical_scores_high() {
        let h = hybrid();
        for address in [
            "Kalverstraat 92, 1012 PH Amsterdam, Netherlands",
            "10 Main St",
            "Amsterdam",
            "Rue de Rivoli 1, 75001 Paris, France",
        ] {
            let s = h.try_score(address, address).unwrap();
            assert!(s >= 0.92, "{address}: {s}");
        }
    }

    #[test]
    fn test_hybrid_empty_is_zero() {
        let h = hybrid();
        assert_eq!(h.try_score("", "").unwrap(), 0.0);
        assert_eq!(h.try_score("Damrak 1", "").unwrap(), 0.0);
    }

    #[test]
    fn test_country_mismatch_cap() {
        let h = hybrid();
        let b = h
            .explain("Hauptstrasse, Berlin, Germany", "Hauptstrasse, Berlin, France")
            .unwrap();
        assert_eq!(b.country_match, Some(false));
        assert_eq!(b.postal_match, None);
        assert_eq!(b.house_match, None);
        assert!(b.within_sim > 0.99);
        assert!(b.score <= 0.25 + 1e-12, "{}", b.score);
    }

    #[test]
    fn test_postal_match_floor() {
        let h = hybrid();
        let b = h
            .explain("Damrak 1, 1012 LG Amsterdam", "Kalverstraat 92, 1012LG Amsterdam")
            .unwrap();
        assert_eq!(b.postal_match, Some(true));
        assert_eq!(b.house_match, Some(false));
        assert!(b.score >= 0.85, "{}", b.score);
    }

    #[test]
    fn test_postal_mismatch_cap() {
        let h = hybrid();
        let b = h
            .explain("Kalverstraat 92, 1012 PH Amsterdam", "Kalverstraat 92, 3011 AB Amsterdam")
            .unwrap();
        assert_eq!(b.postal_match, Some(false));
        assert_eq!(b.house_match, Some(true));
        // piso do número (0.92) supera o teto do CEP (0.55): teto sobe até o piso
        assert_eq!(b.base, 0.92);
        assert_eq!(b.max_score, 0.92);
        assert_eq!(b.score, 0.92);
    }

    #[test]
    fn test_house_mismatch_with_strong_locality() {
        let h = hybrid();
        let b = h.explain("Kalverstraat 92, Amsterdam", "Kalverstraat 14, Amsterdam").unwrap();
        assert_eq!(b.house_match, Some(false));
        assert!(b.strong_locality);
        assert_eq!(b.max_score, 0.85);
        assert!(b.score <= 0.85);
    }

    #[test]
    fn test_unknown_fields_give_no_signal() {
        let h = hybrid();
        let b = h.explain("Kalverstraat, Amsterdam", "Kalverstraat 92, Amsterdam").unwrap();
        assert_eq!(b.house_match, None);
        assert_eq!(b.base, 0.0);
        assert_eq!(b.max_score, 1.0);
    }

    #[test]
    fn test_postal_normalization_in_match() {
        let h = hybrid();
        let b = h.explain("Berlin 12345-01", "Berlin 12345 01").unwrap();
        assert_eq!(b.postal_match, Some(true));
    }

    #[test]
    fn test_zero_semantic_weights() {
        let config = ScoringConfig {
            street_weight: 0.0,
            city_weight: 0.0,
            ..ScoringConfig::default()
        };
        let q = AddressParser::default().parse_structured("Damrak");
        let c = AddressParser::default().parse_structured("Rokin");
        let b = assemble(&config, q, c);
        assert_eq!(b.semantic_sim, 0.0);
        assert_eq!(b.within_sim, b.rest_sim);
    }

    #[test]
    fn test_collaborator_failure_propagates() {
        let failing = |_: &str| -> Result<ExtractedEntities, EntityError> {
            Err(EntityError::Failed {
                reason: "boom".to_string(),
            })
        };
        let parser = AddressParser::default().with_entity_extractor(Arc::new(failing));
        let h = HybridSimilarity::new(ScoringConfig::default(), parser).unwrap();
        assert!(matches!(
            h.try_score("Damrak 1", "Damrak 2"),
            Err(ScoreError::Entity(EntityError::Failed { .. }))
        ));
    }
}
