//! # Pipeline de Matching — Orquestrador
//!
//! Junta o parser e o motor de similaridade numa única fachada, construída uma vez
//! por processo e compartilhada (somente leitura) entre threads.
//!
//! ## Passos de `best_match`
//!
//! 1. Calcula `score(query, candidato)` para cada candidato em paralelo (`rayon`),
//!    preservando a ordem da entrada.
//! 2. Reduz sequencialmente: só um score **estritamente** maior substitui o atual,
//!    então em caso de empate vence o primeiro candidato.
//!
//! ## Exemplo
//!
//! ```rust
//! use addrmatch_core::pipeline::MatchPipeline;
//!
//! let pipeline = MatchPipeline::default();
//! let best = pipeline.best_match("10 Main St", &["10 Main St, City A", "11 Main St, City A"]);
//! assert_eq!(best.as_deref(), Some("10 Main St, City A"));
//! ```

use std::sync::Arc;

use rayon::prelude::*;
use tracing::debug;

use crate::config::ScoringConfig;
use crate::countries::CountryAliasTable;
use crate::engine::SimilarityEngine;
use crate::entities::{EntityError, EntityExtractor};
use crate::gazetteer::GazetteerExtractor;
use crate::parser::{AddressComponents, AddressParser};
use crate::scorer::{EngineKind, ScoreBreakdown, ScoreError};

/// Fachada de parse + score.
#[derive(Debug)]
pub struct MatchPipeline {
    engine: SimilarityEngine,
    parser: AddressParser,
}

impl MatchPipeline {
    /// Monta a partir de um motor já selecionado; o parser usa o mesmo colaborador.
    pub fn new(engine: SimilarityEngine, table: Arc<CountryAliasTable>) -> Self {
        let mut parser = AddressParser::new(table);
        if let Some(extractor) = engine.entity_extractor() {
            parser = parser.with_entity_extractor(Arc::clone(extractor));
        }
        Self { engine, parser }
    }

    /// Seleciona o motor (uma única vez) e monta o pipeline.
    pub fn select<F>(config: ScoringConfig, table: Arc<CountryAliasTable>, loader: F) -> Self
    where
        F: FnOnce() -> Result<Arc<dyn EntityExtractor>, EntityError>,
    {
        let engine = SimilarityEngine::select(config, Arc::clone(&table), loader);
        Self::new(engine, table)
    }

    pub fn engine_kind(&self) -> EngineKind {
        self.engine.kind()
    }

    pub fn parser(&self) -> &AddressParser {
        &self.parser
    }

    /// Parse completo; nunca falha.
    pub fn parse(&self, address: &str) -> AddressComponents {
        self.parser.parse(address)
    }

    pub fn score(&self, a: &str, b: &str) -> f64 {
        self.engine.score(a, b)
    }

    pub fn explain(&self, a: &str, b: &str) -> Result<ScoreBreakdown, ScoreError> {
        self.engine.explain(a, b)
    }

    /// Score da query contra cada candidato, na ordem dos candidatos.
    pub fn score_candidates<S>(&self, query: &str, candidates: &[S]) -> Vec<f64>
    where
        S: AsRef<str> + Sync,
    {
        candidates
            .par_iter()
            .map(|candidate| self.engine.score(query, candidate.as_ref()))
            .collect()
    }

    /// Índice e score do melhor candidato; `None` se a lista estiver vazia.
    pub fn best_match_scored<S>(&self, query: &str, candidates: &[S]) -> Option<(usize, f64)>
    where
        S: AsRef<str> + Sync,
    {
        let scores = self.score_candidates(query, candidates);
        let best = best_index(&scores);

        if let Some((index, score)) = best {
            debug!(index, score, candidates = candidates.len(), "best match selected");
        }
        best
    }

    /// Candidato com maior score; `None` se a lista estiver vazia.
    pub fn best_match<S>(&self, query: &str, candidates: &[S]) -> Option<String>
    where
        S: AsRef<str> + Sync,
    {
        self.best_match_scored(query, candidates)
            .map(|(index, _)| candidates[index].as_ref().to_string())
    }
}

/// Primeiro índice com o maior score; `None` para lista vazia.
///
/// Só um score estritamente maior substitui o atual.
pub fn best_index(scores: &[f64]) -> Option<(usize, f64)> {
    let mut best: Option<(usize, f64)> = None;
    for (index, &score) in scores.iter().enumerate() {
        match best {
            Some((_, current)) if score <= current => {}
            _ => best = Some((index, score)),
        }
    }
    best
}

impl Default for MatchPipeline {
    /// Tabela de países padrão + gazetteer embutido.
    fn default() -> Self {
        Self::select(ScoringConfig::default(), CountryAliasTable::builtin(), || {
            Ok(Arc::new(GazetteerExtractor::builtin()) as Arc<dyn EntityExtractor>)
        })
    }
}
