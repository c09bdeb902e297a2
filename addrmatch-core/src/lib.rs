//! # addrmatch-core — Matching de Endereços Postais
//!
//! Este crate compara um endereço em texto livre com um endereço candidato (por exemplo,
//! o devolvido por um geocodificador) e produz um score de confiança em [0, 1]. A
//! comparação é feita campo a campo (país, CEP, número, rua, cidade), e não apenas
//! sobre a string inteira.
//!
//! ## Arquitetura do Sistema
//!
//! O dado flui por uma cadeia linear:
//!
//! 1.  **Entrada**: dois endereços (String).
//! 2.  **Normalização** ([`normalize`]): NFD, minúsculas, espaços colapsados.
//! 3.  **Extração** ([`extractors`], [`countries`]): país → CEP → número, nesta ordem,
//!     cada estágio consumindo o resto do anterior.
//! 4.  **Entidades** ([`entities`], [`gazetteer`]): rua e cidade a partir do resto.
//! 5.  **Score** ([`scorer`], [`similarity`]): sinais por campo combinados com pisos e tetos.
//! 6.  **Motor** ([`engine`]): híbrido quando o colaborador de entidades está disponível,
//!     baseline caso contrário, com fallback por chamada.
//! 7.  **Saída**: score em [0, 1] ou o melhor candidato de uma lista ([`pipeline`]).
//!
//! ## Exemplo de Uso
//!
//! ```rust
//! use addrmatch_core::{EngineKind, MatchPipeline};
//!
//! // 1. Instancia o pipeline (tabela de países + gazetteer embutidos)
//! let pipeline = MatchPipeline::default();
//! assert_eq!(pipeline.engine_kind(), EngineKind::Hybrid);
//!
//! // 2. Score entre dois endereços
//! let score = pipeline.score(
//!     "Kalverstraat 92, 1012 PH Amsterdam",
//!     "Kalverstraat 92, 1012PH Amsterdam, Netherlands",
//! );
//! assert!(score >= 0.85);
//!
//! // 3. Componentes estruturados
//! let components = pipeline.parse("Hauptstrasse 5, 10115 Berlin, Germany");
//! assert_eq!(components.postal_code(), Some("10115"));
//! ```
//!
//! ## Módulos Principais
//!
//! - [`pipeline`]: Fachada que conecta parser e motor.
//! - [`parser`]: Cadeia de extração determinística + colaborador.
//! - [`scorer`]: Estratégias baseline e híbrida.
//! - [`config`]: Pesos, pisos e tetos configuráveis.

pub mod config;
pub mod countries;
pub mod engine;
pub mod entities;
pub mod extractors;
pub mod gazetteer;
pub mod normalize;
pub mod parser;
pub mod pipeline;
pub mod scorer;
pub mod similarity;
pub mod tokenizer;

pub use config::{ConfigError, ScoringConfig};
pub use countries::CountryAliasTable;
pub use engine::SimilarityEngine;
pub use entities::{EntityError, EntityExtractor, ExtractedEntities};
pub use gazetteer::GazetteerExtractor;
pub use parser::{parse_address_components, AddressComponents, AddressParser};
pub use pipeline::MatchPipeline;
pub use scorer::{AddressSimilarity, BaselineSimilarity, EngineKind, HybridSimilarity, ScoreBreakdown, ScoreError};
pub use similarity::similarity;
