//! # Extração de Entidades (rua / cidade)
//!
//! Fronteira com o colaborador que extrai `street_name` e `city` do resto de um endereço.
//! O núcleo só exige uma função pura `texto → {street_name?, city}` que pode falhar;
//! qualquer implementação (modelo NER externo, serviço remoto, regras) entra por
//! [`EntityExtractor`].
//!
//! O crate traz uma implementação baseada em regras e gazetteers:
//! [`GazetteerExtractor`](crate::gazetteer::GazetteerExtractor).

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Falhas do colaborador. Nunca chegam a quem chama `score`: o motor troca
/// para a estratégia baseline naquela chamada.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EntityError {
    /// O colaborador não pôde ser carregado (modelo ou gazetteer ausente/inválido).
    #[error("entity extractor unavailable: {reason}")]
    Unavailable { reason: String },

    /// Entrada maior do que o colaborador aceita.
    #[error("input too long for entity extraction: {length} chars (max {max})")]
    InputTooLong { length: usize, max: usize },

    /// Falha genérica numa chamada.
    #[error("entity extraction failed: {reason}")]
    Failed { reason: String },
}

/// Resultado de uma extração; campos vazios são representados como ausentes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedEntities {
    pub street_name: Option<String>,
    pub city: Option<String>,
}

/// Colaborador de extração de entidades.
///
/// Chamado de forma síncrona e bloqueante, sem retry nesta camada. Deve ser
/// seguro para uso concorrente (`&self` apenas).
pub trait EntityExtractor: Send + Sync {
    fn extract_entities(&self, text: &str) -> Result<ExtractedEntities, EntityError>;
}

/// Closures também servem como colaborador (útil para adaptar serviços externos).
impl<F> EntityExtractor for F
where
    F: Fn(&str) -> Result<ExtractedEntities, EntityError> + Send + Sync,
{
    fn extract_entities(&self, text: &str) -> Result<ExtractedEntities, EntityError> {
        self(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_closure_as_extractor() {
        let extractor = |text: &str| -> Result<ExtractedEntities, EntityError> {
            Ok(ExtractedEntities {
                street_name: None,
                city: Some(text.to_uppercase()),
            })
        };
        let out = extractor.extract_entities("berlin").unwrap();
        assert_eq!(out.city.as_deref(), Some("BERLIN"));
    }

    #[test]
    fn test_error_messages() {
        let err = EntityError::InputTooLong { length: 600, max: 512 };
        assert_eq!(
            err.to_string(),
            "input too long for entity extraction: 600 chars (max 512)"
        );
    }
}
