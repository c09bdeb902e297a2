//! # Parser de Componentes de Endereço
//!
//! Orquestra os extratores na ordem fixa **país → CEP → número**, passando o resto de
//! cada estágio ao seguinte, e opcionalmente complementa o registro com rua/cidade
//! vindas do colaborador de entidades.
//!
//! ```text
//! texto ─► país ─► CEP ─► número ─► rest ─► [colaborador] ─► AddressComponents
//! ```
//!
//! O parser nunca falha no caminho determinístico. Só o colaborador pode falhar, e
//! por isso há três portas de entrada:
//!
//! | Método              | Colaborador | Falha do colaborador          |
//! |---------------------|-------------|-------------------------------|
//! | `parse_structured`  | não         | —                             |
//! | `try_parse`         | sim         | devolvida como `Err`          |
//! | `parse`             | sim         | logada; rua/cidade ausentes   |

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::countries::CountryAliasTable;
use crate::entities::{EntityError, EntityExtractor, ExtractedEntities};
use crate::extractors::{extract_country_with, extract_house_number, extract_postal_code};
use crate::normalize::strip_part;

/// Componentes estruturados de um endereço.
///
/// Construído uma única vez por texto e nunca alterado depois. Campos ausentes
/// significam "não encontrado", o que é diferente de um valor vazio.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddressComponents {
    country: Option<String>,
    postal_code: Option<String>,
    house_number: Option<String>,
    street_name: Option<String>,
    city: Option<String>,
    rest: String,
}

impl AddressComponents {
    /// Nome canônico do país.
    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Token bruto do CEP, como aparece no texto.
    pub fn postal_code(&self) -> Option<&str> {
        self.postal_code.as_deref()
    }

    /// Número da casa já normalizado (`"29a"`).
    pub fn house_number(&self) -> Option<&str> {
        self.house_number.as_deref()
    }

    pub fn street_name(&self) -> Option<&str> {
        self.street_name.as_deref()
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    /// Resto do texto após as extrações determinísticas (pode ser vazio).
    pub fn rest(&self) -> &str {
        &self.rest
    }

    /// Novo registro com rua/cidade vindas do colaborador.
    fn with_entities(self, entities: ExtractedEntities) -> Self {
        Self {
            street_name: strip_part(entities.street_name.as_deref()),
            city: strip_part(entities.city.as_deref()),
            ..self
        }
    }
}

/// Parser com tabela de países e colaborador opcional.
#[derive(Clone)]
pub struct AddressParser {
    table: Arc<CountryAliasTable>,
    entities: Option<Arc<dyn EntityExtractor>>,
}

impl std::fmt::Debug for AddressParser {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AddressParser")
            .field("countries", &self.table.countries().len())
            .field("entity_extractor", &self.entities.is_some())
            .finish()
    }
}

impl AddressParser {
    /// Parser apenas determinístico.
    pub fn new(table: Arc<CountryAliasTable>) -> Self {
        Self {
            table,
            entities: None,
        }
    }

    pub fn with_entity_extractor(mut self, extractor: Arc<dyn EntityExtractor>) -> Self {
        self.entities = Some(extractor);
        self
    }

    pub fn has_entity_extractor(&self) -> bool {
        self.entities.is_some()
    }

    /// Cadeia determinística país → CEP → número. Nunca falha.
    pub fn parse_structured(&self, address: &str) -> AddressComponents {
        let (rest, country) = extract_country_with(&self.table, address);
        let (rest, postal_code) = extract_postal_code(&rest);
        let (rest, house_number) = extract_house_number(&rest);

        AddressComponents {
            country,
            postal_code,
            house_number,
            street_name: None,
            city: None,
            rest,
        }
    }

    /// Cadeia determinística + colaborador; a falha do colaborador é devolvida.
    pub fn try_parse(&self, address: &str) -> Result<AddressComponents, EntityError> {
        let components = self.parse_structured(address);
        let Some(extractor) = &self.entities else {
            return Ok(components);
        };

        let entities = extractor.extract_entities(components.rest())?;
        let components = components.with_entities(entities);
        debug!(
            country = ?components.country(),
            postal_code = ?components.postal_code(),
            house_number = ?components.house_number(),
            street_name = ?components.street_name(),
            city = ?components.city(),
            rest = components.rest(),
            "address parsed"
        );
        Ok(components)
    }

    /// Parse completo que nunca falha: se o colaborador falhar, devolve o
    /// registro determinístico (rua/cidade ausentes).
    pub fn parse(&self, address: &str) -> AddressComponents {
        match self.try_parse(address) {
            Ok(components) => components,
            Err(err) => {
                warn!(error = %err, "entity extraction failed; keeping structured fields only");
                self.parse_structured(address)
            }
        }
    }
}

impl Default for AddressParser {
    fn default() -> Self {
        Self::new(CountryAliasTable::builtin())
    }
}

/// Cadeia determinística com a tabela padrão.
pub fn parse_address_components(address: &str) -> AddressComponents {
    AddressParser::default().parse_structured(address)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gazetteer::GazetteerExtractor;

    fn failing(_: &str) -> Result<ExtractedEntities, EntityError> {
        Err(EntityError::Failed {
            reason: "model crashed".to_string(),
        })
    }

    #[test]
    fn test_parse_structured_chain() {
        let c = parse_address_components("1012 AB Amsterdam, Netherlands");
        assert_eq!(c.country(), Some("Netherlands"));
        assert_eq!(c.postal_code(), Some("1012 AB"));
        assert_eq!(c.house_number(), None);
        assert_eq!(c.rest(), "Amsterdam");
        assert!(c.street_name().is_none());
        assert!(c.city().is_none());
    }

    #[test]
    fn test_parse_full_address() {
        let c = parse_address_components("Kalverstraat 92, 1012 PH Amsterdam, The Netherlands");
        // "Netherlands" (#0) vence "The Netherlands" (#3) e é o trecho removido
        assert_eq!(c.country(), Some("Netherlands"));
        assert_eq!(c.postal_code(), Some("1012 PH"));
        assert_eq!(c.house_number(), Some("92"));
        // a remoção do número deixa o espaço antes da vírgula
        assert_eq!(c.rest(), "Kalverstraat , Amsterdam, The");
    }

    #[test]
    fn test_parse_empty() {
        let c = parse_address_components("");
        assert_eq!(c, AddressComponents::default());
        assert_eq!(c.rest(), "");
    }

    #[test]
    fn test_rest_never_contains_extracted_tokens() {
        let c = parse_address_components("Hauptstrasse 5, 10115 Berlin, Germany");
        assert_eq!(c.country(), Some("Germany"));
        assert_eq!(c.postal_code(), Some("10115"));
        assert_eq!(c.house_number(), Some("5"));
        assert!(!c.rest().contains("Germany"));
        assert!(!c.rest().contains("10115"));
        assert_eq!(c.rest(), "Hauptstrasse , Berlin");
    }

    #[test]
    fn test_try_parse_with_entities() {
        let parser =
            AddressParser::default().with_entity_extractor(Arc::new(GazetteerExtractor::builtin()));
        let c = parser.try_parse("Kalverstraat 92, 1012 PH Amsterdam").unwrap();
        assert_eq!(c.street_name(), Some("Kalverstraat"));
        assert_eq!(c.city(), Some("Amsterdam"));
        assert_eq!(c.rest(), "Kalverstraat , Amsterdam");
    }

    #[test]
    fn test_entities_are_trimmed_and_blank_is_absent() {
        let extractor = |_: &str| -> Result<ExtractedEntities, EntityError> {
            Ok(ExtractedEntities {
                street_name: Some(" , ".to_string()),
                city: Some(" Utrecht, ".to_string()),
            })
        };
        let parser = AddressParser::default().with_entity_extractor(Arc::new(extractor));
        let c = parser.parse("Oudegracht 1 Utrecht");
        assert_eq!(c.street_name(), None);
        assert_eq!(c.city(), Some("Utrecht"));
    }

    #[test]
    fn test_collaborator_failure() {
        let parser = AddressParser::default().with_entity_extractor(Arc::new(failing));
        assert!(parser.try_parse("Damrak 1, Amsterdam").is_err());

        // parse nunca falha: mantém os campos determinísticos
        let c = parser.parse("Damrak 1, Amsterdam");
        assert_eq!(c.house_number(), Some("1"));
        assert_eq!(c.rest(), "Damrak , Amsterdam");
        assert!(c.city().is_none());
    }
}
