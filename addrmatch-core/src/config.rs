//! # Configuração do Score
//!
//! Pesos e limiares estáticos do score híbrido. São carregados uma vez (padrão,
//! JSON em memória ou arquivo) e tratados como imutáveis durante toda a vida de
//! um scorer. Nada aqui é aprendido a partir de dados.
//!
//! ## Formato JSON
//!
//! Todos os campos são opcionais; o que faltar usa o valor padrão:
//!
//! ```json
//! { "street_weight": 0.35, "city_weight": 0.25, "country_mismatch_cap": 0.25 }
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Erros de carga e validação de configuração (pesos, tabela de países, gazetteer).
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Arquivo não pôde ser lido.
    #[error("failed to read '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Documento JSON inválido ou com tipos errados.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Valor numérico fora do domínio permitido.
    #[error("invalid value for '{field}': {value} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },

    #[error("country alias table is empty")]
    EmptyAliasTable,

    #[error("country '{country}' has no aliases")]
    EmptyAliasList { country: String },

    #[error("country '{country}' has a blank alias")]
    BlankAlias { country: String },

    #[error("country '{country}' is registered twice")]
    DuplicateCountry { country: String },

    /// O alias não gerou uma expressão regular válida.
    #[error("alias '{alias}' could not be compiled: {source}")]
    Pattern {
        alias: String,
        #[source]
        source: regex::Error,
    },
}

/// Lê um arquivo de configuração inteiro para memória.
pub(crate) fn read_config_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Pesos e limiares do score híbrido.
///
/// Os cinco primeiros campos são os pesos clássicos; os demais são os pisos
/// (floors), tetos (caps) e limiares usados na montagem do score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Peso da similaridade de rua na média semântica.
    pub street_weight: f64,
    /// Peso da similaridade de cidade na média semântica.
    pub city_weight: f64,
    /// Carregado e validado, mas o CEP entra no score via piso/teto.
    pub postal_weight: f64,
    /// Carregado e validado, mas o número entra no score via piso/teto.
    pub house_weight: f64,
    /// Teto aplicado quando os dois países são conhecidos e diferentes.
    pub country_mismatch_cap: f64,
    /// Piso quando os CEPs são conhecidos e iguais.
    pub postal_match_floor: f64,
    /// Teto quando os CEPs são conhecidos e diferentes.
    pub postal_mismatch_cap: f64,
    /// Piso quando os números coincidem e a localidade é forte.
    pub house_match_floor: f64,
    /// Teto quando os números diferem e a localidade é forte.
    pub house_mismatch_cap: f64,
    /// `street_sim` acima disto caracteriza localidade forte.
    pub strong_street_threshold: f64,
    /// `rest_sim` acima disto caracteriza localidade forte.
    pub strong_rest_threshold: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            street_weight: 0.35,
            city_weight: 0.25,
            postal_weight: 0.25,
            house_weight: 0.10,
            country_mismatch_cap: 0.25,
            postal_match_floor: 0.85,
            postal_mismatch_cap: 0.55,
            house_match_floor: 0.92,
            house_mismatch_cap: 0.85,
            strong_street_threshold: 0.80,
            strong_rest_threshold: 0.85,
        }
    }
}

impl ScoringConfig {
    /// Carrega de um documento JSON e valida.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Carrega de um arquivo JSON e valida.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&read_config_file(path.as_ref())?)
    }

    /// Pesos devem ser finitos e não negativos; tetos, pisos e limiares em [0, 1].
    pub fn validate(&self) -> Result<(), ConfigError> {
        let weights = [
            ("street_weight", self.street_weight),
            ("city_weight", self.city_weight),
            ("postal_weight", self.postal_weight),
            ("house_weight", self.house_weight),
        ];
        for (field, value) in weights {
            if !value.is_finite() || value < 0.0 {
                return Err(ConfigError::InvalidValue {
                    field,
                    value,
                    reason: "weights must be finite and non-negative",
                });
            }
        }

        let bounds = [
            ("country_mismatch_cap", self.country_mismatch_cap),
            ("postal_match_floor", self.postal_match_floor),
            ("postal_mismatch_cap", self.postal_mismatch_cap),
            ("house_match_floor", self.house_match_floor),
            ("house_mismatch_cap", self.house_mismatch_cap),
            ("strong_street_threshold", self.strong_street_threshold),
            ("strong_rest_threshold", self.strong_rest_threshold),
        ];
        for (field, value) in bounds {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::InvalidValue {
                    field,
                    value,
                    reason: "caps, floors and thresholds must lie in [0, 1]",
                });
            }
        }
        Ok(())
    }
}
