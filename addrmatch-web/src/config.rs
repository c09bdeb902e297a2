//! Configuração do servidor via variáveis de ambiente.
//!
//! | Variável                    | Padrão    | Conteúdo                                  |
//! |-----------------------------|-----------|-------------------------------------------|
//! | `ADDRMATCH_BIND_ADDR`       | `0.0.0.0` | Endereço de escuta                        |
//! | `ADDRMATCH_PORT`            | `3000`    | Porta                                     |
//! | `ADDRMATCH_SCORING_CONFIG`  | —         | JSON com pesos/pisos/tetos                |
//! | `ADDRMATCH_COUNTRY_ALIASES` | —         | JSON com a tabela de países               |
//! | `ADDRMATCH_GAZETTEER`       | —         | JSON com cidades e vocabulário de rua     |
//! | `ADDRMATCH_ENGINE`          | `auto`    | `auto` ou `baseline`                      |
//! | `ADDRMATCH_MAX_INPUT_CHARS` | `1024`    | Tamanho máximo de cada endereço recebido  |

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;

use addrmatch_core::{
    ConfigError, CountryAliasTable, EntityError, EntityExtractor, GazetteerExtractor, MatchPipeline,
    ScoringConfig, SimilarityEngine,
};
use thiserror::Error;

/// Limite padrão por campo de endereço nas requisições.
pub const DEFAULT_MAX_INPUT_CHARS: usize = 1024;

#[derive(Debug, Error)]
pub enum WebConfigError {
    #[error("invalid value for {var}: {value:?}")]
    InvalidVar { var: &'static str, value: String },

    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Modo de seleção do motor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineMode {
    /// Híbrido se o colaborador carregar; baseline caso contrário.
    Auto,
    Baseline,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WebConfig {
    pub addr: SocketAddr,
    pub scoring_config: Option<PathBuf>,
    pub country_aliases: Option<PathBuf>,
    pub gazetteer: Option<PathBuf>,
    pub engine: EngineMode,
    pub max_input_chars: usize,
}

impl Default for WebConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), 3000),
            scoring_config: None,
            country_aliases: None,
            gazetteer: None,
            engine: EngineMode::Auto,
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }
}

impl WebConfig {
    pub fn from_env() -> Result<Self, WebConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Mesma leitura de `from_env`, com uma fonte de variáveis arbitrária.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, WebConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(value) = lookup("ADDRMATCH_BIND_ADDR") {
            let ip = value.trim().parse::<IpAddr>().map_err(|_| WebConfigError::InvalidVar {
                var: "ADDRMATCH_BIND_ADDR",
                value: value.clone(),
            })?;
            config.addr.set_ip(ip);
        }
        if let Some(value) = lookup("ADDRMATCH_PORT") {
            let port = value.trim().parse::<u16>().map_err(|_| WebConfigError::InvalidVar {
                var: "ADDRMATCH_PORT",
                value: value.clone(),
            })?;
            config.addr.set_port(port);
        }

        config.scoring_config = lookup("ADDRMATCH_SCORING_CONFIG").map(PathBuf::from);
        config.country_aliases = lookup("ADDRMATCH_COUNTRY_ALIASES").map(PathBuf::from);
        config.gazetteer = lookup("ADDRMATCH_GAZETTEER").map(PathBuf::from);

        if let Some(value) = lookup("ADDRMATCH_ENGINE") {
            config.engine = match value.trim().to_lowercase().as_str() {
                "auto" => EngineMode::Auto,
                "baseline" => EngineMode::Baseline,
                _ => {
                    return Err(WebConfigError::InvalidVar {
                        var: "ADDRMATCH_ENGINE",
                        value,
                    })
                }
            };
        }

        if let Some(value) = lookup("ADDRMATCH_MAX_INPUT_CHARS") {
            config.max_input_chars = match value.trim().parse::<usize>() {
                Ok(max) if max > 0 => max,
                _ => {
                    return Err(WebConfigError::InvalidVar {
                        var: "ADDRMATCH_MAX_INPUT_CHARS",
                        value,
                    })
                }
            };
        }

        Ok(config)
    }

    /// Carrega arquivos de configuração e seleciona o motor (uma única vez).
    ///
    /// Erros de configuração de score ou da tabela de países são fatais; falha ao
    /// carregar o gazetteer apenas rebaixa o motor para baseline.
    pub fn build_pipeline(&self) -> Result<MatchPipeline, WebConfigError> {
        let scoring = match &self.scoring_config {
            Some(path) => ScoringConfig::from_path(path)?,
            None => ScoringConfig::default(),
        };
        let table = match &self.country_aliases {
            Some(path) => Arc::new(CountryAliasTable::from_path(path)?),
            None => CountryAliasTable::builtin(),
        };

        if self.engine == EngineMode::Baseline {
            return Ok(MatchPipeline::new(SimilarityEngine::baseline(), table));
        }

        let gazetteer = self.gazetteer.clone();
        Ok(MatchPipeline::select(scoring, table, move || {
            let extractor = match gazetteer {
                Some(path) => GazetteerExtractor::from_path(path)?,
                None => GazetteerExtractor::builtin(),
            };
            Ok::<_, EntityError>(Arc::new(extractor) as Arc<dyn EntityExtractor>)
        }))
    }
}
