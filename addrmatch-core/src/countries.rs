//! # Tabela de Aliases de Países
//!
//! Mapeia o nome canônico de cada país para a lista **ordenada** de suas variantes
//! textuais (abreviações, nomes locais, sinônimos). O nome canônico costuma ser o alias #0.
//!
//! ## Regra de prioridade
//!
//! A tabela é achatada numa lista de entradas `(país, alias, índice do alias)` na ordem
//! de registro. Quando vários aliases aparecem no texto, vence a entrada de menor chave
//! `(índice do alias, ordem de registro do país)`:
//!
//! | Texto                      | Candidatos                         | Vencedor    |
//! |----------------------------|------------------------------------|-------------|
//! | "Berlin, Germany"          | Germany #0                         | Germany     |
//! | "Holland, DE"              | Netherlands #1, Germany #2         | Netherlands |
//! | "Deutschland, Belgique"    | Germany #1, Belgium #2             | Germany     |
//!
//! A chave é explícita e não depende da ordem de iteração de nenhum container.
//! Nomes e aliases são armazenados em NFD, assim "España" e "Espan\u{303}a" casam igual.

use std::fmt;
use std::path::Path;
use std::sync::{Arc, LazyLock};

use regex::{Regex, RegexBuilder};
use serde::de::{Deserializer, MapAccess, Visitor};
use serde::Deserialize;

use crate::config::{read_config_file, ConfigError};
use crate::normalize::decompose;

/// Tabela padrão, na ordem de registro.
const BUILTIN_COUNTRIES: &[(&str, &[&str])] = &[
    ("Netherlands", &["Netherlands", "Holland", "NL", "The Netherlands"]),
    ("Germany", &["Germany", "Deutschland", "DE"]),
    ("France", &["France", "FR"]),
    (
        "United Kingdom",
        &[
            "United Kingdom",
            "UK",
            "Great Britain",
            "GB",
            "England",
            "Scotland",
            "Wales",
            "Northern Ireland",
        ],
    ),
    ("Spain", &["Spain", "España", "ES"]),
    ("Italy", &["Italy", "Italia", "IT"]),
    ("Belgium", &["Belgium", "België", "Belgique", "BE"]),
    ("Austria", &["Austria", "Österreich", "AT"]),
    ("Portugal", &["Portugal", "PT"]),
    ("Ireland", &["Ireland", "Éire", "IE", "Republic of Ireland"]),
    ("Hungary", &["Hungary", "Magyarország", "HU", "Hongarije"]),
    ("Switzerland", &["Switzerland", "Schweiz", "Suisse", "Svizzera", "CH"]),
    ("Sweden", &["Sweden", "Sverige", "SE"]),
    ("Norway", &["Norway", "Norge", "NO"]),
];

static BUILTIN_TABLE: LazyLock<Arc<CountryAliasTable>> = LazyLock::new(|| {
    let mut countries = Vec::with_capacity(BUILTIN_COUNTRIES.len());
    let mut entries = Vec::new();

    for (country_index, (country, aliases)) in BUILTIN_COUNTRIES.iter().enumerate() {
        for (alias_index, alias) in aliases.iter().enumerate() {
            let alias = decompose(alias);
            let pattern = alias_pattern(&alias).expect("escaped built-in alias is a valid pattern");
            entries.push(AliasEntry {
                country_index,
                alias_index,
                alias,
                pattern,
            });
        }
        countries.push(decompose(country));
    }

    Arc::new(CountryAliasTable { countries, entries })
});

/// `\b<alias>\b` sem distinção de maiúsculas; o alias é escapado.
fn alias_pattern(alias: &str) -> Result<Regex, regex::Error> {
    RegexBuilder::new(&format!(r"\b{}\b", regex::escape(alias)))
        .case_insensitive(true)
        .build()
}

/// Uma entrada achatada da tabela.
#[derive(Debug, Clone)]
struct AliasEntry {
    /// Posição do país na ordem de registro.
    country_index: usize,
    /// Posição do alias dentro da lista do próprio país.
    alias_index: usize,
    /// Alias em NFD.
    alias: String,
    /// `\b<alias>\b`, sem distinção de maiúsculas.
    pattern: Regex,
}

impl AliasEntry {
    /// Chave de prioridade: menor vence.
    fn priority(&self) -> (usize, usize) {
        (self.alias_index, self.country_index)
    }
}

/// Uma ocorrência de alias no texto (offsets em bytes do texto consultado).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CountryMatch<'t> {
    pub country: &'t str,
    pub alias: &'t str,
    pub alias_index: usize,
    pub start: usize,
    pub end: usize,
}

/// Tabela imutável de aliases; construída uma vez e compartilhada via `Arc`.
#[derive(Debug, Clone)]
pub struct CountryAliasTable {
    countries: Vec<String>,
    entries: Vec<AliasEntry>,
}

impl CountryAliasTable {
    /// Constrói a tabela a partir de pares `(nome canônico, aliases)` na ordem de registro.
    pub fn new(countries: Vec<(String, Vec<String>)>) -> Result<Self, ConfigError> {
        if countries.is_empty() {
            return Err(ConfigError::EmptyAliasTable);
        }

        let mut names: Vec<String> = Vec::with_capacity(countries.len());
        let mut entries = Vec::new();

        for (country_index, (country, aliases)) in countries.into_iter().enumerate() {
            let country = decompose(country.trim());
            if names.contains(&country) {
                return Err(ConfigError::DuplicateCountry { country });
            }
            if aliases.is_empty() {
                return Err(ConfigError::EmptyAliasList { country });
            }

            for (alias_index, alias) in aliases.iter().enumerate() {
                let alias = decompose(alias.trim());
                if alias.is_empty() {
                    return Err(ConfigError::BlankAlias { country });
                }
                let pattern = alias_pattern(&alias).map_err(|source| ConfigError::Pattern {
                    alias: alias.clone(),
                    source,
                })?;
                entries.push(AliasEntry {
                    country_index,
                    alias_index,
                    alias,
                    pattern,
                });
            }
            names.push(country);
        }

        Ok(Self {
            countries: names,
            entries,
        })
    }

    /// A tabela padrão (14 países europeus), compartilhada pelo processo.
    pub fn builtin() -> Arc<Self> {
        Arc::clone(&BUILTIN_TABLE)
    }

    /// Carrega de um objeto JSON `{ "Canonical": ["alias0", ...] }`.
    /// A ordem do documento é a ordem de registro.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let parsed: AliasTableFile = serde_json::from_str(json)?;
        Self::new(parsed.0)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_json_str(&read_config_file(path.as_ref())?)
    }

    /// Nomes canônicos na ordem de registro.
    pub fn countries(&self) -> &[String] {
        &self.countries
    }

    /// Melhor ocorrência de alias no texto segundo a chave de prioridade.
    ///
    /// Dentro de uma entrada vale a primeira ocorrência (mais à esquerda).
    /// O texto deve estar em NFD para casar aliases acentuados.
    pub fn find<'t>(&'t self, text: &str) -> Option<CountryMatch<'t>> {
        let mut best: Option<(&AliasEntry, usize, usize)> = None;

        for entry in &self.entries {
            if let Some((current, _, _)) = best {
                if entry.priority() >= current.priority() {
                    continue;
                }
            }
            if let Some(m) = entry.pattern.find(text) {
                best = Some((entry, m.start(), m.end()));
            }
        }

        best.map(|(entry, start, end)| CountryMatch {
            country: &self.countries[entry.country_index],
            alias: &entry.alias,
            alias_index: entry.alias_index,
            start,
            end,
        })
    }
}

/// Pares `(país, aliases)` na ordem em que aparecem no documento.
struct AliasTableFile(Vec<(String, Vec<String>)>);

impl<'de> Deserialize<'de> for AliasTableFile {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct OrderedVisitor;

        impl<'de> Visitor<'de> for OrderedVisitor {
            type Value = AliasTableFile;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("an object mapping country names to alias lists")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut pairs = Vec::with_capacity(map.size_hint().unwrap_or(0));
                while let Some((country, aliases)) = map.next_entry::<String, Vec<String>>()? {
                    pairs.push((country, aliases));
                }
                Ok(AliasTableFile(pairs))
            }
        }

        deserializer.deserialize_map(OrderedVisitor)
    }
}
