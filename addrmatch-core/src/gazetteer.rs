//! # Motor de Regras — Gazetteers de Cidades e Indicadores de Rua
//!
//! Implementação local de [`EntityExtractor`]: conhecimento explícito em vez de modelo
//! estatístico.
//!
//! - **Cidade**: lista de cidades conhecidas (gazetteer), casada como n-grama de tokens
//!   ("Den Haag" = 2 tokens). Vence a ocorrência mais à esquerda; na mesma posição,
//!   a mais longa ("Frankfurt am Main" antes de "Frankfurt").
//! - **Rua**: o primeiro segmento (entre vírgulas) que contém um indicador de rua:
//!   uma palavra de rua isolada ("Main **St**", "**Rue** de Rivoli") ou uma palavra
//!   terminada em sufixo composto ("Kalver**straat**", "Haupt**strasse**").
//!   Se a cidade estiver no mesmo segmento, ela é cortada fora.
//!
//! A comparação é feita sobre a forma normalizada (NFD + minúsculas), logo
//! "MÜNCHEN", "München" e "Mu\u{308}nchen" casam igual.
//!
//! ## Carregando de JSON
//!
//! ```json
//! { "cities": ["Utrecht", "Den Haag"], "street_suffixes": ["straat"], "max_input_chars": 256 }
//! ```
//!
//! Campos ausentes usam as listas embutidas.

use std::ops::Range;
use std::path::Path;

use serde::Deserialize;

use crate::entities::{EntityError, ExtractedEntities, EntityExtractor};
use crate::normalize::{normalize, strip_part};
use crate::tokenizer::{segments, tokenize, Token};

/// Limite padrão de entrada (em caracteres).
pub const DEFAULT_MAX_INPUT_CHARS: usize = 512;

const BUILTIN_CITIES: &[&str] = &[
    // Países Baixos
    "Amsterdam", "Rotterdam", "Den Haag", "The Hague", "'s-Gravenhage", "Utrecht",
    "Eindhoven", "Groningen", "Tilburg", "Almere", "Breda", "Nijmegen", "Haarlem",
    "Arnhem", "Leiden", "Maastricht", "Delft", "Zwolle",
    // Alemanha
    "Berlin", "Hamburg", "München", "Munich", "Köln", "Cologne", "Frankfurt",
    "Frankfurt am Main", "Stuttgart", "Düsseldorf", "Leipzig", "Dortmund", "Essen",
    "Bremen", "Dresden", "Hannover", "Nürnberg",
    // França
    "Paris", "Marseille", "Lyon", "Toulouse", "Nice", "Nantes", "Strasbourg",
    "Montpellier", "Bordeaux", "Lille",
    // Reino Unido
    "London", "Manchester", "Birmingham", "Liverpool", "Leeds", "Glasgow",
    "Edinburgh", "Bristol", "Cardiff", "Belfast",
    // Espanha
    "Madrid", "Barcelona", "Valencia", "Sevilla", "Seville", "Bilbao", "Málaga",
    // Itália
    "Roma", "Rome", "Milano", "Milan", "Napoli", "Naples", "Torino", "Turin",
    "Firenze", "Florence", "Venezia", "Venice", "Bologna",
    // Bélgica
    "Brussel", "Bruxelles", "Brussels", "Antwerpen", "Antwerp", "Gent", "Ghent",
    "Brugge", "Bruges", "Liège",
    // Áustria
    "Wien", "Vienna", "Graz", "Linz", "Salzburg", "Innsbruck",
    // Portugal
    "Lisboa", "Lisbon", "Porto", "Braga", "Coimbra",
    // Irlanda
    "Dublin", "Cork", "Galway", "Limerick",
    // Hungria
    "Budapest", "Debrecen", "Szeged",
    // Suíça
    "Zürich", "Zurich", "Genève", "Geneva", "Basel", "Bern", "Lausanne",
    // Suécia
    "Stockholm", "Göteborg", "Gothenburg", "Malmö", "Uppsala",
    // Noruega
    "Oslo", "Bergen", "Trondheim", "Stavanger",
];

/// Palavras que, isoladas, indicam uma rua.
const BUILTIN_STREET_WORDS: &[&str] = &[
    "street", "st", "road", "rd", "avenue", "ave", "av", "lane", "ln", "boulevard",
    "blvd", "drive", "way", "place", "square", "rue", "avenida", "calle", "via",
    "viale", "piazza", "plaza", "praça", "rua", "chemin", "allee", "allée", "gata",
    "gatan", "vägen", "utca", "út",
];

/// Sufixos de palavras compostas que indicam uma rua ("Kalverstraat", "Hauptstraße").
const BUILTIN_STREET_SUFFIXES: &[&str] = &[
    "straat", "str", "strasse", "straße", "weg", "laan", "gracht", "plein", "kade",
    "singel", "dijk", "steeg", "gasse", "platz", "allee", "ring", "damm", "gatan",
    "vägen", "veien", "gata", "utca",
];

/// Extrator de rua/cidade baseado em gazetteers e indicadores.
pub struct GazetteerExtractor {
    /// Cidades conhecidas, cada uma como lista de partes normalizadas.
    cities: Vec<Vec<String>>,
    /// Palavras isoladas de rua (normalizadas).
    street_words: Vec<String>,
    /// Sufixos compostos de rua (normalizados).
    street_suffixes: Vec<String>,
    max_input_chars: usize,
}

impl GazetteerExtractor {
    /// Extrator vazio: não reconhece nada até receber entradas.
    pub fn new() -> Self {
        Self {
            cities: vec![],
            street_words: vec![],
            street_suffixes: vec![],
            max_input_chars: DEFAULT_MAX_INPUT_CHARS,
        }
    }

    /// Extrator com as listas embutidas.
    pub fn builtin() -> Self {
        let mut extractor = Self::new();
        for city in BUILTIN_CITIES {
            extractor.add_city(city);
        }
        for word in BUILTIN_STREET_WORDS {
            extractor.add_street_word(word);
        }
        for suffix in BUILTIN_STREET_SUFFIXES {
            extractor.add_street_suffix(suffix);
        }
        extractor
    }

    /// Carrega de JSON; listas ausentes usam as embutidas.
    pub fn from_json_str(json: &str) -> Result<Self, EntityError> {
        let parsed: GazetteerFile =
            serde_json::from_str(json).map_err(|e| EntityError::Unavailable {
                reason: format!("invalid gazetteer: {e}"),
            })?;

        let builtin = |items: &[&str]| items.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        let mut extractor = Self::new();
        for city in parsed.cities.unwrap_or_else(|| builtin(BUILTIN_CITIES)) {
            extractor.add_city(&city);
        }
        for word in parsed.street_words.unwrap_or_else(|| builtin(BUILTIN_STREET_WORDS)) {
            extractor.add_street_word(&word);
        }
        for suffix in parsed
            .street_suffixes
            .unwrap_or_else(|| builtin(BUILTIN_STREET_SUFFIXES))
        {
            extractor.add_street_suffix(&suffix);
        }
        if let Some(max) = parsed.max_input_chars {
            if max == 0 {
                return Err(EntityError::Unavailable {
                    reason: "max_input_chars must be positive".to_string(),
                });
            }
            extractor.max_input_chars = max;
        }
        Ok(extractor)
    }

    /// Carrega de arquivo JSON. Falha de leitura = colaborador indisponível.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, EntityError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|e| EntityError::Unavailable {
            reason: format!("cannot read gazetteer '{}': {e}", path.display()),
        })?;
        Self::from_json_str(&json)
    }

    pub fn add_city(&mut self, name: &str) {
        let parts: Vec<String> = tokenize(&normalize(name))
            .into_iter()
            .map(|t| t.text)
            .collect();
        if !parts.is_empty() {
            self.cities.push(parts);
        }
    }

    pub fn add_street_word(&mut self, word: &str) {
        let word = normalize(word);
        if !word.is_empty() {
            self.street_words.push(word);
        }
    }

    pub fn add_street_suffix(&mut self, suffix: &str) {
        let suffix = normalize(suffix);
        if !suffix.is_empty() {
            self.street_suffixes.push(suffix);
        }
    }

    pub fn with_max_input_chars(mut self, max: usize) -> Self {
        self.max_input_chars = max;
        self
    }

    pub fn max_input_chars(&self) -> usize {
        self.max_input_chars
    }

    /// Span de tokens `start..end` da primeira cidade conhecida.
    fn find_city(&self, normalized: &[String]) -> Option<Range<usize>> {
        for i in 0..normalized.len() {
            let mut best_len = 0;
            for parts in &self.cities {
                if parts.len() > best_len
                    && i + parts.len() <= normalized.len()
                    && parts.iter().enumerate().all(|(j, part)| normalized[i + j] == *part)
                {
                    best_len = parts.len();
                }
            }
            if best_len > 0 {
                return Some(i..i + best_len);
            }
        }
        None
    }

    fn is_street_indicator(&self, token: &Token, normalized: &str) -> bool {
        if !token.is_word() {
            return false;
        }
        if self.street_words.iter().any(|w| w == normalized) {
            return true;
        }
        self.street_suffixes.iter().any(|suffix| {
            normalized.len() > suffix.len()
                && normalized.ends_with(suffix.as_str())
                && normalized[..normalized.len() - suffix.len()]
                    .chars()
                    .any(char::is_alphabetic)
        })
    }

    /// Span de tokens da rua: segmento com indicador, sem a cidade.
    fn find_street(
        &self,
        tokens: &[Token],
        normalized: &[String],
        city: Option<&Range<usize>>,
    ) -> Option<Range<usize>> {
        for segment in segments(tokens) {
            let Some(indicator) =
                segment.clone().find(|&i| self.is_street_indicator(&tokens[i], &normalized[i]))
            else {
                continue;
            };
            // A cidade pode estar no mesmo segmento ("Kalverstraat Amsterdam")
            let span = match city {
                Some(c) if c.start >= segment.start && c.end <= segment.end => {
                    if indicator < c.start {
                        segment.start..c.start
                    } else if indicator >= c.end {
                        c.end..segment.end
                    } else {
                        continue;
                    }
                }
                _ => segment,
            };
            if !span.is_empty() {
                return Some(span);
            }
        }
        None
    }
}

impl Default for GazetteerExtractor {
    fn default() -> Self {
        Self::builtin()
    }
}

impl EntityExtractor for GazetteerExtractor {
    fn extract_entities(&self, text: &str) -> Result<ExtractedEntities, EntityError> {
        let length = text.chars().count();
        if length > self.max_input_chars {
            return Err(EntityError::InputTooLong {
                length,
                max: self.max_input_chars,
            });
        }

        let tokens = tokenize(text);
        if tokens.is_empty() {
            return Ok(ExtractedEntities::default());
        }
        let normalized: Vec<String> = tokens.iter().map(|t| normalize(&t.text)).collect();

        // === Passo 1: Cidade (gazetteer n-grama) ===
        let city_span = self.find_city(&normalized);
        let city = city_span
            .as_ref()
            .and_then(|span| strip_part(Some(slice_tokens(text, &tokens, span))));

        // === Passo 2: Rua (segmento com indicador, sem a cidade) ===
        let street_name = self
            .find_street(&tokens, &normalized, city_span.as_ref())
            .and_then(|span| strip_part(Some(slice_tokens(text, &tokens, &span))));

        Ok(ExtractedEntities { street_name, city })
    }
}

/// Trecho original coberto por um span de tokens.
fn slice_tokens<'t>(text: &'t str, tokens: &[Token], span: &Range<usize>) -> &'t str {
    match (tokens.get(span.start), span.end.checked_sub(1).and_then(|i| tokens.get(i))) {
        (Some(first), Some(last)) if first.start <= last.end => &text[first.start..last.end],
        _ => "",
    }
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct GazetteerFile {
    cities: Option<Vec<String>>,
    street_words: Option<Vec<String>>,
    street_suffixes: Option<Vec<String>>,
    max_input_chars: Option<usize>,
}
