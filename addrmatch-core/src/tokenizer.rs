//! # Tokenizador de Endereços
//!
//! Divide o resto de um endereço em tokens (palavras e pontuação), preservando a
//! posição original de cada um (offset em bytes). Os offsets permitem recortar a
//! entidade encontrada (rua, cidade) diretamente do texto original, sem reformatá-lo.
//!
//! Usa as fronteiras de palavra do Unicode (UAX #29): acentos combinantes (NFD)
//! permanecem grudados na letra, e pontuação vira token próprio.
//!
//! ## Exemplo
//!
//! ```rust
//! use addrmatch_core::tokenizer::tokenize;
//!
//! let tokens = tokenize("Kalverstr. 92, Den Haag");
//! let texts: Vec<&str> = tokens.iter().map(|t| t.text.as_str()).collect();
//! assert_eq!(texts, vec!["Kalverstr", ".", "92", ",", "Den", "Haag"]);
//! ```

use serde::{Deserialize, Serialize};
use unicode_segmentation::UnicodeSegmentation;

/// Um token extraído do texto original.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Token {
    /// O texto do token (ex: "Damrak", ",", "92").
    pub text: String,
    /// Índice de byte inicial no texto original (inclusive).
    pub start: usize,
    /// Índice de byte final no texto original (exclusivo).
    pub end: usize,
    /// Índice sequencial do token na lista.
    pub index: usize,
}

impl Token {
    /// Vírgula ou ponto-e-vírgula: delimitam segmentos do endereço.
    pub fn is_segment_break(&self) -> bool {
        self.text == "," || self.text == ";"
    }

    /// Contém ao menos uma letra ou dígito.
    pub fn is_word(&self) -> bool {
        self.text.chars().any(char::is_alphanumeric)
    }
}

/// Tokeniza descartando whitespace.
pub fn tokenize(text: &str) -> Vec<Token> {
    text.split_word_bound_indices()
        .filter(|(_, piece)| !piece.chars().all(char::is_whitespace))
        .enumerate()
        .map(|(index, (start, piece))| Token {
            text: piece.to_string(),
            start,
            end: start + piece.len(),
            index,
        })
        .collect()
}

/// Agrupa índices de tokens em segmentos separados por vírgula/ponto-e-vírgula.
///
/// Cada segmento é um intervalo `start..end` de índices de tokens, nunca vazio.
pub fn segments(tokens: &[Token]) -> Vec<std::ops::Range<usize>> {
    let mut result = Vec::new();
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        if token.is_segment_break() {
            if i > start {
                result.push(start..i);
            }
            start = i + 1;
        }
    }
    if start < tokens.len() {
        result.push(start..tokens.len());
    }
    result
}
