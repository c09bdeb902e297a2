//! # Similaridade entre Strings — Casamento Guloso de Blocos
//!
//! Implementa a razão de similaridade de Ratcliff/Obershelp ("gestalt pattern matching"):
//!
//! 1. Encontra o **maior bloco contíguo** comum às duas strings.
//! 2. Repete recursivamente nas partes à esquerda e à direita desse bloco.
//! 3. Soma os tamanhos dos blocos encontrados (`M`) e devolve `2·M / T`,
//!    onde `T` é o número total de caracteres das duas strings.
//!
//! ## Exemplo
//!
//! ```text
//! a = "main st"       b = "main st, city a"
//! blocos: "main st" (7)
//! ratio = 2·7 / (7 + 15) ≈ 0.636
//! ```
//!
//! O algoritmo guloso não é simétrico por natureza (empates no maior bloco são
//! resolvidos pela ordem dos argumentos). [`ratio`] sempre processa o par em
//! ordem lexicográfica, o que garante `ratio(a, b) == ratio(b, a)`.
//!
//! ## Caracteres populares
//!
//! Se a segunda string tem pelo menos [`AUTOJUNK_MIN_LEN`] caracteres, os que aparecem
//! mais de `len / 100 + 1` vezes saem do índice. Eles ainda entram num bloco quando
//! estendem um casamento já encontrado. Sem isso o custo cresce de forma cúbica em
//! entradas longas e repetitivas.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::normalize::normalize;

/// Tamanho mínimo da segunda string para ignorar caracteres populares no índice.
pub const AUTOJUNK_MIN_LEN: usize = 200;

/// Um bloco contíguo comum: `a[a_start..a_start+size] == b[b_start..b_start+size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchingBlock {
    pub a_start: usize,
    pub b_start: usize,
    pub size: usize,
}

/// Similaridade em [0, 1] entre dois textos após [`normalize`].
///
/// - Ambos vazios → `1.0` (nada a discordar).
/// - Exatamente um vazio → `0.0`.
/// - Caso contrário → [`ratio`] entre as formas normalizadas.
pub fn similarity(a: &str, b: &str) -> f64 {
    let na = normalize(a);
    let nb = normalize(b);
    match (na.is_empty(), nb.is_empty()) {
        (true, true) => 1.0,
        (true, false) | (false, true) => 0.0,
        (false, false) => ratio(&na, &nb),
    }
}

/// Versão para campos opcionais: ausente é comparado como string vazia.
pub fn similarity_opt(a: Option<&str>, b: Option<&str>) -> f64 {
    similarity(a.unwrap_or(""), b.unwrap_or(""))
}

/// Razão `2·M / T` sobre os caracteres das strings (sem normalização).
pub fn ratio(a: &str, b: &str) -> f64 {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let first: Vec<char> = first.chars().collect();
    let second: Vec<char> = second.chars().collect();

    let total = first.len() + second.len();
    if total == 0 {
        return 1.0;
    }
    let matched: usize = matching_blocks(&first, &second)
        .iter()
        .map(|block| block.size)
        .sum();
    2.0 * matched as f64 / total as f64
}

/// Todos os blocos comuns encontrados pelo casamento guloso, ordenados por posição.
pub fn matching_blocks(a: &[char], b: &[char]) -> Vec<MatchingBlock> {
    let matcher = BlockMatcher::new(a, b);
    let mut blocks = Vec::new();
    let mut queue = vec![(0, a.len(), 0, b.len())];

    while let Some((alo, ahi, blo, bhi)) = queue.pop() {
        let block = matcher.find_longest_match(alo, ahi, blo, bhi);
        if block.size == 0 {
            continue;
        }
        if alo < block.a_start && blo < block.b_start {
            queue.push((alo, block.a_start, blo, block.b_start));
        }
        let a_end = block.a_start + block.size;
        let b_end = block.b_start + block.size;
        if a_end < ahi && b_end < bhi {
            queue.push((a_end, ahi, b_end, bhi));
        }
        blocks.push(block);
    }

    blocks.sort_by_key(|block| (block.a_start, block.b_start));
    blocks
}

/// Índice das posições de cada caractere em `b`, construído uma única vez por par.
struct BlockMatcher<'a> {
    a: &'a [char],
    b: &'a [char],
    b2j: HashMap<char, Vec<usize>>,
}

impl<'a> BlockMatcher<'a> {
    fn new(a: &'a [char], b: &'a [char]) -> Self {
        let mut b2j: HashMap<char, Vec<usize>> = HashMap::new();
        for (j, c) in b.iter().enumerate() {
            b2j.entry(*c).or_default().push(j);
        }
        if b.len() >= AUTOJUNK_MIN_LEN {
            let limit = b.len() / 100 + 1;
            b2j.retain(|_, positions| positions.len() <= limit);
        }
        Self { a, b, b2j }
    }

    /// Maior bloco comum dentro de `a[alo..ahi]` × `b[blo..bhi]`.
    ///
    /// Em caso de empate vence o bloco que começa mais cedo em `a` e, depois, em `b`.
    fn find_longest_match(&self, alo: usize, ahi: usize, blo: usize, bhi: usize) -> MatchingBlock {
        let mut best = MatchingBlock {
            a_start: alo,
            b_start: blo,
            size: 0,
        };
        // j2len[j] = tamanho do bloco que termina em a[i-1] e b[j]
        let mut j2len: HashMap<usize, usize> = HashMap::new();

        for i in alo..ahi {
            let mut next_j2len: HashMap<usize, usize> = HashMap::new();
            if let Some(positions) = self.b2j.get(&self.a[i]) {
                for &j in positions {
                    if j < blo {
                        continue;
                    }
                    if j >= bhi {
                        break;
                    }
                    let previous = j
                        .checked_sub(1)
                        .and_then(|p| j2len.get(&p))
                        .copied()
                        .unwrap_or(0);
                    let k = previous + 1;
                    next_j2len.insert(j, k);
                    if k > best.size {
                        best = MatchingBlock {
                            a_start: i + 1 - k,
                            b_start: j + 1 - k,
                            size: k,
                        };
                    }
                }
            }
            j2len = next_j2len;
        }

        // Caracteres populares ficaram fora do índice: estende o bloco por eles
        while best.a_start > alo
            && best.b_start > blo
            && self.a[best.a_start - 1] == self.b[best.b_start - 1]
        {
            best.a_start -= 1;
            best.b_start -= 1;
            best.size += 1;
        }
        while best.a_start + best.size < ahi
            && best.b_start + best.size < bhi
            && self.a[best.a_start + best.size] == self.b[best.b_start + best.size]
        {
            best.size += 1;
        }

        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "esperado {expected}, obtido {actual}"
        );
    }

    #[test]
    fn test_empty_rules() {
        assert_eq!(similarity("", ""), 1.0);
        assert_eq!(similarity("  , ", ""), 1.0);
        assert_eq!(similarity("Amsterdam", ""), 0.0);
        assert_eq!(similarity("", "Amsterdam"), 0.0);
        assert_eq!(similarity_opt(None, None), 1.0);
        assert_eq!(similarity_opt(Some("Berlin"), None), 0.0);
    }

    #[test]
    fn test_identical_after_normalization() {
        assert_eq!(similarity("Main St", "  MAIN   st "), 1.0);
    }

    #[test]
    fn test_ratio_known_values() {
        // "abcd" x "bcde": bloco "bcd" → 2·3/8
        assert_close(ratio("abcd", "bcde"), 0.75);
        // "main st" é prefixo de "main st, city a": 2·7/22
        assert_close(ratio("main st", "main st, city a"), 14.0 / 22.0);
        assert_close(ratio("abc", "xyz"), 0.0);
    }

    #[test]
    fn test_matching_blocks_recurse_both_sides() {
        let a: Vec<char> = "xabcyde".chars().collect();
        let b: Vec<char> = "abczde".chars().collect();
        let blocks = matching_blocks(&a, &b);
        let total: usize = blocks.iter().map(|m| m.size).sum();
        // "abc" + "de"
        assert_eq!(total, 5);
        assert_eq!(blocks[0], MatchingBlock { a_start: 1, b_start: 0, size: 3 });
    }

    #[test]
    fn test_ratio_symmetric() {
        let pairs = [
            ("kalverstraat 92", "kalverstr. 92 amsterdam"),
            ("abxcd", "abcdx"),
            ("10 main st", "11 main st, city a"),
            ("qabxcd", "abycdf"),
        ];
        for (a, b) in pairs {
            assert_eq!(ratio(a, b), ratio(b, a), "assimetria em ({a}, {b})");
            assert_eq!(similarity(a, b), similarity(b, a));
        }
    }

    #[test]
    fn test_popular_chars_leave_index_only_for_long_b() {
        let short: Vec<char> = "ab".repeat(99).chars().collect();
        let long: Vec<char> = "ab".repeat(150).chars().collect();

        let matcher = BlockMatcher::new(&short, &short);
        assert_eq!(matcher.b2j.len(), 2);

        // 150 ocorrências > 300 / 100 + 1
        let matcher = BlockMatcher::new(&long, &long);
        assert!(matcher.b2j.is_empty());
    }

    #[test]
    fn test_popular_chars_still_extend_blocks() {
        let text = "kalverstraat 92, 1012 ph amsterdam; ".repeat(20);
        assert_eq!(ratio(&text, &text), 1.0);

        let a: Vec<char> = text.chars().collect();
        let blocks = matching_blocks(&a, &a);
        assert_eq!(blocks, vec![MatchingBlock { a_start: 0, b_start: 0, size: a.len() }]);
    }

    #[test]
    fn test_long_inputs_stay_fast() {
        let address = "Kalverstraat 92, 1012 PH Amsterdam, Netherlands; ";
        let a = address.repeat(500);
        let mut b = a.clone();
        b.insert_str(b.len() / 2, "Damrak 1 ");

        let started = std::time::Instant::now();
        assert_eq!(similarity(&a, &a), 1.0);
        let s = similarity(&a, &b);
        assert!((0.0..=1.0).contains(&s));
        assert_eq!(s, similarity(&b, &a));
        assert!(
            started.elapsed() < std::time::Duration::from_secs(5),
            "levou {:?}",
            started.elapsed()
        );
    }

    #[test]
    fn test_ratio_bounded() {
        let r = ratio("damrak 1 amsterdam", "dam square amsterdam");
        assert!((0.0..=1.0).contains(&r));
    }
}
