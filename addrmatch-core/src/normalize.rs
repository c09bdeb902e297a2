//! # Normalização de Texto
//!
//! Todas as comparações do sistema passam por uma forma canônica única:
//!
//! 1. **Decomposição Unicode (NFD)**: "é" vira "e" + acento combinante, de modo que
//!    aliases acentuados e não acentuados se comportem de forma consistente.
//! 2. **Minúsculas**: "Amsterdam" e "AMSTERDAM" são o mesmo texto.
//! 3. **Espaços colapsados**: qualquer sequência de whitespace vira um único espaço.
//! 4. **Bordas limpas**: espaços e vírgulas no início/fim são removidos.
//!
//! Os extratores usam apenas [`normalize_spaces`] (preserva maiúsculas) porque o
//! `rest` devolvido deve continuar legível; o score usa [`normalize`].

use unicode_normalization::UnicodeNormalization;

/// Forma canônica para comparação. Nunca falha: entrada vazia ou só com
/// espaços produz string vazia.
///
/// ```rust
/// use addrmatch_core::normalize::normalize;
///
/// assert_eq!(normalize("  Damrak 1,  AMSTERDAM , "), "damrak 1, amsterdam");
/// assert_eq!(normalize(" , "), "");
/// ```
pub fn normalize(text: &str) -> String {
    let lowered = decompose(text).to_lowercase();
    normalize_spaces(&lowered)
}

/// Aplica apenas a decomposição canônica (NFD).
pub fn decompose(text: &str) -> String {
    text.nfd().collect()
}

/// Colapsa whitespace em espaços simples e remove espaços/vírgulas das bordas,
/// preservando maiúsculas.
pub fn normalize_spaces(text: &str) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    trim_separators(&collapsed).to_string()
}

/// Remove espaços e vírgulas das bordas.
pub fn trim_separators(text: &str) -> &str {
    text.trim_matches(is_separator)
}

/// Separadores de borda: vírgula ou qualquer whitespace.
pub fn is_separator(c: char) -> bool {
    c == ',' || c.is_whitespace()
}

/// Limpa um valor extraído; vazio após a limpeza vira ausente.
pub fn strip_part(value: Option<&str>) -> Option<String> {
    let trimmed = trim_separators(value?);
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Forma de comparação do CEP: sem espaços/hífens, em maiúsculas ("1012 lg" → "1012LG").
pub fn normalize_postal_code(code: &str) -> String {
    code.chars()
        .filter(|c| !c.is_whitespace() && *c != '-')
        .collect::<String>()
        .to_uppercase()
}

/// Forma de comparação do número da casa: sem espaços, em minúsculas ("29 A" → "29a").
pub fn normalize_house_number(number: &str) -> String {
    number
        .chars()
        .filter(|c| !c.is_whitespace())
        .collect::<String>()
        .to_lowercase()
}
