//! # Extratores Determinísticos — País, CEP e Número
//!
//! Cada extrator recebe um texto, encontra **no máximo um** componente e devolve
//! `(resto, componente?)`, onde o resto é o texto sem o trecho extraído, com
//! whitespace colapsado e vírgulas/espaços das bordas removidos.
//!
//! ## Ordem fixa
//!
//! ```text
//! "1012 AB Amsterdam, Netherlands"
//!     │ extract_country       → "1012 AB Amsterdam"   + Netherlands
//!     │ extract_postal_code   → "Amsterdam"           + "1012 AB"
//!     │ extract_house_number  → "Amsterdam"           + (ausente)
//! ```
//!
//! Cada estágio opera sobre o resto do anterior. Inverter a ordem muda o
//! resultado (um CEP "1012" seria visto como número de casa, por exemplo).
//!
//! Nenhum extrator falha: ausência do componente é o único sinal de "não encontrado".

use std::ops::Range;
use std::sync::LazyLock;

use regex::Regex;

use crate::countries::CountryAliasTable;
use crate::normalize::{decompose, is_separator, normalize_spaces, strip_part};

/// Sequência de 4+ dígitos iniciando em fronteira de palavra.
static POSTAL_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{4,}").expect("valid postal digits pattern"));

/// Sufixo opcional do CEP: 2 letras (separador opcional) ou 2 dígitos (separador obrigatório).
static POSTAL_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:[\s-]?[A-Za-z]{2}|[\s-][0-9]{2})").expect("valid postal suffix pattern")
});

/// 1 a 3 dígitos, opcionalmente seguidos de uma letra (com ou sem espaço).
static HOUSE_NUMBER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(\d{1,3})(?:\s*([A-Za-z]))?\b").expect("valid house number pattern")
});

/// Extrai o país usando a tabela padrão.
pub fn extract_country(text: &str) -> (String, Option<String>) {
    extract_country_with(&CountryAliasTable::builtin(), text)
}

/// Extrai o país usando uma tabela específica.
///
/// O texto é decomposto (NFD) antes da busca; o resto devolvido também fica em NFD.
/// Remove exatamente a ocorrência do alias escolhido e as vírgulas/espaços adjacentes.
pub fn extract_country_with(table: &CountryAliasTable, text: &str) -> (String, Option<String>) {
    if text.is_empty() {
        return (String::new(), None);
    }

    let decomposed = decompose(text);
    let Some(found) = table.find(&decomposed) else {
        return (normalize_spaces(&decomposed), None);
    };

    let before = decomposed[..found.start].trim_end_matches(is_separator);
    let after = decomposed[found.end..].trim_start_matches(is_separator);
    let rest = normalize_spaces(&format!("{before} {after}"));
    (rest, strip_part(Some(found.country)))
}

/// Extrai o CEP. Formatos aceitos:
///
/// - só dígitos: `12345`
/// - dígitos + 2 letras: `1234AB`, `1234 AB`, `1234-AB`
/// - dígitos + extensão de 2 dígitos, só com separador: `12345-01`, `123456 01`
///
/// O token precisa terminar em fronteira clara (espaço, vírgula, fim, `.`, `;`, `:`)
/// para não engolir a palavra seguinte ("1234 something" não vira "1234 so").
/// Com vários candidatos, vence o **último**: CEPs costumam vir no fim do endereço.
pub fn extract_postal_code(text: &str) -> (String, Option<String>) {
    if text.is_empty() {
        return (String::new(), None);
    }

    match postal_candidates(text).pop() {
        Some(span) => remove_span(text, span),
        None => (normalize_spaces(text), None),
    }
}

/// Extrai o número da casa (último candidato), normalizado para `dígitos + letra minúscula`.
///
/// "29 A" → "29a". Sequências de 4+ dígitos nunca casam.
pub fn extract_house_number(text: &str) -> (String, Option<String>) {
    if text.is_empty() {
        return (String::new(), None);
    }

    let Some(caps) = HOUSE_NUMBER.captures_iter(text).last() else {
        return (normalize_spaces(text), None);
    };
    let Some(whole) = caps.get(0) else {
        return (normalize_spaces(text), None);
    };

    let digits = caps.get(1).map_or("", |m| m.as_str());
    let number = match caps.get(2) {
        Some(letter) => format!("{}{}", digits, letter.as_str().to_lowercase()),
        None => digits.to_string(),
    };

    let rest = normalize_spaces(&format!("{} {}", &text[..whole.start()], &text[whole.end()..]));
    (rest, strip_part(Some(&number)))
}

/// Todos os spans de CEP, da esquerda para a direita.
fn postal_candidates(text: &str) -> Vec<Range<usize>> {
    let mut spans = Vec::new();

    for digits in POSTAL_DIGITS.find_iter(text) {
        let digits_end = digits.end();

        // Primeiro tenta com sufixo; se a fronteira falhar, recua para só os dígitos
        if let Some(suffix) = POSTAL_SUFFIX.find(&text[digits_end..]) {
            let end = digits_end + suffix.end();
            if ends_at_boundary(&text[end..]) {
                spans.push(digits.start()..end);
                continue;
            }
        }
        if ends_at_boundary(&text[digits_end..]) {
            spans.push(digits.start()..digits_end);
        }
    }

    spans
}

fn ends_at_boundary(following: &str) -> bool {
    match following.chars().next() {
        None => true,
        Some(c) => c.is_whitespace() || matches!(c, ',' | '.' | ';' | ':'),
    }
}

/// Remove o span do texto e devolve `(resto, token)`.
fn remove_span(text: &str, span: Range<usize>) -> (String, Option<String>) {
    let token = strip_part(Some(&text[span.clone()]));
    let rest = normalize_spaces(&format!("{} {}", &text[..span.start], &text[span.end..]));
    (rest, token)
}
