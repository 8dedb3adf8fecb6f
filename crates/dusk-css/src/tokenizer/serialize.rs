//! Writing tokens back out as CSS text.

use core::fmt::Write;

use super::token::{CSSToken, HashType};

/// [CSSOM § 2.1 Serializing Identifiers](https://drafts.csswg.org/cssom/#serialize-an-identifier)
#[must_use]
pub fn serialize_identifier(ident: &str) -> String {
    let mut out = String::with_capacity(ident.len());
    let chars: Vec<char> = ident.chars().collect();
    for (i, &c) in chars.iter().enumerate() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1F}' | '\u{7F}' => escape_code_point(c, &mut out),
            // "If the character is the first character and is in the range [0-9]"
            // or the second after a leading hyphen.
            '0'..='9' if i == 0 || (i == 1 && chars[0] == '-') => escape_code_point(c, &mut out),
            // "If the character is the first character and is a "-" (U+002D),
            // and there is no second character"
            '-' if i == 0 && chars.len() == 1 => out.push_str("\\-"),
            c if !c.is_ascii() || c == '-' || c == '_' || c.is_ascii_alphanumeric() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

/// Serialize a hash token's name, which may start with a digit.
fn serialize_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    for c in name.chars() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1F}' | '\u{7F}' => escape_code_point(c, &mut out),
            c if !c.is_ascii() || c == '-' || c == '_' || c.is_ascii_alphanumeric() => out.push(c),
            c => {
                out.push('\\');
                out.push(c);
            }
        }
    }
    out
}

/// [CSSOM § 2.1 Serializing Strings](https://drafts.csswg.org/cssom/#serialize-a-string)
///
/// Always uses double quotes.
#[must_use]
pub fn serialize_string(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push('"');
    for c in value.chars() {
        match c {
            '\0' => out.push('\u{FFFD}'),
            '\u{1}'..='\u{1F}' | '\u{7F}' => escape_code_point(c, &mut out),
            '"' | '\\' => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

fn escape_code_point(c: char, out: &mut String) {
    let _ = write!(out, "\\{:x} ", u32::from(c));
}

/// Append the CSS text of one token.
pub fn write_token(token: &CSSToken, out: &mut String) {
    match token {
        CSSToken::Ident(v) => out.push_str(&serialize_identifier(v)),
        CSSToken::Function(v) => {
            out.push_str(&serialize_identifier(v));
            out.push('(');
        }
        CSSToken::AtKeyword(v) => {
            out.push('@');
            out.push_str(&serialize_identifier(v));
        }
        CSSToken::Hash { value, hash_type } => {
            out.push('#');
            match hash_type {
                HashType::Id => out.push_str(&serialize_identifier(value)),
                HashType::Unrestricted => out.push_str(&serialize_name(value)),
            }
        }
        CSSToken::String(v) => out.push_str(&serialize_string(v)),
        CSSToken::Url(v) => {
            out.push_str("url(");
            out.push_str(&serialize_url(v));
            out.push(')');
        }
        CSSToken::BadString | CSSToken::BadUrl | CSSToken::EOF => {}
        CSSToken::Delim(c) => out.push(*c),
        CSSToken::Number(n) => out.push_str(&n.repr),
        CSSToken::Percentage(n) => {
            out.push_str(&n.repr);
            out.push('%');
        }
        CSSToken::Dimension { number, unit } => {
            out.push_str(&number.repr);
            // A unit like `e3` would otherwise read back as an exponent.
            let mut unit_chars = unit.chars();
            match unit_chars.next() {
                Some(e @ ('e' | 'E')) => {
                    escape_code_point(e, out);
                    out.push_str(&serialize_name(unit_chars.as_str()));
                }
                _ => out.push_str(&serialize_identifier(unit)),
            }
        }
        CSSToken::Whitespace => out.push(' '),
        CSSToken::CDO => out.push_str("<!--"),
        CSSToken::CDC => out.push_str("-->"),
        CSSToken::Colon => out.push(':'),
        CSSToken::Semicolon => out.push(';'),
        CSSToken::Comma => out.push(','),
        CSSToken::LeftBracket => out.push('['),
        CSSToken::RightBracket => out.push(']'),
        CSSToken::LeftParen => out.push('('),
        CSSToken::RightParen => out.push(')'),
        CSSToken::LeftBrace => out.push('{'),
        CSSToken::RightBrace => out.push('}'),
        CSSToken::Comment(text) => {
            out.push_str("/*");
            out.push_str(text);
            out.push_str("*/");
        }
    }
}

fn serialize_url(value: &str) -> String {
    value
        .chars()
        .fold(String::with_capacity(value.len()), |mut out, c| {
            if matches!(c, '"' | '\'' | '(' | ')' | '\\') || c.is_whitespace() {
                out.push('\\');
            }
            out.push(c);
            out
        })
}

/// [§ 9 Serialization](https://www.w3.org/TR/css-syntax-3/#serialization)
///
/// "...an empty comment (/**/) must be inserted between adjacent tokens"
/// whose concatenation would tokenize differently.
fn needs_separator(prev: &CSSToken, next: &CSSToken) -> bool {
    use CSSToken::{
        AtKeyword, BadUrl, CDC, Delim, Dimension, Function, Hash, Ident, LeftParen, Number,
        Percentage, Url,
    };

    // A number written with a leading `+` cannot join what precedes it.
    if matches!(next, Number(n) | Percentage(n) | Dimension { number: n, .. } if n.repr.starts_with('+'))
    {
        return false;
    }

    let identish = matches!(
        next,
        Ident(_) | Function(_) | Url(_) | BadUrl | Number(_) | Percentage(_) | Dimension { .. }
    ) || *next == Delim('-');

    match prev {
        Ident(_) => identish || matches!(next, CDC | LeftParen),
        AtKeyword(_) | Hash { .. } | Dimension { .. } | Delim('#' | '-') => {
            identish || matches!(next, CDC)
        }
        Number(_) => {
            matches!(
                next,
                Ident(_) | Function(_) | Url(_) | BadUrl | Number(_) | Percentage(_) | Dimension { .. }
            ) || *next == Delim('%')
        }
        Delim('@') => identish || matches!(next, CDC),
        Delim('.' | '+') => matches!(next, Number(_) | Percentage(_) | Dimension { .. }),
        Delim('/') => *next == Delim('*'),
        _ => false,
    }
}

/// Whitespace after these tokens never changes meaning.
const fn opens(token: &CSSToken) -> bool {
    matches!(
        token,
        CSSToken::LeftParen
            | CSSToken::LeftBracket
            | CSSToken::Comma
            | CSSToken::Semicolon
            | CSSToken::LeftBrace
            | CSSToken::RightBrace
            | CSSToken::Function(_)
    )
}

/// Whitespace before these tokens never changes meaning.
const fn closes(token: &CSSToken) -> bool {
    matches!(
        token,
        CSSToken::RightParen
            | CSSToken::RightBracket
            | CSSToken::Comma
            | CSSToken::Semicolon
            | CSSToken::LeftBrace
            | CSSToken::RightBrace
    )
}

/// Serialize a token sequence.
///
/// Runs of whitespace collapse to one space and leading/trailing whitespace is
/// dropped. With `minify`, comments and whitespace next to punctuation are
/// dropped too.
#[must_use]
pub fn tokens_to_css(tokens: &[CSSToken], minify: bool) -> String {
    let mut out = String::new();
    let mut prev: Option<&CSSToken> = None;
    let mut pending_space = false;

    for token in tokens {
        match token {
            CSSToken::EOF => break,
            CSSToken::Whitespace => {
                pending_space = true;
                continue;
            }
            CSSToken::Comment(_) if minify => continue,
            _ => {}
        }

        if let Some(p) = prev {
            let droppable = minify && (opens(p) || closes(token));
            if pending_space && !droppable {
                out.push(' ');
            } else if needs_separator(p, token) {
                out.push_str("/**/");
            }
        }
        pending_space = false;
        write_token(token, &mut out);
        prev = Some(token);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tokenizer::CSSTokenizer;

    fn round_trip(input: &str, minify: bool) -> String {
        let mut tokenizer = CSSTokenizer::new(input);
        tokenizer.run();
        tokens_to_css(tokenizer.tokens(), minify)
    }

    #[test]
    fn test_serialize_identifier_escapes() {
        assert_eq!(serialize_identifier("sm:flex"), "sm\\:flex");
        assert_eq!(serialize_identifier("1col"), "\\31 col");
        assert_eq!(serialize_identifier("-2x"), "-\\32 x");
        assert_eq!(serialize_identifier("-"), "\\-");
        assert_eq!(serialize_identifier("--custom_name"), "--custom_name");
    }

    #[test]
    fn test_serialize_string_escapes_quotes() {
        assert_eq!(serialize_string("a\"b\\c"), "\"a\\\"b\\\\c\"");
    }

    #[test]
    fn test_minify_drops_whitespace_near_punctuation() {
        assert_eq!(
            round_trip("  screen and ( min-width : 10px ) , print ", true),
            "screen and (min-width : 10px),print"
        );
    }

    #[test]
    fn test_readable_collapses_whitespace() {
        assert_eq!(round_trip("1px   solid\n red", false), "1px solid red");
    }

    #[test]
    fn test_number_sign_survives() {
        assert_eq!(round_trip("2n+1", true), "2n+1");
        assert_eq!(round_trip("-2n + 3", true), "-2n + 3");
    }

    #[test]
    fn test_separator_between_adjacent_idents() {
        assert_eq!(round_trip("a/**/b", true), "a/**/b");
    }
}
