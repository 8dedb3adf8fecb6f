//! CSS Token types per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
//!
//! "The output of the tokenization step is a stream of zero or more of the
//! following tokens: `<ident-token>`, `<function-token>`, `<at-keyword-token>`,
//! `<hash-token>`, `<string-token>`, `<bad-string-token>`, `<url-token>`,
//! `<bad-url-token>`, `<delim-token>`, `<number-token>`, `<percentage-token>`,
//! `<dimension-token>`, `<whitespace-token>`, `<CDO-token>`, `<CDC-token>`,
//! `<colon-token>`, `<semicolon-token>`, `<comma-token>`, `<[-token>`,
//! `<]-token>`, `<(-token>`, `<)-token>`, `<{-token>`, and `<}-token>`."
//!
//! dusk adds a comment token, produced only by
//! [`CSSTokenizer::with_comments`](super::CSSTokenizer::with_comments).

use core::fmt;

/// [§ 4.2 Definitions](https://www.w3.org/TR/css-syntax-3/#token-diagrams)
///
/// "A `<hash-token>` with the type flag set to 'id'... or 'unrestricted'."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    /// The hash token's value is a valid identifier (usable as an ID selector).
    Id,
    /// The hash token's value is not a valid identifier (`#1a2b3c`).
    Unrestricted,
}

/// "A `<number-token>` has a type flag set to either 'integer' or 'number'."
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericType {
    /// No decimal point or exponent.
    Integer,
    /// Has a decimal point or exponent.
    Number,
}

/// The numeric part shared by number, percentage and dimension tokens.
///
/// `repr` keeps the code points exactly as written so serialization does
/// not change `+5` into `5` or `1e3` into `1000`; the sign matters inside
/// `An+B` arguments.
#[derive(Debug, Clone, PartialEq)]
pub struct NumericValue {
    /// "a numeric value"
    pub value: f64,
    /// The integer value if this is an integer type.
    pub int_value: Option<i64>,
    /// "a type flag set to either 'integer' or 'number'"
    pub numeric_type: NumericType,
    /// [§ 4.3.12](https://www.w3.org/TR/css-syntax-3/#consume-number) "repr"
    pub repr: String,
}

/// CSS tokens as defined by the CSS Syntax Module Level 3 specification.
#[derive(Debug, Clone, PartialEq)]
pub enum CSSToken {
    /// "`<ident-token>`"
    Ident(String),

    /// "`<function-token>`": an identifier immediately followed by `(`.
    Function(String),

    /// "`<at-keyword-token>`": `@` followed by an identifier.
    AtKeyword(String),

    /// "`<hash-token>`": `#` followed by a name.
    Hash {
        /// The name after `#`.
        value: String,
        /// Whether the name is a valid identifier.
        hash_type: HashType,
    },

    /// "`<string-token>`", quotes removed and escapes resolved.
    String(String),

    /// "`<bad-string-token>`" (unterminated at a newline).
    BadString,

    /// "`<url-token>`" from an unquoted `url(...)`.
    Url(String),

    /// "`<bad-url-token>`"
    BadUrl,

    /// "`<delim-token>`": a single code point.
    Delim(char),

    /// "`<number-token>`"
    Number(NumericValue),

    /// "`<percentage-token>`"
    Percentage(NumericValue),

    /// "`<dimension-token>`"
    Dimension {
        /// The numeric part.
        number: NumericValue,
        /// "a unit"
        unit: String,
    },

    /// "`<whitespace-token>`"
    Whitespace,

    /// "`<CDO-token>`" (`<!--`)
    CDO,

    /// "`<CDC-token>`" (`-->`)
    CDC,

    /// "`<colon-token>`"
    Colon,

    /// "`<semicolon-token>`"
    Semicolon,

    /// "`<comma-token>`"
    Comma,

    /// `<[-token>`
    LeftBracket,

    /// `<]-token>`
    RightBracket,

    /// `<(-token>`
    LeftParen,

    /// `<)-token>`
    RightParen,

    /// `<{-token>`
    LeftBrace,

    /// `<}-token>`
    RightBrace,

    /// A `/* ... */` comment, text between the delimiters.
    Comment(String),

    /// End of file - signals end of input
    EOF,
}

impl CSSToken {
    /// Create a new ident token.
    #[must_use]
    pub fn ident(value: impl Into<String>) -> Self {
        Self::Ident(value.into())
    }

    /// Create a new function token.
    #[must_use]
    pub fn function(name: impl Into<String>) -> Self {
        Self::Function(name.into())
    }

    /// Create a new hash token with id type.
    #[must_use]
    pub fn hash_id(value: impl Into<String>) -> Self {
        Self::Hash {
            value: value.into(),
            hash_type: HashType::Id,
        }
    }

    /// Create a new delim token.
    #[must_use]
    pub const fn delim(c: char) -> Self {
        Self::Delim(c)
    }

    /// Returns true if this is an EOF token.
    #[must_use]
    pub const fn is_eof(&self) -> bool {
        matches!(self, Self::EOF)
    }

    /// Returns true if this is a whitespace token.
    #[must_use]
    pub const fn is_whitespace(&self) -> bool {
        matches!(self, Self::Whitespace)
    }

    /// Returns true for whitespace and comments, the tokens a parser may skip.
    #[must_use]
    pub const fn is_trivia(&self) -> bool {
        matches!(self, Self::Whitespace | Self::Comment(_))
    }
}

impl fmt::Display for CSSToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(v) => write!(f, "<ident:{v}>"),
            Self::Function(v) => write!(f, "<function:{v}(>"),
            Self::AtKeyword(v) => write!(f, "<at-keyword:@{v}>"),
            Self::Hash { value, .. } => write!(f, "<hash:#{value}>"),
            Self::String(v) => write!(f, "<string:\"{v}\">"),
            Self::BadString => f.write_str("<bad-string>"),
            Self::Url(v) => write!(f, "<url:{v}>"),
            Self::BadUrl => f.write_str("<bad-url>"),
            Self::Delim(c) => write!(f, "<delim:{c}>"),
            Self::Number(n) => write!(f, "<number:{}>", n.repr),
            Self::Percentage(n) => write!(f, "<percentage:{}%>", n.repr),
            Self::Dimension { number, unit } => write!(f, "<dimension:{}{unit}>", number.repr),
            Self::Whitespace => f.write_str("<whitespace>"),
            Self::CDO => f.write_str("<CDO>"),
            Self::CDC => f.write_str("<CDC>"),
            Self::Colon => f.write_str("<colon>"),
            Self::Semicolon => f.write_str("<semicolon>"),
            Self::Comma => f.write_str("<comma>"),
            Self::LeftBracket => f.write_str("<[>"),
            Self::RightBracket => f.write_str("<]>"),
            Self::LeftParen => f.write_str("<(>"),
            Self::RightParen => f.write_str("<)>"),
            Self::LeftBrace => f.write_str("<{>"),
            Self::RightBrace => f.write_str("<}>"),
            Self::Comment(_) => f.write_str("<comment>"),
            Self::EOF => f.write_str("<EOF>"),
        }
    }
}
