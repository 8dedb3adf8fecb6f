//! CSS tokenizer module.

/// CSS tokenizer implementation.
pub mod css_tokenizer;
/// Token serialization per [CSS Syntax Level 3 § 9](https://www.w3.org/TR/css-syntax-3/#serialization).
pub mod serialize;
/// CSS token types per [CSS Syntax Level 3 § 4](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod token;

pub use css_tokenizer::CSSTokenizer;
pub use serialize::{serialize_identifier, serialize_string, tokens_to_css};
pub use token::{CSSToken, HashType, NumericType, NumericValue};
