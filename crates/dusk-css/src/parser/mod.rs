//! Stylesheet parsing and serialization.

/// CSS parser implementation per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod css_parser;
/// Writing a parsed stylesheet back out, readable or minified.
pub mod serialize;

pub use css_parser::{
    AtRule, AtRuleBlock, CSSParser, ComponentValue, Declaration, Rule, StyleRule, Stylesheet,
    parse_stylesheet, split_selector_list,
};
