//! CSS tokenizer, stylesheet parser, selectors, and selector-list merging for dusk.
//!
//! # Scope
//!
//! This crate implements:
//! - **CSS Tokenizer** ([§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization))
//!   - All token types: ident, function, at-keyword, hash, string, url, number, dimension, etc.
//!   - Escape sequences
//!   - Optional comment tokens, for the selector parser
//!
//! - **CSS Parser** ([§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing))
//!   - Stylesheet parsing (style rules, at-rules, declarations)
//!   - Conditional group rules and [CSS Nesting](https://www.w3.org/TR/css-nesting-1/)
//!   - Readable and minified serialization
//!
//! - **CSS Selectors** ([Selectors Level 4](https://www.w3.org/TR/selectors-4/))
//!   - Type, class, ID, universal, attribute, nesting selectors
//!   - Pseudo-classes, including `:is()`, `:where()`, `:not()`, `:has()`
//!   - Pseudo-elements
//!   - Combinators (descendant, child, next-sibling, subsequent-sibling)
//!   - Specificity and matching against a [`dusk_dom::DomTree`]
//!
//! - **Selector merging** ([`merge`])
//!   - `.a.x, .a.y` becomes `.a:is(.x, .y)`
//!   - `safe`, `greedy` and `unsafe` modes, `:is()` or `:where()` wrappers
//!   - A stylesheet pass over every style rule
//!
//! # Not Yet Implemented
//!
//! - Namespaced selectors (`svg|a`)
//! - The column combinator (`||`)

/// Selector-list merging.
pub mod merge;
/// CSS parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
pub mod parser;
/// CSS selector parsing, serialization and matching per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
pub mod selector;
/// CSS tokenizer per [§ 4 Tokenization](https://www.w3.org/TR/css-syntax-3/#tokenization).
pub mod tokenizer;

// Re-exports for convenience
pub use merge::{
    MergeError, MergeMode, MergeOptions, MergePseudo, MergeReport, SelectorMerger,
    merge_selector_list, merge_selectors,
};
pub use parser::{Rule, StyleRule, Stylesheet, parse_stylesheet};
pub use selector::{SelectorList, SelectorParseError, Specificity, parse_selector_list};
pub use tokenizer::{CSSToken, CSSTokenizer};
