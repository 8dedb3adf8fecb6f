//! CSS Parser per [§ 5 Parsing](https://www.w3.org/TR/css-syntax-3/#parsing).
//!
//! "The input to the parsing stage is a stream of tokens from the tokenization stage."
//!
//! Style rule preludes are kept as raw tokens: the selector merge pass reads
//! them through [`StyleRule::selector_text`] and writes its result back with
//! [`StyleRule::set_selector_text`]. Conditional group rules (`@media`,
//! `@supports`, ...) and nested style rules are parsed into rules so the
//! merge pass reaches every selector in the sheet.

use crate::tokenizer::{CSSToken, CSSTokenizer, tokens_to_css};

/// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
///
/// A CSS declaration (e.g., `color: red`).
#[derive(Debug, Clone, PartialEq)]
pub struct Declaration {
    /// The property name.
    pub name: String,
    /// The property value as component values.
    pub value: Vec<ComponentValue>,
    /// Whether the declaration has `!important`.
    pub important: bool,
}

impl Declaration {
    /// Whether this is a custom property (`--name`).
    #[must_use]
    pub fn is_custom_property(&self) -> bool {
        self.name.starts_with("--")
    }

    fn contains_curly_block(&self) -> bool {
        self.value
            .iter()
            .any(|v| matches!(v, ComponentValue::Block { token: '{', .. }))
    }
}

/// [§ 5.4.9 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
#[derive(Debug, Clone, PartialEq)]
pub enum ComponentValue {
    /// A preserved token.
    Token(CSSToken),
    /// A function with its contents.
    Function {
        /// The function name.
        name: String,
        /// The function arguments.
        value: Vec<ComponentValue>,
    },
    /// A simple block.
    Block {
        /// The opening token character.
        token: char,
        /// The block contents.
        value: Vec<ComponentValue>,
    },
}

/// A style rule: selector prelude plus its block.
#[derive(Debug, Clone, PartialEq)]
pub struct StyleRule {
    /// The selector tokens, as written (trimmed of surrounding whitespace).
    pub prelude: Vec<CSSToken>,
    /// The declarations in this rule block.
    pub declarations: Vec<Declaration>,
    /// [CSS Nesting](https://www.w3.org/TR/css-nesting-1/) rules inside the block.
    pub rules: Vec<Rule>,
}

impl StyleRule {
    /// The selector list as text.
    #[must_use]
    pub fn selector_text(&self) -> String {
        tokens_to_css(&self.prelude, false)
    }

    /// Replace the selector list.
    pub fn set_selector_text(&mut self, text: &str) {
        let mut tokenizer = CSSTokenizer::new(text);
        tokenizer.run();
        let mut tokens = tokenizer.into_tokens();
        let _ = tokens.pop();
        self.prelude = trim_whitespace(tokens);
    }

    /// Number of comma-separated alternatives in the prelude.
    #[must_use]
    pub fn selector_count(&self) -> usize {
        split_selector_list(&self.prelude).len()
    }
}

/// What an at-rule's `{}` block holds.
#[derive(Debug, Clone, PartialEq)]
pub enum AtRuleBlock {
    /// Conditional group rule at the top level: a list of rules.
    Rules(Vec<Rule>),
    /// Conditional group rule nested in a style rule: declarations and rules.
    Style {
        /// Declarations that apply to the enclosing selector.
        declarations: Vec<Declaration>,
        /// Nested rules.
        rules: Vec<Rule>,
    },
    /// Any other block (`@font-face`, `@keyframes`, ...), never rewritten.
    Raw(Vec<ComponentValue>),
}

/// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
#[derive(Debug, Clone, PartialEq)]
pub struct AtRule {
    /// The at-keyword name (without the `@`).
    pub name: String,
    /// The prelude component values.
    pub prelude: Vec<ComponentValue>,
    /// The optional block.
    pub block: Option<AtRuleBlock>,
}

/// A CSS rule (either a style rule or an at-rule).
#[derive(Debug, Clone, PartialEq)]
pub enum Rule {
    /// A style rule (qualified rule).
    Style(StyleRule),
    /// An at-rule.
    At(AtRule),
}

/// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Stylesheet {
    /// The list of rules in the stylesheet.
    pub rules: Vec<Rule>,
}

/// Tokenize and parse a stylesheet.
#[must_use]
pub fn parse_stylesheet(css: &str) -> Stylesheet {
    let mut tokenizer = CSSTokenizer::new(css);
    tokenizer.run();
    CSSParser::new(tokenizer.into_tokens()).parse_stylesheet()
}

/// [CSS Conditional Rules § 2](https://www.w3.org/TR/css-conditional-3/#processing)
/// and friends: at-rules whose block holds rules rather than declarations.
fn is_group_rule(name: &str) -> bool {
    [
        "media",
        "supports",
        "container",
        "layer",
        "document",
        "-moz-document",
        "scope",
        "starting-style",
    ]
    .iter()
    .any(|group| name.eq_ignore_ascii_case(group))
}

/// CSS parser
pub struct CSSParser {
    tokens: Vec<CSSToken>,
    position: usize,
}

impl CSSParser {
    /// Create a new parser from a list of tokens.
    #[must_use]
    pub const fn new(tokens: Vec<CSSToken>) -> Self {
        Self {
            tokens,
            position: 0,
        }
    }

    /// [§ 5.3.3 Parse a stylesheet](https://www.w3.org/TR/css-syntax-3/#parse-stylesheet)
    pub fn parse_stylesheet(&mut self) -> Stylesheet {
        let rules = self.consume_list_of_rules(false);
        Stylesheet { rules }
    }

    /// [§ 5.3.6 Parse a list of declarations](https://www.w3.org/TR/css-syntax-3/#parse-list-of-declarations)
    pub fn parse_declaration_list(&mut self) -> Vec<Declaration> {
        self.consume_style_block_contents().0
    }

    /// [§ 5.4.1 Consume a list of rules](https://www.w3.org/TR/css-syntax-3/#consume-list-of-rules)
    ///
    /// When `nested`, stops (without consuming) at the `}` closing the parent block.
    fn consume_list_of_rules(&mut self, nested: bool) -> Vec<Rule> {
        let mut rules = Vec::new();

        loop {
            match self.peek() {
                Some(CSSToken::Whitespace) => self.advance(),
                None | Some(CSSToken::EOF) => return rules,
                Some(CSSToken::RightBrace) if nested => return rules,
                // "If the top-level flag is set, do nothing."
                Some(CSSToken::CDO | CSSToken::CDC) if !nested => self.advance(),
                Some(CSSToken::AtKeyword(_)) => {
                    if let Some(at_rule) = self.consume_at_rule(false) {
                        rules.push(Rule::At(at_rule));
                    }
                }
                Some(_) => {
                    if let Some(rule) = self.consume_qualified_rule(nested) {
                        rules.push(Rule::Style(rule));
                    }
                }
            }
        }
    }

    /// [§ 5.4.2 Consume an at-rule](https://www.w3.org/TR/css-syntax-3/#consume-at-rule)
    fn consume_at_rule(&mut self, in_style: bool) -> Option<AtRule> {
        let Some(CSSToken::AtKeyword(name)) = self.consume() else {
            return None;
        };
        let mut prelude = Vec::new();

        loop {
            match self.peek() {
                Some(CSSToken::Semicolon) => {
                    self.advance();
                    break;
                }
                // "This is a parse error. Return the at-rule." The `}` belongs to
                // the enclosing block.
                None | Some(CSSToken::EOF | CSSToken::RightBrace) => break,
                Some(CSSToken::LeftBrace) => {
                    let block = if is_group_rule(&name) {
                        self.advance();
                        let block = if in_style {
                            let (declarations, rules) = self.consume_style_block_contents();
                            AtRuleBlock::Style {
                                declarations,
                                rules,
                            }
                        } else {
                            AtRuleBlock::Rules(self.consume_list_of_rules(true))
                        };
                        self.consume_if(&CSSToken::RightBrace);
                        block
                    } else {
                        AtRuleBlock::Raw(self.consume_simple_block())
                    };
                    return Some(AtRule {
                        name,
                        prelude: trim_component_whitespace(prelude),
                        block: Some(block),
                    });
                }
                Some(_) => {
                    if let Some(value) = self.consume_component_value() {
                        prelude.push(value);
                    }
                }
            }
        }

        Some(AtRule {
            name,
            prelude: trim_component_whitespace(prelude),
            block: None,
        })
    }

    /// [§ 5.4.3 Consume a qualified rule](https://www.w3.org/TR/css-syntax-3/#consume-qualified-rule)
    fn consume_qualified_rule(&mut self, nested: bool) -> Option<StyleRule> {
        let mut prelude = Vec::new();

        loop {
            match self.peek() {
                // "This is a parse error. Return nothing."
                None | Some(CSSToken::EOF) => return None,
                Some(CSSToken::RightBrace) if nested => return None,
                Some(CSSToken::Semicolon) if nested => {
                    self.advance();
                    return None;
                }
                Some(CSSToken::LeftBrace) => {
                    self.advance();
                    let (declarations, rules) = self.consume_style_block_contents();
                    self.consume_if(&CSSToken::RightBrace);
                    return Some(StyleRule {
                        prelude: trim_whitespace(prelude),
                        declarations,
                        rules,
                    });
                }
                Some(_) => {
                    if let Some(token) = self.consume() {
                        prelude.push(token);
                    }
                }
            }
        }
    }

    /// [§ 5.4.7 Consume a simple block](https://www.w3.org/TR/css-syntax-3/#consume-simple-block)
    fn consume_simple_block(&mut self) -> Vec<ComponentValue> {
        let ending_token = match self.consume() {
            Some(CSSToken::LeftBrace) => CSSToken::RightBrace,
            Some(CSSToken::LeftBracket) => CSSToken::RightBracket,
            Some(CSSToken::LeftParen) => CSSToken::RightParen,
            _ => return Vec::new(),
        };

        let mut value = Vec::new();
        loop {
            match self.peek() {
                Some(token) if *token == ending_token => {
                    self.advance();
                    return value;
                }
                None | Some(CSSToken::EOF) => return value,
                Some(_) => {
                    if let Some(v) = self.consume_component_value() {
                        value.push(v);
                    }
                }
            }
        }
    }

    /// [§ 5.4.4 Consume a style block's contents](https://www.w3.org/TR/css-syntax-3/#consume-style-block)
    ///
    /// Declarations and nested rules, up to (not including) the closing `}`.
    fn consume_style_block_contents(&mut self) -> (Vec<Declaration>, Vec<Rule>) {
        let mut declarations = Vec::new();
        let mut rules = Vec::new();

        loop {
            match self.peek() {
                Some(CSSToken::Whitespace | CSSToken::Semicolon) => self.advance(),
                None | Some(CSSToken::EOF | CSSToken::RightBrace) => {
                    return (declarations, rules);
                }
                Some(CSSToken::AtKeyword(_)) => {
                    if let Some(at_rule) = self.consume_at_rule(true) {
                        rules.push(Rule::At(at_rule));
                    }
                }
                // An ident may start a declaration or a nested rule (`div { }`,
                // `a:hover { }`); try the declaration first.
                Some(CSSToken::Ident(_)) => {
                    let start = self.position;
                    match self.consume_declaration() {
                        Some(decl) if decl.is_custom_property() || !decl.contains_curly_block() => {
                            declarations.push(decl);
                        }
                        _ => {
                            self.position = start;
                            if let Some(rule) = self.consume_qualified_rule(true) {
                                rules.push(Rule::Style(rule));
                            }
                        }
                    }
                }
                Some(_) => {
                    if let Some(rule) = self.consume_qualified_rule(true) {
                        rules.push(Rule::Style(rule));
                    }
                }
            }
        }
    }

    /// [§ 5.4.6 Consume a declaration](https://www.w3.org/TR/css-syntax-3/#consume-declaration)
    fn consume_declaration(&mut self) -> Option<Declaration> {
        let Some(CSSToken::Ident(name)) = self.consume() else {
            return None;
        };

        self.skip_whitespace();
        // "If the next input token is anything other than a <colon-token>, this is
        // a parse error. Return nothing."
        if self.peek() != Some(&CSSToken::Colon) {
            return None;
        }
        self.advance();
        self.skip_whitespace();

        let mut value = Vec::new();
        while !matches!(
            self.peek(),
            None | Some(CSSToken::EOF | CSSToken::Semicolon | CSSToken::RightBrace)
        ) {
            if let Some(v) = self.consume_component_value() {
                value.push(v);
            }
        }

        let important = check_important(&value);
        let value = trim_important(value);

        Some(Declaration {
            name,
            value,
            important,
        })
    }

    /// [§ 5.4.9 Consume a component value](https://www.w3.org/TR/css-syntax-3/#consume-component-value)
    fn consume_component_value(&mut self) -> Option<ComponentValue> {
        let token = match self.peek()? {
            CSSToken::LeftBrace => '{',
            CSSToken::LeftBracket => '[',
            CSSToken::LeftParen => '(',
            CSSToken::Function(_) => {
                let Some(CSSToken::Function(name)) = self.consume() else {
                    return None;
                };
                let mut value = Vec::new();
                loop {
                    match self.peek() {
                        Some(CSSToken::RightParen) => {
                            self.advance();
                            break;
                        }
                        None | Some(CSSToken::EOF) => break,
                        Some(_) => {
                            if let Some(v) = self.consume_component_value() {
                                value.push(v);
                            }
                        }
                    }
                }
                return Some(ComponentValue::Function { name, value });
            }
            _ => return self.consume().map(ComponentValue::Token),
        };
        let value = self.consume_simple_block();
        Some(ComponentValue::Block { token, value })
    }

    fn consume(&mut self) -> Option<CSSToken> {
        let token = self.tokens.get(self.position).cloned()?;
        self.position += 1;
        Some(token)
    }

    fn advance(&mut self) {
        if self.position < self.tokens.len() {
            self.position += 1;
        }
    }

    fn consume_if(&mut self, expected: &CSSToken) {
        if self.peek() == Some(expected) {
            self.advance();
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek() == Some(&CSSToken::Whitespace) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<&CSSToken> {
        self.tokens.get(self.position)
    }
}

/// [Selectors 4 § 5.1](https://www.w3.org/TR/selectors-4/#selector-list)
///
/// "A selector list is a comma-separated list of selectors."
///
/// Splits prelude tokens at top-level commas (commas inside `:is(...)` and
/// other functions do not count). Empty alternatives are dropped.
#[must_use]
pub fn split_selector_list(tokens: &[CSSToken]) -> Vec<&[CSSToken]> {
    let mut selectors = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;

    for (i, token) in tokens.iter().enumerate() {
        match token {
            CSSToken::Function(_) | CSSToken::LeftParen | CSSToken::LeftBracket => depth += 1,
            CSSToken::RightParen | CSSToken::RightBracket => depth = depth.saturating_sub(1),
            CSSToken::Comma if depth == 0 => {
                selectors.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    selectors.push(&tokens[start..]);

    selectors.retain(|s| s.iter().any(|t| !t.is_trivia() && !t.is_eof()));
    selectors
}

fn trim_whitespace(mut tokens: Vec<CSSToken>) -> Vec<CSSToken> {
    while tokens.last().is_some_and(CSSToken::is_whitespace) {
        let _ = tokens.pop();
    }
    let leading = tokens.iter().take_while(|t| t.is_whitespace()).count();
    let _ = tokens.drain(..leading);
    tokens
}

fn trim_component_whitespace(mut values: Vec<ComponentValue>) -> Vec<ComponentValue> {
    let is_ws = |v: &ComponentValue| matches!(v, ComponentValue::Token(CSSToken::Whitespace));
    while values.last().is_some_and(is_ws) {
        let _ = values.pop();
    }
    let leading = values.iter().take_while(|v| is_ws(v)).count();
    let _ = values.drain(..leading);
    values
}

/// [§ 6.4.2 Important declarations](https://www.w3.org/TR/css-cascade-4/#importance)
///
/// "A declaration is important if it has a !important annotation, i.e.
/// if the last two (non-whitespace, non-comment) tokens in its value are
/// a <delim-token> with the value "!" followed by an <ident-token> with
/// a value that is an ASCII case-insensitive match for "important"."
fn check_important(value: &[ComponentValue]) -> bool {
    let mut significant = value
        .iter()
        .rev()
        .filter(|v| !matches!(v, ComponentValue::Token(CSSToken::Whitespace)));

    matches!(
        significant.next(),
        Some(ComponentValue::Token(CSSToken::Ident(s))) if s.eq_ignore_ascii_case("important")
    ) && matches!(
        significant.next(),
        Some(ComponentValue::Token(CSSToken::Delim('!')))
    )
}

/// Remove trailing whitespace and the `!important` annotation from a value.
fn trim_important(value: Vec<ComponentValue>) -> Vec<ComponentValue> {
    let important = check_important(&value);
    let mut value = trim_component_whitespace(value);
    if important {
        let _ = value.pop(); // important
        value = trim_component_whitespace(value);
        let _ = value.pop(); // !
    }
    trim_component_whitespace(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_selector_list_ignores_nested_commas() {
        let mut tokenizer = CSSTokenizer::new(".a:is(.b, .c), [x=\",\"] , d");
        tokenizer.run();
        let tokens = tokenizer.into_tokens();
        let parts = split_selector_list(&tokens);
        assert_eq!(parts.len(), 3);
        assert_eq!(tokens_to_css(parts[0], false), ".a:is(.b, .c)");
    }

    #[test]
    fn test_trim_important() {
        let sheet = parse_stylesheet("a { color: red ! important }");
        let Rule::Style(rule) = &sheet.rules[0] else {
            panic!("expected a style rule");
        };
        assert!(rule.declarations[0].important);
        assert_eq!(
            rule.declarations[0].value,
            vec![ComponentValue::Token(CSSToken::ident("red"))]
        );
    }

    #[test]
    fn test_set_selector_text_replaces_prelude() {
        let mut sheet = parse_stylesheet(".a, .b { color: red }");
        let Rule::Style(rule) = &mut sheet.rules[0] else {
            panic!("expected a style rule");
        };
        assert_eq!(rule.selector_count(), 2);
        rule.set_selector_text(" :is(.a, .b) ");
        assert_eq!(rule.selector_text(), ":is(.a, .b)");
        assert_eq!(rule.selector_count(), 1);
    }
}
