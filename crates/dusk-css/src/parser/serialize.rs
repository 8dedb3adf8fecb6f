//! Writing a [`Stylesheet`] back out.
//!
//! Readable output puts one declaration per line with two-space indentation.
//! Minified output drops optional whitespace and the last semicolon of each
//! block. Selectors go through the selector serializer when they parse, so
//! they come out normalized; preludes that do not parse as selectors are
//! written token by token.

use super::css_parser::{AtRule, AtRuleBlock, ComponentValue, Declaration, Rule, Stylesheet};
use crate::selector::parse_selector_list;
use crate::tokenizer::{CSSToken, serialize_identifier, tokens_to_css};

impl Stylesheet {
    /// Serialize the stylesheet.
    #[must_use]
    pub fn to_css(&self, minify: bool) -> String {
        let mut writer = Writer {
            out: String::new(),
            minify,
            indent: 0,
        };
        writer.rules(&self.rules);
        writer.out
    }
}

/// Flatten component values back into the tokens they were built from.
#[must_use]
pub fn component_tokens(values: &[ComponentValue]) -> Vec<CSSToken> {
    let mut tokens = Vec::new();
    push_component_tokens(values, &mut tokens);
    tokens
}

fn push_component_tokens(values: &[ComponentValue], tokens: &mut Vec<CSSToken>) {
    for value in values {
        match value {
            ComponentValue::Token(token) => tokens.push(token.clone()),
            ComponentValue::Function { name, value } => {
                tokens.push(CSSToken::Function(name.clone()));
                push_component_tokens(value, tokens);
                tokens.push(CSSToken::RightParen);
            }
            ComponentValue::Block { token, value } => {
                let (open, close) = match token {
                    '[' => (CSSToken::LeftBracket, CSSToken::RightBracket),
                    '(' => (CSSToken::LeftParen, CSSToken::RightParen),
                    _ => (CSSToken::LeftBrace, CSSToken::RightBrace),
                };
                tokens.push(open);
                push_component_tokens(value, tokens);
                tokens.push(close);
            }
        }
    }
}

struct Writer {
    out: String,
    minify: bool,
    indent: usize,
}

impl Writer {
    fn pad(&mut self) {
        if !self.minify {
            for _ in 0..self.indent {
                self.out.push_str("  ");
            }
        }
    }

    fn newline(&mut self) {
        if !self.minify {
            self.out.push('\n');
        }
    }

    fn rules(&mut self, rules: &[Rule]) {
        for rule in rules {
            match rule {
                Rule::Style(style) => {
                    self.pad();
                    let selector = parse_selector_list(&style.selector_text()).map_or_else(
                        |_| tokens_to_css(&style.prelude, self.minify),
                        |list| {
                            if self.minify {
                                list.to_minified_css()
                            } else {
                                list.to_string()
                            }
                        },
                    );
                    self.out.push_str(&selector);
                    self.block(&style.declarations, &style.rules);
                }
                Rule::At(at_rule) => self.at_rule(at_rule),
            }
        }
    }

    fn at_rule(&mut self, rule: &AtRule) {
        self.pad();
        self.out.push('@');
        self.out.push_str(&serialize_identifier(&rule.name));
        if !rule.prelude.is_empty() {
            self.out.push(' ');
            self.out
                .push_str(&tokens_to_css(&component_tokens(&rule.prelude), self.minify));
        }
        match &rule.block {
            None => {
                self.out.push(';');
                self.newline();
            }
            Some(AtRuleBlock::Rules(rules)) => self.block(&[], rules),
            Some(AtRuleBlock::Style {
                declarations,
                rules,
            }) => self.block(declarations, rules),
            Some(AtRuleBlock::Raw(values)) => {
                let body = tokens_to_css(&component_tokens(values), self.minify);
                if self.minify {
                    self.out.push('{');
                    self.out.push_str(&body);
                    self.out.push('}');
                } else if body.is_empty() {
                    self.out.push_str(" {}");
                } else {
                    self.out.push_str(" { ");
                    self.out.push_str(&body);
                    self.out.push_str(" }");
                }
                self.newline();
            }
        }
    }

    fn block(&mut self, declarations: &[Declaration], rules: &[Rule]) {
        self.out.push_str(if self.minify { "{" } else { " {" });
        self.newline();
        self.indent += 1;
        for (i, declaration) in declarations.iter().enumerate() {
            self.pad();
            self.declaration(declaration);
            // The last semicolon of a block is optional, but not when nested
            // rules follow.
            if !self.minify || i + 1 < declarations.len() || !rules.is_empty() {
                self.out.push(';');
            }
            self.newline();
        }
        self.rules(rules);
        self.indent -= 1;
        self.pad();
        self.out.push('}');
        self.newline();
    }

    fn declaration(&mut self, declaration: &Declaration) {
        self.out.push_str(&serialize_identifier(&declaration.name));
        self.out.push(':');
        let value = tokens_to_css(&component_tokens(&declaration.value), self.minify);
        if !self.minify && !value.is_empty() {
            self.out.push(' ');
        }
        self.out.push_str(&value);
        if declaration.important {
            self.out
                .push_str(if self.minify { "!important" } else { " !important" });
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_stylesheet;

    #[test]
    fn test_minified_output() {
        let sheet = parse_stylesheet("a , b > c { color : red ; margin: 0 !important; }");
        assert_eq!(sheet.to_css(true), "a,b>c{color:red;margin:0!important}");
    }

    #[test]
    fn test_readable_output() {
        let sheet = parse_stylesheet("@media screen{.a{color:red}}");
        assert_eq!(
            sheet.to_css(false),
            "@media screen {\n  .a {\n    color: red;\n  }\n}\n"
        );
    }

    #[test]
    fn test_statement_at_rule() {
        let sheet = parse_stylesheet("@import url(x.css);a{b:c}");
        assert_eq!(sheet.to_css(true), "@import url(x.css);a{b:c}");
    }

    #[test]
    fn test_nested_rules_keep_semicolon() {
        let sheet = parse_stylesheet(".a { color: red; .b { color: blue } }");
        assert_eq!(sheet.to_css(true), ".a{color:red;.b{color:blue}}");
    }
}
