//! [§ 18 Grammar](https://www.w3.org/TR/selectors-4/#grammar)
//!
//! Selector text is tokenized with comments preserved, split at top-level
//! commas, and each alternative is read left to right into a flat
//! [`SelectorGroup`]. Whitespace becomes a descendant combinator only when it
//! separates two compound selectors.

use thiserror::Error;

use super::{
    AttributeCase, AttributeOperator, AttributeSelector, Combinator, Component, MAX_NESTING_DEPTH,
    PseudoArguments, PseudoClass, SelectorGroup, SelectorList,
};
use crate::tokenizer::{CSSToken, CSSTokenizer, HashType, tokens_to_css};

/// Why a selector could not be parsed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectorParseError {
    /// A token that cannot appear at this position.
    #[error("unexpected {token} in selector")]
    UnexpectedToken {
        /// The offending token, as CSS text.
        token: String,
    },
    /// The input stopped in the middle of a construct.
    #[error("unexpected end of selector")]
    UnexpectedEnd,
    /// An alternative with no components (`a,,b`, `:is()`).
    #[error("empty selector")]
    EmptySelector,
    /// A combinator with nothing on one side, or two in a row.
    #[error("combinator is missing a compound selector")]
    DanglingCombinator,
    /// `ns|tag` and `[ns|attr]`.
    #[error("namespaced selectors are not supported")]
    Namespace,
    /// Syntax that is valid CSS but outside what the selector model holds.
    #[error("unsupported selector syntax: {what}")]
    Unsupported {
        /// What was found.
        what: String,
    },
    /// Pseudo-class arguments nested past [`MAX_NESTING_DEPTH`].
    #[error("selector nesting deeper than {max} levels")]
    TooDeep {
        /// The limit.
        max: usize,
    },
    /// A malformed `[...]` attribute selector.
    #[error("invalid attribute selector")]
    InvalidAttribute,
}

type Result<T> = core::result::Result<T, SelectorParseError>;

/// Parse a comma-separated selector list.
///
/// # Errors
///
/// Returns a [`SelectorParseError`] for malformed or unsupported syntax.
pub fn parse_selector_list(text: &str) -> Result<SelectorList> {
    let mut tokenizer = CSSTokenizer::with_comments(text);
    tokenizer.run();
    let tokens = tokenizer.into_tokens();
    let end = tokens.iter().position(CSSToken::is_eof).unwrap_or(tokens.len());
    parse_list(&tokens[..end], false, 0)
}

/// Pseudo-classes and pseudo-elements whose argument is a selector list.
fn takes_selector_list(pseudo: &PseudoClass) -> bool {
    matches!(
        pseudo.base_name(),
        "is" | "where" | "matches" | "any" | "not" | "has" | "host" | "host-context" | "slotted"
    )
}

fn unexpected(token: &CSSToken) -> SelectorParseError {
    SelectorParseError::UnexpectedToken {
        token: tokens_to_css(core::slice::from_ref(token), false),
    }
}

fn parse_list(tokens: &[CSSToken], relative: bool, depth: usize) -> Result<SelectorList> {
    if depth > MAX_NESTING_DEPTH {
        return Err(SelectorParseError::TooDeep {
            max: MAX_NESTING_DEPTH,
        });
    }
    let mut groups = Vec::new();
    for part in split_at_commas(tokens) {
        if part.iter().all(CSSToken::is_trivia) {
            return Err(SelectorParseError::EmptySelector);
        }
        groups.push(GroupParser::new(part, relative, depth).parse()?);
    }
    Ok(SelectorList::new(groups))
}

fn split_at_commas(tokens: &[CSSToken]) -> Vec<&[CSSToken]> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut start = 0;
    for (i, token) in tokens.iter().enumerate() {
        match token {
            CSSToken::Function(_) | CSSToken::LeftParen | CSSToken::LeftBracket => depth += 1,
            CSSToken::RightParen | CSSToken::RightBracket => depth = depth.saturating_sub(1),
            CSSToken::Comma if depth == 0 => {
                parts.push(&tokens[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    parts.push(&tokens[start..]);
    parts
}

/// Reads one alternative.
struct GroupParser<'a> {
    tokens: &'a [CSSToken],
    position: usize,
    relative: bool,
    depth: usize,
    components: Vec<Component>,
    pending_descendant: bool,
}

impl<'a> GroupParser<'a> {
    const fn new(tokens: &'a [CSSToken], relative: bool, depth: usize) -> Self {
        Self {
            tokens,
            position: 0,
            relative,
            depth,
            components: Vec::new(),
            pending_descendant: false,
        }
    }

    fn parse(mut self) -> Result<SelectorGroup> {
        while let Some(token) = self.next_token() {
            match token {
                CSSToken::Whitespace => {
                    if self.last_significant().is_some_and(|c| !c.is_combinator()) {
                        self.pending_descendant = true;
                    }
                }
                CSSToken::Comment(text) => self.components.push(Component::Comment(text.clone())),
                CSSToken::Delim('>') => self.push_combinator(Combinator::Child)?,
                CSSToken::Delim('+') => self.push_combinator(Combinator::NextSibling)?,
                CSSToken::Delim('~') => self.push_combinator(Combinator::SubsequentSibling)?,
                CSSToken::Delim('|') => {
                    if self.peek() == Some(&CSSToken::Delim('|')) {
                        return Err(SelectorParseError::Unsupported {
                            what: "column combinator".to_owned(),
                        });
                    }
                    return Err(SelectorParseError::Namespace);
                }
                CSSToken::Ident(name) => {
                    let name = name.clone();
                    self.push_type(Component::Tag(name))?;
                }
                CSSToken::Delim('*') => self.push_type(Component::Universal)?,
                CSSToken::Hash {
                    value,
                    hash_type: HashType::Id,
                } => {
                    let id = Component::Id(value.clone());
                    self.push_simple(id);
                }
                CSSToken::Delim('.') => match self.next_token() {
                    Some(CSSToken::Ident(name)) => {
                        let class = Component::Class(name.clone());
                        self.push_simple(class);
                    }
                    Some(other) => return Err(unexpected(other)),
                    None => return Err(SelectorParseError::UnexpectedEnd),
                },
                CSSToken::Delim('&') => self.push_simple(Component::Nesting),
                CSSToken::LeftBracket => {
                    let attribute = self.parse_attribute()?;
                    self.push_simple(Component::Attribute(attribute));
                }
                CSSToken::Colon => {
                    let pseudo = self.parse_pseudo()?;
                    self.push_simple(Component::PseudoClass(pseudo));
                }
                other => return Err(unexpected(other)),
            }
        }

        match self.last_significant() {
            None => Err(SelectorParseError::EmptySelector),
            Some(c) if c.is_combinator() => Err(SelectorParseError::DanglingCombinator),
            Some(_) => Ok(SelectorGroup::new(self.components)),
        }
    }

    fn next_token(&mut self) -> Option<&'a CSSToken> {
        let token = self.tokens.get(self.position)?;
        self.position += 1;
        Some(token)
    }

    fn peek(&self) -> Option<&'a CSSToken> {
        self.tokens.get(self.position)
    }

    fn skip_trivia(&mut self) {
        while self.peek().is_some_and(CSSToken::is_trivia) {
            self.position += 1;
        }
    }

    fn last_significant(&self) -> Option<&Component> {
        self.components
            .iter()
            .rev()
            .find(|c| !matches!(c, Component::Comment(_)))
    }

    /// Whether the next simple selector starts a new compound.
    fn at_compound_start(&self) -> bool {
        self.pending_descendant || self.last_significant().is_none_or(Component::is_combinator)
    }

    fn push_combinator(&mut self, combinator: Combinator) -> Result<()> {
        self.pending_descendant = false;
        let dangling = match self.last_significant() {
            None => !self.relative,
            Some(c) => c.is_combinator(),
        };
        if dangling {
            return Err(SelectorParseError::DanglingCombinator);
        }
        self.components.push(Component::Combinator(combinator));
        Ok(())
    }

    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    /// "A type selector or universal selector ... must be the first simple
    /// selector in a compound selector."
    fn push_type(&mut self, component: Component) -> Result<()> {
        if !self.at_compound_start() {
            return Err(SelectorParseError::UnexpectedToken {
                token: component.to_string(),
            });
        }
        self.push_simple(component);
        Ok(())
    }

    fn push_simple(&mut self, component: Component) {
        if self.pending_descendant {
            self.components
                .push(Component::Combinator(Combinator::Descendant));
            self.pending_descendant = false;
        }
        self.components.push(component);
    }

    /// [§ 3.5](https://www.w3.org/TR/selectors-4/#pseudo-classes) and
    /// [§ 3.6](https://www.w3.org/TR/selectors-4/#pseudo-elements): the first
    /// `:` has been consumed.
    fn parse_pseudo(&mut self) -> Result<PseudoClass> {
        let colons = if self.peek() == Some(&CSSToken::Colon) {
            self.position += 1;
            "::"
        } else {
            ":"
        };
        match self.next_token() {
            Some(CSSToken::Ident(name)) => Ok(PseudoClass::new(format!(
                "{colons}{}",
                name.to_ascii_lowercase()
            ))),
            Some(CSSToken::Function(name)) => {
                let mut pseudo = PseudoClass::new(format!("{colons}{}", name.to_ascii_lowercase()));
                let arguments = self.function_arguments()?;
                pseudo.arguments = Some(if takes_selector_list(&pseudo) {
                    let relative = pseudo.base_name() == "has";
                    PseudoArguments::Selectors(parse_list(arguments, relative, self.depth + 1)?)
                } else {
                    PseudoArguments::Raw(tokens_to_css(arguments, true))
                });
                Ok(pseudo)
            }
            Some(other) => Err(unexpected(other)),
            None => Err(SelectorParseError::UnexpectedEnd),
        }
    }

    /// Tokens up to the `)` matching an already consumed function token.
    fn function_arguments(&mut self) -> Result<&'a [CSSToken]> {
        let start = self.position;
        let mut depth = 0usize;
        while let Some(token) = self.next_token() {
            match token {
                CSSToken::Function(_) | CSSToken::LeftParen => depth += 1,
                CSSToken::RightParen if depth == 0 => {
                    return Ok(&self.tokens[start..self.position - 1]);
                }
                CSSToken::RightParen => depth -= 1,
                _ => {}
            }
        }
        Err(SelectorParseError::UnexpectedEnd)
    }

    /// [§ 6.1](https://www.w3.org/TR/selectors-4/#attribute-representation):
    /// the `[` has been consumed.
    fn parse_attribute(&mut self) -> Result<AttributeSelector> {
        self.skip_trivia();
        let name = match self.next_token() {
            Some(CSSToken::Ident(name)) => name.clone(),
            Some(CSSToken::Delim('*' | '|')) => return Err(SelectorParseError::Namespace),
            Some(_) => return Err(SelectorParseError::InvalidAttribute),
            None => return Err(SelectorParseError::UnexpectedEnd),
        };
        if self.peek() == Some(&CSSToken::Delim('|'))
            && self.tokens.get(self.position + 1) != Some(&CSSToken::Delim('='))
        {
            return Err(SelectorParseError::Namespace);
        }
        self.skip_trivia();

        let mut attribute = AttributeSelector::exists(name);
        let operator = match self.next_token() {
            Some(CSSToken::RightBracket) => return Ok(attribute),
            Some(CSSToken::Delim('=')) => AttributeOperator::Equals,
            Some(CSSToken::Delim(c)) => {
                let operator = match c {
                    '~' => AttributeOperator::Includes,
                    '|' => AttributeOperator::DashMatch,
                    '^' => AttributeOperator::Prefix,
                    '$' => AttributeOperator::Suffix,
                    '*' => AttributeOperator::Substring,
                    _ => return Err(SelectorParseError::InvalidAttribute),
                };
                if self.next_token() != Some(&CSSToken::Delim('=')) {
                    return Err(SelectorParseError::InvalidAttribute);
                }
                operator
            }
            Some(_) => return Err(SelectorParseError::InvalidAttribute),
            None => return Err(SelectorParseError::UnexpectedEnd),
        };
        self.skip_trivia();

        let value = match self.next_token() {
            Some(CSSToken::Ident(value) | CSSToken::String(value)) => value.clone(),
            Some(_) => return Err(SelectorParseError::InvalidAttribute),
            None => return Err(SelectorParseError::UnexpectedEnd),
        };
        attribute.operator = Some(operator);
        attribute.value = Some(value);
        self.skip_trivia();

        // [§ 6.3](https://www.w3.org/TR/selectors-4/#attribute-case)
        if let Some(CSSToken::Ident(flag)) = self.peek() {
            attribute.case = if flag.eq_ignore_ascii_case("i") {
                AttributeCase::Insensitive
            } else if flag.eq_ignore_ascii_case("s") {
                AttributeCase::Sensitive
            } else {
                return Err(SelectorParseError::InvalidAttribute);
            };
            self.position += 1;
            self.skip_trivia();
        }

        match self.next_token() {
            Some(CSSToken::RightBracket) => Ok(attribute),
            Some(_) => Err(SelectorParseError::InvalidAttribute),
            None => Err(SelectorParseError::UnexpectedEnd),
        }
    }
}
