//! CSS selectors per [Selectors Level 4](https://www.w3.org/TR/selectors-4/).
//!
//! A selector alternative is kept as a flat, ordered sequence of components
//! in which combinators sit between compound selectors, the way it is
//! written. The merge engine walks that sequence left to right.

/// Selector matching against a [`dusk_dom::DomTree`].
pub mod matching;
/// Selector parsing on top of the CSS tokenizer.
pub mod parser;
/// Writing selectors back out.
pub mod serialize;
/// [§ 17 Calculating a selector's specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
pub mod specificity;

pub use parser::{SelectorParseError, parse_selector_list};
pub use specificity::Specificity;

/// Maximum nesting of selector lists inside pseudo-class arguments.
///
/// `:is(:not(:has(...)))` nests three levels deep. Parsing and merging both
/// stop with an error past this depth instead of recursing further.
pub const MAX_NESTING_DEPTH: usize = 32;

/// Vendor prefixes stripped by [`PseudoClass::base_name`].
const VENDOR_PREFIXES: [&str; 4] = ["-webkit-", "-moz-", "-ms-", "-o-"];

/// [§ 16 Combinators](https://www.w3.org/TR/selectors-4/#combinators)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Combinator {
    /// [§ 16.1 Descendant combinator](https://www.w3.org/TR/selectors-4/#descendant-combinators)
    /// "A descendant combinator is whitespace that separates two compound
    /// selectors."
    Descendant,

    /// [§ 16.2 Child combinator](https://www.w3.org/TR/selectors-4/#child-combinators)
    /// "A child combinator is a greater-than sign (>) that separates two compound
    /// selectors."
    Child,

    /// [§ 16.3 Next-sibling combinator](https://www.w3.org/TR/selectors-4/#adjacent-sibling-combinators)
    /// "A next-sibling combinator is a plus sign (+) that separates two compound
    /// selectors."
    NextSibling,

    /// [§ 16.4 Subsequent-sibling combinator](https://www.w3.org/TR/selectors-4/#general-sibling-combinators)
    /// "A subsequent-sibling combinator is a tilde (~) that separates two compound
    /// selectors."
    SubsequentSibling,
}

/// [§ 6.1 Attribute presence and value selectors](https://www.w3.org/TR/selectors-4/#attribute-representation)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttributeOperator {
    /// `[att=val]`
    Equals,
    /// `[att~=val]`: "a whitespace-separated list of words, one of which is
    /// exactly val".
    Includes,
    /// `[att|=val]`: "either being exactly val or beginning with val
    /// immediately followed by - (U+002D)".
    DashMatch,
    /// `[att^=val]`
    Prefix,
    /// `[att$=val]`
    Suffix,
    /// `[att*=val]`
    Substring,
}

/// [§ 6.3 Case-sensitivity](https://www.w3.org/TR/selectors-4/#attribute-case)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttributeCase {
    /// No flag: values compare case-sensitively.
    #[default]
    Default,
    /// `i`: "the attribute value is to be matched ASCII case-insensitively".
    Insensitive,
    /// `s`: "the attribute value is to be matched case-sensitively".
    Sensitive,
}

/// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AttributeSelector {
    /// Attribute name as written.
    pub name: String,
    /// Operator, `None` for a presence test (`[hidden]`).
    pub operator: Option<AttributeOperator>,
    /// Value to compare against, present iff `operator` is.
    pub value: Option<String>,
    /// Case-sensitivity flag.
    pub case: AttributeCase,
}

impl AttributeSelector {
    /// `[name]`
    #[must_use]
    pub fn exists(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            operator: None,
            value: None,
            case: AttributeCase::Default,
        }
    }
}

/// Arguments of a functional pseudo-class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PseudoArguments {
    /// A selector list: `:is(.a, .b)`, `:not(p)`, `:has(> img)`.
    Selectors(SelectorList),
    /// Anything else, kept as minified text: `:nth-child(2n+1)`, `:lang(en)`.
    Raw(String),
}

/// [§ 3.5 Pseudo-classes](https://www.w3.org/TR/selectors-4/#pseudo-classes)
/// and [pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements).
///
/// Both are stored here; `name` keeps its leading colons (`:hover`,
/// `::before`) in ASCII lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PseudoClass {
    /// Name including the leading `:` or `::`.
    pub name: String,
    /// Argument list for the functional notation.
    pub arguments: Option<PseudoArguments>,
}

impl PseudoClass {
    /// A pseudo-class without arguments.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arguments: None,
        }
    }

    /// A pseudo-class taking a selector list, such as `:is(...)`.
    #[must_use]
    pub fn with_selectors(name: impl Into<String>, list: SelectorList) -> Self {
        Self {
            name: name.into(),
            arguments: Some(PseudoArguments::Selectors(list)),
        }
    }

    /// [§ 3.6 Pseudo-elements](https://www.w3.org/TR/selectors-4/#pseudo-elements)
    ///
    /// "For compatibility with existing style sheets, user agents must also
    /// accept the previous one-colon notation for pseudo-elements introduced
    /// in CSS levels 1 and 2 (namely, :first-line, :first-letter, :before,
    /// and :after)."
    #[must_use]
    pub fn is_pseudo_element(&self) -> bool {
        self.name.starts_with("::")
            || matches!(
                self.name.as_str(),
                ":before" | ":after" | ":first-line" | ":first-letter"
            )
    }

    /// The name without colons or vendor prefix: `:-webkit-any` is `any`.
    #[must_use]
    pub fn base_name(&self) -> &str {
        let name = self.name.trim_start_matches(':');
        VENDOR_PREFIXES
            .iter()
            .find_map(|prefix| name.strip_prefix(prefix))
            .unwrap_or(name)
    }

    /// [§ 4.2 The Matches-any pseudo-class](https://www.w3.org/TR/selectors-4/#matches)
    ///
    /// `:is()` and its older spellings `:matches()` and `:any()`, vendor
    /// prefixes included. `:where()` is not one of them: it changes
    /// specificity.
    #[must_use]
    pub fn is_logical_is(&self) -> bool {
        !self.is_pseudo_element() && matches!(self.base_name(), "is" | "matches" | "any")
    }

    /// The selector-list argument, if any.
    #[must_use]
    pub const fn selector_arguments(&self) -> Option<&SelectorList> {
        match &self.arguments {
            Some(PseudoArguments::Selectors(list)) => Some(list),
            _ => None,
        }
    }
}

/// One element of a selector alternative.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Component {
    /// [§ 5.1 Type selector](https://www.w3.org/TR/selectors-4/#type-selectors)
    Tag(String),
    /// [§ 5.2 Universal selector](https://www.w3.org/TR/selectors-4/#universal-selector)
    Universal,
    /// [§ 6.7 ID selector](https://www.w3.org/TR/selectors-4/#id-selectors)
    Id(String),
    /// [§ 6.6 Class selector](https://www.w3.org/TR/selectors-4/#class-html)
    Class(String),
    /// [§ 6 Attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-selectors)
    Attribute(AttributeSelector),
    /// A combinator between two compound selectors.
    Combinator(Combinator),
    /// A pseudo-class or pseudo-element.
    PseudoClass(PseudoClass),
    /// [CSS Nesting § 2.2](https://www.w3.org/TR/css-nesting-1/#nest-selector): `&`.
    Nesting,
    /// A comment inside the selector, without its delimiters.
    Comment(String),
}

impl Component {
    /// `.name`
    #[must_use]
    pub fn class(name: impl Into<String>) -> Self {
        Self::Class(name.into())
    }

    /// `name`
    #[must_use]
    pub fn tag(name: impl Into<String>) -> Self {
        Self::Tag(name.into())
    }

    /// The component without any nested argument list.
    #[must_use]
    pub fn header(&self) -> Self {
        match self {
            Self::PseudoClass(pseudo) => Self::PseudoClass(PseudoClass::new(pseudo.name.clone())),
            other => other.clone(),
        }
    }

    /// Whether this is a combinator.
    #[must_use]
    pub const fn is_combinator(&self) -> bool {
        matches!(self, Self::Combinator(_))
    }

    /// The pseudo-class, if this is one.
    #[must_use]
    pub const fn as_pseudo(&self) -> Option<&PseudoClass> {
        match self {
            Self::PseudoClass(pseudo) => Some(pseudo),
            _ => None,
        }
    }

    /// Whether this is a pseudo-element.
    #[must_use]
    pub fn is_pseudo_element(&self) -> bool {
        self.as_pseudo().is_some_and(PseudoClass::is_pseudo_element)
    }
}

/// [§ 4.3 Complex selectors](https://www.w3.org/TR/selectors-4/#complex)
///
/// One alternative of a selector list. Combinators are components, so
/// `div > .a` is `[Tag(div), Combinator(Child), Class(a)]`. A relative
/// selector (inside `:has()`) may start with a combinator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectorGroup {
    /// Components in document order.
    pub components: Vec<Component>,
}

impl SelectorGroup {
    /// Wrap a component sequence.
    #[must_use]
    pub const fn new(components: Vec<Component>) -> Self {
        Self { components }
    }

    /// Whether the group has no components.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.components.is_empty()
    }

    /// Whether any component is a combinator.
    #[must_use]
    pub fn has_combinator(&self) -> bool {
        self.components.iter().any(Component::is_combinator)
    }
}

impl From<Vec<Component>> for SelectorGroup {
    fn from(components: Vec<Component>) -> Self {
        Self::new(components)
    }
}

/// [§ 5.1 Selector lists](https://www.w3.org/TR/selectors-4/#grouping)
///
/// "A comma-separated list of selectors represents the union of all elements
/// selected by each of the individual selectors in the selector list."
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct SelectorList {
    /// The alternatives, in source order.
    pub groups: Vec<SelectorGroup>,
}

impl SelectorList {
    /// Wrap a list of alternatives.
    #[must_use]
    pub const fn new(groups: Vec<SelectorGroup>) -> Self {
        Self { groups }
    }

    /// Number of alternatives.
    #[must_use]
    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Whether there are no alternatives.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    /// A copy with every comment removed, nested argument lists included.
    /// Alternatives left without components are dropped.
    #[must_use]
    pub fn strip_comments(&self) -> Self {
        let groups = self
            .groups
            .iter()
            .filter_map(|group| {
                let components: Vec<Component> = group
                    .components
                    .iter()
                    .filter(|c| !matches!(c, Component::Comment(_)))
                    .map(strip_component_comments)
                    .collect();
                (!components.is_empty()).then(|| SelectorGroup::new(components))
            })
            .collect();
        Self::new(groups)
    }
}

impl From<Vec<SelectorGroup>> for SelectorList {
    fn from(groups: Vec<SelectorGroup>) -> Self {
        Self::new(groups)
    }
}

fn strip_component_comments(component: &Component) -> Component {
    match component {
        Component::PseudoClass(PseudoClass {
            name,
            arguments: Some(PseudoArguments::Selectors(list)),
        }) => Component::PseudoClass(PseudoClass::with_selectors(
            name.clone(),
            list.strip_comments(),
        )),
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name_strips_vendor_prefix() {
        assert_eq!(PseudoClass::new(":-webkit-any").base_name(), "any");
        assert_eq!(PseudoClass::new("::-moz-selection").base_name(), "selection");
        assert_eq!(PseudoClass::new(":hover").base_name(), "hover");
    }

    #[test]
    fn test_logical_is_spellings() {
        for name in [":is", ":matches", ":any", ":-webkit-any", ":-moz-any"] {
            assert!(PseudoClass::new(name).is_logical_is(), "{name}");
        }
        assert!(!PseudoClass::new(":where").is_logical_is());
        assert!(!PseudoClass::new(":not").is_logical_is());
    }

    #[test]
    fn test_legacy_pseudo_elements() {
        assert!(PseudoClass::new(":before").is_pseudo_element());
        assert!(PseudoClass::new("::marker").is_pseudo_element());
        assert!(!PseudoClass::new(":hover").is_pseudo_element());
    }

    #[test]
    fn test_header_drops_arguments() {
        let list = SelectorList::new(vec![SelectorGroup::new(vec![Component::class("a")])]);
        let pseudo = Component::PseudoClass(PseudoClass::with_selectors(":not", list));
        assert_eq!(pseudo.header(), Component::PseudoClass(PseudoClass::new(":not")));
    }

    #[test]
    fn test_strip_comments_drops_empty_groups() {
        let list = SelectorList::new(vec![
            SelectorGroup::new(vec![Component::Comment("x".into())]),
            SelectorGroup::new(vec![Component::class("a"), Component::Comment("y".into())]),
        ]);
        let stripped = list.strip_comments();
        assert_eq!(stripped.len(), 1);
        assert_eq!(stripped.groups[0].components, vec![Component::class("a")]);
    }
}
