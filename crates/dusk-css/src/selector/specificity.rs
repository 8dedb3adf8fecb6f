//! [§ 17 Calculating a selector's specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)

use core::fmt;
use core::ops::{Add, AddAssign};

use super::{Component, PseudoClass, SelectorGroup, SelectorList};

/// [§ 17 Calculating Specificity](https://www.w3.org/TR/selectors-4/#specificity-rules)
/// "A selector's specificity is calculated for a given element as follows:
///  - count the number of ID selectors in the selector (= A)
///  - count the number of class selectors, attributes selectors, and pseudo-classes in the selector (= B)
///  - count the number of type selectors and pseudo-elements in the selector (= C)
///
/// Specificities are compared by comparing the three components in order."
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Specificity(pub u32, pub u32, pub u32);

impl Specificity {
    /// Zero specificity, as for `*` or `:where(...)`.
    pub const ZERO: Self = Self(0, 0, 0);
    /// One ID selector.
    pub const ID: Self = Self(1, 0, 0);
    /// One class, attribute or pseudo-class.
    pub const CLASS: Self = Self(0, 1, 0);
    /// One type selector or pseudo-element.
    pub const TYPE: Self = Self(0, 0, 1);

    /// Create a new specificity with (A, B, C) components.
    #[must_use]
    pub const fn new(a: u32, b: u32, c: u32) -> Self {
        Self(a, b, c)
    }
}

impl Add for Specificity {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(
            self.0.saturating_add(other.0),
            self.1.saturating_add(other.1),
            self.2.saturating_add(other.2),
        )
    }
}

impl AddAssign for Specificity {
    fn add_assign(&mut self, other: Self) {
        *self = *self + other;
    }
}

impl fmt::Display for Specificity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{},{})", self.0, self.1, self.2)
    }
}

impl Component {
    /// Specificity contributed by this component.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        match self {
            Self::Id(_) => Specificity::ID,
            Self::Class(_) | Self::Attribute(_) => Specificity::CLASS,
            Self::Tag(_) => Specificity::TYPE,
            Self::PseudoClass(pseudo) => pseudo.specificity(),
            Self::Universal | Self::Combinator(_) | Self::Nesting | Self::Comment(_) => {
                Specificity::ZERO
            }
        }
    }
}

impl PseudoClass {
    /// [§ 17](https://www.w3.org/TR/selectors-4/#specificity-rules)
    ///
    /// "The specificity of an :is(), :not(), or :has() pseudo-class is replaced
    /// by the specificity of the most specific complex selector in its selector
    /// list argument."
    ///
    /// "The specificity of a :where() pseudo-class is replaced by zero."
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        let arguments = self.selector_arguments().map(SelectorList::specificity);
        if self.is_pseudo_element() {
            // `::slotted(x)` adds the specificity of its argument.
            return Specificity::TYPE + arguments.unwrap_or_default();
        }
        match (self.base_name(), arguments) {
            ("where", _) => Specificity::ZERO,
            ("is" | "matches" | "any" | "not" | "has", Some(arguments)) => arguments,
            // `:host(x)` and `:host-context(x)` count as a pseudo-class plus
            // their argument.
            ("host" | "host-context", Some(arguments)) => Specificity::CLASS + arguments,
            _ => Specificity::CLASS,
        }
    }
}

impl SelectorGroup {
    /// Sum over the components.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.components
            .iter()
            .fold(Specificity::ZERO, |acc, c| acc + c.specificity())
    }
}

impl SelectorList {
    /// The most specific alternative; zero for an empty list.
    #[must_use]
    pub fn specificity(&self) -> Specificity {
        self.groups
            .iter()
            .map(SelectorGroup::specificity)
            .max()
            .unwrap_or_default()
    }
}
