//! Which selector components may share a trie node.

use super::MergeMode;
use crate::selector::{Component, PseudoClass};

/// How a component takes part in merging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompatibilityClass {
    /// Tag, universal, id, class and attribute selectors: comparable by
    /// specificity.
    Structural,
    /// Combinators and pseudo-classes: mergeable only with the same kind and
    /// name.
    Exact,
    /// Nesting selectors and comments: never share a node.
    Unmergeable,
}

/// What the trie does with a pseudo-class's selector arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArgumentPolicy {
    /// `:is()` and its aliases: the arguments may be inlined into the
    /// surrounding selector.
    Transparent,
    /// `:has()` and `:where()`: `X:has(A), X:has(B)` is `X:has(A, B)`, so
    /// arguments of equally named pseudo-classes can be pooled.
    Union,
    /// Everything else (`:not()`, `:host()`, `::slotted()`, `:nth-child()`,
    /// ...): the arguments are part of the component's identity.
    Opaque,
}

/// Static class of a component.
#[must_use]
pub const fn classify(component: &Component) -> CompatibilityClass {
    match component {
        Component::Tag(_)
        | Component::Universal
        | Component::Id(_)
        | Component::Class(_)
        | Component::Attribute(_) => CompatibilityClass::Structural,
        Component::Combinator(_) | Component::PseudoClass(_) => CompatibilityClass::Exact,
        Component::Nesting | Component::Comment(_) => CompatibilityClass::Unmergeable,
    }
}

/// Argument policy of a pseudo-class. Only pseudo-classes with a selector
/// list argument are `Transparent` or `Union`.
#[must_use]
pub fn argument_policy(pseudo: &PseudoClass) -> ArgumentPolicy {
    if pseudo.is_pseudo_element() || pseudo.selector_arguments().is_none() {
        return ArgumentPolicy::Opaque;
    }
    if pseudo.is_logical_is() {
        ArgumentPolicy::Transparent
    } else if matches!(pseudo.base_name(), "has" | "where") {
        ArgumentPolicy::Union
    } else {
        ArgumentPolicy::Opaque
    }
}

/// Whether equally named instances of `pseudo` can pool their arguments. An
/// `:is()` that stays in the trie as a unit (it could not be inlined) pools
/// like `:where()`.
#[must_use]
pub fn pools_arguments(pseudo: &PseudoClass) -> bool {
    argument_policy(pseudo) != ArgumentPolicy::Opaque
}

/// Whether `a` and `b` may sit in the same trie node under `mode`.
///
/// This is an equivalence relation for every mode, so checking a newcomer
/// against one member of a node is enough.
#[must_use]
pub fn are_compatible(a: &Component, b: &Component, mode: MergeMode) -> bool {
    match (classify(a), classify(b)) {
        (CompatibilityClass::Structural, CompatibilityClass::Structural) => {
            mode.is_relaxed() || a.specificity() == b.specificity()
        }
        (CompatibilityClass::Exact, CompatibilityClass::Exact) => match (a, b) {
            (Component::Combinator(x), Component::Combinator(y)) => x == y,
            (Component::PseudoClass(x), Component::PseudoClass(y)) => {
                pseudo_compatible(x, y, mode)
            }
            _ => false,
        },
        _ => false,
    }
}

fn pseudo_compatible(a: &PseudoClass, b: &PseudoClass, mode: MergeMode) -> bool {
    if a.is_pseudo_element() || b.is_pseudo_element() {
        // `:is()` cannot hold pseudo-elements, so they only share a node when
        // they are the same.
        return a == b;
    }
    a.name == b.name && (mode.is_relaxed() || a.specificity() == b.specificity())
}

/// Header equality: same kind and name, arguments ignored.
#[must_use]
pub fn are_equal(a: &Component, b: &Component) -> bool {
    a.header() == b.header()
}

/// Structural equality, arguments included.
#[must_use]
pub fn are_fully_equal(a: &Component, b: &Component) -> bool {
    a == b
}

/// Whether `a` and `b` are the same trie variant. Arguments are ignored only
/// where the trie pools them.
#[must_use]
pub fn same_variant(a: &Component, b: &Component, mode: MergeMode) -> bool {
    match (a, b) {
        (Component::PseudoClass(x), Component::PseudoClass(_))
            if mode.is_relaxed() && !mode.is_linear() && pools_arguments(x) =>
        {
            are_equal(a, b)
        }
        _ => are_fully_equal(a, b),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::{Combinator, parse_selector_list};

    fn component(text: &str) -> Component {
        let list = parse_selector_list(text).expect("selector should parse");
        list.groups[0].components[0].clone()
    }

    #[test]
    fn test_classes() {
        assert_eq!(classify(&component("div")), CompatibilityClass::Structural);
        assert_eq!(classify(&component("[x]")), CompatibilityClass::Structural);
        assert_eq!(classify(&component(":hover")), CompatibilityClass::Exact);
        assert_eq!(classify(&Component::Nesting), CompatibilityClass::Unmergeable);
    }

    #[test]
    fn test_structural_respects_specificity_in_safe_mode() {
        let (id, class, other) = (component("#a"), component(".b"), component(".c"));
        assert!(!are_compatible(&id, &class, MergeMode::Safe));
        assert!(are_compatible(&class, &other, MergeMode::Safe));
        assert!(are_compatible(&id, &class, MergeMode::Greedy));
        assert!(are_compatible(&id, &class, MergeMode::UnsafeLinear));
    }

    #[test]
    fn test_exact_requires_same_name() {
        let child = Component::Combinator(Combinator::Child);
        let descendant = Component::Combinator(Combinator::Descendant);
        assert!(!are_compatible(&child, &descendant, MergeMode::Unsafe));
        assert!(are_compatible(&child, &child, MergeMode::Safe));
        assert!(are_compatible(&component(":not(.a)"), &component(":not(.b)"), MergeMode::Safe));
        assert!(!are_compatible(&component(":not(#a)"), &component(":not(.b)"), MergeMode::Safe));
        assert!(!are_compatible(&component(":hover"), &component(":focus"), MergeMode::Unsafe));
        assert!(!are_compatible(&component(".a"), &component(":hover"), MergeMode::Unsafe));
    }

    #[test]
    fn test_pseudo_elements_need_full_equality() {
        assert!(!are_compatible(
            &component("::slotted(.a)"),
            &component("::slotted(.b)"),
            MergeMode::Unsafe
        ));
        assert!(are_compatible(&component("::before"), &component("::before"), MergeMode::Safe));
    }

    #[test]
    fn test_unmergeable_never_compatible() {
        assert!(!are_compatible(&Component::Nesting, &Component::Nesting, MergeMode::Unsafe));
    }

    #[test]
    fn test_argument_policies() {
        let policy = |text: &str| component(text).as_pseudo().map(argument_policy);
        assert_eq!(policy(":is(.a)"), Some(ArgumentPolicy::Transparent));
        assert_eq!(policy(":-webkit-any(.a)"), Some(ArgumentPolicy::Transparent));
        assert_eq!(policy(":where(.a)"), Some(ArgumentPolicy::Union));
        assert_eq!(policy(":has(> .a)"), Some(ArgumentPolicy::Union));
        assert_eq!(policy(":not(.a)"), Some(ArgumentPolicy::Opaque));
        assert_eq!(policy(":nth-child(2n)"), Some(ArgumentPolicy::Opaque));
    }

    #[test]
    fn test_variant_identity() {
        let (a, b) = (component(":has(.a)"), component(":has(.b)"));
        assert!(same_variant(&a, &b, MergeMode::Greedy));
        assert!(!same_variant(&a, &b, MergeMode::Safe));
        assert!(!same_variant(&a, &b, MergeMode::UnsafeLinear));
        let (x, y) = (component(":not(.a)"), component(":not(.b)"));
        assert!(!same_variant(&x, &y, MergeMode::Greedy));
    }
}
