//! [§ 4.1 Selector matching](https://www.w3.org/TR/selectors-4/#match-a-selector-against-an-element)
//!
//! Right-to-left matching with backtracking: when a descendant or
//! subsequent-sibling combinator has several candidate elements, each one is
//! tried until the rest of the selector matches.

use dusk_dom::{DomTree, ElementData, NodeId};

use super::{
    AttributeCase, AttributeOperator, AttributeSelector, Combinator, Component, PseudoClass,
    SelectorGroup, SelectorList,
};

impl SelectorList {
    /// Whether any alternative matches the element `node`.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        self.groups.iter().any(|group| group.matches(tree, node))
    }

    /// Every element of `tree` that the list matches, in document order.
    #[must_use]
    pub fn matching_elements(&self, tree: &DomTree) -> Vec<NodeId> {
        tree.elements().filter(|&e| self.matches(tree, e)).collect()
    }
}

impl SelectorGroup {
    /// Whether this alternative matches the element `node`.
    #[must_use]
    pub fn matches(&self, tree: &DomTree, node: NodeId) -> bool {
        let complex = Complex::new(self);
        complex
            .last_index()
            .is_some_and(|last| complex.matches_at(last, tree, node, None))
    }
}

/// A group split into compounds, with the combinators between them.
struct Complex<'a> {
    /// Combinator before the first compound (relative selectors only).
    leading: Option<Combinator>,
    compounds: Vec<Vec<&'a Component>>,
    /// `combinators[i]` sits between `compounds[i]` and `compounds[i + 1]`.
    combinators: Vec<Combinator>,
}

impl<'a> Complex<'a> {
    fn new(group: &'a SelectorGroup) -> Self {
        let mut complex = Self {
            leading: None,
            compounds: vec![Vec::new()],
            combinators: Vec::new(),
        };
        for component in &group.components {
            match component {
                Component::Comment(_) => {}
                Component::Combinator(combinator) => {
                    let at_start = complex.compounds.len() == 1
                        && complex.compounds.first().is_some_and(Vec::is_empty);
                    if at_start {
                        complex.leading = Some(*combinator);
                    } else {
                        complex.combinators.push(*combinator);
                        complex.compounds.push(Vec::new());
                    }
                }
                simple => {
                    if let Some(compound) = complex.compounds.last_mut() {
                        compound.push(simple);
                    }
                }
            }
        }
        complex
    }

    fn last_index(&self) -> Option<usize> {
        self.compounds.len().checked_sub(1)
    }

    /// Match `compounds[..=index]` with `compounds[index]` on `node`. With an
    /// anchor, the first compound must additionally stand in the anchor's
    /// combinator relation to the anchor element.
    fn matches_at(
        &self,
        index: usize,
        tree: &DomTree,
        node: NodeId,
        anchor: Option<(Combinator, NodeId)>,
    ) -> bool {
        let Some(compound) = self.compounds.get(index) else {
            return false;
        };
        if !compound_matches(compound, tree, node) {
            return false;
        }
        if index == 0 {
            return anchor
                .is_none_or(|(combinator, anchor)| candidates(tree, combinator, node).contains(&anchor));
        }
        let combinator = self.combinators[index - 1];
        candidates(tree, combinator, node)
            .into_iter()
            .any(|candidate| self.matches_at(index - 1, tree, candidate, anchor))
    }
}

/// Elements on the left-hand side of `combinator` when `node` is on its right.
fn candidates(tree: &DomTree, combinator: Combinator, node: NodeId) -> Vec<NodeId> {
    let is_element = |&id: &NodeId| tree.as_element(id).is_some();
    match combinator {
        Combinator::Descendant => tree.ancestors(node).filter(is_element).collect(),
        Combinator::Child => tree.parent_element(node).into_iter().collect(),
        Combinator::NextSibling => tree.prev_element_sibling(node).into_iter().collect(),
        Combinator::SubsequentSibling => tree.preceding_siblings(node).filter(is_element).collect(),
    }
}

/// [§ 4.3 Compound selectors](https://www.w3.org/TR/selectors-4/#compound)
/// "A given element is said to match a compound selector when it matches all
/// simple selectors in the compound selector."
fn compound_matches(compound: &[&Component], tree: &DomTree, node: NodeId) -> bool {
    let Some(element) = tree.as_element(node) else {
        return false;
    };
    compound.iter().all(|component| match component {
        Component::Tag(name) => element.tag_name.eq_ignore_ascii_case(name),
        Component::Universal | Component::Comment(_) => true,
        Component::Id(id) => element.id() == Some(id.as_str()),
        Component::Class(class) => element.has_class(class),
        Component::Attribute(attribute) => attribute_matches(attribute, element),
        Component::PseudoClass(pseudo) => pseudo_matches(pseudo, tree, node, element),
        // `&` outside any nesting context behaves like `:scope`, which is the
        // root element here.
        Component::Nesting => tree.document_element() == Some(node),
        Component::Combinator(_) => false,
    })
}

/// [§ 6.1](https://www.w3.org/TR/selectors-4/#attribute-representation) and
/// [§ 6.2 Substring matching attribute selectors](https://www.w3.org/TR/selectors-4/#attribute-substrings)
fn attribute_matches(attribute: &AttributeSelector, element: &ElementData) -> bool {
    let Some(actual) = element.attr(&attribute.name) else {
        return false;
    };
    let (Some(operator), Some(expected)) = (attribute.operator, attribute.value.as_deref()) else {
        return true;
    };
    let (actual, expected) = if attribute.case == AttributeCase::Insensitive {
        (actual.to_ascii_lowercase(), expected.to_ascii_lowercase())
    } else {
        (actual.to_owned(), expected.to_owned())
    };

    match operator {
        AttributeOperator::Equals => actual == expected,
        // "If "val" contains whitespace, it will never represent anything
        // (since the words are separated by spaces). Also if "val" is the empty
        // string, it will never represent anything."
        AttributeOperator::Includes => {
            !expected.is_empty()
                && !expected.contains(|c: char| c.is_ascii_whitespace())
                && actual.split_ascii_whitespace().any(|word| word == expected)
        }
        AttributeOperator::DashMatch => {
            actual == expected
                || actual
                    .strip_prefix(expected.as_str())
                    .is_some_and(|rest| rest.starts_with('-'))
        }
        // "If "val" is the empty string then the selector does not represent
        // anything."
        AttributeOperator::Prefix => !expected.is_empty() && actual.starts_with(&expected),
        AttributeOperator::Suffix => !expected.is_empty() && actual.ends_with(&expected),
        AttributeOperator::Substring => !expected.is_empty() && actual.contains(&expected),
    }
}

/// [§ 4 Logical combinations](https://www.w3.org/TR/selectors-4/#logical-combination)
/// and [§ 14 Tree-structural pseudo-classes](https://www.w3.org/TR/selectors-4/#structural-pseudos).
///
/// User-action, linguistic and other pseudo-classes, and every pseudo-element,
/// never match a static tree.
fn pseudo_matches(pseudo: &PseudoClass, tree: &DomTree, node: NodeId, element: &ElementData) -> bool {
    if pseudo.is_pseudo_element() {
        return false;
    }
    let arguments = pseudo.selector_arguments();
    let same_type = |id: &NodeId| {
        tree.as_element(*id)
            .is_some_and(|e| e.tag_name.eq_ignore_ascii_case(&element.tag_name))
    };

    match pseudo.base_name() {
        // [§ 14.1 :root](https://www.w3.org/TR/selectors-4/#the-root-pseudo)
        "root" => tree.document_element() == Some(node),

        // [§ 14.2 :empty](https://www.w3.org/TR/selectors-4/#the-empty-pseudo)
        // "The :empty pseudo-class represents an element that has no children
        // except, optionally, document white space characters."
        "empty" => tree.children(node).iter().all(|&child| {
            tree.as_element(child).is_none()
                && tree
                    .as_text(child)
                    .is_none_or(|text| text.chars().all(|c| c.is_ascii_whitespace()))
        }),

        // [§ 14.4 Child-indexed pseudo-classes](https://www.w3.org/TR/selectors-4/#child-index)
        "first-child" => tree.prev_element_sibling(node).is_none(),
        "last-child" => tree.next_element_sibling(node).is_none(),
        "only-child" => {
            tree.prev_element_sibling(node).is_none() && tree.next_element_sibling(node).is_none()
        }

        // [§ 14.5 Typed child-indexed pseudo-classes](https://www.w3.org/TR/selectors-4/#typed-child-index)
        "first-of-type" => !tree.preceding_siblings(node).any(|s| same_type(&s)),
        "last-of-type" => !following_siblings(tree, node).iter().any(same_type),
        "only-of-type" => {
            !tree.preceding_siblings(node).any(|s| same_type(&s))
                && !following_siblings(tree, node).iter().any(same_type)
        }

        // [§ 4.2 :is()](https://www.w3.org/TR/selectors-4/#matches) and
        // [§ 4.4 :where()](https://www.w3.org/TR/selectors-4/#zero-matches)
        "is" | "matches" | "any" | "where" => {
            arguments.is_some_and(|list| list.matches(tree, node))
        }

        // [§ 4.3 :not()](https://www.w3.org/TR/selectors-4/#negation)
        "not" => arguments.is_some_and(|list| !list.matches(tree, node)),

        // [§ 4.5 :has()](https://www.w3.org/TR/selectors-4/#relational)
        // "represents an element if any of the relative selectors ... would
        // match at least one element when anchored against this element."
        "has" => arguments.is_some_and(|list| {
            list.groups.iter().any(|group| {
                let complex = Complex::new(group);
                let leading = complex.leading.unwrap_or(Combinator::Descendant);
                complex.last_index().is_some_and(|last| {
                    tree.elements()
                        .any(|e| complex.matches_at(last, tree, e, Some((leading, node))))
                })
            })
        }),

        _ => false,
    }
}

fn following_siblings(tree: &DomTree, node: NodeId) -> Vec<NodeId> {
    let mut siblings = Vec::new();
    let mut current = tree.next_sibling(node);
    while let Some(sibling) = current {
        siblings.push(sibling);
        current = tree.next_sibling(sibling);
    }
    siblings
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse_selector_list;

    /// ```text
    /// html
    ///   body
    ///     div#main.box
    ///       p.intro[lang=en-US]
    ///       p
    ///       span
    ///     div.box
    /// ```
    fn fixture() -> (DomTree, Vec<NodeId>) {
        let mut tree = DomTree::new();
        let html = tree.append_element(NodeId::ROOT, "html", &[]);
        let body = tree.append_element(html, "body", &[]);
        let main = tree.append_element(body, "div", &[("id", "main"), ("class", "box")]);
        let intro = tree.append_element(main, "p", &[("class", "intro"), ("lang", "en-US")]);
        let second = tree.append_element(main, "p", &[]);
        let span = tree.append_element(main, "span", &[]);
        let other = tree.append_element(body, "div", &[("class", "box")]);
        (tree, vec![html, body, main, intro, second, span, other])
    }

    fn matched(text: &str) -> Vec<usize> {
        let (tree, nodes) = fixture();
        let list = parse_selector_list(text).expect("selector should parse");
        nodes
            .iter()
            .enumerate()
            .filter(|&(_, &n)| list.matches(&tree, n))
            .map(|(i, _)| i)
            .collect()
    }

    #[test]
    fn test_descendant_backtracks() {
        assert_eq!(matched("body div p"), vec![3, 4]);
        assert_eq!(matched("html > div"), Vec::<usize>::new());
    }

    #[test]
    fn test_sibling_combinators() {
        assert_eq!(matched(".intro + p"), vec![4]);
        assert_eq!(matched(".intro ~ *"), vec![4, 5]);
    }

    #[test]
    fn test_structural_pseudo_classes() {
        assert_eq!(matched(":root"), vec![0]);
        assert_eq!(matched("p:first-of-type"), vec![3]);
        assert_eq!(matched("#main > :last-child"), vec![5]);
        assert_eq!(matched("span:only-of-type"), vec![5]);
        assert_eq!(matched("p:empty"), vec![3, 4]);
    }

    #[test]
    fn test_logical_pseudo_classes() {
        assert_eq!(matched("div:not(#main)"), vec![6]);
        assert_eq!(matched(":is(span, .intro)"), vec![3, 5]);
        assert_eq!(matched("div:has(> .intro)"), vec![2]);
        assert_eq!(matched("p:has(+ span)"), vec![4]);
        assert_eq!(matched(":has(p)"), vec![0, 1, 2]);
    }

    #[test]
    fn test_attribute_operators() {
        assert_eq!(matched("[lang|=en]"), vec![3]);
        assert_eq!(matched("[lang^=EN i]"), vec![3]);
        assert_eq!(matched("[lang^=EN]"), Vec::<usize>::new());
        assert_eq!(matched("[class~=box]"), vec![2, 6]);
    }

    #[test]
    fn test_pseudo_elements_never_match() {
        assert_eq!(matched("p::before"), Vec::<usize>::new());
        assert_eq!(matched("a:hover"), Vec::<usize>::new());
    }
}
