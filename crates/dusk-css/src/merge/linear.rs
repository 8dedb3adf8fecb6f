//! The linear pass.
//!
//! Run over the output of the nested pass in `unsafe` mode. Every trie node
//! must hold a single variant by now, so the trie is a plain prefix tree and
//! the only thing left to merge is a component whose continuations are all
//! single compounds: `.a:hover, .a:focus` becomes `.a:is(:hover, :focus)`.

use super::classify::{CompatibilityClass, classify};
use super::nested::{prepend, wrap_groups};
use super::trie::{ROOT, Trie, TrieNodeId};
use super::{MergeError, MergePseudo};
use crate::selector::{Component, SelectorGroup};

/// Read the alternatives back out of a trie built in
/// [`MergeMode::UnsafeLinear`](super::MergeMode::UnsafeLinear).
///
/// # Errors
///
/// [`MergeError::LinearCardinality`] when a node holds more than one
/// variant.
pub fn build_merged_selectors_linear(
    trie: &Trie<'_>,
    pseudo: MergePseudo,
) -> Result<Vec<SelectorGroup>, MergeError> {
    let groups = walk(trie, ROOT, pseudo)?;
    let mut unique: Vec<Vec<Component>> = Vec::with_capacity(groups.len());
    for group in groups {
        if !unique.contains(&group) {
            unique.push(group);
        }
    }
    Ok(unique.into_iter().map(SelectorGroup::new).collect())
}

fn walk(trie: &Trie<'_>, id: TrieNodeId, pseudo: MergePseudo) -> Result<Vec<Vec<Component>>, MergeError> {
    let node = trie.node(id);
    let mut tails = Vec::new();
    for &child in &node.children {
        tails.extend(walk(trie, child, pseudo)?);
    }

    let head = match node.variants.as_slice() {
        [] => return Ok(tails),
        [variant] => variant.component,
        variants => {
            return Err(MergeError::LinearCardinality {
                variants: variants.len(),
            });
        }
    };

    let mut groups = Vec::with_capacity(tails.len() + 1);
    if node.terminal || node.children.is_empty() {
        groups.push(vec![head.clone()]);
    }
    if head.is_combinator() || head.is_pseudo_element() {
        groups.extend(tails.into_iter().map(|tail| prepend(head, tail)));
        return Ok(groups);
    }

    // Continuations keyed by the class of a single-compound tail; `None`
    // for tails that cannot go inside `:is()`.
    let mut keyed: Vec<(Option<CompatibilityClass>, Vec<Vec<Component>>)> = Vec::new();
    for tail in tails {
        let key = compound_tail_class(&tail);
        match keyed.iter_mut().find(|(k, _)| key.is_some() && *k == key) {
            Some((_, members)) => members.push(tail),
            None => keyed.push((key, vec![tail])),
        }
    }

    for (key, members) in keyed {
        if key.is_some() && members.len() > 1 {
            groups.push(vec![head.clone(), wrap_groups(members, pseudo)]);
        } else {
            groups.extend(members.into_iter().map(|tail| prepend(head, tail)));
        }
    }
    Ok(groups)
}

fn compound_tail_class(tail: &[Component]) -> Option<CompatibilityClass> {
    let compound = tail.iter().all(|c| {
        !c.is_combinator() && !c.is_pseudo_element() && !matches!(c, Component::Nesting)
    });
    if compound {
        tail.first().map(classify)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::merge::MergeMode;
    use crate::selector::{SelectorList, parse_selector_list};

    fn linear(text: &str) -> Result<String, MergeError> {
        let list = parse_selector_list(text).expect("selector should parse");
        let trie = Trie::build(&list, MergeMode::UnsafeLinear)?;
        Ok(SelectorList::new(build_merged_selectors_linear(&trie, MergePseudo::Is)?).to_string())
    }

    #[test]
    fn test_groups_compound_continuations() {
        assert_eq!(linear(".a:hover, .a:focus").as_deref(), Ok(".a:is(:hover, :focus)"));
    }

    #[test]
    fn test_keeps_complex_continuations_apart() {
        assert_eq!(
            linear(":is(.x, .y) > .a, :is(.x, .y) .a").as_deref(),
            Ok(":is(.x, .y) > .a, :is(.x, .y) .a")
        );
    }

    #[test]
    fn test_terminal_prefix() {
        assert_eq!(linear(".a, .a:hover").as_deref(), Ok(".a, .a:hover"));
    }

    #[test]
    fn test_rejects_multiple_variants() {
        assert_eq!(
            linear(".a, .b"),
            Err(MergeError::LinearCardinality { variants: 2 })
        );
    }

    #[test]
    fn test_pseudo_element_heads_are_not_grouped() {
        assert_eq!(
            linear("::before:hover, ::before:focus").as_deref(),
            Ok("::before:hover, ::before:focus")
        );
    }
}
