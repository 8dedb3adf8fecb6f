//! Rebuilding a selector list from a trie.
//!
//! In the relaxed modes every node becomes one head component (its variants
//! wrapped in `:is()` when there are several) and the list is the product of
//! heads along every root-to-leaf walk. This can combine a prefix of one
//! alternative with the continuation of another, which is the over-matching
//! those modes accept.
//!
//! `Safe` mode rebuilds from the recorded alternative paths instead: at each
//! node, variants share one `:is()` only when exactly the same continuations
//! follow each of them, so no new combination can appear.

use super::classify::pools_arguments;
use super::plugin::unwrap_redundant_is;
use super::trie::{ROOT, Step, Trie, TrieNode, TrieNodeId, expand_transparent};
use super::{MergeError, MergeMode, MergePseudo};
use crate::selector::{Component, PseudoClass, SelectorGroup, SelectorList};

/// Read a selector list back out of `trie`, grouping divergent components
/// under `pseudo`.
///
/// # Errors
///
/// [`MergeError::DepthExceeded`] when pooled arguments nest too deeply.
pub fn build_merged_selectors(trie: &Trie<'_>, pseudo: MergePseudo) -> Result<Vec<SelectorGroup>, MergeError> {
    let groups = if trie.mode().is_relaxed() {
        product(trie, ROOT, pseudo)?
    } else {
        let paths: Vec<&[Step]> = trie.paths().iter().map(Vec::as_slice).collect();
        rebuild(trie, &paths, pseudo)?
    };

    let mut unique: Vec<Vec<Component>> = Vec::with_capacity(groups.len());
    for group in groups {
        if !unique.contains(&group) {
            unique.push(group);
        }
    }
    Ok(unique.into_iter().map(SelectorGroup::new).collect())
}

fn product(trie: &Trie<'_>, id: TrieNodeId, pseudo: MergePseudo) -> Result<Vec<Vec<Component>>, MergeError> {
    let node = trie.node(id);
    let mut tails = Vec::new();
    for &child in &node.children {
        tails.extend(product(trie, child, pseudo)?);
    }
    if node.variants.is_empty() {
        return Ok(tails);
    }

    let head = product_head(node, pseudo)?;
    let mut groups = Vec::with_capacity(tails.len() + 1);
    if node.terminal || node.children.is_empty() {
        groups.push(vec![head.clone()]);
    }
    for tail in tails {
        groups.push(prepend(&head, tail));
    }
    Ok(groups)
}

/// Every variant of the node, with the node's pooled arguments rebuilt and
/// attached, under one wrapper if there are several.
fn product_head(node: &TrieNode<'_>, pseudo: MergePseudo) -> Result<Component, MergeError> {
    let arguments = match &node.subtrie {
        Some(subtrie) => Some(unwrap_redundant_is(SelectorList::new(build_merged_selectors(
            subtrie, pseudo,
        )?))),
        None => None,
    };
    let headers = node
        .variants
        .iter()
        .map(|variant| match (&arguments, variant.component) {
            (Some(arguments), Component::PseudoClass(p)) => Component::PseudoClass(
                PseudoClass::with_selectors(p.name.clone(), arguments.clone()),
            ),
            (_, component) => component.clone(),
        })
        .collect();
    Ok(wrap(headers, pseudo))
}

/// `components` as alternatives of one `:is()`/`:where()`, or the component
/// itself when there is only one.
pub(crate) fn wrap(mut components: Vec<Component>, pseudo: MergePseudo) -> Component {
    match components.pop() {
        Some(component) if components.is_empty() => component,
        last => {
            components.extend(last);
            wrap_groups(components.into_iter().map(|c| vec![c]).collect(), pseudo)
        }
    }
}

/// `groups` as the argument list of one `:is()`/`:where()`.
pub(crate) fn wrap_groups(groups: Vec<Vec<Component>>, pseudo: MergePseudo) -> Component {
    Component::PseudoClass(PseudoClass::with_selectors(
        pseudo.pseudo_name(),
        SelectorList::new(groups.into_iter().map(SelectorGroup::new).collect()),
    ))
}

pub(crate) fn prepend(head: &Component, tail: Vec<Component>) -> Vec<Component> {
    let mut group = Vec::with_capacity(tail.len() + 1);
    group.push(head.clone());
    group.extend(tail);
    group
}

/// Rebuild the alternatives spelled by `paths`.
fn rebuild(trie: &Trie<'_>, paths: &[&[Step]], pseudo: MergePseudo) -> Result<Vec<Vec<Component>>, MergeError> {
    // Paths grouped by the node they start with; `None` for paths that ended.
    let mut partitions: Vec<(Option<TrieNodeId>, Vec<&[Step]>)> = Vec::new();
    for &path in paths {
        let key = path.first().map(|step| step.node);
        match partitions.iter_mut().find(|(k, _)| *k == key) {
            Some((_, members)) => members.push(path),
            None => partitions.push((key, vec![path])),
        }
    }

    let mut groups = Vec::new();
    for (key, members) in partitions {
        let Some(node_id) = key else {
            groups.push(Vec::new());
            continue;
        };

        // The continuations of each variant, in first-seen order.
        let mut continuations: Vec<(usize, Vec<&[Step]>)> = Vec::new();
        for path in members {
            let Some((first, rest)) = path.split_first() else {
                continue;
            };
            match continuations.iter_mut().find(|(v, _)| *v == first.variant) {
                Some((_, suffixes)) => {
                    if !suffixes.contains(&rest) {
                        suffixes.push(rest);
                    }
                }
                None => continuations.push((first.variant, vec![rest])),
            }
        }

        // Variants followed by the same set of continuations.
        let mut classes: Vec<(Vec<usize>, Vec<&[Step]>)> = Vec::new();
        for (variant, suffixes) in continuations {
            match classes
                .iter_mut()
                .find(|(_, existing)| same_set(existing, &suffixes))
            {
                Some((variants, _)) => variants.push(variant),
                None => classes.push((vec![variant], suffixes)),
            }
        }

        let node = trie.node(node_id);
        for (variants, suffixes) in classes {
            let head = class_head(trie, node, &variants, pseudo)?;
            for tail in rebuild(trie, &suffixes, pseudo)? {
                groups.push(prepend(&head, tail));
            }
        }
    }
    Ok(groups)
}

fn same_set(a: &[&[Step]], b: &[&[Step]]) -> bool {
    a.len() == b.len() && a.iter().all(|x| b.contains(x))
}

/// Head component for a class of interchangeable variants.
fn class_head(
    trie: &Trie<'_>,
    node: &TrieNode<'_>,
    variants: &[usize],
    pseudo: MergePseudo,
) -> Result<Component, MergeError> {
    let components: Vec<&Component> = variants
        .iter()
        .map(|&v| node.variants[v].component)
        .collect();
    if let [single] = components.as_slice() {
        return Ok((*single).clone());
    }
    if let Some(pooled) = pool_arguments(&components, trie.depth(), pseudo)? {
        return Ok(pooled);
    }
    Ok(wrap(components.into_iter().cloned().collect(), pseudo))
}

/// `:has(A)` and `:has(B)` become `:has(A, B)`, with the pooled list merged
/// in turn. Only for same-named pseudo-classes that pool arguments.
fn pool_arguments(
    components: &[&Component],
    depth: usize,
    pseudo: MergePseudo,
) -> Result<Option<Component>, MergeError> {
    let Some(Component::PseudoClass(first)) = components.first() else {
        return Ok(None);
    };
    if !pools_arguments(first) {
        return Ok(None);
    }

    let mut groups = Vec::new();
    for component in components {
        let arguments = match component {
            Component::PseudoClass(other) if other.name == first.name => other.selector_arguments(),
            _ => None,
        };
        let Some(arguments) = arguments else {
            return Ok(None);
        };
        groups.extend(arguments.groups.iter().cloned());
    }

    let merged = merge_arguments(&SelectorList::new(groups), depth + 1, pseudo)?;
    Ok(Some(Component::PseudoClass(PseudoClass::with_selectors(
        first.name.clone(),
        merged,
    ))))
}

/// Safe-mode merge of a pooled argument list.
fn merge_arguments(list: &SelectorList, depth: usize, pseudo: MergePseudo) -> Result<SelectorList, MergeError> {
    let expanded = expand_transparent(list, MergeMode::Safe, depth)?;
    let trie = Trie::build_at(&expanded, MergeMode::Safe, depth)?;
    let merged = unwrap_redundant_is(SelectorList::new(build_merged_selectors(&trie, pseudo)?));
    Ok(if merged.len() > list.len() {
        list.clone()
    } else {
        merged
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse_selector_list;

    fn merged(text: &str, mode: MergeMode) -> String {
        let list = parse_selector_list(text).expect("selector should parse");
        let trie = Trie::build(&list, mode).expect("trie");
        SelectorList::new(build_merged_selectors(&trie, MergePseudo::Is).expect("rebuild")).to_string()
    }

    #[test]
    fn test_shared_prefix() {
        assert_eq!(merged(".a.x, .a.y", MergeMode::Safe), ".a:is(.x, .y)");
        assert_eq!(merged(".a.x, .a.y", MergeMode::Greedy), ".a:is(.x, .y)");
    }

    #[test]
    fn test_shared_suffix_in_safe_mode() {
        assert_eq!(merged("div > .a, span > .a", MergeMode::Safe), ":is(div, span) > .a");
    }

    #[test]
    fn test_safe_mode_does_not_cross_combine() {
        assert_eq!(merged(".a.x, .b.y", MergeMode::Safe), ".a.x, .b.y");
        assert_eq!(merged(".a.x, .b.y", MergeMode::Greedy), ":is(.a, .b):is(.x, .y)");
    }

    #[test]
    fn test_terminal_prefix_survives() {
        assert_eq!(merged(".a, .a.b", MergeMode::Greedy), ".a, .a.b");
        assert_eq!(merged(".a, .a.b", MergeMode::Safe), ".a, .a.b");
    }

    #[test]
    fn test_safe_partial_sharing() {
        // `.b` has an extra continuation, so only `.a` and `.c` share a head.
        assert_eq!(
            merged(".a .x, .b .x, .b .y, .c .x", MergeMode::Safe),
            ":is(.a, .c) .x, .b :is(.x, .y)"
        );
    }

    #[test]
    fn test_union_pseudo_classes_pool_arguments() {
        assert_eq!(merged(".a:has(.x), .a:has(.y)", MergeMode::Safe), ".a:has(.x, .y)");
        assert_eq!(merged(".a:has(.x), .a:has(.y)", MergeMode::Greedy), ".a:has(.x, .y)");
        assert_eq!(
            merged(".a:not(.x), .a:not(.y)", MergeMode::Safe),
            ".a:is(:not(.x), :not(.y))"
        );
    }

    #[test]
    fn test_wrap_single_component_is_unchanged() {
        let component = Component::class("a");
        assert_eq!(wrap(vec![component.clone()], MergePseudo::Where), component);
        let wrapped = wrap(vec![Component::class("a"), Component::class("b")], MergePseudo::Where);
        assert_eq!(wrapped.to_string(), ":where(.a, .b)");
    }
}
