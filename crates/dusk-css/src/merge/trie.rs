//! The prefix trie over selector components.
//!
//! Every alternative of a selector list is inserted left to right. At each
//! step the component goes into the first child node whose variants it is
//! compatible with ([`are_compatible`]), or into a new child. Inside that
//! node it joins an equal variant or becomes a new one. Nodes are kept in an
//! arena and refer to each other by index.
//!
//! Before insertion, transparent `:is()` pseudo-classes are inlined where
//! that keeps the selector's meaning ([`expand_transparent`]).

use core::fmt;

use super::classify::{ArgumentPolicy, are_compatible, argument_policy, pools_arguments, same_variant};
use super::{MergeError, MergeMode};
use crate::selector::{
    Component, MAX_NESTING_DEPTH, PseudoClass, SelectorGroup, SelectorList,
};

/// Index of a node in its [`Trie`].
pub type TrieNodeId = usize;

/// The synthetic root node; it never has variants.
pub const ROOT: TrieNodeId = 0;

/// Upper bound on the alternatives one alternative may expand into when a
/// `:is()` is distributed over its compound.
const MAX_DISTRIBUTED: usize = 64;

/// One position of an inserted alternative: a node and a variant in it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Step {
    /// The node.
    pub node: TrieNodeId,
    /// Index into the node's variants.
    pub variant: usize,
}

/// A distinct component at a trie position.
#[derive(Debug, Clone)]
pub struct TrieVariant<'a> {
    /// The component, borrowed from the list the trie was built from.
    pub component: &'a Component,
    /// Index of the alternative that first inserted it.
    pub origin: usize,
    /// Child nodes that followed this variant in some alternative.
    pub next_children: Vec<TrieNodeId>,
    /// Variants that followed this variant in some alternative.
    pub next_variants: Vec<Step>,
}

/// A trie position holding mutually compatible variants.
#[derive(Debug, Clone, Default)]
pub struct TrieNode<'a> {
    /// Compatible components at this position, in insertion order.
    pub variants: Vec<TrieVariant<'a>>,
    /// Continuations, pairwise incompatible.
    pub children: Vec<TrieNodeId>,
    /// Pooled selector arguments of the variants (relaxed modes only).
    pub subtrie: Option<Box<Trie<'a>>>,
    /// Whether some alternative ends here.
    pub terminal: bool,
}

/// A prefix trie over the alternatives of one selector list.
#[derive(Debug, Clone)]
pub struct Trie<'a> {
    nodes: Vec<TrieNode<'a>>,
    mode: MergeMode,
    depth: usize,
    paths: Vec<Vec<Step>>,
}

impl<'a> Trie<'a> {
    /// An empty trie.
    #[must_use]
    pub fn new(mode: MergeMode, depth: usize) -> Self {
        Self {
            nodes: vec![TrieNode::default()],
            mode,
            depth,
            paths: Vec::new(),
        }
    }

    /// Build a trie from every alternative of `list`.
    ///
    /// # Errors
    ///
    /// [`MergeError::InvariantViolation`] for alternatives that are empty or
    /// have misplaced combinators, [`MergeError::DepthExceeded`] when pooled
    /// arguments nest too deeply.
    pub fn build(list: &'a SelectorList, mode: MergeMode) -> Result<Self, MergeError> {
        Self::build_at(list, mode, 0)
    }

    /// [`Trie::build`] for a list found `depth` levels inside pseudo-class
    /// arguments.
    ///
    /// # Errors
    ///
    /// As [`Trie::build`].
    pub fn build_at(list: &'a SelectorList, mode: MergeMode, depth: usize) -> Result<Self, MergeError> {
        if depth > MAX_NESTING_DEPTH {
            return Err(MergeError::DepthExceeded { depth });
        }
        let mut trie = Self::new(mode, depth);
        trie.insert_list(list)?;
        Ok(trie)
    }

    /// Insert every alternative of `list`.
    ///
    /// # Errors
    ///
    /// As [`Trie::build`].
    pub fn insert_list(&mut self, list: &'a SelectorList) -> Result<(), MergeError> {
        for (origin, group) in list.groups.iter().enumerate() {
            self.insert_group(group, origin)?;
        }
        Ok(())
    }

    /// Insert one alternative.
    ///
    /// # Errors
    ///
    /// As [`Trie::build`].
    pub fn insert_group(&mut self, group: &'a SelectorGroup, origin: usize) -> Result<(), MergeError> {
        validate(group)?;

        let mut current = ROOT;
        let mut previous: Option<Step> = None;
        let mut path = Vec::with_capacity(group.components.len());

        for component in &group.components {
            let node = self.child_for(current, component);
            let variant = self.variant_for(node, component, origin);
            let step = Step { node, variant };

            if let Some(previous) = previous {
                let source = &mut self.nodes[previous.node].variants[previous.variant];
                if !source.next_children.contains(&node) {
                    source.next_children.push(node);
                }
                if !source.next_variants.contains(&step) {
                    source.next_variants.push(step);
                }
            }
            if let Component::PseudoClass(pseudo) = component {
                self.insert_arguments(node, pseudo)?;
            }

            path.push(step);
            current = node;
            previous = Some(step);
        }

        self.nodes[current].terminal = true;
        self.paths.push(path);
        Ok(())
    }

    /// The node with index `id`.
    #[must_use]
    pub fn node(&self, id: TrieNodeId) -> &TrieNode<'a> {
        &self.nodes[id]
    }

    /// The synthetic root.
    #[must_use]
    pub fn root(&self) -> &TrieNode<'a> {
        self.node(ROOT)
    }

    /// Number of nodes, root included.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether nothing has been inserted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    /// The mode the trie was built in.
    #[must_use]
    pub const fn mode(&self) -> MergeMode {
        self.mode
    }

    /// How deep inside pseudo-class arguments this trie sits.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// The inserted alternatives, as the steps each one took.
    #[must_use]
    pub fn paths(&self) -> &[Vec<Step>] {
        &self.paths
    }

    fn child_for(&mut self, current: TrieNodeId, component: &Component) -> TrieNodeId {
        let mode = self.mode;
        let found = self.nodes[current].children.iter().copied().find(|&child| {
            self.nodes[child]
                .variants
                .first()
                .is_some_and(|v| are_compatible(v.component, component, mode))
        });
        if let Some(child) = found {
            debug_assert!(
                self.nodes[child]
                    .variants
                    .iter()
                    .all(|v| are_compatible(v.component, component, mode)),
                "compatibility is not transitive for {component}"
            );
            return child;
        }

        let id = self.nodes.len();
        self.nodes.push(TrieNode::default());
        self.nodes[current].children.push(id);
        id
    }

    fn variant_for(&mut self, node: TrieNodeId, component: &'a Component, origin: usize) -> usize {
        let mode = self.mode;
        let variants = &mut self.nodes[node].variants;
        if let Some(index) = variants
            .iter()
            .position(|v| same_variant(v.component, component, mode))
        {
            return index;
        }
        variants.push(TrieVariant {
            component,
            origin,
            next_children: Vec::new(),
            next_variants: Vec::new(),
        });
        variants.len() - 1
    }

    /// Pool the selector arguments of `pseudo` into the node's subtrie.
    fn insert_arguments(&mut self, node: TrieNodeId, pseudo: &'a PseudoClass) -> Result<(), MergeError> {
        if !self.mode.is_relaxed() || self.mode.is_linear() || !pools_arguments(pseudo) {
            return Ok(());
        }
        let Some(arguments) = pseudo.selector_arguments() else {
            return Ok(());
        };
        let depth = self.depth + 1;
        if depth > MAX_NESTING_DEPTH {
            return Err(MergeError::DepthExceeded { depth });
        }
        let mode = self.mode;
        self.nodes[node]
            .subtrie
            .get_or_insert_with(|| Box::new(Trie::new(mode, depth)))
            .insert_list(arguments)
    }

    fn write_node(&self, f: &mut fmt::Formatter<'_>, id: TrieNodeId, indent: usize) -> fmt::Result {
        let node = self.node(id);
        let mut child_indent = indent;
        if !node.variants.is_empty() {
            write!(f, "{:width$}", "", width = indent * 2)?;
            for (i, variant) in node.variants.iter().enumerate() {
                if i > 0 {
                    f.write_str(" | ")?;
                }
                write!(f, "{}", variant.component)?;
            }
            if node.terminal {
                f.write_str(" $")?;
            }
            writeln!(f)?;
            if let Some(subtrie) = &node.subtrie {
                writeln!(f, "{:width$}  (arguments)", "", width = indent * 2)?;
                subtrie.write_node(f, ROOT, indent + 2)?;
            }
            child_indent += 1;
        }
        for &child in &node.children {
            self.write_node(f, child, child_indent)?;
        }
        Ok(())
    }
}

/// One line per node, children indented under their parent, `$` marking
/// nodes where an alternative ends.
impl fmt::Display for Trie<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.write_node(f, ROOT, 0)
    }
}

fn invariant(message: &str) -> MergeError {
    MergeError::InvariantViolation {
        message: message.to_owned(),
    }
}

fn validate(group: &SelectorGroup) -> Result<(), MergeError> {
    if group.is_empty() {
        return Err(invariant("empty selector alternative"));
    }
    if group.components.last().is_some_and(Component::is_combinator) {
        return Err(invariant("alternative ends with a combinator"));
    }
    if group
        .components
        .windows(2)
        .any(|pair| pair[0].is_combinator() && pair[1].is_combinator())
    {
        return Err(invariant("two combinators in a row"));
    }
    Ok(())
}

/// [Selectors 4 § 4.2](https://www.w3.org/TR/selectors-4/#matches): inline
/// `:is()` arguments where the result matches the same elements.
///
/// - An alternative that is nothing but one `:is(A, B)` becomes `A` and `B`.
/// - An `:is()` inside a compound is distributed over it (`:is(.a, .b).c`
///   becomes `.a.c` and `.b.c`) when every argument is a single compound
///   without pseudo-elements and no type selector would end up in the
///   middle of a compound.
///
/// In `Safe` mode both also require every argument to have the same
/// specificity, since inlining drops the `:is()`'s max-of-arguments
/// specificity. Arguments of `:is()`, `:where()` and `:has()` are expanded
/// recursively. The linear pass expands nothing.
///
/// # Errors
///
/// [`MergeError::DepthExceeded`] past [`MAX_NESTING_DEPTH`].
pub fn expand_transparent(list: &SelectorList, mode: MergeMode, depth: usize) -> Result<SelectorList, MergeError> {
    if mode.is_linear() {
        return Ok(list.clone());
    }
    if depth > MAX_NESTING_DEPTH {
        return Err(MergeError::DepthExceeded { depth });
    }
    let mut groups = Vec::with_capacity(list.len());
    for group in &list.groups {
        groups.extend(expand_group(group, mode, depth)?);
    }
    Ok(SelectorList::new(groups))
}

fn expand_group(group: &SelectorGroup, mode: MergeMode, depth: usize) -> Result<Vec<SelectorGroup>, MergeError> {
    let components = group
        .components
        .iter()
        .map(|component| expand_arguments(component, mode, depth))
        .collect::<Result<Vec<_>, _>>()?;

    if let Some(arguments) = sole_inlinable(&components, mode) {
        return Ok(arguments.groups.clone());
    }
    Ok(distribute(&components, mode)
        .into_iter()
        .map(SelectorGroup::new)
        .collect())
}

fn expand_arguments(component: &Component, mode: MergeMode, depth: usize) -> Result<Component, MergeError> {
    match component {
        Component::PseudoClass(pseudo) if pools_arguments(pseudo) => {
            let Some(arguments) = pseudo.selector_arguments() else {
                return Ok(component.clone());
            };
            let expanded = expand_transparent(arguments, mode, depth + 1)?;
            Ok(Component::PseudoClass(PseudoClass::with_selectors(
                pseudo.name.clone(),
                expanded,
            )))
        }
        _ => Ok(component.clone()),
    }
}

fn sole_inlinable(components: &[Component], mode: MergeMode) -> Option<&SelectorList> {
    match components {
        [Component::PseudoClass(pseudo)] if argument_policy(pseudo) == ArgumentPolicy::Transparent => {
            let arguments = pseudo.selector_arguments()?;
            (mode.is_relaxed() || same_specificity(arguments)).then_some(arguments)
        }
        _ => None,
    }
}

fn distribute(components: &[Component], mode: MergeMode) -> Vec<Vec<Component>> {
    let mut partials: Vec<Vec<Component>> = vec![Vec::with_capacity(components.len())];

    for (i, component) in components.iter().enumerate() {
        let compound_start = i == 0 || components[i - 1].is_combinator();
        let arguments = component
            .as_pseudo()
            .and_then(|pseudo| distributable(pseudo, compound_start, mode))
            .filter(|arguments| partials.len() * arguments.len() <= MAX_DISTRIBUTED);

        if let Some(arguments) = arguments {
            partials = partials
                .iter()
                .flat_map(|partial| {
                    arguments.groups.iter().map(move |argument| {
                        let mut expanded = partial.clone();
                        expanded.extend(argument.components.iter().cloned());
                        expanded
                    })
                })
                .collect();
        } else {
            for partial in &mut partials {
                partial.push(component.clone());
            }
        }
    }
    partials
}

fn distributable(pseudo: &PseudoClass, compound_start: bool, mode: MergeMode) -> Option<&SelectorList> {
    if argument_policy(pseudo) != ArgumentPolicy::Transparent {
        return None;
    }
    let arguments = pseudo.selector_arguments()?;
    let single_compounds = arguments.groups.iter().all(|group| {
        !group.is_empty()
            && group.components.iter().all(|c| {
                !c.is_combinator()
                    && !c.is_pseudo_element()
                    && !matches!(c, Component::Nesting | Component::Comment(_))
            })
    });
    let typed = arguments.groups.iter().any(|group| {
        matches!(
            group.components.first(),
            Some(Component::Tag(_) | Component::Universal)
        )
    });
    if !single_compounds || (typed && !compound_start) {
        return None;
    }
    (mode.is_relaxed() || same_specificity(arguments)).then_some(arguments)
}

fn same_specificity(list: &SelectorList) -> bool {
    let mut specificities = list.groups.iter().map(SelectorGroup::specificity);
    specificities
        .next()
        .is_none_or(|first| specificities.all(|s| s == first))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::selector::parse_selector_list;

    fn parse(text: &str) -> SelectorList {
        parse_selector_list(text).expect("selector should parse")
    }

    #[test]
    fn test_shared_prefix_shares_nodes() {
        let list = parse(".a.x, .a.y");
        let trie = Trie::build(&list, MergeMode::Safe).expect("trie");
        // root, `.a`, `.x | .y`
        assert_eq!(trie.len(), 3);
        let a = trie.root().children[0];
        let tail = trie.node(a).children[0];
        assert_eq!(trie.node(tail).variants.len(), 2);
        assert!(trie.node(tail).terminal);
    }

    #[test]
    fn test_safe_mode_splits_on_specificity() {
        let list = parse("#a, .b");
        let trie = Trie::build(&list, MergeMode::Safe).expect("trie");
        assert_eq!(trie.root().children.len(), 2);
        let trie = Trie::build(&list, MergeMode::Greedy).expect("trie");
        assert_eq!(trie.root().children.len(), 1);
    }

    #[test]
    fn test_duplicates_share_a_variant() {
        let list = parse(".a, .a");
        let trie = Trie::build(&list, MergeMode::Unsafe).expect("trie");
        assert_eq!(trie.len(), 2);
        assert_eq!(trie.node(1).variants.len(), 1);
        assert_eq!(trie.paths().len(), 2);
    }

    #[test]
    fn test_forward_edges() {
        let list = parse(".a.x, .a.y");
        let trie = Trie::build(&list, MergeMode::Safe).expect("trie");
        let a = &trie.node(1).variants[0];
        assert_eq!(a.next_children, vec![2]);
        assert_eq!(
            a.next_variants,
            vec![Step { node: 2, variant: 0 }, Step { node: 2, variant: 1 }]
        );
    }

    #[test]
    fn test_union_arguments_pool_in_relaxed_modes() {
        let list = parse(".a:has(.x), .a:has(.y)");
        let trie = Trie::build(&list, MergeMode::Greedy).expect("trie");
        let has = trie.node(1).children[0];
        assert_eq!(trie.node(has).variants.len(), 1);
        let subtrie = trie.node(has).subtrie.as_ref().expect("pooled arguments");
        assert_eq!(subtrie.paths().len(), 2);
        assert_eq!(subtrie.depth(), 1);

        let trie = Trie::build(&list, MergeMode::Safe).expect("trie");
        let has = trie.node(1).children[0];
        assert_eq!(trie.node(has).variants.len(), 2);
        assert!(trie.node(has).subtrie.is_none());
    }

    #[test]
    fn test_nesting_never_shares_a_node() {
        let list = parse("&.a, &.b");
        let trie = Trie::build(&list, MergeMode::Unsafe).expect("trie");
        assert_eq!(trie.root().children.len(), 2);
    }

    #[test]
    fn test_malformed_groups_are_rejected() {
        let trailing = SelectorList::new(vec![SelectorGroup::new(vec![
            Component::class("a"),
            Component::Combinator(crate::selector::Combinator::Child),
        ])]);
        assert!(matches!(
            Trie::build(&trailing, MergeMode::Safe),
            Err(MergeError::InvariantViolation { .. })
        ));
        let empty = SelectorList::new(vec![SelectorGroup::default()]);
        assert!(matches!(
            Trie::build(&empty, MergeMode::Safe),
            Err(MergeError::InvariantViolation { .. })
        ));
    }

    #[test]
    fn test_expand_inlines_sole_is() {
        let expanded = expand_transparent(&parse(":is(.a, .b), .c"), MergeMode::Safe, 0).expect("expand");
        assert_eq!(expanded.to_string(), ".a, .b, .c");
    }

    #[test]
    fn test_expand_distributes_over_compound() {
        let expanded = expand_transparent(&parse(":is(.a, .b).c"), MergeMode::Safe, 0).expect("expand");
        assert_eq!(expanded.to_string(), ".a.c, .b.c");
        let expanded = expand_transparent(&parse(":is(div, p).c"), MergeMode::Safe, 0).expect("expand");
        assert_eq!(expanded.to_string(), "div.c, p.c");
    }

    #[test]
    fn test_expand_keeps_unsafe_shapes() {
        // Unequal specificity in safe mode.
        let list = parse(":is(#a, .b).c");
        assert_eq!(expand_transparent(&list, MergeMode::Safe, 0).expect("expand"), list);
        // A type selector would land mid-compound.
        let list = parse(".c:is(div, .b)");
        assert_eq!(expand_transparent(&list, MergeMode::Greedy, 0).expect("expand"), list);
        // Complex arguments.
        let list = parse(":is(.a .b, .c).d");
        assert_eq!(expand_transparent(&list, MergeMode::Greedy, 0).expect("expand"), list);
        // `:where()` is never inlined.
        let list = parse(":where(.a, .b)");
        assert_eq!(expand_transparent(&list, MergeMode::Greedy, 0).expect("expand"), list);
    }

    #[test]
    fn test_linear_mode_does_not_expand() {
        let list = parse(":is(.a, .b)");
        assert_eq!(expand_transparent(&list, MergeMode::UnsafeLinear, 0).expect("expand"), list);
    }

    #[test]
    fn test_display_dump() {
        let list = parse(".a.x, .a.y");
        let trie = Trie::build(&list, MergeMode::Safe).expect("trie");
        assert_eq!(trie.to_string(), ".a\n  .x | .y $\n");
    }
}
