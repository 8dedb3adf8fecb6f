//! Integration tests for selector-list merging.

use dusk_css::merge::{MergeError, MergeMode, MergeOptions, MergePseudo, merge_selectors};

fn merge(text: &str, mode: MergeMode) -> String {
    merge_selectors(text, &MergeOptions::with_mode(mode)).unwrap()
}

fn merge_where(text: &str, mode: MergeMode) -> String {
    let options = MergeOptions {
        pseudo: MergePseudo::Where,
        merge_mode: mode,
    };
    merge_selectors(text, &options).unwrap()
}

// ========== scenarios ==========

#[test]
fn test_shared_prefix_is_factored_out() {
    assert_eq!(merge(".a.x, .a.y", MergeMode::Safe), ".a:is(.x, .y)");
}

#[test]
fn test_header_merge_through_combinator() {
    assert_eq!(merge("div > .a, span > .a", MergeMode::Safe), ":is(div, span) > .a");
}

#[test]
fn test_duplicates_collapse() {
    assert_eq!(merge(".a, .a", MergeMode::Safe), ".a");
    assert_eq!(merge(".a, .a", MergeMode::Unsafe), ".a");
}

#[test]
fn test_shared_pseudo_class_suffix() {
    assert_eq!(merge(".a:hover, .b:hover", MergeMode::Safe), ":is(.a, .b):hover");
}

#[test]
fn test_existing_is_is_absorbed() {
    assert_eq!(merge(":is(.a, .b).c", MergeMode::Safe), ":is(.a, .b).c");
    assert_eq!(merge(":is(.a, .b).c, .d.c", MergeMode::Safe), ":is(.a, .b, .d).c");
}

#[test]
fn test_different_combinators_never_merge() {
    assert_eq!(
        merge(".x > .a, .y .a", MergeMode::Unsafe),
        ":is(.x, .y) > .a, :is(.x, .y) .a"
    );
    assert_eq!(merge(".x > .a, .y .a", MergeMode::Safe), ".x > .a, .y .a");
}

#[test]
fn test_minimal_input_is_unchanged() {
    assert_eq!(merge("a, p", MergeMode::Unsafe), "a, p");
    assert_eq!(merge("a, p", MergeMode::Safe), "a, p");
    assert_eq!(merge("#nav", MergeMode::Safe), "#nav");
}

// ========== modes ==========

#[test]
fn test_safe_keeps_specificity_apart() {
    assert_eq!(merge("#a.x, .b.x", MergeMode::Safe), "#a.x, .b.x");
    assert_eq!(merge("#a.x, .b.x", MergeMode::Greedy), ":is(#a, .b).x");
}

#[test]
fn test_greedy_may_cross_combine() {
    assert_eq!(merge(".a.x, .b.y", MergeMode::Safe), ".a.x, .b.y");
    assert_eq!(merge(".a.x, .b.y", MergeMode::Greedy), ":is(.a, .b):is(.x, .y)");
}

#[test]
fn test_unsafe_linear_pass_groups_compounds() {
    assert_eq!(
        merge(".button:hover, .button:focus", MergeMode::Greedy),
        ".button:hover, .button:focus"
    );
    assert_eq!(
        merge(".button:hover, .button:focus", MergeMode::Unsafe),
        ".button:is(:hover, :focus)"
    );
    // Not applied when the grouped form is longer.
    assert_eq!(merge(".b:hover, .b:focus", MergeMode::Unsafe), ".b:hover, .b:focus");
}

#[test]
fn test_where_wrapper() {
    assert_eq!(merge_where(".a.x, .a.y", MergeMode::Safe), ".a:where(.x, .y)");
    // A list that is one `:where()` is not unwrapped.
    assert_eq!(merge_where(".a, .b", MergeMode::Safe), ":where(.a, .b)");
}

// ========== pseudo-classes with arguments ==========

#[test]
fn test_has_arguments_are_pooled() {
    assert_eq!(merge("li:has(> a), li:has(> b)", MergeMode::Safe), "li:has(> :is(a, b))");
    assert_eq!(merge("li:has(> a), li:has(> b)", MergeMode::Greedy), "li:has(> :is(a, b))");
}

#[test]
fn test_not_arguments_are_not_pooled() {
    assert_eq!(
        merge("a:not(.x), a:not(.y)", MergeMode::Safe),
        "a:is(:not(.x), :not(.y))"
    );
}

#[test]
fn test_pseudo_elements_are_never_wrapped() {
    assert_eq!(merge(".a::before, .b::before", MergeMode::Safe), ":is(.a, .b)::before");
    assert_eq!(merge(".a::before, .a::after", MergeMode::Unsafe), ".a::before, .a::after");
}

#[test]
fn test_nesting_selector_is_kept_apart() {
    assert_eq!(merge("&.a, &.b", MergeMode::Unsafe), "&.a, &.b");
    assert_eq!(merge(".a &, .b &", MergeMode::Safe), ".a &, .b &");
}

#[test]
fn test_terminal_prefix_is_kept() {
    assert_eq!(merge(".a, .a.b", MergeMode::Unsafe), ".a, .a.b");
    assert_eq!(merge(".a, .a .b, .a .c", MergeMode::Safe), ".a, .a :is(.b, .c)");
}

// ========== errors ==========

#[test]
fn test_parse_errors_are_reported() {
    let result = merge_selectors("a >", &MergeOptions::default());
    assert!(matches!(result, Err(MergeError::Parse(_))));
}

#[test]
fn test_failed_linear_pass_keeps_nested_result() {
    // Two distinct `:is()` heads share the root node of the linear trie.
    let text = ".a .z, .b .z, :is(.x .y) .w";
    assert_eq!(merge(text, MergeMode::Unsafe), ":is(.a, .b) .z, :is(.x .y) .w");
    assert_eq!(merge(text, MergeMode::Unsafe), merge(text, MergeMode::Greedy));
}
