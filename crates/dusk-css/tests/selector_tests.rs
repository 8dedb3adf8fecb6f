//! Integration tests for CSS selector parsing, serialization, specificity and matching.

use dusk_css::selector::{
    AttributeOperator, Combinator, Component, PseudoArguments, SelectorParseError, Specificity,
    parse_selector_list,
};
use dusk_dom::{DomTree, NodeId};

fn parse(text: &str) -> dusk_css::SelectorList {
    parse_selector_list(text).unwrap()
}

/// ```html
/// <html>
///   <body>
///     <nav class="menu">
///       <a class="item active" href="/">Home</a>
///       <a class="item" href="/docs">Docs</a>
///     </nav>
///     <main id="content">
///       <h1>Title</h1>
///       <p class="lead">Intro</p>
///     </main>
///   </body>
/// </html>
/// ```
fn page() -> (DomTree, Vec<NodeId>) {
    let mut tree = DomTree::new();
    let html = tree.append_element(NodeId::ROOT, "html", &[]);
    let body = tree.append_element(html, "body", &[]);
    let nav = tree.append_element(body, "nav", &[("class", "menu")]);
    let home = tree.append_element(nav, "a", &[("class", "item active"), ("href", "/")]);
    let _ = tree.append_text(home, "Home");
    let docs = tree.append_element(nav, "a", &[("class", "item"), ("href", "/docs")]);
    let _ = tree.append_text(docs, "Docs");
    let main = tree.append_element(body, "main", &[("id", "content")]);
    let h1 = tree.append_element(main, "h1", &[]);
    let _ = tree.append_text(h1, "Title");
    let lead = tree.append_element(main, "p", &[("class", "lead")]);
    let _ = tree.append_text(lead, "Intro");
    (tree, vec![html, body, nav, home, docs, main, h1, lead])
}

fn matched(text: &str) -> Vec<usize> {
    let (tree, nodes) = page();
    let list = parse(text);
    let hits = list.matching_elements(&tree);
    nodes
        .iter()
        .enumerate()
        .filter(|(_, n)| hits.contains(n))
        .map(|(i, _)| i)
        .collect()
}

// ========== parsing ==========

#[test]
fn test_parse_compound_and_combinators() {
    let list = parse("nav.menu > a.item:hover");
    assert_eq!(list.len(), 1);
    assert_eq!(
        list.groups[0].components,
        vec![
            Component::tag("nav"),
            Component::class("menu"),
            Component::Combinator(Combinator::Child),
            Component::tag("a"),
            Component::class("item"),
            Component::PseudoClass(dusk_css::selector::PseudoClass::new(":hover")),
        ]
    );
}

#[test]
fn test_parse_list_splits_top_level_commas_only() {
    let list = parse("a, :is(b, c), d");
    assert_eq!(list.len(), 3);
    let Component::PseudoClass(pseudo) = &list.groups[1].components[0] else {
        panic!("expected a pseudo-class");
    };
    assert_eq!(pseudo.selector_arguments().map(|l| l.len()), Some(2));
}

#[test]
fn test_parse_attribute_selector() {
    let list = parse("[href^='/docs']");
    let Component::Attribute(attribute) = &list.groups[0].components[0] else {
        panic!("expected an attribute selector");
    };
    assert_eq!(attribute.name, "href");
    assert_eq!(attribute.operator, Some(AttributeOperator::Prefix));
    assert_eq!(attribute.value.as_deref(), Some("/docs"));
}

#[test]
fn test_parse_raw_pseudo_arguments() {
    let list = parse("li:nth-child( 2n + 1 )");
    let Component::PseudoClass(pseudo) = &list.groups[0].components[1] else {
        panic!("expected a pseudo-class");
    };
    assert_eq!(pseudo.arguments, Some(PseudoArguments::Raw("2n + 1".to_string())));
}

#[test]
fn test_parse_errors() {
    assert_eq!(parse_selector_list("a,,b"), Err(SelectorParseError::EmptySelector));
    assert_eq!(parse_selector_list("a >"), Err(SelectorParseError::DanglingCombinator));
    assert_eq!(parse_selector_list("svg|a"), Err(SelectorParseError::Namespace));
    assert!(parse_selector_list("a || b").is_err());
    assert!(parse_selector_list(":is(").is_err());
}

// ========== serialization ==========

#[test]
fn test_serialize_readable_and_minified() {
    let list = parse("nav   >   a.item ,  main  p");
    assert_eq!(list.to_string(), "nav > a.item, main p");
    assert_eq!(list.to_minified_css(), "nav>a.item,main p");
}

#[test]
fn test_serialize_normalizes_pseudo_names() {
    assert_eq!(parse("A:HOVER").to_string(), "A:hover");
    assert_eq!(parse("p::Before").to_string(), "p::before");
}

// ========== specificity ==========

#[test]
fn test_specificity() {
    assert_eq!(parse("#content p.lead").specificity(), Specificity(1, 1, 1));
    assert_eq!(parse("a:not(.item, #x)").specificity(), Specificity(1, 0, 1));
    assert_eq!(parse(":where(#content) p").specificity(), Specificity(0, 0, 1));
    assert_eq!(parse("p::first-line").specificity(), Specificity(0, 0, 2));
    assert!(Specificity(0, 1, 0) > Specificity(0, 0, 9));
}

// ========== matching ==========

#[test]
fn test_match_classes_and_ids() {
    assert_eq!(matched(".item"), vec![3, 4]);
    assert_eq!(matched(".item.active"), vec![3]);
    assert_eq!(matched("#content > *"), vec![6, 7]);
}

#[test]
fn test_match_attributes() {
    assert_eq!(matched("[href]"), vec![3, 4]);
    assert_eq!(matched("[href$=docs]"), vec![4]);
    assert_eq!(matched("[href*=o]"), vec![4]);
}

#[test]
fn test_match_combinators() {
    assert_eq!(matched("body a"), vec![3, 4]);
    assert_eq!(matched("nav + main"), vec![5]);
    assert_eq!(matched("h1 ~ p"), vec![7]);
    assert_eq!(matched("body > a"), Vec::<usize>::new());
}

#[test]
fn test_match_logical_pseudo_classes() {
    assert_eq!(matched(":is(nav, main) > :first-child"), vec![3, 6]);
    assert_eq!(matched("a:not(.active)"), vec![4]);
    assert_eq!(matched("main:has(.lead)"), vec![5]);
    assert_eq!(matched(":where(h1, p)"), vec![6, 7]);
}

#[test]
fn test_list_matches_any_alternative() {
    assert_eq!(matched("h1, .lead, nav"), vec![2, 6, 7]);
}
