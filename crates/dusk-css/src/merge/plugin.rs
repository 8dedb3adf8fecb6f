//! Entry points of the merge engine.
//!
//! One selector list goes through these passes:
//!
//! 1. comments are dropped,
//! 2. transparent `:is()` arguments are inlined and the trie is built,
//! 3. the nested reconstructor reads a merged list back out,
//! 4. in `unsafe` mode, the linear pass runs over that result,
//! 5. an `:is()` that makes up the whole list is unwrapped.
//!
//! [`SelectorMerger`] applies this to every style rule of a stylesheet.

use tracing::{debug, trace, warn};

use super::linear::build_merged_selectors_linear;
use super::nested::build_merged_selectors;
use super::trie::{Trie, expand_transparent};
use super::{MergeError, MergeMode, MergeOptions, MergePseudo};
use crate::parser::{AtRuleBlock, Rule, StyleRule, Stylesheet};
use crate::selector::{Component, PseudoArguments, SelectorList, parse_selector_list};

/// Replace a list made of a single `:is(A, B)` by `A, B`, repeatedly.
///
/// `:where()` is kept, since unwrapping it would raise specificity.
#[must_use]
pub fn unwrap_redundant_is(mut list: SelectorList) -> SelectorList {
    while let Some(inner) = take_sole_is_arguments(&mut list) {
        list = inner;
    }
    list
}

fn take_sole_is_arguments(list: &mut SelectorList) -> Option<SelectorList> {
    let [group] = list.groups.as_mut_slice() else {
        return None;
    };
    let [Component::PseudoClass(pseudo)] = group.components.as_mut_slice() else {
        return None;
    };
    if !pseudo.is_logical_is() {
        return None;
    }
    match pseudo.arguments.take() {
        Some(PseudoArguments::Selectors(inner)) => Some(inner),
        other => {
            pseudo.arguments = other;
            None
        }
    }
}

/// Merge the alternatives of `list`.
///
/// The result never has more alternatives than `list`; when merging would
/// not reduce them, `list` comes back without its comments.
///
/// # Errors
///
/// [`MergeError::InvariantViolation`] for alternatives the trie cannot hold
/// and [`MergeError::DepthExceeded`] for arguments nested too deeply. A
/// failing linear pass is not an error: the nested result is kept.
pub fn merge_selector_list(list: &SelectorList, options: &MergeOptions) -> Result<SelectorList, MergeError> {
    let stripped = list.strip_comments();
    let mode = options.merge_mode;

    let expanded = expand_transparent(&stripped, mode, 0)?;
    let trie = Trie::build(&expanded, mode)?;
    trace!(%mode, %trie, "built selector trie");

    let mut merged = SelectorList::new(build_merged_selectors(&trie, options.pseudo)?);
    if mode == MergeMode::Unsafe {
        merged = linear_pass(merged, options.pseudo)?;
    }
    let merged = unwrap_redundant_is(merged);

    if merged.len() > stripped.len() {
        return Ok(stripped);
    }
    Ok(merged)
}

/// Parse `text`, merge it, and write it back in readable form.
///
/// # Errors
///
/// [`MergeError::Parse`] when `text` is not a selector list, otherwise as
/// [`merge_selector_list`].
pub fn merge_selectors(text: &str, options: &MergeOptions) -> Result<String, MergeError> {
    let list = parse_selector_list(text)?;
    Ok(merge_selector_list(&list, options)?.to_string())
}

/// The linear pass over the nested result; kept only when it is not longer.
fn linear_pass(nested: SelectorList, pseudo: MergePseudo) -> Result<SelectorList, MergeError> {
    let built = Trie::build(&nested, MergeMode::UnsafeLinear)
        .and_then(|trie| build_merged_selectors_linear(&trie, pseudo));
    let linear = match built {
        Ok(groups) => SelectorList::new(groups),
        Err(MergeError::LinearCardinality { variants }) => {
            debug!(variants, selector = %nested, "linear pass skipped");
            return Ok(nested);
        }
        Err(error) => return Err(error),
    };
    if linear.to_minified_css().len() <= nested.to_minified_css().len() {
        Ok(linear)
    } else {
        Ok(nested)
    }
}

/// A style rule the merge pass left alone because of an error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRule {
    /// The rule's selector text.
    pub selector: String,
    /// What went wrong.
    pub error: MergeError,
}

/// What [`SelectorMerger::run`] did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Style rules with more than one alternative.
    pub examined: usize,
    /// Rules whose selector was replaced.
    pub rewritten: usize,
    /// Rules dropped because no alternative was left.
    pub removed: usize,
    /// Rules that could not be merged.
    pub skipped: Vec<SkippedRule>,
}

/// Runs the merge over every style rule of a stylesheet, including rules
/// inside conditional group rules and nested style rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SelectorMerger {
    options: MergeOptions,
}

impl SelectorMerger {
    /// A merger with the given options.
    #[must_use]
    pub const fn new(options: MergeOptions) -> Self {
        Self { options }
    }

    /// The options in use.
    #[must_use]
    pub const fn options(&self) -> &MergeOptions {
        &self.options
    }

    /// Rewrite `sheet` in place.
    ///
    /// A rewrite is committed only when it neither adds alternatives nor
    /// makes the minified selector longer. Rules that fail to parse or
    /// merge keep their selector and are listed in the report.
    pub fn run(&self, sheet: &mut Stylesheet) -> MergeReport {
        let mut report = MergeReport::default();
        self.rules(&mut sheet.rules, &mut report);
        report
    }

    fn rules(&self, rules: &mut Vec<Rule>, report: &mut MergeReport) {
        rules.retain_mut(|rule| match rule {
            Rule::Style(style) => {
                self.rules(&mut style.rules, report);
                self.style_rule(style, report)
            }
            Rule::At(at_rule) => {
                if let Some(AtRuleBlock::Rules(rules) | AtRuleBlock::Style { rules, .. }) =
                    &mut at_rule.block
                {
                    self.rules(rules, report);
                }
                true
            }
        });
    }

    /// Merge one rule's selector; `false` when the rule should go.
    fn style_rule(&self, rule: &mut StyleRule, report: &mut MergeReport) -> bool {
        if rule.selector_count() < 2 {
            return true;
        }
        report.examined += 1;

        let before = rule.selector_text();
        let result = parse_selector_list(&before)
            .map_err(MergeError::from)
            .and_then(|list| merge_selector_list(&list, &self.options).map(|merged| (list, merged)));
        let (list, merged) = match result {
            Ok(pair) => pair,
            Err(error) => {
                warn!(selector = %before, %error, "selector list left unmerged");
                report.skipped.push(SkippedRule {
                    selector: before,
                    error,
                });
                return true;
            }
        };

        Self::commit(rule, &list, &merged, report)
    }

    /// Write `merged` back into `rule` if it is an improvement over `list`.
    /// An empty result removes the rule.
    fn commit(rule: &mut StyleRule, list: &SelectorList, merged: &SelectorList, report: &mut MergeReport) -> bool {
        if merged.is_empty() {
            report.removed += 1;
            return false;
        }

        let (old, new) = (list.to_minified_css(), merged.to_minified_css());
        if merged.len() <= list.len() && new.len() <= old.len() && new != old {
            debug!(before = %old, after = %new, "merged selector list");
            rule.set_selector_text(&new);
            report.rewritten += 1;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_stylesheet;

    fn merge(text: &str, mode: MergeMode) -> String {
        merge_selectors(text, &MergeOptions::with_mode(mode)).expect("merge")
    }

    #[test]
    fn test_unwrap_redundant_is() {
        let list = parse_selector_list(":is(:is(.a, .b))").expect("parse");
        assert_eq!(unwrap_redundant_is(list).to_string(), ".a, .b");
        let list = parse_selector_list(":where(.a, .b)").expect("parse");
        assert_eq!(unwrap_redundant_is(list.clone()), list);
        let list = parse_selector_list(":is(.a).b").expect("parse");
        assert_eq!(unwrap_redundant_is(list.clone()), list);
    }

    #[test]
    fn test_modes() {
        assert_eq!(merge(".a.x, .a.y", MergeMode::Safe), ".a:is(.x, .y)");
        assert_eq!(merge("#a, .b", MergeMode::Safe), "#a, .b");
        assert_eq!(merge(".a:hover, .b:focus", MergeMode::Greedy), ":is(.a, .b):hover, :is(.a, .b):focus");
        assert_eq!(merge(".a:hover, .b:focus", MergeMode::Unsafe), ":is(.a, .b):is(:hover, :focus)");
    }

    #[test]
    fn test_plain_alternatives_are_unchanged() {
        assert_eq!(merge("a, p", MergeMode::Unsafe), "a, p");
        assert_eq!(merge(".a, .b", MergeMode::Safe), ".a, .b");
    }

    #[test]
    fn test_comments_are_dropped() {
        assert_eq!(merge(".a/* x */.x, .a.y", MergeMode::Safe), ".a:is(.x, .y)");
    }

    #[test]
    fn test_inlined_is_is_merged_back() {
        assert_eq!(merge(":is(.a, .b).c", MergeMode::Safe), ":is(.a, .b).c");
        assert_eq!(merge(":is(.a, .b) .x, .c > .y", MergeMode::Safe), ":is(.a, .b) .x, .c > .y");
    }

    #[test]
    fn test_stylesheet_pass() {
        let mut sheet = parse_stylesheet(
            ".nav .item-link, .nav .item-button { color: red }
             .a.x, .a.y { color: red }
             @media print { .card-header > .title, .card-footer > .title { margin: 0 } }
             p { color: blue }",
        );
        let report = SelectorMerger::new(MergeOptions::with_mode(MergeMode::Safe)).run(&mut sheet);
        assert_eq!(report.examined, 3);
        // `.a:is(.x,.y)` is longer than `.a.x,.a.y`.
        assert_eq!(report.rewritten, 2);
        assert!(report.skipped.is_empty());
        assert_eq!(
            sheet.to_css(true),
            ".nav :is(.item-link,.item-button){color:red}.a.x,.a.y{color:red}\
             @media print{:is(.card-header,.card-footer)>.title{margin:0}}p{color:blue}"
        );
    }

    #[test]
    fn test_empty_result_removes_rule() {
        let mut sheet = parse_stylesheet(".a, .b { color: red } p { color: blue }");
        let mut report = MergeReport::default();
        let Some(Rule::Style(rule)) = sheet.rules.first_mut() else {
            panic!("expected a style rule");
        };
        let list = parse_selector_list(".a, .b").expect("parse");
        let keep = SelectorMerger::commit(rule, &list, &SelectorList::default(), &mut report);
        assert!(!keep);
        assert_eq!(report.removed, 1);
        assert_eq!(report.rewritten, 0);
    }

    #[test]
    fn test_shorter_result_is_committed() {
        let mut sheet = parse_stylesheet(".nav .item-link, .nav .item-button { color: red }");
        let mut report = MergeReport::default();
        let Some(Rule::Style(rule)) = sheet.rules.first_mut() else {
            panic!("expected a style rule");
        };
        let list = parse_selector_list(".nav .item-link, .nav .item-button").expect("parse");
        let merged = parse_selector_list(".nav :is(.item-link, .item-button)").expect("parse");
        assert!(SelectorMerger::commit(rule, &list, &merged, &mut report));
        assert_eq!(report.rewritten, 1);
        assert_eq!(sheet.to_css(true), ".nav :is(.item-link,.item-button){color:red}");
    }

    #[test]
    fn test_unparsable_rules_are_reported() {
        let mut sheet = parse_stylesheet("svg|a, b { fill: red }");
        let report = SelectorMerger::default().run(&mut sheet);
        assert_eq!(report.skipped.len(), 1);
        assert!(report.skipped[0].selector.starts_with("svg|a"));
        assert!(matches!(report.skipped[0].error, MergeError::Parse(_)));
        assert_eq!(report.rewritten, 0);
    }
}
