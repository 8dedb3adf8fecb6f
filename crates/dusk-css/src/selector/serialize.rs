//! [CSSOM § 6.7.2 Serializing selectors](https://drafts.csswg.org/cssom/#serializing-selectors)
//!
//! `Display` writes the readable form (`.a:is(.x, .y)`, `div > .a`);
//! [`SelectorList::to_minified_css`] writes the form stylesheets are
//! written with (`div>.a,.b`).

use core::fmt;

use super::{
    AttributeCase, AttributeOperator, AttributeSelector, Combinator, Component, PseudoArguments,
    PseudoClass, SelectorGroup, SelectorList,
};
use crate::tokenizer::{serialize_identifier, serialize_string};

impl SelectorList {
    /// Serialize without optional whitespace.
    #[must_use]
    pub fn to_minified_css(&self) -> String {
        let mut out = String::new();
        write_list(self, true, &mut out);
        out
    }
}

impl fmt::Display for SelectorList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_list(self, false, &mut out);
        f.write_str(&out)
    }
}

impl fmt::Display for SelectorGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_group(self, false, &mut out);
        f.write_str(&out)
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_component(self, false, true, &mut out);
        f.write_str(&out)
    }
}

fn write_list(list: &SelectorList, minify: bool, out: &mut String) {
    for (i, group) in list.groups.iter().enumerate() {
        if i > 0 {
            out.push_str(if minify { "," } else { ", " });
        }
        write_group(group, minify, out);
    }
}

fn write_group(group: &SelectorGroup, minify: bool, out: &mut String) {
    let mut compound_start = true;
    let mut first = true;
    for component in &group.components {
        match component {
            Component::Combinator(combinator) => {
                write_combinator(*combinator, minify, first, out);
                compound_start = true;
            }
            Component::Comment(_) if minify => continue,
            Component::Comment(_) => write_component(component, minify, compound_start, out),
            _ => {
                write_component(component, minify, compound_start, out);
                compound_start = false;
            }
        }
        first = false;
    }
}

fn write_combinator(combinator: Combinator, minify: bool, leading: bool, out: &mut String) {
    let symbol = match combinator {
        // A leading descendant combinator in a relative selector is implied.
        Combinator::Descendant if leading => return,
        Combinator::Descendant => {
            out.push(' ');
            return;
        }
        Combinator::Child => '>',
        Combinator::NextSibling => '+',
        Combinator::SubsequentSibling => '~',
    };
    if !minify && !leading {
        out.push(' ');
    }
    out.push(symbol);
    if !minify {
        out.push(' ');
    }
}

/// Type and universal selectors only parse at the start of a compound; one
/// that ends up later (after merging) is written as `:is(div)`.
fn write_component(component: &Component, minify: bool, compound_start: bool, out: &mut String) {
    match component {
        Component::Tag(_) | Component::Universal if !compound_start => {
            out.push_str(":is(");
            write_component(component, minify, true, out);
            out.push(')');
        }
        Component::Tag(name) => out.push_str(&serialize_identifier(name)),
        Component::Universal => out.push('*'),
        Component::Id(id) => {
            out.push('#');
            out.push_str(&serialize_identifier(id));
        }
        Component::Class(class) => {
            out.push('.');
            out.push_str(&serialize_identifier(class));
        }
        Component::Attribute(attribute) => write_attribute(attribute, minify, out),
        Component::Combinator(combinator) => write_combinator(*combinator, minify, true, out),
        Component::PseudoClass(pseudo) => write_pseudo(pseudo, minify, out),
        Component::Nesting => out.push('&'),
        Component::Comment(text) => {
            out.push_str("/*");
            out.push_str(text);
            out.push_str("*/");
        }
    }
}

fn write_pseudo(pseudo: &PseudoClass, minify: bool, out: &mut String) {
    out.push_str(&pseudo.name);
    match &pseudo.arguments {
        None => {}
        Some(PseudoArguments::Selectors(list)) => {
            out.push('(');
            write_list(list, minify, out);
            out.push(')');
        }
        Some(PseudoArguments::Raw(text)) => {
            out.push('(');
            out.push_str(text);
            out.push(')');
        }
    }
}

/// Values are quoted in readable output. Minified output writes them as an
/// identifier when that is shorter, as lightningcss does.
fn write_attribute(attribute: &AttributeSelector, minify: bool, out: &mut String) {
    out.push('[');
    out.push_str(&serialize_identifier(&attribute.name));
    let (Some(operator), Some(value)) = (attribute.operator, attribute.value.as_deref()) else {
        out.push(']');
        return;
    };
    out.push_str(match operator {
        AttributeOperator::Equals => "=",
        AttributeOperator::Includes => "~=",
        AttributeOperator::DashMatch => "|=",
        AttributeOperator::Prefix => "^=",
        AttributeOperator::Suffix => "$=",
        AttributeOperator::Substring => "*=",
    });

    let quoted = serialize_string(value);
    let identifier = serialize_identifier(value);
    let bare = minify && !value.is_empty() && identifier.len() < quoted.len();
    out.push_str(if bare { &identifier } else { &quoted });

    let flag = match attribute.case {
        AttributeCase::Default => None,
        AttributeCase::Insensitive => Some('i'),
        AttributeCase::Sensitive => Some('s'),
    };
    if let Some(flag) = flag {
        if bare || !minify {
            out.push(' ');
        }
        out.push(flag);
    }
    out.push(']');
}

#[cfg(test)]
mod tests {
    use crate::selector::parse_selector_list;

    fn readable(text: &str) -> String {
        parse_selector_list(text).expect("selector should parse").to_string()
    }

    fn minified(text: &str) -> String {
        parse_selector_list(text)
            .expect("selector should parse")
            .to_minified_css()
    }

    #[test]
    fn test_readable_spacing() {
        assert_eq!(readable("div>.a , span   ~ b"), "div > .a, span ~ b");
        assert_eq!(readable(".a:is(.x,.y)"), ".a:is(.x, .y)");
    }

    #[test]
    fn test_minified_spacing() {
        assert_eq!(minified("div > .a, .b  .c"), "div>.a,.b .c");
        assert_eq!(minified(":is( .x , .y ) + p"), ":is(.x,.y)+p");
    }

    #[test]
    fn test_attribute_value_forms() {
        assert_eq!(readable("[type=text]"), "[type=\"text\"]");
        assert_eq!(minified("[type=\"text\"]"), "[type=text]");
        assert_eq!(minified("[title=\"two words\"]"), "[title=\"two words\"]");
        assert_eq!(minified("[lang=\"en\" i]"), "[lang=en i]");
        assert_eq!(minified("[data-x=\"1\" s]"), "[data-x=\"1\"s]");
    }

    #[test]
    fn test_relative_selector_keeps_leading_combinator() {
        assert_eq!(readable("a:has(> img, + p)"), "a:has(> img, + p)");
        assert_eq!(minified("a:has(> img)"), "a:has(>img)");
    }

    #[test]
    fn test_raw_arguments_round_trip() {
        assert_eq!(readable("li:nth-child(2n+1)"), "li:nth-child(2n+1)");
        assert_eq!(readable("p::before"), "p::before");
    }
}
