//! Selector-list merging.
//!
//! A rule like `.a.x, .a.y { ... }` can be written `.a:is(.x, .y) { ... }`.
//! The engine finds such rewrites by inserting every alternative of a list
//! into a prefix trie whose nodes hold mutually compatible components
//! ([`classify`], [`trie`]) and then reading a new, shorter list back out of
//! it ([`nested`], [`linear`]). [`plugin`] ties the passes together and runs
//! them over a whole stylesheet.
//!
//! How aggressive the rewrite is depends on [`MergeMode`]: `safe` keeps the
//! matched element set intact (and, with the `:is()` wrapper, the specificity
//! of every alternative), `greedy` and `unsafe` may widen the match set to
//! get shorter output. A `:where()` wrapper always zeroes the specificity of
//! what it groups.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};
use thiserror::Error;

use crate::selector::SelectorParseError;

/// Component compatibility classes and comparisons.
pub mod classify;
/// The combinator-preserving second pass.
pub mod linear;
/// Rebuilding a selector list from a trie, wrapping divergent positions in `:is()`.
pub mod nested;
/// Entry points: single selector lists and whole stylesheets.
pub mod plugin;
/// The prefix trie over selector components.
pub mod trie;

pub use plugin::{
    MergeReport, SelectorMerger, SkippedRule, merge_selector_list, merge_selectors,
    unwrap_redundant_is,
};

/// Pseudo-class used to group merged alternatives.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    EnumString,
    Display,
    AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MergePseudo {
    /// `:is()`: the group takes the specificity of its most specific member.
    #[default]
    Is,
    /// `:where()`: the group has zero specificity.
    Where,
}

impl MergePseudo {
    /// The pseudo-class name with its colon.
    #[must_use]
    pub const fn pseudo_name(self) -> &'static str {
        match self {
            Self::Is => ":is",
            Self::Where => ":where",
        }
    }
}

/// How far a merge may go.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum MergeMode {
    /// Merge only what keeps every alternative's matches, and its specificity
    /// under the `:is()` wrapper.
    Safe,
    /// Merge structurally compatible components regardless of specificity.
    Greedy,
    /// Like `Greedy`, followed by a combinator-aware linear pass.
    #[default]
    Unsafe,
    /// The linear pass itself. Never configured directly.
    #[serde(skip)]
    #[strum(disabled)]
    UnsafeLinear,
}

impl MergeMode {
    /// The configuration spelling.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Safe => "safe",
            Self::Greedy => "greedy",
            Self::Unsafe => "unsafe",
            Self::UnsafeLinear => "unsafe-linear",
        }
    }

    /// Whether structural components merge regardless of specificity.
    #[must_use]
    pub const fn is_relaxed(self) -> bool {
        !matches!(self, Self::Safe)
    }

    /// Whether this is the linear second pass.
    #[must_use]
    pub const fn is_linear(self) -> bool {
        matches!(self, Self::UnsafeLinear)
    }
}

impl core::fmt::Display for MergeMode {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Merge configuration, as JSON `{"pseudo": "is", "mergeMode": "unsafe"}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MergeOptions {
    /// Wrapper pseudo-class for merged alternatives.
    pub pseudo: MergePseudo,
    /// Merge mode.
    pub merge_mode: MergeMode,
}

impl MergeOptions {
    /// Options with the given mode and the default pseudo-class.
    #[must_use]
    pub fn with_mode(merge_mode: MergeMode) -> Self {
        Self {
            merge_mode,
            ..Self::default()
        }
    }
}

/// Why a selector list could not be merged. The rule it came from is left
/// as it was.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// The selector text did not parse.
    #[error(transparent)]
    Parse(#[from] SelectorParseError),
    /// A selector reached the trie in a shape it cannot hold.
    #[error("malformed selector in merge: {message}")]
    InvariantViolation {
        /// What was wrong.
        message: String,
    },
    /// The linear pass met a trie node with more than one variant.
    #[error("linear merge expects one variant per trie node, found {variants}")]
    LinearCardinality {
        /// Number of variants in the node.
        variants: usize,
    },
    /// Pseudo-class arguments nested too deeply to merge.
    #[error("selector arguments nested {depth} levels deep")]
    DepthExceeded {
        /// Depth reached.
        depth: usize,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_options() {
        let options = MergeOptions::default();
        assert_eq!(options.pseudo, MergePseudo::Is);
        assert_eq!(options.merge_mode, MergeMode::Unsafe);
    }

    #[test]
    fn test_mode_spelling() {
        assert_eq!("Greedy".parse::<MergeMode>(), Ok(MergeMode::Greedy));
        assert!("unsafelinear".parse::<MergeMode>().is_err());
        assert_eq!(MergePseudo::Where.to_string(), "where");
        assert_eq!(MergeMode::Safe.to_string(), "safe");
    }
}
