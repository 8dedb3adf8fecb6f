//! Common utilities for dusk.
//!
//! This crate provides shared infrastructure used by the other dusk crates:
//! - **Warning System** - colored, deduplicated terminal diagnostics
//! - **Fetching** - blocking HTTP GET and `data:` URL decoding for stylesheet input

pub mod net;
pub mod warning;
