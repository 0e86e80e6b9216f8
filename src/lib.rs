//! The library code for the `duoblog` static site generator. A build runs in
//! four steps:
//!
//! 1. Loading the global data (`_data/*.yaml`), including the interface
//!    strings ([`crate::i18n`]) and the menu ([`crate::navigation`])
//! 2. Parsing pages from the input directory ([`crate::parser`])
//! 3. Grouping them into collections ([`crate::collection`]) and rendering
//!    every page through its layout to disk ([`crate::write`])
//! 4. Writing the per-language feeds ([`crate::feed`]) and copying static
//!    assets ([`crate::passthrough`])
//!
//! Every page knows its language. Templates get that language's strings,
//! menu and date locale, plus links to the same page in the other languages.

#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]

pub mod build;
pub mod collection;
pub mod config;
pub mod data;
pub mod date;
pub mod feed;
pub mod filters;
pub mod i18n;
pub mod markdown;
pub mod minify;
pub mod navigation;
pub mod page;
pub mod parser;
pub mod passthrough;
pub mod template;
pub mod url;
pub mod value;
pub mod write;
