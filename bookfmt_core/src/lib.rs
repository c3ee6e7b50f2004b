//! `bookfmt_core` is the engine behind [bookfmt](https://github.com/bookfmt/bookfmt), a build step for tutorial books written in markdown. It parses documents into blocks, expands shortcodes that pull in source code, link to other chapters and generate tables of contents, and runs a deterministic formatting pass over the prose and code.
//!
//! ## Processing Pipeline
//!
//! ```text
//! Markdown document
//!   -> Parser (splits lines into headings, paragraphs, lists, code and raw blocks)
//!   -> Shortcode engine (expands `{% include %}`, `{% link %}`, `{% contents %}` using the file cache)
//!   -> Formatter (wraps code spans, emphasis and keyboard shortcuts, reflows long code comments)
//!   -> Published document
//! ```
//!
//! ## Modules
//!
//! - [`config`] - Configuration loading from `bookfmt.toml`.
//! - [`file_cache`] - The project file index shortcodes resolve names against.
//! - [`format`] - The line, code and document formatters.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//!
//! use bookfmt_core::BookConfig;
//! use bookfmt_core::Diagnostics;
//! use bookfmt_core::FileCache;
//! use bookfmt_core::ShortcodeContext;
//! use bookfmt_core::build_document;
//!
//! let root = Path::new(".");
//! let config = BookConfig::load_or_default(root).unwrap();
//! let cache = FileCache::build(root, &config.cache_options()).unwrap();
//! let source_file = Path::new("chapter/lesson.md");
//! let content = std::fs::read_to_string(source_file).unwrap();
//!
//! let ctx = ShortcodeContext {
//! 	cache: &cache,
//! 	source_file,
//! 	options: &config.shortcodes,
//! };
//! let mut diagnostics = Diagnostics::new();
//! let output = build_document(&content, &ctx, &config.format, &mut diagnostics);
//!
//! for diagnostic in diagnostics.iter() {
//! 	eprintln!("{diagnostic}");
//! }
//! println!("{output}");
//! ```

pub use anchor::*;
pub use config::*;
pub use diagnostics::*;
pub use error::*;
pub use file_cache::*;
pub use format::*;
pub use parser::*;
pub use shortcode::*;

mod anchor;
pub mod config;
mod diagnostics;
#[allow(unused_assignments)]
mod error;
pub mod file_cache;
pub mod format;
pub(crate) mod lexer;
mod parser;
mod shortcode;

#[cfg(test)]
mod __fixtures;
#[cfg(test)]
mod __tests;
