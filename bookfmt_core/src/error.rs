use miette::Diagnostic;
use thiserror::Error;

use crate::Severity;

#[derive(Debug, Diagnostic, Error)]
#[non_exhaustive]
pub enum BookError {
	#[error(transparent)]
	#[diagnostic(code(bookfmt::io_error))]
	Io(#[from] std::io::Error),

	#[error("failed to parse config file: {0}")]
	#[diagnostic(
		code(bookfmt::config_parse),
		help("check that bookfmt.toml is valid TOML with [shortcodes], [format] and/or [exclude] sections")
	)]
	ConfigParse(String),

	#[error("file not found: `{0}`")]
	#[diagnostic(
		code(bookfmt::file_not_found),
		help("make sure the file exists inside the project and is not excluded or gitignored")
	)]
	FileNotFound(String),

	#[error("`{name}` matches several project files: {}", .candidates.join(", "))]
	#[diagnostic(
		code(bookfmt::ambiguous_file),
		help("add parent directories to the name, e.g. `chapter/{name}`")
	)]
	AmbiguousFile {
		name: String,
		candidates: Vec<String>,
	},

	#[error("anchor `{anchor}` not found in `{file}`")]
	#[diagnostic(
		code(bookfmt::anchor_not_found),
		help("wrap the region with `# ANCHOR: {anchor}` and `# END: {anchor}` comment lines")
	)]
	AnchorNotFound { file: String, anchor: String },

	#[error("unknown shortcode: `{0}`")]
	#[diagnostic(
		code(bookfmt::unknown_shortcode),
		help("available shortcodes: include, link, contents")
	)]
	UnknownShortcode(String),

	#[error("shortcode `{name}` expects {expected} argument(s), got {got} (usage: {synopsis})")]
	#[diagnostic(code(bookfmt::invalid_shortcode_args))]
	InvalidShortcodeArgs {
		name: String,
		expected: String,
		got: usize,
		synopsis: String,
	},

	#[error("invalid heading level `{value}` for shortcode `contents`")]
	#[diagnostic(
		code(bookfmt::invalid_heading_level),
		help("usage: {{% contents [max_level] %}} where max_level is a number such as 3")
	)]
	InvalidHeadingLevel { value: String },

	#[error("no headings between level 2 and {max_level} found for the table of contents")]
	#[diagnostic(
		code(bookfmt::empty_contents),
		severity(Warning),
		help("add `## ` headings to the document or raise the max level")
	)]
	EmptyContents { max_level: usize },
}

impl BookError {
	/// How loudly a failure should be reported when it is recovered from.
	/// Only an empty table of contents is a soft condition since it can
	/// legitimately happen in short documents.
	pub fn severity(&self) -> Severity {
		match self {
			Self::EmptyContents { .. } => Severity::Warning,
			_ => Severity::Error,
		}
	}
}

pub type BookResult<T> = Result<T, BookError>;
pub type AnyError = Box<dyn std::error::Error>;
pub type AnyEmptyResult = Result<(), AnyError>;
pub type AnyResult<T> = Result<T, AnyError>;
