use std::path::Path;
use std::path::PathBuf;

use serde::Deserialize;

use crate::BookError;
use crate::BookResult;
use crate::CacheOptions;

/// Supported config file locations in discovery order (highest precedence
/// first).
pub const CONFIG_FILE_CANDIDATES: [&str; 3] =
	["bookfmt.toml", ".bookfmt.toml", ".config/bookfmt.toml"];

/// Configuration loaded from a `bookfmt.toml` file.
///
/// ```toml
/// disable_gitignore = false
///
/// [shortcodes]
/// source_extension = "gd"
/// document_extension = "md"
/// published_extension = "html"
/// contents_max_level = 3
///
/// [format]
/// comment_width = 80
/// tab_width = 4
///
/// [exclude]
/// patterns = ["build/", "*.import"]
/// ```
///
/// Every field is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookConfig {
	#[serde(default)]
	pub shortcodes: ShortcodeOptions,
	#[serde(default)]
	pub format: FormatOptions,
	/// Files the file cache never indexes, in gitignore syntax.
	#[serde(default)]
	pub exclude: ExcludeConfig,
	/// When true, `.gitignore` rules are not applied while indexing project
	/// files.
	#[serde(default)]
	pub disable_gitignore: bool,
}

/// Settings for shortcode expansion.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct ShortcodeOptions {
	/// Extension assumed by `include` when the file name has none.
	#[serde(default = "default_source_extension")]
	pub source_extension: String,
	/// Extension assumed by `link` when the target name has none.
	#[serde(default = "default_document_extension")]
	pub document_extension: String,
	/// Extension of the published documents `link` points to.
	#[serde(default = "default_published_extension")]
	pub published_extension: String,
	/// Deepest heading level listed by `contents` when no level is given.
	#[serde(default = "default_contents_max_level")]
	pub contents_max_level: usize,
}

impl Default for ShortcodeOptions {
	fn default() -> Self {
		Self {
			source_extension: default_source_extension(),
			document_extension: default_document_extension(),
			published_extension: default_published_extension(),
			contents_max_level: default_contents_max_level(),
		}
	}
}

/// Settings for the formatting pass.
#[derive(Debug, Clone, Copy, Deserialize, PartialEq, Eq)]
pub struct FormatOptions {
	/// Comment lines in code blocks longer than this are re-wrapped.
	#[serde(default = "default_comment_width")]
	pub comment_width: usize,
	/// Columns a tab occupies when measuring re-wrapped comments.
	#[serde(default = "default_tab_width")]
	pub tab_width: usize,
}

impl Default for FormatOptions {
	fn default() -> Self {
		Self {
			comment_width: default_comment_width(),
			tab_width: default_tab_width(),
		}
	}
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ExcludeConfig {
	#[serde(default)]
	pub patterns: Vec<String>,
}

fn default_source_extension() -> String {
	"gd".to_string()
}

fn default_document_extension() -> String {
	"md".to_string()
}

fn default_published_extension() -> String {
	"html".to_string()
}

fn default_contents_max_level() -> usize {
	3
}

fn default_comment_width() -> usize {
	80
}

fn default_tab_width() -> usize {
	4
}

impl BookConfig {
	/// Return the first config file found at `root`.
	pub fn resolve_path(root: &Path) -> Option<PathBuf> {
		CONFIG_FILE_CANDIDATES
			.iter()
			.map(|candidate| root.join(candidate))
			.find(|path| path.is_file())
	}

	/// Load the config from the first discovered config file at `root`.
	/// Returns `None` if there is none.
	pub fn load(root: &Path) -> BookResult<Option<BookConfig>> {
		let Some(config_path) = Self::resolve_path(root) else {
			return Ok(None);
		};

		let content = std::fs::read_to_string(&config_path)?;
		let config = Self::from_toml(&content)?;

		Ok(Some(config))
	}

	/// Like [`BookConfig::load`], falling back to the defaults.
	pub fn load_or_default(root: &Path) -> BookResult<BookConfig> {
		Ok(Self::load(root)?.unwrap_or_default())
	}

	pub fn from_toml(content: &str) -> BookResult<BookConfig> {
		toml::from_str(content).map_err(|e| BookError::ConfigParse(e.to_string()))
	}

	/// The options the file cache is built with.
	pub fn cache_options(&self) -> CacheOptions {
		CacheOptions {
			exclude_patterns: self.exclude.patterns.clone(),
			disable_gitignore: self.disable_gitignore,
		}
	}
}
