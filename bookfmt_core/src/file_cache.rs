use std::collections::BTreeMap;
use std::collections::HashSet;
use std::path::Path;
use std::path::PathBuf;

use ignore::gitignore::Gitignore;
use ignore::gitignore::GitignoreBuilder;

use crate::BookError;
use crate::BookResult;
use crate::normalize_line_endings;

/// Options controlling which files the cache indexes.
#[derive(Debug, Clone, Default)]
pub struct CacheOptions {
	/// Extra patterns in gitignore syntax, applied on top of `.gitignore`.
	pub exclude_patterns: Vec<String>,
	pub disable_gitignore: bool,
}

/// Every file of a project indexed by its file name.
///
/// Shortcodes refer to files by name alone (`player.gd`) or by a trailing
/// part of their path (`part1/player.gd`) when the name alone is ambiguous.
/// Paths are stored relative to the root.
#[derive(Debug, Clone, Default)]
pub struct FileCache {
	root: PathBuf,
	files: BTreeMap<String, Vec<PathBuf>>,
}

impl FileCache {
	/// Walk `root` and index every file found.
	///
	/// Hidden directories, `node_modules` and `target` are never entered.
	/// Files matched by the project's `.gitignore` are skipped unless
	/// `options.disable_gitignore` is set.
	pub fn build(root: &Path, options: &CacheOptions) -> BookResult<Self> {
		let files = collect_files(root, &options.exclude_patterns, options.disable_gitignore)?;
		let cache = Self::from_paths(
			root,
			files
				.iter()
				.filter_map(|path| path.strip_prefix(root).ok().map(Path::to_path_buf)),
		);

		tracing::debug!(root = %root.display(), files = cache.len(), "indexed project files");

		Ok(cache)
	}

	/// Build a cache from paths relative to `root` without touching the file
	/// system.
	pub fn from_paths(root: &Path, paths: impl IntoIterator<Item = PathBuf>) -> Self {
		let mut files: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();

		for path in paths {
			let Some(name) = path.file_name() else {
				continue;
			};
			files
				.entry(name.to_string_lossy().into_owned())
				.or_default()
				.push(path);
		}

		for paths in files.values_mut() {
			paths.sort();
			paths.dedup();
		}

		Self {
			root: root.to_path_buf(),
			files,
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	/// Number of indexed files.
	pub fn len(&self) -> usize {
		self.files.values().map(Vec::len).sum()
	}

	pub fn is_empty(&self) -> bool {
		self.files.is_empty()
	}

	/// Iterate over every indexed path, relative to the root.
	pub fn paths(&self) -> impl Iterator<Item = &Path> {
		self.files.values().flatten().map(PathBuf::as_path)
	}

	/// Find the one file whose path ends with `name`.
	///
	/// `name` is a file name, optionally preceded by enough of its parent
	/// directories to tell it apart from files with the same name.
	pub fn find_file(&self, name: &str) -> BookResult<PathBuf> {
		let wanted = Path::new(name);
		let Some(file_name) = wanted.file_name() else {
			return Err(BookError::FileNotFound(name.to_string()));
		};

		let matches: Vec<&PathBuf> = self
			.files
			.get(&*file_name.to_string_lossy())
			.map(|paths| paths.iter().filter(|path| path.ends_with(wanted)).collect())
			.unwrap_or_default();

		match matches.as_slice() {
			[] => Err(BookError::FileNotFound(name.to_string())),
			[path] => Ok((*path).clone()),
			_ => {
				Err(BookError::AmbiguousFile {
					name: name.to_string(),
					candidates: matches
						.iter()
						.map(|path| path.display().to_string())
						.collect(),
				})
			}
		}
	}

	/// Like [`FileCache::find_file`], appending `.{extension}` to `name` when
	/// it has no extension of its own.
	pub fn find_file_with_extension(&self, name: &str, extension: &str) -> BookResult<PathBuf> {
		if Path::new(name).extension().is_some() || extension.is_empty() {
			self.find_file(name)
		} else {
			self.find_file(&format!("{name}.{extension}"))
		}
	}

	/// Read a file with its line endings normalized.
	pub fn read(&self, path: &Path) -> BookResult<String> {
		let content = std::fs::read_to_string(self.absolute(path))?;
		Ok(normalize_line_endings(&content))
	}

	/// Resolve `path` against the root unless it is already absolute.
	pub fn absolute(&self, path: &Path) -> PathBuf {
		if path.is_absolute() {
			path.to_path_buf()
		} else {
			self.root.join(path)
		}
	}
}

/// Build a `Gitignore` matcher from the `[exclude]` patterns of
/// `bookfmt.toml`.
fn build_exclude_matcher(root: &Path, patterns: &[String]) -> BookResult<Gitignore> {
	let mut builder = GitignoreBuilder::new(root);
	for pattern in patterns {
		builder.add_line(None, pattern).map_err(|e| {
			BookError::ConfigParse(format!("invalid exclude pattern `{pattern}`: {e}"))
		})?;
	}
	builder
		.build()
		.map_err(|e| BookError::ConfigParse(format!("failed to build exclude rules: {e}")))
}

fn build_gitignore(root: &Path) -> Gitignore {
	let mut builder = GitignoreBuilder::new(root);
	let gitignore_path = root.join(".gitignore");
	if gitignore_path.exists() {
		if let Some(error) = builder.add(&gitignore_path) {
			tracing::warn!(path = %gitignore_path.display(), "skipping invalid .gitignore: {error}");
		}
	}
	builder.build().unwrap_or_else(|_| Gitignore::empty())
}

fn collect_files(
	root: &Path,
	exclude_patterns: &[String],
	disable_gitignore: bool,
) -> BookResult<Vec<PathBuf>> {
	let mut files = Vec::new();
	let mut visited_dirs = HashSet::new();

	let gitignore = if disable_gitignore {
		Gitignore::empty()
	} else {
		build_gitignore(root)
	};
	let custom_exclude = build_exclude_matcher(root, exclude_patterns)?;

	walk_dir(
		root,
		&mut files,
		&gitignore,
		&custom_exclude,
		&mut visited_dirs,
	)?;
	files.sort();
	Ok(files)
}

fn is_ignored_directory_name(name: &str) -> bool {
	name.starts_with('.') || name == "node_modules" || name == "target"
}

fn walk_dir(
	dir: &Path,
	files: &mut Vec<PathBuf>,
	gitignore: &Gitignore,
	custom_exclude: &Gitignore,
	visited_dirs: &mut HashSet<PathBuf>,
) -> BookResult<()> {
	if !dir.is_dir() {
		return Ok(());
	}

	// Symlinked directories may point back up the tree.
	let canonical = dir.canonicalize().unwrap_or_else(|_| dir.to_path_buf());
	if !visited_dirs.insert(canonical) {
		tracing::debug!(path = %dir.display(), "skipping already visited directory");
		return Ok(());
	}

	for entry in std::fs::read_dir(dir)? {
		let path = entry?.path();
		let is_dir = path.is_dir();

		if is_dir
			&& path
				.file_name()
				.and_then(|name| name.to_str())
				.is_some_and(is_ignored_directory_name)
		{
			continue;
		}

		if gitignore.matched(&path, is_dir).is_ignore()
			|| custom_exclude.matched(&path, is_dir).is_ignore()
		{
			continue;
		}

		if is_dir {
			walk_dir(&path, files, gitignore, custom_exclude, visited_dirs)?;
		} else {
			files.push(path);
		}
	}

	Ok(())
}
