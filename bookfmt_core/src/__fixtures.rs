use std::path::Path;

use rstest::fixture;
use tempfile::TempDir;

use crate::CacheOptions;
use crate::FileCache;

pub(crate) const FILE_A: &str = "extends Node\n\n# ANCHOR: anchorX\nfoo()\n# END: anchorX\n";

pub(crate) const PLAYER: &str = concat!(
	"extends CharacterBody2D\n",
	"\n",
	"# ANCHOR: physics\n",
	"func _physics_process(delta):\n",
	"\t# ANCHOR: move\n",
	"\tmove_and_slide()\n",
	"\t# END: move\n",
	"# END: physics\n",
);

pub(crate) fn write_file(root: &Path, relative: &str, content: &str) {
	let path = root.join(relative);
	if let Some(parent) = path.parent() {
		std::fs::create_dir_all(parent).unwrap_or_else(|e| panic!("create dir: {e}"));
	}
	std::fs::write(path, content).unwrap_or_else(|e| panic!("write: {e}"));
}

#[fixture]
pub(crate) fn book() -> TempDir {
	create_book()
}

/// A small book: two chapters, one nested page and the code they include.
pub(crate) fn create_book() -> TempDir {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let root = tmp.path();

	write_file(root, "docs/other.md", "# Other\n");
	write_file(root, "docs/sub/page.md", "# Page\n");
	write_file(root, "code/fileA.gd", FILE_A);
	write_file(root, "code/player.gd", PLAYER);

	tmp
}

pub(crate) fn build_cache(root: &Path) -> FileCache {
	FileCache::build(root, &CacheOptions::default()).unwrap_or_else(|e| panic!("cache: {e}"))
}
