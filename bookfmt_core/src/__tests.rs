use std::path::Path;
use std::path::PathBuf;

use rstest::rstest;
use similar_asserts::assert_eq;
use tempfile::TempDir;
use tracing_test::traced_test;

use super::__fixtures::*;
use super::*;
use crate::lexer::Delimiter;
use crate::lexer::scan_invocations;

fn kinds(blocks: &[Block]) -> Vec<&'static str> {
	blocks.iter().map(Block::kind).collect()
}

fn expand(root: &Path, source_file: &str, content: &str) -> (String, Diagnostics) {
	let cache = build_cache(root);
	let options = ShortcodeOptions::default();
	let ctx = ShortcodeContext {
		cache: &cache,
		source_file: Path::new(source_file),
		options: &options,
	};
	let mut diagnostics = Diagnostics::new();
	let output = expand_shortcodes(content, &ctx, &mut diagnostics);

	(output, diagnostics)
}

// --- Lexer tests ---

#[rstest]
#[case::spaced("{% include player.gd move %}", "include", &["player.gd", "move"])]
#[case::tight("{%include player.gd%}", "include", &["player.gd"])]
#[case::no_args("{% contents %}", "contents", &[])]
#[case::surrounded("See {% link other %} now.", "link", &["other"])]
fn scans_percent_invocations(#[case] input: &str, #[case] name: &str, #[case] args: &[&str]) {
	let found = scan_invocations(input);

	assert_eq!(found.len(), 1);
	assert_eq!(found[0].delimiter, Delimiter::Percent);
	assert_eq!(found[0].name, name);
	assert_eq!(found[0].args, args);
	assert_eq!(
		&input[found[0].span.clone()],
		input.trim_start_matches("See ").trim_end_matches(" now.")
	);
}

#[rstest]
#[case::unclosed("{% include player.gd")]
#[case::empty("{%%}")]
#[case::multiline("{% include\nplayer.gd %}")]
#[case::invalid_name("{% 3d model %}")]
#[case::plain_braces("a dictionary { } literal")]
fn ignores_malformed_invocations(#[case] input: &str) {
	assert!(scan_invocations(input).is_empty());
}

#[test]
fn legacy_delimiters_only_for_registered_shortcodes() {
	let found = find_invocations("{ link other } and { position }");

	assert_eq!(found.len(), 1);
	assert_eq!(found[0].1, ShortcodeInvocation::new("link", ["other"]));
	assert_eq!(found[0].0, 0..14);
}

// --- Parser tests ---

#[test]
fn parses_every_block_kind() {
	let content = concat!(
		"---\n",
		"title: Movement\n",
		"---\n",
		"# Title\n",
		"\n",
		"Some text\n",
		"more text\n",
		"\n",
		"- one\n",
		"  continued\n",
		"- two\n",
		"\n",
		"```gdscript\n",
		"{% include player.gd %}\n",
		"var x = 1\n",
		"```\n",
		"<div>\n",
		"</div>\n",
	);
	let blocks = parse(content);

	assert_eq!(
		kinds(&blocks),
		[
			"raw",
			"heading",
			"blank",
			"paragraph",
			"blank",
			"list",
			"blank",
			"code",
			"raw"
		]
	);
	assert_eq!(
		blocks[0],
		Block::Raw {
			text: "---\ntitle: Movement\n---".to_string()
		}
	);
	assert_eq!(
		blocks[1],
		Block::Heading {
			level: 1,
			text: "Title".to_string()
		}
	);
	assert_eq!(
		blocks[5],
		Block::List {
			items: vec!["- one continued".to_string(), "- two".to_string()]
		}
	);
	assert_eq!(
		blocks[7],
		Block::Code {
			indent: String::new(),
			language: "gdscript".to_string(),
			lines: vec![
				CodeLine::Shortcode(ShortcodeInvocation::new("include", ["player.gd"])),
				CodeLine::Regular("var x = 1".to_string()),
			],
		}
	);
}

#[test]
fn unterminated_fence_runs_to_end_of_input() {
	let blocks = parse("```\nvar x = 1\n\nvar y = 2");

	assert_eq!(
		blocks,
		[Block::Code {
			indent: String::new(),
			language: String::new(),
			lines: vec![
				CodeLine::Regular("var x = 1".to_string()),
				CodeLine::Regular(String::new()),
				CodeLine::Regular("var y = 2".to_string()),
			],
		}]
	);
}

#[test]
fn crlf_line_endings_are_normalized() {
	assert_eq!(parse("# A\r\n\r\ntext\r\n"), parse("# A\n\ntext\n"));
}

#[test]
fn parse_with_offsets_points_at_first_line() {
	let blocks = parse_with_offsets("# A\n\nfirst\nsecond\n");
	let offsets: Vec<usize> = blocks.iter().map(|(offset, _)| *offset).collect();

	assert_eq!(offsets, [0, 4, 5]);
}

#[test]
fn block_kinds_survive_a_round_trip() {
	let content = concat!(
		"# Title\n",
		"\n",
		"Text with `code`.\n",
		"\n",
		"- item\n",
		"\n",
		"```\n",
		"pass\n",
		"```\n",
		"\n",
		"| a | b |\n",
	);
	let blocks = parse(content);
	let rendered = blocks
		.iter()
		.map(ToString::to_string)
		.collect::<Vec<_>>()
		.join("\n");

	assert_eq!(kinds(&parse(rendered)), kinds(&blocks));
}

#[rstest]
#[case::table_after_paragraph(
	"Some intro text.\n| Name | Type |\n| --- | --- |\n",
	&["paragraph", "raw"]
)]
#[case::quote_after_list("- an item\n> Note: read this\n", &["list", "raw"])]
#[case::html_after_paragraph("Text.\n<br>\nMore text.\n", &["paragraph", "raw", "paragraph"])]
fn raw_lines_end_the_previous_block(#[case] content: &str, #[case] expected: &[&str]) {
	assert_eq!(kinds(&parse(content)), expected);
}

#[test]
fn indented_fence_keeps_its_indent() {
	let content = "1. Add the code:\n\n   ```gd\n   var x = 1\n   ```\n";
	let blocks = parse(content);

	assert_eq!(
		blocks[2],
		Block::Code {
			indent: "   ".to_string(),
			language: "gd".to_string(),
			lines: vec![CodeLine::Regular("   var x = 1".to_string())],
		}
	);
	assert_eq!(blocks[2].to_string(), "   ```gd\n   var x = 1\n   ```");
}

// --- Anchor tests ---

#[test]
fn extracts_anchor_region() {
	assert_eq!(extract_anchor(FILE_A, "anchorX"), Some("foo()"));
	assert_eq!(extract_anchor(FILE_A, "missing"), None);
}

#[test]
fn anchor_markers_accept_any_comment_marker() {
	let content = "fn main() {\n\t// ANCHOR: body\n\tprintln!();\n\t// END: body\n}\n";

	assert_eq!(extract_anchor(content, "body"), Some("\tprintln!();"));
}

#[test]
fn nested_anchor_markers_are_stripped() {
	let section = extract_anchor(PLAYER, "physics").unwrap_or_default();

	assert_eq!(
		strip_anchor_markers(section),
		"func _physics_process(delta):\n\tmove_and_slide()"
	);
}

// --- File cache tests ---

fn cache_from(paths: &[&str]) -> FileCache {
	FileCache::from_paths(Path::new("/book"), paths.iter().map(PathBuf::from))
}

#[test]
fn finds_file_by_name_or_path_suffix() -> BookResult<()> {
	let cache = cache_from(&["part1/player.gd", "part2/player.gd", "part2/enemy.gd"]);

	assert_eq!(cache.len(), 3);
	assert_eq!(cache.find_file("enemy.gd")?, PathBuf::from("part2/enemy.gd"));
	assert_eq!(
		cache.find_file_with_extension("enemy", "gd")?,
		PathBuf::from("part2/enemy.gd")
	);
	assert_eq!(
		cache.find_file("part1/player.gd")?,
		PathBuf::from("part1/player.gd")
	);

	Ok(())
}

#[test]
fn ambiguous_and_missing_files_are_errors() {
	let cache = cache_from(&["part1/player.gd", "part2/player.gd"]);

	let ambiguous = cache.find_file_with_extension("player", "gd");
	assert!(
		matches!(&ambiguous, Err(BookError::AmbiguousFile { candidates, .. }) if candidates.len() == 2)
	);

	let missing = cache.find_file("enemy.gd");
	assert!(matches!(missing, Err(BookError::FileNotFound(name)) if name == "enemy.gd"));

	// A suffix must match whole path components.
	assert!(cache.find_file("1/player.gd").is_err());
}

#[test]
fn cache_skips_ignored_files() -> BookResult<()> {
	let tmp = tempfile::tempdir()?;
	let root = tmp.path();
	write_file(root, ".gitignore", "build/\n");
	write_file(root, "build/player.gd", "");
	write_file(root, "node_modules/lib/player.gd", "");
	write_file(root, ".godot/player.gd", "");
	write_file(root, "drafts/player.gd", "");
	write_file(root, "src/player.gd", "");

	let options = CacheOptions {
		exclude_patterns: vec!["drafts/".to_string()],
		disable_gitignore: false,
	};
	let cache = FileCache::build(root, &options)?;

	assert_eq!(cache.find_file("player.gd")?, PathBuf::from("src/player.gd"));

	let options = CacheOptions {
		disable_gitignore: true,
		..options
	};
	let cache = FileCache::build(root, &options)?;
	assert!(matches!(
		cache.find_file("player.gd"),
		Err(BookError::AmbiguousFile { .. })
	));

	Ok(())
}

#[test]
fn invalid_exclude_pattern_is_a_config_error() {
	let tmp = tempfile::tempdir().unwrap_or_else(|e| panic!("tempdir: {e}"));
	let options = CacheOptions {
		exclude_patterns: vec!["a/**b[".to_string()],
		disable_gitignore: false,
	};

	assert!(matches!(
		FileCache::build(tmp.path(), &options),
		Err(BookError::ConfigParse(_))
	));
}

// --- Shortcode tests ---

#[rstest]
fn include_anchor_yields_region(book: TempDir) {
	let (output, diagnostics) = expand(
		book.path(),
		"docs/sub/page.md",
		"```gdscript\n{% include fileA.gd anchorX %}\n```\n",
	);

	assert_eq!(output, "```gdscript\nfoo()\n```\n");
	assert!(diagnostics.is_empty());
}

#[rstest]
fn include_whole_file_drops_markers(book: TempDir) {
	let (output, diagnostics) = expand(book.path(), "docs/sub/page.md", "{% include fileA %}");

	assert_eq!(output, "extends Node\n\nfoo()");
	assert!(diagnostics.is_empty());
}

#[rstest]
fn include_nested_anchor(book: TempDir) {
	let (output, _) = expand(
		book.path(),
		"docs/sub/page.md",
		"```gdscript\n{ include player move }\n```\n",
	);

	assert_eq!(output, "```gdscript\n\tmove_and_slide()\n```\n");
}

#[rstest]
fn link_is_relative_to_the_calling_document(book: TempDir) {
	let (output, diagnostics) = expand(book.path(), "docs/sub/page.md", "See {% link other %}.\n");

	assert_eq!(output, "See [other](../other.html).\n");
	assert!(diagnostics.is_empty());
}

#[rstest]
fn contents_lists_nested_headings(book: TempDir) {
	let content = "{% contents %}\n\n## A\n\n### B\n\n## C\n";
	let (output, diagnostics) = expand(book.path(), "docs/other.md", content);

	assert_eq!(
		output,
		"Contents:\n\n- [A](#a)\n  - [B](#b)\n- [C](#c)\n\n## A\n\n### B\n\n## C\n"
	);
	assert!(diagnostics.is_empty());
}

#[rstest]
fn contents_respects_max_level(book: TempDir) {
	let content = "{% contents 2 %}\n\n## Getting Started\n\n### Details\n";
	let (output, _) = expand(book.path(), "docs/other.md", content);

	assert!(output.starts_with("Contents:\n\n- [Getting Started](#getting-started)\n\n"));
	assert!(!output.contains("(#details)"));
}

#[rstest]
#[case::plain("Hello World", "hello-world")]
#[case::punctuation("What's New?", "whats-new")]
#[case::exclamation("Done!", "done")]
fn heading_anchors(#[case] heading: &str, #[case] expected: &str) {
	assert_eq!(heading_anchor(heading), expected);
}

#[test]
#[traced_test]
fn unknown_shortcode_is_left_in_place() {
	let book = create_book();
	let (output, diagnostics) = expand(book.path(), "docs/other.md", "Use {% foo bar %} here.\n");

	assert_eq!(output, "Use {% foo bar %} here.\n");
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics.error_count(), 1);
	assert_eq!(diagnostics[0].line, 1);
	assert!(logs_contain("unknown shortcode: `foo`"));
}

#[test]
#[traced_test]
fn empty_contents_is_a_warning() {
	let book = create_book();
	let content = "# Title\n\n{% contents %}\n";
	let (output, diagnostics) = expand(book.path(), "docs/other.md", content);

	assert_eq!(output, content);
	assert_eq!(diagnostics.warning_count(), 1);
	assert!(!diagnostics.has_errors());
	assert_eq!(diagnostics[0].line, 3);
	assert!(logs_contain("WARN"));
}

#[rstest]
#[case::missing_file("{% include missing.gd %}", "file not found: `missing.gd`")]
#[case::missing_anchor(
	"{% include fileA.gd nowhere %}",
	"anchor `nowhere` not found in `code/fileA.gd`"
)]
#[case::too_few_args(
	"{% link %}",
	"shortcode `link` expects 1 argument(s), got 0 (usage: {% link target_name %})"
)]
#[case::too_many_args(
	"{% contents 2 3 %}",
	"shortcode `contents` expects 0 to 1 argument(s), got 2 (usage: {% contents [max_level] %})"
)]
#[case::bad_level("{% contents deep %}", "invalid heading level `deep` for shortcode `contents`")]
fn failing_shortcodes_render_their_source(
	book: TempDir,
	#[case] content: &str,
	#[case] message: &str,
) {
	let (output, diagnostics) = expand(book.path(), "docs/other.md", content);

	assert_eq!(output, content);
	assert_eq!(diagnostics.len(), 1);
	assert_eq!(diagnostics[0].severity, Severity::Error);
	assert_eq!(diagnostics[0].message, message);
}

#[rstest]
fn legacy_invocations_are_expanded(book: TempDir) {
	let (output, diagnostics) =
		expand(book.path(), "docs/sub/page.md", "See { link other } or { position }.");

	assert_eq!(output, "See [other](../other.html) or { position }.");
	assert!(diagnostics.is_empty());
}

#[rstest]
fn raw_blocks_are_not_expanded(book: TempDir) {
	let content = "<p>{% link other %}</p>\n";
	let (output, diagnostics) = expand(book.path(), "docs/sub/page.md", content);

	assert_eq!(output, content);
	assert!(diagnostics.is_empty());
}

// --- Diagnostics tests ---

#[test]
fn diagnostics_resolve_lines_in_position_order() {
	let content = "one\ntwo\nthree\n";
	let mut diagnostics = Diagnostics::new();
	diagnostics.push(Severity::Error, 9, "third line", None);
	diagnostics.push(Severity::Warning, 0, "first line", Some(Path::new("a.md")));
	diagnostics.resolve_lines(content);

	let lines: Vec<usize> = diagnostics.iter().map(|d| d.line).collect();
	assert_eq!(lines, [1, 3]);
	assert_eq!(diagnostics[0].to_string(), "warning: a.md:1: first line");
	assert_eq!(diagnostics[1].to_string(), "error: line 3: third line");
}

// --- Line formatter tests ---

#[rstest]
#[case::code_span("`get_node(...)`")]
#[case::sentence_start("Godot is great.")]
#[case::link("See [the docs](https://docs.godotengine.org) for more.")]
#[case::bold("This is **Important Stuff** here.")]
#[case::quoted(r#"Type "Hello World" in the box."#)]
#[case::shortcode("Read {% link Other Chapter %} first.")]
#[case::html("Press <kbd>Ctrl+S</kbd> to save.")]
#[case::url("Visit https://godotengine.org today.")]
#[case::emphasis("Open the *Project Settings* window.")]
fn protected_and_plain_lines_are_unchanged(#[case] line: &str) {
	assert_eq!(format_line(line), line);
}

#[rstest]
#[case::keyboard("Press Ctrl+F1 to open help.", "Press <kbd>Ctrl+F1</kbd> to open help.")]
#[case::keyboard_spaced(
	"Press Ctrl + Alt + Delete to restart.",
	"Press <kbd>Ctrl + Alt + Delete</kbd> to restart."
)]
#[case::proper_noun(
	"You can Open Project Settings now.",
	"You can *Open Project Settings* now."
)]
#[case::file_name(
	"Attach the script to the player.gd file.",
	"Attach the script to the `player.gd` file."
)]
#[case::resource_path(
	"Open res://scenes/main.tscn in the editor.",
	"Open `res://scenes/main.tscn` in the editor."
)]
#[case::menu("Go to Project -> Project Settings.", "Go to *Project -> Project Settings*.")]
#[case::call(
	"Call the move_and_slide() function.",
	"Call the `move_and_slide()` function."
)]
#[case::virtual_calls(
	"Override _ready() and _process().",
	"Override `_ready()` and `_process()`."
)]
#[case::snake_case("Change the max_speed value.", "Change the `max_speed` value.")]
#[case::dotted("Read position.x every frame.", "Read `position.x` every frame.")]
#[case::builtin(
	"The Vector2 type stores two floats.",
	"The `Vector2` type stores two floats."
)]
#[case::number("Set the speed to 200 pixels.", "Set the speed to `200` pixels.")]
#[case::color("Set the color to #ff0000 now.", "Set the color to `#ff0000` now.")]
#[case::pascal_case("Add a CharacterBody2D node.", "Add a *CharacterBody2D* node.")]
#[case::after_sentence(
	"It works. Godot Engine is free.",
	"It works. Godot *Engine* is free."
)]
#[case::hyphenated("Use the Sci-Fi theme here.", "Use the *Sci-Fi* theme here.")]
fn rules_wrap_spans(#[case] line: &str, #[case] expected: &str) {
	assert_eq!(format_line(line), expected);
}

#[test]
fn keyboard_shortcut_snapshot() {
	insta::assert_snapshot!(format_line("Save with Ctrl+Shift+S."), @"Save with <kbd>Ctrl+Shift+S</kbd>.");
}

#[test]
fn slash_separated_words_are_not_paths() {
	insta::assert_snapshot!(format_line("Use input/output wisely."), @"Use input/output wisely.");
}

#[rstest]
#[case::empty("", true)]
#[case::indent("  ", true)]
#[case::period("It works. ", true)]
#[case::colon("Note: ", true)]
#[case::closing_markup("Call `foo()`. ", true)]
#[case::closing_kbd("Press <kbd>Ctrl+.</kbd> ", true)]
#[case::mid_sentence("You can ", false)]
#[case::no_space("It works.", false)]
fn sentence_starts(#[case] prefix: &str, #[case] expected: bool) {
	assert_eq!(is_start_of_sentence(prefix), expected);
}

#[test]
fn rules_are_in_priority_order() {
	let names: Vec<&str> = RULES.iter().map(|rule| rule.name).collect();

	assert_eq!(
		names,
		[
			"keyboard",
			"path",
			"menu",
			"identifier",
			"number",
			"pascal_case",
			"proper_noun"
		]
	);
	assert!(
		RULES
			.iter()
			.all(|rule| (rule.scope == RuleScope::SkipStartOfSentence) == (rule.name == "proper_noun"))
	);
}

// --- Code formatter tests ---

#[test]
fn long_comments_are_reflowed() {
	let line = CodeLine::Regular(
		"    # The player moves faster when the sprint key is held down, so tune the multiplier \
		 with care."
			.to_string(),
	);
	let options = FormatOptions::default();
	let output = format_code_line(&line, &options);

	assert_eq!(
		output,
		"\t# The player moves faster when the sprint key is held down, so tune the\n\t# multiplier \
		 with care."
	);
	assert!(
		output
			.lines()
			.all(|line| line.replace('\t', "    ").chars().count() <= options.comment_width)
	);
	assert_eq!(format_code_line(&CodeLine::Regular(output.clone()), &options), output);
}

#[rstest]
#[case::short_comment("    # Short comment.")]
#[case::code("var speed = 300 # units per second")]
#[case::long_code(
	"var message = \"this line of code is longer than eighty characters but it is not a comment\""
)]
fn other_code_lines_are_unchanged(#[case] line: &str) {
	let line = CodeLine::Regular(line.to_string());

	assert_eq!(format_code_line(&line, &FormatOptions::default()), line.to_string());
}

#[test]
fn comment_width_is_configurable() {
	let line = CodeLine::Regular("# one two three four".to_string());
	let options = FormatOptions {
		comment_width: 12,
		tab_width: 4,
	};

	assert_eq!(
		format_code_line(&line, &options),
		"# one two\n# three four"
	);
}

#[test]
fn shortcode_code_lines_render_canonically() {
	let line = CodeLine::Shortcode(ShortcodeInvocation::new("include", ["player.gd", "move"]));

	assert_eq!(
		format_code_line(&line, &FormatOptions::default()),
		"{% include player.gd move %}"
	);
}

// --- Document formatter tests ---

#[test]
fn formats_a_document() {
	let content = concat!(
		"\n",
		"# Moving the Player\n",
		"\n",
		"\n",
		"Open the player.gd script and call move_and_slide() every frame.\n",
		"- Press Ctrl+S to save.\n",
		"- Set speed to 300\n",
		"  pixels per second.\n",
		"\n",
		"```gdscript\n",
		"    # This comment is short.\n",
		"var speed = 300\n",
		"```\n",
		"\n",
		"\n",
	);
	let expected = concat!(
		"# Moving the Player\n",
		"\n",
		"Open the `player.gd` script and call `move_and_slide()` every frame.\n",
		"- Press <kbd>Ctrl+S</kbd> to save.\n",
		"- Set speed to `300` pixels per second.\n",
		"\n",
		"```gdscript\n",
		"    # This comment is short.\n",
		"var speed = 300\n",
		"```\n",
	);

	assert_eq!(format_content(content), expected);
}

#[rstest]
#[case::prose("It works. Godot Engine is free, open Project -> Project Settings.\n")]
#[case::shortcodes("{% contents %}\n\n## Setup\n\nUse { link other } and {% include player.gd %}.\n")]
#[case::code(
	"```gdscript\n    # The player moves faster when the sprint key is held down, so tune the multiplier \
	 with care.\n```\n"
)]
#[case::mixed(
	"---\ntitle: x\n---\n\n\n# Title\n- item one\n  still one\n* item two\n\n| a | b |\n\nA 3.5 \
	 second delay on res://x.tscn_ready.\n"
)]
#[case::keyboard_punctuation("Press Ctrl+. Godot opens.\n")]
#[case::nested_fence("- Add the code:\n\n   ```gd\n   var x = 1\n   ```\n")]
#[case::raw_after_prose("Some intro text.\n| Name | Type |\n| Speed | float |\n")]
#[case::empty("")]
fn formatting_is_idempotent(#[case] content: &str) {
	let once = format_content(content);
	let twice = format_content(&once);

	assert_eq!(twice, once);
}

#[rstest]
#[case::table(
	"Some intro text.\n| Name | Type |\n| --- | --- |\n| Speed | float |\n",
	"Some intro text.\n| Name | Type |\n| --- | --- |\n| Speed | float |\n"
)]
#[case::quote(
	"- an item\n> Note: Godot Engine rocks\n",
	"- an item\n> Note: Godot Engine rocks\n"
)]
fn raw_blocks_are_not_formatted(#[case] content: &str, #[case] expected: &str) {
	assert_eq!(format_content(content), expected);
}

#[test]
fn keyboard_shortcut_ending_a_sentence() {
	let once = format_content("Press Ctrl+. Godot opens.\n");

	assert_eq!(once, "Press <kbd>Ctrl+.</kbd> Godot opens.\n");
	assert_eq!(format_content(&once), once);
}

#[test]
fn nested_code_fence_stays_in_the_list_item() {
	let content = "- Add the code:\n\n   ```gd\n   var x = 1\n   ```\n";

	assert_eq!(format_content(content), content);
}

#[test]
fn legacy_calls_are_normalized_everywhere() {
	let content = "## Setup { link other }\n\nUse { link other } here.\n- See { link other }.\n\n```gd\n{ include player.gd }\n```\n";

	assert_eq!(
		format_content(content),
		"## Setup {% link other %}\n\nUse {% link other %} here.\n- See {% link other %}.\n\n```gd\n{% include player.gd %}\n```\n"
	);
}

#[test]
fn empty_document_is_a_single_newline() {
	assert_eq!(format_content("\n\n  \n"), "\n");
}

#[rstest]
fn build_document_expands_then_formats(book: TempDir) {
	let cache = build_cache(book.path());
	let config = BookConfig::default();
	let ctx = ShortcodeContext {
		cache: &cache,
		source_file: Path::new("docs/sub/page.md"),
		options: &config.shortcodes,
	};
	let content = concat!(
		"# Movement\n",
		"\n",
		"Read {% link other %} before editing player.gd.\n",
		"\n",
		"```gdscript\n",
		"{% include player physics %}\n",
		"```\n",
	);
	let mut diagnostics = Diagnostics::new();
	let output = build_document(content, &ctx, &config.format, &mut diagnostics);

	assert_eq!(
		output,
		concat!(
			"# Movement\n",
			"\n",
			"Read [other](../other.html) before editing `player.gd`.\n",
			"\n",
			"```gdscript\n",
			"func _physics_process(delta):\n",
			"\tmove_and_slide()\n",
			"```\n",
		)
	);
	assert!(diagnostics.is_empty());
	assert_eq!(format_content(&output), output);
}

// --- Config tests ---

#[test]
fn config_defaults() {
	let config = BookConfig::default();

	assert_eq!(config.shortcodes.source_extension, "gd");
	assert_eq!(config.shortcodes.document_extension, "md");
	assert_eq!(config.shortcodes.published_extension, "html");
	assert_eq!(config.shortcodes.contents_max_level, 3);
	assert_eq!(config.format, FormatOptions::default());
	assert_eq!(config.format.comment_width, 80);
	assert!(!config.disable_gitignore);
}

#[test]
fn config_loads_partial_file() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(
		tmp.path(),
		".config/bookfmt.toml",
		"disable_gitignore = true\n\n[format]\ncomment_width = 100\n\n[exclude]\npatterns = \
		 [\"build/\"]\n",
	);

	let config = BookConfig::load(tmp.path())?.unwrap_or_else(|| panic!("config not found"));
	assert_eq!(config.format.comment_width, 100);
	assert_eq!(config.format.tab_width, 4);
	assert_eq!(config.shortcodes, ShortcodeOptions::default());
	assert!(config.disable_gitignore);
	assert_eq!(config.cache_options().exclude_patterns, ["build/"]);

	Ok(())
}

#[test]
fn config_top_level_keys_come_before_tables() -> AnyEmptyResult {
	let config = BookConfig::from_toml(
		"disable_gitignore = true\n\n[format]\ncomment_width = 72\n\n[exclude]\npatterns = \
		 [\"build/\"]\n",
	)?;
	assert!(config.disable_gitignore);
	assert_eq!(config.format.comment_width, 72);

	let nested = BookConfig::from_toml("[exclude]\npatterns = []\ndisable_gitignore = true\n")?;
	assert!(!nested.disable_gitignore);

	Ok(())
}

#[test]
fn config_candidates_have_precedence() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(tmp.path(), "bookfmt.toml", "[shortcodes]\nsource_extension = \"cs\"\n");
	write_file(tmp.path(), ".bookfmt.toml", "[shortcodes]\nsource_extension = \"py\"\n");

	assert_eq!(
		BookConfig::resolve_path(tmp.path()),
		Some(tmp.path().join("bookfmt.toml"))
	);
	assert_eq!(
		BookConfig::load_or_default(tmp.path())?.shortcodes.source_extension,
		"cs"
	);

	Ok(())
}

#[test]
fn missing_config_is_none() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;

	assert!(BookConfig::load(tmp.path())?.is_none());
	assert_eq!(BookConfig::load_or_default(tmp.path())?.format.tab_width, 4);

	Ok(())
}

#[test]
fn invalid_config_is_an_error() -> AnyEmptyResult {
	let tmp = tempfile::tempdir()?;
	write_file(tmp.path(), "bookfmt.toml", "[format\ncomment_width = 100\n");

	assert!(matches!(
		BookConfig::load(tmp.path()),
		Err(BookError::ConfigParse(_))
	));

	Ok(())
}
