use std::sync::LazyLock;

use regex::Regex;

/// A comment line that opens or closes an anchor region, whatever the
/// comment marker of the language (`#`, `//`, `--`, `;`, …).
static ANCHOR_MARKER_LINE: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^[ \t]*[^\w\s]+[ \t]*(?:ANCHOR|END):[ \t]*\S+[ \t]*$")
		.expect("valid anchor marker pattern")
});

/// Return the text between the `ANCHOR: name` and `END: name` comment lines
/// of `content`, without the marker lines themselves.
///
/// Markers are case-sensitive and must sit on their own line after a comment
/// marker. The first `END` following the `ANCHOR` closes the region.
pub fn extract_anchor<'a>(content: &'a str, name: &str) -> Option<&'a str> {
	let name = regex::escape(name);
	let pattern = format!(
		r"(?ms)^[ \t]*[^\w\s]+[ \t]*ANCHOR:[ \t]*{name}[ \t]*\r?\n(.*?)^[ \t]*[^\w\s]+[ \t]*END:[ \t]*{name}[ \t]*\r?$"
	);
	let regex = Regex::new(&pattern).ok()?;
	let section = regex.captures(content)?.get(1)?.as_str();

	Some(section.strip_suffix('\n').unwrap_or(section))
}

/// Remove every anchor marker line from `text`.
pub fn strip_anchor_markers(text: &str) -> String {
	text.lines()
		.filter(|line| !ANCHOR_MARKER_LINE.is_match(line))
		.collect::<Vec<_>>()
		.join("\n")
}
