use std::sync::LazyLock;

use regex::Regex;

use crate::CodeLine;
use crate::FormatOptions;

static COMMENT_LINE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(\s*)(#+)\s*(.*?)\s*$").expect("valid comment pattern"));

/// Format one line of a fenced code block.
///
/// Shortcode lines are written back in their canonical `{% %}` form. Comment
/// lines longer than `options.comment_width` are word-wrapped, each piece
/// keeping the original indentation and comment marker. Everything else is
/// returned unchanged.
pub fn format_code_line(line: &CodeLine, options: &FormatOptions) -> String {
	match line {
		CodeLine::Shortcode(invocation) => invocation.to_string(),
		CodeLine::Regular(text) => reflow_comment(text, options).unwrap_or_else(|| text.clone()),
	}
}

fn reflow_comment(line: &str, options: &FormatOptions) -> Option<String> {
	if line.chars().count() <= options.comment_width {
		return None;
	}

	let captures = COMMENT_LINE.captures(line)?;
	let text = captures.get(3)?.as_str();
	if text.is_empty() {
		return None;
	}

	let indent = captures[1].replace("    ", "\t");
	let prefix = format!("{indent}{} ", &captures[2]);
	let width = options
		.comment_width
		.saturating_sub(visual_width(&prefix, options.tab_width))
		.max(1);

	let lines: Vec<String> = wrap_words(text, width)
		.into_iter()
		.map(|wrapped| format!("{prefix}{wrapped}"))
		.collect();

	Some(lines.join("\n"))
}

/// Greedily fill lines of at most `width` characters. Words longer than
/// `width` get a line of their own.
fn wrap_words(text: &str, width: usize) -> Vec<String> {
	let mut lines = vec![];
	let mut current = String::new();
	let mut current_width = 0;

	for word in text.split_whitespace() {
		let word_width = word.chars().count();
		if !current.is_empty() && current_width + 1 + word_width > width {
			lines.push(std::mem::take(&mut current));
			current_width = 0;
		}

		if !current.is_empty() {
			current.push(' ');
			current_width += 1;
		}
		current.push_str(word);
		current_width += word_width;
	}

	if !current.is_empty() {
		lines.push(current);
	}

	lines
}

fn visual_width(text: &str, tab_width: usize) -> usize {
	text.chars()
		.map(|c| if c == '\t' { tab_width } else { 1 })
		.sum()
}
