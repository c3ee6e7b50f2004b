use std::sync::LazyLock;

use regex::Regex;

pub use code::*;
pub use line::*;

use crate::Block;
use crate::Diagnostics;
use crate::FormatOptions;
use crate::ShortcodeContext;
use crate::expand_shortcodes;
use crate::normalize_invocations;
use crate::parse;

mod code;
mod line;

static LIST_MARKER: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(\s*(?:[-*+]|\d+\.)\s+)(.*)$").expect("valid list marker pattern")
});

/// Format a markdown document with the default options.
pub fn format_content(content: &str) -> String {
	format_content_with(content, &FormatOptions::default())
}

/// Format a markdown document.
///
/// Shortcodes are not expanded here. Their calls are kept in place, rewritten
/// in the `{% name args %}` form. Runs of blank lines collapse into one,
/// leading blank lines are dropped, and the result always ends with exactly
/// one newline. Formatting an already formatted document returns it
/// unchanged.
pub fn format_content_with(content: &str, options: &FormatOptions) -> String {
	let mut rendered = vec![];
	let mut previous_blank = true;

	for block in parse(content) {
		let blank = block.is_blank();
		if blank && previous_blank {
			continue;
		}
		previous_blank = blank;
		rendered.push(format_block(&block, options));
	}

	let mut output = rendered.join("\n").trim_end().to_string();
	output.push('\n');
	output
}

/// Expand every shortcode in `content` and format the result. This is what a
/// document looks like once published.
pub fn build_document(
	content: &str,
	ctx: &ShortcodeContext<'_>,
	options: &FormatOptions,
	diagnostics: &mut Diagnostics,
) -> String {
	let expanded = expand_shortcodes(content, ctx, diagnostics);
	format_content_with(&expanded, options)
}

/// Render a single block with its prose and code formatted.
pub fn format_block(block: &Block, options: &FormatOptions) -> String {
	match block {
		Block::Paragraph { lines } => {
			lines
				.iter()
				.map(|line| format_line(&normalize_invocations(line)))
				.collect::<Vec<_>>()
				.join("\n")
		}
		Block::List { items } => {
			items
				.iter()
				.map(|item| format_list_item(item))
				.collect::<Vec<_>>()
				.join("\n")
		}
		Block::Code {
			indent,
			language,
			lines,
		} => {
			let mut output = vec![format!("{indent}```{language}")];
			output.extend(lines.iter().map(|line| format_code_line(line, options)));
			output.push(format!("{indent}```"));
			output.join("\n")
		}
		Block::Heading { level, text } => {
			Block::Heading {
				level: *level,
				text: normalize_invocations(text),
			}
			.to_string()
		}
		Block::Blank | Block::Raw { .. } => block.to_string(),
	}
}

fn format_list_item(item: &str) -> String {
	let item = normalize_invocations(item);
	if let Some(captures) = LIST_MARKER.captures(&item) {
		return format!("{}{}", &captures[1], format_line(&captures[2]));
	}

	item
}
