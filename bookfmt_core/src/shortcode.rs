use std::fmt::Display;
use std::ops::Range;
use std::path::Path;

use crate::Block;
use crate::BookError;
use crate::BookResult;
use crate::CodeLine;
use crate::Diagnostics;
use crate::FileCache;
use crate::Severity;
use crate::ShortcodeOptions;
use crate::extract_anchor;
use crate::lexer::Delimiter;
use crate::lexer::scan_invocations;
use crate::normalize_line_endings;
use crate::parse_with_offsets;
use crate::strip_anchor_markers;

/// A parsed `{% name arg1 arg2 %}` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcodeInvocation {
	pub name: String,
	pub args: Vec<String>,
}

impl ShortcodeInvocation {
	pub fn new(name: impl Into<String>, args: impl IntoIterator<Item = impl Into<String>>) -> Self {
		Self {
			name: name.into(),
			args: args.into_iter().map(Into::into).collect(),
		}
	}
}

/// Always renders the `{% %}` delimiters, so legacy `{ name }` calls are
/// normalized whenever they are written back out.
impl Display for ShortcodeInvocation {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		write!(f, "{{% {}", self.name)?;
		for arg in &self.args {
			write!(f, " {arg}")?;
		}
		write!(f, " %}}")
	}
}

/// Everything a shortcode handler may read besides the invocation and the
/// document's blocks.
#[derive(Debug, Clone, Copy)]
pub struct ShortcodeContext<'a> {
	pub cache: &'a FileCache,
	/// Path of the document being expanded. Relative paths are resolved
	/// against the cache root.
	pub source_file: &'a Path,
	pub options: &'a ShortcodeOptions,
}

type Handler = fn(&ShortcodeInvocation, &[Block], &ShortcodeContext<'_>) -> BookResult<String>;

/// A registered shortcode.
pub struct Shortcode {
	pub name: &'static str,
	/// Usage line shown when the shortcode is called with the wrong
	/// arguments.
	pub synopsis: &'static str,
	pub min_args: usize,
	pub max_args: usize,
	handler: Handler,
}

impl Shortcode {
	fn expected_args(&self) -> String {
		if self.min_args == self.max_args {
			self.min_args.to_string()
		} else {
			format!("{} to {}", self.min_args, self.max_args)
		}
	}
}

pub static SHORTCODES: [Shortcode; 3] = [
	Shortcode {
		name: "include",
		synopsis: "{% include file_name [anchor_name] %}",
		min_args: 1,
		max_args: 2,
		handler: include,
	},
	Shortcode {
		name: "link",
		synopsis: "{% link target_name %}",
		min_args: 1,
		max_args: 1,
		handler: link,
	},
	Shortcode {
		name: "contents",
		synopsis: "{% contents [max_level] %}",
		min_args: 0,
		max_args: 1,
		handler: contents,
	},
];

pub fn find_shortcode(name: &str) -> Option<&'static Shortcode> {
	SHORTCODES.iter().find(|shortcode| shortcode.name == name)
}

/// Find every shortcode call in `text` with its byte span.
///
/// Calls written with the legacy single-brace delimiters are only accepted
/// when they name a registered shortcode, so braces in prose or code are
/// left alone.
pub fn find_invocations(text: &str) -> Vec<(Range<usize>, ShortcodeInvocation)> {
	scan_invocations(text)
		.into_iter()
		.filter(|raw| raw.delimiter == Delimiter::Percent || find_shortcode(&raw.name).is_some())
		.map(|raw| {
			(
				raw.span,
				ShortcodeInvocation {
					name: raw.name,
					args: raw.args,
				},
			)
		})
		.collect()
}

/// Run the handler for `invocation`, validating its name and argument count
/// first.
pub fn render_invocation(
	invocation: &ShortcodeInvocation,
	blocks: &[Block],
	ctx: &ShortcodeContext<'_>,
) -> BookResult<String> {
	let Some(shortcode) = find_shortcode(&invocation.name) else {
		return Err(BookError::UnknownShortcode(invocation.name.clone()));
	};

	let got = invocation.args.len();
	if got < shortcode.min_args || got > shortcode.max_args {
		return Err(BookError::InvalidShortcodeArgs {
			name: invocation.name.clone(),
			expected: shortcode.expected_args(),
			got,
			synopsis: shortcode.synopsis.to_string(),
		});
	}

	(shortcode.handler)(invocation, blocks, ctx)
}

/// Render `invocation`, falling back to its own text when the handler fails.
/// Failures are logged and recorded in `diagnostics` at `position`.
pub fn expand_invocation(
	invocation: &ShortcodeInvocation,
	position: usize,
	blocks: &[Block],
	ctx: &ShortcodeContext<'_>,
	diagnostics: &mut Diagnostics,
) -> String {
	match render_invocation(invocation, blocks, ctx) {
		Ok(output) => output,
		Err(error) => {
			let file = ctx.source_file.display();
			match error.severity() {
				Severity::Warning => {
					tracing::warn!(%file, position, shortcode = %invocation, "{error}");
				}
				Severity::Error => {
					tracing::error!(%file, position, shortcode = %invocation, "{error}");
				}
			}
			diagnostics.push_error(&error, position, Some(ctx.source_file));
			invocation.to_string()
		}
	}
}

/// Rewrite every shortcode call in `text` in the `{% name args %}` form
/// without expanding it.
pub fn normalize_invocations(text: &str) -> String {
	let mut output = String::with_capacity(text.len());
	let mut last = 0;

	for (span, invocation) in find_invocations(text) {
		output.push_str(&text[last..span.start]);
		output.push_str(&invocation.to_string());
		last = span.end;
	}

	output.push_str(&text[last..]);
	output
}

/// Replace every shortcode call in `text`. `offset` is the byte offset of
/// `text` in the document, used for diagnostics.
pub fn expand_text(
	text: &str,
	offset: usize,
	blocks: &[Block],
	ctx: &ShortcodeContext<'_>,
	diagnostics: &mut Diagnostics,
) -> String {
	let invocations = find_invocations(text);
	if invocations.is_empty() {
		return text.to_string();
	}

	let mut output = String::with_capacity(text.len());
	let mut last = 0;

	for (span, invocation) in invocations {
		output.push_str(&text[last..span.start]);
		output.push_str(&expand_invocation(
			&invocation,
			offset + span.start,
			blocks,
			ctx,
			diagnostics,
		));
		last = span.end;
	}

	output.push_str(&text[last..]);
	output
}

/// Expand every shortcode in a markdown document.
///
/// Shortcodes are expanded in headings, paragraphs, list items, and on code
/// lines that consist of a single call. Raw blocks and ordinary code lines
/// are left untouched. Failures never abort the run: the call is left in
/// place and a diagnostic is recorded. `diagnostics` should be dedicated to
/// this document since its line numbers are resolved against `content`.
pub fn expand_shortcodes(
	content: &str,
	ctx: &ShortcodeContext<'_>,
	diagnostics: &mut Diagnostics,
) -> String {
	let content = normalize_line_endings(content);
	let parsed = parse_with_offsets(&content);
	let blocks: Vec<Block> = parsed.iter().map(|(_, block)| block.clone()).collect();

	let rendered: Vec<String> = parsed
		.iter()
		.map(|(offset, block)| expand_block(&content, *offset, block, &blocks, ctx, diagnostics))
		.collect();

	diagnostics.resolve_lines(&content);

	let mut output = rendered.join("\n");
	if content.ends_with('\n') {
		output.push('\n');
	}
	output
}

fn expand_block(
	content: &str,
	offset: usize,
	block: &Block,
	blocks: &[Block],
	ctx: &ShortcodeContext<'_>,
	diagnostics: &mut Diagnostics,
) -> String {
	match block {
		Block::Heading { level, text } => {
			Block::Heading {
				level: *level,
				text: expand_text(text, offset + level + 1, blocks, ctx, diagnostics),
			}
			.to_string()
		}
		Block::Paragraph { lines } => {
			let lines = lines
				.iter()
				.enumerate()
				.map(|(index, line)| {
					let position = line_start(content, offset, index);
					expand_text(line, position, blocks, ctx, diagnostics)
				})
				.collect();
			Block::Paragraph { lines }.to_string()
		}
		Block::List { items } => {
			let items = items
				.iter()
				.enumerate()
				.map(|(index, item)| {
					let position = line_start(content, offset, index);
					expand_text(item, position, blocks, ctx, diagnostics)
				})
				.collect();
			Block::List { items }.to_string()
		}
		Block::Code {
			indent,
			language,
			lines,
		} => {
			let mut output = vec![format!("{indent}```{language}")];
			for (index, line) in lines.iter().enumerate() {
				match line {
					CodeLine::Shortcode(invocation) => {
						// The fence itself is the first line of the block.
						let position = line_start(content, offset, index + 1);
						output.push(expand_invocation(invocation, position, blocks, ctx, diagnostics));
					}
					CodeLine::Regular(text) => output.push(text.clone()),
				}
			}
			output.push(format!("{indent}```"));
			output.join("\n")
		}
		Block::Blank | Block::Raw { .. } => block.to_string(),
	}
}

/// Byte offset of the `n`th line after the line starting at `offset`.
fn line_start(content: &str, offset: usize, n: usize) -> usize {
	if n == 0 {
		return offset;
	}

	content[offset..]
		.match_indices('\n')
		.nth(n - 1)
		.map_or(offset, |(index, _)| offset + index + 1)
}

fn include(
	invocation: &ShortcodeInvocation,
	_blocks: &[Block],
	ctx: &ShortcodeContext<'_>,
) -> BookResult<String> {
	let name = &invocation.args[0];
	let path = ctx
		.cache
		.find_file_with_extension(name, &ctx.options.source_extension)?;
	let content = ctx.cache.read(&path)?;

	let Some(anchor) = invocation.args.get(1) else {
		return Ok(strip_anchor_markers(content.trim_end_matches('\n')));
	};

	let section = extract_anchor(&content, anchor).ok_or_else(|| {
		BookError::AnchorNotFound {
			file: path.display().to_string(),
			anchor: anchor.clone(),
		}
	})?;

	Ok(strip_anchor_markers(section))
}

fn link(
	invocation: &ShortcodeInvocation,
	_blocks: &[Block],
	ctx: &ShortcodeContext<'_>,
) -> BookResult<String> {
	let target = &invocation.args[0];
	let path = ctx
		.cache
		.find_file_with_extension(target, &ctx.options.document_extension)?;
	let published = ctx
		.cache
		.absolute(&path.with_extension(&ctx.options.published_extension));

	let source = ctx.cache.absolute(ctx.source_file);
	let base = source.parent().unwrap_or(ctx.cache.root());
	let relative = pathdiff::diff_paths(&published, base).unwrap_or_else(|| published.clone());

	let text = path
		.file_stem()
		.map_or_else(|| target.clone(), |stem| stem.to_string_lossy().into_owned());
	let href = relative.to_string_lossy().replace('\\', "/");

	Ok(format!("[{text}]({href})"))
}

fn contents(
	invocation: &ShortcodeInvocation,
	blocks: &[Block],
	ctx: &ShortcodeContext<'_>,
) -> BookResult<String> {
	let max_level = match invocation.args.first() {
		Some(value) => {
			value
				.parse::<usize>()
				.map_err(|_| BookError::InvalidHeadingLevel {
					value: value.clone(),
				})?
		}
		None => ctx.options.contents_max_level,
	};

	let entries: Vec<String> = blocks
		.iter()
		.filter_map(|block| {
			match block {
				Block::Heading { level, text } if (2..=max_level).contains(level) => {
					Some(format!(
						"{}- [{text}](#{})",
						" ".repeat(2 * (level - 2)),
						heading_anchor(text)
					))
				}
				_ => None,
			}
		})
		.collect();

	if entries.is_empty() {
		return Err(BookError::EmptyContents { max_level });
	}

	Ok(format!("Contents:\n\n{}", entries.join("\n")))
}

/// The fragment a heading is linked with: lowercase, spaces become hyphens,
/// and `'`, `?`, `!` are dropped.
pub fn heading_anchor(text: &str) -> String {
	text.to_lowercase()
		.chars()
		.filter(|c| !matches!(c, '\'' | '?' | '!'))
		.map(|c| if c == ' ' { '-' } else { c })
		.collect()
}
