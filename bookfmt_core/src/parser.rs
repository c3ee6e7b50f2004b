use std::fmt::Display;
use std::sync::LazyLock;

use regex::Regex;

use crate::ShortcodeInvocation;
use crate::find_invocations;

static HEADING: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^(#+)\s+(.*?)\s*$").expect("valid heading pattern"));
static LIST_ITEM: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\s*(?:[-*+]|\d+\.)(?:\s|$)").expect("valid list pattern"));

const FENCE: &str = "```";
const FRONT_MATTER: &str = "---";

/// One structurally distinct unit of a markdown document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
	/// `## Text` where `level` is the number of `#` characters.
	Heading { level: usize, text: String },
	/// One or more consecutive lines of prose.
	Paragraph { lines: Vec<String> },
	/// Consecutive list items. Each item keeps its indentation and marker,
	/// soft-wrapped continuation lines are already joined into it.
	List { items: Vec<String> },
	/// A fenced code block. `language` is empty when the fence has no tag.
	/// `indent` is the whitespace before the opening fence, kept so fences
	/// nested in list items stay nested.
	Code {
		indent: String,
		language: String,
		lines: Vec<CodeLine>,
	},
	/// A whitespace-only line.
	Blank,
	/// Content that is passed through untouched: html, tables, block quotes
	/// and front matter.
	Raw { text: String },
}

impl Block {
	pub fn is_blank(&self) -> bool {
		matches!(self, Self::Blank)
	}

	/// A short name for the kind of block, used in logs and tests.
	pub fn kind(&self) -> &'static str {
		match self {
			Self::Heading { .. } => "heading",
			Self::Paragraph { .. } => "paragraph",
			Self::List { .. } => "list",
			Self::Code { .. } => "code",
			Self::Blank => "blank",
			Self::Raw { .. } => "raw",
		}
	}
}

impl Display for Block {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Heading { level, text } => write!(f, "{} {text}", "#".repeat(*level)),
			Self::Paragraph { lines } => write!(f, "{}", lines.join("\n")),
			Self::List { items } => write!(f, "{}", items.join("\n")),
			Self::Code {
				indent,
				language,
				lines,
			} => {
				writeln!(f, "{indent}{FENCE}{language}")?;
				for line in lines {
					writeln!(f, "{line}")?;
				}
				write!(f, "{indent}{FENCE}")
			}
			Self::Blank => Ok(()),
			Self::Raw { text } => write!(f, "{text}"),
		}
	}
}

/// A line inside a fenced code block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeLine {
	/// The whole line is a single shortcode call.
	Shortcode(ShortcodeInvocation),
	Regular(String),
}

impl CodeLine {
	fn classify(line: &str) -> Self {
		let trimmed = line.trim();
		let invocations = find_invocations(trimmed);

		match invocations.as_slice() {
			[(span, invocation)] if span.start == 0 && span.end == trimmed.len() => {
				Self::Shortcode(invocation.clone())
			}
			_ => Self::Regular(line.to_string()),
		}
	}
}

impl Display for CodeLine {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Shortcode(invocation) => write!(f, "{invocation}"),
			Self::Regular(text) => write!(f, "{text}"),
		}
	}
}

/// Normalize CRLF and lone CR line endings to LF.
pub fn normalize_line_endings(content: &str) -> String {
	if content.contains('\r') {
		content.replace("\r\n", "\n").replace('\r', "\n")
	} else {
		content.to_string()
	}
}

/// Parse markdown content into an ordered sequence of blocks.
///
/// Parsing never fails: an unterminated code fence or front matter section
/// runs to the end of the input.
pub fn parse(content: impl AsRef<str>) -> Vec<Block> {
	parse_with_offsets(content)
		.into_iter()
		.map(|(_, block)| block)
		.collect()
}

/// Like [`parse`], but pairs every block with the byte offset of its first
/// line in the line-ending-normalized content.
pub fn parse_with_offsets(content: impl AsRef<str>) -> Vec<(usize, Block)> {
	let content = normalize_line_endings(content.as_ref());
	let mut builder = BlockBuilder::default();
	let mut offset = 0;

	for (index, raw_line) in content.split_inclusive('\n').enumerate() {
		let line = raw_line.strip_suffix('\n').unwrap_or(raw_line);
		builder.push_line(index, offset, line);
		offset += raw_line.len();
	}

	builder.finish()
}

/// A block that is still collecting lines.
enum Pending {
	Paragraph(Vec<String>),
	List(Vec<String>),
	Code {
		indent: String,
		language: String,
		lines: Vec<CodeLine>,
	},
	Raw(Vec<String>),
	FrontMatter(Vec<String>),
}

impl Pending {
	fn into_block(self) -> Block {
		match self {
			Self::Paragraph(lines) => Block::Paragraph { lines },
			Self::List(items) => Block::List { items },
			Self::Code {
				indent,
				language,
				lines,
			} => {
				Block::Code {
					indent,
					language,
					lines,
				}
			}
			Self::Raw(lines) | Self::FrontMatter(lines) => {
				Block::Raw {
					text: lines.join("\n"),
				}
			}
		}
	}
}

#[derive(Default)]
struct BlockBuilder {
	blocks: Vec<(usize, Block)>,
	pending: Option<(usize, Pending)>,
}

impl BlockBuilder {
	fn push_line(&mut self, index: usize, offset: usize, line: &str) {
		// Fenced code and front matter swallow everything up to their closing
		// marker.
		match &mut self.pending {
			Some((_, Pending::Code { lines, .. })) => {
				if is_fence(line) {
					self.flush();
				} else {
					lines.push(CodeLine::classify(line));
				}
				return;
			}
			Some((_, Pending::FrontMatter(lines))) => {
				lines.push(line.to_string());
				if line.trim_end() == FRONT_MATTER {
					self.flush();
				}
				return;
			}
			_ => {}
		}

		if index == 0 && line.trim_end() == FRONT_MATTER {
			self.start(offset, Pending::FrontMatter(vec![line.to_string()]));
			return;
		}

		if line.trim().is_empty() {
			self.flush();
			self.blocks.push((offset, Block::Blank));
			return;
		}

		if is_fence(line) {
			let fence = line.trim_start();
			let indent = line[..line.len() - fence.len()].to_string();
			let language = fence[FENCE.len()..].trim().to_string();
			self.start(
				offset,
				Pending::Code {
					indent,
					language,
					lines: vec![],
				},
			);
			return;
		}

		if let Some(captures) = HEADING.captures(line) {
			self.flush();
			self.blocks.push((
				offset,
				Block::Heading {
					level: captures[1].len(),
					text: captures[2].to_string(),
				},
			));
			return;
		}

		if LIST_ITEM.is_match(line) {
			if let Some((_, Pending::List(items))) = &mut self.pending {
				items.push(line.to_string());
			} else {
				self.start(offset, Pending::List(vec![line.to_string()]));
			}
			return;
		}

		// Tables, quotes and html end a paragraph or list even without a
		// blank line in between.
		match &mut self.pending {
			Some((_, Pending::Raw(lines))) if is_raw(line) => lines.push(line.to_string()),
			_ if is_raw(line) => self.start(offset, Pending::Raw(vec![line.to_string()])),
			// A line without a marker right after a list item is the same
			// item hard-wrapped in the source.
			Some((_, Pending::List(items))) => {
				if let Some(item) = items.last_mut() {
					item.push(' ');
					item.push_str(line.trim());
				}
			}
			Some((_, Pending::Paragraph(lines))) => lines.push(line.to_string()),
			_ => self.start(offset, Pending::Paragraph(vec![line.to_string()])),
		}
	}

	fn start(&mut self, offset: usize, pending: Pending) {
		self.flush();
		self.pending = Some((offset, pending));
	}

	fn flush(&mut self) {
		if let Some((offset, pending)) = self.pending.take() {
			self.blocks.push((offset, pending.into_block()));
		}
	}

	fn finish(mut self) -> Vec<(usize, Block)> {
		self.flush();
		self.blocks
	}
}

fn is_fence(line: &str) -> bool {
	line.trim_start().starts_with(FENCE)
}

fn is_raw(line: &str) -> bool {
	line.trim_start().starts_with(['<', '|', '>'])
}
