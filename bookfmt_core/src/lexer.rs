use std::ops::Range;

use logos::Logos;

/// Raw tokens produced by logos for flat tokenization of a line of text.
#[derive(Logos, Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum RawToken {
	#[token("{%")]
	ShortcodeOpen,
	#[token("%}")]
	ShortcodeClose,
	#[token("{")]
	BraceOpen,
	#[token("}")]
	BraceClose,
	#[token("%")]
	Percent,
	#[token("\n")]
	Newline,
	#[regex(r"[ \t\r]+")]
	Whitespace,
	#[regex(r"[^\s{}%]+")]
	Word,
}

/// Which delimiter pair a shortcode was written with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delimiter {
	/// `{% name args %}`
	Percent,
	/// `{ name args }`, the older form still found in some sources.
	Legacy,
}

/// A shortcode call located in the scanned text, before any validation of
/// its name against the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct RawInvocation {
	pub span: Range<usize>,
	pub delimiter: Delimiter,
	pub name: String,
	pub args: Vec<String>,
}

/// Walks the logos token stream and collects every well-formed shortcode
/// call. Calls never span lines: a newline or a stray delimiter before the
/// closing token turns the opener back into plain text.
struct TokenWalker<'a> {
	source: &'a str,
	raw_tokens: Vec<(Result<RawToken, ()>, Range<usize>)>,
	cursor: usize,
	found: Vec<RawInvocation>,
}

impl<'a> TokenWalker<'a> {
	fn new(source: &'a str) -> Self {
		let raw_tokens: Vec<_> = RawToken::lexer(source).spanned().collect();

		Self {
			source,
			raw_tokens,
			cursor: 0,
			found: vec![],
		}
	}

	fn walk(mut self) -> Vec<RawInvocation> {
		while self.cursor < self.raw_tokens.len() {
			let (token, span) = &self.raw_tokens[self.cursor];
			let (delimiter, closing) = match token {
				Ok(RawToken::ShortcodeOpen) => (Delimiter::Percent, RawToken::ShortcodeClose),
				Ok(RawToken::BraceOpen) => (Delimiter::Legacy, RawToken::BraceClose),
				_ => {
					self.cursor += 1;
					continue;
				}
			};
			let start = span.start;

			match self.read_invocation(closing) {
				Some((consumed, end, name, args)) => {
					self.found.push(RawInvocation {
						span: start..end,
						delimiter,
						name,
						args,
					});
					self.cursor += consumed + 1;
				}
				None => self.cursor += 1,
			}
		}

		self.found
	}

	/// Read the words following the opener at `self.cursor` up to the
	/// `closing` token. Returns the number of tokens consumed after the
	/// opener, the byte offset of the end of the call, the name and the
	/// arguments.
	fn read_invocation(&self, closing: RawToken) -> Option<(usize, usize, String, Vec<String>)> {
		let mut words = vec![];

		for (index, (token, span)) in self.raw_tokens[self.cursor + 1..].iter().enumerate() {
			match token {
				Ok(RawToken::Whitespace) => {}
				Ok(RawToken::Word) => words.push(&self.source[span.clone()]),
				Ok(token) if *token == closing => {
					let (name, args) = words.split_first()?;
					if !is_identifier(name) {
						return None;
					}

					let args = args.iter().map(|arg| (*arg).to_string()).collect();
					return Some((index + 1, span.end, (*name).to_string(), args));
				}
				_ => return None,
			}
		}

		None
	}
}

/// Tokenize `source` and return every shortcode call found in it, in order.
pub(crate) fn scan_invocations(source: &str) -> Vec<RawInvocation> {
	if !source.contains('{') {
		return vec![];
	}

	TokenWalker::new(source).walk()
}

fn is_identifier(name: &str) -> bool {
	let mut chars = name.chars();
	chars
		.next()
		.is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
		&& chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}
