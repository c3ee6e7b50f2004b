use std::sync::LazyLock;

use regex::Regex;

/// Extensions recognized on bare file names. Longer extensions sharing a
/// prefix come first.
const FILE_EXTENSIONS: &str = "gdshader|gdshaderinc|gdextension|gd|tscn|tres|scn|res|import|cfg|\
                               godot|cs|csv|py|md|txt|json|ya?ml|toml|png|jpe?g|svg|webp|ogg|wav|\
                               mp3|glb|gltf|obj|ttf|otf|zip|sh|exe";

const NAMED_KEYS: &str = "F1[0-2]|F[1-9]|Backspace|Delete|Del|Enter|Return|Escape|Esc|Space|\
                          Tab|Insert|Home|End|PageUp|PageDown|Up|Down|Left|Right";

const MODIFIERS: &str = "Ctrl|Control|Shift|Alt|Option|Opt|Cmd|Command|Meta|Super|Win";

const BUILTIN_TYPES: &str = "Vector2i|Vector2|Vector3i|Vector3|Vector4i|Vector4|Color|Rect2i|\
                             Rect2|Transform2D|Transform3D|Basis|Quaternion|AABB|\
                             NodePath|StringName|String|Dictionary|Array|PackedByteArray|\
                             PackedInt32Array|PackedInt64Array|PackedFloat32Array|\
                             PackedFloat64Array|PackedStringArray|PackedVector2Array|\
                             PackedVector3Array|PackedColorArray|Callable|RID|Variant|int|float|\
                             bool|void";

/// Spans that already carry markup and are copied as they are.
static PROTECTED: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(concat!(
		r"^(?:",
		r"\{%.*?%\}",
		r"|<kbd>.*?</kbd>",
		r"|<!--.*?-->",
		r"|</?[A-Za-z][^>]*>",
		r"|https?://[^\s)>\]]+",
		r"|``.+?``",
		r"|`[^`]*`",
		r#"|"[^"]*""#,
		r"|“[^”]*”",
		r"|!?\[[^\]]*\](?:\([^)]*\))?",
		r")"
	))
	.expect("valid protected span pattern")
});

/// Emphasis only counts when the closing marker is not glued to a word, so
/// `_ready and _process` is not mistaken for one span.
static PROTECTED_EMPHASIS: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"^(?:\*\*[^*]+?\*\*|\*[^*\s](?:[^*]*[^*\s])?\*|_[^_\s](?:[^_]*[^_\s])?_)")
		.expect("valid emphasis pattern")
});

static WHITESPACE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\s+").expect("valid whitespace pattern"));

static CLOSING_MARKUP: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r#"(?:</[A-Za-z]+>|[*_`"”)])+$"#).expect("valid closing markup pattern")
});

static PLAIN_WORD: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"^\w+(?:['’.\-]\w+)*").expect("valid word pattern"));

/// Whether a rule may fire at the first word of a sentence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuleScope {
	Any,
	SkipStartOfSentence,
}

/// A rewrite applied to spans of prose. The first pattern that matches at
/// the current position wins, and the span is wrapped in `prefix` and
/// `suffix`.
#[derive(Debug)]
pub struct FormatRule {
	pub name: &'static str,
	pub scope: RuleScope,
	pub patterns: Vec<Regex>,
	pub prefix: &'static str,
	pub suffix: &'static str,
}

impl FormatRule {
	fn new(
		name: &'static str,
		scope: RuleScope,
		patterns: &[&str],
		(prefix, suffix): (&'static str, &'static str),
	) -> Self {
		let patterns = patterns
			.iter()
			.map(|pattern| Regex::new(&format!("^(?:{pattern})")).expect("valid format rule pattern"))
			.collect();

		Self {
			name,
			scope,
			patterns,
			prefix,
			suffix,
		}
	}

	pub fn applies_at(&self, start_of_sentence: bool) -> bool {
		match self.scope {
			RuleScope::Any => true,
			RuleScope::SkipStartOfSentence => !start_of_sentence,
		}
	}

	/// Length of the span this rule matches at the start of `text`. A span
	/// never ends in the middle of a word.
	pub fn match_len(&self, text: &str) -> Option<usize> {
		self.patterns
			.iter()
			.filter_map(|pattern| pattern.find(text))
			.map(|found| found.end())
			.find(|&end| end > 0 && ends_at_word_boundary(text, end))
	}

	pub fn wrap(&self, span: &str) -> String {
		format!("{}{span}{}", self.prefix, self.suffix)
	}
}

const CODE: (&str, &str) = ("`", "`");
const EMPHASIS: (&str, &str) = ("*", "*");
const KEYBOARD: (&str, &str) = ("<kbd>", "</kbd>");

/// Every rule in priority order.
pub static RULES: LazyLock<Vec<FormatRule>> = LazyLock::new(|| {
	let keyboard = format!(r"(?:(?:{MODIFIERS})\s*\+\s*)+(?:{NAMED_KEYS}|[A-Za-z0-9]|[^\w\s])");
	let path_with_dirs = format!(r"/?(?:[\w\-.]+/)+[\w\-]+\.(?:{FILE_EXTENSIONS})\b");
	let file_name = format!(r"[\w\-]+\.(?:{FILE_EXTENSIONS})\b");
	let builtin = format!(r"(?:{BUILTIN_TYPES})\b");
	let capitalized = r"[A-Z][a-z]+(?:-[A-Za-z][a-z]*)*";
	let proper_noun = format!(r"{capitalized}(?: {capitalized})*\b");

	vec![
		FormatRule::new("keyboard", RuleScope::Any, &[keyboard.as_str()], KEYBOARD),
		FormatRule::new(
			"path",
			RuleScope::Any,
			&[
				r"(?:res|user)://[\w\-./]*[\w/]",
				r"\.{1,2}/[\w\-./]*[\w/]",
				path_with_dirs.as_str(),
				r"(?:[\w\-]+/)+",
				file_name.as_str(),
			],
			CODE,
		),
		FormatRule::new(
			"menu",
			RuleScope::Any,
			&[r"[A-Z]\w*(?: [A-Z]\w*)*(?:\s*(?:->|→)\s*[A-Z]\w*(?: [A-Z]\w*)*)+"],
			EMPHASIS,
		),
		FormatRule::new(
			"identifier",
			RuleScope::Any,
			&[
				r"[A-Za-z_]\w*(?:\.[A-Za-z_]\w*)*\([^()]*\)",
				r"[A-Za-z_]\w+(?:\.[A-Za-z_]\w*)+\b",
				r"_?[a-z][a-z0-9]*(?:_[a-z0-9]+)+\b",
				r"_[a-z][a-z0-9]*\b",
				builtin.as_str(),
			],
			CODE,
		),
		FormatRule::new(
			"number",
			RuleScope::Any,
			&[
				r"0x[0-9A-Fa-f]+\b",
				r"#[0-9A-Fa-f]{6}(?:[0-9A-Fa-f]{2})?\b",
				r"\d+(?:\.\d+)*\b",
			],
			CODE,
		),
		FormatRule::new(
			"pascal_case",
			RuleScope::Any,
			&[r"[A-Z][a-z0-9]+(?:[A-Z][a-z0-9]*)+\b"],
			EMPHASIS,
		),
		FormatRule::new(
			"proper_noun",
			RuleScope::SkipStartOfSentence,
			&[
				proper_noun.as_str(),
				r"[A-Z]{2,}[a-z][a-z0-9]*(?:[A-Z][a-z0-9]*)*\b",
			],
			EMPHASIS,
		),
	]
});

/// Format one line of prose.
///
/// The line is walked left to right. Spans that already carry markup are
/// copied as they are, otherwise the first rule matching at the current
/// position wraps its span, otherwise one plain word or character is copied.
pub fn format_line(line: &str) -> String {
	let mut output = String::with_capacity(line.len() + 16);
	let mut position = 0;

	while position < line.len() {
		let rest = &line[position..];

		if let Some(len) = protected_len(rest) {
			output.push_str(&rest[..len]);
			position += len;
			continue;
		}

		let start_of_sentence = is_start_of_sentence(&line[..position]);
		let matched = RULES
			.iter()
			.filter(|rule| rule.applies_at(start_of_sentence))
			.find_map(|rule| rule.match_len(rest).map(|len| (rule, len)));

		if let Some((rule, len)) = matched {
			output.push_str(&rule.wrap(&rest[..len]));
			position += len;
			continue;
		}

		let len = plain_len(rest);
		output.push_str(&rest[..len]);
		position += len;
	}

	output
}

/// Whether the text following `prefix` begins a sentence: it is the start of
/// the line, or `prefix` ends with `.`, `!`, `?` or `:` (ignoring closing
/// markup) and then whitespace.
pub fn is_start_of_sentence(prefix: &str) -> bool {
	if prefix.trim().is_empty() {
		return true;
	}

	if !prefix.ends_with(char::is_whitespace) {
		return false;
	}

	CLOSING_MARKUP
		.replace(prefix.trim_end(), "")
		.ends_with(['.', '!', '?', ':'])
}

fn protected_len(text: &str) -> Option<usize> {
	if let Some(found) = WHITESPACE.find(text) {
		return Some(found.end());
	}

	if let Some(found) = PROTECTED.find(text) {
		return Some(found.end());
	}

	PROTECTED_EMPHASIS
		.find(text)
		.map(|found| found.end())
		.filter(|&end| ends_at_word_boundary(text, end))
}

fn plain_len(text: &str) -> usize {
	PLAIN_WORD.find(text).map_or_else(
		|| text.chars().next().map_or(text.len(), char::len_utf8),
		|found| found.end(),
	)
}

fn ends_at_word_boundary(text: &str, end: usize) -> bool {
	text[end..]
		.chars()
		.next()
		.is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
}
