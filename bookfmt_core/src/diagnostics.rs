use std::fmt::Display;
use std::path::Path;
use std::path::PathBuf;

use derive_more::Deref;
use serde::Serialize;

use crate::BookError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
	Warning,
	Error,
}

impl Display for Severity {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Warning => write!(f, "warning"),
			Self::Error => write!(f, "error"),
		}
	}
}

/// A recoverable problem found while processing a document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
	pub severity: Severity,
	/// Byte offset into the processed document.
	pub position: usize,
	/// 1-indexed line number. Zero until [`Diagnostics::resolve_lines`] runs.
	pub line: usize,
	pub message: String,
	/// The document the diagnostic belongs to, when known.
	#[serde(skip_serializing_if = "Option::is_none")]
	pub file: Option<PathBuf>,
}

impl Display for Diagnostic {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match &self.file {
			Some(file) => {
				write!(
					f,
					"{}: {}:{}: {}",
					self.severity,
					file.display(),
					self.line,
					self.message
				)
			}
			None => write!(f, "{}: line {}: {}", self.severity, self.line, self.message),
		}
	}
}

/// Collects diagnostics for a single document run.
///
/// The collector is handed through the pipeline explicitly. The caller
/// decides where the diagnostics end up.
#[derive(Debug, Clone, Default, Deref, Serialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
	pub fn new() -> Self {
		Self::default()
	}

	/// Record a failure raised while expanding the document.
	pub fn push_error(&mut self, error: &BookError, position: usize, file: Option<&Path>) {
		self.push(error.severity(), position, error.to_string(), file);
	}

	pub fn push(
		&mut self,
		severity: Severity,
		position: usize,
		message: impl Into<String>,
		file: Option<&Path>,
	) {
		self.0.push(Diagnostic {
			severity,
			position,
			line: 0,
			message: message.into(),
			file: file.map(Path::to_path_buf),
		});
	}

	/// Sort the collected diagnostics by position and fill in their line
	/// numbers with a single pass over the newline offsets of `content`.
	pub fn resolve_lines(&mut self, content: &str) {
		self.0.sort_by_key(|diagnostic| diagnostic.position);

		let mut newlines = content.match_indices('\n').map(|(offset, _)| offset).peekable();
		let mut line = 1;

		for diagnostic in &mut self.0 {
			while newlines.next_if(|&offset| offset < diagnostic.position).is_some() {
				line += 1;
			}
			diagnostic.line = line;
		}
	}

	pub fn error_count(&self) -> usize {
		self.count(Severity::Error)
	}

	pub fn warning_count(&self) -> usize {
		self.count(Severity::Warning)
	}

	pub fn has_errors(&self) -> bool {
		self.error_count() > 0
	}

	pub fn into_vec(self) -> Vec<Diagnostic> {
		self.0
	}

	fn count(&self, severity: Severity) -> usize {
		self.0.iter().filter(|d| d.severity == severity).count()
	}
}
